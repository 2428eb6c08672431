use std::collections::HashMap;
use std::fs::File;
use std::io::BufReader;
use std::path::Path;
use std::time::Duration;

use rusqlite::Connection;
use sha2::{Digest, Sha256};
use tracing::{debug, info, warn};

use crate::error::{messages, Result};
use crate::ledger::{self, check_expense};
use crate::models::{ExpenseRow, NewExpense};
use crate::template::{CancelToken, Dialect, Template, ValidationError};

/// Example upload served by the `template` command. Kept by hand in sync with
/// [`ExpenseRow`]'s schema.
pub const EXPENSE_UPLOAD_TEMPLATE: &str =
    include_str!("../templates/expense_upload_template.csv");

#[derive(Debug, Clone, Default)]
pub struct ImportOptions {
    pub dialect: Dialect,
    pub timeout: Option<Duration>,
    pub cancel: Option<CancelToken>,
}

#[derive(Debug, Clone, PartialEq)]
pub enum ImportOutcome {
    Imported { count: usize },
    /// Nothing was stored; each message describes one problem.
    Rejected(Vec<String>),
    /// This user already imported a file with the same checksum.
    DuplicateFile,
}

fn compute_checksum(file_path: &Path) -> Result<String> {
    let data = std::fs::read(file_path)?;
    let mut hasher = Sha256::new();
    hasher.update(&data);
    Ok(hex::encode(hasher.finalize()))
}

type ExpenseTemplate = Template<ExpenseRow, BufReader<File>>;

fn open_template(file_path: &Path, options: &ImportOptions) -> Result<ExpenseTemplate> {
    let file = File::open(file_path)?;
    let mut template = Template::new(BufReader::new(file)).with_dialect(options.dialect);
    if let Some(timeout) = options.timeout {
        template = template.with_timeout(timeout);
    }
    if let Some(cancel) = &options.cancel {
        template = template.with_cancel(cancel.clone());
    }
    Ok(template)
}

/// Check an upload's header against the expense template without storing anything.
pub fn validate_file(file_path: &Path, options: &ImportOptions) -> Result<Vec<ValidationError>> {
    open_template(file_path, options)?.validate()
}

/// Import every row of an expense upload for `email`.
///
/// Missing template columns, rows breaking the expense field rules and
/// unknown category names reject the whole file; each problem names the file
/// line it was found on. Unreadable or malformed rows fail with the template
/// error. An upload with no data rows imports nothing and is not remembered.
pub fn import_expenses(
    conn: &Connection,
    email: &str,
    file_path: &Path,
    options: &ImportOptions,
) -> Result<ImportOutcome> {
    let user_id = ledger::user_id(conn, email)?;

    let checksum = compute_checksum(file_path)?;
    {
        let mut stmt =
            conn.prepare("SELECT 1 FROM imports WHERE checksum = ?1 AND user_id = ?2")?;
        if stmt.exists(rusqlite::params![checksum, user_id])? {
            info!(file = %file_path.display(), "skipping previously imported file");
            return Ok(ImportOutcome::DuplicateFile);
        }
    }

    let mut template = open_template(file_path, options)?;
    let errors = template.validate()?;
    if !errors.is_empty() {
        warn!(missing = errors.len(), "template rejected");
        return Ok(ImportOutcome::Rejected(
            errors.into_iter().map(|e| e.message).collect(),
        ));
    }

    let expenses: Vec<(usize, NewExpense)> = template
        .get_numbered_records()?
        .into_iter()
        .map(|(line, row)| (line, NewExpense::from(row)))
        .collect();
    debug!(rows = expenses.len(), "read expense rows");
    if expenses.is_empty() {
        info!(file = %file_path.display(), "upload has no expense rows");
        return Ok(ImportOutcome::Imported { count: 0 });
    }

    // Keyed by ASCII case folding, the same folding `COLLATE NOCASE` applies.
    let mut categories: HashMap<String, Option<i64>> = HashMap::new();
    let mut resolved = Vec::with_capacity(expenses.len());
    let mut problems = Vec::new();
    for (line, expense) in &expenses {
        if let Err(message) = check_expense(expense) {
            problems.push(format!("Line {line}: {message}"));
            continue;
        }
        let category_id = match &expense.category {
            Some(name) => {
                let key = name.to_ascii_lowercase();
                let id = match categories.get(&key) {
                    Some(id) => *id,
                    None => {
                        let id = ledger::find_category_id(conn, user_id, name)?;
                        categories.insert(key, id);
                        id
                    }
                };
                if id.is_none() {
                    let message = messages::category_not_found(name);
                    problems.push(format!("Line {line}: {message}"));
                    continue;
                }
                id
            }
            None => None,
        };
        resolved.push((expense, category_id));
    }
    if !problems.is_empty() {
        warn!(problems = problems.len(), "expense rows rejected");
        return Ok(ImportOutcome::Rejected(problems));
    }

    let dates: Vec<String> = expenses
        .iter()
        .map(|(_, e)| e.date.format("%Y-%m-%d").to_string())
        .collect();
    let tx = conn.unchecked_transaction()?;
    tx.execute(
        "INSERT INTO imports \
         (user_id, filename, record_count, date_range_start, date_range_end, checksum) \
         VALUES (?1, ?2, ?3, ?4, ?5, ?6)",
        rusqlite::params![
            user_id,
            file_path.file_name().and_then(|n| n.to_str()).unwrap_or(""),
            expenses.len() as i64,
            dates.iter().min(),
            dates.iter().max(),
            checksum,
        ],
    )?;
    let import_id = tx.last_insert_rowid();
    for (expense, category_id) in &resolved {
        ledger::insert_expense(&tx, user_id, *category_id, expense, Some(import_id))?;
    }
    tx.commit()?;

    info!(count = resolved.len(), "imported expenses");
    Ok(ImportOutcome::Imported {
        count: resolved.len(),
    })
}
