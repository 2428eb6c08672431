use std::path::Path;

use colored::Colorize;

use crate::cli::{import_options, open_db};
use crate::error::{Error, Result};
use crate::importer::{import_expenses, validate_file, ImportOutcome};

fn print_problems(problems: &[String]) {
    for problem in problems {
        eprintln!("  {} {problem}", "✗".red());
    }
}

pub fn validate(file_path: &Path, quoted: bool) -> Result<()> {
    let errors = validate_file(file_path, &import_options(quoted, None))?;
    if errors.is_empty() {
        println!("{} {} matches the upload template", "✓".green(), file_path.display());
        return Ok(());
    }
    let messages: Vec<String> = errors.into_iter().map(|e| e.message).collect();
    print_problems(&messages);
    Err(Error::BadRequest(format!(
        "{} does not match the upload template",
        file_path.display()
    )))
}

pub fn run(email: &str, file_path: &Path, quoted: bool, timeout: Option<u64>) -> Result<()> {
    let conn = open_db()?;
    match import_expenses(&conn, email, file_path, &import_options(quoted, timeout))? {
        ImportOutcome::Imported { count } => {
            println!("{} {count} expenses imported", "✓".green());
            Ok(())
        }
        ImportOutcome::DuplicateFile => {
            println!("This file has already been imported (duplicate checksum).");
            Ok(())
        }
        ImportOutcome::Rejected(problems) => {
            print_problems(&problems);
            Err(Error::BadRequest(format!(
                "Nothing imported: {} problem(s) in {}",
                problems.len(),
                file_path.display()
            )))
        }
    }
}
