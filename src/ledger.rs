use rusqlite::{Connection, OptionalExtension};
use tracing::debug;

use crate::error::{messages, Error, Result};
use crate::models::{Category, Expense, NewExpense, User};

pub const MAX_CATEGORY_NAME: usize = 50;
pub const MAX_DESCRIPTION: usize = 100;

// ---------------------------------------------------------------------------
// Users
// ---------------------------------------------------------------------------

pub fn register_user(
    conn: &Connection,
    email: &str,
    first_name: &str,
    last_name: &str,
) -> Result<User> {
    let email = email.trim();
    if email.is_empty() || !email.contains('@') {
        return Err(Error::BadRequest(format!("Invalid email: '{email}'")));
    }
    let exists: bool = conn.query_row(
        "SELECT EXISTS(SELECT 1 FROM users WHERE email = ?1)",
        [email],
        |row| row.get(0),
    )?;
    if exists {
        return Err(Error::AlreadyExists(messages::user_already_exists(email)));
    }
    conn.execute(
        "INSERT INTO users (email, first_name, last_name) VALUES (?1, ?2, ?3)",
        rusqlite::params![email, first_name.trim(), last_name.trim()],
    )?;
    Ok(User {
        id: conn.last_insert_rowid(),
        email: email.to_string(),
        first_name: first_name.trim().to_string(),
        last_name: last_name.trim().to_string(),
    })
}

pub fn get_user(conn: &Connection, email: &str) -> Result<User> {
    conn.query_row(
        "SELECT id, email, first_name, last_name FROM users WHERE email = ?1",
        [email.trim()],
        |row| {
            Ok(User {
                id: row.get(0)?,
                email: row.get(1)?,
                first_name: row.get(2)?,
                last_name: row.get(3)?,
            })
        },
    )
    .optional()?
    .ok_or_else(|| Error::NotFound(messages::user_not_found(email)))
}

pub fn list_users(conn: &Connection) -> Result<Vec<User>> {
    let mut stmt =
        conn.prepare("SELECT id, email, first_name, last_name FROM users ORDER BY email")?;
    let users = stmt
        .query_map([], |row| {
            Ok(User {
                id: row.get(0)?,
                email: row.get(1)?,
                first_name: row.get(2)?,
                last_name: row.get(3)?,
            })
        })?
        .collect::<std::result::Result<Vec<_>, _>>()?;
    Ok(users)
}

pub(crate) fn user_id(conn: &Connection, email: &str) -> Result<i64> {
    Ok(get_user(conn, email)?.id)
}

// ---------------------------------------------------------------------------
// Categories
// ---------------------------------------------------------------------------

fn check_category_name(name: &str) -> Result<()> {
    if name.is_empty() {
        return Err(Error::BadRequest("Category name is required".into()));
    }
    if name.chars().count() > MAX_CATEGORY_NAME {
        return Err(Error::BadRequest(format!(
            "Category name must be at most {MAX_CATEGORY_NAME} characters"
        )));
    }
    Ok(())
}

pub(crate) fn find_category_id(conn: &Connection, user_id: i64, name: &str) -> Result<Option<i64>> {
    let id = conn
        .query_row(
            "SELECT id FROM categories WHERE user_id = ?1 AND name = ?2",
            rusqlite::params![user_id, name.trim()],
            |row| row.get(0),
        )
        .optional()?;
    Ok(id)
}

fn require_category_id(conn: &Connection, user_id: i64, name: &str) -> Result<i64> {
    find_category_id(conn, user_id, name)?
        .ok_or_else(|| Error::NotFound(messages::category_not_found(name.trim())))
}

pub fn add_category(conn: &Connection, email: &str, name: &str) -> Result<Category> {
    let name = name.trim();
    check_category_name(name)?;
    let user_id = user_id(conn, email)?;
    if find_category_id(conn, user_id, name)?.is_some() {
        return Err(Error::AlreadyExists(messages::category_already_exists(name)));
    }
    conn.execute(
        "INSERT INTO categories (user_id, name) VALUES (?1, ?2)",
        rusqlite::params![user_id, name],
    )?;
    Ok(Category {
        id: conn.last_insert_rowid(),
        name: name.to_string(),
        expense_count: 0,
    })
}

pub fn list_categories(conn: &Connection, email: &str) -> Result<Vec<Category>> {
    let user_id = user_id(conn, email)?;
    let mut stmt = conn.prepare(
        "SELECT c.id, c.name, count(e.id) FROM categories c \
         LEFT JOIN expenses e ON e.category_id = c.id \
         WHERE c.user_id = ?1 GROUP BY c.id ORDER BY c.name",
    )?;
    let categories = stmt
        .query_map([user_id], |row| {
            Ok(Category {
                id: row.get(0)?,
                name: row.get(1)?,
                expense_count: row.get(2)?,
            })
        })?
        .collect::<std::result::Result<Vec<_>, _>>()?;
    Ok(categories)
}

pub fn get_category(conn: &Connection, email: &str, name: &str) -> Result<Category> {
    let user_id = user_id(conn, email)?;
    let id = require_category_id(conn, user_id, name)?;
    let category = conn.query_row(
        "SELECT c.id, c.name, (SELECT count(*) FROM expenses e WHERE e.category_id = c.id) \
         FROM categories c WHERE c.id = ?1",
        [id],
        |row| {
            Ok(Category {
                id: row.get(0)?,
                name: row.get(1)?,
                expense_count: row.get(2)?,
            })
        },
    )?;
    Ok(category)
}

pub fn rename_category(conn: &Connection, email: &str, name: &str, new_name: &str) -> Result<()> {
    let new_name = new_name.trim();
    check_category_name(new_name)?;
    let user_id = user_id(conn, email)?;
    let id = require_category_id(conn, user_id, name)?;
    if let Some(other) = find_category_id(conn, user_id, new_name)? {
        if other != id {
            return Err(Error::AlreadyExists(messages::category_already_exists(new_name)));
        }
    }
    conn.execute(
        "UPDATE categories SET name = ?1 WHERE id = ?2",
        rusqlite::params![new_name, id],
    )?;
    Ok(())
}

/// Remove a category. Its expenses stay, uncategorized.
pub fn delete_category(conn: &Connection, email: &str, name: &str) -> Result<Category> {
    let category = get_category(conn, email, name)?;
    let tx = conn.unchecked_transaction()?;
    tx.execute(
        "UPDATE expenses SET category_id = NULL WHERE category_id = ?1",
        [category.id],
    )?;
    tx.execute("DELETE FROM categories WHERE id = ?1", [category.id])?;
    tx.commit()?;
    Ok(category)
}

// ---------------------------------------------------------------------------
// Expenses
// ---------------------------------------------------------------------------

/// Paging and filtering for [`list_expenses`].
#[derive(Debug, Clone, Default)]
pub struct ExpenseQuery {
    pub category: Option<String>,
    pub limit: Option<usize>,
    pub offset: usize,
    pub latest_first: bool,
}

/// Field rules every stored expense must satisfy.
pub fn check_expense(expense: &NewExpense) -> std::result::Result<(), String> {
    if !expense.amount.is_finite() || expense.amount < 0.0 {
        return Err(format!("Amount must be zero or more (got {})", expense.amount));
    }
    if expense.description.chars().count() > MAX_DESCRIPTION {
        return Err(format!("Description must be at most {MAX_DESCRIPTION} characters"));
    }
    if let Some(category) = &expense.category {
        if category.trim().chars().count() > MAX_CATEGORY_NAME {
            return Err(format!(
                "Category name must be at most {MAX_CATEGORY_NAME} characters"
            ));
        }
    }
    Ok(())
}

pub(crate) fn insert_expense(
    conn: &Connection,
    user_id: i64,
    category_id: Option<i64>,
    expense: &NewExpense,
    import_id: Option<i64>,
) -> Result<i64> {
    conn.execute(
        "INSERT INTO expenses (user_id, category_id, amount, date, description, import_id) \
         VALUES (?1, ?2, ?3, ?4, ?5, ?6)",
        rusqlite::params![
            user_id,
            category_id,
            expense.amount,
            expense.date.format("%Y-%m-%d").to_string(),
            expense.description,
            import_id,
        ],
    )?;
    Ok(conn.last_insert_rowid())
}

fn resolve_category(conn: &Connection, user_id: i64, expense: &NewExpense) -> Result<Option<i64>> {
    match &expense.category {
        Some(name) if !name.trim().is_empty() => {
            Ok(Some(require_category_id(conn, user_id, name)?))
        }
        _ => Ok(None),
    }
}

const EXPENSE_SELECT: &str = "SELECT e.id, e.amount, e.date, e.description, c.name \
     FROM expenses e LEFT JOIN categories c ON e.category_id = c.id";

fn expense_from_row(row: &rusqlite::Row<'_>) -> rusqlite::Result<Expense> {
    Ok(Expense {
        id: row.get(0)?,
        amount: row.get(1)?,
        date: row.get(2)?,
        description: row.get(3)?,
        category: row.get(4)?,
    })
}

pub fn add_expense(conn: &Connection, email: &str, expense: &NewExpense) -> Result<Expense> {
    check_expense(expense).map_err(Error::BadRequest)?;
    let user_id = user_id(conn, email)?;
    let category_id = resolve_category(conn, user_id, expense)?;
    let id = insert_expense(conn, user_id, category_id, expense, None)?;
    debug!(id, user_id, "added expense");
    get_expense(conn, email, id)
}

pub fn get_expense(conn: &Connection, email: &str, id: i64) -> Result<Expense> {
    let user_id = user_id(conn, email)?;
    conn.query_row(
        &format!("{EXPENSE_SELECT} WHERE e.id = ?1 AND e.user_id = ?2"),
        rusqlite::params![id, user_id],
        expense_from_row,
    )
    .optional()?
    .ok_or_else(|| Error::NotFound(messages::expense_not_found(id)))
}

pub fn list_expenses(conn: &Connection, email: &str, query: &ExpenseQuery) -> Result<Vec<Expense>> {
    let user_id = user_id(conn, email)?;
    let category_id = match &query.category {
        Some(name) => Some(require_category_id(conn, user_id, name)?),
        None => None,
    };
    let order = if query.latest_first { "DESC" } else { "ASC" };
    let limit = query.limit.map_or(-1, |l| l as i64);
    let mut stmt = conn.prepare(&format!(
        "{EXPENSE_SELECT} WHERE e.user_id = ?1 AND (?2 IS NULL OR e.category_id = ?2) \
         ORDER BY e.date {order}, e.id {order} LIMIT ?3 OFFSET ?4"
    ))?;
    let expenses = stmt
        .query_map(
            rusqlite::params![user_id, category_id, limit, query.offset as i64],
            expense_from_row,
        )?
        .collect::<std::result::Result<Vec<_>, _>>()?;
    Ok(expenses)
}

pub fn count_expenses(conn: &Connection, email: &str) -> Result<i64> {
    let user_id = user_id(conn, email)?;
    let count = conn.query_row(
        "SELECT count(*) FROM expenses WHERE user_id = ?1",
        [user_id],
        |row| row.get(0),
    )?;
    Ok(count)
}

pub fn update_expense(
    conn: &Connection,
    email: &str,
    id: i64,
    expense: &NewExpense,
) -> Result<Expense> {
    check_expense(expense).map_err(Error::BadRequest)?;
    let existing = get_expense(conn, email, id)?;
    let user_id = user_id(conn, email)?;
    let category_id = resolve_category(conn, user_id, expense)?;
    conn.execute(
        "UPDATE expenses SET amount = ?1, date = ?2, description = ?3, category_id = ?4 \
         WHERE id = ?5 AND user_id = ?6",
        rusqlite::params![
            expense.amount,
            expense.date.format("%Y-%m-%d").to_string(),
            expense.description,
            category_id,
            existing.id,
            user_id,
        ],
    )?;
    get_expense(conn, email, id)
}

pub fn delete_expense(conn: &Connection, email: &str, id: i64) -> Result<Expense> {
    let expense = get_expense(conn, email, id)?;
    conn.execute("DELETE FROM expenses WHERE id = ?1", [expense.id])?;
    Ok(expense)
}
