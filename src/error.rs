use thiserror::Error;

use crate::template::{ValidationError, ValueKind};

#[derive(Error, Debug)]
pub enum Error {
    #[error("Database error: {0}")]
    Db(#[from] rusqlite::Error),

    #[error("Error while reading the file: {0}")]
    Io(#[from] std::io::Error),

    #[error("Error while reading the file: {0}")]
    Csv(#[from] csv::Error),

    #[error("Value missing for one of the columns ({column}){}", on_line(.line))]
    RowShape { column: String, line: Option<usize> },

    #[error("Value '{value}' for {field} is not a valid {kind}{}", on_line(.line))]
    Format {
        field: String,
        kind: ValueKind,
        value: String,
        line: Option<usize>,
    },

    #[error("{}", join_messages(.0))]
    Validation(Vec<ValidationError>),

    #[error("Timed out while reading the file")]
    TimedOut,

    #[error("Reading the file was cancelled")]
    Cancelled,

    #[error("{0}")]
    NotFound(String),

    #[error("{0}")]
    AlreadyExists(String),

    #[error("{0}")]
    BadRequest(String),

    #[error("Settings error: {0}")]
    Settings(String),
}

impl Error {
    /// Attach the source line number to a row-level error.
    pub fn at_line(self, n: usize) -> Self {
        match self {
            Self::RowShape { column, .. } => Self::RowShape {
                column,
                line: Some(n),
            },
            Self::Format {
                field, kind, value, ..
            } => Self::Format {
                field,
                kind,
                value,
                line: Some(n),
            },
            other => other,
        }
    }
}

fn on_line(line: &Option<usize>) -> String {
    line.map(|n| format!(" on line {n}")).unwrap_or_default()
}

fn join_messages(errors: &[ValidationError]) -> String {
    errors
        .iter()
        .map(|e| e.message.as_str())
        .collect::<Vec<_>>()
        .join("; ")
}

pub type Result<T> = std::result::Result<T, Error>;

// User-facing messages shared by the ledger and import layers.
pub mod messages {
    pub fn expense_not_found(id: i64) -> String {
        format!("Expense with Id : {id} does not exist.")
    }

    pub fn category_not_found(name: &str) -> String {
        format!("Category with Name : {name} does not exist.")
    }

    pub fn user_not_found(email: &str) -> String {
        format!("User with Email : {email} does not exist.")
    }

    pub fn category_already_exists(name: &str) -> String {
        format!("Category with Name : {name} already exists")
    }

    pub fn user_already_exists(email: &str) -> String {
        format!("User with Email : {email} already exists")
    }
}
