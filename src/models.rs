use std::sync::OnceLock;

use chrono::NaiveDate;

use crate::template::{FieldDescriptor, Record, Schema, Value, ValueKind};

#[derive(Debug, Clone, PartialEq)]
pub struct User {
    pub id: i64,
    pub email: String,
    pub first_name: String,
    pub last_name: String,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Category {
    pub id: i64,
    pub name: String,
    pub expense_count: i64,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Expense {
    pub id: i64,
    pub amount: f64,
    /// `YYYY-MM-DD`
    pub date: String,
    pub description: String,
    pub category: Option<String>,
}

/// Input for adding or replacing an expense. `category` is resolved by name.
#[derive(Debug, Clone, PartialEq)]
pub struct NewExpense {
    pub amount: f64,
    pub date: NaiveDate,
    pub description: String,
    pub category: Option<String>,
}

/// One row of the expense upload template.
#[derive(Debug, Clone, PartialEq)]
pub struct ExpenseRow {
    pub amount: f64,
    pub date: NaiveDate,
    pub description: String,
    pub category_name: String,
}

impl Default for ExpenseRow {
    fn default() -> Self {
        Self {
            amount: 0.0,
            date: chrono::Local::now().date_naive(),
            description: String::new(),
            category_name: String::new(),
        }
    }
}

impl Record for ExpenseRow {
    fn schema() -> &'static Schema {
        static SCHEMA: OnceLock<Schema> = OnceLock::new();
        SCHEMA.get_or_init(|| {
            Schema::builder()
                .field("Amount", ValueKind::Float)
                .required()
                .field("Date", ValueKind::Date)
                .required()
                .field("Description", ValueKind::Text)
                .field("CategoryName", ValueKind::Text)
                .build()
        })
    }

    fn assign(&mut self, field: &FieldDescriptor, value: Value) {
        match (field.name, value) {
            ("Amount", Value::Float(v)) => self.amount = v,
            ("Date", Value::Date(v)) => self.date = v,
            ("Description", Value::Text(v)) => self.description = v,
            ("CategoryName", Value::Text(v)) => self.category_name = v,
            _ => {}
        }
    }
}

impl From<ExpenseRow> for NewExpense {
    fn from(row: ExpenseRow) -> Self {
        let category = row.category_name.trim();
        Self {
            amount: row.amount,
            date: row.date,
            description: row.description.trim().to_string(),
            category: (!category.is_empty()).then(|| category.to_string()),
        }
    }
}
