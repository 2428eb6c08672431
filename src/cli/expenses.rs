use comfy_table::{Cell, CellAlignment, Table};

use crate::cli::{open_db, parse_date_opt};
use crate::error::Result;
use crate::fmt::amount as fmt_amount;
use crate::ledger::{
    add_expense, count_expenses, delete_expense, get_expense, list_expenses, update_expense,
    ExpenseQuery,
};
use crate::models::{Expense, NewExpense};

fn new_expense(
    amount: f64,
    date: Option<&str>,
    description: &str,
    category: Option<String>,
) -> Result<NewExpense> {
    Ok(NewExpense {
        amount,
        date: parse_date_opt(date)?,
        description: description.trim().to_string(),
        category: category.filter(|c| !c.trim().is_empty()),
    })
}

fn expense_table(expenses: &[Expense]) -> Table {
    let mut table = Table::new();
    table.set_header(vec!["ID", "Date", "Amount", "Category", "Description"]);
    for e in expenses {
        table.add_row(vec![
            Cell::new(e.id),
            Cell::new(&e.date),
            Cell::new(fmt_amount(e.amount)).set_alignment(CellAlignment::Right),
            Cell::new(e.category.as_deref().unwrap_or("")),
            Cell::new(&e.description),
        ]);
    }
    table
}

pub fn add(
    email: &str,
    amount: f64,
    date: Option<&str>,
    description: &str,
    category: Option<String>,
) -> Result<()> {
    let conn = open_db()?;
    let expense = add_expense(&conn, email, &new_expense(amount, date, description, category)?)?;
    println!("Added expense {}: {} on {}", expense.id, fmt_amount(expense.amount), expense.date);
    Ok(())
}

pub fn list(
    email: &str,
    category: Option<String>,
    limit: Option<usize>,
    offset: usize,
    latest_first: bool,
) -> Result<()> {
    let conn = open_db()?;
    let query = ExpenseQuery {
        category,
        limit,
        offset,
        latest_first,
    };
    let expenses = list_expenses(&conn, email, &query)?;
    let total: f64 = expenses.iter().map(|e| e.amount).sum();
    println!("Expenses\n{}", expense_table(&expenses));
    println!("{} shown, total {}", expenses.len(), fmt_amount(total));
    Ok(())
}

pub fn show(email: &str, id: i64) -> Result<()> {
    let conn = open_db()?;
    let expense = get_expense(&conn, email, id)?;
    println!("{}", expense_table(std::slice::from_ref(&expense)));
    Ok(())
}

pub fn update(
    email: &str,
    id: i64,
    amount: f64,
    date: Option<&str>,
    description: &str,
    category: Option<String>,
) -> Result<()> {
    let conn = open_db()?;
    let expense = update_expense(
        &conn,
        email,
        id,
        &new_expense(amount, date, description, category)?,
    )?;
    println!("Updated expense {}", expense.id);
    Ok(())
}

pub fn delete(email: &str, id: i64) -> Result<()> {
    let conn = open_db()?;
    let expense = delete_expense(&conn, email, id)?;
    println!("Deleted expense {}", expense.id);
    Ok(())
}

pub fn count(email: &str) -> Result<()> {
    let conn = open_db()?;
    println!("{}", count_expenses(&conn, email)?);
    Ok(())
}
