use comfy_table::{Cell, Table};

use crate::cli::open_db;
use crate::error::Result;
use crate::ledger::{add_category, delete_category, list_categories, rename_category};

pub fn add(email: &str, name: &str) -> Result<()> {
    let conn = open_db()?;
    let category = add_category(&conn, email, name)?;
    println!("Added category: {}", category.name);
    Ok(())
}

pub fn list(email: &str) -> Result<()> {
    let conn = open_db()?;
    let categories = list_categories(&conn, email)?;

    let mut table = Table::new();
    table.set_header(vec!["ID", "Name", "Expenses"]);
    for cat in categories {
        table.add_row(vec![
            Cell::new(cat.id),
            Cell::new(cat.name),
            Cell::new(cat.expense_count),
        ]);
    }
    println!("Categories\n{table}");
    Ok(())
}

pub fn rename(email: &str, name: &str, new_name: &str) -> Result<()> {
    let conn = open_db()?;
    rename_category(&conn, email, name, new_name)?;
    println!("Renamed category {name} to: {}", new_name.trim());
    Ok(())
}

pub fn delete(email: &str, name: &str) -> Result<()> {
    let conn = open_db()?;
    let category = delete_category(&conn, email, name)?;
    println!(
        "Deleted category {} ({} expenses now uncategorized)",
        category.name, category.expense_count
    );
    Ok(())
}
