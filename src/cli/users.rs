use comfy_table::{Cell, Table};

use crate::cli::open_db;
use crate::error::Result;
use crate::ledger::{get_user, list_users, register_user};
use crate::settings::{load_settings, save_settings};

pub fn add(email: &str, first_name: &str, last_name: &str) -> Result<()> {
    let conn = open_db()?;
    let user = register_user(&conn, email, first_name, last_name)?;
    println!("Added user: {}", user.email);

    let mut settings = load_settings();
    if settings.user_email.is_empty() {
        settings.user_email = user.email.clone();
        save_settings(&settings)?;
        println!("{} is now the default user", user.email);
    }
    Ok(())
}

pub fn list() -> Result<()> {
    let conn = open_db()?;
    let users = list_users(&conn)?;
    let current = load_settings().user_email;

    let mut table = Table::new();
    table.set_header(vec!["ID", "Email", "Name", "Default"]);
    for user in users {
        let is_default = user.email.eq_ignore_ascii_case(&current);
        table.add_row(vec![
            Cell::new(user.id),
            Cell::new(&user.email),
            Cell::new(format!("{} {}", user.first_name, user.last_name).trim()),
            Cell::new(if is_default { "*" } else { "" }),
        ]);
    }
    println!("Users\n{table}");
    Ok(())
}

pub fn select(email: &str) -> Result<()> {
    let conn = open_db()?;
    let user = get_user(&conn, email)?;
    let mut settings = load_settings();
    settings.user_email = user.email.clone();
    save_settings(&settings)?;
    println!("Default user: {}", user.email);
    Ok(())
}
