pub mod categories;
pub mod expenses;
pub mod import;
pub mod init;
pub mod template;
pub mod users;

use std::path::PathBuf;
use std::time::Duration;

use chrono::NaiveDate;
use clap::{Parser, Subcommand};
use rusqlite::Connection;

use crate::db::get_connection;
use crate::error::{Error, Result};
use crate::importer::ImportOptions;
use crate::settings::{db_path, load_settings};
use crate::template::Dialect;

#[derive(Parser)]
#[command(
    name = "expense-tracker",
    version,
    about = "Multi-user expense tracker with CSV template uploads."
)]
pub struct Cli {
    /// Act as this user (default: the user stored in settings)
    #[arg(long, global = true)]
    pub user: Option<String>,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Choose a data directory and initialize the database.
    Init {
        /// Path for expense data (default: ~/Documents/expense-tracker)
        #[arg(long = "data-dir")]
        data_dir: Option<String>,
    },
    /// Manage users.
    Users {
        #[command(subcommand)]
        command: UsersCommands,
    },
    /// Manage the current user's categories.
    Categories {
        #[command(subcommand)]
        command: CategoriesCommands,
    },
    /// Manage the current user's expenses.
    Expenses {
        #[command(subcommand)]
        command: ExpensesCommands,
    },
    /// Write the expense upload template.
    Template {
        /// Output path (default: stdout)
        #[arg(long)]
        output: Option<String>,
    },
    /// Check an upload's columns without importing it.
    Validate {
        /// Path to the CSV upload
        file: String,
        /// Honor double-quoted cells
        #[arg(long)]
        quoted: bool,
    },
    /// Import every expense in a CSV upload.
    Import {
        /// Path to the CSV upload
        file: String,
        /// Honor double-quoted cells
        #[arg(long)]
        quoted: bool,
        /// Give up reading after this many seconds
        #[arg(long)]
        timeout: Option<u64>,
    },
}

#[derive(Subcommand)]
pub enum UsersCommands {
    /// Register a user.
    Add {
        email: String,
        #[arg(long = "first-name", default_value = "")]
        first_name: String,
        #[arg(long = "last-name", default_value = "")]
        last_name: String,
    },
    /// List all users.
    List,
    /// Make a user the default for later commands.
    Use { email: String },
}

#[derive(Subcommand)]
pub enum CategoriesCommands {
    /// Add a category.
    Add { name: String },
    /// List categories with their expense counts.
    List,
    /// Rename a category.
    Rename { name: String, new_name: String },
    /// Delete a category; its expenses become uncategorized.
    Delete { name: String },
}

#[derive(Subcommand)]
pub enum ExpensesCommands {
    /// Record an expense.
    Add {
        amount: f64,
        /// Date: YYYY-MM-DD (default: today)
        #[arg(long)]
        date: Option<String>,
        #[arg(long, default_value = "")]
        description: String,
        #[arg(long)]
        category: Option<String>,
    },
    /// List expenses.
    List {
        /// Only expenses in this category
        #[arg(long)]
        category: Option<String>,
        #[arg(long)]
        limit: Option<usize>,
        #[arg(long, default_value = "0")]
        offset: usize,
        /// Newest first
        #[arg(long = "latest-first")]
        latest_first: bool,
    },
    /// Show one expense.
    Show { id: i64 },
    /// Replace an expense's fields.
    Update {
        id: i64,
        amount: f64,
        /// Date: YYYY-MM-DD (default: today)
        #[arg(long)]
        date: Option<String>,
        #[arg(long, default_value = "")]
        description: String,
        #[arg(long)]
        category: Option<String>,
    },
    /// Delete an expense.
    Delete { id: i64 },
    /// Count expenses.
    Count,
}

/// Open the configured database, which `init` must have created.
pub(crate) fn open_db() -> Result<Connection> {
    let path = db_path();
    if !path.exists() {
        return Err(Error::Settings(format!(
            "No database found at {}\nRun `expense-tracker init` to create one.",
            path.display()
        )));
    }
    get_connection(&path)
}

/// The `--user` flag, else the default user from settings.
pub(crate) fn resolve_user(user: Option<&str>) -> Result<String> {
    if let Some(email) = user.map(str::trim).filter(|e| !e.is_empty()) {
        return Ok(email.to_string());
    }
    let settings = load_settings();
    if settings.user_email.is_empty() {
        return Err(Error::BadRequest(
            "No user selected. Pass --user or run `expense-tracker users use <EMAIL>`.".into(),
        ));
    }
    Ok(settings.user_email)
}

pub(crate) fn parse_date_opt(date: Option<&str>) -> Result<NaiveDate> {
    match date {
        Some(d) => NaiveDate::parse_from_str(d.trim(), "%Y-%m-%d")
            .map_err(|_| Error::BadRequest(format!("Invalid date '{d}', expected YYYY-MM-DD"))),
        None => Ok(chrono::Local::now().date_naive()),
    }
}

/// Import options from settings, overridden by command-line flags.
pub(crate) fn import_options(quoted: bool, timeout: Option<u64>) -> ImportOptions {
    let settings = load_settings().import;
    let dialect = if quoted || settings.quoted {
        Dialect::quoted()
    } else {
        Dialect::default()
    };
    ImportOptions {
        dialect,
        timeout: timeout.or(settings.timeout_secs).map(Duration::from_secs),
        cancel: None,
    }
}

pub fn run(cli: Cli) -> Result<()> {
    let user = cli.user.as_deref();
    match cli.command {
        Commands::Init { data_dir } => init::run(data_dir),
        Commands::Users { command } => match command {
            UsersCommands::Add {
                email,
                first_name,
                last_name,
            } => users::add(&email, &first_name, &last_name),
            UsersCommands::List => users::list(),
            UsersCommands::Use { email } => users::select(&email),
        },
        Commands::Categories { command } => {
            let email = resolve_user(user)?;
            match command {
                CategoriesCommands::Add { name } => categories::add(&email, &name),
                CategoriesCommands::List => categories::list(&email),
                CategoriesCommands::Rename { name, new_name } => {
                    categories::rename(&email, &name, &new_name)
                }
                CategoriesCommands::Delete { name } => categories::delete(&email, &name),
            }
        }
        Commands::Expenses { command } => {
            let email = resolve_user(user)?;
            match command {
                ExpensesCommands::Add {
                    amount,
                    date,
                    description,
                    category,
                } => expenses::add(&email, amount, date.as_deref(), &description, category),
                ExpensesCommands::List {
                    category,
                    limit,
                    offset,
                    latest_first,
                } => expenses::list(&email, category, limit, offset, latest_first),
                ExpensesCommands::Show { id } => expenses::show(&email, id),
                ExpensesCommands::Update {
                    id,
                    amount,
                    date,
                    description,
                    category,
                } => expenses::update(&email, id, amount, date.as_deref(), &description, category),
                ExpensesCommands::Delete { id } => expenses::delete(&email, id),
                ExpensesCommands::Count => expenses::count(&email),
            }
        }
        Commands::Template { output } => template::run(output.map(PathBuf::from)),
        Commands::Validate { file, quoted } => import::validate(&PathBuf::from(file), quoted),
        Commands::Import {
            file,
            quoted,
            timeout,
        } => {
            let email = resolve_user(user)?;
            import::run(&email, &PathBuf::from(file), quoted, timeout)
        }
    }
}
