use std::path::PathBuf;

use crate::db::{get_connection, init_db};
use crate::error::Result;
use crate::settings::{load_settings, save_settings, shellexpand_path};

pub fn run(data_dir: Option<String>) -> Result<()> {
    let mut settings = load_settings();
    let resolved = match data_dir {
        Some(dir) => PathBuf::from(shellexpand_path(&dir)),
        None => PathBuf::from(&settings.data_dir),
    };
    std::fs::create_dir_all(&resolved)?;

    let conn = get_connection(&resolved.join("expenses.db"))?;
    init_db(&conn)?;

    settings.data_dir = resolved.to_string_lossy().to_string();
    save_settings(&settings)?;

    println!("Initialized expense data in {}", resolved.display());
    Ok(())
}
