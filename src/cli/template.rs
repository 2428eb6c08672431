use std::path::PathBuf;

use crate::error::Result;
use crate::importer::EXPENSE_UPLOAD_TEMPLATE;

pub fn run(output: Option<PathBuf>) -> Result<()> {
    match output {
        Some(path) => {
            std::fs::write(&path, EXPENSE_UPLOAD_TEMPLATE)?;
            println!("Wrote upload template to {}", path.display());
        }
        None => print!("{EXPENSE_UPLOAD_TEMPLATE}"),
    }
    Ok(())
}
