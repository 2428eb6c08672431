pub mod cli;
pub mod db;
pub mod error;
pub mod fmt;
pub mod importer;
pub mod ledger;
pub mod models;
pub mod settings;
pub mod template;
