//! Typed import of delimited text templates.
//!
//! A [`Template`] owns one seekable stream whose first line names the columns
//! and whose remaining lines hold data. Columns are matched to the fields a
//! [`Record`] shape registers, ignoring case and order. Two independent calls
//! sit on top:
//!
//! - [`Template::validate`] reports every required field with no column.
//! - [`Template::get_records`] materializes one record per data row.
//!
//! `get_records` does not validate. Callers that need required columns
//! guaranteed must check `validate` first, or use
//! [`Template::validate_and_get_records`], which refuses to read rows from an
//! invalid template.

mod binding;
mod columns;
mod guard;
mod materialize;
mod schema;
mod value;

use std::fmt;
use std::io::{Read, Seek};
use std::marker::PhantomData;
use std::time::Duration;

use tracing::debug;

pub use binding::{bind, Binding};
pub use columns::{for_each_row, parse_columns, Dialect};
pub use guard::{CancelToken, ReadGuard, ReadLimits};
pub use materialize::materialize;
pub use schema::{describe_shape, FieldDescriptor, Record, Schema};
pub use value::{Value, ValueKind};

use crate::error::{Error, Result};

/// A required field with no matching template column.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ValidationError {
    pub message: String,
}

impl ValidationError {
    pub fn missing_column(field: &str) -> Self {
        Self {
            message: format!("Template is missing column for {field}"),
        }
    }
}

impl fmt::Display for ValidationError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.message)
    }
}

/// Import engine bound to one stream and one record shape.
///
/// Not meant for concurrent use; every call rewinds the stream before and
/// after reading, so calls may come in any order and any number of times.
pub struct Template<T, S> {
    stream: S,
    dialect: Dialect,
    limits: ReadLimits,
    columns: Option<Vec<String>>,
    shape: PhantomData<fn() -> T>,
}

impl<T, S> Template<T, S>
where
    T: Record,
    S: Read + Seek,
{
    pub fn new(stream: S) -> Self {
        Self {
            stream,
            dialect: Dialect::default(),
            limits: ReadLimits::default(),
            columns: None,
            shape: PhantomData,
        }
    }

    pub fn with_dialect(mut self, dialect: Dialect) -> Self {
        self.dialect = dialect;
        self
    }

    /// Fail a call with [`Error::TimedOut`] once it has been reading for `timeout`.
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.limits.timeout = Some(timeout);
        self
    }

    pub fn with_cancel(mut self, token: CancelToken) -> Self {
        self.limits.cancel = Some(token);
        self
    }

    /// Header column names, parsed on first use and cached afterwards.
    pub fn columns(&mut self) -> Result<&[String]> {
        let guard = self.limits.arm();
        self.columns_with(&guard)
    }

    fn columns_with(&mut self, guard: &ReadGuard) -> Result<&[String]> {
        if self.columns.is_none() {
            let parsed = parse_columns(&mut self.stream, &self.dialect, guard)?;
            self.columns = Some(parsed);
        }
        Ok(self.columns.as_deref().unwrap_or_default())
    }

    /// One error per required field that no column binds to. Empty when the
    /// template carries every required column.
    pub fn validate(&mut self) -> Result<Vec<ValidationError>> {
        let guard = self.limits.arm();
        let columns = self.columns_with(&guard)?;
        let binding = bind(T::schema().fields(), columns);
        let errors: Vec<ValidationError> = binding
            .unbound()
            .filter(|field| field.required)
            .map(|field| ValidationError::missing_column(field.name))
            .collect();
        debug!(missing = errors.len(), "validated template columns");
        Ok(errors)
    }

    /// Materialize every data row. All or nothing: the first malformed row
    /// fails the whole call.
    pub fn get_records(&mut self) -> Result<Vec<T>> {
        Ok(self
            .get_numbered_records()?
            .into_iter()
            .map(|(_, record)| record)
            .collect())
    }

    /// [`Template::get_records`], with each record paired with the 1-based
    /// file line it was read from.
    pub fn get_numbered_records(&mut self) -> Result<Vec<(usize, T)>> {
        let guard = self.limits.arm();
        let columns = self.columns_with(&guard)?.to_vec();
        let binding = bind(T::schema().fields(), &columns);
        let mut records = Vec::new();
        for_each_row(&mut self.stream, &self.dialect, &guard, |line, values| {
            let record = materialize::materialize_bound(&binding, values)
                .map_err(|e| e.at_line(line))?;
            records.push((line, record));
            Ok(())
        })?;
        debug!(records = records.len(), "materialized template rows");
        Ok(records)
    }

    /// [`Template::get_records`], but fails with [`Error::Validation`] without
    /// reading any row when required columns are missing.
    pub fn validate_and_get_records(&mut self) -> Result<Vec<T>> {
        let errors = self.validate()?;
        if !errors.is_empty() {
            return Err(Error::Validation(errors));
        }
        self.get_records()
    }

    pub fn into_inner(self) -> S {
        self.stream
    }
}
