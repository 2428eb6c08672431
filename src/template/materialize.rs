use super::binding::{bind, Binding};
use super::schema::Record;
use super::value::Value;
use crate::error::{Error, Result};

/// Build one `T` from a data row whose cells line up with `columns`.
///
/// Bound fields receive their coerced cell; unbound fields get the schema
/// default when one is registered and otherwise keep `T::default()`. A row
/// shorter than the bound columns require is a [`Error::RowShape`]; a cell
/// that does not parse as its field's kind is a [`Error::Format`].
pub fn materialize<T, C, V>(columns: &[C], values: &[V]) -> Result<T>
where
    T: Record,
    C: AsRef<str>,
    V: AsRef<str>,
{
    let binding = bind(T::schema().fields(), columns);
    materialize_bound(&binding, values)
}

pub(crate) fn materialize_bound<T, V>(binding: &Binding<'_>, values: &[V]) -> Result<T>
where
    T: Record,
    V: AsRef<str>,
{
    if values.len() < binding.required_width() {
        let short = binding
            .iter()
            .find(|(_, ordinal)| ordinal.is_some_and(|o| o >= values.len()))
            .map_or("", |(field, _)| field.name);
        return Err(row_shape(short));
    }

    let mut record = T::default();
    for (field, ordinal) in binding.iter() {
        let Some(ordinal) = ordinal else {
            if let Some(default) = &field.default {
                record.assign(field, default.clone());
            }
            continue;
        };
        let raw = values
            .get(ordinal)
            .ok_or_else(|| row_shape(field.name))?
            .as_ref();
        let value = Value::parse(field.kind, raw).ok_or_else(|| Error::Format {
            field: field.name.to_string(),
            kind: field.kind,
            value: raw.to_string(),
            line: None,
        })?;
        record.assign(field, value);
    }
    Ok(record)
}

fn row_shape(column: &str) -> Error {
    Error::RowShape {
        column: column.to_string(),
        line: None,
    }
}

#[cfg(test)]
mod tests {
    use std::sync::OnceLock;

    use chrono::NaiveDate;

    use super::*;
    use crate::template::schema::{FieldDescriptor, Schema};
    use crate::template::value::ValueKind;

    #[derive(Debug, Default, PartialEq)]
    struct Sample {
        name: String,
        amount: i64,
        date: Option<NaiveDate>,
        active: bool,
        score: f64,
    }

    impl Record for Sample {
        fn schema() -> &'static Schema {
            static SCHEMA: OnceLock<Schema> = OnceLock::new();
            SCHEMA.get_or_init(|| {
                Schema::builder()
                    .field("Name", ValueKind::Text)
                    .required()
                    .field("Amount", ValueKind::Integer)
                    .required()
                    .field("Date", ValueKind::Date)
                    .field("Active", ValueKind::Boolean)
                    .default_value(Value::Boolean(true))
                    .field("Score", ValueKind::Float)
                    .build()
            })
        }

        fn assign(&mut self, field: &FieldDescriptor, value: Value) {
            match (field.name, value) {
                ("Name", Value::Text(v)) => self.name = v,
                ("Amount", Value::Integer(v)) => self.amount = v,
                ("Date", Value::Date(v)) => self.date = Some(v),
                ("Active", Value::Boolean(v)) => self.active = v,
                ("Score", Value::Float(v)) => self.score = v,
                _ => {}
            }
        }
    }

    #[test]
    fn test_materialize_assigns_bound_values() {
        let sample: Sample =
            materialize(&["Name", "Amount", "Date"], &["Harsh", "1", "2024-01-01"]).unwrap();
        assert_eq!(sample.name, "Harsh");
        assert_eq!(sample.amount, 1);
        assert_eq!(sample.date, NaiveDate::from_ymd_opt(2024, 1, 1));
    }

    #[test]
    fn test_materialize_follows_column_order_not_declaration_order() {
        let sample: Sample = materialize(&["amount", "SCORE", "name"], &["7", "2.5", "x"]).unwrap();
        assert_eq!(sample.amount, 7);
        assert_eq!(sample.score, 2.5);
        assert_eq!(sample.name, "x");
    }

    #[test]
    fn test_unbound_fields_keep_defaults() {
        let sample: Sample = materialize(&["Name"], &["only"]).unwrap();
        assert_eq!(sample.amount, 0);
        assert_eq!(sample.date, None);
        assert_eq!(sample.score, 0.0);
        // Registered default overrides the type default.
        assert!(sample.active);
    }

    #[test]
    fn test_bound_value_overrides_registered_default() {
        let sample: Sample = materialize(&["Active"], &["false"]).unwrap();
        assert!(!sample.active);
    }

    #[test]
    fn test_extra_values_ignored() {
        let sample: Sample = materialize(&["Name"], &["a", "b", "c", "d"]).unwrap();
        assert_eq!(sample.name, "a");
    }

    #[test]
    fn test_missing_value_is_row_shape_error() {
        let err = materialize::<Sample, _, _>(&["Name", "Amount"], &["a"]).unwrap_err();
        match err {
            Error::RowShape { column, line } => {
                assert_eq!(column, "Amount");
                assert_eq!(line, None);
            }
            other => panic!("expected RowShape, got {other:?}"),
        }
    }

    #[test]
    fn test_short_row_is_row_shape_before_any_cell_is_parsed() {
        let err = materialize::<Sample, _, _>(&["Amount", "Name"], &["NotAnInt"]).unwrap_err();
        assert!(matches!(err, Error::RowShape { ref column, .. } if column == "Name"));
    }

    #[test]
    fn test_unparseable_value_is_format_error() {
        let err =
            materialize::<Sample, _, _>(&["Name", "Amount"], &["a", "NotAnInt"]).unwrap_err();
        match err {
            Error::Format { field, kind, value, .. } => {
                assert_eq!(field, "Amount");
                assert_eq!(kind, ValueKind::Integer);
                assert_eq!(value, "NotAnInt");
            }
            other => panic!("expected Format, got {other:?}"),
        }
    }

    #[test]
    fn test_unknown_columns_do_not_need_values() {
        let sample: Sample =
            materialize(&["Name", "Notes", "Amount"], &["a", "ignored", "3"]).unwrap();
        assert_eq!(sample.amount, 3);
    }
}
