use super::value::{Value, ValueKind};

/// One bindable field of a record shape.
#[derive(Debug, Clone, PartialEq)]
pub struct FieldDescriptor {
    /// Matched case-insensitively against column headers.
    pub name: &'static str,
    pub kind: ValueKind,
    /// A template without a column for this field fails validation.
    pub required: bool,
    /// Assigned when no column is bound to the field. `None` keeps the
    /// record's `Default` value.
    pub default: Option<Value>,
}

impl FieldDescriptor {
    pub fn matches(&self, column: &str) -> bool {
        names_match(self.name, column)
    }
}

/// Registered field list of a record shape, in declaration order.
#[derive(Debug, Clone, Default)]
pub struct Schema {
    fields: Vec<FieldDescriptor>,
}

impl Schema {
    pub fn builder() -> SchemaBuilder {
        SchemaBuilder { fields: Vec::new() }
    }

    pub fn fields(&self) -> &[FieldDescriptor] {
        &self.fields
    }

    pub fn field(&self, name: &str) -> Option<&FieldDescriptor> {
        self.fields.iter().find(|f| f.matches(name))
    }

    pub fn is_required(&self, name: &str) -> bool {
        self.field(name).is_some_and(|f| f.required)
    }

    /// Header line listing every field, in declaration order.
    pub fn header(&self) -> String {
        self.fields
            .iter()
            .map(|f| f.name)
            .collect::<Vec<_>>()
            .join(",")
    }
}

pub struct SchemaBuilder {
    fields: Vec<FieldDescriptor>,
}

impl SchemaBuilder {
    /// Append an optional field.
    pub fn field(mut self, name: &'static str, kind: ValueKind) -> Self {
        assert!(
            !self.fields.iter().any(|f| f.matches(name)),
            "duplicate template field: {name}"
        );
        self.fields.push(FieldDescriptor {
            name,
            kind,
            required: false,
            default: None,
        });
        self
    }

    /// Mark the most recently added field as required.
    pub fn required(mut self) -> Self {
        if let Some(last) = self.fields.last_mut() {
            last.required = true;
        }
        self
    }

    /// Give the most recently added field an explicit unbound default.
    pub fn default_value(mut self, value: Value) -> Self {
        if let Some(last) = self.fields.last_mut() {
            assert_eq!(
                last.kind,
                value.kind(),
                "default for {} has the wrong kind",
                last.name
            );
            last.default = Some(value);
        }
        self
    }

    pub fn build(self) -> Schema {
        Schema {
            fields: self.fields,
        }
    }
}

/// A record shape the template engine can materialize.
///
/// Implementors register their bindable fields once through [`Record::schema`]
/// (usually a `OnceLock<Schema>`); anything not registered is never bound or
/// validated. `assign` receives values already coerced to the field's kind.
pub trait Record: Default {
    fn schema() -> &'static Schema;

    fn assign(&mut self, field: &FieldDescriptor, value: Value);
}

pub fn describe_shape<T: Record>() -> &'static [FieldDescriptor] {
    T::schema().fields()
}

pub(crate) fn names_match(a: &str, b: &str) -> bool {
    a.eq_ignore_ascii_case(b) || a.to_lowercase() == b.to_lowercase()
}

#[cfg(test)]
mod tests {
    use std::sync::OnceLock;

    use super::*;

    #[allow(dead_code)]
    #[derive(Debug, Default)]
    struct Sample {
        public_prop1: String,
        public_prop2: i64,
        public_field: Option<chrono::NaiveDate>,
        private_prop: f64,
    }

    impl Record for Sample {
        fn schema() -> &'static Schema {
            static SCHEMA: OnceLock<Schema> = OnceLock::new();
            SCHEMA.get_or_init(|| {
                Schema::builder()
                    .field("PublicProp1", ValueKind::Text)
                    .field("PublicProp2", ValueKind::Integer)
                    .required()
                    .field("PublicField", ValueKind::Date)
                    .build()
            })
        }

        fn assign(&mut self, field: &FieldDescriptor, value: Value) {
            match (field.name, value) {
                ("PublicProp1", Value::Text(v)) => self.public_prop1 = v,
                ("PublicProp2", Value::Integer(v)) => self.public_prop2 = v,
                ("PublicField", Value::Date(v)) => self.public_field = Some(v),
                _ => {}
            }
        }
    }

    #[test]
    fn test_describe_shape_returns_only_registered_fields() {
        let fields = describe_shape::<Sample>();
        assert_eq!(fields.len(), 3);
        let names: Vec<_> = fields.iter().map(|f| f.name).collect();
        assert_eq!(names, ["PublicProp1", "PublicProp2", "PublicField"]);
        assert!(Sample::schema().field("PrivateProp").is_none());
    }

    #[test]
    fn test_schema_is_cached_per_shape() {
        assert!(std::ptr::eq(Sample::schema(), Sample::schema()));
    }

    #[test]
    fn test_is_required() {
        let schema = Sample::schema();
        assert!(schema.is_required("PublicProp2"));
        assert!(schema.is_required("publicprop2"));
        assert!(!schema.is_required("PublicProp1"));
        assert!(!schema.is_required("Missing"));
    }

    #[test]
    fn test_header_lists_fields_in_order() {
        assert_eq!(Sample::schema().header(), "PublicProp1,PublicProp2,PublicField");
    }

    #[test]
    fn test_default_value_recorded() {
        let schema = Schema::builder()
            .field("Active", ValueKind::Boolean)
            .default_value(Value::Boolean(true))
            .build();
        assert_eq!(schema.fields()[0].default, Some(Value::Boolean(true)));
    }

    #[test]
    #[should_panic(expected = "duplicate template field")]
    fn test_duplicate_field_names_rejected() {
        Schema::builder()
            .field("Amount", ValueKind::Float)
            .field("amount", ValueKind::Float)
            .build();
    }

    #[test]
    fn test_names_match_ignores_case() {
        assert!(names_match("CategoryName", "categoryname"));
        assert!(names_match("ÉTÉ", "été"));
        assert!(!names_match("Amount", "Amount "));
        assert!(!names_match("Amount", "Amounts"));
    }
}
