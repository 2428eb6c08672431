use super::schema::FieldDescriptor;

/// Column ordinal resolved for every field of a shape. `None` means no
/// header column matched the field.
#[derive(Debug, Clone, PartialEq)]
pub struct Binding<'a> {
    entries: Vec<(&'a FieldDescriptor, Option<usize>)>,
}

impl<'a> Binding<'a> {
    pub fn iter(&self) -> impl Iterator<Item = (&'a FieldDescriptor, Option<usize>)> + '_ {
        self.entries.iter().copied()
    }

    /// Ordinal bound to the named field, `None` when unbound or unknown.
    #[cfg(test)]
    pub fn ordinal(&self, name: &str) -> Option<usize> {
        self.entries
            .iter()
            .find(|(field, _)| field.matches(name))
            .and_then(|(_, ordinal)| *ordinal)
    }

    pub fn unbound(&self) -> impl Iterator<Item = &'a FieldDescriptor> + '_ {
        self.entries
            .iter()
            .filter(|(_, ordinal)| ordinal.is_none())
            .map(|(field, _)| *field)
    }

    /// Minimum number of values a row must carry to fill every bound field.
    pub fn required_width(&self) -> usize {
        self.entries
            .iter()
            .filter_map(|(_, ordinal)| *ordinal)
            .max()
            .map_or(0, |max| max + 1)
    }
}

/// Match each field to the first column whose name equals it ignoring case.
/// Columns no field asks for are ignored.
pub fn bind<'a, C: AsRef<str>>(fields: &'a [FieldDescriptor], columns: &[C]) -> Binding<'a> {
    let entries = fields
        .iter()
        .map(|field| {
            let ordinal = columns.iter().position(|c| field.matches(c.as_ref()));
            (field, ordinal)
        })
        .collect();
    Binding { entries }
}
