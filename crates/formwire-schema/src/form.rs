use formwire_codec::{Field, FieldValue};

/// A decoded form: fields in wire order.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct FormData {
    fields: Vec<Field>,
}

impl FormData {
    pub(crate) fn new(fields: Vec<Field>) -> Self {
        Self { fields }
    }

    /// First field called `name`.
    pub fn get(&self, name: &str) -> Option<&Field> {
        self.fields.iter().find(|field| field.name == name)
    }

    /// Typed value of the first field called `name`.
    pub fn value(&self, name: &str) -> Option<FieldValue> {
        self.get(name).and_then(|field| field.typed_value().ok())
    }

    pub fn iter(&self) -> std::slice::Iter<'_, Field> {
        self.fields.iter()
    }

    pub fn len(&self) -> usize {
        self.fields.len()
    }

    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }

    pub fn into_fields(self) -> Vec<Field> {
        self.fields
    }
}

impl IntoIterator for FormData {
    type Item = Field;
    type IntoIter = std::vec::IntoIter<Field>;

    fn into_iter(self) -> Self::IntoIter {
        self.fields.into_iter()
    }
}

impl<'a> IntoIterator for &'a FormData {
    type Item = &'a Field;
    type IntoIter = std::slice::Iter<'a, Field>;

    fn into_iter(self) -> Self::IntoIter {
        self.fields.iter()
    }
}
