//! Driver-independent result rows.

/// A single column value, reduced to what callers of this crate inspect.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CqlField {
    Text(String),
    Boolean(bool),
    Null,
    /// Any other CQL type, kept in its debug rendering.
    Other(String),
}

/// One result row; columns keep the order of the result metadata.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Row {
    columns: Vec<(String, CqlField)>,
}

impl Row {
    pub fn new(columns: Vec<(String, CqlField)>) -> Self {
        Self { columns }
    }

    /// Add a column.
    #[must_use]
    pub fn with(mut self, name: impl Into<String>, value: CqlField) -> Self {
        self.columns.push((name.into(), value));
        self
    }

    #[must_use]
    pub fn get(&self, column: &str) -> Option<&CqlField> {
        self.columns
            .iter()
            .find(|(name, _)| name == column)
            .map(|(_, value)| value)
    }

    /// Value of a text column; `None` if absent, null, or not text.
    #[must_use]
    pub fn text(&self, column: &str) -> Option<&str> {
        match self.get(column) {
            Some(CqlField::Text(value)) => Some(value.as_str()),
            _ => None,
        }
    }

    /// Value of a boolean column; `None` if absent, null, or not boolean.
    #[must_use]
    pub fn boolean(&self, column: &str) -> Option<bool> {
        match self.get(column) {
            Some(CqlField::Boolean(value)) => Some(*value),
            _ => None,
        }
    }
}

/// Finite, single-pass sequence of rows returned by one statement.
#[derive(Debug, Default)]
pub struct RowSequence {
    rows: std::vec::IntoIter<Row>,
}

impl RowSequence {
    /// The result of a statement that returns no rows.
    #[must_use]
    pub fn empty() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn from_rows(rows: Vec<Row>) -> Self {
        Self {
            rows: rows.into_iter(),
        }
    }
}

impl Iterator for RowSequence {
    type Item = Row;

    fn next(&mut self) -> Option<Self::Item> {
        self.rows.next()
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        self.rows.size_hint()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_typed_accessors() {
        let row = Row::default()
            .with("name", CqlField::Text("cassandra".into()))
            .with("super", CqlField::Boolean(true))
            .with("datacenters", CqlField::Other("Text(\"ALL\")".into()));

        assert_eq!(row.text("name"), Some("cassandra"));
        assert_eq!(row.boolean("super"), Some(true));
        assert_eq!(row.boolean("name"), None);
        assert_eq!(row.text("missing"), None);
        assert!(matches!(row.get("datacenters"), Some(CqlField::Other(_))));
    }

    #[test]
    fn test_sequence_is_single_pass() {
        let mut rows = RowSequence::from_rows(vec![Row::default(), Row::default()]);
        assert_eq!(rows.by_ref().count(), 2);
        assert!(rows.next().is_none());
    }
}
