use std::fmt;

/// Errors surfaced by the tables and algorithms in this crate.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// A table is missing columns that an operation requires.
    #[error("{table} is missing required columns: {}", ColumnList(.columns))]
    MissingColumns {
        table: &'static str,
        columns: Vec<String>,
    },

    /// Field geometry that cannot describe a parallelepiped grid.
    #[error("invalid field geometry: {0}")]
    InvalidGeometry(String),

    /// No solid harmonic is tabulated for this (l, ml).
    #[error("unsupported angular momentum l = {l}, ml = {ml}")]
    UnsupportedAngularMomentum { l: u32, ml: i32 },

    #[error("invalid argument: {0}")]
    InvalidArgument(String),

    #[error("index {index} out of range for {len} entries")]
    IndexOutOfRange { index: usize, len: usize },

    #[error("line {line}: {message}")]
    Parse { line: usize, message: String },

    #[error(transparent)]
    Io(#[from] std::io::Error),

    #[error(transparent)]
    Json(#[from] serde_json::Error),
}

pub type Result<T> = std::result::Result<T, Error>;

impl Error {
    pub(crate) fn missing_columns<I, S>(table: &'static str, columns: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let mut columns = columns.into_iter().map(Into::into).collect::<Vec<_>>();
        columns.sort();
        Self::MissingColumns { table, columns }
    }
}

struct ColumnList<'a>(&'a [String]);

impl fmt::Display for ColumnList<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (i, column) in self.0.iter().enumerate() {
            if i > 0 {
                f.write_str(", ")?;
            }
            write!(f, "{column:?}")?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::Error;

    #[test]
    fn missing_columns_are_sorted_and_listed() {
        let error = Error::missing_columns("Frame", ["rz", "ox", "rx"]);
        assert_eq!(
            error.to_string(),
            r#"Frame is missing required columns: "ox", "rx", "rz""#
        );
    }
}
