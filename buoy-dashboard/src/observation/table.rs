//! Whitespace-delimited NDBC text tables.
//!
//! Realtime files start with a header line naming the columns (the first
//! name carries a leading `#`, as in `#YY`) followed by a units line. Rows
//! are numbered with the units line as row 0, so row 1 is the first
//! observation, which upstream publishes newest-first.

use super::error::ParseError;

/// Missing-value sentinel used throughout the NDBC feeds.
pub const MISSING: &str = "MM";

/// A tokenized table borrowing from the file contents.
#[derive(Debug)]
pub(crate) struct Table<'a> {
    columns: Vec<&'a str>,
    units: Option<Vec<&'a str>>,
    rows: Vec<Row<'a>>,
}

/// One observation line.
#[derive(Debug)]
pub(crate) struct Row<'a> {
    /// Row number, units row = 0.
    pub number: usize,
    pub fields: Vec<&'a str>,
}

impl<'a> Table<'a> {
    /// Split `contents` into header, units and observation rows.
    ///
    /// Blank lines are ignored. Fails only when there is no header line.
    pub fn parse(contents: &'a str) -> Result<Self, ParseError> {
        let mut lines = contents.lines().filter(|l| !l.trim().is_empty());

        let header = lines
            .next()
            .ok_or_else(|| ParseError::schema("file has no header row"))?;
        let columns = header
            .split_whitespace()
            .map(|name| name.trim_start_matches('#'))
            .collect();

        let units = lines
            .next()
            .map(|line| line.split_whitespace().collect());

        let rows = lines
            .enumerate()
            .map(|(i, line)| Row {
                number: i + 1,
                fields: line.split_whitespace().collect(),
            })
            .collect();

        Ok(Self {
            columns,
            units,
            rows,
        })
    }

    /// Index of the named column.
    pub fn column(&self, name: &str) -> Option<usize> {
        self.columns.iter().position(|c| *c == name)
    }

    /// Indices of all named columns, or a schema error naming the missing ones.
    pub fn require<const N: usize>(&self, names: [&str; N]) -> Result<[usize; N], ParseError> {
        let missing: Vec<&str> = names
            .iter()
            .copied()
            .filter(|n| self.column(n).is_none())
            .collect();
        if !missing.is_empty() {
            return Err(ParseError::schema(format!(
                "missing column(s): {}",
                missing.join(", ")
            )));
        }
        Ok(names.map(|n| self.column(n).unwrap_or_default()))
    }

    /// The unit label of a column, if the units row covers it.
    pub fn unit(&self, column: usize) -> Option<&'a str> {
        self.units
            .as_ref()
            .and_then(|u| u.get(column))
            .map(|u| u.trim_start_matches('#'))
    }

    pub fn has_units(&self) -> bool {
        self.units.is_some()
    }

    pub fn rows(&self) -> &[Row<'a>] {
        &self.rows
    }

    pub fn row(&self, number: usize) -> Option<&Row<'a>> {
        self.rows.iter().find(|r| r.number == number)
    }
}

impl Row<'_> {
    pub fn get(&self, column: usize) -> Option<&str> {
        self.fields.get(column).copied()
    }
}
