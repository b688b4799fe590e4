//! Plain-text rendering for reports.

use metalledger_core::{timestamp, NaiveDateTime};
use rust_decimal::Decimal;
use std::io::{self, Write};

/// Render a money amount with two decimals.
#[must_use]
pub fn money(value: Decimal) -> String {
    format!("{value:.2}")
}

/// Render a quantity or price without trailing zeros.
#[must_use]
pub fn number(value: Decimal) -> String {
    value.normalize().to_string()
}

/// Render a percentage.
#[must_use]
pub fn percent(value: Decimal) -> String {
    format!("{value:.2}%")
}

/// Render a timestamp the way it is stored.
#[must_use]
pub fn when(value: &NaiveDateTime) -> String {
    timestamp::format(value).replace('T', " ")
}

/// Column alignment.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Align {
    /// Text columns.
    Left,
    /// Numeric columns.
    Right,
}

/// A text table sized to its widest cell.
#[derive(Debug, Default)]
pub struct Table {
    headers: Vec<&'static str>,
    align: Vec<Align>,
    rows: Vec<Vec<String>>,
}

impl Table {
    /// Create a table with the given columns.
    #[must_use]
    pub fn new(columns: &[(&'static str, Align)]) -> Self {
        Self {
            headers: columns.iter().map(|(h, _)| *h).collect(),
            align: columns.iter().map(|(_, a)| *a).collect(),
            rows: Vec::new(),
        }
    }

    /// Append a row. Missing cells render empty.
    pub fn row(&mut self, cells: Vec<String>) {
        self.rows.push(cells);
    }

    /// Check if the table has no rows.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    /// Write the header, separator and rows.
    pub fn write<W: Write>(&self, writer: &mut W) -> io::Result<()> {
        let mut widths: Vec<usize> = self.headers.iter().map(|h| h.chars().count()).collect();
        for row in &self.rows {
            for (i, cell) in row.iter().enumerate().take(widths.len()) {
                widths[i] = widths[i].max(cell.chars().count());
            }
        }

        let headers: Vec<String> = self.headers.iter().map(ToString::to_string).collect();
        self.write_line(writer, &headers, &widths)?;
        let rule: Vec<String> = widths.iter().map(|w| "-".repeat(*w)).collect();
        self.write_line(writer, &rule, &widths)?;
        for row in &self.rows {
            self.write_line(writer, row, &widths)?;
        }
        Ok(())
    }

    fn write_line<W: Write>(&self, writer: &mut W, cells: &[String], widths: &[usize]) -> io::Result<()> {
        let mut line = String::new();
        for (i, width) in widths.iter().enumerate() {
            if i > 0 {
                line.push_str("  ");
            }
            let cell = cells.get(i).map_or("", String::as_str);
            match self.align[i] {
                Align::Left => line.push_str(&format!("{cell:<width$}")),
                Align::Right => line.push_str(&format!("{cell:>width$}")),
            }
        }
        writeln!(writer, "{}", line.trim_end())
    }
}

/// Write a report title underlined to a fixed width.
pub fn heading<W: Write>(writer: &mut W, title: &str) -> io::Result<()> {
    writeln!(writer, "{title}")?;
    writeln!(writer, "{}", "=".repeat(60))
}
