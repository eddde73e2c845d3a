//! Read-only access to the HR dataset.
//!
//! Callers depend on [`TabularGateway`] only; [`SqliteGateway`] is the production
//! implementation and tests substitute their own.

pub mod demo;
pub mod guardrail;
pub mod schema;
pub mod sqlite;

use std::fmt::{Display, Formatter};

pub use sqlite::SqliteGateway;

pub const NO_RESULTS_TEXT: &str = "No results found.";

#[derive(Debug, Clone, PartialEq)]
pub enum Scalar {
    Null,
    Integer(i64),
    Real(f64),
    Text(String),
}

impl Display for Scalar {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Null => f.write_str("NULL"),
            Self::Integer(value) => write!(f, "{value}"),
            Self::Real(value) if is_whole_real(*value) => write!(f, "{value:.1}"),
            Self::Real(value) => write!(f, "{value}"),
            Self::Text(value) => f.write_str(value),
        }
    }
}

/// One result row; column order follows the query's projection.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Record {
    fields: Vec<(String, Scalar)>,
}

impl Record {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn with(mut self, column: impl Into<String>, value: Scalar) -> Self {
        self.push(column, value);
        self
    }

    pub fn push(&mut self, column: impl Into<String>, value: Scalar) {
        self.fields.push((column.into(), value));
    }

    #[must_use]
    pub fn get(&self, column: &str) -> Option<&Scalar> {
        self.fields
            .iter()
            .find(|(name, _)| name == column)
            .map(|(_, value)| value)
    }

    pub fn columns(&self) -> impl Iterator<Item = &str> {
        self.fields.iter().map(|(name, _)| name.as_str())
    }

    pub fn values(&self) -> impl Iterator<Item = &Scalar> {
        self.fields.iter().map(|(_, value)| value)
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.fields.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum GatewayError {
    /// The backing file or connection cannot be opened.
    StoreUnavailable(String),
    /// Syntax or runtime fault; carries the engine's raw message.
    QueryExecution(String),
}

impl GatewayError {
    #[must_use]
    pub fn is_store_unavailable(&self) -> bool {
        matches!(self, Self::StoreUnavailable(_))
    }

    #[must_use]
    pub fn message(&self) -> &str {
        match self {
            Self::StoreUnavailable(message) | Self::QueryExecution(message) => message,
        }
    }
}

impl Display for GatewayError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::StoreUnavailable(message) => write!(f, "HR store unavailable: {message}"),
            Self::QueryExecution(message) => write!(f, "query execution failed: {message}"),
        }
    }
}

impl std::error::Error for GatewayError {}

pub trait TabularGateway: Send + Sync {
    fn dialect(&self) -> &str {
        "sqlite"
    }

    /// Table names with their ordered `(column, declared type)` pairs.
    fn describe_schema(&self) -> Result<String, GatewayError>;

    fn execute(&self, query: &str) -> Result<Vec<Record>, GatewayError>;

    fn render(&self, rows: &[Record]) -> String {
        render_rows(rows)
    }
}

/// Fixed-width, pipe-delimited table. Header names come from the first row;
/// cells are taken by position so repeated column names keep their own values.
#[must_use]
pub fn render_rows(rows: &[Record]) -> String {
    let Some(first) = rows.first() else {
        return NO_RESULTS_TEXT.to_string();
    };

    let columns = first.columns().map(str::to_string).collect::<Vec<_>>();
    let cells = rows
        .iter()
        .map(|row| {
            let mut values = row.values().map(ToString::to_string).collect::<Vec<_>>();
            values.resize(columns.len(), String::new());
            values
        })
        .collect::<Vec<_>>();

    let widths = columns
        .iter()
        .enumerate()
        .map(|(index, column)| {
            cells
                .iter()
                .map(|row| display_width(&row[index]))
                .fold(display_width(column), usize::max)
        })
        .collect::<Vec<_>>();

    let header = columns
        .iter()
        .zip(&widths)
        .map(|(column, width)| pad_right(column, *width))
        .collect::<Vec<_>>()
        .join(" | ");
    let separator = widths
        .iter()
        .map(|width| "-".repeat(*width))
        .collect::<Vec<_>>()
        .join("-+-");

    let mut lines = Vec::with_capacity(rows.len() + 2);
    lines.push(header);
    lines.push(separator);
    for row in &cells {
        lines.push(
            row.iter()
                .zip(&widths)
                .map(|(value, width)| pad_right(value, *width))
                .collect::<Vec<_>>()
                .join(" | "),
        );
    }
    lines.join("\n")
}

fn is_whole_real(value: f64) -> bool {
    value.is_finite() && value.fract() == 0.0 && value.abs() < 1e15
}

fn display_width(value: &str) -> usize {
    value.chars().count()
}

fn pad_right(value: &str, width: usize) -> String {
    let padding = width.saturating_sub(display_width(value));
    format!("{value}{}", " ".repeat(padding))
}

#[cfg(test)]
mod tests {
    use super::{NO_RESULTS_TEXT, Record, Scalar, render_rows};

    fn department_row(department: &str, count: i64) -> Record {
        Record::new()
            .with("department", Scalar::Text(department.to_string()))
            .with("count", Scalar::Integer(count))
    }

    #[test]
    fn empty_rows_render_fixed_message() {
        assert_eq!(render_rows(&[]), NO_RESULTS_TEXT);
    }

    #[test]
    fn renders_header_separator_and_padded_rows() {
        let rows = vec![department_row("Customer Support", 12345), department_row("IT", 67890)];

        insta::assert_snapshot!(render_rows(&rows), @r"
        department       | count
        -----------------+------
        Customer Support | 12345
        IT               | 67890
        ");
    }

    #[test]
    fn separator_matches_header_width_and_row_count() {
        let rows = vec![
            department_row("HR", 1),
            department_row("Finance", 22),
            department_row("R&D", 333),
        ];
        let rendered = render_rows(&rows);
        let lines = rendered.lines().collect::<Vec<_>>();

        assert_eq!(lines.len(), rows.len() + 2);
        assert_eq!(lines[0].chars().count(), lines[1].chars().count());
        assert!(lines[1].chars().all(|ch| ch == '-' || ch == '+'));
        assert_eq!(render_rows(&rows), rendered, "rendering must be deterministic");
    }

    #[test]
    fn scalars_render_null_and_whole_reals_explicitly() {
        assert_eq!(Scalar::Null.to_string(), "NULL");
        assert_eq!(Scalar::Real(15.0).to_string(), "15.0");
        assert_eq!(Scalar::Real(15.38).to_string(), "15.38");
        assert_eq!(Scalar::Integer(-4).to_string(), "-4");
    }

    #[test]
    fn missing_cells_render_blank() {
        let rows = vec![
            department_row("IT", 5),
            Record::new().with("department", Scalar::Text("HR".to_string())),
        ];
        let rendered = render_rows(&rows);
        assert!(rendered.lines().nth(3).is_some_and(|line| line.starts_with("HR")));
    }

    #[test]
    fn repeated_column_names_keep_positional_values() {
        let rows = vec![
            Record::new()
                .with("month", Scalar::Text("January".to_string()))
                .with("month", Scalar::Text("March".to_string())),
        ];

        insta::assert_snapshot!(render_rows(&rows), @r"
        month   | month
        --------+------
        January | March
        ");
    }
}
