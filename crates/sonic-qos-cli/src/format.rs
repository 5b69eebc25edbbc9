//! Plain-text table rendering and natural ordering for show output.

use std::cmp::Ordering;

/// Spaces between columns.
const COLUMN_SEPARATOR: &str = "  ";

/// Minimum padding added to every header.
const HEADER_PADDING: usize = 2;

/// Compares strings treating digit runs as numbers, so `Ethernet4` sorts
/// before `Ethernet12`.
pub fn natural_cmp(a: &str, b: &str) -> Ordering {
    let mut a_chunks = Chunks::new(a);
    let mut b_chunks = Chunks::new(b);

    loop {
        match (a_chunks.next(), b_chunks.next()) {
            (None, None) => return a.cmp(b),
            (None, Some(_)) => return Ordering::Less,
            (Some(_), None) => return Ordering::Greater,
            (Some(x), Some(y)) => {
                let ord = match (is_number(x), is_number(y)) {
                    (true, true) => compare_numbers(x, y),
                    (true, false) => Ordering::Less,
                    (false, true) => Ordering::Greater,
                    (false, false) => x.cmp(y),
                };
                if ord != Ordering::Equal {
                    return ord;
                }
            }
        }
    }
}

/// Sorts `items` in natural order.
pub fn natural_sort<T: AsRef<str>>(items: &mut [T]) {
    items.sort_by(|a, b| natural_cmp(a.as_ref(), b.as_ref()));
}

fn is_number(chunk: &str) -> bool {
    chunk.bytes().next().is_some_and(|b| b.is_ascii_digit())
}

fn compare_numbers(x: &str, y: &str) -> Ordering {
    let x = x.trim_start_matches('0');
    let y = y.trim_start_matches('0');
    x.len().cmp(&y.len()).then_with(|| x.cmp(y))
}

/// Splits a string into alternating digit and non-digit runs.
struct Chunks<'a> {
    rest: &'a str,
}

impl<'a> Chunks<'a> {
    fn new(s: &'a str) -> Self {
        Self { rest: s }
    }
}

impl<'a> Iterator for Chunks<'a> {
    type Item = &'a str;

    fn next(&mut self) -> Option<&'a str> {
        let first = self.rest.chars().next()?;
        let digits = first.is_ascii_digit();
        let end = self
            .rest
            .find(|c: char| c.is_ascii_digit() != digits)
            .unwrap_or(self.rest.len());
        let (chunk, rest) = self.rest.split_at(end);
        self.rest = rest;
        Some(chunk)
    }
}

/// Column alignment.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Align {
    Left,
    Right,
}

/// Table with a header row, rendered in the simple style:
///
/// ```text
///   TC    Queue
/// ----  -------
///    0        0
/// ```
///
/// Columns whose cells are all numbers are right aligned.
#[derive(Debug, Clone, Default)]
pub struct Table {
    headers: Vec<String>,
    rows: Vec<Vec<String>>,
}

impl Table {
    /// Creates a table with the given headers.
    pub fn new<I, S>(headers: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            headers: headers.into_iter().map(Into::into).collect(),
            rows: Vec::new(),
        }
    }

    /// Appends a row. Missing cells render empty.
    pub fn add_row<I, S>(&mut self, row: I)
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.rows.push(row.into_iter().map(Into::into).collect());
    }

    /// Returns true if no rows were added.
    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    fn cell(&self, row: usize, col: usize) -> &str {
        self.rows[row].get(col).map(String::as_str).unwrap_or("")
    }

    fn align(&self, col: usize) -> Align {
        let numeric = !self.rows.is_empty()
            && (0..self.rows.len()).all(|row| self.cell(row, col).trim().parse::<f64>().is_ok());
        if numeric {
            Align::Right
        } else {
            Align::Left
        }
    }

    fn width(&self, col: usize) -> usize {
        let header = self.headers[col].chars().count() + HEADER_PADDING;
        (0..self.rows.len())
            .map(|row| self.cell(row, col).chars().count())
            .fold(header, usize::max)
    }

    /// Renders the table without a trailing newline.
    pub fn render(&self) -> String {
        let layout: Vec<(usize, Align)> = (0..self.headers.len())
            .map(|col| (self.width(col), self.align(col)))
            .collect();

        let line = |cells: &mut dyn Iterator<Item = &str>| -> String {
            let padded: Vec<String> = cells
                .zip(&layout)
                .map(|(cell, (width, align))| match align {
                    Align::Left => format!("{:<width$}", cell, width = *width),
                    Align::Right => format!("{:>width$}", cell, width = *width),
                })
                .collect();
            padded.join(COLUMN_SEPARATOR).trim_end().to_string()
        };

        let mut lines = Vec::with_capacity(self.rows.len() + 2);
        lines.push(line(&mut self.headers.iter().map(String::as_str)));
        lines.push(
            layout
                .iter()
                .map(|(width, _)| "-".repeat(*width))
                .collect::<Vec<_>>()
                .join(COLUMN_SEPARATOR),
        );
        for row in 0..self.rows.len() {
            lines.push(line(
                &mut (0..self.headers.len()).map(|col| self.cell(row, col)),
            ));
        }

        lines.join("\n")
    }
}
