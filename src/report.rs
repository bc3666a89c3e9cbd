//! Plain-text tabular reports.

use std::fmt;

/// A query result: optional title, free-text lines and a table.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Report {
    pub title: Option<String>,
    pub lines: Vec<String>,
    pub headers: Vec<String>,
    pub rows: Vec<Vec<String>>,
}

impl Report {
    /// A table with the given column headers and no rows yet.
    pub fn table<S: Into<String>>(headers: impl IntoIterator<Item = S>) -> Self {
        Self {
            headers: headers.into_iter().map(Into::into).collect(),
            ..Self::default()
        }
    }

    /// A report made only of text lines.
    pub fn text<S: Into<String>>(lines: impl IntoIterator<Item = S>) -> Self {
        Self {
            lines: lines.into_iter().map(Into::into).collect(),
            ..Self::default()
        }
    }

    pub fn with_title(mut self, title: impl Into<String>) -> Self {
        self.title = Some(title.into());
        self
    }

    pub fn push_row<S: Into<String>>(&mut self, row: impl IntoIterator<Item = S>) {
        self.rows.push(row.into_iter().map(Into::into).collect());
    }

    fn column_widths(&self) -> Vec<usize> {
        let columns = self
            .rows
            .iter()
            .map(Vec::len)
            .chain(std::iter::once(self.headers.len()))
            .max()
            .unwrap_or(0);

        (0..columns)
            .map(|col| {
                self.rows
                    .iter()
                    .filter_map(|row| row.get(col))
                    .chain(self.headers.get(col))
                    .map(|cell| cell.chars().count())
                    .max()
                    .unwrap_or(0)
            })
            .collect()
    }
}

fn is_numeric(cell: &str) -> bool {
    cell.parse::<f64>().is_ok()
}

fn write_row(f: &mut fmt::Formatter<'_>, cells: &[String], widths: &[usize]) -> fmt::Result {
    let line = widths
        .iter()
        .enumerate()
        .map(|(col, &width)| {
            let cell = cells.get(col).map(String::as_str).unwrap_or("");
            if is_numeric(cell) {
                format!("{:>width$}", cell, width = width)
            } else {
                format!("{:<width$}", cell, width = width)
            }
        })
        .collect::<Vec<_>>()
        .join("  ");
    writeln!(f, "{}", line.trim_end())
}

impl fmt::Display for Report {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if let Some(title) = &self.title {
            writeln!(f, "{}", title)?;
        }
        for line in &self.lines {
            writeln!(f, "{}", line)?;
        }
        if self.headers.is_empty() && self.rows.is_empty() {
            return Ok(());
        }

        let widths = self.column_widths();
        // Headers are never right-aligned
        let header_line = widths
            .iter()
            .enumerate()
            .map(|(col, &width)| {
                let cell = self.headers.get(col).map(String::as_str).unwrap_or("");
                format!("{:<width$}", cell, width = width)
            })
            .collect::<Vec<_>>()
            .join("  ");
        writeln!(f, "{}", header_line.trim_end())?;

        let rule = widths
            .iter()
            .map(|&w| "-".repeat(w))
            .collect::<Vec<_>>()
            .join("  ");
        writeln!(f, "{}", rule)?;

        for row in &self.rows {
            write_row(f, row, &widths)?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_table_layout() {
        let mut report = Report::table(["Collection", "Count"]);
        report.push_row(["Users", "182"]);
        report.push_row(["Trackpoints", "9681756"]);

        let text = report.to_string();
        let lines: Vec<&str> = text.lines().collect();
        assert_eq!(lines[0], "Collection   Count");
        assert_eq!(lines[1], "-----------  -------");
        assert_eq!(lines[2], "Users            182");
        assert_eq!(lines[3], "Trackpoints  9681756");
    }

    #[test]
    fn test_text_report_with_title() {
        let report = Report::text(["Average: 3.50"]).with_title("Activities per user");
        assert_eq!(report.to_string(), "Activities per user\nAverage: 3.50\n");
    }

    #[test]
    fn test_empty_table_prints_headers() {
        let report = Report::table(["Users"]);
        assert_eq!(report.to_string(), "Users\n-----\n");
    }
}
