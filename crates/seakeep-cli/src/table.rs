//! Summary table kept across batch runs.
//!
//! One row per wave frequency. Rerunning a batch replaces the rows whose
//! key matches and keeps the rest, so a summary can be built up over several
//! directories.

use anyhow::{Context, Result};
use std::cmp::Ordering;
use std::path::Path;

const KEY_TOLERANCE: f64 = 1e-9;

#[derive(Debug, Clone, PartialEq)]
pub struct SummaryRow {
    pub key: String,
    pub fields: Vec<String>,
}

impl SummaryRow {
    pub fn new(key: impl Into<String>, values: &[f64]) -> Self {
        Self {
            key: key.into(),
            fields: values.iter().map(|v| format!("{}", v)).collect(),
        }
    }

    fn numeric_key(&self) -> Option<f64> {
        self.key.trim().parse::<f64>().ok()
    }

    fn same_key(&self, other: &SummaryRow) -> bool {
        match (self.numeric_key(), other.numeric_key()) {
            (Some(a), Some(b)) => (a - b).abs() <= KEY_TOLERANCE,
            _ => self.key.trim() == other.key.trim(),
        }
    }
}

/// Numeric keys ascending, then non-numeric keys as strings
fn key_order(a: &SummaryRow, b: &SummaryRow) -> Ordering {
    match (a.numeric_key(), b.numeric_key()) {
        (Some(x), Some(y)) => x.total_cmp(&y),
        (Some(_), None) => Ordering::Less,
        (None, Some(_)) => Ordering::Greater,
        (None, None) => a.key.cmp(&b.key),
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct SummaryTable {
    pub header: Vec<String>,
    pub rows: Vec<SummaryRow>,
}

impl SummaryTable {
    pub fn new(header: &[&str]) -> Self {
        Self {
            header: header.iter().map(|s| s.to_string()).collect(),
            rows: Vec::new(),
        }
    }

    /// Parse CSV text; an empty text gives an empty table with `header`
    pub fn parse(text: &str, header: &[&str]) -> Self {
        let mut lines = text
            .lines()
            .map(|l| l.trim_start_matches('\u{feff}'))
            .filter(|l| !l.trim().is_empty());

        let mut table = match lines.next() {
            Some(first) => Self {
                header: first.split(',').map(|f| f.trim().to_string()).collect(),
                rows: Vec::new(),
            },
            None => return Self::new(header),
        };

        for line in lines {
            let mut fields = line.split(',').map(|f| f.trim().to_string());
            if let Some(key) = fields.next() {
                table.rows.push(SummaryRow {
                    key,
                    fields: fields.collect(),
                });
            }
        }
        table
    }

    /// Load from `path`, or start empty when the file does not exist
    pub fn load(path: &Path, header: &[&str]) -> Result<Self> {
        if !path.exists() {
            return Ok(Self::new(header));
        }
        let bytes = std::fs::read(path).with_context(|| format!("reading {}", path.display()))?;
        Ok(Self::parse(&String::from_utf8_lossy(&bytes), header))
    }

    /// Replace the row with the same key, or append
    pub fn upsert(&mut self, row: SummaryRow) {
        match self.rows.iter_mut().find(|r| r.same_key(&row)) {
            Some(existing) => *existing = row,
            None => self.rows.push(row),
        }
    }

    pub fn sort(&mut self) {
        self.rows.sort_by(key_order);
    }

    pub fn to_csv(&self) -> String {
        let mut out = self.header.join(",");
        out.push('\n');
        for row in &self.rows {
            out.push_str(&row.key);
            for field in &row.fields {
                out.push(',');
                out.push_str(field);
            }
            out.push('\n');
        }
        out
    }

    /// Upsert `rows` into the table stored at `path` and write it back sorted
    pub fn merge_into(path: &Path, header: &[&str], rows: Vec<SummaryRow>) -> Result<Self> {
        let mut table = Self::load(path, header)?;
        for row in rows {
            table.upsert(row);
        }
        table.sort();
        std::fs::write(path, table.to_csv()).with_context(|| format!("writing {}", path.display()))?;
        Ok(table)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    const HEADER: &[&str] = &["omega", "mean", "amplitude"];

    #[test]
    fn test_numeric_keys_replace_within_tolerance() {
        let mut table = SummaryTable::new(HEADER);
        table.upsert(SummaryRow::new("0.45", &[1.0, 2.0]));
        table.upsert(SummaryRow::new("0.4500000000001", &[3.0, 4.0]));
        assert_eq!(table.rows.len(), 1);
        assert_eq!(table.rows[0].fields, vec!["3", "4"]);

        table.upsert(SummaryRow::new("0.46", &[5.0, 6.0]));
        assert_eq!(table.rows.len(), 2);
    }

    #[test]
    fn test_sort_puts_text_keys_last() {
        let mut table = SummaryTable::new(HEADER);
        table.upsert(SummaryRow::new("note", &[0.0, 0.0]));
        table.upsert(SummaryRow::new("1.2", &[0.0, 0.0]));
        table.upsert(SummaryRow::new("0.3", &[0.0, 0.0]));
        table.upsert(SummaryRow::new("avg", &[0.0, 0.0]));
        table.sort();
        let keys: Vec<&str> = table.rows.iter().map(|r| r.key.as_str()).collect();
        assert_eq!(keys, vec!["0.3", "1.2", "avg", "note"]);
    }

    #[test]
    fn test_merge_into_file() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("summary.csv");

        SummaryTable::merge_into(&path, HEADER, vec![SummaryRow::new("0.5", &[10.0, 1.0])]).unwrap();
        let table = SummaryTable::merge_into(
            &path,
            HEADER,
            vec![
                SummaryRow::new("0.4", &[8.0, 0.5]),
                SummaryRow::new("0.5", &[11.0, 1.5]),
            ],
        )
        .unwrap();

        assert_eq!(table.rows.len(), 2);
        let text = std::fs::read_to_string(&path).unwrap();
        assert_eq!(text, "omega,mean,amplitude\n0.4,8,0.5\n0.5,11,1.5\n");
    }

    #[test]
    fn test_existing_header_is_kept() {
        let table = SummaryTable::parse("\u{feff}频率,阻力\n0.3,5\n", HEADER);
        assert_eq!(table.header, vec!["频率", "阻力"]);
        assert_eq!(table.rows[0].key, "0.3");
    }
}
