//! Text Ingest
//!
//! Parsers for the two text inputs of the pipeline:
//!
//! - **Time histories**: whitespace-separated columns, time in column 0 and
//!   response channels at fixed positions. Header lines, overflow rows
//!   (fields printed as `*****`) and short rows are skipped.
//! - **Frequency tables**: one header row followed by one row per frequency,
//!   comma-, tab- or whitespace-separated. Columns are bound to roles once,
//!   from the header, before any row is read.
//!
//! Decoding bytes to text is left to the caller.

use crate::config::{ColumnRoles, ColumnSelector};
use crate::spectral::FrequencyNode;
use crate::types::{ProcessError, ProcessResult, TimeSeries};
use serde::Serialize;
use tracing::{debug, warn};

/// Values of one requested column
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ChannelData {
    /// Zero-based column in the source text
    pub column: usize,
    pub values: Vec<f64>,
}

/// Parsed time history: a shared time axis and the requested channels
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TimeHistory {
    pub time: Vec<f64>,
    pub channels: Vec<ChannelData>,
}

impl TimeHistory {
    pub fn len(&self) -> usize {
        self.time.len()
    }

    pub fn is_empty(&self) -> bool {
        self.time.is_empty()
    }

    /// Series for a source column, if it was requested
    pub fn channel(&self, column: usize) -> Option<TimeSeries> {
        let data = self.channels.iter().find(|c| c.column == column)?;
        TimeSeries::new(self.time.clone(), data.values.clone()).ok()
    }
}

/// Time-history text parser
#[derive(Debug, Clone)]
pub struct TimeHistoryParser {
    /// Value columns to extract (time is always column 0)
    pub columns: Vec<usize>,
    /// Rows containing this character are skipped
    pub overflow_marker: Option<char>,
}

impl Default for TimeHistoryParser {
    fn default() -> Self {
        Self {
            columns: vec![1],
            overflow_marker: Some('*'),
        }
    }
}

impl TimeHistoryParser {
    pub fn new(columns: Vec<usize>) -> Self {
        Self {
            columns,
            ..Default::default()
        }
    }

    /// Builder: set the overflow marker (`None` keeps every row)
    pub fn with_overflow_marker(mut self, marker: Option<char>) -> Self {
        self.overflow_marker = marker;
        self
    }

    pub fn parse(&self, text: &str) -> ProcessResult<TimeHistory> {
        let widest = self.columns.iter().copied().max().unwrap_or(0);
        let mut time = Vec::new();
        let mut channels: Vec<ChannelData> = self
            .columns
            .iter()
            .map(|&column| ChannelData {
                column,
                values: Vec::new(),
            })
            .collect();
        let mut skipped = 0usize;

        for line in text.lines() {
            let line = line.trim();
            if line.is_empty() {
                continue;
            }
            if let Some(marker) = self.overflow_marker {
                if line.contains(marker) {
                    skipped += 1;
                    continue;
                }
            }

            let fields: Vec<&str> = line.split_whitespace().collect();
            let Ok(t) = fields[0].parse::<f64>() else {
                continue;
            };
            if fields.len() <= widest {
                skipped += 1;
                continue;
            }

            let row: Option<Vec<f64>> = self
                .columns
                .iter()
                .map(|&c| fields[c].parse::<f64>().ok())
                .collect();
            let Some(row) = row else {
                skipped += 1;
                continue;
            };

            if let Some(&previous) = time.last() {
                if t < previous {
                    return Err(ProcessError::NonMonotonicTime { index: time.len() });
                }
            }
            time.push(t);
            for (channel, value) in channels.iter_mut().zip(row) {
                channel.values.push(value);
            }
        }

        if time.is_empty() {
            return Err(ProcessError::ParseFailure("time history".to_string()));
        }
        debug!("Parsed {} rows ({} skipped)", time.len(), skipped);

        Ok(TimeHistory { time, channels })
    }
}

/// Header label of the significant wave height in motion files
pub const WAVE_HEIGHT_LABEL: &str = "有义波高";

/// Read a labelled number from the header block.
///
/// Only lines before the first numeric row are searched. On the first line
/// containing `label`, the first number after the label is returned.
pub fn header_value(text: &str, label: &str) -> Option<f64> {
    for line in text.lines() {
        let trimmed = line.trim();
        let first_is_numeric = trimmed
            .split_whitespace()
            .next()
            .map(|tok| tok.parse::<f64>().is_ok())
            .unwrap_or(false);
        if first_is_numeric {
            return None;
        }
        if let Some(pos) = trimmed.find(label) {
            return trimmed[pos + label.len()..]
                .split(|c: char| c.is_whitespace() || ":=,;：()（）".contains(c))
                .find_map(|tok| tok.parse::<f64>().ok());
        }
    }
    None
}

/// Last decimal number in a file stem (`"时间历程_w0.35"` gives 0.35).
///
/// A leading `-` is treated as a separator, not a sign.
pub fn last_number(stem: &str) -> Option<f64> {
    let chars: Vec<char> = stem.chars().collect();
    let mut found = None;
    let mut i = 0;

    while i < chars.len() {
        if !chars[i].is_ascii_digit() {
            i += 1;
            continue;
        }
        let start = i;
        while i < chars.len() && chars[i].is_ascii_digit() {
            i += 1;
        }
        if i + 1 < chars.len() && chars[i] == '.' && chars[i + 1].is_ascii_digit() {
            i += 1;
            while i < chars.len() && chars[i].is_ascii_digit() {
                i += 1;
            }
        }
        // Exponent only when digits follow
        if i < chars.len() && (chars[i] == 'e' || chars[i] == 'E') {
            let mut j = i + 1;
            if j < chars.len() && (chars[j] == '+' || chars[j] == '-') {
                j += 1;
            }
            if j < chars.len() && chars[j].is_ascii_digit() {
                while j < chars.len() && chars[j].is_ascii_digit() {
                    j += 1;
                }
                i = j;
            }
        }
        let token: String = chars[start..i].iter().collect();
        if let Ok(value) = token.parse::<f64>() {
            found = Some(value);
        }
    }

    found
}

/// Per-frequency table with its columns bound to roles
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct FrequencyTable {
    pub frequencies: Vec<f64>,
    pub mean_response: Vec<f64>,
    pub amplitude_names: Vec<String>,
    /// One vector per amplitude channel, aligned with `frequencies`
    pub amplitudes: Vec<Vec<f64>>,
}

impl FrequencyTable {
    pub fn len(&self) -> usize {
        self.frequencies.len()
    }

    pub fn is_empty(&self) -> bool {
        self.frequencies.is_empty()
    }

    /// One node per row
    pub fn to_nodes(&self) -> Vec<FrequencyNode> {
        (0..self.len())
            .map(|row| FrequencyNode {
                frequency: self.frequencies[row],
                mean_response: self.mean_response[row],
                amplitudes: self.amplitudes.iter().map(|ch| ch[row]).collect(),
            })
            .collect()
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
enum Delimiter {
    Comma,
    Tab,
    Whitespace,
}

impl Delimiter {
    fn detect(header: &str) -> Self {
        if header.contains(',') {
            Delimiter::Comma
        } else if header.contains('\t') {
            Delimiter::Tab
        } else {
            Delimiter::Whitespace
        }
    }

    fn split<'a>(&self, line: &'a str) -> Vec<&'a str> {
        match self {
            Delimiter::Comma => line.split(',').map(|f| f.trim().trim_matches('"')).collect(),
            Delimiter::Tab => line.split('\t').map(str::trim).collect(),
            Delimiter::Whitespace => line.split_whitespace().collect(),
        }
    }
}

/// Frequency table parser
#[derive(Debug, Clone, Default)]
pub struct TableParser {
    roles: ColumnRoles,
}

impl TableParser {
    pub fn new(roles: ColumnRoles) -> Self {
        Self { roles }
    }

    pub fn parse(&self, text: &str) -> ProcessResult<FrequencyTable> {
        let mut lines = text
            .lines()
            .map(|l| l.trim_start_matches('\u{feff}'))
            .filter(|l| !l.trim().is_empty());

        let header_line = lines
            .next()
            .ok_or_else(|| ProcessError::ParseFailure("frequency table".to_string()))?;
        let delimiter = Delimiter::detect(header_line);
        let header = delimiter.split(header_line);

        let resolve = |selector: &ColumnSelector, role: &str| {
            selector
                .resolve(&header)
                .ok_or_else(|| ProcessError::MissingColumn {
                    role: role.to_string(),
                })
        };
        let freq_col = resolve(&self.roles.frequency, "frequency")?;
        let resp_col = resolve(&self.roles.mean_response, "mean response")?;
        let amp_cols = self
            .roles
            .amplitudes
            .iter()
            .map(|named| resolve(&named.column, &named.name))
            .collect::<ProcessResult<Vec<usize>>>()?;

        debug!(
            "Table columns: frequency={}, response={}, amplitudes={:?}",
            freq_col, resp_col, amp_cols
        );

        let mut table = FrequencyTable {
            frequencies: Vec::new(),
            mean_response: Vec::new(),
            amplitude_names: self.roles.amplitudes.iter().map(|n| n.name.clone()).collect(),
            amplitudes: vec![Vec::new(); amp_cols.len()],
        };

        for (row, line) in lines.enumerate() {
            let fields = delimiter.split(line);
            let field = |col: usize| fields.get(col).and_then(|f| f.parse::<f64>().ok());

            let (Some(freq), Some(resp)) = (field(freq_col), field(resp_col)) else {
                warn!("Skipping table row {}: unreadable frequency or response", row + 2);
                continue;
            };
            let Some(amps) = amp_cols.iter().map(|&c| field(c)).collect::<Option<Vec<f64>>>()
            else {
                warn!("Skipping table row {}: unreadable amplitude", row + 2);
                continue;
            };

            table.frequencies.push(freq);
            table.mean_response.push(resp);
            for (channel, value) in table.amplitudes.iter_mut().zip(amps) {
                channel.push(value);
            }
        }

        if table.is_empty() {
            return Err(ProcessError::ParseFailure("frequency table".to_string()));
        }
        Ok(table)
    }
}
