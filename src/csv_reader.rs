// CSV ingestion: header row + data rows into a Dataset

use crate::data::{CellValue, Dataset, Row};
use anyhow::{Context, Result};
use std::fs;
use std::io::{self, Read};
use std::path::Path;
use tracing::debug;

/// Parser switches applied while reading CSV text
#[derive(Debug, Clone, Copy)]
pub struct CsvOptions {
    /// Convert numeric-looking fields to numbers and empty fields to null
    pub dynamic_typing: bool,
}

impl Default for CsvOptions {
    fn default() -> Self {
        Self {
            dynamic_typing: true,
        }
    }
}

/// Parse CSV text. The first record is the header row; rows that are
/// entirely blank after trimming are dropped.
pub fn parse_csv(text: &str, options: &CsvOptions) -> Result<Dataset> {
    parse_csv_bytes(text.as_bytes(), options)
}

/// [`parse_csv`] over raw bytes; fields that are not UTF-8 are an error
pub fn parse_csv_bytes(bytes: &[u8], options: &CsvOptions) -> Result<Dataset> {
    let mut reader = csv::ReaderBuilder::new()
        .has_headers(true)
        .flexible(true)
        .from_reader(bytes);

    let headers: Vec<String> = reader
        .headers()
        .context("Failed to read CSV header row")?
        .iter()
        .map(|h| h.to_string())
        .collect();

    // A header row of one empty field is what an empty document parses to
    if headers.iter().all(|h| h.trim().is_empty()) {
        return Ok(Dataset::default());
    }

    let mut rows = Vec::new();
    let mut dropped = 0usize;
    for (line, record) in reader.records().enumerate() {
        let record = record.with_context(|| format!("Failed to parse CSV record {}", line + 1))?;

        let mut row = Row::new();
        for (header, field) in headers.iter().zip(record.iter()) {
            row.insert(header.clone(), parse_field(field, options));
        }

        if row.is_blank() {
            dropped += 1;
            continue;
        }
        rows.push(row);
    }

    debug!(columns = headers.len(), rows = rows.len(), dropped, "parsed CSV");
    Ok(Dataset::new(headers, rows))
}

fn parse_field(field: &str, options: &CsvOptions) -> CellValue {
    if !options.dynamic_typing {
        return CellValue::Text(field.to_string());
    }

    let trimmed = field.trim();
    if trimmed.is_empty() {
        return CellValue::Null;
    }
    if looks_numeric(trimmed) {
        if let Ok(n) = trimmed.parse::<f64>() {
            if n.is_finite() {
                return CellValue::Number(n);
            }
        }
    }
    CellValue::Text(field.to_string())
}

/// Plain decimal notation only: optional sign, digits with an optional
/// fraction, optional exponent. Rejects `inf`, `NaN` and similar words
/// that `f64::from_str` would otherwise accept.
fn looks_numeric(s: &str) -> bool {
    let body = s.strip_prefix(['-', '+']).unwrap_or(s);
    let (mantissa, exponent) = match body.find(['e', 'E']) {
        Some(idx) => (&body[..idx], Some(&body[idx + 1..])),
        None => (body, None),
    };

    let mut digits = 0;
    let mut dots = 0;
    for c in mantissa.chars() {
        match c {
            '0'..='9' => digits += 1,
            '.' => dots += 1,
            _ => return false,
        }
    }
    if digits == 0 || dots > 1 {
        return false;
    }

    match exponent {
        None => true,
        Some(exp) => {
            let exp = exp.strip_prefix(['-', '+']).unwrap_or(exp);
            !exp.is_empty() && exp.chars().all(|c| c.is_ascii_digit())
        }
    }
}

/// Read CSV from stdin
pub fn read_csv_from_stdin(options: &CsvOptions) -> Result<Dataset> {
    let mut bytes = Vec::new();
    io::stdin()
        .read_to_end(&mut bytes)
        .context("Failed to read CSV from stdin")?;
    parse_csv_bytes(&bytes, options)
}

/// Read CSV from a file on disk
pub fn read_csv_file(path: &Path, options: &CsvOptions) -> Result<Dataset> {
    let bytes = fs::read(path)
        .with_context(|| format!("Failed to read CSV file '{}'", path.display()))?;
    parse_csv_bytes(&bytes, options)
        .with_context(|| format!("Failed to parse CSV file '{}'", path.display()))
}
