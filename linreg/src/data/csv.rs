//! Plain-text CSV ingestion. Only the first two columns of every row are read, as `(x, y)`.
use super::Dataset;
use crate::{LinRegErr, Result};

/// Parses `content` into a `Dataset`.
///
/// Empty lines are skipped. The first non-empty line is treated as a header when its
/// first two fields aren't numbers.
///
/// # Errors
/// `InvalidDataset` when a row has fewer than two columns, a field is missing or
/// can't be parsed, or the resulting dataset is invalid.
pub fn parse(content: &str) -> Result<Dataset> {
    let mut x = Vec::new();
    let mut y = Vec::new();
    let mut first = true;

    for (i, line) in content.lines().enumerate() {
        let line = line.trim_start_matches(BOM).trim();
        if line.is_empty() {
            continue;
        }

        let lineno = i + 1;
        let fields: Vec<&str> = line.split(',').map(unquote).collect();

        if fields.len() < 2 {
            return Err(LinRegErr::invalid_dataset(format!(
                "line {lineno}: CSV must have at least 2 columns, got {}",
                fields.len()
            )));
        }

        let is_header = std::mem::replace(&mut first, false);

        match (parse_field(fields[0]), parse_field(fields[1])) {
            (Some(xv), Some(yv)) if !(xv.is_finite() && yv.is_finite()) => {
                return Err(LinRegErr::invalid_dataset(format!(
                    "line {lineno}: values must be finite"
                )));
            }
            (Some(xv), Some(yv)) => {
                x.push(xv);
                y.push(yv);
            }
            _ if is_header => continue,
            _ => {
                let bad = if parse_field(fields[0]).is_none() {
                    fields[0]
                } else {
                    fields[1]
                };

                let reason = if bad.is_empty() {
                    format!("line {lineno}: data contains missing values")
                } else {
                    format!("line {lineno}: cannot parse '{bad}' as a number")
                };

                return Err(LinRegErr::invalid_dataset(reason));
            }
        }
    }

    Dataset::new(x, y)
}

const BOM: char = '\u{feff}';

/// Strips surrounding whitespace and one pair of double quotes.
fn unquote(field: &str) -> &str {
    let field = field.trim();
    field
        .strip_prefix('"')
        .and_then(|f| f.strip_suffix('"'))
        .map_or(field, str::trim)
}

fn parse_field(field: &str) -> Option<f64> {
    field.parse::<f64>().ok()
}
