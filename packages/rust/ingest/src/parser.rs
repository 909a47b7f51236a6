//! Delimited-text parser for lead CSV uploads.
//!
//! Produces one [`RawRow`] per non-blank data record, with headers trimmed
//! and lower-cased and every value trimmed. Structural problems (delimiter,
//! quoting, field count) abort the whole parse.

use csv::ReaderBuilder;
use leadkit_shared::{LeadkitError, Result};
use tracing::debug;

/// Delimiters tried, in tie-break order, when sniffing the header line.
const CANDIDATE_DELIMITERS: [u8; 4] = [b',', b';', b'\t', b'|'];

const QUOTE: u8 = b'"';

// ---------------------------------------------------------------------------
// Types
// ---------------------------------------------------------------------------

/// One data record as (header, value) pairs in column order.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RawRow {
    /// 1-based source line the record starts on (header is line 1).
    pub line: u64,
    /// Lower-cased, trimmed header paired with the trimmed cell value.
    pub cells: Vec<(String, String)>,
}

// ---------------------------------------------------------------------------
// Parser
// ---------------------------------------------------------------------------

/// Parse raw CSV text into rows.
pub fn parse_rows(content: &str) -> Result<Vec<RawRow>> {
    let content = content.strip_prefix('\u{feff}').unwrap_or(content);
    if content.trim().is_empty() {
        return Err(LeadkitError::EmptyInput);
    }

    // Start at the first non-blank line so it becomes the header.
    let (skipped_lines, body) = skip_blank_lines(content);
    let header_line = body.lines().next().unwrap_or_default();
    let delimiter = detect_delimiter(header_line)?;

    // The reader silently closes an open quote at end of input.
    if let Some(line) = unterminated_quote_line(body, delimiter) {
        return Err(LeadkitError::csv_structure(format!(
            "Quoted field unterminated (line {})",
            line + skipped_lines
        )));
    }

    let mut reader = ReaderBuilder::new()
        .delimiter(delimiter)
        .quote(QUOTE)
        .has_headers(true)
        .flexible(true)
        .from_reader(body.as_bytes());

    let headers: Vec<String> = reader
        .headers()
        .map_err(|e| LeadkitError::csv_structure(e.to_string()))?
        .iter()
        .map(|h| h.trim().to_lowercase())
        .collect();

    let mut lines = LineCounter::new(body);
    let mut rows = Vec::new();
    for result in reader.records() {
        let record = result.map_err(|e| LeadkitError::csv_structure(e.to_string()))?;
        let offset = record.position().map(|p| p.byte()).unwrap_or_default();
        let line = lines.line_at(offset) + skipped_lines;

        let values: Vec<String> = record.iter().map(|v| v.trim().to_string()).collect();
        if values.iter().all(String::is_empty) {
            debug!(line, "skipping blank row");
            continue;
        }

        if values.len() != headers.len() {
            let kind = if values.len() < headers.len() {
                "Too few fields"
            } else {
                "Too many fields"
            };
            return Err(LeadkitError::csv_structure(format!(
                "{kind}: expected {} fields but parsed {} (line {line})",
                headers.len(),
                values.len()
            )));
        }

        rows.push(RawRow {
            line,
            cells: headers.iter().cloned().zip(values).collect(),
        });
    }

    if rows.is_empty() {
        return Err(LeadkitError::NoData);
    }

    debug!(rows = rows.len(), delimiter = %(delimiter as char), "parsed CSV rows");
    Ok(rows)
}

// ---------------------------------------------------------------------------
// Helpers
// ---------------------------------------------------------------------------

/// Maps record byte offsets to 1-based line numbers, scanning forward only.
///
/// The reader reports a record's offset as the end of the previous record,
/// so any line terminators at that offset belong to skipped empty lines.
struct LineCounter<'a> {
    bytes: &'a [u8],
    pos: usize,
    line: u64,
}

impl<'a> LineCounter<'a> {
    fn new(body: &'a str) -> Self {
        Self {
            bytes: body.as_bytes(),
            pos: 0,
            line: 1,
        }
    }

    fn line_at(&mut self, offset: u64) -> u64 {
        let mut start = usize::try_from(offset)
            .unwrap_or(usize::MAX)
            .min(self.bytes.len());
        while start < self.bytes.len() && matches!(self.bytes[start], b'\r' | b'\n') {
            start += 1;
        }
        if start > self.pos {
            self.line += self.bytes[self.pos..start]
                .iter()
                .filter(|&&b| b == b'\n')
                .count() as u64;
            self.pos = start;
        }
        self.line
    }
}

/// Split off leading whitespace-only lines, returning how many were skipped.
fn skip_blank_lines(content: &str) -> (u64, &str) {
    let mut skipped = 0;
    let mut rest = content;
    while let Some(idx) = rest.find('\n') {
        if !rest[..idx].trim().is_empty() {
            break;
        }
        rest = &rest[idx + 1..];
        skipped += 1;
    }
    (skipped, rest)
}

/// Line on which a quoted field opens without ever closing, if any.
///
/// Follows the reader's quoting rules: a `"` opens a quoted field only as the
/// first byte of a field, `""` inside quotes is an escaped quote, and any
/// other `"` is literal text.
fn unterminated_quote_line(body: &str, delimiter: u8) -> Option<u64> {
    let bytes = body.as_bytes();
    let mut line = 1u64;
    let mut field_start = true;
    let mut open_line: Option<u64> = None;
    let mut i = 0;

    while i < bytes.len() {
        let b = bytes[i];
        if open_line.is_some() {
            if b == QUOTE {
                if bytes.get(i + 1) == Some(&QUOTE) {
                    i += 1;
                } else {
                    open_line = None;
                }
            }
        } else {
            if field_start && b == QUOTE {
                open_line = Some(line);
            }
            field_start = matches!(b, b'\n' | b'\r') || b == delimiter;
        }
        if b == b'\n' {
            line += 1;
        }
        i += 1;
    }
    open_line
}

/// Pick the candidate delimiter occurring most often outside quotes.
fn detect_delimiter(header_line: &str) -> Result<u8> {
    let mut counts = [0usize; CANDIDATE_DELIMITERS.len()];
    let mut in_quotes = false;

    for b in header_line.bytes() {
        if b == QUOTE {
            in_quotes = !in_quotes;
        } else if !in_quotes {
            if let Some(i) = CANDIDATE_DELIMITERS.iter().position(|&d| d == b) {
                counts[i] += 1;
            }
        }
    }

    // Strict `>` keeps the earlier candidate on ties.
    let mut best: Option<usize> = None;
    for (i, &count) in counts.iter().enumerate() {
        if count > 0 && best.is_none_or(|b| count > counts[b]) {
            best = Some(i);
        }
    }

    best.map(|i| CANDIDATE_DELIMITERS[i]).ok_or_else(|| {
        LeadkitError::csv_structure("Unable to auto-detect delimiting character; defaulted to ','")
    })
}
