//! Load-file parser (Concordance DAT dialect)
//!
//! Load files use non-printable delimiters so that document text never
//! collides with the record structure: fields are separated by U+0014 (DC4)
//! and optionally wrapped in U+00FE (thorn). A quoted field may contain
//! delimiters and line breaks.

use crate::error::{Error, Result};
use crate::table::{CellValue, Column, Row, Table};
use encoding_rs::Encoding;
use std::fs;
use std::path::{Path, PathBuf};

/// Field delimiter character (DC4)
pub const FIELD_DELIMITER: char = '\u{14}';
/// Quote character (thorn)
pub const QUOTE: char = '\u{FE}';

/// Parse a load file into a Table, decoding with the given encoding
pub fn parse_load_file<P: AsRef<Path>>(path: P, encoding: &'static Encoding) -> Result<Table> {
    let path = path.as_ref();
    let bytes = fs::read(path).map_err(|e| Error::FileRead {
        path: path.to_path_buf(),
        source: e,
    })?;

    let (text, _, had_errors) = encoding.decode(&bytes);
    if had_errors {
        return Err(Error::Decode {
            path: path.to_path_buf(),
            encoding: encoding.name(),
        });
    }

    build_table(&text, path.to_path_buf())
}

/// Parse a load file from a string (useful for testing)
pub fn parse_load_file_str(content: &str, source_name: &str) -> Result<Table> {
    build_table(content, PathBuf::from(source_name))
}

fn build_table(content: &str, path: PathBuf) -> Result<Table> {
    let records = split_records(content, &path)?;
    let mut records = records.into_iter();

    let header = records.next().ok_or_else(|| Error::Parse {
        path: path.clone(),
        message: "no header record found".to_string(),
    })?;

    let columns: Vec<Column> = header
        .iter()
        .enumerate()
        .map(|(i, name)| Column::new(name.trim().to_string(), i))
        .collect();

    if columns.iter().all(|c| c.name.is_empty()) {
        return Err(Error::Parse {
            path,
            message: "header record has no column names".to_string(),
        });
    }

    let mut rows = Vec::new();
    for (record_idx, record) in records.enumerate() {
        let cells: Vec<CellValue> = record.iter().map(|s| CellValue::parse(s)).collect();

        // Pad with empty cells if the record is shorter than the header
        let mut padded_cells = cells;
        while padded_cells.len() < columns.len() {
            padded_cells.push(CellValue::Empty);
        }

        // Warn if the record is longer than the header (truncate)
        if padded_cells.len() > columns.len() {
            eprintln!(
                "Warning: record {} in {} has more fields than columns, truncating",
                record_idx + 2,
                path.display()
            );
            padded_cells.truncate(columns.len());
        }

        rows.push(Row::new(padded_cells));
    }

    Ok(Table {
        columns,
        rows,
        source_path: path,
    })
}

/// Split decoded text into records of raw fields.
///
/// Records end at LF or CRLF outside quotes. Inside a quoted field the
/// delimiter and line breaks are data; the closing quote must be followed
/// by a delimiter or the record end. Blank lines are skipped.
fn split_records(content: &str, path: &Path) -> Result<Vec<Vec<String>>> {
    let mut records: Vec<Vec<String>> = Vec::new();
    let mut record: Vec<String> = Vec::new();
    let mut field = String::new();
    let mut in_quotes = false;

    let mut chars = content.chars().peekable();
    while let Some(c) = chars.next() {
        if in_quotes {
            if c == QUOTE {
                match chars.peek() {
                    None | Some(&FIELD_DELIMITER) | Some(&'\n') | Some(&'\r') => in_quotes = false,
                    Some(_) => {
                        return Err(Error::Parse {
                            path: path.to_path_buf(),
                            message: format!(
                                "closing quote not followed by a delimiter in record {}",
                                records.len() + 1
                            ),
                        });
                    }
                }
            } else {
                field.push(c);
            }
        } else {
            match c {
                QUOTE if field.is_empty() => in_quotes = true,
                FIELD_DELIMITER => record.push(std::mem::take(&mut field)),
                '\r' => {
                    if chars.peek() == Some(&'\n') {
                        chars.next();
                    }
                    end_record(&mut records, &mut record, &mut field);
                }
                '\n' => end_record(&mut records, &mut record, &mut field),
                _ => field.push(c),
            }
        }
    }

    if in_quotes {
        return Err(Error::Parse {
            path: path.to_path_buf(),
            message: format!("unterminated quoted field in record {}", records.len() + 1),
        });
    }

    // Final record when the file does not end with a newline
    if !field.is_empty() || !record.is_empty() {
        end_record(&mut records, &mut record, &mut field);
    }

    Ok(records)
}

fn end_record(records: &mut Vec<Vec<String>>, record: &mut Vec<String>, field: &mut String) {
    record.push(std::mem::take(field));
    let done = std::mem::take(record);

    // A record with a single empty field is a blank line
    if done.len() == 1 && done[0].is_empty() {
        return;
    }
    records.push(done);
}
