//! Bates-sequence gap detection
//!
//! Derives a numeric key from each row's BegDoc/EndDoc values, orders rows
//! by that key, and flags every row whose range is not immediately followed
//! by the next row's starting number. The loaded table is never modified;
//! the analysis is a separate derived view over it.

use crate::error::{Error, Result};
use crate::fields::{CanonicalField, FieldBinding};
use crate::table::{Row, Table};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Numeric identifiers extracted from one row's Bates range
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct RangeKey {
    /// Numeric portion of the BegDoc value
    pub beg: u64,
    /// Numeric portion of the EndDoc value
    pub end: u64,
}

/// A row whose BegDoc or EndDoc value could not be reduced to a number
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct IdentifierFailure {
    /// Zero-based row index in the loaded table
    pub row: usize,
    /// Which identifier failed (BegDoc or EndDoc)
    pub field: CanonicalField,
    /// The raw cell value
    pub value: String,
}

impl fmt::Display for IdentifierFailure {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "row {}: {} value '{}' has no digit run",
            self.row, self.field, self.value
        )
    }
}

/// Derived view over a table: Bates-sorted order, numeric keys, gap flags
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GapAnalysis {
    /// Original row indices, ascending by numeric BegDoc (stable for ties)
    pub order: Vec<usize>,
    /// Range keys, parallel to `order`
    pub keys: Vec<RangeKey>,
    /// Gap flags, parallel to `order`; the last position is never flagged
    pub flags: Vec<bool>,
}

impl GapAnalysis {
    /// Number of analyzed rows
    pub fn row_count(&self) -> usize {
        self.order.len()
    }

    /// Whether any row is flagged
    pub fn has_gaps(&self) -> bool {
        self.flags.iter().any(|&f| f)
    }

    /// Number of flagged rows
    pub fn gap_count(&self) -> usize {
        self.flags.iter().filter(|&&f| f).count()
    }

    /// Sorted positions flagged as gaps, ascending
    pub fn gap_positions(&self) -> Vec<usize> {
        self.flags
            .iter()
            .enumerate()
            .filter(|(_, &f)| f)
            .map(|(i, _)| i)
            .collect()
    }

    /// Report sequence: each flagged position followed by its successor,
    /// ascending. Adjacent gaps produce duplicate positions; that is
    /// accepted so each gap's boundary context stays intact.
    pub fn report_positions(&self) -> Vec<usize> {
        self.gap_positions()
            .into_iter()
            .flat_map(|p| [p, p + 1])
            .collect()
    }
}

/// Analyze a table for Bates numbering gaps.
///
/// Requires BegDoc and EndDoc to be bound. Every row must yield numeric
/// identifiers for both; rows that do not are all collected and returned
/// in a single `UnparseableIdentifiers` error.
pub fn analyze_gaps(table: &Table, binding: &FieldBinding) -> Result<GapAnalysis> {
    let beg_col = require_column(table, binding, CanonicalField::BegDoc)?;
    let end_col = require_column(table, binding, CanonicalField::EndDoc)?;

    let mut keys = Vec::with_capacity(table.row_count());
    let mut failures = Vec::new();

    for (idx, row) in table.rows.iter().enumerate() {
        let beg_raw = cell_text(row, beg_col);
        let end_raw = cell_text(row, end_col);
        let beg = extract_numeric(beg_raw);
        let end = extract_numeric(end_raw);

        if beg.is_none() {
            failures.push(IdentifierFailure {
                row: idx,
                field: CanonicalField::BegDoc,
                value: beg_raw.to_string(),
            });
        }
        if end.is_none() {
            failures.push(IdentifierFailure {
                row: idx,
                field: CanonicalField::EndDoc,
                value: end_raw.to_string(),
            });
        }
        if let (Some(beg), Some(end)) = (beg, end) {
            keys.push(RangeKey { beg, end });
        }
    }

    if !failures.is_empty() {
        return Err(Error::UnparseableIdentifiers { failures });
    }

    // Stable sort keeps input order for duplicate BegDoc values
    let mut order: Vec<usize> = (0..keys.len()).collect();
    order.sort_by_key(|&i| keys[i].beg);
    let keys: Vec<RangeKey> = order.iter().map(|&i| keys[i]).collect();

    let mut flags = vec![false; order.len()];
    for i in 0..order.len().saturating_sub(1) {
        flags[i] = u128::from(keys[i + 1].beg) != u128::from(keys[i].end) + 1;
    }

    Ok(GapAnalysis { order, keys, flags })
}

fn require_column(
    table: &Table,
    binding: &FieldBinding,
    field: CanonicalField,
) -> Result<usize> {
    binding
        .column(field)
        .and_then(|name| table.find_column(name))
        .map(|c| c.index)
        .ok_or(Error::MissingRequiredField { field })
}

fn cell_text(row: &Row, col: usize) -> &str {
    row.get(col).and_then(|c| c.as_str()).unwrap_or("")
}

/// Extract the first contiguous ASCII digit run as a number.
///
/// "DOC0001" -> 1, "PROD000123-A" -> 123. Returns None when the value has
/// no digits or the run does not fit in a u64.
fn extract_numeric(value: &str) -> Option<u64> {
    let start = value.find(|c: char| c.is_ascii_digit())?;
    let run: String = value[start..]
        .chars()
        .take_while(|c| c.is_ascii_digit())
        .collect();
    run.parse().ok()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fields::FieldRegistry;
    use crate::parser::{parse_load_file_str, FIELD_DELIMITER};

    fn load(rows: &[(&str, &str)]) -> (Table, FieldBinding) {
        let d = FIELD_DELIMITER.to_string();
        let mut content = format!("BEGBATES{d}ENDBATES\n");
        for (beg, end) in rows {
            content.push_str(&format!("{beg}{d}{end}\n"));
        }
        let table = parse_load_file_str(&content, "test.dat").unwrap();
        let binding = FieldRegistry::standard().bind(&table);
        (table, binding)
    }

    #[test]
    fn test_extract_numeric() {
        assert_eq!(extract_numeric("DOC0001"), Some(1));
        assert_eq!(extract_numeric("0042"), Some(42));
        assert_eq!(extract_numeric("PROD000123-A"), Some(123));
        assert_eq!(extract_numeric("NODIGITS"), None);
        assert_eq!(extract_numeric(""), None);
        // Digit run wider than u64 is a failure, not a silent truncation
        assert_eq!(extract_numeric("DOC99999999999999999999999"), None);
    }

    #[test]
    fn test_contiguous_ranges_have_no_gaps() {
        let (table, binding) = load(&[
            ("DOC0001", "DOC0001"),
            ("DOC0002", "DOC0002"),
            ("DOC0003", "DOC0003"),
            ("DOC0004", "DOC0004"),
            ("DOC0005", "DOC0005"),
        ]);
        let analysis = analyze_gaps(&table, &binding).unwrap();

        assert!(!analysis.has_gaps());
        assert_eq!(analysis.gap_count(), 0);
        assert!(analysis.report_positions().is_empty());
    }

    #[test]
    fn test_gap_is_flagged_with_successor() {
        let (table, binding) = load(&[("DOC0001", "DOC0003"), ("DOC0010", "DOC0012")]);
        let analysis = analyze_gaps(&table, &binding).unwrap();

        assert!(analysis.has_gaps());
        assert_eq!(analysis.flags, vec![true, false]);
        assert_eq!(analysis.report_positions(), vec![0, 1]);
    }

    #[test]
    fn test_last_row_is_never_flagged() {
        let (table, binding) = load(&[("DOC0001", "DOC0001")]);
        let analysis = analyze_gaps(&table, &binding).unwrap();
        assert_eq!(analysis.flags, vec![false]);

        // Even when the highest range would naively compare against nothing
        let (table, binding) = load(&[("DOC0001", "DOC0002"), ("DOC0003", "DOC0099")]);
        let analysis = analyze_gaps(&table, &binding).unwrap();
        assert_eq!(analysis.flags, vec![false, false]);
    }

    #[test]
    fn test_rows_are_ordered_by_numeric_begdoc() {
        let (table, binding) = load(&[
            ("DOC0010", "DOC0010"),
            ("DOC0001", "DOC0001"),
            ("DOC0002", "DOC0009"),
        ]);
        let analysis = analyze_gaps(&table, &binding).unwrap();

        assert_eq!(analysis.order, vec![1, 2, 0]);
        assert_eq!(
            analysis.keys,
            vec![
                RangeKey { beg: 1, end: 1 },
                RangeKey { beg: 2, end: 9 },
                RangeKey { beg: 10, end: 10 },
            ]
        );
        assert!(!analysis.has_gaps());
    }

    #[test]
    fn test_sort_is_stable_for_duplicate_begdocs() {
        let (table, binding) = load(&[
            ("DOC0002", "DOC0002"),
            ("DOC0001", "DOC0001"),
            ("DOC0002", "DOC0002"),
        ]);
        let analysis = analyze_gaps(&table, &binding).unwrap();

        // Duplicate keys keep input order: row 0 before row 2
        assert_eq!(analysis.order, vec![1, 0, 2]);
    }

    #[test]
    fn test_analysis_is_deterministic() {
        let (table, binding) = load(&[
            ("DOC0005", "DOC0005"),
            ("DOC0001", "DOC0002"),
            ("DOC0003", "DOC0004"),
        ]);
        let first = analyze_gaps(&table, &binding).unwrap();
        let second = analyze_gaps(&table, &binding).unwrap();

        assert_eq!(first, second);
    }

    #[test]
    fn test_adjacent_gaps_duplicate_report_positions() {
        let (table, binding) = load(&[
            ("DOC0001", "DOC0001"),
            ("DOC0005", "DOC0005"),
            ("DOC0010", "DOC0010"),
        ]);
        let analysis = analyze_gaps(&table, &binding).unwrap();

        assert_eq!(analysis.flags, vec![true, true, false]);
        assert_eq!(analysis.report_positions(), vec![0, 1, 1, 2]);
    }

    #[test]
    fn test_missing_begdoc_column_is_an_error() {
        let d = FIELD_DELIMITER.to_string();
        let content = format!("Custodian{d}ENDBATES\nSmith{d}DOC0001\n");
        let table = parse_load_file_str(&content, "test.dat").unwrap();
        let binding = FieldRegistry::standard().bind(&table);

        let err = analyze_gaps(&table, &binding).unwrap_err();
        assert!(matches!(
            err,
            Error::MissingRequiredField {
                field: CanonicalField::BegDoc
            }
        ));
    }

    #[test]
    fn test_unparseable_identifier_names_the_row() {
        let (table, binding) = load(&[
            ("DOC0001", "DOC0001"),
            ("NODIGITS", "DOC0002"),
            ("DOC0003", ""),
        ]);
        let err = analyze_gaps(&table, &binding).unwrap_err();

        match err {
            Error::UnparseableIdentifiers { failures } => {
                assert_eq!(failures.len(), 2);
                assert_eq!(failures[0].row, 1);
                assert_eq!(failures[0].field, CanonicalField::BegDoc);
                assert_eq!(failures[0].value, "NODIGITS");
                assert_eq!(failures[1].row, 2);
                assert_eq!(failures[1].field, CanonicalField::EndDoc);
                assert_eq!(failures[1].value, "");
            }
            other => panic!("unexpected error: {other:?}"),
        }
    }

    #[test]
    fn test_table_is_not_modified() {
        let (table, binding) = load(&[("DOC0010", "DOC0010"), ("DOC0001", "DOC0001")]);
        let columns_before = table.column_count();

        let analysis = analyze_gaps(&table, &binding).unwrap();

        // Derived view only; original row order and shape are untouched
        assert_eq!(table.column_count(), columns_before);
        assert_eq!(table.cell(0, 0).unwrap().as_str(), Some("DOC0010"));
        assert_eq!(analysis.order, vec![1, 0]);
    }
}
