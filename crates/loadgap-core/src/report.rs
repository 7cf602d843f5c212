//! Gap report construction and export
//!
//! Renders a `GapAnalysis` into a serializable report: the flagged rows and
//! their successors, with numeric keys and the source cell values, exportable
//! as JSON or CSV.

use crate::error::Result;
use crate::gaps::GapAnalysis;
use crate::table::Table;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fs::{self, File};
use std::io::{BufWriter, Write};
use std::path::{Path, PathBuf};

/// One report row: a flagged row or the row after it
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReportRow {
    /// Position in the Bates-sorted order
    pub position: usize,
    /// Row index in the loaded table (original file order)
    pub source_row: usize,
    /// Numeric portion of the BegDoc value
    pub beg_doc_numeric: u64,
    /// Numeric portion of the EndDoc value
    pub end_doc_numeric: u64,
    /// Whether this row ends a discontinuous range
    pub gap: bool,
    /// Cell values for every source column, in header order
    pub values: Vec<String>,
}

/// A gap report for one load file
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GapReport {
    /// The analyzed load file
    pub source_path: PathBuf,
    /// When the report was generated
    pub generated_at: DateTime<Utc>,
    /// Rows in the analyzed table
    pub total_rows: usize,
    /// Number of flagged rows
    pub gap_count: usize,
    /// Source column names, in header order
    pub columns: Vec<String>,
    /// Flagged rows and their successors, in sorted order
    pub rows: Vec<ReportRow>,
}

impl GapReport {
    /// Build a report from a table and its gap analysis
    pub fn build(table: &Table, analysis: &GapAnalysis) -> Self {
        let columns: Vec<String> = table.columns.iter().map(|c| c.name.clone()).collect();

        let rows = analysis
            .report_positions()
            .into_iter()
            .map(|position| {
                let source_row = analysis.order[position];
                let key = analysis.keys[position];
                let values = table.rows[source_row]
                    .cells
                    .iter()
                    .map(|c| c.to_string_value())
                    .collect();

                ReportRow {
                    position,
                    source_row,
                    beg_doc_numeric: key.beg,
                    end_doc_numeric: key.end,
                    gap: analysis.flags[position],
                    values,
                }
            })
            .collect();

        Self {
            source_path: table.source_path.clone(),
            generated_at: Utc::now(),
            total_rows: table.row_count(),
            gap_count: analysis.gap_count(),
            columns,
            rows,
        }
    }

    /// Whether the report contains any gaps
    pub fn has_gaps(&self) -> bool {
        self.gap_count > 0
    }

    /// Save the report as pretty JSON
    pub fn save_json<P: AsRef<Path>>(&self, path: P) -> Result<()> {
        let content = serde_json::to_string_pretty(self)?;
        fs::write(path, content)?;
        Ok(())
    }

    /// Save the report as CSV, with the numeric keys and gap flag appended
    /// to the source columns
    pub fn save_csv<P: AsRef<Path>>(&self, path: P) -> Result<()> {
        let file = File::create(path)?;
        let mut writer = BufWriter::new(file);
        self.write_csv(&mut writer)?;
        writer.flush()?;
        Ok(())
    }

    /// Write the report as CSV to any writer
    pub fn write_csv<W: Write>(&self, writer: W) -> Result<()> {
        let mut csv_writer = csv::Writer::from_writer(writer);

        let mut header: Vec<&str> = self.columns.iter().map(|c| c.as_str()).collect();
        header.extend(["BegDocNumeric", "EndDocNumeric", "Gap"]);
        csv_writer.write_record(&header)?;

        for row in &self.rows {
            let mut record: Vec<String> = row.values.clone();
            record.push(row.beg_doc_numeric.to_string());
            record.push(row.end_doc_numeric.to_string());
            record.push(row.gap.to_string());
            csv_writer.write_record(&record)?;
        }

        csv_writer.flush()?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fields::FieldRegistry;
    use crate::gaps::analyze_gaps;
    use crate::parser::{parse_load_file_str, FIELD_DELIMITER};

    fn gap_report() -> GapReport {
        let d = FIELD_DELIMITER.to_string();
        let content = format!(
            "BEGBATES{d}ENDBATES{d}Custodian\n\
             DOC0001{d}DOC0003{d}Smith\n\
             DOC0010{d}DOC0012{d}Jones\n"
        );
        let table = parse_load_file_str(&content, "prod001.dat").unwrap();
        let binding = FieldRegistry::standard().bind(&table);
        let analysis = analyze_gaps(&table, &binding).unwrap();
        GapReport::build(&table, &analysis)
    }

    #[test]
    fn test_build_report_rows() {
        let report = gap_report();

        assert!(report.has_gaps());
        assert_eq!(report.gap_count, 1);
        assert_eq!(report.total_rows, 2);
        assert_eq!(report.rows.len(), 2);

        let flagged = &report.rows[0];
        assert!(flagged.gap);
        assert_eq!(flagged.beg_doc_numeric, 1);
        assert_eq!(flagged.end_doc_numeric, 3);
        assert_eq!(flagged.values, vec!["DOC0001", "DOC0003", "Smith"]);

        let successor = &report.rows[1];
        assert!(!successor.gap);
        assert_eq!(successor.beg_doc_numeric, 10);
        assert_eq!(successor.values[2], "Jones");
    }

    #[test]
    fn test_clean_table_yields_empty_report() {
        let d = FIELD_DELIMITER.to_string();
        let content = format!("BEGBATES{d}ENDBATES\nDOC0001{d}DOC0001\nDOC0002{d}DOC0002\n");
        let table = parse_load_file_str(&content, "clean.dat").unwrap();
        let binding = FieldRegistry::standard().bind(&table);
        let analysis = analyze_gaps(&table, &binding).unwrap();

        let report = GapReport::build(&table, &analysis);
        assert!(!report.has_gaps());
        assert!(report.rows.is_empty());
        assert_eq!(report.total_rows, 2);
    }

    #[test]
    fn test_report_json_round_trip() {
        let report = gap_report();
        let json = serde_json::to_string_pretty(&report).unwrap();
        let loaded: GapReport = serde_json::from_str(&json).unwrap();

        assert_eq!(loaded.gap_count, report.gap_count);
        assert_eq!(loaded.rows, report.rows);
        assert_eq!(loaded.columns, report.columns);
    }

    #[test]
    fn test_report_csv_output() {
        let report = gap_report();
        let mut buffer = Vec::new();
        report.write_csv(&mut buffer).unwrap();

        let output = String::from_utf8(buffer).unwrap();
        let mut lines = output.lines();
        assert_eq!(
            lines.next(),
            Some("BEGBATES,ENDBATES,Custodian,BegDocNumeric,EndDocNumeric,Gap")
        );
        assert_eq!(lines.next(), Some("DOC0001,DOC0003,Smith,1,3,true"));
        assert_eq!(lines.next(), Some("DOC0010,DOC0012,Jones,10,12,false"));
        assert_eq!(lines.next(), None);
    }
}
