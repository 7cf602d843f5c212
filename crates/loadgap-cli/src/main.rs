//! Load-file gap analyzer CLI
//!
//! Command-line tool for parsing e-discovery load files, inspecting column
//! detection, and reporting Bates numbering gaps.

use clap::{Parser, Subcommand};
use colored::Colorize;
use encoding_rs::Encoding;
use loadgap_core::{
    analyze_gaps, parse_load_file, Error, FieldRegistry, GapAnalysis, GapReport, Table,
};
use std::path::PathBuf;

#[derive(Parser)]
#[command(name = "loadgap-cli")]
#[command(about = "Bates numbering gap detector for e-discovery load files", long_about = None)]
#[command(version)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Detect Bates numbering gaps in a load file
    Analyze {
        /// Path to the load file
        #[arg(short, long)]
        file: PathBuf,

        /// Text encoding of the file (WHATWG label, e.g. utf-8, windows-1252)
        #[arg(short, long, default_value = "utf-8")]
        encoding: String,

        /// Custom synonym registry (JSON); defaults to the built-in registry
        #[arg(long)]
        registry: Option<PathBuf>,

        /// Export the gap report (csv or json)
        #[arg(long, requires = "output")]
        export: Option<String>,

        /// Output file path for the exported report
        #[arg(short, long)]
        output: Option<PathBuf>,

        /// Maximum number of report rows to display
        #[arg(short, long)]
        limit: Option<usize>,
    },

    /// Show which columns matched the canonical fields
    Fields {
        /// Path to the load file
        #[arg(short, long)]
        file: PathBuf,

        /// Text encoding of the file (WHATWG label)
        #[arg(short, long, default_value = "utf-8")]
        encoding: String,

        /// Custom synonym registry (JSON); defaults to the built-in registry
        #[arg(long)]
        registry: Option<PathBuf>,
    },

    /// Parse a load file and display a summary
    Parse {
        /// Path to the load file
        #[arg(short, long)]
        file: PathBuf,

        /// Text encoding of the file (WHATWG label)
        #[arg(short, long, default_value = "utf-8")]
        encoding: String,

        /// Maximum number of rows to display
        #[arg(short, long)]
        limit: Option<usize>,
    },
}

fn main() {
    if let Err(e) = run() {
        eprintln!("Error: {}", e);
        if let Error::UnparseableIdentifiers { failures } = &e {
            for failure in failures {
                eprintln!("  {}", failure);
            }
        }
        std::process::exit(1);
    }
}

fn run() -> loadgap_core::Result<()> {
    let cli = Cli::parse();

    match cli.command {
        Commands::Analyze {
            file,
            encoding,
            registry,
            export,
            output,
            limit,
        } => cmd_analyze(&file, &encoding, registry.as_deref(), export, output, limit),
        Commands::Fields {
            file,
            encoding,
            registry,
        } => cmd_fields(&file, &encoding, registry.as_deref()),
        Commands::Parse {
            file,
            encoding,
            limit,
        } => cmd_parse(&file, &encoding, limit),
    }
}

fn cmd_analyze(
    file: &PathBuf,
    encoding: &str,
    registry_path: Option<&std::path::Path>,
    export: Option<String>,
    output: Option<PathBuf>,
    limit: Option<usize>,
) -> loadgap_core::Result<()> {
    let encoding = resolve_encoding(encoding)?;
    let table = parse_load_file(file, encoding)?;
    let registry = load_registry(registry_path)?;
    let binding = registry.bind(&table);
    let analysis = analyze_gaps(&table, &binding)?;

    println!("Note that this doesn't account for Bates numbers with suffixes.");

    if analysis.has_gaps() {
        println!();
        println!("{}", "GAPS FOUND.".red());
        println!(
            "{}",
            "See the rows marked 'true' in the Gap column. The row after each gap is also shown."
                .red()
        );
        println!();
        print_gap_rows(&table, &analysis, limit);
    } else {
        println!("No gaps detected.");
    }

    if let (Some(format), Some(output)) = (export, output) {
        let report = GapReport::build(&table, &analysis);

        match format.to_lowercase().as_str() {
            "json" => report.save_json(&output)?,
            "csv" => report.save_csv(&output)?,
            _ => {
                eprintln!("Unknown format: {}. Supported formats: csv, json", format);
                std::process::exit(1);
            }
        }
        println!(
            "Exported {} report rows to {}",
            report.rows.len(),
            output.display()
        );
    }

    Ok(())
}

fn cmd_fields(
    file: &PathBuf,
    encoding: &str,
    registry_path: Option<&std::path::Path>,
) -> loadgap_core::Result<()> {
    let encoding = resolve_encoding(encoding)?;
    let table = parse_load_file(file, encoding)?;
    let registry = load_registry(registry_path)?;
    let binding = registry.bind(&table);

    println!("File: {}", file.display());
    println!("Columns: {}", table.column_count());
    println!("Bound fields: {}", binding.len());
    println!();

    for entry in registry.entries() {
        match binding.column(entry.field) {
            Some(column) => println!("  {:<18} -> {}", entry.field.name(), column),
            None => println!("  {:<18} -> (unbound)", entry.field.name()),
        }
    }

    Ok(())
}

fn cmd_parse(file: &PathBuf, encoding: &str, limit: Option<usize>) -> loadgap_core::Result<()> {
    let encoding = resolve_encoding(encoding)?;
    let table = parse_load_file(file, encoding)?;

    println!("File: {}", file.display());
    println!("Columns: {}", table.column_count());
    println!("Rows: {}", table.row_count());
    println!();

    // Print header
    let header: Vec<&str> = table.columns.iter().map(|c| c.name.as_str()).collect();
    println!("{}", header.join("\t"));
    println!("{}", "-".repeat(header.len() * 12));

    let row_limit = limit.unwrap_or(10);
    for row in table.rows.iter().take(row_limit) {
        let values: Vec<String> = row.cells.iter().map(|c| c.to_string_value()).collect();
        println!("{}", values.join("\t"));
    }

    if table.row_count() > row_limit {
        println!("... ({} more rows)", table.row_count() - row_limit);
    }

    Ok(())
}

/// Print the gap rows and their successors as a tab-separated table with the
/// derived numeric and gap columns appended
fn print_gap_rows(table: &Table, analysis: &GapAnalysis, limit: Option<usize>) {
    let mut header: Vec<&str> = table.columns.iter().map(|c| c.name.as_str()).collect();
    header.extend(["BegDocNumeric", "EndDocNumeric", "Gap"]);
    println!("{}", header.join("\t"));
    println!("{}", "-".repeat(header.len() * 12));

    let positions = analysis.report_positions();
    let row_limit = limit.unwrap_or(positions.len());

    for &position in positions.iter().take(row_limit) {
        let source_row = analysis.order[position];
        let key = analysis.keys[position];
        let flagged = analysis.flags[position];

        let mut values: Vec<String> = table.rows[source_row]
            .cells
            .iter()
            .map(|c| c.to_string_value())
            .collect();
        values.push(key.beg.to_string());
        values.push(key.end.to_string());
        values.push(flagged.to_string());

        let line = values.join("\t");
        if flagged {
            println!("{}", line.red());
        } else {
            println!("{}", line);
        }
    }

    if positions.len() > row_limit {
        println!("... ({} more rows)", positions.len() - row_limit);
    }
}

fn resolve_encoding(label: &str) -> loadgap_core::Result<&'static Encoding> {
    Encoding::for_label(label.as_bytes()).ok_or_else(|| Error::UnknownEncoding(label.to_string()))
}

fn load_registry(path: Option<&std::path::Path>) -> loadgap_core::Result<FieldRegistry> {
    match path {
        Some(path) => FieldRegistry::load(path),
        None => Ok(FieldRegistry::standard()),
    }
}
