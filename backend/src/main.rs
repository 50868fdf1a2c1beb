//! Dietboard CLI - aggregate diet-plan spreadsheets
//!
//! # Main Commands
//!
//! ```bash
//! dietboard serve                    # Start HTTP server (port 3000)
//! dietboard report plan.csv         # Full dashboard report as JSON
//! ```
//!
//! # Debug Commands (for development)
//!
//! ```bash
//! dietboard parse plan.csv          # Just normalize the sheet to JSON rows
//! dietboard detect plan.csv         # Show the detected planning cycle
//! dietboard options plan.csv site   # Show selectable values for a filter
//! ```

use clap::{Parser, Subcommand};
use dietboard::{
    apply_global_filters, build_report_from_path, detect_input_days, dynamic_options,
    parse_file_auto, parse_meal_time, FilterField, FilterState, ReportOptions, TimeWindow,
};
use std::fs;
use std::path::{Path, PathBuf};

#[derive(Parser)]
#[command(name = "dietboard")]
#[command(about = "Aggregate animal diet-plan spreadsheets into dashboard views", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Normalize a sheet and output the canonical rows as JSON
    Parse {
        /// Input spreadsheet (CSV export)
        input: PathBuf,

        /// Output file (default: stdout)
        #[arg(short, long)]
        output: Option<PathBuf>,
    },

    /// Show the detected planning cycle of a sheet
    Detect {
        /// Input spreadsheet
        input: PathBuf,
    },

    /// Show the selectable values for one filter dimension
    Options {
        /// Input spreadsheet
        input: PathBuf,

        /// Filter dimension: site, section, enclosure, class or species
        field: String,
    },

    /// Full dashboard report: all aggregated views as JSON
    Report {
        /// Input spreadsheet
        input: PathBuf,

        /// Restrict to these site names
        #[arg(long = "site")]
        sites: Vec<String>,

        /// Restrict to these section names
        #[arg(long = "section")]
        sections: Vec<String>,

        /// Restrict to these enclosure names
        #[arg(long = "enclosure")]
        enclosures: Vec<String>,

        /// Restrict to these class names
        #[arg(long = "class")]
        classes: Vec<String>,

        /// Restrict to these species common names
        #[arg(long = "species")]
        species: Vec<String>,

        /// Time window start (e.g. "8:00 AM" or "08:00")
        #[arg(long)]
        time_from: Option<String>,

        /// Time window end, inclusive
        #[arg(long)]
        time_to: Option<String>,

        /// Target duration in days: 1, 7, 15 or 30 (default: follows input)
        #[arg(short, long)]
        duration: Option<u32>,

        /// Output file (default: stdout)
        #[arg(short, long)]
        output: Option<PathBuf>,
    },

    /// Start HTTP server
    Serve {
        /// Port to listen on
        #[arg(short, long, default_value = "3000")]
        port: u16,
    },
}

#[tokio::main]
async fn main() {
    // Load .env file (if present)
    dotenvy::dotenv().ok();

    let cli = Cli::parse();

    let result = match cli.command {
        Commands::Parse { input, output } => cmd_parse(&input, output.as_deref()),

        Commands::Detect { input } => cmd_detect(&input),

        Commands::Options { input, field } => cmd_options(&input, &field),

        Commands::Report {
            input,
            sites,
            sections,
            enclosures,
            classes,
            species,
            time_from,
            time_to,
            duration,
            output,
        } => {
            let filters = FilterState {
                sites,
                sections,
                enclosures,
                classes,
                species,
                time_window: match build_time_window(time_from.as_deref(), time_to.as_deref()) {
                    Ok(window) => window,
                    Err(e) => {
                        eprintln!("Error: {}", e);
                        std::process::exit(1);
                    }
                },
            };
            cmd_report(&input, filters, duration, output.as_deref())
        }

        Commands::Serve { port } => cmd_serve(port).await,
    };

    if let Err(e) = result {
        eprintln!("Error: {}", e);
        std::process::exit(1);
    }
}

/// Build the optional time window from CLI flags. Both ends must be given
/// together, and both must parse as meal-time labels.
fn build_time_window(
    from: Option<&str>,
    to: Option<&str>,
) -> Result<Option<TimeWindow>, String> {
    match (from, to) {
        (None, None) => Ok(None),
        (Some(from), Some(to)) => {
            let start_minutes = parse_meal_time(from)
                .ok_or_else(|| format!("Cannot parse --time-from '{}'", from))?;
            let end_minutes =
                parse_meal_time(to).ok_or_else(|| format!("Cannot parse --time-to '{}'", to))?;
            Ok(Some(TimeWindow {
                start_minutes,
                end_minutes,
            }))
        }
        _ => Err("--time-from and --time-to must be given together".to_string()),
    }
}

fn cmd_parse(input: &Path, output: Option<&Path>) -> Result<(), Box<dyn std::error::Error>> {
    eprintln!("Parsing sheet: {}", input.display());

    let result = parse_file_auto(input)?;

    eprintln!("   Encoding: {}", result.encoding);
    eprintln!(
        "   Delimiter: '{}'",
        match result.delimiter {
            '\t' => "\\t".to_string(),
            c => c.to_string(),
        }
    );
    eprintln!("   Columns: {}", result.headers.join(", "));
    eprintln!("Normalized {} rows", result.rows.len());

    let json = serde_json::to_string_pretty(&result.rows)?;
    write_output(&json, output)?;

    Ok(())
}

fn cmd_detect(input: &Path) -> Result<(), Box<dyn std::error::Error>> {
    let result = parse_file_auto(input)?;
    let days = detect_input_days(&result.rows);

    let dated = result.rows.iter().filter(|r| r.date.is_some()).count();
    eprintln!("   Rows: {} ({} with parseable dates)", result.rows.len(), dated);
    println!(
        "Planning cycle: {} day(s) ({})",
        days,
        if days == 7 { "weekly" } else { "daily" }
    );

    Ok(())
}

fn cmd_options(input: &Path, field: &str) -> Result<(), Box<dyn std::error::Error>> {
    let field = FilterField::from_name(field)
        .ok_or_else(|| format!("Unknown filter field: '{}'", field))?;

    let result = parse_file_auto(input)?;
    let values = dynamic_options(&result.rows, field, &FilterState::default());

    eprintln!("{} value(s) for '{}':", values.len(), field.name());
    for value in values {
        println!("{}", value);
    }

    Ok(())
}

fn cmd_report(
    input: &Path,
    filters: FilterState,
    duration: Option<u32>,
    output: Option<&Path>,
) -> Result<(), Box<dyn std::error::Error>> {
    eprintln!("Processing: {}", input.display());

    let options = ReportOptions {
        filters: filters.clone(),
        target_days: duration,
    };

    let report = build_report_from_path(input, options)?;

    eprintln!("   Encoding: {}", report.sheet_info.encoding);
    eprintln!("   Rows: {}", report.sheet_info.row_count);
    eprintln!(
        "   Planning cycle: {} day(s), reporting over {} day(s)",
        report.duration.actual_input_days, report.duration.target_output_days
    );

    if !filters.is_empty() {
        // Quick sanity line: how much of the sheet the filters keep.
        let parsed = parse_file_auto(input)?;
        let kept = apply_global_filters(&parsed.rows, &filters).len();
        eprintln!("   In view: {} of {} rows", kept, parsed.rows.len());
    }

    let json = serde_json::to_string_pretty(&report)?;
    write_output(&json, output)?;

    eprintln!("Done.");
    Ok(())
}

async fn cmd_serve(port: u16) -> Result<(), Box<dyn std::error::Error>> {
    dietboard::server::start_server(port).await
}

fn write_output(content: &str, path: Option<&Path>) -> Result<(), Box<dyn std::error::Error>> {
    match path {
        Some(p) => {
            fs::write(p, content)?;
            eprintln!("Output written to: {}", p.display());
        }
        None => {
            println!("{}", content);
        }
    }
    Ok(())
}
