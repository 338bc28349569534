use anyhow::{bail, Context};
use clap::{Parser, Subcommand};
use om_parse_core::{parse_offering, ParseOutcome};
use std::path::{Path, PathBuf};
use tracing::{info, warn};
use tracing_subscriber::{fmt, prelude::*, EnvFilter};
use walkdir::WalkDir;

#[derive(Parser)]
#[command(name = "om-parse", version)]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Parse one offering document and/or rent-roll workbook to JSON.
    Parse {
        /// Offering memorandum PDF.
        #[arg(long)]
        pdf: Option<PathBuf>,

        /// Rent-roll workbook (xlsx, xls, xlsb, ods).
        #[arg(long)]
        workbook: Option<PathBuf>,

        /// Print only the parsing report, not the parsed data.
        #[arg(long, default_value_t = false)]
        report_only: bool,
    },
    /// Scan a folder, pair documents with sibling workbooks by file
    /// stem, and report a quality score per deal.
    Scan {
        /// Folder that contains offering documents recursively.
        #[arg(long)]
        folder: PathBuf,
    },
}

fn main() -> anyhow::Result<()> {
    tracing_subscriber::registry()
        .with(EnvFilter::from_default_env())
        .with(fmt::layer())
        .init();

    let cli = Cli::parse();

    match cli.command {
        Command::Parse {
            pdf,
            workbook,
            report_only,
        } => {
            if pdf.is_none() && workbook.is_none() {
                bail!("supply --pdf, --workbook, or both");
            }

            let outcome = parse_offering(pdf.as_deref(), workbook.as_deref())
                .context("offering parse failed")?;
            print_outcome(&outcome, report_only)?;
        }
        Command::Scan { folder } => {
            scan_folder(&folder)?;
        }
    }

    Ok(())
}

fn print_outcome(outcome: &ParseOutcome, report_only: bool) -> anyhow::Result<()> {
    for error in &outcome.parsing_report.errors {
        warn!(%error, "source failed");
    }

    let rendered = if report_only {
        serde_json::to_string_pretty(&outcome.parsing_report)?
    } else {
        serde_json::to_string_pretty(outcome)?
    };
    println!("{rendered}");
    Ok(())
}

const WORKBOOK_EXTENSIONS: [&str; 4] = ["xlsx", "xls", "xlsb", "ods"];

fn has_extension(path: &Path, extensions: &[&str]) -> bool {
    path.extension()
        .and_then(|ext| ext.to_str())
        .is_some_and(|ext| extensions.iter().any(|want| ext.eq_ignore_ascii_case(want)))
}

fn scan_folder(folder: &Path) -> anyhow::Result<()> {
    let mut documents = Vec::new();
    let mut workbooks = Vec::new();

    for entry in WalkDir::new(folder).into_iter().filter_map(|item| item.ok()) {
        if !entry.file_type().is_file() {
            continue;
        }
        let path = entry.path().to_path_buf();
        if has_extension(&path, &["pdf"]) {
            documents.push(path);
        } else if has_extension(&path, &WORKBOOK_EXTENSIONS) {
            workbooks.push(path);
        }
    }
    documents.sort_unstable();
    workbooks.sort_unstable();

    if documents.is_empty() && workbooks.is_empty() {
        bail!("no offering documents found in {}", folder.display());
    }

    // A workbook sharing a document's file stem belongs to that deal;
    // leftovers are parsed standalone.
    let mut claimed = vec![false; workbooks.len()];
    for document in &documents {
        let stem = document.file_stem().and_then(|stem| stem.to_str());
        let sibling = workbooks
            .iter()
            .enumerate()
            .find(|(index, workbook)| {
                !claimed[*index] && workbook.file_stem().and_then(|s| s.to_str()) == stem
            })
            .map(|(index, workbook)| (index, workbook.clone()));

        let workbook = sibling.map(|(index, workbook)| {
            claimed[index] = true;
            workbook
        });

        report_deal(Some(document), workbook.as_deref());
    }
    for (index, workbook) in workbooks.iter().enumerate() {
        if !claimed[index] {
            report_deal(None, Some(workbook));
        }
    }

    Ok(())
}

fn report_deal(document: Option<&Path>, workbook: Option<&Path>) {
    let label = document
        .or(workbook)
        .map(|path| path.display().to_string())
        .unwrap_or_default();

    match parse_offering(document, workbook) {
        Ok(outcome) => {
            info!(
                deal = %label,
                quality = outcome.parsing_report.quality_score,
                entries = outcome.parsed_data.rent_roll.len(),
                errors = outcome.parsing_report.errors.len(),
                "parsed deal"
            );
            println!(
                "{label}: quality {:.0}, {} rent roll entries",
                outcome.parsing_report.quality_score,
                outcome.parsed_data.rent_roll.len()
            );
        }
        Err(error) => {
            warn!(deal = %label, %error, "deal failed to parse");
            println!("{label}: failed ({error})");
        }
    }
}
