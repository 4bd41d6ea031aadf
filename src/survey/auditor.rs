use std::path::Path;

use log::debug;
use snafu::prelude::*;
use survey_ledger::{audit_dataset, AuditOutcome};

use crate::survey::config_reader::SurveyConfig;
use crate::survey::io_excel::{read_dataset, write_dataset, Highlight};
use crate::survey::{DatasetNotFoundSnafu, SurveyResult};

#[derive(Eq, PartialEq, Debug, Clone)]
pub enum AuditReport {
    /// The dataset has none of the columns used to compare rows. Nothing was done.
    NoKeyColumns,
    /// Nothing to highlight, the file was not rewritten.
    NoDuplicates,
    /// The file was rewritten with the duplicates highlighted.
    Highlighted {
        count: usize,
        /// Spreadsheet row numbers, the header being row 1.
        rows: Vec<usize>,
    },
}

/// Highlights the duplicate rows of the dataset at `path`, in place.
///
/// Progress is reported on the standard output.
pub fn run_audit(path: &str, config: &SurveyConfig) -> SurveyResult<AuditReport> {
    let p = Path::new(path);
    ensure!(p.exists(), DatasetNotFoundSnafu { path });
    let fill_color = config.fill_color_rgb()?;

    println!("Starting data cleaning and duplicate highlighting...");
    let dataset = read_dataset(p)?;
    let outcome = audit_dataset(dataset);
    let count = outcome.duplicate_count();
    let rows = outcome.duplicate_row_numbers();

    match outcome {
        AuditOutcome::NoKeyColumns => {
            println!("Warning: No key columns found for duplicate check. Skipping.");
            Ok(AuditReport::NoKeyColumns)
        }
        AuditOutcome::NoDuplicates => {
            println!("No duplicates found.");
            Ok(AuditReport::NoDuplicates)
        }
        AuditOutcome::Duplicates { dataset, flags } => {
            println!("Found {} duplicate rows. Highlighting in red...", count);
            debug!("run_audit: duplicate rows: {:?}", rows);
            let highlight = Highlight {
                rows: &flags,
                fill_color,
            };
            write_dataset(p, &dataset, &config.sheet_name, Some(&highlight))?;
            println!("Data cleaning and highlighting complete.");
            Ok(AuditReport::Highlighted { count, rows })
        }
    }
}
