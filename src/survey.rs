use snafu::Snafu;

pub mod auditor;
pub mod config_reader;
pub mod io_common;
pub mod io_excel;
pub mod recorder;

#[derive(Debug, Snafu)]
pub enum SurveyError {
    #[snafu(display("Error opening file {path}"))]
    OpeningExcel {
        source: calamine::XlsxError,
        path: String,
    },
    #[snafu(display("File {path} does not contain any worksheet"))]
    EmptyExcel { path: String },
    #[snafu(display("Error: File not found at {path}"))]
    DatasetNotFound { path: String },
    #[snafu(display("Error building the workbook for {path}"))]
    WritingExcel {
        source: rust_xlsxwriter::XlsxError,
        path: String,
    },
    #[snafu(display("Error saving the workbook to {path}"))]
    PersistingDataset {
        source: std::io::Error,
        path: String,
    },
    #[snafu(display("Error creating the data directory {path}"))]
    CreatingDataDir {
        source: std::io::Error,
        path: String,
    },
    #[snafu(display("Error reading {path}"))]
    OpeningJson {
        source: std::io::Error,
        path: String,
    },
    #[snafu(display("Error parsing JSON"))]
    ParsingJson { source: serde_json::Error },
    #[snafu(display("Invalid submission: {source}"))]
    Ledger { source: survey_ledger::LedgerError },

    #[snafu(whatever, display("{message}"))]
    Whatever {
        message: String,
        #[snafu(source(from(Box<dyn std::error::Error>, Some)))]
        source: Option<Box<dyn std::error::Error>>,
    },
}

pub type SurveyResult<T> = Result<T, SurveyError>;
