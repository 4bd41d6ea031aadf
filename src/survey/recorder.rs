use std::collections::HashMap;
use std::fs;
use std::path::Path;

use chrono::NaiveDateTime;
use log::{error, info, warn};
use snafu::prelude::*;
use survey_ledger::builder::has_activities_flag;
use survey_ledger::{merge_record, Dataset, Record};

use crate::survey::config_reader::{CorruptDatasetPolicy, SurveyConfig};
use crate::survey::io_common::{display_path, parent_dir};
use crate::survey::io_excel::{read_dataset, write_dataset};
use crate::survey::{CreatingDataDirSnafu, LedgerSnafu, SurveyError, SurveyResult};

pub const SUCCESS_MESSAGE: &str =
    "تم استلام ردك بنجاح , شكرًا لك على الإفادة , نتطلع لمشاركتكم في الأشهر القادمة.";
pub const FAILURE_MESSAGE: &str = " فشل في حفظ البيانات. يرجى مراجعة الدعم الفني.";
pub const INCOMPLETE_MESSAGE: &str = "بيانات النموذج غير مكتملة. يرجى تعبئة الحقول المطلوبة.";

#[derive(Eq, PartialEq, Debug, Clone, Copy)]
pub enum SubmissionStatus {
    Success,
    Failure,
}

impl SubmissionStatus {
    pub fn http_code(&self) -> u16 {
        match self {
            SubmissionStatus::Success => 200,
            SubmissionStatus::Failure => 500,
        }
    }
}

/// What the person who filled the form gets back.
#[derive(Eq, PartialEq, Debug, Clone)]
pub struct SubmissionReport {
    pub status: SubmissionStatus,
    pub message: String,
}

impl SubmissionReport {
    fn failure(message: &str) -> SubmissionReport {
        SubmissionReport {
            status: SubmissionStatus::Failure,
            message: message.to_string(),
        }
    }
}

/// Appends one submission to the dataset.
///
/// This never fails: all the errors are logged and turned into a failure report.
pub fn record_submission(
    config: &SurveyConfig,
    fields: &HashMap<String, String>,
    submitted_at: NaiveDateTime,
) -> SubmissionReport {
    match append_submission(config, fields, submitted_at) {
        Ok(num_rows) => {
            info!(
                "record_submission: saved, {} now holds {} rows",
                config.data_path, num_rows
            );
            SubmissionReport {
                status: SubmissionStatus::Success,
                message: SUCCESS_MESSAGE.to_string(),
            }
        }
        Err(SurveyError::Ledger { source }) => {
            warn!("record_submission: rejected submission: {}", source);
            SubmissionReport::failure(INCOMPLETE_MESSAGE)
        }
        Err(e) => {
            error!("Error writing to Excel: {}", e);
            SubmissionReport::failure(FAILURE_MESSAGE)
        }
    }
}

fn append_submission(
    config: &SurveyConfig,
    fields: &HashMap<String, String>,
    submitted_at: NaiveDateTime,
) -> SurveyResult<usize> {
    let record = Record::from_form(fields, has_activities_flag(fields), submitted_at)
        .context(LedgerSnafu {})?;
    let path = Path::new(&config.data_path);
    let existing = load_existing(path, config.on_corrupt_dataset)?;
    let merged = merge_record(existing, &record);
    ensure_data_dir(path)?;
    write_dataset(path, &merged, &config.sheet_name, None)?;
    Ok(merged.len())
}

fn load_existing(path: &Path, policy: CorruptDatasetPolicy) -> SurveyResult<Option<Dataset>> {
    if !path.exists() {
        info!("load_existing: no dataset at {}, starting a new one", display_path(path));
        return Ok(None);
    }
    match read_dataset(path) {
        Ok(ds) => Ok(Some(ds)),
        Err(e) => match policy {
            CorruptDatasetPolicy::Abort => {
                error!(
                    "Error reading existing Excel file {}: {}. The submission is not saved.",
                    display_path(path),
                    e
                );
                Err(e)
            }
            CorruptDatasetPolicy::Overwrite => {
                warn!(
                    "Error reading existing Excel file {}: {}. The file will be replaced and its previous rows lost.",
                    display_path(path),
                    e
                );
                Ok(None)
            }
        },
    }
}

fn ensure_data_dir(path: &Path) -> SurveyResult<()> {
    let dir = parent_dir(path);
    fs::create_dir_all(dir).context(CreatingDataDirSnafu {
        path: display_path(dir),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;
    use survey_ledger::builder::*;
    use survey_ledger::{Cell, SCHEMA_COLUMNS};
    use tempfile::tempdir;

    fn now(minute: u32) -> NaiveDateTime {
        NaiveDate::from_ymd_opt(2024, 5, 1)
            .unwrap()
            .and_hms_opt(10, minute, 0)
            .unwrap()
    }

    fn config_in(dir: &Path, policy: CorruptDatasetPolicy) -> SurveyConfig {
        SurveyConfig {
            data_path: dir.join("data").join("responses.xlsx").display().to_string(),
            on_corrupt_dataset: policy,
            ..SurveyConfig::default()
        }
    }

    fn form(email: &str, has_activities: bool) -> HashMap<String, String> {
        let mut m: HashMap<String, String> = HashMap::new();
        m.insert(FIELD_EMAIL.to_string(), email.to_string());
        m.insert(FIELD_SECTOR.to_string(), "قطاع".to_string());
        m.insert(FIELD_DEPARTMENT.to_string(), "إدارة تنفيذية".to_string());
        m.insert(FIELD_DIVISION.to_string(), "إدارة".to_string());
        m.insert(FIELD_SECTION.to_string(), "قسم".to_string());
        m.insert(
            FIELD_HAS_ACTIVITIES.to_string(),
            if has_activities { "yes" } else { "no" }.to_string(),
        );
        m.insert(FIELD_TOPIC.to_string(), "إنشاء".to_string());
        m.insert(FIELD_ATTENDEE_COUNT.to_string(), "25".to_string());
        m
    }

    #[test]
    fn first_submission_creates_directory_and_file() {
        let dir = tempdir().expect("tempdir");
        let config = config_in(dir.path(), CorruptDatasetPolicy::Abort);
        let report = record_submission(&config, &form("a@example.org", true), now(0));
        assert_eq!(report.status, SubmissionStatus::Success);
        assert_eq!(report.status.http_code(), 200);
        assert_eq!(report.message, SUCCESS_MESSAGE);

        let ds = read_dataset(Path::new(&config.data_path)).expect("read");
        assert_eq!(ds.columns, SCHEMA_COLUMNS.to_vec());
        assert_eq!(ds.len(), 1);
        assert_eq!(ds.rows[0][6], Cell::text("إنشاء"));
        assert_eq!(ds.rows[0][17], Cell::text("25"));
        assert_eq!(ds.rows[0][20], Cell::text("2024-05-01 10:00:00"));
    }

    #[test]
    fn submissions_are_appended_in_order() {
        let dir = tempdir().expect("tempdir");
        let config = config_in(dir.path(), CorruptDatasetPolicy::Abort);
        for i in 0..4 {
            let report = record_submission(
                &config,
                &form(&format!("user{}@example.org", i), i % 2 == 0),
                now(i),
            );
            assert_eq!(report.status, SubmissionStatus::Success);
        }
        let ds = read_dataset(Path::new(&config.data_path)).expect("read");
        assert_eq!(ds.len(), 4);
        assert_eq!(ds.columns, SCHEMA_COLUMNS.to_vec());
        for (i, row) in ds.rows.iter().enumerate() {
            assert_eq!(row[0], Cell::Text(format!("user{}@example.org", i)));
        }
        // Second submission declared no activity.
        assert_eq!(ds.rows[1][6], Cell::text(NOT_APPLICABLE));
        assert_eq!(ds.rows[1][17], Cell::Number(0.0));
    }

    #[test]
    fn missing_identity_is_rejected_without_writing() {
        let dir = tempdir().expect("tempdir");
        let config = config_in(dir.path(), CorruptDatasetPolicy::Abort);
        let mut fields = form("a@example.org", true);
        fields.remove(FIELD_SECTION);
        let report = record_submission(&config, &fields, now(0));
        assert_eq!(report.status, SubmissionStatus::Failure);
        assert_eq!(report.message, INCOMPLETE_MESSAGE);
        assert!(!Path::new(&config.data_path).exists());
    }

    #[test]
    fn corrupt_dataset_is_kept_when_aborting() {
        let dir = tempdir().expect("tempdir");
        let config = config_in(dir.path(), CorruptDatasetPolicy::Abort);
        let path = Path::new(&config.data_path);
        fs::create_dir_all(path.parent().unwrap()).unwrap();
        fs::write(path, b"garbage").unwrap();

        let report = record_submission(&config, &form("a@example.org", true), now(0));
        assert_eq!(report.status, SubmissionStatus::Failure);
        assert_eq!(report.status.http_code(), 500);
        assert_eq!(report.message, FAILURE_MESSAGE);
        assert_eq!(fs::read(path).unwrap(), b"garbage".to_vec());
    }

    #[test]
    fn corrupt_dataset_is_replaced_when_overwriting() {
        let dir = tempdir().expect("tempdir");
        let config = config_in(dir.path(), CorruptDatasetPolicy::Overwrite);
        let path = Path::new(&config.data_path);
        fs::create_dir_all(path.parent().unwrap()).unwrap();
        fs::write(path, b"garbage").unwrap();

        let report = record_submission(&config, &form("a@example.org", false), now(0));
        assert_eq!(report.status, SubmissionStatus::Success);
        let ds = read_dataset(path).expect("read");
        assert_eq!(ds.len(), 1);
    }

    #[test]
    fn write_failure_is_reported() {
        let dir = tempdir().expect("tempdir");
        let config = SurveyConfig {
            sheet_name: "invalid/name".to_string(),
            ..config_in(dir.path(), CorruptDatasetPolicy::Abort)
        };
        let report = record_submission(&config, &form("a@example.org", true), now(0));
        assert_eq!(report.status, SubmissionStatus::Failure);
        assert_eq!(report.message, FAILURE_MESSAGE);
    }
}
