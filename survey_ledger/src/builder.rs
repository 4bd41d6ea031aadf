pub use crate::schema::*;

use chrono::NaiveDateTime;
use log::debug;
use std::collections::HashMap;

// Names of the fields posted by the survey form.
pub const FIELD_EMAIL: &str = "employeeEmail";
pub const FIELD_SECTOR: &str = "sector";
pub const FIELD_DEPARTMENT: &str = "department";
pub const FIELD_DIVISION: &str = "division";
pub const FIELD_SECTION: &str = "section";
pub const FIELD_HAS_ACTIVITIES: &str = "hasActivities";
pub const FIELD_TOPIC: &str = "activityTopic";
pub const FIELD_ACTIVITY_TYPE: &str = "activityType";
pub const FIELD_STRATEGIC_GOAL_1: &str = "strategicGoalLevel1";
pub const FIELD_STRATEGIC_GOAL_2: &str = "strategicGoalLevel2";
pub const FIELD_PRESENTER_CATEGORY: &str = "presenterCategory";
pub const FIELD_START_DATE: &str = "activityStartDate";
pub const FIELD_END_DATE: &str = "activityEndDate";
pub const FIELD_PRESENTER_NAME: &str = "presenterName";
pub const FIELD_ATTENDANCE_RESPONSIBLE: &str = "attendanceResponsible";
pub const FIELD_AUDIENCE_TYPE: &str = "targetAudienceType";
pub const FIELD_AUDIENCE_DETAILS: &str = "targetAudienceDetails";
pub const FIELD_ATTENDEE_COUNT: &str = "attendeeCount";
pub const FIELD_DURATION: &str = "activityDuration";
pub const FIELD_CONTENT_LOCATION: &str = "contentLocation";

/// The form sends `yes` when the submitter declares at least one activity.
pub fn has_activities_flag(fields: &HashMap<String, String>) -> bool {
    fields.get(FIELD_HAS_ACTIVITIES).map(|s| s.as_str()) == Some("yes")
}

/// A builder for records.
///
/// ```
/// use survey_ledger::builder::SubmissionBuilder;
/// # use survey_ledger::LedgerError;
/// # let now = chrono::NaiveDate::from_ymd_opt(2024, 1, 1).unwrap().and_hms_opt(9, 0, 0).unwrap();
///
/// let record = SubmissionBuilder::new(now)
///     .field("employeeEmail", "a@example.org")
///     .field("sector", "A")
///     .field("department", "X")
///     .field("division", "Y")
///     .field("section", "Z")
///     .build()?;
///
/// assert!(!record.has_activities());
/// # Ok::<(), LedgerError>(())
/// ```
pub struct SubmissionBuilder {
    submitted_at: NaiveDateTime,
    has_activities: bool,
    fields: HashMap<String, String>,
}

impl SubmissionBuilder {
    pub fn new(submitted_at: NaiveDateTime) -> SubmissionBuilder {
        SubmissionBuilder {
            submitted_at,
            has_activities: false,
            fields: HashMap::new(),
        }
    }

    pub fn field(mut self, name: &str, value: &str) -> SubmissionBuilder {
        self.fields.insert(name.to_string(), value.to_string());
        self
    }

    pub fn has_activities(mut self, has_activities: bool) -> SubmissionBuilder {
        self.has_activities = has_activities;
        self
    }

    pub fn build(self) -> Result<Record, LedgerError> {
        Record::from_form(&self.fields, self.has_activities, self.submitted_at)
    }
}

impl Record {
    /// Assembles a record from the fields posted by the form.
    ///
    /// When `has_activities` is false, all the activity fields are replaced by the
    /// placeholder, whatever was sent. Otherwise they are copied verbatim.
    pub fn from_form(
        fields: &HashMap<String, String>,
        has_activities: bool,
        submitted_at: NaiveDateTime,
    ) -> Result<Record, LedgerError> {
        let identity = |name: &str| -> Result<String, LedgerError> {
            match fields.get(name) {
                Some(s) if !s.trim().is_empty() => Ok(s.clone()),
                _ => Err(LedgerError::MissingIdentityField {
                    field: name.to_string(),
                }),
            }
        };

        let activity = if has_activities {
            Some(ActivityDetails {
                topic: detail_text(fields, FIELD_TOPIC),
                activity_type: detail_text(fields, FIELD_ACTIVITY_TYPE),
                strategic_goal_1: detail_text(fields, FIELD_STRATEGIC_GOAL_1),
                strategic_goal_2: detail_text(fields, FIELD_STRATEGIC_GOAL_2),
                presenter_category: detail_text(fields, FIELD_PRESENTER_CATEGORY),
                start_date: detail_text(fields, FIELD_START_DATE),
                end_date: detail_text(fields, FIELD_END_DATE),
                presenter_name: detail_text(fields, FIELD_PRESENTER_NAME),
                attendance_responsible: detail_text(fields, FIELD_ATTENDANCE_RESPONSIBLE),
                audience_type: detail_text(fields, FIELD_AUDIENCE_TYPE),
                audience_details: detail_text(fields, FIELD_AUDIENCE_DETAILS),
                attendee_count: detail_count(fields, FIELD_ATTENDEE_COUNT),
                duration_hours: detail_count(fields, FIELD_DURATION),
                content_location: detail_text(fields, FIELD_CONTENT_LOCATION),
            })
        } else {
            None
        };

        Ok(Record {
            email: identity(FIELD_EMAIL)?,
            sector: identity(FIELD_SECTOR)?,
            department: identity(FIELD_DEPARTMENT)?,
            division: identity(FIELD_DIVISION)?,
            section: identity(FIELD_SECTION)?,
            submitted_at: submitted_at.format(SUBMITTED_AT_FORMAT).to_string(),
            activity,
        })
    }
}

fn given(fields: &HashMap<String, String>, name: &str) -> Option<Cell> {
    match fields.get(name) {
        Some(s) if !s.trim().is_empty() => Some(Cell::Text(s.clone())),
        _ => {
            debug!("from_form: field {} not provided, using placeholder", name);
            None
        }
    }
}

fn detail_text(fields: &HashMap<String, String>, name: &str) -> Cell {
    given(fields, name).unwrap_or_else(|| Cell::text(NOT_APPLICABLE))
}

fn detail_count(fields: &HashMap<String, String>, name: &str) -> Cell {
    given(fields, name).unwrap_or(Cell::Number(NOT_APPLICABLE_COUNT))
}
