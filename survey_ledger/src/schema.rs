// ********* Cell values ***********

use chrono::{Duration, NaiveDate, NaiveDateTime};
use std::error::Error;
use std::fmt::Display;

/// A single value of the dataset, as it is stored in a spreadsheet cell.
#[derive(PartialEq, Debug, Clone)]
pub enum Cell {
    /// A missing value. This is not the same as an empty string.
    Empty,
    Text(String),
    Number(f64),
    Bool(bool),
    /// A date or a date and time, as a spreadsheet serial number (days since 1899-12-30).
    DateTime(f64),
}

impl Cell {
    pub fn text(s: &str) -> Cell {
        Cell::Text(s.to_string())
    }

    /// The textual rendering of the cell, or None if the value is missing.
    ///
    /// Integral numbers are rendered without a fractional part (`5` and not `5.0`).
    pub fn as_text(&self) -> Option<String> {
        match self {
            Cell::Empty => None,
            Cell::Text(s) => Some(s.clone()),
            Cell::Number(n) if n.fract() == 0.0 && n.abs() < 1e15 => Some(format!("{}", *n as i64)),
            Cell::Number(n) => Some(n.to_string()),
            Cell::Bool(true) => Some("True".to_string()),
            Cell::Bool(false) => Some("False".to_string()),
            Cell::DateTime(serial) => Some(match serial_to_datetime(*serial) {
                Some(dt) => dt.format(SUBMITTED_AT_FORMAT).to_string(),
                None => serial.to_string(),
            }),
        }
    }
}

/// Converts a spreadsheet serial date, rounded to the second.
pub fn serial_to_datetime(serial: f64) -> Option<NaiveDateTime> {
    if !serial.is_finite() {
        return None;
    }
    let epoch = NaiveDate::from_ymd_opt(1899, 12, 30)?.and_hms_opt(0, 0, 0)?;
    let seconds = (serial * 86_400.0).round();
    if seconds.abs() > 1e13 {
        return None;
    }
    epoch.checked_add_signed(Duration::seconds(seconds as i64))
}

// ********* Schema **********

// The headers are the on-disk contract of the dataset and must not change.
pub const COL_EMAIL: &str = "البريد الإلكتروني";
pub const COL_SECTOR: &str = "اسم القطاع";
pub const COL_DEPARTMENT: &str = "الإدارة التنفيذية";
pub const COL_DIVISION: &str = "الإدارة";
pub const COL_SECTION: &str = "القسم";
pub const COL_HAS_ACTIVITIES: &str = "هل توجد أنشطة؟";
pub const COL_TOPIC: &str = "موضوع النشاط";
pub const COL_ACTIVITY_TYPE: &str = "نوع النشاط";
pub const COL_STRATEGIC_GOAL_1: &str = "هدف استراتيجي 1";
pub const COL_STRATEGIC_GOAL_2: &str = "هدف استراتيجي 2";
pub const COL_PRESENTER_CATEGORY: &str = "تصنيف المقدم";
pub const COL_START_DATE: &str = "تاريخ بداية النشاط";
pub const COL_END_DATE: &str = "تاريخ نهاية النشاط";
pub const COL_PRESENTER_NAME: &str = "اسم المقدم";
pub const COL_ATTENDANCE_RESPONSIBLE: &str = "مسؤول الحضور";
pub const COL_AUDIENCE_TYPE: &str = "الفئة المستهدفة (النوع)";
pub const COL_AUDIENCE_DETAILS: &str = "الفئة المستهدفة (تفاصيل)";
pub const COL_ATTENDEE_COUNT: &str = "عدد الحضور";
pub const COL_DURATION_HOURS: &str = "مدة النشاط (ساعة)";
pub const COL_CONTENT_LOCATION: &str = "مكان الحفظ";
pub const COL_SUBMITTED_AT: &str = "تاريخ الإرسال";

/// The columns of the dataset, in their persisted order.
pub const SCHEMA_COLUMNS: [&str; 21] = [
    COL_EMAIL,
    COL_SECTOR,
    COL_DEPARTMENT,
    COL_DIVISION,
    COL_SECTION,
    COL_HAS_ACTIVITIES,
    COL_TOPIC,
    COL_ACTIVITY_TYPE,
    COL_STRATEGIC_GOAL_1,
    COL_STRATEGIC_GOAL_2,
    COL_PRESENTER_CATEGORY,
    COL_START_DATE,
    COL_END_DATE,
    COL_PRESENTER_NAME,
    COL_ATTENDANCE_RESPONSIBLE,
    COL_AUDIENCE_TYPE,
    COL_AUDIENCE_DETAILS,
    COL_ATTENDEE_COUNT,
    COL_DURATION_HOURS,
    COL_CONTENT_LOCATION,
    COL_SUBMITTED_AT,
];

/// The columns that identify the same activity reported twice.
pub const DUPLICATE_KEY_COLUMNS: [&str; 8] = [
    COL_START_DATE,
    COL_END_DATE,
    COL_SECTOR,
    COL_DEPARTMENT,
    COL_DIVISION,
    COL_TOPIC,
    COL_PRESENTER_NAME,
    COL_AUDIENCE_DETAILS,
];

/// Free text columns that users type inconsistently.
pub const NORMALIZED_COLUMNS: [&str; 3] = [COL_TOPIC, COL_PRESENTER_NAME, COL_AUDIENCE_DETAILS];

/// Stored in every text detail field when no activity was reported.
pub const NOT_APPLICABLE: &str = "لا يوجد";
/// Stored in the activity flag column when an activity was reported.
pub const HAS_ACTIVITIES_YES: &str = "نعم";
/// Stored in the count detail fields when no activity was reported.
pub const NOT_APPLICABLE_COUNT: f64 = 0.0;

pub const SUBMITTED_AT_FORMAT: &str = "%Y-%m-%d %H:%M:%S";

// ********* Records **********

/// The fields of a submission that only make sense when an activity took place.
#[derive(PartialEq, Debug, Clone)]
pub struct ActivityDetails {
    pub topic: Cell,
    pub activity_type: Cell,
    pub strategic_goal_1: Cell,
    pub strategic_goal_2: Cell,
    pub presenter_category: Cell,
    pub start_date: Cell,
    pub end_date: Cell,
    pub presenter_name: Cell,
    pub attendance_responsible: Cell,
    pub audience_type: Cell,
    pub audience_details: Cell,
    pub attendee_count: Cell,
    pub duration_hours: Cell,
    pub content_location: Cell,
}

/// One submission of the survey.
///
/// Records are only created through the builder, which guarantees that all the
/// identity fields are filled and that `activity` is None exactly when the
/// submitter reported no activity.
#[derive(PartialEq, Debug, Clone)]
pub struct Record {
    pub email: String,
    pub sector: String,
    pub department: String,
    pub division: String,
    pub section: String,
    pub submitted_at: String,
    pub activity: Option<ActivityDetails>,
}

impl Record {
    pub fn has_activities(&self) -> bool {
        self.activity.is_some()
    }

    /// The values of this record, aligned with `SCHEMA_COLUMNS`.
    pub fn to_row(&self) -> Vec<Cell> {
        let na = || Cell::text(NOT_APPLICABLE);
        let na_count = || Cell::Number(NOT_APPLICABLE_COUNT);
        let flag = if self.has_activities() {
            HAS_ACTIVITIES_YES
        } else {
            NOT_APPLICABLE
        };
        let mut row = vec![
            Cell::text(&self.email),
            Cell::text(&self.sector),
            Cell::text(&self.department),
            Cell::text(&self.division),
            Cell::text(&self.section),
            Cell::text(flag),
        ];
        match &self.activity {
            Some(a) => row.extend([
                a.topic.clone(),
                a.activity_type.clone(),
                a.strategic_goal_1.clone(),
                a.strategic_goal_2.clone(),
                a.presenter_category.clone(),
                a.start_date.clone(),
                a.end_date.clone(),
                a.presenter_name.clone(),
                a.attendance_responsible.clone(),
                a.audience_type.clone(),
                a.audience_details.clone(),
                a.attendee_count.clone(),
                a.duration_hours.clone(),
                a.content_location.clone(),
            ]),
            None => {
                row.extend((0..11).map(|_| na()));
                row.extend([na_count(), na_count(), na()]);
            }
        }
        row.push(Cell::text(&self.submitted_at));
        row
    }
}

// ********* Errors **********

/// Errors raised while assembling records.
#[derive(Eq, PartialEq, Debug, Clone)]
pub enum LedgerError {
    /// A field that identifies the submitter was absent or blank.
    MissingIdentityField { field: String },
}

impl Error for LedgerError {}

impl Display for LedgerError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            LedgerError::MissingIdentityField { field } => {
                write!(f, "missing identity field {:?}", field)
            }
        }
    }
}
