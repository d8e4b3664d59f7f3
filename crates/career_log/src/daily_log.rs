use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use crate::error::AppError;

const DATE_KEY_FORMAT: &str = "%Y-%m-%d";

/// One day of work, keyed by its calendar date.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct DailyLog {
    pub log_date: String,
    pub name: String,
    pub project: String,
    #[serde(default)]
    pub tasks_completed: Vec<String>,
    #[serde(default)]
    pub tasks_planned: Vec<String>,
    #[serde(default)]
    pub blockers: Vec<String>,
    #[serde(default)]
    pub reflection_well: String,
    #[serde(default)]
    pub reflection_improve: String,
}

impl DailyLog {
    /// A log with only its date set, used as the starting point for parsing.
    pub fn empty(date: &str) -> Self {
        Self {
            log_date: date.to_string(),
            ..Default::default()
        }
    }
}

/// Inclusive date range. Bounds are compared against stored keys as plain
/// strings, which only orders correctly for fixed-width `YYYY-MM-DD` keys.
#[derive(Debug, Clone, Deserialize)]
pub struct ReportRequest {
    pub start_date: String,
    pub end_date: String,
}

impl ReportRequest {
    pub fn contains(&self, key: &str) -> bool {
        self.start_date.as_str() <= key && key <= self.end_date.as_str()
    }
}

/// Date keys double as file names, so only canonical calendar dates are accepted.
pub fn validate_date_key(date: &str) -> Result<(), AppError> {
    let parsed = NaiveDate::parse_from_str(date, DATE_KEY_FORMAT)
        .map_err(|_| AppError::Validation(format!("invalid log date '{date}' (expected YYYY-MM-DD)")))?;

    if parsed.format(DATE_KEY_FORMAT).to_string() != date {
        return Err(AppError::Validation(format!(
            "invalid log date '{date}' (expected YYYY-MM-DD)"
        )));
    }

    Ok(())
}
