use std::collections::HashMap;
use std::fs;

use log::debug;
use serde::{Deserialize, Serialize};
use serde_json::Value as JSValue;
use snafu::prelude::*;

use crate::survey::{OpeningJsonSnafu, ParsingJsonSnafu, SurveyResult};

/// What to do when the existing dataset cannot be read before appending a submission.
#[derive(Eq, PartialEq, Debug, Clone, Copy, Serialize, Deserialize, Default)]
pub enum CorruptDatasetPolicy {
    /// Refuse the submission and leave the file as it is.
    #[default]
    #[serde(rename = "abort")]
    Abort,
    /// Replace the file with the new submission only. All the previous rows are lost.
    #[serde(rename = "overwrite")]
    Overwrite,
}

#[derive(Eq, PartialEq, Debug, Clone, Serialize, Deserialize)]
pub struct SurveyConfig {
    #[serde(rename = "dataPath", default = "default_data_path")]
    pub data_path: String,
    #[serde(rename = "sheetName", default = "default_sheet_name")]
    pub sheet_name: String,
    #[serde(rename = "onCorruptDataset", default)]
    pub on_corrupt_dataset: CorruptDatasetPolicy,
    #[serde(rename = "duplicateFillColor", default = "default_fill_color")]
    pub duplicate_fill_color: String,
}

fn default_data_path() -> String {
    "data/responses.xlsx".to_string()
}

fn default_sheet_name() -> String {
    "الردود".to_string()
}

fn default_fill_color() -> String {
    "#FFC7CE".to_string()
}

impl Default for SurveyConfig {
    fn default() -> Self {
        SurveyConfig {
            data_path: default_data_path(),
            sheet_name: default_sheet_name(),
            on_corrupt_dataset: CorruptDatasetPolicy::default(),
            duplicate_fill_color: default_fill_color(),
        }
    }
}

impl SurveyConfig {
    /// The highlight color as 0xRRGGBB. Accepts `#RRGGBB` or `RRGGBB`.
    pub fn fill_color_rgb(&self) -> SurveyResult<u32> {
        let hex = self
            .duplicate_fill_color
            .strip_prefix('#')
            .unwrap_or(&self.duplicate_fill_color);
        if hex.len() != 6 {
            whatever!("Invalid duplicateFillColor {:?}", self.duplicate_fill_color);
        }
        u32::from_str_radix(hex, 16).with_whatever_context(|_| {
            format!("Invalid duplicateFillColor {:?}", self.duplicate_fill_color)
        })
    }
}

/// Reads the configuration file, or returns the defaults when no file is given.
pub fn read_config(path: Option<String>) -> SurveyResult<SurveyConfig> {
    let config = match path {
        Some(p) => {
            let contents = fs::read_to_string(&p).context(OpeningJsonSnafu { path: p })?;
            serde_json::from_str(&contents).context(ParsingJsonSnafu {})?
        }
        None => SurveyConfig::default(),
    };
    debug!("read_config: {:?}", config);
    // Fail early on a bad color rather than in the middle of an audit.
    config.fill_color_rgb()?;
    Ok(config)
}

/// Reads the fields of a submission from a flat JSON object.
///
/// Numbers and booleans are turned into text, nulls are treated as absent fields.
pub fn read_form_fields(path: String) -> SurveyResult<HashMap<String, String>> {
    let contents = fs::read_to_string(&path).context(OpeningJsonSnafu { path: path.clone() })?;
    let js: JSValue = serde_json::from_str(contents.as_str()).context(ParsingJsonSnafu {})?;
    form_fields_from_json(&js)
}

pub fn form_fields_from_json(js: &JSValue) -> SurveyResult<HashMap<String, String>> {
    let obj = match js.as_object() {
        Some(obj) => obj,
        None => whatever!("The form fields must be a JSON object, got {}", js),
    };
    let mut res: HashMap<String, String> = HashMap::new();
    for (name, value) in obj.iter() {
        match value {
            JSValue::Null => {}
            JSValue::String(s) => {
                res.insert(name.clone(), s.clone());
            }
            JSValue::Number(n) => {
                res.insert(name.clone(), n.to_string());
            }
            JSValue::Bool(b) => {
                res.insert(name.clone(), b.to_string());
            }
            x => whatever!("Field {} must be a scalar value, got {}", name, x),
        }
    }
    Ok(res)
}

/// Parses `name=value` pairs given on the command line.
pub fn parse_field_pairs(pairs: &[String]) -> SurveyResult<Vec<(String, String)>> {
    pairs
        .iter()
        .map(|p| -> SurveyResult<(String, String)> {
            match p.split_once('=') {
                Some((name, value)) if !name.is_empty() => {
                    Ok((name.to_string(), value.to_string()))
                }
                _ => whatever!("Expected a field as name=value, got {:?}", p),
            }
        })
        .collect()
}
