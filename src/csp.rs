use crate::error::DecodeError;
use serde::Deserializer;
use serde_derive::{Deserialize, Serialize};
use std::fmt;

#[derive(Default, Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CspReport {
    #[serde(rename = "csp-report")]
    pub body: ReportBody,
}

#[derive(Default, Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case", default)]
pub struct ReportBody {
    #[serde(deserialize_with = "null_as_empty")]
    pub document_uri: String,
    #[serde(deserialize_with = "null_as_empty")]
    pub referrer: String,
    #[serde(deserialize_with = "null_as_empty")]
    pub blocked_uri: String,
    #[serde(deserialize_with = "null_as_empty")]
    pub violated_directive: String,
    #[serde(deserialize_with = "null_as_empty")]
    pub effective_directive: String,
    #[serde(deserialize_with = "null_as_empty")]
    pub original_policy: String,
    #[serde(deserialize_with = "null_as_empty")]
    pub disposition: String,
    #[serde(deserialize_with = "null_as_empty")]
    pub script_sample: String,
    #[serde(deserialize_with = "null_as_empty")]
    pub source_file: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub status_code: Option<FieldValue>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub line_number: Option<FieldValue>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub column_number: Option<FieldValue>,
}

/// A report field that browsers send either as a JSON number or a JSON string.
///
/// Only ever rendered into the log, so the original representation is kept as is.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum FieldValue {
    Number(serde_json::Number),
    Text(String),
}

impl fmt::Display for FieldValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FieldValue::Number(n) => write!(f, "{n}"),
            FieldValue::Text(s) => f.write_str(s),
        }
    }
}

impl From<i64> for FieldValue {
    fn from(value: i64) -> Self {
        FieldValue::Number(value.into())
    }
}

impl From<&str> for FieldValue {
    fn from(value: &str) -> Self {
        FieldValue::Text(value.to_string())
    }
}

/// Browsers send `null` for fields they have nothing to say about.
fn null_as_empty<'de, D>(deserializer: D) -> Result<String, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(<Option<String> as serde::Deserialize>::deserialize(deserializer)?.unwrap_or_default())
}

pub fn decode(body: &[u8]) -> Result<CspReport, DecodeError> {
    Ok(serde_json::from_slice(body)?)
}
