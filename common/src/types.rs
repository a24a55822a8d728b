use crate::error::CommonError;
use serde::{Deserialize, Serialize};

/// Selectors accepted when listing pods
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ListQuery {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub label_selector: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub field_selector: Option<String>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ContainersQuery {
    #[serde(default)]
    pub include_init: bool,
}

/// Log streaming options
///
/// `container` falls back to the first declared container and `lines`
/// to the server's configured tail length.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct LogQuery {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub container: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub lines: Option<i64>,
    #[serde(default)]
    pub previous: bool,
}

impl LogQuery {
    /// Resolve the tail length, rejecting negative counts
    pub fn tail_lines(&self, default: i64) -> Result<i64, CommonError> {
        let lines = self.lines.unwrap_or(default);
        if lines < 0 {
            return Err(CommonError::InvalidData(format!(
                "lines must not be negative, got {}",
                lines
            )));
        }
        Ok(lines)
    }
}

/// Container names of a pod, init containers last when requested
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ContainersResponse {
    pub pod: String,
    pub containers: Vec<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DeleteResponse {
    pub namespace: String,
    pub pod: String,
    pub grace_period_seconds: u32,
}
