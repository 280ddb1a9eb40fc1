//! Patient history archive and the `get_patient_history` tool.
//!
//! The archive is a JSON object keyed by patient id. It is re-read on every
//! lookup so edits to the file show up without a restart.

use async_trait::async_trait;
use mediscreen_core::error::ToolError;
use mediscreen_core::tool::{Tool, ToolResult};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tracing::debug;

pub const GET_PATIENT_HISTORY: &str = "get_patient_history";

/// Errors reading the patient archive.
#[derive(Debug, thiserror::Error)]
pub enum HistoryError {
    #[error("Failed to read patient archive at {path}: {reason}")]
    Read { path: PathBuf, reason: String },

    #[error("Failed to parse patient archive at {path}: {reason}")]
    Parse { path: PathBuf, reason: String },

    #[error("Patient archive at {path} is not a JSON object keyed by patient id")]
    NotAnObject { path: PathBuf },
}

/// Read-only view over the patient data file.
#[derive(Debug, Clone)]
pub struct PatientArchive {
    path: PathBuf,
}

impl PatientArchive {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    async fn load(&self) -> Result<serde_json::Map<String, serde_json::Value>, HistoryError> {
        let content = tokio::fs::read_to_string(&self.path)
            .await
            .map_err(|e| HistoryError::Read {
                path: self.path.clone(),
                reason: e.to_string(),
            })?;

        let value: serde_json::Value =
            serde_json::from_str(&content).map_err(|e| HistoryError::Parse {
                path: self.path.clone(),
                reason: e.to_string(),
            })?;

        match value {
            serde_json::Value::Object(map) => Ok(map),
            _ => Err(HistoryError::NotAnObject {
                path: self.path.clone(),
            }),
        }
    }

    /// The record stored under exactly `patient_id`, if any.
    pub async fn lookup(
        &self,
        patient_id: &str,
    ) -> Result<Option<serde_json::Value>, HistoryError> {
        let mut records = self.load().await?;
        debug!(patient_id, found = records.contains_key(patient_id), "Patient archive lookup");
        Ok(records.remove(patient_id))
    }

    /// Number of records in the archive.
    pub async fn count(&self) -> Result<usize, HistoryError> {
        Ok(self.load().await?.len())
    }

    /// Pretty-printed record, or the not-found message the model sees.
    pub async fn history_text(&self, patient_id: &str) -> Result<HistoryLookup, HistoryError> {
        Ok(match self.lookup(patient_id).await? {
            Some(record) => HistoryLookup::Found(
                serde_json::to_string_pretty(&record).unwrap_or_else(|_| record.to_string()),
            ),
            None => HistoryLookup::NotFound(format!("Error: Patient ID '{patient_id}' not found.")),
        })
    }
}

/// Outcome of a history lookup, already rendered as text.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum HistoryLookup {
    Found(String),
    NotFound(String),
}

impl HistoryLookup {
    pub fn text(&self) -> &str {
        match self {
            Self::Found(t) | Self::NotFound(t) => t,
        }
    }
}

/// Returns demographics and past medical history for a patient id.
pub struct GetPatientHistoryTool {
    archive: Arc<PatientArchive>,
}

impl GetPatientHistoryTool {
    pub fn new(archive: Arc<PatientArchive>) -> Self {
        Self { archive }
    }
}

#[async_trait]
impl Tool for GetPatientHistoryTool {
    fn name(&self) -> &str {
        GET_PATIENT_HISTORY
    }

    fn description(&self) -> &str {
        "Retrieve the full medical history (demographics, allergies, medications, past \
         conditions) for a Patient ID such as 'PT-1004'."
    }

    fn parameters_schema(&self) -> serde_json::Value {
        serde_json::json!({
            "type": "object",
            "properties": {
                "patient_id": {
                    "type": "string",
                    "description": "The ID of the patient (e.g., 'PT-1004')"
                }
            },
            "required": ["patient_id"]
        })
    }

    async fn execute(&self, arguments: serde_json::Value) -> Result<ToolResult, ToolError> {
        let patient_id = arguments["patient_id"]
            .as_str()
            .ok_or_else(|| ToolError::InvalidArguments("Missing 'patient_id' argument".into()))?;

        match self.archive.history_text(patient_id).await {
            Ok(HistoryLookup::Found(text)) => Ok(ToolResult::ok(text)),
            // The model still reads the message; the failed flag keeps the
            // controller from treating the id as verified.
            Ok(HistoryLookup::NotFound(text)) => Ok(ToolResult::failed(text)),
            Err(e) => Ok(ToolResult::failed(e.to_string())),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn write_archive(dir: &tempfile::TempDir, content: &str) -> Arc<PatientArchive> {
        let path = dir.path().join("patients.json");
        std::fs::write(&path, content).unwrap();
        Arc::new(PatientArchive::new(path))
    }

    const ARCHIVE: &str = r#"{
        "PT-1004": {"name": "Jane Doe", "age": 34, "allergies": ["Penicillin"]}
    }"#;

    #[tokio::test]
    async fn found_record_is_pretty_json() {
        let dir = tempfile::tempdir().unwrap();
        let tool = GetPatientHistoryTool::new(write_archive(&dir, ARCHIVE));
        let result = tool
            .execute(serde_json::json!({"patient_id": "PT-1004"}))
            .await
            .unwrap();
        assert!(result.success);
        assert!(result.output.contains("\"name\": \"Jane Doe\""));
        assert!(result.output.contains('\n'));
    }

    #[tokio::test]
    async fn unknown_id_reports_not_found() {
        let dir = tempfile::tempdir().unwrap();
        let tool = GetPatientHistoryTool::new(write_archive(&dir, ARCHIVE));
        let result = tool
            .execute(serde_json::json!({"patient_id": "PT-9999"}))
            .await
            .unwrap();
        assert!(!result.success);
        assert_eq!(result.output, "Error: Patient ID 'PT-9999' not found.");
    }

    #[tokio::test]
    async fn lookup_is_exact_match() {
        let dir = tempfile::tempdir().unwrap();
        let archive = write_archive(&dir, ARCHIVE);
        assert!(archive.lookup("pt-1004").await.unwrap().is_none());
        assert!(archive.lookup("PT-1004").await.unwrap().is_some());
    }

    #[tokio::test]
    async fn missing_argument_is_invalid() {
        let dir = tempfile::tempdir().unwrap();
        let tool = GetPatientHistoryTool::new(write_archive(&dir, ARCHIVE));
        let err = tool.execute(serde_json::json!({})).await.unwrap_err();
        assert!(matches!(err, ToolError::InvalidArguments(_)));
    }

    #[tokio::test]
    async fn unreadable_archive_fails_the_call() {
        let dir = tempfile::tempdir().unwrap();
        let archive = Arc::new(PatientArchive::new(dir.path().join("missing.json")));
        let tool = GetPatientHistoryTool::new(archive);
        let result = tool
            .execute(serde_json::json!({"patient_id": "PT-1004"}))
            .await
            .unwrap();
        assert!(!result.success);
        assert!(result.output.contains("Failed to read patient archive"));
    }

    #[tokio::test]
    async fn non_object_archive_is_rejected() {
        let dir = tempfile::tempdir().unwrap();
        let archive = write_archive(&dir, "[1, 2, 3]");
        assert!(matches!(
            archive.count().await,
            Err(HistoryError::NotAnObject { .. })
        ));
    }

    #[tokio::test]
    async fn edits_are_picked_up_between_lookups() {
        let dir = tempfile::tempdir().unwrap();
        let archive = write_archive(&dir, ARCHIVE);
        assert!(archive.lookup("PT-2001").await.unwrap().is_none());

        std::fs::write(archive.path(), r#"{"PT-2001": {"name": "Sam Lee"}}"#).unwrap();
        assert!(archive.lookup("PT-2001").await.unwrap().is_some());
    }
}
