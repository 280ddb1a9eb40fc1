//! `mediscreen lookup`: Query the patient archive without a model.

use mediscreen_config::AppConfig;
use mediscreen_tools::{HistoryError, PatientArchive};

/// The text `get_patient_history` would hand the model for `patient_id`.
async fn lookup_text(config: &AppConfig, patient_id: &str) -> Result<String, HistoryError> {
    let archive = PatientArchive::new(&config.paths.patient_data);
    let lookup = archive.history_text(patient_id).await?;
    Ok(lookup.text().to_owned())
}

pub async fn run(config: &AppConfig, patient_id: &str) -> Result<(), Box<dyn std::error::Error>> {
    println!("{}", lookup_text(config, patient_id).await?);
    Ok(())
}
