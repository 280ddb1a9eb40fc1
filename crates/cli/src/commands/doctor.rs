//! `mediscreen doctor`: check configuration, provider and data paths.

use mediscreen_config::{AppConfig, SessionConfig};
use mediscreen_core::error::SessionError;
use mediscreen_tools::PatientArchive;
use std::path::Path;

use super::run::needs_api_key;

/// Open the configured session store and name it.
async fn session_store_check(config: &SessionConfig) -> Result<String, SessionError> {
    let store = mediscreen_storage::open_session_store(config).await?;
    Ok(store.name().to_owned())
}

pub async fn run(config_path: Option<&Path>) -> Result<(), Box<dyn std::error::Error>> {
    println!("🩺 MediScreen Doctor — System Diagnostics");
    println!("=========================================\n");

    let mut issues = 0;

    let config = match crate::load_config(config_path) {
        Ok(config) => {
            println!("  ✅ Config valid");
            config
        }
        Err(e) => {
            println!("  ❌ Config invalid: {e}");
            println!("\n  ⚠️  Fix the config before running other checks.");
            return Ok(());
        }
    };

    println!("  ℹ️  Provider: {} / {}", config.default_provider, config.default_model);
    if needs_api_key(&config) {
        println!(
            "  ⚠️  No API key configured — set GEMINI_API_KEY or add api_key to config.toml"
        );
        issues += 1;
    } else {
        println!("  ✅ API key configured");
        match mediscreen_providers::build_from_config(&config).default() {
            Some(provider) => match provider.health_check().await {
                Ok(true) => println!("  ✅ Provider '{}' reachable", provider.name()),
                Ok(false) => {
                    println!(
                        "  ⚠️  Provider '{}' answered but reports unhealthy",
                        provider.name()
                    );
                    issues += 1;
                }
                Err(e) => {
                    println!("  ❌ Provider '{}' unreachable: {e}", provider.name());
                    issues += 1;
                }
            },
            None => {
                println!(
                    "  ❌ Provider '{}' has no known endpoint; set api_url",
                    config.default_provider
                );
                issues += 1;
            }
        }
    }

    let archive = PatientArchive::new(&config.paths.patient_data);
    match archive.count().await {
        Ok(count) => println!(
            "  ✅ Patient archive: {count} record(s) in {}",
            archive.path().display()
        ),
        Err(e) => {
            println!("  ❌ Patient archive unusable: {e}");
            issues += 1;
        }
    }

    let logs_dir = &config.paths.logs_dir;
    match std::fs::create_dir_all(logs_dir) {
        Ok(()) => println!("  ✅ Logs directory: {}", logs_dir.display()),
        Err(e) => {
            println!("  ❌ Logs directory {} not writable: {e}", logs_dir.display());
            issues += 1;
        }
    }

    match session_store_check(&config.session).await {
        Ok(name) => println!("  ✅ Session store: {name}"),
        Err(e) => {
            println!("  ❌ Session store unusable: {e}");
            issues += 1;
        }
    }

    println!();
    if issues == 0 {
        println!("  🎉 All checks passed!");
    } else {
        println!("  ⚠️  {issues} issue(s) found. See above for details.");
    }

    Ok(())
}
