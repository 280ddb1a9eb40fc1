//! `mediscreen onboard`: First-time setup.

use mediscreen_config::AppConfig;
use std::path::{Path, PathBuf};

/// Write the default config to `path` unless a file is already there.
/// Returns whether a file was written.
pub(crate) fn write_default_config(path: &Path) -> std::io::Result<bool> {
    if path.exists() {
        return Ok(false);
    }
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent)?;
    }
    std::fs::write(path, AppConfig::default_toml())?;
    Ok(true)
}

pub async fn run(config_path: Option<&Path>) -> Result<(), Box<dyn std::error::Error>> {
    let config_path: PathBuf = config_path
        .map(Path::to_path_buf)
        .unwrap_or_else(|| AppConfig::config_dir().join("config.toml"));

    println!("🏥 MediScreen — First-Time Setup");
    println!("================================\n");

    if write_default_config(&config_path)? {
        println!("✅ Created config.toml at: {}", config_path.display());
        println!("\n📝 Next steps:");
        println!("   1. Add your API key to {} or set GEMINI_API_KEY", config_path.display());
        println!("   2. Check the patient archive path under [paths]");
        println!("   3. Run: mediscreen doctor");
        println!("   4. Run: mediscreen\n");
    } else {
        println!("⚠️  Config already exists at: {}", config_path.display());
        println!("   Edit it manually or delete and re-run onboard.\n");
    }

    Ok(())
}
