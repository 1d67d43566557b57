//! Clean command implementation

use anyhow::Result;

use crate::config::AppConfig;
use crate::services::ArtifactStore;

pub async fn execute_clean_command(config: &AppConfig, file: Option<&str>) -> Result<()> {
    let store = ArtifactStore::new(&config.static_dir);

    match file {
        Some(filename) => {
            if store.remove(filename)? {
                println!("🗑️  Removed {}", filename);
            } else {
                println!("📋 {} not found in {}", filename, store.dir().display());
            }
        }
        None => {
            let removed = store.purge()?;
            println!(
                "🗑️  Removed {} artifact(s) from {}",
                removed,
                store.dir().display()
            );
        }
    }
    Ok(())
}
