// System status display — store stats and the active moderation settings.

use std::path::Path;

use anyhow::Result;

use crate::chat::traits::MessageStore;
use crate::config::Config;

/// Display system status to the terminal.
pub async fn show(store: Option<&dyn MessageStore>, config: &Config) -> Result<()> {
    match store {
        Some(store) => {
            let file_size = std::fs::metadata(&config.db_path)
                .map(|m| format_bytes(m.len()))
                .unwrap_or_else(|_| "unknown".to_string());
            println!("Database: {} ({})", config.db_path, file_size);

            let total = store.message_count().await?;
            let toxic = store.toxic_count().await?;
            println!("Messages: {} total, {} flagged toxic", total, toxic);
        }
        None => {
            println!("Database: not initialized");
            println!("\nRun `gigglechat init` to set up the database.");
        }
    }

    let t = &config.thresholds;
    println!(
        "Thresholds: low >= {}, toxic >= {}, highly toxic >= {}",
        t.low(),
        t.toxic(),
        t.high()
    );
    println!(
        "Remote scan: {} ({} ms timeout, fails open)",
        config.analyzer_model,
        config.scan_timeout.as_millis()
    );
    println!(
        "Remote HIGHLY_TOXIC: {} (local filter matches always block)",
        config.admission.remote_severe.as_str()
    );
    match config.require_scorer() {
        Ok(()) => println!("Scorer key: configured"),
        Err(_) => println!("Scorer key: missing (every scan will fail open)"),
    }

    Ok(())
}

/// Whether the configured database file exists yet.
pub fn database_exists(config: &Config) -> bool {
    Path::new(&config.db_path).exists()
}

fn format_bytes(bytes: u64) -> String {
    if bytes < 1024 {
        format!("{} B", bytes)
    } else if bytes < 1024 * 1024 {
        format!("{:.1} KB", bytes as f64 / 1024.0)
    } else {
        format!("{:.1} MB", bytes as f64 / (1024.0 * 1024.0))
    }
}
