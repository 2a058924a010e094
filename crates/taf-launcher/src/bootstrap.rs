//! Startup guard
//!
//! The local/alternative entry path: prints the status banner, verifies
//! the bot entry file exists, then hands off to the worker in the
//! foreground. A missing entry file is fatal before anything launches;
//! there is no retry and no partial-startup state to unwind.

use std::path::Path;

use chrono::{DateTime, Utc};
use taf_core::Settings;

use crate::worker;

/// Environment forced on the launched bot process: unbuffered output, no
/// bytecode cache writes, UTF-8 stream encoding.
const WORKER_ENV: [(&str, &str); 3] = [
    ("PYTHONUNBUFFERED", "1"),
    ("PYTHONDONTWRITEBYTECODE", "1"),
    ("PYTHONIOENCODING", "utf-8"),
];

/// Exit code when the entry file is missing.
const EXIT_MISSING_ENTRY: i32 = 1;

/// Run the guard and, if it passes, the bot. Returns the process exit
/// code: 1 when the entry file is missing, the child's own code otherwise.
pub fn run(settings: &Settings) -> anyhow::Result<i32> {
    guard(settings, Utc::now(), |settings| {
        worker::spawn(settings, &WORKER_ENV)
    })
}

/// The guard sequence with an injectable hand-off: banner, entry-file
/// existence check, at most one launch.
fn guard<F>(settings: &Settings, now: DateTime<Utc>, runner: F) -> anyhow::Result<i32>
where
    F: FnOnce(&Settings) -> anyhow::Result<i32>,
{
    for line in banner_lines(settings, now) {
        println!("{line}");
    }

    if !Path::new(&settings.entry_file).exists() {
        println!("❌ Error: {} not found!", settings.entry_file);
        return Ok(EXIT_MISSING_ENTRY);
    }

    println!("✅ {} found, launching bot...", settings.entry_file);
    runner(settings)
}

/// The four status lines printed before the entry-file check.
fn banner_lines(settings: &Settings, now: DateTime<Utc>) -> [String; 4] {
    [
        "🚀 Starting Telegram Auto-Forwarder...".to_string(),
        format!("📅 Started at: {}", now.format("%Y-%m-%dT%H:%M:%SZ")),
        format!("🌍 Environment: {}", settings.environment),
        format!("📦 Entry point: {}", settings.entry_file),
    ]
}
