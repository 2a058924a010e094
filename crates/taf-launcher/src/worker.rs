//! Worker role: foreground launch of the opaque bot entry point.
//!
//! Everything the bot does (forwarding, sessions, persistence) lives
//! behind this hand-off. This module only launches and waits.

use std::process::Command;

use taf_core::Settings;
use tracing::info;

/// Launch the bot worker directly and adopt its exit code.
pub fn run(settings: &Settings) -> anyhow::Result<i32> {
    spawn(settings, &[])
}

/// Spawn `<interpreter> <entry_file>` in the foreground with extra
/// environment, wait for it, and return its exit code. A child killed by
/// a signal maps to exit code 1.
pub fn spawn(settings: &Settings, extra_env: &[(&str, &str)]) -> anyhow::Result<i32> {
    info!(
        "launching worker: {} {}",
        settings.interpreter, settings.entry_file
    );
    let status = Command::new(&settings.interpreter)
        .arg(&settings.entry_file)
        .envs(extra_env.iter().copied())
        .status()
        .map_err(|e| anyhow::anyhow!("failed to launch {}: {}", settings.interpreter, e))?;
    Ok(status.code().unwrap_or(1))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_spawn_propagates_child_exit_code() {
        // use the shell as a stand-in interpreter so the test needs no python
        let dir = tempfile::tempdir().unwrap();
        let entry = dir.path().join("main.py");
        std::fs::write(&entry, "exit 7\n").unwrap();

        let settings = Settings {
            interpreter: "sh".to_string(),
            entry_file: entry.to_str().unwrap().to_string(),
            ..Settings::default()
        };
        assert_eq!(spawn(&settings, &[]).unwrap(), 7);
    }

    #[test]
    fn test_spawn_reports_missing_interpreter() {
        let settings = Settings {
            interpreter: "definitely-not-an-interpreter".to_string(),
            ..Settings::default()
        };
        assert!(spawn(&settings, &[]).is_err());
    }
}
