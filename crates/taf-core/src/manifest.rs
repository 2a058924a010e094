//! Process manifest model
//!
//! Declares the deployment's named process types and their launch
//! commands, plus the web role's full prefork tuning parameter set.
//! Role lifecycle (start/stop/restart) belongs to the platform's process
//! manager; the manifest carries no retry or recovery logic of its own.

use std::fmt;

use rand::Rng;
use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};

/// Process types declared by the default deployment.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ProcessRole {
    /// Keep-alive HTTP responder.
    Web,
    /// Long-running bot process, opaque to this crate.
    Worker,
    /// One-shot pre-deploy environment check.
    Release,
}

impl ProcessRole {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Web => "web",
            Self::Worker => "worker",
            Self::Release => "release",
        }
    }
}

impl fmt::Display for ProcessRole {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Request-handling model of the web role's workers.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum WorkerClass {
    /// Blocking request handling; concurrency comes from threads per worker.
    #[default]
    Sync,
}

impl WorkerClass {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Sync => "sync",
        }
    }
}

impl fmt::Display for WorkerClass {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Launch parameters of the keep-alive HTTP role.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct WebTuning {
    /// Worker processes. The platform scales by relaunching, not forking more.
    #[serde(default = "default_workers")]
    pub workers: u32,

    /// Request-handling threads per worker.
    #[serde(default = "default_threads")]
    pub threads: usize,

    /// Per-request timeout in seconds.
    #[serde(default = "default_timeout")]
    pub timeout_secs: u64,

    /// Idle keep-alive window in seconds.
    #[serde(default = "default_keep_alive")]
    pub keep_alive_secs: u64,

    /// Requests served before a worker is recycled.
    #[serde(default = "default_max_requests")]
    pub max_requests: u32,

    /// Recycle threshold jitter, spread over ± this many requests.
    #[serde(default = "default_max_requests_jitter")]
    pub max_requests_jitter: u32,

    #[serde(default)]
    pub worker_class: WorkerClass,

    /// Pending-connection backlog for the listening socket.
    #[serde(default = "default_backlog")]
    pub backlog: u32,

    /// Build the application fully before the first accept.
    #[serde(default = "default_preload")]
    pub preload: bool,
}

impl Default for WebTuning {
    fn default() -> Self {
        Self {
            workers: default_workers(),
            threads: default_threads(),
            timeout_secs: default_timeout(),
            keep_alive_secs: default_keep_alive(),
            max_requests: default_max_requests(),
            max_requests_jitter: default_max_requests_jitter(),
            worker_class: WorkerClass::Sync,
            backlog: default_backlog(),
            preload: default_preload(),
        }
    }
}

fn default_workers() -> u32 {
    1
}

fn default_threads() -> usize {
    4
}

fn default_timeout() -> u64 {
    120
}

fn default_keep_alive() -> u64 {
    5
}

fn default_max_requests() -> u32 {
    1000
}

fn default_max_requests_jitter() -> u32 {
    100
}

fn default_backlog() -> u32 {
    1000
}

fn default_preload() -> bool {
    true
}

impl WebTuning {
    /// Recycle threshold for one worker launch: the base count with up to
    /// `max_requests_jitter` of symmetric jitter, so a fleet of workers
    /// does not recycle in lockstep. Never less than 1.
    pub fn effective_max_requests<R: Rng>(&self, rng: &mut R) -> u32 {
        let base = i64::from(self.max_requests);
        let jitter = i64::from(self.max_requests_jitter);
        let drawn = if jitter == 0 {
            base
        } else {
            base + rng.gen_range(-jitter..=jitter)
        };
        drawn.max(1) as u32
    }

    /// Same draw, using the thread-local RNG.
    pub fn drawn_max_requests(&self) -> u32 {
        self.effective_max_requests(&mut rand::thread_rng())
    }

    /// Render the parameters as the CLI flags accepted by the web role.
    pub fn to_args(&self) -> Vec<String> {
        let mut args = vec![
            "--workers".to_string(),
            self.workers.to_string(),
            "--threads".to_string(),
            self.threads.to_string(),
            "--timeout".to_string(),
            self.timeout_secs.to_string(),
            "--keep-alive".to_string(),
            self.keep_alive_secs.to_string(),
            "--max-requests".to_string(),
            self.max_requests.to_string(),
            "--max-requests-jitter".to_string(),
            self.max_requests_jitter.to_string(),
            "--worker-class".to_string(),
            self.worker_class.as_str().to_string(),
            "--backlog".to_string(),
            self.backlog.to_string(),
        ];
        if self.preload {
            args.push("--preload".to_string());
        }
        args
    }
}

/// One `role: command` declaration.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ManifestEntry {
    pub role: String,
    pub command: String,
}

/// Ordered set of process declarations in Procfile format.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ProcessManifest {
    entries: Vec<ManifestEntry>,
}

impl ProcessManifest {
    /// Parse Procfile text: one `role: command` per line, `#` comments and
    /// blank lines ignored, duplicate role names rejected.
    pub fn parse(text: &str) -> Result<Self> {
        let mut entries: Vec<ManifestEntry> = Vec::new();
        for (idx, raw) in text.lines().enumerate() {
            let line = raw.trim();
            if line.is_empty() || line.starts_with('#') {
                continue;
            }
            let Some((role, command)) = line.split_once(':') else {
                return Err(Error::Manifest(format!(
                    "line {}: expected `role: command`",
                    idx + 1
                )));
            };
            let role = role.trim();
            let command = command.trim();
            if role.is_empty()
                || !role
                    .chars()
                    .all(|c| c.is_ascii_alphanumeric() || c == '_' || c == '-')
            {
                return Err(Error::Manifest(format!(
                    "line {}: invalid role name `{}`",
                    idx + 1,
                    role
                )));
            }
            if command.is_empty() {
                return Err(Error::Manifest(format!(
                    "line {}: empty command for role `{}`",
                    idx + 1,
                    role
                )));
            }
            if entries.iter().any(|e| e.role == role) {
                return Err(Error::Manifest(format!(
                    "line {}: duplicate role `{}`",
                    idx + 1,
                    role
                )));
            }
            entries.push(ManifestEntry {
                role: role.to_string(),
                command: command.to_string(),
            });
        }
        Ok(Self { entries })
    }

    /// The deployment this repository ships: the keep-alive web role with
    /// its full tuning, the opaque bot worker, and the release check.
    pub fn default_deployment() -> Self {
        let tuning = WebTuning::default();
        Self {
            entries: vec![
                ManifestEntry {
                    role: ProcessRole::Web.as_str().to_string(),
                    command: format!("taf-launcher web {}", tuning.to_args().join(" ")),
                },
                ManifestEntry {
                    role: ProcessRole::Worker.as_str().to_string(),
                    command: "taf-launcher worker".to_string(),
                },
                ManifestEntry {
                    role: ProcessRole::Release.as_str().to_string(),
                    command: "taf-launcher release".to_string(),
                },
            ],
        }
    }

    /// Render back to Procfile text.
    pub fn render(&self) -> String {
        let mut out = String::new();
        for entry in &self.entries {
            out.push_str(&entry.role);
            out.push_str(": ");
            out.push_str(&entry.command);
            out.push('\n');
        }
        out
    }

    /// Launch command for a role, if declared.
    pub fn command(&self, role: &str) -> Option<&str> {
        self.entries
            .iter()
            .find(|e| e.role == role)
            .map(|e| e.command.as_str())
    }

    pub fn entries(&self) -> &[ManifestEntry] {
        &self.entries
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::SeedableRng;
    use rand::rngs::StdRng;

    #[test]
    fn test_web_tuning_defaults() {
        let tuning = WebTuning::default();
        assert_eq!(tuning.workers, 1);
        assert_eq!(tuning.threads, 4);
        assert_eq!(tuning.timeout_secs, 120);
        assert_eq!(tuning.keep_alive_secs, 5);
        assert_eq!(tuning.max_requests, 1000);
        assert_eq!(tuning.max_requests_jitter, 100);
        assert_eq!(tuning.worker_class, WorkerClass::Sync);
        assert_eq!(tuning.backlog, 1000);
        assert!(tuning.preload);
    }

    #[test]
    fn test_effective_max_requests_stays_in_jitter_band() {
        let tuning = WebTuning::default();
        let mut rng = rand::thread_rng();
        for _ in 0..500 {
            let effective = tuning.effective_max_requests(&mut rng);
            assert!((900..=1100).contains(&effective));
        }
    }

    #[test]
    fn test_effective_max_requests_without_jitter_is_exact() {
        let tuning = WebTuning {
            max_requests_jitter: 0,
            ..WebTuning::default()
        };
        let mut rng = StdRng::seed_from_u64(7);
        assert_eq!(tuning.effective_max_requests(&mut rng), 1000);
    }

    #[test]
    fn test_effective_max_requests_never_zero() {
        // jitter wider than the base must still yield a positive threshold
        let tuning = WebTuning {
            max_requests: 10,
            max_requests_jitter: 100,
            ..WebTuning::default()
        };
        let mut rng = StdRng::seed_from_u64(42);
        for _ in 0..500 {
            assert!(tuning.effective_max_requests(&mut rng) >= 1);
        }
    }

    #[test]
    fn test_to_args_renders_all_parameters() {
        let args = WebTuning::default().to_args();
        let rendered = args.join(" ");
        assert!(rendered.contains("--workers 1"));
        assert!(rendered.contains("--threads 4"));
        assert!(rendered.contains("--timeout 120"));
        assert!(rendered.contains("--keep-alive 5"));
        assert!(rendered.contains("--max-requests 1000"));
        assert!(rendered.contains("--max-requests-jitter 100"));
        assert!(rendered.contains("--worker-class sync"));
        assert!(rendered.contains("--backlog 1000"));
        assert!(rendered.ends_with("--preload"));
    }

    #[test]
    fn test_parse_basic_manifest() {
        let manifest = ProcessManifest::parse(
            "# roles\nweb: taf-launcher web\n\nworker: taf-launcher worker\n",
        )
        .unwrap();
        assert_eq!(manifest.entries().len(), 2);
        assert_eq!(manifest.command("web"), Some("taf-launcher web"));
        assert_eq!(manifest.command("release"), None);
    }

    #[test]
    fn test_parse_rejects_duplicate_role() {
        let err = ProcessManifest::parse("web: a\nweb: b\n").unwrap_err();
        assert!(err.to_string().contains("duplicate role"));
    }

    #[test]
    fn test_parse_rejects_missing_separator() {
        assert!(ProcessManifest::parse("just a line\n").is_err());
    }

    #[test]
    fn test_parse_rejects_empty_command() {
        assert!(ProcessManifest::parse("web:\n").is_err());
    }

    #[test]
    fn test_parse_rejects_invalid_role_name() {
        assert!(ProcessManifest::parse("we b: cmd\n").is_err());
    }

    #[test]
    fn test_default_deployment_round_trips() {
        let manifest = ProcessManifest::default_deployment();
        let parsed = ProcessManifest::parse(&manifest.render()).unwrap();
        assert_eq!(parsed, manifest);
        let web = manifest.command("web").unwrap();
        assert!(web.starts_with("taf-launcher web "));
        assert!(web.contains("--max-requests 1000"));
        assert!(manifest.command("worker").is_some());
        assert!(manifest.command("release").is_some());
    }
}
