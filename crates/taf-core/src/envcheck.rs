//! Release-role environment check
//!
//! Reports whether the bot's required configuration keys are present,
//! never their values. Run by the platform before new code goes live.

use crate::config::REQUIRED_VARS;

/// Presence of one required configuration key.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Presence {
    pub name: &'static str,
    pub set: bool,
}

/// Check the process environment for the required keys.
pub fn check() -> Vec<Presence> {
    check_with(|key| std::env::var(key).ok())
}

/// Check an arbitrary variable lookup for the required keys.
pub fn check_with<F>(lookup: F) -> Vec<Presence>
where
    F: Fn(&str) -> Option<String>,
{
    REQUIRED_VARS
        .into_iter()
        .map(|name| Presence {
            name,
            set: lookup(name).is_some(),
        })
        .collect()
}

/// Render the report: a header line, then one `NAME set: <bool>` line per
/// required key.
pub fn report_lines(presences: &[Presence]) -> Vec<String> {
    let mut lines = Vec::with_capacity(presences.len() + 1);
    lines.push("Environment check:".to_string());
    for presence in presences {
        lines.push(format!("{} set: {}", presence.name, presence.set));
    }
    lines
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_check_reports_both_keys() {
        let presences = check_with(|_| None);
        assert_eq!(presences.len(), 2);
        assert_eq!(presences[0].name, "API_ID");
        assert_eq!(presences[1].name, "API_HASH");
        assert!(presences.iter().all(|p| !p.set));
    }

    #[test]
    fn test_check_detects_set_keys() {
        let presences = check_with(|key| match key {
            "API_ID" => Some("12345".to_string()),
            _ => None,
        });
        assert!(presences[0].set);
        assert!(!presences[1].set);
    }

    #[test]
    fn test_report_has_header_and_exactly_two_presence_lines() {
        let lines = report_lines(&check_with(|_| None));
        assert_eq!(lines.len(), 3);
        assert_eq!(lines[0], "Environment check:");
        assert_eq!(lines[1], "API_ID set: false");
        assert_eq!(lines[2], "API_HASH set: false");
    }

    #[test]
    fn test_report_never_includes_values() {
        let lines = report_lines(&check_with(|_| Some("secret-value".to_string())));
        assert_eq!(lines.len(), 3);
        assert!(lines.iter().all(|l| !l.contains("secret-value")));
        assert_eq!(lines[1], "API_ID set: true");
        assert_eq!(lines[2], "API_HASH set: true");
    }
}
