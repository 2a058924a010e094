//! Release role: pre-deploy environment presence report.

use taf_core::envcheck;

/// Print the environment check to stdout. Always succeeds; the report
/// shows presence booleans, never values.
pub fn run() {
    for line in envcheck::report_lines(&envcheck::check()) {
        println!("{line}");
    }
}
