//! Echo: human-readable summaries of the merge steps.
//!
//! Echo output never affects the merge outcome. Three waves control the
//! detail level: `summary` (which resources fed which key), `track` (every
//! property insert/replace), `content` (the final tree per key). The report
//! is buffered per key and emitted through `tracing` in one piece.

use config::Value;
use tracing::info;

use crate::tree::ConfigTree;

const WAVE_SUMMARY: &str = "summary";
const WAVE_TRACK: &str = "track";
const WAVE_CONTENT: &str = "content";

/// Echo wave flags.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Echo {
    summary: bool,
    track: bool,
    content: bool,
}

impl Echo {
    /// No echo output at all.
    pub fn none() -> Self {
        Echo::default()
    }

    /// Parse a comma-separated wave list such as `"summary,track"`.
    /// Unknown sections are ignored.
    pub fn parse(waves: &str) -> Self {
        let mut echo = Echo::default();
        for section in waves.split(',') {
            match section.trim().to_ascii_lowercase().as_str() {
                WAVE_SUMMARY => echo.summary = true,
                WAVE_TRACK => echo.track = true,
                WAVE_CONTENT => echo.content = true,
                _ => {}
            }
        }
        echo
    }

    pub fn echo_enabled(&self) -> bool {
        self.summary || self.track || self.content
    }

    /// Track detail implies the summary skeleton around it.
    pub fn summary_enabled(&self) -> bool {
        self.summary || self.track
    }

    pub fn track_enabled(&self) -> bool {
        self.track
    }

    pub fn content_enabled(&self) -> bool {
        self.content
    }
}

/// Per-key echo report, built while a key merges.
pub struct EchoReport {
    echo: Echo,
    buffer: String,
}

impl EchoReport {
    pub fn new(echo: Echo, key: &str) -> Self {
        let mut buffer = String::new();
        if echo.echo_enabled() {
            buffer.push_str(&format!(
                "Echo config resource loading process for key '{}'...\n",
                key
            ));
        }
        EchoReport { echo, buffer }
    }

    pub fn summary_load(&mut self, key: &str) {
        if self.echo.summary_enabled() {
            self.buffer
                .push_str(&format!("\tLoad Config({}) from resources...\n", key));
        }
    }

    pub fn summary_resource(&mut self, key: &str, description: &str) {
        if self.echo.summary_enabled() {
            self.buffer
                .push_str(&format!("\t\tConfig({}) << {}\n", key, description));
        }
    }

    pub fn track_new(&mut self, key: &str, name: &str, value: &Value) {
        if self.echo.track_enabled() {
            self.buffer.push_str(&format!(
                "\t\t\tNew property into Config({}) << {}={}\n",
                key, name, value
            ));
        }
    }

    pub fn track_renew(
        &mut self,
        key: &str,
        name: &str,
        value: &Value,
        old_name: &str,
        old_value: &Value,
    ) {
        if self.echo.track_enabled() {
            self.buffer.push_str(&format!(
                "\t\t\tRenew property into Config({}) << {}={} (Overwritten: {}={})\n",
                key, name, value, old_name, old_value
            ));
        }
    }

    pub fn content(&mut self, key: &str, tree: &ConfigTree) {
        if self.echo.content_enabled() {
            self.buffer
                .push_str(&format!("\tContent of Config({}):\n", key));
            let mut lines: Vec<String> = tree
                .entries()
                .iter()
                .map(|(name, value)| format!("\t\t{}={}\n", name, value))
                .collect();
            lines.sort();
            for line in lines {
                self.buffer.push_str(&line);
            }
        }
    }

    /// Emit the buffered report, if any wave is enabled.
    pub fn emit(self) {
        if self.echo.echo_enabled() {
            info!("{}", self.buffer);
        }
    }

    #[cfg(test)]
    fn buffer(&self) -> &str {
        &self.buffer
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use config::ValueKind;

    #[test]
    fn test_parse_waves() {
        let echo = Echo::parse("summary, CONTENT");
        assert!(echo.summary_enabled());
        assert!(echo.content_enabled());
        assert!(!echo.track_enabled());
        assert!(echo.echo_enabled());
    }

    #[test]
    fn test_track_implies_summary() {
        let echo = Echo::parse("track");
        assert!(echo.summary_enabled());
        assert!(echo.track_enabled());
    }

    #[test]
    fn test_none_disables_everything() {
        let echo = Echo::none();
        assert!(!echo.echo_enabled());
        assert_eq!(Echo::parse("bogus"), Echo::none());
    }

    #[test]
    fn test_report_collects_track_lines() {
        let mut report = EchoReport::new(Echo::parse("track"), "redis");
        report.summary_resource("redis", "file [redis.conf]");
        report.track_new("redis", "port", &Value::new(None, ValueKind::I64(6379)));
        assert!(report.buffer().contains("file [redis.conf]"));
        assert!(report.buffer().contains("port=6379"));
    }

    #[test]
    fn test_report_stays_empty_when_disabled() {
        let mut report = EchoReport::new(Echo::none(), "redis");
        report.summary_load("redis");
        report.track_new("redis", "port", &Value::new(None, ValueKind::I64(1)));
        assert!(report.buffer().is_empty());
    }
}
