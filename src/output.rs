//! Rendering of check outcomes as text lines, JSON or a summary table.

use std::fmt::Write as _;

use clap::ValueEnum;
use comfy_table::presets::UTF8_FULL;
use comfy_table::{Cell, Color, ContentArrangement, Table};
use serde::{Deserialize, Serialize};
use strum_macros::{Display, EnumString};

use crate::{ExpiryError, ExpiryReport, Target};

/// Certificates with fewer days left than this are highlighted in the summary.
const WARN_DAYS: i64 = 30;

#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, ValueEnum, Display, EnumString,
)]
#[serde(rename_all = "lowercase")]
#[strum(serialize_all = "lowercase")]
pub enum OutputFormat {
    /// One line per target
    Text,
    /// Pretty-printed JSON array
    Json,
    /// Table with one row per target
    Summary,
}

/// Result of checking one target.
#[derive(Debug)]
pub struct CheckOutcome {
    pub target: Target,
    pub result: Result<ExpiryReport, ExpiryError>,
}

impl CheckOutcome {
    /// True when the check failed or the certificate has expired.
    pub fn is_failure(&self) -> bool {
        match &self.result {
            Ok(report) => report.is_expired,
            Err(_) => true,
        }
    }
}

#[derive(Serialize)]
struct JsonError {
    kind: String,
    message: String,
}

#[derive(Serialize)]
struct JsonOutcome<'a> {
    target: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    report: Option<&'a ExpiryReport>,
    #[serde(skip_serializing_if = "Option::is_none")]
    error: Option<JsonError>,
}

pub fn render(format: OutputFormat, outcomes: &[CheckOutcome]) -> String {
    match format {
        OutputFormat::Text => render_text(outcomes),
        OutputFormat::Json => render_json(outcomes),
        OutputFormat::Summary => render_summary(outcomes),
    }
}

pub fn render_text(outcomes: &[CheckOutcome]) -> String {
    let mut out = String::new();
    for outcome in outcomes {
        let _ = writeln!(out, "{}", text_line(outcome));
    }
    out
}

fn text_line(outcome: &CheckOutcome) -> String {
    match &outcome.result {
        Ok(report) if report.is_expired => format!(
            "{}: certificate {} (notAfter {})",
            outcome.target, report.remaining, report.not_after
        ),
        Ok(report) => format!(
            "{}: certificate expires in {} (notAfter {})",
            outcome.target, report.remaining, report.not_after
        ),
        Err(e) => format!("{}: {}: {}", outcome.target, e.kind(), e),
    }
}

pub fn render_json(outcomes: &[CheckOutcome]) -> String {
    let entries: Vec<JsonOutcome<'_>> = outcomes
        .iter()
        .map(|outcome| match &outcome.result {
            Ok(report) => JsonOutcome {
                target: outcome.target.address(),
                report: Some(report),
                error: None,
            },
            Err(e) => JsonOutcome {
                target: outcome.target.address(),
                report: None,
                error: Some(JsonError {
                    kind: e.kind().to_string(),
                    message: e.to_string(),
                }),
            },
        })
        .collect();

    match serde_json::to_string_pretty(&entries) {
        Ok(json) => format!("{}\n", json),
        Err(e) => format!("{{\"error\": \"failed to serialize results: {}\"}}\n", e),
    }
}

pub fn render_summary(outcomes: &[CheckOutcome]) -> String {
    let mut table = Table::new();
    table
        .load_preset(UTF8_FULL)
        .set_content_arrangement(ContentArrangement::Dynamic)
        .set_header(vec!["Host", "Port", "Expires (UTC)", "Days left", "Status"]);

    for outcome in outcomes {
        let host = Cell::new(&outcome.target.hostname);
        let port = Cell::new(outcome.target.port);
        match &outcome.result {
            Ok(report) => {
                let (status, color) = if report.is_expired {
                    ("Expired", Color::Red)
                } else if report.days_left < WARN_DAYS {
                    ("Expiring", Color::Yellow)
                } else {
                    ("Valid", Color::Green)
                };
                table.add_row(vec![
                    host,
                    port,
                    Cell::new(&report.expires_at),
                    Cell::new(report.days_left),
                    Cell::new(status).fg(color),
                ]);
            }
            Err(e) => {
                table.add_row(vec![
                    host,
                    port,
                    Cell::new("-"),
                    Cell::new("-"),
                    Cell::new(e.kind()).fg(Color::Red),
                ]);
            }
        }
    }

    format!("{}\n", table)
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{TimeZone, Utc};

    fn outcomes() -> Vec<CheckOutcome> {
        let now = Utc.with_ymd_and_hms(2025, 1, 1, 0, 0, 0).unwrap();
        let ok = Target::new("example.com", 443).unwrap();
        let expired = Target::new("expired.example", 443).unwrap();
        let failed = Target::new("nowhere.invalid", 8443).unwrap();
        vec![
            CheckOutcome {
                result: ExpiryReport::new(&ok, "Jan  1 00:00:00 2030 GMT", now),
                target: ok,
            },
            CheckOutcome {
                result: ExpiryReport::new(&expired, "Dec 31 00:00:00 2024 GMT", now),
                target: expired,
            },
            CheckOutcome {
                result: Err(ExpiryError::ConnectionRefused {
                    address: failed.address(),
                }),
                target: failed,
            },
        ]
    }

    #[test]
    fn test_output_format_names() {
        assert_eq!(OutputFormat::Summary.to_string(), "summary");
        assert_eq!("json".parse::<OutputFormat>().unwrap(), OutputFormat::Json);
        assert!("xml".parse::<OutputFormat>().is_err());
    }

    #[test]
    fn test_is_failure() {
        let outcomes = outcomes();
        assert!(!outcomes[0].is_failure());
        assert!(outcomes[1].is_failure());
        assert!(outcomes[2].is_failure());
    }

    #[test]
    fn test_render_text() {
        let text = render_text(&outcomes());
        let lines: Vec<&str> = text.lines().collect();
        assert_eq!(lines.len(), 3);
        assert_eq!(
            lines[0],
            "example.com:443: certificate expires in 1826 days, 00:00:00 (notAfter Jan  1 00:00:00 2030 GMT)"
        );
        assert!(lines[1].contains("expired 1 day, 00:00:00 ago"));
        assert_eq!(
            lines[2],
            "nowhere.invalid:8443: ConnectionRefused: Connection refused by nowhere.invalid:8443"
        );
    }

    #[test]
    fn test_render_json() {
        let json = render_json(&outcomes());
        let value: serde_json::Value = serde_json::from_str(&json).unwrap();
        let entries = value.as_array().unwrap();
        assert_eq!(entries.len(), 3);
        assert_eq!(entries[0]["report"]["days_left"], 1826);
        assert!(entries[0].get("error").is_none());
        assert_eq!(entries[1]["report"]["is_expired"], true);
        assert_eq!(entries[2]["error"]["kind"], "ConnectionRefused");
        assert!(entries[2].get("report").is_none());
    }

    #[test]
    fn test_render_summary() {
        let table = render_summary(&outcomes());
        assert!(table.contains("example.com"));
        assert!(table.contains("Valid"));
        assert!(table.contains("Expired"));
        assert!(table.contains("ConnectionRefused"));
    }
}
