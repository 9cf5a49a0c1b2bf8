//! The custom report written when the load test ends.
//!
//! The [`Report`] is always written as pretty-printed JSON to `REPORT_PATH`. A short
//! Markdown summary of the same numbers is printed when the load test finishes, and
//! optionally written to `REPORT_MD_PATH`.
//!
//! Failing to write either file is logged, but never fails the load test.

use log::{error, info, warn};
use num_format::{Locale, ToFormattedString};
use serde::{Deserialize, Serialize};
use std::io::Write;

use crate::config::Config;
use crate::SelectionsError;

/// Advisory note included in every report.
pub const REPORT_NOTE: &str = "Counters are aggregated in a single process. For distributed \
load tests, aggregate through a time-series backend (Prometheus/Influx) or a custom \
aggregation on the manager.";

/// Immutable snapshot of a finished load test, created by
/// [`RunAggregator::finalize_report`](crate::aggregator::RunAggregator::finalize_report).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Report {
    pub target_path: String,
    pub total_requests: u64,
    pub ok_with_selections: u64,
    /// Fraction of requests with selections, 0.0 to 1.0.
    pub selection_rate: f64,
    /// The same rate as a percentage, rounded to two decimal places.
    pub selection_rate_percent: f64,
    /// Mean response time, rounded to two decimal places.
    pub avg_response_time_ms: f64,
    pub json_parse_failures: u64,
    pub note: String,
    /// Only present when a minimum selection rate was configured.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub min_selection_rate: Option<f64>,
    /// Only present when a minimum selection rate was configured.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub thresholds_ok: Option<bool>,
}

impl Report {
    /// Pretty-printed JSON, indented with two spaces.
    pub fn to_json(&self) -> Result<String, SelectionsError> {
        Ok(serde_json::to_string_pretty(self)?)
    }

    /// Write the report as JSON, replacing `path` if it already exists.
    pub async fn write_json(&self, path: &str) -> Result<(), SelectionsError> {
        let json = self.to_json()?;
        tokio::fs::write(path, json).await?;
        Ok(())
    }

    /// Write the report as JSON, logging the outcome instead of returning an error.
    pub async fn save(&self, path: &str) {
        match self.write_json(path).await {
            Ok(()) => info!("Wrote custom report: {}", path),
            Err(e) => error!("Failed to write report to {}: {}", path, e),
        }
    }

    /// Write the Markdown summary, replacing `path` if it already exists.
    pub async fn write_markdown_file(&self, path: &str) -> Result<(), SelectionsError> {
        tokio::fs::write(path, self.to_markdown()?).await?;
        Ok(())
    }

    /// Write the Markdown summary, logging the outcome instead of returning an error.
    pub async fn save_markdown(&self, path: &str) {
        match self.write_markdown_file(path).await {
            Ok(()) => info!("Wrote markdown summary: {}", path),
            Err(e) => error!("Failed to write markdown summary to {}: {}", path, e),
        }
    }

    /// The Markdown summary as a string.
    pub fn to_markdown(&self) -> Result<String, SelectionsError> {
        let mut buffer = Vec::new();
        self.write_markdown(&mut buffer)?;
        Ok(String::from_utf8_lossy(&buffer).into_owned())
    }

    /// Write the Markdown summary to any writer, for example stdout.
    pub fn write_markdown<W: Write>(&self, w: &mut W) -> Result<(), SelectionsError> {
        Markdown { w, report: self }.write()
    }

    /// Everything done with the report once the load test ends: save the JSON report,
    /// print the Markdown summary to `out`, and save the Markdown summary if configured.
    /// None of these fail the load test.
    pub async fn publish<W: Write>(&self, config: &Config, out: &mut W) {
        self.save(&config.report_path).await;

        if let Err(e) = self.write_markdown(out) {
            error!("Failed to print markdown summary: {}", e);
        }
        if let Some(markdown_report_path) = &config.markdown_report_path {
            self.save_markdown(markdown_report_path).await;
        }
    }

    /// Fails when a minimum selection rate was configured and not reached.
    pub fn check_threshold(&self) -> Result<(), SelectionsError> {
        match (self.min_selection_rate, self.thresholds_ok) {
            (Some(expected), Some(false)) => {
                warn!(
                    "selection rate {:.4} is below the required {:.4}",
                    self.selection_rate, expected
                );
                Err(SelectionsError::ThresholdNotMet {
                    expected,
                    observed: self.selection_rate,
                })
            }
            _ => Ok(()),
        }
    }
}

struct Markdown<'r, 'w, W: Write> {
    w: &'w mut W,
    report: &'r Report,
}

impl<W: Write> Markdown<'_, '_, W> {
    fn write(mut self) -> Result<(), SelectionsError> {
        self.write_header()?;
        self.write_counts()?;
        self.write_threshold()?;
        writeln!(self.w)?;

        Ok(())
    }

    fn write_header(&mut self) -> Result<(), SelectionsError> {
        writeln!(self.w, "# Load test report (selections)")?;
        writeln!(self.w)?;

        Ok(())
    }

    fn write_counts(&mut self) -> Result<(), SelectionsError> {
        let report = self.report;
        writeln!(self.w, "- Target path: **{}**", report.target_path)?;
        writeln!(
            self.w,
            "- Total requests: **{}**",
            report.total_requests.to_formatted_string(&Locale::en)
        )?;
        writeln!(
            self.w,
            "- Requests with selections: **{}**",
            report.ok_with_selections.to_formatted_string(&Locale::en)
        )?;
        writeln!(
            self.w,
            "- Has selections (rate): **{:.2}%**",
            report.selection_rate_percent
        )?;
        writeln!(
            self.w,
            "- Avg response time: **{:.2} ms**",
            report.avg_response_time_ms
        )?;
        writeln!(
            self.w,
            "- JSON parse failures: **{}**",
            report.json_parse_failures.to_formatted_string(&Locale::en)
        )?;

        Ok(())
    }

    fn write_threshold(&mut self) -> Result<(), SelectionsError> {
        if let (Some(minimum), Some(ok)) =
            (self.report.min_selection_rate, self.report.thresholds_ok)
        {
            writeln!(
                self.w,
                "- Thresholds OK: **{}** (selection rate >= {:.2}%)",
                ok,
                minimum * 100.0
            )?;
        }

        Ok(())
    }
}

#[cfg(test)]
mod test {
    use super::*;
    use serde_json::Value;

    fn sample_report() -> Report {
        Report {
            target_path: "/api/selections".to_string(),
            total_requests: 1234,
            ok_with_selections: 925,
            selection_rate: 925.0 / 1234.0,
            selection_rate_percent: 74.96,
            avg_response_time_ms: 25.0,
            json_parse_failures: 3,
            note: REPORT_NOTE.to_string(),
            min_selection_rate: None,
            thresholds_ok: None,
        }
    }

    #[test]
    fn json_field_names_and_order() {
        let json = sample_report().to_json().unwrap();
        let keys: Vec<&str> = [
            "target_path",
            "total_requests",
            "ok_with_selections",
            "selection_rate",
            "selection_rate_percent",
            "avg_response_time_ms",
            "json_parse_failures",
            "note",
        ]
        .to_vec();
        let mut last = 0;
        for key in &keys {
            let position = json
                .find(&format!("\"{}\"", key))
                .unwrap_or_else(|| panic!("missing {}", key));
            assert!(position >= last, "{} out of order", key);
            last = position;
        }
        // Two space indentation.
        assert!(json.starts_with("{\n  \"target_path\": \"/api/selections\","));
        assert!(json.contains("\"avg_response_time_ms\": 25.0,"));
        // The threshold fields are only written when configured.
        assert!(!json.contains("thresholds_ok"));
        assert!(!json.contains("min_selection_rate"));
    }

    #[test]
    fn json_with_threshold() {
        let report = Report {
            min_selection_rate: Some(0.9),
            thresholds_ok: Some(false),
            ..sample_report()
        };
        let value: Value = serde_json::from_str(&report.to_json().unwrap()).unwrap();
        assert_eq!(value["min_selection_rate"], 0.9);
        assert_eq!(value["thresholds_ok"], false);

        let parsed: Report = serde_json::from_value(value).unwrap();
        assert_eq!(parsed, report);
    }

    #[test]
    fn markdown_summary() {
        let markdown = sample_report().to_markdown().unwrap();
        assert!(markdown.starts_with("# Load test report (selections)\n\n"));
        assert!(markdown.contains("- Target path: **/api/selections**\n"));
        assert!(markdown.contains("- Total requests: **1,234**\n"));
        assert!(markdown.contains("- Requests with selections: **925**\n"));
        assert!(markdown.contains("- Has selections (rate): **74.96%**\n"));
        assert!(markdown.contains("- Avg response time: **25.00 ms**\n"));
        assert!(markdown.contains("- JSON parse failures: **3**\n"));
        assert!(!markdown.contains("Thresholds OK"));

        let report = Report {
            min_selection_rate: Some(0.9),
            thresholds_ok: Some(true),
            ..sample_report()
        };
        assert!(report
            .to_markdown()
            .unwrap()
            .contains("- Thresholds OK: **true** (selection rate >= 90.00%)\n"));
    }

    #[tokio::test]
    async fn writes_and_overwrites_json() {
        let path = std::env::temp_dir().join(format!(
            "goose-selections-report-{}.json",
            std::process::id()
        ));
        let path = path.to_str().unwrap().to_string();
        std::fs::write(&path, "stale contents that are much longer than nothing").unwrap();

        let report = sample_report();
        report.write_json(&path).await.unwrap();
        let written = std::fs::read_to_string(&path).unwrap();
        assert_eq!(written, report.to_json().unwrap());

        std::fs::remove_file(&path).unwrap();
    }

    #[tokio::test]
    async fn write_failure_is_an_error() {
        let report = sample_report();
        let path = std::env::temp_dir()
            .join("goose-selections-missing-dir")
            .join("nested")
            .join("report.json");
        let result = report.write_json(path.to_str().unwrap()).await;
        assert!(matches!(result, Err(SelectionsError::Io(_))));

        // Saving only logs the failure.
        report.save(path.to_str().unwrap()).await;
    }

    #[test]
    fn threshold_check() {
        // No threshold configured.
        assert!(sample_report().check_threshold().is_ok());

        let report = Report {
            min_selection_rate: Some(0.7),
            thresholds_ok: Some(true),
            ..sample_report()
        };
        assert!(report.check_threshold().is_ok());

        let report = Report {
            min_selection_rate: Some(0.9),
            thresholds_ok: Some(false),
            ..sample_report()
        };
        match report.check_threshold() {
            Err(SelectionsError::ThresholdNotMet { expected, observed }) => {
                assert_eq!(expected, 0.9);
                assert_eq!(observed, 925.0 / 1234.0);
            }
            other => panic!("unexpected result: {:?}", other),
        }
    }

    #[tokio::test]
    async fn publish_writes_everything() {
        let dir = std::env::temp_dir();
        let prefix = format!("goose-selections-publish-{}", std::process::id());
        let json_path = dir.join(format!("{}.json", prefix));
        let markdown_path = dir.join(format!("{}.md", prefix));
        let config = Config {
            report_path: json_path.to_str().unwrap().to_string(),
            markdown_report_path: Some(markdown_path.to_str().unwrap().to_string()),
            ..Default::default()
        };

        let report = sample_report();
        let mut out = Vec::new();
        report.publish(&config, &mut out).await;

        let printed = String::from_utf8(out).unwrap();
        assert_eq!(printed, report.to_markdown().unwrap());
        assert_eq!(
            std::fs::read_to_string(&json_path).unwrap(),
            report.to_json().unwrap()
        );
        assert_eq!(std::fs::read_to_string(&markdown_path).unwrap(), printed);
        std::fs::remove_file(&json_path).unwrap();
        std::fs::remove_file(&markdown_path).unwrap();

        // Without a markdown path only the JSON report is written, and a report that
        // can't be written doesn't stop the summary from being printed.
        let config = Config {
            report_path: dir
                .join("goose-selections-missing-dir")
                .join("report.json")
                .to_str()
                .unwrap()
                .to_string(),
            ..Default::default()
        };
        let mut out = Vec::new();
        report.publish(&config, &mut out).await;
        assert!(!out.is_empty());
        assert!(!markdown_path.exists());
    }
}
