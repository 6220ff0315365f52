//! Output formatting for fleetfish (json, yaml, table)

use std::fmt;

use clap::ValueEnum;
use colored::Colorize;
use fleetfish_core::FleetReport;
use fleetfish_dispatch::ActionReport;
use serde::Serialize;
use serde_json::Value;
use tabled::{Table, Tabled};

/// Output format options
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, ValueEnum)]
pub enum OutputFormat {
    /// Pretty-printed JSON
    Json,
    /// YAML
    Yaml,
    /// ASCII table, one row per host and field (default)
    #[default]
    Table,
}

impl fmt::Display for OutputFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            OutputFormat::Json => f.write_str("json"),
            OutputFormat::Yaml => f.write_str("yaml"),
            OutputFormat::Table => f.write_str("table"),
        }
    }
}

/// Context for output rendering
pub struct OutputContext {
    pub format: OutputFormat,
    pub quiet: bool,
}

impl OutputContext {
    pub fn new(format: OutputFormat, no_color: bool, quiet: bool) -> Self {
        if no_color {
            colored::control::set_override(false);
        }
        Self { format, quiet }
    }

    /// Print a warning message
    pub fn warn(&self, msg: &str) {
        eprintln!("{}", msg.yellow());
    }

    /// Print an aggregated report in the configured format
    pub fn render<T: Serialize>(&self, report: &FleetReport<T>) -> anyhow::Result<()> {
        println!("{}", self.format_report(report)?);

        let failed = report.failure_count();
        if failed > 0 && !self.quiet {
            self.warn(&format!("{} of {} hosts failed", failed, report.len()));
        }
        Ok(())
    }

    /// Format an aggregated report without printing it
    pub fn format_report<T: Serialize>(&self, report: &FleetReport<T>) -> anyhow::Result<String> {
        let rendered = match self.format {
            OutputFormat::Json => serde_json::to_string_pretty(report)?,
            OutputFormat::Yaml => serde_yaml::to_string(report)?,
            OutputFormat::Table => {
                let rows = report_rows(&serde_json::to_value(report)?);
                if rows.is_empty() {
                    "No data".to_string()
                } else {
                    Table::new(rows).to_string()
                }
            }
        };
        Ok(rendered)
    }

    /// Print the per-host lines of a fire-and-forget batch
    pub fn print_action(&self, report: &ActionReport) {
        for line in report.lines() {
            if line.ends_with("command sent") {
                if !self.quiet {
                    println!("{}", line.green());
                }
            } else {
                println!("{}", line.red());
            }
        }
    }
}

/// Report display for the table format
#[derive(Debug, Clone, PartialEq, Eq, Tabled, Serialize)]
pub struct ReportRow {
    #[tabled(rename = "Host")]
    pub host: String,
    #[tabled(rename = "Field")]
    pub field: String,
    #[tabled(rename = "Value")]
    pub value: String,
}

/// Flatten a serialized report into rows
fn report_rows(report: &Value) -> Vec<ReportRow> {
    let Value::Object(hosts) = report else {
        return Vec::new();
    };

    let mut rows = Vec::new();
    for (host, outcome) in hosts {
        if let Some(error) = outcome.get("error") {
            rows.push(ReportRow {
                host: host.clone(),
                field: "error".to_string(),
                value: error_text(error).red().to_string(),
            });
            continue;
        }

        let mut fields = Vec::new();
        flatten("", outcome, &mut fields);
        rows.extend(fields.into_iter().map(|(field, value)| ReportRow {
            host: host.clone(),
            field,
            value,
        }));
    }
    rows
}

fn error_text(error: &Value) -> String {
    let kind = error.get("kind").and_then(Value::as_str).unwrap_or("error");
    let message = error.get("message").and_then(Value::as_str).unwrap_or_default();
    format!("{}: {}", kind, message)
}

/// Collect `(path, scalar)` pairs; nested keys are joined with `.`
fn flatten(prefix: &str, value: &Value, out: &mut Vec<(String, String)>) {
    let join = |key: &str| {
        if prefix.is_empty() {
            key.to_string()
        } else {
            format!("{}.{}", prefix, key)
        }
    };

    match value {
        Value::Object(map) if !map.is_empty() => {
            for (key, child) in map {
                flatten(&join(key), child, out);
            }
        }
        Value::Array(items) if !items.is_empty() => {
            for (index, child) in items.iter().enumerate() {
                flatten(&format!("{}[{}]", prefix, index), child, out);
            }
        }
        other => out.push((prefix.to_string(), scalar_text(other))),
    }
}

fn scalar_text(value: &Value) -> String {
    match value {
        Value::String(s) => s.clone(),
        Value::Null => "-".to_string(),
        Value::Object(_) => "{}".to_string(),
        Value::Array(_) => "[]".to_string(),
        other => other.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use fleetfish_core::{BiosAttributes, HostError, PendingAttributes};
    use pretty_assertions::assert_eq;
    use serde_json::json;

    fn row(host: &str, field: &str, value: &str) -> ReportRow {
        ReportRow {
            host: host.into(),
            field: field.into(),
            value: value.into(),
        }
    }

    #[test]
    fn test_rows_flatten_nested_fields() {
        colored::control::set_override(false);
        let mut report = FleetReport::new();
        report.record(
            "bmc-01",
            Ok(BiosAttributes {
                attributes: [("Rome0565 (SVM Mode)".to_string(), json!("Enabled"))].into(),
            }),
        );
        report.record("bmc-02", Err(HostError::Timeout));

        let rows = report_rows(&serde_json::to_value(&report).unwrap());
        assert_eq!(
            rows,
            vec![
                row("bmc-01", "attributes.Rome0565 (SVM Mode)", "Enabled"),
                row("bmc-02", "error", "connection: operation timed out"),
            ]
        );
    }

    #[test]
    fn test_empty_mapping_keeps_a_row() {
        let mut report = FleetReport::new();
        report.record(
            "bmc-01",
            Ok(PendingAttributes {
                pending: Default::default(),
            }),
        );
        let rows = report_rows(&serde_json::to_value(&report).unwrap());
        assert_eq!(rows, vec![row("bmc-01", "pending", "{}")]);
    }

    #[test]
    fn test_arrays_are_indexed() {
        let mut out = Vec::new();
        flatten("", &json!({ "order": ["Boot0001", "Boot0002"], "next": null }), &mut out);
        assert_eq!(
            out,
            vec![
                ("next".to_string(), "-".to_string()),
                ("order[0]".to_string(), "Boot0001".to_string()),
                ("order[1]".to_string(), "Boot0002".to_string()),
            ]
        );
    }

    #[test]
    fn test_json_errors_are_structured() {
        let ctx = OutputContext::new(OutputFormat::Json, true, false);
        let mut report: FleetReport<BiosAttributes> = FleetReport::new();
        report.record("bmc-01", Err(HostError::UnknownVendor("FOO CORP".into())));

        let rendered = ctx.format_report(&report).unwrap();
        let parsed: Value = serde_json::from_str(&rendered).unwrap();
        assert_eq!(parsed["bmc-01"]["error"]["kind"], "validation");
        assert!(parsed["bmc-01"]["error"]["message"]
            .as_str()
            .unwrap()
            .contains("FOO CORP"));
    }

    #[test]
    fn test_yaml_output() {
        let ctx = OutputContext::new(OutputFormat::Yaml, true, false);
        let mut report = FleetReport::new();
        report.record(
            "bmc-01",
            Ok(PendingAttributes {
                pending: [("Sriov".to_string(), json!("Enabled"))].into(),
            }),
        );
        let rendered = ctx.format_report(&report).unwrap();
        assert!(rendered.contains("bmc-01:"));
        assert!(rendered.contains("Sriov: Enabled"));
    }
}
