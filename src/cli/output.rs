//! Output formatting for CLI commands.

use colored::Colorize;
use std::fmt::Write;

use crate::status::StackStatus;

use super::commands::OutputFormat;

/// Output formatter for CLI.
#[derive(Debug)]
pub struct OutputFormatter {
    /// Output format.
    format: OutputFormat,
}

impl OutputFormatter {
    /// Creates a new output formatter.
    #[must_use]
    pub const fn new(format: OutputFormat) -> Self {
        Self { format }
    }

    /// Formats a deploy status for display.
    #[must_use]
    pub fn format_status(&self, status: &StackStatus) -> String {
        match self.format {
            OutputFormat::Json => {
                serde_json::to_string_pretty(status).unwrap_or_default()
            }
            OutputFormat::Text => Self::format_status_text(status),
        }
    }

    /// Formats a status as human-readable text.
    fn format_status_text(status: &StackStatus) -> String {
        let mut output = String::new();

        let _ = writeln!(
            output,
            "{} Stack '{}': {} resources deployed",
            "✓".green(),
            status.name.bold(),
            status.deployed.len()
        );

        for record in &status.deployed {
            let physical =
                serde_json::to_string(&record.physical_id).unwrap_or_default();
            let _ = writeln!(
                output,
                "  {:<24} {:<18} {} ({})",
                record.id,
                record.kind.to_string().cyan(),
                physical,
                record.deployed_at.to_rfc3339()
            );
        }

        output
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::ResourceKind;
    use crate::status::DeployedResourceRecord;
    use serde_json::{json, Map, Value};

    fn sample_status() -> StackStatus {
        let mut status = StackStatus::new("s");
        let mut physical_id = Map::new();
        physical_id.insert(String::from("job_id"), json!(7));
        status.add_record(DeployedResourceRecord::new(
            "r1",
            ResourceKind::Job,
            physical_id,
            Value::Null,
        ));
        status
    }

    #[test]
    fn test_text_format_lists_resources() {
        let formatter = OutputFormatter::new(OutputFormat::Text);
        let output = formatter.format_status(&sample_status());
        assert!(output.contains("r1"));
        assert!(output.contains("JOB"));
    }

    #[test]
    fn test_json_format_roundtrips() {
        let formatter = OutputFormatter::new(OutputFormat::Json);
        let output = formatter.format_status(&sample_status());
        let parsed: StackStatus = serde_json::from_str(&output).unwrap();
        assert_eq!(parsed.deployed.len(), 1);
    }
}
