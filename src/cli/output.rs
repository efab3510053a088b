//! Output formatting for CLI commands.
//!
//! Renders the resolved context and server status for the user, as plain
//! text or JSON depending on the global output flag.

use colored::Colorize;
use std::fmt::Write;
use tabled::{Table, Tabled};

use crate::context::Context;
use crate::resources::ServerInstance;

use super::commands::OutputFormat;

/// Output formatter for CLI.
#[derive(Debug)]
pub struct OutputFormatter {
    /// Output format.
    format: OutputFormat,
}

/// Server instance row for table display.
#[derive(Tabled)]
struct ServerInstanceRow {
    #[tabled(rename = "PID")]
    pid: u32,
    #[tabled(rename = "HTTP port")]
    http_port: String,
    #[tabled(rename = "Debug port")]
    debug_port: String,
}

impl OutputFormatter {
    /// Creates a new output formatter.
    #[must_use]
    pub const fn new(format: OutputFormat) -> Self {
        Self { format }
    }

    /// Formats the resolved context. Read-only: the context is rendered,
    /// never mutated.
    #[must_use]
    pub fn format_context(&self, ctx: &Context) -> String {
        match self.format {
            OutputFormat::Json => serde_json::to_string_pretty(ctx).unwrap_or_default(),
            OutputFormat::Text => ctx.render(),
        }
    }

    /// Formats the list of running server instances.
    #[must_use]
    pub fn format_server_status(&self, instances: &[ServerInstance]) -> String {
        match self.format {
            OutputFormat::Json => Self::format_server_status_json(instances),
            OutputFormat::Text => Self::format_server_status_text(instances),
        }
    }

    fn format_server_status_text(instances: &[ServerInstance]) -> String {
        if instances.is_empty() {
            return format!("{} No running server instance found.\n", "✗".red());
        }

        let rows: Vec<ServerInstanceRow> = instances
            .iter()
            .map(|i| ServerInstanceRow {
                pid: i.pid,
                http_port: i.http_port.map_or_else(|| "-".to_string(), |p| p.to_string()),
                debug_port: i.debug_port.map_or_else(|| "-".to_string(), |p| p.to_string()),
            })
            .collect();

        let mut output = String::new();
        let _ = writeln!(output, "{} Server is running.", "✓".green());
        output.push_str(&Table::new(rows).to_string());
        output.push('\n');
        output
    }

    fn format_server_status_json(instances: &[ServerInstance]) -> String {
        let values: Vec<serde_json::Value> = instances
            .iter()
            .map(|i| {
                serde_json::json!({
                    "pid": i.pid,
                    "http_port": i.http_port,
                    "debug_port": i.debug_port,
                })
            })
            .collect();
        serde_json::to_string_pretty(&values).unwrap_or_default()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::context::{CoreSection, SrcSection, TcSection};

    fn sample_context() -> Context {
        Context {
            core: CoreSection {
                data_dir: "/home/dev/.devbench".into(),
                download_cache: "/home/dev/.devbench/downloads".into(),
                template_dir: "/home/dev/.devbench/templates".into(),
            },
            src: SrcSection {
                user: "alice".into(),
                server: "scm.example.com".into(),
                repo_ce: "server".into(),
                repo_pro: "server-pro".into(),
                branch_ce: "trunk".into(),
                branch_pro: "trunk".into(),
                url_ce: "svn+ssh://alice@scm.example.com/server/trunk".into(),
                url_pro: "svn+ssh://alice@scm.example.com/server-pro/trunk".into(),
                working_copy_ce: "/work/ce".into(),
                working_copy_pro: "/work/pro".into(),
                skip_tests: "false".into(),
            },
            tc: TcSection {
                home: "/work/tomcat".into(),
                distribution_url: "https://archive.example.com/t.tar.gz".into(),
                java_opts: "-Dport.http=8080".into(),
                catalina_opts: "-Xmx2048m".into(),
            },
        }
    }

    #[test]
    fn test_text_context_has_key_value_lines() {
        let formatter = OutputFormatter::new(OutputFormat::Text);
        let out = formatter.format_context(&sample_context());
        assert!(out.starts_with("src.url_ce = "));
        assert!(out.contains("\ntc.home = /work/tomcat\n"));
    }

    #[test]
    fn test_json_context_round_trips() {
        let formatter = OutputFormatter::new(OutputFormat::Json);
        let out = formatter.format_context(&sample_context());
        let value: serde_json::Value = serde_json::from_str(&out).expect("invalid json");
        assert_eq!(value["src"]["user"], "alice");
        assert_eq!(value["tc"]["home"], "/work/tomcat");
    }

    #[test]
    fn test_server_status_empty() {
        let formatter = OutputFormatter::new(OutputFormat::Text);
        let out = formatter.format_server_status(&[]);
        assert!(out.contains("No running server instance"));
    }

    #[test]
    fn test_server_status_table() {
        let formatter = OutputFormatter::new(OutputFormat::Text);
        let instances = vec![ServerInstance {
            pid: 4242,
            http_port: Some(8080),
            debug_port: None,
        }];
        let out = formatter.format_server_status(&instances);
        assert!(out.contains("4242"));
        assert!(out.contains("8080"));
        assert!(out.contains('-'));
    }
}
