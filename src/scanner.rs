// src/scanner.rs
//! Runs external enumeration tools and collects their output

use anyhow::Result;
use async_trait::async_trait;
use std::collections::BTreeSet;
use std::process::Stdio;
use std::time::Duration;
use tokio::process::Command;
use tracing::{info, warn};

use crate::config::ScannerConfig;

/// Produces the set of subdomains found for a domain.
#[async_trait]
pub trait Enumerator: Send + Sync {
    async fn enumerate(&self, domain: &str) -> Result<BTreeSet<String>>;
}

/// Shells out to each configured tool template and unions the results.
///
/// Tool contract: newline-delimited candidate subdomains on stdout, possibly
/// with noise lines that get stripped. stderr is discarded.
pub struct ToolScanner {
    tools: Vec<String>,
    tool_timeout: Duration,
}

impl ToolScanner {
    pub fn new(cfg: &ScannerConfig) -> Self {
        Self {
            tools: cfg.tools.clone(),
            tool_timeout: Duration::from_secs(cfg.tool_timeout_secs),
        }
    }

    /// Run one tool invocation and merge its stdout lines into `subdomains`.
    /// A failing or hung tool is logged and skipped, never propagated.
    async fn run_tool(&self, command: &str, subdomains: &mut BTreeSet<String>) {
        info!("Running: {}", command);

        let child = Command::new("sh")
            .arg("-c")
            .arg(command)
            .stdout(Stdio::piped())
            .stderr(Stdio::null())
            .kill_on_drop(true)
            .output();

        let output = match tokio::time::timeout(self.tool_timeout, child).await {
            Ok(Ok(output)) => output,
            Ok(Err(e)) => {
                warn!("Error running {}: {}", command, e);
                return;
            }
            Err(_) => {
                warn!(
                    "Tool timed out after {}s, killed: {}",
                    self.tool_timeout.as_secs(),
                    command
                );
                return;
            }
        };

        if !output.status.success() {
            warn!("Error running {}: exit status {}", command, output.status);
            return;
        }

        let stdout = String::from_utf8_lossy(&output.stdout);
        for line in stdout.lines() {
            let line = line.trim();
            if !line.is_empty() {
                subdomains.insert(line.to_string());
            }
        }
    }
}

#[async_trait]
impl Enumerator for ToolScanner {
    async fn enumerate(&self, domain: &str) -> Result<BTreeSet<String>> {
        if self.tools.is_empty() {
            warn!("No enumeration tools configured");
        }

        let mut subdomains = BTreeSet::new();

        for tool in &self.tools {
            let command = tool.replace("{domain}", domain);
            self.run_tool(&command, &mut subdomains).await;
        }

        info!("Found {} subdomains for {}", subdomains.len(), domain);

        Ok(subdomains)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn scanner_with(tools: Vec<&str>, timeout_secs: u64) -> ToolScanner {
        ToolScanner::new(&ScannerConfig {
            tools: tools.into_iter().map(String::from).collect(),
            tool_timeout_secs: timeout_secs,
        })
    }

    #[tokio::test]
    async fn test_union_across_tools_with_blank_lines() {
        // Tool A emits a. and b., tool B emits b. plus a blank line
        let scanner = scanner_with(
            vec![
                "printf 'a.{domain}\\nb.{domain}\\n'",
                "printf 'b.{domain}\\n\\n'",
            ],
            30,
        );

        let result = scanner.enumerate("example.com").await.unwrap();

        let expected: BTreeSet<String> = ["a.example.com", "b.example.com"]
            .into_iter()
            .map(String::from)
            .collect();
        assert_eq!(result, expected);
    }

    #[tokio::test]
    async fn test_output_lines_are_trimmed() {
        let scanner = scanner_with(vec!["printf '  x.{domain}  \\n\\t\\n'"], 30);

        let result = scanner.enumerate("example.com").await.unwrap();

        assert_eq!(result.len(), 1);
        assert!(result.contains("x.example.com"));
    }

    #[tokio::test]
    async fn test_failing_tool_does_not_abort_scan() {
        let scanner = scanner_with(
            vec![
                "printf 'a.{domain}\\n'",
                "false",
                "printf 'b.{domain}\\n'",
            ],
            30,
        );

        let result = scanner.enumerate("example.com").await.unwrap();

        assert_eq!(result.len(), 2);
        assert!(result.contains("a.example.com"));
        assert!(result.contains("b.example.com"));
    }

    #[tokio::test]
    async fn test_failing_tool_output_is_discarded() {
        // Non-zero exit means the tool's stdout is thrown away
        let scanner = scanner_with(vec!["printf 'junk.{domain}\\n'; exit 1"], 30);

        let result = scanner.enumerate("example.com").await.unwrap();

        assert!(result.is_empty());
    }

    #[tokio::test]
    async fn test_hung_tool_is_killed() {
        let scanner = scanner_with(
            vec!["sleep 30", "printf 'a.{domain}\\n'"],
            1,
        );

        let result = scanner.enumerate("example.com").await.unwrap();

        assert_eq!(result.len(), 1);
        assert!(result.contains("a.example.com"));
    }

    #[tokio::test]
    async fn test_no_tools_configured() {
        let scanner = scanner_with(vec![], 30);

        let result = scanner.enumerate("example.com").await.unwrap();

        assert!(result.is_empty());
    }
}
