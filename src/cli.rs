// src/cli.rs
use clap::Parser;
use std::path::PathBuf;

/// Subwatch: Subdomain Enumeration and Monitoring Tool
///
/// Enumerate subdomains with external tools, store them in PostgreSQL, and
/// monitor tracked domains on a schedule with webhook alerts for new finds.
#[derive(Parser, Debug, Clone)]
#[command(name = "subwatch")]
#[command(author, version, about, long_about = None)]
pub struct Cli {
    // ===== Input & Configuration =====
    /// Path to TOML config file
    #[arg(short = 'c', long = "config", default_value = "config.toml")]
    pub config: String,

    // ===== Target Registry =====
    /// Add a domain to the monitoring list
    #[arg(short = 'a', long = "add", value_name = "DOMAIN")]
    pub add: Option<String>,

    /// Remove a domain from the monitoring list
    #[arg(short = 'r', long = "remove", value_name = "DOMAIN")]
    pub remove: Option<String>,

    /// List monitored domains
    #[arg(short = 'l', long = "list")]
    pub list: bool,

    /// Add domains from a text file (one domain per line)
    #[arg(long = "add-file", value_name = "PATH")]
    pub add_file: Option<PathBuf>,

    // ===== Scanning =====
    /// Scan a domain or list of domains (comma-separated) one time
    #[arg(short = 's', long = "scan", value_name = "DOMAINS")]
    pub scan: Option<String>,

    /// Save results to the database during a one-time scan
    #[arg(long = "save")]
    pub save: bool,

    // ===== Stored Records =====
    /// Print stored subdomains for a domain
    #[arg(short = 'g', long = "get", value_name = "DOMAIN")]
    pub get: Option<String>,

    /// Find stored subdomains containing a keyword
    #[arg(short = 'f', long = "find", value_name = "KEYWORD")]
    pub find: Option<String>,

    /// Add a single subdomain record (format: domain:subdomain)
    #[arg(long = "add-subdomain", value_name = "DOMAIN:SUB")]
    pub add_subdomain: Option<String>,

    /// Remove a single subdomain record (format: domain:subdomain)
    #[arg(long = "remove-subdomain", value_name = "DOMAIN:SUB")]
    pub remove_subdomain: Option<String>,

    /// Remove all subdomains containing a keyword
    #[arg(long = "remove-kw", value_name = "KEYWORD")]
    pub remove_kw: Option<String>,

    // ===== Monitoring =====
    /// Start the monitoring scheduler (runs until Ctrl-C)
    #[arg(short = 'm', long = "monitor")]
    pub monitor: bool,

    // ===== Webhook Overrides =====
    /// Override webhook URL from config
    #[arg(long = "webhook", value_name = "URL")]
    pub webhook_url: Option<String>,

    /// Override webhook secret from config
    #[arg(long = "webhook-secret")]
    pub webhook_secret: Option<String>,

    /// Override webhook timeout in seconds
    #[arg(long = "webhook-timeout")]
    pub webhook_timeout: Option<u64>,

    /// Disable webhook notifications even if configured
    #[arg(long = "no-webhook")]
    pub no_webhook: bool,

    // ===== Logging =====
    /// Verbose logging (set log level to debug)
    #[arg(short = 'v', long = "verbose")]
    pub verbose: bool,

    /// Quiet logging (set log level to warn)
    #[arg(short = 'q', long = "quiet")]
    pub quiet: bool,
}

/// The single action an invocation performs
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Action {
    AddTarget(String),
    RemoveTarget(String),
    ListTargets,
    AddFromFile(PathBuf),
    Scan { domains: Vec<String>, save: bool },
    GetSubdomains(String),
    FindSubdomains(String),
    AddSubdomain { domain: String, subdomain: String },
    RemoveSubdomain { domain: String, subdomain: String },
    RemoveByKeyword(String),
    Monitor,
}

impl Cli {
    /// Validate flag combinations and return errors for invalid usage
    pub fn validate(&self) -> anyhow::Result<()> {
        let action_count = [
            self.add.is_some(),
            self.remove.is_some(),
            self.list,
            self.add_file.is_some(),
            self.scan.is_some(),
            self.get.is_some(),
            self.find.is_some(),
            self.add_subdomain.is_some(),
            self.remove_subdomain.is_some(),
            self.remove_kw.is_some(),
            self.monitor,
        ]
        .iter()
        .filter(|&&x| x)
        .count();

        if action_count > 1 {
            anyhow::bail!("Cannot specify multiple actions. Choose exactly one.");
        }

        if self.save && self.scan.is_none() {
            anyhow::bail!("--save only applies to a one-time scan (--scan)");
        }

        // Verbose and quiet are mutually exclusive
        if self.verbose && self.quiet {
            anyhow::bail!("Cannot specify both --verbose and --quiet");
        }

        Ok(())
    }

    /// The requested action, if any flag was given
    pub fn action(&self) -> anyhow::Result<Option<Action>> {
        let action = if let Some(ref domain) = self.add {
            Action::AddTarget(domain.clone())
        } else if let Some(ref domain) = self.remove {
            Action::RemoveTarget(domain.clone())
        } else if self.list {
            Action::ListTargets
        } else if let Some(ref path) = self.add_file {
            Action::AddFromFile(path.clone())
        } else if let Some(ref domains) = self.scan {
            Action::Scan {
                domains: domains
                    .split(',')
                    .map(|d| d.trim().to_string())
                    .filter(|d| !d.is_empty())
                    .collect(),
                save: self.save,
            }
        } else if let Some(ref domain) = self.get {
            Action::GetSubdomains(domain.clone())
        } else if let Some(ref keyword) = self.find {
            Action::FindSubdomains(keyword.clone())
        } else if let Some(ref record) = self.add_subdomain {
            let (domain, subdomain) = parse_record(record)?;
            Action::AddSubdomain { domain, subdomain }
        } else if let Some(ref record) = self.remove_subdomain {
            let (domain, subdomain) = parse_record(record)?;
            Action::RemoveSubdomain { domain, subdomain }
        } else if let Some(ref keyword) = self.remove_kw {
            Action::RemoveByKeyword(keyword.clone())
        } else if self.monitor {
            Action::Monitor
        } else {
            return Ok(None);
        };

        Ok(Some(action))
    }

    /// Determine log level based on verbose/quiet flags
    pub fn log_level(&self) -> &str {
        if self.verbose {
            "debug"
        } else if self.quiet {
            "warn"
        } else {
            "info"
        }
    }
}

/// Parse a "domain:subdomain" argument
fn parse_record(record: &str) -> anyhow::Result<(String, String)> {
    match record.split_once(':') {
        Some((domain, subdomain)) if !domain.trim().is_empty() && !subdomain.trim().is_empty() => {
            Ok((domain.trim().to_string(), subdomain.trim().to_string()))
        }
        _ => anyhow::bail!("Please use the format domain:subdomain"),
    }
}
