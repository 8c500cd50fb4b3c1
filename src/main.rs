// src/main.rs
use clap::{CommandFactory, Parser};
use colored::Colorize;
use std::path::Path;
use std::sync::Arc;
use subwatch::cli::{Action, Cli};
use subwatch::config::{Config, WebhookConfig};
use subwatch::monitor::Monitor;
use subwatch::notifier::{NotificationSink, Notifier};
use subwatch::scanner::{Enumerator, ToolScanner};
use subwatch::store::{PostgresStore, Store};
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Parse CLI arguments
    let cli = Cli::parse();

    // Validate arguments
    cli.validate()?;

    // No action requested: print usage and exit
    let Some(action) = cli.action()? else {
        Cli::command().print_help()?;
        println!();
        return Ok(());
    };

    // Load config file
    let mut config = Config::from_file(Path::new(&cli.config))?;

    // Apply CLI overrides
    if let Some(ref url) = cli.webhook_url {
        match config.webhook {
            Some(ref mut webhook) => webhook.url = url.clone(),
            None => {
                config.webhook = Some(WebhookConfig {
                    url: url.clone(),
                    secret: None,
                    timeout_secs: None,
                });
            }
        }
    }

    if let Some(ref secret) = cli.webhook_secret {
        if let Some(ref mut webhook) = config.webhook {
            webhook.secret = Some(secret.clone());
        }
    }

    if let Some(timeout) = cli.webhook_timeout {
        if let Some(ref mut webhook) = config.webhook {
            webhook.timeout_secs = Some(timeout);
        }
    }

    // Initialize logging
    let log_level = if cli.verbose {
        "debug"
    } else if cli.quiet {
        "warn"
    } else {
        &config.logging.level
    };

    let env_filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(log_level));

    tracing_subscriber::fmt()
        .with_env_filter(env_filter)
        .init();

    // Connect and migrate the store
    let store = PostgresStore::new(&config.database.url, config.database.max_connections).await?;
    store.migrate().await?;
    let store: Arc<dyn Store> = Arc::new(store);

    match action {
        Action::AddTarget(domain) => {
            add_target(store.as_ref(), &domain).await?;
        }

        Action::RemoveTarget(domain) => {
            if store.remove_target(&domain).await? {
                println!("{} {} from the monitoring list.", "Removed".green(), domain);
            } else {
                println!("{} was not in the monitoring list.", domain.yellow());
            }
        }

        Action::ListTargets => {
            let domains = store.list_targets().await?;
            println!("Monitored domains:");
            for domain in domains {
                println!("{}", domain);
            }
        }

        Action::AddFromFile(path) => {
            let contents = tokio::fs::read_to_string(&path)
                .await
                .map_err(|e| anyhow::anyhow!("Failed to read {}: {}", path.display(), e))?;

            for line in contents.lines() {
                let domain = line.trim();
                if !domain.is_empty() {
                    add_target(store.as_ref(), domain).await?;
                }
            }
        }

        Action::Scan { domains, save } => {
            let scanner = ToolScanner::new(&config.scanner);

            for domain in domains {
                let subdomains = scanner.enumerate(&domain).await?;

                println!("\nSubdomains for {}:", domain.bold());
                for subdomain in &subdomains {
                    println!("{}", subdomain);
                }

                if save {
                    let new_subdomains = store.save_subdomains(&domain, &subdomains).await?;
                    println!(
                        "\nSaved {} new subdomains for {}.",
                        new_subdomains.len().to_string().green(),
                        domain
                    );
                }
            }
        }

        Action::GetSubdomains(domain) => {
            let subdomains = store.get_subdomains(&domain).await?;
            println!("Stored subdomains for {}:", domain.bold());
            for subdomain in subdomains {
                println!("{}", subdomain);
            }
        }

        Action::FindSubdomains(keyword) => {
            let subdomains = store.search_subdomains(&keyword).await?;
            println!("Subdomains containing '{}':", keyword.bold());
            for subdomain in subdomains {
                println!("{}", subdomain);
            }
        }

        Action::AddSubdomain { domain, subdomain } => {
            if store.add_subdomain(&domain, &subdomain).await? {
                println!(
                    "Subdomain '{}' {} under '{}'.",
                    subdomain,
                    "added".green(),
                    domain
                );
            } else {
                println!(
                    "Subdomain '{}' under '{}' {}.",
                    subdomain,
                    domain,
                    "already exists".yellow()
                );
            }
        }

        Action::RemoveSubdomain { domain, subdomain } => {
            if store.remove_subdomain(&domain, &subdomain).await? {
                println!(
                    "Successfully {} subdomain '{}' under '{}'.",
                    "removed".green(),
                    subdomain,
                    domain
                );
            } else {
                println!(
                    "No matching subdomain '{}' under '{}' {}.",
                    subdomain,
                    domain,
                    "found".yellow()
                );
            }
        }

        Action::RemoveByKeyword(keyword) => {
            let count = store.remove_by_keyword(&keyword).await?;
            println!(
                "Removed {} subdomain(s) containing '{}'.",
                count.to_string().green(),
                keyword
            );
        }

        Action::Monitor => {
            let scanner: Arc<dyn Enumerator> = Arc::new(ToolScanner::new(&config.scanner));

            let notifier: Option<Arc<dyn NotificationSink>> = if cli.no_webhook {
                tracing::info!("Webhooks disabled");
                None
            } else if let Some(webhook_config) = config.webhook.clone() {
                tracing::info!("Webhook enabled: {}", webhook_config.url);
                Some(Arc::new(Notifier::new(webhook_config)))
            } else {
                tracing::warn!("No webhook configured; new subdomains will only be logged");
                None
            };

            let monitor = Monitor::new(store.clone(), scanner, notifier, &config.monitoring);

            // Ctrl-C flips the shutdown signal so the loop can exit cleanly
            let (shutdown_tx, shutdown_rx) = tokio::sync::watch::channel(false);
            tokio::spawn(async move {
                if tokio::signal::ctrl_c().await.is_ok() {
                    tracing::info!("Received Ctrl-C, shutting down...");
                    shutdown_tx.send(true).ok();
                }
            });

            monitor.run(shutdown_rx).await;
        }
    }

    Ok(())
}

/// Shared by --add and --add-file: one outcome line per domain
async fn add_target(store: &dyn Store, domain: &str) -> anyhow::Result<()> {
    if store.add_target(domain).await? {
        println!("{} {} to the monitoring list.", "Added".green(), domain);
    } else {
        println!("{} is already in the monitoring list.", domain.yellow());
    }
    Ok(())
}
