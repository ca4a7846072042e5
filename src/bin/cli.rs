//! Gustavo CLI
//!
//! Command-line interface for Gustavo operations:
//! - Check server status
//! - List and export the waitlist
//! - Value an address
//! - Issue bearer tokens and seed the demo portfolio (local SQLite only)
//! - Generate a default config file

use anyhow::{bail, Context};
use clap::{Parser, Subcommand};
use gustavo::config::{generate_default_config, Config, DatastoreBackend};
use gustavo::dashboard::{demo_seed, DEMO_LANDLORD_ID};
use gustavo::store::SqliteStore;
use std::path::PathBuf;

#[derive(Parser)]
#[command(name = "gustavo")]
#[command(version = env!("CARGO_PKG_VERSION"))]
#[command(about = "Waitlist, scheduling and portfolio admin for Gustavo")]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,

    /// API server URL
    #[arg(long, default_value = "http://localhost:3000", global = true)]
    pub api_url: String,

    /// Output format (table, json)
    #[arg(short, long, default_value = "table", global = true)]
    pub format: String,

    /// Config file (default: standard locations)
    #[arg(short, long, global = true)]
    pub config: Option<PathBuf>,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Show server status
    Status,

    /// Waitlist administration
    Waitlist {
        #[command(subcommand)]
        action: WaitlistAction,
    },

    /// Estimate the value and rent of an address
    Valuate {
        #[arg(long)]
        address: String,
        #[arg(long)]
        city: String,
        #[arg(long)]
        state: String,
        #[arg(long)]
        zip: String,
    },

    /// Create a bearer token for a landlord
    IssueToken {
        #[arg(long)]
        user_id: String,
        #[arg(long)]
        email: Option<String>,
    },

    /// Load the demo portfolio for a landlord
    SeedDemo {
        #[arg(long, default_value = DEMO_LANDLORD_ID)]
        landlord_id: String,
    },

    /// Generate default config file
    Config {
        /// Output path (default: stdout)
        #[arg(short, long)]
        output: Option<PathBuf>,
    },
}

#[derive(Subcommand)]
pub enum WaitlistAction {
    /// List signups, newest first
    List,
    /// Download signups as CSV
    Export {
        /// Output file (default: stdout)
        #[arg(short, long)]
        output: Option<PathBuf>,
    },
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    let client = reqwest::Client::new();

    match cli.command {
        Commands::Status => {
            let health: serde_json::Value = client
                .get(format!("{}/health", cli.api_url))
                .send()
                .await
                .with_context(|| format!("Cannot connect to Gustavo API at {}", cli.api_url))?
                .error_for_status()?
                .json()
                .await?;

            if cli.format == "json" {
                println!("{}", serde_json::to_string_pretty(&health)?);
                return Ok(());
            }

            println!("Gustavo v{}", env!("CARGO_PKG_VERSION"));
            println!();
            println!("API Status: {}", health["status"].as_str().unwrap_or("unknown"));
            println!(
                "Datastore:  {} ({})",
                health["datastore"].as_str().unwrap_or("unknown"),
                health["backend"].as_str().unwrap_or("unknown")
            );
            println!("Valuation:  {}", health["valuation"].as_str().unwrap_or("unknown"));
            if let Some(uptime) = health["uptime_seconds"].as_u64() {
                println!();
                println!("Uptime: {}", format_duration(uptime));
            }
        }

        Commands::Waitlist { action } => match action {
            WaitlistAction::List => {
                let data: serde_json::Value = client
                    .get(format!("{}/api/waitlist", cli.api_url))
                    .send()
                    .await?
                    .error_for_status()?
                    .json()
                    .await?;

                if cli.format == "json" {
                    println!("{}", serde_json::to_string_pretty(&data)?);
                    return Ok(());
                }

                let entries = data["entries"].as_array().cloned().unwrap_or_default();
                if entries.is_empty() {
                    println!("No waitlist signups yet.");
                    return Ok(());
                }

                println!("{:<24} {:<32} {:<10} {}", "Name", "Email", "Type", "Joined");
                println!("{}", "-".repeat(80));
                for entry in &entries {
                    println!(
                        "{:<24} {:<32} {:<10} {}",
                        entry["name"].as_str().unwrap_or(""),
                        entry["email"].as_str().unwrap_or(""),
                        entry["user_type"].as_str().unwrap_or("-"),
                        entry["created_at"].as_str().unwrap_or("")
                    );
                }
                println!();
                println!("{} signups", entries.len());
            }

            WaitlistAction::Export { output } => {
                let csv = client
                    .get(format!("{}/api/waitlist/export", cli.api_url))
                    .send()
                    .await?
                    .error_for_status()?
                    .text()
                    .await?;

                match output {
                    Some(path) => {
                        std::fs::write(&path, csv)
                            .with_context(|| format!("Failed to write {:?}", path))?;
                        println!("Exported to {:?}", path);
                    }
                    None => print!("{}", csv),
                }
            }
        },

        Commands::Valuate {
            address,
            city,
            state,
            zip,
        } => {
            let body = serde_json::json!({
                "address": address,
                "city": city,
                "state": state,
                "zipCode": zip,
            });

            let response = client
                .post(format!("{}/api/valuations/estimate", cli.api_url))
                .json(&body)
                .send()
                .await?;

            if !response.status().is_success() {
                let status = response.status();
                let text = response.text().await.unwrap_or_default();
                bail!("Valuation failed ({}): {}", status, text);
            }

            let estimate: serde_json::Value = response.json().await?;
            if cli.format == "json" {
                println!("{}", serde_json::to_string_pretty(&estimate)?);
            } else {
                println!(
                    "{}, {}, {} {}: ${:.0} (confidence {:.2}, {})",
                    address,
                    city,
                    state,
                    zip,
                    estimate["value"].as_f64().unwrap_or(0.0),
                    estimate["confidence"].as_f64().unwrap_or(0.0),
                    estimate["source"].as_str().unwrap_or("unknown")
                );
            }
        }

        Commands::IssueToken { user_id, email } => {
            let store = open_local_store(cli.config.as_ref())?;
            let token = store.issue_token(&user_id, email.as_deref())?;
            println!("{}", token);
        }

        Commands::SeedDemo { landlord_id } => {
            let store = open_local_store(cli.config.as_ref())?;
            let (records, tasks) = demo_seed(&landlord_id);

            for record in &records {
                store.insert_record(record).with_context(|| {
                    format!(
                        "Failed to insert {} (already seeded for {}?)",
                        record.property.id, landlord_id
                    )
                })?;
            }
            for task in &tasks {
                store.insert_task(task)?;
            }

            println!(
                "Seeded {} properties and {} tasks for {}",
                records.len(),
                tasks.len(),
                landlord_id
            );
        }

        Commands::Config { output } => {
            let config = generate_default_config();
            match output {
                Some(path) => {
                    std::fs::write(&path, &config)?;
                    println!("Config written to {:?}", path);
                }
                None => {
                    print!("{}", config);
                }
            }
        }
    }

    Ok(())
}

/// The SQLite store named by the config; the hosted backend is managed elsewhere
fn open_local_store(path: Option<&PathBuf>) -> anyhow::Result<SqliteStore> {
    let config = match path {
        Some(path) => Config::load_with_env(path)?,
        None => Config::load_default(),
    };

    if config.database.backend != DatastoreBackend::Sqlite {
        bail!("This command needs the sqlite datastore backend");
    }

    SqliteStore::open(&config.database.path)
        .with_context(|| format!("Failed to open {}", config.database.path))
}

fn format_duration(seconds: u64) -> String {
    if seconds < 60 {
        format!("{}s", seconds)
    } else if seconds < 3600 {
        format!("{}m {}s", seconds / 60, seconds % 60)
    } else if seconds < 86400 {
        format!("{}h {}m", seconds / 3600, (seconds % 3600) / 60)
    } else {
        format!("{}d {}h", seconds / 86400, (seconds % 86400) / 3600)
    }
}
