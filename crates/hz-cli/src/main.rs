use anyhow::{bail, Context, Result};
use chrono::NaiveDate;
use chrono_tz::Tz;
use clap::{Parser, Subcommand};
use hz_config::{load_hort_config, load_layered_yaml, secrets::resolve_secrets};
use hz_daemon::state::build_gate;
use hz_week::{current_week_in, format_week_label, week_of};
use tracing::debug;

#[derive(Parser)]
#[command(name = "hz")]
#[command(about = "Hortzettel CLI", long_about = None)]
struct Cli {
    #[command(subcommand)]
    cmd: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Print the ISO week of a date (today when omitted)
    Week {
        /// YYYY-MM-DD
        #[arg(long)]
        date: Option<String>,

        /// IANA zone used for "today"
        #[arg(long, default_value = "Europe/Berlin")]
        tz: String,
    },

    /// Print the display label for a week
    Label {
        #[arg(long)]
        week: u32,

        #[arg(long)]
        year: i32,
    },

    /// Build the editing gate from config and run one check
    Check {
        /// Layered config paths in merge order
        #[arg(long = "config", required = true)]
        config_paths: Vec<String>,
    },

    /// Compute layered config hash + print canonical JSON
    ConfigHash {
        /// Paths in merge order (base -> env -> local...)
        #[arg(required = true)]
        paths: Vec<String>,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    let _ = dotenvy::from_filename(".env.local");
    init_tracing();

    let cli = Cli::parse();

    match cli.cmd {
        Commands::Week { date, tz } => {
            let id = match date {
                Some(raw) => {
                    let d = NaiveDate::parse_from_str(&raw, "%Y-%m-%d")
                        .with_context(|| format!("invalid --date '{raw}': expected YYYY-MM-DD"))?;
                    week_of(d)
                }
                None => {
                    let tz: Tz = tz
                        .parse()
                        .map_err(|_| anyhow::anyhow!("unknown timezone '{tz}'"))?;
                    current_week_in(tz)
                }
            };
            println!("week_number={} year={}", id.week_number, id.year);
            println!("label={}", id.label());
            if let (Some(mon), Some(fri)) = (id.monday(), id.friday()) {
                println!("monday={mon} friday={fri}");
            }
        }

        Commands::Label { week, year } => {
            if !(1..=53).contains(&week) {
                bail!("--week must be within 1..=53, got {week}");
            }
            println!("{}", format_week_label(week, year));
        }

        Commands::Check { config_paths } => {
            debug!(paths = ?config_paths, "loading config");
            let path_refs: Vec<&str> = config_paths.iter().map(|s| s.as_str()).collect();
            let (loaded, cfg) = load_hort_config(&path_refs)?;
            let secrets = resolve_secrets(&cfg)?;
            let (gate, _store) = build_gate(&cfg, &secrets)?;

            let check = gate.check().await;
            println!("config_hash={}", loaded.config_hash);
            println!(
                "editing={}",
                if check.allowed { "allowed" } else { "blocked" }
            );
            println!(
                "origin={}",
                serde_json::to_value(check.resolved.origin)?
                    .as_str()
                    .unwrap_or_default()
            );
            println!("week={}", gate.current_week());
            println!("message={}", check.status);
        }

        Commands::ConfigHash { paths } => {
            let path_refs: Vec<&str> = paths.iter().map(|s| s.as_str()).collect();
            let loaded = load_layered_yaml(&path_refs)?;
            println!("config_hash={}", loaded.config_hash);
            println!("{}", loaded.canonical_json);
        }
    }

    Ok(())
}

/// Logs go to stderr; stdout carries command output only.
fn init_tracing() {
    tracing_subscriber::fmt()
        .with_writer(std::io::stderr)
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env().unwrap_or_else(|_| "warn".into()),
        )
        .init();
}
