//! Rapport - Per-Contact Conversation Intelligence
//!
//! Command-line front end for replaying message streams through the engine
//! and inspecting the persisted per-contact profiles.

use anyhow::Context as _;
use chrono::Utc;
use clap::{Parser, Subcommand};
use rapport_core::{
    ClassificationResult, ConfidenceScorer, ContextAssembler, JsonFileStore, Message,
    ProfileStore, RapportConfig, RapportError, RelationshipProfile, RelationshipTracker,
    ResponseContext, StyleProfile, Timeframe, USER_STYLE_KEY,
};
use std::fs::File;
use std::io::{BufRead, BufReader};
use std::path::{Path, PathBuf};
use tracing::{debug, info, warn, Level};
use tracing_subscriber::EnvFilter;

/// Get the default profile store path using XDG_DATA_HOME standard
fn get_default_store_path() -> PathBuf {
    dirs::data_local_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join("rapport")
        .join("profiles")
}

#[derive(Parser)]
#[command(name = "rapport")]
#[command(about = "Per-contact message scoring and relationship tracking", long_about = None)]
#[command(version)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Set log level
    #[arg(short, long, default_value = "info")]
    log_level: String,

    /// Configuration file (TOML)
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Profile store directory
    #[arg(long, env = "RAPPORT_STORE")]
    store: Option<PathBuf>,
}

#[derive(Subcommand)]
enum Commands {
    /// Run a JSON-lines file of messages through the pipeline
    Replay {
        /// File with one JSON message per line
        file: PathBuf,

        /// Print the assembled context for every message
        #[arg(long)]
        contexts: bool,

        /// Print a per-contact digest afterwards (hourly, daily, weekly)
        #[arg(long)]
        digest: Option<Timeframe>,

        /// Do not write profiles back to the store
        #[arg(long)]
        dry_run: bool,
    },

    /// Show the stored relationship summary for a contact
    Summary {
        /// Contact identifier
        contact: String,

        /// Re-derive time-dependent metrics as of now
        #[arg(long)]
        refresh: bool,
    },

    /// List stored contacts with their status and score
    Contacts,

    /// Score a candidate response against a contact's stored profile
    Score {
        /// Contact identifier
        contact: String,

        /// Candidate response text
        text: String,
    },
}

fn load_config(path: Option<&Path>) -> anyhow::Result<RapportConfig> {
    match path {
        Some(path) => RapportConfig::from_file(path)
            .with_context(|| format!("failed to load config from {}", path.display())),
        None => Ok(RapportConfig::default()),
    }
}

fn replay(
    assembler: &ContextAssembler,
    store: &JsonFileStore,
    file: &Path,
    contexts: bool,
    digest: Option<Timeframe>,
    dry_run: bool,
) -> anyhow::Result<()> {
    assembler.restore(store)?;

    let reader = BufReader::new(
        File::open(file).with_context(|| format!("failed to open {}", file.display()))?,
    );

    let mut processed = 0usize;
    let mut skipped = 0usize;
    let mut latest = None;
    for (index, line) in reader.lines().enumerate() {
        let line = line?;
        if line.trim().is_empty() {
            continue;
        }
        let message: Message = match serde_json::from_str(&line) {
            Ok(message) => message,
            Err(e) => {
                warn!("Skipping line {}: {}", index + 1, e);
                skipped += 1;
                continue;
            }
        };

        let context = assembler.process_message(&message);
        if contexts {
            println!("{}", serde_json::to_string(&context)?);
        }
        latest = latest.max(Some(message.timestamp));
        processed += 1;
    }

    info!("Replayed {} messages ({} skipped)", processed, skipped);

    if let (Some(timeframe), Some(now)) = (digest, latest) {
        for contact in assembler.relationships().contacts() {
            let summary = assembler.message_log().summarize(&contact, timeframe, now);
            println!(
                "{}",
                serde_json::to_string(&serde_json::json!({
                    "contact": contact,
                    "summary": summary,
                }))?
            );
        }
    }

    if dry_run {
        debug!("Dry run, leaving store untouched");
    } else {
        assembler.persist(store)?;
    }
    Ok(())
}

fn stored_relationship(
    store: &JsonFileStore,
    contact: &str,
) -> anyhow::Result<RelationshipProfile> {
    let record = store
        .load_relationship(contact)?
        .ok_or_else(|| RapportError::ProfileNotFound(contact.to_string()))?;
    Ok(RelationshipProfile::try_from(record)?)
}

fn stored_style(store: &JsonFileStore, author: &str) -> anyhow::Result<Option<StyleProfile>> {
    store
        .load_style(author)?
        .map(StyleProfile::try_from)
        .transpose()
        .map_err(Into::into)
}

fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    // Initialize tracing
    let level = match cli.log_level.as_str() {
        "trace" => Level::TRACE,
        "debug" => Level::DEBUG,
        "info" => Level::INFO,
        "warn" => Level::WARN,
        "error" => Level::ERROR,
        _ => Level::INFO,
    };

    let filter = EnvFilter::new(format!(
        "rapport={level},rapport_core={level}",
        level = level.as_str().to_lowercase()
    ));

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_writer(std::io::stderr) // Write logs to stderr, not stdout
        .init();

    debug!("Rapport v{} starting...", env!("CARGO_PKG_VERSION"));

    let config = load_config(cli.config.as_deref())?;
    let store_path = cli.store.unwrap_or_else(get_default_store_path);
    let store = JsonFileStore::open(&store_path)
        .with_context(|| format!("failed to open store at {}", store_path.display()))?;
    debug!("Using profile store at {}", store_path.display());

    match cli.command {
        Commands::Replay {
            file,
            contexts,
            digest,
            dry_run,
        } => {
            let assembler = ContextAssembler::new(config);
            replay(&assembler, &store, &file, contexts, digest, dry_run)
        }
        Commands::Summary { contact, refresh } => {
            let tracker = RelationshipTracker::new(config.relationship);
            tracker.restore(&contact, stored_relationship(&store, &contact)?);
            if refresh {
                tracker.refresh(&contact, Utc::now());
            }
            let summary = tracker.summary(&contact).unwrap_or_default();
            println!("{}", serde_json::to_string_pretty(&summary)?);
            Ok(())
        }
        Commands::Contacts => {
            for contact in store.relationship_ids()? {
                match stored_relationship(&store, &contact) {
                    Ok(profile) => println!(
                        "{}\t{}\t{:.2}",
                        contact, profile.status, profile.relationship_score
                    ),
                    Err(e) => warn!("Skipping {}: {}", contact, e),
                }
            }
            Ok(())
        }
        Commands::Score { contact, text } => {
            let relationship = stored_relationship(&store, &contact)?;
            let context = ResponseContext {
                message_id: String::new(),
                contact_id: contact.clone(),
                classification: ClassificationResult::neutral(),
                relationship: relationship.summary(),
                contact_style: stored_style(&store, &contact)?.unwrap_or_default(),
                user_style: stored_style(&store, USER_STYLE_KEY)?,
                topics: Vec::new(),
                confidence: None,
            };

            let score = ConfidenceScorer::new(config.confidence).score(&text, &context);
            println!("{}", serde_json::to_string_pretty(&score)?);
            Ok(())
        }
    }
}
