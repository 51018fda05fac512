use std::sync::Arc;

use anyhow::Result;
use clap::{Parser, Subcommand};
use colored::Colorize;
use tracing::{info, warn};

use gigglechat::chat::{Draft, MessageStore, Messenger, Scope, SqliteMessageStore, Timeline};
use gigglechat::config::Config;
use gigglechat::moderation::credentials::EnvCredentials;
use gigglechat::moderation::gemini::GeminiScorer;
use gigglechat::moderation::ModerationGate;

/// GiggleChat: chat with a moderation gate in front of every message.
///
/// Outgoing text is checked against a local denylist, then scored by a
/// remote model, before it is stored as sent, masked, or blocked.
#[derive(Parser)]
#[command(name = "gigglechat", version, about)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Initialize the message database
    Init,

    /// Run a text through the moderation gate without sending it
    Check {
        /// The text to evaluate
        text: String,
    },

    /// Send a message to the global channel or to one user
    Send {
        /// Sender user id
        #[arg(long)]
        from: String,

        /// Recipient user id (omit for the global channel)
        #[arg(long)]
        to: Option<String>,

        /// Attach an image URL or data URI
        #[arg(long)]
        image: Option<String>,

        /// Message text
        text: String,
    },

    /// Show recent messages
    History {
        /// Whose view to show
        #[arg(long = "as")]
        viewer: String,

        /// Show the direct conversation with this user instead of the global channel
        #[arg(long = "with")]
        peer: Option<String>,

        /// Number of messages (default: 50)
        #[arg(long, default_value = "50")]
        limit: u32,
    },

    /// Show system status (DB stats, moderation settings)
    Status,
}

#[tokio::main]
async fn main() -> Result<()> {
    // Load .env file if present (silently ignore if missing)
    let _ = dotenvy::dotenv();

    // Set up structured logging
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("gigglechat=info")),
        )
        .init();

    let cli = Cli::parse();
    let config = Config::load()?;

    match cli.command {
        Commands::Init => {
            info!("Initializing GiggleChat database...");
            let store = SqliteMessageStore::initialize(&config.db_path)?;
            let table_count = store.table_count().await?;
            println!("Database initialized at: {}", config.db_path);
            println!("Tables created: {table_count}");
            println!("\nNext step: set GEMINI_API_KEY in your .env file");
            println!("Then run: gigglechat check \"hello there\"");
        }

        Commands::Check { text } => {
            warn_if_no_scorer(&config);
            let gate = build_gate(&config)?;
            let verdict = gate.evaluate(&text).await;
            gigglechat::output::terminal::display_verdict(&verdict);
        }

        Commands::Send {
            from,
            to,
            image,
            text,
        } => {
            warn_if_no_scorer(&config);
            let store: Arc<dyn MessageStore> =
                Arc::new(SqliteMessageStore::open(&config.db_path)?);
            let gate = build_gate(&config)?;

            let scope = match to {
                Some(peer) => Scope::direct(from.clone(), peer),
                None => Scope::Global,
            };
            let mut timeline = Timeline::new(scope);
            let messenger = Messenger::new(gate, store, config.admission, from);

            let mut draft = Draft::text(text);
            if let Some(image) = image {
                draft = draft.with_image(image);
            }

            let outcome = messenger.send(&mut timeline, draft).await?;
            gigglechat::output::terminal::display_send_outcome(&outcome);
        }

        Commands::History {
            viewer,
            peer,
            limit,
        } => {
            let store = SqliteMessageStore::open(&config.db_path)?;
            let (scope, title) = match peer {
                Some(peer) => {
                    let title = format!("Direct with {peer}");
                    (Scope::direct(viewer.clone(), peer), title)
                }
                None => (Scope::Global, "Global channel".to_string()),
            };
            let messages = store.history(&scope, limit).await?;
            gigglechat::output::terminal::display_history(&messages, &viewer, &title);
        }

        Commands::Status => {
            let store = if gigglechat::status::database_exists(&config) {
                Some(SqliteMessageStore::open(&config.db_path)?)
            } else {
                None
            };
            gigglechat::status::show(store.as_ref().map(|s| s as &dyn MessageStore), &config)
                .await?;
        }
    }

    Ok(())
}

/// Build the moderation gate from configuration.
fn build_gate(config: &Config) -> Result<Arc<ModerationGate>> {
    let scorer = GeminiScorer::new(
        &config.api_url,
        &config.analyzer_model,
        Arc::new(EnvCredentials::default()),
        config.request_timeout(),
    )?;
    let gate = ModerationGate::new(Arc::new(scorer))
        .with_thresholds(config.thresholds)
        .with_scan_timeout(config.scan_timeout);
    Ok(Arc::new(gate))
}

/// The gate still works without a key (local filter + fail-open), so this
/// only warns.
fn warn_if_no_scorer(config: &Config) {
    if let Err(e) = config.require_scorer() {
        warn!(error = %e, "Remote scorer not configured");
        println!("{} {}", "Warning:".yellow(), e);
    }
}
