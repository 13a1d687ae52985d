//! Am-Botanics CLI - drive the storefront shell from a terminal.
//!
//! # Usage
//!
//! ```bash
//! # Log in (password from -p or AB_PASSWORD)
//! ab-cli login -e owner@ambotanics.pk
//!
//! # Show who the stored token belongs to
//! ab-cli whoami
//!
//! # Render a route to stdout
//! ab-cli visit /admin/orders
//!
//! # List routes
//! ab-cli routes
//!
//! # Forget the stored token
//! ab-cli logout
//! ```
//!
//! Tokens are kept in `AB_TOKEN_STORE_PATH` (default `.am-botanics/tokens.json`).
//! Logs go to stderr; rendered HTML and command results go to stdout.

#![cfg_attr(not(test), forbid(unsafe_code))]

use std::sync::Arc;

use am_botanics_client::FileTokenStore;
use am_botanics_storefront::{History, Shell, StorefrontConfig};
use clap::{Parser, Subcommand};
use sentry::integrations::tracing as sentry_tracing;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

mod commands;

#[derive(Parser)]
#[command(name = "ab-cli")]
#[command(author, version, about = "Am-Botanics storefront shell")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Log in and store the session token
    Login {
        /// Account email address
        #[arg(short, long)]
        email: String,

        /// Account password
        #[arg(short, long, env = "AB_PASSWORD", hide_env_values = true)]
        password: String,
    },
    /// Forget the stored session token
    Logout,
    /// Rehydrate the stored session and print it
    Whoami,
    /// Render a route, or print where the gate redirects
    Visit {
        /// Path to render, e.g. `/product/42`
        path: String,
    },
    /// Print the route table
    Routes,
}

/// Initialize Sentry error tracking and return guard that must be kept alive.
fn init_sentry(config: &StorefrontConfig) -> Option<sentry::ClientInitGuard> {
    let dsn = config.sentry_dsn.as_ref()?;

    let guard = sentry::init((
        dsn.as_str(),
        sentry::ClientOptions {
            release: sentry::release_name!(),
            environment: config
                .sentry_environment
                .clone()
                .map(std::borrow::Cow::Owned),
            attach_stacktrace: true,
            ..Default::default()
        },
    ));

    tracing::info!("Sentry initialized");
    Some(guard)
}

/// Filter tracing events to Sentry event types.
fn sentry_event_filter(metadata: &tracing::Metadata<'_>) -> sentry_tracing::EventFilter {
    match *metadata.level() {
        tracing::Level::ERROR | tracing::Level::WARN => sentry_tracing::EventFilter::Event,
        tracing::Level::INFO | tracing::Level::DEBUG => sentry_tracing::EventFilter::Breadcrumb,
        _ => sentry_tracing::EventFilter::Ignore,
    }
}

fn init_tracing() {
    let env_filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| "am_botanics_storefront=info,am_botanics_client=info".into());

    tracing_subscriber::registry()
        .with(env_filter)
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .with(sentry_tracing::layer().event_filter(sentry_event_filter))
        .init();
}

#[tokio::main]
async fn main() {
    let cli = Cli::parse();

    let config = match StorefrontConfig::from_env() {
        Ok(config) => config,
        Err(e) => {
            init_tracing();
            tracing::error!("Failed to load configuration: {e}");
            std::process::exit(1);
        }
    };

    // Initialize Sentry (must be done before tracing subscriber)
    let _sentry_guard = init_sentry(&config);
    init_tracing();

    if let Err(e) = run(cli, config).await {
        tracing::error!("Command failed: {e}");
        std::process::exit(1);
    }
}

async fn run(cli: Cli, config: StorefrontConfig) -> Result<(), commands::CommandError> {
    if let Commands::Routes = cli.command {
        commands::pages::routes();
        return Ok(());
    }

    let tokens = Arc::new(FileTokenStore::new(&config.token_store_path));
    tracing::debug!(path = %tokens.path().display(), "Using token store");
    let shell = Shell::new(config, tokens, Arc::new(History::new()))?;

    match cli.command {
        Commands::Login { email, password } => {
            commands::session::login(&shell, &email, password).await?;
        }
        Commands::Logout => commands::session::logout(&shell),
        Commands::Whoami => commands::session::whoami(&shell).await,
        Commands::Visit { path } => commands::pages::visit(&shell, &path).await?,
        Commands::Routes => commands::pages::routes(),
    }
    Ok(())
}
