//! Championship Concierge CLI - drive the companion runtime from a terminal.
//!
//! # Usage
//!
//! ```bash
//! # Which host city contains a point?
//! concierge locate --lat 39.0997 --lon -94.5786
//!
//! # Preview a city's welcome
//! concierge simulate kansasCity
//!
//! # Reconcile the stored subscription with the backend
//! concierge subscription status
//!
//! # Convert 100 USD to MXN
//! concierge convert 100 USD MXN
//! ```
//!
//! # Commands
//!
//! - `locate`, `simulate`, `cities` - Geofence engine
//! - `notifications` - In-app inbox
//! - `subscription` - Entitlement store and route guard
//! - `checkout` - Paid plan checkout
//! - `convert`, `rates` - Currency converter
//! - `leads` - Free bracket downloads and lead export

#![cfg_attr(not(test), forbid(unsafe_code))]

use clap::{Parser, Subcommand};
use concierge_companion::config::CompanionConfig;
use sentry::integrations::tracing as sentry_tracing;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

mod commands;

#[derive(Parser)]
#[command(name = "concierge")]
#[command(author, version, about = "Championship Concierge companion CLI")]
struct Cli {
    /// Emit logs as JSON
    #[arg(long, global = true)]
    json_logs: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Feed one position sample through the geofence engine
    Locate {
        /// Latitude in degrees
        #[arg(long, allow_hyphen_values = true)]
        lat: f64,

        /// Longitude in degrees
        #[arg(long, allow_hyphen_values = true)]
        lon: f64,
    },
    /// Enter a host city without a position sample
    Simulate {
        /// City key, e.g. `kansasCity`
        city: String,
    },
    /// List the host cities and their geofences
    Cities,
    /// Stop location tracking
    StopTracking,
    /// Read the in-app notification inbox
    Notifications {
        #[command(subcommand)]
        action: NotificationAction,
    },
    /// Manage the stored subscription
    Subscription {
        #[command(subcommand)]
        action: SubscriptionAction,
    },
    /// Buy a paid plan
    Checkout {
        #[command(subcommand)]
        action: CheckoutAction,
    },
    /// Convert an amount between currencies
    Convert {
        /// Amount to convert
        amount: String,

        /// Source currency code
        from: String,

        /// Target currency code
        to: String,
    },
    /// Show the current exchange-rate table
    Rates,
    /// Free bracket downloads and captured leads
    Leads {
        #[command(subcommand)]
        action: LeadsAction,
    },
}

#[derive(Subcommand)]
enum NotificationAction {
    /// List stored notifications, newest first
    List,
    /// Mark a notification read
    Read {
        /// Notification id
        id: String,
    },
    /// Delete every notification
    Clear,
}

#[derive(Subcommand)]
enum SubscriptionAction {
    /// Reconcile with the backend and show the result
    Status,
    /// Re-verify the current subscriber
    Verify,
    /// Restore a purchase by email
    Restore {
        /// Email used at checkout
        email: String,
    },
    /// Forget the subscriber on this device
    Clear,
    /// Show whether the subscriber may open a route
    Access {
        /// Route path, e.g. `/cities`
        path: String,
    },
}

#[derive(Subcommand)]
enum CheckoutAction {
    /// Create a checkout session and print the payment URL
    Start {
        /// Tier (`team_info`, `logistics`, `ai_concierge`)
        tier: String,
    },
    /// Record the purchase from a finished checkout session
    Complete {
        /// Session id from the success redirect
        session_id: String,
    },
    /// List the plans on offer
    Plans,
}

#[derive(Subcommand)]
enum LeadsAction {
    /// Claim a free bracket download
    Claim {
        #[arg(short, long)]
        name: String,

        #[arg(short, long)]
        email: String,

        #[arg(short, long)]
        city: String,
    },
    /// List captured leads
    List,
    /// Export captured leads as CSV
    Export {
        /// Output file (stdout when omitted)
        #[arg(short, long)]
        out: Option<std::path::PathBuf>,
    },
}

/// Initialize Sentry error tracking and return guard that must be kept alive.
fn init_sentry(config: &CompanionConfig) -> Option<sentry::ClientInitGuard> {
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

fn init_tracing(json: bool) {
    let env_filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| "concierge_companion=info,concierge_cli=info".into());

    let registry = tracing_subscriber::registry()
        .with(env_filter)
        .with(sentry_tracing::layer().event_filter(sentry_event_filter));

    if json {
        registry
            .with(tracing_subscriber::fmt::layer().json().with_writer(std::io::stderr))
            .init();
    } else {
        registry
            .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
            .init();
    }
}

#[tokio::main]
async fn main() {
    let cli = Cli::parse();

    // Configuration is optional for offline commands such as `cities`
    let config = CompanionConfig::from_env();

    // Initialize Sentry (must be done before tracing subscriber)
    let _sentry_guard = config.as_ref().ok().and_then(init_sentry);
    init_tracing(cli.json_logs);

    if let Err(e) = run(cli.command, config).await {
        tracing::error!("Command failed: {e}");
        std::process::exit(1);
    }
}

async fn run(
    command: Commands,
    config: Result<CompanionConfig, concierge_companion::config::ConfigError>,
) -> Result<(), commands::CommandError> {
    use commands::{checkout, currency, leads, location, subscription};

    match command {
        Commands::Cities => location::cities(),
        Commands::Locate { lat, lon } => location::locate(&commands::load(config)?, lat, lon).await?,
        Commands::Simulate { city } => location::simulate(&commands::load(config)?, &city)?,
        Commands::StopTracking => location::stop(&commands::load(config)?),
        Commands::Notifications { action } => {
            let app = commands::load(config)?;
            match action {
                NotificationAction::List => location::list_notifications(&app),
                NotificationAction::Read { id } => location::mark_read(&app, &id)?,
                NotificationAction::Clear => location::clear_notifications(&app)?,
            }
        }
        Commands::Subscription { action } => {
            let app = commands::load(config)?;
            match action {
                SubscriptionAction::Status => subscription::status(&app).await,
                SubscriptionAction::Verify => subscription::verify(&app).await,
                SubscriptionAction::Restore { email } => {
                    subscription::restore(&app, &email).await?;
                }
                SubscriptionAction::Clear => subscription::clear(&app),
                SubscriptionAction::Access { path } => subscription::access(&app, &path).await,
            }
        }
        Commands::Checkout { action } => {
            let app = commands::load(config)?;
            match action {
                CheckoutAction::Start { tier } => checkout::start(&app, &tier).await?,
                CheckoutAction::Complete { session_id } => {
                    checkout::complete(&app, &session_id).await?;
                }
                CheckoutAction::Plans => checkout::plans(&app),
            }
        }
        Commands::Convert { amount, from, to } => {
            currency::convert(&commands::load(config)?, &amount, &from, &to).await?;
        }
        Commands::Rates => currency::rates(&commands::load(config)?).await?,
        Commands::Leads { action } => {
            let app = commands::load(config)?;
            match action {
                LeadsAction::Claim { name, email, city } => {
                    leads::claim(&app, name, email, city).await?;
                }
                LeadsAction::List => leads::list(&app).await?,
                LeadsAction::Export { out } => leads::export(&app, out.as_deref()).await?,
            }
        }
    }
    Ok(())
}
