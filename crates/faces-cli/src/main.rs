//! Faces CLI - a command-line storefront client.
//!
//! Logs in through a social-login token, shows the recommended product and
//! buys it through the two-phase order flow.
//!
//! # Usage
//!
//! ```bash
//! # Exchange a Facebook access token for a session
//! faces login --facebook-token <token>
//!
//! # Show the recommendation and download its pictures
//! faces recommend --images
//!
//! # Buy the recommended product
//! faces buy --yes
//! ```

use std::io::{self, BufRead, Write};
use std::sync::Arc;

use anyhow::{bail, Context, Result};
use clap::{Parser, Subcommand};
use faces_core::api::ApiErrorKind;
use faces_core::auth::{
    CredentialStore, FederatedProvider, InMemoryFederatedSession, KeyringCredentialStore,
    MemoryCredentialStore, SessionStore,
};
use faces_core::payment::{checkout, PaymentOutcome, PaymentRequest};
use faces_core::utils::{format_optional, format_price, truncate_string};
use faces_core::{ApiError, Config, StorefrontClient};
use tracing::{info, warn};
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

/// Longest product description printed by `recommend`
const MAX_DESCRIPTION_DISPLAY_LEN: usize = 200;

#[derive(Parser)]
#[command(name = "faces")]
#[command(about = "Storefront client for Faces - login, recommendations, checkout")]
#[command(version)]
struct Cli {
    /// Enable debug logging (overrides RUST_LOG)
    #[arg(short, long, global = true)]
    verbose: bool,

    /// API root, e.g. http://localhost:8000/api
    #[arg(long, global = true, env = "FACES_API_URL")]
    api_url: Option<String>,

    /// Keep the session token in memory instead of the OS keychain
    #[arg(long, global = true)]
    ephemeral: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Log in with a social-login access token
    Login {
        /// Facebook access token
        #[arg(long, env = "FACES_FACEBOOK_TOKEN")]
        facebook_token: String,
    },

    /// Show the logged-in user
    Whoami,

    /// Show the product recommended for the logged-in user
    Recommend {
        /// Also download every product picture
        #[arg(long)]
        images: bool,
    },

    /// Buy the recommended product
    Buy {
        /// Confirm the payment without prompting
        #[arg(short, long)]
        yes: bool,
    },

    /// Complete an order whose completion failed earlier
    CompleteOrder {
        /// Id of the pending order
        order_id: i64,
    },

    /// Forget the session token and end the social-login session
    Logout,
}

/// Initialize the tracing subscriber for logging
fn init_tracing(verbose: bool) {
    // Use RUST_LOG env var to control log level (e.g., RUST_LOG=debug)
    let filter = if verbose {
        EnvFilter::new("debug")
    } else {
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn"))
    };

    tracing_subscriber::registry()
        .with(fmt::layer().with_writer(io::stderr))
        .with(filter)
        .init();
}

#[tokio::main]
async fn main() -> Result<()> {
    // Load .env file if present (silently ignore if not found)
    let _ = dotenvy::dotenv();

    let cli = Cli::parse();
    init_tracing(cli.verbose);

    let mut config = match Config::load() {
        Ok(c) => c,
        Err(e) => {
            warn!(error = %e, "Failed to load config, using defaults");
            Config::default()
        }
    };
    if let Some(url) = cli.api_url.clone() {
        config.api_url = Some(url);
    }

    let credentials: Arc<dyn CredentialStore> = if cli.ephemeral {
        Arc::new(MemoryCredentialStore::new())
    } else {
        Arc::new(KeyringCredentialStore::new(config.keyring_service()))
    };
    let session = Arc::new(SessionStore::initialize(
        credentials,
        Arc::new(InMemoryFederatedSession::new()),
    ));
    let client = StorefrontClient::new(config.client_config(), Arc::clone(&session))
        .context("Failed to create API client")?;

    // A rejected token ends the session; the next command has to log in again
    let observed_session = Arc::clone(&session);
    client.register_error_observer(Arc::new(move |kind: ApiErrorKind| {
        if kind == ApiErrorKind::Unauthenticated {
            warn!("Session rejected by the server, logging out");
            if let Err(e) = observed_session.log_out() {
                warn!(error = %e, "Failed to clear stored session");
            }
        }
    }));

    info!(api_url = config.api_url(), "Faces CLI starting");

    match cli.command {
        Commands::Login { facebook_token } => login(&client, &mut config, &facebook_token).await,
        Commands::Whoami => whoami(&client).await,
        Commands::Recommend { images } => recommend(&client, &config, images).await,
        Commands::Buy { yes } => buy(&client, &config, yes).await,
        Commands::CompleteOrder { order_id } => complete_order(&client, order_id).await,
        Commands::Logout => {
            client.log_out().context("Failed to clear stored session")?;
            println!("Logged out.");
            Ok(())
        }
    }
}

/// Turn precondition failures into instructions for the user
fn explain(e: ApiError) -> anyhow::Error {
    match e {
        ApiError::MissingToken | ApiError::Unauthorized => {
            anyhow::anyhow!("{}\nRun `faces login --facebook-token <token>` first.", e)
        }
        other => other.into(),
    }
}

async fn login(client: &StorefrontClient, config: &mut Config, facebook_token: &str) -> Result<()> {
    let user = client
        .authenticate_with_federated_token(FederatedProvider::Facebook, facebook_token)
        .await
        .map_err(explain)?;

    config.last_user_name = Some(user.display_name());
    if let Err(e) = config.save() {
        warn!(error = %e, "Failed to save config");
    }

    println!("Hi {}!", user.display_name());
    Ok(())
}

async fn whoami(client: &StorefrontClient) -> Result<()> {
    let user = client.fetch_current_user().await.map_err(explain)?;
    println!("Hi {}!", user.display_name());
    println!("  id:     {}", user.id);
    println!("  avatar: {}", format_optional(&user.avatar, "-"));
    Ok(())
}

async fn recommend(client: &StorefrontClient, config: &Config, download_images: bool) -> Result<()> {
    client.fetch_current_user().await.map_err(explain)?;
    let product = client
        .fetch_recommendation_for_current_user()
        .await
        .map_err(explain)?;

    println!("{}", product.name);
    println!("  price:  {}", format_price(product.price, config.currency_code()));
    println!(
        "  about:  {}",
        truncate_string(&product.description, MAX_DESCRIPTION_DISPLAY_LEN)
    );
    for image in &product.images {
        println!("  image:  {}", image.url());
    }

    if download_images && !product.images.is_empty() {
        let (tx, rx) = tokio::sync::oneshot::channel();
        client.prefetch_images(&product, move || {
            let _ = tx.send(());
        });
        rx.await.context("Image download was interrupted")?;

        let cache = client.images().cache();
        let fetched = product.images.iter().filter(|i| cache.contains(i)).count();
        println!("Downloaded {}/{} images.", fetched, product.images.len());
    }

    Ok(())
}

fn confirm_payment(request: &PaymentRequest) -> Result<bool> {
    print!(
        "Pay {} for \"{}\"? [y/N] ",
        format_price(request.amount, &request.currency_code),
        request.short_description
    );
    io::stdout().flush()?;

    let mut answer = String::new();
    io::stdin().lock().read_line(&mut answer)?;
    Ok(matches!(answer.trim(), "y" | "Y" | "yes"))
}

async fn buy(client: &StorefrontClient, config: &Config, yes: bool) -> Result<()> {
    client.fetch_current_user().await.map_err(explain)?;
    let product = client
        .fetch_recommendation_for_current_user()
        .await
        .map_err(explain)?;

    let request = PaymentRequest::for_product(&product, config.currency_code());
    if !request.is_processable() {
        bail!(
            "\"{}\" cannot be paid for ({} {})",
            product.name,
            request.amount,
            request.currency_code
        );
    }

    let outcome = if yes || confirm_payment(&request)? {
        PaymentOutcome::Completed { confirmation: None }
    } else {
        PaymentOutcome::Cancelled
    };

    match checkout(client, &product, outcome).await {
        Ok(Some(receipt)) => {
            println!(
                "Order {} completed at {}.",
                receipt.order_id,
                receipt.completed_at.format("%Y-%m-%d %H:%M:%S UTC")
            );
            Ok(())
        }
        Ok(None) => {
            println!("Payment cancelled, no order placed.");
            Ok(())
        }
        Err(e) => match e.pending_order_id() {
            Some(order_id) => bail!(
                "{}\nRetry with `faces complete-order {}`.",
                e,
                order_id
            ),
            None => Err(explain(e)),
        },
    }
}

async fn complete_order(client: &StorefrontClient, order_id: i64) -> Result<()> {
    client.complete_order(order_id).await.map_err(explain)?;
    println!("Order {} completed.", order_id);
    Ok(())
}
