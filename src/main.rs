use std::sync::Arc;

use axum::Router;
use clap::Parser;
use tower_http::trace::TraceLayer;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use zeropay::config::Config;
use zeropay::db::{create_pool, init_audit_db, init_db, queries, AppState};
use zeropay::handlers;
use zeropay::models::{CreateMerchant, CreatePayment, PaymentMethod, WebhookEventType};
use zeropay::notify::{EmailService, WebhookNotifier};
use zeropay::payment::SettlementPolicy;

#[derive(Parser, Debug)]
#[command(name = "zeropay")]
#[command(about = "Mock payment gateway with disputes, refunds, and webhook fan-out")]
struct Cli {
    /// Seed the database with dev data (merchant, webhook, sample transaction)
    #[arg(long)]
    seed: bool,

    /// Delete databases on exit (dev mode only, useful for fresh starts)
    #[arg(long)]
    ephemeral: bool,
}

/// Seeds the database with dev data for testing.
/// Creates a merchant (keys printed once), a webhook registration, and one
/// pending sample transaction. Only runs in dev mode on an empty database.
fn seed_dev_data(state: &AppState) {
    let conn = state.db.get().expect("Failed to get db connection for seeding");

    let count: i64 = conn
        .query_row("SELECT COUNT(*) FROM merchants", [], |row| row.get(0))
        .expect("Failed to count merchants");
    if count > 0 {
        tracing::info!("Database already has data, skipping seed");
        return;
    }

    tracing::info!("============================================");
    tracing::info!("SEEDING DEV DATA");
    tracing::info!("============================================");

    let merchant = queries::create_merchant(
        &conn,
        &CreateMerchant {
            name: "Dev Merchant".to_string(),
            email: "dev@zeropay.local".to_string(),
        },
    )
    .expect("Failed to create dev merchant");

    tracing::info!("Merchant: {} ({})", merchant.name, merchant.email);
    tracing::info!("Public Key: {}", merchant.public_key);
    tracing::info!("Secret Key: {}", merchant.secret_key);
    tracing::info!("");

    let webhook = queries::create_webhook(
        &conn,
        &merchant.id,
        &zeropay::models::CreateWebhook {
            url: "http://localhost:4000/webhook".to_string(),
            events: vec![
                WebhookEventType::PaymentSuccess,
                WebhookEventType::PaymentFailed,
                WebhookEventType::PaymentRefunded,
            ],
        },
    )
    .expect("Failed to create dev webhook");

    tracing::info!("Webhook: {} -> {}", webhook.id, webhook.url);
    tracing::info!("Webhook Secret: {}", webhook.secret);
    tracing::info!("");

    let transaction = queries::create_transaction(
        &conn,
        &merchant,
        &CreatePayment {
            amount: 100_000,
            method: PaymentMethod::Upi,
            customer_email: "customer@example.com".to_string(),
            currency: None,
        },
    )
    .expect("Failed to create dev transaction");

    tracing::info!("Sample Order: {} (pending)", transaction.order_id);

    tracing::info!("============================================");
    tracing::info!("DEV DATA SEEDED SUCCESSFULLY");
    tracing::info!("============================================");

    // Copy-paste friendly output (no log formatting)
    println!();
    println!("--- COPY FROM HERE ---");
    println!("  merchant_secret_key: {}", merchant.secret_key);
    println!("  merchant_public_key: {}", merchant.public_key);
    println!("  webhook_secret: {}", webhook.secret);
    println!("  sample_order_id: {}", transaction.order_id);
    println!("--- END COPY ---");
    println!();
}

#[tokio::main]
async fn main() {
    let cli = Cli::parse();

    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "zeropay=debug,tower_http=debug".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    let config = Config::from_env();

    if config.dev_mode {
        tracing::info!("Running in DEVELOPMENT mode");
    }

    let db_pool = create_pool(&config.database_path).expect("Failed to create database pool");
    let audit_pool =
        create_pool(&config.audit_database_path).expect("Failed to create audit database pool");

    {
        let conn = db_pool.get().expect("Failed to get connection");
        init_db(&conn).expect("Failed to initialize database");
    }
    {
        let conn = audit_pool.get().expect("Failed to get audit connection");
        init_audit_db(&conn).expect("Failed to initialize audit database");
    }

    // Without ADMIN_TOKEN the admin surface would be unreachable; generate
    // one for this process and print it once.
    let admin_token = config.admin_token.clone().unwrap_or_else(|| {
        let token = format!("admin_{}", uuid::Uuid::new_v4().as_simple());
        tracing::warn!("ADMIN_TOKEN not set; generated for this run: {}", token);
        token
    });

    let state = AppState {
        db: db_pool,
        audit: audit_pool,
        webhooks: WebhookNotifier::spawn(),
        email: Arc::new(EmailService::new(
            config.resend_api_key.clone(),
            config.email_from.clone(),
        )),
        settlement: SettlementPolicy::Bernoulli {
            success_rate: config.settlement_success_rate,
        },
        audit_log_enabled: config.audit_log_enabled,
        admin_token,
        admin_email: config.admin_email.clone(),
    };

    if cli.seed {
        if !config.dev_mode {
            tracing::warn!("--seed flag ignored: not in dev mode (set ZEROPAY_ENV=dev)");
        } else {
            seed_dev_data(&state);
        }
    }

    let app = Router::new()
        // Checkout endpoints (no auth)
        .merge(handlers::public::router())
        // Merchant API (secret key auth)
        .merge(handlers::merchant::router(state.clone()))
        // Admin surface (admin token auth)
        .merge(handlers::admin::router(state.clone()))
        .layer(TraceLayer::new_for_http())
        .with_state(state);

    let addr = config.addr();
    let listener = tokio::net::TcpListener::bind(&addr)
        .await
        .expect("Failed to bind to address");

    let cleanup_on_exit = cli.ephemeral && config.dev_mode;
    let db_path = config.database_path.clone();
    let audit_path = config.audit_database_path.clone();

    if cleanup_on_exit {
        tracing::info!("EPHEMERAL MODE: databases will be deleted on exit");
    }

    tracing::info!("ZeroPay server listening on {}", addr);

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .expect("Failed to start server");

    if cleanup_on_exit {
        tracing::info!("Cleaning up ephemeral databases...");
        for path in [&db_path, &audit_path] {
            if let Err(e) = std::fs::remove_file(path) {
                tracing::warn!("Failed to remove {}: {}", path, e);
            } else {
                tracing::info!("Removed {}", path);
            }
            // Also remove WAL and SHM files if they exist
            let _ = std::fs::remove_file(format!("{}-wal", path));
            let _ = std::fs::remove_file(format!("{}-shm", path));
        }
        tracing::info!("Ephemeral cleanup complete");
    }
}

async fn shutdown_signal() {
    tokio::signal::ctrl_c()
        .await
        .expect("Failed to install Ctrl+C handler");
    tracing::info!("Shutdown signal received, stopping server...");
}
