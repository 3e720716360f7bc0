use chrono::Utc;
use credit_ledger::{
    bot::{self, BotData},
    config::{database, policy, users},
    core::{account, catalog::EquipmentCatalog, scheduler::AccrualScheduler, service::Ledger},
    errors::{Error, Result},
};
use dotenvy::dotenv;
use std::env;
use tokio::sync::watch;
use tracing::{error, info, warn};
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> Result<()> {
    // 1. Initialize tracing
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    // 2. Load .env file, env vars can also be set externally
    dotenv().ok();

    // 3. Credit policy and account seeds
    let config = policy::load_default_config()
        .inspect_err(|e| error!("Failed to load configuration: {e}"))?;
    info!(
        initial_credit = config.policy.default_initial_credit,
        penalty_per_day = config.policy.penalty_per_day,
        "Credit policy loaded"
    );

    // 4. Database and schema
    let db = database::create_connection()
        .await
        .inspect_err(|e| error!("Failed to connect to database: {e}"))?;
    database::create_tables(&db).await?;
    info!("Database initialized successfully.");

    // 5. Seed configured accounts
    let seeded = account::seed_accounts(&db, &config, Utc::now()).await?;
    if seeded > 0 {
        info!("Seeded {seeded} account(s) from config");
    }

    let admins = users::get_admin_ids();
    if admins.is_empty() {
        warn!("LEDGER_ADMIN_IDS is empty, admin commands are disabled");
    }

    let catalog = EquipmentCatalog::new(config.equipment);
    if catalog.is_empty() {
        warn!("No [[equipment]] configured, /borrow has nothing to lend");
    } else {
        info!("Loaded {} equipment item(s)", catalog.items().len());
    }

    let ledger = Ledger::new(db, config.policy);

    // 6. Accrual scheduler
    let (shutdown_tx, shutdown_rx) = watch::channel(false);
    let scheduler = AccrualScheduler::from_policy(ledger.clone());
    let scheduler_handle = tokio::spawn(async move { scheduler.run(shutdown_rx).await });

    // 7. Run the bot
    let token = env::var("DISCORD_BOT_TOKEN")
        .inspect_err(|e| error!("DISCORD_BOT_TOKEN not found: {e}"))
        .map_err(Error::EnvVar)?;
    let result = bot::run_bot(token, BotData::new(ledger, admins, catalog)).await;

    shutdown_tx.send(true).ok();
    if let Err(e) = scheduler_handle.await {
        error!("Accrual scheduler task failed: {e}");
    }
    result
}
