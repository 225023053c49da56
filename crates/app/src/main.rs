use std::sync::Arc;
use std::time::Duration;

use migration::{Migrator, MigratorTrait};

mod settings;

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error + Send + Sync>> {
    let settings = settings::Settings::new()?;

    tracing_subscriber::fmt()
        .with_env_filter(format!(
            "lunas={level},server={level},engine={level},connectors={level}",
            level = settings.app.level
        ))
        .init();

    let db = parse_database(&settings.database).await?;

    let gateway = connectors::InvoiceApiClient::new(
        &settings.gateway.base_url,
        &settings.gateway.api_key,
    )?;
    let mail = Arc::new(connectors::MailApiClient::new(
        &settings.mail.base_url,
        &settings.mail.api_key,
    )?);

    let mut reconcile = engine::ReconcileConfig::default();
    if let Some(overrides) = &settings.reconcile {
        if let Some(minutes) = overrides.min_age_minutes {
            reconcile.min_age_minutes = minutes;
        }
        if let Some(days) = overrides.max_age_days {
            reconcile.max_age_days = days;
        }
        if let Some(limit) = overrides.batch_limit {
            reconcile.batch_limit = limit;
        }
        if let Some(secs) = overrides.gateway_timeout_secs {
            reconcile.gateway_timeout = Duration::from_secs(secs);
        }
    }

    let recipients = settings
        .revenue
        .as_ref()
        .map(|revenue| engine::RevenueRecipients {
            admin_user_id: revenue.admin_user_id.clone(),
            founder_user_id: revenue.founder_user_id.clone(),
            cofounder_user_id: revenue.cofounder_user_id.clone(),
        })
        .unwrap_or_default();

    let engine = engine::Engine::builder()
        .database(db)
        .gateway(Arc::new(gateway))
        .mailing(mail.clone())
        .notifier(mail)
        .recipients(recipients)
        .reconcile(reconcile)
        .build()?;

    let bind = settings
        .server
        .bind
        .unwrap_or_else(|| "127.0.0.1".to_string());
    let addr = format!("{}:{}", bind, settings.server.port);
    let listener = tokio::net::TcpListener::bind(addr).await?;

    server::run_with_listener(engine, settings.server.cron_secret, listener).await?;
    Ok(())
}

async fn parse_database(
    config: &settings::Database,
) -> Result<sea_orm::DatabaseConnection, Box<dyn std::error::Error + Send + Sync>> {
    let url = match &config.path {
        None => String::from("sqlite::memory:"),
        Some(path) => format!("sqlite:{}?mode=rwc", path),
    };

    let database = sea_orm::Database::connect(url).await?;
    Migrator::up(&database, None).await?;
    Ok(database)
}
