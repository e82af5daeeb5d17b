use crate::cli::utils::output_success;
use crate::cli::OutputFormat;
use crate::config::config;
use crate::database::manager::redact_url;
use crate::database::DatabaseManager;
use serde_json::json;

pub async fn handle(output_format: OutputFormat) -> anyhow::Result<()> {
    let config = config();
    let database = DatabaseManager::connect(&config.database).await?;
    database.migrate().await?;
    database.close().await;

    output_success(
        &output_format,
        "Migrations applied",
        Some(json!({ "database": redact_url(&config.database.url) })),
    )
}
