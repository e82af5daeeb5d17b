use clap::Subcommand;
use serde_json::json;
use std::sync::Arc;

use crate::cache::NullCache;
use crate::cli::utils::output_success;
use crate::cli::OutputFormat;
use crate::config::config;
use crate::database::{DatabaseManager, Stores};
use crate::services::{RequestContext, Services};

#[derive(Subcommand)]
pub enum AdminCommands {
    #[command(about = "Create an administrator account unless the email is taken")]
    Create {
        #[arg(long, help = "Administrator email")]
        email: String,
        #[arg(long, help = "Administrator password")]
        password: String,
    },
}

pub async fn handle(cmd: AdminCommands, output_format: OutputFormat) -> anyhow::Result<()> {
    match cmd {
        AdminCommands::Create { email, password } => {
            let config = config();
            let database = DatabaseManager::connect(&config.database).await?;
            let services = Services::new(Stores::postgres(&database), Arc::new(NullCache), config)?;

            let ctx = RequestContext::new(config.request_timeout());
            let (admin, created) = services.auth.ensure_admin(&ctx, &email, &password).await?;
            database.close().await;

            let message = if created {
                format!("Administrator {} created", admin.email)
            } else {
                format!("Account {} already exists", admin.email)
            };
            output_success(
                &output_format,
                &message,
                Some(json!({ "id": admin.meta.id, "email": admin.email, "role": admin.role, "created": created })),
            )
        }
    }
}
