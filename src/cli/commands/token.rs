use anyhow::anyhow;
use clap::Subcommand;
use serde_json::json;
use uuid::Uuid;

use crate::auth::{fingerprint, issue_token, verify_token, Claims, Role};
use crate::cli::utils::{output_details, output_success};
use crate::cli::OutputFormat;
use crate::config::config;

#[derive(Subcommand)]
pub enum TokenCommands {
    #[command(about = "Sign a token with the configured JWT secret")]
    Issue {
        #[arg(long, help = "User id to place in the token")]
        user_id: Uuid,
        #[arg(long, help = "Email claim")]
        email: String,
        #[arg(long, default_value = "client", help = "Role claim (admin, manager, employee, client)")]
        role: String,
        #[arg(long, help = "Lifetime in hours (defaults to JWT_EXPIRY_HOURS)")]
        hours: Option<u64>,
    },

    #[command(about = "Verify a token against the configured JWT secret")]
    Verify {
        #[arg(help = "Token to verify")]
        token: String,
    },
}

pub fn handle(cmd: TokenCommands, output_format: OutputFormat) -> anyhow::Result<()> {
    let security = &config().security;

    match cmd {
        TokenCommands::Issue { user_id, email, role, hours } => {
            let role: Role = role.parse().map_err(|e| anyhow!("{}", e))?;
            let claims = Claims::new(user_id, &email, role, hours.unwrap_or(security.jwt_expiry_hours))?;
            let token = issue_token(&claims, &security.jwt_secret)?;

            match output_format {
                OutputFormat::Text => println!("{}", token),
                OutputFormat::Json => output_success(
                    &output_format,
                    "Token issued",
                    Some(json!({ "token": token, "expires_at": claims.exp })),
                )?,
            }
            Ok(())
        }
        TokenCommands::Verify { token } => {
            let claims = verify_token(&token, &security.jwt_secret)
                .map_err(|e| anyhow!("token {} rejected: {}", fingerprint(&token), e))?;
            output_details(
                &output_format,
                &json!({
                    "user_id": claims.user_id,
                    "email": claims.email,
                    "role": claims.role,
                    "expires_at": claims.expires_at,
                }),
            )
        }
    }
}
