use anyhow::Context;
use serde_json::Value;
use std::time::Duration;

use crate::cli::utils::{output_details, output_error};
use crate::cli::OutputFormat;

pub async fn handle(base_url: &str, output_format: OutputFormat) -> anyhow::Result<()> {
    let url = url::Url::parse(base_url)
        .and_then(|base| base.join("/health"))
        .with_context(|| format!("invalid server URL {}", base_url))?;

    let client = reqwest::Client::builder().timeout(Duration::from_secs(10)).build()?;
    let response = client
        .get(url.clone())
        .send()
        .await
        .with_context(|| format!("failed to reach {}", url))?;

    let status = response.status();
    let body: Value = response.json().await.unwrap_or(Value::Null);

    if status.is_success() {
        output_details(&output_format, body.get("data").unwrap_or(&body))
    } else {
        output_error(&output_format, &format!("{} returned {}", url, status), Some("UNHEALTHY"))?;
        Err(anyhow::anyhow!("server is unhealthy"))
    }
}
