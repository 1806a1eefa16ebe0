use anyhow::{Context, Result};
use owo_colors::OwoColorize;

use crate::config::Settings;

pub async fn run(
    settings: &Settings,
    client_id: Option<String>,
    client_secret: Option<String>,
) -> Result<()> {
    let client_id = client_id
        .or_else(|| settings.client_id.clone())
        .context("Pass --client-id or set client_id in the config")?;
    let client_secret = client_secret
        .or_else(|| settings.client_secret.clone())
        .context("Pass --client-secret or set client_secret in the config")?;

    let credentials = shiftsync_provider_google::authorize(&client_id, &client_secret).await?;

    println!("\n{}", "Authorized.".green());
    println!("Save this as your credentials bundle and set `secret_file` to its path:\n");
    println!("{}", serde_json::to_string_pretty(&credentials)?);

    Ok(())
}
