//! Token command handlers

use crate::config::Config;
use crate::db::Store;
use crate::domain::TokenId;
use crate::services::{DefaultTokenService, TokenService};

async fn token_service(config: &Config) -> anyhow::Result<DefaultTokenService> {
    let store = Store::with_pool_options(
        &config.general.database_path,
        config.general.max_db_connections,
        config.general.min_db_connections,
    )
    .await?;
    Ok(DefaultTokenService::new(store.token_repo()))
}

pub async fn cmd_token_issue(config: &Config, name: &str, principal: &str) -> anyhow::Result<()> {
    let service = token_service(config).await?;
    let issued = service.issue(name, principal).await?;

    println!("Issued token '{}' ({})", issued.token.name, issued.token.id);
    println!();
    println!("  {}", issued.secret.as_str());
    println!();
    println!("Store this secret now. It cannot be shown again.");

    Ok(())
}

pub async fn cmd_token_list(config: &Config) -> anyhow::Result<()> {
    let service = token_service(config).await?;
    let tokens = service.list().await?;

    if tokens.is_empty() {
        println!("No API tokens issued.");
        println!();
        println!("Issue one with: flagd token issue --name <label>");
        return Ok(());
    }

    println!("API Tokens ({} total)", tokens.len());
    println!("{:-<70}", "");

    for token in tokens {
        let last_used = token
            .last_used_at
            .map_or_else(|| "never".to_string(), |at| at.to_rfc3339());
        println!("{} {}", token.id, token.name);
        println!(
            "  Created: {} by {} | Last used: {}",
            token.created_at.to_rfc3339(),
            token.created_by_principal,
            last_used
        );
    }

    Ok(())
}

pub async fn cmd_token_revoke(config: &Config, id: &str) -> anyhow::Result<()> {
    let service = token_service(config).await?;
    service.revoke(&TokenId::from(id.to_string())).await?;
    println!("Revoked token {id}");
    Ok(())
}
