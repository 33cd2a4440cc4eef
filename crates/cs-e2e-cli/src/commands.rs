//! Subcommand implementations.

use std::sync::Arc;

use anyhow::{Context, Result};
use chrono::Local;
use serde_json::json;
use tracing::info;

use cs_e2e_core::api::ApiClient;
use cs_e2e_core::auth::{
    AuthStateStore, HttpBrowserContext, Identity, Persona, TokenCache, TokenExpiry, TokenManager,
    TokenStatus, IDENTITY_HEADER,
};
use cs_e2e_core::cleanup::{self, CleanupSummary};
use cs_e2e_core::{HarnessConfig, PollOptions};

fn token_manager(config: &HarnessConfig, cache: TokenCache) -> TokenManager {
    TokenManager::new(Arc::new(cache), AuthStateStore::new(&config.auth_dir))
        .with_buffer(config.token_refresh_buffer)
}

fn describe(expiry: &TokenExpiry) -> String {
    let state = if expiry.is_expired {
        "expired"
    } else if expiry.is_expiring_soon {
        "expiring soon"
    } else {
        "valid"
    };
    format!(
        "{} (expires {}, {:.1} min remaining)",
        state,
        expiry.expires_at.with_timezone(&Local).format("%Y-%m-%d %H:%M:%S"),
        expiry.minutes_remaining()
    )
}

/// Stored token expiry per persona
pub fn token_status(persona: Option<Persona>, as_json: bool) -> Result<()> {
    let config = HarnessConfig::from_env()?;
    let manager = token_manager(&config, TokenCache::new());
    let personas: Vec<Persona> = match persona {
        Some(p) => vec![p],
        None => Persona::ALL.to_vec(),
    };

    if as_json {
        let report: Vec<_> = personas
            .iter()
            .map(|p| {
                let expiry = manager.stored_expiry(*p);
                json!({
                    "persona": p.name(),
                    "auth_file": manager.store().path(*p),
                    "expires_at": expiry.as_ref().map(|e| e.expires_at.to_rfc3339()),
                    "minutes_remaining": expiry.as_ref().map(|e| e.minutes_remaining()),
                    "needs_refresh": expiry.as_ref().map_or(true, |e| e.needs_refresh()),
                })
            })
            .collect();
        println!("{}", serde_json::to_string_pretty(&report)?);
        return Ok(());
    }

    for p in personas {
        let line = match manager.stored_expiry(p) {
            Some(expiry) => describe(&expiry),
            None if manager.store().path(p).exists() => "no readable cs_jwt cookie".to_string(),
            None => "no auth file".to_string(),
        };
        println!("{:<20} {}", p.name(), line);
    }
    Ok(())
}

/// Refresh a persona's token using the session cookies in its auth file
pub async fn token_refresh(persona: Persona, if_needed: bool) -> Result<()> {
    let config = HarnessConfig::from_env()?;
    let Some(expiry) = refresh_persona(&config, persona, if_needed).await? else {
        println!("{}: token still valid, nothing to do", persona);
        return Ok(());
    };

    info!(persona = %persona, "Token refreshed");
    match expiry {
        Some(expiry) => println!("{}: refreshed, {}", persona, describe(&expiry)),
        None => println!("{}: refreshed", persona),
    }
    Ok(())
}

/// `None` when `if_needed` found a valid token; otherwise the stored expiry
/// after the refresh.
///
/// The cache starts empty so the auth file, not an exported token variable,
/// decides whether a refresh is needed.
async fn refresh_persona(
    config: &HarnessConfig,
    persona: Persona,
    if_needed: bool,
) -> Result<Option<Option<TokenExpiry>>> {
    let manager = token_manager(config, TokenCache::new());
    let state = manager.store().load(persona)?.with_context(|| {
        format!(
            "No auth state for {} at {}",
            persona,
            manager.store().path(persona).display()
        )
    })?;
    let browser =
        HttpBrowserContext::new(&config.base_url, &state, config.accept_invalid_certs())?;

    let status = if if_needed {
        manager.ensure_valid(persona, &browser).await?
    } else {
        TokenStatus::Missing
    };
    match status {
        TokenStatus::Valid(_) => return Ok(None),
        TokenStatus::Refreshed(_) => {}
        TokenStatus::Missing => {
            manager.refresh(persona, &browser).await?;
        }
    }

    Ok(Some(manager.stored_expiry(persona)))
}

pub fn identity(org: &str, user: &str, account: &str, with_name: bool) {
    let value = Identity::new(org, user)
        .with_account_number(account)
        .header_value();
    if with_name {
        println!("{}: {}", IDENTITY_HEADER, value);
    } else {
        println!("{}", value);
    }
}

/// Identity-header client, or the persona's token client when one is given
async fn client_for(config: &HarnessConfig, persona: Option<Persona>) -> Result<ApiClient> {
    let client = ApiClient::from_config(config)?;
    let Some(persona) = persona else {
        return Ok(client);
    };
    let manager = token_manager(config, TokenCache::from_env());
    let token = match manager.token(persona).await {
        Some(token) => Some(token),
        None => manager.store().stored_token(persona)?,
    };
    let token = token.with_context(|| format!("No token available for {}", persona))?;
    Ok(client.with_token(&token))
}

fn report(kind: &str, summary: &CleanupSummary) {
    if summary.deleted.is_empty() {
        println!("No {} matched", kind);
        return;
    }
    println!("Deleted {} {}:", summary.deleted.len(), kind);
    for uuid in &summary.deleted {
        println!("  {}", uuid);
    }
    if summary.awaited_tasks > 0 {
        println!("{} deletion task(s) completed", summary.awaited_tasks);
    }
}

pub async fn cleanup_repos(terms: &[String], persona: Option<Persona>) -> Result<()> {
    let config = HarnessConfig::from_env()?;
    let client = client_for(&config, persona).await?;
    let summary = cleanup::cleanup_repositories(&client, terms, PollOptions::default()).await?;
    report("repositories", &summary);
    Ok(())
}

pub async fn cleanup_templates(prefixes: &[String], persona: Option<Persona>) -> Result<()> {
    let config = HarnessConfig::from_env()?;
    let client = client_for(&config, persona).await?;
    let summary = cleanup::cleanup_templates(&client, prefixes, PollOptions::default()).await?;
    report("templates", &summary);
    Ok(())
}
