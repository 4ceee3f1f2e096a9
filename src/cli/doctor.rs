//! CLI `doctor` command: check configuration and reachability of the hosted
//! services, then print a report.

use anyhow::Result;

use crate::auth::provider::AuthClient;
use crate::config::AppConfig;
use crate::store;

fn status(configured: bool) -> &'static str {
    if configured {
        "configured"
    } else {
        "missing"
    }
}

/// Print a configuration and connectivity report. Never fails on a missing
/// integration; only setup errors (bad URL or key) propagate.
pub async fn doctor(config: &AppConfig) -> Result<()> {
    println!("EmotiTask Health Report");
    println!("=======================");
    println!();
    println!("Bind address:      {}", config.bind_addr());
    println!("Log level:         {}", config.server.log_level);
    println!(
        "Debug identity:    {}",
        match (config.server.debug, cfg!(debug_assertions)) {
            (true, true) => "enabled",
            (true, false) => "requested, but not available in release builds",
            (false, _) => "disabled",
        }
    );
    println!();
    println!("Supabase:");
    println!("  URL:             {}", status(!config.supabase.url.is_empty()));
    println!("  Anon key:        {}", status(!config.supabase.anon_key.is_empty()));
    println!("  Service key:     {}", status(!config.supabase.service_role_key.is_empty()));
    println!("OpenAI:");
    println!("  API key:         {}", status(config.llm_configured()));
    println!("  Model:           {}", config.openai.model);
    println!();

    if config.store_configured() {
        let store = store::create_store(config)?;
        // Any answer (even "no such row") proves the REST API and key work.
        match store.profiles.get("doctor", "doctor").await {
            Ok(_) => println!("Remote store:      reachable"),
            Err(e) => println!("Remote store:      FAILED ({e})"),
        }
    } else if cfg!(debug_assertions) {
        println!("Remote store:      not configured (debug build will use the in-memory store)");
    } else {
        println!("Remote store:      not configured (`serve` will refuse to start)");
    }

    if config.auth_configured() {
        let client = AuthClient::new(&config.supabase.url, &config.supabase.anon_key)?;
        match client.health().await {
            Ok(()) => println!("Auth provider:     reachable"),
            Err(e) => println!("Auth provider:     FAILED ({e})"),
        }
    } else {
        println!("Auth provider:     not configured (sign up / sign in return 503)");
    }

    let missing = config.warn_missing();
    if !missing.is_empty() {
        println!();
        println!("Missing settings:  {}", missing.join(", "));
        println!("Set them in .env, the environment, or ~/.emotitask/config.toml.");
    }

    Ok(())
}
