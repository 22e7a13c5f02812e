use super::AppContext;
use crate::output::Output;
use color_eyre::eyre::eyre;
use color_eyre::Result;
use comfy_table::{Attribute, Cell, Color, Table};
use owo_colors::OwoColorize;
use serde_json::json;
use watchtrack_config::{Config, CredentialStore};

fn mask_string(s: &str) -> String {
    if s.is_empty() {
        return "<not set>".to_string();
    }
    if s.chars().count() <= 4 {
        return "*".repeat(s.chars().count());
    }
    let chars: Vec<char> = s.chars().collect();
    let head: String = chars[..2].iter().collect();
    let tail: String = chars[chars.len() - 2..].iter().collect();
    format!("{}***{}", head, tail)
}

fn flag(enabled: bool) -> String {
    if enabled {
        "✓".green().to_string()
    } else {
        "✗".red().to_string()
    }
}

fn section(title: &str) -> Table {
    let mut table = Table::new();
    table.set_header(vec![Cell::new(title).fg(Color::Cyan).add_attribute(Attribute::Bold)]);
    table
}

fn secret_display(credentials: &CredentialStore, key: &str, full: bool) -> String {
    match credentials.get(key) {
        Some(value) if full => value.to_string(),
        Some(value) => mask_string(value),
        None => "<not set>".to_string(),
    }
}

pub fn show_config(ctx: &AppContext, full: bool, output: &Output) -> Result<()> {
    let config_file = ctx.paths.config_file();
    let credentials = ctx.credentials()?;
    let config = &ctx.config;

    if !output.is_human() {
        let secrets: serde_json::Map<String, serde_json::Value> = credentials
            .keys()
            .into_iter()
            .map(|key| {
                let shown = secret_display(&credentials, &key, full);
                (key, json!(shown))
            })
            .collect();
        output.json(&json!({
            "config_file": config_file.display().to_string(),
            "exists": config_file.exists(),
            "config": serde_json::to_value(config)?,
            "credentials": secrets,
            "ready_to_refresh": config.ensure_refresh_ready(&credentials).is_ok(),
        }));
        return Ok(());
    }

    if !config_file.exists() {
        output.warn(format!(
            "No config file at {}, showing defaults. Run 'watchtrack config init' to create one.",
            config_file.display()
        ));
    }

    let mut general = section("General");
    general.add_row(vec![Cell::new("Config file"), Cell::new(config_file.display())]);
    general.add_row(vec![Cell::new("Region"), Cell::new(&config.region)]);
    general.add_row(vec![Cell::new("User"), Cell::new(&ctx.user)]);
    output.table(general);

    let mut catalog = section("Catalog (TMDB)");
    catalog.add_row(vec![Cell::new("Base URL"), Cell::new(&config.tmdb.base_url)]);
    catalog.add_row(vec![Cell::new("Language"), Cell::new(&config.tmdb.language)]);
    catalog.add_row(vec![Cell::new("Timeout"), Cell::new(format!("{}s", config.tmdb.timeout_secs))]);
    catalog.add_row(vec![Cell::new("API key"), Cell::new(secret_display(&credentials, "tmdb_api_key", full))]);
    output.table(catalog);

    let mut providers = section("Secondary providers");
    providers.add_row(vec![
        Cell::new("TVMaze runtimes"),
        Cell::new(format!("{} {}", flag(config.tvmaze.enabled), config.tvmaze.base_url)),
    ]);
    match &config.availability {
        Some(availability) => providers.add_row(vec![
            Cell::new("Availability fallback"),
            Cell::new(format!("{} {}", flag(availability.enabled), availability.base_url)),
        ]),
        None => providers.add_row(vec![Cell::new("Availability fallback"), Cell::new(flag(false))]),
    };
    output.table(providers);

    let mut store = section("Row store");
    match &config.store {
        Some(store_config) => {
            store.add_row(vec![Cell::new("URL"), Cell::new(&store_config.url)]);
            store.add_row(vec![Cell::new("Table"), Cell::new(&store_config.table)]);
            store.add_row(vec![
                Cell::new("Service key"),
                Cell::new(secret_display(&credentials, "store_service_key", full)),
            ]);
        }
        None => {
            store.add_row(vec![Cell::new("Backend"), Cell::new("in-memory (nothing persists)")]);
        }
    }
    output.table(store);

    let mut refresh = section("Refresh");
    refresh.add_row(vec![Cell::new("Cron batch size"), Cell::new(config.refresh.batch_size)]);
    refresh.add_row(vec![
        Cell::new("Per-item budget"),
        Cell::new(format!("{}s", config.refresh.time_budget_secs)),
    ]);
    refresh.add_row(vec![Cell::new("Sweep chunk size"), Cell::new(config.refresh.sweep_chunk_size)]);
    refresh.add_row(vec![
        Cell::new("Sweep delay"),
        Cell::new(format!("{}s", config.refresh.sweep_delay_secs)),
    ]);
    refresh.add_row(vec![Cell::new("Server bind"), Cell::new(&config.server.bind)]);
    refresh.add_row(vec![
        Cell::new("Cron secret"),
        Cell::new(secret_display(&credentials, "cron_secret", full)),
    ]);
    output.table(refresh);

    match config.ensure_refresh_ready(&credentials) {
        Ok(()) => output.success("Ready to refresh"),
        Err(e) => output.warn(format!("Not ready to refresh: {}", e)),
    }
    Ok(())
}

pub fn init_config(ctx: &AppContext, force: bool, output: &Output) -> Result<()> {
    let config_file = ctx.paths.config_file();
    if config_file.exists() && !force {
        return Err(eyre!(
            "{} already exists (use --force to overwrite)",
            config_file.display()
        ));
    }

    Config::default()
        .save_to_file(&config_file)
        .map_err(|e| eyre!("Failed to write {}: {}", config_file.display(), e))?;
    output.success(format!("Wrote default configuration to {}", config_file.display()));
    output.info("Put secrets in credentials.toml next to it, or set TMDB_API_KEY, SUPABASE_URL and SUPABASE_SERVICE_KEY.");
    Ok(())
}
