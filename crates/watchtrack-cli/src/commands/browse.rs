use super::AppContext;
use crate::output::Output;
use color_eyre::eyre::eyre;
use color_eyre::Result;
use comfy_table::{Cell, Color, Table};
use watchtrack_models::{MediaKind, SearchPage, TrendingWindow, UpcomingCategory};

fn date_or_dash(date: Option<chrono::NaiveDate>) -> String {
    date.map(|d| d.to_string()).unwrap_or_else(|| "-".to_string())
}

pub async fn run_upcoming(ctx: &AppContext, output: &Output) -> Result<()> {
    let service = ctx.service()?;
    let upcoming = service
        .upcoming(&ctx.user)
        .await
        .map_err(|e| eyre!("Failed to load upcoming items: {}", e))?;

    if !output.is_human() {
        output.json(&serde_json::to_value(&upcoming)?);
        return Ok(());
    }
    if upcoming.is_empty() {
        output.info("Nothing upcoming");
        return Ok(());
    }

    let mut table = Table::new();
    table.set_header(vec!["Date", "Title", "Where", "", "Provider"]);
    for item in &upcoming {
        let title = match item.episode {
            Some((season, episode)) => format!("{} S{:02}E{:02}", item.title, season, episode),
            None => item.title.clone(),
        };
        let category = match item.category {
            UpcomingCategory::Ott => Cell::new("ott").fg(Color::Cyan),
            UpcomingCategory::Theatrical => Cell::new("theatrical").fg(Color::Magenta),
        };
        table.add_row(vec![
            Cell::new(item.date.to_string()),
            Cell::new(title),
            category,
            Cell::new(item.label.as_str()),
            Cell::new(item.provider_name.as_deref().unwrap_or("-")),
        ]);
    }
    output.table(table);
    Ok(())
}

pub async fn run_list(ctx: &AppContext, output: &Output) -> Result<()> {
    let service = ctx.service()?;
    let items = service
        .list_items(&ctx.user)
        .await
        .map_err(|e| eyre!("Failed to list items: {}", e))?;

    if !output.is_human() {
        output.json(&serde_json::to_value(&items)?);
        return Ok(());
    }
    if items.is_empty() {
        output.info("The watchlist is empty");
        return Ok(());
    }

    let mut table = Table::new();
    table.set_header(vec!["Id", "Title", "Type", "Status", "Season", "Progress"]);
    for item in &items {
        let (season, progress) = match item.kind {
            MediaKind::Show => (item.last_watched_season.to_string(), item.progress.to_string()),
            MediaKind::Movie => ("-".to_string(), "-".to_string()),
        };
        table.add_row(vec![
            Cell::new(item.id),
            Cell::new(&item.title),
            Cell::new(item.kind.as_str()),
            Cell::new(item.status().as_str()),
            Cell::new(season),
            Cell::new(progress),
        ]);
    }
    output.table(table);
    Ok(())
}

fn print_page(page: &SearchPage, output: &Output) -> Result<()> {
    if !output.is_human() {
        output.json(&serde_json::to_value(page)?);
        return Ok(());
    }
    if page.results.is_empty() {
        output.info("No results");
        return Ok(());
    }

    let mut table = Table::new();
    table.set_header(vec!["TMDB id", "Title", "Date", "Rating"]);
    for entry in &page.results {
        table.add_row(vec![
            Cell::new(entry.id),
            Cell::new(entry.display_title()),
            Cell::new(date_or_dash(entry.date())),
            Cell::new(entry.vote_average.map(|v| format!("{:.1}", v)).unwrap_or_else(|| "-".to_string())),
        ]);
    }
    output.table(table);
    if page.total_pages > 1 {
        output.info(format!("Page {} of {}", page.page, page.total_pages));
    }
    Ok(())
}

pub async fn run_search(ctx: &AppContext, query: &str, kind: MediaKind, page: u32, output: &Output) -> Result<()> {
    let sources = ctx.sources()?;
    let results = sources
        .catalog
        .search(query, kind, &ctx.config.region, page.max(1))
        .await
        .map_err(|e| eyre!("Search failed: {}", e))?;
    print_page(&results, output)
}

pub async fn run_trending(ctx: &AppContext, kind: MediaKind, window: TrendingWindow, output: &Output) -> Result<()> {
    let sources = ctx.sources()?;
    let results = sources
        .catalog
        .trending(kind, window, &ctx.config.region)
        .await
        .map_err(|e| eyre!("Failed to load trending titles: {}", e))?;
    print_page(&results, output)
}
