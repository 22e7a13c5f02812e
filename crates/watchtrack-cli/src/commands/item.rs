use super::AppContext;
use crate::output::Output;
use crate::ItemCommands;
use color_eyre::eyre::eyre;
use color_eyre::Result;
use comfy_table::{Cell, Table};
use watchtrack_core::TrackerError;
use watchtrack_models::{MediaKind, WatchlistItem};

fn describe(error: TrackerError) -> color_eyre::Report {
    if error.is_auth_error() {
        eyre!("{} (check the API keys in credentials.toml or the environment)", error)
    } else {
        eyre!("{}", error)
    }
}

fn print_item(item: &WatchlistItem, headline: &str, output: &Output) -> Result<()> {
    if !output.is_human() {
        output.json(&serde_json::to_value(item)?);
        return Ok(());
    }

    output.success(headline);
    let overlay = &item.metadata.overlay;
    let mut table = Table::new();
    table.add_row(vec![Cell::new("Id"), Cell::new(item.id)]);
    table.add_row(vec![Cell::new("Title"), Cell::new(&item.title)]);
    table.add_row(vec![Cell::new("Type"), Cell::new(item.kind.as_str())]);
    table.add_row(vec![Cell::new("Status"), Cell::new(item.status().as_str())]);
    if item.kind == MediaKind::Show {
        table.add_row(vec![Cell::new("Last watched season"), Cell::new(item.last_watched_season)]);
        table.add_row(vec![Cell::new("Progress"), Cell::new(item.progress)]);
    }
    if let Some(date) = overlay.manual_release_date.filter(|_| overlay.manual_date_override) {
        table.add_row(vec![Cell::new("Manual date"), Cell::new(date)]);
    }
    if overlay.dismissed_from_upcoming {
        table.add_row(vec![Cell::new("Upcoming"), Cell::new("dismissed")]);
    }
    output.table(table);
    Ok(())
}

pub async fn run_item(ctx: &AppContext, cmd: ItemCommands, output: &Output) -> Result<()> {
    let service = ctx.service()?;
    let user = ctx.user.as_str();

    let (item, headline) = match cmd {
        ItemCommands::Add { tmdb_id, kind } => {
            let item = service.add_item(user, tmdb_id, kind.into()).await.map_err(describe)?;
            (item, "Added to watchlist")
        }
        ItemCommands::Remove { id } => {
            service.remove_item(user, id).await.map_err(describe)?;
            if output.is_human() {
                output.success(format!("Removed {}", id));
            } else {
                output.json(&serde_json::json!({ "removed": id }));
            }
            return Ok(());
        }
        ItemCommands::Watched { id } => (service.mark_watched(user, id).await.map_err(describe)?, "Marked watched"),
        ItemCommands::Unwatched { id } => (service.mark_unwatched(user, id).await.map_err(describe)?, "Marked unwatched"),
        ItemCommands::Dropped { id } => (service.mark_dropped(user, id).await.map_err(describe)?, "Marked dropped"),
        ItemCommands::Season { id, season } => (service.set_season(user, id, season).await.map_err(describe)?, "Season updated"),
        ItemCommands::Progress { id, episodes } => {
            (service.set_progress(user, id, episodes).await.map_err(describe)?, "Progress updated")
        }
        ItemCommands::ManualDate { id, date, provider } => (
            service.set_manual_date(user, id, date, provider).await.map_err(describe)?,
            "Release date pinned",
        ),
        ItemCommands::ResetDate { id } => (service.reset_manual_date(user, id).await.map_err(describe)?, "Release date reset"),
        ItemCommands::Dismiss { id } => {
            (service.dismiss_from_upcoming(user, id).await.map_err(describe)?, "Hidden from Upcoming")
        }
        ItemCommands::Restore { id } => {
            (service.restore_to_upcoming(user, id).await.map_err(describe)?, "Restored to Upcoming")
        }
    };

    print_item(&item, headline, output)
}
