use super::AppContext;
use crate::output::Output;
use crate::ui::Spinner;
use color_eyre::eyre::eyre;
use color_eyre::Result;
use comfy_table::{Cell, Color, Table};
use std::time::Duration;
use uuid::Uuid;
use watchtrack_core::{Outcome, RefreshPolicy, RefreshReport};

/// One row, owned by the current user, through the interactive refresh policy
pub async fn run_refresh(ctx: &AppContext, id: Uuid, output: &Output) -> Result<()> {
    let service = ctx.service()?;
    service.get_item(&ctx.user, id).await.map_err(|e| eyre!("{}", e))?;

    let spinner = Spinner::start("Refreshing item", output.is_human() && !output.is_quiet());
    let report = service.refresher().run(RefreshPolicy::Interactive(id)).await;
    spinner.finish();

    let report = report.map_err(|e| eyre!("Refresh failed: {}", e))?;
    let failure = report.outcomes.iter().find_map(|item| match &item.outcome {
        Outcome::Failed { error, .. } => Some(format!("{}: {}", item.title, error)),
        Outcome::TimedOut => Some(format!("{}: timed out", item.title)),
        Outcome::Refreshed { .. } => None,
    });
    match failure {
        Some(message) => {
            output.error(&message);
            Err(eyre!("Refresh did not complete"))
        }
        None => print_report(&report, output),
    }
}

pub async fn run_cron(ctx: &AppContext, output: &Output) -> Result<()> {
    let refresher = ctx.refresher()?;
    let policy = RefreshPolicy::bounded(&ctx.config.refresh);

    let spinner = Spinner::start("Refreshing stalest items", output.is_human() && !output.is_quiet());
    let report = refresher.run(policy).await;
    spinner.finish();

    print_report(&report.map_err(|e| eyre!("Cron refresh failed: {}", e))?, output)
}

pub async fn run_sweep(
    ctx: &AppContext,
    chunk_size: Option<usize>,
    delay_secs: Option<u64>,
    output: &Output,
) -> Result<()> {
    let refresher = ctx.refresher()?;
    let policy = RefreshPolicy::Sweep {
        chunk_size: chunk_size.unwrap_or(ctx.config.refresh.sweep_chunk_size).max(1),
        delay: Duration::from_secs(delay_secs.unwrap_or(ctx.config.refresh.sweep_delay_secs)),
    };

    let spinner = Spinner::start("Sweeping every eligible item", output.is_human() && !output.is_quiet());
    let report = refresher.run(policy).await;
    spinner.finish();

    print_report(&report.map_err(|e| eyre!("Sweep failed: {}", e))?, output)
}

fn print_report(report: &RefreshReport, output: &Output) -> Result<()> {
    if !output.is_human() {
        output.json(&serde_json::json!({
            "status": "ok",
            "count": report.count(),
            "processed": report.processed_titles(),
            "outcomes": report.outcomes,
        }));
        return Ok(());
    }

    if report.count() == 0 {
        output.info("Nothing to refresh");
        return Ok(());
    }

    let mut table = Table::new();
    table.set_header(vec!["Title", "Type", "Result"]);
    for item in &report.outcomes {
        let result = match &item.outcome {
            Outcome::Refreshed { status } => Cell::new(status.as_str()).fg(Color::Green),
            Outcome::Failed { error, .. } => Cell::new(error).fg(Color::Red),
            Outcome::TimedOut => Cell::new("timed out").fg(Color::Yellow),
        };
        table.add_row(vec![Cell::new(&item.title), Cell::new(item.kind.as_str()), result]);
    }
    output.table(table);

    if report.failures() > 0 {
        output.warn(format!(
            "Refreshed {} of {} items ({} failed)",
            report.refreshed(),
            report.count(),
            report.failures()
        ));
    } else {
        output.success(format!("Refreshed {} items", report.refreshed()));
    }
    Ok(())
}
