use std::io::{self, Write};
use std::path::{Path, PathBuf};

use anyhow::Result;
use crossterm::cursor::{Hide, MoveTo, Show};
use crossterm::event::{self, Event, KeyCode, KeyEventKind, KeyModifiers};
use crossterm::execute;
use crossterm::terminal::{
    disable_raw_mode, enable_raw_mode, Clear, ClearType, EnterAlternateScreen,
    LeaveAlternateScreen,
};
use tokio::time::Duration;

use icp_supply::fetch::HttpMetricSource;
use icp_supply::render::{self, BOLD, CYAN, DIM, GREEN, RED, RESET};
use icp_supply::service::SupplyService;
use icp_supply::snapshot::Snapshot;
use icp_supply::state::{self, Config};

const CLEAR_LINE: &str = "\x1b[2K";

/// Cool-down between automatic refresh attempts so a dead endpoint does not
/// get hammered from the watch loop.
const AUTO_RETRY_COOLDOWN_MS: u64 = 60_000;

#[tokio::main]
async fn main() -> Result<()> {
    let mode = std::env::args().nth(1).unwrap_or_else(|| "show".to_string());
    let cfg = Config::from_env();

    match mode.as_str() {
        "fetch" => run_fetch(&cfg).await,
        "show" => run_show(&cfg),
        "watch" => run_watch(&cfg).await,
        other => {
            eprintln!("unknown mode: {} (expected fetch | show | watch)", other);
            std::process::exit(2);
        }
    }
}

async fn run_fetch(cfg: &Config) -> Result<()> {
    let mut service = SupplyService::new(Box::new(HttpMetricSource::new(cfg)));
    service.refresh().await?;
    service.persist(Path::new(&cfg.snapshot_path))?;

    println!("Snapshot written to {}", cfg.snapshot_path);
    for (label, key) in [
        ("Total supply", "total"),
        ("Liquid", "liquid"),
        ("Staked", "staked"),
        ("Rewards", "rewards"),
        ("Burned", "burned"),
    ] {
        if let Some(node) = service.node(key) {
            println!(
                "  {:<13} {:>16} ICP",
                label,
                render::format_amount(node.value)
            );
        }
    }
    Ok(())
}

fn run_show(cfg: &Config) -> Result<()> {
    let path = Path::new(&cfg.snapshot_path);
    let snapshot = match Snapshot::load(path) {
        Ok(snapshot) => snapshot,
        Err(err) => {
            eprintln!("{}", err);
            eprintln!("run `icp-supply fetch` to produce a snapshot first");
            std::process::exit(1);
        }
    };

    let mut service = SupplyService::new(Box::new(HttpMetricSource::new(cfg)));
    service.adopt_snapshot(snapshot)?;
    if let Some(tree) = service.tree() {
        print!(
            "{}",
            render::render_table(
                tree,
                service.view(),
                service.total_supply(),
                service.last_updated(),
            )
        );
    }
    Ok(())
}

async fn run_watch(cfg: &Config) -> Result<()> {
    let mut service = SupplyService::new(Box::new(HttpMetricSource::new(cfg)));
    let snapshot_path = PathBuf::from(&cfg.snapshot_path);

    let mut status = String::new();
    match Snapshot::load(&snapshot_path) {
        Ok(snapshot) => {
            if let Err(err) = service.adopt_snapshot(snapshot) {
                status = format!("stored snapshot rejected: {}", err);
            }
        }
        Err(_) => status = "no snapshot on disk yet, fetching...".to_string(),
    }

    enable_raw_mode()?;
    execute!(io::stdout(), EnterAlternateScreen, Hide)?;
    let result = watch_loop(cfg, &mut service, &snapshot_path, status).await;
    execute!(io::stdout(), Show, LeaveAlternateScreen)?;
    disable_raw_mode()?;
    result
}

async fn watch_loop(
    cfg: &Config,
    service: &mut SupplyService,
    snapshot_path: &Path,
    mut status: String,
) -> Result<()> {
    let mut cursor = 0usize;
    let mut last_attempt_ms = 0u64;

    loop {
        let now_ms = state::now_ts_ms();
        let stale = match service.fetched_at() {
            None => true,
            Some(fetched) => now_ms.saturating_sub(fetched) / 1000 > cfg.max_snapshot_age_secs,
        };
        if stale && now_ms.saturating_sub(last_attempt_ms) > AUTO_RETRY_COOLDOWN_MS {
            status = "refreshing...".to_string();
            draw(service, &mut cursor, &status)?;
            last_attempt_ms = now_ms;
            status = do_refresh(service, snapshot_path).await;
        }

        let rows = draw(service, &mut cursor, &status)?;

        if event::poll(Duration::from_millis(cfg.watch_poll_ms))? {
            if let Event::Key(key) = event::read()? {
                if key.kind != KeyEventKind::Press {
                    continue;
                }
                match key.code {
                    KeyCode::Char('q') => break,
                    KeyCode::Char('c') if key.modifiers.contains(KeyModifiers::CONTROL) => break,
                    KeyCode::Char('r') => {
                        status = "refreshing...".to_string();
                        draw(service, &mut cursor, &status)?;
                        last_attempt_ms = state::now_ts_ms();
                        status = do_refresh(service, snapshot_path).await;
                    }
                    KeyCode::Esc => service.view_mut().collapse_all(),
                    KeyCode::Char(' ') => service.view_mut().expand_defaults(),
                    KeyCode::Up => cursor = cursor.saturating_sub(1),
                    KeyCode::Down => cursor += 1, // clamped at draw time
                    KeyCode::Enter => {
                        if let Some(row) = rows.get(cursor) {
                            if row.expandable {
                                let key = row.key.clone();
                                service.view_mut().toggle(&key);
                            }
                        }
                    }
                    _ => {}
                }
            }
        }
    }
    Ok(())
}

async fn do_refresh(service: &mut SupplyService, snapshot_path: &Path) -> String {
    match service.refresh().await {
        Ok(()) => {
            if let Err(err) = service.persist(snapshot_path) {
                return format!("refreshed, but snapshot not saved: {}", err);
            }
            "data refreshed".to_string()
        }
        // The previous tree stays on screen; only the status line changes.
        Err(err) => format!("refresh failed: {} (press r to retry)", err),
    }
}

fn draw(
    service: &SupplyService,
    cursor: &mut usize,
    status: &str,
) -> Result<Vec<render::TableRow>> {
    let mut lines: Vec<String> = Vec::new();
    lines.push(format!("{}{}ICP Supply{}", BOLD, CYAN, RESET));
    lines.push(String::new());

    let rows = match service.tree() {
        Some(tree) => {
            let rows = render::table_rows(tree, service.view(), service.total_supply());
            *cursor = (*cursor).min(rows.len().saturating_sub(1));
            lines.push(format!("  {}", render::header()));
            for (idx, row) in rows.iter().enumerate() {
                let pointer = if idx == *cursor { "❯ " } else { "  " };
                lines.push(format!("{}{}", pointer, render::format_row(row)));
            }
            lines.push(String::new());
            match service.last_updated() {
                Some(ts) => lines.push(format!("{}Data updated: {}{}", DIM, ts, RESET)),
                None => lines.push(format!("{}Data updated: never{}", DIM, RESET)),
            }
            rows
        }
        None => {
            lines.push(format!("{}No data available{}", RED, RESET));
            lines.push(format!(
                "{}The first fetch has not succeeded yet. Press r to retry.{}",
                DIM, RESET
            ));
            Vec::new()
        }
    };

    if !status.is_empty() {
        let color = if status.starts_with("refresh failed") || status.contains("rejected") {
            RED
        } else {
            GREEN
        };
        lines.push(format!("{}{}{}", color, status, RESET));
    }
    lines.push(String::new());
    lines.push(format!(
        "{}↑/↓ move  enter expand/collapse  space defaults  esc collapse all  r refresh  q quit{}",
        DIM, RESET
    ));

    let mut stdout = io::stdout();
    execute!(stdout, MoveTo(0, 0))?;
    for line in &lines {
        write!(stdout, "{}{}\r\n", CLEAR_LINE, line)?;
    }
    execute!(stdout, Clear(ClearType::FromCursorDown))?;
    stdout.flush()?;

    Ok(rows)
}
