use anyhow::{Context, Result, bail};

use wc22_analytics::api::{AnalyticsApi, Backend};
use wc22_analytics::config::Settings;
use wc22_analytics::data_manager::group_by_stage;
use wc22_analytics::http_client::init_http_client;
use wc22_analytics::logging;
use wc22_analytics::state::MatchId;

enum Action {
    Show,
    Fetch(MatchId),
    Delete(MatchId),
    FetchAll,
}

fn main() -> Result<()> {
    let _ = dotenvy::from_filename(".env.local");
    let _ = dotenvy::from_filename(".env");
    logging::init_stderr();

    let settings = Settings::from_env();
    init_http_client(settings.http_timeout)?;
    let backend = Backend::new(settings.api_base.clone());

    let mut competition = settings.default_competition.clone();
    let mut team: Option<String> = None;
    let mut action = Action::Show;
    let mut args = std::env::args().skip(1);
    while let Some(arg) = args.next() {
        match arg.as_str() {
            "--competition" => {
                competition = args.next().context("--competition needs a value")?;
            }
            "--team" => team = Some(args.next().context("--team needs a value")?),
            "--fetch" => action = Action::Fetch(parse_id(args.next())?),
            "--delete" => action = Action::Delete(parse_id(args.next())?),
            "--fetch-all" => action = Action::FetchAll,
            other => bail!(
                "unknown argument {other}; usage: data_status [--competition NAME] [--team NAME] [--fetch ID | --delete ID | --fetch-all]"
            ),
        }
    }

    match action {
        Action::Show => {}
        Action::Fetch(id) => {
            let msg = backend.fetch_match_data(id, Some(&competition))?;
            println!("{msg}");
        }
        Action::Delete(id) => {
            let msg = backend.delete_match_data(id, Some(&competition))?;
            println!("{msg}");
        }
        Action::FetchAll => {
            let msg = backend.fetch_all_missing()?;
            println!("{msg}");
        }
    }

    let status = backend
        .data_status(Some(&competition), team.as_deref())
        .with_context(|| format!("data status for {competition}"))?;
    let summary = status.summary_or_computed();
    println!(
        "{competition}: {} matches, {} complete, {} missing",
        summary.total, summary.complete, summary.missing
    );
    for (stage, matches) in group_by_stage(&status.matches) {
        println!("\n{stage}");
        for m in matches {
            let mark = if m.is_complete {
                "done"
            } else if m.statsbomb_available {
                "todo"
            } else {
                "n/a "
            };
            println!("  [{mark}] {:>8}  {}", m.match_id, m.display_label());
        }
    }
    Ok(())
}

fn parse_id(raw: Option<String>) -> Result<MatchId> {
    let raw = raw.context("missing match id")?;
    raw.trim()
        .parse::<MatchId>()
        .with_context(|| format!("invalid match id {raw}"))
}
