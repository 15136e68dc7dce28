#![cfg_attr(feature = "fail-on-warnings", deny(warnings))]
#![warn(clippy::all, clippy::pedantic, clippy::nursery, clippy::cargo)]
#![allow(clippy::multiple_crate_versions, clippy::cargo_common_metadata)]

//! Command-line front end for the EcoPulse map.
//!
//! Computes the same views the map shows, from either a running server
//! (`--api-url`) or the score CSV files (`--data-dir`).

use std::fmt::Write as _;
use std::path::PathBuf;
use std::sync::Arc;

use clap::{Parser, Subcommand};
use ecopulse_analytics::rank;
use ecopulse_dataset::{HttpScoreSource, ScoreSource};
use ecopulse_geography::CityRegistry;
use ecopulse_ingest::{ScoreStore, paths};
use ecopulse_score_models::{FORECAST_YEAR, Language, MonthSelector};
use ecopulse_session::{Engine, INITIAL_YEAR, Publication, ScoreView, Session};

#[derive(Parser)]
#[command(name = "ecopulse", about = "EcoPulse score views and rankings")]
struct Cli {
    /// Base URL of a running EcoPulse server (e.g. `http://127.0.0.1:8080`)
    #[arg(long, global = true, conflicts_with = "data_dir")]
    api_url: Option<String>,
    /// Directory holding the score CSV files (defaults to `ECOPULSE_DATA_DIR` or `data/`)
    #[arg(long, global = true)]
    data_dir: Option<PathBuf>,
    /// City boundaries `GeoJSON`; the map then lists every city in it
    #[arg(long, global = true)]
    geojson: Option<PathBuf>,
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Show the map view for a selection
    View {
        #[arg(long, default_value_t = INITIAL_YEAR)]
        year: i32,
        /// `all` or a month number (1-12)
        #[arg(long, default_value = "all")]
        month: MonthSelector,
        /// City to show details for
        #[arg(long)]
        city: Option<String>,
        /// Display language (`tr` or `en`)
        #[arg(long, default_value = "tr")]
        lang: String,
        /// Print the full view as JSON
        #[arg(long)]
        json: bool,
    },
    /// Rank cities by score
    Rank {
        #[arg(long, default_value_t = INITIAL_YEAR)]
        year: i32,
        /// `all` or a month number (1-12)
        #[arg(long, default_value = "all")]
        month: MonthSelector,
        /// Number of cities to show
        #[arg(long)]
        limit: Option<usize>,
    },
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    pretty_env_logger::init_custom_env("RUST_LOG");
    let cli = Cli::parse();

    let source = score_source(&cli)?;
    let registry = cli
        .geojson
        .as_deref()
        .map(CityRegistry::from_path)
        .transpose()?;

    match cli.command {
        Commands::View {
            year,
            month,
            city,
            lang,
            json,
        } => {
            let language: Language = lang
                .parse()
                .map_err(|_| format!("Unsupported language '{lang}'"))?;

            let session = Session::start(source, registry).await?;
            if let Publication::Fallback { error, .. } = session.select_year(year).await {
                log::warn!("Using baseline scores: {error}");
            }
            session.select_month(month);
            session.select_language(language);
            let view = match city {
                Some(city) => session.select_city(&city)?,
                None => session.current(),
            };

            if json {
                println!("{}", serde_json::to_string_pretty(view.as_ref())?);
            } else {
                print!("{}", render_view(&view));
            }
        }
        Commands::Rank { year, month, limit } => {
            let engine = Engine::load(source, registry).await?;
            if let Err(e) = engine.ensure_year(year).await {
                log::warn!("Using baseline scores: {e}");
            }
            let ranking = rank(&engine.scores(year, month));

            println!("EcoPulse ranking, {year} / {month}");
            for entry in ranking.iter().take(limit.unwrap_or(usize::MAX)) {
                println!("{:>4}. {:<20} {}", entry.rank, entry.city, entry.score);
            }
        }
    }

    Ok(())
}

fn score_source(cli: &Cli) -> Result<Arc<dyn ScoreSource>, Box<dyn std::error::Error>> {
    if let Some(url) = &cli.api_url {
        return Ok(Arc::new(HttpScoreSource::new(url)?));
    }
    let dir = cli.data_dir.clone().unwrap_or_else(paths::data_dir);
    Ok(Arc::new(ScoreStore::load(&dir)))
}

fn render_view(view: &ScoreView) -> String {
    let selection = &view.selection;
    let mut out = String::new();

    let _ = writeln!(
        out,
        "EcoPulse {} / {} ({})",
        selection.year, selection.month, selection.language
    );
    let _ = writeln!(out);

    for entry in &view.map {
        let score = entry
            .score
            .map_or_else(|| "-".to_string(), |score| score.to_string());
        let category = entry
            .category
            .map(|category| category.to_string())
            .unwrap_or_default();
        let _ = writeln!(out, "  {:<20} {score:>6}  {category}", entry.city);
    }

    if let Some(insight) = &view.insight {
        let _ = writeln!(out);
        let _ = write!(out, "{}", insight.city);
        match (insight.score, insight.category) {
            (Some(score), Some(category)) => {
                let _ = write!(out, ": {score} ({category})");
            }
            _ => {
                let _ = write!(out, ": no data");
            }
        }
        if let (Some(rank), Some(percentile)) = (insight.rank, insight.percentile) {
            let _ = write!(
                out,
                ", rank {rank} of {}, percentile {percentile}",
                view.ranking.len()
            );
        }
        let _ = writeln!(out);

        if let Some(forecast) = &insight.forecast {
            let _ = writeln!(
                out,
                "{FORECAST_YEAR} {} forecast: {} ({}, {:+.2})",
                forecast.quarter,
                forecast.forecast,
                forecast.comparison.status,
                forecast.comparison.delta
            );
        }
        if let Some(advisory) = insight.advisory {
            let _ = writeln!(
                out,
                "Advisory: {}/{}",
                advisory.category, advisory.language
            );
        }
    }

    out
}
