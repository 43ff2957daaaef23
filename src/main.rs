use std::net::SocketAddr;
use std::path::PathBuf;
use std::sync::Arc;

use anyhow::Context;
use chrono::{Local, NaiveDate};
use clap::{Parser, Subcommand};
use sqlx::postgres::PgPoolOptions;
use sqlx::PgPool;
use tracing_subscriber::EnvFilter;

mod aggregate;
mod api;
mod audio;
mod config;
mod dates;
mod db;
mod error;
mod export;
mod fallback;
mod feedback;
mod filter;
mod models;
mod report;
mod source;
mod state;
#[cfg(test)]
mod testing;

use config::Config;
use filter::Period;
use models::Department;
use source::{CallSource, DataOrigin, HttpCallSource, PgCallSource};
use state::{Action, DashboardState, View};

#[derive(Parser)]
#[command(name = "callboard")]
#[command(about = "Roleplay and sales call analytics for department managers", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Create or upgrade the database schema
    InitDb,
    /// Load realistic seed data into both departments
    Seed,
    /// Serve the calls API and the recording proxy
    Serve {
        #[arg(long)]
        bind: Option<SocketAddr>,
    },
    /// Print department-wide statistics for a period
    Dashboard {
        #[arg(long, value_enum, default_value_t = Department::B2g)]
        department: Department,
        #[arg(long, value_enum, default_value_t = Period::Day)]
        period: Period,
        /// Read from a running server instead of the database
        #[arg(long)]
        api_url: Option<String>,
    },
    /// Show one manager's calls and totals
    Manager {
        #[arg(long, value_enum, default_value_t = Department::B2g)]
        department: Department,
        #[arg(long)]
        name: String,
        #[arg(long, value_enum, default_value_t = Period::Month)]
        period: Period,
        #[arg(long, default_value_t = 0)]
        min_score: i32,
        #[arg(long)]
        api_url: Option<String>,
    },
    /// Generate a markdown report
    Report {
        #[arg(long, value_enum, default_value_t = Department::B2g)]
        department: Department,
        #[arg(long, value_enum, default_value_t = Period::Week)]
        period: Period,
        #[arg(long, default_value = "report.md")]
        out: PathBuf,
        #[arg(long)]
        api_url: Option<String>,
    },
    /// Export the filtered call table to CSV
    Export {
        #[arg(long, value_enum, default_value_t = Department::B2g)]
        department: Department,
        #[arg(long)]
        csv: PathBuf,
        #[arg(long, default_value_t = 0)]
        min_score: i32,
        #[arg(long, default_value = "")]
        search: String,
        /// First day of the range, YYYY-MM-DD
        #[arg(long, requires = "to")]
        from: Option<NaiveDate>,
        /// Last day of the range, YYYY-MM-DD
        #[arg(long, requires = "from")]
        to: Option<NaiveDate>,
        #[arg(long)]
        api_url: Option<String>,
    },
}

fn init_tracing() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    let _ = tracing_subscriber::fmt().with_env_filter(filter).try_init();
}

async fn connect(config: &Config) -> anyhow::Result<PgPool> {
    PgPoolOptions::new()
        .max_connections(5)
        .connect(config.database_url()?)
        .await
        .context("failed to connect to Postgres")
}

/// Remote API when a URL is given, otherwise a database source that only
/// connects on the first query, so an unreachable database degrades to
/// placeholder data.
fn lazy_source(config: &Config, api_url: Option<String>) -> anyhow::Result<Arc<dyn CallSource>> {
    if let Some(api_url) = api_url {
        return Ok(Arc::new(HttpCallSource::new(reqwest::Client::new(), api_url)));
    }
    let pool = PgPoolOptions::new()
        .max_connections(5)
        .connect_lazy(config.database_url()?)
        .context("invalid DATABASE_URL")?;
    Ok(Arc::new(PgCallSource::new(pool)))
}

fn warn_if_fallback(origin: DataOrigin) {
    if origin == DataOrigin::Fallback {
        println!("Live data unavailable; showing placeholder data.");
    }
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    init_tracing();
    let cli = Cli::parse();
    let config = Config::from_env();

    match cli.command {
        Commands::InitDb => {
            let pool = connect(&config).await?;
            db::init_db(&pool).await?;
            println!("Schema ready.");
        }
        Commands::Seed => {
            let pool = connect(&config).await?;
            db::seed(&pool).await?;
            println!("Seed data inserted.");
        }
        Commands::Serve { bind } => {
            let addr = match bind {
                Some(addr) => addr,
                None => config
                    .bind_addr
                    .parse()
                    .with_context(|| format!("invalid BIND_ADDR {}", config.bind_addr))?,
            };
            let app_state = api::AppState {
                source: lazy_source(&config, None)?,
                audio: Arc::new(audio::AudioProxy::from_config(reqwest::Client::new(), &config)),
            };
            api::serve(api::router(app_state), addr).await?;
        }
        Commands::Dashboard {
            department,
            period,
            api_url,
        } => {
            let screen = [
                Action::SelectDepartment(department),
                Action::SelectView(View::AiCalls),
                Action::SetDashboardPeriod(period),
            ]
            .into_iter()
            .fold(DashboardState::default(), state::reduce);

            let backend = lazy_source(&config, api_url)?;
            let loaded = source::load_for_screen(backend.as_ref(), &screen).await;
            warn_if_fallback(loaded.origin);
            let view = state::compute(&screen, &loaded.data, Local::now().naive_local());

            println!(
                "{} dashboard ({}): {} scored calls, average score {}%",
                department,
                period.label(),
                view.dashboard.total_calls,
                view.dashboard.avg_score
            );
            if let Some(best) = &view.best_by_score {
                println!("Best score: {} ({}%)", best.name, best.avg_score);
            }
            if let Some(best) = &view.best_by_count {
                println!("Most calls: {} ({} calls)", best.name, best.count);
            }
            for manager in &view.dashboard.per_manager {
                println!("- {}: {} calls, avg {}%", manager.name, manager.count, manager.avg_score);
            }
        }
        Commands::Manager {
            department,
            name,
            period,
            min_score,
            api_url,
        } => {
            let screen = [
                Action::SelectDepartment(department),
                Action::SelectView(View::AiCalls),
                Action::SelectManager(name),
                Action::SetManagerPeriod(period),
                Action::SetManagerMinScore(min_score),
            ]
            .into_iter()
            .fold(DashboardState::default(), state::reduce);

            let backend = lazy_source(&config, api_url)?;
            let loaded = source::load_for_screen(backend.as_ref(), &screen).await;
            warn_if_fallback(loaded.origin);
            let view = state::compute(&screen, &loaded.data, Local::now().naive_local());

            if let Some(detail) = view.manager_detail {
                println!(
                    "{} ({}): {} calls, average score {}%, total time {}",
                    detail.name,
                    period.label(),
                    detail.stats.total_calls,
                    detail.stats.avg_score,
                    detail.stats.total_duration
                );
                for call in &detail.calls {
                    println!("- {} | {} | {}%", call.display_date, call.duration_label, call.score);
                }
            }
        }
        Commands::Report {
            department,
            period,
            out,
            api_url,
        } => {
            let screen = [Action::SelectDepartment(department), Action::SelectView(View::AiCalls)]
                .into_iter()
                .fold(DashboardState::default(), state::reduce);

            let backend = lazy_source(&config, api_url)?;
            let loaded = source::load_for_screen(backend.as_ref(), &screen).await;
            let report = report::build_report(
                department,
                period,
                Local::now().naive_local(),
                &loaded.data,
                loaded.origin,
            );
            std::fs::write(&out, report)?;
            println!("Report written to {}.", out.display());
        }
        Commands::Export {
            department,
            csv,
            min_score,
            search,
            from,
            to,
            api_url,
        } => {
            let mut actions = vec![
                Action::SelectDepartment(department),
                Action::SelectView(View::RealCalls),
                Action::SetScoreFilter(min_score),
                Action::SetSearch(search),
            ];
            if let (Some(from), Some(to)) = (from, to) {
                actions.extend([Action::PickDate(from), Action::PickDate(to), Action::ApplyDateRange]);
            }
            let screen = actions.into_iter().fold(DashboardState::default(), state::reduce);

            let backend = lazy_source(&config, api_url)?;
            let loaded = source::load_for_screen(backend.as_ref(), &screen).await;
            warn_if_fallback(loaded.origin);
            let view = state::compute(&screen, &loaded.data, Local::now().naive_local());

            let file = std::fs::File::create(&csv)
                .with_context(|| format!("failed to create {}", csv.display()))?;
            let written = export::write_calls_csv(file, &view.calls)?;
            println!("Exported {written} calls to {}.", csv.display());
        }
    }

    Ok(())
}
