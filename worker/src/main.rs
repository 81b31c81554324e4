use anyhow::{Context, Result};
use clap::Parser;
use cli::{Cli, Command, DbSubCommand};
use config::{BatchConfig, MeteoConfig};
use dialoguer::Confirm;
use open_meteo::OpenMeteo;
use pipeline::{RunContext, Worker};

mod cli;
mod config;
mod db;
mod error;
mod models;
mod open_meteo;
mod pipeline;
mod repos;
mod retry;
mod settings;
mod streams;

#[tokio::main]
async fn main() -> Result<()> {
    dotenvy::dotenv().ok();
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let args = Cli::parse();

    let pg_config = settings::database_config(
        args.database_url.as_deref(),
        args.database_id.as_deref(),
        args.database_name.as_deref(),
    )
    .await?;
    let pool = db::pool(pg_config).await?;

    match args.cmd {
        Command::Db(db_cmd) => match db_cmd.cmd {
            DbSubCommand::Migrate => db::migrate(&pool, &args.weather_table).await,
            DbSubCommand::Reset { yes } => {
                let confirmed = yes
                    || Confirm::new()
                        .with_prompt(format!("Drop table {} and re-run migrations?", args.weather_table))
                        .default(false)
                        .interact()?;
                if confirmed {
                    db::reset(&pool, &args.weather_table).await
                } else {
                    log::info!("Reset aborted");
                    Ok(())
                }
            }
        },
        Command::Process { activity_ids } => {
            let worker = worker(pool, args.weather_table)?;
            pipeline::run(&RunContext::new(), &worker, &activity_ids).await?;
            Ok(())
        }
        Command::Pending { limit } => {
            let worker = worker(pool, args.weather_table)?;
            pipeline::run_pending(&RunContext::new(), &worker, limit).await?;
            Ok(())
        }
    }
}

fn worker(pool: db::Pool, table: repos::weather_results::WeatherTable) -> Result<Worker<OpenMeteo>> {
    let meteo = MeteoConfig::from_env().context("Invalid WEATHER_METEO_* config")?;
    let batch = BatchConfig::from_env().context("Invalid WEATHER_BATCH_* config")?;
    let source = OpenMeteo::new(&meteo).context("Failed to build weather API client")?;
    Ok(Worker {
        pool,
        source,
        table,
        batch,
    })
}
