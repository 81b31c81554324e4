use clap::{Parser, Subcommand};

use crate::repos::weather_results::WeatherTable;

#[derive(Debug, Parser)]
#[command(about = "Activity weather CLI.")]
pub struct Cli {
    /// Connection URL of the activity store. Takes precedence over --database-id.
    #[arg(env = "WEATHER_DATABASE_URL", short, long)]
    pub database_url: Option<String>,
    /// Identifier of the database entry in the settings store
    #[arg(env = "DATABASE_ID", long)]
    pub database_id: Option<String>,
    /// Database name used with settings-store credentials
    #[arg(env = "DB_NAME", long)]
    pub database_name: Option<String>,
    #[arg(env = "WEATHER_TABLE", long, default_value = "activity_weather")]
    pub weather_table: WeatherTable,
    #[command(subcommand)]
    pub cmd: Command,
}

#[derive(Debug, Subcommand)]
pub enum Command {
    /// Estimate and store the weather of the given activities
    Process {
        #[arg(required = true)]
        activity_ids: Vec<i64>,
    },
    /// Process activities that have streams but no weather yet, newest first
    Pending {
        #[arg(long, default_value_t = 50)]
        limit: i64,
    },
    Db(DbCommand),
}

#[derive(Debug, Parser)]
pub struct DbCommand {
    #[command(subcommand)]
    pub cmd: DbSubCommand,
}

#[derive(Debug, Subcommand)]
pub enum DbSubCommand {
    /// Drop the weather table and re-run migrations
    Reset {
        /// Skip the confirmation prompt
        #[arg(long)]
        yes: bool,
    },
    Migrate,
}
