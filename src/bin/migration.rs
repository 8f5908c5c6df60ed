use clap::{Parser, Subcommand};
use sea_orm_migration::prelude::*;
use tracing::info;

use precast_erp::{config, db, migrator::Migrator};

/// Applies or reverts the precast ERP schema.
#[derive(Debug, Parser)]
#[command(name = "migration", version, about)]
struct Cli {
    /// Overrides the configured database url
    #[arg(long, env = "DATABASE_URL")]
    database_url: Option<String>,

    #[command(subcommand)]
    command: Option<Command>,
}

#[derive(Debug, Subcommand)]
enum Command {
    /// Apply pending migrations (default)
    Up {
        #[arg(long)]
        steps: Option<u32>,
    },
    /// Revert applied migrations, one step unless told otherwise
    Down {
        #[arg(long, default_value_t = 1)]
        steps: u32,
    },
    /// Show applied and pending migrations
    Status,
    /// Drop every table and reapply all migrations
    Fresh,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    let mut cfg = config::load_config()?;
    config::init_tracing(cfg.log_level(), cfg.log_json);
    if let Some(url) = cli.database_url {
        cfg.database_url = url;
    }

    info!("Starting database migration");
    let pool = db::establish_connection_from_app_config(&cfg).await?;

    match cli.command.unwrap_or(Command::Up { steps: None }) {
        Command::Up { steps } => Migrator::up(&pool, steps).await?,
        Command::Down { steps } => Migrator::down(&pool, Some(steps)).await?,
        Command::Status => Migrator::status(&pool).await?,
        Command::Fresh => Migrator::fresh(&pool).await?,
    }

    info!("Migration completed successfully");
    db::close_pool(pool).await?;
    Ok(())
}
