//! Creates the database and its tables below the configured location.

use clap::Parser;
use schmatch_backend::error::AppError;
use schmatch_backend::setup_logging;
use schmatch_config::get_config;
use schmatch_database::initialize_database;

#[derive(Parser, Debug)]
#[command(about = "Create the schmatch database and its tables")]
struct Args {
    /// Remove all existing tables and their rows beforehand
    #[arg(long)]
    drop_first: bool,
}

fn main() -> Result<(), AppError> {
    let args = Args::parse();
    setup_logging();

    let config = get_config()?;
    initialize_database(&config.database_path(), args.drop_first)?;
    Ok(())
}
