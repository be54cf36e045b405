mod cli;
mod cmd;
mod command;
mod engine_ini;
mod logger;
mod p4;
mod paths;
mod project;
mod scripts;
mod workflow;
mod workspace;

use anyhow::Result;
use tracing::{error, info};

fn main() -> Result<()> {
    logger::init()?;
    info!(args = ?std::env::args().collect::<Vec<_>>(), "p4menu start");

    match cli::run() {
        Ok(result) => {
            info!("p4menu finished successfully");
            Ok(result)
        }
        Err(err) => {
            error!(error = ?err, "p4menu failed");
            Err(err)
        }
    }
}
