// File logger setup. A full-screen terminal UI cannot write logs to stdout,
// so everything goes to `evcal.log` in the data directory.
use crate::context::AppContext;
use anyhow::{Context, Result};
use log::LevelFilter;
use simplelog::{ConfigBuilder, WriteLogger};
use std::fs::OpenOptions;

pub fn init(ctx: &dyn AppContext, level: LevelFilter) -> Result<()> {
    if level == LevelFilter::Off {
        return Ok(());
    }
    let path = ctx.get_log_path()?;
    let file = OpenOptions::new()
        .create(true)
        .append(true)
        .open(&path)
        .with_context(|| format!("Failed to open log file {:?}", path))?;

    let config = ConfigBuilder::new()
        .set_target_level(LevelFilter::Error)
        .set_time_format_rfc3339()
        .build();

    // Errors only if a logger is already installed (e.g. a second init in tests).
    WriteLogger::init(level, config, file).context("Logger already initialized")?;
    log::info!("evcal {} started, logging at {}", env!("CARGO_PKG_VERSION"), level);
    Ok(())
}
