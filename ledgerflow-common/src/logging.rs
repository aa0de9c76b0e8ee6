//! Structured logging init, matching the teacher's `fern`-based dispatcher style.

use fern::colors::{Color, ColoredLevelConfig};
use log::LevelFilter;

/// Initializes global logging: colored level output to stdout, plain
/// date-rotated files under `log_dir` when one is given.
pub fn init(level: LevelFilter, log_dir: Option<&str>) -> Result<(), fern::InitError> {
    let colors = ColoredLevelConfig::new()
        .info(Color::Green)
        .warn(Color::Yellow)
        .error(Color::Red)
        .debug(Color::Blue)
        .trace(Color::Magenta);

    let mut dispatch = fern::Dispatch::new()
        .format(move |out, message, record| {
            out.finish(format_args!(
                "{} [{}] [{}] {}",
                chrono::Utc::now().to_rfc3339(),
                colors.color(record.level()),
                record.target(),
                message
            ))
        })
        .level(level)
        .chain(std::io::stdout());

    if let Some(dir) = log_dir {
        std::fs::create_dir_all(dir).map_err(fern::InitError::Io)?;
        dispatch = dispatch.chain(fern::DateBased::new(format!("{dir}/"), "%Y-%m-%d.log"));
    }

    dispatch.apply()?;
    Ok(())
}
