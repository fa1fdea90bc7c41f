use std::path::PathBuf;

use clap::Parser;
use log::{info, LevelFilter};

/// CLI interface for benchmarking the implicit BVH traversal engine on
/// synthetic scenes.
#[derive(Parser, Debug, Clone)]
#[command(author, version, about, long_about = None)]
pub struct Options {
    /// The log level (off, error, warn, info, debug, trace)
    #[arg(short, long, default_value_t = LevelFilter::Info)]
    pub log_level: LevelFilter,

    /// The benchmark configuration file
    #[arg(short, long)]
    pub config: PathBuf,

    /// Optionally, write the built index to the given file
    #[arg(long)]
    pub index_out: Option<PathBuf>,
}

impl Options {
    /// Dumps the options to the log.
    pub fn dump_to_log(&self) {
        info!("Log Level: {}", self.log_level);
        info!("Config: {:?}", self.config);
        info!("Index output: {:?}", self.index_out);
    }
}
