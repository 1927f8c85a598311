use std::path::PathBuf;

use clap::Parser;

#[derive(Parser)]
#[command(author, version, about)]
pub struct Cli {
    /// Container file backing the emulated disk.
    #[arg(long, default_value = "TFSDiskFile")]
    pub container: PathBuf,

    /// Capacity of the container in bytes.
    #[arg(long, default_value_t = 65535)]
    pub size: u64,

    /// Block size in bytes.
    #[arg(long, default_value_t = 128)]
    pub block_size: usize,
}
