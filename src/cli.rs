//! Command line arguments.

use std::path::PathBuf;

use clap::Parser;

#[derive(Parser, Debug, Clone)]
#[command(name = "pilet-gateway")]
#[command(about = "Development gateway between a Piral emulator shell and the pilet feed", long_about = None)]
pub struct Cli {
    /// Compiled application of the pilet (e.g. bin/Debug/net8.0/MyPilet.dll)
    #[arg(long = "applicationpath")]
    pub application_path: PathBuf,

    /// Output directory holding the pilet packages, relative to the working directory
    #[arg(long = "outdir")]
    pub out_dir: PathBuf,

    /// Optional TOML configuration file
    #[arg(short, long)]
    pub config: Option<PathBuf>,

    /// Dev server settings file (default: blazor-devserversettings.json next to the application)
    #[arg(long)]
    pub settings: Option<PathBuf>,

    /// Address to listen on (overrides config)
    #[arg(short, long)]
    pub bind: Option<String>,

    /// Hosting environment name (overrides config)
    #[arg(short, long)]
    pub environment: Option<String>,

    /// Log level (overrides config; RUST_LOG wins over both)
    #[arg(long)]
    pub log_level: Option<String>,
}
