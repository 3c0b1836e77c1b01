use clap::Parser;
use std::path::PathBuf;

#[derive(Parser, Debug, Clone)]
#[command(author, version, about, long_about = None)]
pub struct Args {
    /// Directory to serve
    #[arg(short = 'd', long, default_value = ".")]
    pub serve_dir: PathBuf,

    /// Port to listen on
    #[arg(short, long, default_value = "8000")]
    pub port: u16,

    /// Gzip response bodies
    #[arg(short, long)]
    pub gzip: bool,

    /// Port for the live-reload websocket endpoint (defaults to port + 1)
    #[arg(short, long)]
    pub live_port: Option<u16>,

    /// Do not open a browser tab on startup
    #[arg(long)]
    pub no_open: bool,
}

impl Args {
    pub fn effective_live_port(&self) -> u16 {
        self.live_port.unwrap_or(self.port + 1)
    }
}
