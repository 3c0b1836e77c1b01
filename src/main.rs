use clap::Parser;
use std::io;

mod args;
mod browser;
mod file_serving;
mod live_reload;
mod logging;
mod server;

use args::Args;
use server::start_server;

fn main() -> io::Result<()> {
    logging::setup_logging();
    let args = Args::parse();
    start_server(args)
}
