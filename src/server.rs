use log::{debug, info};
use std::io::{self, BufRead, BufReader};
use std::net::{TcpListener, TcpStream};
use std::sync::Arc;
use std::thread;

use crate::args::Args;
use crate::browser::open_browser;
use crate::file_serving::handlers::handle_request;
use crate::live_reload::hub::LiveHub;
use crate::live_reload::watcher::ChangeWatcher;

pub fn start_server(args: Args) -> io::Result<()> {
    let listener = TcpListener::bind(("127.0.0.1", args.port))?;
    println!("Listening on: http://localhost:{}", args.port);
    println!("Serving directory: {}", args.serve_dir.display());

    let live_port = args.effective_live_port();
    let hub = LiveHub::start(live_port)?;
    let watcher = Arc::new(ChangeWatcher::new(Arc::new(hub)));

    if !args.no_open {
        open_browser(&format!("http://localhost:{}", args.port));
    }

    for stream in listener.incoming() {
        let stream = stream?;
        let args = args.clone();
        let watcher = Arc::clone(&watcher);

        thread::spawn(move || {
            if let Err(e) = handle_connection(stream, &args, live_port, &watcher) {
                eprintln!("Error handling connection: {}", e);
            }
        });
    }

    Ok(())
}

fn handle_connection(
    client: TcpStream,
    args: &Args,
    live_port: u16,
    watcher: &ChangeWatcher,
) -> io::Result<()> {
    info!("New connection received");

    let mut buf_reader = BufReader::new(&client);
    let mut first_line = String::new();
    buf_reader.read_line(&mut first_line)?;

    let mut headers = Vec::new();
    let mut line = String::new();
    while {
        line.clear();
        buf_reader.read_line(&mut line)?;
        !line.trim().is_empty()
    } {
        debug!("Header line: {}", line.trim());
        let parts: Vec<&str> = line.splitn(2, ':').collect();
        if parts.len() == 2 {
            headers.push((parts[0].trim().to_string(), parts[1].trim().to_string()));
        }
    }

    handle_request(client, args, live_port, watcher, &first_line, &headers)
}
