use log::{info, warn};
use std::io;
use std::sync::Mutex;
use std::thread;
use ws::{Builder, Handler, Message, Result as WsResult, Sender};

use super::Broadcast;

/// One connected live-reload client. Inbound messages are logged and
/// otherwise ignored; the interesting direction is server to client.
struct LiveClient;

impl Handler for LiveClient {
    fn on_message(&mut self, msg: Message) -> WsResult<()> {
        info!("Live client message: {}", msg);
        Ok(())
    }
}

/// Broadcast handle over the set of currently connected live-reload clients.
/// The connection set itself lives inside the websocket transport; this only
/// holds the broadcaster.
pub struct LiveHub {
    broadcaster: Mutex<Sender>,
}

impl LiveHub {
    /// Bind the websocket endpoint on `port` and run it on a background
    /// thread. Clients that connect and disconnect are tracked by the
    /// transport; missed messages are not replayed.
    pub fn start(port: u16) -> io::Result<LiveHub> {
        let socket = Builder::new()
            .build(|_out: Sender| LiveClient)
            .map_err(|e| io::Error::new(io::ErrorKind::Other, e.to_string()))?;
        let broadcaster = socket.broadcaster();

        thread::spawn(move || {
            if let Err(e) = socket.listen(("127.0.0.1", port)) {
                warn!("Live-reload endpoint failed: {}", e);
            }
        });
        info!("Live-reload endpoint on ws://localhost:{}", port);

        Ok(LiveHub {
            broadcaster: Mutex::new(broadcaster),
        })
    }
}

impl Broadcast for LiveHub {
    fn broadcast(&self, message: &str) {
        let broadcaster = self.broadcaster.lock().unwrap();
        if let Err(e) = broadcaster.send(message) {
            warn!("Live-reload broadcast failed: {}", e);
        }
    }
}
