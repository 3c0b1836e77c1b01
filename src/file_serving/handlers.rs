use flate2::write::GzEncoder;
use flate2::Compression as GzipCompression;
use mime_guess::from_path;
use std::fs::{self, File};
use std::io::{self, Write};
use std::net::TcpStream;
use std::path::Path;
use std::time::Instant;

use crate::args::Args;
use crate::live_reload::watcher::ChangeWatcher;
use crate::{log_request, log_response};

use super::cache;
use super::listing::list_directory;
use super::path_utils::{resolve_path, ResolvedPath};
use super::render::render_listing;
use super::FileMeta;

/// Route one parsed request: directory paths get a rendered listing (and
/// re-arm the change watcher), file paths go through the cache negotiator and
/// are streamed, everything unresolvable collapses to a 404 naming the
/// request path.
pub fn handle_request(
    mut client: TcpStream,
    args: &Args,
    live_port: u16,
    watcher: &ChangeWatcher,
    request: &str,
    headers: &[(String, String)],
) -> io::Result<()> {
    log_request!(request);
    let start_time = Instant::now();

    let request_path = request.split_whitespace().nth(1).unwrap_or("/");

    let resolved = match resolve_path(&args.serve_dir, request_path) {
        Ok(Some(resolved)) => resolved,
        Ok(None) => return send_not_found(&mut client, request_path, start_time),
        Err(e) => {
            log::warn!("Cannot resolve {}: {}", request_path, e);
            return send_not_found(&mut client, request_path, start_time);
        }
    };

    let meta = match fs::metadata(&resolved.path).and_then(|m| FileMeta::from_metadata(&m)) {
        Ok(meta) => meta,
        Err(e) => {
            log::warn!("Cannot stat {}: {}", resolved.path.display(), e);
            return send_not_found(&mut client, request_path, start_time);
        }
    };

    if meta.is_dir {
        send_listing(client, &resolved, live_port, watcher, start_time, request_path)
    } else {
        send_file(
            &mut client,
            &resolved.path,
            &meta,
            headers,
            args.gzip,
            request_path,
            start_time,
        )
    }
}

fn send_listing(
    mut client: TcpStream,
    resolved: &ResolvedPath,
    live_port: u16,
    watcher: &ChangeWatcher,
    start_time: Instant,
    request_path: &str,
) -> io::Result<()> {
    let entries = match list_directory(&resolved.path, &resolved.href) {
        Ok(entries) => entries,
        Err(e) => {
            log::warn!("Cannot list {}: {}", resolved.path.display(), e);
            return send_not_found(&mut client, request_path, start_time);
        }
    };

    let html = render_listing(&resolved.href, &entries, live_port);

    client.write_all(b"HTTP/1.1 200 OK\r\n")?;
    client.write_all(b"Content-Type: text/html;charset=utf-8\r\n")?;
    client.write_all(format!("Content-Length: {}\r\n", html.len()).as_bytes())?;
    client.write_all(b"\r\n")?;
    client.write_all(html.as_bytes())?;
    client.flush()?;
    log_response!(200, start_time.elapsed());

    // Armed only once the listing response is fully on the wire.
    watcher.arm(&resolved.path);
    Ok(())
}

fn send_file(
    client: &mut TcpStream,
    path: &Path,
    meta: &FileMeta,
    headers: &[(String, String)],
    gzip: bool,
    request_path: &str,
    start_time: Instant,
) -> io::Result<()> {
    let decision = cache::evaluate(headers, meta);
    if decision.hit {
        client.write_all(b"HTTP/1.1 304 Not Modified\r\n")?;
        client.write_all(b"\r\n")?;
        log_response!(304, start_time.elapsed());
        return Ok(());
    }

    // Opened before the status line goes out, so a vanished file still gets
    // the 404 path instead of a half-written response.
    let mut file = match File::open(path) {
        Ok(file) => file,
        Err(e) => {
            log::warn!("Cannot open {}: {}", path.display(), e);
            return send_not_found(client, request_path, start_time);
        }
    };

    let mime_type = from_path(path).first_or_octet_stream().to_string();

    client.write_all(b"HTTP/1.1 200 OK\r\n")?;
    client.write_all(format!("Content-Type: {};charset=utf-8\r\n", mime_type).as_bytes())?;
    for (key, value) in &decision.headers {
        client.write_all(format!("{}: {}\r\n", key, value).as_bytes())?;
    }

    if gzip {
        // Header name kept as the original emitted it, not the standard
        // Content-Encoding. The body is close-delimited.
        client.write_all(b"Content-Coding: gzip\r\n")?;
        client.write_all(b"Connection: close\r\n")?;
        client.write_all(b"\r\n")?;
        let mut encoder = GzEncoder::new(&mut *client, GzipCompression::default());
        io::copy(&mut file, &mut encoder)?;
        encoder.finish()?;
    } else {
        client.write_all(format!("Content-Length: {}\r\n", meta.size).as_bytes())?;
        client.write_all(b"\r\n")?;
        io::copy(&mut file, client)?;
    }

    log_response!(200, start_time.elapsed());
    Ok(())
}

fn send_not_found(client: &mut TcpStream, request_path: &str, start_time: Instant) -> io::Result<()> {
    let body = format!("can not found {}", request_path);
    client.write_all(b"HTTP/1.1 404 Not Found\r\n")?;
    client.write_all(b"Content-Type: text/plain\r\n")?;
    client.write_all(format!("Content-Length: {}\r\n", body.len()).as_bytes())?;
    client.write_all(b"\r\n")?;
    client.write_all(body.as_bytes())?;
    log_response!(404, start_time.elapsed());
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::live_reload::Broadcast;
    use flate2::read::GzDecoder;
    use std::io::Read;
    use std::net::TcpListener;
    use std::path::PathBuf;
    use std::sync::Arc;
    use std::thread;
    use tempfile::{tempdir, TempDir};

    struct NullBroadcast;

    impl Broadcast for NullBroadcast {
        fn broadcast(&self, _message: &str) {}
    }

    fn test_args(serve_dir: PathBuf, gzip: bool) -> Args {
        Args {
            serve_dir,
            port: 0,
            gzip,
            live_port: None,
            no_open: true,
        }
    }

    /// Run `handle_request` over a loopback socket pair and capture the raw
    /// response bytes.
    fn roundtrip(
        root: &TempDir,
        gzip: bool,
        request: &str,
        headers: Vec<(String, String)>,
        watcher: Arc<ChangeWatcher>,
    ) -> Vec<u8> {
        let listener = TcpListener::bind("127.0.0.1:0").unwrap();
        let addr = listener.local_addr().unwrap();
        let mut client_side = TcpStream::connect(addr).unwrap();
        let (server_side, _) = listener.accept().unwrap();

        let args = test_args(root.path().to_path_buf(), gzip);
        let request = request.to_string();
        let server = thread::spawn(move || {
            handle_request(server_side, &args, 8001, &watcher, &request, &headers).unwrap();
        });

        let mut response = Vec::new();
        client_side.read_to_end(&mut response).unwrap();
        server.join().unwrap();
        response
    }

    fn null_watcher() -> Arc<ChangeWatcher> {
        Arc::new(ChangeWatcher::new(Arc::new(NullBroadcast)))
    }

    fn split_response(raw: &[u8]) -> (String, Vec<u8>) {
        let split = raw.windows(4).position(|w| w == b"\r\n\r\n").unwrap();
        let head = String::from_utf8_lossy(&raw[..split]).into_owned();
        (head, raw[split + 4..].to_vec())
    }

    #[test]
    fn serves_file_with_cache_miss_headers() {
        let root = tempdir().unwrap();
        fs::write(root.path().join("hello.txt"), "hello").unwrap();

        let raw = roundtrip(
            &root,
            false,
            "GET /hello.txt HTTP/1.1\r\n",
            Vec::new(),
            null_watcher(),
        );
        let (head, body) = split_response(&raw);

        assert!(head.starts_with("HTTP/1.1 200 OK"));
        assert!(head.contains("Content-Type: text/plain;charset=utf-8"));
        assert!(head.contains("Cache-Control: max-age=180"));
        assert!(head.contains("ETag: 5"));
        assert!(head.contains("Last-Modified: "));
        assert!(head.contains("Expires: "));
        assert!(head.contains("Content-Length: 5"));
        assert_eq!(body, b"hello");
    }

    #[test]
    fn replay_with_matching_etag_yields_empty_304() {
        let root = tempdir().unwrap();
        fs::write(root.path().join("hello.txt"), "hello").unwrap();

        let conditionals = vec![("If-None-Match".to_string(), "5".to_string())];
        let raw = roundtrip(
            &root,
            false,
            "GET /hello.txt HTTP/1.1\r\n",
            conditionals,
            null_watcher(),
        );
        let (head, body) = split_response(&raw);

        assert!(head.starts_with("HTTP/1.1 304 Not Modified"));
        assert!(!head.contains("ETag"));
        assert!(!head.contains("Cache-Control"));
        assert!(body.is_empty());
    }

    #[test]
    fn unknown_path_yields_404_naming_the_path() {
        let root = tempdir().unwrap();

        let raw = roundtrip(
            &root,
            false,
            "GET /nope.txt HTTP/1.1\r\n",
            Vec::new(),
            null_watcher(),
        );
        let (head, body) = split_response(&raw);

        assert!(head.starts_with("HTTP/1.1 404 Not Found"));
        assert!(head.contains("Content-Type: text/plain"));
        assert_eq!(String::from_utf8_lossy(&body), "can not found /nope.txt");
    }

    #[test]
    fn directory_request_renders_listing_and_arms_watcher() {
        let root = tempdir().unwrap();
        fs::write(root.path().join("a.txt"), "a").unwrap();
        fs::create_dir(root.path().join("sub")).unwrap();

        let watcher = null_watcher();
        let raw = roundtrip(
            &root,
            false,
            "GET / HTTP/1.1\r\n",
            Vec::new(),
            Arc::clone(&watcher),
        );
        let (head, body) = split_response(&raw);
        let html = String::from_utf8_lossy(&body);

        assert!(head.starts_with("HTTP/1.1 200 OK"));
        assert!(head.contains("Content-Type: text/html;charset=utf-8"));
        assert!(html.contains("a.txt"));
        assert!(html.contains("sub"));

        let canonical_root = fs::canonicalize(root.path()).unwrap();
        assert_eq!(watcher.watched(), Some(canonical_root));
    }

    #[test]
    fn gzip_body_decompresses_to_the_plain_body() {
        let root = tempdir().unwrap();
        let content = "some compressible content, repeated repeated repeated";
        fs::write(root.path().join("data.txt"), content).unwrap();

        let plain = roundtrip(
            &root,
            false,
            "GET /data.txt HTTP/1.1\r\n",
            Vec::new(),
            null_watcher(),
        );
        let (_, plain_body) = split_response(&plain);

        let gzipped = roundtrip(
            &root,
            true,
            "GET /data.txt HTTP/1.1\r\n",
            Vec::new(),
            null_watcher(),
        );
        let (head, gzip_body) = split_response(&gzipped);

        assert!(head.contains("Content-Coding: gzip"));
        assert!(head.contains("Connection: close"));

        let mut decoded = Vec::new();
        GzDecoder::new(&gzip_body[..])
            .read_to_end(&mut decoded)
            .unwrap();
        assert_eq!(decoded, plain_body);
        assert_eq!(decoded, content.as_bytes());
    }
}
