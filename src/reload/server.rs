// src/reload/server.rs

//! Static preview server plus live-reload WebSocket.
//!
//! Plain threads only: `tiny_http` serves the output directory, a
//! `tungstenite` acceptor hands each handshake to its own thread, and a
//! broadcaster thread owns the writes to connected browsers. Both ports
//! retry upwards when taken.

use std::net::{SocketAddr, TcpListener, TcpStream};
use std::path::{Path, PathBuf};
use std::sync::mpsc::{self, Receiver, Sender};
use std::sync::{Arc, Mutex, MutexGuard};
use std::thread;
use std::time::Duration;

use anyhow::{anyhow, Context, Result};
use percent_encoding::percent_decode_str;
use tiny_http::{Header, Method, Request, Response, Server, StatusCode};
use tracing::{debug, info, warn};
use tungstenite::{Message, WebSocket};

use crate::config::ServeSection;
use crate::fs::FileSystem;
use crate::reload::client::inject_client;
use crate::reload::{reload_message, ReloadNotifier};
use crate::source::is_contained;
use crate::types::ReloadKind;

const MAX_PORT_RETRIES: u16 = 10;
const HANDSHAKE_TIMEOUT: Duration = Duration::from_secs(5);

type Clients = Arc<Mutex<Vec<WebSocket<TcpStream>>>>;

#[derive(Debug)]
pub struct PreviewServer {
    http_addr: SocketAddr,
    ws_port: u16,
    broadcast: Sender<String>,
}

impl PreviewServer {
    /// Bind both ports and start serving `root` in background threads.
    pub fn start(fs: Arc<dyn FileSystem>, root: PathBuf, cfg: &ServeSection) -> Result<Arc<Self>> {
        let (ws_listener, ws_port) = try_bind_port(&cfg.open_host, cfg.ws_port, MAX_PORT_RETRIES)?;
        let (http, http_addr) = bind_http_with_retry(&cfg.open_host, cfg.port, Some(ws_port))?;

        let clients: Clients = Arc::new(Mutex::new(Vec::new()));
        let (broadcast, messages) = mpsc::channel::<String>();

        {
            let clients = Arc::clone(&clients);
            thread::Builder::new()
                .name("assetwatch-ws".into())
                .spawn(move || accept_clients(ws_listener, clients))
                .context("failed to spawn websocket thread")?;
        }

        thread::Builder::new()
            .name("assetwatch-broadcast".into())
            .spawn(move || broadcast_messages(messages, clients))
            .context("failed to spawn broadcast thread")?;

        thread::Builder::new()
            .name("assetwatch-http".into())
            .spawn(move || {
                for request in http.incoming_requests() {
                    if let Err(err) = handle_request(fs.as_ref(), &root, ws_port, request) {
                        warn!(error = %err, "preview request failed");
                    }
                }
            })
            .context("failed to spawn http thread")?;

        info!(url = %format!("http://{http_addr}"), ws_port, "preview server listening");

        Ok(Arc::new(Self {
            http_addr,
            ws_port,
            broadcast,
        }))
    }

    pub fn http_addr(&self) -> SocketAddr {
        self.http_addr
    }

    pub fn ws_port(&self) -> u16 {
        self.ws_port
    }
}

impl ReloadNotifier for PreviewServer {
    fn notify(&self, kind: ReloadKind) {
        let Some(message) = reload_message(kind) else {
            return;
        };

        // Socket writes happen on the broadcaster thread, never here.
        if self.broadcast.send(message).is_err() {
            warn!(%kind, "reload broadcaster is gone; dropping message");
        }
    }
}

fn lock(clients: &Clients) -> MutexGuard<'_, Vec<WebSocket<TcpStream>>> {
    clients
        .lock()
        .unwrap_or_else(|poisoned| poisoned.into_inner())
}

fn broadcast_messages(messages: Receiver<String>, clients: Clients) {
    for message in messages {
        let mut clients = lock(&clients);
        clients.retain_mut(|ws| ws.send(Message::text(message.clone())).is_ok());
        info!(clients = clients.len(), %message, "reload broadcast");
    }
}

fn accept_clients(listener: TcpListener, clients: Clients) {
    for stream in listener.incoming() {
        let stream = match stream {
            Ok(stream) => stream,
            Err(err) => {
                debug!(error = %err, "websocket accept failed");
                continue;
            }
        };

        let clients = Arc::clone(&clients);
        let spawned = thread::Builder::new()
            .name("assetwatch-ws-handshake".into())
            .spawn(move || handshake(stream, &clients));
        if let Err(err) = spawned {
            warn!(error = %err, "failed to spawn websocket handshake thread");
        }
    }
}

/// Complete one handshake; a client that stalls is dropped after
/// [`HANDSHAKE_TIMEOUT`].
fn handshake(stream: TcpStream, clients: &Clients) {
    if let Err(err) = stream.set_read_timeout(Some(HANDSHAKE_TIMEOUT)) {
        debug!(error = %err, "failed to set handshake timeout");
        return;
    }

    match tungstenite::accept(stream) {
        Ok(ws) => {
            if let Err(err) = ws.get_ref().set_read_timeout(None) {
                debug!(error = %err, "failed to clear handshake timeout");
            }
            debug!("reload client connected");
            lock(clients).push(ws);
        }
        Err(err) => debug!(error = %err, "websocket handshake failed"),
    }
}

fn try_bind_port(host: &str, base_port: u16, max_retries: u16) -> Result<(TcpListener, u16)> {
    let mut last_error = None;

    for offset in 0..max_retries {
        let port = base_port.saturating_add(offset);
        match TcpListener::bind((host, port)) {
            Ok(listener) => {
                let actual_port = listener.local_addr()?.port();
                if offset > 0 {
                    info!(requested = base_port, port = actual_port, "websocket port in use; moved");
                }
                return Ok((listener, actual_port));
            }
            Err(e) => last_error = Some(e),
        }
    }

    Err(anyhow!(
        "failed to bind websocket server after {} attempts: {}",
        max_retries,
        last_error.map(|e| e.to_string()).unwrap_or_default()
    ))
}

fn bind_http_with_retry(
    host: &str,
    base_port: u16,
    avoid: Option<u16>,
) -> Result<(Server, SocketAddr)> {
    let mut last_error = String::new();

    for offset in 0..MAX_PORT_RETRIES {
        let port = base_port.saturating_add(offset);
        if Some(port) == avoid {
            continue;
        }
        match Server::http((host, port)) {
            Ok(server) => {
                let addr = server
                    .server_addr()
                    .to_ip()
                    .ok_or_else(|| anyhow!("server bound to a non-IP address"))?;
                if offset > 0 {
                    info!(requested = base_port, port, "http port in use; moved");
                }
                return Ok((server, addr));
            }
            Err(e) => last_error = e.to_string(),
        }
    }

    Err(anyhow!(
        "failed to bind preview server after {MAX_PORT_RETRIES} attempts (from port {base_port}): {last_error}"
    ))
}

/// Map a request URL to a file under `root`.
///
/// Query strings and fragments are ignored, the path is percent-decoded,
/// directories resolve to their `index.html`, and anything escaping `root`
/// is refused.
pub fn resolve_request_path(fs: &dyn FileSystem, root: &Path, url: &str) -> Option<PathBuf> {
    let path = url.split(['?', '#']).next().unwrap_or("");
    let decoded = percent_decode_str(path).decode_utf8().ok()?;
    let rel = Path::new(decoded.trim_start_matches('/'));
    if !is_contained(rel) {
        return None;
    }

    let candidate = root.join(rel);
    if fs.is_dir(&candidate) {
        let index = candidate.join("index.html");
        return fs.is_file(&index).then_some(index);
    }
    fs.is_file(&candidate).then_some(candidate)
}

pub fn content_type(path: &Path) -> &'static str {
    match path
        .extension()
        .and_then(|e| e.to_str())
        .map(|e| e.to_ascii_lowercase())
        .as_deref()
    {
        Some("html" | "htm") => "text/html; charset=utf-8",
        Some("css") => "text/css; charset=utf-8",
        Some("js") => "application/javascript; charset=utf-8",
        Some("json" | "map") => "application/json",
        Some("svg") => "image/svg+xml",
        Some("png") => "image/png",
        Some("jpg" | "jpeg") => "image/jpeg",
        Some("gif") => "image/gif",
        Some("ico") => "image/x-icon",
        Some("woff2") => "font/woff2",
        Some("woff") => "font/woff",
        _ => "application/octet-stream",
    }
}

fn make_header(name: &str, value: &str) -> Result<Header> {
    Header::from_bytes(name.as_bytes(), value.as_bytes())
        .map_err(|_| anyhow!("invalid header {name}: {value}"))
}

fn handle_request(fs: &dyn FileSystem, root: &Path, ws_port: u16, request: Request) -> Result<()> {
    if !matches!(request.method(), Method::Get | Method::Head) {
        let response =
            Response::from_string("405 Method Not Allowed").with_status_code(StatusCode(405));
        request.respond(response)?;
        return Ok(());
    }

    let Some(path) = resolve_request_path(fs, root, request.url()) else {
        debug!(url = request.url(), "not found");
        let response = Response::from_string("404 Not Found")
            .with_status_code(StatusCode(404))
            .with_header(make_header("Content-Type", "text/plain; charset=utf-8")?);
        request.respond(response)?;
        return Ok(());
    };

    let mime = content_type(&path);
    let mut body = fs.read(&path)?;
    if mime.starts_with("text/html") {
        body = inject_client(&body, ws_port);
    }

    let response = Response::from_data(body)
        .with_header(make_header("Content-Type", mime)?)
        .with_header(make_header("Cache-Control", "no-cache")?);
    request.respond(response)?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fs::mock::MockFileSystem;

    fn site() -> MockFileSystem {
        let fs = MockFileSystem::new();
        fs.add_file("/site/index.html", "<body></body>");
        fs.add_file("/site/css/main.min.css", "a{}");
        fs.add_file("/secret.txt", "nope");
        fs
    }

    #[test]
    fn directories_resolve_to_index() {
        let fs = site();
        let root = Path::new("/site");
        assert_eq!(
            resolve_request_path(&fs, root, "/"),
            Some(PathBuf::from("/site/index.html"))
        );
        assert_eq!(
            resolve_request_path(&fs, root, "/css/main.min.css?v=3"),
            Some(PathBuf::from("/site/css/main.min.css"))
        );
        assert_eq!(resolve_request_path(&fs, root, "/css/"), None);
    }

    #[test]
    fn traversal_is_refused() {
        let fs = site();
        assert_eq!(
            resolve_request_path(&fs, Path::new("/site"), "/../secret.txt"),
            None
        );
    }

    #[test]
    fn percent_escapes_are_decoded() {
        let fs = site();
        fs.add_file("/site/img/café.png", "png");
        fs.add_file("/site/a&b.html", "<p></p>");
        fs.add_file("/site/my notes.txt", "txt");
        let root = Path::new("/site");

        assert_eq!(
            resolve_request_path(&fs, root, "/img/caf%C3%A9.png"),
            Some(PathBuf::from("/site/img/café.png"))
        );
        assert_eq!(
            resolve_request_path(&fs, root, "/a%26b.html"),
            Some(PathBuf::from("/site/a&b.html"))
        );
        assert_eq!(
            resolve_request_path(&fs, root, "/my%20notes.txt"),
            Some(PathBuf::from("/site/my notes.txt"))
        );
    }

    #[test]
    fn encoded_traversal_is_refused() {
        let fs = site();
        let root = Path::new("/site");
        assert_eq!(resolve_request_path(&fs, root, "/%2E%2E/secret.txt"), None);
        assert_eq!(resolve_request_path(&fs, root, "/css/%2e%2e%2F..%2Fsecret.txt"), None);
        assert_eq!(resolve_request_path(&fs, root, "/%FF.html"), None);
    }

    #[test]
    fn content_types_by_extension() {
        assert_eq!(content_type(Path::new("a.CSS")), "text/css; charset=utf-8");
        assert_eq!(content_type(Path::new("a.bin")), "application/octet-stream");
    }
}
