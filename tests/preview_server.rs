// tests/preview_server.rs

use std::error::Error;
use std::io::{Read, Write};
use std::net::TcpStream;
use std::sync::{mpsc, Arc};
use std::thread;
use std::time::Duration;

use assetwatch::config::ServeSection;
use assetwatch::fs::RealFileSystem;
use assetwatch::reload::{PreviewServer, ReloadNotifier};
use assetwatch::types::ReloadKind;
use assetwatch_test_utils::init_tracing;
use tungstenite::Message;

type TestResult = Result<(), Box<dyn Error>>;

fn http_get(port: u16, path: &str) -> std::io::Result<String> {
    let mut stream = TcpStream::connect(("127.0.0.1", port))?;
    stream.set_read_timeout(Some(Duration::from_secs(5)))?;
    write!(
        stream,
        "GET {path} HTTP/1.1\r\nHost: localhost\r\nConnection: close\r\n\r\n"
    )?;
    let mut response = String::new();
    stream.read_to_string(&mut response)?;
    Ok(response)
}

fn serve_section(port: u16) -> ServeSection {
    ServeSection {
        port,
        ws_port: port + 1,
        ..ServeSection::default()
    }
}

#[test]
fn serves_pages_with_reload_client() -> TestResult {
    init_tracing();
    let dir = tempfile::tempdir()?;
    std::fs::write(dir.path().join("index.html"), "<html><body><h1>Hi</h1></body></html>")?;

    let server = PreviewServer::start(
        Arc::new(RealFileSystem),
        dir.path().to_path_buf(),
        &serve_section(38_410),
    )?;
    let port = server.http_addr().port();

    let page = http_get(port, "/")?;
    assert!(page.starts_with("HTTP/1.1 200"), "{page}");
    assert!(page.contains("<h1>Hi</h1>"));
    assert!(page.contains(&format!("var port = {};", server.ws_port())));
    let script_at = page.find("<script>").unwrap();
    let body_end = page.rfind("</body>").unwrap();
    assert!(script_at < body_end);

    let missing = http_get(port, "/nope.css")?;
    assert!(missing.starts_with("HTTP/1.1 404"), "{missing}");
    Ok(())
}

#[test]
fn broadcasts_reload_messages() -> TestResult {
    init_tracing();
    let dir = tempfile::tempdir()?;

    let server = PreviewServer::start(
        Arc::new(RealFileSystem),
        dir.path().to_path_buf(),
        &serve_section(38_430),
    )?;

    let (mut ws, _) = tungstenite::connect(format!("ws://127.0.0.1:{}", server.ws_port()))?;
    // Registration happens on the acceptor thread after the handshake.
    thread::sleep(Duration::from_millis(300));

    server.notify(ReloadKind::None);
    server.notify(ReloadKind::Style);
    server.notify(ReloadKind::Full);

    let first = ws.read()?;
    let second = ws.read()?;
    assert_eq!(first, Message::text(r#"{"type":"style"}"#));
    assert_eq!(second, Message::text(r#"{"type":"reload"}"#));
    Ok(())
}

#[test]
fn stalled_handshake_does_not_block_other_clients() -> TestResult {
    init_tracing();
    let dir = tempfile::tempdir()?;

    let server = PreviewServer::start(
        Arc::new(RealFileSystem),
        dir.path().to_path_buf(),
        &serve_section(38_450),
    )?;
    let ws_port = server.ws_port();

    // Connects but never sends the upgrade request.
    let _silent = TcpStream::connect(("127.0.0.1", ws_port))?;
    thread::sleep(Duration::from_millis(100));

    let (done_tx, done_rx) = mpsc::channel();
    thread::spawn(move || {
        let connected = tungstenite::connect(format!("ws://127.0.0.1:{ws_port}")).is_ok();
        let _ = done_tx.send(connected);
    });

    let connected = done_rx.recv_timeout(Duration::from_secs(2))?;
    assert!(connected, "second client completed its handshake");
    Ok(())
}
