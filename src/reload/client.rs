// src/reload/client.rs

//! Browser side of live reload: the injected script.

/// Reconnecting WebSocket client. `style` messages re-fetch stylesheets in
/// place; `reload` reloads the page.
const CLIENT_JS: &str = r#"<script>
(function () {
  var port = __WS_PORT__;
  function restyle() {
    var links = document.querySelectorAll('link[rel="stylesheet"]');
    for (var i = 0; i < links.length; i++) {
      var url = links[i].href.split('?')[0];
      links[i].href = url + '?v=' + Date.now();
    }
  }
  function connect() {
    var ws = new WebSocket('ws://' + location.hostname + ':' + port);
    ws.onmessage = function (ev) {
      var msg;
      try { msg = JSON.parse(ev.data); } catch (e) { return; }
      if (msg.type === 'style') { restyle(); } else if (msg.type === 'reload') { location.reload(); }
    };
    ws.onclose = function () { setTimeout(connect, 1000); };
  }
  connect();
})();
</script>"#;

pub fn client_script(ws_port: u16) -> String {
    CLIENT_JS.replace("__WS_PORT__", &ws_port.to_string())
}

/// Insert the client script before the last `</body>`, or append it when the
/// page has none.
pub fn inject_client(content: &[u8], ws_port: u16) -> Vec<u8> {
    const PATTERN: &[u8] = b"</body>";

    let script = client_script(ws_port);
    let script = script.as_bytes();
    let mut result = Vec::with_capacity(content.len() + script.len());

    match content
        .windows(PATTERN.len())
        .rposition(|w| w.eq_ignore_ascii_case(PATTERN))
    {
        Some(pos) => {
            result.extend_from_slice(&content[..pos]);
            result.extend_from_slice(script);
            result.extend_from_slice(&content[pos..]);
        }
        None => {
            result.extend_from_slice(content);
            result.extend_from_slice(script);
        }
    }
    result
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn script_goes_before_closing_body() {
        let page = b"<html><body><p>hi</p></BODY></html>";
        let out = String::from_utf8(inject_client(page, 4000)).unwrap();
        let script_at = out.find("<script>").unwrap();
        let body_at = out.find("</BODY>").unwrap();
        assert!(script_at < body_at);
        assert!(out.contains("var port = 4000;"));
    }

    #[test]
    fn script_is_appended_without_body() {
        let out = String::from_utf8(inject_client(b"<p>fragment</p>", 1)).unwrap();
        assert!(out.starts_with("<p>fragment</p><script>"));
    }
}
