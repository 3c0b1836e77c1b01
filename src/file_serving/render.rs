use super::DirEntryInfo;

/// Render the listing page for `href` from already-classified entries.
///
/// Pure: entry records in, HTML document out. The embedded script connects
/// to the live-reload endpoint and reloads the page on a `refresh` message.
pub fn render_listing(href: &str, entries: &[DirEntryInfo], live_port: u16) -> String {
    let mut rows = String::new();
    for entry in entries {
        rows.push_str(&format!(
            "      <li><a href=\"{}\">{}</a> <span class=\"kind\">[{}]</span></li>\n",
            escape_html(&entry.link),
            escape_html(&entry.name),
            escape_html(entry.kind.label()),
        ));
    }

    format!(
        r#"<!DOCTYPE html>
<html>
  <head>
    <meta charset="utf-8">
    <title>Index of {title}</title>
    <style>
      body {{ font-family: monospace; margin: 2em; }}
      li {{ line-height: 1.6; }}
      .kind {{ color: #888; }}
    </style>
  </head>
  <body>
    <h1>Index of {title}</h1>
    <ul>
{rows}    </ul>
    <script>
      var sock = new WebSocket("ws://" + location.hostname + ":{live_port}");
      sock.onmessage = function (ev) {{
        if (ev.data === "refresh") {{
          location.reload();
        }}
      }};
    </script>
  </body>
</html>
"#,
        title = escape_html(href),
        rows = rows,
        live_port = live_port,
    )
}

fn escape_html(text: &str) -> String {
    text.replace('&', "&amp;")
        .replace('<', "&lt;")
        .replace('>', "&gt;")
        .replace('"', "&quot;")
}
