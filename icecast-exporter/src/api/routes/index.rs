//! Landing page.

use axum::{extract::State, response::Html};

use crate::api::server::AppState;

pub async fn index(State(state): State<AppState>) -> Html<String> {
    Html(render_index(&state.telemetry_path))
}

/// Landing page linking to the metrics path.
pub fn render_index(telemetry_path: &str) -> String {
    format!(
        "<html>\n\
         <head><title>Icecast Exporter</title></head>\n\
         <body>\n\
         <h1>Icecast Exporter</h1>\n\
         <p><a href='{}'>Metrics</a></p>\n\
         </body>\n\
         </html>\n",
        escape_html(telemetry_path)
    )
}

fn escape_html(value: &str) -> String {
    let mut escaped = String::with_capacity(value.len());
    for c in value.chars() {
        match c {
            '&' => escaped.push_str("&amp;"),
            '<' => escaped.push_str("&lt;"),
            '>' => escaped.push_str("&gt;"),
            '"' => escaped.push_str("&quot;"),
            '\'' => escaped.push_str("&#39;"),
            _ => escaped.push(c),
        }
    }
    escaped
}
