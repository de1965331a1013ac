//! Route handlers of the home page application.

use std::sync::Arc;

use bytes::Bytes;
use http::Request;

use crate::config::Config;
use crate::response::Html;
use crate::router::Router;
use crate::state::AppState;

/// All routes served by the application.
pub fn routes() -> Router {
    Router::new().get("/", home)
}

/// `GET /`: the landing page, titled with the configured site name.
pub async fn home(_req: Request<Bytes>, state: Arc<AppState>) -> Html<String> {
    let site_name = state
        .get::<Config>()
        .map(|config| config.site_name.as_str())
        .unwrap_or("Home");

    Html(render_home(site_name))
}

fn render_home(site_name: &str) -> String {
    let name = escape_html(site_name);
    format!(
        "<!DOCTYPE html>\n\
         <html lang=\"en\">\n\
         <head><meta charset=\"utf-8\"><title>{name}</title></head>\n\
         <body><h1>{name}</h1></body>\n\
         </html>\n"
    )
}

fn escape_html(input: &str) -> String {
    let mut out = String::with_capacity(input.len());
    for c in input.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            '\'' => out.push_str("&#39;"),
            _ => out.push(c),
        }
    }
    out
}
