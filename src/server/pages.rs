//! HTML shell pages
//!
//! The shell is static; listings are fetched from `/api/files` by the
//! embedded script, which also reloads on live-update pushes.

use axum::{
    extract::{Form, State},
    http::{HeaderMap, StatusCode, Uri},
    response::{Html, IntoResponse, Response},
};
use serde::Deserialize;

use super::auth::{clear_session_cookie, redirect, redirect_with_cookie, session_cookie, session_token};
use super::error::ApiError;
use super::routes::decode_path;
use super::server::ServerState;
use crate::browse::BROWSE_PREFIX;
use crate::core::utils::redact;

/// Message shown after a rejected password
pub const INVALID_PASSWORD: &str = "Invalid password.";

/// Login form body
#[derive(Debug, Deserialize)]
pub struct LoginForm {
    #[serde(default)]
    pub password: String,
}

/// Route: GET /
pub async fn index(State(state): State<ServerState>) -> Html<String> {
    Html(render_shell(state.random_button, state.auth_enabled()))
}

/// Route: GET /browse/*path
pub async fn browse(State(state): State<ServerState>, uri: Uri) -> Result<Html<String>, ApiError> {
    let raw = uri.path().strip_prefix(BROWSE_PREFIX).unwrap_or_default();
    decode_path(raw)?;
    Ok(Html(render_shell(state.random_button, state.auth_enabled())))
}

/// Route: GET /login
pub async fn login_page(State(state): State<ServerState>, headers: HeaderMap) -> Response {
    if !state.auth_enabled() || state.has_valid_session(&headers) {
        return redirect("/");
    }
    Html(render_login(None)).into_response()
}

/// Route: POST /login
pub async fn login_submit(State(state): State<ServerState>, Form(form): Form<LoginForm>) -> Response {
    let Some(verifier) = state.verifier.as_ref() else {
        return redirect("/");
    };

    if !verifier.verify(&form.password) {
        tracing::warn!("Failed login attempt");
        return (StatusCode::UNAUTHORIZED, Html(render_login(Some(INVALID_PASSWORD)))).into_response();
    }

    let token = state.sessions.issue();
    tracing::info!("Session {} started", redact(&token));
    let max_age = state.sessions.ttl().map(|ttl| ttl.as_secs());
    redirect_with_cookie("/", session_cookie(&token, max_age))
}

/// Route: GET|POST /logout
pub async fn logout(State(state): State<ServerState>, headers: HeaderMap) -> Response {
    if let Some(token) = session_token(&headers) {
        state.sessions.remove(token);
        tracing::info!("Session {} ended", redact(token));
    }
    let target = if state.auth_enabled() { "/login" } else { "/" };
    redirect_with_cookie(target, clear_session_cookie())
}

/// Browser shell for `/` and `/browse/*`
pub fn render_shell(random_button: bool, show_logout: bool) -> String {
    let random = if random_button {
        r#"<button id="random">Random media</button>"#
    } else {
        ""
    };
    let logout = if show_logout {
        r#"<form method="post" action="/logout"><button>Log out</button></form>"#
    } else {
        ""
    };

    format!(
        r##"<!DOCTYPE html>
<html>
<head>
<meta charset="utf-8">
<title>treecast</title>
</head>
<body>
<header><a href="/">treecast</a> <span id="current"></span> {random} {logout}</header>
<p><a id="parent" hidden>..</a></p>
<table>
<thead><tr>
<th><a href="#" data-sort="name">Name</a></th>
<th><a href="#" data-sort="size">Size</a></th>
<th><a href="#" data-sort="date">Modified</a></th>
<th>Mode</th>
</tr></thead>
<tbody id="entries"></tbody>
</table>
<script>
const prefix = "{prefix}";
const rel = location.pathname.startsWith(prefix)
  ? decodeURIComponent(location.pathname.slice(prefix.length)) : "";
let sort = "", order = "asc";
async function load() {{
  const q = new URLSearchParams({{ path: rel, sort, order }});
  const res = await fetch("/api/files?" + q);
  if (!res.ok) {{ document.getElementById("entries").textContent = await res.text(); return; }}
  const data = await res.json();
  document.getElementById("current").textContent = "/" + data.currentPath;
  const parent = document.getElementById("parent");
  parent.hidden = !data.hasParent;
  parent.href = data.parentPath;
  const body = document.getElementById("entries");
  body.replaceChildren();
  for (const f of data.files) {{
    const tr = document.createElement("tr");
    const a = document.createElement("a");
    a.href = f.path;
    a.textContent = f.name + (f.isDir ? "/" : "");
    const cells = [a, f.isDir ? "" : String(f.size), new Date(f.modTime).toLocaleString(), f.mode];
    for (const c of cells) {{
      const td = document.createElement("td");
      td.append(c);
      tr.append(td);
    }}
    body.append(tr);
  }}
}}
for (const a of document.querySelectorAll("[data-sort]")) {{
  a.onclick = (e) => {{
    e.preventDefault();
    order = sort === a.dataset.sort && order === "asc" ? "desc" : "asc";
    sort = a.dataset.sort;
    load();
  }};
}}
const random = document.getElementById("random");
if (random) random.onclick = async () => {{
  const res = await fetch("/api/random-media?" + new URLSearchParams({{ path: rel }}));
  if (res.ok) location.href = await res.text(); else alert(await res.text());
}};
function live() {{
  const ws = new WebSocket((location.protocol === "https:" ? "wss://" : "ws://") + location.host + "/ws");
  ws.onmessage = (e) => {{ if (JSON.parse(e.data).type === "update") load(); }};
  ws.onclose = () => setTimeout(live, 2000);
}}
load();
live();
</script>
</body>
</html>
"##,
        prefix = BROWSE_PREFIX,
        random = random,
        logout = logout,
    )
}

/// Password form, optionally with an error line
pub fn render_login(error: Option<&str>) -> String {
    let error = error
        .map(|message| format!(r#"<p class="error">{}</p>"#, message))
        .unwrap_or_default();

    format!(
        r#"<!DOCTYPE html>
<html>
<head>
<meta charset="utf-8">
<title>treecast - login</title>
</head>
<body>
{error}
<form method="post" action="/login">
<input type="password" name="password" autofocus>
<button>Log in</button>
</form>
</body>
</html>
"#,
        error = error
    )
}

