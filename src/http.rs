//! HTTP front end for article-outline
//!
//! Serves the outline form, a text download of the last outline, and a small
//! JSON API. Each client gets its own [`Session`], found through the
//! `outline_session` cookie; a new generation replaces that client's
//! previous outline wholesale. The session lock is released while the
//! remote call runs.

use axum::{
    Form, Json, Router,
    extract::{Query, State},
    http::{HeaderMap, HeaderValue, StatusCode, header},
    response::{Html, IntoResponse, Response},
    routing::{get, post},
};
use serde::{Deserialize, Serialize};
use serde_json::json;
use std::{net::SocketAddr, sync::Arc};
use tokio::sync::Mutex;
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;

use crate::classifier::classify;
use crate::config::Config;
use crate::error::{FallbackReason, NoticeLevel, OutlineError, Result};
use crate::generator::{Generation, OutlineSource, model_note};
use crate::sessions::{GeneratorFactory, Session, SessionStore, default_factory, normalize_topic};

/// Cookie carrying the client's session id
pub const SESSION_COOKIE: &str = "outline_session";

/// Shared state for HTTP server
#[derive(Clone)]
pub struct HttpState {
    pub config: Arc<Config>,
    pub sessions: Arc<SessionStore>,
}

impl HttpState {
    pub fn new(config: Config) -> Self {
        Self::with_factory(config, default_factory())
    }

    /// State whose sessions build generators through `factory`.
    pub fn with_factory(config: Config, factory: GeneratorFactory) -> Self {
        let sessions = SessionStore::new(
            config.generation.clone(),
            config.server.session_capacity,
            factory,
        );
        Self {
            config: Arc::new(config),
            sessions: Arc::new(sessions),
        }
    }

    fn env_token(&self) -> Option<&str> {
        self.config.runtime.hf_token.as_deref()
    }

    /// Environment token wins over a token typed into the form.
    fn credential<'a>(&'a self, supplied: Option<&'a str>) -> Option<&'a str> {
        self.env_token()
            .or(supplied.map(str::trim).filter(|t| !t.is_empty()))
    }

    /// Existing session for the request's cookie, if any.
    async fn current_session(&self, headers: &HeaderMap) -> Option<Arc<Mutex<Session>>> {
        match session_cookie(headers) {
            Some(id) => self.sessions.get(id).await,
            None => None,
        }
    }

    /// Generate for one client without holding its session lock across the remote call.
    async fn generate(
        &self,
        headers: &HeaderMap,
        topic: &str,
        keyword: &str,
        supplied_token: Option<&str>,
    ) -> (Option<String>, Arc<Mutex<Session>>, Result<()>) {
        let (id, session, created) = self
            .sessions
            .get_or_create(session_cookie(headers))
            .await;
        let new_id = created.then_some(id);

        let topic = match normalize_topic(topic) {
            Ok(t) => t,
            Err(e) => return (new_id, session, Err(e)),
        };

        let prepared = session
            .lock()
            .await
            .prepare(self.credential(supplied_token));
        let generator = match prepared {
            Ok(g) => g,
            Err(e) => return (new_id, session, Err(e)),
        };

        let generation = generator.generate(topic, keyword.trim()).await;
        session.lock().await.store(generation);
        (new_id, session, Ok(()))
    }
}

/// Session id from the request's `Cookie` headers.
fn session_cookie(headers: &HeaderMap) -> Option<&str> {
    headers
        .get_all(header::COOKIE)
        .iter()
        .filter_map(|v| v.to_str().ok())
        .flat_map(|v| v.split(';'))
        .filter_map(|pair| pair.trim().split_once('='))
        .find(|(name, _)| *name == SESSION_COOKIE)
        .map(|(_, value)| value)
}

/// Attach `Set-Cookie` for a session created by this request.
fn with_session_cookie(mut response: Response, new_id: Option<String>) -> Response {
    if let Some(id) = new_id
        && let Ok(value) = HeaderValue::from_str(&format!(
            "{SESSION_COOKIE}={id}; Path=/; HttpOnly; SameSite=Lax"
        ))
    {
        response.headers_mut().append(header::SET_COOKIE, value);
    }
    response
}

impl IntoResponse for OutlineError {
    fn into_response(self) -> Response {
        let status = match &self {
            OutlineError::InvalidParams { .. } => StatusCode::BAD_REQUEST,
            _ => StatusCode::INTERNAL_SERVER_ERROR,
        };
        (
            status,
            Json(json!({"error": {"code": status.as_u16(), "message": self.to_string()}})),
        )
            .into_response()
    }
}

#[derive(Debug, Deserialize)]
pub struct GenerateForm {
    pub topic: String,
    #[serde(default)]
    pub keyword: String,
    #[serde(default)]
    pub token: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct OutlineRequest {
    pub topic: String,
    #[serde(default)]
    pub keyword: String,
    #[serde(default)]
    pub token: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct ClassifyQuery {
    #[serde(default)]
    pub topic: String,
}

#[derive(Debug, Serialize)]
pub struct NoticeBody {
    pub code: &'static str,
    pub level: NoticeLevel,
    pub message: String,
    pub credential_error: bool,
}

impl From<&FallbackReason> for NoticeBody {
    fn from(reason: &FallbackReason) -> Self {
        Self {
            code: reason.code(),
            level: reason.level(),
            message: reason.to_string(),
            credential_error: reason.is_credential_error(),
        }
    }
}

#[derive(Debug, Serialize)]
pub struct OutlineResponse<'a> {
    #[serde(flatten)]
    pub generation: &'a Generation,
    pub article_type_label: &'static str,
    pub text: String,
    pub file_name: String,
    pub notice: Option<NoticeBody>,
    pub model_note: Option<&'static str>,
}

impl<'a> OutlineResponse<'a> {
    fn new(generation: &'a Generation) -> Self {
        let model_note = match &generation.source {
            OutlineSource::Model { model } => model_note(model),
            OutlineSource::Template => None,
        };
        Self {
            generation,
            article_type_label: generation.article_type.label(),
            text: generation.text(),
            file_name: generation.file_name(),
            notice: generation.fallback.as_ref().map(NoticeBody::from),
            model_note,
        }
    }
}

/// Health check endpoint
pub async fn health_handler() -> impl IntoResponse {
    "ok"
}

/// Form page with this client's current outline, if any
pub async fn index_handler(State(state): State<HttpState>, headers: HeaderMap) -> Response {
    let page = match state.current_session(&headers).await {
        Some(session) => {
            let session = session.lock().await;
            render_page(&state, session.last(), None)
        }
        None => render_page(&state, None, None),
    };
    Html(page).into_response()
}

/// Form submission: generate, store in the client's session, re-render
pub async fn generate_form_handler(
    State(state): State<HttpState>,
    headers: HeaderMap,
    Form(form): Form<GenerateForm>,
) -> Response {
    let (new_id, session, result) = state
        .generate(&headers, &form.topic, &form.keyword, form.token.as_deref())
        .await;

    let response = match result {
        Ok(()) => Html(render_page(&state, session.lock().await.last(), None)).into_response(),
        Err(OutlineError::InvalidParams { message }) => (
            StatusCode::BAD_REQUEST,
            Html(render_page(&state, session.lock().await.last(), Some(&message))),
        )
            .into_response(),
        Err(e) => {
            tracing::warn!("form generation failed: {}", e);
            e.into_response()
        }
    };
    with_session_cookie(response, new_id)
}

/// Download this client's last outline as a text file
pub async fn download_handler(State(state): State<HttpState>, headers: HeaderMap) -> Response {
    let export = match state.current_session(&headers).await {
        Some(session) => {
            let session = session.lock().await;
            session.export()
        }
        None => None,
    };
    match export {
        Some(export) => (
            StatusCode::OK,
            [
                (
                    header::CONTENT_TYPE,
                    "text/plain; charset=utf-8".to_string(),
                ),
                (
                    header::CONTENT_DISPOSITION,
                    format!("attachment; filename=\"{}\"", export.file_name),
                ),
            ],
            export.contents,
        )
            .into_response(),
        None => (
            StatusCode::NOT_FOUND,
            Json(json!({"error": {"code": 404, "message": "No outline generated yet"}})),
        )
            .into_response(),
    }
}

/// Article type preview for a topic
pub async fn classify_handler(Query(query): Query<ClassifyQuery>) -> impl IntoResponse {
    let article_type = classify(&query.topic);
    Json(json!({
        "article_type": article_type,
        "label": article_type.label(),
    }))
}

/// JSON generation endpoint
pub async fn outline_api_handler(
    State(state): State<HttpState>,
    headers: HeaderMap,
    Json(body): Json<OutlineRequest>,
) -> Response {
    let (new_id, session, result) = state
        .generate(&headers, &body.topic, &body.keyword, body.token.as_deref())
        .await;

    let response = match result {
        Ok(()) => match session.lock().await.last() {
            Some(generation) => Json(OutlineResponse::new(generation)).into_response(),
            None => OutlineError::Internal {
                message: "generation missing after store".to_string(),
            }
            .into_response(),
        },
        Err(e) => e.into_response(),
    };
    with_session_cookie(response, new_id)
}

/// Build the router; split out so tests can drive it without a listener
pub fn router(state: HttpState) -> Router {
    Router::new()
        .route("/", get(index_handler))
        .route("/generate", post(generate_form_handler))
        .route("/download", get(download_handler))
        .route("/health", get(health_handler))
        .route("/api/classify", get(classify_handler))
        .route("/api/outline", post(outline_api_handler))
        .layer(CorsLayer::new().allow_origin(Any).allow_methods(Any))
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

/// Start the HTTP server
pub async fn start_http_server(config: Config, bind: SocketAddr) -> Result<()> {
    if config.runtime.hf_token.is_some() {
        tracing::info!("Using Hugging Face token from environment");
    } else {
        tracing::warn!("HF_TOKEN not set; the form will ask for a token");
    }

    let app = router(HttpState::new(config));

    let listener = tokio::net::TcpListener::bind(bind)
        .await
        .map_err(|e| OutlineError::Http {
            message: format!("Failed to bind HTTP listener: {}", e),
        })?;

    tracing::info!("Starting HTTP server on {}", bind);

    axum::serve(listener, app)
        .await
        .map_err(|e| OutlineError::Http {
            message: format!("HTTP server error: {}", e),
        })?;

    Ok(())
}

fn escape_html(input: &str) -> String {
    let mut out = String::with_capacity(input.len());
    for ch in input.chars() {
        match ch {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            '\'' => out.push_str("&#39;"),
            _ => out.push(ch),
        }
    }
    out
}

const PAGE_STYLE: &str = "\
body { font-family: sans-serif; max-width: 960px; margin: 0 auto; padding: 1rem; }\n\
.main-header { text-align: center; padding: 1rem 0; }\n\
.outline-section { background: #f8f9fa; padding: 1.5rem; border-radius: 8px; margin: 1rem 0; border-left: 4px solid #4F46E5; }\n\
.cta-box { background: #E0F2FE; padding: 1rem; border-radius: 8px; margin: 1rem 0; border-left: 4px solid #0EA5E9; }\n\
.notice { padding: 0.75rem 1rem; border-radius: 8px; margin: 1rem 0; }\n\
.notice-info { background: #EFF6FF; }\n\
.notice-warning { background: #FEF3C7; }\n\
.notice-error { background: #FEE2E2; }\n";

const PAGE_SCRIPT: &str = "\
const topic = document.getElementById('topic');\n\
const token = document.getElementById('token');\n\
const button = document.getElementById('generate');\n\
const label = document.getElementById('type-label');\n\
function refresh() {\n\
  const ready = topic.value.trim() && (!token || token.value.trim());\n\
  button.disabled = !ready;\n\
  if (!topic.value.trim()) { label.textContent = ''; return; }\n\
  fetch('/api/classify?topic=' + encodeURIComponent(topic.value))\n\
    .then(r => r.json()).then(j => { label.textContent = 'Type: ' + j.label; });\n\
}\n\
topic.addEventListener('input', refresh);\n\
if (token) token.addEventListener('input', refresh);\n\
refresh();\n";

fn notice_class(level: NoticeLevel) -> &'static str {
    match level {
        NoticeLevel::Info => "notice notice-info",
        NoticeLevel::Warning => "notice notice-warning",
        NoticeLevel::Error => "notice notice-error",
    }
}

fn render_outline(out: &mut String, generation: &Generation) {
    let outline = &generation.outline;

    out.push_str("<hr><h2>📄 Generated Outline</h2>");
    out.push_str("<p><a href=\"/download\">⬇️ Download ");
    out.push_str(&escape_html(&generation.file_name()));
    out.push_str("</a></p>");

    if let OutlineSource::Model { model } = &generation.source {
        out.push_str("<p class=\"notice notice-info\">Generated by ");
        out.push_str(&escape_html(model));
        if let Some(note) = model_note(model) {
            out.push_str(" - ");
            out.push_str(note);
        }
        out.push_str("</p>");
    }

    out.push_str("<h3>🎯 ");
    out.push_str(&escape_html(&outline.heading));
    out.push_str("</h3>");

    for (idx, section) in outline.sections.iter().enumerate() {
        out.push_str("<div class=\"outline-section\"><strong>");
        out.push_str(&escape_html(&section.subheading));
        out.push_str("</strong><ul>");
        for bullet in &section.bullets {
            out.push_str("<li>");
            out.push_str(&escape_html(bullet));
            out.push_str("</li>");
        }
        out.push_str("</ul></div>");

        if let Some(cta) = outline.cta_after(idx) {
            out.push_str("<div class=\"cta-box\">📢 ");
            out.push_str(&escape_html(&cta.text));
            out.push_str("</div>");
        }
    }
}

/// Render the full form page
fn render_page(state: &HttpState, last: Option<&Generation>, error: Option<&str>) -> String {
    let has_env_token = state.env_token().is_some();
    let topic = last.map(|g| g.topic.as_str()).unwrap_or("");
    let keyword = last.map(|g| g.keyword.as_str()).unwrap_or("");
    let type_label = if topic.is_empty() {
        String::new()
    } else {
        format!("Type: {}", classify(topic).label())
    };

    let mut out = String::with_capacity(4096);
    out.push_str("<!doctype html><html><head><meta charset=\"utf-8\">");
    out.push_str("<title>AI Article Outline Generator</title><style>");
    out.push_str(PAGE_STYLE);
    out.push_str("</style></head><body>");
    out.push_str("<div class=\"main-header\"><h1>📝 AI Article Outline Generator</h1></div>");

    out.push_str("<form method=\"post\" action=\"/generate\">");
    out.push_str("<label>📌 Article Topic * <input id=\"topic\" name=\"topic\" placeholder=\"e.g., how to buy a phone\" value=\"");
    out.push_str(&escape_html(topic));
    out.push_str("\"></label> ");
    out.push_str("<label>🔑 Target Keyword <input name=\"keyword\" placeholder=\"e.g., phone guide 2024\" value=\"");
    out.push_str(&escape_html(keyword));
    out.push_str("\"></label> ");
    if has_env_token {
        out.push_str("<p>✅ Token from environment</p>");
    } else {
        out.push_str("<label>🔑 HuggingFace Token <input id=\"token\" name=\"token\" type=\"password\"></label>");
        out.push_str("<p class=\"notice notice-warning\">Enter your token (https://huggingface.co/settings/tokens)</p>");
    }
    out.push_str("<p id=\"type-label\">");
    out.push_str(&type_label);
    out.push_str("</p>");
    out.push_str("<button id=\"generate\" type=\"submit\"");
    if !has_env_token {
        out.push_str(" disabled");
    }
    out.push_str(">✨ Generate Outline</button></form>");

    if let Some(message) = error {
        out.push_str("<p class=\"notice notice-warning\">");
        out.push_str(&escape_html(message));
        out.push_str("</p>");
    }

    match last {
        Some(generation) => {
            if let Some(reason) = &generation.fallback {
                out.push_str("<p class=\"");
                out.push_str(notice_class(reason.level()));
                out.push_str("\">");
                out.push_str(&escape_html(&reason.to_string()));
                out.push_str("</p>");
            }
            render_outline(&mut out, generation);
        }
        None => out.push_str("<p>👋 Ready! Enter topic and generate.</p>"),
    }

    out.push_str("<script>");
    out.push_str(PAGE_SCRIPT);
    out.push_str("</script></body></html>");
    out
}
