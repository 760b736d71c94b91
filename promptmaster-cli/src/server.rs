//! Local HTTP host for the live preview.
//!
//! The shell page listens to `/events` and, for every rendered
//! generation, throws its iframe away and creates a new one pointing at
//! `/preview`. The document is served with a `sandbox allow-scripts`
//! CSP, so it runs in an opaque origin even when opened directly.

use crate::error::{AppError, AppResult};
use crate::settings::SettingsStore;
use crate::toast::{Toast, ToastKind, ToastQueue};
use axum::{
    extract::State,
    http::{header, StatusCode},
    response::{
        sse::{Event, KeepAlive, Sse},
        Html, IntoResponse, Response,
    },
    routing::{get, post},
    Json, Router,
};
use chrono::Utc;
use promptmaster_preview::{
    AssembledDocument, Dialect, PreviewError, PreviewResult, PreviewScheduler, PreviewState,
    RenderOutcome, RenderSurface, SurfaceFactory,
};
use serde::{Deserialize, Serialize};
use std::convert::Infallible;
use std::future::Future;
use std::sync::{Arc, Mutex, MutexGuard};
use tokio::net::TcpListener;
use tokio::sync::watch;
use tokio_stream::wrappers::WatchStream;
use tokio_stream::{Stream, StreamExt};

pub const DEFAULT_PORT: u16 = 4173;
pub const PREVIEW_CSP: &str = "sandbox allow-scripts";

const PLACEHOLDER: &str = "<!DOCTYPE html><html><head><meta charset=\"UTF-8\"></head><body></body></html>";

/// Document currently loaded into the served surface.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ServedFrame {
    pub generation: u64,
    pub document: AssembledDocument,
}

/// Surface factory backed by the HTTP server: a loaded document becomes
/// the response of `GET /preview` until its surface is dropped.
#[derive(Clone)]
pub struct ServedSurfaces {
    current: Arc<watch::Sender<Option<ServedFrame>>>,
}

impl Default for ServedSurfaces {
    fn default() -> Self {
        let (tx, _) = watch::channel(None);
        Self {
            current: Arc::new(tx),
        }
    }
}

impl ServedSurfaces {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn current(&self) -> Option<ServedFrame> {
        self.current.borrow().clone()
    }
}

impl SurfaceFactory for ServedSurfaces {
    fn create(&mut self, generation: u64) -> PreviewResult<Box<dyn RenderSurface>> {
        Ok(Box::new(ServedSurface {
            generation,
            current: self.current.clone(),
        }))
    }
}

struct ServedSurface {
    generation: u64,
    current: Arc<watch::Sender<Option<ServedFrame>>>,
}

impl RenderSurface for ServedSurface {
    fn load(&mut self, document: &AssembledDocument) -> PreviewResult<()> {
        self.current.send_replace(Some(ServedFrame {
            generation: self.generation,
            document: document.clone(),
        }));
        Ok(())
    }
}

impl Drop for ServedSurface {
    fn drop(&mut self) {
        let generation = self.generation;
        self.current.send_if_modified(|frame| match frame {
            Some(f) if f.generation == generation => {
                *frame = None;
                true
            }
            _ => false,
        });
    }
}

/// Payload of every `/events` message.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PreviewStatus {
    pub generation: u64,
    pub state: &'static str,
    pub message: Option<String>,
    pub chars: usize,
    pub dark: bool,
    pub dialect: Option<Dialect>,
    pub toasts: Vec<Toast>,
}

impl PreviewStatus {
    pub fn from_state(state: &PreviewState, toasts: Vec<Toast>) -> Self {
        let message = match &state.outcome {
            RenderOutcome::Failed(message) => Some(message.clone()),
            _ => None,
        };
        Self {
            generation: state.generation,
            state: state.outcome.label(),
            message,
            chars: state
                .source
                .as_ref()
                .map(|s| s.text.chars().count())
                .unwrap_or(0),
            dark: state.is_dark,
            dialect: state.source.as_ref().map(|s| s.dialect),
            toasts,
        }
    }
}

#[derive(Clone)]
pub struct AppState {
    inner: Arc<Inner>,
}

struct Inner {
    scheduler: PreviewScheduler,
    surfaces: ServedSurfaces,
    toasts: Mutex<ToastQueue>,
    settings: Option<Mutex<SettingsStore>>,
}

impl AppState {
    pub fn new(scheduler: PreviewScheduler, surfaces: ServedSurfaces) -> Self {
        Self::build(scheduler, surfaces, None)
    }

    /// Theme changes made in the browser are persisted to `settings`.
    pub fn with_settings(
        scheduler: PreviewScheduler,
        surfaces: ServedSurfaces,
        settings: SettingsStore,
    ) -> Self {
        Self::build(scheduler, surfaces, Some(Mutex::new(settings)))
    }

    fn build(
        scheduler: PreviewScheduler,
        surfaces: ServedSurfaces,
        settings: Option<Mutex<SettingsStore>>,
    ) -> Self {
        Self {
            inner: Arc::new(Inner {
                scheduler,
                surfaces,
                toasts: Mutex::new(ToastQueue::default()),
                settings,
            }),
        }
    }

    pub fn scheduler(&self) -> &PreviewScheduler {
        &self.inner.scheduler
    }

    fn toasts(&self) -> MutexGuard<'_, ToastQueue> {
        self.inner.toasts.lock().unwrap_or_else(|e| e.into_inner())
    }

    pub fn toast(&self, kind: ToastKind, message: impl Into<String>) {
        self.toasts().push(kind, message);
    }

    pub fn status(&self) -> PreviewStatus {
        self.status_for(&self.inner.scheduler.state())
    }

    fn status_for(&self, state: &PreviewState) -> PreviewStatus {
        let now = Utc::now();
        let toasts = {
            let mut queue = self.toasts();
            queue.prune(now);
            queue.active(now)
        };
        PreviewStatus::from_state(state, toasts)
    }

    fn persist_theme(&self, dark: bool) {
        let Some(settings) = &self.inner.settings else {
            return;
        };
        let mut store = settings.lock().unwrap_or_else(|e| e.into_inner());
        if let Err(e) = store.update(|s| s.dark_mode = dark) {
            tracing::warn!(error = %e, "failed to persist theme");
        }
    }
}

pub fn router(state: AppState) -> Router {
    Router::new()
        .route("/", get(shell))
        .route("/preview", get(preview))
        .route("/status", get(status))
        .route("/events", get(events))
        .route("/theme", post(set_theme))
        .route("/dialect", post(set_dialect))
        .with_state(state)
}

/// Serve until `shutdown` resolves.
pub async fn serve(
    listener: TcpListener,
    state: AppState,
    shutdown: impl Future<Output = ()> + Send + 'static,
) -> AppResult<()> {
    let addr = listener.local_addr()?;
    tracing::info!("preview server listening on http://{}", addr);
    axum::serve(listener, router(state))
        .with_graceful_shutdown(shutdown)
        .await?;
    Ok(())
}

async fn shell() -> Html<&'static str> {
    Html(SHELL_PAGE)
}

async fn preview(State(state): State<AppState>) -> Response {
    let body = match state.inner.surfaces.current() {
        Some(frame) => frame.document.as_str().to_string(),
        None => PLACEHOLDER.to_string(),
    };
    (
        [
            (header::CONTENT_TYPE, "text/html; charset=utf-8"),
            (header::CONTENT_SECURITY_POLICY, PREVIEW_CSP),
            (header::CACHE_CONTROL, "no-store"),
        ],
        body,
    )
        .into_response()
}

async fn status(State(state): State<AppState>) -> Json<PreviewStatus> {
    Json(state.status())
}

async fn events(
    State(state): State<AppState>,
) -> Sse<impl Stream<Item = Result<Event, Infallible>>> {
    let updates = WatchStream::new(state.inner.scheduler.subscribe());
    let stream = updates.map(move |preview| {
        let status = state.status_for(&preview);
        let data = serde_json::to_string(&status).unwrap_or_default();
        Ok(Event::default().event("status").data(data))
    });
    Sse::new(stream).keep_alive(KeepAlive::default())
}

#[derive(Debug, Deserialize)]
struct ThemeBody {
    dark: bool,
}

async fn set_theme(
    State(state): State<AppState>,
    Json(body): Json<ThemeBody>,
) -> AppResult<StatusCode> {
    state.scheduler().set_theme(body.dark)?;
    state.persist_theme(body.dark);
    let mode = if body.dark { "dark" } else { "light" };
    state.toast(ToastKind::Info, format!("Switched to {mode} mode"));
    tracing::debug!(dark = body.dark, "theme changed");
    Ok(StatusCode::NO_CONTENT)
}

#[derive(Debug, Deserialize)]
struct DialectBody {
    dialect: String,
}

async fn set_dialect(
    State(state): State<AppState>,
    Json(body): Json<DialectBody>,
) -> AppResult<StatusCode> {
    let dialect: Dialect = body.dialect.parse()?;
    state.scheduler().set_dialect(dialect)?;
    state.toast(ToastKind::Info, format!("Dialect set to {dialect}"));
    tracing::debug!(%dialect, "dialect changed");
    Ok(StatusCode::NO_CONTENT)
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let status = match &self {
            AppError::Preview(PreviewError::UnknownDialect(_))
            | AppError::Preview(PreviewError::Structure { .. })
            | AppError::InvalidSetting { .. }
            | AppError::InvalidJson(_)
            | AppError::EmptySource => StatusCode::BAD_REQUEST,
            AppError::Preview(PreviewError::SchedulerClosed)
            | AppError::Preview(PreviewError::HostClosed) => StatusCode::SERVICE_UNAVAILABLE,
            _ => StatusCode::INTERNAL_SERVER_ERROR,
        };
        let body = serde_json::json!({ "error": self.to_string() });
        (status, Json(body)).into_response()
    }
}

const SHELL_PAGE: &str = r#"<!DOCTYPE html>
<html lang="en">
<head>
<meta charset="UTF-8">
<meta name="viewport" content="width=device-width, initial-scale=1.0">
<title>promptmaster preview</title>
<style>
  body { margin: 0; font-family: ui-sans-serif, system-ui, sans-serif; background: #020617; color: #e2e8f0; }
  header { display: flex; gap: 0.75rem; align-items: center; padding: 0.75rem 1rem; border-bottom: 1px solid #1e293b; }
  #status { font-size: 0.75rem; text-transform: uppercase; letter-spacing: 0.1em; }
  #status[data-state="pending"] { color: #fbbf24; }
  #status[data-state="failed"] { color: #f87171; }
  #status[data-state="rendered"] { color: #34d399; }
  #message { font-family: ui-monospace, monospace; font-size: 0.8rem; color: #fca5a5; white-space: pre-wrap; padding: 0 1rem; }
  #stage { height: calc(100vh - 4rem); }
  #stage iframe { width: 100%; height: 100%; border: 0; }
  #toasts { position: fixed; right: 1rem; bottom: 1rem; display: flex; flex-direction: column; gap: 0.5rem; }
  #toasts div { background: #1e293b; padding: 0.5rem 0.75rem; border-radius: 0.5rem; font-size: 0.8rem; }
  .spacer { flex: 1; }
</style>
</head>
<body>
<header>
  <strong>Live preview</strong>
  <span id="status" data-state="empty">empty</span>
  <span id="chars"></span>
  <span class="spacer"></span>
  <select id="dialect">
    <option value="html">html</option>
    <option value="jsx">jsx</option>
    <option value="component">component</option>
  </select>
  <button id="theme" type="button">Toggle theme</button>
</header>
<div id="message"></div>
<div id="stage"></div>
<div id="toasts"></div>
<script>
  var stage = document.getElementById("stage");
  var shown = -1;
  var dark = false;

  function post(path, body) {
    return fetch(path, { method: "POST", headers: { "Content-Type": "application/json" }, body: JSON.stringify(body) });
  }

  function clearFrame() {
    stage.replaceChildren();
    shown = -1;
  }

  function showFrame(generation) {
    if (generation === shown) return;
    var frame = document.createElement("iframe");
    frame.setAttribute("sandbox", "allow-scripts");
    frame.setAttribute("title", "preview");
    frame.src = "/preview?generation=" + generation;
    stage.replaceChildren(frame);
    shown = generation;
  }

  function update(status) {
    var label = document.getElementById("status");
    label.textContent = status.state;
    label.dataset.state = status.state;
    document.getElementById("chars").textContent = status.chars ? status.chars + " chars" : "";
    document.getElementById("message").textContent = status.message || "";
    if (status.dialect) document.getElementById("dialect").value = status.dialect;
    dark = status.dark;
    if (status.state === "rendered") showFrame(status.generation);
    if (status.state === "empty" || status.state === "failed") clearFrame();
    var toasts = document.getElementById("toasts");
    toasts.replaceChildren.apply(toasts, status.toasts.map(function (t) {
      var el = document.createElement("div");
      el.textContent = t.message;
      return el;
    }));
  }

  new EventSource("/events").addEventListener("status", function (event) {
    update(JSON.parse(event.data));
  });
  document.getElementById("theme").addEventListener("click", function () {
    post("/theme", { dark: !dark });
  });
  document.getElementById("dialect").addEventListener("change", function (event) {
    post("/dialect", { dialect: event.target.value });
  });
</script>
</body>
</html>
"#;
