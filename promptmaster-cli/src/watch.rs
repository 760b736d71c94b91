//! Polls a source file and feeds every change to the preview.

use crate::error::AppResult;
use crate::input::detect_dialect;
use crate::server::{self, AppState, ServedSurfaces};
use crate::settings::SettingsStore;
use crate::toast::ToastKind;
use promptmaster_preview::{Dialect, PreviewScheduler, RenderHost, SchedulerConfig, SourceDocument};
use std::path::{Path, PathBuf};
use std::time::Duration;
use tokio::net::TcpListener;
use tokio::time::MissedTickBehavior;

pub const POLL_INTERVAL: Duration = Duration::from_millis(250);

/// Remembers the last contents seen so only real changes are reported.
pub struct FileWatcher {
    path: PathBuf,
    last: Option<String>,
    failing: bool,
}

impl FileWatcher {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            last: None,
            failing: false,
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// New contents if the file changed since the last poll.
    ///
    /// A file that cannot be read is reported once and then treated as
    /// unchanged until it becomes readable again.
    pub async fn poll(&mut self) -> Option<String> {
        match tokio::fs::read_to_string(&self.path).await {
            Ok(text) => {
                self.failing = false;
                if self.last.as_deref() == Some(text.as_str()) {
                    return None;
                }
                self.last = Some(text.clone());
                Some(text)
            }
            Err(e) => {
                if !self.failing {
                    tracing::warn!(
                        path = %self.path.display(),
                        error = %e,
                        "cannot read watched file"
                    );
                    self.failing = true;
                }
                None
            }
        }
    }
}

/// Options for [`run`].
pub struct WatchOptions {
    pub path: PathBuf,
    pub dialect: Option<Dialect>,
    pub port: u16,
    pub config: SchedulerConfig,
}

/// Serve the live preview for `options.path` until Ctrl-C.
pub async fn run(options: WatchOptions, settings: SettingsStore) -> AppResult<()> {
    let surfaces = ServedSurfaces::new();
    let (host, host_task) = RenderHost::spawn(surfaces.clone());
    let dark_mode = settings.settings().dark_mode;
    let scheduler = PreviewScheduler::spawn_with_theme(options.config, host, dark_mode);
    let state = AppState::with_settings(scheduler, surfaces, settings);

    let listener = TcpListener::bind(("127.0.0.1", options.port)).await?;
    println!("Live preview: http://{}", listener.local_addr()?);

    let poller = tokio::spawn(poll_loop(
        FileWatcher::new(options.path),
        options.dialect,
        state.clone(),
    ));

    let shutdown = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            tracing::warn!(error = %e, "failed to listen for Ctrl-C");
        }
    };
    let served = server::serve(listener, state, shutdown).await;

    poller.abort();
    host_task.abort();
    tracing::info!("preview server stopped");
    served
}

async fn poll_loop(mut watcher: FileWatcher, fixed: Option<Dialect>, state: AppState) {
    let mut ticker = tokio::time::interval(POLL_INTERVAL);
    ticker.set_missed_tick_behavior(MissedTickBehavior::Skip);

    loop {
        ticker.tick().await;
        let Some(text) = watcher.poll().await else {
            continue;
        };

        let scheduler = state.scheduler();
        let dialect = fixed
            .or_else(|| scheduler.state().source.map(|s| s.dialect))
            .unwrap_or_else(|| detect_dialect(watcher.path(), &text));

        tracing::debug!(
            path = %watcher.path().display(),
            chars = text.len(),
            %dialect,
            "source changed"
        );
        if let Err(e) = scheduler.submit(SourceDocument::new(text, dialect)) {
            tracing::warn!(error = %e, "preview stopped accepting edits");
            break;
        }
        state.toast(ToastKind::Info, "Source reloaded");
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[tokio::test]
    async fn reports_only_changes() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("snippet.html");
        std::fs::write(&path, "<p>a</p>").unwrap();

        let mut watcher = FileWatcher::new(&path);
        assert_eq!(watcher.poll().await.as_deref(), Some("<p>a</p>"));
        assert_eq!(watcher.poll().await, None);

        std::fs::write(&path, "<p>b</p>").unwrap();
        assert_eq!(watcher.poll().await.as_deref(), Some("<p>b</p>"));
    }

    #[tokio::test]
    async fn unreadable_file_is_not_a_change() {
        let dir = tempfile::tempdir().unwrap();
        let mut watcher = FileWatcher::new(dir.path().join("missing.html"));
        assert_eq!(watcher.poll().await, None);
        assert_eq!(watcher.poll().await, None);
    }
}
