//! Isolated render host.
//!
//! One task owns the display surface, so renders are serialised no matter
//! how many threads hold a [`RenderHostHandle`]. Every display tears the
//! previous surface down (drop) and creates a fresh one; nothing a
//! snippet did in one surface can survive into the next.

use crate::document::AssembledDocument;
use crate::error::{PreviewError, PreviewResult};
use std::sync::{Arc, Mutex, MutexGuard};
use tokio::sync::{mpsc, oneshot};
use tokio::task::JoinHandle;

/// An isolated execution context that shows exactly one document.
/// Dropping it tears the context down.
pub trait RenderSurface: Send {
    fn load(&mut self, document: &AssembledDocument) -> PreviewResult<()>;
}

/// Creates a fresh surface for every render.
pub trait SurfaceFactory: Send + 'static {
    fn create(&mut self, generation: u64) -> PreviewResult<Box<dyn RenderSurface>>;
}

enum HostCommand {
    Display {
        generation: u64,
        document: AssembledDocument,
    },
    Clear,
    Flush(oneshot::Sender<()>),
}

/// Cloneable sender side of the render host.
#[derive(Clone)]
pub struct RenderHostHandle {
    tx: mpsc::UnboundedSender<HostCommand>,
}

impl RenderHostHandle {
    /// Replace whatever is shown with `document`. Fire-and-forget.
    pub fn display(&self, generation: u64, document: AssembledDocument) {
        if self
            .tx
            .send(HostCommand::Display {
                generation,
                document,
            })
            .is_err()
        {
            tracing::warn!(generation, "render host is gone; document dropped");
        }
    }

    /// Tear down the current surface without replacing it.
    pub fn clear(&self) {
        if self.tx.send(HostCommand::Clear).is_err() {
            tracing::warn!("render host is gone; clear ignored");
        }
    }

    /// Resolves once every command sent before it has been applied.
    pub async fn flush(&self) -> PreviewResult<()> {
        let (ack_tx, ack_rx) = oneshot::channel();
        self.tx
            .send(HostCommand::Flush(ack_tx))
            .map_err(|_| PreviewError::HostClosed)?;
        ack_rx.await.map_err(|_| PreviewError::HostClosed)
    }
}

pub struct RenderHost {
    factory: Box<dyn SurfaceFactory>,
    current: Option<Box<dyn RenderSurface>>,
}

impl RenderHost {
    /// Start the host task. It runs until every handle is dropped.
    pub fn spawn<F: SurfaceFactory>(factory: F) -> (RenderHostHandle, JoinHandle<()>) {
        let (tx, rx) = mpsc::unbounded_channel();
        let host = RenderHost {
            factory: Box::new(factory),
            current: None,
        };
        let task = tokio::spawn(host.run(rx));
        (RenderHostHandle { tx }, task)
    }

    async fn run(mut self, mut rx: mpsc::UnboundedReceiver<HostCommand>) {
        while let Some(cmd) = rx.recv().await {
            match cmd {
                HostCommand::Display {
                    generation,
                    document,
                } => self.display(generation, &document),
                HostCommand::Clear => {
                    if self.current.take().is_some() {
                        tracing::debug!("render surface torn down");
                    }
                }
                HostCommand::Flush(ack) => {
                    let _ = ack.send(());
                }
            }
        }
        self.current = None;
        tracing::debug!("render host stopped");
    }

    fn display(&mut self, generation: u64, document: &AssembledDocument) {
        // Old surface goes first so two never coexist.
        self.current = None;

        let mut surface = match self.factory.create(generation) {
            Ok(surface) => surface,
            Err(e) => {
                tracing::warn!(generation, error = %e, "failed to create render surface");
                return;
            }
        };
        if let Err(e) = surface.load(document) {
            tracing::warn!(generation, error = %e, "render surface failed to load document");
            return;
        }
        tracing::debug!(generation, bytes = document.len(), "document displayed");
        self.current = Some(surface);
    }
}

/// A frame recorded by [`MemorySurfaces`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Frame {
    pub generation: u64,
    pub document: AssembledDocument,
}

#[derive(Default)]
struct MemoryLog {
    frames: Vec<Frame>,
    created: usize,
    dropped: usize,
    live: Option<u64>,
}

/// Headless surface factory that records every loaded document.
#[derive(Clone, Default)]
pub struct MemorySurfaces {
    log: Arc<Mutex<MemoryLog>>,
}

impl MemorySurfaces {
    pub fn new() -> Self {
        Self::default()
    }

    fn lock(&self) -> MutexGuard<'_, MemoryLog> {
        self.log.lock().unwrap_or_else(|e| e.into_inner())
    }

    pub fn frames(&self) -> Vec<Frame> {
        self.lock().frames.clone()
    }

    pub fn last_document(&self) -> Option<AssembledDocument> {
        self.lock().frames.last().map(|f| f.document.clone())
    }

    /// Number of surfaces ever created.
    pub fn created(&self) -> usize {
        self.lock().created
    }

    /// Number of surfaces torn down.
    pub fn dropped(&self) -> usize {
        self.lock().dropped
    }

    /// Generation of the surface currently alive, if any.
    pub fn live(&self) -> Option<u64> {
        self.lock().live
    }
}

impl SurfaceFactory for MemorySurfaces {
    fn create(&mut self, generation: u64) -> PreviewResult<Box<dyn RenderSurface>> {
        let mut log = self.lock();
        log.created += 1;
        log.live = Some(generation);
        Ok(Box::new(MemorySurface {
            generation,
            log: self.log.clone(),
        }))
    }
}

struct MemorySurface {
    generation: u64,
    log: Arc<Mutex<MemoryLog>>,
}

impl RenderSurface for MemorySurface {
    fn load(&mut self, document: &AssembledDocument) -> PreviewResult<()> {
        let mut log = self.log.lock().unwrap_or_else(|e| e.into_inner());
        log.frames.push(Frame {
            generation: self.generation,
            document: document.clone(),
        });
        Ok(())
    }
}

impl Drop for MemorySurface {
    fn drop(&mut self) {
        let mut log = self.log.lock().unwrap_or_else(|e| e.into_inner());
        log.dropped += 1;
        if log.live == Some(self.generation) {
            log.live = None;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::document::assemble;

    struct FailingFactory;

    impl SurfaceFactory for FailingFactory {
        fn create(&mut self, _generation: u64) -> PreviewResult<Box<dyn RenderSurface>> {
            Err(PreviewError::Surface("no display available".to_string()))
        }
    }

    #[tokio::test]
    async fn every_display_recreates_the_surface() {
        let surfaces = MemorySurfaces::new();
        let (host, _task) = RenderHost::spawn(surfaces.clone());

        host.display(1, assemble("one();", false));
        host.display(2, assemble("two();", false));
        host.flush().await.unwrap();

        assert_eq!(surfaces.created(), 2);
        assert_eq!(surfaces.dropped(), 1);
        assert_eq!(surfaces.live(), Some(2));
        let frames = surfaces.frames();
        assert_eq!(frames.len(), 2);
        assert!(frames[1].document.as_str().contains("two();"));
    }

    #[tokio::test]
    async fn clear_tears_down_without_replacement() {
        let surfaces = MemorySurfaces::new();
        let (host, _task) = RenderHost::spawn(surfaces.clone());

        host.display(1, assemble("one();", false));
        host.clear();
        host.flush().await.unwrap();

        assert_eq!(surfaces.live(), None);
        assert_eq!(surfaces.dropped(), 1);
    }

    #[tokio::test]
    async fn surface_failures_do_not_escape() {
        let (host, task) = RenderHost::spawn(FailingFactory);
        host.display(1, assemble("x();", false));
        host.flush().await.unwrap();
        assert!(!task.is_finished());
    }

    #[tokio::test]
    async fn host_stops_when_handles_drop() {
        let surfaces = MemorySurfaces::new();
        let (host, task) = RenderHost::spawn(surfaces.clone());
        host.display(1, assemble("x();", false));
        drop(host);
        task.await.unwrap();
        assert_eq!(surfaces.live(), None);
    }
}
