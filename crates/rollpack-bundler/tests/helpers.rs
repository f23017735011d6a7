//! Shared fakes for orchestrator tests.
//!
//! Every collaborator is replaced through the traits the orchestrator
//! consumes, and log events are captured with a `tracing_subscriber` layer.

#![allow(dead_code)]

use std::collections::{HashMap, VecDeque};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};

use async_trait::async_trait;
use parking_lot::Mutex;
use rollpack_bundler::{
    BundleEngine, BundleOptions, BundleResult, Collaborators, EngineRequest, Error, Manifest,
    ManifestStore, Orchestrator, WorkspaceRoot,
};
use serde_json::Value;
use tokio::sync::Notify;
use tracing::field::{Field, Visit};
use tracing::{Event, Level, Subscriber};
use tracing_subscriber::Layer;
use tracing_subscriber::layer::{Context, SubscriberExt};

pub const ROOT: &str = "/work";

/// Options used by most scenarios: a `ui` library inside `/work`.
pub fn ui_options() -> BundleOptions {
    BundleOptions::new(
        "libs/ui/src/index.ts",
        "dist/ui",
        "libs/ui/package.json",
        "libs/ui/tsconfig.json",
    )
}

pub fn ui_manifest_path() -> PathBuf {
    Path::new(ROOT).join("libs/ui/package.json")
}

pub fn manifest(value: Value) -> Manifest {
    Manifest::from(value)
}

/// In-memory manifest store that records every write.
#[derive(Default)]
pub struct MemoryManifestStore {
    manifests: Mutex<HashMap<PathBuf, Manifest>>,
    writes: Mutex<Vec<(PathBuf, Manifest)>>,
    fail_writes: AtomicBool,
}

impl MemoryManifestStore {
    pub fn with_manifest(path: impl Into<PathBuf>, manifest: Manifest) -> Self {
        let store = Self::default();
        store.insert(path, manifest);
        store
    }

    pub fn insert(&self, path: impl Into<PathBuf>, manifest: Manifest) {
        self.manifests.lock().insert(path.into(), manifest);
    }

    pub fn fail_writes(&self) {
        self.fail_writes.store(true, Ordering::SeqCst);
    }

    pub fn writes(&self) -> Vec<(PathBuf, Manifest)> {
        self.writes.lock().clone()
    }
}

#[async_trait]
impl ManifestStore for MemoryManifestStore {
    async fn read(&self, path: &Path) -> rollpack_bundler::Result<Manifest> {
        self.manifests
            .lock()
            .get(path)
            .cloned()
            .ok_or_else(|| Error::ManifestNotFound(path.to_path_buf()))
    }

    async fn write(&self, path: &Path, manifest: &Manifest) -> rollpack_bundler::Result<()> {
        if self.fail_writes.load(Ordering::SeqCst) {
            return Err(Error::ManifestWrite {
                path: path.to_path_buf(),
                source: std::io::Error::new(std::io::ErrorKind::PermissionDenied, "read-only"),
            });
        }

        self.writes
            .lock()
            .push((path.to_path_buf(), manifest.clone()));
        self.manifests
            .lock()
            .insert(path.to_path_buf(), manifest.clone());
        Ok(())
    }
}

/// Engine returning scripted results, then `Success` once the script runs out.
#[derive(Default)]
pub struct FakeEngine {
    script: Mutex<VecDeque<BundleResult>>,
    requests: Mutex<Vec<EngineRequest>>,
}

impl FakeEngine {
    pub fn succeeding() -> Self {
        Self::default()
    }

    pub fn scripted(results: impl IntoIterator<Item = BundleResult>) -> Self {
        Self {
            script: Mutex::new(results.into_iter().collect()),
            requests: Mutex::new(Vec::new()),
        }
    }

    pub fn calls(&self) -> usize {
        self.requests.lock().len()
    }

    pub fn requests(&self) -> Vec<EngineRequest> {
        self.requests.lock().clone()
    }
}

#[async_trait]
impl BundleEngine for FakeEngine {
    async fn bundle(&self, request: &EngineRequest) -> BundleResult {
        self.requests.lock().push(request.clone());
        self.script
            .lock()
            .pop_front()
            .unwrap_or(BundleResult::Success)
    }
}

/// Engine whose calls never complete; used to observe cancellation.
#[derive(Default)]
pub struct HangingEngine {
    pub started: Notify,
    calls: AtomicUsize,
}

impl HangingEngine {
    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl BundleEngine for HangingEngine {
    async fn bundle(&self, _request: &EngineRequest) -> BundleResult {
        self.calls.fetch_add(1, Ordering::SeqCst);
        self.started.notify_one();
        std::future::pending::<BundleResult>().await
    }
}

pub fn orchestrator(
    manifests: Arc<dyn ManifestStore>,
    engine: Arc<dyn BundleEngine>,
) -> Orchestrator {
    Orchestrator::new(Collaborators {
        manifests,
        engine,
        projects: Arc::new(WorkspaceRoot::new(ROOT)),
    })
}

/// One captured log event.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CapturedEvent {
    pub level: Level,
    pub message: String,
}

/// `tracing` layer that stores every event's level and message.
#[derive(Clone, Default)]
pub struct LogCapture {
    events: Arc<Mutex<Vec<CapturedEvent>>>,
}

impl LogCapture {
    /// Install as the thread's default subscriber until the guard drops.
    ///
    /// Thread-local, so tests using it run on a current-thread runtime.
    pub fn install() -> (Self, tracing::subscriber::DefaultGuard) {
        let capture = Self::default();
        let subscriber = tracing_subscriber::registry().with(capture.clone());
        let guard = tracing::subscriber::set_default(subscriber);
        (capture, guard)
    }

    pub fn events(&self) -> Vec<CapturedEvent> {
        self.events.lock().clone()
    }

    pub fn messages_at(&self, level: Level) -> Vec<String> {
        self.events
            .lock()
            .iter()
            .filter(|event| event.level == level)
            .map(|event| event.message.clone())
            .collect()
    }

    pub fn contains(&self, level: Level, message: &str) -> bool {
        self.messages_at(level).iter().any(|m| m == message)
    }
}

impl<S: Subscriber> Layer<S> for LogCapture {
    fn on_event(&self, event: &Event<'_>, _ctx: Context<'_, S>) {
        let mut visitor = MessageVisitor::default();
        event.record(&mut visitor);
        self.events.lock().push(CapturedEvent {
            level: *event.metadata().level(),
            message: visitor.message,
        });
    }
}

#[derive(Default)]
struct MessageVisitor {
    message: String,
}

impl Visit for MessageVisitor {
    fn record_debug(&mut self, field: &Field, value: &dyn std::fmt::Debug) {
        if field.name() == "message" {
            self.message = format!("{:?}", value);
        }
    }
}
