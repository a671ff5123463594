//! Generation worker.
//!
//! `GenerationCoordinator` is the worker-side state machine: it builds the
//! fields on init and regenerates every category mesh on each generate
//! request. `WorkerHandle` runs one coordinator on a dedicated thread and
//! talks to it only through byte channels.
//!
//! A fatal error or panic inside the worker is reported once on the fault
//! channel, after which the thread exits. It is not restarted.

use std::any::Any;
use std::panic::{self, AssertUnwindSafe};
use std::thread::{self, JoinHandle};
use std::time::{Duration, Instant};

use bevy::log::{debug, error, info, warn};
use crossbeam::channel::{self, Receiver, Sender, TryRecvError};
use thiserror::Error;

use crate::category::{CategoryRegistry, GenerationWindow};
use crate::config::StreamingConfig;
use crate::error::{ProtocolError, WorkerError};
use crate::fields::TerrainFields;
use crate::protocol::{CategorySeeds, InitRequest, MeshBundle, Message, Position};

const WORKER_THREAD_NAME: &str = "terrain-worker";

// ---------------------------------------------------------------------------
// GenerationCoordinator
// ---------------------------------------------------------------------------

struct Initialized {
    fields: TerrainFields,
    seeds: CategorySeeds,
    registry: CategoryRegistry,
}

pub struct GenerationCoordinator {
    config: StreamingConfig,
    state: Option<Initialized>,
    cycles: u64,
}

impl GenerationCoordinator {
    pub fn new(config: StreamingConfig) -> Self {
        Self {
            config,
            state: None,
            cycles: 0,
        }
    }

    pub fn is_initialized(&self) -> bool {
        self.state.is_some()
    }

    pub fn seeds(&self) -> Option<CategorySeeds> {
        self.state.as_ref().map(|s| s.seeds)
    }

    /// Completed generation cycles.
    pub fn cycles(&self) -> u64 {
        self.cycles
    }

    /// Process one inbound message. `Ok(None)` means no reply is due.
    pub fn handle(&mut self, message: Message) -> Result<Option<Message>, WorkerError> {
        match message {
            Message::Init(request) => {
                self.init(request)?;
                Ok(None)
            }
            Message::Generate { pos } => Ok(Some(Message::BuildMeshes(self.generate(pos)?))),
            other => Err(ProtocolError::Unexpected {
                command: other.command(),
            }
            .into()),
        }
    }

    /// Build fields and generators. Produces no geometry.
    ///
    /// Maps that cannot back a field leave any previous state in place.
    pub fn init(&mut self, request: InitRequest) -> Result<(), WorkerError> {
        let fields = TerrainFields::from_maps(&request.map.road, &request.map.cliff)?;
        let registry = CategoryRegistry::standard(request.seed, &self.config);
        info!(
            "Terrain worker initialized: rocks seed {}, brush seed {}, {} categories",
            request.seed.rocks,
            request.seed.brush,
            registry.len()
        );
        self.state = Some(Initialized {
            fields,
            seeds: request.seed,
            registry,
        });
        Ok(())
    }

    /// Regenerate every category for the window around `pos`.
    pub fn generate(&mut self, pos: Position) -> Result<MeshBundle, WorkerError> {
        let state = self.state.as_mut().ok_or(WorkerError::NotInitialized)?;
        let start = Instant::now();
        let window = GenerationWindow::around(pos, self.config.cell_radius);
        let bundle = state.registry.generate_all(&window, &state.fields)?;
        self.cycles += 1;
        debug!(
            "Generated window at z={}: {} vertices, {} indices in {:?}",
            window.center,
            bundle.meshes.iter().map(|(_, m)| m.vertex_count).sum::<u32>(),
            bundle.meshes.iter().map(|(_, m)| m.index_count).sum::<u32>(),
            start.elapsed()
        );
        Ok(bundle)
    }
}

// ---------------------------------------------------------------------------
// Worker thread
// ---------------------------------------------------------------------------

/// Out-of-band report that the worker has stopped for good.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("terrain worker fault: {message}")]
pub struct WorkerFault {
    pub message: String,
}

impl From<WorkerError> for WorkerFault {
    fn from(e: WorkerError) -> Self {
        Self {
            message: e.to_string(),
        }
    }
}

fn panic_message(payload: &(dyn Any + Send)) -> String {
    if let Some(s) = payload.downcast_ref::<&str>() {
        format!("panicked: {s}")
    } else if let Some(s) = payload.downcast_ref::<String>() {
        format!("panicked: {s}")
    } else {
        "panicked".to_string()
    }
}

fn service(coordinator: &mut GenerationCoordinator, bytes: &[u8]) -> Result<Option<Message>, WorkerError> {
    let message = Message::decode(bytes)?;
    coordinator.handle(message)
}

fn run_worker(
    mut coordinator: GenerationCoordinator,
    requests: Receiver<Vec<u8>>,
    replies: Sender<Vec<u8>>,
    faults: Sender<WorkerFault>,
) {
    for bytes in requests.iter() {
        let outcome = panic::catch_unwind(AssertUnwindSafe(|| service(&mut coordinator, &bytes)));
        let fault = match outcome {
            Ok(Ok(Some(reply))) => {
                if replies.send(reply.encode()).is_err() {
                    return;
                }
                continue;
            }
            Ok(Ok(None)) => continue,
            Ok(Err(e)) if !e.is_fatal() => {
                warn!("Terrain worker dropped message: {e}");
                continue;
            }
            Ok(Err(e)) => WorkerFault::from(e),
            Err(payload) => WorkerFault {
                message: panic_message(payload.as_ref()),
            },
        };
        error!("Terrain worker stopping: {}", fault.message);
        let _ = faults.send(fault);
        return;
    }
}

/// Consumer's side of the worker thread.
pub struct WorkerHandle {
    requests: Option<Sender<Vec<u8>>>,
    replies: Receiver<Vec<u8>>,
    faults: Receiver<WorkerFault>,
    thread: Option<JoinHandle<()>>,
}

impl WorkerHandle {
    pub fn spawn(config: StreamingConfig) -> Result<Self, WorkerError> {
        let (request_tx, request_rx) = channel::unbounded();
        let (reply_tx, reply_rx) = channel::unbounded();
        let (fault_tx, fault_rx) = channel::bounded(1);
        let coordinator = GenerationCoordinator::new(config);
        let thread = thread::Builder::new()
            .name(WORKER_THREAD_NAME.to_string())
            .spawn(move || run_worker(coordinator, request_rx, reply_tx, fault_tx))?;
        Ok(Self {
            requests: Some(request_tx),
            replies: reply_rx,
            faults: fault_rx,
            thread: Some(thread),
        })
    }

    /// Queue a message for the worker. Never blocks.
    pub fn post(&self, message: &Message) -> Result<(), WorkerError> {
        self.post_bytes(message.encode())
    }

    /// Queue raw bytes, bypassing encoding.
    pub fn post_bytes(&self, bytes: Vec<u8>) -> Result<(), WorkerError> {
        let requests = self.requests.as_ref().ok_or(WorkerError::Disconnected)?;
        requests.send(bytes).map_err(|_| WorkerError::Disconnected)
    }

    /// Next reply, if one is waiting.
    pub fn try_recv_reply(&self) -> Option<Vec<u8>> {
        self.replies.try_recv().ok()
    }

    /// Wait up to `timeout` for the next reply.
    pub fn recv_reply_timeout(&self, timeout: Duration) -> Option<Vec<u8>> {
        self.replies.recv_timeout(timeout).ok()
    }

    /// The worker's fault, if it has stopped.
    ///
    /// A worker that vanished without reporting is reported as disconnected.
    pub fn try_recv_fault(&self) -> Option<WorkerFault> {
        match self.faults.try_recv() {
            Ok(fault) => Some(fault),
            Err(TryRecvError::Empty) => None,
            Err(TryRecvError::Disconnected) => Some(WorkerError::Disconnected.into()),
        }
    }
}

impl Drop for WorkerHandle {
    fn drop(&mut self) {
        // Closing the request channel ends the worker loop.
        self.requests.take();
        if let Some(thread) = self.thread.take() {
            let _ = thread.join();
        }
    }
}
