//! Consumer-side streaming: when to ask for a new window and how replies
//! replace the live meshes.

use std::collections::BTreeMap;
use std::time::Duration;

use bevy::log::{debug, error, warn};
use bevy::math::Vec3;

use crate::category::MeshCategory;
use crate::error::{ProtocolError, WorkerError};
use crate::mesh::{MeshBuffer, MeshPayload};
use crate::protocol::{MeshBundle, Message};
use crate::session::Session;
use crate::worker::{WorkerFault, WorkerHandle};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StreamState {
    /// No request outstanding.
    Idle,
    /// A generate request is in flight; threshold checks are suspended.
    Requested,
    /// The worker faulted. Nothing more will be requested.
    Halted,
}

/// Decides when to request a window and tracks the single in-flight slot.
#[derive(Debug, Clone)]
pub struct StreamingCoordinator {
    detail_distance: f32,
    /// `None` until the first request, so the first poll always triggers.
    last_trigger: Option<Vec3>,
    state: StreamState,
}

impl StreamingCoordinator {
    pub fn new(detail_distance: f32) -> Self {
        Self {
            detail_distance,
            last_trigger: None,
            state: StreamState::Idle,
        }
    }

    pub fn state(&self) -> StreamState {
        self.state
    }

    pub fn last_trigger(&self) -> Option<Vec3> {
        self.last_trigger
    }

    /// A generate request if `current` is more than the detail distance from
    /// the last trigger. The marker moves when the request is issued.
    pub fn poll_trigger(&mut self, current: Vec3) -> Option<Message> {
        if self.state != StreamState::Idle {
            return None;
        }
        let crossed = self
            .last_trigger
            .map_or(true, |last| current.distance(last) > self.detail_distance);
        if !crossed {
            return None;
        }
        self.last_trigger = Some(current);
        self.state = StreamState::Requested;
        Some(Message::Generate {
            pos: current.into(),
        })
    }

    /// Decode and validate a reply.
    ///
    /// The worker answers each request exactly once, so any reply that arrives
    /// while a request is outstanding frees the slot, even one that is then
    /// rejected. A reply with no request outstanding is rejected.
    pub fn accept_reply(&mut self, bytes: &[u8]) -> Result<MeshBundle, ProtocolError> {
        let outstanding = self.state == StreamState::Requested;
        if outstanding {
            self.state = StreamState::Idle;
        }
        let bundle = match Message::decode(bytes)? {
            Message::BuildMeshes(bundle) => bundle,
            other => {
                return Err(ProtocolError::Unexpected {
                    command: other.command(),
                })
            }
        };
        if !outstanding {
            return Err(ProtocolError::Unsolicited {
                command: "build-meshes",
            });
        }
        bundle.validate()?;
        Ok(bundle)
    }

    pub fn halt(&mut self) {
        self.state = StreamState::Halted;
    }
}

// ---------------------------------------------------------------------------
// Handoff
// ---------------------------------------------------------------------------

/// A live mesh that replies are copied into.
pub trait MeshTarget {
    fn reset(&mut self);
    fn load(&mut self, vertex_data: &[f32]);
    fn load_index(&mut self, index_data: &[u32]);
    /// Rebuild any state derived from the loaded data.
    fn build(&mut self);
}

/// Replace `target`'s contents with `payload`.
pub fn hand_off<T: MeshTarget + ?Sized>(target: &mut T, payload: &MeshPayload) {
    target.reset();
    target.load(&payload.vertex_data);
    target.load_index(&payload.index_data);
    target.build();
}

impl MeshTarget for MeshBuffer {
    fn reset(&mut self) {
        MeshBuffer::reset(self);
    }

    fn load(&mut self, vertex_data: &[f32]) {
        MeshBuffer::load(self, vertex_data);
    }

    fn load_index(&mut self, index_data: &[u32]) {
        MeshBuffer::load_index(self, index_data);
    }

    fn build(&mut self) {}
}

/// The consumer's live meshes, one per category.
#[derive(Debug, Clone)]
pub struct ConsumerMeshes<T> {
    targets: BTreeMap<MeshCategory, T>,
}

impl<T> Default for ConsumerMeshes<T> {
    fn default() -> Self {
        Self {
            targets: BTreeMap::new(),
        }
    }
}

impl<T: MeshTarget> ConsumerMeshes<T> {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, category: MeshCategory, target: T) {
        self.targets.insert(category, target);
    }

    pub fn get(&self, category: MeshCategory) -> Option<&T> {
        self.targets.get(&category)
    }

    pub fn get_mut(&mut self, category: MeshCategory) -> Option<&mut T> {
        self.targets.get_mut(&category)
    }

    pub fn iter(&self) -> impl Iterator<Item = (MeshCategory, &T)> {
        self.targets.iter().map(|(c, t)| (*c, t))
    }

    /// Hand every payload in `bundle` off to its target. Returns how many
    /// targets were replaced.
    pub fn apply(&mut self, bundle: &MeshBundle) -> usize {
        let mut applied = 0;
        for (category, payload) in &bundle.meshes {
            match self.targets.get_mut(category) {
                Some(target) => {
                    hand_off(target, payload);
                    applied += 1;
                }
                None => warn!("No live mesh for category {category}; payload dropped"),
            }
        }
        applied
    }
}

impl ConsumerMeshes<MeshBuffer> {
    /// An empty CPU-side buffer for every category.
    pub fn buffers() -> Self {
        let mut meshes = Self::new();
        for category in MeshCategory::ALL {
            meshes.insert(category, MeshBuffer::new());
        }
        meshes
    }
}

// ---------------------------------------------------------------------------
// StreamingChannel
// ---------------------------------------------------------------------------

/// A running worker plus the coordinator that feeds it.
pub struct StreamingChannel {
    worker: WorkerHandle,
    coordinator: StreamingCoordinator,
    applied: u64,
}

impl StreamingChannel {
    /// Spawn a worker and post the session's init message ahead of any
    /// generate request.
    pub fn open(session: &Session) -> Result<Self, WorkerError> {
        let worker = WorkerHandle::spawn(session.config().clone())?;
        worker.post(&session.init_message())?;
        Ok(Self::attach(worker, session.config().detail_distance))
    }

    /// Wrap an already running worker. Sends nothing.
    pub fn attach(worker: WorkerHandle, detail_distance: f32) -> Self {
        Self {
            worker,
            coordinator: StreamingCoordinator::new(detail_distance),
            applied: 0,
        }
    }

    pub fn state(&self) -> StreamState {
        self.coordinator.state()
    }

    pub fn coordinator(&self) -> &StreamingCoordinator {
        &self.coordinator
    }

    /// Replies applied so far.
    pub fn applied(&self) -> u64 {
        self.applied
    }

    /// Request a window if the viewer has moved far enough. Returns whether
    /// a request was sent.
    ///
    /// A request the worker can no longer receive keeps the slot occupied;
    /// the fault itself surfaces on the next `pump`.
    pub fn tick(&mut self, position: Vec3) -> bool {
        let Some(request) = self.coordinator.poll_trigger(position) else {
            return false;
        };
        if let Err(e) = self.worker.post(&request) {
            warn!("Terrain request not delivered: {e}");
            return false;
        }
        debug!("Requested terrain window at {position}");
        true
    }

    /// The next validated reply, if one has arrived. Once the queue is
    /// drained, reports a worker fault exactly once. Never blocks.
    pub fn next_bundle(&mut self) -> Result<Option<MeshBundle>, WorkerFault> {
        while let Some(bytes) = self.worker.try_recv_reply() {
            if let Some(bundle) = self.accept(&bytes) {
                return Ok(Some(bundle));
            }
        }
        self.check_fault()?;
        Ok(None)
    }

    /// Hand every reply that has arrived off to `meshes`. Returns how many
    /// targets were replaced.
    pub fn pump<T: MeshTarget>(&mut self, meshes: &mut ConsumerMeshes<T>) -> Result<usize, WorkerFault> {
        let mut applied = 0;
        while let Some(bundle) = self.next_bundle()? {
            applied += meshes.apply(&bundle);
        }
        Ok(applied)
    }

    /// Like `pump`, but waits up to `timeout` for an outstanding reply first.
    pub fn wait<T: MeshTarget>(
        &mut self,
        meshes: &mut ConsumerMeshes<T>,
        timeout: Duration,
    ) -> Result<usize, WorkerFault> {
        let mut applied = 0;
        if self.state() == StreamState::Requested {
            if let Some(bundle) = self
                .worker
                .recv_reply_timeout(timeout)
                .and_then(|bytes| self.accept(&bytes))
            {
                applied += meshes.apply(&bundle);
            }
        }
        Ok(applied + self.pump(meshes)?)
    }

    fn accept(&mut self, bytes: &[u8]) -> Option<MeshBundle> {
        if self.state() == StreamState::Halted {
            return None;
        }
        match self.coordinator.accept_reply(bytes) {
            Ok(bundle) => {
                self.applied += 1;
                Some(bundle)
            }
            Err(e) => {
                warn!("Dropping terrain reply: {e}");
                None
            }
        }
    }

    fn check_fault(&mut self) -> Result<(), WorkerFault> {
        if self.state() == StreamState::Halted {
            return Ok(());
        }
        if let Some(fault) = self.worker.try_recv_fault() {
            error!("{fault}; terrain streaming halted");
            self.coordinator.halt();
            return Err(fault);
        }
        Ok(())
    }
}
