use std::collections::BTreeMap;

use bevy::prelude::*;

use terrain::category::MeshCategory;
use terrain::streaming::{StreamState, StreamingChannel};
use terrain::worker::WorkerFault;

/// One live canyon mesh. Its asset is replaced wholesale on every reply.
#[derive(Component, Debug, Clone, Copy, PartialEq, Eq)]
pub struct CanyonMesh {
    pub category: MeshCategory,
}

/// Marks the entity whose translation drives streaming (the viewer camera).
#[derive(Component, Debug, Default, Clone, Copy)]
pub struct StreamFocus;

/// Mesh asset handle per category, filled at startup.
#[derive(Resource, Debug, Default)]
pub struct CanyonMeshHandles(pub BTreeMap<MeshCategory, Handle<Mesh>>);

impl CanyonMeshHandles {
    pub fn get(&self, category: MeshCategory) -> Option<&Handle<Mesh>> {
        self.0.get(&category)
    }
}

/// The worker channel owned by the render side.
///
/// `channel` is `None` until startup opens it, or when it could not be opened.
/// `fault` keeps the first worker fault; once set, streaming stays halted.
#[derive(Resource, Default)]
pub struct TerrainStream {
    pub channel: Option<StreamingChannel>,
    pub fault: Option<WorkerFault>,
}

impl TerrainStream {
    pub fn state(&self) -> Option<StreamState> {
        self.channel.as_ref().map(StreamingChannel::state)
    }

    /// Replies handed off so far.
    pub fn applied(&self) -> u64 {
        self.channel.as_ref().map_or(0, StreamingChannel::applied)
    }

    pub fn is_halted(&self) -> bool {
        self.fault.is_some() || self.state() == Some(StreamState::Halted)
    }
}
