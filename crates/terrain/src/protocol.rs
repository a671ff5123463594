//! Messages exchanged between the consumer and the generation worker.
//!
//! Messages cross the thread boundary as encoded bytes, never as shared
//! references. The message set is closed: anything that does not decode to
//! one of the three variants is rejected at the boundary.

use bevy::math::Vec3;
use bitcode::{Decode, Encode};

use crate::category::MeshCategory;
use crate::error::ProtocolError;
use crate::mesh::MeshPayload;
use crate::sample_map::SampleMap;

#[derive(Debug, Clone, Copy, PartialEq, Encode, Decode)]
pub struct Position {
    pub x: f32,
    pub y: f32,
    pub z: f32,
}

impl Position {
    pub fn new(x: f32, y: f32, z: f32) -> Self {
        Self { x, y, z }
    }
}

impl From<Vec3> for Position {
    fn from(v: Vec3) -> Self {
        Self::new(v.x, v.y, v.z)
    }
}

impl From<Position> for Vec3 {
    fn from(p: Position) -> Self {
        Vec3::new(p.x, p.y, p.z)
    }
}

#[derive(Debug, Clone, PartialEq, Encode, Decode)]
pub struct SampleMaps {
    pub road: SampleMap,
    pub cliff: SampleMap,
}

/// Scatter seeds for the two prop categories.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Encode, Decode)]
pub struct CategorySeeds {
    pub rocks: u32,
    pub brush: u32,
}

#[derive(Debug, Clone, PartialEq, Encode, Decode)]
pub struct InitRequest {
    pub map: SampleMaps,
    pub seed: CategorySeeds,
}

/// Every category's payload from one generation cycle.
#[derive(Debug, Clone, Default, PartialEq, Encode, Decode)]
pub struct MeshBundle {
    pub meshes: Vec<(MeshCategory, MeshPayload)>,
}

impl MeshBundle {
    pub fn get(&self, category: MeshCategory) -> Option<&MeshPayload> {
        self.meshes
            .iter()
            .find(|(c, _)| *c == category)
            .map(|(_, p)| p)
    }

    /// Each category at most once, every payload internally consistent.
    pub fn validate(&self) -> Result<(), ProtocolError> {
        for (i, (category, payload)) in self.meshes.iter().enumerate() {
            if self.meshes[..i].iter().any(|(c, _)| c == category) {
                return Err(ProtocolError::InvalidPayload(format!(
                    "duplicate {category} mesh"
                )));
            }
            payload.validate().map_err(|e| {
                ProtocolError::InvalidPayload(format!("{category}: {e}"))
            })?;
        }
        Ok(())
    }
}

#[derive(Debug, Clone, PartialEq, Encode, Decode)]
pub enum Message {
    /// Consumer to worker: sample maps and seeds. Produces no reply.
    Init(InitRequest),
    /// Consumer to worker: regenerate around `pos`.
    Generate { pos: Position },
    /// Worker to consumer: the regenerated meshes.
    BuildMeshes(MeshBundle),
}

impl Message {
    pub fn command(&self) -> &'static str {
        match self {
            Message::Init(_) => "init",
            Message::Generate { .. } => "generate",
            Message::BuildMeshes(_) => "build-meshes",
        }
    }

    pub fn encode(&self) -> Vec<u8> {
        bitcode::encode(self)
    }

    pub fn decode(bytes: &[u8]) -> Result<Self, ProtocolError> {
        Ok(bitcode::decode(bytes)?)
    }
}
