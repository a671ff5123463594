//! Canyon meshes on the render side.
//!
//! One mesh entity per category is spawned empty at startup. The worker is
//! started from the session, and every frame the focus entity's position is
//! fed to the streaming channel. Replies replace the mesh assets in place;
//! there is no merging with earlier windows.

mod mesh;
mod systems;
mod types;

use bevy::prelude::*;

pub use mesh::{empty_canyon_mesh, RenderMesh};
pub use systems::{open_terrain_stream, spawn_canyon_meshes, stream_canyon_meshes};
pub use types::{CanyonMesh, CanyonMeshHandles, StreamFocus, TerrainStream};

pub struct CanyonRenderPlugin;

impl Plugin for CanyonRenderPlugin {
    fn build(&self, app: &mut App) {
        app.init_resource::<TerrainStream>()
            .init_resource::<CanyonMeshHandles>()
            .add_systems(Startup, (spawn_canyon_meshes, open_terrain_stream))
            .add_systems(Update, stream_canyon_meshes);
    }
}
