//! Headless `--headless [steps]` mode: walks the viewer down the path
//! without a window or GPU.
//!
//! Each step moves the viewer forward by `STEP_LENGTH`, pins it to the road,
//! ticks the streaming channel and waits for any outstanding reply. One JSON
//! line per step goes to stdout with the request flag and the live mesh sizes;
//! logs go to stderr.

use bevy::log::LogPlugin;
use bevy::prelude::*;

use terrain::category::MeshCategory;
use terrain::config::StreamingConfig;
use terrain::session::Session;
use terrain::streaming::{ConsumerMeshes, StreamingChannel};
use terrain::viewer;
use terrain::TerrainPlugin;

const STEP_LENGTH: f32 = 0.5;
const REPLY_TIMEOUT: std::time::Duration = std::time::Duration::from_secs(10);

pub fn run_headless(master_seed: Option<u64>, config: StreamingConfig, steps: u32) -> AppExit {
    // -- Minimal app: logging plus the session resource ---------------------
    let mut app = App::new();
    app.add_plugins(MinimalPlugins);
    app.add_plugins(LogPlugin::default());
    app.add_plugins(TerrainPlugin {
        master_seed,
        config,
    });
    app.update();

    let Some(session) = app.world().get_resource::<Session>().cloned() else {
        error!("No terrain session; nothing to walk");
        return AppExit::error();
    };
    let mut channel = match StreamingChannel::open(&session) {
        Ok(channel) => channel,
        Err(e) => {
            error!("Cannot start terrain worker: {e}");
            return AppExit::error();
        }
    };
    let mut meshes = ConsumerMeshes::buffers();

    info!(
        "Headless walk: {steps} steps of {STEP_LENGTH} from master seed {:?}",
        session.master_seed()
    );

    // -- Walk loop ----------------------------------------------------------
    let mut position = viewer::spawn_position(session.fields());
    for step in 0..steps {
        let requested = channel.tick(position);
        let applied = match channel.wait(&mut meshes, REPLY_TIMEOUT) {
            Ok(applied) => applied,
            Err(fault) => {
                error!("Walk stopped at step {step}: {fault}");
                return AppExit::error();
            }
        };

        let mut sizes = serde_json::Map::new();
        for (category, mesh) in meshes.iter() {
            sizes.insert(
                category.name().to_string(),
                serde_json::json!({
                    "vertices": mesh.vertex_count(),
                    "indices": mesh.index_count(),
                }),
            );
        }
        let line = serde_json::json!({
            "step": step,
            "position": [position.x, position.y, position.z],
            "requested": requested,
            "applied": applied,
            "meshes": sizes,
        });
        println!("{line}");

        position = viewer::constrain(session.fields(), position + Vec3::Z * STEP_LENGTH);
    }

    let road = meshes
        .get(MeshCategory::Road)
        .map_or(0, |mesh| mesh.vertex_count());
    info!(
        "Headless walk done: {} replies applied, road has {road} vertices",
        channel.applied()
    );
    AppExit::Success
}
