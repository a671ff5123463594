//! Cross-module tests: a real worker thread fed by a real session.

mod seam_tests;

use std::time::Duration;

use bevy::prelude::*;

use crate::category::MeshCategory;
use crate::config::StreamingConfig;
use crate::protocol::{CategorySeeds, SampleMaps};
use crate::sample_map::SampleMap;
use crate::session::Session;
use crate::streaming::{ConsumerMeshes, StreamState, StreamingChannel};
use crate::TerrainPlugin;

pub(crate) const REPLY_TIMEOUT: Duration = Duration::from_secs(30);

pub(crate) fn flat_session() -> Session {
    let maps = SampleMaps {
        road: SampleMap::line(vec![0.0; 128]),
        cliff: SampleMap::noise_grid(64, 64, 5),
    };
    Session::with_maps(
        StreamingConfig::default(),
        maps,
        CategorySeeds {
            rocks: 1001,
            brush: 2002,
        },
    )
    .unwrap()
}

#[test]
fn test_zero_road_map_is_flat_everywhere() {
    let session = flat_session();
    for i in -500..500 {
        let z = i as f64 * 0.731;
        assert_eq!(session.fields().height(z), 0.0, "height at z={z}");
    }
}

#[test]
fn test_origin_reply_has_road_strip() {
    let session = Session::new(2024, StreamingConfig::default()).unwrap();
    let mut channel = StreamingChannel::open(&session).unwrap();
    let mut meshes = ConsumerMeshes::buffers();

    assert!(channel.tick(Vec3::ZERO));
    let applied = channel.wait(&mut meshes, REPLY_TIMEOUT).unwrap();
    assert_eq!(applied, MeshCategory::ALL.len());
    assert_eq!(channel.state(), StreamState::Idle);

    let road = meshes.get(MeshCategory::Road).unwrap();
    assert_eq!(road.vertex_count(), 128);
    assert_eq!(road.index_count(), 378);
}

#[test]
fn test_flat_road_lies_at_zero() {
    let session = flat_session();
    let mut channel = StreamingChannel::open(&session).unwrap();
    let mut meshes = ConsumerMeshes::buffers();
    channel.tick(Vec3::ZERO);
    channel.wait(&mut meshes, REPLY_TIMEOUT).unwrap();

    let road = meshes.get(MeshCategory::Road).unwrap();
    assert!(road.positions().iter().all(|p| p[1] == 0.0));
}

#[test]
fn test_plugin_inserts_session() {
    let mut app = App::new();
    app.add_plugins(MinimalPlugins).add_plugins(TerrainPlugin {
        master_seed: Some(9),
        config: StreamingConfig::default(),
    });
    app.update();

    let session = app.world().resource::<Session>();
    assert_eq!(session.master_seed(), Some(9));
    assert!(app.world().get_resource::<StreamingConfig>().is_some());
}

#[test]
fn test_plugin_session_matches_direct_session() {
    let mut app = App::new();
    app.add_plugins(MinimalPlugins).add_plugins(TerrainPlugin {
        master_seed: Some(77),
        ..Default::default()
    });
    let direct = Session::new(77, StreamingConfig::default()).unwrap();
    let session = app.world().resource::<Session>();
    assert_eq!(session.init_message(), direct.init_message());
}
