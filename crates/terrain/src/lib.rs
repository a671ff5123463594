use bevy::prelude::*;

pub mod category;
pub mod config;
pub mod error;
pub mod fields;
pub mod mesh;
pub mod protocol;
pub mod sample_map;
pub mod scatter;
pub mod seed_chain;
pub mod session;
pub mod streaming;
pub mod strips;
pub mod viewer;
pub mod worker;

#[cfg(test)]
mod integration_tests;

use config::StreamingConfig;
use seed_chain::SeedChain;
use session::Session;

/// Builds the session at startup and exposes it as a resource.
///
/// With no master seed one is taken from the clock.
#[derive(Default)]
pub struct TerrainPlugin {
    pub master_seed: Option<u64>,
    pub config: StreamingConfig,
}

impl Plugin for TerrainPlugin {
    fn build(&self, app: &mut App) {
        let master_seed = self
            .master_seed
            .unwrap_or_else(|| SeedChain::from_entropy().master());
        match Session::new(master_seed, self.config.clone()) {
            Ok(session) => {
                app.insert_resource(self.config.clone())
                    .insert_resource(session);
            }
            Err(e) => error!("Cannot build terrain session: {e}"),
        }
    }
}
