//! Per-run session state.
//!
//! Everything derived from the master seed lives here: the sample maps, the
//! consumer's copy of the fields and the scatter seeds sent to the worker.
//! A session is built once at startup and handed to whatever needs it.

use bevy::log::info;
use bevy::prelude::Resource;

use crate::config::{StreamingConfig, CLIFF_MAP_SIZE, ROAD_MAP_LEN};
use crate::error::FieldError;
use crate::fields::TerrainFields;
use crate::protocol::{CategorySeeds, InitRequest, Message, SampleMaps};
use crate::sample_map::SampleMap;
use crate::seed_chain::SeedChain;

#[derive(Resource, Debug, Clone)]
pub struct Session {
    master_seed: Option<u64>,
    config: StreamingConfig,
    maps: SampleMaps,
    seeds: CategorySeeds,
    fields: TerrainFields,
}

impl Session {
    /// Derive maps and seeds from `master_seed`, in the fixed order road map,
    /// cliff map, rocks, brush.
    pub fn new(master_seed: u64, config: StreamingConfig) -> Result<Self, FieldError> {
        let mut chain = SeedChain::new(master_seed);
        let road_seed = chain.next_seed();
        let cliff_seed = chain.next_seed();
        let seeds = CategorySeeds {
            rocks: chain.next_seed(),
            brush: chain.next_seed(),
        };
        info!(
            "Session seed {master_seed}: road map {road_seed}, cliff map {cliff_seed}, rocks {}, brush {}",
            seeds.rocks, seeds.brush
        );

        let maps = SampleMaps {
            road: SampleMap::randomized_line(ROAD_MAP_LEN, road_seed),
            cliff: SampleMap::noise_grid(CLIFF_MAP_SIZE, CLIFF_MAP_SIZE, cliff_seed),
        };
        let mut session = Self::with_maps(config, maps, seeds)?;
        session.master_seed = Some(master_seed);
        Ok(session)
    }

    /// Session over caller-supplied maps and seeds.
    pub fn with_maps(
        config: StreamingConfig,
        maps: SampleMaps,
        seeds: CategorySeeds,
    ) -> Result<Self, FieldError> {
        let fields = TerrainFields::from_maps(&maps.road, &maps.cliff)?;
        Ok(Self {
            master_seed: None,
            config,
            maps,
            seeds,
            fields,
        })
    }

    /// `None` when built from explicit maps.
    pub fn master_seed(&self) -> Option<u64> {
        self.master_seed
    }

    pub fn config(&self) -> &StreamingConfig {
        &self.config
    }

    pub fn maps(&self) -> &SampleMaps {
        &self.maps
    }

    pub fn seeds(&self) -> CategorySeeds {
        self.seeds
    }

    pub fn fields(&self) -> &TerrainFields {
        &self.fields
    }

    /// The init message for a fresh worker. Carries copies of the maps.
    pub fn init_message(&self) -> Message {
        Message::Init(InitRequest {
            map: self.maps.clone(),
            seed: self.seeds,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_same_seed_same_session() {
        let a = Session::new(42, StreamingConfig::default()).unwrap();
        let b = Session::new(42, StreamingConfig::default()).unwrap();
        assert_eq!(a.maps(), b.maps());
        assert_eq!(a.seeds(), b.seeds());
        assert_eq!(a.init_message(), b.init_message());
    }

    #[test]
    fn test_sub_seeds_differ() {
        let session = Session::new(7, StreamingConfig::default()).unwrap();
        assert_ne!(session.seeds().rocks, session.seeds().brush);
        assert_ne!(session.maps().road, SampleMap::line(vec![0.0; ROAD_MAP_LEN]));
    }

    #[test]
    fn test_map_sizes() {
        let session = Session::new(1, StreamingConfig::default()).unwrap();
        assert_eq!(session.maps().road.dimensions(), (ROAD_MAP_LEN, 1));
        assert_eq!(
            session.maps().cliff.dimensions(),
            (CLIFF_MAP_SIZE, CLIFF_MAP_SIZE)
        );
        assert_eq!(session.master_seed(), Some(1));
    }

    #[test]
    fn test_with_maps_rejects_swapped_maps() {
        let maps = SampleMaps {
            road: SampleMap::noise_grid(8, 8, 1),
            cliff: SampleMap::randomized_line(8, 2),
        };
        let seeds = CategorySeeds { rocks: 1, brush: 2 };
        assert!(Session::with_maps(StreamingConfig::default(), maps, seeds).is_err());
    }
}
