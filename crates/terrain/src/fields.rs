//! Height and surface fields.
//!
//! Pure functions of their coordinates, built once from sample maps. Both
//! the consumer and the worker build their own copies from equal maps and get
//! bit-identical results: all evaluation is plain `f64` arithmetic with no
//! hidden state.

use std::sync::Arc;

use crate::error::FieldError;
use crate::sample_map::SampleMap;

/// Shape of a one-dimensional field: `amplitude * line(z * frequency)`.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct LineParams {
    pub amplitude: f64,
    pub frequency: f64,
}

/// One octave of a surface: `amplitude * grid(y * y_frequency, z * z_frequency)`.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct OctaveParams {
    pub amplitude: f64,
    pub y_frequency: f64,
    pub z_frequency: f64,
}

/// Path elevation profile.
pub const ROAD_LINE: LineParams = LineParams {
    amplitude: 6.0,
    frequency: 0.05,
};

/// Cliff octaves, coarse to fine.
pub const CLIFF_OCTAVES: [OctaveParams; 3] = [
    OctaveParams {
        amplitude: 10.0,
        y_frequency: 0.05,
        z_frequency: 0.1,
    },
    OctaveParams {
        amplitude: 5.0,
        y_frequency: 0.25,
        z_frequency: 0.5,
    },
    OctaveParams {
        amplitude: 1.0,
        y_frequency: 0.75,
        z_frequency: 1.5,
    },
];

#[inline]
fn smoothstep(t: f64) -> f64 {
    t * t * (3.0 - 2.0 * t)
}

#[inline]
fn lerp(a: f64, b: f64, t: f64) -> f64 {
    a + (b - a) * t
}

fn check_line(map: &SampleMap) -> Result<(), FieldError> {
    if !matches!(map, SampleMap::Line { .. }) {
        return Err(FieldError::WrongShape {
            expected: "line",
            found: map.kind(),
        });
    }
    if map.is_empty() {
        return Err(FieldError::Empty);
    }
    Ok(())
}

fn check_grid(map: &SampleMap) -> Result<(), FieldError> {
    let SampleMap::Grid {
        width,
        height,
        values,
    } = map
    else {
        return Err(FieldError::WrongShape {
            expected: "grid",
            found: map.kind(),
        });
    };
    if values.is_empty() || *width == 0 || *height == 0 {
        return Err(FieldError::Empty);
    }
    if values.len() != width * height {
        return Err(FieldError::LengthMismatch {
            expected: width * height,
            found: values.len(),
        });
    }
    Ok(())
}

// ---------------------------------------------------------------------------
// HeightField
// ---------------------------------------------------------------------------

/// `height(z) -> y` along the path.
#[derive(Debug, Clone)]
pub struct HeightField {
    map: Arc<SampleMap>,
    params: LineParams,
}

/// Build a height field from a line map.
pub fn make_line(map: &SampleMap, params: LineParams) -> Result<HeightField, FieldError> {
    check_line(map)?;
    Ok(HeightField {
        map: Arc::new(map.clone()),
        params,
    })
}

impl HeightField {
    pub fn height(&self, z: f64) -> f64 {
        let u = z * self.params.frequency;
        let i = u.floor();
        let t = smoothstep(u - i);
        let i = i as i64;
        let a = self.map.sample(i, 0) as f64;
        let b = self.map.sample(i.wrapping_add(1), 0) as f64;
        self.params.amplitude * lerp(a, b, t)
    }
}

// ---------------------------------------------------------------------------
// SurfaceField
// ---------------------------------------------------------------------------

/// A single smoothed 2D lookup.
#[derive(Debug, Clone)]
pub struct SurfaceOctave {
    map: Arc<SampleMap>,
    params: OctaveParams,
}

/// Build one surface octave from a grid map.
pub fn make_surface(map: &SampleMap, params: OctaveParams) -> Result<SurfaceOctave, FieldError> {
    check_grid(map)?;
    Ok(SurfaceOctave {
        map: Arc::new(map.clone()),
        params,
    })
}

impl SurfaceOctave {
    pub fn sample(&self, y: f64, z: f64) -> f64 {
        let u = y * self.params.y_frequency;
        let v = z * self.params.z_frequency;
        let (iu, iv) = (u.floor(), v.floor());
        let (tu, tv) = (smoothstep(u - iu), smoothstep(v - iv));
        let (c, r) = (iu as i64, iv as i64);
        let s = |dc: i64, dr: i64| {
            self.map.sample(c.wrapping_add(dc), r.wrapping_add(dr)) as f64
        };
        let top = lerp(s(0, 0), s(1, 0), tu);
        let bottom = lerp(s(0, 1), s(1, 1), tu);
        self.params.amplitude * lerp(top, bottom, tv)
    }
}

/// Lateral cliff offset `surface(y, z) -> x`, summed over octaves.
#[derive(Debug, Clone)]
pub struct SurfaceField {
    octaves: Vec<SurfaceOctave>,
}

impl SurfaceField {
    pub fn new(octaves: Vec<SurfaceOctave>) -> Self {
        Self { octaves }
    }

    /// Build all octaves over one shared copy of the map.
    pub fn from_map(map: &SampleMap, octaves: &[OctaveParams]) -> Result<Self, FieldError> {
        check_grid(map)?;
        let shared = Arc::new(map.clone());
        Ok(Self::new(
            octaves
                .iter()
                .map(|&params| SurfaceOctave {
                    map: Arc::clone(&shared),
                    params,
                })
                .collect(),
        ))
    }

    pub fn surface(&self, y: f64, z: f64) -> f64 {
        self.octaves.iter().map(|o| o.sample(y, z)).sum()
    }
}

// ---------------------------------------------------------------------------
// TerrainFields
// ---------------------------------------------------------------------------

/// The pair of fields every generator samples.
#[derive(Debug, Clone)]
pub struct TerrainFields {
    pub height: HeightField,
    pub surface: SurfaceField,
}

impl TerrainFields {
    pub fn from_maps(road: &SampleMap, cliff: &SampleMap) -> Result<Self, FieldError> {
        Ok(Self {
            height: make_line(road, ROAD_LINE)?,
            surface: SurfaceField::from_map(cliff, &CLIFF_OCTAVES)?,
        })
    }

    pub fn height(&self, z: f64) -> f64 {
        self.height.height(z)
    }

    pub fn surface(&self, y: f64, z: f64) -> f64 {
        self.surface.surface(y, z)
    }
}
