//! Keeping the viewer on the path.

use bevy::math::Vec3;

use crate::config::{VIEWER_HEIGHT, VIEWER_MAX_OFFSET, VIEWER_MIN_OFFSET};
use crate::fields::TerrainFields;

/// Start position: eye height above the path at `z = 0`, on the cliff line.
pub fn spawn_position(fields: &TerrainFields) -> Vec3 {
    let h = fields.height(0.0);
    Vec3::new(
        fields.surface(h, 0.0) as f32,
        h as f32 + VIEWER_HEIGHT,
        0.0,
    )
}

/// Pin `pos` to eye height over the path and clamp it laterally between the
/// cliff base and the drop.
pub fn constrain(fields: &TerrainFields, pos: Vec3) -> Vec3 {
    let z = pos.z as f64;
    let y = fields.height(z) as f32 + VIEWER_HEIGHT;
    let s = fields.surface(y as f64, z) as f32;
    Vec3::new(
        pos.x.clamp(s + VIEWER_MIN_OFFSET, s + VIEWER_MAX_OFFSET),
        y,
        pos.z,
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::sample_map::SampleMap;

    fn fields() -> TerrainFields {
        TerrainFields::from_maps(
            &SampleMap::randomized_line(128, 8),
            &SampleMap::noise_grid(32, 32, 9),
        )
        .unwrap()
    }

    #[test]
    fn test_spawn_is_at_eye_height() {
        let f = fields();
        let p = spawn_position(&f);
        assert_eq!(p.z, 0.0);
        assert!((p.y - (f.height(0.0) as f32 + VIEWER_HEIGHT)).abs() < 1e-5);
    }

    #[test]
    fn test_constrain_clamps_laterally() {
        let f = fields();
        let far_out = constrain(&f, Vec3::new(1000.0, 0.0, 3.0));
        let far_in = constrain(&f, Vec3::new(-1000.0, 0.0, 3.0));
        let s = f.surface(far_out.y as f64, 3.0) as f32;
        assert!((far_out.x - (s + VIEWER_MAX_OFFSET)).abs() < 1e-4);
        assert!((far_in.x - (s + VIEWER_MIN_OFFSET)).abs() < 1e-4);
        assert_eq!(far_out.y, far_in.y);
    }

    #[test]
    fn test_constrain_keeps_valid_position() {
        let f = fields();
        let p = constrain(&f, Vec3::new(0.0, 0.0, -7.25));
        let again = constrain(&f, p);
        assert_eq!(p, again);
    }
}
