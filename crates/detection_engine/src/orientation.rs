//! Orientation fusion: gravity + geomagnetic vectors (or a fused rotation
//! vector) into {azimuth, pitch, roll} angles.
//!
//! Angles are radians throughout; conversion to degrees happens only at the
//! reporting boundary, never inside fusion math.

use contracts::StreamSnapshot;
use nalgebra::{Matrix3, Quaternion, UnitQuaternion, Vector3};

use crate::stats::mean;

/// Minimum cross-product norm below which the gravity/geomagnetic pair is
/// considered degenerate (parallel vectors, free fall).
const MIN_CROSS_NORM: f64 = 0.1;

/// Fuse an instantaneous gravity estimate and geomagnetic vector into
/// {azimuth, pitch, roll} radians.
///
/// Builds the rotation matrix from the orthonormalized triple
/// H = E × A, M = A × H (rows H/M/A), remaps it for the device mounting,
/// and extracts the angles. Returns `None` when the two vectors are
/// degenerate/parallel rather than emitting garbage angles.
pub fn fuse(gravity: [f64; 3], geomagnetic: [f64; 3]) -> Option<[f64; 3]> {
    let a = Vector3::from(gravity);
    let e = Vector3::from(geomagnetic);

    let h = e.cross(&a);
    let norm_h = h.norm();
    if norm_h < MIN_CROSS_NORM {
        return None;
    }
    let h = h / norm_h;

    let norm_a = a.norm();
    if norm_a < f64::EPSILON {
        return None;
    }
    let a = a / norm_a;
    let m = a.cross(&h);

    let rotation = Matrix3::from_rows(&[h.transpose(), m.transpose(), a.transpose()]);
    Some(extract_angles(&remap_device_axes(&rotation)))
}

/// Single fused-sensor path: rotation-vector quaternion `[x, y, z, w]` into
/// {azimuth, pitch, roll} radians, through the same remap/extraction.
pub fn from_rotation_vector(rotation: [f64; 4]) -> [f64; 3] {
    let quat = UnitQuaternion::from_quaternion(Quaternion::new(
        rotation[3],
        rotation[0],
        rotation[1],
        rotation[2],
    ));
    let matrix = *quat.to_rotation_matrix().matrix();
    extract_angles(&remap_device_axes(&matrix))
}

/// Gravity estimate for the dual-sensor path: per-axis mean of the most
/// recent `window` accelerometer samples, not the instantaneous noisy
/// sample.
pub fn gravity_estimate(accel: &StreamSnapshot, window: usize) -> [f64; 3] {
    let len = accel.len();
    let window = window.clamp(1, len.max(1));
    let start = len - window;
    [
        mean(&accel.axes[0][start..]),
        mean(&accel.axes[1][start..]),
        mean(&accel.axes[2][start..]),
    ]
}

/// Fixed axis remap for the device's upright mounting orientation:
/// {x→x, y→z, z→−y}. Not configurable at runtime.
///
/// An upright device (top edge up) facing magnetic north reads zero on all
/// three angles after the remap.
fn remap_device_axes(r: &Matrix3<f64>) -> Matrix3<f64> {
    let x = r.column(0).into_owned();
    let y = r.column(1).into_owned();
    let z = r.column(2).into_owned();
    Matrix3::from_columns(&[x, -z, y])
}

/// Extract {azimuth, pitch, roll} from a remapped rotation matrix.
///
/// Pitch sign is inverted for consistency with the physical motion being
/// measured.
fn extract_angles(r: &Matrix3<f64>) -> [f64; 3] {
    let azimuth = r[(0, 1)].atan2(r[(1, 1)]);
    let pitch = -(-r[(2, 1)]).asin();
    let roll = (-r[(2, 0)]).atan2(r[(2, 2)]);
    [azimuth, pitch, roll]
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::f64::consts::FRAC_PI_2;

    // Upright device, top edge up: gravity reaction along device +Y.
    const GRAVITY_UPRIGHT: [f64; 3] = [0.0, 9.81, 0.0];
    // Mid-latitude field seen by that device facing north: horizontal
    // component 22 µT, downward inclination 42 µT.
    const FIELD_NORTH: [f64; 3] = [0.0, -42.0, -22.0];

    #[test]
    fn upright_device_facing_north_reads_zero() {
        let angles = fuse(GRAVITY_UPRIGHT, FIELD_NORTH).unwrap();
        assert!(angles[0].abs() < 1e-9, "azimuth {}", angles[0]);
        assert!(angles[1].abs() < 1e-9, "pitch {}", angles[1]);
        assert!(angles[2].abs() < 1e-9, "roll {}", angles[2]);
    }

    #[test]
    fn upright_device_facing_east_reads_quarter_turn_azimuth() {
        // Same posture rotated 90° about the vertical axis
        let angles = fuse(GRAVITY_UPRIGHT, [-22.0, -42.0, 0.0]).unwrap();
        assert!(
            (angles[0] - FRAC_PI_2).abs() < 1e-9,
            "azimuth {}",
            angles[0]
        );
        assert!(angles[1].abs() < 1e-9, "pitch {}", angles[1]);
        assert!(angles[2].abs() < 1e-9, "roll {}", angles[2]);
    }

    #[test]
    fn flat_device_pitches_to_quarter_turn() {
        // Device lying flat, screen up: gravity along device +Z
        let angles = fuse([0.0, 0.0, 9.81], [0.0, 22.0, -42.0]).unwrap();
        assert!(angles[0].abs() < 1e-9, "azimuth {}", angles[0]);
        assert!(
            (angles[1] + FRAC_PI_2).abs() < 1e-9,
            "pitch {}",
            angles[1]
        );
        assert!(angles[2].abs() < 1e-9, "roll {}", angles[2]);
    }

    #[test]
    fn parallel_vectors_are_rejected() {
        assert_eq!(fuse([0.0, 0.0, 9.81], [0.0, 0.0, 30.0]), None);
        assert_eq!(fuse([0.0, 0.0, 9.81], [0.0, 0.0, -30.0]), None);
    }

    #[test]
    fn free_fall_is_rejected() {
        assert_eq!(fuse([0.0, 0.0, 0.0], FIELD_NORTH), None);
    }

    #[test]
    fn angles_are_radians_in_range() {
        let angles = fuse([1.0, 2.0, 9.0], [15.0, -8.0, -40.0]).unwrap();
        assert!(angles[0].abs() <= std::f64::consts::PI);
        assert!(angles[1].abs() <= FRAC_PI_2 + 1e-9);
        assert!(angles[2].abs() <= std::f64::consts::PI);
    }

    #[test]
    fn rotation_vector_identity_matches_flat_frame() {
        // Identity rotation goes through the same remap as the dual path,
        // so it reads like the flat device
        let angles = from_rotation_vector([0.0, 0.0, 0.0, 1.0]);
        assert!(angles[0].abs() < 1e-9);
        assert!((angles[1] + FRAC_PI_2).abs() < 1e-9);
        assert!(angles[2].abs() < 1e-9);
    }

    #[test]
    fn gravity_estimate_averages_tail() {
        let snapshot = StreamSnapshot {
            axes: [
                vec![100.0, 1.0, 2.0, 3.0],
                vec![100.0, 0.0, 0.0, 0.0],
                vec![100.0, 9.0, 9.0, 9.0],
            ],
            timestamps: vec![1, 2, 3, 4],
            rate_hz: 0.0,
            accuracy: 0,
        };
        let g = gravity_estimate(&snapshot, 3);
        assert!((g[0] - 2.0).abs() < 1e-12);
        assert!((g[1] - 0.0).abs() < 1e-12);
        assert!((g[2] - 9.0).abs() < 1e-12);
    }
}
