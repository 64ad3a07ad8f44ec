//! Collider shapes and narrow-phase tests.
//!
//! Cuboids are tested through their world-space bounding box: a rotated
//! cuboid is widened to the axis-aligned box that encloses it. This keeps
//! every test closed-form at the cost of loose contacts for tilted props.

use nalgebra::{UnitQuaternion, Vector3};

use super::body::BodyHandle;

/// A collision shape centered on its body's position.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Collider {
    Sphere { radius: f32 },
    /// Box defined by half-extents along the body's local axes.
    Cuboid { half_extents: Vector3<f32> },
}

impl Collider {
    /// Half-extents of the axis-aligned box enclosing this shape at `orientation`.
    pub fn world_half_extents(&self, orientation: &UnitQuaternion<f32>) -> Vector3<f32> {
        match self {
            Collider::Sphere { radius } => Vector3::repeat(*radius),
            Collider::Cuboid { half_extents } => {
                let r = orientation.to_rotation_matrix();
                r.matrix().abs() * half_extents
            }
        }
    }

    /// Half-extents in the body's own frame.
    pub fn local_half_extents(&self) -> Vector3<f32> {
        match self {
            Collider::Sphere { radius } => Vector3::repeat(*radius),
            Collider::Cuboid { half_extents } => *half_extents,
        }
    }
}

/// A detected contact between two bodies.
#[derive(Debug, Clone)]
pub struct Contact {
    pub body_a: BodyHandle,
    pub body_b: BodyHandle,
    /// Contact normal pointing from body A toward body B.
    pub normal: Vector3<f32>,
    /// Penetration depth (positive when overlapping).
    pub penetration: f32,
}

/// Test two posed colliders for intersection.
///
/// Returns `(normal_a_to_b, penetration)` or `None` when separated.
pub(crate) fn collide(
    pos_a: &Vector3<f32>,
    rot_a: &UnitQuaternion<f32>,
    col_a: &Collider,
    pos_b: &Vector3<f32>,
    rot_b: &UnitQuaternion<f32>,
    col_b: &Collider,
) -> Option<(Vector3<f32>, f32)> {
    match (col_a, col_b) {
        (Collider::Sphere { radius: ra }, Collider::Sphere { radius: rb }) => {
            collide_sphere_sphere(pos_a, *ra, pos_b, *rb)
        }
        (Collider::Cuboid { .. }, Collider::Cuboid { .. }) => collide_aabb_aabb(
            pos_a,
            &col_a.world_half_extents(rot_a),
            pos_b,
            &col_b.world_half_extents(rot_b),
        ),
        (Collider::Sphere { radius }, Collider::Cuboid { .. }) => {
            collide_sphere_aabb(pos_a, *radius, pos_b, &col_b.world_half_extents(rot_b))
        }
        (Collider::Cuboid { .. }, Collider::Sphere { radius }) => {
            collide_sphere_aabb(pos_b, *radius, pos_a, &col_a.world_half_extents(rot_a))
                .map(|(normal, pen)| (-normal, pen))
        }
    }
}

fn collide_sphere_sphere(
    pos_a: &Vector3<f32>,
    radius_a: f32,
    pos_b: &Vector3<f32>,
    radius_b: f32,
) -> Option<(Vector3<f32>, f32)> {
    let diff = pos_b - pos_a;
    let dist_sq = diff.norm_squared();
    let sum_r = radius_a + radius_b;

    if dist_sq >= sum_r * sum_r {
        return None;
    }

    let dist = dist_sq.sqrt();
    let normal = if dist > 1e-6 { diff / dist } else { Vector3::y() };

    Some((normal, sum_r - dist))
}

/// Separating-axis test on the three world axes.
fn collide_aabb_aabb(
    pos_a: &Vector3<f32>,
    half_a: &Vector3<f32>,
    pos_b: &Vector3<f32>,
    half_b: &Vector3<f32>,
) -> Option<(Vector3<f32>, f32)> {
    let diff = pos_b - pos_a;

    let overlap_x = half_a.x + half_b.x - diff.x.abs();
    if overlap_x <= 0.0 {
        return None;
    }
    let overlap_y = half_a.y + half_b.y - diff.y.abs();
    if overlap_y <= 0.0 {
        return None;
    }
    let overlap_z = half_a.z + half_b.z - diff.z.abs();
    if overlap_z <= 0.0 {
        return None;
    }

    let sign = |v: f32| if v >= 0.0 { 1.0 } else { -1.0 };
    if overlap_x <= overlap_y && overlap_x <= overlap_z {
        Some((Vector3::new(sign(diff.x), 0.0, 0.0), overlap_x))
    } else if overlap_y <= overlap_z {
        Some((Vector3::new(0.0, sign(diff.y), 0.0), overlap_y))
    } else {
        Some((Vector3::new(0.0, 0.0, sign(diff.z)), overlap_z))
    }
}

/// Sphere vs box. Normal points from the sphere toward the box.
fn collide_sphere_aabb(
    sphere_pos: &Vector3<f32>,
    sphere_radius: f32,
    aabb_pos: &Vector3<f32>,
    aabb_half: &Vector3<f32>,
) -> Option<(Vector3<f32>, f32)> {
    let aabb_min = aabb_pos - aabb_half;
    let aabb_max = aabb_pos + aabb_half;

    let closest = Vector3::new(
        sphere_pos.x.clamp(aabb_min.x, aabb_max.x),
        sphere_pos.y.clamp(aabb_min.y, aabb_max.y),
        sphere_pos.z.clamp(aabb_min.z, aabb_max.z),
    );

    let diff = sphere_pos - closest;
    let dist_sq = diff.norm_squared();

    if dist_sq >= sphere_radius * sphere_radius {
        return None;
    }

    let dist = dist_sq.sqrt();

    if dist > 1e-6 {
        return Some((-diff / dist, sphere_radius - dist));
    }

    // Center inside the box: push out along the face of least penetration
    let faces = [
        (aabb_max.x - sphere_pos.x, Vector3::x()),
        (sphere_pos.x - aabb_min.x, -Vector3::x()),
        (aabb_max.y - sphere_pos.y, Vector3::y()),
        (sphere_pos.y - aabb_min.y, -Vector3::y()),
        (aabb_max.z - sphere_pos.z, Vector3::z()),
        (sphere_pos.z - aabb_min.z, -Vector3::z()),
    ];
    let mut best = faces[0];
    for face in &faces[1..] {
        if face.0 < best.0 {
            best = *face;
        }
    }

    Some((best.1, sphere_radius + best.0))
}

#[cfg(test)]
mod tests {
    use super::*;

    const EPSILON: f32 = 1e-4;

    fn approx_eq(a: f32, b: f32) -> bool {
        (a - b).abs() < EPSILON
    }

    fn approx_vec_eq(a: &Vector3<f32>, b: &Vector3<f32>) -> bool {
        approx_eq(a.x, b.x) && approx_eq(a.y, b.y) && approx_eq(a.z, b.z)
    }

    #[test]
    fn test_sphere_sphere_no_collision() {
        let r = collide_sphere_sphere(&Vector3::zeros(), 1.0, &Vector3::new(3.0, 0.0, 0.0), 1.0);
        assert!(r.is_none());
    }

    #[test]
    fn test_sphere_sphere_overlapping() {
        let (normal, pen) =
            collide_sphere_sphere(&Vector3::zeros(), 1.0, &Vector3::new(1.5, 0.0, 0.0), 1.0).unwrap();
        assert!(approx_vec_eq(&normal, &Vector3::x()));
        assert!(approx_eq(pen, 0.5), "Expected penetration ~0.5, got {}", pen);
    }

    #[test]
    fn test_sphere_sphere_coincident() {
        let (normal, pen) = collide_sphere_sphere(&Vector3::zeros(), 1.0, &Vector3::zeros(), 1.0).unwrap();
        assert!(approx_vec_eq(&normal, &Vector3::y()));
        assert!(approx_eq(pen, 2.0));
    }

    #[test]
    fn test_aabb_aabb_least_overlap_axis() {
        let (normal, pen) = collide_aabb_aabb(
            &Vector3::zeros(),
            &Vector3::new(1.0, 1.0, 1.0),
            &Vector3::new(0.0, 1.8, 0.2),
            &Vector3::new(1.0, 1.0, 1.0),
        )
        .unwrap();
        assert!(approx_vec_eq(&normal, &Vector3::y()));
        assert!(approx_eq(pen, 0.2));
    }

    #[test]
    fn test_sphere_aabb_outside() {
        let (normal, pen) = collide_sphere_aabb(
            &Vector3::new(0.0, 1.4, 0.0),
            0.5,
            &Vector3::zeros(),
            &Vector3::new(1.0, 1.0, 1.0),
        )
        .unwrap();
        assert!(approx_vec_eq(&normal, &-Vector3::y()));
        assert!(approx_eq(pen, 0.1));
    }

    #[test]
    fn test_sphere_aabb_center_inside() {
        let (normal, pen) = collide_sphere_aabb(
            &Vector3::new(0.0, 0.9, 0.0),
            0.5,
            &Vector3::zeros(),
            &Vector3::new(1.0, 1.0, 1.0),
        )
        .unwrap();
        assert!(approx_vec_eq(&normal, &Vector3::y()));
        assert!(approx_eq(pen, 0.6));
    }

    #[test]
    fn test_rotated_cuboid_widens() {
        let collider = Collider::Cuboid {
            half_extents: Vector3::new(2.0, 0.1, 0.1),
        };
        let quarter = UnitQuaternion::from_axis_angle(&Vector3::z_axis(), core::f32::consts::FRAC_PI_2);
        let h = collider.world_half_extents(&quarter);
        assert!(approx_eq(h.x, 0.1) && approx_eq(h.y, 2.0), "Got {:?}", h);
    }

    #[test]
    fn test_collide_flips_normal_for_box_sphere() {
        let id = UnitQuaternion::identity();
        let cube = Collider::Cuboid {
            half_extents: Vector3::new(1.0, 1.0, 1.0),
        };
        let ball = Collider::Sphere { radius: 0.5 };
        let (normal, _) = collide(
            &Vector3::zeros(),
            &id,
            &cube,
            &Vector3::new(0.0, 1.4, 0.0),
            &id,
            &ball,
        )
        .unwrap();
        assert!(approx_vec_eq(&normal, &Vector3::y()));
    }
}
