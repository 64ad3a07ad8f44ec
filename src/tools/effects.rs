//! One-shot impulses: punch, drag, explosion, plus the projectile tip used
//! to decide when impale and explosive projectiles trigger.

use nalgebra::Vector3;

use super::ProjectileKind;
use crate::camera::Camera;
use crate::entity::PhysicalEntity;
use crate::physics::{RigidBody, World};

/// Impulse of `strength` along the view direction on the named parts (all
/// parts when empty).
pub fn punch(world: &mut World, target: &PhysicalEntity, camera: &Camera, strength: f32, parts: &[&str]) {
    target.apply_impulse(world, parts, camera.get_direction() * strength);
}

/// Push every part of `target` in the camera's screen plane.
///
/// `dx` and `dy` are pointer deltas; +dy pushes along the camera's up.
pub fn drag(world: &mut World, target: &PhysicalEntity, camera: &Camera, force: f32, dx: f32, dy: f32) {
    let impulse = camera.right() * (dx * force) + camera.up_vector() * (dy * force);
    target.apply_impulse(world, &[], impulse);
}

/// Radial impulse on a body at `position`: `(1 - d/r) * force` away from the
/// center, nothing at or beyond `radius`.
pub fn explosion_impulse(
    position: &Vector3<f32>,
    center: &Vector3<f32>,
    radius: f32,
    force: f32,
) -> Option<Vector3<f32>> {
    let offset = position - center;
    let distance = offset.norm();
    if !(distance < radius) {
        return None;
    }
    let strength = (1.0 - distance / radius) * force;
    let direction = offset.try_normalize(1e-6).unwrap_or(Vector3::y());
    Some(direction * strength)
}

/// Apply [`explosion_impulse`] to every dynamic body. Returns how many were
/// pushed.
pub fn apply_explosion_impulse(world: &mut World, center: &Vector3<f32>, radius: f32, force: f32) -> usize {
    let mut pushed = 0;
    for (_, body) in world.bodies_mut() {
        if !body.is_dynamic() {
            continue;
        }
        if let Some(impulse) = explosion_impulse(&body.position, center, radius, force) {
            body.apply_impulse(impulse);
            pushed += 1;
        }
    }
    pushed
}

/// World-space point at the front of a projectile: its local forward scaled
/// by the box half-extents, moved by the body pose.
pub fn projectile_tip(body: &RigidBody, kind: ProjectileKind) -> Vector3<f32> {
    let half_extents = body
        .collider
        .map(|c| c.local_half_extents())
        .unwrap_or_else(Vector3::zeros);
    body.local_to_world(&kind.local_forward().component_mul(&half_extents))
}
