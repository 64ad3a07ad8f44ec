use nalgebra::{Point3, Vector3};

use super::{rotation_from_to, ProjectileKind};
use crate::assets::PropAsset;
use crate::entity::Assembly;
use crate::physics::{groups, Collider, RigidBody};
use crate::scene::VisualNode;

/// Everything needed to launch one projectile.
#[derive(Debug, Clone, Copy)]
pub struct Throw {
    pub kind: ProjectileKind,
    pub origin: Point3<f32>,
    pub direction: Vector3<f32>,
    pub speed: f32,
    pub mass: f32,
}

/// A dynamic box sized from the prop, flying along the throw direction with
/// its forward axis pointing the same way.
///
/// Returns `None` for a zero direction or a non-positive mass.
pub fn create_projectile(throw: &Throw, prop: PropAsset) -> Option<Assembly> {
    let direction = throw.direction.try_normalize(1e-6)?;
    if !(throw.mass > 0.0) {
        return None;
    }
    let name = throw.kind.name();
    let half_extents = prop.dimensions / 2.0;
    let orientation = rotation_from_to(&throw.kind.local_forward(), &direction);

    let body = RigidBody::new(throw.mass)
        .with_position(throw.origin.coords)
        .with_orientation(orientation)
        .with_collider(Collider::Cuboid { half_extents })
        .with_velocity(direction * throw.speed)
        .with_collision_filter(groups::PROP, groups::ALL);

    let mut node = prop.node;
    // The body drives the prop root
    let root_name = node.name().to_owned();
    node.set_local_position(VisualNode::ROOT, throw.origin.coords);
    node.set_local_orientation(VisualNode::ROOT, orientation);

    let mut assembly = Assembly::new(node).with_body(name, body);
    if root_name != name {
        assembly.bind(name, Some(&root_name));
    }
    Some(assembly)
}
