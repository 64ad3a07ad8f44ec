//! Melee weapon: a dynamic weapon hinged to a static pivot that follows the
//! camera.

use nalgebra::Vector3;

use super::{rotation_from_to, MeleeKind};
use crate::assets::PropAsset;
use crate::camera::Camera;
use crate::entity::{Assembly, JointSpec, BodyRef, PhysicalEntity, Pivot, Pose};
use crate::physics::{groups, Collider, RigidBody, World};
use crate::scene::{NodeShape, VisualNode};
use crate::settings::ToolSettings;

pub const MELEE_PIVOT: &str = "meleeWeaponPivot";
const MELEE_HINGE: &str = "meleeHinge";

/// Pivot pose for the current camera: offset in camera space, facing the
/// view direction.
fn pivot_pose(camera: &Camera, tools: &ToolSettings) -> Pose {
    let position = camera.position.coords + camera.orientation() * tools.melee_offset;
    Pose::new(position, rotation_from_to(&-Vector3::z(), &camera.get_direction()))
}

pub fn create_melee_weapon(
    camera: &Camera,
    kind: MeleeKind,
    prop: PropAsset,
    mass: f32,
    tools: &ToolSettings,
) -> Option<Assembly> {
    if !(mass > 0.0) {
        return None;
    }
    let name = kind.name();
    let pivot = pivot_pose(camera, tools);
    let dims = prop.dimensions;
    let length = dims.x.max(dims.y).max(dims.z);
    let weapon_offset = tools.melee_offset - Vector3::z() * (length / 2.0);
    let weapon_position = camera.position.coords + camera.orientation() * weapon_offset;
    let weapon_orientation = rotation_from_to(&kind.local_forward(), &camera.get_direction());
    let hinge_point = pivot.position + (weapon_position - pivot.position) * tools.melee_hinge_fraction;

    let mut node = VisualNode::new("meleeWeapon");
    let pivot_id = node.add_child(
        VisualNode::ROOT,
        MELEE_PIVOT,
        NodeShape::Cuboid {
            half_extents: Vector3::repeat(0.05),
        },
    );
    node.set_local_position(pivot_id, pivot.position);
    let weapon_id = node.graft(VisualNode::ROOT, &prop.node);
    node.set_local_position(weapon_id, weapon_position);
    node.set_local_orientation(weapon_id, weapon_orientation);
    let weapon_node = node.node(weapon_id).map(|n| n.name.clone());

    let mut assembly = Assembly::new(node)
        .with_body(
            MELEE_PIVOT,
            RigidBody::new_static().with_position(pivot.position).with_orientation(pivot.orientation),
        )
        .with_body(
            name,
            RigidBody::new(mass)
                .with_position(weapon_position)
                .with_orientation(weapon_orientation)
                .with_collider(Collider::Cuboid { half_extents: dims / 2.0 })
                .with_collision_filter(groups::PROP, groups::ALL),
        )
        .with_joint(
            MELEE_HINGE,
            JointSpec::Hinge {
                a: BodyRef::part(MELEE_PIVOT),
                b: BodyRef::part(name),
                pivot: Pivot::World(hinge_point),
                axis_a: Vector3::x(),
                axis_b: Vector3::x(),
            },
        );
    if let Some(weapon_node) = weapon_node.filter(|n| n != name) {
        assembly.bind(name, Some(&weapon_node));
    }
    Some(assembly)
}

/// Keep the pivot glued to the camera.
pub fn move_pivot(world: &mut World, melee: &PhysicalEntity, camera: &Camera, tools: &ToolSettings) {
    let pose = pivot_pose(camera, tools);
    if let Some(body) = melee.body(MELEE_PIVOT).and_then(|h| world.body_mut(h)) {
        body.set_pose(pose.position, pose.orientation);
    }
}

/// Spin the weapon hard around its hinge.
pub fn swing(world: &mut World, melee: &PhysicalEntity, kind: MeleeKind, tools: &ToolSettings) {
    if let Some(body) = melee.body(kind.name()).and_then(|h| world.body_mut(h)) {
        body.angular_velocity = tools.melee_swing_velocity;
    }
}
