use embedded_graphics_core::pixelcolor::{Rgb565, WebColors};
use nalgebra::Vector3;

use crate::entity::{Assembly, PhysicalEntity};
use crate::physics::{Collider, RigidBody, World};
use crate::scene::{NodeShape, VisualNode};
use crate::settings::ToolSettings;

pub const GUILLOTINE: &str = "guillotine";
pub const GUILLOTINE_BLADE: &str = "guillotineBlade";

/// Static base with the blade raised above it.
pub fn create_guillotine(tools: &ToolSettings) -> Assembly {
    let base_position = tools.guillotine_position;
    let blade_position = base_position + Vector3::y() * tools.guillotine_blade_height;
    let base_half = tools.guillotine_base_half_extents;
    let blade_half = tools.guillotine_blade_half_extents;

    let mut node = VisualNode::new(GUILLOTINE);
    let base = node.add_child(VisualNode::ROOT, GUILLOTINE, NodeShape::Cuboid { half_extents: base_half });
    node.set_local_position(base, base_position);
    let blade = node.add_child(VisualNode::ROOT, GUILLOTINE_BLADE, NodeShape::Cuboid { half_extents: blade_half });
    node.set_local_position(blade, blade_position);
    node.set_color(blade, Rgb565::CSS_SILVER);

    Assembly::new(node)
        .with_body(
            GUILLOTINE,
            RigidBody::new_static()
                .with_position(base_position)
                .with_collider(Collider::Cuboid { half_extents: base_half }),
        )
        .with_body(
            GUILLOTINE_BLADE,
            RigidBody::new_static()
                .with_position(blade_position)
                .with_collider(Collider::Cuboid { half_extents: blade_half }),
        )
}

/// Lower the blade by `percentage` (clamped to `[0, 1]`) of the drop height,
/// measured from its spawn snapshot.
pub fn move_guillotine_blade(world: &mut World, guillotine: &PhysicalEntity, percentage: f32, tools: &ToolSettings) {
    let (Some(handle), Some(snapshot)) = (guillotine.body(GUILLOTINE_BLADE), guillotine.snapshot(GUILLOTINE_BLADE))
    else {
        return;
    };
    if let Some(blade) = world.body_mut(handle) {
        let drop = tools.guillotine_drop_height * percentage.clamp(0.0, 1.0);
        blade.position = snapshot.position - Vector3::y() * drop;
    }
}

/// Reset the dummy and lay it across the base with its neck under the blade.
pub fn seat_dummy(world: &mut World, dummy: &PhysicalEntity, guillotine: &PhysicalEntity) {
    let Some(base) = guillotine.body_position(world, GUILLOTINE) else { return };
    dummy.reset_bodies_to_initial_positions(world);
    dummy.move_body(world, &[], Vector3::new(base.x, base.y + 0.5, base.z - 0.49));
    dummy.apply_impulse(world, &["head"], Vector3::new(-0.05, 0.0, 1.0));
    dummy.apply_impulse(world, &["lowerLeftLeg", "lowerRightLeg"], Vector3::new(0.0, 0.0, -0.5));
}
