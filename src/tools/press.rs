use embedded_graphics_core::pixelcolor::{Rgb565, WebColors};
use nalgebra::Vector3;

use super::PressOrientation;
use crate::entity::{Assembly, PhysicalEntity};
use crate::physics::{Collider, RigidBody, World};
use crate::scene::{NodeShape, VisualNode};
use crate::settings::ToolSettings;

pub const FIRST_PRESS: &str = "firstPress";
pub const SECOND_PRESS: &str = "secondPress";

/// Two static jaws `gap` apart, centered on `target` along the press axis.
pub fn create_press(
    target: Vector3<f32>,
    gap: f32,
    orientation: PressOrientation,
    dark_mode: bool,
    tools: &ToolSettings,
) -> Assembly {
    let half_extents = tools.press_half_extents(orientation);
    let offset = orientation.axis() * (gap / 2.0);
    let color = if dark_mode { Rgb565::CSS_WHITE } else { Rgb565::CSS_BLACK };

    let mut node = VisualNode::new("press");
    let mut assembly_bodies = Vec::with_capacity(2);
    for (name, position) in [(FIRST_PRESS, target - offset), (SECOND_PRESS, target + offset)] {
        let id = node.add_child(VisualNode::ROOT, name, NodeShape::Cuboid { half_extents });
        node.set_color(id, color);
        node.set_local_position(id, position);
        assembly_bodies.push((
            name,
            RigidBody::new_static()
                .with_position(position)
                .with_collider(Collider::Cuboid { half_extents }),
        ));
    }

    let mut assembly = Assembly::new(node);
    for (name, body) in assembly_bodies {
        assembly.push_body(name, body);
    }
    assembly
}

/// Close the jaws to `value` of the gap (clamped to `[0, 1]`).
///
/// Each jaw moves from its own spawn snapshot, so the result depends only on
/// `value` and never on earlier calls.
pub fn move_press(
    world: &mut World,
    press: &PhysicalEntity,
    gap: f32,
    value: f32,
    orientation: PressOrientation,
) {
    let shift = orientation.axis() * (value.clamp(0.0, 1.0) * gap / 2.0);
    for (name, delta) in [(FIRST_PRESS, shift), (SECOND_PRESS, -shift)] {
        let (Some(handle), Some(snapshot)) = (press.body(name), press.snapshot(name)) else {
            continue;
        };
        if let Some(body) = world.body_mut(handle) {
            body.position = snapshot.position + delta;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::entity::EntityId;

    const EPSILON: f32 = 1e-5;

    #[test]
    fn test_jaws_straddle_target() {
        let tools = ToolSettings::default();
        let assembly = create_press(Vector3::new(0.0, 1.0, 0.0), 2.5, PressOrientation::Vertical, false, &tools);
        assert_eq!(assembly.part(FIRST_PRESS).unwrap().position, Vector3::new(0.0, -0.25, 0.0));
        assert_eq!(assembly.part(SECOND_PRESS).unwrap().position, Vector3::new(0.0, 2.25, 0.0));
    }

    #[test]
    fn test_move_press_is_snapshot_relative() {
        let tools = ToolSettings::default();
        let mut world = World::new();
        let assembly = create_press(Vector3::zeros(), 2.0, PressOrientation::Horizontal, true, &tools);
        let press = PhysicalEntity::spawn(EntityId(7), assembly, &mut world);
        let first = press.body(FIRST_PRESS).unwrap();
        let second = press.body(SECOND_PRESS).unwrap();

        move_press(&mut world, &press, 2.0, 0.5, PressOrientation::Horizontal);
        move_press(&mut world, &press, 2.0, 0.5, PressOrientation::Horizontal);
        assert!((world.body(first).unwrap().position.x - (-1.0 + 0.5)).abs() < EPSILON);
        assert!((world.body(second).unwrap().position.x - (1.0 - 0.5)).abs() < EPSILON);

        move_press(&mut world, &press, 2.0, 0.0, PressOrientation::Horizontal);
        assert_eq!(world.body(first).unwrap().position, press.snapshot(FIRST_PRESS).unwrap().position);
        assert_eq!(world.body(second).unwrap().position, press.snapshot(SECOND_PRESS).unwrap().position);
    }
}
