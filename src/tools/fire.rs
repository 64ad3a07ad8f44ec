use embedded_graphics_core::pixelcolor::{Rgb565, WebColors};
use nalgebra::Vector3;

use crate::entity::{Assembly, PhysicalEntity};
use crate::physics::{RigidBody, World};
use crate::scene::{NodeShape, VisualNode};
use crate::settings::ToolSettings;

pub const FIRE: &str = "fire";

/// A collider-less marker under the dummy's upper body.
pub fn create_fire(world: &World, dummy: &PhysicalEntity, tools: &ToolSettings) -> Option<Assembly> {
    let torso = dummy.body_position(world, "upperBody")?;
    let position = Vector3::new(torso.x, tools.fire_height, torso.z);

    let mut node = VisualNode::new("fireGroup");
    let id = node.add_child(VisualNode::ROOT, FIRE, NodeShape::Prop(FIRE.to_owned()));
    node.set_local_position(id, position);
    node.set_local_scale(id, Vector3::new(1.5, 3.0, 1.5));
    node.set_color(id, Rgb565::CSS_ORANGE_RED);

    Some(Assembly::new(node).with_body(FIRE, RigidBody::new_static().with_position(position)))
}
