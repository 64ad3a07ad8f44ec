use embedded_graphics_core::pixelcolor::{Rgb565, WebColors};
use nalgebra::Vector3;

use crate::entity::{Assembly, BodyRef, JointSpec, PhysicalEntity};
use crate::physics::{Collider, RigidBody, World};
use crate::scene::{NodeShape, VisualNode};
use crate::settings::ToolSettings;

pub const PIN: &str = "pin";

/// A static sphere at `point`, locked to the dummy body nearest to it.
///
/// Returns `None` when no dummy body is within the pin threshold.
pub fn create_pin(
    world: &World,
    dummy: &PhysicalEntity,
    point: Vector3<f32>,
    tools: &ToolSettings,
) -> Option<Assembly> {
    let (_, target) = dummy.closest_body_to(world, &point, tools.pin_threshold)?;

    let mut node = VisualNode::new("pinGroup");
    let id = node.add_child(VisualNode::ROOT, PIN, NodeShape::Sphere { radius: tools.pin_radius * 2.0 });
    node.set_color(id, Rgb565::CSS_RED);
    node.set_local_position(id, point);

    let body = RigidBody::new_static()
        .with_position(point)
        .with_collider(Collider::Sphere { radius: tools.pin_radius });

    Some(
        Assembly::new(node)
            .with_body(PIN, body)
            .with_joint(PIN, JointSpec::lock(BodyRef::External(target), BodyRef::part(PIN))),
    )
}
