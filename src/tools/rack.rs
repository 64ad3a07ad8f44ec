//! Draw-and-quarter rack: four static anchors around the upper body, each
//! locked to one limb end.

use embedded_graphics_core::pixelcolor::{Rgb565, WebColors};
use nalgebra::{Unit, UnitQuaternion, Vector3};

use super::rotation_from_to;
use crate::entity::{Assembly, BodyRef, JointSpec, PhysicalEntity, Pose};
use crate::physics::{RigidBody, World};
use crate::scene::{NodeShape, VisualNode};
use crate::settings::ToolSettings;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RackAnchor {
    LeftHand,
    RightHand,
    RightFoot,
    LeftFoot,
}

pub const ANCHORS: [RackAnchor; 4] = [
    RackAnchor::LeftHand,
    RackAnchor::RightHand,
    RackAnchor::RightFoot,
    RackAnchor::LeftFoot,
];

impl RackAnchor {
    pub fn name(self) -> &'static str {
        match self {
            RackAnchor::LeftHand => "leftHandAnchor",
            RackAnchor::RightHand => "rightHandAnchor",
            RackAnchor::RightFoot => "rightFootAnchor",
            RackAnchor::LeftFoot => "leftFootAnchor",
        }
    }

    /// Dummy part this anchor holds.
    pub fn limb(self) -> &'static str {
        match self {
            RackAnchor::LeftHand => "lowerLeftArm",
            RackAnchor::RightHand => "lowerRightArm",
            RackAnchor::RightFoot => "lowerRightLeg",
            RackAnchor::LeftFoot => "lowerLeftLeg",
        }
    }

    /// Bearing in degrees, mirrored across the pivot's axes.
    pub fn bearing(self, angle: f32) -> f32 {
        match self {
            RackAnchor::LeftHand => angle,
            RackAnchor::RightHand => 180.0 - angle,
            RackAnchor::RightFoot => 180.0 + angle,
            RackAnchor::LeftFoot => 360.0 - angle,
        }
    }
}

/// Anchor pose at `bearing` degrees and `stretch` distance from the pivot.
///
/// The bearing is measured from the pivot's local X, about its local Z.
pub fn anchor_pose(pivot: &Pose, bearing: f32, stretch: f32) -> Pose {
    let up = pivot.orientation * Vector3::z();
    let side = pivot.orientation * Vector3::x();
    let turn = UnitQuaternion::from_axis_angle(&Unit::new_normalize(up), bearing.to_radians());
    let direction = (turn * side).normalize();
    Pose::new(pivot.position + direction * stretch, rotation_from_to(&up, &direction))
}

fn anchor_poses(pivot: &Pose, angle: f32, stretch: f32) -> heapless::Vec<(RackAnchor, Pose), 4> {
    ANCHORS
        .into_iter()
        .map(|anchor| (anchor, anchor_pose(pivot, anchor.bearing(angle), stretch)))
        .collect()
}

/// Build the rack around `pivot` (the upper-body pose at spawn time).
///
/// Each limb is teleported onto its anchor before being locked there, so the
/// lock holds the limb in the anchor's pose. Limbs the dummy lacks get an
/// anchor but no lock.
pub fn create_draw_and_quarter(
    world: &mut World,
    dummy: &PhysicalEntity,
    pivot: &Pose,
    angle: f32,
    percentage: f32,
    tools: &ToolSettings,
) -> Assembly {
    let stretch = tools.rack_stretch(percentage);
    let mut node = VisualNode::new("drawAndQuarter");
    let mut assembly_parts = Vec::with_capacity(ANCHORS.len());

    for (anchor, pose) in anchor_poses(pivot, angle, stretch) {
        let id = node.add_child(VisualNode::ROOT, anchor.name(), NodeShape::Sphere { radius: 0.1 });
        node.set_color(id, Rgb565::CSS_RED);
        node.set_local_position(id, pose.position);

        let limb = dummy.body(anchor.limb());
        if let Some(body) = limb.and_then(|h| world.body_mut(h)) {
            body.set_pose(pose.position, pose.orientation);
        }
        assembly_parts.push((
            anchor,
            RigidBody::new_static().with_position(pose.position).with_orientation(pose.orientation),
            limb,
        ));
    }

    let mut assembly = Assembly::new(node);
    for (anchor, body, limb) in assembly_parts {
        assembly.push_body(anchor.name(), body);
        if let Some(limb) = limb {
            assembly.push_joint(
                anchor.name(),
                JointSpec::lock(BodyRef::External(limb), BodyRef::part(anchor.name())),
            );
        }
    }
    assembly
}

/// Move the anchors to the positions `angle` and `percentage` describe,
/// measured from the spawn-time pivot.
pub fn move_draw_and_quarter(
    world: &mut World,
    rack: &PhysicalEntity,
    pivot: &Pose,
    angle: f32,
    percentage: f32,
    tools: &ToolSettings,
) {
    let stretch = tools.rack_stretch(percentage);
    for (anchor, pose) in anchor_poses(pivot, angle, stretch) {
        if let Some(body) = rack.body(anchor.name()).and_then(|h| world.body_mut(h)) {
            body.position = pose.position;
        }
    }
}
