use std::f32::consts::{FRAC_PI_3, FRAC_PI_4, FRAC_PI_8};

use embedded_graphics_core::pixelcolor::{Rgb565, WebColors};
use nalgebra::Vector3;
use serde::{Deserialize, Serialize};

use super::*;
use crate::entity::{Assembly, BodyRef, JointSpec, Pivot, SyncMode};
use crate::scene::{NodeShape, VisualNode};

/// Segment sizes before scaling.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct Proportions {
    pub shoulders_distance: f32,
    pub upper_arm_length: f32,
    pub lower_arm_length: f32,
    pub arm_thickness: f32,
    pub neck_length: f32,
    pub head_radius: f32,
    pub upper_body_length: f32,
    pub pelvis_length: f32,
    pub upper_leg_length: f32,
    pub leg_thickness: f32,
    pub lower_leg_length: f32,
}

impl Default for Proportions {
    fn default() -> Self {
        Self {
            shoulders_distance: 0.5,
            upper_arm_length: 0.4,
            lower_arm_length: 0.4,
            arm_thickness: 0.2,
            neck_length: 0.1,
            head_radius: 0.25,
            upper_body_length: 0.6,
            pelvis_length: 0.4,
            upper_leg_length: 0.5,
            leg_thickness: 0.2,
            lower_leg_length: 0.5,
        }
    }
}

impl Proportions {
    fn scaled(&self, s: f32) -> Self {
        Self {
            shoulders_distance: self.shoulders_distance * s,
            upper_arm_length: self.upper_arm_length * s,
            lower_arm_length: self.lower_arm_length * s,
            arm_thickness: self.arm_thickness * s,
            neck_length: self.neck_length * s,
            head_radius: self.head_radius * s,
            upper_body_length: self.upper_body_length * s,
            pelvis_length: self.pelvis_length * s,
            upper_leg_length: self.upper_leg_length * s,
            leg_thickness: self.leg_thickness * s,
            lower_leg_length: self.lower_leg_length * s,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct Masses {
    pub head: f32,
    pub upper_body: f32,
    pub pelvis: f32,
    pub upper_left_arm: f32,
    pub upper_right_arm: f32,
    pub lower_left_arm: f32,
    pub lower_right_arm: f32,
    pub upper_left_leg: f32,
    pub upper_right_leg: f32,
    pub lower_left_leg: f32,
    pub lower_right_leg: f32,
}

impl Default for Masses {
    fn default() -> Self {
        Self {
            head: 1.0,
            upper_body: 1.0,
            pelvis: 1.0,
            upper_left_arm: 1.0,
            upper_right_arm: 1.0,
            lower_left_arm: 1.0,
            lower_right_arm: 1.0,
            upper_left_leg: 1.0,
            upper_right_leg: 1.0,
            lower_left_leg: 1.0,
            lower_right_leg: 1.0,
        }
    }
}

/// Swing cone half-angle and twist limit of one joint, in radians.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct JointLimits {
    pub angle: f32,
    pub twist_angle: f32,
}

impl JointLimits {
    pub const fn new(angle: f32, twist_angle: f32) -> Self {
        Self { angle, twist_angle }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct JointAngles {
    pub neck: JointLimits,
    pub left_knee: JointLimits,
    pub right_knee: JointLimits,
    pub left_hip: JointLimits,
    pub right_hip: JointLimits,
    pub spine: JointLimits,
    pub left_shoulder: JointLimits,
    pub right_shoulder: JointLimits,
    pub left_elbow: JointLimits,
    pub right_elbow: JointLimits,
}

impl Default for JointAngles {
    fn default() -> Self {
        let limb = JointLimits::new(FRAC_PI_4, FRAC_PI_8);
        let shoulder = JointLimits::new(FRAC_PI_3, FRAC_PI_8);
        Self {
            neck: limb,
            left_knee: limb,
            right_knee: limb,
            left_hip: limb,
            right_hip: limb,
            spine: limb,
            left_shoulder: shoulder,
            right_shoulder: shoulder,
            left_elbow: limb,
            right_elbow: limb,
        }
    }
}

/// Box-and-sphere dummy laid out from proportions, standing on y = 0 and
/// facing +Z, arms spread along ±X.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct ProceduralRagdoll {
    pub scale: f32,
    pub proportions: Proportions,
    pub masses: Masses,
    pub joint_angles: JointAngles,
}

impl Default for ProceduralRagdoll {
    fn default() -> Self {
        Self {
            scale: 0.65,
            proportions: Proportions::default(),
            masses: Masses::default(),
            joint_angles: JointAngles::default(),
        }
    }
}

impl RagdollBuilder for ProceduralRagdoll {
    fn build(&self) -> Result<Assembly, RagdollError> {
        let p = self.proportions.scaled(self.scale);
        let m = &self.masses;
        let a = &self.joint_angles;
        let half_sd = p.shoulders_distance / 2.0;

        let arm = |len: f32| Collider::Cuboid {
            half_extents: Vector3::new(len, p.arm_thickness, p.arm_thickness) / 2.0,
        };
        let leg = |len: f32| Collider::Cuboid {
            half_extents: Vector3::new(p.leg_thickness, len, p.arm_thickness) / 2.0,
        };
        let torso = |len: f32| Collider::Cuboid {
            half_extents: Vector3::new(p.shoulders_distance, len, p.arm_thickness) / 2.0,
        };

        // Bottom-up: each segment sits on the one below
        let lower_leg_y = p.lower_leg_length / 2.0;
        let upper_leg_y = lower_leg_y + (p.lower_leg_length + p.upper_leg_length) / 2.0;
        let pelvis_y = upper_leg_y + (p.upper_leg_length + p.pelvis_length) / 2.0;
        let upper_body_y = pelvis_y + (p.pelvis_length + p.upper_body_length) / 2.0;
        let head_y = upper_body_y + p.upper_body_length / 2.0 + p.head_radius + p.neck_length;
        let shoulder_y = upper_body_y + p.upper_body_length / 2.0;
        let upper_arm_x = half_sd + p.upper_arm_length / 2.0;
        let lower_arm_x = upper_arm_x + (p.lower_arm_length + p.upper_arm_length) / 2.0;

        let parts = [
            (LOWER_LEFT_LEG, m.lower_left_leg, leg(p.lower_leg_length), Vector3::new(half_sd, lower_leg_y, 0.0)),
            (LOWER_RIGHT_LEG, m.lower_right_leg, leg(p.lower_leg_length), Vector3::new(-half_sd, lower_leg_y, 0.0)),
            (UPPER_LEFT_LEG, m.upper_left_leg, leg(p.upper_leg_length), Vector3::new(half_sd, upper_leg_y, 0.0)),
            (UPPER_RIGHT_LEG, m.upper_right_leg, leg(p.upper_leg_length), Vector3::new(-half_sd, upper_leg_y, 0.0)),
            (PELVIS, m.pelvis, torso(p.pelvis_length), Vector3::new(0.0, pelvis_y, 0.0)),
            (UPPER_BODY, m.upper_body, torso(p.upper_body_length), Vector3::new(0.0, upper_body_y, 0.0)),
            (HEAD, m.head, Collider::Sphere { radius: p.head_radius }, Vector3::new(0.0, head_y, 0.0)),
            (UPPER_LEFT_ARM, m.upper_left_arm, arm(p.upper_arm_length), Vector3::new(upper_arm_x, shoulder_y, 0.0)),
            (UPPER_RIGHT_ARM, m.upper_right_arm, arm(p.upper_arm_length), Vector3::new(-upper_arm_x, shoulder_y, 0.0)),
            (LOWER_LEFT_ARM, m.lower_left_arm, arm(p.lower_arm_length), Vector3::new(lower_arm_x, shoulder_y, 0.0)),
            (LOWER_RIGHT_ARM, m.lower_right_arm, arm(p.lower_arm_length), Vector3::new(-lower_arm_x, shoulder_y, 0.0)),
        ];

        let mut node = VisualNode::new("dummy");
        let mut bodies = Vec::with_capacity(parts.len());
        for (name, mass, collider, position) in parts {
            let shape = match collider {
                Collider::Sphere { radius } => NodeShape::Sphere { radius },
                Collider::Cuboid { half_extents } => NodeShape::Cuboid { half_extents },
            };
            let id = node.add_child(VisualNode::ROOT, name, shape);
            node.set_local_position(id, position);
            bodies.push((name, dummy_part(name, mass, collider)?.with_position(position)));
        }
        node.set_color_all(Rgb565::CSS_BURLY_WOOD);

        let mut assembly = Assembly::new(node).with_sync(SyncMode::Simple);
        for (name, body) in bodies {
            assembly.push_body(name, body);
        }

        let (x, y, z) = (Vector3::x(), Vector3::y(), Vector3::z());
        let joints = [
            (
                "neckJoint",
                HEAD,
                UPPER_BODY,
                Vector3::new(0.0, -p.head_radius - p.neck_length / 2.0, 0.0),
                Vector3::new(0.0, p.upper_body_length / 2.0, 0.0),
                y,
                a.neck,
            ),
            (
                "leftKneeJoint",
                LOWER_LEFT_LEG,
                UPPER_LEFT_LEG,
                Vector3::new(0.0, p.lower_leg_length / 2.0, 0.0),
                Vector3::new(0.0, -p.upper_leg_length / 2.0, 0.0),
                x,
                a.left_knee,
            ),
            (
                "rightKneeJoint",
                LOWER_RIGHT_LEG,
                UPPER_RIGHT_LEG,
                Vector3::new(0.0, p.lower_leg_length / 2.0, 0.0),
                Vector3::new(0.0, -p.upper_leg_length / 2.0, 0.0),
                x,
                a.right_knee,
            ),
            (
                "leftHipJoint",
                UPPER_LEFT_LEG,
                PELVIS,
                Vector3::new(0.0, p.upper_leg_length / 2.0, 0.0),
                Vector3::new(half_sd, -p.pelvis_length / 2.0, 0.0),
                x,
                a.left_hip,
            ),
            (
                "rightHipJoint",
                UPPER_RIGHT_LEG,
                PELVIS,
                Vector3::new(0.0, p.upper_leg_length / 2.0, 0.0),
                Vector3::new(-half_sd, -p.pelvis_length / 2.0, 0.0),
                x,
                a.right_hip,
            ),
            (
                "spineJoint",
                PELVIS,
                UPPER_BODY,
                Vector3::new(0.0, p.pelvis_length / 2.0, 0.0),
                Vector3::new(0.0, -p.upper_body_length / 2.0, 0.0),
                x,
                a.spine,
            ),
            (
                "leftShoulder",
                UPPER_BODY,
                UPPER_LEFT_ARM,
                Vector3::new(half_sd, p.upper_body_length / 2.0, 0.0),
                Vector3::new(-p.upper_arm_length / 2.0, 0.0, 0.0),
                z,
                a.left_shoulder,
            ),
            (
                "rightShoulder",
                UPPER_BODY,
                UPPER_RIGHT_ARM,
                Vector3::new(-half_sd, p.upper_body_length / 2.0, 0.0),
                Vector3::new(p.upper_arm_length / 2.0, 0.0, 0.0),
                z,
                a.right_shoulder,
            ),
            (
                "leftElbowJoint",
                LOWER_LEFT_ARM,
                UPPER_LEFT_ARM,
                Vector3::new(-p.lower_arm_length / 2.0, 0.0, 0.0),
                Vector3::new(p.upper_arm_length / 2.0, 0.0, 0.0),
                z,
                a.left_elbow,
            ),
            (
                "rightElbowJoint",
                LOWER_RIGHT_ARM,
                UPPER_RIGHT_ARM,
                Vector3::new(p.lower_arm_length / 2.0, 0.0, 0.0),
                Vector3::new(-p.upper_arm_length / 2.0, 0.0, 0.0),
                z,
                a.right_elbow,
            ),
        ];
        for (name, body_a, body_b, pivot_a, pivot_b, axis, limits) in joints {
            assembly.push_joint(
                name,
                JointSpec::ConeTwist {
                    a: BodyRef::part(body_a),
                    b: BodyRef::part(body_b),
                    pivot: Pivot::Local(pivot_a, pivot_b),
                    axis_a: axis,
                    axis_b: axis,
                    swing: limits.angle,
                    twist: limits.twist_angle,
                },
            );
        }
        Ok(assembly)
    }
}
