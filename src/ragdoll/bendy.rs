//! Dummy fitted to a posed skeleton.
//!
//! Each part takes its pose from one bone, or from the midpoint of two bones.
//! Parts sourced from a single bone drive that bone when the entity syncs;
//! the in-between segments are collision volumes locked to them.

use std::f32::consts::{FRAC_PI_3, FRAC_PI_4, FRAC_PI_8};

use log::debug;
use nalgebra::{UnitQuaternion, Vector3};

use super::*;
use crate::entity::{Assembly, BodyRef, JointSpec, Pivot, SyncMode};
use crate::scene::VisualNode;

#[derive(Debug, Clone, PartialEq)]
pub enum PartSource {
    /// At the bone, with its world orientation.
    Bone(String),
    /// Halfway between two bones.
    Between { parent: String, child: String },
}

#[derive(Debug, Clone, PartialEq)]
pub struct PartDescriptor {
    pub name: String,
    pub source: PartSource,
    pub shape: Collider,
    pub mass: f32,
}

impl PartDescriptor {
    pub fn bone(name: &str, bone: &str, shape: Collider, mass: f32) -> Self {
        Self {
            name: name.to_owned(),
            source: PartSource::Bone(bone.to_owned()),
            shape,
            mass,
        }
    }

    pub fn between(name: &str, parent: &str, child: &str, shape: Collider, mass: f32) -> Self {
        Self {
            name: name.to_owned(),
            source: PartSource::Between {
                parent: parent.to_owned(),
                child: child.to_owned(),
            },
            shape,
            mass,
        }
    }

    fn bones(&self) -> impl Iterator<Item = &str> {
        let (first, second) = match &self.source {
            PartSource::Bone(bone) => (bone.as_str(), None),
            PartSource::Between { parent, child } => (parent.as_str(), Some(child.as_str())),
        };
        std::iter::once(first).chain(second)
    }
}

/// Where a joint's world pivot comes from.
#[derive(Debug, Clone, PartialEq)]
pub enum PivotSource {
    Bone(String),
    Point(Vector3<f32>),
}

#[derive(Debug, Clone, PartialEq)]
pub enum JointShape {
    Lock,
    /// Axis in each body's local frame.
    ConeTwist {
        pivot: PivotSource,
        axis: Vector3<f32>,
        swing: f32,
        twist: f32,
    },
    /// Rotates about world X.
    Hinge { pivot: PivotSource },
}

#[derive(Debug, Clone, PartialEq)]
pub struct JointDescriptor {
    pub name: String,
    pub a: String,
    pub b: String,
    pub shape: JointShape,
}

impl JointDescriptor {
    pub fn new(name: &str, a: &str, b: &str, shape: JointShape) -> Self {
        Self {
            name: name.to_owned(),
            a: a.to_owned(),
            b: b.to_owned(),
            shape,
        }
    }
}

/// Skeleton-driven dummy: the rig plus the descriptor tables fitted to it.
#[derive(Debug, Clone)]
pub struct BendyRagdoll {
    pub skeleton: VisualNode,
    pub descriptors: Vec<PartDescriptor>,
    pub joints: Vec<JointDescriptor>,
}

impl BendyRagdoll {
    pub fn new(skeleton: VisualNode, descriptors: Vec<PartDescriptor>, joints: Vec<JointDescriptor>) -> Self {
        Self {
            skeleton,
            descriptors,
            joints,
        }
    }

    /// The reference rig with descriptors fitted to it.
    pub fn humanoid() -> Self {
        Self::new(humanoid_skeleton(), humanoid_descriptors(), humanoid_joints())
    }

    fn descriptor(&self, name: &str) -> Option<&PartDescriptor> {
        self.descriptors.iter().find(|d| d.name == name)
    }

    /// Every bone the tables name exists, every core role has a part, and
    /// every joint names known parts.
    pub fn validate(&self) -> Result<(), RagdollError> {
        for part in &self.descriptors {
            if let Some(bone) = part.bones().find(|b| self.skeleton.find(b).is_none()) {
                return Err(RagdollError::MissingBone {
                    part: part.name.clone(),
                    bone: bone.to_owned(),
                });
            }
        }
        if let Some(role) = CORE_ROLES.iter().find(|r| self.descriptor(r).is_none()) {
            return Err(RagdollError::MissingDescriptor((*role).to_owned()));
        }
        for joint in &self.joints {
            if let Some(part) = [&joint.a, &joint.b].into_iter().find(|p| self.descriptor(p).is_none()) {
                return Err(RagdollError::UnknownJointPart {
                    joint: joint.name.clone(),
                    part: part.clone(),
                });
            }
            let pivot = match &joint.shape {
                JointShape::ConeTwist { pivot, .. } | JointShape::Hinge { pivot } => pivot,
                JointShape::Lock => continue,
            };
            if let PivotSource::Bone(bone) = pivot {
                if self.skeleton.find(bone).is_none() {
                    return Err(RagdollError::MissingBone {
                        part: joint.name.clone(),
                        bone: bone.clone(),
                    });
                }
            }
        }
        Ok(())
    }

    fn bone_pose(&self, bone: &str) -> Result<(Vector3<f32>, UnitQuaternion<f32>), RagdollError> {
        self.skeleton.world_pose(bone).ok_or_else(|| RagdollError::MissingBone {
            part: String::new(),
            bone: bone.to_owned(),
        })
    }

    fn part_pose(&self, part: &PartDescriptor) -> Result<(Vector3<f32>, UnitQuaternion<f32>), RagdollError> {
        match &part.source {
            PartSource::Bone(bone) => self.bone_pose(bone),
            PartSource::Between { parent, child } => {
                let (parent_pos, parent_rot) = self.bone_pose(parent)?;
                let (child_pos, child_rot) = self.bone_pose(child)?;
                let position = (parent_pos + child_pos) * 0.5;
                // Feet point forward, so the shin keeps the knee's orientation
                let orientation = if child.ends_with("Foot") {
                    parent_rot
                } else {
                    parent_rot.try_slerp(&child_rot, 0.5, 1e-6).unwrap_or(parent_rot)
                };
                Ok((position, orientation))
            }
        }
    }

    fn pivot_point(&self, pivot: &PivotSource) -> Result<Vector3<f32>, RagdollError> {
        match pivot {
            PivotSource::Bone(bone) => self.bone_pose(bone).map(|(p, _)| p),
            PivotSource::Point(p) => Ok(*p),
        }
    }
}

impl RagdollBuilder for BendyRagdoll {
    fn build(&self) -> Result<Assembly, RagdollError> {
        self.validate()?;

        let mut assembly = Assembly::new(self.skeleton.clone()).with_sync(SyncMode::Skeleton);
        for part in &self.descriptors {
            let (position, orientation) = self.part_pose(part)?;
            let body = dummy_part(&part.name, part.mass, part.shape)?
                .with_position(position)
                .with_orientation(orientation);
            assembly.push_body(part.name.clone(), body);
            match &part.source {
                PartSource::Bone(bone) => assembly.bind(&part.name, Some(bone)),
                PartSource::Between { .. } => assembly.bind(&part.name, None),
            }
        }

        for joint in &self.joints {
            let (a, b) = (BodyRef::part(&joint.a), BodyRef::part(&joint.b));
            let spec = match &joint.shape {
                JointShape::Lock => JointSpec::lock(a, b),
                JointShape::ConeTwist {
                    pivot,
                    axis,
                    swing,
                    twist,
                } => JointSpec::ConeTwist {
                    a,
                    b,
                    pivot: Pivot::World(self.pivot_point(pivot)?),
                    axis_a: *axis,
                    axis_b: *axis,
                    swing: *swing,
                    twist: *twist,
                },
                JointShape::Hinge { pivot } => {
                    let frame = |name: &str| {
                        assembly
                            .part(name)
                            .map(|body| body.orientation.inverse() * Vector3::x())
                            .unwrap_or_else(Vector3::x)
                    };
                    JointSpec::Hinge {
                        axis_a: frame(&joint.a),
                        axis_b: frame(&joint.b),
                        a,
                        b,
                        pivot: Pivot::World(self.pivot_point(pivot)?),
                    }
                }
            };
            assembly.push_joint(joint.name.clone(), spec);
        }
        debug!(
            "bendy ragdoll: {} parts, {} joints",
            assembly.body_count(),
            self.joints.len()
        );
        Ok(assembly)
    }
}

fn cuboid(x: f32, y: f32, z: f32) -> Collider {
    Collider::Cuboid {
        half_extents: Vector3::new(x, y, z),
    }
}

fn sphere(radius: f32) -> Collider {
    Collider::Sphere { radius }
}

/// Parts fitted to [`humanoid_skeleton`].
pub fn humanoid_descriptors() -> Vec<PartDescriptor> {
    vec![
        PartDescriptor::bone(HEAD, "Head", sphere(0.11), 1.0),
        PartDescriptor::bone(UPPER_BODY, "Spine1", cuboid(0.15, 0.16, 0.08), 2.0),
        PartDescriptor::bone(PELVIS, "Hips", cuboid(0.14, 0.08, 0.08), 1.5),
        PartDescriptor::bone(SHOULDER_LEFT, "LeftArm", sphere(0.05), 0.5),
        PartDescriptor::bone(SHOULDER_RIGHT, "RightArm", sphere(0.05), 0.5),
        PartDescriptor::bone(ELBOW_LEFT, "LeftForeArm", sphere(0.045), 0.5),
        PartDescriptor::bone(ELBOW_RIGHT, "RightForeArm", sphere(0.045), 0.5),
        PartDescriptor::bone(FEMUR_LEFT, "LeftUpLeg", sphere(0.07), 0.5),
        PartDescriptor::bone(FEMUR_RIGHT, "RightUpLeg", sphere(0.07), 0.5),
        PartDescriptor::bone(KNEE_LEFT, "LeftLeg", sphere(0.06), 0.5),
        PartDescriptor::bone(KNEE_RIGHT, "RightLeg", sphere(0.06), 0.5),
        PartDescriptor::between(UPPER_LEFT_ARM, "LeftArm", "LeftForeArm", cuboid(0.13, 0.04, 0.04), 1.0),
        PartDescriptor::between(UPPER_RIGHT_ARM, "RightArm", "RightForeArm", cuboid(0.13, 0.04, 0.04), 1.0),
        PartDescriptor::between(LOWER_LEFT_ARM, "LeftForeArm", "LeftHand", cuboid(0.125, 0.035, 0.035), 1.0),
        PartDescriptor::between(LOWER_RIGHT_ARM, "RightForeArm", "RightHand", cuboid(0.125, 0.035, 0.035), 1.0),
        PartDescriptor::between(UPPER_LEFT_LEG, "LeftUpLeg", "LeftLeg", cuboid(0.06, 0.21, 0.06), 1.0),
        PartDescriptor::between(UPPER_RIGHT_LEG, "RightUpLeg", "RightLeg", cuboid(0.06, 0.21, 0.06), 1.0),
        PartDescriptor::between(LOWER_LEFT_LEG, "LeftLeg", "LeftFoot", cuboid(0.05, 0.2, 0.05), 1.0),
        PartDescriptor::between(LOWER_RIGHT_LEG, "RightLeg", "RightFoot", cuboid(0.05, 0.2, 0.05), 1.0),
    ]
}

/// Joints between the [`humanoid_descriptors`] parts.
pub fn humanoid_joints() -> Vec<JointDescriptor> {
    let shoulder = |bone: &str| JointShape::ConeTwist {
        pivot: PivotSource::Bone(bone.to_owned()),
        axis: Vector3::z(),
        swing: FRAC_PI_3,
        twist: FRAC_PI_8,
    };
    let knee = |bone: &str| JointShape::ConeTwist {
        pivot: PivotSource::Bone(bone.to_owned()),
        axis: Vector3::z(),
        swing: FRAC_PI_4,
        twist: FRAC_PI_8,
    };
    let hip = |bone: &str| JointShape::Hinge {
        pivot: PivotSource::Bone(bone.to_owned()),
    };
    vec![
        JointDescriptor::new("neckJoint", HEAD, UPPER_BODY, JointShape::Lock),
        JointDescriptor::new("leftBicepConstraint", SHOULDER_LEFT, UPPER_LEFT_ARM, JointShape::Lock),
        JointDescriptor::new("rightBicepConstraint", SHOULDER_RIGHT, UPPER_RIGHT_ARM, JointShape::Lock),
        JointDescriptor::new("forearmLimbLeftConstraint", ELBOW_LEFT, LOWER_LEFT_ARM, JointShape::Lock),
        JointDescriptor::new("forearmLimbRightConstraint", ELBOW_RIGHT, LOWER_RIGHT_ARM, JointShape::Lock),
        JointDescriptor::new("leftThighConstraint", FEMUR_LEFT, UPPER_LEFT_LEG, JointShape::Lock),
        JointDescriptor::new("rightThighConstraint", FEMUR_RIGHT, UPPER_RIGHT_LEG, JointShape::Lock),
        JointDescriptor::new("shinLeftConstraint", KNEE_LEFT, LOWER_LEFT_LEG, JointShape::Lock),
        JointDescriptor::new("shinRightConstraint", KNEE_RIGHT, LOWER_RIGHT_LEG, JointShape::Lock),
        JointDescriptor::new("leftShoulderConstraint", UPPER_BODY, SHOULDER_LEFT, shoulder("LeftArm")),
        JointDescriptor::new("leftElbowConstraint", UPPER_LEFT_ARM, ELBOW_LEFT, JointShape::Lock),
        JointDescriptor::new("rightShoulderConstraint", UPPER_BODY, SHOULDER_RIGHT, shoulder("RightArm")),
        JointDescriptor::new("rightElbowConstraint", UPPER_RIGHT_ARM, ELBOW_RIGHT, JointShape::Lock),
        JointDescriptor::new("leftKneeConstraint", UPPER_LEFT_LEG, KNEE_LEFT, knee("LeftLeg")),
        JointDescriptor::new("rightKneeConstraint", UPPER_RIGHT_LEG, KNEE_RIGHT, knee("RightLeg")),
        JointDescriptor::new("leftFemurConstraint", PELVIS, FEMUR_LEFT, hip("LeftUpLeg")),
        JointDescriptor::new("rightFemurConstraint", PELVIS, FEMUR_RIGHT, hip("RightUpLeg")),
        JointDescriptor::new("pelvisConstraint", UPPER_BODY, PELVIS, JointShape::Lock),
    ]
}
