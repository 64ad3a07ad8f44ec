//! Construction of the dummy: a named body-and-joint graph in the fixed
//! humanoid role set.
//!
//! Two builders share the [`RagdollBuilder`] seam. [`ProceduralRagdoll`]
//! lays boxes out from proportions alone; [`BendyRagdoll`] fits bodies to a
//! posed skeleton and drives its bones. Both only produce an
//! [`Assembly`]; nothing touches the world until it is spawned.

mod bendy;
mod procedural;
mod skeleton;

pub use bendy::{
    humanoid_descriptors, humanoid_joints, BendyRagdoll, JointDescriptor, JointShape, PartDescriptor, PartSource,
    PivotSource,
};
pub use procedural::{JointAngles, JointLimits, Masses, Proportions, ProceduralRagdoll};
pub use skeleton::humanoid_skeleton;

use crate::entity::Assembly;
use crate::error::RagdollError;
use crate::physics::{groups, Collider, RigidBody};

pub const UPPER_BODY: &str = "upperBody";
pub const PELVIS: &str = "pelvis";
pub const HEAD: &str = "head";
pub const UPPER_LEFT_ARM: &str = "upperLeftArm";
pub const UPPER_RIGHT_ARM: &str = "upperRightArm";
pub const LOWER_LEFT_ARM: &str = "lowerLeftArm";
pub const LOWER_RIGHT_ARM: &str = "lowerRightArm";
pub const UPPER_LEFT_LEG: &str = "upperLeftLeg";
pub const UPPER_RIGHT_LEG: &str = "upperRightLeg";
pub const LOWER_LEFT_LEG: &str = "lowerLeftLeg";
pub const LOWER_RIGHT_LEG: &str = "lowerRightLeg";

pub const SHOULDER_LEFT: &str = "shoulderLeft";
pub const SHOULDER_RIGHT: &str = "shoulderRight";
pub const ELBOW_LEFT: &str = "elbowLeft";
pub const ELBOW_RIGHT: &str = "elbowRight";
pub const FEMUR_LEFT: &str = "femurLeft";
pub const FEMUR_RIGHT: &str = "femurRight";
pub const KNEE_LEFT: &str = "kneeLeft";
pub const KNEE_RIGHT: &str = "kneeRight";

/// Roles every dummy has.
pub const CORE_ROLES: [&str; 11] = [
    UPPER_BODY,
    PELVIS,
    HEAD,
    UPPER_LEFT_ARM,
    UPPER_RIGHT_ARM,
    LOWER_LEFT_ARM,
    LOWER_RIGHT_ARM,
    UPPER_LEFT_LEG,
    UPPER_RIGHT_LEG,
    LOWER_LEFT_LEG,
    LOWER_RIGHT_LEG,
];

/// Extra joint bodies of the skeleton-driven dummy.
pub const JOINT_ROLES: [&str; 8] = [
    SHOULDER_LEFT,
    SHOULDER_RIGHT,
    ELBOW_LEFT,
    ELBOW_RIGHT,
    FEMUR_LEFT,
    FEMUR_RIGHT,
    KNEE_LEFT,
    KNEE_RIGHT,
];

/// Anything that can produce the dummy's assembly.
pub trait RagdollBuilder {
    fn build(&self) -> Result<Assembly, RagdollError>;
}

/// A dummy part: dynamic, in the `DUMMY` group, never colliding with other
/// dummy parts.
pub(crate) fn dummy_part(name: &str, mass: f32, collider: Collider) -> Result<RigidBody, RagdollError> {
    if !(mass > 0.0 && mass.is_finite()) {
        return Err(RagdollError::InvalidMass(name.to_owned()));
    }
    Ok(RigidBody::new(mass)
        .with_collider(collider)
        .with_collision_filter(groups::DUMMY, groups::ALL & !groups::DUMMY)
        .with_angular_damping(0.1))
}
