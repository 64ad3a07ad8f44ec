use crate::entity::PhysicalEntity;
use crate::physics::{ConstraintHandle, World};
use crate::ragdoll::{
    ELBOW_LEFT, ELBOW_RIGHT, FEMUR_LEFT, FEMUR_RIGHT, KNEE_LEFT, KNEE_RIGHT, LOWER_LEFT_ARM, LOWER_LEFT_LEG,
    LOWER_RIGHT_ARM, LOWER_RIGHT_LEG, PELVIS, SHOULDER_LEFT, SHOULDER_RIGHT, UPPER_BODY, UPPER_LEFT_ARM,
    UPPER_LEFT_LEG, UPPER_RIGHT_ARM, UPPER_RIGHT_LEG,
};

/// Parts locked to the upper body while the dummy is frozen, each with the
/// core role used when the dummy has no such joint body.
pub const FROZEN_PARTS: [(&str, &str); 9] = [
    (SHOULDER_LEFT, UPPER_LEFT_ARM),
    (SHOULDER_RIGHT, UPPER_RIGHT_ARM),
    (ELBOW_LEFT, LOWER_LEFT_ARM),
    (ELBOW_RIGHT, LOWER_RIGHT_ARM),
    (PELVIS, PELVIS),
    (FEMUR_LEFT, UPPER_LEFT_LEG),
    (FEMUR_RIGHT, UPPER_RIGHT_LEG),
    (KNEE_LEFT, LOWER_LEFT_LEG),
    (KNEE_RIGHT, LOWER_RIGHT_LEG),
];

pub type FreezeSet = heapless::Vec<ConstraintHandle, { FROZEN_PARTS.len() }>;

/// Lock every frozen part the dummy has to its upper body.
pub fn freeze_dummy(world: &mut World, dummy: &PhysicalEntity) -> FreezeSet {
    let mut set = FreezeSet::new();
    let Some(torso) = dummy.body(UPPER_BODY) else {
        return set;
    };
    for (part, fallback) in FROZEN_PARTS {
        let Some(limb) = dummy.body(part).or_else(|| dummy.body(fallback)) else {
            continue;
        };
        let Some(handle) = world.add_lock(torso, limb) else {
            continue;
        };
        if let Err(handle) = set.push(handle) {
            world.remove_constraint(handle);
        }
    }
    set
}

/// Remove exactly the constraints `freeze_dummy` added.
pub fn unfreeze_dummy(world: &mut World, set: &mut FreezeSet) {
    for handle in set.iter() {
        world.remove_constraint(*handle);
    }
    set.clear();
}
