use nalgebra::{UnitQuaternion, Vector3};

use crate::scene::VisualNode;

/// A rest-pose humanoid rig in T-pose, about 1.8 units tall, feet at y = 0,
/// facing +Z. Left limbs extend along +X.
///
/// Bone names follow the common `Hips` / `LeftUpLeg` / `LeftForeArm`
/// convention so descriptor tables written for imported rigs apply as-is.
pub fn humanoid_skeleton() -> VisualNode {
    let rest = UnitQuaternion::identity;
    let mut rig = VisualNode::new("humanoid");

    let hips = rig.add_bone(VisualNode::ROOT, "Hips", Vector3::new(0.0, 1.0, 0.0), rest());
    let spine = rig.add_bone(hips, "Spine", Vector3::new(0.0, 0.1, 0.0), rest());
    let spine1 = rig.add_bone(spine, "Spine1", Vector3::new(0.0, 0.12, 0.0), rest());
    let spine2 = rig.add_bone(spine1, "Spine2", Vector3::new(0.0, 0.12, 0.0), rest());
    let neck = rig.add_bone(spine2, "Neck", Vector3::new(0.0, 0.16, 0.0), rest());
    let head = rig.add_bone(neck, "Head", Vector3::new(0.0, 0.1, 0.0), rest());
    rig.add_bone(head, "HeadTop_End", Vector3::new(0.0, 0.2, 0.0), rest());

    for (side, sign) in [("Left", 1.0), ("Right", -1.0)] {
        let shoulder = rig.add_bone(
            spine2,
            format!("{side}Shoulder"),
            Vector3::new(0.06 * sign, 0.12, 0.0),
            rest(),
        );
        let arm = rig.add_bone(shoulder, format!("{side}Arm"), Vector3::new(0.12 * sign, 0.0, 0.0), rest());
        let fore_arm = rig.add_bone(arm, format!("{side}ForeArm"), Vector3::new(0.26 * sign, 0.0, 0.0), rest());
        rig.add_bone(fore_arm, format!("{side}Hand"), Vector3::new(0.25 * sign, 0.0, 0.0), rest());

        let up_leg = rig.add_bone(hips, format!("{side}UpLeg"), Vector3::new(0.09 * sign, -0.06, 0.0), rest());
        let leg = rig.add_bone(up_leg, format!("{side}Leg"), Vector3::new(0.0, -0.42, 0.0), rest());
        let foot = rig.add_bone(leg, format!("{side}Foot"), Vector3::new(0.0, -0.4, 0.0), rest());
        rig.add_bone(foot, format!("{side}ToeBase"), Vector3::new(0.0, -0.06, 0.12), rest());
    }
    rig
}
