//! Factories for every spawnable tool and the one-shot physical effects.
//!
//! Factories build an [`Assembly`](crate::entity::Assembly) and return `None`
//! when a prerequisite is missing (no dummy part in reach, no target body).
//! The simulation controller spawns the assembly and owns the result.

mod effects;
mod fire;
mod freeze;
mod guillotine;
mod melee;
mod pin;
mod press;
mod projectile;
mod rack;
mod timed;

pub use effects::{apply_explosion_impulse, drag, explosion_impulse, projectile_tip, punch};
pub use fire::{create_fire, FIRE};
pub use freeze::{freeze_dummy, unfreeze_dummy, FreezeSet, FROZEN_PARTS};
pub use guillotine::{create_guillotine, move_guillotine_blade, seat_dummy, GUILLOTINE, GUILLOTINE_BLADE};
pub use melee::{create_melee_weapon, move_pivot, swing, MELEE_PIVOT};
pub use pin::{create_pin, PIN};
pub use press::{create_press, move_press, FIRST_PRESS, SECOND_PRESS};
pub use projectile::{create_projectile, Throw};
pub use rack::{anchor_pose, create_draw_and_quarter, move_draw_and_quarter, RackAnchor, ANCHORS};
pub use timed::{EffectAction, Phase, TimedEffect};

use nalgebra::{UnitQuaternion, Vector3};
use serde::{Deserialize, Serialize};

use crate::physics::any_perpendicular;

/// How a projectile resolves when it reaches something.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ProjectileClass {
    /// Sticks into the dummy body its tip touches.
    Impale,
    /// Blows up next to any body.
    Explosive,
    /// Plain rigid body.
    Inert,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum ProjectileKind {
    Arrow,
    Banana,
    Bullet,
    Chair,
    Cybertruck,
    Dagger,
    Grenade,
    Mars,
    Missile,
    Poop,
    Spear,
    Sword,
    Syringe,
    VenusStatue,
}

impl ProjectileKind {
    pub const ALL: [ProjectileKind; 14] = [
        ProjectileKind::Arrow,
        ProjectileKind::Banana,
        ProjectileKind::Bullet,
        ProjectileKind::Chair,
        ProjectileKind::Cybertruck,
        ProjectileKind::Dagger,
        ProjectileKind::Grenade,
        ProjectileKind::Mars,
        ProjectileKind::Missile,
        ProjectileKind::Poop,
        ProjectileKind::Spear,
        ProjectileKind::Sword,
        ProjectileKind::Syringe,
        ProjectileKind::VenusStatue,
    ];

    /// Prop and body name.
    pub fn name(self) -> &'static str {
        match self {
            ProjectileKind::Arrow => "arrow",
            ProjectileKind::Banana => "banana",
            ProjectileKind::Bullet => "bullet",
            ProjectileKind::Chair => "chair",
            ProjectileKind::Cybertruck => "cybertruck",
            ProjectileKind::Dagger => "dagger",
            ProjectileKind::Grenade => "grenade",
            ProjectileKind::Mars => "mars",
            ProjectileKind::Missile => "missile",
            ProjectileKind::Poop => "poop",
            ProjectileKind::Spear => "spear",
            ProjectileKind::Sword => "sword",
            ProjectileKind::Syringe => "syringe",
            ProjectileKind::VenusStatue => "venusStatue",
        }
    }

    pub fn from_name(name: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|k| k.name() == name)
    }

    /// Axis of the prop mesh that points where it flies.
    pub fn local_forward(self) -> Vector3<f32> {
        match self {
            ProjectileKind::Bullet | ProjectileKind::Spear | ProjectileKind::Syringe => Vector3::y(),
            ProjectileKind::Mars | ProjectileKind::Sword => -Vector3::y(),
            ProjectileKind::Dagger => -Vector3::x(),
            ProjectileKind::VenusStatue => Vector3::x(),
            ProjectileKind::Cybertruck => Vector3::z(),
            ProjectileKind::Arrow
            | ProjectileKind::Banana
            | ProjectileKind::Chair
            | ProjectileKind::Grenade
            | ProjectileKind::Missile
            | ProjectileKind::Poop => -Vector3::z(),
        }
    }

    pub fn class(self) -> ProjectileClass {
        match self {
            ProjectileKind::Arrow
            | ProjectileKind::Dagger
            | ProjectileKind::Poop
            | ProjectileKind::Spear
            | ProjectileKind::Sword
            | ProjectileKind::Syringe => ProjectileClass::Impale,
            ProjectileKind::Grenade | ProjectileKind::Mars | ProjectileKind::Missile => {
                ProjectileClass::Explosive
            }
            ProjectileKind::Banana
            | ProjectileKind::Bullet
            | ProjectileKind::Chair
            | ProjectileKind::Cybertruck
            | ProjectileKind::VenusStatue => ProjectileClass::Inert,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum MeleeKind {
    BaseballBat,
    Sword,
}

impl MeleeKind {
    pub fn name(self) -> &'static str {
        match self {
            MeleeKind::BaseballBat => "baseballBat",
            MeleeKind::Sword => "sword",
        }
    }

    pub fn from_name(name: &str) -> Option<Self> {
        [MeleeKind::BaseballBat, MeleeKind::Sword]
            .into_iter()
            .find(|k| k.name() == name)
    }

    /// Weapons that double as projectiles share their forward axis; the rest
    /// point down -Z.
    pub fn local_forward(self) -> Vector3<f32> {
        ProjectileKind::from_name(self.name())
            .map(ProjectileKind::local_forward)
            .unwrap_or(-Vector3::z())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum PressOrientation {
    #[default]
    Vertical,
    Horizontal,
}

impl PressOrientation {
    /// Axis the jaws close along.
    pub fn axis(self) -> Vector3<f32> {
        match self {
            PressOrientation::Vertical => Vector3::y(),
            PressOrientation::Horizontal => Vector3::x(),
        }
    }

    pub fn other(self) -> Self {
        match self {
            PressOrientation::Vertical => PressOrientation::Horizontal,
            PressOrientation::Horizontal => PressOrientation::Vertical,
        }
    }
}

/// Shortest rotation taking unit vector `from` onto `to`, including the
/// antiparallel case.
pub(crate) fn rotation_from_to(from: &Vector3<f32>, to: &Vector3<f32>) -> UnitQuaternion<f32> {
    let (Some(from), Some(to)) = (from.try_normalize(1e-6), to.try_normalize(1e-6)) else {
        return UnitQuaternion::identity();
    };
    UnitQuaternion::rotation_between(&from, &to).unwrap_or_else(|| {
        let axis = nalgebra::Unit::new_normalize(any_perpendicular(&from));
        UnitQuaternion::from_axis_angle(&axis, std::f32::consts::PI)
    })
}
