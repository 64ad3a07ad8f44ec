//! Notifications queued during a tick for the app layer (audio, payouts).

use nalgebra::Vector3;

use crate::entity::EntityId;
use crate::interaction::Interaction;
use crate::tools::ProjectileKind;

/// Sounds the app layer is expected to play.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AudioCue {
    Punch,
    Hurt,
    Explosion,
    Gunshot,
    FusRoDah,
    GoldenWind,
}

/// Why a projectile left the world.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RemovalReason {
    /// Evicted to keep the population under the object limit.
    Culled,
    OutOfBounds,
    Exploded,
    /// Cleared by a scene reload.
    Cleared,
}

#[derive(Debug, Clone, PartialEq)]
pub enum SimulationEvent {
    ContextChanged {
        from: Interaction,
        to: Interaction,
    },
    ProjectileThrown {
        entity: EntityId,
        kind: ProjectileKind,
    },
    ProjectileImpaled {
        entity: EntityId,
        kind: ProjectileKind,
        part: String,
    },
    ProjectileExploded {
        entity: EntityId,
        kind: ProjectileKind,
        center: Vector3<f32>,
        force: f32,
    },
    ProjectileRemoved {
        entity: EntityId,
        reason: RemovalReason,
    },
    DummyReset {
        out_of_bounds: bool,
    },
    Punched {
        part: String,
    },
    /// An impulse from fus-ro-dah or golden wind landed.
    WindGust {
        parts: usize,
    },
    /// The rack was stretched past its resting distance.
    Stretched,
    /// The dummy's pelvis is close to the fire.
    Burning,
    Cue(AudioCue),
}
