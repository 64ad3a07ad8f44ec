//! A rigid-body ragdoll sandbox.
//!
//! An articulated dummy built from a procedural or skinned-skeleton
//! description, a set of spawnable physical tools (pins, projectiles, a
//! press, a rack, a guillotine, a melee weapon, fire, freeze) and a
//! fixed-step [`SimulationController`] that routes user input to them.
//!
//! Rendering, asset loading and audio live outside the crate behind the
//! [`SceneGraph`] and [`AssetProvider`] traits and the event queue.
//!
//! ```
//! use ragdoll_sandbox::{Interaction, ProceduralRagdoll, SimulationController, SimulationSettings};
//!
//! let mut sim = SimulationController::new(SimulationSettings::default());
//! sim.load_dummy(&ProceduralRagdoll::default()).unwrap();
//! sim.toggle(Interaction::Press);
//! sim.move_press(0.5);
//! sim.advance(1.0 / 30.0);
//! assert!(sim.press().is_some());
//! ```

pub mod assets;
pub mod camera;
pub mod entity;
pub mod error;
pub mod events;
pub mod interaction;
pub mod physics;
pub mod ragdoll;
pub mod scene;
pub mod settings;
pub mod simulation;
pub mod tools;

pub use assets::{AssetProvider, PropAsset, PropCatalog};
pub use camera::Camera;
pub use entity::{Assembly, EntityId, PhysicalEntity, Pose};
pub use error::{ConfigError, RagdollError, SandboxError};
pub use events::{AudioCue, RemovalReason, SimulationEvent};
pub use interaction::Interaction;
pub use physics::{BodyHandle, ConstraintHandle, RigidBody, World};
pub use ragdoll::{BendyRagdoll, ProceduralRagdoll, RagdollBuilder};
pub use scene::{RecordingScene, SceneGraph, VisualNode};
pub use settings::{SimulationSettings, ToolSettings};
pub use simulation::SimulationController;
pub use tools::{MeleeKind, PressOrientation, ProjectileKind};
