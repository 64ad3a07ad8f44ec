//! Rigid-body physics: bodies, colliders, joints and the world that steps them.
//!
//! Provides linear and angular motion under gravity, sphere/cuboid collision
//! with impulse response and Coulomb friction, and three joint kinds solved
//! in a position-based pass:
//! - [`JointKind::Lock`]: zero relative motion
//! - [`JointKind::Hinge`]: one rotational degree of freedom
//! - [`JointKind::ConeTwist`]: bounded swing and twist
//!
//! Bodies and joints are addressed by generational handles
//! ([`BodyHandle`], [`ConstraintHandle`]).

mod arena;
mod body;
mod collision;
mod constraint;
mod world;

pub use body::{groups, BodyHandle, BodyType, RigidBody};
pub use collision::{Collider, Contact};
pub(crate) use constraint::any_perpendicular;
pub use constraint::{ConeTwistParams, Constraint, ConstraintHandle, JointKind};
pub use world::{World, MAX_CONTACTS};
