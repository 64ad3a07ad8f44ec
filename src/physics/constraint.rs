//! Joints between pairs of bodies and their position-based solver.
//!
//! Every joint first pulls its two pivots together (the point part), then
//! applies a rotational correction that depends on the kind. Corrections are
//! XPBD style: positions and orientations move directly, and the matching
//! velocity change (`correction / dt`) is added so the next integration does
//! not undo them.

use nalgebra::{UnitQuaternion, Vector3};

use super::arena::Index;
use super::body::{BodyHandle, RigidBody};

/// Stable reference to a constraint registered in a [`World`](super::World).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ConstraintHandle(pub(crate) Index);

/// Relative-motion envelope of a joint.
#[derive(Debug, Clone, PartialEq)]
pub enum JointKind {
    /// Zero relative motion. Stores `q_a⁻¹ · q_b` at creation.
    Lock { relative_orientation: UnitQuaternion<f32> },
    /// One rotational degree of freedom: `axis_a` (in A's frame) and `axis_b`
    /// (in B's frame) are kept parallel.
    Hinge {
        axis_a: Vector3<f32>,
        axis_b: Vector3<f32>,
    },
    /// Bounded swing of `axis_b` around `axis_a`, plus bounded twist about it.
    ConeTwist {
        axis_a: Vector3<f32>,
        axis_b: Vector3<f32>,
        /// Perpendicular reference vectors that coincided at creation.
        twist_ref_a: Vector3<f32>,
        twist_ref_b: Vector3<f32>,
        /// Maximum swing angle in radians.
        swing_limit: f32,
        /// Maximum absolute twist angle in radians.
        twist_limit: f32,
    },
}

/// A joint between two bodies with a pivot in each body's local frame.
#[derive(Debug, Clone)]
pub struct Constraint {
    pub body_a: BodyHandle,
    pub body_b: BodyHandle,
    pub pivot_a: Vector3<f32>,
    pub pivot_b: Vector3<f32>,
    pub kind: JointKind,
    /// Inverse stiffness. 0.0 = perfectly rigid.
    pub compliance: f32,
}

/// Parameters for a cone-twist joint, pivots and axes in body-local frames.
#[derive(Debug, Clone, Copy)]
pub struct ConeTwistParams {
    pub pivot_a: Vector3<f32>,
    pub pivot_b: Vector3<f32>,
    pub axis_a: Vector3<f32>,
    pub axis_b: Vector3<f32>,
    pub swing_limit: f32,
    pub twist_limit: f32,
}

impl Constraint {
    /// Lock pivots at the midpoint between the two body centers.
    pub fn lock(a: BodyHandle, body_a: &RigidBody, b: BodyHandle, body_b: &RigidBody) -> Self {
        let midpoint = (body_a.position + body_b.position) * 0.5;
        Self {
            body_a: a,
            body_b: b,
            pivot_a: body_a.world_to_local(&midpoint),
            pivot_b: body_b.world_to_local(&midpoint),
            kind: JointKind::Lock {
                relative_orientation: body_a.orientation.inverse() * body_b.orientation,
            },
            compliance: 0.0,
        }
    }

    pub fn hinge(
        a: BodyHandle,
        pivot_a: Vector3<f32>,
        axis_a: Vector3<f32>,
        b: BodyHandle,
        pivot_b: Vector3<f32>,
        axis_b: Vector3<f32>,
    ) -> Self {
        Self {
            body_a: a,
            body_b: b,
            pivot_a,
            pivot_b,
            kind: JointKind::Hinge {
                axis_a: normalize_or(axis_a, Vector3::x()),
                axis_b: normalize_or(axis_b, Vector3::x()),
            },
            compliance: 0.0,
        }
    }

    /// Cone-twist joint. The twist reference is derived from the current poses.
    pub fn cone_twist(
        a: BodyHandle,
        body_a: &RigidBody,
        b: BodyHandle,
        body_b: &RigidBody,
        params: ConeTwistParams,
    ) -> Self {
        let axis_a = normalize_or(params.axis_a, Vector3::y());
        let axis_b = normalize_or(params.axis_b, Vector3::y());
        let world_axis = body_a.orientation * axis_a;
        let reference = any_perpendicular(&world_axis);
        Self {
            body_a: a,
            body_b: b,
            pivot_a: params.pivot_a,
            pivot_b: params.pivot_b,
            kind: JointKind::ConeTwist {
                axis_a,
                axis_b,
                twist_ref_a: body_a.orientation.inverse() * reference,
                twist_ref_b: body_b.orientation.inverse() * reference,
                swing_limit: params.swing_limit.max(0.0),
                twist_limit: params.twist_limit.max(0.0),
            },
            compliance: 0.0,
        }
    }

    pub fn with_compliance(mut self, compliance: f32) -> Self {
        self.compliance = compliance.max(0.0);
        self
    }

    pub fn involves(&self, body: BodyHandle) -> bool {
        self.body_a == body || self.body_b == body
    }

    /// Run one solver pass of this joint over its two bodies.
    pub(crate) fn solve(&self, a: &mut RigidBody, b: &mut RigidBody, dt: f32) {
        solve_point(a, &self.pivot_a, b, &self.pivot_b, self.compliance, dt);

        match &self.kind {
            JointKind::Lock { relative_orientation } => {
                // Rotation B carries beyond its locked pose, in world space
                let error_q = b.orientation * (a.orientation * relative_orientation).inverse();
                let error = rotation_vector(&error_q);
                apply_rotation_correction(a, b, error, self.compliance, dt);
            }
            JointKind::Hinge { axis_a, axis_b } => {
                let wa = a.orientation * axis_a;
                let wb = b.orientation * axis_b;
                apply_rotation_correction(a, b, wa.cross(&wb), self.compliance, dt);
            }
            JointKind::ConeTwist {
                axis_a,
                axis_b,
                twist_ref_a,
                twist_ref_b,
                swing_limit,
                twist_limit,
            } => {
                let wa = a.orientation * axis_a;
                let wb = b.orientation * axis_b;
                let swing = wa.dot(&wb).clamp(-1.0, 1.0).acos();
                if swing > *swing_limit {
                    let axis = normalize_or(wa.cross(&wb), any_perpendicular(&wa));
                    let error = axis * (swing - swing_limit);
                    apply_rotation_correction(a, b, error, self.compliance, dt);
                }

                let wa = a.orientation * axis_a;
                let ref_a = a.orientation * twist_ref_a;
                let ref_b = b.orientation * twist_ref_b;
                let ref_b = ref_b - wa * ref_b.dot(&wa);
                if ref_b.norm_squared() < 1e-8 {
                    return;
                }
                let twist = wa.dot(&ref_a.cross(&ref_b)).atan2(ref_a.dot(&ref_b));
                if twist.abs() > *twist_limit {
                    let excess = twist - twist_limit.copysign(twist);
                    apply_rotation_correction(a, b, wa * excess, self.compliance, dt);
                }
            }
        }
    }
}

fn normalize_or(v: Vector3<f32>, fallback: Vector3<f32>) -> Vector3<f32> {
    v.try_normalize(1e-8).unwrap_or(fallback)
}

/// A unit vector orthogonal to `v`.
pub(crate) fn any_perpendicular(v: &Vector3<f32>) -> Vector3<f32> {
    let helper = if v.x.abs() < 0.9 { Vector3::x() } else { Vector3::y() };
    normalize_or(v.cross(&helper), Vector3::z())
}

/// Rotation vector (axis × angle) of a quaternion, taking the short way round.
fn rotation_vector(q: &UnitQuaternion<f32>) -> Vector3<f32> {
    let inner = q.quaternion();
    let v = Vector3::new(inner.i, inner.j, inner.k);
    let v = if inner.w >= 0.0 { v } else { -v };
    let sin_half = v.norm();
    if sin_half < 1e-7 {
        return v * 2.0;
    }
    let angle = 2.0 * sin_half.atan2(inner.w.abs());
    v / sin_half * angle
}

/// Pull two body-local pivots together.
fn solve_point(
    a: &mut RigidBody,
    anchor_a: &Vector3<f32>,
    b: &mut RigidBody,
    anchor_b: &Vector3<f32>,
    compliance: f32,
    dt: f32,
) {
    let ra = a.orientation * anchor_a;
    let rb = b.orientation * anchor_b;
    let diff = (b.position + rb) - (a.position + ra);
    let dist = diff.norm();
    if dist < 1e-6 {
        return;
    }
    let n = diff / dist;

    let inv_inertia_a = a.inv_inertia_world();
    let inv_inertia_b = b.inv_inertia_world();
    let ra_cross_n = ra.cross(&n);
    let rb_cross_n = rb.cross(&n);
    let w_a = a.inv_mass + ra_cross_n.dot(&(inv_inertia_a * ra_cross_n));
    let w_b = b.inv_mass + rb_cross_n.dot(&(inv_inertia_b * rb_cross_n));
    let w_sum = w_a + w_b;
    if w_sum <= 0.0 {
        return;
    }

    let alpha = compliance / (dt * dt);
    let delta_lambda = -dist / (w_sum + alpha);
    let correction = n * delta_lambda;

    a.position -= correction * a.inv_mass;
    b.position += correction * b.inv_mass;
    a.velocity -= correction * a.inv_mass / dt;
    b.velocity += correction * b.inv_mass / dt;

    if a.is_dynamic() {
        let rot = inv_inertia_a * ra.cross(&correction);
        a.rotate_by(&-rot);
        a.angular_velocity -= rot / dt;
    }
    if b.is_dynamic() {
        let rot = inv_inertia_b * rb.cross(&correction);
        b.rotate_by(&rot);
        b.angular_velocity += rot / dt;
    }
}

/// Rotate A and B toward each other to cancel `error`, the world-space
/// rotation B has in excess of A.
fn apply_rotation_correction(
    a: &mut RigidBody,
    b: &mut RigidBody,
    error: Vector3<f32>,
    compliance: f32,
    dt: f32,
) {
    let angle = error.norm();
    if angle < 1e-6 {
        return;
    }
    let n = error / angle;

    let inv_inertia_a = a.inv_inertia_world();
    let inv_inertia_b = b.inv_inertia_world();
    let w_a = if a.is_dynamic() { n.dot(&(inv_inertia_a * n)) } else { 0.0 };
    let w_b = if b.is_dynamic() { n.dot(&(inv_inertia_b * n)) } else { 0.0 };
    let w_sum = w_a + w_b;
    if w_sum <= 0.0 {
        return;
    }

    let alpha = compliance / (dt * dt);
    let delta_lambda = -angle / (w_sum + alpha);
    let impulse = n * delta_lambda;

    if a.is_dynamic() {
        let rot = inv_inertia_a * impulse;
        a.rotate_by(&-rot);
        a.angular_velocity -= rot / dt;
    }
    if b.is_dynamic() {
        let rot = inv_inertia_b * impulse;
        b.rotate_by(&rot);
        b.angular_velocity += rot / dt;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const EPSILON: f32 = 1e-3;

    fn handle(slot: u32) -> BodyHandle {
        BodyHandle(Index { slot, generation: 0 })
    }

    #[test]
    fn test_lock_pivots_meet_at_midpoint() {
        let a = RigidBody::new(1.0).with_position(Vector3::new(0.0, 0.0, 0.0));
        let b = RigidBody::new(1.0)
            .with_position(Vector3::new(2.0, 0.0, 0.0))
            .with_orientation(UnitQuaternion::from_axis_angle(&Vector3::y_axis(), 1.0));
        let c = Constraint::lock(handle(0), &a, handle(1), &b);
        let world_a = a.local_to_world(&c.pivot_a);
        let world_b = b.local_to_world(&c.pivot_b);
        assert!((world_a - Vector3::new(1.0, 0.0, 0.0)).norm() < EPSILON);
        assert!((world_b - world_a).norm() < EPSILON);
    }

    #[test]
    fn test_rotation_vector_matches_axis_angle() {
        let q = UnitQuaternion::from_axis_angle(&Vector3::z_axis(), 0.5);
        let v = rotation_vector(&q);
        assert!((v - Vector3::new(0.0, 0.0, 0.5)).norm() < EPSILON, "Got {:?}", v);
    }

    #[test]
    fn test_lock_corrects_rotation_against_static() {
        let mut anchor = RigidBody::new_static();
        let mut body = RigidBody::new(1.0).with_position(Vector3::new(0.0, -1.0, 0.0));
        let c = Constraint::lock(handle(0), &anchor, handle(1), &body);
        body.orientation = UnitQuaternion::from_axis_angle(&Vector3::x_axis(), 0.3);
        for _ in 0..20 {
            c.solve(&mut anchor, &mut body, 1.0 / 60.0);
        }
        assert!(body.orientation.angle() < 0.01, "Residual angle {}", body.orientation.angle());
        assert_eq!(anchor.orientation, UnitQuaternion::identity());
    }

    #[test]
    fn test_hinge_realigns_axis() {
        let mut a = RigidBody::new_static();
        let mut b = RigidBody::new(1.0);
        let c = Constraint::hinge(handle(0), Vector3::zeros(), Vector3::x(), handle(1), Vector3::zeros(), Vector3::x());
        b.orientation = UnitQuaternion::from_axis_angle(&Vector3::y_axis(), 0.4);
        for _ in 0..30 {
            c.solve(&mut a, &mut b, 1.0 / 60.0);
        }
        let axis = b.orientation * Vector3::x();
        assert!(axis.dot(&Vector3::x()) > 0.999, "Axis drifted: {:?}", axis);
    }

    #[test]
    fn test_hinge_allows_rotation_about_axis() {
        let mut a = RigidBody::new_static();
        let mut b = RigidBody::new(1.0);
        let c = Constraint::hinge(handle(0), Vector3::zeros(), Vector3::x(), handle(1), Vector3::zeros(), Vector3::x());
        let spun = UnitQuaternion::from_axis_angle(&Vector3::x_axis(), 1.2);
        b.orientation = spun;
        c.solve(&mut a, &mut b, 1.0 / 60.0);
        assert!(b.orientation.angle_to(&spun) < EPSILON);
    }

    #[test]
    fn test_cone_twist_limits_swing() {
        let mut a = RigidBody::new_static();
        let mut b = RigidBody::new(1.0);
        let params = ConeTwistParams {
            pivot_a: Vector3::zeros(),
            pivot_b: Vector3::zeros(),
            axis_a: Vector3::y(),
            axis_b: Vector3::y(),
            swing_limit: 0.5,
            twist_limit: 0.5,
        };
        let c = Constraint::cone_twist(handle(0), &a, handle(1), &b, params);
        b.orientation = UnitQuaternion::from_axis_angle(&Vector3::z_axis(), 1.2);
        for _ in 0..30 {
            c.solve(&mut a, &mut b, 1.0 / 60.0);
        }
        let swing = (b.orientation * Vector3::y()).dot(&Vector3::y()).acos();
        assert!(swing <= 0.5 + 0.01, "Swing {} exceeds limit", swing);
        assert!(swing > 0.4, "Swing inside the cone should not be corrected, got {}", swing);
    }

    #[test]
    fn test_cone_twist_limits_twist() {
        let mut a = RigidBody::new_static();
        let mut b = RigidBody::new(1.0);
        let params = ConeTwistParams {
            pivot_a: Vector3::zeros(),
            pivot_b: Vector3::zeros(),
            axis_a: Vector3::y(),
            axis_b: Vector3::y(),
            swing_limit: 0.5,
            twist_limit: 0.3,
        };
        let c = Constraint::cone_twist(handle(0), &a, handle(1), &b, params);
        b.orientation = UnitQuaternion::from_axis_angle(&Vector3::y_axis(), 1.0);
        for _ in 0..30 {
            c.solve(&mut a, &mut b, 1.0 / 60.0);
        }
        let twist = b.orientation.angle();
        assert!((twist - 0.3).abs() < 0.02, "Expected twist ~0.3, got {}", twist);
    }
}
