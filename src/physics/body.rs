use nalgebra::{Isometry3, Matrix3, Translation3, UnitQuaternion, Vector3};

use super::arena::Index;
use super::collision::Collider;

/// Stable reference to a rigid body registered in a [`World`](super::World).
///
/// Handles stay valid until the body is removed. A stale handle resolves to
/// `None` everywhere instead of aliasing a newer body.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct BodyHandle(pub(crate) Index);

/// Determines how a body participates in the simulation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BodyType {
    /// Fully simulated: affected by forces, gravity, and velocity.
    Dynamic,
    /// Zero inverse mass. Never integrated, but can be repositioned by hand
    /// (pins, press jaws, rack anchors, weapon pivots).
    Static,
}

/// Collision group bits. Two bodies collide only when each one's group
/// intersects the other's mask.
pub mod groups {
    pub const DEFAULT: u32 = 1 << 0;
    pub const DUMMY: u32 = 1 << 1;
    pub const PROP: u32 = 1 << 2;
    pub const ALL: u32 = u32::MAX;
}

/// A rigid body with linear and angular dynamics.
#[derive(Debug, Clone)]
pub struct RigidBody {
    // -- Linear state --
    pub position: Vector3<f32>,
    pub velocity: Vector3<f32>,
    pub mass: f32,
    pub inv_mass: f32,
    pub body_type: BodyType,
    pub restitution: f32,
    pub collider: Option<Collider>,

    /// Coulomb friction coefficient. The effective coefficient of a contact
    /// is `sqrt(mu_a * mu_b)`.
    pub friction: f32,

    force_accumulator: Vector3<f32>,

    /// Fraction of linear velocity lost per second.
    pub damping: f32,

    // -- Angular state --
    pub orientation: UnitQuaternion<f32>,

    /// Angular velocity in world space (radians per second).
    pub angular_velocity: Vector3<f32>,

    /// Inverse inertia tensor in body-local space. Zero for static bodies.
    pub inv_inertia_local: Matrix3<f32>,

    torque_accumulator: Vector3<f32>,

    /// Fraction of angular velocity lost per second.
    pub angular_damping: f32,

    // -- Filtering --
    pub collision_group: u32,
    pub collision_mask: u32,
}

impl RigidBody {
    /// Create a new dynamic rigid body with the given mass.
    ///
    /// The inertia defaults to a unit sphere; call [`with_inertia_sphere`] or
    /// [`with_inertia_box`] once the shape is known.
    ///
    /// # Panics
    /// Panics if `mass` is not positive and finite.
    ///
    /// [`with_inertia_sphere`]: RigidBody::with_inertia_sphere
    /// [`with_inertia_box`]: RigidBody::with_inertia_box
    pub fn new(mass: f32) -> Self {
        assert!(mass > 0.0 && mass.is_finite(), "mass must be positive and finite");
        let inv_i = 1.0 / (0.4 * mass);
        Self {
            position: Vector3::zeros(),
            velocity: Vector3::zeros(),
            mass,
            inv_mass: 1.0 / mass,
            body_type: BodyType::Dynamic,
            restitution: 0.2,
            collider: None,
            friction: 0.3,
            force_accumulator: Vector3::zeros(),
            damping: 0.01,
            orientation: UnitQuaternion::identity(),
            angular_velocity: Vector3::zeros(),
            inv_inertia_local: Matrix3::from_diagonal_element(inv_i),
            torque_accumulator: Vector3::zeros(),
            angular_damping: 0.01,
            collision_group: groups::DEFAULT,
            collision_mask: groups::ALL,
        }
    }

    /// Create a static body (infinite mass, unaffected by forces).
    pub fn new_static() -> Self {
        Self {
            position: Vector3::zeros(),
            velocity: Vector3::zeros(),
            mass: f32::INFINITY,
            inv_mass: 0.0,
            body_type: BodyType::Static,
            restitution: 0.2,
            collider: None,
            friction: 0.5,
            force_accumulator: Vector3::zeros(),
            damping: 0.0,
            orientation: UnitQuaternion::identity(),
            angular_velocity: Vector3::zeros(),
            inv_inertia_local: Matrix3::zeros(),
            torque_accumulator: Vector3::zeros(),
            angular_damping: 0.0,
            collision_group: groups::DEFAULT,
            collision_mask: groups::ALL,
        }
    }

    /// Dynamic body when `mass > 0`, static otherwise.
    pub fn with_mass(mass: f32) -> Self {
        if mass > 0.0 && mass.is_finite() {
            Self::new(mass)
        } else {
            Self::new_static()
        }
    }

    pub fn with_position(mut self, position: Vector3<f32>) -> Self {
        self.position = position;
        self
    }

    pub fn with_orientation(mut self, orientation: UnitQuaternion<f32>) -> Self {
        self.orientation = orientation;
        self
    }

    pub fn with_velocity(mut self, velocity: Vector3<f32>) -> Self {
        self.velocity = velocity;
        self
    }

    /// Builder: set restitution (bounciness, 0.0..=1.0).
    pub fn with_restitution(mut self, restitution: f32) -> Self {
        self.restitution = restitution.clamp(0.0, 1.0);
        self
    }

    /// Builder: set linear damping (0.0..=1.0, fraction lost per second).
    pub fn with_damping(mut self, damping: f32) -> Self {
        self.damping = damping.clamp(0.0, 1.0);
        self
    }

    /// Builder: attach a collider and derive a matching inertia tensor.
    pub fn with_collider(mut self, collider: Collider) -> Self {
        self.collider = Some(collider);
        match collider {
            Collider::Sphere { radius } => self.with_inertia_sphere(radius),
            Collider::Cuboid { half_extents } => self.with_inertia_box(half_extents),
        }
    }

    pub fn with_friction(mut self, friction: f32) -> Self {
        self.friction = friction.clamp(0.0, 1.0);
        self
    }

    pub fn with_angular_velocity(mut self, angular_velocity: Vector3<f32>) -> Self {
        self.angular_velocity = angular_velocity;
        self
    }

    pub fn with_angular_damping(mut self, damping: f32) -> Self {
        self.angular_damping = damping.clamp(0.0, 1.0);
        self
    }

    /// Builder: set collision group and mask bits (see [`groups`]).
    pub fn with_collision_filter(mut self, group: u32, mask: u32) -> Self {
        self.collision_group = group;
        self.collision_mask = mask;
        self
    }

    /// Builder: inertia of a solid sphere, `I = (2/5) m r²`.
    pub fn with_inertia_sphere(mut self, radius: f32) -> Self {
        if self.body_type == BodyType::Dynamic && radius > 0.0 {
            let i = 0.4 * self.mass * radius * radius;
            self.inv_inertia_local = Matrix3::from_diagonal_element(1.0 / i);
        }
        self
    }

    /// Builder: inertia of a solid box with the given half-extents.
    ///
    /// - `Ixx = (1/12) m (4hy² + 4hz²)`
    /// - `Iyy = (1/12) m (4hx² + 4hz²)`
    /// - `Izz = (1/12) m (4hx² + 4hy²)`
    pub fn with_inertia_box(mut self, half_extents: Vector3<f32>) -> Self {
        if self.body_type == BodyType::Dynamic {
            let hx2 = 4.0 * half_extents.x * half_extents.x;
            let hy2 = 4.0 * half_extents.y * half_extents.y;
            let hz2 = 4.0 * half_extents.z * half_extents.z;
            let k = self.mass / 12.0;
            let ix = k * (hy2 + hz2);
            let iy = k * (hx2 + hz2);
            let iz = k * (hx2 + hy2);
            if ix > 0.0 && iy > 0.0 && iz > 0.0 {
                self.inv_inertia_local =
                    Matrix3::from_diagonal(&Vector3::new(1.0 / ix, 1.0 / iy, 1.0 / iz));
            }
        }
        self
    }

    #[inline]
    pub fn is_dynamic(&self) -> bool {
        self.body_type == BodyType::Dynamic
    }

    /// Accumulate a force until the next integration.
    #[inline]
    pub fn apply_force(&mut self, force: Vector3<f32>) {
        self.force_accumulator += force;
    }

    /// Apply an impulse at the center of mass: `delta_v = impulse / mass`.
    #[inline]
    pub fn apply_impulse(&mut self, impulse: Vector3<f32>) {
        if self.is_dynamic() {
            self.velocity += impulse * self.inv_mass;
        }
    }

    #[inline]
    pub fn apply_torque(&mut self, torque: Vector3<f32>) {
        self.torque_accumulator += torque;
    }

    /// Apply an angular impulse: `delta_ω = I⁻¹ * impulse`.
    #[inline]
    pub fn apply_angular_impulse(&mut self, impulse: Vector3<f32>) {
        if self.is_dynamic() {
            self.angular_velocity += self.inv_inertia_world() * impulse;
        }
    }

    /// `I⁻¹_world = R * I⁻¹_local * Rᵀ`.
    #[inline]
    pub fn inv_inertia_world(&self) -> Matrix3<f32> {
        let r = self.orientation.to_rotation_matrix();
        r.matrix() * self.inv_inertia_local * r.matrix().transpose()
    }

    #[inline]
    pub fn speed(&self) -> f32 {
        self.velocity.norm()
    }

    /// `0.5 * m * v²`; zero for static bodies.
    #[inline]
    pub fn kinetic_energy(&self) -> f32 {
        if self.is_dynamic() {
            0.5 * self.mass * self.velocity.norm_squared()
        } else {
            0.0
        }
    }

    /// Teleport to a pose. Velocities are left as they are.
    pub fn set_pose(&mut self, position: Vector3<f32>, orientation: UnitQuaternion<f32>) {
        self.position = position;
        self.orientation = orientation;
    }

    /// Zero linear and angular velocity along with pending forces.
    pub fn stop(&mut self) {
        self.velocity = Vector3::zeros();
        self.angular_velocity = Vector3::zeros();
        self.force_accumulator = Vector3::zeros();
        self.torque_accumulator = Vector3::zeros();
    }

    pub fn isometry(&self) -> Isometry3<f32> {
        Isometry3::from_parts(Translation3::from(self.position), self.orientation)
    }

    /// Body-local point to world space.
    #[inline]
    pub fn local_to_world(&self, local: &Vector3<f32>) -> Vector3<f32> {
        self.position + self.orientation * local
    }

    /// World point to body-local space: `q⁻¹ · (p − position)`.
    #[inline]
    pub fn world_to_local(&self, world: &Vector3<f32>) -> Vector3<f32> {
        self.orientation.inverse() * (world - self.position)
    }

    pub(crate) fn collides_with(&self, other: &RigidBody) -> bool {
        (self.collision_group & other.collision_mask) != 0
            && (other.collision_group & self.collision_mask) != 0
    }

    /// Rotate by a small world-space rotation vector.
    pub(crate) fn rotate_by(&mut self, rotation: &Vector3<f32>) {
        let dq = nalgebra::Quaternion::new(
            0.0,
            rotation.x * 0.5,
            rotation.y * 0.5,
            rotation.z * 0.5,
        );
        let q = self.orientation.into_inner();
        self.orientation = UnitQuaternion::new_normalize(q + dq * q);
    }

    /// Semi-implicit Euler: velocity first, then position and orientation.
    pub(crate) fn integrate(&mut self, dt: f32, gravity: Vector3<f32>) {
        if !self.is_dynamic() {
            self.force_accumulator = Vector3::zeros();
            self.torque_accumulator = Vector3::zeros();
            return;
        }

        // --- Linear ---
        let acceleration = gravity + self.force_accumulator * self.inv_mass;
        self.velocity += acceleration * dt;
        self.velocity *= (1.0 - self.damping).powf(dt);
        self.position += self.velocity * dt;

        // --- Angular ---
        let angular_acceleration = self.inv_inertia_world() * self.torque_accumulator;
        self.angular_velocity += angular_acceleration * dt;
        self.angular_velocity *= (1.0 - self.angular_damping).powf(dt);

        // q' = q + 0.5 * dt * ω * q
        let step = self.angular_velocity * dt;
        self.rotate_by(&step);

        self.force_accumulator = Vector3::zeros();
        self.torque_accumulator = Vector3::zeros();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const EPSILON: f32 = 1e-4;

    fn approx_eq(a: f32, b: f32) -> bool {
        (a - b).abs() < EPSILON
    }

    fn approx_vec_eq(a: &Vector3<f32>, b: &Vector3<f32>) -> bool {
        approx_eq(a.x, b.x) && approx_eq(a.y, b.y) && approx_eq(a.z, b.z)
    }

    #[test]
    fn test_body_creation() {
        let body = RigidBody::new(5.0);
        assert_eq!(body.mass, 5.0);
        assert!(approx_eq(body.inv_mass, 0.2));
        assert_eq!(body.body_type, BodyType::Dynamic);
        assert!(approx_vec_eq(&body.position, &Vector3::zeros()));
    }

    #[test]
    fn test_static_body() {
        let body = RigidBody::new_static();
        assert_eq!(body.body_type, BodyType::Static);
        assert_eq!(body.inv_mass, 0.0);
        assert!(body.mass.is_infinite());
        assert_eq!(body.kinetic_energy(), 0.0);
    }

    #[test]
    fn test_with_mass_zero_is_static() {
        assert!(!RigidBody::with_mass(0.0).is_dynamic());
        assert!(RigidBody::with_mass(2.0).is_dynamic());
    }

    #[test]
    #[should_panic]
    fn test_body_zero_mass_panics() {
        RigidBody::new(0.0);
    }

    #[test]
    fn test_apply_impulse() {
        let mut body = RigidBody::new(2.0);
        body.apply_impulse(Vector3::new(4.0, 0.0, 0.0));
        assert!(approx_vec_eq(&body.velocity, &Vector3::new(2.0, 0.0, 0.0)));
    }

    #[test]
    fn test_impulse_on_static_body_ignored() {
        let mut body = RigidBody::new_static();
        body.apply_impulse(Vector3::new(100.0, 0.0, 0.0));
        assert!(approx_vec_eq(&body.velocity, &Vector3::zeros()));
    }

    #[test]
    fn test_box_inertia_from_collider() {
        let body = RigidBody::new(12.0).with_collider(Collider::Cuboid {
            half_extents: Vector3::new(0.5, 0.5, 0.5),
        });
        // Unit cube: I = m/6 = 2 on every axis
        assert!(approx_eq(body.inv_inertia_local[(0, 0)], 0.5));
        assert!(approx_eq(body.inv_inertia_local[(2, 2)], 0.5));
    }

    #[test]
    fn test_integrate_free_fall() {
        let mut body = RigidBody::new(1.0).with_damping(0.0);
        let g = Vector3::new(0.0, -10.0, 0.0);
        for _ in 0..10 {
            body.integrate(0.1, g);
        }
        assert!(approx_eq(body.velocity.y, -10.0), "Expected vy ~-10, got {}", body.velocity.y);
    }

    #[test]
    fn test_damping_is_per_second() {
        let mut coarse = RigidBody::new(1.0).with_damping(0.5).with_velocity(Vector3::x());
        let mut fine = coarse.clone();
        coarse.integrate(1.0, Vector3::zeros());
        for _ in 0..100 {
            fine.integrate(0.01, Vector3::zeros());
        }
        assert!(approx_eq(coarse.velocity.x, 0.5));
        assert!((fine.velocity.x - 0.5).abs() < 1e-3, "Got {}", fine.velocity.x);
    }

    #[test]
    fn test_angular_integration_rotates() {
        let mut body = RigidBody::new(1.0)
            .with_angular_damping(0.0)
            .with_angular_velocity(Vector3::new(0.0, core::f32::consts::PI, 0.0));
        for _ in 0..100 {
            body.integrate(0.005, Vector3::zeros());
        }
        // Half a second at π rad/s is a quarter turn
        let angle = body.orientation.angle();
        assert!((angle - core::f32::consts::FRAC_PI_2).abs() < 0.02, "Got {}", angle);
    }

    #[test]
    fn test_world_local_round_trip() {
        let body = RigidBody::new(1.0)
            .with_position(Vector3::new(1.0, 2.0, 3.0))
            .with_orientation(UnitQuaternion::from_axis_angle(&Vector3::z_axis(), 0.7));
        let p = Vector3::new(-0.3, 0.4, 2.0);
        let local = body.world_to_local(&p);
        assert!(approx_vec_eq(&body.local_to_world(&local), &p));
    }

    #[test]
    fn test_collision_filter() {
        let a = RigidBody::new(1.0).with_collision_filter(groups::DUMMY, groups::ALL & !groups::DUMMY);
        let b = RigidBody::new(1.0).with_collision_filter(groups::DUMMY, groups::ALL & !groups::DUMMY);
        let c = RigidBody::new(1.0);
        assert!(!a.collides_with(&b));
        assert!(a.collides_with(&c));
    }
}
