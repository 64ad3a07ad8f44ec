use std::collections::HashSet;

use log::{debug, warn};
use nalgebra::Vector3;

use super::arena::{Arena, Index};
use super::body::{BodyHandle, RigidBody};
use super::collision::{collide, Contact};
use super::constraint::{ConeTwistParams, Constraint, ConstraintHandle};

/// Contact buffer capacity used by [`World::step`] callers in this crate.
pub const MAX_CONTACTS: usize = 256;

/// The physics container: registered bodies, registered constraints and
/// gravity.
///
/// Bodies and constraints live in generational arenas. Removing a body also
/// removes every constraint that references it, so no registered constraint
/// ever points at an unregistered body.
///
/// # Example
/// ```
/// use ragdoll_sandbox::physics::{World, RigidBody, Collider, MAX_CONTACTS};
/// use nalgebra::Vector3;
///
/// let mut world = World::new();
/// world.set_gravity(Vector3::new(0.0, -9.81, 0.0));
///
/// let ball = world.add_body(
///     RigidBody::new(1.0)
///         .with_position(Vector3::new(0.0, 10.0, 0.0))
///         .with_collider(Collider::Sphere { radius: 0.5 }),
/// );
/// world.step::<MAX_CONTACTS>(1.0 / 60.0);
/// assert!(world.body(ball).unwrap().velocity.y < 0.0);
/// ```
pub struct World {
    bodies: Arena<RigidBody>,
    constraints: Arena<Constraint>,
    gravity: Vector3<f32>,
    /// Constraint solver passes per (sub)step.
    pub solver_iterations: u32,
}

impl Default for World {
    fn default() -> Self {
        Self::new()
    }
}

impl World {
    /// Create an empty world with no gravity.
    pub fn new() -> Self {
        Self {
            bodies: Arena::new(),
            constraints: Arena::new(),
            gravity: Vector3::zeros(),
            solver_iterations: 10,
        }
    }

    pub fn set_gravity(&mut self, gravity: Vector3<f32>) {
        self.gravity = gravity;
    }

    pub fn gravity(&self) -> Vector3<f32> {
        self.gravity
    }

    // -- Bodies --

    pub fn add_body(&mut self, body: RigidBody) -> BodyHandle {
        BodyHandle(self.bodies.insert(body))
    }

    /// Remove a body along with every constraint attached to it.
    pub fn remove_body(&mut self, handle: BodyHandle) -> Option<RigidBody> {
        let body = self.bodies.remove(handle.0)?;
        let attached: Vec<Index> = self
            .constraints
            .iter()
            .filter(|(_, c)| c.involves(handle))
            .map(|(i, _)| i)
            .collect();
        if !attached.is_empty() {
            debug!("removing {} constraint(s) attached to a removed body", attached.len());
        }
        for index in attached {
            self.constraints.remove(index);
        }
        Some(body)
    }

    pub fn body(&self, handle: BodyHandle) -> Option<&RigidBody> {
        self.bodies.get(handle.0)
    }

    pub fn body_mut(&mut self, handle: BodyHandle) -> Option<&mut RigidBody> {
        self.bodies.get_mut(handle.0)
    }

    pub fn contains_body(&self, handle: BodyHandle) -> bool {
        self.bodies.contains(handle.0)
    }

    pub fn body_count(&self) -> usize {
        self.bodies.len()
    }

    pub fn bodies(&self) -> impl Iterator<Item = (BodyHandle, &RigidBody)> {
        self.bodies.iter().map(|(i, b)| (BodyHandle(i), b))
    }

    pub fn bodies_mut(&mut self) -> impl Iterator<Item = (BodyHandle, &mut RigidBody)> {
        self.bodies.iter_mut().map(|(i, b)| (BodyHandle(i), b))
    }

    /// Nearest body center to `point` among bodies accepted by `filter`.
    ///
    /// Returns the handle and the distance. Ties go to the lowest slot.
    pub fn nearest_body<F>(&self, point: &Vector3<f32>, mut filter: F) -> Option<(BodyHandle, f32)>
    where
        F: FnMut(BodyHandle, &RigidBody) -> bool,
    {
        let mut best: Option<(BodyHandle, f32)> = None;
        for (handle, body) in self.bodies() {
            if !filter(handle, body) {
                continue;
            }
            let distance = (body.position - point).norm();
            if best.map_or(true, |(_, d)| distance < d) {
                best = Some((handle, distance));
            }
        }
        best
    }

    // -- Constraints --

    /// Register a constraint. Returns `None` if either body is not registered.
    pub fn add_constraint(&mut self, constraint: Constraint) -> Option<ConstraintHandle> {
        if constraint.body_a == constraint.body_b
            || !self.contains_body(constraint.body_a)
            || !self.contains_body(constraint.body_b)
        {
            return None;
        }
        Some(ConstraintHandle(self.constraints.insert(constraint)))
    }

    pub fn remove_constraint(&mut self, handle: ConstraintHandle) -> bool {
        self.constraints.remove(handle.0).is_some()
    }

    pub fn constraint(&self, handle: ConstraintHandle) -> Option<&Constraint> {
        self.constraints.get(handle.0)
    }

    pub fn contains_constraint(&self, handle: ConstraintHandle) -> bool {
        self.constraints.contains(handle.0)
    }

    pub fn constraint_count(&self) -> usize {
        self.constraints.len()
    }

    pub fn constraints(&self) -> impl Iterator<Item = (ConstraintHandle, &Constraint)> {
        self.constraints.iter().map(|(i, c)| (ConstraintHandle(i), c))
    }

    /// Lock `b` to `a` in their current relative pose.
    pub fn add_lock(&mut self, a: BodyHandle, b: BodyHandle) -> Option<ConstraintHandle> {
        let constraint = Constraint::lock(a, self.body(a)?, b, self.body(b)?);
        self.add_constraint(constraint)
    }

    /// Hinge with pivots and axes given in each body's local frame.
    pub fn add_hinge(
        &mut self,
        a: BodyHandle,
        pivot_a: Vector3<f32>,
        axis_a: Vector3<f32>,
        b: BodyHandle,
        pivot_b: Vector3<f32>,
        axis_b: Vector3<f32>,
    ) -> Option<ConstraintHandle> {
        self.add_constraint(Constraint::hinge(a, pivot_a, axis_a, b, pivot_b, axis_b))
    }

    pub fn add_cone_twist(
        &mut self,
        a: BodyHandle,
        b: BodyHandle,
        params: ConeTwistParams,
    ) -> Option<ConstraintHandle> {
        let constraint = Constraint::cone_twist(a, self.body(a)?, b, self.body(b)?, params);
        self.add_constraint(constraint)
    }

    /// Express a world-space point in the local frames of `a` and `b`.
    pub fn local_pivots(
        &self,
        a: BodyHandle,
        b: BodyHandle,
        world_point: &Vector3<f32>,
    ) -> Option<(Vector3<f32>, Vector3<f32>)> {
        Some((
            self.body(a)?.world_to_local(world_point),
            self.body(b)?.world_to_local(world_point),
        ))
    }

    // -- Simulation --

    /// Slot pairs joined by at least one constraint. Jointed bodies never
    /// collide with each other.
    fn jointed_pairs(&self) -> HashSet<(u32, u32)> {
        self.constraints
            .iter()
            .map(|(_, c)| {
                let (x, y) = (c.body_a.0.slot, c.body_b.0.slot);
                (x.min(y), x.max(y))
            })
            .collect()
    }

    /// Broad + narrow phase over every body pair with colliders.
    ///
    /// `C` caps the contacts gathered per pass; extra contacts are dropped
    /// with a warning.
    pub fn detect_collisions<const C: usize>(&self) -> heapless::Vec<Contact, C> {
        let mut contacts = heapless::Vec::new();
        let jointed = self.jointed_pairs();
        let entries: Vec<(Index, &RigidBody)> = self.bodies.iter().collect();

        for (i, (index_a, body_a)) in entries.iter().enumerate() {
            let Some(col_a) = &body_a.collider else { continue };

            for (index_b, body_b) in &entries[i + 1..] {
                let Some(col_b) = &body_b.collider else { continue };

                if !body_a.is_dynamic() && !body_b.is_dynamic() {
                    continue;
                }
                if !body_a.collides_with(body_b) {
                    continue;
                }
                let key = (index_a.slot.min(index_b.slot), index_a.slot.max(index_b.slot));
                if jointed.contains(&key) {
                    continue;
                }

                if let Some((normal, penetration)) = collide(
                    &body_a.position,
                    &body_a.orientation,
                    col_a,
                    &body_b.position,
                    &body_b.orientation,
                    col_b,
                ) {
                    let contact = Contact {
                        body_a: BodyHandle(*index_a),
                        body_b: BodyHandle(*index_b),
                        normal,
                        penetration,
                    };
                    if contacts.push(contact).is_err() {
                        warn!("contact buffer full ({} contacts), dropping the rest", C);
                        return contacts;
                    }
                }
            }
        }

        contacts
    }

    /// Positional correction, normal impulse and Coulomb friction per contact.
    pub fn resolve_contacts(&mut self, contacts: &[Contact]) {
        for contact in contacts {
            let Some((a, b)) = self.bodies.pair_mut(contact.body_a.0, contact.body_b.0) else {
                continue;
            };
            resolve_contact(a, b, contact);
        }
    }

    /// Run `solver_iterations` passes over every constraint.
    pub fn solve_constraints(&mut self, dt: f32) {
        if self.constraints.len() == 0 || dt <= 0.0 {
            return;
        }
        let order = self.constraints.indices();
        for _ in 0..self.solver_iterations {
            for index in &order {
                let Some(constraint) = self.constraints.get(*index) else { continue };
                let (a, b) = (constraint.body_a.0, constraint.body_b.0);
                let constraint = constraint.clone();
                if let Some((body_a, body_b)) = self.bodies.pair_mut(a, b) {
                    constraint.solve(body_a, body_b, dt);
                }
            }
        }
    }

    /// Advance by `dt`: integrate, collide, resolve, then solve joints.
    pub fn step<const C: usize>(&mut self, dt: f32) {
        let gravity = self.gravity;
        for (_, body) in self.bodies.iter_mut() {
            body.integrate(dt, gravity);
        }

        let contacts = self.detect_collisions::<C>();
        self.resolve_contacts(&contacts);
        self.solve_constraints(dt);
    }

    /// Split `dt` into `substeps` equal [`step`](World::step)s.
    pub fn step_fixed<const C: usize>(&mut self, dt: f32, substeps: u32) {
        let substeps = substeps.max(1);
        let sub_dt = dt / substeps as f32;
        for _ in 0..substeps {
            self.step::<C>(sub_dt);
        }
    }
}

fn resolve_contact(a: &mut RigidBody, b: &mut RigidBody, contact: &Contact) {
    let inv_mass_sum = a.inv_mass + b.inv_mass;
    if inv_mass_sum == 0.0 {
        return;
    }

    let contact_point = a.position + contact.normal * (contact.penetration * 0.5);
    let ra = contact_point - a.position;
    let rb = contact_point - b.position;
    let inv_inertia_a = a.inv_inertia_world();
    let inv_inertia_b = b.inv_inertia_world();

    // Push apart
    let correction = contact.normal * (contact.penetration / inv_mass_sum);
    a.position -= correction * a.inv_mass;
    b.position += correction * b.inv_mass;

    let relative_vel = (b.velocity + b.angular_velocity.cross(&rb))
        - (a.velocity + a.angular_velocity.cross(&ra));
    let vel_along_normal = relative_vel.dot(&contact.normal);
    if vel_along_normal >= 0.0 {
        return;
    }

    let restitution = a.restitution.min(b.restitution);
    let ra_cross_n = ra.cross(&contact.normal);
    let rb_cross_n = rb.cross(&contact.normal);
    let eff_mass_inv = inv_mass_sum
        + (inv_inertia_a * ra_cross_n).cross(&ra).dot(&contact.normal)
        + (inv_inertia_b * rb_cross_n).cross(&rb).dot(&contact.normal);
    if eff_mass_inv <= 0.0 {
        return;
    }

    let j = -(1.0 + restitution) * vel_along_normal / eff_mass_inv;
    let impulse = contact.normal * j;
    a.velocity -= impulse * a.inv_mass;
    b.velocity += impulse * b.inv_mass;
    a.angular_velocity -= inv_inertia_a * ra.cross(&impulse);
    b.angular_velocity += inv_inertia_b * rb.cross(&impulse);

    // Coulomb friction
    let mu = (a.friction * b.friction).sqrt();
    if mu <= 1e-6 {
        return;
    }
    let relative_vel = (b.velocity + b.angular_velocity.cross(&rb))
        - (a.velocity + a.angular_velocity.cross(&ra));
    let tangent_vel =
        relative_vel - contact.normal * relative_vel.dot(&contact.normal);
    let tangent_speed = tangent_vel.norm();
    if tangent_speed <= 1e-6 {
        return;
    }
    let tangent = tangent_vel / tangent_speed;
    let ra_cross_t = ra.cross(&tangent);
    let rb_cross_t = rb.cross(&tangent);
    let eff_mass_t_inv = inv_mass_sum
        + (inv_inertia_a * ra_cross_t).cross(&ra).dot(&tangent)
        + (inv_inertia_b * rb_cross_t).cross(&rb).dot(&tangent);
    if eff_mass_t_inv <= 0.0 {
        return;
    }
    let jt = (-tangent_speed / eff_mass_t_inv).max(-mu * j);
    let friction_impulse = tangent * jt;
    a.velocity -= friction_impulse * a.inv_mass;
    b.velocity += friction_impulse * b.inv_mass;
    a.angular_velocity -= inv_inertia_a * ra.cross(&friction_impulse);
    b.angular_velocity += inv_inertia_b * rb.cross(&friction_impulse);
}
