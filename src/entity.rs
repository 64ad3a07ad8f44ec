//! Physical entities: the owned unit of bodies, joints and a visual node.
//!
//! An [`Assembly`] is the blueprint a tool or the ragdoll builder produces:
//! named bodies not yet registered, named joint specs that refer to those
//! bodies by part name (or to already-registered bodies by handle), a visual
//! node, and which node each body drives. [`PhysicalEntity::spawn`] registers
//! everything with the [`World`] in one go and records the spawn snapshot.

use std::collections::HashMap;

use embedded_graphics_core::pixelcolor::Rgb565;
use log::debug;
use nalgebra::{UnitQuaternion, Vector3};
use rand::Rng;

use crate::physics::{BodyHandle, Collider, ConeTwistParams, ConstraintHandle, RigidBody, World};
use crate::scene::{NodeShape, NodeTransform, VisualNode};

/// Identifies a live entity towards the scene graph.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct EntityId(pub u64);

// ---------------------------------------------------------------------------
// NamedMap
// ---------------------------------------------------------------------------

/// Insertion-ordered map from part name to a value.
///
/// Inserting an existing name overwrites the value in place, so iteration
/// order stays the order names were first seen.
#[derive(Debug, Clone)]
pub struct NamedMap<T> {
    entries: Vec<(String, T)>,
}

impl<T> Default for NamedMap<T> {
    fn default() -> Self {
        Self { entries: Vec::new() }
    }
}

impl<T> NamedMap<T> {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, name: impl Into<String>, value: T) {
        let name = name.into();
        match self.entries.iter_mut().find(|(n, _)| *n == name) {
            Some(entry) => entry.1 = value,
            None => self.entries.push((name, value)),
        }
    }

    pub fn get(&self, name: &str) -> Option<&T> {
        self.entries.iter().find(|(n, _)| n == name).map(|(_, v)| v)
    }

    pub fn get_mut(&mut self, name: &str) -> Option<&mut T> {
        self.entries.iter_mut().find(|(n, _)| n == name).map(|(_, v)| v)
    }

    pub fn remove(&mut self, name: &str) -> Option<T> {
        let pos = self.entries.iter().position(|(n, _)| n == name)?;
        Some(self.entries.remove(pos).1)
    }

    pub fn contains_key(&self, name: &str) -> bool {
        self.get(name).is_some()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &T)> {
        self.entries.iter().map(|(n, v)| (n.as_str(), v))
    }

    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.entries.iter().map(|(n, _)| n.as_str())
    }

    pub fn values(&self) -> impl Iterator<Item = &T> {
        self.entries.iter().map(|(_, v)| v)
    }
}

impl<T> FromIterator<(String, T)> for NamedMap<T> {
    fn from_iter<I: IntoIterator<Item = (String, T)>>(iter: I) -> Self {
        let mut map = NamedMap::new();
        for (name, value) in iter {
            map.insert(name, value);
        }
        map
    }
}

// ---------------------------------------------------------------------------
// Assembly
// ---------------------------------------------------------------------------

/// Position and orientation of a body.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Pose {
    pub position: Vector3<f32>,
    pub orientation: UnitQuaternion<f32>,
}

impl Pose {
    pub fn new(position: Vector3<f32>, orientation: UnitQuaternion<f32>) -> Self {
        Self { position, orientation }
    }

    pub fn of(body: &RigidBody) -> Self {
        Self::new(body.position, body.orientation)
    }
}

/// How an entity's nodes follow its bodies.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SyncMode {
    /// Copy body poses straight into node-local transforms.
    Simple,
    /// Express body poses in each node's parent frame (skinned models).
    Skeleton,
}

/// Endpoint of a joint spec.
#[derive(Debug, Clone, PartialEq)]
pub enum BodyRef {
    /// A body of the assembly being spawned, by part name.
    Part(String),
    /// A body already registered with the world.
    External(BodyHandle),
}

impl BodyRef {
    pub fn part(name: &str) -> Self {
        BodyRef::Part(name.to_owned())
    }
}

/// Where a joint's pivot sits.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Pivot {
    /// One world point, converted into each body's local frame at spawn.
    World(Vector3<f32>),
    /// Pivots already in the local frames of A and B.
    Local(Vector3<f32>, Vector3<f32>),
}

/// A joint to be created when the assembly spawns.
#[derive(Debug, Clone, PartialEq)]
pub enum JointSpec {
    /// Lock in the relative pose the bodies have at spawn.
    Lock { a: BodyRef, b: BodyRef },
    /// Hinge; axes in each body's local frame.
    Hinge {
        a: BodyRef,
        b: BodyRef,
        pivot: Pivot,
        axis_a: Vector3<f32>,
        axis_b: Vector3<f32>,
    },
    /// Cone-twist; axes in each body's local frame, limits in radians.
    ConeTwist {
        a: BodyRef,
        b: BodyRef,
        pivot: Pivot,
        axis_a: Vector3<f32>,
        axis_b: Vector3<f32>,
        swing: f32,
        twist: f32,
    },
}

impl JointSpec {
    pub fn lock(a: BodyRef, b: BodyRef) -> Self {
        JointSpec::Lock { a, b }
    }

    fn endpoints(&self) -> (&BodyRef, &BodyRef) {
        match self {
            JointSpec::Lock { a, b } => (a, b),
            JointSpec::Hinge { a, b, .. } => (a, b),
            JointSpec::ConeTwist { a, b, .. } => (a, b),
        }
    }
}

/// Blueprint of a physical entity.
#[derive(Debug, Clone)]
pub struct Assembly {
    pub node: VisualNode,
    bodies: Vec<(String, RigidBody)>,
    joints: Vec<(String, JointSpec)>,
    bindings: HashMap<String, Option<String>>,
    sync: SyncMode,
}

impl Assembly {
    pub fn new(node: VisualNode) -> Self {
        Self {
            node,
            bodies: Vec::new(),
            joints: Vec::new(),
            bindings: HashMap::new(),
            sync: SyncMode::Simple,
        }
    }

    pub fn with_sync(mut self, sync: SyncMode) -> Self {
        self.sync = sync;
        self
    }

    /// Add a body. It drives the node of the same name, if there is one.
    pub fn with_body(mut self, name: impl Into<String>, body: RigidBody) -> Self {
        self.push_body(name, body);
        self
    }

    pub fn push_body(&mut self, name: impl Into<String>, body: RigidBody) {
        let name = name.into();
        match self.bodies.iter_mut().find(|(n, _)| *n == name) {
            Some(entry) => entry.1 = body,
            None => self.bodies.push((name, body)),
        }
    }

    /// Make a body drive a differently named node, or none at all.
    pub fn with_binding(mut self, body: &str, node: Option<&str>) -> Self {
        self.bind(body, node);
        self
    }

    pub fn bind(&mut self, body: &str, node: Option<&str>) {
        self.bindings.insert(body.to_owned(), node.map(str::to_owned));
    }

    pub fn with_joint(mut self, name: impl Into<String>, joint: JointSpec) -> Self {
        self.push_joint(name, joint);
        self
    }

    pub fn push_joint(&mut self, name: impl Into<String>, joint: JointSpec) {
        let name = name.into();
        match self.joints.iter_mut().find(|(n, _)| *n == name) {
            Some(entry) => entry.1 = joint,
            None => self.joints.push((name, joint)),
        }
    }

    pub fn part(&self, name: &str) -> Option<&RigidBody> {
        self.bodies.iter().find(|(n, _)| n == name).map(|(_, b)| b)
    }

    pub fn part_mut(&mut self, name: &str) -> Option<&mut RigidBody> {
        self.bodies.iter_mut().find(|(n, _)| n == name).map(|(_, b)| b)
    }

    pub fn body_names(&self) -> impl Iterator<Item = &str> {
        self.bodies.iter().map(|(n, _)| n.as_str())
    }

    pub fn joint_names(&self) -> impl Iterator<Item = &str> {
        self.joints.iter().map(|(n, _)| n.as_str())
    }

    pub fn joint(&self, name: &str) -> Option<&JointSpec> {
        self.joints.iter().find(|(n, _)| n == name).map(|(_, j)| j)
    }

    pub fn body_count(&self) -> usize {
        self.bodies.len()
    }

    /// Node a body drives: an explicit binding, else the same-named node.
    fn bound_node(&self, body: &str) -> Option<usize> {
        match self.bindings.get(body) {
            Some(Some(node)) => self.node.find(node),
            Some(None) => None,
            None => self.node.find(body),
        }
    }
}

// ---------------------------------------------------------------------------
// PhysicalEntity
// ---------------------------------------------------------------------------

#[derive(Debug, Clone)]
struct Binding {
    body: String,
    node: usize,
}

/// A spawned entity: handles into the world plus its visual node.
#[derive(Debug, Clone)]
pub struct PhysicalEntity {
    id: EntityId,
    pub node: VisualNode,
    bodies: NamedMap<BodyHandle>,
    constraints: NamedMap<ConstraintHandle>,
    snapshot: NamedMap<Pose>,
    bindings: Vec<Binding>,
    sync: SyncMode,
    debug_visuals: Option<VisualNode>,
}

impl PhysicalEntity {
    /// Register an assembly's bodies, then its joints, then record the spawn
    /// snapshot.
    ///
    /// Joints whose endpoints cannot be resolved are skipped.
    pub fn spawn(id: EntityId, assembly: Assembly, world: &mut World) -> Self {
        let mut bindings = Vec::new();
        for (name, _) in &assembly.bodies {
            if let Some(node) = assembly.bound_node(name) {
                bindings.push(Binding {
                    body: name.clone(),
                    node,
                });
            }
        }

        let Assembly {
            node,
            bodies: parts,
            joints,
            sync,
            ..
        } = assembly;

        let mut bodies = NamedMap::new();
        for (name, body) in parts {
            bodies.insert(name, world.add_body(body));
        }

        let mut constraints = NamedMap::new();
        for (name, joint) in joints {
            match Self::register_joint(&bodies, &joint, world) {
                Some(handle) => constraints.insert(name, handle),
                None => debug!("joint {:?} skipped: endpoint not registered", name),
            }
        }

        let mut entity = Self {
            id,
            node,
            bodies,
            constraints,
            snapshot: NamedMap::new(),
            bindings,
            sync,
            debug_visuals: None,
        };
        entity.record_initial_body_positions_and_orientations(world);
        entity
    }

    fn resolve(bodies: &NamedMap<BodyHandle>, r: &BodyRef) -> Option<BodyHandle> {
        match r {
            BodyRef::Part(name) => bodies.get(name).copied(),
            BodyRef::External(handle) => Some(*handle),
        }
    }

    fn register_joint(
        bodies: &NamedMap<BodyHandle>,
        joint: &JointSpec,
        world: &mut World,
    ) -> Option<ConstraintHandle> {
        let (a, b) = joint.endpoints();
        let a = Self::resolve(bodies, a)?;
        let b = Self::resolve(bodies, b)?;
        let local = |world: &World, pivot: &Pivot| match pivot {
            Pivot::World(p) => world.local_pivots(a, b, p),
            Pivot::Local(pa, pb) => Some((*pa, *pb)),
        };
        match joint {
            JointSpec::Lock { .. } => world.add_lock(a, b),
            JointSpec::Hinge {
                pivot, axis_a, axis_b, ..
            } => {
                let (pa, pb) = local(world, pivot)?;
                world.add_hinge(a, pa, *axis_a, b, pb, *axis_b)
            }
            JointSpec::ConeTwist {
                pivot,
                axis_a,
                axis_b,
                swing,
                twist,
                ..
            } => {
                let (pivot_a, pivot_b) = local(world, pivot)?;
                world.add_cone_twist(
                    a,
                    b,
                    ConeTwistParams {
                        pivot_a,
                        pivot_b,
                        axis_a: *axis_a,
                        axis_b: *axis_b,
                        swing_limit: *swing,
                        twist_limit: *twist,
                    },
                )
            }
        }
    }

    pub fn id(&self) -> EntityId {
        self.id
    }

    pub fn sync_mode(&self) -> SyncMode {
        self.sync
    }

    /// Merge bodies in; same-named entries are overwritten.
    pub fn add_bodies<I, S>(&mut self, bodies: I)
    where
        I: IntoIterator<Item = (S, BodyHandle)>,
        S: Into<String>,
    {
        for (name, handle) in bodies {
            self.bodies.insert(name, handle);
        }
    }

    /// Merge constraints in; same-named entries are overwritten.
    pub fn add_constraints<I, S>(&mut self, constraints: I)
    where
        I: IntoIterator<Item = (S, ConstraintHandle)>,
        S: Into<String>,
    {
        for (name, handle) in constraints {
            self.constraints.insert(name, handle);
        }
    }

    /// Body handles in insertion order.
    pub fn get_bodies(&self) -> Vec<BodyHandle> {
        self.bodies.values().copied().collect()
    }

    /// Constraint handles in insertion order.
    pub fn get_constraints(&self) -> Vec<ConstraintHandle> {
        self.constraints.values().copied().collect()
    }

    pub fn bodies(&self) -> &NamedMap<BodyHandle> {
        &self.bodies
    }

    pub fn constraints(&self) -> &NamedMap<ConstraintHandle> {
        &self.constraints
    }

    pub fn body(&self, name: &str) -> Option<BodyHandle> {
        self.bodies.get(name).copied()
    }

    pub fn constraint(&self, name: &str) -> Option<ConstraintHandle> {
        self.constraints.get(name).copied()
    }

    pub fn contains_body(&self, handle: BodyHandle) -> bool {
        self.bodies.values().any(|h| *h == handle)
    }

    pub fn body_name(&self, handle: BodyHandle) -> Option<&str> {
        self.bodies.iter().find(|(_, h)| **h == handle).map(|(n, _)| n)
    }

    pub fn body_position(&self, world: &World, name: &str) -> Option<Vector3<f32>> {
        world.body(self.body(name)?).map(|b| b.position)
    }

    pub fn body_pose(&self, world: &World, name: &str) -> Option<Pose> {
        world.body(self.body(name)?).map(Pose::of)
    }

    pub fn snapshot(&self, name: &str) -> Option<&Pose> {
        self.snapshot.get(name)
    }

    /// The body whose center is nearest `point`, if strictly closer than
    /// `threshold`. Ties go to the earliest-added body.
    pub fn closest_body_to(
        &self,
        world: &World,
        point: &Vector3<f32>,
        threshold: f32,
    ) -> Option<(&str, BodyHandle)> {
        let mut best: Option<(&str, BodyHandle, f32)> = None;
        for (name, handle) in self.bodies.iter() {
            let Some(body) = world.body(*handle) else { continue };
            let distance = (body.position - point).norm();
            if best.map_or(true, |(_, _, d)| distance < d) {
                best = Some((name, *handle, distance));
            }
        }
        best.filter(|(_, _, d)| *d < threshold).map(|(n, h, _)| (n, h))
    }

    // -- Snapshot --

    pub fn record_initial_body_positions_and_orientations(&mut self, world: &World) {
        self.snapshot = self
            .bodies
            .iter()
            .filter_map(|(name, handle)| world.body(*handle).map(|b| (name.to_owned(), Pose::of(b))))
            .collect();
    }

    /// Teleport every snapshotted body back to its spawn pose and stop it.
    pub fn reset_bodies_to_initial_positions(&self, world: &mut World) {
        for (name, handle) in self.bodies.iter() {
            let Some(pose) = self.snapshot.get(name) else { continue };
            if let Some(body) = world.body_mut(*handle) {
                body.set_pose(pose.position, pose.orientation);
                body.stop();
            }
        }
    }

    // -- Kinematic helpers --

    fn targets(&self, part_names: &[&str]) -> Vec<BodyHandle> {
        if part_names.is_empty() {
            self.get_bodies()
        } else {
            part_names.iter().filter_map(|n| self.body(n)).collect()
        }
    }

    /// Impulse at the center of mass of the named parts, or of every part
    /// when `part_names` is empty. Unknown names are skipped.
    pub fn apply_impulse(&self, world: &mut World, part_names: &[&str], impulse: Vector3<f32>) {
        for handle in self.targets(part_names) {
            if let Some(body) = world.body_mut(handle) {
                body.apply_impulse(impulse);
            }
        }
    }

    /// Translate the named parts (all when empty) by `delta`.
    pub fn move_body(&self, world: &mut World, part_names: &[&str], delta: Vector3<f32>) {
        for handle in self.targets(part_names) {
            if let Some(body) = world.body_mut(handle) {
                body.position += delta;
            }
        }
    }

    // -- Visual sync --

    /// Write body poses into bound nodes, in each node's parent frame.
    pub fn update(&mut self, world: &World, bones_only: bool) {
        for binding in &self.bindings {
            let Some(handle) = self.bodies.get(&binding.body) else { continue };
            let Some(body) = world.body(*handle) else { continue };
            let Some(node) = self.node.node(binding.node) else { continue };
            if bones_only && !node.is_bone {
                continue;
            }
            let Some(parent_inverse) = self.node.parent_world_matrix(binding.node).try_inverse() else {
                continue;
            };
            let local = NodeTransform::from_matrix(&(parent_inverse * body.isometry().to_homogeneous()));
            self.node.set_local_transform(binding.node, local);
        }
    }

    /// Copy body poses straight into bound nodes.
    pub fn update_simple(&mut self, world: &World) {
        for binding in &self.bindings {
            let Some(handle) = self.bodies.get(&binding.body) else { continue };
            let Some(body) = world.body(*handle) else { continue };
            self.node.set_local_position(binding.node, body.position);
            self.node.set_local_orientation(binding.node, body.orientation);
        }
    }

    /// Sync by this entity's mode, then refresh debug visuals.
    pub fn sync(&mut self, world: &World) {
        match self.sync {
            SyncMode::Simple => self.update_simple(world),
            SyncMode::Skeleton => self.update(world, true),
        }
        self.update_debug_visuals(world);
    }

    // -- Debug visuals --

    /// Build one tinted shape per body, named after the body.
    pub fn create_debug_visuals<R: Rng>(&mut self, world: &World, rng: &mut R) {
        let mut visuals = VisualNode::new(format!("{}Debug", self.node.name()));
        for (name, handle) in self.bodies.iter() {
            let Some(body) = world.body(*handle) else { continue };
            let shape = match body.collider {
                Some(Collider::Sphere { radius }) => NodeShape::Sphere { radius },
                Some(Collider::Cuboid { half_extents }) => NodeShape::Cuboid { half_extents },
                None => NodeShape::Empty,
            };
            let id = visuals.add_child(VisualNode::ROOT, name, shape);
            let color = Rgb565::new(
                rng.random_range(0..32u8),
                rng.random_range(0..64u8),
                rng.random_range(0..32u8),
            );
            visuals.set_color(id, color);
            visuals.set_local_position(id, body.position);
            visuals.set_local_orientation(id, body.orientation);
        }
        self.debug_visuals = Some(visuals);
    }

    pub fn debug_visuals(&self) -> Option<&VisualNode> {
        self.debug_visuals.as_ref()
    }

    pub fn update_debug_visuals(&mut self, world: &World) {
        let Some(visuals) = self.debug_visuals.as_mut() else { return };
        for (name, handle) in self.bodies.iter() {
            let (Some(body), Some(id)) = (world.body(*handle), visuals.find(name)) else { continue };
            visuals.set_local_position(id, body.position);
            visuals.set_local_orientation(id, body.orientation);
        }
    }

    pub fn remove_debug_visuals(&mut self) {
        self.debug_visuals = None;
    }

    // -- Teardown --

    /// Remove every constraint, then every body, from the world.
    pub fn despawn(self, world: &mut World) {
        for handle in self.constraints.values() {
            world.remove_constraint(*handle);
        }
        for handle in self.bodies.values() {
            world.remove_body(*handle);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::physics::Collider;

    const EPSILON: f32 = 1e-4;

    fn approx_vec_eq(a: &Vector3<f32>, b: &Vector3<f32>) -> bool {
        (a - b).norm() < EPSILON
    }

    fn two_part_assembly() -> Assembly {
        let mut node = VisualNode::new("thing");
        node.add_child(VisualNode::ROOT, "top", NodeShape::Empty);
        node.add_child(VisualNode::ROOT, "bottom", NodeShape::Empty);
        Assembly::new(node)
            .with_body(
                "top",
                RigidBody::new(1.0)
                    .with_position(Vector3::new(0.0, 1.0, 0.0))
                    .with_collider(Collider::Sphere { radius: 0.2 }),
            )
            .with_body("bottom", RigidBody::new(1.0).with_position(Vector3::new(0.0, 0.0, 0.0)))
            .with_joint("glue", JointSpec::lock(BodyRef::part("top"), BodyRef::part("bottom")))
    }

    // -- NamedMap tests --

    #[test]
    fn test_named_map_overwrite_keeps_order() {
        let mut map = NamedMap::new();
        map.insert("a", 1);
        map.insert("b", 2);
        map.insert("a", 3);
        assert_eq!(map.iter().collect::<Vec<_>>(), vec![("a", &3), ("b", &2)]);
        assert_eq!(map.len(), 2);
    }

    // -- Spawn tests --

    #[test]
    fn test_spawn_registers_everything() {
        let mut world = World::new();
        let entity = PhysicalEntity::spawn(EntityId(1), two_part_assembly(), &mut world);
        assert_eq!(world.body_count(), 2);
        assert_eq!(world.constraint_count(), 1);
        assert_eq!(entity.get_bodies().len(), 2);
        assert!(entity.constraint("glue").is_some());
        assert!(entity.snapshot("top").is_some());
    }

    #[test]
    fn test_joint_with_missing_part_is_skipped() {
        let mut world = World::new();
        let assembly = two_part_assembly()
            .with_joint("dangling", JointSpec::lock(BodyRef::part("top"), BodyRef::part("ghost")));
        let entity = PhysicalEntity::spawn(EntityId(1), assembly, &mut world);
        assert!(entity.constraint("dangling").is_none());
        assert_eq!(world.constraint_count(), 1);
    }

    #[test]
    fn test_external_joint_endpoint() {
        let mut world = World::new();
        let anchor = world.add_body(RigidBody::new_static().with_position(Vector3::new(0.0, 2.0, 0.0)));
        let assembly = two_part_assembly()
            .with_joint("hook", JointSpec::lock(BodyRef::External(anchor), BodyRef::part("top")));
        let entity = PhysicalEntity::spawn(EntityId(1), assembly, &mut world);
        let c = world.constraint(entity.constraint("hook").unwrap()).unwrap();
        assert_eq!(c.body_a, anchor);
    }

    #[test]
    fn test_despawn_removes_bodies_and_constraints() {
        let mut world = World::new();
        let keep = world.add_body(RigidBody::new_static());
        let entity = PhysicalEntity::spawn(EntityId(1), two_part_assembly(), &mut world);
        entity.despawn(&mut world);
        assert_eq!(world.body_count(), 1);
        assert_eq!(world.constraint_count(), 0);
        assert!(world.contains_body(keep));
    }

    // -- Snapshot tests --

    #[test]
    fn test_reset_restores_snapshot_and_stops() {
        let mut world = World::new();
        world.set_gravity(Vector3::new(0.0, -9.81, 0.0));
        let entity = PhysicalEntity::spawn(EntityId(1), two_part_assembly(), &mut world);
        entity.apply_impulse(&mut world, &[], Vector3::new(3.0, 1.0, -2.0));
        for _ in 0..30 {
            world.step::<8>(1.0 / 60.0);
        }
        entity.reset_bodies_to_initial_positions(&mut world);
        for name in ["top", "bottom"] {
            let body = world.body(entity.body(name).unwrap()).unwrap();
            let snap = entity.snapshot(name).unwrap();
            assert_eq!(body.position, snap.position);
            assert_eq!(body.orientation, snap.orientation);
            assert_eq!(body.velocity, Vector3::zeros());
            assert_eq!(body.angular_velocity, Vector3::zeros());
        }
    }

    #[test]
    fn test_reset_skips_bodies_without_snapshot() {
        let mut world = World::new();
        let mut entity = PhysicalEntity::spawn(EntityId(1), two_part_assembly(), &mut world);
        let late = world.add_body(RigidBody::new(1.0).with_position(Vector3::new(5.0, 0.0, 0.0)));
        entity.add_bodies([("late", late)]);
        world.body_mut(late).unwrap().position.x = 7.0;
        entity.reset_bodies_to_initial_positions(&mut world);
        assert_eq!(world.body(late).unwrap().position.x, 7.0);
    }

    // -- Targeting tests --

    #[test]
    fn test_apply_impulse_targets_named_parts() {
        let mut world = World::new();
        let entity = PhysicalEntity::spawn(EntityId(1), two_part_assembly(), &mut world);
        entity.apply_impulse(&mut world, &["top", "nonexistent"], Vector3::new(1.0, 0.0, 0.0));
        let top = world.body(entity.body("top").unwrap()).unwrap();
        let bottom = world.body(entity.body("bottom").unwrap()).unwrap();
        assert!(approx_vec_eq(&top.velocity, &Vector3::x()));
        assert!(approx_vec_eq(&bottom.velocity, &Vector3::zeros()));
    }

    #[test]
    fn test_move_body_all_parts() {
        let mut world = World::new();
        let entity = PhysicalEntity::spawn(EntityId(1), two_part_assembly(), &mut world);
        entity.move_body(&mut world, &[], Vector3::new(0.0, 0.0, 2.0));
        assert!(approx_vec_eq(
            &entity.body_position(&world, "top").unwrap(),
            &Vector3::new(0.0, 1.0, 2.0)
        ));
        assert!(approx_vec_eq(
            &entity.body_position(&world, "bottom").unwrap(),
            &Vector3::new(0.0, 0.0, 2.0)
        ));
    }

    #[test]
    fn test_closest_body_threshold_is_strict() {
        let mut world = World::new();
        let entity = PhysicalEntity::spawn(EntityId(1), two_part_assembly(), &mut world);
        let (name, _) = entity.closest_body_to(&world, &Vector3::new(0.0, 0.9, 0.0), 0.5).unwrap();
        assert_eq!(name, "top");
        assert!(entity.closest_body_to(&world, &Vector3::new(0.0, 1.5, 0.0), 0.5).is_none());
        // Equidistant: first added wins
        let (name, _) = entity.closest_body_to(&world, &Vector3::new(0.0, 0.5, 0.0), 1.0).unwrap();
        assert_eq!(name, "top");
    }

    // -- Sync tests --

    #[test]
    fn test_update_simple_copies_pose() {
        let mut world = World::new();
        let mut entity = PhysicalEntity::spawn(EntityId(1), two_part_assembly(), &mut world);
        let q = UnitQuaternion::from_axis_angle(&Vector3::y_axis(), 0.8);
        world.body_mut(entity.body("top").unwrap()).unwrap().set_pose(Vector3::new(1.0, 2.0, 3.0), q);
        entity.update_simple(&world);
        let id = entity.node.find("top").unwrap();
        let local = entity.node.local(id).unwrap();
        assert_eq!(local.position, Vector3::new(1.0, 2.0, 3.0));
        assert_eq!(local.orientation, q);
    }

    #[test]
    fn test_update_expresses_pose_in_parent_frame() {
        let mut node = VisualNode::new("model");
        node.set_local_position(VisualNode::ROOT, Vector3::new(0.0, 1.0, 0.0));
        node.set_local_scale(VisualNode::ROOT, Vector3::repeat(2.0));
        node.add_bone(VisualNode::ROOT, "Hips", Vector3::zeros(), UnitQuaternion::identity());
        let assembly = Assembly::new(node)
            .with_sync(SyncMode::Skeleton)
            .with_body("pelvis", RigidBody::new(1.0).with_position(Vector3::new(2.0, 3.0, 0.0)))
            .with_binding("pelvis", Some("Hips"));
        let mut world = World::new();
        let mut entity = PhysicalEntity::spawn(EntityId(1), assembly, &mut world);
        entity.update(&world, true);
        let hips = entity.node.find("Hips").unwrap();
        // World (2,3,0) under a parent at (0,1,0) scaled by 2
        assert!(approx_vec_eq(&entity.node.local(hips).unwrap().position, &Vector3::new(1.0, 1.0, 0.0)));
        let world_matrix = entity.node.world_matrix(hips);
        assert!((world_matrix[(0, 3)] - 2.0).abs() < EPSILON);
        assert!((world_matrix[(1, 3)] - 3.0).abs() < EPSILON);
    }

    #[test]
    fn test_debug_visuals_follow_bodies() {
        use rand::SeedableRng;
        let mut rng = rand_chacha::ChaCha8Rng::seed_from_u64(3);
        let mut world = World::new();
        let mut entity = PhysicalEntity::spawn(EntityId(1), two_part_assembly(), &mut world);
        entity.create_debug_visuals(&world, &mut rng);
        world.body_mut(entity.body("top").unwrap()).unwrap().position = Vector3::new(4.0, 0.0, 0.0);
        entity.update_debug_visuals(&world);
        let visuals = entity.debug_visuals().unwrap();
        let id = visuals.find("top").unwrap();
        assert_eq!(visuals.local(id).unwrap().position, Vector3::new(4.0, 0.0, 0.0));
        assert_eq!(visuals.node(id).unwrap().shape, NodeShape::Sphere { radius: 0.2 });
    }
}
