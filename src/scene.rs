//! Visual node trees and the scene-graph seam.
//!
//! A [`VisualNode`] is a flat arena of named nodes with parent links and
//! local transforms (position, orientation, non-uniform scale). The
//! name→index map is built as nodes are added, so per-frame lookups never
//! walk the tree. Rendering happens elsewhere: a [`SceneGraph`] implementation
//! receives nodes when entities spawn and despawn.

use std::collections::{BTreeMap, HashMap};

use embedded_graphics_core::pixelcolor::{Rgb565, WebColors};
use log::error;
use nalgebra::{Matrix3, Matrix4, Translation3, UnitQuaternion, Vector3};

use crate::entity::EntityId;

/// What a node draws, if anything.
#[derive(Debug, Clone, PartialEq)]
pub enum NodeShape {
    /// Transform-only node (groups, bones).
    Empty,
    Cuboid { half_extents: Vector3<f32> },
    Sphere { radius: f32 },
    /// Mesh supplied by the asset collaborator, by prop name.
    Prop(String),
}

/// Local transform of a node relative to its parent.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct NodeTransform {
    pub position: Vector3<f32>,
    pub orientation: UnitQuaternion<f32>,
    pub scale: Vector3<f32>,
}

impl Default for NodeTransform {
    fn default() -> Self {
        Self {
            position: Vector3::zeros(),
            orientation: UnitQuaternion::identity(),
            scale: Vector3::repeat(1.0),
        }
    }
}

impl NodeTransform {
    pub fn to_homogeneous(&self) -> Matrix4<f32> {
        Translation3::from(self.position).to_homogeneous()
            * self.orientation.to_homogeneous()
            * Matrix4::new_nonuniform_scaling(&self.scale)
    }

    /// Split an affine matrix into translation, rotation and per-axis scale.
    pub fn from_matrix(m: &Matrix4<f32>) -> Self {
        let position = Vector3::new(m[(0, 3)], m[(1, 3)], m[(2, 3)]);
        let linear: Matrix3<f32> = m.fixed_view::<3, 3>(0, 0).into_owned();
        let mut scale = Vector3::new(
            linear.column(0).norm(),
            linear.column(1).norm(),
            linear.column(2).norm(),
        );
        if linear.determinant() < 0.0 {
            scale.x = -scale.x;
        }
        let mut rotation = linear;
        for (i, s) in scale.iter().enumerate() {
            if s.abs() > 1e-12 {
                let column = rotation.column(i) / *s;
                rotation.set_column(i, &column);
            }
        }
        Self {
            position,
            orientation: UnitQuaternion::from_matrix(&rotation),
            scale,
        }
    }
}

/// One node in a [`VisualNode`] tree.
#[derive(Debug, Clone)]
pub struct Node {
    pub name: String,
    pub parent: Option<usize>,
    pub children: Vec<usize>,
    pub local: NodeTransform,
    pub shape: NodeShape,
    pub color: Rgb565,
    pub is_bone: bool,
    pub visible: bool,
}

/// A named node tree. Index 0 is the root.
#[derive(Debug, Clone)]
pub struct VisualNode {
    nodes: Vec<Node>,
    index: HashMap<String, usize>,
}

impl VisualNode {
    /// A tree holding a single empty root node.
    pub fn new(name: impl Into<String>) -> Self {
        Self::with_root(name, NodeShape::Empty)
    }

    pub fn with_root(name: impl Into<String>, shape: NodeShape) -> Self {
        let name = name.into();
        let mut index = HashMap::new();
        index.insert(name.clone(), 0);
        Self {
            nodes: vec![Node {
                name,
                parent: None,
                children: Vec::new(),
                local: NodeTransform::default(),
                shape,
                color: Rgb565::CSS_WHITE,
                is_bone: false,
                visible: true,
            }],
            index,
        }
    }

    pub const ROOT: usize = 0;

    /// Append a child node. The first node registered under a name wins
    /// name lookups.
    pub fn add_child(&mut self, parent: usize, name: impl Into<String>, shape: NodeShape) -> usize {
        let parent = if parent < self.nodes.len() {
            parent
        } else {
            error!("add_child: parent index {} out of range, attaching to root", parent);
            Self::ROOT
        };
        let name = name.into();
        let id = self.nodes.len();
        self.index.entry(name.clone()).or_insert(id);
        self.nodes.push(Node {
            name,
            parent: Some(parent),
            children: Vec::new(),
            local: NodeTransform::default(),
            shape,
            color: Rgb565::CSS_WHITE,
            is_bone: false,
            visible: true,
        });
        self.nodes[parent].children.push(id);
        id
    }

    /// Append a bone with a local rest pose.
    pub fn add_bone(
        &mut self,
        parent: usize,
        name: impl Into<String>,
        position: Vector3<f32>,
        orientation: UnitQuaternion<f32>,
    ) -> usize {
        let id = self.add_child(parent, name, NodeShape::Empty);
        let node = &mut self.nodes[id];
        node.is_bone = true;
        node.local.position = position;
        node.local.orientation = orientation;
        id
    }

    /// Copy another tree under `parent`, keeping its names and transforms.
    pub fn graft(&mut self, parent: usize, other: &VisualNode) -> usize {
        let mut remap = vec![0usize; other.nodes.len()];
        for (i, node) in other.nodes.iter().enumerate() {
            let new_parent = match node.parent {
                Some(p) => remap[p],
                None => parent,
            };
            let id = self.add_child(new_parent, node.name.clone(), node.shape.clone());
            let copy = &mut self.nodes[id];
            copy.local = node.local;
            copy.color = node.color;
            copy.is_bone = node.is_bone;
            copy.visible = node.visible;
            remap[i] = id;
        }
        remap[0]
    }

    pub fn find(&self, name: &str) -> Option<usize> {
        self.index.get(name).copied()
    }

    pub fn node(&self, id: usize) -> Option<&Node> {
        self.nodes.get(id)
    }

    pub fn node_mut(&mut self, id: usize) -> Option<&mut Node> {
        self.nodes.get_mut(id)
    }

    pub fn root(&self) -> &Node {
        &self.nodes[Self::ROOT]
    }

    pub fn name(&self) -> &str {
        &self.nodes[Self::ROOT].name
    }

    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    pub fn is_empty(&self) -> bool {
        false
    }

    pub fn nodes(&self) -> impl Iterator<Item = (usize, &Node)> {
        self.nodes.iter().enumerate()
    }

    pub fn local(&self, id: usize) -> Option<&NodeTransform> {
        self.nodes.get(id).map(|n| &n.local)
    }

    pub fn set_local_position(&mut self, id: usize, position: Vector3<f32>) {
        if let Some(node) = self.nodes.get_mut(id) {
            node.local.position = position;
        }
    }

    pub fn set_local_orientation(&mut self, id: usize, orientation: UnitQuaternion<f32>) {
        if let Some(node) = self.nodes.get_mut(id) {
            node.local.orientation = orientation;
        }
    }

    /// Zero components are ignored.
    pub fn set_local_scale(&mut self, id: usize, scale: Vector3<f32>) {
        if scale.iter().any(|s| *s == 0.0) {
            return;
        }
        if let Some(node) = self.nodes.get_mut(id) {
            node.local.scale = scale;
        }
    }

    pub fn set_local_transform(&mut self, id: usize, transform: NodeTransform) {
        if let Some(node) = self.nodes.get_mut(id) {
            node.local = transform;
        }
    }

    pub fn set_color(&mut self, id: usize, color: Rgb565) {
        if let Some(node) = self.nodes.get_mut(id) {
            node.color = color;
        }
    }

    /// Tint every node in the tree.
    pub fn set_color_all(&mut self, color: Rgb565) {
        for node in &mut self.nodes {
            node.color = color;
        }
    }

    /// World matrix of a node: the product of every local transform from the
    /// root down. The root's own local transform places the whole tree.
    pub fn world_matrix(&self, id: usize) -> Matrix4<f32> {
        let mut matrix = Matrix4::identity();
        let mut cursor = Some(id);
        while let Some(i) = cursor {
            let Some(node) = self.nodes.get(i) else { break };
            matrix = node.local.to_homogeneous() * matrix;
            cursor = node.parent;
        }
        matrix
    }

    /// World matrix of a node's parent (the root's parent is the identity).
    pub fn parent_world_matrix(&self, id: usize) -> Matrix4<f32> {
        match self.nodes.get(id).and_then(|n| n.parent) {
            Some(parent) => self.world_matrix(parent),
            None => Matrix4::identity(),
        }
    }

    /// World position and orientation of a named node.
    pub fn world_pose(&self, name: &str) -> Option<(Vector3<f32>, UnitQuaternion<f32>)> {
        let id = self.find(name)?;
        let t = NodeTransform::from_matrix(&self.world_matrix(id));
        Some((t.position, t.orientation))
    }
}

/// The displayed scene, owned by the rendering collaborator.
pub trait SceneGraph {
    /// Start displaying an entity's node tree.
    fn insert(&mut self, id: EntityId, node: &VisualNode);
    /// Stop displaying an entity. Returns `false` if it was not displayed.
    fn remove(&mut self, id: EntityId) -> bool;
    fn contains(&self, id: EntityId) -> bool;
    /// Called after an entity's node was re-derived from physics this tick.
    fn sync(&mut self, _id: EntityId, _node: &VisualNode) {}
}

/// In-memory scene that records which entities are displayed, by root name.
#[derive(Debug, Default, Clone)]
pub struct RecordingScene {
    displayed: BTreeMap<EntityId, String>,
    syncs: u64,
}

impl RecordingScene {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.displayed.len()
    }

    pub fn is_empty(&self) -> bool {
        self.displayed.is_empty()
    }

    /// Root names of the displayed entities.
    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.displayed.values().map(String::as_str)
    }

    pub fn sync_count(&self) -> u64 {
        self.syncs
    }
}

impl SceneGraph for RecordingScene {
    fn insert(&mut self, id: EntityId, node: &VisualNode) {
        self.displayed.insert(id, node.name().to_owned());
    }

    fn remove(&mut self, id: EntityId) -> bool {
        self.displayed.remove(&id).is_some()
    }

    fn contains(&self, id: EntityId) -> bool {
        self.displayed.contains_key(&id)
    }

    fn sync(&mut self, _id: EntityId, _node: &VisualNode) {
        self.syncs += 1;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const EPSILON: f32 = 1e-4;

    fn approx_vec_eq(a: &Vector3<f32>, b: &Vector3<f32>) -> bool {
        (a - b).norm() < EPSILON
    }

    #[test]
    fn test_find_by_name() {
        let mut node = VisualNode::new("root");
        let arm = node.add_child(VisualNode::ROOT, "arm", NodeShape::Empty);
        let hand = node.add_child(arm, "hand", NodeShape::Sphere { radius: 0.1 });
        assert_eq!(node.find("root"), Some(0));
        assert_eq!(node.find("hand"), Some(hand));
        assert_eq!(node.find("missing"), None);
        assert_eq!(node.node(hand).unwrap().parent, Some(arm));
    }

    #[test]
    fn test_duplicate_name_keeps_first() {
        let mut node = VisualNode::new("root");
        let first = node.add_child(VisualNode::ROOT, "pin", NodeShape::Empty);
        node.add_child(VisualNode::ROOT, "pin", NodeShape::Empty);
        assert_eq!(node.find("pin"), Some(first));
    }

    #[test]
    fn test_world_matrix_chains_parents() {
        let mut node = VisualNode::new("root");
        node.set_local_position(VisualNode::ROOT, Vector3::new(1.0, 0.0, 0.0));
        node.set_local_orientation(
            VisualNode::ROOT,
            UnitQuaternion::from_axis_angle(&Vector3::z_axis(), core::f32::consts::FRAC_PI_2),
        );
        let child = node.add_child(VisualNode::ROOT, "child", NodeShape::Empty);
        node.set_local_position(child, Vector3::new(1.0, 0.0, 0.0));
        let (position, _) = node.world_pose("child").unwrap();
        assert!(approx_vec_eq(&position, &Vector3::new(1.0, 1.0, 0.0)), "Got {:?}", position);
    }

    #[test]
    fn test_decompose_round_trip() {
        let t = NodeTransform {
            position: Vector3::new(1.0, -2.0, 3.0),
            orientation: UnitQuaternion::from_euler_angles(0.3, -0.2, 1.1),
            scale: Vector3::new(1.5, 3.0, 1.5),
        };
        let back = NodeTransform::from_matrix(&t.to_homogeneous());
        assert!(approx_vec_eq(&back.position, &t.position));
        assert!(approx_vec_eq(&back.scale, &t.scale));
        assert!(back.orientation.angle_to(&t.orientation) < 1e-3);
    }

    #[test]
    fn test_set_scale_zero_ignored() {
        let mut node = VisualNode::new("root");
        node.set_local_scale(VisualNode::ROOT, Vector3::new(0.0, 1.0, 1.0));
        assert_eq!(node.local(VisualNode::ROOT).unwrap().scale, Vector3::repeat(1.0));
    }

    #[test]
    fn test_graft_keeps_names() {
        let mut jaw = VisualNode::with_root("firstPress", NodeShape::Cuboid { half_extents: Vector3::repeat(1.0) });
        jaw.set_color(VisualNode::ROOT, Rgb565::CSS_BLACK);
        let mut press = VisualNode::new("press");
        let id = press.graft(VisualNode::ROOT, &jaw);
        assert_eq!(press.find("firstPress"), Some(id));
        assert_eq!(press.node(id).unwrap().color, Rgb565::CSS_BLACK);
    }

    #[test]
    fn test_recording_scene() {
        let mut scene = RecordingScene::new();
        let node = VisualNode::new("dummy");
        scene.insert(EntityId(7), &node);
        assert!(scene.contains(EntityId(7)));
        assert_eq!(scene.names().collect::<Vec<_>>(), vec!["dummy"]);
        assert!(scene.remove(EntityId(7)));
        assert!(!scene.remove(EntityId(7)));
    }
}
