//! Prop lookup seam for the asset-loading collaborator.

use std::collections::HashMap;

use nalgebra::Vector3;

use crate::scene::{NodeShape, VisualNode};

/// A loaded (or placeholder) prop: its visual tree and the full size of its
/// axis-aligned bounding box.
#[derive(Debug, Clone)]
pub struct PropAsset {
    pub node: VisualNode,
    pub dimensions: Vector3<f32>,
}

impl PropAsset {
    /// Unit-cube stand-in used while the real mesh loads.
    pub fn placeholder(name: &str) -> Self {
        Self::cuboid(name, Vector3::repeat(1.0))
    }

    /// A box-shaped prop of the given full dimensions.
    pub fn cuboid(name: &str, dimensions: Vector3<f32>) -> Self {
        Self {
            node: VisualNode::with_root(
                name,
                NodeShape::Cuboid {
                    half_extents: dimensions / 2.0,
                },
            ),
            dimensions,
        }
    }
}

pub trait AssetProvider {
    /// Resolve a prop by logical name. May hand out a placeholder
    /// synchronously and swap in the real mesh later.
    fn prop(&self, name: &str) -> PropAsset;
}

/// Registered props by name; unknown names resolve to a placeholder.
#[derive(Debug, Default, Clone)]
pub struct PropCatalog {
    props: HashMap<String, PropAsset>,
}

impl PropCatalog {
    pub fn new() -> Self {
        Self::default()
    }

    /// Box-shaped stand-ins for every projectile and melee weapon, sized like
    /// the shipped meshes.
    pub fn with_builtin_props() -> Self {
        let mut catalog = Self::new();
        for (name, dims) in [
            ("arrow", [0.05, 0.05, 0.8]),
            ("banana", [0.2, 0.08, 0.08]),
            ("bullet", [0.03, 0.08, 0.03]),
            ("chair", [0.5, 0.9, 0.5]),
            ("cybertruck", [2.0, 1.9, 5.8]),
            ("dagger", [0.3, 0.03, 0.06]),
            ("grenade", [0.08, 0.12, 0.08]),
            ("mars", [0.6, 0.6, 0.6]),
            ("missile", [0.15, 0.15, 1.2]),
            ("poop", [0.15, 0.12, 0.15]),
            ("spear", [0.04, 1.6, 0.04]),
            ("sword", [0.1, 1.0, 0.03]),
            ("syringe", [0.03, 0.15, 0.03]),
            ("venusStatue", [0.6, 0.4, 0.3]),
            ("baseballBat", [0.07, 0.07, 0.9]),
        ] {
            catalog.register(name, PropAsset::cuboid(name, Vector3::from(dims)));
        }
        catalog
    }

    pub fn register(&mut self, name: impl Into<String>, asset: PropAsset) {
        self.props.insert(name.into(), asset);
    }

    pub fn contains(&self, name: &str) -> bool {
        self.props.contains_key(name)
    }
}

impl AssetProvider for PropCatalog {
    fn prop(&self, name: &str) -> PropAsset {
        match self.props.get(name) {
            Some(asset) => asset.clone(),
            None => {
                log::debug!("prop {:?} not registered, using placeholder", name);
                PropAsset::placeholder(name)
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_unknown_prop_is_placeholder() {
        let catalog = PropCatalog::new();
        let asset = catalog.prop("anvil");
        assert_eq!(asset.dimensions, Vector3::repeat(1.0));
        assert_eq!(asset.node.name(), "anvil");
    }

    #[test]
    fn test_builtin_props_registered() {
        let catalog = PropCatalog::with_builtin_props();
        assert!(catalog.contains("banana"));
        assert!(catalog.contains("baseballBat"));
        let spear = catalog.prop("spear");
        assert!(spear.dimensions.y > spear.dimensions.x);
    }
}
