//! Materials and material pairs.
//!
//! A [`Material`] is pure data: an id plus a fixed property record. A
//! [`MaterialPair`] augments an unordered pair of materials with friction
//! coefficients and the net-force formula. [`MaterialSet`] is the catalog,
//! keyed by id (materials) and by the smaller-id-first pair (pairs).

use std::collections::HashMap;
use std::sync::Arc;

use serde::{Deserialize, Serialize};

// ---------------------------------------------------------------------------
// Material
// ---------------------------------------------------------------------------

/// Fixed physical properties of a material.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct MaterialProps {
    /// <https://en.wikipedia.org/wiki/Brittleness>
    pub brittleness: f64,
    /// Coefficient of restitution.
    pub cor: f64,
    /// kg/m³.
    pub density: f64,
    /// -1 means never breaks.
    pub durability: i64,
    /// Specific heat capacity, J/(kg·K).
    pub heat_cap: f64,
    /// The temperature that can cause fire; zero means none.
    pub fire_point: f64,
}

/// A unique material. Handle it through an `Arc`; identity is the id.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Material {
    id: String,
    props: MaterialProps,
}

impl Material {
    /// Construct a material with the given id and properties.
    pub fn new(id: impl Into<String>, props: MaterialProps) -> Arc<Self> {
        Arc::new(Self {
            id: id.into(),
            props,
        })
    }

    /// The material's id.
    pub fn id(&self) -> &str {
        &self.id
    }

    /// The material's property record.
    pub fn props(&self) -> MaterialProps {
        self.props
    }
}

// ---------------------------------------------------------------------------
// MaterialPair
// ---------------------------------------------------------------------------

/// The interaction coefficients between two materials.
#[derive(Debug, Clone)]
pub struct MaterialPair {
    /// The two materials; ordered smaller id first on insertion.
    pub matter_a: Arc<Material>,
    /// See [`matter_a`](Self::matter_a).
    pub matter_b: Arc<Material>,
    /// Coefficient of static friction.
    pub scof: f64,
    /// Coefficient of kinetic friction.
    pub kcof: f64,
}

impl MaterialPair {
    /// The net force on an object after friction cancels part of the applied
    /// force.
    ///
    /// `natural` is the normal force on the contact, `app` the applied force;
    /// both must be zero or positive. The result may be negative when kinetic
    /// friction exceeds the applied force.
    pub fn net_force(&self, natural: f64, app: f64, moving: bool) -> f64 {
        let friction = if moving {
            self.kcof * natural
        } else {
            let friction = self.scof * natural;
            if app <= friction {
                return 0.0;
            }
            friction
        };
        app - friction
    }
}

// ---------------------------------------------------------------------------
// MaterialSet
// ---------------------------------------------------------------------------

/// A catalog of materials and the pairs between them.
#[derive(Debug, Default)]
pub struct MaterialSet {
    set: HashMap<String, Arc<Material>>,
    /// Keyed smaller id first.
    pairs: HashMap<(String, String), MaterialPair>,
}

impl MaterialSet {
    /// An empty catalog.
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a material.
    ///
    /// # Panics
    ///
    /// Panics if the id is empty or already present.
    pub fn add(&mut self, m: Arc<Material>) {
        assert!(!m.id.is_empty(), "material id cannot be empty");
        assert!(
            !self.set.contains_key(&m.id),
            "material {:?} already exists",
            m.id
        );
        self.set.insert(m.id.clone(), m);
    }

    /// Look up a material by id.
    pub fn get(&self, id: &str) -> Option<&Arc<Material>> {
        self.set.get(id)
    }

    /// Look up the pair between two materials, in either order.
    pub fn get_pair(&self, a: &Material, b: &Material) -> Option<&MaterialPair> {
        let key = if a.id <= b.id {
            (a.id.clone(), b.id.clone())
        } else {
            (b.id.clone(), a.id.clone())
        };
        self.pairs.get(&key)
    }

    /// Add a pair; the materials are reordered smaller id first.
    ///
    /// # Panics
    ///
    /// Panics if the pair already exists.
    pub fn add_pair(&mut self, mut pair: MaterialPair) {
        if pair.matter_a.id > pair.matter_b.id {
            std::mem::swap(&mut pair.matter_a, &mut pair.matter_b);
        }
        let key = (pair.matter_a.id.clone(), pair.matter_b.id.clone());
        assert!(
            !self.pairs.contains_key(&key),
            "the pair of materials {:?} and {:?} already exists",
            pair.matter_a.id,
            pair.matter_b.id
        );
        self.pairs.insert(key, pair);
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
