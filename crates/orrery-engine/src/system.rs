//! Inter-system translation tables.
//!
//! Objects that do not share a main anchor can only be related through a
//! [`StarSystem`]: a table attached to a root object mapping peer roots to
//! the translation between the two frames. [`Object::rel_pos`] searches
//! these tables recursively (with a visited set, so cyclic links terminate)
//! to splice two anchor chains together.
//!
//! [`Object::rel_pos`]: crate::object::Object::rel_pos

use std::collections::BTreeMap;
use std::sync::{Arc, Weak};

use orrery_math::Vec3;
use parking_lot::RwLock;
use uuid::Uuid;

use crate::object::Object;

/// The translation table of one root object.
#[derive(Default)]
pub struct StarSystem {
    /// Peer root → (handle, translation from this root to the peer).
    anchor_pos: RwLock<BTreeMap<Uuid, (Weak<Object>, Vec3)>>,
}

impl StarSystem {
    /// An empty table.
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    /// Record that `peer`'s frame sits at `offset` from this system's root.
    pub fn link(&self, peer: &Arc<Object>, offset: Vec3) {
        self.anchor_pos
            .write()
            .insert(peer.id(), (Arc::downgrade(peer), offset));
    }

    /// Remove the link to `peer_id`. Returns whether a link existed.
    pub fn unlink(&self, peer_id: Uuid) -> bool {
        self.anchor_pos.write().remove(&peer_id).is_some()
    }

    /// Direct translation to `peer_id`, if linked.
    pub(crate) fn offset_to(&self, peer_id: Uuid) -> Option<Vec3> {
        self.anchor_pos.read().get(&peer_id).map(|(_, p)| *p)
    }

    /// Snapshot of all links, in id order.
    pub(crate) fn links(&self) -> Vec<(Weak<Object>, Vec3)> {
        self.anchor_pos.read().values().cloned().collect()
    }
}
