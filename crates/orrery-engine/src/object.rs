//! Objects, the anchor tree, and the double-buffered per-tick state machine.
//!
//! Every object stores its position, velocity, and heading *relative to its
//! anchor* — the parent node in a tree of reference frames rooted at the
//! engine's immovable main anchor. Each simulation tick reads the current
//! status (own plus anchors') and stages a proposed next status; the commit
//! phase adopts next into current. Two `RwLock`s per object keep the two
//! buffers independently lockable, and every anchor-chain walk releases a
//! node's lock before taking its parent's, so chains never deadlock against
//! each other.
//!
//! The gravity side of an object lives next to the current status: its own
//! [`GravityField`], a ring of up to 16 historical snapshots indexed by a
//! log₂ distance bucket (the retarded field seen from far away is the field
//! this object had long ago), and the `passed_gravity` map of foreign
//! snapshots delivered by gravity waves.

use std::collections::{BTreeMap, HashSet};
use std::fmt;
use std::sync::{Arc, Weak};

use orrery_math::{Bitset, Vec3};
use parking_lot::{Mutex, RwLock};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::block::Block;
use crate::field::GravityField;
use crate::kinematics::{Kinematics, C_SQ};
use crate::pool::Pool;
use crate::system::StarSystem;

/// Number of retarded-field history slots per object.
pub(crate) const HISTORY_LEN: usize = 16;

/// Seconds between shifts of the history ring.
const HISTORY_UPDATE_INTERVAL: f64 = 1.0;

// ---------------------------------------------------------------------------
// ObjKind
// ---------------------------------------------------------------------------

/// What an object is. Fixed at creation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ObjKind {
    /// Ships, stations, probes.
    ManMade,
    /// Stars, planets, asteroids.
    Natural,
    /// Creatures.
    Living,
}

impl ObjKind {
    /// Whether a position change alone is field news worth a gravity wave.
    /// Natural bodies drift and drag their wells with them; man-made and
    /// living objects only matter when their mass changes.
    pub(crate) fn emits_on_move(self) -> bool {
        matches!(self, ObjKind::Natural)
    }
}

impl fmt::Display for ObjKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            ObjKind::ManMade => "man-made",
            ObjKind::Natural => "natural",
            ObjKind::Living => "living",
        })
    }
}

// ---------------------------------------------------------------------------
// Status buffers
// ---------------------------------------------------------------------------

/// One buffer of an object's simulated state, in the anchor's frame.
#[derive(Clone, Default)]
pub(crate) struct ObjStatus {
    /// Parent frame; `None` only for the main anchor.
    pub anchor: Option<Weak<Object>>,
    /// Objects whose anchor is this object.
    pub children: Vec<Weak<Object>>,
    /// Building blocks, in insertion order.
    pub blocks: Vec<Arc<dyn Block>>,
    /// Gravity center in the object's local frame.
    pub gcenter: Vec3,
    /// Cached total mass of the blocks.
    pub mass: f64,
    /// Position relative to the anchor.
    pub pos: Vec3,
    /// Velocity relative to the anchor.
    pub velocity: Vec3,
    /// Euler angles (pitch, yaw, roll) relative to the anchor.
    pub angle: Vec3,
    /// Angular velocity.
    pub head_vel: Vec3,
}

/// Gravity bookkeeping, updated only at commit under the write lock.
pub(crate) struct GravityState {
    pub field: GravityField,
    /// `history[0]` is the most recent snapshot; slot `i` ages at half the
    /// rate of slot `i-1`.
    pub history: Vec<Option<GravityField>>,
    /// Which slots have shifted this epoch.
    pub update_mask: Bitset,
    /// Countdown to the next ring shift.
    pub update_cd: f64,
    /// Field position (local) and mass at the last wave emission.
    pub last_emitted: Option<(Vec3, f64)>,
}

pub(crate) struct CurState {
    pub st: ObjStatus,
    pub grav: GravityState,
}

pub(crate) struct NextState {
    pub st: ObjStatus,
    /// Deferred calls bound at commit time (block `set_object` hooks).
    pub calls: Vec<Box<dyn FnOnce() + Send + Sync>>,
}

/// Field-change notice produced by a commit; the engine turns it into a
/// gravity wave.
pub(crate) struct FieldEmission {
    /// Mass carried by the snapshot.
    pub mass: f64,
    /// Mass used to size the wave's reach. On a mass *drop* this is the old
    /// mass: the news that a field weakened must travel as far as the old
    /// field reached.
    pub range_mass: f64,
    /// Source radius carried by the snapshot.
    pub radius: f64,
    /// Gravity center in the sender's local frame.
    pub gcenter: Vec3,
}

// ---------------------------------------------------------------------------
// Object
// ---------------------------------------------------------------------------

/// A rigid object in the anchor tree.
///
/// Created by [`Engine::new_object`](crate::Engine::new_object); the id is a
/// time-ordered v7 UUID and never changes.
pub struct Object {
    id: Uuid,
    kind: ObjKind,
    kin: Kinematics,
    pub(crate) cur: RwLock<CurState>,
    pub(crate) next: RwLock<NextState>,
    /// Application-force accumulator, cleared at tick start. Blocks write it
    /// through [`Object::apply_force`] during the owner's tick.
    tick_force: Mutex<Vec3>,
    /// Foreign gravity snapshots currently affecting this receiver, keyed by
    /// sender. Written by wave callbacks during the event phase.
    passed_gravity: Mutex<BTreeMap<Uuid, Arc<GravityField>>>,
    /// Inter-system translation table; only meaningful on root objects.
    system: RwLock<Option<Arc<StarSystem>>>,
}

static VISITED_POOL: Pool<HashSet<Uuid>> = Pool::new();

/// Walk anchors from `start` to the root, handing each node's current status
/// to `f`. Each node's lock is released before its parent's is taken.
pub(crate) fn walk_chain(start: Option<Arc<Object>>, mut f: impl FnMut(&ObjStatus)) {
    let mut node = start;
    while let Some(o) = node {
        let cur = o.cur.read();
        f(&cur.st);
        let parent = cur.st.anchor.as_ref().and_then(Weak::upgrade);
        drop(cur);
        node = parent;
    }
}

impl Object {
    pub(crate) fn new(id: Uuid, kind: ObjKind, kin: Kinematics, status: ObjStatus) -> Arc<Self> {
        Arc::new(Self {
            id,
            kind,
            kin,
            cur: RwLock::new(CurState {
                st: status.clone(),
                grav: GravityState {
                    field: GravityField::default(),
                    history: vec![None; HISTORY_LEN],
                    update_mask: Bitset::with_capacity(HISTORY_LEN),
                    update_cd: 0.0,
                    last_emitted: None,
                },
            }),
            next: RwLock::new(NextState {
                st: status,
                calls: Vec::new(),
            }),
            tick_force: Mutex::new(Vec3::ZERO),
            passed_gravity: Mutex::new(BTreeMap::new()),
            system: RwLock::new(None),
        })
    }

    /// The object's id; never changes.
    #[inline]
    pub fn id(&self) -> Uuid {
        self.id
    }

    /// The object's kind; fixed at creation.
    #[inline]
    pub fn kind(&self) -> ObjKind {
        self.kind
    }

    /// This object's anchor, or `None` for the main anchor.
    pub fn anchor(&self) -> Option<Arc<Object>> {
        self.cur.read().st.anchor.as_ref().and_then(Weak::upgrade)
    }

    /// The objects currently anchored to this one.
    pub fn children(&self) -> Vec<Arc<Object>> {
        self.cur
            .read()
            .st
            .children
            .iter()
            .filter_map(Weak::upgrade)
            .collect()
    }

    /// The position relative to the anchor.
    pub fn pos(&self) -> Vec3 {
        self.cur.read().st.pos
    }

    /// Stage a new position relative to the anchor.
    pub fn set_pos(&self, pos: Vec3) {
        self.next.write().st.pos = pos;
    }

    /// The velocity relative to the anchor.
    pub fn velocity(&self) -> Vec3 {
        self.cur.read().st.velocity
    }

    /// Stage a new velocity relative to the anchor.
    pub fn set_velocity(&self, velocity: Vec3) {
        self.next.write().st.velocity = velocity;
    }

    /// The rotation angles.
    pub fn angle(&self) -> Vec3 {
        self.cur.read().st.angle
    }

    /// Stage new rotation angles.
    pub fn set_angle(&self, angle: Vec3) {
        self.next.write().st.angle = angle;
    }

    /// The angular velocity vector.
    pub fn heading_vel(&self) -> Vec3 {
        self.cur.read().st.head_vel
    }

    /// Stage a new angular velocity vector.
    pub fn set_heading_vel(&self, v: Vec3) {
        self.next.write().st.head_vel = v;
    }

    /// The staged block list.
    pub fn blocks(&self) -> Vec<Arc<dyn Block>> {
        self.next.read().st.blocks.clone()
    }

    /// Replace the block list. `Block::set_object` is bound at commit time.
    pub fn set_blocks(self: &Arc<Self>, blocks: Vec<Arc<dyn Block>>) {
        let weak = Arc::downgrade(self);
        let bound = blocks.clone();
        let mut next = self.next.write();
        next.calls.push(Box::new(move || {
            if let Some(o) = weak.upgrade() {
                for b in &bound {
                    b.set_object(&o);
                }
            }
        }));
        next.st.blocks = blocks;
    }

    /// Append a block. `Block::set_object` is bound at commit time.
    pub fn add_block(self: &Arc<Self>, block: Arc<dyn Block>) {
        let weak = Arc::downgrade(self);
        let bound = block.clone();
        let mut next = self.next.write();
        next.calls.push(Box::new(move || {
            if let Some(o) = weak.upgrade() {
                bound.set_object(&o);
            }
        }));
        next.st.blocks.push(block);
    }

    /// Remove a block by identity. Order is not preserved.
    pub fn remove_block(&self, target: &Arc<dyn Block>) {
        let mut next = self.next.write();
        if let Some(i) = next
            .st
            .blocks
            .iter()
            .position(|b| Arc::ptr_eq(b, target))
        {
            next.st.blocks.swap_remove(i);
        }
    }

    /// Accumulate an application force for the current tick. Only meaningful
    /// from block `tick` callbacks; the accumulator is cleared when the
    /// owner's tick starts.
    pub fn apply_force(&self, force: Vec3) {
        *self.tick_force.lock() += force;
    }

    /// The force accumulated so far this tick.
    pub fn tick_force(&self) -> Vec3 {
        *self.tick_force.lock()
    }

    /// Set the radius of this object's gravity field.
    pub fn set_radius(&self, radius: f64) {
        self.cur.write().grav.field.set_radius(radius);
    }

    /// Seed every history slot with the current field. Useful when placing a
    /// long-lived body whose field should already be old news everywhere.
    pub fn fill_gfields(&self) {
        let mut cur = self.cur.write();
        let field = cur.grav.field;
        for slot in cur.grav.history.iter_mut() {
            *slot = Some(field);
        }
    }

    /// A copy of this object's own gravity field.
    pub fn gravity_field(&self) -> GravityField {
        self.cur.read().grav.field
    }

    /// This object's total mass including all children.
    pub fn mass(&self) -> f64 {
        let cur = self.cur.read();
        let mut mass = cur.st.mass;
        for c in &cur.st.children {
            if let Some(c) = c.upgrade() {
                mass += c.mass();
            }
        }
        mass
    }

    /// The combined gravity center and mass of this object and its children,
    /// in this object's local frame.
    pub fn gravity_center_and_mass(&self) -> (Vec3, f64) {
        let cur = self.cur.read();
        let mut center = cur.st.gcenter;
        let mut mass = cur.st.mass;
        for c in &cur.st.children {
            let Some(c) = c.upgrade() else { continue };
            let (g, m) = c.gravity_center_and_mass();
            mass += m;
            if mass == 0.0 {
                center = g;
            } else {
                center += (g - center) * (m / mass);
            }
        }
        (center, mass)
    }

    /// The combined gravity center of this object and its children.
    pub fn gravity_center(&self) -> Vec3 {
        self.gravity_center_and_mass().0
    }

    /// The effective gravity acceleration of this object at `pos` (relative
    /// to this object's origin), resolved against the retarded-field history.
    ///
    /// Queries beyond the history ring return zero: at the configured
    /// resolution the field there does not matter.
    pub fn gravity_field_at(&self, pos: Vec3) -> Vec3 {
        Self::gravity_field_at_locked(&self.cur.read(), pos)
    }

    fn gravity_field_at_locked(state: &CurState, pos: Vec3) -> Vec3 {
        let field = &state.grav.field;
        let radius = field.radius();
        if pos.sq_len() < radius * radius * 4.0 {
            return field.field_at(pos);
        }
        // Retarded-field bucket: positions ~2^(2i) light-seconds away see the
        // field this object had ~2^(2i) seconds ago.
        let exp = ((pos - field.pos()).sq_len() / C_SQ).log2().floor();
        let i = (exp as i32) / 2;
        if i < 0 {
            return field.field_at(pos);
        }
        let i = i as usize;
        if i >= state.grav.history.len() {
            return Vec3::ZERO;
        }
        match &state.grav.history[i] {
            Some(g) => g.field_at(pos),
            None => Vec3::ZERO,
        }
    }

    /// The reciprocal Lorentz factor of this object relative to the root:
    /// the product of `ReLor(v²)` along the anchor chain.
    pub fn re_lorentz_factor(&self) -> f64 {
        let cur = self.cur.read();
        if cur.st.anchor.is_none() {
            return 1.0;
        }
        let own = self.kin.re_lorentz_factor_sq(cur.st.velocity.sq_len());
        let anchor = cur.st.anchor.as_ref().and_then(Weak::upgrade);
        drop(cur);
        own * anchor.map_or(1.0, |a| a.re_lorentz_factor())
    }

    /// The delta time in this object's frame relative to the root, given the
    /// root's delta time `dt`.
    pub fn proper_time(&self, dt: f64) -> f64 {
        dt / self.re_lorentz_factor()
    }

    /// Re-parent this object onto `anchor`, recomputing position and
    /// velocity so the absolute state is unchanged (velocity composes
    /// relativistically along both chains).
    ///
    /// Attaching to the current anchor is a no-op. Must not be called from
    /// within this object's own tick.
    ///
    /// # Panics
    ///
    /// Panics when called on the main anchor.
    pub fn attach_to(self: &Arc<Self>, anchor: &Arc<Object>) {
        let (old, p, v) = {
            let cur = self.cur.read();
            let Some(old_weak) = cur.st.anchor.clone() else {
                panic!("cannot re-parent the main anchor");
            };
            let old = old_weak
                .upgrade()
                .expect("current anchor no longer exists");
            if Arc::ptr_eq(&old, anchor) {
                return;
            }

            let anchor_cur = anchor.cur.read();
            let mut p = cur.st.pos - anchor_cur.st.pos;
            let mut v = cur.st.velocity;
            let mut v2 = anchor_cur.st.velocity;
            let anchor_parent = anchor_cur.st.anchor.as_ref().and_then(Weak::upgrade);
            drop(anchor_cur);

            let kin = self.kin;
            walk_chain(Some(old.clone()), |st| {
                p += st.pos;
                v = v * kin.re_lorentz_factor_sq(st.velocity.sq_len()) + st.velocity;
            });
            walk_chain(anchor_parent, |st| {
                p -= st.pos;
                v2 = v2 * kin.re_lorentz_factor_sq(st.velocity.sq_len()) + st.velocity;
            });
            v -= v2;
            (old, p, v)
        };

        {
            let mut next = self.next.write();
            next.st.anchor = Some(Arc::downgrade(anchor));
            next.st.pos = p;
            next.st.velocity = v;
        }
        // Parent updates are taken one lock at a time; two objects
        // re-parenting toward each other cannot deadlock.
        old.remove_child_next(self);
        anchor.add_child_next(self);
    }

    fn add_child_next(&self, child: &Arc<Object>) {
        self.next.write().st.children.push(Arc::downgrade(child));
    }

    fn remove_child_next(&self, child: &Arc<Object>) {
        let mut next = self.next.write();
        let target = Arc::as_ptr(child);
        if let Some(i) = next.st.children.iter().position(|w| w.as_ptr() == target) {
            next.st.children.swap_remove(i);
        }
    }

    /// Engine-side child registration at creation/removal time: both buffers
    /// change at once. Callers hold the engine write lock; no tick runs.
    pub(crate) fn add_child_direct(&self, child: &Arc<Object>) {
        self.cur.write().st.children.push(Arc::downgrade(child));
        self.next.write().st.children.push(Arc::downgrade(child));
    }

    pub(crate) fn remove_child_direct(&self, child: &Arc<Object>) {
        let target = Arc::as_ptr(child);
        let mut cur = self.cur.write();
        cur.st.children.retain(|w| w.as_ptr() != target);
        drop(cur);
        let mut next = self.next.write();
        next.st.children.retain(|w| w.as_ptr() != target);
    }

    /// Commit the staged child list on a never-ticked root. The main anchor
    /// is immovable, so nothing else of its next status may be adopted.
    pub(crate) fn sync_children(&self) {
        let next = self.next.read();
        let children = next.st.children.clone();
        drop(next);
        self.cur.write().st.children = children;
    }

    /// The root of this object's anchor chain.
    pub fn main_anchor(self: &Arc<Self>) -> Arc<Object> {
        let mut m = self.clone();
        loop {
            let parent = m.cur.read().st.anchor.as_ref().and_then(Weak::upgrade);
            match parent {
                Some(n) => m = n,
                None => return m,
            }
        }
    }

    /// The position relative to the main anchor.
    pub fn abs_pos(&self) -> Vec3 {
        let cur = self.cur.read();
        let mut p = cur.st.pos;
        let anchor = cur.st.anchor.as_ref().and_then(Weak::upgrade);
        drop(cur);
        walk_chain(anchor, |st| p += st.pos);
        p
    }

    /// [`abs_pos`](Self::abs_pos) and [`main_anchor`](Self::main_anchor) in
    /// one traversal.
    pub fn abs_pos_and_root(self: &Arc<Self>) -> (Vec3, Arc<Object>) {
        let mut m = self.clone();
        let mut p = m.cur.read().st.pos;
        loop {
            let parent = m.cur.read().st.anchor.as_ref().and_then(Weak::upgrade);
            match parent {
                Some(n) => {
                    p += n.cur.read().st.pos;
                    m = n;
                }
                None => return (p, m),
            }
        }
    }

    /// The velocity relative to the main anchor, composed relativistically
    /// up the chain: `v := v·ReLor(a.v²) + a.v` for each anchor `a`.
    pub fn abs_velocity(&self) -> Vec3 {
        let cur = self.cur.read();
        let mut v = cur.st.velocity;
        let anchor = cur.st.anchor.as_ref().and_then(Weak::upgrade);
        drop(cur);
        let kin = self.kin;
        walk_chain(anchor, |st| {
            v = v * kin.re_lorentz_factor_sq(st.velocity.sq_len()) + st.velocity;
        });
        v
    }

    /// The displacement from this object to `other` (`other` − `self`).
    ///
    /// Objects under different main anchors are related through the roots'
    /// [`StarSystem`] tables.
    ///
    /// # Panics
    ///
    /// Panics if no chain of system links relates the two roots.
    pub fn rel_pos(self: &Arc<Self>, other: &Arc<Object>) -> Vec3 {
        let (p, m) = self.abs_pos_and_root();
        let (q, n) = other.abs_pos_and_root();
        if Arc::ptr_eq(&m, &n) {
            return q - p;
        }
        let mut visited = VISITED_POOL.get();
        visited.clear();
        let found = m.find_rel_pos(&n, &mut visited);
        VISITED_POOL.put(visited);
        match found {
            Some(pos) => pos + q - p,
            None => panic!("rel_pos called on two unrelated objects"),
        }
    }

    fn find_rel_pos(
        self: &Arc<Self>,
        target: &Arc<Object>,
        visited: &mut HashSet<Uuid>,
    ) -> Option<Vec3> {
        assert!(
            self.cur.read().st.anchor.is_none(),
            "find_rel_pos must start from a root object"
        );
        if !visited.insert(self.id) {
            return None;
        }
        let system = self.system.read().clone()?;
        if let Some(offset) = system.offset_to(target.id) {
            return Some(offset);
        }
        for (peer, offset) in system.links() {
            let Some(peer) = peer.upgrade() else { continue };
            if let Some(pos) = peer.find_rel_pos(target, visited) {
                return Some(pos + offset);
            }
        }
        None
    }

    /// Attach an inter-system translation table. Only meaningful on roots.
    pub fn set_system(&self, system: Option<Arc<StarSystem>>) {
        *self.system.write() = system;
    }

    /// This object's translation table, if any.
    pub fn system(&self) -> Option<Arc<StarSystem>> {
        self.system.read().clone()
    }

    /// Rotate `p` by this object's angles about its gravity center.
    pub fn rotate_pos(&self, p: Vec3) -> Vec3 {
        let cur = self.cur.read();
        (p - cur.st.gcenter).rotated_xyz(cur.st.angle) + cur.st.gcenter
    }

    /// The foreign snapshot from `sender` currently affecting this receiver.
    pub fn passed_gravity_from(&self, sender: Uuid) -> Option<Arc<GravityField>> {
        self.passed_gravity.lock().get(&sender).cloned()
    }

    /// Install (or replace) the snapshot from `sender`. A replaced snapshot
    /// drops its reference here.
    pub(crate) fn install_passed_gravity(&self, sender: Uuid, snapshot: Arc<GravityField>) {
        self.passed_gravity.lock().insert(sender, snapshot);
    }

    pub(crate) fn purge_passed_gravity(&self, sender: Uuid) {
        self.passed_gravity.lock().remove(&sender);
    }

    // -- tick ---------------------------------------------------------------

    /// Advance this object by `dt`, staging the result in the next-status
    /// buffer. Runs concurrently with every other object's tick; only this
    /// object's next status is written.
    pub(crate) fn tick(&self, dt: f64) {
        let cur = self.cur.read();
        let mut next = self.next.write();

        let anchor = cur.st.anchor.as_ref().and_then(Weak::upgrade);
        let anchor_rlf = anchor.as_ref().map_or(1.0, |a| a.re_lorentz_factor());
        let rlf = self.kin.re_lorentz_factor_sq(cur.st.velocity.sq_len()) * anchor_rlf;
        // Proper time of the anchor's frame, and of this object itself.
        let apt = dt / anchor_rlf;
        let mut pt = dt * rlf;
        if pt <= 0.0 {
            pt = f64::MIN_POSITIVE;
        }

        *self.tick_force.lock() = Vec3::ZERO;

        // Tick blocks, rebuilding mass and the gravity center as a running
        // mass-weighted mean.
        let mut gcenter = Vec3::ZERO;
        let mut mass = 0.0;
        for b in &cur.st.blocks {
            b.tick(pt);
            let c = b.outline().center();
            let m = b.mass();
            mass += m;
            if mass == 0.0 {
                gcenter = c;
            } else {
                gcenter += (c - gcenter) * (m / mass);
            }
        }
        if mass < 0.0 {
            mass = 0.0;
        }
        next.st.mass = mass;
        next.st.gcenter = gcenter;

        if mass > 0.0 {
            let pos = cur.st.pos;
            let mut vel = Vec3::ZERO;
            // Senders already served by the near-field path below; their
            // wave snapshots must not be double-counted.
            let mut near: Vec<Uuid> = Vec::new();

            if let Some(anchor) = anchor.as_ref() {
                let a = anchor.cur.read();
                vel += Self::gravity_field_at_locked(&a, pos) * dt;
                near.push(anchor.id);
                for sw in &a.st.children {
                    let Some(s) = sw.upgrade() else { continue };
                    if s.id == self.id {
                        continue;
                    }
                    near.push(s.id);
                    let ss = s.cur.read();
                    vel += Self::gravity_field_at_locked(&ss, pos - ss.st.pos) * dt;
                }
                // TODO: decide whether a body should re-anchor to its
                // dominant gravitating sibling here instead of keeping its
                // current frame.
            }

            // Far-field snapshots delivered by gravity waves.
            {
                let passed = self.passed_gravity.lock();
                if !passed.is_empty() {
                    let mut apos = pos;
                    walk_chain(anchor.clone(), |st| apos += st.pos);
                    for (sender, snap) in passed.iter() {
                        if near.contains(sender) {
                            continue;
                        }
                        vel += snap.field_at(apos) * dt;
                    }
                }
            }
            next.st.velocity += vel;

            let force = *self.tick_force.lock();
            next.st.velocity += force * (pt / mass);
        }

        // New position and angle: d = (vi + vf)/2 · ∆t.
        let vel = (cur.st.velocity + next.st.velocity) * (apt / 2.0);
        if vel.sq_len() > self.kin.min_speed_sq() {
            next.st.pos += vel;
        }
        let av = (cur.st.head_vel + next.st.head_vel) * (apt / 2.0);
        next.st.angle = (next.st.angle + av).modulo(self.kin.angle_period());
    }

    // -- commit -------------------------------------------------------------

    /// Adopt the staged status, refresh the gravity state, and report a
    /// field change worth a wave, if any. Runs under the engine write lock.
    pub(crate) fn save_status(&self, dt: f64) -> Option<FieldEmission> {
        let mut cur = self.cur.write();
        {
            let mut next = self.next.write();

            let posdiff = next.st.pos - cur.st.pos;

            for call in next.calls.drain(..) {
                call();
            }
            cur.st.clone_from(&next.st);
            drop(next);

            let gcenter = cur.st.gcenter;
            let mass = cur.st.mass;
            cur.grav.field.set_pos(gcenter);
            cur.grav.field.set_mass(mass);

            cur.grav.update_cd -= dt;
            if cur.grav.update_cd < 0.0 {
                cur.grav.update_cd = HISTORY_UPDATE_INTERVAL;

                // Old snapshots ride along with the object.
                for g in cur.grav.history.iter_mut().flatten() {
                    let p = g.pos();
                    g.set_pos(p + posdiff);
                }

                // Shift the ring; each slot propagates only every other
                // epoch, so slot i ages at half the rate of slot i-1.
                let field = cur.grav.field;
                let mut last = cur.grav.history[0].replace(field);
                for i in 1..cur.grav.history.len() {
                    if cur.grav.update_mask.flip(i) {
                        break;
                    }
                    std::mem::swap(&mut cur.grav.history[i], &mut last);
                }
            }
        }

        let mass = cur.st.mass;
        let field_pos = cur.st.pos + cur.st.gcenter;
        let (changed, range_mass) = match cur.grav.last_emitted {
            None => (mass > 0.0, mass),
            Some((p, m)) => (
                mass != m || (self.kind.emits_on_move() && field_pos != p),
                mass.max(m),
            ),
        };
        if !changed {
            return None;
        }
        cur.grav.last_emitted = Some((field_pos, mass));
        Some(FieldEmission {
            mass,
            range_mass,
            radius: cur.grav.field.radius(),
            gcenter: cur.st.gcenter,
        })
    }
}

impl fmt::Display for Object {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Object[{}]", self.id)
    }
}

impl fmt::Debug for Object {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Object")
            .field("id", &self.id)
            .field("kind", &self.kind)
            .finish_non_exhaustive()
    }
}
