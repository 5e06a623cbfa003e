//! The engine: configuration, the object registry, and the three-phase tick.
//!
//! [`Engine::tick`] advances the simulation by `dt` seconds:
//!
//! 1. **Object phase** — under the engine read lock, every object stages its
//!    next status on a worker. Objects read their own and their anchors'
//!    current status; concurrent writes are confined to each object's own
//!    next-status buffer.
//! 2. **Event phase** — under the engine read lock, every in-flight wave
//!    sweeps the annulus its shell crossed this tick. Heavy waves (gravity)
//!    run on workers; light waves run inline.
//! 3. **Commit phase** — under the engine write lock, every object adopts
//!    its next status, expired waves are freed, and field changes detected
//!    during the commit become new gravity waves, ordered by sender id.
//!
//! Waves queued while a tick runs are spliced in at the start of the next
//! tick, so a tick never observes events it created itself. The engine runs
//! one tick at a time; phase boundaries are hard barriers.

use std::collections::HashMap;
use std::sync::Arc;

use orrery_math::Vec3;
use parking_lot::{Mutex, RwLock};
use rayon::prelude::*;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::block::Block;
use crate::field::{GravityField, G};
use crate::kinematics::Kinematics;
use crate::object::{FieldEmission, ObjKind, ObjStatus, Object};
use crate::wave::{shell_radius, EventWave, SHELL_COUNT};

// ---------------------------------------------------------------------------
// Config
// ---------------------------------------------------------------------------

/// Engine configuration, fixed for the engine's life.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// The minimum positive speed, m/s. Displacements slower than this are
    /// suppressed to keep denormal drift out of positions.
    pub min_speed: f64,
    /// The maximum positive speed, m/s. Zero or anything above `c` means
    /// `c`.
    pub max_speed: f64,
    /// The minimum positive acceleration, m/s². Bounds how far gravity
    /// waves bother to travel. Zero or negative means the 10⁻³ default.
    pub min_accel: f64,
    /// The wrap period applied to Euler angles after integration.
    // TODO: confirm whether headings should wrap at 2π; the π default
    // matches historical behavior but folds yaw onto a half turn.
    pub angle_period: f64,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            min_speed: 0.0,
            max_speed: 0.0,
            min_accel: 0.0,
            angle_period: std::f64::consts::PI,
        }
    }
}

// ---------------------------------------------------------------------------
// Engine
// ---------------------------------------------------------------------------

/// Everything behind the engine's read/write lock: the object table, the
/// live wave list, and the tick counter.
pub(crate) struct EngineState {
    pub objects: HashMap<Uuid, Arc<Object>>,
    pub events: Vec<Mutex<EventWave>>,
    pub ticks: u64,
}

/// The simulation engine. See the module docs for the tick structure.
pub struct Engine {
    cfg: Config,
    kin: Kinematics,
    /// The immovable root of the anchor tree. Not part of the object table.
    main_anchor: Arc<Object>,
    state: RwLock<EngineState>,
    /// Waves queued during a tick; spliced into `events` at the next tick.
    pending: Mutex<Vec<EventWave>>,
}

impl Engine {
    /// Create an engine with the given configuration.
    pub fn new(cfg: Config) -> Self {
        let kin = Kinematics::from_config(&cfg);
        Self {
            cfg,
            kin,
            main_anchor: Object::new(Uuid::nil(), ObjKind::Natural, kin, ObjStatus::default()),
            state: RwLock::new(EngineState {
                objects: HashMap::new(),
                events: Vec::new(),
                ticks: 0,
            }),
            pending: Mutex::new(Vec::new()),
        }
    }

    /// The configuration the engine was built with.
    pub fn config(&self) -> Config {
        self.cfg
    }

    /// The engine's immutable kinematic parameters.
    pub fn kinematics(&self) -> Kinematics {
        self.kin
    }

    /// The root object. Immovable; its position, velocity, and angles stay
    /// zero forever.
    pub fn main_anchor(&self) -> &Arc<Object> {
        &self.main_anchor
    }

    /// Create an object anchored to `anchor` (the main anchor when `None`)
    /// at `pos` in the anchor's frame.
    pub fn new_object(&self, kind: ObjKind, anchor: Option<&Arc<Object>>, pos: Vec3) -> Arc<Object> {
        self.new_object_with(kind, anchor, pos, |_| {})
    }

    /// Like [`new_object`](Self::new_object), running `init` on the fresh
    /// object while the engine lock is still held.
    pub fn new_object_with(
        &self,
        kind: ObjKind,
        anchor: Option<&Arc<Object>>,
        pos: Vec3,
        init: impl FnOnce(&Arc<Object>),
    ) -> Arc<Object> {
        let anchor = anchor.unwrap_or(&self.main_anchor);
        let status = ObjStatus {
            anchor: Some(Arc::downgrade(anchor)),
            pos,
            ..ObjStatus::default()
        };

        let mut st = self.state.write();
        let id = Self::generate_object_id(&st.objects);
        let o = Object::new(id, kind, self.kin, status);
        let prev = st.objects.insert(id, o.clone());
        assert!(prev.is_none(), "object id {id} already exists");
        anchor.add_child_direct(&o);
        init(&o);
        o
    }

    /// A fresh time-ordered id not present in the table.
    ///
    /// # Panics
    ///
    /// Panics after 20 collisions in a row.
    fn generate_object_id(objects: &HashMap<Uuid, Arc<Object>>) -> Uuid {
        for _ in 0..20 {
            let id = Uuid::now_v7();
            if !objects.contains_key(&id) {
                return id;
            }
            tracing::warn!(%id, "v7 UUID collision, retrying");
        }
        panic!("too many UUID generation failures");
    }

    /// Remove an object from the simulation.
    ///
    /// Returns `false` if the id is unknown. The removed object's entries in
    /// every receiver's passed-gravity map are purged; waves it already
    /// emitted keep expanding with their captured snapshots.
    ///
    /// # Panics
    ///
    /// Panics if the object still anchors live children; re-parent them
    /// first.
    pub fn remove_object(&self, id: Uuid) -> bool {
        let mut st = self.state.write();
        let Some(o) = st.objects.get(&id).cloned() else {
            return false;
        };
        let has_children = o.cur.read().st.children.iter().any(|w| w.strong_count() > 0)
            || o.next.read().st.children.iter().any(|w| w.strong_count() > 0);
        assert!(!has_children, "cannot remove {o}: it still anchors children");
        if let Some(parent) = o.anchor() {
            parent.remove_child_direct(&o);
        }
        for other in st.objects.values() {
            other.purge_passed_gravity(id);
        }
        st.objects.remove(&id);
        true
    }

    /// Look up an object by id.
    pub fn get_object(&self, id: Uuid) -> Option<Arc<Object>> {
        self.state.read().objects.get(&id).cloned()
    }

    /// The number of objects in the table (the main anchor not included).
    pub fn object_count(&self) -> usize {
        self.state.read().objects.len()
    }

    /// The number of live event waves.
    pub fn event_count(&self) -> usize {
        self.state.read().events.len()
    }

    /// The number of ticks executed so far.
    pub fn tick_count(&self) -> u64 {
        self.state.read().ticks
    }

    /// Visit every object under the engine read lock.
    pub fn for_each_object(&self, mut cb: impl FnMut(&Arc<Object>)) {
        let st = self.state.read();
        for o in st.objects.values() {
            cb(o);
        }
    }

    /// Visit every block of every object under the engine read lock.
    pub fn for_each_block(&self, mut cb: impl FnMut(&Arc<dyn Block>)) {
        let st = self.state.read();
        for o in st.objects.values() {
            let cur = o.cur.read();
            for b in &cur.st.blocks {
                cb(b);
            }
        }
    }

    /// Visit every live wave under the engine read lock. Diagnostic; the
    /// visit order is not meaningful.
    pub fn for_each_wave(&self, mut cb: impl FnMut(&EventWave)) {
        let st = self.state.read();
        for ev in &st.events {
            cb(&ev.lock());
        }
    }

    /// Queue a custom wave. It becomes visible at the start of the next
    /// tick.
    pub fn queue_wave(&self, wave: EventWave) {
        self.pending.lock().push(wave);
    }

    pub(crate) fn with_state<R>(&self, f: impl FnOnce(&EngineState) -> R) -> R {
        f(&self.state.read())
    }

    // -- kinematics delegation ---------------------------------------------

    /// See [`Kinematics::lorentz_factor`].
    pub fn lorentz_factor(&self, speed: f64) -> f64 {
        self.kin.lorentz_factor(speed)
    }

    /// See [`Kinematics::re_lorentz_factor`].
    pub fn re_lorentz_factor(&self, speed: f64) -> f64 {
        self.kin.re_lorentz_factor(speed)
    }

    /// See [`Kinematics::re_lorentz_factor_sq`].
    pub fn re_lorentz_factor_sq(&self, speed_sq: f64) -> f64 {
        self.kin.re_lorentz_factor_sq(speed_sq)
    }

    /// See [`Kinematics::momentum`].
    pub fn momentum(&self, mass: f64, velocity: Vec3) -> Vec3 {
        self.kin.momentum(mass, velocity)
    }

    /// See [`Kinematics::acc_from_force`].
    pub fn acc_from_force(&self, mass: f64, speed: f64, force: Vec3) -> Vec3 {
        self.kin.acc_from_force(mass, speed, force)
    }

    /// See [`Kinematics::proper_time`].
    pub fn proper_time(&self, t: f64, speed: f64) -> f64 {
        self.kin.proper_time(t, speed)
    }

    // -- tick ---------------------------------------------------------------

    /// Advance the simulation by `dt` seconds.
    ///
    /// # Panics
    ///
    /// Panics if `dt` is negative or not finite.
    pub fn tick(&self, dt: f64) {
        assert!(
            dt >= 0.0 && dt.is_finite(),
            "tick dt must be non-negative and finite, got {dt}"
        );

        // Waves queued since the last tick become visible now.
        {
            let mut st = self.state.write();
            let mut pending = self.pending.lock();
            st.events.extend(pending.drain(..).map(Mutex::new));
        }

        // Object phase.
        {
            let st = self.state.read();
            st.objects.par_iter().for_each(|(_, o)| o.tick(dt));
        }

        // Event phase.
        {
            let st = self.state.read();
            for ev in &st.events {
                let mut w = ev.lock();
                if !w.heavy() {
                    w.tick(dt, &st);
                }
            }
            st.events.par_iter().for_each(|ev| {
                let mut w = ev.lock();
                if w.heavy() {
                    w.tick(dt, &st);
                }
            });
        }

        // Commit phase.
        {
            let mut guard = self.state.write();
            let st = &mut *guard;
            let tick_index = st.ticks;

            let mut emissions: Vec<(Arc<Object>, FieldEmission)> = st
                .objects
                .par_iter()
                .filter_map(|(_, o)| o.save_status(dt).map(|e| (Arc::clone(o), e)))
                .collect();
            self.main_anchor.sync_children();

            // Free expired waves; swap-remove, ordering is not observable.
            let mut i = 0;
            while i < st.events.len() {
                if st.events[i].get_mut().alive_time() == 0.0 {
                    let ev = st.events.swap_remove(i);
                    ev.into_inner().free();
                } else {
                    i += 1;
                }
            }

            // Emissions happen after every status copy so a wave's captured
            // position never mixes pre- and post-commit ancestor frames.
            emissions.sort_by_key(|(o, _)| o.id());
            for (sender, e) in emissions {
                let wave = self.make_gravity_wave(&sender, &e, tick_index);
                st.events.push(Mutex::new(wave));
            }

            st.ticks += 1;
        }
    }

    fn make_gravity_wave(
        &self,
        sender: &Arc<Object>,
        e: &FieldEmission,
        tick_index: u64,
    ) -> EventWave {
        // Reach: where the field's pull falls below the configured minimum.
        let mut max_radius = (G * e.range_mass / self.kin.min_accel()).sqrt();
        // Staleness cap: the more often an emitter speaks, the shorter its
        // waves. Tick indices with k trailing zero-pairs reach shell k.
        let life = tick_index.trailing_zeros() / 2;
        if life < SHELL_COUNT - 1 {
            max_radius = max_radius.min(shell_radius(life));
        }
        let pos = sender.abs_pos() + e.gcenter;
        let snapshot = Arc::new(GravityField::new(pos, e.mass, e.radius));
        tracing::debug!(sender = %sender.id(), mass = e.mass, max_radius, "gravity wave emitted");
        EventWave::new_gravity(sender, pos, max_radius, snapshot)
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use crate::kinematics::{C, C_SQ};

    #[test]
    fn new_engine_is_empty() {
        let e = Engine::new(Config::default());
        assert_eq!(e.object_count(), 0);
        assert_eq!(e.event_count(), 0);
        assert_eq!(e.tick_count(), 0);
        assert!(e.main_anchor().anchor().is_none());
        assert_eq!(e.main_anchor().id(), Uuid::nil());
    }

    #[test]
    fn config_speed_cap_clamps_to_c() {
        let e = Engine::new(Config {
            max_speed: 2.0 * C,
            ..Config::default()
        });
        assert_eq!(e.kinematics().max_speed_sq(), C_SQ);
        let unset = Engine::new(Config::default());
        assert_eq!(unset.kinematics().max_speed_sq(), C_SQ);
    }

    #[test]
    fn new_object_registers_and_parents() {
        let e = Engine::new(Config::default());
        let o = e.new_object(ObjKind::Natural, None, Vec3::new(1.0, 2.0, 3.0));
        assert_eq!(e.object_count(), 1);
        assert!(e.get_object(o.id()).is_some());
        let anchor = o.anchor().expect("fresh object must have an anchor");
        assert_eq!(anchor.id(), Uuid::nil());
        assert_eq!(o.pos(), Vec3::new(1.0, 2.0, 3.0));
    }

    #[test]
    fn empty_tick_advances_counter() {
        let e = Engine::new(Config::default());
        e.tick(0.01);
        e.tick(0.01);
        assert_eq!(e.tick_count(), 2);
    }

    #[test]
    #[should_panic(expected = "non-negative")]
    fn negative_dt_panics() {
        Engine::new(Config::default()).tick(-0.1);
    }

    #[test]
    #[should_panic(expected = "non-negative")]
    fn nan_dt_panics() {
        Engine::new(Config::default()).tick(f64::NAN);
    }

    #[test]
    fn remove_object_detaches_and_forgets() {
        let e = Engine::new(Config::default());
        let o = e.new_object(ObjKind::ManMade, None, Vec3::ZERO);
        let id = o.id();
        assert!(e.remove_object(id));
        assert!(!e.remove_object(id));
        assert_eq!(e.object_count(), 0);
        // The root's child list no longer mentions the object.
        e.tick(0.01);
        assert!(e.main_anchor().cur.read().st.children.iter().all(|w| w.upgrade().map_or(true, |c| c.id() != id)));
    }

    #[test]
    #[should_panic(expected = "still anchors children")]
    fn remove_object_with_children_panics() {
        let e = Engine::new(Config::default());
        let parent = e.new_object(ObjKind::Natural, None, Vec3::ZERO);
        let _child = e.new_object(ObjKind::Natural, Some(&parent), Vec3::UNIT_X);
        e.remove_object(parent.id());
    }

    #[test]
    fn spatial_queries_see_absolute_positions() {
        let e = Engine::new(Config::default());
        let a = e.new_object(ObjKind::Natural, None, Vec3::new(10.0, 0.0, 0.0));
        let _b = e.new_object(ObjKind::Natural, Some(&a), Vec3::new(5.0, 0.0, 0.0));
        let _c = e.new_object(ObjKind::Natural, None, Vec3::new(100.0, 0.0, 0.0));

        let near = e.objs_inside_range(Vec3::ZERO, 20.0);
        assert_eq!(near.len(), 2, "a at 10 and b at 15 are in range");

        let ring = e.objs_inside_ring(Vec3::ZERO, 12.0, 101.0);
        assert_eq!(ring.len(), 2, "b at 15 and c at 100 are in the ring");
    }

    #[test]
    fn ids_are_time_ordered_and_unique() {
        let e = Engine::new(Config::default());
        let mut ids = Vec::new();
        for _ in 0..50 {
            ids.push(e.new_object(ObjKind::ManMade, None, Vec3::ZERO).id());
        }
        let mut sorted = ids.clone();
        sorted.sort();
        sorted.dedup();
        assert_eq!(sorted.len(), 50);
    }
}
