//! Expanding event waves and the gravity-wave specialization.
//!
//! Field news does not travel instantly. Every change is emitted as a
//! spherical wave expanding at its propagation speed (the speed of light for
//! gravity); each tick the wave sweeps the annulus its shell crossed and
//! applies its effect to every object inside it, exactly once per expansion.
//!
//! Far shells update geometrically less often: a gravity wave bumps its own
//! tick `delay` each time its radius crosses the next shell threshold, and
//! the engine truncates waves from chatty emitters to a short range (see
//! [`shell_radius`]). Together these bound per-tick wave work regardless of
//! how far the oldest shells have travelled.

use std::sync::{Arc, Weak};

use orrery_math::Vec3;
use uuid::Uuid;

use crate::engine::EngineState;
use crate::field::GravityField;
use crate::kinematics::C;
use crate::object::Object;
use crate::pool::Pool;

/// Default wave lifetime, seconds.
pub const DEFAULT_WAVE_ALIVE: f64 = 60.0 * 60.0;

/// Number of shell thresholds in the staleness schedule.
pub(crate) const SHELL_COUNT: u32 = 9;

/// The `n`-th shell threshold: `(1 << 2n) · c/100`.
pub(crate) fn shell_radius(n: u32) -> f64 {
    (1u64 << (2 * n)) as f64 * (C / 100.0)
}

/// The tick delay a wave should adopt at `radius`, or `None` below the first
/// threshold. Crossing shell `n` slows the wave to one tick in `1 << 2n`.
fn delay_for_radius(radius: f64) -> Option<u32> {
    // Descending thresholds; the first hit wins.
    for n in (0..SHELL_COUNT).rev() {
        if radius > shell_radius(n) {
            return Some(1u32 << (2 * n));
        }
    }
    None
}

static RECEIVER_SCRATCH: Pool<Vec<Arc<Object>>> = Pool::new();

// ---------------------------------------------------------------------------
// WaveEffect
// ---------------------------------------------------------------------------

/// What a wave does to the objects its shell crosses.
pub trait WaveEffect: Send + Sync {
    /// Invoked once per receiver per shell crossing. The sender is never a
    /// receiver.
    fn on_receive(&self, wave: &EventWave, receiver: &Arc<Object>);

    /// Pre-tick hook; may adjust the wave's scheduling state. Returning
    /// `true` skips the rest of this tick.
    fn before_tick(&self, wave: &mut EventWave) -> bool {
        let _ = wave;
        false
    }

    /// Cleanup hook, invoked exactly once when the wave is freed.
    fn on_remove(&self) {}
}

// ---------------------------------------------------------------------------
// EventWave
// ---------------------------------------------------------------------------

/// An expanding spherical wave.
pub struct EventWave {
    sender: Weak<Object>,
    sender_id: Uuid,
    pos: Vec3,
    alive: f64,
    speed: f64,
    radius: f64,
    max_radius: f64,
    heavy: bool,
    delay: u32,
    ticked: u32,
    skipped: f64,
    effect: Option<Box<dyn WaveEffect>>,
}

impl EventWave {
    /// Create a wave at absolute position `pos` expanding at the speed of
    /// light until `max_radius` (negative means unbounded) or the default
    /// lifetime runs out.
    pub fn new(
        sender: &Arc<Object>,
        pos: Vec3,
        max_radius: f64,
        heavy: bool,
        effect: Box<dyn WaveEffect>,
    ) -> Self {
        Self {
            sender: Arc::downgrade(sender),
            sender_id: sender.id(),
            pos,
            alive: DEFAULT_WAVE_ALIVE,
            speed: C,
            radius: 0.0,
            max_radius,
            heavy,
            delay: 0,
            ticked: 0,
            skipped: 0.0,
            effect: Some(effect),
        }
    }

    pub(crate) fn new_gravity(
        sender: &Arc<Object>,
        pos: Vec3,
        max_radius: f64,
        snapshot: Arc<GravityField>,
    ) -> Self {
        Self::new(sender, pos, max_radius, true, Box::new(GravityWave { snapshot }))
    }

    /// The originating object, if it still exists.
    pub fn sender(&self) -> Option<Arc<Object>> {
        self.sender.upgrade()
    }

    /// The originating object's id.
    pub fn sender_id(&self) -> Uuid {
        self.sender_id
    }

    /// The absolute start position captured at emission.
    pub fn pos(&self) -> Vec3 {
        self.pos
    }

    /// Remaining time budget; the wave is freed once this reaches zero.
    pub fn alive_time(&self) -> f64 {
        self.alive
    }

    /// Propagation speed, m/s.
    pub fn speed(&self) -> f64 {
        self.speed
    }

    /// Current shell radius. Non-decreasing.
    pub fn radius(&self) -> f64 {
        self.radius
    }

    /// The radius cap; negative means unbounded.
    pub fn max_radius(&self) -> f64 {
        self.max_radius
    }

    /// Whether this wave ticks on its own worker thread.
    pub fn heavy(&self) -> bool {
        self.heavy
    }

    /// Current tick delay (skip `delay - 1` ticks, then process the
    /// accumulated time at once).
    pub fn delay(&self) -> u32 {
        self.delay
    }

    /// Adjust the tick delay; used by effects from their pre-tick hook.
    pub fn set_delay(&mut self, delay: u32) {
        self.delay = delay;
    }

    /// Advance the wave by `dt`, sweeping the newly-crossed annulus.
    pub(crate) fn tick(&mut self, mut dt: f64, state: &EngineState) {
        if self.delay > 0 {
            self.skipped += dt;
            self.ticked += 1;
            if self.ticked < self.delay {
                return;
            }
            dt = self.skipped;
            self.skipped = 0.0;
            self.ticked = 0;
        }
        self.alive -= dt;
        if self.alive < 0.0 {
            // Clip so the wave ends exactly at zero alive time.
            dt += self.alive;
            self.alive = 0.0;
        }

        let effect = self.effect.take();
        if let Some(e) = &effect {
            if e.before_tick(self) {
                self.effect = effect;
                return;
            }
        }

        let last = self.radius;
        self.radius += self.speed * dt;
        if self.max_radius >= 0.0 && self.radius >= self.max_radius {
            self.radius = self.max_radius;
            self.alive = 0.0;
        }

        // The annulus the shell crossed, overshot by half a step to catch
        // objects approaching the shell fast.
        let growth = self.radius - last;
        let mut receivers = RECEIVER_SCRATCH.get();
        state.objs_inside_ring(&mut receivers, self.pos, last, self.radius + growth / 2.0);
        for o in receivers.drain(..) {
            if o.id() == self.sender_id {
                continue;
            }
            if let Some(e) = &effect {
                e.on_receive(self, &o);
            }
        }
        RECEIVER_SCRATCH.put(receivers);
        self.effect = effect;
    }

    /// Run the cleanup hook and drop the effect. Called by the engine when
    /// the wave's alive time reaches zero.
    pub(crate) fn free(mut self) {
        if let Some(e) = self.effect.take() {
            e.on_remove();
        }
    }
}

// ---------------------------------------------------------------------------
// Gravity wave
// ---------------------------------------------------------------------------

/// The gravity specialization: carries a shared snapshot of the sender's
/// field and deposits it in each receiver's passed-gravity map.
struct GravityWave {
    snapshot: Arc<GravityField>,
}

impl WaveEffect for GravityWave {
    fn on_receive(&self, wave: &EventWave, receiver: &Arc<Object>) {
        receiver.install_passed_gravity(wave.sender_id(), self.snapshot.clone());
    }

    fn before_tick(&self, wave: &mut EventWave) -> bool {
        if let Some(d) = delay_for_radius(wave.radius()) {
            if wave.delay() != d {
                wave.set_delay(d);
            }
        }
        false
    }

    // The wave's own snapshot reference drops with the effect.
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn shell_radii_grow_geometrically() {
        assert_eq!(shell_radius(0), C / 100.0);
        assert_eq!(shell_radius(1), 4.0 * C / 100.0);
        assert_eq!(shell_radius(8), 65536.0 * C / 100.0);
    }

    #[test]
    fn delay_ladder_matches_shells() {
        assert_eq!(delay_for_radius(0.0), None);
        assert_eq!(delay_for_radius(shell_radius(0)), None);
        assert_eq!(delay_for_radius(shell_radius(0) + 1.0), Some(1));
        assert_eq!(delay_for_radius(shell_radius(1) + 1.0), Some(4));
        assert_eq!(delay_for_radius(shell_radius(4) + 1.0), Some(1 << 8));
        assert_eq!(delay_for_radius(shell_radius(8) + 1.0), Some(1 << 16));
        // Way past the last shell the delay stays at the top rung.
        assert_eq!(delay_for_radius(shell_radius(8) * 100.0), Some(1 << 16));
    }
}
