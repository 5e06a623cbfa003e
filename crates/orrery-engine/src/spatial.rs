//! Spatial queries over the object table.
//!
//! Linear scans comparing squared absolute distances. A spatial index could
//! replace these, provided the visible set stays identical; at current
//! object counts the scan is not the bottleneck (the event phase is).

use std::sync::Arc;

use orrery_math::Vec3;

use crate::engine::{Engine, EngineState};
use crate::object::Object;

impl EngineState {
    /// Append every object within `radius` of `pos` (inclusive).
    pub(crate) fn objs_inside_range(&self, out: &mut Vec<Arc<Object>>, pos: Vec3, radius: f64) {
        let r_sq = radius * radius;
        for o in self.objects.values() {
            if (o.abs_pos() - pos).sq_len() <= r_sq {
                out.push(o.clone());
            }
        }
    }

    /// Append every object whose distance from `pos` lies in
    /// `[min_r, max_r]` (inclusive on both ends).
    pub(crate) fn objs_inside_ring(
        &self,
        out: &mut Vec<Arc<Object>>,
        pos: Vec3,
        min_r: f64,
        max_r: f64,
    ) {
        let min_sq = min_r * min_r;
        let max_sq = max_r * max_r;
        for o in self.objects.values() {
            let l = (o.abs_pos() - pos).sq_len();
            if min_sq <= l && l <= max_sq {
                out.push(o.clone());
            }
        }
    }
}

impl Engine {
    /// All objects within `radius` of the absolute position `pos`.
    pub fn objs_inside_range(&self, pos: Vec3, radius: f64) -> Vec<Arc<Object>> {
        let mut out = Vec::new();
        self.with_state(|st| st.objs_inside_range(&mut out, pos, radius));
        out
    }

    /// All objects in the spherical shell `[min_r, max_r]` around `pos`.
    pub fn objs_inside_ring(&self, pos: Vec3, min_r: f64, max_r: f64) -> Vec<Arc<Object>> {
        let mut out = Vec::new();
        self.with_state(|st| st.objs_inside_ring(&mut out, pos, min_r, max_r));
        out
    }
}
