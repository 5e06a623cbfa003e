//! End-to-end simulation behavior: near-field gravity, applied forces,
//! saturation clamps, and run-to-run determinism.

use std::sync::{Arc, Mutex, Weak};

use orrery_engine::prelude::*;

// -- test blocks --------------------------------------------------------------

/// A block with a fixed (possibly negative) mass.
struct Ballast {
    mass: f64,
    object: Mutex<Weak<Object>>,
}

impl Ballast {
    fn new(mass: f64) -> Arc<Self> {
        Arc::new(Self {
            mass,
            object: Mutex::new(Weak::new()),
        })
    }
}

impl Block for Ballast {
    fn set_object(&self, o: &Arc<Object>) {
        *self.object.lock().unwrap() = Arc::downgrade(o);
    }
    fn mass(&self) -> f64 {
        self.mass
    }
    fn material(&self, _face: Facing) -> Option<Arc<Material>> {
        None
    }
    fn outline(&self) -> Cube {
        Cube::from_center(Vec3::ONE)
    }
    fn tick(&self, _dt: f64) {}
}

/// A block that pushes its object every tick and records the proper time it
/// was handed.
struct Thruster {
    force: Vec3,
    mass: f64,
    object: Mutex<Weak<Object>>,
    proper_times: Mutex<Vec<f64>>,
}

impl Thruster {
    fn new(force: Vec3, mass: f64) -> Arc<Self> {
        Arc::new(Self {
            force,
            mass,
            object: Mutex::new(Weak::new()),
            proper_times: Mutex::new(Vec::new()),
        })
    }
}

impl Block for Thruster {
    fn set_object(&self, o: &Arc<Object>) {
        *self.object.lock().unwrap() = Arc::downgrade(o);
    }
    fn mass(&self) -> f64 {
        self.mass
    }
    fn material(&self, _face: Facing) -> Option<Arc<Material>> {
        None
    }
    fn outline(&self) -> Cube {
        Cube::from_center(Vec3::ONE)
    }
    fn tick(&self, dt: f64) {
        self.proper_times.lock().unwrap().push(dt);
        if let Some(o) = self.object.lock().unwrap().upgrade() {
            o.apply_force(self.force);
        }
    }
}

// -- 1. Near-field gravity -----------------------------------------------------

#[test]
fn satellite_falls_toward_a_massive_sibling() {
    let e = Engine::new(Config::default());
    let earth_mass = 5.972e24;
    let sun = e.new_object_with(ObjKind::Natural, None, Vec3::ZERO, |o| {
        o.set_blocks(vec![Ballast::new(earth_mass)]);
        // Receivers within twice this radius read the live field instead of
        // the retarded history.
        o.set_radius(6.4e6);
    });
    let sat = e.new_object_with(ObjKind::Natural, None, Vec3::new(1.0e7, 0.0, 0.0), |o| {
        o.set_blocks(vec![Ballast::new(1.0e3)]);
    });

    // Tick 1 binds blocks, tick 2 commits masses, tick 3 applies gravity.
    e.tick(1.0);
    e.tick(1.0);
    e.tick(1.0);

    let v = sat.velocity();
    let g = G * earth_mass / (1.0e7 * 1.0e7); // ≈ 3.99 m/s²
    assert!(
        (v.x + g).abs() < 0.05,
        "one second of free fall: expected dv ≈ {:-}, got {}",
        -g,
        v.x
    );
    assert!(sat.pos().x < 1.0e7, "the satellite must have moved inward");
    assert!(sun.mass() > 0.0);
}

// -- 2. Applied forces over proper time ----------------------------------------

#[test]
fn thruster_accelerates_its_object() {
    let e = Engine::new(Config::default());
    let thruster = Thruster::new(Vec3::new(10.0, 0.0, 0.0), 2.0);
    let ship = e.new_object_with(ObjKind::ManMade, None, Vec3::ZERO, |o| {
        o.set_blocks(vec![thruster.clone() as Arc<dyn Block>]);
    });

    e.tick(1.0); // binds blocks
    e.tick(1.0); // first powered tick
    // F·(pt/m) with pt ≈ dt at rest: dv = 10·1/2 = 5 m/s.
    let v = ship.velocity();
    assert!((v.x - 5.0).abs() < 1e-9, "got {}", v.x);

    // The block saw its proper dt, ≈ coordinate dt at rest.
    let times = thruster.proper_times.lock().unwrap();
    assert!(!times.is_empty());
    assert!((times.last().unwrap() - 1.0).abs() < 1e-9);
}

// -- 3. Negative mass saturates at zero ----------------------------------------

#[test]
fn negative_total_mass_clamps_to_zero() {
    let e = Engine::new(Config::default());
    let o = e.new_object_with(ObjKind::ManMade, None, Vec3::ZERO, |obj| {
        obj.set_blocks(vec![Ballast::new(5.0), Ballast::new(-12.0)]);
    });
    e.tick(1.0);
    e.tick(1.0);
    assert_eq!(o.mass(), 0.0);
}

// -- 4. Angle integration --------------------------------------------------------

#[test]
fn heading_integrates_and_wraps() {
    let e = Engine::new(Config::default());
    let o = e.new_object_with(ObjKind::ManMade, None, Vec3::ZERO, |o| {
        o.set_heading_vel(Vec3::new(1.0, 0.0, 0.0));
    });
    // The angle grows by (ω_cur + ω_next)/2 · dt per tick, wrapped at the
    // period. The first tick averages the staged ω with the zero it is
    // replacing.
    e.tick(1.0);
    let mut expected: f64 = 0.5;
    let got = o.angle().x;
    assert!((got - expected).abs() < 1e-9, "expected {expected}, got {got}");
    for _ in 0..5 {
        e.tick(1.0);
        expected = (expected + 1.0) % std::f64::consts::PI;
        let got = o.angle().x;
        assert!(
            (got - expected).abs() < 1e-9,
            "expected {expected}, got {got}"
        );
    }
}

// -- 5. Determinism ---------------------------------------------------------------

/// The signature guarantee: identical initial state, identical tick
/// sequence, identical results.
#[test]
fn identical_runs_produce_identical_positions() {
    fn run() -> Vec<(f64, f64, f64)> {
        let e = Engine::new(Config::default());
        let star_mass = 1.989e30;
        let _star = e.new_object_with(ObjKind::Natural, None, Vec3::ZERO, |o| {
            o.set_blocks(vec![Ballast::new(star_mass)]);
            o.set_radius(7.0e8);
        });
        let mut planets = Vec::new();
        for i in 0..4u32 {
            let r = 1.0e9 * (i + 1) as f64;
            let v = (G * star_mass / r).sqrt();
            planets.push(e.new_object_with(
                ObjKind::Natural,
                None,
                Vec3::new(r, 0.0, 0.0),
                |o| {
                    o.set_blocks(vec![Ballast::new(1.0e23)]);
                    o.set_velocity(Vec3::new(0.0, v, 0.0));
                },
            ));
        }

        for _ in 0..100 {
            e.tick(60.0);
        }

        planets
            .iter()
            .map(|p| {
                let pos = p.pos();
                (pos.x, pos.y, pos.z)
            })
            .collect()
    }

    let first = run();
    let second = run();
    assert_eq!(first, second, "two identical runs diverged");
    // And the planets actually moved.
    assert!(first.iter().any(|&(x, y, z)| (x, y, z) != (0.0, 0.0, 0.0)));
    assert!(first.iter().all(|&(_, y, _)| y != 0.0), "orbits progressed");
}

// -- 6. The immovable root --------------------------------------------------------

#[test]
fn main_anchor_never_moves() {
    let e = Engine::new(Config::default());
    let _m = with_heavy_object(&e);
    for _ in 0..10 {
        e.tick(1.0);
    }
    let root = e.main_anchor();
    assert_eq!(root.pos(), Vec3::ZERO);
    assert_eq!(root.velocity(), Vec3::ZERO);
    assert_eq!(root.angle(), Vec3::ZERO);
}

fn with_heavy_object(e: &Engine) -> Arc<Object> {
    e.new_object_with(ObjKind::Natural, None, Vec3::new(1.0e5, 0.0, 0.0), |o| {
        o.set_blocks(vec![Ballast::new(1.0e24)]);
    })
}
