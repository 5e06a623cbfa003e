//! Geometric primitives for the Orrery star-system engine.
//!
//! This crate is deliberately small and dependency-light. It provides the
//! value types the simulation core is built on:
//!
//! - [`Vec3`] / [`Vec4`] — componentwise vector math, principal-axis
//!   rotations, and the X→Y→Z composite rotation the heading math relies on.
//! - [`Cube`] — axis-aligned bounding boxes with inclusive overlap tests.
//! - [`Bitset`] — a growable array of single-bit flags.
//!
//! All types are plain `Copy`/`Clone` data with `serde` derives; there is no
//! interior mutability and no concurrency here.

#![deny(unsafe_code)]

mod bitset;
mod cube;
mod vec;

pub use bitset::Bitset;
pub use cube::Cube;
pub use vec::{Vec3, Vec4};
