//! Scenesync library.
//!
//! Simulation core of a networked interactive scene: a tree of entities
//! driven by scripted components, a 2D collision layer, and a
//! snapshot/diff/interpolation pipeline that lets a consumer reconstruct
//! and smoothly display the scene without running at the producer's rate
//! or on the producer's machine.

pub mod collision;
pub mod components;
pub mod config;
pub mod context;
pub mod error;
pub mod interp;
pub mod scene;
pub mod state;
