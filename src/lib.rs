//! Duskmantle - Tactical Perception and Combat Resolution Core
//!
//! Deterministic rules for grid-based skirmishes: distance on a
//! diagonal-pairing grid, perception packages (visibility, cover,
//! concealment), reach envelopes, and a staged defense flow that turns
//! a declared attack into wounds and banked progress. Every collaborator
//! with side effects sits behind a port trait in [`services`].

pub mod combat;
pub mod core;
pub mod environment;
pub mod grid;
pub mod perception;
pub mod progression;
pub mod services;
pub mod world;

pub use crate::core::{DuskError, Result};
