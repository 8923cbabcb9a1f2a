//! Shared type definitions for the Signalbox traffic light.
//!
//! This crate holds the values that cross task boundaries: the signal
//! [`Phase`] carried through the notification queue, and the [`LightId`]
//! used to tag logs and run summaries.
//!
//! # Modules
//!
//! - [`ids`] -- Type-safe UUID wrappers for light identifiers
//! - [`phase`] -- The two-valued signal phase

pub mod ids;
pub mod phase;

pub use ids::LightId;
pub use phase::Phase;
