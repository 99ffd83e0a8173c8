//! Concurrent application runtime skeleton.
//!
//! A state engine, a render engine, and a UI engine each advance one facet
//! of the application against a shared application context, coordinated
//! only by a write-once cooperative shutdown flag. All rendering surfaces
//! share GPU resources through a single hidden root graphics context, and a
//! single-current-instance immediate-mode UI library is multiplexed across
//! surfaces by an explicit activation protocol.
//!
//! The windowing and UI libraries are consumed strictly through the traits
//! in [`traits`]; [`backend`] provides the desktop implementations.

pub mod backend;
pub mod core;
pub mod traits;
