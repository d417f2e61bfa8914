//! Workspace placeholder crate.
//!
//! This crate exists to expose shared feature flags that map to the individual
//! workspace crates (currently just `core-service`). Host applications can
//! depend on `background-bridge-workspace` and enable `desktop-shims` without
//! wiring each crate individually.
