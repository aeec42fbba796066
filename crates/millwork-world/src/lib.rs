//! Millwork World -- block storage and lifecycle around the rotation
//! network engine.
//!
//! [`MechanicalWorld`] owns a [`Grid`] of boxed nodes and a
//! [`RotationNetworkManager`](millwork_network::RotationNetworkManager), and
//! calls the manager for every placement, change and removal. Blocks the
//! manager refuses come back to the caller as [`Placement::Broken`].
//!
//! # Modules
//!
//! - [`grid`] -- slotmap arena with a position index.
//! - [`world`] -- place / reorient / modify / destroy.
//! - [`blocks`] -- axles, gearboxes and cranks.
//! - [`config`] -- [`WorldConfig`] loading from RON, TOML or JSON.
//! - [`snapshot`] -- bitcode snapshots and replay.

pub mod blocks;
pub mod config;
pub mod grid;
pub mod snapshot;
pub mod world;

pub use blocks::{Axle, Crank, Gearbox};
pub use config::{ConfigError, WorldConfig};
pub use grid::{BlockId, Grid, GridError, Role};
pub use snapshot::{BlockRecord, SnapshotError, SnapshotHeader, WorldSnapshot};
pub use world::{MechanicalWorld, Placement, WorldError};
