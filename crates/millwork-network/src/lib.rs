//! Millwork Network -- rotation networks over a grid of mechanical blocks.
//!
//! A rotation network is a tree rooted at one source block. Every other
//! member receives its rotation from exactly one neighbor, and the manager
//! keeps that shape intact as blocks are placed, reoriented and removed:
//!
//! - placing a node attaches it to the single network that can drive it and
//!   pulls in any disconnected nodes now reachable through it;
//! - placing a node (or source) that would join two networks is refused, and
//!   the caller breaks the block;
//! - removing a node re-walks its network from the source and detaches
//!   whatever is no longer reachable.
//!
//! Nodes live in the caller's grid. The manager and networks only hold
//! positions and reach nodes through [`millwork_core::RotationAccess`].
//!
//! # Key Types
//!
//! - [`RotationNetworkManager`] -- entry point for block lifecycle callbacks.
//! - [`RotationNetwork`] -- one source plus its members.
//! - [`NetworkEvent`] -- topology transitions, buffered when enabled.
//! - [`validate`] / [`InvariantViolation`] -- consistency checks.

pub mod event;
pub mod manager;
pub mod network;
pub mod validation;

pub use event::{NetworkEvent, NetworkEventKind};
pub use manager::RotationNetworkManager;
pub use network::RotationNetwork;
pub use validation::{InvariantViolation, validate, validate_membership};
