//! Binary snapshots of a world and rebuilding a world from one.
//!
//! A snapshot records every block in placement order with the network state
//! it had when captured. Restoring does not trust that state: it replays the
//! placements through a fresh manager, which rebuilds the networks. Network
//! ids and source directions may differ from the captured ones when the
//! captured world had a longer history; which blocks end up connected to
//! which source does not.

use millwork_core::{BlockPos, Direction, DirectionSet, NetworkId, Node, Rotation};
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::config::WorldConfig;
use crate::grid::Role;
use crate::world::{MechanicalWorld, Placement, WorldError};

// ---------------------------------------------------------------------------
// Constants
// ---------------------------------------------------------------------------

/// Magic number identifying a Millwork world snapshot.
pub const SNAPSHOT_MAGIC: u32 = 0x4D11_0001;

/// Current format version. Increment when breaking the wire format.
pub const FORMAT_VERSION: u32 = 1;

// ---------------------------------------------------------------------------
// Error types
// ---------------------------------------------------------------------------

#[derive(Debug, thiserror::Error)]
pub enum SnapshotError {
    #[error("bitcode encoding failed: {0}")]
    Encode(String),
    #[error("bitcode decoding failed: {0}")]
    Decode(String),
    #[error("invalid magic number: expected 0x{:08X}, got 0x{:08X}", SNAPSHOT_MAGIC, .0)]
    InvalidMagic(u32),
    #[error("unsupported format version: expected {}, got {}", FORMAT_VERSION, .0)]
    UnsupportedVersion(u32),
    #[error("snapshot from future version {0} (this build supports up to {FORMAT_VERSION})")]
    FutureVersion(u32),
    #[error("node built for {expected} reports position {found}")]
    PositionMismatch { expected: BlockPos, found: BlockPos },
    #[error("replaying the block at {0} would merge two networks")]
    Rejected(BlockPos),
    #[error(transparent)]
    World(#[from] WorldError),
}

// ---------------------------------------------------------------------------
// Snapshot types
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SnapshotHeader {
    pub magic: u32,
    pub version: u32,
    /// World revision at capture time.
    pub revision: u64,
}

impl SnapshotHeader {
    pub fn new(revision: u64) -> Self {
        Self {
            magic: SNAPSHOT_MAGIC,
            version: FORMAT_VERSION,
            revision,
        }
    }

    pub fn validate(&self) -> Result<(), SnapshotError> {
        if self.magic != SNAPSHOT_MAGIC {
            return Err(SnapshotError::InvalidMagic(self.magic));
        }
        if self.version > FORMAT_VERSION {
            return Err(SnapshotError::FutureVersion(self.version));
        }
        if self.version < FORMAT_VERSION {
            return Err(SnapshotError::UnsupportedVersion(self.version));
        }
        Ok(())
    }
}

/// One block as it was at capture time.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BlockRecord {
    pub pos: BlockPos,
    pub connections: DirectionSet,
    pub role: Role,
    pub network: Option<NetworkId>,
    pub source: Option<Direction>,
    pub source_rotation: Option<Rotation>,
}

impl BlockRecord {
    fn capture(node: &dyn Node, role: Role) -> Self {
        Self {
            pos: node.pos(),
            connections: node.connections(),
            role,
            network: node.network(),
            source: node.source(),
            source_rotation: node.source_rotation(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct WorldSnapshot {
    pub header: SnapshotHeader,
    /// Oldest placement first.
    pub blocks: Vec<BlockRecord>,
}

impl WorldSnapshot {
    pub fn encode(&self) -> Result<Vec<u8>, SnapshotError> {
        bitcode::serialize(self).map_err(|e| SnapshotError::Encode(e.to_string()))
    }

    /// Decode and check the header.
    pub fn decode(data: &[u8]) -> Result<Self, SnapshotError> {
        let snapshot: WorldSnapshot =
            bitcode::deserialize(data).map_err(|e| SnapshotError::Decode(e.to_string()))?;
        snapshot.header.validate()?;
        Ok(snapshot)
    }
}

// ---------------------------------------------------------------------------
// Capture and replay
// ---------------------------------------------------------------------------

impl MechanicalWorld {
    pub fn snapshot(&self) -> WorldSnapshot {
        WorldSnapshot {
            header: SnapshotHeader::new(self.revision()),
            blocks: self
                .grid()
                .iter()
                .map(|(node, role)| BlockRecord::capture(node, role))
                .collect(),
        }
    }

    /// Rebuild a world by placing every recorded block in order.
    ///
    /// `build` turns a record into a fresh, disconnected node at the
    /// record's position. A placement the manager refuses means the
    /// snapshot did not come from a consistent world.
    pub fn restore<F>(
        snapshot: &WorldSnapshot,
        config: WorldConfig,
        mut build: F,
    ) -> Result<Self, SnapshotError>
    where
        F: FnMut(&BlockRecord) -> Box<dyn Node>,
    {
        snapshot.header.validate()?;

        let mut world = MechanicalWorld::new(config);
        for record in &snapshot.blocks {
            let node = build(record);
            if node.pos() != record.pos {
                return Err(SnapshotError::PositionMismatch {
                    expected: record.pos,
                    found: node.pos(),
                });
            }
            if let Placement::Broken(_) = world.admit(node, record.role)? {
                return Err(SnapshotError::Rejected(record.pos));
            }
        }
        world.set_revision(snapshot.header.revision);

        debug!(
            blocks = snapshot.blocks.len(),
            networks = world.manager().len(),
            "restored world from snapshot"
        );
        Ok(world)
    }
}
