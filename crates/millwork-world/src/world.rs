//! The block lifecycle layer: places, changes and removes nodes, and keeps
//! the network manager informed.

use millwork_core::{BlockPos, Direction, DirectionSet, Node, Rotation};
use millwork_network::{
    InvariantViolation, NetworkEvent, RotationNetwork, RotationNetworkManager, validate,
    validate_membership,
};
use tracing::{debug, error};

use crate::config::WorldConfig;
use crate::grid::{Grid, GridError, Role};

/// Outcome of a placement or in-place change.
#[derive(Debug)]
pub enum Placement {
    /// The block stays in the world.
    Kept,
    /// The block would have joined two networks and was removed from the
    /// world. The caller decides what to do with it (drop it as an item,
    /// refund it, ...).
    Broken(Box<dyn Node>),
}

impl Placement {
    pub fn is_kept(&self) -> bool {
        matches!(self, Placement::Kept)
    }
}

/// Errors from world operations. Broken blocks are not errors; see
/// [`Placement`].
#[derive(Debug, thiserror::Error)]
pub enum WorldError {
    #[error(transparent)]
    Grid(#[from] GridError),
}

// ---------------------------------------------------------------------------
// MechanicalWorld
// ---------------------------------------------------------------------------

/// A grid of mechanical blocks plus the rotation networks running through it.
#[derive(Debug, Default)]
pub struct MechanicalWorld {
    grid: Grid,
    manager: RotationNetworkManager,
    config: WorldConfig,
    revision: u64,
}

impl MechanicalWorld {
    pub fn new(config: WorldConfig) -> Self {
        let mut manager = RotationNetworkManager::new();
        manager.set_record_events(config.record_events);
        Self {
            grid: Grid::new(),
            manager,
            config,
            revision: 0,
        }
    }

    // -- Lifecycle --

    /// Place a block that drives its own network.
    pub fn place_source(&mut self, node: Box<dyn Node>) -> Result<Placement, WorldError> {
        self.admit(node, Role::Source)
    }

    /// Place a block that carries rotation.
    pub fn place(&mut self, node: Box<dyn Node>) -> Result<Placement, WorldError> {
        self.admit(node, Role::Relay)
    }

    /// Change the connections of the block at `pos` in place.
    pub fn reorient(
        &mut self,
        pos: BlockPos,
        connections: DirectionSet,
    ) -> Result<Placement, WorldError> {
        self.modify(pos, |node| node.state_mut().set_connections(connections))
    }

    /// Apply `change` to the block at `pos`, then revalidate its network.
    ///
    /// Use this for anything that alters what a block connects to or emits.
    /// `change` must not touch the node's network state.
    pub fn modify<F>(&mut self, pos: BlockPos, change: F) -> Result<Placement, WorldError>
    where
        F: FnOnce(&mut dyn Node),
    {
        let node = self.grid.get_mut(pos).ok_or(GridError::Vacant(pos))?;
        change(node);
        let kept = self.manager.update(&mut self.grid, pos);
        self.settle(pos, kept)
    }

    /// Remove the block at `pos` from the world and hand it back.
    pub fn destroy(&mut self, pos: BlockPos) -> Result<Box<dyn Node>, WorldError> {
        if !self.grid.contains(pos) {
            return Err(GridError::Vacant(pos).into());
        }
        self.manager.remove(&mut self.grid, pos);
        let node = self.grid.take(pos)?;
        self.revision += 1;
        debug!(%pos, "destroyed block");
        self.verify();
        Ok(node)
    }

    /// Remove every block and network.
    pub fn clear(&mut self) {
        self.manager.clear(&mut self.grid);
        self.grid = Grid::new();
        self.revision += 1;
    }

    pub(crate) fn admit(&mut self, node: Box<dyn Node>, role: Role) -> Result<Placement, WorldError> {
        let pos = node.pos();
        self.grid.insert(node, role)?;
        let kept = match role {
            Role::Source => self.manager.add_source(&mut self.grid, pos),
            Role::Relay => self.manager.add(&mut self.grid, pos),
        };
        self.settle(pos, kept)
    }

    /// Finish a mutation: break the block if the manager refused it.
    fn settle(&mut self, pos: BlockPos, kept: bool) -> Result<Placement, WorldError> {
        self.revision += 1;
        let placement = if kept {
            Placement::Kept
        } else {
            let node = self.grid.take(pos)?;
            debug!(%pos, "broke block that would merge networks");
            Placement::Broken(node)
        };
        self.verify();
        Ok(placement)
    }

    fn verify(&self) {
        if !self.config.verify_invariants {
            return;
        }
        for violation in self.validate() {
            error!(%violation, "rotation network invariant violated");
        }
    }

    // -- Queries --

    pub fn node(&self, pos: BlockPos) -> Option<&dyn Node> {
        self.grid.get(pos)
    }

    pub fn network_of(&self, pos: BlockPos) -> Option<&RotationNetwork> {
        self.manager.network_of(&self.grid, pos)
    }

    /// The rotation the block at `pos` emits toward `exit`, if it is driven.
    pub fn rotation_at(&self, pos: BlockPos, exit: Direction) -> Option<Rotation> {
        self.manager.rotation_at(&self.grid, pos, exit)
    }

    /// Every tree and membership violation in the current state.
    pub fn validate(&self) -> Vec<InvariantViolation> {
        let mut violations = validate(&self.manager, &self.grid);
        violations.extend(validate_membership(
            &self.manager,
            &self.grid,
            self.grid.positions(),
        ));
        violations
    }

    pub fn describe(&self) -> String {
        self.manager.describe(&self.grid)
    }

    pub fn drain_events(&mut self) -> Vec<NetworkEvent> {
        self.manager.drain_events()
    }

    pub fn grid(&self) -> &Grid {
        &self.grid
    }

    pub fn manager(&self) -> &RotationNetworkManager {
        &self.manager
    }

    pub fn config(&self) -> &WorldConfig {
        &self.config
    }

    /// Number of mutations applied so far.
    pub fn revision(&self) -> u64 {
        self.revision
    }

    pub(crate) fn set_revision(&mut self, revision: u64) {
        self.revision = revision;
    }
}
