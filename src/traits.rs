//! Seams between the dispatch core and its collaborators.
//!
//! The core never talks to storage, mail or a map service directly. Tickets
//! come in through a [`TicketSource`] and walking distances come from a
//! [`PathProvider`], so callers can swap either for a fake in tests.

use crate::error::TicketError;
use crate::pathfinding::{FacilityCoord, PathResult};
use crate::ticket::Ticket;

/// Supplies an already-validated snapshot of tickets.
pub trait TicketSource {
    fn fetch_tickets(&self) -> Result<Vec<Ticket>, TicketError>;
}

impl TicketSource for Vec<Ticket> {
    fn fetch_tickets(&self) -> Result<Vec<Ticket>, TicketError> {
        Ok(self.clone())
    }
}

/// Shortest walking paths across a multi-floor facility.
///
/// Implementations must be `Sync` so candidate searches can run on the
/// rayon pool.
pub trait PathProvider: Sync {
    /// Cheapest path from `start` to `goal`, or `None` when either end is
    /// not walkable or no connection exists.
    fn find_path(&self, start: &FacilityCoord, goal: &FacilityCoord) -> Option<PathResult>;

    /// Position of a floor in the vertical ordering (0 = lowest).
    fn floor_rank(&self, floor_id: &str) -> Option<usize>;
}
