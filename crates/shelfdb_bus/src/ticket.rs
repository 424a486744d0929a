//! Publish tickets.

use std::fmt;
use std::sync::atomic::{AtomicU64, Ordering};

/// Identifier assigned to one publish call.
///
/// Tickets come from a monotonic sequence, so two publishes never share
/// one. They identify a publish in logs; the completion signal itself is
/// paired with its publish by channel, not by ticket lookup.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Ticket(pub u64);

impl Ticket {
    /// Returns the raw sequence value.
    #[must_use]
    pub const fn as_u64(self) -> u64 {
        self.0
    }
}

impl fmt::Display for Ticket {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "ticket:{}", self.0)
    }
}

/// Monotonic ticket source.
#[derive(Debug, Default)]
pub struct TicketSequence(AtomicU64);

impl TicketSequence {
    /// Creates a sequence starting at zero.
    #[must_use]
    pub const fn new() -> Self {
        Self(AtomicU64::new(0))
    }

    /// Returns the next ticket.
    pub fn next(&self) -> Ticket {
        Ticket(self.0.fetch_add(1, Ordering::Relaxed))
    }
}
