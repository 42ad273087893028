// ── Generation tagging ──
//
// Every refresh request takes a ticket when it is issued. A response may
// only be applied if its ticket is still the newest one handed out, so a
// slow early request can never overwrite the result of a later one.

use std::sync::atomic::{AtomicU64, Ordering};

/// Monotonic request ticket.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Generation(u64);

impl Generation {
    pub const fn get(self) -> u64 {
        self.0
    }
}

/// Issues tickets and decides which responses are still current.
#[derive(Debug, Default)]
pub struct GenerationGate {
    latest: AtomicU64,
}

impl GenerationGate {
    pub fn new() -> Self {
        Self::default()
    }

    /// Take a ticket for a request about to be issued.
    pub fn issue(&self) -> Generation {
        Generation(self.latest.fetch_add(1, Ordering::AcqRel) + 1)
    }

    /// `true` if no request has been issued after `ticket`.
    pub fn is_current(&self, ticket: Generation) -> bool {
        self.latest.load(Ordering::Acquire) == ticket.0
    }

    /// Number of tickets issued so far.
    pub fn issued(&self) -> u64 {
        self.latest.load(Ordering::Acquire)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn only_the_newest_ticket_is_current() {
        let gate = GenerationGate::new();
        let first = gate.issue();
        assert!(gate.is_current(first));

        let second = gate.issue();
        assert!(!gate.is_current(first));
        assert!(gate.is_current(second));
        assert!(second > first);
        assert_eq!(gate.issued(), 2);
    }
}
