//! Running totals gathered from engine events and reward grants.

use capture_zones_core::{Event, RewardSink};

/// Reward sink that accumulates every grant.
#[derive(Clone, Copy, Debug, Default)]
pub(crate) struct Wallet {
    pub(crate) total: u64,
    pub(crate) grants: u32,
}

impl RewardSink for Wallet {
    fn grant(&mut self, amount: u32) {
        self.total = self.total.saturating_add(u64::from(amount));
        self.grants = self.grants.saturating_add(1);
    }
}

/// Event counters reported at the end of a session.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub(crate) struct Tally {
    pub(crate) spawned: u32,
    pub(crate) consumed: u32,
    pub(crate) expired: u32,
    pub(crate) bounces: u32,
    pub(crate) bonus_hits: u32,
    pub(crate) roster_resets: u32,
}

impl Tally {
    pub(crate) fn record(&mut self, event: &Event) {
        let counter = match event {
            Event::ZoneSpawned { .. } => &mut self.spawned,
            Event::ZoneConsumed { .. } => &mut self.consumed,
            Event::ZoneExpired { .. } => &mut self.expired,
            Event::HitCountChanged { was_bonus, .. } => {
                if *was_bonus {
                    self.bonus_hits += 1;
                }
                &mut self.bounces
            }
            Event::RosterReset => &mut self.roster_resets,
            _ => return,
        };
        *counter += 1;
    }
}
