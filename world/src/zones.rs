//! Authoritative zone state and identifier allocation.

use std::{collections::BTreeMap, time::Duration};

use capture_zones_core::{elapsed_fraction, BonusSector, Footprint, TileCoord, ZoneId, ZoneSnapshot};
use glam::Vec2;

/// Live zone stored inside the world.
#[derive(Clone, Debug)]
pub(crate) struct Zone {
    /// Identifier assigned at spawn.
    pub(crate) id: ZoneId,
    /// Roster slot the zone fills.
    pub(crate) profile_index: usize,
    /// Footprint copied from the profile.
    pub(crate) footprint: Footprint,
    /// Reward granted on consumption.
    pub(crate) reward: u32,
    /// Tile at the centre of the footprint block.
    pub(crate) center_tile: TileCoord,
    /// World-space centre of the circular footprint.
    pub(crate) center_world: Vec2,
    /// World-space radius used for contact and contamination.
    pub(crate) radius_world: f32,
    /// Tiles covered by the footprint block.
    pub(crate) footprint_tiles: Vec<TileCoord>,
    /// Full countdown length.
    pub(crate) lifetime: Duration,
    /// Time left before expiry.
    pub(crate) remaining: Duration,
    /// Hits awarded by bounces so far.
    pub(crate) accumulated_hits: u32,
    /// Hits needed before the zone can be consumed.
    pub(crate) required_hits: u32,
    /// Simulation time before which consumption is locked.
    pub(crate) consume_lock_until: Duration,
    /// Whether the player must leave the radius before consuming.
    pub(crate) must_exit_first: bool,
    /// Simulation time of the latest bounce.
    pub(crate) last_bounce_at: Option<Duration>,
    /// Bonus sector, when the profile enables one.
    pub(crate) bonus: Option<BonusSector>,
}

impl Zone {
    pub(crate) fn snapshot(&self) -> ZoneSnapshot {
        ZoneSnapshot {
            id: self.id,
            profile_index: self.profile_index,
            footprint: self.footprint,
            reward: self.reward,
            center_tile: self.center_tile,
            center_world: self.center_world,
            radius_world: self.radius_world,
            footprint_tiles: self.footprint_tiles.clone(),
            lifetime: self.lifetime,
            remaining: self.remaining,
            accumulated_hits: self.accumulated_hits,
            required_hits: self.required_hits,
            consume_lock_until: self.consume_lock_until,
            must_exit_first: self.must_exit_first,
            last_bounce_at: self.last_bounce_at,
            bonus: self.bonus,
        }
    }

    pub(crate) fn progress(&self) -> f32 {
        elapsed_fraction(self.lifetime, self.remaining)
    }
}

/// Registry that stores live zones keyed by identifier.
#[derive(Debug)]
pub(crate) struct ZoneRegistry {
    entries: BTreeMap<ZoneId, Zone>,
    next_zone_id: ZoneId,
}

impl ZoneRegistry {
    /// Creates an empty registry with a reset identifier counter.
    pub(crate) fn new() -> Self {
        Self {
            entries: BTreeMap::new(),
            next_zone_id: ZoneId::new(0),
        }
    }

    /// Reserves the next identifier. Identifiers are never reused.
    pub(crate) fn allocate_id(&mut self) -> ZoneId {
        let id = self.next_zone_id;
        self.next_zone_id = ZoneId::new(id.get().wrapping_add(1));
        id
    }

    pub(crate) fn insert(&mut self, zone: Zone) {
        let _ = self.entries.insert(zone.id, zone);
    }

    pub(crate) fn remove(&mut self, id: ZoneId) -> Option<Zone> {
        self.entries.remove(&id)
    }

    pub(crate) fn get(&self, id: ZoneId) -> Option<&Zone> {
        self.entries.get(&id)
    }

    pub(crate) fn get_mut(&mut self, id: ZoneId) -> Option<&mut Zone> {
        self.entries.get_mut(&id)
    }

    pub(crate) fn iter(&self) -> impl Iterator<Item = &Zone> {
        self.entries.values()
    }

    pub(crate) fn iter_mut(&mut self) -> impl Iterator<Item = &mut Zone> {
        self.entries.values_mut()
    }

    pub(crate) fn len(&self) -> usize {
        self.entries.len()
    }

    pub(crate) fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub(crate) fn clear(&mut self) {
        self.entries.clear();
    }

    /// Reports whether any live zone already occupies the tile.
    pub(crate) fn occupies(&self, tile: TileCoord) -> bool {
        self.entries
            .values()
            .any(|zone| zone.footprint_tiles.contains(&tile))
    }
}
