#![deny(
    unsafe_code,
    missing_docs,
    dead_code,
    unused_results,
    non_snake_case,
    unreachable_pub
)]

//! Authoritative zone and contamination state for the capture zone engine.
//!
//! The world is the only place where zones and tiles change. Every mutation
//! arrives as a [`Command`] through [`apply`], and every observable change is
//! reported back as an [`Event`].

mod contamination;
mod zones;

use std::time::Duration;

use capture_zones_core::{
    normalize_degrees, Board, BonusSector, Command, Event, Placement, RosterTimer, TileGrid,
    ZoneProfile,
};
use tracing::{debug, warn};

pub use contamination::ContaminationGrid;
use zones::{Zone, ZoneRegistry};

/// Represents the authoritative capture zone world state.
#[derive(Debug)]
pub struct World {
    board: Option<BoardState>,
    zones: ZoneRegistry,
    clock: Duration,
    roster_generation: u64,
}

#[derive(Debug)]
struct BoardState {
    grid: TileGrid,
    contamination: ContaminationGrid,
}

impl World {
    /// Creates a world without a board. Configure one before spawning zones.
    #[must_use]
    pub fn new() -> Self {
        Self {
            board: None,
            zones: ZoneRegistry::new(),
            clock: Duration::ZERO,
            roster_generation: 0,
        }
    }

    /// Creates a world whose board is already configured.
    #[must_use]
    pub fn with_board(grid: TileGrid) -> Self {
        let mut world = Self::new();
        let mut events = Vec::new();
        apply(&mut world, Command::ConfigureBoard { grid }, &mut events);
        world
    }

    fn spawn_zone(
        &mut self,
        profile_index: usize,
        profile: ZoneProfile,
        placement: Placement,
        bonus: Option<BonusSector>,
        timer: Option<RosterTimer>,
        out_events: &mut Vec<Event>,
    ) {
        let Some(board) = self.board.as_ref() else {
            warn!(profile_index, "zone spawn ignored: board not configured");
            return;
        };

        let (lifetime, remaining) = match timer {
            Some(timer) => (timer.lifetime, timer.remaining(self.clock)),
            None => {
                let Some(lifetime) = profile.lifetime() else {
                    warn!(profile_index, "zone spawn ignored: lifetime must be positive");
                    return;
                };
                (lifetime, lifetime)
            }
        };
        if remaining.is_zero() {
            warn!(profile_index, "zone spawn ignored: roster timer already elapsed");
            return;
        }

        if profile.footprint.is_empty() || placement.tiles.is_empty() {
            warn!(profile_index, "zone spawn ignored: empty footprint");
            return;
        }

        if !board.grid.in_bounds(placement.center)
            || placement.tiles.iter().any(|tile| !board.grid.in_bounds(*tile))
        {
            warn!(profile_index, "zone spawn ignored: footprint leaves the board");
            return;
        }

        if placement.tiles.iter().any(|tile| self.zones.occupies(*tile)) {
            warn!(profile_index, "zone spawn ignored: footprint overlaps a live zone");
            return;
        }

        let id = self.zones.allocate_id();
        let tile_length = board.grid.tile_length();
        let center_world = board.grid.tile_to_world(placement.center);
        let radius_world = profile.footprint.radius_tiles() * tile_length;
        let bonus = bonus.map(|sector| BonusSector {
            angle_degrees: normalize_degrees(sector.angle_degrees),
            reroll_at: None,
            ..sector
        });

        debug!(
            zone = id.get(),
            profile_index,
            column = placement.center.column(),
            row = placement.center.row(),
            alpha = placement.alpha_used,
            "zone spawned"
        );

        self.zones.insert(Zone {
            id,
            profile_index,
            footprint: profile.footprint,
            reward: profile.reward,
            center_tile: placement.center,
            center_world,
            radius_world,
            footprint_tiles: placement.tiles,
            lifetime,
            remaining,
            accumulated_hits: 0,
            required_hits: profile.required_hits,
            consume_lock_until: Duration::ZERO,
            must_exit_first: false,
            last_bounce_at: None,
            bonus,
        });

        out_events.push(Event::ZoneSpawned {
            zone: id,
            profile_index,
            center: center_world,
            radius: radius_world,
            lifetime,
        });

        if let Some(sector) = bonus {
            out_events.push(Event::BonusSectorChanged {
                zone: id,
                angle_degrees: sector.angle_degrees,
                arc_width_degrees: sector.arc_width_degrees,
            });
        }
    }
}

impl Default for World {
    fn default() -> Self {
        Self::new()
    }
}

/// Applies the provided command to the world, mutating state deterministically.
pub fn apply(world: &mut World, command: Command, out_events: &mut Vec<Event>) {
    match command {
        Command::ConfigureBoard { grid } => {
            if !world.zones.is_empty() {
                world.zones.clear();
                out_events.push(Event::ZonesCleared);
            }
            world.board = Some(BoardState {
                contamination: ContaminationGrid::new(grid.columns(), grid.rows()),
                grid,
            });
        }
        Command::Tick { dt } => {
            world.clock = world.clock.saturating_add(dt);
            for zone in world.zones.iter_mut() {
                zone.remaining = zone.remaining.saturating_sub(dt);
            }
            out_events.push(Event::TimeAdvanced { dt });
        }
        Command::ReportProgress => {
            for zone in world.zones.iter() {
                out_events.push(Event::ZoneProgress {
                    zone: zone.id,
                    progress: zone.progress(),
                });
            }
        }
        Command::SpawnZone {
            profile_index,
            profile,
            placement,
            bonus,
            timer,
        } => world.spawn_zone(profile_index, profile, placement, bonus, timer, out_events),
        Command::ExpireZone { zone } => {
            let Some(expired) = world.zones.remove(zone) else {
                return;
            };

            if let Some(board) = world.board.as_mut() {
                let changed = board
                    .contamination
                    .mark_circle_contaminated(expired.center_tile, expired.footprint.radius_tiles());
                debug!(zone = zone.get(), tiles = changed, "zone expired");
                out_events.push(Event::ContaminationCircle {
                    zone,
                    center: expired.center_world,
                    radius: expired.radius_world,
                });
            }
            out_events.push(Event::ZoneExpired { zone });
        }
        Command::ConsumeZone { zone } => {
            if let Some(consumed) = world.zones.remove(zone) {
                debug!(zone = zone.get(), reward = consumed.reward, "zone consumed");
                out_events.push(Event::ZoneConsumed {
                    zone,
                    reward: consumed.reward,
                });
            }
        }
        Command::RegisterBounce {
            zone,
            award,
            was_bonus,
            lock_until,
            reroll_at,
        } => {
            let now = world.clock;
            let Some(target) = world.zones.get_mut(zone) else {
                return;
            };
            target.accumulated_hits = target.accumulated_hits.saturating_add(award);
            target.consume_lock_until = lock_until;
            target.must_exit_first = true;
            target.last_bounce_at = Some(now);
            if let (Some(sector), Some(at)) = (target.bonus.as_mut(), reroll_at) {
                sector.reroll_at = Some(at);
            }
            out_events.push(Event::HitCountChanged {
                zone,
                hits: target.accumulated_hits,
                required_hits: target.required_hits,
                was_bonus,
            });
        }
        Command::ClearExitRequirement { zone } => {
            if let Some(target) = world.zones.get_mut(zone) {
                target.must_exit_first = false;
            }
        }
        Command::RerollBonusSector {
            zone,
            angle_degrees,
        } => {
            let Some(sector) = world
                .zones
                .get_mut(zone)
                .and_then(|target| target.bonus.as_mut())
            else {
                return;
            };
            sector.angle_degrees = normalize_degrees(angle_degrees);
            sector.reroll_at = None;
            out_events.push(Event::BonusSectorChanged {
                zone,
                angle_degrees: sector.angle_degrees,
                arc_width_degrees: sector.arc_width_degrees,
            });
        }
        Command::AdjustRequiredHits {
            zone,
            required_hits,
        } => {
            if let Some(target) = world.zones.get_mut(zone) {
                target.required_hits = required_hits;
                out_events.push(Event::RequiredHitsChanged {
                    zone,
                    required_hits,
                });
            }
        }
        Command::CleanseFootprint { zone } => {
            let (Some(target), Some(board)) = (world.zones.get(zone), world.board.as_mut()) else {
                return;
            };
            let restored = board.contamination.cleanse(&target.footprint_tiles);
            out_events.push(Event::FootprintCleansed {
                zone,
                tiles: u32::try_from(restored).unwrap_or(u32::MAX),
            });
        }
        Command::ResetRoster => {
            world.roster_generation = world.roster_generation.saturating_add(1);
            out_events.push(Event::RosterReset);
        }
        Command::ClearZones => {
            world.zones.clear();
            out_events.push(Event::ZonesCleared);
        }
    }
}

/// Query functions that provide read-only access to the world state.
pub mod query {
    use std::time::Duration;

    use super::World;
    use capture_zones_core::{ContaminationView, TileGrid, ZoneId, ZoneSnapshot, ZoneView};

    /// Provides the configured board, if any.
    #[must_use]
    pub fn board(world: &World) -> Option<&TileGrid> {
        world.board.as_ref().map(|state| &state.grid)
    }

    /// Exposes a read-only view of the contamination grid.
    #[must_use]
    pub fn contamination_view(world: &World) -> Option<ContaminationView<'_>> {
        world
            .board
            .as_ref()
            .map(|state| state.contamination.view())
    }

    /// Captures a read-only view of every live zone.
    #[must_use]
    pub fn zone_view(world: &World) -> ZoneView {
        ZoneView::from_snapshots(world.zones.iter().map(|zone| zone.snapshot()).collect())
    }

    /// Captures a single live zone, if it exists.
    #[must_use]
    pub fn zone(world: &World, zone: ZoneId) -> Option<ZoneSnapshot> {
        world.zones.get(zone).map(|zone| zone.snapshot())
    }

    /// Number of live zones.
    #[must_use]
    pub fn zone_count(world: &World) -> usize {
        world.zones.len()
    }

    /// Simulation time accumulated from every applied tick.
    #[must_use]
    pub fn clock(world: &World) -> Duration {
        world.clock
    }

    /// Number of times the roster was regenerated as a whole.
    #[must_use]
    pub fn roster_generation(world: &World) -> u64 {
        world.roster_generation
    }
}
