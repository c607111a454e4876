#![deny(
    unsafe_code,
    missing_docs,
    dead_code,
    unused_results,
    non_snake_case,
    unreachable_pub
)]

//! Zone lifecycle system that decides expiries, contacts, bonus re-rolls and
//! replacements.
//!
//! The system never mutates the world directly. Each phase reads immutable
//! views and appends [`Command`]s; the engine applies one batch before asking
//! for the next, so removals never happen while the zone set is being walked.

use std::time::Duration;

use capture_zones_core::{
    bearing_degrees, reflect_velocity, Board, BonusSector, Command, ContaminationView, Footprint,
    Placement, PlayerBody, ReplacementMode, RosterTimer, TileCoord, Tunables, ZoneProfile,
    ZoneView,
};
use capture_zones_system_placement::{
    obstacles, Obstacle, PlacementError, PlacementRequest, PlacementRules, PlacementSearch,
};
use rand::{Rng, SeedableRng};
use rand_chacha::ChaCha8Rng;
use tracing::{debug, warn};

const ALPHA_EPSILON: f32 = 1e-4;
const MAX_RELAXATION_PASSES: u32 = 1_000;
const BONUS_STREAM: u64 = 0x9e37_79b9_7f4a_7c15;

/// One entry of the configured roster.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct RosterSlot {
    /// Index of the profile in the configuration file.
    pub profile_index: usize,
    /// Profile the slot spawns.
    pub profile: ZoneProfile,
}

#[derive(Clone, Copy, Debug)]
struct PendingSlot {
    profile_index: usize,
    due: Duration,
    warned: bool,
}

/// Pure system driving the zone roster.
#[derive(Debug)]
pub struct Lifecycle {
    roster: Vec<RosterSlot>,
    tunables: Tunables,
    search: PlacementSearch,
    bonus_rng: ChaCha8Rng,
    pending: Vec<PendingSlot>,
    batch_timer: Option<RosterTimer>,
}

impl Lifecycle {
    /// Creates a lifecycle for the provided roster. Nothing is scheduled until
    /// [`Lifecycle::schedule_roster`] is called.
    #[must_use]
    pub fn new(roster: Vec<RosterSlot>, tunables: Tunables) -> Self {
        let search = PlacementSearch::new(PlacementRules::from_tunables(&tunables), tunables.rng_seed);
        let bonus_rng = ChaCha8Rng::seed_from_u64(tunables.rng_seed ^ BONUS_STREAM);
        Self {
            roster,
            tunables,
            search,
            bonus_rng,
            pending: Vec::new(),
            batch_timer: None,
        }
    }

    /// Roster slots the lifecycle keeps populated.
    #[must_use]
    pub fn roster(&self) -> &[RosterSlot] {
        &self.roster
    }

    /// Tunables in force.
    #[must_use]
    pub fn tunables(&self) -> &Tunables {
        &self.tunables
    }

    /// Replaces the roster and schedules every slot for immediate placement.
    pub fn set_roster(&mut self, roster: Vec<RosterSlot>, now: Duration) {
        self.roster = roster;
        self.schedule_roster(now);
    }

    /// Discards pending work and schedules every roster slot at `now`.
    ///
    /// In batch mode this also ends the shared countdown; the next placement
    /// starts a fresh one.
    pub fn schedule_roster(&mut self, now: Duration) {
        self.batch_timer = None;
        self.pending = self
            .roster
            .iter()
            .map(|slot| PendingSlot {
                profile_index: slot.profile_index,
                due: now,
                warned: false,
            })
            .collect();
    }

    /// Countdown shared by the current batch roster, once one was started.
    #[must_use]
    pub fn batch_timer(&self) -> Option<RosterTimer> {
        self.batch_timer
    }

    /// Number of roster slots waiting to be placed.
    #[must_use]
    pub fn pending_slots(&self) -> usize {
        self.pending.len()
    }

    /// Expires every zone whose countdown reached zero.
    ///
    /// In batch mode a single expiry force-expires the whole live set and
    /// regenerates the roster.
    pub fn resolve_expiries(&mut self, zones: &ZoneView, now: Duration, out: &mut Vec<Command>) {
        let expired: Vec<_> = zones.iter().filter(|zone| zone.is_expired()).collect();
        if expired.is_empty() {
            return;
        }

        match self.tunables.replacement_mode {
            ReplacementMode::Independent => {
                let due = now.saturating_add(self.tunables.respawn_delay());
                for zone in expired {
                    debug!(zone = zone.id.get(), "zone expired");
                    out.push(Command::ExpireZone { zone: zone.id });
                    self.schedule(zone.profile_index, due);
                }
            }
            ReplacementMode::Batch => {
                debug!(
                    expired = expired.len(),
                    live = zones.len(),
                    "expiry triggered a roster reset"
                );
                out.extend(zones.iter().map(|zone| Command::ExpireZone { zone: zone.id }));
                out.push(Command::ResetRoster);
                self.schedule_roster(now);
            }
        }
    }

    /// Evaluates the player's contact with every live zone.
    ///
    /// Zones whose requirement is met are consumed once the lock elapsed and
    /// the player re-entered; other zones bounce the player and award hits,
    /// subject to the bounce cooldown.
    pub fn evaluate_contacts(
        &mut self,
        board: &dyn Board,
        zones: &ZoneView,
        now: Duration,
        player: &mut dyn PlayerBody,
        out: &mut Vec<Command>,
    ) {
        let tile_length = board.tile_length();
        let tolerance = self.tunables.touch_tolerance_tiles.max(0.0) * tile_length;
        let max_speed = self.tunables.max_bounce_speed_tiles.max(0.0) * tile_length;
        let mut consumed = 0;

        for zone in zones.iter() {
            let position = player.position();
            let reach = zone.radius_world + tolerance;
            let inside = zone.center_world.distance_squared(position) <= reach * reach;

            if !inside {
                if zone.must_exit_first {
                    out.push(Command::ClearExitRequirement { zone: zone.id });
                }
                continue;
            }

            if zone.requirement_met() {
                if now < zone.consume_lock_until || zone.must_exit_first {
                    continue;
                }
                if self.tunables.cleanse_on_consume {
                    out.push(Command::CleanseFootprint { zone: zone.id });
                }
                out.push(Command::ConsumeZone { zone: zone.id });
                consumed += 1;
                debug!(zone = zone.id.get(), reward = zone.reward, "zone consumed");
                if self.tunables.replacement_mode == ReplacementMode::Independent {
                    let due = now.saturating_add(self.tunables.respawn_delay());
                    self.schedule(zone.profile_index, due);
                }
                continue;
            }

            if let Some(last) = zone.last_bounce_at {
                if now.saturating_sub(last) < self.tunables.bounce_cooldown() {
                    continue;
                }
            }

            let reflected = reflect_velocity(player.velocity(), position - zone.center_world);
            player.set_velocity(reflected.clamp_length_max(max_speed));

            let bearing = bearing_degrees(zone.center_world, position);
            let was_bonus = zone.bonus.is_some_and(|sector| sector.contains(bearing));
            let (award, reroll_at) = if was_bonus {
                (
                    self.tunables.bonus_hit_award,
                    Some(now.saturating_add(self.tunables.bonus_reroll_delay())),
                )
            } else {
                (self.tunables.normal_hit_award, None)
            };

            debug!(zone = zone.id.get(), award, was_bonus, "player bounced off zone");
            out.push(Command::RegisterBounce {
                zone: zone.id,
                award,
                was_bonus,
                lock_until: now.saturating_add(self.tunables.consume_lock()),
                reroll_at,
            });
        }

        if self.tunables.replacement_mode == ReplacementMode::Batch
            && consumed > 0
            && consumed == zones.len()
        {
            debug!("last zone consumed; regenerating roster");
            out.push(Command::ResetRoster);
            self.schedule_roster(now);
        }
    }

    /// Re-rolls bonus sectors whose scheduled re-roll time has passed.
    pub fn reroll_bonus_sectors(&mut self, zones: &ZoneView, now: Duration, out: &mut Vec<Command>) {
        for zone in zones.iter() {
            let due = zone
                .bonus
                .and_then(|sector| sector.reroll_at)
                .is_some_and(|at| at <= now);
            if due {
                out.push(Command::RerollBonusSector {
                    zone: zone.id,
                    angle_degrees: self.random_angle(),
                });
            }
        }
    }

    /// Attempts to place every pending slot whose respawn time has arrived.
    ///
    /// Slots that cannot be placed stay pending and are retried on the next
    /// call; each slot is reported once until it finally spawns.
    pub fn refill(
        &mut self,
        board: &dyn Board,
        contamination: &ContaminationView<'_>,
        zones: &ZoneView,
        player_tile: Option<TileCoord>,
        now: Duration,
        out: &mut Vec<Command>,
    ) {
        if self.pending.is_empty() {
            return;
        }

        let mut claimed = obstacles(zones);
        let mut still_pending = Vec::new();

        for mut entry in std::mem::take(&mut self.pending) {
            if entry.due > now {
                still_pending.push(entry);
                continue;
            }
            let Some(slot) = self.slot(entry.profile_index) else {
                continue;
            };
            let footprint = slot.profile.footprint;

            let Some(placement) =
                self.place(board, contamination, &claimed, footprint, player_tile)
            else {
                if !entry.warned {
                    warn!(
                        profile = entry.profile_index,
                        width = footprint.width(),
                        height = footprint.height(),
                        "no room for zone; running with fewer zones"
                    );
                    entry.warned = true;
                }
                still_pending.push(entry);
                continue;
            };

            claimed.push(Obstacle::from_placement(board, footprint, &placement));
            let bonus = if slot.profile.bonus_arc_enabled {
                Some(BonusSector {
                    angle_degrees: self.random_angle(),
                    arc_width_degrees: self.tunables.bonus_arc_width_degrees,
                    reroll_at: None,
                })
            } else {
                None
            };
            let timer = self.roster_timer(now);
            out.push(Command::SpawnZone {
                profile_index: slot.profile_index,
                profile: slot.profile,
                placement,
                bonus,
                timer,
            });
        }

        self.pending = still_pending;
    }

    fn place(
        &mut self,
        board: &dyn Board,
        contamination: &ContaminationView<'_>,
        claimed: &[Obstacle],
        footprint: Footprint,
        player_tile: Option<TileCoord>,
    ) -> Option<Placement> {
        for alpha in alpha_schedule(&self.tunables) {
            let request = PlacementRequest {
                footprint,
                alpha,
                player_tile,
            };
            match self.search.try_place(board, contamination, claimed, &request) {
                Ok(placement) => return Some(placement),
                Err(PlacementError::Exhausted { .. }) => continue,
                Err(error) => {
                    debug!(%error, "placement impossible for footprint");
                    return None;
                }
            }
        }

        if !self.tunables.linear_scan_fallback {
            return None;
        }
        match self.search.scan_first_fit(board, claimed, footprint) {
            Ok(placement) => {
                debug!(
                    column = placement.center.column(),
                    row = placement.center.row(),
                    "placed zone with first-fit fallback"
                );
                Some(placement)
            }
            Err(_) => None,
        }
    }

    /// Shared countdown for batch spawns, lasting as long as the shortest
    /// roster lifetime. A countdown that already ran out is restarted.
    fn roster_timer(&mut self, now: Duration) -> Option<RosterTimer> {
        if self.tunables.replacement_mode != ReplacementMode::Batch {
            return None;
        }
        if let Some(timer) = self.batch_timer.filter(|timer| timer.expires_at > now) {
            return Some(timer);
        }
        let lifetime = self
            .roster
            .iter()
            .filter_map(|slot| slot.profile.lifetime())
            .min()?;
        let timer = RosterTimer::start(lifetime, now);
        debug!(seconds = lifetime.as_secs_f32(), "started batch roster timer");
        self.batch_timer = Some(timer);
        Some(timer)
    }

    fn schedule(&mut self, profile_index: usize, due: Duration) {
        if let Some(entry) = self
            .pending
            .iter_mut()
            .find(|entry| entry.profile_index == profile_index)
        {
            entry.due = entry.due.min(due);
            return;
        }
        self.pending.push(PendingSlot {
            profile_index,
            due,
            warned: false,
        });
    }

    fn slot(&self, profile_index: usize) -> Option<RosterSlot> {
        self.roster
            .iter()
            .find(|slot| slot.profile_index == profile_index)
            .copied()
    }

    fn random_angle(&mut self) -> f32 {
        self.bonus_rng.gen_range(0.0..360.0)
    }
}

/// Clean-ratio thresholds tried in order: the base threshold, then lowered by
/// the relaxation step until the floor is reached.
#[must_use]
pub fn alpha_schedule(tunables: &Tunables) -> Vec<f32> {
    let base = tunables.base_alpha;
    let floor = tunables.min_alpha.min(base);
    let step = tunables.alpha_relax_step;

    let mut schedule = vec![base];
    if !step.is_finite() || step <= 0.0 {
        return schedule;
    }
    for pass in 1..=MAX_RELAXATION_PASSES {
        let alpha = base - step * pass as f32;
        if alpha < floor - ALPHA_EPSILON {
            break;
        }
        schedule.push(alpha.max(floor));
    }
    schedule
}
