#![deny(
    unsafe_code,
    missing_docs,
    dead_code,
    unused_results,
    non_snake_case,
    unreachable_pub
)]

//! Core contracts shared across the capture zone engine.
//!
//! This crate defines the message surface that connects the authoritative
//! world, the pure placement and lifecycle systems, and the engine that drives
//! them. Systems inspect immutable views and respond with [`Command`] batches,
//! the world executes those commands via its `apply` entry point, and then
//! broadcasts [`Event`] notifications that presentation collaborators
//! (rendering, audio, UI) subscribe to.

use std::time::Duration;

use glam::Vec2;
use serde::{Deserialize, Serialize};

mod config;

pub use config::{ReplacementMode, Tunables, ZoneConfig, ZoneProfile};

/// Commands that express all permissible world mutations.
#[derive(Clone, Debug, PartialEq)]
pub enum Command {
    /// Configures the board and allocates an all-clean contamination grid.
    ///
    /// Any live zones are cleared first without contaminating their tiles.
    ConfigureBoard {
        /// Tile layout that replaces the current board.
        grid: TileGrid,
    },
    /// Advances the simulation clock and every zone countdown.
    Tick {
        /// Duration of simulated time that elapsed since the previous tick.
        dt: Duration,
    },
    /// Publishes a progress notification for every live zone.
    ReportProgress,
    /// Creates a new zone at a location chosen by the placement search.
    SpawnZone {
        /// Roster slot the zone fills.
        profile_index: usize,
        /// Profile describing the zone's footprint, requirement and reward.
        profile: ZoneProfile,
        /// Location accepted by the placement search.
        placement: Placement,
        /// Initial bonus sector, present when the profile enables one.
        bonus: Option<BonusSector>,
        /// Roster-wide countdown that replaces the profile lifetime in batch
        /// mode.
        timer: Option<RosterTimer>,
    },
    /// Expires a zone, contaminating its circular footprint.
    ExpireZone {
        /// Zone that ran out of time.
        zone: ZoneId,
    },
    /// Consumes a zone whose entry requirement was satisfied.
    ConsumeZone {
        /// Zone being captured.
        zone: ZoneId,
    },
    /// Records an insufficient-hit contact that bounced the player.
    RegisterBounce {
        /// Zone that was struck.
        zone: ZoneId,
        /// Hits awarded by the contact.
        award: u32,
        /// Indicates whether the contact landed inside the bonus sector.
        was_bonus: bool,
        /// Simulation time before which consumption stays locked.
        lock_until: Duration,
        /// Simulation time at which the bonus sector should be re-rolled.
        reroll_at: Option<Duration>,
    },
    /// Clears the re-entry requirement after the player left the zone.
    ClearExitRequirement {
        /// Zone whose radius the player left.
        zone: ZoneId,
    },
    /// Moves a zone's bonus sector to a new bearing.
    RerollBonusSector {
        /// Zone owning the bonus sector.
        zone: ZoneId,
        /// New sector centre measured in degrees.
        angle_degrees: f32,
    },
    /// Overrides a zone's hit requirement on behalf of a difficulty hook.
    AdjustRequiredHits {
        /// Zone to adjust.
        zone: ZoneId,
        /// Replacement hit requirement.
        required_hits: u32,
    },
    /// Restores the tiles under a zone's footprint to clean.
    CleanseFootprint {
        /// Zone whose footprint is cleansed.
        zone: ZoneId,
    },
    /// Announces that the whole roster is about to be regenerated.
    ResetRoster,
    /// Removes every live zone without contaminating any tile.
    ClearZones,
}

/// Notifications broadcast by the world after processing commands.
#[derive(Clone, Debug, PartialEq)]
pub enum Event {
    /// Indicates that the simulation clock advanced.
    TimeAdvanced {
        /// Duration of simulated time that elapsed in the tick.
        dt: Duration,
    },
    /// Confirms that a zone was placed on the board.
    ZoneSpawned {
        /// Identifier allocated to the zone.
        zone: ZoneId,
        /// Roster slot the zone fills.
        profile_index: usize,
        /// Centre of the zone in world units.
        center: Vec2,
        /// Radius of the zone in world units.
        radius: f32,
        /// Total lifetime of the zone.
        lifetime: Duration,
    },
    /// Reports how far a zone has progressed toward expiry.
    ZoneProgress {
        /// Zone being reported.
        zone: ZoneId,
        /// Fraction of the lifetime already elapsed, in `[0, 1]`.
        progress: f32,
    },
    /// Confirms that a zone ran out of time.
    ZoneExpired {
        /// Zone that expired.
        zone: ZoneId,
    },
    /// Confirms that a zone was captured by the player.
    ZoneConsumed {
        /// Zone that was consumed.
        zone: ZoneId,
        /// Reward owed to the reward sink.
        reward: u32,
    },
    /// Reports the circle of tiles contaminated by an expiring zone.
    ContaminationCircle {
        /// Zone whose expiry caused the contamination.
        zone: ZoneId,
        /// Centre of the contaminated circle in world units.
        center: Vec2,
        /// Radius of the contaminated circle in world units.
        radius: f32,
    },
    /// Reports a change to a zone's accumulated hits.
    HitCountChanged {
        /// Zone that was struck.
        zone: ZoneId,
        /// Hits accumulated after the contact.
        hits: u32,
        /// Hits required before the zone can be consumed.
        required_hits: u32,
        /// Indicates whether the contact landed inside the bonus sector.
        was_bonus: bool,
    },
    /// Reports the current placement of a zone's bonus sector.
    BonusSectorChanged {
        /// Zone owning the sector.
        zone: ZoneId,
        /// Sector centre measured in degrees.
        angle_degrees: f32,
        /// Full angular width of the sector in degrees.
        arc_width_degrees: f32,
    },
    /// Fired when the whole roster regenerates in batch mode.
    RosterReset,
    /// Fired when every live zone was cleared by an explicit reset.
    ZonesCleared,
    /// Reports that a consumed zone's footprint was restored to clean.
    FootprintCleansed {
        /// Zone whose footprint was cleansed.
        zone: ZoneId,
        /// Number of tiles that changed from contaminated to clean.
        tiles: u32,
    },
    /// Reports that a difficulty hook changed a zone's requirement.
    RequiredHitsChanged {
        /// Zone that was adjusted.
        zone: ZoneId,
        /// Hit requirement now in force.
        required_hits: u32,
    },
}

/// Unique identifier assigned to a zone.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct ZoneId(u32);

impl ZoneId {
    /// Creates a new zone identifier with the provided numeric value.
    #[must_use]
    pub const fn new(value: u32) -> Self {
        Self(value)
    }

    /// Retrieves the numeric representation of the identifier.
    #[must_use]
    pub const fn get(&self) -> u32 {
        self.0
    }
}

/// Location of a single board tile expressed as column and row indices.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct TileCoord {
    column: u32,
    row: u32,
}

impl TileCoord {
    /// Creates a new tile coordinate.
    #[must_use]
    pub const fn new(column: u32, row: u32) -> Self {
        Self { column, row }
    }

    /// Zero-based column index of the tile.
    #[must_use]
    pub const fn column(&self) -> u32 {
        self.column
    }

    /// Zero-based row index of the tile.
    #[must_use]
    pub const fn row(&self) -> u32 {
        self.row
    }

    /// Squared Euclidean distance between two tiles, measured in tiles.
    #[must_use]
    pub fn squared_distance(self, other: TileCoord) -> u64 {
        let dx = u64::from(self.column.abs_diff(other.column));
        let dy = u64::from(self.row.abs_diff(other.row));
        dx * dx + dy * dy
    }
}

/// Rectangular tile-block size of a zone.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Footprint {
    width: u32,
    height: u32,
}

impl Footprint {
    /// Creates a new footprint with explicit dimensions.
    #[must_use]
    pub const fn new(width: u32, height: u32) -> Self {
        Self { width, height }
    }

    /// Square footprint with equal sides.
    #[must_use]
    pub const fn square(side: u32) -> Self {
        Self::new(side, side)
    }

    /// Width of the footprint in tiles.
    #[must_use]
    pub const fn width(&self) -> u32 {
        self.width
    }

    /// Height of the footprint in tiles.
    #[must_use]
    pub const fn height(&self) -> u32 {
        self.height
    }

    /// Larger of the two dimensions.
    #[must_use]
    pub const fn largest(&self) -> u32 {
        if self.width > self.height {
            self.width
        } else {
            self.height
        }
    }

    /// Reports whether either dimension is zero.
    #[must_use]
    pub const fn is_empty(&self) -> bool {
        self.width == 0 || self.height == 0
    }

    /// Radius of the zone's circular footprint measured in tiles.
    #[must_use]
    pub fn radius_tiles(&self) -> f32 {
        self.width as f32 / 2.0
    }
}

/// Contamination state of a single tile.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum TileState {
    /// Tile can host zones without reducing their clean ratio.
    #[default]
    Clean,
    /// Tile was covered by a zone that expired.
    Contaminated,
}

/// Board adapter consumed by the placement and lifecycle systems.
///
/// Tiles are addressed by column and row; world points are continuous
/// coordinates measured in the same units as [`Board::tile_length`].
pub trait Board {
    /// Number of tile columns on the board.
    fn columns(&self) -> u32;

    /// Number of tile rows on the board.
    fn rows(&self) -> u32;

    /// Side length of a single square tile in world units.
    fn tile_length(&self) -> f32;

    /// World-space centre of the provided tile.
    fn tile_to_world(&self, tile: TileCoord) -> Vec2;

    /// Tile containing the provided world point, if it lies on the board.
    fn world_to_tile(&self, point: Vec2) -> Option<TileCoord>;

    /// Reports whether the tile lies on the board.
    fn in_bounds(&self, tile: TileCoord) -> bool {
        tile.column() < self.columns() && tile.row() < self.rows()
    }

    /// Converts signed indices into a tile, returning `None` outside the board.
    fn checked_tile(&self, column: i64, row: i64) -> Option<TileCoord> {
        let column = u32::try_from(column).ok()?;
        let row = u32::try_from(row).ok()?;
        let tile = TileCoord::new(column, row);
        self.in_bounds(tile).then_some(tile)
    }
}

/// Rectangular board of square tiles anchored at a world-space origin.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct TileGrid {
    columns: u32,
    rows: u32,
    tile_length: f32,
    origin: Vec2,
}

impl TileGrid {
    /// Creates a new grid whose upper-left corner sits at the world origin.
    #[must_use]
    pub const fn new(columns: u32, rows: u32, tile_length: f32) -> Self {
        Self {
            columns,
            rows,
            tile_length,
            origin: Vec2::ZERO,
        }
    }

    /// Moves the grid's upper-left corner to the provided world point.
    #[must_use]
    pub fn with_origin(mut self, origin: Vec2) -> Self {
        self.origin = origin;
        self
    }

    /// World-space position of the grid's upper-left corner.
    #[must_use]
    pub const fn origin(&self) -> Vec2 {
        self.origin
    }

    /// Total number of tiles contained in the grid.
    #[must_use]
    pub fn tile_count(&self) -> usize {
        let count = u64::from(self.columns) * u64::from(self.rows);
        usize::try_from(count).unwrap_or(0)
    }

    /// Total width of the grid measured in world units.
    #[must_use]
    pub fn width(&self) -> f32 {
        self.columns as f32 * self.tile_length
    }

    /// Total height of the grid measured in world units.
    #[must_use]
    pub fn height(&self) -> f32 {
        self.rows as f32 * self.tile_length
    }
}

impl Board for TileGrid {
    fn columns(&self) -> u32 {
        self.columns
    }

    fn rows(&self) -> u32 {
        self.rows
    }

    fn tile_length(&self) -> f32 {
        self.tile_length
    }

    fn tile_to_world(&self, tile: TileCoord) -> Vec2 {
        self.origin
            + Vec2::new(tile.column() as f32 + 0.5, tile.row() as f32 + 0.5) * self.tile_length
    }

    fn world_to_tile(&self, point: Vec2) -> Option<TileCoord> {
        if self.tile_length <= 0.0 {
            return None;
        }

        let local = (point - self.origin) / self.tile_length;
        if !local.is_finite() || local.x < 0.0 || local.y < 0.0 {
            return None;
        }

        self.checked_tile(local.x.floor() as i64, local.y.floor() as i64)
    }
}

/// Location accepted by the placement search.
#[derive(Clone, Debug, PartialEq)]
pub struct Placement {
    /// Tile at the centre of the footprint block.
    pub center: TileCoord,
    /// Every tile covered by the footprint block.
    pub tiles: Vec<TileCoord>,
    /// Clean-ratio threshold in force when the placement was accepted.
    ///
    /// A value of zero marks a fallback placement that ignored density.
    pub alpha_used: f32,
}

/// Fraction of `lifetime` already elapsed when `remaining` is left, in
/// `[0, 1]`. A zero lifetime counts as fully elapsed.
#[must_use]
pub fn elapsed_fraction(lifetime: Duration, remaining: Duration) -> f32 {
    if lifetime.is_zero() {
        return 1.0;
    }
    let ratio = remaining.as_secs_f32() / lifetime.as_secs_f32();
    (1.0 - ratio).clamp(0.0, 1.0)
}

/// Countdown shared by every zone spawned in one batch regeneration.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct RosterTimer {
    /// Full length of the shared countdown.
    pub lifetime: Duration,
    /// Simulation time at which the countdown reaches zero.
    pub expires_at: Duration,
}

impl RosterTimer {
    /// Starts a countdown of `lifetime` at `now`.
    #[must_use]
    pub fn start(lifetime: Duration, now: Duration) -> Self {
        Self {
            lifetime,
            expires_at: now.saturating_add(lifetime),
        }
    }

    /// Time left on the countdown at `now`.
    #[must_use]
    pub fn remaining(&self, now: Duration) -> Duration {
        self.expires_at.saturating_sub(now)
    }
}

/// Angular region around a zone that yields an increased hit award.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct BonusSector {
    /// Sector centre measured in degrees.
    pub angle_degrees: f32,
    /// Full angular width of the sector in degrees.
    pub arc_width_degrees: f32,
    /// Simulation time at which the sector is due to re-roll, if scheduled.
    pub reroll_at: Option<Duration>,
}

impl BonusSector {
    /// Reports whether the provided bearing falls inside the sector.
    #[must_use]
    pub fn contains(&self, bearing_degrees: f32) -> bool {
        angular_distance_degrees(bearing_degrees, self.angle_degrees)
            <= self.arc_width_degrees * 0.5
    }
}

/// Immutable representation of a single zone's state used for queries.
#[derive(Clone, Debug, PartialEq)]
pub struct ZoneSnapshot {
    /// Unique identifier assigned to the zone.
    pub id: ZoneId,
    /// Roster slot the zone fills.
    pub profile_index: usize,
    /// Footprint the zone was placed with.
    pub footprint: Footprint,
    /// Reward granted when the zone is consumed.
    pub reward: u32,
    /// Tile at the centre of the footprint.
    pub center_tile: TileCoord,
    /// Centre of the zone in world units.
    pub center_world: Vec2,
    /// Radius of the zone in world units.
    pub radius_world: f32,
    /// Tiles occupied by the zone's footprint block.
    pub footprint_tiles: Vec<TileCoord>,
    /// Total lifetime of the zone.
    pub lifetime: Duration,
    /// Time left before the zone expires.
    pub remaining: Duration,
    /// Hits accumulated from bounces.
    pub accumulated_hits: u32,
    /// Hits required before the zone can be consumed.
    pub required_hits: u32,
    /// Simulation time before which consumption is locked.
    pub consume_lock_until: Duration,
    /// Indicates whether the player must leave the radius before consuming.
    pub must_exit_first: bool,
    /// Simulation time of the most recent bounce, if any.
    pub last_bounce_at: Option<Duration>,
    /// Bonus sector attached to the zone, if the profile enables one.
    pub bonus: Option<BonusSector>,
}

impl ZoneSnapshot {
    /// Fraction of the lifetime already elapsed, in `[0, 1]`.
    #[must_use]
    pub fn progress(&self) -> f32 {
        elapsed_fraction(self.lifetime, self.remaining)
    }

    /// Reports whether the zone's countdown reached zero.
    #[must_use]
    pub fn is_expired(&self) -> bool {
        self.remaining.is_zero()
    }

    /// Reports whether the hit requirement is satisfied.
    #[must_use]
    pub fn requirement_met(&self) -> bool {
        self.accumulated_hits >= self.required_hits
    }
}

/// Read-only snapshot describing all live zones.
#[derive(Clone, Debug, Default)]
pub struct ZoneView {
    snapshots: Vec<ZoneSnapshot>,
}

impl ZoneView {
    /// Creates a new zone view from the provided snapshots.
    #[must_use]
    pub fn from_snapshots(mut snapshots: Vec<ZoneSnapshot>) -> Self {
        snapshots.sort_by_key(|snapshot| snapshot.id);
        Self { snapshots }
    }

    /// Iterator over the captured zone snapshots in deterministic order.
    pub fn iter(&self) -> impl Iterator<Item = &ZoneSnapshot> {
        self.snapshots.iter()
    }

    /// Looks up a zone by identifier.
    #[must_use]
    pub fn get(&self, zone: ZoneId) -> Option<&ZoneSnapshot> {
        self.snapshots
            .binary_search_by_key(&zone, |snapshot| snapshot.id)
            .ok()
            .map(|index| &self.snapshots[index])
    }

    /// Number of live zones.
    #[must_use]
    pub fn len(&self) -> usize {
        self.snapshots.len()
    }

    /// Reports whether no zone is live.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.snapshots.is_empty()
    }

    /// Consumes the view, yielding the underlying snapshots.
    #[must_use]
    pub fn into_vec(self) -> Vec<ZoneSnapshot> {
        self.snapshots
    }
}

/// Read-only view into the dense contamination grid.
#[derive(Clone, Copy, Debug)]
pub struct ContaminationView<'a> {
    tiles: &'a [TileState],
    columns: u32,
    rows: u32,
}

impl<'a> ContaminationView<'a> {
    /// Captures a new contamination view backed by the provided tile slice.
    #[must_use]
    pub fn new(tiles: &'a [TileState], columns: u32, rows: u32) -> Self {
        Self {
            tiles,
            columns,
            rows,
        }
    }

    /// Returns the state of the provided tile, if it lies on the grid.
    #[must_use]
    pub fn state(&self, tile: TileCoord) -> Option<TileState> {
        self.index(tile)
            .and_then(|index| self.tiles.get(index).copied())
    }

    /// Reports whether the tile is contaminated. Off-grid tiles read as clean.
    #[must_use]
    pub fn is_contaminated(&self, tile: TileCoord) -> bool {
        self.state(tile) == Some(TileState::Contaminated)
    }

    /// Returns an iterator over all tiles in row-major order.
    pub fn iter(&self) -> impl Iterator<Item = TileState> + 'a {
        self.tiles.iter().copied()
    }

    /// Number of contaminated tiles on the grid.
    #[must_use]
    pub fn contaminated_count(&self) -> usize {
        self.tiles
            .iter()
            .filter(|state| **state == TileState::Contaminated)
            .count()
    }

    /// Fraction of the whole grid that is still clean.
    #[must_use]
    pub fn clean_fraction(&self) -> f32 {
        if self.tiles.is_empty() {
            return 1.0;
        }
        let clean = self.tiles.len() - self.contaminated_count();
        clean as f32 / self.tiles.len() as f32
    }

    /// Provides the dimensions of the underlying grid.
    #[must_use]
    pub const fn dimensions(&self) -> (u32, u32) {
        (self.columns, self.rows)
    }

    fn index(&self, tile: TileCoord) -> Option<usize> {
        if tile.column() < self.columns && tile.row() < self.rows {
            let row = usize::try_from(tile.row()).ok()?;
            let column = usize::try_from(tile.column()).ok()?;
            let width = usize::try_from(self.columns).ok()?;
            Some(row * width + column)
        } else {
            None
        }
    }
}

/// Player-controlled body the lifecycle evaluates contacts against.
pub trait PlayerBody {
    /// Current position in world units.
    fn position(&self) -> Vec2;

    /// Current velocity in world units per second.
    fn velocity(&self) -> Vec2;

    /// Overwrites the body's velocity, used when a zone bounces the player.
    fn set_velocity(&mut self, velocity: Vec2);
}

/// Receiver of rewards granted when zones are consumed.
pub trait RewardSink {
    /// Credits the provided reward amount. Fire-and-forget.
    fn grant(&mut self, amount: u32);
}

/// Bearing from `from` toward `to`, in degrees within `[0, 360)`.
///
/// Zero points along the positive x axis and angles grow toward the positive
/// y axis, matching the board's column/row orientation.
#[must_use]
pub fn bearing_degrees(from: Vec2, to: Vec2) -> f32 {
    let delta = to - from;
    normalize_degrees(delta.y.atan2(delta.x).to_degrees())
}

/// Wraps an angle into `[0, 360)`.
#[must_use]
pub fn normalize_degrees(angle: f32) -> f32 {
    let wrapped = angle.rem_euclid(360.0);
    if wrapped >= 360.0 {
        0.0
    } else {
        wrapped
    }
}

/// Smallest absolute difference between two bearings, in `[0, 180]`.
#[must_use]
pub fn angular_distance_degrees(a: f32, b: f32) -> f32 {
    let difference = normalize_degrees(a - b);
    if difference > 180.0 {
        360.0 - difference
    } else {
        difference
    }
}

/// Reflects `velocity` about the plane whose normal is `normal`.
///
/// The normal does not need to be unit length; a zero normal leaves the
/// velocity reversed so the body is pushed back along its approach.
#[must_use]
pub fn reflect_velocity(velocity: Vec2, normal: Vec2) -> Vec2 {
    let unit = normal.normalize_or_zero();
    if unit == Vec2::ZERO {
        return -velocity;
    }
    velocity - 2.0 * velocity.dot(unit) * unit
}
