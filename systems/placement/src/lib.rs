#![deny(
    unsafe_code,
    missing_docs,
    dead_code,
    unused_results,
    non_snake_case,
    unreachable_pub
)]

//! Pure placement search that finds board locations for new zones.
//!
//! The search only reads the contamination grid and the live zone set; it owns
//! nothing but its random stream, so it may be invoked repeatedly within one
//! tick while the caller relaxes the clean-ratio threshold.

use std::collections::HashSet;

use capture_zones_core::{
    Board, ContaminationView, Footprint, Placement, TileCoord, Tunables, ZoneSnapshot, ZoneView,
};
use glam::Vec2;
use rand::{Rng, SeedableRng};
use rand_chacha::ChaCha8Rng;
use thiserror::Error;

/// Reasons a placement search may return without a location.
///
/// None of these are faults; callers decide whether to relax, fall back, or
/// simply run with fewer zones.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Error)]
pub enum PlacementError {
    /// Every candidate in the attempt budget was rejected.
    #[error("no valid location found after {attempts} attempts")]
    Exhausted {
        /// Number of candidates examined.
        attempts: u32,
    },
    /// The footprint cannot fit on the board at all.
    #[error("footprint {width}x{height} does not fit a {columns}x{rows} board")]
    FootprintTooLarge {
        /// Footprint width in tiles.
        width: u32,
        /// Footprint height in tiles.
        height: u32,
        /// Board width in tiles.
        columns: u32,
        /// Board height in tiles.
        rows: u32,
    },
    /// The footprint has a zero dimension.
    #[error("footprint has a zero dimension")]
    EmptyFootprint,
}

/// Constraints applied to every candidate.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct PlacementRules {
    /// Random candidates examined per call to [`PlacementSearch::try_place`].
    pub attempts: u32,
    /// Minimum gap between zone circles, in tiles.
    pub min_separation_tiles: f32,
    /// Minimum distance between the player and a new zone centre, in tiles.
    pub min_spawn_distance_tiles: f32,
    /// Pads the spawn distance by half the footprint's largest dimension.
    pub pad_spawn_distance_by_footprint: bool,
}

impl PlacementRules {
    /// Extracts the placement constraints from the global tunables.
    #[must_use]
    pub fn from_tunables(tunables: &Tunables) -> Self {
        Self {
            attempts: tunables.placement_attempts,
            min_separation_tiles: tunables.min_separation_tiles,
            min_spawn_distance_tiles: tunables.min_spawn_distance_tiles,
            pad_spawn_distance_by_footprint: tunables.pad_spawn_distance_by_footprint,
        }
    }

    /// Required distance between the player and a candidate centre, in tiles.
    #[must_use]
    pub fn spawn_distance_tiles(&self, footprint: Footprint) -> f32 {
        let base = self.min_spawn_distance_tiles.max(0.0);
        if self.pad_spawn_distance_by_footprint {
            base + footprint.largest() as f32 / 2.0
        } else {
            base
        }
    }
}

impl Default for PlacementRules {
    fn default() -> Self {
        Self::from_tunables(&Tunables::default())
    }
}

/// Space already claimed by a live or freshly accepted zone.
#[derive(Clone, Debug, PartialEq)]
pub struct Obstacle {
    /// Centre of the zone circle in world units.
    pub center: Vec2,
    /// Radius of the zone circle in world units.
    pub radius: f32,
    /// Tiles covered by the zone's footprint block.
    pub tiles: Vec<TileCoord>,
}

impl Obstacle {
    /// Captures the space claimed by a live zone.
    #[must_use]
    pub fn from_snapshot(snapshot: &ZoneSnapshot) -> Self {
        Self {
            center: snapshot.center_world,
            radius: snapshot.radius_world,
            tiles: snapshot.footprint_tiles.clone(),
        }
    }

    /// Captures the space a placement will claim once its zone spawns.
    #[must_use]
    pub fn from_placement(board: &dyn Board, footprint: Footprint, placement: &Placement) -> Self {
        Self {
            center: board.tile_to_world(placement.center),
            radius: footprint.radius_tiles() * board.tile_length(),
            tiles: placement.tiles.clone(),
        }
    }
}

/// Collects the obstacles formed by every live zone.
#[must_use]
pub fn obstacles(zones: &ZoneView) -> Vec<Obstacle> {
    zones.iter().map(Obstacle::from_snapshot).collect()
}

/// Footprint and threshold for a single placement call.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct PlacementRequest {
    /// Tile-block size to place.
    pub footprint: Footprint,
    /// Minimum fraction of clean tiles required within the block.
    pub alpha: f32,
    /// Tile currently occupied by the player, if the player is on the board.
    pub player_tile: Option<TileCoord>,
}

/// Randomised placement search with a seeded, replayable random stream.
#[derive(Debug)]
pub struct PlacementSearch {
    rules: PlacementRules,
    rng: ChaCha8Rng,
}

impl PlacementSearch {
    /// Creates a search using the provided rules and seed.
    #[must_use]
    pub fn new(rules: PlacementRules, seed: u64) -> Self {
        Self {
            rules,
            rng: ChaCha8Rng::seed_from_u64(seed),
        }
    }

    /// Rules applied to every candidate.
    #[must_use]
    pub fn rules(&self) -> &PlacementRules {
        &self.rules
    }

    /// Samples up to the attempt budget of random centres and returns the first
    /// candidate satisfying every constraint at the requested threshold.
    pub fn try_place(
        &mut self,
        board: &dyn Board,
        contamination: &ContaminationView<'_>,
        obstacles: &[Obstacle],
        request: &PlacementRequest,
    ) -> Result<Placement, PlacementError> {
        ensure_fits(board, request.footprint)?;

        let occupied = occupied_tiles(obstacles);
        let spawn_distance = self.rules.spawn_distance_tiles(request.footprint);
        let spawn_distance_sq = spawn_distance * spawn_distance;
        let separation = self.rules.min_separation_tiles.max(0.0) * board.tile_length();
        let radius = request.footprint.radius_tiles() * board.tile_length();

        for _ in 0..self.rules.attempts {
            let candidate = TileCoord::new(
                self.rng.gen_range(0..board.columns()),
                self.rng.gen_range(0..board.rows()),
            );

            if contamination.is_contaminated(candidate) {
                continue;
            }

            if let Some(player) = request.player_tile {
                if (candidate.squared_distance(player) as f32) < spawn_distance_sq {
                    continue;
                }
            }

            let Some(tiles) = footprint_block(board, candidate, request.footprint) else {
                continue;
            };

            if tiles.iter().any(|tile| occupied.contains(tile)) {
                continue;
            }

            let center = board.tile_to_world(candidate);
            if overlaps_any(center, radius, separation, obstacles) {
                continue;
            }

            if clean_ratio(contamination, &tiles) >= request.alpha {
                return Ok(Placement {
                    center: candidate,
                    tiles,
                    alpha_used: request.alpha,
                });
            }
        }

        Err(PlacementError::Exhausted {
            attempts: self.rules.attempts,
        })
    }

    /// Scans every centre in row-major order and returns the first block that
    /// stays on the board and clears every obstacle. Density and player
    /// distance are ignored.
    pub fn scan_first_fit(
        &self,
        board: &dyn Board,
        obstacles: &[Obstacle],
        footprint: Footprint,
    ) -> Result<Placement, PlacementError> {
        ensure_fits(board, footprint)?;

        let occupied = occupied_tiles(obstacles);
        let separation = self.rules.min_separation_tiles.max(0.0) * board.tile_length();
        let radius = footprint.radius_tiles() * board.tile_length();

        let mut scanned: u32 = 0;
        for row in 0..board.rows() {
            for column in 0..board.columns() {
                scanned = scanned.saturating_add(1);
                let candidate = TileCoord::new(column, row);
                let Some(tiles) = footprint_block(board, candidate, footprint) else {
                    continue;
                };
                if tiles.iter().any(|tile| occupied.contains(tile)) {
                    continue;
                }
                if overlaps_any(board.tile_to_world(candidate), radius, separation, obstacles) {
                    continue;
                }
                return Ok(Placement {
                    center: candidate,
                    tiles,
                    alpha_used: 0.0,
                });
            }
        }

        Err(PlacementError::Exhausted { attempts: scanned })
    }
}

/// Computes the tile block covering `footprint` centred on `center`.
///
/// Even dimensions extend one tile further toward the negative axis, so a
/// block of width `w` spans columns `center - w/2 .. center - w/2 + w`.
/// Returns `None` when any tile would leave the board.
#[must_use]
pub fn footprint_block(
    board: &dyn Board,
    center: TileCoord,
    footprint: Footprint,
) -> Option<Vec<TileCoord>> {
    if footprint.is_empty() {
        return None;
    }

    let start_column = i64::from(center.column()) - i64::from(footprint.width() / 2);
    let start_row = i64::from(center.row()) - i64::from(footprint.height() / 2);

    let mut tiles = Vec::with_capacity(footprint.width() as usize * footprint.height() as usize);
    for row in start_row..start_row + i64::from(footprint.height()) {
        for column in start_column..start_column + i64::from(footprint.width()) {
            tiles.push(board.checked_tile(column, row)?);
        }
    }
    Some(tiles)
}

/// Fraction of the provided tiles that are clean. An empty block reads as clean.
#[must_use]
pub fn clean_ratio(contamination: &ContaminationView<'_>, tiles: &[TileCoord]) -> f32 {
    if tiles.is_empty() {
        return 1.0;
    }
    let clean = tiles
        .iter()
        .filter(|tile| !contamination.is_contaminated(**tile))
        .count();
    clean as f32 / tiles.len() as f32
}

fn ensure_fits(board: &dyn Board, footprint: Footprint) -> Result<(), PlacementError> {
    if footprint.is_empty() {
        return Err(PlacementError::EmptyFootprint);
    }
    if footprint.width() > board.columns() || footprint.height() > board.rows() {
        return Err(PlacementError::FootprintTooLarge {
            width: footprint.width(),
            height: footprint.height(),
            columns: board.columns(),
            rows: board.rows(),
        });
    }
    Ok(())
}

fn occupied_tiles(obstacles: &[Obstacle]) -> HashSet<TileCoord> {
    obstacles
        .iter()
        .flat_map(|obstacle| obstacle.tiles.iter().copied())
        .collect()
}

fn overlaps_any(center: Vec2, radius: f32, separation: f32, obstacles: &[Obstacle]) -> bool {
    obstacles.iter().any(|obstacle| {
        let reach = radius + obstacle.radius + separation;
        center.distance_squared(obstacle.center) < reach * reach
    })
}
