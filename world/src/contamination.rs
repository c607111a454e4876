//! Dense per-tile contamination state.

use capture_zones_core::{ContaminationView, TileCoord, TileState};

/// Flat contamination grid indexed by `row * columns + column`.
///
/// The grid is sized once when the board is configured and never resized
/// while zones reference it.
#[derive(Clone, Debug)]
pub struct ContaminationGrid {
    columns: u32,
    rows: u32,
    tiles: Vec<TileState>,
}

impl ContaminationGrid {
    /// Allocates an all-clean grid with the provided dimensions.
    #[must_use]
    pub fn new(columns: u32, rows: u32) -> Self {
        let capacity_u64 = u64::from(columns) * u64::from(rows);
        let capacity = usize::try_from(capacity_u64).unwrap_or(0);
        Self {
            columns,
            rows,
            tiles: vec![TileState::Clean; capacity],
        }
    }

    /// Returns the state of the provided tile, if it lies on the grid.
    #[must_use]
    pub fn state(&self, tile: TileCoord) -> Option<TileState> {
        self.view().state(tile)
    }

    /// Captures a read-only view of the grid.
    #[must_use]
    pub fn view(&self) -> ContaminationView<'_> {
        ContaminationView::new(&self.tiles, self.columns, self.rows)
    }

    /// Enumerates the in-bounds tiles within `radius_tiles` of `center`.
    ///
    /// The test is inclusive and uses squared distances over a bounding box
    /// rounded up to whole tiles.
    #[must_use]
    pub fn circle_tiles(&self, center: TileCoord, radius_tiles: f32) -> Vec<TileCoord> {
        if !radius_tiles.is_finite() || radius_tiles < 0.0 {
            return Vec::new();
        }

        let reach = radius_tiles.ceil() as i64;
        let limit = radius_tiles * radius_tiles;
        let center_column = i64::from(center.column());
        let center_row = i64::from(center.row());

        let mut tiles = Vec::new();
        for dy in -reach..=reach {
            for dx in -reach..=reach {
                if (dx * dx + dy * dy) as f32 > limit {
                    continue;
                }
                if let Some(tile) = self.checked_tile(center_column + dx, center_row + dy) {
                    tiles.push(tile);
                }
            }
        }
        tiles
    }

    /// Marks every tile within the circle as contaminated.
    ///
    /// Already contaminated tiles are left untouched, so repeated calls are
    /// idempotent. Returns the number of tiles whose state changed.
    pub fn mark_circle_contaminated(&mut self, center: TileCoord, radius_tiles: f32) -> usize {
        let mut changed = 0;
        for tile in self.circle_tiles(center, radius_tiles) {
            if self.set(tile, TileState::Contaminated) {
                changed += 1;
            }
        }
        changed
    }

    /// Restores the provided tiles to clean, returning how many changed.
    pub fn cleanse(&mut self, tiles: &[TileCoord]) -> usize {
        tiles
            .iter()
            .filter(|tile| self.set(**tile, TileState::Clean))
            .count()
    }

    fn set(&mut self, tile: TileCoord, state: TileState) -> bool {
        let Some(index) = self.index(tile) else {
            return false;
        };
        match self.tiles.get_mut(index) {
            Some(slot) if *slot != state => {
                *slot = state;
                true
            }
            _ => false,
        }
    }

    fn checked_tile(&self, column: i64, row: i64) -> Option<TileCoord> {
        let column = u32::try_from(column).ok()?;
        let row = u32::try_from(row).ok()?;
        (column < self.columns && row < self.rows).then(|| TileCoord::new(column, row))
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
