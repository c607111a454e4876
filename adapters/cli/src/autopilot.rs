//! Scripted player that chases zones around the board.

use std::time::Duration;

use capture_zones_core::{PlayerBody, TileGrid, ZoneView};
use glam::Vec2;

/// Player body steered toward the nearest zone.
///
/// After a bounce the autopilot backs out of the zone so the next approach
/// counts as a fresh entry.
#[derive(Clone, Copy, Debug)]
pub(crate) struct Autopilot {
    position: Vec2,
    velocity: Vec2,
    speed: f32,
}

impl Autopilot {
    pub(crate) fn new(position: Vec2, speed: f32) -> Self {
        Self {
            position,
            velocity: Vec2::ZERO,
            speed,
        }
    }

    /// Picks a heading for the coming tick.
    pub(crate) fn steer(&mut self, zones: &ZoneView) {
        let nearest = zones.iter().min_by(|a, b| {
            a.center_world
                .distance_squared(self.position)
                .total_cmp(&b.center_world.distance_squared(self.position))
        });
        let Some(zone) = nearest else {
            self.velocity = Vec2::ZERO;
            return;
        };

        let toward = (zone.center_world - self.position).normalize_or_zero();
        let heading = if zone.must_exit_first { -toward } else { toward };
        self.velocity = heading * self.speed;
    }

    /// Integrates the velocity and keeps the body on the board.
    pub(crate) fn advance(&mut self, dt: Duration, board: &TileGrid) {
        let min = board.origin();
        let max = min + Vec2::new(board.width(), board.height());
        self.position = (self.position + self.velocity * dt.as_secs_f32()).clamp(min, max);
    }
}

impl PlayerBody for Autopilot {
    fn position(&self) -> Vec2 {
        self.position
    }

    fn velocity(&self) -> Vec2 {
        self.velocity
    }

    fn set_velocity(&mut self, velocity: Vec2) {
        self.velocity = velocity;
    }
}

#[cfg(test)]
mod tests {
    use std::time::Duration;

    use super::*;
    use capture_zones_core::{Footprint, TileCoord, ZoneId, ZoneSnapshot};

    fn zone(id: u32, center: Vec2, must_exit_first: bool) -> ZoneSnapshot {
        ZoneSnapshot {
            id: ZoneId::new(id),
            profile_index: 0,
            footprint: Footprint::square(2),
            reward: 1,
            center_tile: TileCoord::new(0, 0),
            center_world: center,
            radius_world: 1.0,
            footprint_tiles: Vec::new(),
            lifetime: Duration::from_secs(5),
            remaining: Duration::from_secs(5),
            accumulated_hits: 0,
            required_hits: 1,
            consume_lock_until: Duration::ZERO,
            must_exit_first,
            last_bounce_at: None,
            bonus: None,
        }
    }

    #[test]
    fn heads_for_the_nearest_zone() {
        let mut pilot = Autopilot::new(Vec2::ZERO, 2.0);
        let zones = ZoneView::from_snapshots(vec![
            zone(1, Vec2::new(10.0, 0.0), false),
            zone(2, Vec2::new(0.0, 3.0), false),
        ]);

        pilot.steer(&zones);

        assert!((pilot.velocity() - Vec2::new(0.0, 2.0)).length() < 1e-5);
    }

    #[test]
    fn backs_out_after_a_bounce() {
        let mut pilot = Autopilot::new(Vec2::ZERO, 1.0);
        let zones = ZoneView::from_snapshots(vec![zone(1, Vec2::new(4.0, 0.0), true)]);

        pilot.steer(&zones);

        assert!((pilot.velocity() - Vec2::new(-1.0, 0.0)).length() < 1e-5);
    }

    #[test]
    fn stays_on_the_board() {
        let board = TileGrid::new(4, 4, 1.0);
        let mut pilot = Autopilot::new(Vec2::new(3.5, 3.5), 1.0);
        pilot.set_velocity(Vec2::new(10.0, 10.0));

        pilot.advance(Duration::from_secs(1), &board);

        assert_eq!(pilot.position(), Vec2::new(4.0, 4.0));
    }
}
