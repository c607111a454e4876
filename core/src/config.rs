//! Plain-data configuration records for zone profiles and global tunables.

use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::Footprint;

/// Static description of one roster slot.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct ZoneProfile {
    /// Tile-block size of zones spawned for this profile.
    pub footprint: Footprint,
    /// Hits the player must accumulate before the zone can be consumed.
    pub required_hits: u32,
    /// Reward granted when the zone is consumed.
    pub reward: u32,
    /// Seconds before the zone expires and contaminates its footprint.
    pub lifetime_seconds: f32,
    /// Enables the directional bonus sector for zones of this profile.
    #[serde(default)]
    pub bonus_arc_enabled: bool,
}

impl ZoneProfile {
    /// Lifetime converted to a duration, `None` when not strictly positive.
    #[must_use]
    pub fn lifetime(&self) -> Option<Duration> {
        Duration::try_from_secs_f32(self.lifetime_seconds)
            .ok()
            .filter(|lifetime| !lifetime.is_zero())
    }
}

/// Strategy used to replace zones that were consumed or expired.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ReplacementMode {
    /// Any expiry force-expires the whole roster, which then regenerates at once.
    Batch,
    /// Each slot is replaced on its own after the respawn delay.
    #[default]
    Independent,
}

/// Global tuning knobs for placement and contact evaluation.
///
/// Distances are expressed in tiles and converted to world units with the
/// board's tile length; times are expressed in seconds.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Tunables {
    /// Clean-ratio threshold used for the first placement pass.
    pub base_alpha: f32,
    /// Lowest clean-ratio threshold the relaxation may reach.
    pub min_alpha: f32,
    /// Amount subtracted from the threshold after each exhausted pass.
    pub alpha_relax_step: f32,
    /// Minimum gap between zone circles, in tiles.
    pub min_separation_tiles: f32,
    /// Minimum distance between the player and a new zone centre, in tiles.
    pub min_spawn_distance_tiles: f32,
    /// Pads the spawn distance by half the footprint's largest dimension.
    pub pad_spawn_distance_by_footprint: bool,
    /// Slack added to a zone's radius when testing player contact, in tiles.
    pub touch_tolerance_tiles: f32,
    /// Minimum time between two bounces on the same zone.
    pub bounce_cooldown_seconds: f32,
    /// Time after a bounce during which consumption is locked.
    pub consume_lock_seconds: f32,
    /// Full angular width of bonus sectors, in degrees.
    pub bonus_arc_width_degrees: f32,
    /// Hits awarded by a bounce outside the bonus sector.
    pub normal_hit_award: u32,
    /// Hits awarded by a bounce inside the bonus sector.
    pub bonus_hit_award: u32,
    /// Delay before a struck bonus sector moves to a new bearing.
    pub bonus_reroll_delay_seconds: f32,
    /// Upper bound on the player's speed after a bounce, in tiles per second.
    pub max_bounce_speed_tiles: f32,
    /// Random candidates examined per placement pass.
    pub placement_attempts: u32,
    /// Delay before an independent-mode slot is refilled.
    pub respawn_delay_seconds: f32,
    /// Replacement strategy for consumed and expired zones.
    pub replacement_mode: ReplacementMode,
    /// Falls back to a row-major scan that ignores density when relaxation fails.
    pub linear_scan_fallback: bool,
    /// Restores a consumed zone's footprint tiles to clean.
    pub cleanse_on_consume: bool,
    /// Seed for the placement and bonus-sector random streams.
    pub rng_seed: u64,
}

impl Default for Tunables {
    fn default() -> Self {
        Self {
            base_alpha: 0.5,
            min_alpha: 0.1,
            alpha_relax_step: 0.1,
            min_separation_tiles: 1.0,
            min_spawn_distance_tiles: 3.0,
            pad_spawn_distance_by_footprint: true,
            touch_tolerance_tiles: 0.25,
            bounce_cooldown_seconds: 0.2,
            consume_lock_seconds: 0.5,
            bonus_arc_width_degrees: 60.0,
            normal_hit_award: 1,
            bonus_hit_award: 2,
            bonus_reroll_delay_seconds: 0.75,
            max_bounce_speed_tiles: 12.0,
            placement_attempts: 200,
            respawn_delay_seconds: 1.5,
            replacement_mode: ReplacementMode::Independent,
            linear_scan_fallback: true,
            cleanse_on_consume: false,
            rng_seed: 0x5eed_c0de_2a1f_7733,
        }
    }
}

impl Tunables {
    /// Minimum time between two bounces on the same zone.
    #[must_use]
    pub fn bounce_cooldown(&self) -> Duration {
        seconds(self.bounce_cooldown_seconds)
    }

    /// Time after a bounce during which consumption is locked.
    #[must_use]
    pub fn consume_lock(&self) -> Duration {
        seconds(self.consume_lock_seconds)
    }

    /// Delay before a struck bonus sector re-rolls.
    #[must_use]
    pub fn bonus_reroll_delay(&self) -> Duration {
        seconds(self.bonus_reroll_delay_seconds)
    }

    /// Delay before an independent-mode slot is refilled.
    #[must_use]
    pub fn respawn_delay(&self) -> Duration {
        seconds(self.respawn_delay_seconds)
    }
}

/// Complete configuration: an ordered roster of profiles plus tunables.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct ZoneConfig {
    /// Profiles in roster order; the index becomes the zone's profile index.
    pub profiles: Vec<ZoneProfile>,
    /// Global tuning knobs.
    #[serde(default)]
    pub tunables: Tunables,
}

impl Default for ZoneConfig {
    fn default() -> Self {
        Self {
            profiles: vec![
                ZoneProfile {
                    footprint: Footprint::square(2),
                    required_hits: 0,
                    reward: 5,
                    lifetime_seconds: 8.0,
                    bonus_arc_enabled: false,
                },
                ZoneProfile {
                    footprint: Footprint::square(3),
                    required_hits: 2,
                    reward: 12,
                    lifetime_seconds: 12.0,
                    bonus_arc_enabled: true,
                },
                ZoneProfile {
                    footprint: Footprint::square(4),
                    required_hits: 4,
                    reward: 25,
                    lifetime_seconds: 16.0,
                    bonus_arc_enabled: true,
                },
            ],
            tunables: Tunables::default(),
        }
    }
}

fn seconds(value: f32) -> Duration {
    Duration::try_from_secs_f32(value.max(0.0)).unwrap_or(Duration::ZERO)
}
