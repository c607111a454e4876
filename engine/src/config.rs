//! Loading and validation of zone configuration files.
//!
//! Files are TOML documents holding a `[[profiles]]` array and an optional
//! `[tunables]` table; omitted tunables take their defaults.

use std::{fs, path::Path};

use anyhow::{Context, Result};
use capture_zones_core::{Board, TileGrid, Tunables, ZoneConfig, ZoneProfile};
use capture_zones_system_lifecycle::RosterSlot;
use tracing::warn;

use crate::{ConfigError, ProfileError};

/// Reads and parses a configuration file.
pub fn load(path: &Path) -> Result<ZoneConfig> {
    let contents = fs::read_to_string(path)
        .with_context(|| format!("failed to read zone config {}", path.display()))?;
    parse(&contents).with_context(|| format!("invalid zone config {}", path.display()))
}

/// Parses a configuration document.
pub fn parse(contents: &str) -> Result<ZoneConfig> {
    toml::from_str(contents).context("failed to parse zone config")
}

/// Rejects tunables that cannot drive a simulation.
pub fn validate_tunables(tunables: &Tunables) -> Result<(), ConfigError> {
    let base = tunables.base_alpha;
    if !(base > 0.0 && base <= 1.0) {
        return Err(ConfigError::BaseAlpha(base));
    }
    let min = tunables.min_alpha;
    if !(min >= 0.0 && min <= base) {
        return Err(ConfigError::MinAlpha { min, base });
    }
    if tunables.placement_attempts == 0 {
        return Err(ConfigError::NoAttempts);
    }
    let arc = tunables.bonus_arc_width_degrees;
    if !(0.0..=360.0).contains(&arc) {
        return Err(ConfigError::ArcWidth(arc));
    }

    let non_negative = [
        ("alpha_relax_step", tunables.alpha_relax_step),
        ("min_separation_tiles", tunables.min_separation_tiles),
        ("min_spawn_distance_tiles", tunables.min_spawn_distance_tiles),
        ("touch_tolerance_tiles", tunables.touch_tolerance_tiles),
        ("bounce_cooldown_seconds", tunables.bounce_cooldown_seconds),
        ("consume_lock_seconds", tunables.consume_lock_seconds),
        ("bonus_reroll_delay_seconds", tunables.bonus_reroll_delay_seconds),
        ("max_bounce_speed_tiles", tunables.max_bounce_speed_tiles),
        ("respawn_delay_seconds", tunables.respawn_delay_seconds),
    ];
    for (name, value) in non_negative {
        if !(value.is_finite() && value >= 0.0) {
            return Err(ConfigError::Negative { name, value });
        }
    }
    Ok(())
}

/// Rejects boards without tiles or with a degenerate tile length.
pub fn validate_board(grid: &TileGrid) -> Result<(), ConfigError> {
    let tile_length = grid.tile_length();
    if grid.columns() == 0 || grid.rows() == 0 || !(tile_length.is_finite() && tile_length > 0.0) {
        return Err(ConfigError::InvalidBoard {
            columns: grid.columns(),
            rows: grid.rows(),
            tile_length,
        });
    }
    Ok(())
}

/// Checks that a profile can ever be placed on the board.
pub fn validate_profile(
    index: usize,
    profile: &ZoneProfile,
    board: &dyn Board,
) -> Result<(), ProfileError> {
    let footprint = profile.footprint;
    if footprint.is_empty() {
        return Err(ProfileError::EmptyFootprint { index });
    }
    if footprint.width() > board.columns() || footprint.height() > board.rows() {
        return Err(ProfileError::FootprintTooLarge {
            index,
            width: footprint.width(),
            height: footprint.height(),
            columns: board.columns(),
            rows: board.rows(),
        });
    }
    if profile.lifetime().is_none() {
        return Err(ProfileError::Lifetime {
            index,
            seconds: profile.lifetime_seconds,
        });
    }
    Ok(())
}

/// Builds the roster from every valid profile, logging and skipping the rest.
#[must_use]
pub fn build_roster(profiles: &[ZoneProfile], board: &dyn Board) -> Vec<RosterSlot> {
    profiles
        .iter()
        .enumerate()
        .filter_map(|(profile_index, profile)| {
            match validate_profile(profile_index, profile, board) {
                Ok(()) => Some(RosterSlot {
                    profile_index,
                    profile: *profile,
                }),
                Err(error) => {
                    warn!(%error, "skipping zone profile");
                    None
                }
            }
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use capture_zones_core::{Footprint, ReplacementMode};

    const SAMPLE: &str = include_str!("../../config/zones.toml");

    fn profile(side: u32, lifetime_seconds: f32) -> ZoneProfile {
        ZoneProfile {
            footprint: Footprint::square(side),
            required_hits: 1,
            reward: 3,
            lifetime_seconds,
            bonus_arc_enabled: false,
        }
    }

    #[test]
    fn bundled_config_parses_and_validates() {
        let config = parse(SAMPLE).expect("bundled config parses");
        assert_eq!(config.profiles.len(), 3);
        assert!(config.profiles.iter().any(|profile| profile.bonus_arc_enabled));
        validate_tunables(&config.tunables).expect("bundled tunables are valid");
    }

    #[test]
    fn missing_tunables_take_defaults() {
        let config = parse(
            r#"
            [[profiles]]
            footprint = { width = 2, height = 2 }
            required_hits = 0
            reward = 4
            lifetime_seconds = 6.0

            [tunables]
            replacement_mode = "batch"
            "#,
        )
        .expect("config parses");

        assert_eq!(config.tunables.replacement_mode, ReplacementMode::Batch);
        assert_eq!(config.tunables.placement_attempts, Tunables::default().placement_attempts);
        assert!(!config.profiles[0].bonus_arc_enabled);
    }

    #[test]
    fn malformed_documents_are_reported() {
        let error = parse("[[profiles]]\nfootprint = 3").expect_err("footprint must be a table");
        assert!(format!("{error:#}").contains("failed to parse zone config"));
    }

    #[test]
    fn out_of_range_tunables_are_rejected() {
        let bad_base = Tunables {
            base_alpha: 1.5,
            ..Tunables::default()
        };
        assert_eq!(validate_tunables(&bad_base), Err(ConfigError::BaseAlpha(1.5)));

        let bad_floor = Tunables {
            min_alpha: 0.8,
            ..Tunables::default()
        };
        assert_eq!(
            validate_tunables(&bad_floor),
            Err(ConfigError::MinAlpha { min: 0.8, base: 0.5 })
        );

        let negative = Tunables {
            bounce_cooldown_seconds: -1.0,
            ..Tunables::default()
        };
        assert_eq!(
            validate_tunables(&negative),
            Err(ConfigError::Negative {
                name: "bounce_cooldown_seconds",
                value: -1.0,
            })
        );
        assert!(validate_tunables(&Tunables::default()).is_ok());
    }

    #[test]
    fn degenerate_boards_are_rejected() {
        assert!(validate_board(&TileGrid::new(0, 4, 1.0)).is_err());
        assert!(validate_board(&TileGrid::new(4, 4, 0.0)).is_err());
        assert!(validate_board(&TileGrid::new(4, 4, 1.0)).is_ok());
    }

    #[test]
    fn roster_skips_profiles_that_can_never_spawn() {
        let board = TileGrid::new(8, 8, 1.0);
        let profiles = [profile(3, 5.0), profile(9, 5.0), profile(2, 0.0), profile(0, 5.0)];

        let roster = build_roster(&profiles, &board);

        assert_eq!(roster.len(), 1);
        assert_eq!(roster[0].profile_index, 0);
        assert_eq!(
            validate_profile(1, &profiles[1], &board),
            Err(ProfileError::FootprintTooLarge {
                index: 1,
                width: 9,
                height: 9,
                columns: 8,
                rows: 8,
            })
        );
        assert_eq!(
            validate_profile(2, &profiles[2], &board),
            Err(ProfileError::Lifetime {
                index: 2,
                seconds: 0.0,
            })
        );
    }
}
