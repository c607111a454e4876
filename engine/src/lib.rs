#![deny(
    unsafe_code,
    missing_docs,
    dead_code,
    unused_results,
    non_snake_case,
    unreachable_pub
)]

//! Tick-driven capture zone engine.
//!
//! [`ZoneEngine`] owns the authoritative world and the lifecycle system and
//! runs them in a fixed phase order on every tick:
//!
//! 1. advance the clock and zone countdowns,
//! 2. expire zones whose countdown reached zero,
//! 3. report progress for the survivors,
//! 4. evaluate player contacts (bounces and consumption),
//! 5. re-roll bonus sectors that are due,
//! 6. place pending roster slots,
//! 7. grant rewards and publish the tick's events.
//!
//! Each phase collects commands against a fresh view and applies them before
//! the next phase starts.

use std::time::Duration;

use capture_zones_core::{
    Board, Command, ContaminationView, Event, PlayerBody, RewardSink, TileGrid, ZoneConfig, ZoneId,
    ZoneSnapshot, ZoneView,
};
use capture_zones_system_lifecycle::Lifecycle;
use capture_zones_world::{self as world, query, World};
use tracing::{debug, info, warn};

mod bus;
pub mod config;
mod error;

pub use bus::{NotificationBus, SubscriptionId};
pub use error::{ConfigError, ProfileError};

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
enum Outage {
    Board,
    Player,
}

impl Outage {
    fn describe(self) -> &'static str {
        match self {
            Self::Board => "board not configured",
            Self::Player => "player body unavailable",
        }
    }
}

/// Capture zone simulation driven by the host's update loop.
#[derive(Debug)]
pub struct ZoneEngine {
    config: ZoneConfig,
    world: World,
    lifecycle: Lifecycle,
    bus: NotificationBus,
    commands: Vec<Command>,
    events: Vec<Event>,
    outage: Option<Outage>,
}

impl ZoneEngine {
    /// Creates an engine without a board. Ticks are skipped until
    /// [`ZoneEngine::configure_board`] is called.
    pub fn new(config: ZoneConfig) -> Result<Self, ConfigError> {
        config::validate_tunables(&config.tunables)?;
        let lifecycle = Lifecycle::new(Vec::new(), config.tunables.clone());
        Ok(Self {
            config,
            world: World::new(),
            lifecycle,
            bus: NotificationBus::new(),
            commands: Vec::new(),
            events: Vec::new(),
            outage: None,
        })
    }

    /// Creates an engine and configures its board in one step.
    pub fn with_board(config: ZoneConfig, grid: TileGrid) -> Result<Self, ConfigError> {
        let mut engine = Self::new(config)?;
        engine.configure_board(grid)?;
        Ok(engine)
    }

    /// Installs a new board with an all-clean contamination grid and schedules
    /// every valid profile for placement on the next tick.
    pub fn configure_board(&mut self, grid: TileGrid) -> Result<(), ConfigError> {
        config::validate_board(&grid)?;

        self.events.clear();
        self.apply(Command::ConfigureBoard { grid });

        let roster = config::build_roster(&self.config.profiles, &grid);
        if roster.is_empty() {
            warn!("no zone profile fits the board; no zones will spawn");
        }
        info!(
            columns = grid.columns(),
            rows = grid.rows(),
            tile_length = grid.tile_length(),
            slots = roster.len(),
            "board configured"
        );
        self.lifecycle.set_roster(roster, query::clock(&self.world));
        self.publish();
        Ok(())
    }

    /// Advances the simulation by `dt` and returns the events it produced.
    ///
    /// When the board or the player is unavailable the tick is skipped
    /// entirely: the clock does not advance and no event is produced.
    pub fn tick(
        &mut self,
        dt: Duration,
        player: Option<&mut dyn PlayerBody>,
        rewards: &mut dyn RewardSink,
    ) -> &[Event] {
        self.events.clear();

        let Some(grid) = query::board(&self.world).copied() else {
            self.report_outage(Outage::Board);
            return &self.events;
        };
        let Some(player) = player else {
            self.report_outage(Outage::Player);
            return &self.events;
        };
        if let Some(outage) = self.outage.take() {
            info!(resolved = outage.describe(), "zone simulation resumed");
        }

        self.apply(Command::Tick { dt });
        let now = query::clock(&self.world);

        let zones = query::zone_view(&self.world);
        self.lifecycle.resolve_expiries(&zones, now, &mut self.commands);
        self.flush();

        self.apply(Command::ReportProgress);

        let zones = query::zone_view(&self.world);
        self.lifecycle
            .evaluate_contacts(&grid, &zones, now, &mut *player, &mut self.commands);
        self.flush();

        let zones = query::zone_view(&self.world);
        self.lifecycle.reroll_bonus_sectors(&zones, now, &mut self.commands);
        self.flush();

        let zones = query::zone_view(&self.world);
        let player_tile = grid.world_to_tile(player.position());
        if let Some(contamination) = query::contamination_view(&self.world) {
            self.lifecycle.refill(
                &grid,
                &contamination,
                &zones,
                player_tile,
                now,
                &mut self.commands,
            );
        }
        self.flush();

        for event in &self.events {
            if let Event::ZoneConsumed { zone, reward } = event {
                debug!(zone = zone.get(), reward, "granting reward");
                rewards.grant(*reward);
            }
        }

        self.publish();
        &self.events
    }

    /// Removes every live zone without contaminating any tile and schedules the
    /// whole roster for placement on the next tick.
    pub fn reset(&mut self) {
        if query::board(&self.world).is_none() {
            warn!("reset ignored: board not configured");
            return;
        }
        self.events.clear();
        self.apply(Command::ClearZones);
        self.lifecycle.schedule_roster(query::clock(&self.world));
        self.publish();
    }

    /// Overrides a live zone's hit requirement. Returns `false` when the zone
    /// is not live.
    pub fn set_required_hits(&mut self, zone: ZoneId, required_hits: u32) -> bool {
        if query::zone(&self.world, zone).is_none() {
            return false;
        }
        self.events.clear();
        self.apply(Command::AdjustRequiredHits {
            zone,
            required_hits,
        });
        self.publish();
        true
    }

    /// Registers a listener for every event published from now on.
    pub fn subscribe<F>(&mut self, listener: F) -> SubscriptionId
    where
        F: FnMut(&Event) + 'static,
    {
        self.bus.subscribe(listener)
    }

    /// Removes a listener. Returns `false` when the handle was unknown.
    pub fn unsubscribe(&mut self, id: SubscriptionId) -> bool {
        self.bus.unsubscribe(id)
    }

    /// Snapshot of every live zone.
    #[must_use]
    pub fn zones(&self) -> ZoneView {
        query::zone_view(&self.world)
    }

    /// Snapshot of a single live zone.
    #[must_use]
    pub fn zone(&self, zone: ZoneId) -> Option<ZoneSnapshot> {
        query::zone(&self.world, zone)
    }

    /// Read-only view of the contamination grid, once a board is configured.
    #[must_use]
    pub fn contamination(&self) -> Option<ContaminationView<'_>> {
        query::contamination_view(&self.world)
    }

    /// Board currently installed.
    #[must_use]
    pub fn board(&self) -> Option<&TileGrid> {
        query::board(&self.world)
    }

    /// Simulation time accumulated by processed ticks.
    #[must_use]
    pub fn clock(&self) -> Duration {
        query::clock(&self.world)
    }

    /// Number of batch regenerations performed so far.
    #[must_use]
    pub fn roster_generation(&self) -> u64 {
        query::roster_generation(&self.world)
    }

    /// Roster slots still waiting for a location.
    #[must_use]
    pub fn pending_slots(&self) -> usize {
        self.lifecycle.pending_slots()
    }

    /// Configuration the engine was created with.
    #[must_use]
    pub fn config(&self) -> &ZoneConfig {
        &self.config
    }

    fn apply(&mut self, command: Command) {
        world::apply(&mut self.world, command, &mut self.events);
    }

    fn flush(&mut self) {
        for command in self.commands.drain(..) {
            world::apply(&mut self.world, command, &mut self.events);
        }
    }

    fn publish(&mut self) {
        self.bus.publish(&self.events);
    }

    fn report_outage(&mut self, outage: Outage) {
        if self.outage != Some(outage) {
            warn!(reason = outage.describe(), "zone tick skipped");
            self.outage = Some(outage);
        }
    }
}
