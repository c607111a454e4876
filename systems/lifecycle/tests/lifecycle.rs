use std::time::Duration;

use capture_zones_core::{
    Command, Event, Footprint, Placement, PlayerBody, ReplacementMode, TileCoord, TileGrid,
    Tunables, ZoneProfile,
};
use capture_zones_system_lifecycle::{alpha_schedule, Lifecycle, RosterSlot};
use capture_zones_system_placement::clean_ratio;
use capture_zones_world::{self as world, query, World};
use glam::Vec2;

struct Body {
    position: Vec2,
    velocity: Vec2,
}

impl PlayerBody for Body {
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

fn profile(side: u32, required_hits: u32, lifetime_seconds: f32) -> ZoneProfile {
    ZoneProfile {
        footprint: Footprint::square(side),
        required_hits,
        reward: 10,
        lifetime_seconds,
        bonus_arc_enabled: false,
    }
}

fn roster(profiles: &[ZoneProfile]) -> Vec<RosterSlot> {
    profiles
        .iter()
        .enumerate()
        .map(|(profile_index, profile)| RosterSlot {
            profile_index,
            profile: *profile,
        })
        .collect()
}

fn apply_all(world: &mut World, commands: &mut Vec<Command>) -> Vec<Event> {
    let mut events = Vec::new();
    for command in commands.drain(..) {
        world::apply(world, command, &mut events);
    }
    events
}

fn refill(lifecycle: &mut Lifecycle, world: &mut World) -> Vec<Event> {
    let grid = *query::board(world).expect("board configured");
    let zones = query::zone_view(world);
    let now = query::clock(world);
    let mut commands = Vec::new();
    {
        let contamination = query::contamination_view(world).expect("board configured");
        lifecycle.refill(&grid, &contamination, &zones, None, now, &mut commands);
    }
    apply_all(world, &mut commands)
}

fn refill_placements(lifecycle: &mut Lifecycle, world: &mut World) -> Vec<Placement> {
    let grid = *query::board(world).expect("board configured");
    let zones = query::zone_view(world);
    let now = query::clock(world);
    let mut commands = Vec::new();
    {
        let contamination = query::contamination_view(world).expect("board configured");
        lifecycle.refill(&grid, &contamination, &zones, None, now, &mut commands);
    }
    let placements = commands
        .iter()
        .filter_map(|command| match command {
            Command::SpawnZone { placement, .. } => Some(placement.clone()),
            _ => None,
        })
        .collect();
    let _ = apply_all(world, &mut commands);
    placements
}

/// Contaminates single tiles by expiring one-tile zones on them.
fn contaminate(world: &mut World, tiles: impl IntoIterator<Item = TileCoord>) {
    for tile in tiles {
        let mut events = Vec::new();
        world::apply(
            world,
            Command::SpawnZone {
                profile_index: 0,
                profile: profile(1, 0, 1.0),
                placement: Placement {
                    center: tile,
                    tiles: vec![tile],
                    alpha_used: 1.0,
                },
                bonus: None,
                timer: None,
            },
            &mut events,
        );
        let zone = match events.first() {
            Some(Event::ZoneSpawned { zone, .. }) => *zone,
            other => panic!("spawn on {tile:?} rejected: {other:?}"),
        };
        world::apply(world, Command::ExpireZone { zone }, &mut events);
    }
}

fn advance(world: &mut World, dt: Duration) {
    let mut events = Vec::new();
    world::apply(world, Command::Tick { dt }, &mut events);
}

fn spawned(events: &[Event]) -> usize {
    events
        .iter()
        .filter(|event| matches!(event, Event::ZoneSpawned { .. }))
        .count()
}

#[test]
fn refill_spawns_the_whole_roster_without_overlap() {
    let mut world = World::with_board(TileGrid::new(20, 20, 1.0));
    let mut lifecycle = Lifecycle::new(
        roster(&[profile(2, 0, 5.0), profile(3, 1, 5.0), profile(4, 2, 5.0)]),
        Tunables::default(),
    );
    lifecycle.schedule_roster(Duration::ZERO);

    let events = refill(&mut lifecycle, &mut world);

    assert_eq!(spawned(&events), 3);
    assert_eq!(lifecycle.pending_slots(), 0);
    let zones = query::zone_view(&world);
    for (index, first) in zones.iter().enumerate() {
        for second in zones.iter().skip(index + 1) {
            assert!(first
                .footprint_tiles
                .iter()
                .all(|tile| !second.footprint_tiles.contains(tile)));
        }
    }
}

#[test]
fn expired_slot_respawns_after_the_delay() {
    let mut world = World::with_board(TileGrid::new(16, 16, 1.0));
    let mut lifecycle = Lifecycle::new(roster(&[profile(2, 0, 1.0)]), Tunables::default());
    lifecycle.schedule_roster(Duration::ZERO);
    assert_eq!(spawned(&refill(&mut lifecycle, &mut world)), 1);

    advance(&mut world, Duration::from_secs(1));
    let mut commands = Vec::new();
    lifecycle.resolve_expiries(&query::zone_view(&world), query::clock(&world), &mut commands);
    let events = apply_all(&mut world, &mut commands);
    assert!(events
        .iter()
        .any(|event| matches!(event, Event::ZoneExpired { .. })));
    assert_eq!(lifecycle.pending_slots(), 1);

    assert_eq!(spawned(&refill(&mut lifecycle, &mut world)), 0);
    advance(&mut world, Duration::from_millis(1_500));
    assert_eq!(spawned(&refill(&mut lifecycle, &mut world)), 1);
}

#[test]
fn batch_mode_expires_every_zone_on_first_expiry() {
    let tunables = Tunables {
        replacement_mode: ReplacementMode::Batch,
        ..Tunables::default()
    };
    let mut world = World::with_board(TileGrid::new(24, 24, 1.0));
    let mut lifecycle = Lifecycle::new(roster(&[profile(2, 0, 1.0), profile(3, 0, 9.0)]), tunables);
    lifecycle.schedule_roster(Duration::ZERO);
    assert_eq!(spawned(&refill(&mut lifecycle, &mut world)), 2);

    advance(&mut world, Duration::from_secs(1));
    let mut commands = Vec::new();
    lifecycle.resolve_expiries(&query::zone_view(&world), query::clock(&world), &mut commands);
    let events = apply_all(&mut world, &mut commands);

    let expired = events
        .iter()
        .filter(|event| matches!(event, Event::ZoneExpired { .. }))
        .count();
    assert_eq!(expired, 2);
    assert_eq!(events.last(), Some(&Event::RosterReset));
    assert_eq!(query::zone_count(&world), 0);
    assert_eq!(lifecycle.pending_slots(), 2);
    assert_eq!(spawned(&refill(&mut lifecycle, &mut world)), 2);
}

#[test]
fn bounce_reflects_and_clamps_the_player_velocity() {
    let tunables = Tunables {
        max_bounce_speed_tiles: 4.0,
        ..Tunables::default()
    };
    let grid = TileGrid::new(16, 16, 1.0);
    let mut world = World::with_board(grid);
    let mut lifecycle = Lifecycle::new(roster(&[profile(3, 2, 30.0)]), tunables);
    lifecycle.schedule_roster(Duration::ZERO);
    let _ = refill(&mut lifecycle, &mut world);
    let zone = query::zone_view(&world).into_vec().remove(0);

    let mut body = Body {
        position: zone.center_world + Vec2::new(1.0, 0.0),
        velocity: Vec2::new(-10.0, 0.0),
    };
    let mut commands = Vec::new();
    lifecycle.evaluate_contacts(
        &grid,
        &query::zone_view(&world),
        query::clock(&world),
        &mut body,
        &mut commands,
    );
    let events = apply_all(&mut world, &mut commands);

    assert!((body.velocity - Vec2::new(4.0, 0.0)).length() < 1e-4);
    assert_eq!(
        events,
        vec![Event::HitCountChanged {
            zone: zone.id,
            hits: 1,
            required_hits: 2,
            was_bonus: false,
        }]
    );
    let snapshot = query::zone(&world, zone.id).expect("zone still live");
    assert!(snapshot.must_exit_first);
    assert_eq!(snapshot.consume_lock_until, Duration::from_millis(500));
}

#[test]
fn bounces_respect_the_cooldown() {
    let grid = TileGrid::new(16, 16, 1.0);
    let mut world = World::with_board(grid);
    let mut lifecycle = Lifecycle::new(roster(&[profile(3, 5, 30.0)]), Tunables::default());
    lifecycle.schedule_roster(Duration::ZERO);
    let _ = refill(&mut lifecycle, &mut world);
    let zone = query::zone_view(&world).into_vec().remove(0);
    let mut body = Body {
        position: zone.center_world,
        velocity: Vec2::X,
    };

    let mut hits = Vec::new();
    for _ in 0..4 {
        let mut commands = Vec::new();
        lifecycle.evaluate_contacts(
            &grid,
            &query::zone_view(&world),
            query::clock(&world),
            &mut body,
            &mut commands,
        );
        let _ = apply_all(&mut world, &mut commands);
        hits.push(query::zone(&world, zone.id).expect("live").accumulated_hits);
        advance(&mut world, Duration::from_millis(150));
    }

    assert_eq!(hits, vec![1, 1, 2, 2]);
}

#[test]
fn consumption_waits_for_exit_and_lock() {
    let grid = TileGrid::new(16, 16, 1.0);
    let mut world = World::with_board(grid);
    let mut lifecycle = Lifecycle::new(roster(&[profile(3, 1, 30.0)]), Tunables::default());
    lifecycle.schedule_roster(Duration::ZERO);
    let _ = refill(&mut lifecycle, &mut world);
    let zone = query::zone_view(&world).into_vec().remove(0);
    let inside = zone.center_world + Vec2::new(0.5, 0.0);
    let outside = zone.center_world + Vec2::new(6.0, 0.0);
    let mut body = Body {
        position: inside,
        velocity: Vec2::ZERO,
    };

    let mut step = |world: &mut World, body: &mut Body| {
        let mut commands = Vec::new();
        lifecycle.evaluate_contacts(
            &grid,
            &query::zone_view(world),
            query::clock(world),
            body,
            &mut commands,
        );
        apply_all(world, &mut commands)
    };

    let _ = step(&mut world, &mut body);
    advance(&mut world, Duration::from_secs(1));
    let still_inside = step(&mut world, &mut body);
    assert!(still_inside.is_empty(), "must leave before consuming");

    body.position = outside;
    let _ = step(&mut world, &mut body);
    assert!(!query::zone(&world, zone.id).expect("live").must_exit_first);

    body.position = inside;
    let consumed = step(&mut world, &mut body);
    assert_eq!(
        consumed,
        vec![Event::ZoneConsumed {
            zone: zone.id,
            reward: 10,
        }]
    );
}

#[test]
fn overfull_roster_keeps_the_slot_pending() {
    let mut world = World::with_board(TileGrid::new(4, 4, 1.0));
    let mut lifecycle = Lifecycle::new(
        roster(&[profile(4, 0, 5.0), profile(4, 0, 5.0)]),
        Tunables::default(),
    );
    lifecycle.schedule_roster(Duration::ZERO);

    assert_eq!(spawned(&refill(&mut lifecycle, &mut world)), 1);
    assert_eq!(lifecycle.pending_slots(), 1);
    assert_eq!(spawned(&refill(&mut lifecycle, &mut world)), 0);
    assert_eq!(lifecycle.pending_slots(), 1);
}

#[test]
fn dense_contamination_relaxes_the_clean_threshold() {
    let grid = TileGrid::new(8, 8, 1.0);
    let mut world = World::with_board(grid);
    let striped = (0..8)
        .flat_map(|row| (0..8).map(move |column| TileCoord::new(column, row)))
        .filter(|tile| tile.column() % 3 != 0);
    contaminate(&mut world, striped);
    assert_eq!(
        query::contamination_view(&world).expect("board").contaminated_count(),
        40
    );

    let tunables = Tunables::default();
    let schedule = alpha_schedule(&tunables);
    let mut lifecycle = Lifecycle::new(roster(&[profile(3, 0, 5.0)]), tunables);
    lifecycle.schedule_roster(Duration::ZERO);

    let placements = refill_placements(&mut lifecycle, &mut world);

    assert_eq!(placements.len(), 1);
    let placement = &placements[0];
    assert_eq!(placement.alpha_used, schedule[2], "third threshold is the first that fits");
    assert!(placement.alpha_used < schedule[0]);
    assert!(placement.center.column() % 3 == 0, "centre stays on a clean tile");
    let view = query::contamination_view(&world).expect("board");
    assert!(clean_ratio(&view, &placement.tiles) >= placement.alpha_used);
}

#[test]
fn first_fit_runs_only_once_every_threshold_failed() {
    let everything = |columns: u32, rows: u32| {
        (0..rows).flat_map(move |row| (0..columns).map(move |column| TileCoord::new(column, row)))
    };

    let mut world = World::with_board(TileGrid::new(4, 4, 1.0));
    contaminate(&mut world, everything(4, 4));
    let strict = Tunables {
        linear_scan_fallback: false,
        ..Tunables::default()
    };
    let mut lifecycle = Lifecycle::new(roster(&[profile(3, 0, 5.0)]), strict);
    lifecycle.schedule_roster(Duration::ZERO);
    assert!(refill_placements(&mut lifecycle, &mut world).is_empty());
    assert_eq!(lifecycle.pending_slots(), 1);

    let mut world = World::with_board(TileGrid::new(4, 4, 1.0));
    contaminate(&mut world, everything(4, 4));
    let mut lifecycle = Lifecycle::new(roster(&[profile(3, 0, 5.0)]), Tunables::default());
    lifecycle.schedule_roster(Duration::ZERO);
    let placements = refill_placements(&mut lifecycle, &mut world);
    assert_eq!(placements.len(), 1);
    assert_eq!(placements[0].alpha_used, 0.0, "fallback ignores density");
    assert_eq!(placements[0].center, TileCoord::new(1, 1));
    assert_eq!(lifecycle.pending_slots(), 0);
}

#[test]
fn batch_roster_shares_one_countdown() {
    let tunables = Tunables {
        replacement_mode: ReplacementMode::Batch,
        ..Tunables::default()
    };
    let mut world = World::with_board(TileGrid::new(24, 24, 1.0));
    let mut lifecycle = Lifecycle::new(roster(&[profile(2, 0, 1.0), profile(3, 0, 9.0)]), tunables);
    lifecycle.schedule_roster(Duration::ZERO);
    assert_eq!(spawned(&refill(&mut lifecycle, &mut world)), 2);
    let timer = lifecycle.batch_timer().expect("batch spawns start a timer");
    assert_eq!(timer.lifetime, Duration::from_secs(1));

    advance(&mut world, Duration::from_millis(500));
    let zones = query::zone_view(&world).into_vec();
    assert_eq!(zones.len(), 2);
    for zone in &zones {
        assert_eq!(zone.lifetime, Duration::from_secs(1));
        assert!((zone.progress() - 0.5).abs() < 1e-5);
    }

    advance(&mut world, Duration::from_millis(500));
    assert!(query::zone_view(&world).iter().all(|zone| zone.is_expired()));
    let mut commands = Vec::new();
    lifecycle.resolve_expiries(&query::zone_view(&world), query::clock(&world), &mut commands);
    let _ = apply_all(&mut world, &mut commands);
    assert_eq!(lifecycle.batch_timer(), None, "regeneration ends the countdown");
}

#[test]
fn independent_zones_keep_their_own_lifetime() {
    let mut world = World::with_board(TileGrid::new(24, 24, 1.0));
    let mut lifecycle = Lifecycle::new(
        roster(&[profile(2, 0, 1.0), profile(3, 0, 9.0)]),
        Tunables::default(),
    );
    lifecycle.schedule_roster(Duration::ZERO);
    assert_eq!(spawned(&refill(&mut lifecycle, &mut world)), 2);
    assert_eq!(lifecycle.batch_timer(), None);

    let mut lifetimes: Vec<_> = query::zone_view(&world).iter().map(|zone| zone.lifetime).collect();
    lifetimes.sort();
    assert_eq!(lifetimes, vec![Duration::from_secs(1), Duration::from_secs(9)]);
}
