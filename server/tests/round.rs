use std::time::Duration;

use bugbash_common::{
    models::{GameParams, Phase},
    protocol::ServerMessage,
};
use bugbash_server::{
    config::Timing,
    controller::GameController,
    data::{Occupant, Round},
    presentation::Frame,
    timer::ManualClock,
};
use rand::{SeedableRng, rngs::StdRng};

type Game = GameController<ManualClock, Frame, StdRng>;

fn start(seed: u64) -> Game {
    GameController::new(
        &GameParams::default(),
        Timing::default(),
        ManualClock::new(),
        Frame::new(),
        StdRng::seed_from_u64(seed),
    )
}

fn millis(ms: u64) -> Duration {
    Duration::from_millis(ms)
}

fn all_empty(game: &Game) -> bool {
    game.holes().iter().all(|hole| hole.occupant.is_empty())
}

fn drain(game: &mut Game) -> Option<ServerMessage> {
    game.surface_mut().take_update()
}

#[test]
fn forced_bomb_right_after_start_keeps_score_at_zero() {
    let mut game = start(1);
    assert!(game.place(3, Occupant::Bomb));

    game.on_cell_activated(3);
    assert_eq!(game.round().score, 0);
    assert_eq!(game.occupant(3), Some(Occupant::Squashed));
}

#[test]
fn bug_scores_once_and_clears_within_half_a_unit() {
    let mut game = start(2);
    assert!(game.place(0, Occupant::Bug));

    game.on_cell_activated(0);
    assert_eq!(game.round().score, 10);
    assert_eq!(game.occupant(0), Some(Occupant::Squashed));

    game.on_cell_activated(0);
    assert_eq!(game.round().score, 10, "squashed bug must not score again");

    game.advance(millis(500));
    assert_eq!(game.occupant(0), Some(Occupant::Empty));

    game.advance(millis(2500));
    assert_eq!(game.round().score, 10);
}

#[test]
fn activating_empty_or_squashed_changes_nothing() {
    let mut game = start(3);
    drain(&mut game);

    game.on_cell_activated(5);
    assert_eq!(game.round().score, 0);
    assert!(game.surface().is_empty());

    assert!(game.place(5, Occupant::Caterpillar));
    game.on_cell_activated(5);
    assert_eq!(game.round().score, 20);
    drain(&mut game);

    game.on_cell_activated(5);
    assert_eq!(game.round().score, 20);
    assert!(game.surface().is_empty());
}

#[test]
fn score_is_clamped_at_zero() {
    let mut game = start(4);
    let sequence = [
        (Occupant::Bomb, 0),
        (Occupant::Bug, 10),
        (Occupant::Bomb, 0),
        (Occupant::Bomb, 0),
        (Occupant::Caterpillar, 20),
        (Occupant::Bomb, 10),
        (Occupant::Bomb, 0),
        (Occupant::Bomb, 0),
    ];

    for (index, (occupant, expected)) in sequence.into_iter().enumerate() {
        assert!(game.place(index, occupant));
        game.on_cell_activated(index);
        assert_eq!(game.round().score, expected, "after {occupant:?} in hole {index}");
    }
}

#[test]
fn time_left_only_goes_down() {
    let mut game = start(5);
    let mut previous = game.round().time_left;
    for _ in 0..400 {
        game.advance(millis(100));
        let time_left = game.round().time_left;
        assert!(time_left <= previous);
        previous = time_left;
    }
    assert_eq!(previous, 0);
    assert_eq!(game.round().phase, Phase::Ended);
}

#[test]
fn spawned_entities_expire_on_their_own() {
    let mut game = start(6);
    game.advance(millis(700));
    let spawned = game
        .holes()
        .iter()
        .filter(|hole| hole.occupant.is_creature())
        .count();
    assert_eq!(spawned, 1, "the first spawn always finds an empty board");

    game.toggle_pause();
    game.advance(millis(2000));
    assert!(all_empty(&game));
}

#[test]
fn pause_freezes_the_round_and_resume_continues_it() {
    let mut game = start(7);
    game.advance(millis(5300));
    assert_eq!(game.round().time_left, 25);

    game.toggle_pause();
    assert_eq!(game.round().phase, Phase::Paused);
    assert_eq!(game.round().pause_label(), "Resume");
    drain(&mut game);

    game.advance(Duration::from_secs(60));
    assert_eq!(game.round().time_left, 25);
    assert_eq!(game.timers().pending(), 0, "only entity timers ran while paused");
    if let Some(ServerMessage::Update { cells, time_left, .. }) = drain(&mut game) {
        assert_eq!(time_left, None);
        assert!(
            cells.iter().all(|cell| cell.content.as_deref().is_none_or(str::is_empty)),
            "nothing may spawn while paused"
        );
    }

    game.toggle_pause();
    assert_eq!(game.round().phase, Phase::Active);
    assert_eq!(game.round().pause_label(), "Pause");
    assert_eq!(game.timers().pending(), 2);

    game.advance(millis(1000));
    assert_eq!(game.round().time_left, 24);
}

#[test]
fn paused_board_ignores_activation_but_keeps_expiring() {
    let mut game = start(8);
    assert!(game.place(2, Occupant::Bug));

    game.toggle_pause();
    assert!(!game.holes()[2].accepting_input);
    game.on_cell_activated(2);
    assert_eq!(game.round().score, 0);
    assert_eq!(game.occupant(2), Some(Occupant::Bug));

    game.advance(millis(2000));
    assert_eq!(game.occupant(2), Some(Occupant::Empty));
}

#[test]
fn resume_reattaches_input() {
    let mut game = start(9);
    assert!(game.place(2, Occupant::Bug));
    game.toggle_pause();
    game.toggle_pause();

    game.on_cell_activated(2);
    assert_eq!(game.round().score, 10);
}

#[test]
fn stale_expiry_never_clears_a_later_spawn() {
    let mut game = start(10);
    assert!(game.place(1, Occupant::Bug));
    game.on_cell_activated(1);
    game.advance(millis(500));
    assert_eq!(game.occupant(1), Some(Occupant::Empty));

    assert!(game.place(1, Occupant::Bug));
    game.advance(millis(900));
    assert_eq!(game.occupant(1), Some(Occupant::Bug));
}

#[test]
fn reset_mid_round_starts_clean() {
    let mut game = start(11);
    for index in 0..7 {
        assert!(game.place(index, Occupant::Caterpillar));
        game.on_cell_activated(index);
    }
    assert!(game.place(7, Occupant::Bug));
    game.on_cell_activated(7);
    assert_eq!(game.round().score, 150);

    game.advance(Duration::from_secs(18));
    assert_eq!(game.round().time_left, 12);

    game.start();
    assert_eq!(game.round(), &Round::new(30));
    assert!(all_empty(&game));
    assert_eq!(game.timers().pending(), 2, "only the new countdown and spawner remain");

    game.advance(millis(500));
    assert!(all_empty(&game));
    assert_eq!(game.round().score, 0);
    assert_eq!(game.round().time_left, 30);
}

#[test]
fn round_ends_after_thirty_ticks() {
    let mut game = start(12);
    assert!(game.place(0, Occupant::Bug));
    game.on_cell_activated(0);

    game.advance(Duration::from_secs(30));
    assert_eq!(game.round().phase, Phase::Ended);
    assert_eq!(game.round().time_left, 0);

    let Some(ServerMessage::Update { banner, time_left, .. }) = drain(&mut game) else {
        panic!("expected an update");
    };
    assert_eq!(banner.as_deref(), Some("Game Over! Final Score: 10"));
    assert_eq!(time_left, Some(0));

    game.advance(Duration::from_secs(3));
    assert!(all_empty(&game), "nothing spawns after the round ends");
    assert_eq!(game.timers().pending(), 0);
}

#[test]
fn direct_countdown_ticks_end_the_round() {
    let mut game = start(13);
    for _ in 0..29 {
        game.on_countdown_tick();
    }
    assert_eq!(game.round().phase, Phase::Active);

    game.on_countdown_tick();
    assert_eq!(game.round().phase, Phase::Ended);
    assert_eq!(game.round().banner(), "Game Over! Final Score: 0");

    drain(&mut game);
    game.on_spawn_tick();
    game.on_countdown_tick();
    assert!(game.surface().is_empty());
    assert_eq!(game.round().time_left, 0);
}

#[test]
fn snapshot_reflects_the_board() {
    let mut game = start(14);
    assert!(game.place(4, Occupant::Caterpillar));

    let ServerMessage::Init {
        holes,
        score,
        time_left,
        phase,
        cells,
        ..
    } = game.snapshot()
    else {
        panic!("snapshot must be an init message");
    };
    assert_eq!((holes, score, time_left, phase), (9, 0, 30, Phase::Active));
    assert_eq!(cells[4].content.as_deref(), Some("🪱"));
    assert_eq!(cells[4].accepting_input, Some(true));
    assert_eq!(cells[0].content.as_deref(), Some(""));
}

#[test]
fn spawner_draws_from_every_hole_including_occupied_ones() {
    let draws = 9_000;
    let mut hits = 0;
    for seed in 0..draws {
        let mut game = start(seed);
        for index in 0..8 {
            assert!(game.place(index, Occupant::Bomb));
        }

        game.on_spawn_tick();
        if game.occupant(8).is_some_and(Occupant::is_creature) {
            hits += 1;
        }
    }

    // One hole in nine is free, so a tick lands on it about 1/9 of the time.
    let share = hits as f64 / draws as f64;
    assert!((share - 1.0 / 9.0).abs() < 0.025, "free hole filled {hits}/{draws}");
}

#[test]
fn spawned_creatures_follow_the_weights() {
    let draws = 10_000;
    let mut counts = [0usize; 3];
    for seed in 0..draws {
        let mut game = start(seed);
        game.on_spawn_tick();

        let spawned: Vec<Occupant> = game
            .holes()
            .iter()
            .map(|hole| hole.occupant)
            .filter(|occupant| !occupant.is_empty())
            .collect();
        match spawned.as_slice() {
            [Occupant::Bug] => counts[0] += 1,
            [Occupant::Bomb] => counts[1] += 1,
            [Occupant::Caterpillar] => counts[2] += 1,
            other => panic!("seed {seed} spawned {other:?}"),
        }
    }

    let share = |count: usize| count as f64 / draws as f64;
    assert!((share(counts[0]) - 0.4).abs() < 0.025, "bugs {counts:?}");
    assert!((share(counts[1]) - 0.4).abs() < 0.025, "bombs {counts:?}");
    assert!((share(counts[2]) - 0.2).abs() < 0.025, "caterpillars {counts:?}");
}
