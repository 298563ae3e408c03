//! The round state machine.
//!
//! [`GameController`] owns the round and every hole, and is the only thing that
//! mutates them. It never waits on anything: each entry point runs to completion
//! and leaves behind whatever timers the next step needs.

use std::time::Duration;

use bugbash_common::{
    models::{GameParams, Phase},
    protocol::{CellUpdate, ServerMessage},
};
use rand::Rng;
use tracing::{debug, info, trace, warn};

use crate::{
    config::Timing,
    data::{Hole, Occupant, Round},
    presentation::Presentation,
    timer::{ManualClock, TimerEvent, TimerHandle, TimerService},
};

pub const MAX_HOLES: usize = 64;
pub const MAX_ROUND_SECONDS: u32 = 3600;

fn validate_params(params: &GameParams) -> (usize, u32) {
    (
        params.holes.clamp(1, MAX_HOLES),
        params.round_seconds.clamp(1, MAX_ROUND_SECONDS),
    )
}

pub struct GameController<T, P, R> {
    timing: Timing,
    round_seconds: u32,
    holes: Vec<Hole>,
    round: Round,
    countdown: Option<TimerHandle>,
    spawner: Option<TimerHandle>,
    timers: T,
    surface: P,
    rng: R,
}

impl<T: TimerService, P: Presentation, R: Rng> GameController<T, P, R> {
    /// Builds the board and starts the first round.
    pub fn new(params: &GameParams, timing: Timing, timers: T, surface: P, rng: R) -> Self {
        let (holes, round_seconds) = validate_params(params);
        let mut controller = Self {
            timing,
            round_seconds,
            holes: (0..holes).map(|_| Hole::default()).collect(),
            round: Round::new(round_seconds),
            countdown: None,
            spawner: None,
            timers,
            surface,
            rng,
        };
        controller.start();
        controller
    }

    /// Starts a fresh round, superseding whatever was running.
    pub fn start(&mut self) {
        self.stop_round_timers();
        self.round = Round::new(self.round_seconds);
        for index in 0..self.holes.len() {
            self.clear_hole(index);
        }

        self.surface.set_score_display(self.round.score);
        self.surface.set_timer_display(self.round.time_left);
        self.surface.set_game_over_banner("");
        self.surface.set_pause_button_label(self.round.pause_label());
        self.schedule_round_timers();

        info!(
            "Round started: {} holes, {}s",
            self.holes.len(),
            self.round.time_left
        );
    }

    /// Dispatches a fired timer. Handles cancelled since firing are dropped.
    pub fn fire(&mut self, handle: TimerHandle) {
        let Some(event) = self.timers.claim(handle) else {
            trace!("Ignoring stale timer {:?}", handle);
            return;
        };

        match event {
            TimerEvent::Countdown => self.on_countdown_tick(),
            TimerEvent::Spawn => self.on_spawn_tick(),
            TimerEvent::Expire { cell, occupant } => self.on_expire(handle, cell, occupant),
            TimerEvent::ClearSquashed { cell } => self.on_squash_cleared(handle, cell),
        }
    }

    pub fn on_countdown_tick(&mut self) {
        if self.round.phase != Phase::Active {
            return;
        }

        self.round.time_left = self.round.time_left.saturating_sub(1);
        self.surface.set_timer_display(self.round.time_left);
        if self.round.time_left == 0 {
            self.end_round();
        }
    }

    pub fn on_spawn_tick(&mut self) {
        if self.round.phase != Phase::Active {
            return;
        }

        let index = self.rng.random_range(0..self.holes.len());
        if !self.holes[index].occupant.is_empty() {
            trace!("Spawn skipped, hole {} is occupied", index);
            return;
        }

        let occupant = Occupant::from_roll(self.rng.random::<f64>());
        self.place(index, occupant);
    }

    /// Puts a creature into an empty hole and starts its expiry clock.
    /// Returns false if the hole is occupied or out of range, or `occupant` is no creature.
    pub fn place(&mut self, index: usize, occupant: Occupant) -> bool {
        if !occupant.is_creature() {
            return false;
        }
        if !self
            .holes
            .get(index)
            .is_some_and(|hole| hole.occupant.is_empty())
        {
            return false;
        }

        let lifetime = self.timing.lifetime(self.rng.random::<f64>());
        let expiry = self
            .timers
            .schedule_once(lifetime, TimerEvent::Expire { cell: index, occupant });
        let attached = self.round.phase != Phase::Paused;

        let hole = &mut self.holes[index];
        hole.occupant = occupant;
        hole.accepting_input = attached;
        if let Some(stale) = hole.expiry.replace(expiry) {
            self.timers.cancel(stale);
        }

        self.render(index);
        self.surface.set_input_attached(index, attached);
        debug!("Spawned {:?} in hole {} for {:?}", occupant, index, lifetime);
        true
    }

    pub fn on_cell_activated(&mut self, index: usize) {
        if self.round.phase != Phase::Active {
            trace!("Activation of hole {} ignored while {:?}", index, self.round.phase);
            return;
        }

        let Some(hole) = self.holes.get_mut(index) else {
            warn!("Activation of unknown hole {}", index);
            return;
        };
        if !hole.accepting_input {
            return;
        }
        let Some(points) = hole.occupant.points() else {
            return;
        };

        let squashed = hole.occupant;
        hole.occupant = Occupant::Squashed;
        let clear = self
            .timers
            .schedule_once(self.timing.squash_duration(), TimerEvent::ClearSquashed { cell: index });
        if let Some(stale) = hole.squash.replace(clear) {
            self.timers.cancel(stale);
        }

        self.round.score = self.round.score.saturating_add_signed(points);
        self.surface.set_score_display(self.round.score);
        self.render(index);
        debug!(
            "Squashed {:?} in hole {}, score now {}",
            squashed, index, self.round.score
        );
    }

    pub fn toggle_pause(&mut self) {
        match self.round.phase {
            Phase::Ended => {
                trace!("Pause ignored, round is over");
                return;
            }
            Phase::Active => {
                self.stop_round_timers();
                self.round.phase = Phase::Paused;
                self.set_input_everywhere(false);
                info!("Round paused with {}s left", self.round.time_left);
            }
            Phase::Paused => {
                self.round.phase = Phase::Active;
                self.set_input_everywhere(true);
                self.schedule_round_timers();
                info!("Round resumed with {}s left", self.round.time_left);
            }
        }
        self.surface.set_pause_button_label(self.round.pause_label());
    }

    /// Full view of the board, for viewers joining mid-round.
    pub fn snapshot(&self) -> ServerMessage {
        ServerMessage::Init {
            holes: self.holes.len(),
            score: self.round.score,
            time_left: self.round.time_left,
            phase: self.round.phase,
            banner: self.round.banner(),
            pause_label: self.round.pause_label().to_string(),
            cells: self
                .holes
                .iter()
                .enumerate()
                .map(|(index, hole)| CellUpdate {
                    cell: index,
                    content: Some(hole.occupant.glyph().unwrap_or_default().to_string()),
                    visual: Some(hole.occupant.into()),
                    accepting_input: Some(hole.accepting_input),
                })
                .collect(),
        }
    }

    pub fn round(&self) -> &Round {
        &self.round
    }

    pub fn occupant(&self, index: usize) -> Option<Occupant> {
        self.holes.get(index).map(|hole| hole.occupant)
    }

    pub fn holes(&self) -> &[Hole] {
        &self.holes
    }

    pub fn timers(&self) -> &T {
        &self.timers
    }

    pub fn surface(&self) -> &P {
        &self.surface
    }

    pub fn surface_mut(&mut self) -> &mut P {
        &mut self.surface
    }

    fn on_expire(&mut self, handle: TimerHandle, index: usize, spawned: Occupant) {
        let Some(hole) = self.holes.get_mut(index) else {
            return;
        };
        if hole.expiry == Some(handle) {
            hole.expiry = None;
        }
        if hole.occupant != spawned {
            trace!("Expiry of hole {} found it already resolved", index);
            return;
        }

        hole.occupant = Occupant::Empty;
        self.render(index);
        debug!("{:?} in hole {} expired", spawned, index);
    }

    fn on_squash_cleared(&mut self, handle: TimerHandle, index: usize) {
        let Some(hole) = self.holes.get_mut(index) else {
            return;
        };
        if hole.squash == Some(handle) {
            hole.squash = None;
        }

        hole.occupant = Occupant::Empty;
        self.render(index);
    }

    fn end_round(&mut self) {
        self.stop_round_timers();
        self.round.phase = Phase::Ended;
        self.surface.set_game_over_banner(&self.round.banner());
        info!("Round over, final score {}", self.round.score);
    }

    fn clear_hole(&mut self, index: usize) {
        let hole = &mut self.holes[index];
        for handle in [hole.expiry.take(), hole.squash.take()].into_iter().flatten() {
            self.timers.cancel(handle);
        }
        hole.occupant = Occupant::Empty;
        hole.accepting_input = false;

        self.render(index);
        self.surface.set_input_attached(index, false);
    }

    fn set_input_everywhere(&mut self, attached: bool) {
        for (index, hole) in self.holes.iter_mut().enumerate() {
            hole.accepting_input = attached;
            self.surface.set_input_attached(index, attached);
        }
    }

    fn render(&mut self, index: usize) {
        let occupant = self.holes[index].occupant;
        self.surface.set_content(index, occupant.glyph());
        self.surface.set_visual_state(index, occupant.into());
    }

    fn schedule_round_timers(&mut self) {
        self.countdown = Some(
            self.timers
                .schedule_repeating(self.timing.countdown_period(), TimerEvent::Countdown),
        );
        self.spawner = Some(
            self.timers
                .schedule_repeating(self.timing.spawn_period(), TimerEvent::Spawn),
        );
    }

    fn stop_round_timers(&mut self) {
        for handle in [self.countdown.take(), self.spawner.take()].into_iter().flatten() {
            self.timers.cancel(handle);
        }
    }
}

impl<P: Presentation, R: Rng> GameController<ManualClock, P, R> {
    /// Moves virtual time forward, running every callback that falls due on the way.
    pub fn advance(&mut self, dt: Duration) {
        let until = self.timers.now() + dt;
        while let Some(handle) = self.timers.next_due(until) {
            self.fire(handle);
        }
        self.timers.advance_to(until);
    }
}
