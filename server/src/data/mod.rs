use bugbash_common::models::{Phase, VisualState};

use crate::timer::TimerHandle;

pub const BUG_POINTS: i32 = 10;
pub const BOMB_POINTS: i32 = -10;
pub const CATERPILLAR_POINTS: i32 = 20;

/// Upper bounds of the spawn roll, cumulative.
const BUG_ROLL: f64 = 0.4;
const BOMB_ROLL: f64 = 0.8;

#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub enum Occupant {
    #[default]
    Empty,
    Bug,
    Bomb,
    Caterpillar,
    Squashed,
}

impl Occupant {
    /// Classifies a roll in `[0, 1)`: 40% bug, 40% bomb, 20% caterpillar.
    pub fn from_roll(roll: f64) -> Self {
        if roll < BUG_ROLL {
            Self::Bug
        } else if roll < BOMB_ROLL {
            Self::Bomb
        } else {
            Self::Caterpillar
        }
    }

    pub fn is_empty(self) -> bool {
        self == Self::Empty
    }

    pub fn is_creature(self) -> bool {
        matches!(self, Self::Bug | Self::Bomb | Self::Caterpillar)
    }

    /// Score change for squashing this occupant, `None` if it can't be squashed.
    pub fn points(self) -> Option<i32> {
        match self {
            Self::Bug => Some(BUG_POINTS),
            Self::Bomb => Some(BOMB_POINTS),
            Self::Caterpillar => Some(CATERPILLAR_POINTS),
            Self::Empty | Self::Squashed => None,
        }
    }

    pub fn glyph(self) -> Option<&'static str> {
        match self {
            Self::Empty => None,
            Self::Bug => Some("🐛"),
            Self::Bomb => Some("💣"),
            Self::Caterpillar => Some("🪱"),
            Self::Squashed => Some("💥"),
        }
    }
}

impl From<Occupant> for VisualState {
    fn from(value: Occupant) -> Self {
        match value {
            Occupant::Empty => Self::None,
            Occupant::Bug => Self::OccupiedBug,
            Occupant::Bomb => Self::OccupiedBomb,
            Occupant::Caterpillar => Self::OccupiedCaterpillar,
            Occupant::Squashed => Self::Squashed,
        }
    }
}

#[derive(Debug, Default)]
pub struct Hole {
    pub occupant: Occupant,
    pub accepting_input: bool,
    pub expiry: Option<TimerHandle>,
    pub squash: Option<TimerHandle>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Round {
    pub score: u32,
    pub time_left: u32,
    pub phase: Phase,
}

impl Round {
    pub fn new(round_seconds: u32) -> Self {
        Self {
            score: 0,
            time_left: round_seconds,
            phase: Phase::Active,
        }
    }

    pub fn banner(&self) -> String {
        match self.phase {
            Phase::Ended => format!("Game Over! Final Score: {}", self.score),
            Phase::Active | Phase::Paused => String::new(),
        }
    }

    pub fn pause_label(&self) -> &'static str {
        match self.phase {
            Phase::Paused => "Resume",
            Phase::Active | Phase::Ended => "Pause",
        }
    }
}
