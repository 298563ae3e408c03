use serde::{Deserialize, Serialize};

/// Visual tag shown for a hole. Always derived from what the hole holds.
#[derive(Clone, Copy, Serialize, Deserialize, Debug, PartialEq, Eq)]
pub enum VisualState {
    #[serde(rename = "none")]
    None,
    #[serde(rename = "occupied-bug")]
    OccupiedBug,
    #[serde(rename = "occupied-bomb")]
    OccupiedBomb,
    #[serde(rename = "occupied-caterpillar")]
    OccupiedCaterpillar,
    #[serde(rename = "squashed")]
    Squashed,
}

#[derive(Clone, Copy, Serialize, Deserialize, Debug, PartialEq, Eq)]
pub enum Phase {
    #[serde(rename = "active")]
    Active,
    #[serde(rename = "paused")]
    Paused,
    #[serde(rename = "ended")]
    Ended,
}

#[derive(Debug, Deserialize, Serialize)]
#[serde(default)]
pub struct GameParams {
    pub holes: usize,
    pub round_seconds: u32,
}

impl Default for GameParams {
    fn default() -> Self {
        Self {
            holes: 9,
            round_seconds: 30,
        }
    }
}

#[derive(Serialize, Deserialize)]
pub struct CreateResponse {
    pub id: String,
}
