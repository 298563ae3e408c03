use serde::{Deserialize, Serialize};

use crate::models::{Phase, VisualState};

#[derive(Debug, Deserialize, Serialize, PartialEq, Eq)]
#[serde(tag = "action")]
pub enum ClientMessage {
    #[serde(rename = "activate")]
    Activate { cell: usize },
    #[serde(rename = "pause")]
    Pause,
    #[serde(rename = "reset")]
    Reset,
}

/// Changes to one hole. Fields left as `None` are unchanged.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Eq)]
pub struct CellUpdate {
    pub cell: usize,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub content: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub visual: Option<VisualState>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub accepting_input: Option<bool>,
}

impl CellUpdate {
    pub fn new(cell: usize) -> Self {
        Self {
            cell,
            content: None,
            visual: None,
            accepting_input: None,
        }
    }
}

#[derive(Serialize, Deserialize, Debug)]
#[serde(tag = "type")]
pub enum ServerMessage {
    #[serde(rename = "init")]
    Init {
        holes: usize,
        score: u32,
        time_left: u32,
        phase: Phase,
        banner: String,
        pause_label: String,
        cells: Vec<CellUpdate>,
    },
    #[serde(rename = "update")]
    Update {
        #[serde(default, skip_serializing_if = "Vec::is_empty")]
        cells: Vec<CellUpdate>,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        score: Option<u32>,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        time_left: Option<u32>,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        banner: Option<String>,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        pause_label: Option<String>,
    },
}
