use std::{collections::BTreeMap, mem};

use bugbash_common::{
    models::VisualState,
    protocol::{CellUpdate, ServerMessage},
};

/// Everything the controller shows, plus per-cell input attachment.
pub trait Presentation {
    fn set_content(&mut self, cell: usize, glyph: Option<&str>);
    fn set_visual_state(&mut self, cell: usize, visual: VisualState);
    fn set_input_attached(&mut self, cell: usize, attached: bool);
    fn set_score_display(&mut self, score: u32);
    fn set_timer_display(&mut self, time_left: u32);
    fn set_game_over_banner(&mut self, banner: &str);
    fn set_pause_button_label(&mut self, label: &str);
}

/// Collects presentation changes until they are drained into an update message.
/// Later writes to the same field win.
#[derive(Debug, Default)]
pub struct Frame {
    cells: BTreeMap<usize, CellUpdate>,
    score: Option<u32>,
    time_left: Option<u32>,
    banner: Option<String>,
    pause_label: Option<String>,
}

impl Frame {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn is_empty(&self) -> bool {
        self.cells.is_empty()
            && self.score.is_none()
            && self.time_left.is_none()
            && self.banner.is_none()
            && self.pause_label.is_none()
    }

    pub fn cell(&self, cell: usize) -> Option<&CellUpdate> {
        self.cells.get(&cell)
    }

    pub fn take_update(&mut self) -> Option<ServerMessage> {
        if self.is_empty() {
            return None;
        }

        let frame = mem::take(self);
        Some(ServerMessage::Update {
            cells: frame.cells.into_values().collect(),
            score: frame.score,
            time_left: frame.time_left,
            banner: frame.banner,
            pause_label: frame.pause_label,
        })
    }

    fn cell_mut(&mut self, cell: usize) -> &mut CellUpdate {
        self.cells
            .entry(cell)
            .or_insert_with(|| CellUpdate::new(cell))
    }
}

impl Presentation for Frame {
    fn set_content(&mut self, cell: usize, glyph: Option<&str>) {
        self.cell_mut(cell).content = Some(glyph.unwrap_or_default().to_string());
    }

    fn set_visual_state(&mut self, cell: usize, visual: VisualState) {
        self.cell_mut(cell).visual = Some(visual);
    }

    fn set_input_attached(&mut self, cell: usize, attached: bool) {
        self.cell_mut(cell).accepting_input = Some(attached);
    }

    fn set_score_display(&mut self, score: u32) {
        self.score = Some(score);
    }

    fn set_timer_display(&mut self, time_left: u32) {
        self.time_left = Some(time_left);
    }

    fn set_game_over_banner(&mut self, banner: &str) {
        self.banner = Some(banner.to_string());
    }

    fn set_pause_button_label(&mut self, label: &str) {
        self.pause_label = Some(label.to_string());
    }
}
