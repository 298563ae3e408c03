use std::{
    collections::HashMap,
    sync::{Arc, Weak},
    time::Instant,
};

use bugbash_common::{models::GameParams, protocol::ServerMessage};
use dashmap::{DashMap, Entry};
use nanoid::nanoid;
use rand::{SeedableRng, rngs::StdRng};
use rocket::futures::{SinkExt, future::join_all, stream::SplitSink};
use rocket_ws::{Message, stream::DuplexStream};
use tokio::sync::Mutex;
use tracing::{debug, info, instrument, warn};
use uuid::Uuid;

use crate::{
    config::Timing,
    controller::GameController,
    presentation::Frame,
    timer::{TimerFeed, TimerHandle, TokioTimers},
};

pub type Games = Arc<DashMap<String, Arc<Mutex<Game>>>>;

/// Shortest game id handed out. Ids grow by one character after this many collisions.
const ID_LENGTH: usize = 5;
const COLLISIONS_PER_LENGTH: usize = 10;

type Controller = GameController<TokioTimers, Frame, StdRng>;

pub struct Game {
    controller: Controller,
    streams: HashMap<Uuid, SplitSink<DuplexStream, Message>>,
    last_activity: Instant,
}

async fn send(stream: &mut SplitSink<DuplexStream, Message>, message: &ServerMessage) {
    if let Ok(text) = serde_json::to_string(message) {
        let _ = stream.send(Message::Text(text)).await;
    }
}

async fn broadcast(
    streams: &mut HashMap<Uuid, SplitSink<DuplexStream, Message>>,
    message: &ServerMessage,
) {
    let futures: Vec<_> = streams
        .iter_mut()
        .map(|(_, stream)| send(stream, message))
        .collect();

    join_all(futures).await;
}

impl Game {
    /// Creates a game with its round already running. Must be called inside a tokio runtime.
    #[instrument(level = "trace", skip(timing))]
    pub fn new(params: GameParams, timing: Timing) -> (Self, TimerFeed) {
        info!(
            "Creating new game: {} holes, {}s rounds",
            params.holes, params.round_seconds
        );
        let (timers, feed) = TokioTimers::new();
        let game = Self {
            controller: GameController::new(
                &params,
                timing,
                timers,
                Frame::new(),
                StdRng::from_os_rng(),
            ),
            streams: HashMap::new(),
            last_activity: Instant::now(),
        };
        (game, feed)
    }

    #[instrument(level = "trace", skip(self, stream))]
    pub async fn add_stream(&mut self, mut stream: SplitSink<DuplexStream, Message>) -> Uuid {
        let id = Uuid::new_v4();
        debug!("Adding stream {} to game", id);
        send(&mut stream, &self.controller.snapshot()).await;
        self.streams.insert(id, stream);
        self.last_activity = Instant::now();
        info!(
            "Stream {} added, total connections: {}",
            id,
            self.streams.len()
        );
        id
    }

    #[instrument(level = "trace", skip(self))]
    pub async fn remove_stream(&mut self, id: &Uuid) {
        if self.streams.remove(id).is_some() {
            info!(
                "Stream {} removed, remaining connections: {}",
                id,
                self.streams.len()
            );
        } else {
            warn!("Attempted to remove non-existent stream: {}", id);
        }
        self.last_activity = Instant::now()
    }

    pub fn has_active_connections(&self) -> bool {
        !self.streams.is_empty()
    }

    pub fn should_cleanup(&self, inactive_timeout_secs: u64) -> bool {
        if self.has_active_connections() {
            return false;
        }

        let elapsed = Instant::now().duration_since(self.last_activity).as_secs();
        elapsed > inactive_timeout_secs
    }

    pub async fn activate(&mut self, cell: usize) {
        self.last_activity = Instant::now();
        self.controller.on_cell_activated(cell);
        self.flush().await;
    }

    pub async fn toggle_pause(&mut self) {
        self.last_activity = Instant::now();
        self.controller.toggle_pause();
        self.flush().await;
    }

    pub async fn reset(&mut self) {
        self.last_activity = Instant::now();
        self.controller.start();
        self.flush().await;
    }

    pub async fn fire(&mut self, handle: TimerHandle) {
        self.controller.fire(handle);
        self.flush().await;
    }

    async fn flush(&mut self) {
        if let Some(update) = self.controller.surface_mut().take_update() {
            broadcast(&mut self.streams, &update).await;
        }
    }
}

/// Feeds fired timers into the game until it is dropped.
pub fn spawn_timer_pump(game: &Arc<Mutex<Game>>, mut feed: TimerFeed) {
    let game: Weak<Mutex<Game>> = Arc::downgrade(game);
    tokio::spawn(async move {
        while let Some(handle) = feed.recv().await {
            let Some(game) = game.upgrade() else {
                break;
            };
            game.lock().await.fire(handle).await;
        }
        debug!("Timer pump stopped");
    });
}

/// Starts a game, wires its timers and registers it under a fresh id.
pub fn host_game(games: &Games, params: GameParams, timing: Timing) -> String {
    let (game, feed) = Game::new(params, timing);
    let game = Arc::new(Mutex::new(game));
    spawn_timer_pump(&game, feed);

    let mut attempt = 0;
    loop {
        let length = ID_LENGTH + attempt / COLLISIONS_PER_LENGTH;
        attempt += 1;
        if let Entry::Vacant(slot) = games.entry(nanoid!(length)) {
            let id = slot.key().clone();
            slot.insert(game);
            info!("Hosting game {} after {} attempt(s)", id, attempt);
            return id;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn hosted_games_get_distinct_ids() {
        let games: Games = Arc::new(DashMap::new());
        let first = host_game(&games, GameParams::default(), Timing::default());
        let second = host_game(&games, GameParams::default(), Timing::default());

        assert_ne!(first, second);
        assert_eq!(first.len(), ID_LENGTH);
        assert_eq!(games.len(), 2);

        let game = games.get(&first).map(|entry| Arc::clone(entry.value())).unwrap();
        let game = game.lock().await;
        assert!(!game.has_active_connections());
        assert!(!game.should_cleanup(60));
    }
}
