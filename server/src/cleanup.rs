use std::time::Duration;

use tokio::time;
use tracing::{debug, info};

use crate::{config::CleanupSettings, logic::Games};

pub async fn start_cleanup_task(games: Games, settings: CleanupSettings) {
    let mut interval = time::interval(Duration::from_secs(settings.interval_secs));

    info!(
        "Started game cleanup task: checking every {}s, inactive timeout: {}s",
        settings.interval_secs, settings.inactive_timeout_secs
    );

    loop {
        interval.tick().await;
        cleanup_games(&games, settings.inactive_timeout_secs);
    }
}

fn cleanup_games(games: &Games, inactive_timeout_secs: u64) {
    // Games that are locked are in use, so only try_lock
    let stale: Vec<String> = games
        .iter()
        .filter(|entry| {
            entry
                .value()
                .try_lock()
                .is_ok_and(|game| game.should_cleanup(inactive_timeout_secs))
        })
        .map(|entry| entry.key().clone())
        .collect();

    let removed_count = stale.len();
    for game_id in stale {
        games.remove(&game_id);
        debug!("Cleaned up game: {}", game_id);
    }

    if removed_count > 0 {
        info!("Cleaned up {} inactive games", removed_count);
    }
}
