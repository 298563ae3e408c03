use std::sync::Arc;

use rocket::{State, futures::StreamExt, get, http::Status, post, serde::json::Json};
use rocket_ws::{Channel, Message, WebSocket};
use tokio::sync::Mutex;
use tracing::{debug, error, info, instrument, warn};

use bugbash_common::{
    models::{CreateResponse, GameParams},
    protocol::ClientMessage,
};

use crate::{
    config::Timing,
    logic::{Game, Games, host_game},
};

#[post("/create", data = "<params>")]
#[instrument(level = "trace", skip(games, timing), fields(holes = params.holes, round_seconds = params.round_seconds))]
pub fn create_game(
    params: Json<GameParams>,
    games: &State<Games>,
    timing: &State<Timing>,
) -> Json<CreateResponse> {
    let id = host_game(games.inner(), params.0, *timing.inner());
    Json(CreateResponse { id })
}

async fn apply(game: &Mutex<Game>, game_id: &str, text: &str) {
    let message = match serde_json::from_str::<ClientMessage>(text) {
        Ok(message) => message,
        Err(e) => {
            warn!("Ignoring malformed action in game {}: {} ({})", game_id, text, e);
            return;
        }
    };

    debug!("Action for game {}: {:?}", game_id, message);
    let mut game = game.lock().await;
    match message {
        ClientMessage::Activate { cell } => game.activate(cell).await,
        ClientMessage::Pause => game.toggle_pause().await,
        ClientMessage::Reset => {
            info!("Player reset game {}", game_id);
            game.reset().await;
        }
    }
}

#[get("/ws?<id>")]
#[instrument(level = "trace", skip(ws, games), fields(game_id = %id))]
pub fn websocket_handler(
    ws: WebSocket,
    games: &State<Games>,
    id: String,
) -> Result<Channel<'static>, Status> {
    let Some(game) = games.get(&id).map(|entry| Arc::clone(entry.value())) else {
        warn!("No game {} to attach a viewer to", id);
        return Err(Status::NotFound);
    };

    Ok(ws.channel(move |stream| {
        Box::pin(async move {
            let (sink, mut actions) = stream.split();
            let viewer = game.lock().await.add_stream(sink).await;
            info!("Viewer {} joined game {}", viewer, id);

            while let Some(frame) = actions.next().await {
                match frame {
                    Ok(Message::Text(text)) => apply(&game, &id, &text).await,
                    Ok(Message::Ping(_) | Message::Pong(_)) => {}
                    Ok(Message::Close(_)) => break,
                    Ok(_) => {
                        debug!("Viewer {} sent a non-text frame, closing", viewer);
                        break;
                    }
                    Err(e) => {
                        error!("Viewer {} of game {} errored: {}", viewer, id, e);
                        break;
                    }
                }
            }

            game.lock().await.remove_stream(&viewer).await;
            info!("Viewer {} left game {}", viewer, id);
            Ok(())
        })
    }))
}
