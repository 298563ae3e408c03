use std::sync::Arc;

use bugbash_server::{
    cleanup::start_cleanup_task,
    config::{CleanupSettings, Timing},
    cors::create_cors,
    logic::Games,
    routes::{create_game, websocket_handler},
};
use dashmap::DashMap;
use rocket::{
    Build, Rocket,
    fairing::{Fairing, Info, Kind},
    routes,
};
use tracing::{info, warn};

struct CleanupFairing(CleanupSettings);

#[rocket::async_trait]
impl Fairing for CleanupFairing {
    fn info(&self) -> Info {
        Info {
            name: "Cleanup Task",
            kind: Kind::Ignite,
        }
    }

    async fn on_ignite(&self, rocket: Rocket<Build>) -> rocket::fairing::Result {
        if let Some(games) = rocket.state::<Games>() {
            info!("Starting cleanup task for game management");
            let games_for_cleanup = games.clone();
            let settings = self.0;
            tokio::spawn(async move {
                start_cleanup_task(games_for_cleanup, settings).await;
            });
        } else {
            warn!("Failed to get games state for cleanup task");
        }
        Ok(rocket)
    }
}

#[rocket::launch]
fn rocket() -> Rocket<Build> {
    tracing_subscriber::fmt::init();
    info!("🐛 Starting Bug Bash server");

    let games: Games = Arc::new(DashMap::new());
    let timing = Timing::from_env();
    info!("⏱️ Time unit: {:?}", timing.time_unit);

    let mut rocket = rocket::build()
        .attach(CleanupFairing(CleanupSettings::from_env()))
        .manage(games)
        .manage(timing)
        .mount("/", routes![create_game, websocket_handler]);

    if let Some(cors) = create_cors() {
        rocket = rocket.attach(cors);
    }

    info!("📡 Endpoints: POST /create, GET /ws");
    rocket
}
