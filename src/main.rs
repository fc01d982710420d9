use std::process::ExitCode;

use rami::config::DriverConfig;
use rami::matchmaking::registry::MatchRegistry;
use tracing::{error, info, warn};

#[tokio::main]
async fn main() -> ExitCode {
    rami::telemetry::init_tracing();

    let config = match DriverConfig::from_env() {
        Ok(config) => config,
        Err(err) => {
            error!(error = %err, "invalid configuration");
            return ExitCode::FAILURE;
        }
    };

    let humans = config.seats.iter().filter(|s| s.bot.is_none()).count();
    if humans > 0 {
        // Nobody is connected to play these seats, so the room would wait forever
        warn!(humans, "the driver only runs bot seats");
        return ExitCode::FAILURE;
    }

    info!(variant = %config.variant, team_mode = config.team_mode, seats = config.seats.len(), "starting match");

    let registry = MatchRegistry::new();
    let (code, handle) = match registry.open_room(config.match_request()).await {
        Ok(opened) => opened,
        Err(err) => {
            error!(error = %err, "could not open the room");
            return ExitCode::FAILURE;
        }
    };

    let outcome = match handle.await {
        Ok(outcome) => outcome,
        Err(err) => {
            error!(room = %code, error = %err, "room task failed");
            return ExitCode::FAILURE;
        }
    };

    match serde_json::to_string_pretty(&outcome) {
        Ok(json) => {
            println!("{json}");
            ExitCode::SUCCESS
        }
        Err(err) => {
            error!(error = %err, "could not encode the outcome");
            ExitCode::FAILURE
        }
    }
}
