//! Geofence and notification inbox commands.

use concierge_companion::geofence::{
    CITY_VAULTS, GeofenceTransition, HOST_CITY_BOUNDARIES, PermissionState, Position,
    StaticPlatform,
};
use concierge_companion::state::Companion;
use tracing::info;
use uuid::Uuid;

use super::CommandError;

/// Print the host-city geofences in matching order.
#[allow(clippy::print_stdout)]
pub fn cities() {
    println!("{:<16} {:<16} {:>10} {:>11} {:>8}", "KEY", "CITY", "LAT", "LON", "RADIUS");
    for city in &HOST_CITY_BOUNDARIES {
        println!(
            "{:<16} {:<16} {:>10.4} {:>11.4} {:>6.0}km",
            city.city_key, city.name, city.latitude, city.longitude, city.radius_km
        );
    }
}

/// Apply a single fix and report the outcome.
///
/// The persisted last city is honored, so repeating a command inside the
/// same city does not welcome the user twice. The saved tracking preference
/// is left alone.
#[allow(clippy::print_stdout)]
pub async fn locate(app: &Companion, lat: f64, lon: f64) -> Result<(), CommandError> {
    if !(-90.0..=90.0).contains(&lat) || !(-180.0..=180.0).contains(&lon) {
        return Err(CommandError::InvalidInput(format!(
            "coordinates out of range: {lat}, {lon}"
        )));
    }

    let mut engine = app.geofence(StaticPlatform::new(PermissionState::Granted), true);
    engine.ensure_permission().await?;

    match engine.handle_position_update(Position::now(lat, lon)) {
        Some(GeofenceTransition::Entered { city_key, notified }) => {
            let name = engine.state().current_city.map_or(city_key, |c| c.name);
            println!("Entered {name}");
            if let Some(vault) = engine.current_vault() {
                println!("  {}", vault.motto);
                println!("  {}", vault.welcome_message);
            }
            if !notified {
                println!("  (no welcome available)");
            }
        }
        Some(GeofenceTransition::Exited { city_key }) => {
            println!("Left {city_key}; not inside any host city");
        }
        None => match engine.state().current_city {
            Some(city) => println!("Still in {}", city.name),
            None => println!("Not inside any host city"),
        },
    }

    Ok(())
}

/// Enter a city by key and show its welcome.
#[allow(clippy::print_stdout)]
pub fn simulate(app: &Companion, city: &str) -> Result<(), CommandError> {
    let mut engine = app.geofence(StaticPlatform::new(PermissionState::Granted), true);

    if !engine.simulate_city(city) {
        let known: Vec<&str> = CITY_VAULTS.iter().map(|v| v.city_key).collect();
        return Err(CommandError::InvalidInput(format!(
            "unknown city '{city}' (known: {})",
            known.join(", ")
        )));
    }

    if let (Some(boundary), Some(vault)) = (engine.state().current_city, engine.current_vault()) {
        println!("Welcome to {}!", boundary.name);
        println!("  {}", vault.motto);
        println!("  {}", vault.welcome_message);
    }
    Ok(())
}

/// Turn tracking off for the next launch.
#[allow(clippy::print_stdout)]
pub fn stop(app: &Companion) {
    let mut engine = app.geofence(StaticPlatform::new(PermissionState::Granted), false);
    engine.stop_tracking();
    println!("Location tracking disabled");
}

#[allow(clippy::print_stdout)]
pub fn list_notifications(app: &Companion) {
    let log = app.notifications();
    let all = log.all();

    if all.is_empty() {
        println!("No notifications");
        return;
    }

    println!("{} unread of {}", log.unread_count(), all.len());
    for n in all {
        let marker = if n.read { ' ' } else { '*' };
        println!(
            "{marker} {} {} [{:?}] {}",
            n.id,
            n.timestamp.format("%Y-%m-%d %H:%M"),
            n.kind,
            n.title
        );
        println!("    {}", n.body);
    }
}

pub fn mark_read(app: &Companion, id: &str) -> Result<(), CommandError> {
    let id = Uuid::parse_str(id)
        .map_err(|e| CommandError::InvalidInput(format!("invalid notification id: {e}")))?;
    app.notifications().mark_read(id)?;
    info!(%id, "Notification marked read");
    Ok(())
}

pub fn clear_notifications(app: &Companion) -> Result<(), CommandError> {
    app.notifications().clear()?;
    info!("Notifications cleared");
    Ok(())
}
