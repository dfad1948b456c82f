//! Subscription entitlement commands.

use concierge_companion::entitlement::{EntitlementPhase, EntitlementSnapshot};
use concierge_companion::guard::{GuardDecision, GuardedRoute, required_tier};
use concierge_companion::state::Companion;

use super::{CommandError, reported};

#[allow(clippy::print_stdout)]
fn print_snapshot(snapshot: &EntitlementSnapshot) {
    match snapshot.phase {
        EntitlementPhase::Uninitialized | EntitlementPhase::Loading => println!("Status: loading"),
        EntitlementPhase::Unauthenticated => println!("Status: not subscribed"),
        EntitlementPhase::Authenticated(tier) => {
            println!("Status: {}", tier.label());
            if let Some(email) = &snapshot.email {
                println!("Email:  {email}");
            }
            if let Some(name) = &snapshot.name {
                println!("Name:   {name}");
            }
            if let Some(city) = &snapshot.city {
                println!("City:   {city}");
            }
            println!(
                "Verified: {}",
                if snapshot.is_verified { "yes" } else { "no (offline)" }
            );
        }
    }
}

/// Reconcile the stored subscription with the backend and print it.
pub async fn status(app: &Companion) {
    app.entitlement().initialize().await;
    print_snapshot(&app.entitlement().snapshot());
}

/// Re-verify the current subscriber.
#[allow(clippy::print_stdout)]
pub async fn verify(app: &Companion) {
    let entitlement = app.entitlement();
    entitlement.initialize().await;

    let valid = entitlement.verify_subscription().await;
    println!("{}", if valid { "Subscription valid" } else { "Subscription not valid" });
    print_snapshot(&entitlement.snapshot());
}

/// Restore a purchase by email.
#[allow(clippy::print_stdout)]
pub async fn restore(app: &Companion, email: &str) -> Result<(), CommandError> {
    let tier = app
        .checkout()
        .restore_purchase(email)
        .await
        .map_err(reported)?;
    println!("Restored {} access", tier.label());
    Ok(())
}

#[allow(clippy::print_stdout)]
pub fn clear(app: &Companion) {
    app.entitlement().clear_subscription();
    println!("Subscription cleared on this device");
}

/// Run the route guard for `path` against the reconciled subscription.
#[allow(clippy::print_stdout)]
pub async fn access(app: &Companion, path: &str) {
    let entitlement = app.entitlement();
    let mut route = GuardedRoute::for_path(entitlement.subscribe(), path);

    // Resolved concurrently with the guard waiting for a settled state.
    let (_, decision) = tokio::join!(entitlement.initialize(), route.settled());

    let required = required_tier(path).map_or_else(
        || format!("{} (default)", route.required().label()),
        |tier| tier.label(),
    );
    println!("Route:    {path}");
    println!("Requires: {required}");
    match decision {
        GuardDecision::Allow => println!("Decision: allow"),
        GuardDecision::Redirect(to) => println!("Decision: redirect to {to}"),
        GuardDecision::Loading => println!("Decision: loading"),
    }
}
