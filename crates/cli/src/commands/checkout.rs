//! Checkout commands.

use concierge_companion::state::Companion;
use concierge_core::SubscriptionTier;

use super::{CommandError, reported};

/// Create a checkout session for `tier` and print the payment URL.
#[allow(clippy::print_stdout)]
pub async fn start(app: &Companion, tier: &str) -> Result<(), CommandError> {
    let tier: SubscriptionTier = tier
        .parse()
        .map_err(|e| CommandError::InvalidInput(format!("{e}")))?;

    let url = app.checkout().start_checkout(tier).await.map_err(reported)?;
    println!("Complete your purchase at:");
    println!("  {url}");
    Ok(())
}

/// Record the purchase from a finished checkout session.
#[allow(clippy::print_stdout)]
pub async fn complete(app: &Companion, session_id: &str) -> Result<(), CommandError> {
    let tier = app
        .checkout()
        .complete_checkout(session_id)
        .await
        .map_err(reported)?;
    println!("Welcome aboard! {} access is active.", tier.label());
    Ok(())
}

#[allow(clippy::print_stdout)]
pub fn plans(app: &Companion) {
    for plan in app.config().plans.iter() {
        println!(
            "{:<14} {:>8}  {}",
            plan.tier.as_str(),
            plan.price.display(),
            plan.price_id.as_deref().unwrap_or("-")
        );
    }
}
