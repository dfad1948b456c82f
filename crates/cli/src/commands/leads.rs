//! Free bracket downloads and the lead list.

use std::path::Path;

use concierge_companion::api::LeadForm;
use concierge_companion::state::Companion;
use tracing::info;

use super::{CommandError, reported};

/// Claim a free bracket download for the given contact.
#[allow(clippy::print_stdout)]
pub async fn claim(
    app: &Companion,
    name: String,
    email: String,
    city: String,
) -> Result<(), CommandError> {
    let form = LeadForm { name, email, city };
    let remaining = app
        .leads()
        .claim_free_download(&form)
        .await
        .map_err(reported)?;

    println!("Bracket unlocked. {remaining} free download(s) left on this device.");
    Ok(())
}

#[allow(clippy::print_stdout)]
pub async fn list(app: &Companion) -> Result<(), CommandError> {
    let leads = app.api().list_leads().await?;

    if leads.is_empty() {
        println!("No leads captured yet");
        return Ok(());
    }

    println!("{:<24} {:<32} {:<16} {}", "NAME", "EMAIL", "CITY", "CREATED");
    for lead in &leads {
        println!(
            "{:<24} {:<32} {:<16} {}",
            lead.name,
            lead.email,
            lead.city,
            lead.created_at.as_deref().unwrap_or("-")
        );
    }
    println!("\n{} lead(s)", leads.len());
    Ok(())
}

/// Export leads as CSV to `out`, or to stdout.
#[allow(clippy::print_stdout)]
pub async fn export(app: &Companion, out: Option<&Path>) -> Result<(), CommandError> {
    let csv = app.api().export_leads_csv().await?;

    match out {
        Some(path) => {
            tokio::fs::write(path, csv.as_bytes()).await?;
            info!(path = %path.display(), "Leads exported");
        }
        None => print!("{csv}"),
    }
    Ok(())
}
