//! Travel alerts raised by movement: crossing into a country with a
//! different currency, and approaching a stadium.

use chrono::NaiveDate;
use concierge_core::Coordinates;
use tracing::warn;

use super::catalog::Country;
use super::venues::Stadium;
use crate::error::AppError;
use crate::storage::{KeyValueStore, keys};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TravelAlertKind {
    CurrencyChange,
    StadiumApproach,
}

/// A location-driven alert for the inbox and the OS notification tray.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TravelAlert {
    pub kind: TravelAlertKind,
    pub title: String,
    pub body: String,
    /// Notifications with the same tag replace each other.
    pub tag: String,
}

/// Money in use in a host country.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct LocalCurrency {
    pub country: &'static str,
    pub code: &'static str,
    pub symbol: &'static str,
    pub name: &'static str,
    /// Rough USD value of one unit, for the "100 USD" hint.
    pub usd_per_unit: f64,
    pub tip: &'static str,
}

static US_DOLLAR: LocalCurrency = LocalCurrency {
    country: "United States",
    code: "USD",
    symbol: "$",
    name: "US Dollar",
    usd_per_unit: 1.0,
    tip: "Tipping is customary: 15-20% at restaurants, $1-2 per drink at bars",
};

static CANADIAN_DOLLAR: LocalCurrency = LocalCurrency {
    country: "Canada",
    code: "CAD",
    symbol: "C$",
    name: "Canadian Dollar",
    usd_per_unit: 0.74,
    tip: "Tipping similar to US: 15-20% at restaurants",
};

static MEXICAN_PESO: LocalCurrency = LocalCurrency {
    country: "Mexico",
    code: "MXN",
    symbol: "$",
    name: "Mexican Peso",
    usd_per_unit: 0.058,
    tip: "Tipping is expected: 10-15% at restaurants",
};

impl Country {
    #[must_use]
    pub fn currency(self) -> &'static LocalCurrency {
        match self {
            Self::UnitedStates => &US_DOLLAR,
            Self::Canada => &CANADIAN_DOLLAR,
            Self::Mexico => &MEXICAN_PESO,
        }
    }
}

impl TravelAlert {
    /// Alert for moving from `from` into `to`; `None` when the country is
    /// unchanged.
    #[must_use]
    pub fn currency_change(from: Country, to: Country) -> Option<Self> {
        if from == to {
            return None;
        }

        let currency = to.currency();
        let hint = if to == Country::UnitedStates {
            String::new()
        } else {
            format!(" (~{:.0} {} = 100 USD)", 100.0 / currency.usd_per_unit, currency.code)
        };

        Some(Self {
            kind: TravelAlertKind::CurrencyChange,
            title: format!("Currency Change: {}", currency.code),
            body: format!(
                "Welcome to {}! You're now using {} ({}){hint}. {}",
                currency.country, currency.name, currency.symbol, currency.tip
            ),
            tag: format!("currency-{}", to.code()),
        })
    }

    /// Alert for approaching `stadium` from `point`, naming the nearest gate
    /// and ride-share drop-off.
    #[must_use]
    pub fn stadium_approach(stadium: &Stadium, point: Coordinates) -> Self {
        let mut body = format!("You're approaching {}!", stadium.name);
        if let Some(gate) = stadium.nearest_gate(point) {
            body.push_str(&format!(" Nearest entry: {} ({}).", gate.name, gate.sections));
        }
        if let Some(zone) = stadium.nearest_dropoff(point) {
            body.push_str(&format!(
                " RideShare drop-off: {} (~{} min walk).",
                zone.name, zone.walking_minutes
            ));
        }

        Self {
            kind: TravelAlertKind::StadiumApproach,
            title: format!("Arriving at {}", stadium.name),
            body,
            tag: format!("stadium-{}", stadium.city_key),
        }
    }
}

fn alert_key(stadium: &Stadium, day: NaiveDate) -> String {
    format!("{}_{}", stadium.name, day.format("%Y-%m-%d"))
}

/// Record that `stadium` is being announced on `day`.
///
/// Returns false when it was already announced that day. Entries from other
/// days are dropped on each write. An unreadable record counts as empty.
pub fn claim_stadium_alert<S: KeyValueStore>(
    store: &S,
    stadium: &Stadium,
    day: NaiveDate,
) -> bool {
    let key = alert_key(stadium, day);
    let mut claimed: Vec<String> = match store.get(keys::STADIUM_ALERTS) {
        Ok(Some(raw)) => serde_json::from_str(&raw).unwrap_or_else(|e| {
            warn!(error = %e, "Discarding corrupt stadium alert record");
            Vec::new()
        }),
        Ok(None) => Vec::new(),
        Err(e) => {
            warn!(error = %e, "Failed to read stadium alert record");
            Vec::new()
        }
    };

    if claimed.contains(&key) {
        return false;
    }

    let suffix = format!("_{}", day.format("%Y-%m-%d"));
    claimed.retain(|entry| entry.ends_with(&suffix));
    claimed.push(key);

    let written = serde_json::to_string(&claimed)
        .map_err(Into::into)
        .and_then(|json| store.set(keys::STADIUM_ALERTS, &json));
    if let Err(e) = written {
        AppError::from(e).report();
    }
    true
}
