//! Currency converter commands.

use concierge_companion::currency::{CURRENCIES, Conversion, find_currency, format_amount};
use concierge_companion::state::Companion;
use concierge_core::CurrencyCode;

use super::{CommandError, reported};

fn supported(code: &str) -> Result<CurrencyCode, CommandError> {
    let code = CurrencyCode::parse(code).map_err(|e| CommandError::InvalidInput(e.to_string()))?;
    if find_currency(&code).is_none() {
        return Err(CommandError::InvalidInput(format!(
            "unsupported currency {code}"
        )));
    }
    Ok(code)
}

/// Convert `amount` between two supported currencies.
#[allow(clippy::print_stdout)]
pub async fn convert(app: &Companion, amount: &str, from: &str, to: &str) -> Result<(), CommandError> {
    let conversion = Conversion {
        amount: amount.to_owned(),
        from: supported(from)?,
        to: supported(to)?,
    };

    let rates = app.rates().rates().await.map_err(|e| reported(e.into()))?;
    let Some(result) = conversion.display(&rates) else {
        return Err(CommandError::InvalidInput(format!("not an amount: {amount}")));
    };

    let symbol = find_currency(&conversion.to).map_or("", |c| c.symbol);
    println!("{} {} = {symbol}{result} {}", conversion.amount.trim(), conversion.from, conversion.to);
    if rates.stale {
        println!("(rates from {} may be out of date)", rates.date);
    }
    Ok(())
}

/// Print the rate table for every supported currency.
#[allow(clippy::print_stdout)]
pub async fn rates(app: &Companion) -> Result<(), CommandError> {
    let rates = app.rates().rates().await.map_err(|e| reported(e.into()))?;

    println!("Base {} on {}{}", rates.base, rates.date, if rates.stale { " (stale)" } else { "" });
    for currency in &CURRENCIES {
        let rate = rates
            .rates
            .get(currency.code)
            .map_or_else(|| "-".to_string(), |rate| format_amount(*rate));
        println!("{:<4} {:<20} {rate:>14}", currency.code, currency.name);
    }
    if let Some(fetched) = rates.fetched_at() {
        println!("Fetched {}", fetched.format("%Y-%m-%d %H:%M UTC"));
    }
    Ok(())
}
