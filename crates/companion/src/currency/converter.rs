//! Conversion and display of amounts between supported currencies.

use concierge_core::{CurrencyCode, ExchangeRateSnapshot};
use tracing::warn;

/// A currency offered in the converter.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Currency {
    pub code: &'static str,
    pub name: &'static str,
    pub symbol: &'static str,
}

const fn currency(code: &'static str, name: &'static str, symbol: &'static str) -> Currency {
    Currency { code, name, symbol }
}

/// Currencies of the host nations and the largest visiting fan bases.
pub static CURRENCIES: [Currency; 16] = [
    currency("USD", "US Dollar", "$"),
    currency("EUR", "Euro", "€"),
    currency("GBP", "British Pound", "£"),
    currency("CAD", "Canadian Dollar", "C$"),
    currency("MXN", "Mexican Peso", "$"),
    currency("JPY", "Japanese Yen", "¥"),
    currency("CNY", "Chinese Yuan", "¥"),
    currency("AUD", "Australian Dollar", "A$"),
    currency("BRL", "Brazilian Real", "R$"),
    currency("ARS", "Argentine Peso", "$"),
    currency("KRW", "South Korean Won", "₩"),
    currency("CHF", "Swiss Franc", "Fr"),
    currency("INR", "Indian Rupee", "₹"),
    currency("SAR", "Saudi Riyal", "﷼"),
    currency("AED", "UAE Dirham", "د.إ"),
    currency("QAR", "Qatari Riyal", "﷼"),
];

/// Look up a supported currency by code.
#[must_use]
pub fn find_currency(code: &CurrencyCode) -> Option<&'static Currency> {
    CURRENCIES.iter().find(|c| c.code == code.as_str())
}

/// Convert `amount` from `from` to `to` through the snapshot's base.
///
/// A missing or unusable rate counts as `1` so the view keeps working; the
/// gap is logged.
#[must_use]
pub fn convert(
    amount: f64,
    from: &CurrencyCode,
    to: &CurrencyCode,
    rates: &ExchangeRateSnapshot,
) -> f64 {
    amount / rate_or_one(rates, from) * rate_or_one(rates, to)
}

fn rate_or_one(rates: &ExchangeRateSnapshot, code: &CurrencyCode) -> f64 {
    match rates.rate(code) {
        Some(rate) if rate.is_finite() && rate > 0.0 => rate,
        _ => {
            warn!(currency = %code, "No usable exchange rate, assuming 1");
            1.0
        }
    }
}

/// Parse a user-entered amount. Returns `None` for anything non-numeric.
#[must_use]
pub fn parse_amount(input: &str) -> Option<f64> {
    input
        .trim()
        .parse::<f64>()
        .ok()
        .filter(|amount| amount.is_finite())
}

/// Format a converted amount for display.
///
/// Amounts of 1000 and above are grouped with `,` and shown to the cent;
/// smaller amounts keep four decimals so low-value pairs stay readable.
#[must_use]
pub fn format_amount(value: f64) -> String {
    if !value.is_finite() {
        return value.to_string();
    }
    if value < 1000.0 {
        return format!("{value:.4}");
    }

    let fixed = format!("{value:.2}");
    let (whole, cents) = fixed.split_once('.').unwrap_or((fixed.as_str(), "00"));

    let mut grouped = String::with_capacity(whole.len() + whole.len() / 3 + 3);
    for (i, digit) in whole.chars().enumerate() {
        if i > 0 && (whole.len() - i) % 3 == 0 {
            grouped.push(',');
        }
        grouped.push(digit);
    }
    format!("{grouped}.{cents}")
}

/// Converter form state: the typed amount and the selected pair.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Conversion {
    pub amount: String,
    pub from: CurrencyCode,
    pub to: CurrencyCode,
}

impl Default for Conversion {
    fn default() -> Self {
        Self {
            amount: "100".to_owned(),
            from: CurrencyCode::usd(),
            to: CurrencyCode::parse("MXN").unwrap_or_else(|_| CurrencyCode::usd()),
        }
    }
}

impl Conversion {
    /// Exchange the source and target currencies.
    pub fn swap(&mut self) {
        std::mem::swap(&mut self.from, &mut self.to);
    }

    /// Converted amount, or `None` while the typed amount is not a number.
    #[must_use]
    pub fn result(&self, rates: &ExchangeRateSnapshot) -> Option<f64> {
        parse_amount(&self.amount).map(|amount| convert(amount, &self.from, &self.to, rates))
    }

    /// Converted amount formatted for display.
    #[must_use]
    pub fn display(&self, rates: &ExchangeRateSnapshot) -> Option<String> {
        self.result(rates).map(format_amount)
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use std::collections::HashMap;

    use super::*;

    fn code(s: &str) -> CurrencyCode {
        CurrencyCode::parse(s).unwrap()
    }

    fn rates(pairs: &[(&str, f64)]) -> ExchangeRateSnapshot {
        ExchangeRateSnapshot {
            base: "USD".to_string(),
            date: "2026-06-11".to_string(),
            rates: pairs.iter().map(|(k, v)| ((*k).to_string(), *v)).collect::<HashMap<_, _>>(),
            last_fetched: 0,
            stale: false,
        }
    }

    #[test]
    fn test_usd_to_mxn() {
        let table = rates(&[("USD", 1.0), ("MXN", 17.0)]);
        let amount = parse_amount("100").unwrap();
        let result = convert(amount, &code("USD"), &code("MXN"), &table);
        assert!((result - 1700.0).abs() < 1e-9);
        assert_eq!(format_amount(result), "1,700.00");
    }

    #[test]
    fn test_round_trip() {
        let table = rates(&[("USD", 1.0), ("EUR", 0.92), ("JPY", 157.3)]);
        let there = convert(42.5, &code("EUR"), &code("JPY"), &table);
        let back = convert(there, &code("JPY"), &code("EUR"), &table);
        assert!((back - 42.5).abs() < 1e-9);
    }

    #[test]
    fn test_missing_rate_defaults_to_one() {
        let table = rates(&[("USD", 1.0), ("CAD", 0.0)]);
        assert!((convert(10.0, &code("USD"), &code("QAR"), &table) - 10.0).abs() < 1e-9);
        assert!((convert(10.0, &code("CAD"), &code("USD"), &table) - 10.0).abs() < 1e-9);
    }

    #[test]
    fn test_format_amount() {
        assert_eq!(format_amount(0.058_823_5), "0.0588");
        assert_eq!(format_amount(999.99), "999.9900");
        assert_eq!(format_amount(1000.0), "1,000.00");
        assert_eq!(format_amount(1_234_567.891), "1,234,567.89");
        assert_eq!(format_amount(-1500.0), "-1500.0000");
    }

    #[test]
    fn test_parse_amount() {
        assert_eq!(parse_amount(" 12.5 "), Some(12.5));
        assert_eq!(parse_amount("abc"), None);
        assert_eq!(parse_amount(""), None);
        assert_eq!(parse_amount("NaN"), None);
    }

    #[test]
    fn test_conversion_swap_and_result() {
        let table = rates(&[("USD", 1.0), ("MXN", 17.0)]);
        let mut conversion = Conversion::default();
        assert_eq!(conversion.display(&table).as_deref(), Some("1,700.00"));

        conversion.swap();
        assert_eq!(conversion.from, code("MXN"));
        assert_eq!(conversion.display(&table).as_deref(), Some("5.8824"));

        conversion.amount = "lots".to_string();
        assert_eq!(conversion.result(&table), None);
    }

    #[test]
    fn test_currency_table() {
        assert_eq!(CURRENCIES.len(), 16);
        for c in &CURRENCIES {
            assert!(CurrencyCode::parse(c.code).is_ok(), "{}", c.code);
        }
        assert_eq!(find_currency(&code("krw")).unwrap().symbol, "₩");
    }
}
