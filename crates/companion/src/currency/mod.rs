//! Currency converter.

mod converter;
mod rates;

pub use converter::{
    CURRENCIES, Conversion, Currency, convert, find_currency, format_amount, parse_amount,
};
pub use rates::RatesCache;
