pub mod helpers;
mod paise;
mod secret;

pub use paise::{major_units, Paise, PaiseConversionError, CURRENCY_CODE, SUBUNITS_PER_MAJOR};
pub use rust_decimal::Decimal;
pub use secret::Secret;
