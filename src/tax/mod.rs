pub mod corporation;
pub mod uk;

pub use corporation::{calculate_corporation_tax, CorporationTax, CtBands, TaxBracket};
pub use uk::TaxYear;
