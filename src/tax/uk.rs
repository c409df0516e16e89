use chrono::{Datelike, NaiveDate};
use rust_decimal::Decimal;
use rust_decimal_macros::dec;

/// UK Tax Year (runs 6 April to 5 April)
/// The year value represents the end year (e.g., 2026 = 2025/26 tax year)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct TaxYear(pub i32);

impl TaxYear {
    /// Create a tax year from a date
    pub fn from_date(date: NaiveDate) -> Self {
        let year = date.year();
        // Tax year starts 6 April
        // If date is 6 April or later, it's in the tax year ending next April
        // If date is before 6 April, it's in the current tax year ending this April
        if date >= NaiveDate::from_ymd_opt(year, 4, 6).unwrap() {
            TaxYear(year + 1)
        } else {
            TaxYear(year)
        }
    }

    /// Start date of the tax year (6 April of previous year)
    pub fn start_date(&self) -> NaiveDate {
        NaiveDate::from_ymd_opt(self.0 - 1, 4, 6).unwrap()
    }

    /// End date of the tax year (5 April)
    pub fn end_date(&self) -> NaiveDate {
        NaiveDate::from_ymd_opt(self.0, 4, 5).unwrap()
    }

    /// Display as "2025/26" format
    pub fn display(&self) -> String {
        format!("{}/{}", self.0 - 1, self.0 % 100)
    }

    /// Get Corporation Tax small profits rate for this tax year
    pub fn ct_small_profits_rate(&self) -> Decimal {
        // 19% since FY2017; became the small profits rate when the two-rate
        // system returned in April 2023
        dec!(0.19)
    }

    /// Get Corporation Tax main rate for this tax year
    pub fn ct_main_rate(&self) -> Decimal {
        match self.0 {
            // From April 2023: 25% above the main rate limit
            2024.. => dec!(0.25),
            // FY2017 to FY2022: single 19% rate for all profits
            _ => dec!(0.19),
        }
    }

    /// Get the Marginal Relief standard fraction for this tax year
    pub fn ct_marginal_relief_fraction(&self) -> Decimal {
        match self.0 {
            // From April 2023: 3/200
            2024.. => dec!(0.015),
            // No Marginal Relief under the single rate
            _ => Decimal::ZERO,
        }
    }
}

impl std::fmt::Display for TaxYear {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.display())
    }
}
