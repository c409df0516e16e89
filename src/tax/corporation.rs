use crate::tax::TaxYear;
use rust_decimal::{Decimal, RoundingStrategy};
use rust_decimal_macros::dec;

/// Corporation Tax parameters, passed in explicitly so the calculation
/// never reads ambient state. Defaults are the bands in force since
/// FY2023 (2025/26 values).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CtBands {
    pub small_profits_limit: Decimal,
    pub main_rate_limit: Decimal,
    pub small_profits_rate: Decimal,
    pub main_rate: Decimal,
    /// Standard Marginal Relief fraction (3/200)
    pub marginal_relief_fraction: Decimal,
}

impl CtBands {
    /// Bands for the financial year roughly matching a UK tax year. The
    /// two-rate system with Marginal Relief applies from April 2023;
    /// earlier years collapse to the single 19% rate.
    pub fn for_tax_year(year: TaxYear) -> Self {
        CtBands {
            small_profits_limit: dec!(50000),
            main_rate_limit: dec!(250000),
            small_profits_rate: year.ct_small_profits_rate(),
            main_rate: year.ct_main_rate(),
            marginal_relief_fraction: year.ct_marginal_relief_fraction(),
        }
    }
}

impl Default for CtBands {
    fn default() -> Self {
        CtBands {
            small_profits_limit: dec!(50000),
            main_rate_limit: dec!(250000),
            small_profits_rate: dec!(0.19),
            main_rate: dec!(0.25),
            marginal_relief_fraction: dec!(0.015),
        }
    }
}

/// Which band an annualized profit fell into. The rates carried here are
/// display percentages taken from the bands in force.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TaxBracket {
    NoProfit,
    SmallProfits { rate: Decimal },
    MarginalRelief { effective_rate: Decimal },
    MainRate { rate: Decimal },
}

impl TaxBracket {
    pub fn label(&self) -> String {
        match self {
            TaxBracket::NoProfit => "No Profit".to_string(),
            TaxBracket::SmallProfits { rate } => {
                format!("Small Profits Rate ({}%)", rate)
            }
            TaxBracket::MarginalRelief { effective_rate } => {
                format!("Marginal Relief ({:.1}%)", effective_rate)
            }
            TaxBracket::MainRate { rate } => format!("Main Rate ({}%)", rate),
        }
    }
}

impl std::fmt::Display for TaxBracket {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.label())
    }
}

/// Annual Corporation Tax liability for a given profit. The tax figure is
/// unrounded; `rate` is a display percentage.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CorporationTax {
    pub annual_tax: Decimal,
    pub rate: Decimal,
    pub bracket: TaxBracket,
}

/// Corporation Tax on an annual profit, applying Marginal Relief between
/// the small profits and main rate limits. Both limits are inclusive:
/// profit at exactly the main rate limit still gets the (zero) relief and
/// the Marginal Relief label rather than the Main Rate one.
pub fn calculate_corporation_tax(profit: Decimal, bands: &CtBands) -> CorporationTax {
    if profit <= Decimal::ZERO {
        return CorporationTax {
            annual_tax: Decimal::ZERO,
            rate: Decimal::ZERO,
            bracket: TaxBracket::NoProfit,
        };
    }

    if profit <= bands.small_profits_limit {
        let rate = (bands.small_profits_rate * dec!(100)).normalize();
        return CorporationTax {
            annual_tax: profit * bands.small_profits_rate,
            rate,
            bracket: TaxBracket::SmallProfits { rate },
        };
    }

    if profit <= bands.main_rate_limit {
        let main_tax = profit * bands.main_rate;
        let relief = (bands.main_rate_limit - profit) * bands.marginal_relief_fraction;
        let tax = main_tax - relief;
        let effective_rate = (tax / profit * dec!(100))
            .round_dp_with_strategy(1, RoundingStrategy::MidpointAwayFromZero);
        return CorporationTax {
            annual_tax: tax,
            rate: effective_rate,
            bracket: TaxBracket::MarginalRelief { effective_rate },
        };
    }

    let rate = (bands.main_rate * dec!(100)).normalize();
    CorporationTax {
        annual_tax: profit * bands.main_rate,
        rate,
        bracket: TaxBracket::MainRate { rate },
    }
}
