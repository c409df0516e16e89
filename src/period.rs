use crate::tax::TaxYear;
use chrono::{Datelike, Duration, NaiveDate};
use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use serde::Serialize;

/// Reporting period keyword
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Period {
    Week,
    #[default]
    Month,
    Quarter,
    /// UK tax year, starting 6 April
    Year,
}

impl Period {
    pub fn as_str(&self) -> &'static str {
        match self {
            Period::Week => "week",
            Period::Month => "month",
            Period::Quarter => "quarter",
            Period::Year => "year",
        }
    }

    /// Annualization factor: the period's profit is assumed to recur at
    /// this cadence
    pub fn multiplier(&self) -> Decimal {
        match self {
            Period::Week => dec!(52),
            Period::Month => dec!(12),
            Period::Quarter => dec!(4),
            Period::Year => dec!(1),
        }
    }

    /// Window from the period start through today, both inclusive
    pub fn window(&self, today: NaiveDate) -> PeriodWindow {
        let start = match self {
            Period::Week => week_start(today),
            Period::Month => NaiveDate::from_ymd_opt(today.year(), today.month(), 1).unwrap(),
            Period::Quarter => {
                let month = (today.month0() / 3) * 3 + 1;
                NaiveDate::from_ymd_opt(today.year(), month, 1).unwrap()
            }
            Period::Year => TaxYear::from_date(today).start_date(),
        };
        PeriodWindow { start, end: today }
    }
}

impl std::fmt::Display for Period {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Inclusive date range
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct PeriodWindow {
    pub start: NaiveDate,
    pub end: NaiveDate,
}

impl PeriodWindow {
    pub fn new(start: NaiveDate, end: NaiveDate) -> Self {
        PeriodWindow { start, end }
    }

    pub fn contains(&self, date: NaiveDate) -> bool {
        date >= self.start && date <= self.end
    }
}

/// A resolved reporting window with its label and annualization factor
#[derive(Debug, Clone)]
pub struct ResolvedPeriod {
    pub label: String,
    pub multiplier: Decimal,
    pub window: PeriodWindow,
}

impl ResolvedPeriod {
    pub fn named(period: Period, today: NaiveDate) -> Self {
        ResolvedPeriod {
            label: period.to_string(),
            multiplier: period.multiplier(),
            window: period.window(today),
        }
    }

    /// Explicit dates are used verbatim; the caller is responsible for a
    /// sensible range
    pub fn custom(start: NaiveDate, end: NaiveDate) -> Self {
        ResolvedPeriod {
            label: "custom".to_string(),
            multiplier: Decimal::ONE,
            window: PeriodWindow::new(start, end),
        }
    }
}

/// Monday of the date's ISO week (Sunday counts as day 7)
pub fn week_start(date: NaiveDate) -> NaiveDate {
    date - Duration::days(i64::from(date.weekday().num_days_from_monday()))
}

/// Human label for a Monday-start week, e.g. "13 Jan - 19 Jan"
pub fn week_label(week_start: NaiveDate) -> String {
    let week_end = week_start + Duration::days(6);
    format!(
        "{} - {}",
        week_start.format("%-d %b"),
        week_end.format("%-d %b")
    )
}
