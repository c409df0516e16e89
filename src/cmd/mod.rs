pub mod export;
pub mod schema;
pub mod summary;

use crate::books::Books;
use crate::period::{Period, ResolvedPeriod};
use crate::records;
use anyhow::Context;
use chrono::{Local, NaiveDate};
use clap::{Args, ValueEnum};
use std::fs::File;
use std::io::{self, ErrorKind};
use std::path::{Path, PathBuf};

/// Where the ledgers come from: one JSON document or per-table CSV files
#[derive(Args, Debug)]
pub struct InputOpts {
    /// JSON file with invoices, expenses and mileage (or "-" for stdin)
    #[arg(short, long, conflicts_with_all = ["invoices", "expenses", "mileage"])]
    input: Option<PathBuf>,

    /// Invoices CSV file
    #[arg(long)]
    invoices: Option<PathBuf>,

    /// Expenses CSV file; a missing file counts as no expenses
    #[arg(long)]
    expenses: Option<PathBuf>,

    /// Mileage CSV file; a missing file counts as no mileage
    #[arg(long)]
    mileage: Option<PathBuf>,
}

impl InputOpts {
    pub fn load(&self) -> anyhow::Result<Books> {
        if let Some(path) = &self.input {
            let input = if path.as_os_str() == "-" {
                records::read_books_json(io::stdin().lock())?
            } else {
                let file = File::open(path)
                    .with_context(|| format!("opening {}", path.display()))?;
                records::read_books_json(file)
                    .with_context(|| format!("reading {}", path.display()))?
            };
            return Ok(Books::from(input));
        }

        let invoices = match &self.invoices {
            Some(path) => {
                let file = File::open(path)
                    .with_context(|| format!("opening {}", path.display()))?;
                records::read_invoices_csv(file)
                    .with_context(|| format!("reading {}", path.display()))?
            }
            None => anyhow::bail!("either --input or --invoices is required"),
        };
        let expenses = read_optional(self.expenses.as_deref(), records::read_expenses_csv);
        let mileage = read_optional(self.mileage.as_deref(), records::read_mileage_csv);

        log::debug!(
            "loaded {} invoices, {} expenses, {} mileage claims",
            invoices.len(),
            expenses.len(),
            mileage.len()
        );
        Ok(Books::new(invoices, expenses, mileage))
    }
}

/// An absent side table is a zero contribution, not an error; anything
/// other than a missing file is logged before degrading to empty
fn read_optional<T>(path: Option<&Path>, read: fn(File) -> anyhow::Result<Vec<T>>) -> Vec<T> {
    let Some(path) = path else {
        return Vec::new();
    };
    match File::open(path) {
        Ok(file) => match read(file) {
            Ok(records) => records,
            Err(err) => {
                log::error!("failed to read {}: {err:#}", path.display());
                Vec::new()
            }
        },
        Err(err) if err.kind() == ErrorKind::NotFound => {
            log::debug!("{} not found, treating as empty", path.display());
            Vec::new()
        }
        Err(err) => {
            log::error!("failed to open {}: {err}", path.display());
            Vec::new()
        }
    }
}

/// Period selection shared by reporting commands
#[derive(Args, Debug)]
pub struct PeriodOpts {
    /// Reporting period
    #[arg(short, long, value_enum, default_value_t = PeriodArg::Month)]
    period: PeriodArg,

    /// Explicit range start (YYYY-MM-DD); used verbatim with --to
    #[arg(long, requires = "to")]
    from: Option<NaiveDate>,

    /// Explicit range end (YYYY-MM-DD), inclusive
    #[arg(long, requires = "from")]
    to: Option<NaiveDate>,

    /// Reference date for named periods (defaults to the current date)
    #[arg(long)]
    today: Option<NaiveDate>,
}

impl PeriodOpts {
    pub fn resolve(&self) -> ResolvedPeriod {
        if let (Some(from), Some(to)) = (self.from, self.to) {
            return ResolvedPeriod::custom(from, to);
        }
        let today = self.today.unwrap_or_else(|| Local::now().date_naive());
        ResolvedPeriod::named(self.period.into(), today)
    }
}

/// CLI-facing period keyword
#[derive(Debug, Clone, Copy, Default, ValueEnum)]
pub enum PeriodArg {
    Week,
    #[default]
    Month,
    Quarter,
    Year,
}

impl From<PeriodArg> for Period {
    fn from(arg: PeriodArg) -> Self {
        match arg {
            PeriodArg::Week => Period::Week,
            PeriodArg::Month => Period::Month,
            PeriodArg::Quarter => Period::Quarter,
            PeriodArg::Year => Period::Year,
        }
    }
}

impl std::fmt::Display for PeriodArg {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", Period::from(*self).as_str())
    }
}
