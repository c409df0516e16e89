//! Export command - CSV exports of mileage, expenses and the tax summary

use crate::cmd::{InputOpts, PeriodArg};
use crate::period::{Period, ResolvedPeriod};
use crate::records::{Expense, MileageClaim};
use crate::summary::{build_summary, round2, TaxSummary};
use crate::tax::{CtBands, TaxYear};
use chrono::{Local, NaiveDate};
use clap::{Args, ValueEnum};
use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use std::fs::File;
use std::io::{self, Write};
use std::path::PathBuf;

#[derive(Args, Debug)]
pub struct ExportCommand {
    #[command(flatten)]
    input: InputOpts,

    /// What to export
    #[arg(short, long, value_enum)]
    kind: ExportKind,

    /// Reporting period for the tax summary export
    #[arg(short, long, value_enum, default_value_t = PeriodArg::Year)]
    period: PeriodArg,

    /// Range start (YYYY-MM-DD); may be given on its own for record exports
    #[arg(long)]
    from: Option<NaiveDate>,

    /// Range end (YYYY-MM-DD), inclusive
    #[arg(long)]
    to: Option<NaiveDate>,

    /// Reference date for named periods (defaults to the current date)
    #[arg(long)]
    today: Option<NaiveDate>,

    /// Write to a file instead of stdout
    #[arg(short, long)]
    output: Option<PathBuf>,
}

#[derive(Debug, Clone, Copy, ValueEnum)]
pub enum ExportKind {
    Mileage,
    Expenses,
    TaxSummary,
}

impl ExportCommand {
    pub fn exec(&self) -> anyhow::Result<()> {
        let books = self.input.load()?;
        let writer: Box<dyn Write> = match &self.output {
            Some(path) => Box::new(File::create(path)?),
            None => Box::new(io::stdout()),
        };

        match self.kind {
            ExportKind::Mileage => {
                let mut entries: Vec<MileageClaim> = books
                    .mileage
                    .iter()
                    .filter(|claim| self.in_open_range(claim.date))
                    .cloned()
                    .collect();
                entries.sort_by_key(|claim| std::cmp::Reverse(claim.date));
                write_mileage_csv(&entries, writer)
            }
            ExportKind::Expenses => {
                let mut entries: Vec<Expense> = books
                    .expenses
                    .iter()
                    .filter(|expense| self.in_open_range(expense.date))
                    .cloned()
                    .collect();
                entries.sort_by_key(|expense| std::cmp::Reverse(expense.date));
                write_expenses_csv(&entries, writer)
            }
            ExportKind::TaxSummary => {
                let period = match (self.from, self.to) {
                    (Some(from), Some(to)) => ResolvedPeriod::custom(from, to),
                    (None, None) => {
                        let today = self.today.unwrap_or_else(|| Local::now().date_naive());
                        ResolvedPeriod::named(Period::from(self.period), today)
                    }
                    _ => anyhow::bail!("tax summary export needs both --from and --to, or neither"),
                };
                let invoices = books.paid_invoices_in_range(&period.window);
                let expenses = books.expenses_in_range(&period.window);
                let mileage = books.mileage_in_range(&period.window);
                let bands = CtBands::for_tax_year(TaxYear::from_date(period.window.end));
                let summary = build_summary(&period, invoices, expenses, mileage, &bands);
                write_tax_summary_csv(&summary, writer)
            }
        }
    }

    fn in_open_range(&self, date: NaiveDate) -> bool {
        self.from.is_none_or(|from| date >= from) && self.to.is_none_or(|to| date <= to)
    }
}

fn write_mileage_csv<W: Write>(entries: &[MileageClaim], writer: W) -> anyhow::Result<()> {
    let mut wtr = csv::WriterBuilder::new().flexible(true).from_writer(writer);
    wtr.write_record(["Date", "Description", "From", "To", "Miles", "Claim Amount"])?;
    for entry in entries {
        wtr.write_record([
            format_date(entry.date),
            entry.description.clone().unwrap_or_default(),
            entry.start_postcode.clone().unwrap_or_default(),
            entry.end_postcode.clone().unwrap_or_default(),
            format!("{:.1}", entry.miles),
            format!("{:.2}", entry.claim_amount),
        ])?;
    }

    let total_miles: Decimal = entries.iter().map(|e| e.miles).sum();
    let total_claim: Decimal = entries.iter().map(|e| e.claim_amount).sum();
    let split = MileageRateSplit::for_miles(total_miles);

    wtr.write_record([""])?;
    wtr.write_record(["SUMMARY"])?;
    wtr.write_record(["Total Miles", format!("{:.1}", total_miles).as_str()])?;
    wtr.write_record(["Total Claim", format!("{:.2}", round2(total_claim)).as_str()])?;
    wtr.write_record([
        "Miles @ 45p (first 10k)",
        format!("{:.1}", split.first_10k_miles).as_str(),
        format!("{:.2}", round2(split.first_10k_claim)).as_str(),
    ])?;
    wtr.write_record([
        "Miles @ 25p (after 10k)",
        format!("{:.1}", split.after_10k_miles).as_str(),
        format!("{:.2}", round2(split.after_10k_claim)).as_str(),
    ])?;
    wtr.flush()?;
    Ok(())
}

fn write_expenses_csv<W: Write>(entries: &[Expense], writer: W) -> anyhow::Result<()> {
    let mut wtr = csv::WriterBuilder::new().flexible(true).from_writer(writer);
    wtr.write_record([
        "Date",
        "Category",
        "Subcategory",
        "Description",
        "Supplier",
        "Amount (exc VAT)",
        "VAT",
        "Tax Deductible %",
        "Allowable",
    ])?;
    for entry in entries {
        wtr.write_record([
            format_date(entry.date),
            entry.category_label().to_string(),
            entry.subcategory.clone().unwrap_or_default(),
            entry.description.clone().unwrap_or_default(),
            entry.supplier.clone().unwrap_or_default(),
            format!("{:.2}", entry.amount),
            format!("{:.2}", entry.vat),
            entry.tax_deductible_percent.normalize().to_string(),
            if entry.allowable_for_tax { "Yes" } else { "No" }.to_string(),
        ])?;
    }

    let total: Decimal = entries.iter().map(|e| e.amount).sum();
    let vat: Decimal = entries.iter().map(|e| e.vat).sum();
    let deductible: Decimal = entries.iter().map(Expense::deductible_amount).sum();

    wtr.write_record([""])?;
    wtr.write_record(["TOTALS"])?;
    wtr.write_record(["Total Expenses", format!("{:.2}", round2(total)).as_str()])?;
    wtr.write_record(["Total VAT", format!("{:.2}", round2(vat)).as_str()])?;
    wtr.write_record([
        "Tax Deductible Amount",
        format!("{:.2}", round2(deductible)).as_str(),
    ])?;
    wtr.write_record(["Number of Entries", entries.len().to_string().as_str()])?;
    wtr.flush()?;
    Ok(())
}

fn write_tax_summary_csv<W: Write>(summary: &TaxSummary, writer: W) -> anyhow::Result<()> {
    let mut wtr = csv::WriterBuilder::new().flexible(true).from_writer(writer);

    wtr.write_record(["TAX SUMMARY REPORT"])?;
    wtr.write_record(["Period", summary.period.as_str()])?;
    wtr.write_record([
        "Date Range",
        format!(
            "{} - {}",
            format_date(summary.date_range.start),
            format_date(summary.date_range.end)
        )
        .as_str(),
    ])?;
    wtr.write_record([""])?;

    wtr.write_record(["REVENUE"])?;
    wtr.write_record([
        "Total Invoiced (inc VAT)",
        format!("{:.2}", summary.revenue.total).as_str(),
    ])?;
    wtr.write_record([
        "VAT Collected",
        format!("{:.2}", summary.revenue.vat_collected).as_str(),
    ])?;
    wtr.write_record(["Net Revenue", format!("{:.2}", summary.revenue.net).as_str()])?;
    wtr.write_record([
        "Invoice Count",
        summary.revenue.invoice_count.to_string().as_str(),
    ])?;
    wtr.write_record([""])?;

    wtr.write_record(["EXPENSES"])?;
    wtr.write_record([
        "Total Expenses",
        format!("{:.2}", summary.expenses.total).as_str(),
    ])?;
    wtr.write_record(["VAT Paid", format!("{:.2}", summary.expenses.vat_paid).as_str()])?;
    wtr.write_record([
        "Tax Deductible Amount",
        format!("{:.2}", summary.expenses.tax_deductible).as_str(),
    ])?;
    wtr.write_record(["Expense Count", summary.expenses.count.to_string().as_str()])?;
    wtr.write_record([""])?;

    if !summary.expenses.by_category.is_empty() {
        wtr.write_record(["EXPENSES BY CATEGORY"])?;
        wtr.write_record(["Category", "Total", "Count", "Tax Deductible"])?;
        for (category, totals) in summary.expenses.by_category.iter() {
            wtr.write_record([
                category,
                format!("{:.2}", totals.total).as_str(),
                totals.count.to_string().as_str(),
                format!("{:.2}", totals.tax_deductible).as_str(),
            ])?;
        }
        wtr.write_record([""])?;
    }

    wtr.write_record(["MILEAGE"])?;
    wtr.write_record([
        "Total Miles",
        format!("{:.1}", summary.mileage.total_miles).as_str(),
    ])?;
    wtr.write_record([
        "Claim Amount",
        format!("{:.2}", summary.mileage.claim_amount).as_str(),
    ])?;
    wtr.write_record(["Journey Count", summary.mileage.count.to_string().as_str()])?;
    wtr.write_record([""])?;

    wtr.write_record(["TAX CALCULATION"])?;
    wtr.write_record(["Net Revenue", format!("{:.2}", summary.revenue.net).as_str()])?;
    wtr.write_record([
        "Total Deductions",
        format!("{:.2}", summary.tax.total_deductions).as_str(),
    ])?;
    wtr.write_record([
        "Gross Profit",
        format!("{:.2}", summary.tax.gross_profit).as_str(),
    ])?;
    wtr.write_record([
        "Annualized Profit",
        format!("{:.2}", summary.tax.annualized_profit).as_str(),
    ])?;
    wtr.write_record(["Tax Bracket", summary.tax.tax_bracket.as_str()])?;
    wtr.write_record(["Tax Rate", format!("{}%", summary.tax.tax_rate).as_str()])?;
    wtr.write_record([
        "Estimated Tax",
        format!("{:.2}", summary.tax.estimated_tax).as_str(),
    ])?;
    wtr.write_record(["Take Home", format!("{:.2}", summary.tax.take_home).as_str()])?;
    wtr.write_record([
        "Hold Back for Tax",
        format!("{:.2}", summary.tax.hold_back).as_str(),
    ])?;
    wtr.write_record([""])?;

    wtr.write_record(["VAT SUMMARY"])?;
    wtr.write_record(["VAT Collected", format!("{:.2}", summary.vat.collected).as_str()])?;
    wtr.write_record(["VAT Paid", format!("{:.2}", summary.vat.paid).as_str()])?;
    wtr.write_record(["VAT Liability", format!("{:.2}", summary.vat.liability).as_str()])?;
    wtr.write_record([""])?;

    wtr.write_record([
        "Report Generated",
        Local::now().format("%d/%m/%Y %H:%M").to_string().as_str(),
    ])?;
    wtr.flush()?;
    Ok(())
}

/// HMRC approved-rate split over total miles: 45p up to 10,000 miles, 25p
/// after. Shown in the mileage export summary only; per-entry claims are
/// taken as given.
#[derive(Debug, Clone, PartialEq, Eq)]
struct MileageRateSplit {
    first_10k_miles: Decimal,
    after_10k_miles: Decimal,
    first_10k_claim: Decimal,
    after_10k_claim: Decimal,
}

impl MileageRateSplit {
    fn for_miles(total_miles: Decimal) -> Self {
        let threshold = dec!(10000);
        let first = total_miles.min(threshold);
        let after = (total_miles - threshold).max(Decimal::ZERO);
        MileageRateSplit {
            first_10k_miles: first,
            after_10k_miles: after,
            first_10k_claim: first * dec!(0.45),
            after_10k_claim: after * dec!(0.25),
        }
    }
}

fn format_date(date: NaiveDate) -> String {
    date.format("%d/%m/%Y").to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn mileage_split_under_threshold() {
        let split = MileageRateSplit::for_miles(dec!(8000));
        assert_eq!(split.first_10k_miles, dec!(8000));
        assert_eq!(split.after_10k_miles, Decimal::ZERO);
        assert_eq!(split.first_10k_claim, dec!(3600));
        assert_eq!(split.after_10k_claim, Decimal::ZERO);
    }

    #[test]
    fn mileage_split_over_threshold() {
        let split = MileageRateSplit::for_miles(dec!(12000));
        assert_eq!(split.first_10k_miles, dec!(10000));
        assert_eq!(split.after_10k_miles, dec!(2000));
        assert_eq!(split.first_10k_claim, dec!(4500));
        assert_eq!(split.after_10k_claim, dec!(500));
    }

    #[test]
    fn mileage_csv_has_header_and_summary() {
        let claims: Vec<MileageClaim> = serde_json::from_str(
            r#"[
                {"date": "2026-01-06", "description": "Parts run",
                 "start_postcode": "LS1 1AA", "end_postcode": "LS2 2BB",
                 "miles": "100", "claim_amount": "45"},
                {"date": "2026-01-12", "miles": "10", "claim_amount": "4.50"}
            ]"#,
        )
        .unwrap();

        let mut out = Vec::new();
        write_mileage_csv(&claims, &mut out).unwrap();
        let csv = String::from_utf8(out).unwrap();

        assert!(csv.starts_with("Date,Description,From,To,Miles,Claim Amount\n"));
        assert!(csv.contains("06/01/2026,Parts run,LS1 1AA,LS2 2BB,100.0,45.00"));
        assert!(csv.contains("Total Miles,110.0"));
        assert!(csv.contains("Total Claim,49.50"));
        assert!(csv.contains("Miles @ 45p (first 10k),110.0,49.50"));
        assert!(csv.contains("Miles @ 25p (after 10k),0.0,0.00"));
    }

    #[test]
    fn expenses_csv_totals_section() {
        let expenses: Vec<Expense> = serde_json::from_str(
            r#"[
                {"date": "2026-01-06", "category": "Fuel", "amount": "100",
                 "vat": "20"},
                {"date": "2026-01-09", "category": "Fuel", "amount": "30",
                 "vat": "5", "allowable_for_tax": false}
            ]"#,
        )
        .unwrap();

        let mut out = Vec::new();
        write_expenses_csv(&expenses, &mut out).unwrap();
        let csv = String::from_utf8(out).unwrap();

        assert!(csv.contains("Total Expenses,130.00"));
        assert!(csv.contains("Total VAT,25.00"));
        assert!(csv.contains("Tax Deductible Amount,100.00"));
        assert!(csv.contains("Number of Entries,2"));
        assert!(csv.contains(",No\n"));
    }
}
