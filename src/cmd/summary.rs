//! Summary command - period aggregation and the Corporation Tax estimate

use crate::cmd::{InputOpts, PeriodOpts};
use crate::summary::{build_summary, TaxSummary};
use crate::tax::{CtBands, TaxYear};
use clap::Args;
use rust_decimal::Decimal;
use tabled::{
    settings::{object::Rows, Alignment, Modify, Style},
    Table, Tabled,
};

#[derive(Args, Debug)]
pub struct SummaryCommand {
    #[command(flatten)]
    input: InputOpts,

    #[command(flatten)]
    period: PeriodOpts,

    /// Output as JSON instead of formatted text
    #[arg(long)]
    json: bool,
}

impl SummaryCommand {
    pub fn exec(&self) -> anyhow::Result<()> {
        let books = self.input.load()?;
        let period = self.period.resolve();

        let invoices = books.paid_invoices_in_range(&period.window);
        let expenses = books.expenses_in_range(&period.window);
        let mileage = books.mileage_in_range(&period.window);

        let tax_year = TaxYear::from_date(period.window.end);
        log::debug!("applying {tax_year} Corporation Tax bands");
        let bands = CtBands::for_tax_year(tax_year);
        let summary = build_summary(&period, invoices, expenses, mileage, &bands);

        if self.json {
            println!("{}", serde_json::to_string_pretty(&summary)?);
        } else {
            print_summary(&summary);
        }
        Ok(())
    }
}

fn print_summary(summary: &TaxSummary) {
    println!();
    println!(
        "TAX SUMMARY ({}: {} to {})",
        summary.period, summary.date_range.start, summary.date_range.end
    );
    println!();

    println!("REVENUE");
    println!(
        "  Invoices: {} | Total: {} | VAT: {} | Net: {}",
        summary.revenue.invoice_count,
        format_gbp(summary.revenue.total),
        format_gbp(summary.revenue.vat_collected),
        format_gbp(summary.revenue.net)
    );
    println!();

    println!("EXPENSES");
    println!(
        "  Total: {} | VAT: {} | Deductible: {} ({} entries)",
        format_gbp(summary.expenses.total),
        format_gbp(summary.expenses.vat_paid),
        format_gbp(summary.expenses.tax_deductible),
        summary.expenses.count
    );
    if !summary.expenses.by_category.is_empty() {
        let rows: Vec<CategoryRow> = summary
            .expenses
            .by_category
            .iter()
            .map(|(category, totals)| CategoryRow {
                category: category.to_string(),
                total: format_gbp(totals.total),
                count: totals.count,
                deductible: format_gbp(totals.tax_deductible),
            })
            .collect();
        let table = Table::new(rows)
            .with(Style::rounded())
            .with(Modify::new(Rows::new(1..)).with(Alignment::right()))
            .to_string();
        println!("{}", table);
    }
    println!();

    println!("MILEAGE");
    println!(
        "  Miles: {} | Claim: {} ({} journeys)",
        summary.mileage.total_miles,
        format_gbp(summary.mileage.claim_amount),
        summary.mileage.count
    );
    println!();

    println!("CORPORATION TAX");
    println!(
        "  Deductions: {} | Gross Profit: {}",
        format_gbp(summary.tax.total_deductions),
        format_gbp_signed(summary.tax.gross_profit)
    );
    println!(
        "  Annualized Profit: {} | Bracket: {}",
        format_gbp_signed(summary.tax.annualized_profit),
        summary.tax.tax_bracket
    );
    println!(
        "  Estimated Tax: {} | Take Home: {}",
        format_gbp(summary.tax.estimated_tax),
        format_gbp_signed(summary.tax.take_home)
    );
    println!();

    println!("VAT");
    println!(
        "  Collected: {} | Paid: {} | Liability: {}",
        format_gbp(summary.vat.collected),
        format_gbp(summary.vat.paid),
        format_gbp_signed(summary.vat.liability)
    );
    println!();

    if !summary.weekly_breakdown.is_empty() {
        println!("WEEKLY BREAKDOWN");
        let rows: Vec<WeekRow> = summary
            .weekly_breakdown
            .iter()
            .map(|bucket| WeekRow {
                week: bucket.week.clone(),
                revenue: format_gbp(bucket.revenue),
                expenses: format_gbp(bucket.expenses),
                profit: format_gbp_signed(bucket.profit),
            })
            .collect();
        let table = Table::new(rows)
            .with(Style::rounded())
            .with(Modify::new(Rows::new(1..)).with(Alignment::right()))
            .to_string();
        println!("{}", table);
        println!();
    }
}

#[derive(Debug, Clone, Tabled)]
struct CategoryRow {
    #[tabled(rename = "Category")]
    category: String,
    #[tabled(rename = "Total")]
    total: String,
    #[tabled(rename = "Count")]
    count: usize,
    #[tabled(rename = "Deductible")]
    deductible: String,
}

#[derive(Debug, Clone, Tabled)]
struct WeekRow {
    #[tabled(rename = "Week")]
    week: String,
    #[tabled(rename = "Revenue")]
    revenue: String,
    #[tabled(rename = "Expenses")]
    expenses: String,
    #[tabled(rename = "Profit")]
    profit: String,
}

fn format_gbp(amount: Decimal) -> String {
    format!("£{:.2}", amount)
}

fn format_gbp_signed(amount: Decimal) -> String {
    if amount < Decimal::ZERO {
        format!("-£{:.2}", amount.abs())
    } else {
        format!("£{:.2}", amount)
    }
}
