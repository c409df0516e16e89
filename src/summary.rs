//! Period aggregation: revenue, deductions, profit and the Corporation Tax
//! estimate, plus the week-by-week breakdown.

use crate::period::{week_label, week_start, PeriodWindow, ResolvedPeriod};
use crate::records::{Expense, Invoice, MileageClaim};
use crate::tax::{calculate_corporation_tax, CtBands};
use chrono::NaiveDate;
use rust_decimal::{Decimal, RoundingStrategy};
use serde::{Serialize, Serializer};
use std::collections::BTreeMap;

/// The full report for one period. Monetary fields are rounded to two
/// decimal places here and nowhere earlier; intermediate sums carry full
/// precision.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TaxSummary {
    pub period: String,
    pub date_range: PeriodWindow,
    pub revenue: RevenueSummary,
    pub expenses: ExpensesSummary,
    pub mileage: MileageSummary,
    pub tax: TaxEstimate,
    pub vat: VatSummary,
    pub weekly_breakdown: Vec<WeeklyBucket>,
    pub invoices: Vec<Invoice>,
    pub expenses_list: Vec<Expense>,
    pub mileage_list: Vec<MileageClaim>,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RevenueSummary {
    pub total: Decimal,
    pub vat_collected: Decimal,
    pub net: Decimal,
    pub invoice_count: usize,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ExpensesSummary {
    pub total: Decimal,
    pub vat_paid: Decimal,
    pub tax_deductible: Decimal,
    pub count: usize,
    pub by_category: CategoryBreakdown,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct MileageSummary {
    pub total_miles: Decimal,
    pub claim_amount: Decimal,
    pub count: usize,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TaxEstimate {
    pub total_deductions: Decimal,
    pub gross_profit: Decimal,
    pub annualized_profit: Decimal,
    pub tax_rate: Decimal,
    pub tax_bracket: String,
    pub estimated_tax: Decimal,
    pub take_home: Decimal,
    pub hold_back: Decimal,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct VatSummary {
    pub collected: Decimal,
    pub paid: Decimal,
    pub liability: Decimal,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct WeeklyBucket {
    pub week: String,
    pub revenue: Decimal,
    pub expenses: Decimal,
    pub profit: Decimal,
}

/// Per-category expense totals, keyed in first-seen order
#[derive(Debug, Clone, Default)]
pub struct CategoryBreakdown {
    entries: Vec<(String, CategoryTotals)>,
}

#[derive(Debug, Clone, Default, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CategoryTotals {
    pub total: Decimal,
    pub count: usize,
    pub tax_deductible: Decimal,
}

impl CategoryBreakdown {
    pub fn entry(&mut self, category: &str) -> &mut CategoryTotals {
        if let Some(index) = self.entries.iter().position(|(name, _)| name == category) {
            &mut self.entries[index].1
        } else {
            self.entries.push((category.to_string(), CategoryTotals::default()));
            &mut self.entries.last_mut().unwrap().1
        }
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &CategoryTotals)> {
        self.entries.iter().map(|(name, totals)| (name.as_str(), totals))
    }

    pub fn get(&self, category: &str) -> Option<&CategoryTotals> {
        self.entries
            .iter()
            .find(|(name, _)| name == category)
            .map(|(_, totals)| totals)
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    fn rounded(&self) -> CategoryBreakdown {
        CategoryBreakdown {
            entries: self
                .entries
                .iter()
                .map(|(name, totals)| {
                    (
                        name.clone(),
                        CategoryTotals {
                            total: round2(totals.total),
                            count: totals.count,
                            tax_deductible: round2(totals.tax_deductible),
                        },
                    )
                })
                .collect(),
        }
    }
}

// serialized as a JSON map, preserving first-seen order
impl Serialize for CategoryBreakdown {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        use serde::ser::SerializeMap;
        let mut map = serializer.serialize_map(Some(self.entries.len()))?;
        for (category, totals) in &self.entries {
            map.serialize_entry(category, totals)?;
        }
        map.end()
    }
}

/// Round half away from zero to two decimal places
pub fn round2(amount: Decimal) -> Decimal {
    amount.round_dp_with_strategy(2, RoundingStrategy::MidpointAwayFromZero)
}

/// Aggregate one period's ledgers into the full report. Inputs must
/// already be filtered to the period window.
pub fn build_summary(
    period: &ResolvedPeriod,
    invoices: Vec<Invoice>,
    expenses: Vec<Expense>,
    mileage: Vec<MileageClaim>,
    bands: &CtBands,
) -> TaxSummary {
    let total_revenue: Decimal = invoices.iter().map(|i| i.total).sum();
    let vat_collected: Decimal = invoices.iter().map(|i| i.vat_amount).sum();
    let net_revenue = total_revenue - vat_collected;

    let total_expenses: Decimal = expenses.iter().map(|e| e.amount).sum();
    let expense_vat: Decimal = expenses.iter().map(|e| e.vat).sum();
    let tax_deductible: Decimal = expenses.iter().map(Expense::deductible_amount).sum();

    let mut by_category = CategoryBreakdown::default();
    for expense in &expenses {
        let totals = by_category.entry(expense.category_label());
        totals.total += expense.amount;
        totals.count += 1;
        totals.tax_deductible += expense.deductible_amount();
    }

    let total_miles: Decimal = mileage.iter().map(|m| m.miles).sum();
    let mileage_claim: Decimal = mileage.iter().map(|m| m.claim_amount).sum();

    let total_deductions = tax_deductible + mileage_claim;
    let gross_profit = net_revenue - total_deductions;
    let annualized_profit = gross_profit * period.multiplier;

    let ct = calculate_corporation_tax(annualized_profit, bands);
    log::debug!(
        "gross profit {} x{} -> annualized {} ({})",
        gross_profit,
        period.multiplier,
        annualized_profit,
        ct.bracket
    );

    // No tax is held back for a loss-making period, whatever bracket the
    // annualized figure lands in
    let estimated_tax = if gross_profit > Decimal::ZERO {
        ct.annual_tax / period.multiplier
    } else {
        Decimal::ZERO
    };
    let take_home = gross_profit - estimated_tax;

    let weekly_breakdown = if period.label != "week" {
        weekly_buckets(&invoices, &expenses, &mileage)
    } else {
        Vec::new()
    };

    TaxSummary {
        period: period.label.clone(),
        date_range: period.window,
        revenue: RevenueSummary {
            total: round2(total_revenue),
            vat_collected: round2(vat_collected),
            net: round2(net_revenue),
            invoice_count: invoices.len(),
        },
        expenses: ExpensesSummary {
            total: round2(total_expenses),
            vat_paid: round2(expense_vat),
            tax_deductible: round2(tax_deductible),
            count: expenses.len(),
            by_category: by_category.rounded(),
        },
        mileage: MileageSummary {
            total_miles: round2(total_miles),
            claim_amount: round2(mileage_claim),
            count: mileage.len(),
        },
        tax: TaxEstimate {
            total_deductions: round2(total_deductions),
            gross_profit: round2(gross_profit),
            annualized_profit: round2(annualized_profit),
            tax_rate: ct.rate,
            tax_bracket: ct.bracket.label(),
            estimated_tax: round2(estimated_tax),
            take_home: round2(take_home),
            hold_back: round2(estimated_tax),
        },
        vat: VatSummary {
            collected: round2(vat_collected),
            paid: round2(expense_vat),
            liability: round2(vat_collected - expense_vat),
        },
        weekly_breakdown,
        invoices,
        expenses_list: expenses,
        mileage_list: mileage,
    }
}

/// Bucket every record by the Monday of its week: net revenue on one side,
/// deductible expenses plus the full mileage claim on the other. Most
/// recent week first.
fn weekly_buckets(
    invoices: &[Invoice],
    expenses: &[Expense],
    mileage: &[MileageClaim],
) -> Vec<WeeklyBucket> {
    #[derive(Default)]
    struct WeekTotals {
        revenue: Decimal,
        expenses: Decimal,
    }

    let mut weeks: BTreeMap<NaiveDate, WeekTotals> = BTreeMap::new();

    for invoice in invoices {
        let totals = weeks.entry(week_start(invoice.effective_date())).or_default();
        totals.revenue += invoice.net();
    }
    for expense in expenses {
        let totals = weeks.entry(week_start(expense.date)).or_default();
        totals.expenses += expense.deductible_amount();
    }
    for claim in mileage {
        let totals = weeks.entry(week_start(claim.date)).or_default();
        totals.expenses += claim.claim_amount;
    }

    weeks
        .into_iter()
        .rev()
        .map(|(monday, totals)| WeeklyBucket {
            week: week_label(monday),
            revenue: round2(totals.revenue),
            expenses: round2(totals.expenses),
            profit: round2(totals.revenue - totals.expenses),
        })
        .collect()
}
