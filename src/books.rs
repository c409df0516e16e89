use crate::period::PeriodWindow;
use crate::records::{BooksInput, Expense, Invoice, MileageClaim};

/// The loaded ledgers, queried by date range. Stands in for the upstream
/// store: callers get pre-filtered collections and never see the rest.
#[derive(Debug, Clone, Default)]
pub struct Books {
    pub invoices: Vec<Invoice>,
    pub expenses: Vec<Expense>,
    pub mileage: Vec<MileageClaim>,
}

impl Books {
    pub fn new(
        invoices: Vec<Invoice>,
        expenses: Vec<Expense>,
        mileage: Vec<MileageClaim>,
    ) -> Self {
        Books {
            invoices,
            expenses,
            mileage,
        }
    }

    /// Paid invoices whose effective date falls inside the window, both
    /// endpoints inclusive
    pub fn paid_invoices_in_range(&self, window: &PeriodWindow) -> Vec<Invoice> {
        self.invoices
            .iter()
            .filter(|invoice| invoice.is_paid() && window.contains(invoice.effective_date()))
            .cloned()
            .collect()
    }

    pub fn expenses_in_range(&self, window: &PeriodWindow) -> Vec<Expense> {
        self.expenses
            .iter()
            .filter(|expense| window.contains(expense.date))
            .cloned()
            .collect()
    }

    pub fn mileage_in_range(&self, window: &PeriodWindow) -> Vec<MileageClaim> {
        self.mileage
            .iter()
            .filter(|claim| window.contains(claim.date))
            .cloned()
            .collect()
    }
}

impl From<BooksInput> for Books {
    fn from(input: BooksInput) -> Self {
        Books::new(input.invoices, input.expenses, input.mileage)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;

    fn date(s: &str) -> NaiveDate {
        s.parse().unwrap()
    }

    fn invoice(number: &str, invoice_date: &str, paid_at: Option<&str>, status: &str) -> Invoice {
        serde_json::from_str(&format!(
            r#"{{
                "invoice_number": "{number}",
                "invoice_date": "{invoice_date}",
                {paid}
                "status": "{status}",
                "subtotal": 100,
                "vat_amount": 20,
                "total": 120
            }}"#,
            paid = paid_at
                .map(|p| format!(r#""paid_at": "{p}","#))
                .unwrap_or_default(),
        ))
        .unwrap()
    }

    #[test]
    fn only_paid_invoices_in_window() {
        let books = Books::new(
            vec![
                invoice("INV-001", "2026-01-05", None, "paid"),
                invoice("INV-002", "2026-01-07", None, "draft"),
                invoice("INV-003", "2025-12-20", Some("2026-01-13"), "paid"),
                invoice("INV-004", "2025-12-30", None, "paid"),
            ],
            Vec::new(),
            Vec::new(),
        );

        let window = PeriodWindow::new(date("2026-01-01"), date("2026-01-15"));
        let in_range = books.paid_invoices_in_range(&window);
        let numbers: Vec<_> = in_range.iter().map(|i| i.invoice_number.as_str()).collect();
        assert_eq!(numbers, vec!["INV-001", "INV-003"]);
    }

    #[test]
    fn window_endpoints_are_inclusive() {
        let books = Books::new(
            vec![
                invoice("INV-001", "2026-01-01", None, "paid"),
                invoice("INV-002", "2026-01-15", None, "paid"),
            ],
            Vec::new(),
            Vec::new(),
        );

        let window = PeriodWindow::new(date("2026-01-01"), date("2026-01-15"));
        assert_eq!(books.paid_invoices_in_range(&window).len(), 2);
    }
}
