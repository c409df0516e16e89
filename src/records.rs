use chrono::{DateTime, NaiveDate, NaiveDateTime};
use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use schemars::JsonSchema;
use serde::{Deserialize, Deserializer, Serialize};
use std::io::Read;

#[derive(Debug, thiserror::Error, PartialEq, Eq)]
pub enum RecordError {
    #[error("invalid date '{0}': expected YYYY-MM-DD or an ISO datetime")]
    InvalidDate(String),
}

/// Unified JSON input format: the three ledgers in one document
#[derive(Debug, Clone, Default, Serialize, Deserialize, JsonSchema)]
pub struct BooksInput {
    #[serde(default)]
    pub invoices: Vec<Invoice>,
    #[serde(default)]
    pub expenses: Vec<Expense>,
    #[serde(default)]
    pub mileage: Vec<MileageClaim>,
}

/// A customer invoice. Only invoices with status "paid" count as revenue.
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema)]
pub struct Invoice {
    #[serde(default)]
    pub id: Option<i64>,
    pub invoice_number: String,
    /// Date the invoice was raised (YYYY-MM-DD or an ISO datetime)
    #[serde(deserialize_with = "deserialize_date")]
    #[schemars(with = "String")]
    pub invoice_date: NaiveDate,
    /// When payment was received; time-of-day is truncated
    #[serde(default, deserialize_with = "deserialize_date_opt")]
    #[schemars(with = "Option<String>")]
    pub paid_at: Option<NaiveDate>,
    /// Invoice lifecycle status (e.g. "draft", "sent", "paid")
    pub status: String,
    #[serde(default)]
    pub client_name: Option<String>,
    #[serde(default)]
    pub vehicle_reg: Option<String>,
    #[schemars(with = "f64")]
    pub subtotal: Decimal,
    #[schemars(with = "f64")]
    pub vat_amount: Decimal,
    #[schemars(with = "f64")]
    pub total: Decimal,
    #[serde(default)]
    pub payment_method: Option<String>,
}

impl Invoice {
    /// Date used for period bucketing: payment date when known, else the
    /// invoice date
    pub fn effective_date(&self) -> NaiveDate {
        self.paid_at.unwrap_or(self.invoice_date)
    }

    pub fn is_paid(&self) -> bool {
        self.status == "paid"
    }

    /// Revenue net of VAT
    pub fn net(&self) -> Decimal {
        self.total - self.vat_amount
    }
}

/// A business expense. Missing optional fields are resolved to their
/// defaults here, at the deserialization boundary, so the aggregation
/// logic never re-checks them.
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema)]
pub struct Expense {
    #[serde(default)]
    pub id: Option<i64>,
    #[serde(deserialize_with = "deserialize_date")]
    #[schemars(with = "String")]
    pub date: NaiveDate,
    #[serde(default)]
    pub category: Option<String>,
    #[serde(default)]
    pub subcategory: Option<String>,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub supplier: Option<String>,
    /// Amount excluding VAT
    #[schemars(with = "f64")]
    pub amount: Decimal,
    #[serde(default, deserialize_with = "deserialize_decimal_or_zero")]
    #[schemars(with = "f64")]
    pub vat: Decimal,
    /// How much of the amount may be offset against taxable profit (0-100)
    #[serde(
        default = "default_deductible_percent",
        deserialize_with = "deserialize_deductible_percent"
    )]
    #[schemars(with = "f64")]
    pub tax_deductible_percent: Decimal,
    /// Only an explicit false excludes the expense from deductions
    #[serde(default = "default_true", deserialize_with = "deserialize_allowable")]
    pub allowable_for_tax: bool,
}

impl Expense {
    /// Category for grouping; uncategorised expenses fall under "Other"
    pub fn category_label(&self) -> &str {
        match self.category.as_deref() {
            Some(category) if !category.is_empty() => category,
            _ => "Other",
        }
    }

    /// The deductible portion of the amount; zero when the expense is not
    /// allowable for tax
    pub fn deductible_amount(&self) -> Decimal {
        if !self.allowable_for_tax {
            return Decimal::ZERO;
        }
        self.amount * self.tax_deductible_percent / dec!(100)
    }
}

/// A business mileage journey. The claim amount is pre-computed upstream
/// using HMRC's approved rates; it is never recomputed here.
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema)]
pub struct MileageClaim {
    #[serde(default)]
    pub id: Option<i64>,
    #[serde(deserialize_with = "deserialize_date")]
    #[schemars(with = "String")]
    pub date: NaiveDate,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub start_postcode: Option<String>,
    #[serde(default)]
    pub end_postcode: Option<String>,
    #[schemars(with = "f64")]
    pub miles: Decimal,
    #[schemars(with = "f64")]
    pub claim_amount: Decimal,
}

fn default_deductible_percent() -> Decimal {
    dec!(100)
}

fn default_true() -> bool {
    true
}

/// Parse a date that may carry a time component (e.g. a timestamptz export);
/// the time portion is discarded since all filtering is by date
pub fn parse_date_flexible(s: &str) -> Result<NaiveDate, RecordError> {
    if let Ok(date) = NaiveDate::parse_from_str(s, "%Y-%m-%d") {
        return Ok(date);
    }
    for format in ["%Y-%m-%dT%H:%M:%S%.f", "%Y-%m-%d %H:%M:%S%.f"] {
        if let Ok(datetime) = NaiveDateTime::parse_from_str(s, format) {
            return Ok(datetime.date());
        }
    }
    if let Ok(datetime) = DateTime::parse_from_rfc3339(s) {
        return Ok(datetime.date_naive());
    }
    Err(RecordError::InvalidDate(s.to_string()))
}

fn deserialize_date<'de, D>(deserializer: D) -> Result<NaiveDate, D::Error>
where
    D: Deserializer<'de>,
{
    let s = String::deserialize(deserializer)?;
    parse_date_flexible(&s).map_err(serde::de::Error::custom)
}

fn deserialize_date_opt<'de, D>(deserializer: D) -> Result<Option<NaiveDate>, D::Error>
where
    D: Deserializer<'de>,
{
    let s = Option::<String>::deserialize(deserializer)?;
    match s.as_deref() {
        None | Some("") => Ok(None),
        Some(value) => parse_date_flexible(value)
            .map(Some)
            .map_err(serde::de::Error::custom),
    }
}

fn deserialize_decimal_or_zero<'de, D>(deserializer: D) -> Result<Decimal, D::Error>
where
    D: Deserializer<'de>,
{
    let value = Option::<Decimal>::deserialize(deserializer)?;
    Ok(value.unwrap_or(Decimal::ZERO))
}

fn deserialize_deductible_percent<'de, D>(deserializer: D) -> Result<Decimal, D::Error>
where
    D: Deserializer<'de>,
{
    let value = Option::<Decimal>::deserialize(deserializer)?;
    Ok(value.unwrap_or_else(default_deductible_percent))
}

fn deserialize_allowable<'de, D>(deserializer: D) -> Result<bool, D::Error>
where
    D: Deserializer<'de>,
{
    let value = Option::<bool>::deserialize(deserializer)?;
    Ok(value.unwrap_or(true))
}

/// Read the unified JSON input; each ledger is sorted by date
pub fn read_books_json<R: Read>(reader: R) -> anyhow::Result<BooksInput> {
    let mut input: BooksInput = serde_json::from_reader(reader)?;
    input.invoices.sort_by_key(Invoice::effective_date);
    input.expenses.sort_by_key(|e| e.date);
    input.mileage.sort_by_key(|m| m.date);
    Ok(input)
}

pub fn read_invoices_csv<R: Read>(reader: R) -> anyhow::Result<Vec<Invoice>> {
    let mut invoices: Vec<Invoice> = read_csv(reader)?;
    invoices.sort_by_key(Invoice::effective_date);
    Ok(invoices)
}

pub fn read_expenses_csv<R: Read>(reader: R) -> anyhow::Result<Vec<Expense>> {
    let mut expenses: Vec<Expense> = read_csv(reader)?;
    expenses.sort_by_key(|e| e.date);
    Ok(expenses)
}

pub fn read_mileage_csv<R: Read>(reader: R) -> anyhow::Result<Vec<MileageClaim>> {
    let mut mileage: Vec<MileageClaim> = read_csv(reader)?;
    mileage.sort_by_key(|m| m.date);
    Ok(mileage)
}

fn read_csv<T, R>(reader: R) -> anyhow::Result<Vec<T>>
where
    T: serde::de::DeserializeOwned,
    R: Read,
{
    let mut rdr = csv::Reader::from_reader(reader);
    let records: Result<Vec<T>, _> = rdr.deserialize().collect();
    Ok(records?)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parse_date_only() {
        assert_eq!(
            parse_date_flexible("2026-01-15").unwrap(),
            NaiveDate::from_ymd_opt(2026, 1, 15).unwrap()
        );
    }

    #[test]
    fn parse_datetime_truncates_time() {
        assert_eq!(
            parse_date_flexible("2026-01-15T14:30:00").unwrap(),
            NaiveDate::from_ymd_opt(2026, 1, 15).unwrap()
        );
        assert_eq!(
            parse_date_flexible("2026-01-15 14:30:00.123").unwrap(),
            NaiveDate::from_ymd_opt(2026, 1, 15).unwrap()
        );
        assert_eq!(
            parse_date_flexible("2026-01-15T14:30:00+00:00").unwrap(),
            NaiveDate::from_ymd_opt(2026, 1, 15).unwrap()
        );
    }

    #[test]
    fn parse_invalid_date() {
        assert_eq!(
            parse_date_flexible("not-a-date"),
            Err(RecordError::InvalidDate("not-a-date".to_string()))
        );
    }

    #[test]
    fn effective_date_prefers_paid_at() {
        let invoice: Invoice = serde_json::from_str(
            r#"{
                "invoice_number": "INV-001",
                "invoice_date": "2025-12-20",
                "paid_at": "2026-01-13T09:15:00",
                "status": "paid",
                "subtotal": 1000,
                "vat_amount": 200,
                "total": 1200
            }"#,
        )
        .unwrap();

        assert_eq!(
            invoice.effective_date(),
            NaiveDate::from_ymd_opt(2026, 1, 13).unwrap()
        );
        assert!(invoice.is_paid());
        assert_eq!(invoice.net(), dec!(1000));
    }

    #[test]
    fn effective_date_falls_back_to_invoice_date() {
        let invoice: Invoice = serde_json::from_str(
            r#"{
                "invoice_number": "INV-002",
                "invoice_date": "2026-01-05",
                "status": "sent",
                "subtotal": 100,
                "vat_amount": 20,
                "total": 120
            }"#,
        )
        .unwrap();

        assert_eq!(
            invoice.effective_date(),
            NaiveDate::from_ymd_opt(2026, 1, 5).unwrap()
        );
        assert!(!invoice.is_paid());
    }

    #[test]
    fn expense_defaults_filled_on_deserialize() {
        let expense: Expense = serde_json::from_str(
            r#"{"date": "2026-01-06", "amount": 100}"#,
        )
        .unwrap();

        assert_eq!(expense.tax_deductible_percent, dec!(100));
        assert!(expense.allowable_for_tax);
        assert_eq!(expense.vat, Decimal::ZERO);
        assert_eq!(expense.category_label(), "Other");
        assert_eq!(expense.deductible_amount(), dec!(100));
    }

    #[test]
    fn expense_null_percent_defaults_to_full() {
        let expense: Expense = serde_json::from_str(
            r#"{"date": "2026-01-06", "amount": 80, "tax_deductible_percent": null}"#,
        )
        .unwrap();

        assert_eq!(expense.tax_deductible_percent, dec!(100));
        assert_eq!(expense.deductible_amount(), dec!(80));
    }

    #[test]
    fn expense_partial_deductible() {
        let expense: Expense = serde_json::from_str(
            r#"{"date": "2026-01-06", "amount": 50, "tax_deductible_percent": 50}"#,
        )
        .unwrap();

        assert_eq!(expense.deductible_amount(), dec!(25));
    }

    #[test]
    fn disallowed_expense_deducts_nothing() {
        let expense: Expense = serde_json::from_str(
            r#"{"date": "2026-01-06", "amount": 30, "allowable_for_tax": false}"#,
        )
        .unwrap();

        assert_eq!(expense.deductible_amount(), Decimal::ZERO);
    }

    #[test]
    fn empty_category_groups_as_other() {
        let expense: Expense = serde_json::from_str(
            r#"{"date": "2026-01-06", "amount": 10, "category": ""}"#,
        )
        .unwrap();

        assert_eq!(expense.category_label(), "Other");
    }

    #[test]
    fn expenses_csv_round_trip() {
        let csv_data = "\
id,date,category,description,amount,vat,tax_deductible_percent,allowable_for_tax
1,2026-01-06,Fuel,Diesel,100.00,20.00,100,true
2,2026-01-08,,Sundries,50.00,,50,
3,2026-01-09,Fuel,Client lunch,30.00,5.00,,false
";
        let expenses = read_expenses_csv(csv_data.as_bytes()).unwrap();
        assert_eq!(expenses.len(), 3);

        assert_eq!(expenses[0].category_label(), "Fuel");
        assert_eq!(expenses[0].deductible_amount(), dec!(100));

        // empty fields resolve to their defaults
        assert_eq!(expenses[1].category_label(), "Other");
        assert_eq!(expenses[1].vat, Decimal::ZERO);
        assert!(expenses[1].allowable_for_tax);
        assert_eq!(expenses[1].deductible_amount(), dec!(25));

        assert_eq!(expenses[2].tax_deductible_percent, dec!(100));
        assert_eq!(expenses[2].deductible_amount(), Decimal::ZERO);
    }

    #[test]
    fn invoices_csv_sorted_by_effective_date() {
        let csv_data = "\
id,invoice_number,invoice_date,paid_at,status,client_name,vehicle_reg,subtotal,vat_amount,total,payment_method
2,INV-002,2025-12-20,2026-01-13,paid,Smith,AB12 CDE,1000.00,200.00,1200.00,card
1,INV-001,2026-01-05,,paid,Jones,XY34 FGH,5000.00,1000.00,6000.00,transfer
";
        let invoices = read_invoices_csv(csv_data.as_bytes()).unwrap();
        assert_eq!(invoices.len(), 2);
        assert_eq!(invoices[0].invoice_number, "INV-001");
        assert_eq!(invoices[0].paid_at, None);
        assert_eq!(invoices[1].invoice_number, "INV-002");
        assert_eq!(
            invoices[1].effective_date(),
            NaiveDate::from_ymd_opt(2026, 1, 13).unwrap()
        );
    }

    #[test]
    fn books_json_missing_ledgers_default_empty() {
        let input = read_books_json(r#"{"invoices": []}"#.as_bytes()).unwrap();
        assert!(input.invoices.is_empty());
        assert!(input.expenses.is_empty());
        assert!(input.mileage.is_empty());
    }
}
