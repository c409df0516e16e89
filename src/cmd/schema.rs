//! Schema command - print expected input formats

use crate::records::BooksInput;
use clap::Args;
use schemars::schema_for;

#[derive(Args, Debug)]
pub struct SchemaCommand {
    /// Output format
    #[arg(value_enum, default_value = "json-schema")]
    format: SchemaFormat,

    /// Which CSV ledger to describe (ignored for json-schema)
    #[arg(short, long, value_enum, default_value = "invoices")]
    record: RecordKind,
}

#[derive(Debug, Clone, Copy, clap::ValueEnum)]
pub enum SchemaFormat {
    /// JSON Schema for the unified JSON input
    JsonSchema,
    /// CSV header row with column names
    CsvHeader,
    /// CSV column descriptions
    CsvFields,
}

#[derive(Debug, Clone, Copy, clap::ValueEnum)]
pub enum RecordKind {
    Invoices,
    Expenses,
    Mileage,
}

impl SchemaCommand {
    pub fn exec(&self) -> anyhow::Result<()> {
        match self.format {
            SchemaFormat::JsonSchema => self.print_json_schema(),
            SchemaFormat::CsvHeader => self.print_csv_header(),
            SchemaFormat::CsvFields => self.print_csv_fields(),
        }
    }

    fn print_json_schema(&self) -> anyhow::Result<()> {
        let schema = schema_for!(BooksInput);
        println!("{}", serde_json::to_string_pretty(&schema)?);
        Ok(())
    }

    fn print_csv_header(&self) -> anyhow::Result<()> {
        let columns: Vec<&str> = self.fields().iter().map(|(name, _, _)| *name).collect();
        println!("{}", columns.join(","));
        Ok(())
    }

    fn print_csv_fields(&self) -> anyhow::Result<()> {
        println!("CSV Input Format ({})", self.record_name());
        println!("================");
        println!();
        for (name, required, description) in self.fields() {
            let req = if *required { "required" } else { "optional" };
            println!("{:24} ({:8})  {}", name, req, description);
        }
        println!();
        println!("Dates accept YYYY-MM-DD or an ISO datetime (time is discarded)");
        Ok(())
    }

    fn record_name(&self) -> &'static str {
        match self.record {
            RecordKind::Invoices => "invoices",
            RecordKind::Expenses => "expenses",
            RecordKind::Mileage => "mileage",
        }
    }

    fn fields(&self) -> &'static [(&'static str, bool, &'static str)] {
        match self.record {
            RecordKind::Invoices => INVOICE_FIELDS,
            RecordKind::Expenses => EXPENSE_FIELDS,
            RecordKind::Mileage => MILEAGE_FIELDS,
        }
    }
}

const INVOICE_FIELDS: &[(&str, bool, &str)] = &[
    ("id", false, "Source row identifier"),
    ("invoice_number", true, "Invoice reference (e.g. INV-0042)"),
    ("invoice_date", true, "Date the invoice was raised"),
    (
        "paid_at",
        false,
        "Payment date; used instead of invoice_date when present",
    ),
    (
        "status",
        true,
        "Invoice status; only \"paid\" invoices count as revenue",
    ),
    ("client_name", false, "Customer name"),
    ("vehicle_reg", false, "Vehicle registration"),
    ("subtotal", true, "Amount excluding VAT"),
    ("vat_amount", true, "VAT charged"),
    ("total", true, "Amount including VAT"),
    ("payment_method", false, "How the invoice was settled"),
];

const EXPENSE_FIELDS: &[(&str, bool, &str)] = &[
    ("id", false, "Source row identifier"),
    ("date", true, "Date the expense was incurred"),
    ("category", false, "Grouping category; blank groups as \"Other\""),
    ("subcategory", false, "Finer-grained category"),
    ("description", false, "What was bought"),
    ("supplier", false, "Who it was bought from"),
    ("amount", true, "Amount excluding VAT"),
    ("vat", false, "VAT paid (default 0)"),
    (
        "tax_deductible_percent",
        false,
        "Deductible portion 0-100 (default 100)",
    ),
    (
        "allowable_for_tax",
        false,
        "Only an explicit false excludes the expense (default true)",
    ),
];

const MILEAGE_FIELDS: &[(&str, bool, &str)] = &[
    ("id", false, "Source row identifier"),
    ("date", true, "Date of the journey"),
    ("description", false, "Purpose of the journey"),
    ("start_postcode", false, "Journey origin"),
    ("end_postcode", false, "Journey destination"),
    ("miles", true, "Distance driven"),
    (
        "claim_amount",
        true,
        "Claim value, pre-computed at HMRC approved rates",
    ),
];
