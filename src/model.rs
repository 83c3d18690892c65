use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};

/// Numeric, locally unique entity id (epoch milliseconds at creation).
pub type EntityId = i64;

/// Tolerance used when checking derived invoice totals.
pub const TOTALS_EPSILON: f64 = 1e-6;

// ==========================================
// Statuses
// ==========================================

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ContractStatus {
    #[default]
    Pending,
    Active,
    Completed,
    Expired,
    Cancelled,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum InvoiceStatus {
    #[default]
    Pending,
    Paid,
    Overdue,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum InvoiceKind {
    #[default]
    Standalone,
    ContractBased,
}

impl ContractStatus {
    pub fn as_str(self) -> &'static str {
        match self {
            ContractStatus::Pending => "pending",
            ContractStatus::Active => "active",
            ContractStatus::Completed => "completed",
            ContractStatus::Expired => "expired",
            ContractStatus::Cancelled => "cancelled",
        }
    }
}

impl InvoiceStatus {
    pub fn as_str(self) -> &'static str {
        match self {
            InvoiceStatus::Pending => "pending",
            InvoiceStatus::Paid => "paid",
            InvoiceStatus::Overdue => "overdue",
        }
    }
}

impl fmt::Display for ContractStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl fmt::Display for InvoiceStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ContractStatus {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "pending" => Ok(ContractStatus::Pending),
            "active" => Ok(ContractStatus::Active),
            "completed" => Ok(ContractStatus::Completed),
            "expired" => Ok(ContractStatus::Expired),
            "cancelled" => Ok(ContractStatus::Cancelled),
            other => Err(format!("unknown contract status '{other}'")),
        }
    }
}

impl FromStr for InvoiceStatus {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "pending" => Ok(InvoiceStatus::Pending),
            "paid" => Ok(InvoiceStatus::Paid),
            "overdue" => Ok(InvoiceStatus::Overdue),
            other => Err(format!("unknown invoice status '{other}'")),
        }
    }
}

// ==========================================
// Entities
// ==========================================

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Address {
    #[serde(default)]
    pub street_address: String,
    #[serde(default)]
    pub city: String,
    #[serde(default)]
    pub state: String,
    #[serde(default)]
    pub zip_code: String,
}

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Client {
    #[serde(default)]
    pub id: EntityId,
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub email: String,
    #[serde(default)]
    pub phone: String,
    #[serde(default)]
    pub company: String,
    #[serde(flatten)]
    pub address: Address,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub created_at: Option<DateTime<Utc>>,
}

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Contract {
    #[serde(default)]
    pub id: EntityId,
    #[serde(default)]
    pub uid: String,
    #[serde(default)]
    pub title: String,
    #[serde(default)]
    pub client_name: String,
    #[serde(default, deserialize_with = "lenient::date")]
    pub start_date: Option<NaiveDate>,
    #[serde(default, deserialize_with = "lenient::date")]
    pub end_date: Option<NaiveDate>,
    #[serde(default)]
    pub status: ContractStatus,
    #[serde(default)]
    pub description: String,
    #[serde(default, deserialize_with = "lenient::number")]
    pub total_value: f64,
    #[serde(default, deserialize_with = "lenient::number")]
    pub hourly_rate: f64,
    #[serde(default, deserialize_with = "lenient::number")]
    pub estimated_hours: f64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub created_at: Option<DateTime<Utc>>,
}

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LineItem {
    #[serde(default)]
    pub description: String,
    #[serde(default, deserialize_with = "lenient::number")]
    pub quantity: f64,
    #[serde(default, deserialize_with = "lenient::number")]
    pub rate: f64,
    #[serde(default, deserialize_with = "lenient::number")]
    pub amount: f64,
}

impl LineItem {
    pub fn new(description: impl Into<String>, quantity: f64, rate: f64) -> Self {
        Self {
            description: description.into(),
            quantity,
            rate,
            amount: quantity * rate,
        }
    }

    /// Sets quantity and rate, re-deriving `amount`. Returns whether anything changed.
    pub fn set_pricing(&mut self, quantity: f64, rate: f64) -> bool {
        if self.quantity == quantity && self.rate == rate {
            return false;
        }
        self.quantity = quantity;
        self.rate = rate;
        self.amount = quantity * rate;
        true
    }
}

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Invoice {
    #[serde(default)]
    pub id: EntityId,
    #[serde(default)]
    pub uid: String,
    #[serde(default)]
    pub invoice_number: String,
    #[serde(rename = "type", default)]
    pub kind: InvoiceKind,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub contract_uid: Option<String>,
    #[serde(default)]
    pub client_name: String,
    #[serde(default, deserialize_with = "lenient::date")]
    pub due_date: Option<NaiveDate>,
    #[serde(default)]
    pub status: InvoiceStatus,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub line_items: Vec<LineItem>,
    #[serde(default, deserialize_with = "lenient::number")]
    pub subtotal: f64,
    #[serde(default, deserialize_with = "lenient::number")]
    pub tax_percentage: f64,
    #[serde(default, deserialize_with = "lenient::number")]
    pub tax: f64,
    #[serde(default, deserialize_with = "lenient::number")]
    pub total: f64,
    #[serde(default, deserialize_with = "lenient::number")]
    pub amount: f64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub created_at: Option<DateTime<Utc>>,
}

impl Invoice {
    /// A standalone invoice draft; identifiers are assigned when it is added.
    pub fn standalone(
        client_name: impl Into<String>,
        due_date: NaiveDate,
        line_items: Vec<LineItem>,
        tax_percentage: f64,
    ) -> Self {
        let mut invoice = Self {
            client_name: client_name.into(),
            due_date: Some(due_date),
            line_items,
            tax_percentage,
            ..Self::default()
        };
        invoice.recompute_totals();
        invoice
    }

    pub fn is_linked_to(&self, contract_uid: &str) -> bool {
        self.contract_uid.as_deref() == Some(contract_uid)
    }

    /// Re-derives subtotal, tax, total and amount from the line items.
    ///
    /// Idempotent: returns `false` and leaves the invoice untouched when the
    /// stored figures already match, so callers can skip a write.
    pub fn recompute_totals(&mut self) -> bool {
        let subtotal: f64 = self.line_items.iter().map(|item| item.amount).sum();
        let tax = subtotal * self.tax_percentage / 100.0;
        let total = subtotal + tax;

        if self.subtotal == subtotal && self.tax == tax && self.total == total && self.amount == total {
            return false;
        }

        self.subtotal = subtotal;
        self.tax = tax;
        self.total = total;
        self.amount = total;
        true
    }

    /// Changes quantity and rate of one line item. Out-of-range index is a no-op.
    pub fn set_line_item(&mut self, index: usize, quantity: f64, rate: f64) -> bool {
        let Some(item) = self.line_items.get_mut(index) else {
            return false;
        };
        if !item.set_pricing(quantity, rate) {
            return false;
        }
        self.recompute_totals();
        true
    }

    pub fn push_line_item(&mut self, item: LineItem) {
        self.line_items.push(item);
        self.recompute_totals();
    }

    pub fn remove_line_item(&mut self, index: usize) -> Option<LineItem> {
        if index >= self.line_items.len() {
            return None;
        }
        let removed = self.line_items.remove(index);
        self.recompute_totals();
        Some(removed)
    }

    pub fn set_tax_percentage(&mut self, tax_percentage: f64) -> bool {
        if self.tax_percentage == tax_percentage {
            return false;
        }
        self.tax_percentage = tax_percentage;
        self.recompute_totals();
        true
    }

    /// Whether the derived figures agree with the line items.
    pub fn totals_consistent(&self) -> bool {
        let subtotal: f64 = self.line_items.iter().map(|item| item.amount).sum();
        let close = |a: f64, b: f64| (a - b).abs() <= TOTALS_EPSILON;
        close(self.subtotal, subtotal)
            && close(self.tax, self.subtotal * self.tax_percentage / 100.0)
            && close(self.total, self.subtotal + self.tax)
            && close(self.amount, self.total)
    }
}

// ==========================================
// Settings & preferences
// ==========================================

/// How a contract's billed total is presented.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum BilledDisplay {
    #[default]
    PaidVsTotal,
    PaidOnly,
    AllInvoices,
}

impl BilledDisplay {
    pub fn as_str(self) -> &'static str {
        match self {
            BilledDisplay::PaidVsTotal => "paid-vs-total",
            BilledDisplay::PaidOnly => "paid-only",
            BilledDisplay::AllInvoices => "all-invoices",
        }
    }
}

impl FromStr for BilledDisplay {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim() {
            "paid-vs-total" => Ok(BilledDisplay::PaidVsTotal),
            "paid-only" => Ok(BilledDisplay::PaidOnly),
            "all-invoices" => Ok(BilledDisplay::AllInvoices),
            other => Err(format!(
                "unknown display mode '{other}' (expected paid-vs-total, paid-only or all-invoices)"
            )),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Theme {
    #[default]
    Light,
    Dark,
}

impl FromStr for Theme {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim() {
            "light" => Ok(Theme::Light),
            "dark" => Ok(Theme::Dark),
            other => Err(format!("unknown theme '{other}'")),
        }
    }
}

/// The signed-in user's business profile.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Profile {
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub email: String,
    #[serde(default)]
    pub role: String,
    #[serde(default)]
    pub company: String,
    #[serde(default)]
    pub phone: String,
    #[serde(default)]
    pub address: String,
}

// ==========================================
// Lenient readers for stored documents
// ==========================================

mod lenient {
    use chrono::NaiveDate;
    use serde::{Deserialize, Deserializer};

    #[derive(Deserialize)]
    #[serde(untagged)]
    enum NumberOrText {
        Number(f64),
        Text(String),
    }

    /// Number, numeric string or null. Garbage reads as zero.
    pub fn number<'de, D>(deserializer: D) -> Result<f64, D::Error>
    where
        D: Deserializer<'de>,
    {
        Ok(match Option::<NumberOrText>::deserialize(deserializer)? {
            Some(NumberOrText::Number(n)) => n,
            Some(NumberOrText::Text(s)) => s.trim().parse().unwrap_or(0.0),
            None => 0.0,
        })
    }

    /// `YYYY-MM-DD` or a longer ISO timestamp. Empty or invalid reads as `None`.
    pub fn date<'de, D>(deserializer: D) -> Result<Option<NaiveDate>, D::Error>
    where
        D: Deserializer<'de>,
    {
        let raw = Option::<String>::deserialize(deserializer)?;
        Ok(raw.and_then(|s| {
            let s = s.trim();
            let head = s.get(..10).unwrap_or(s);
            NaiveDate::parse_from_str(head, "%Y-%m-%d").ok()
        }))
    }
}
