//! Derived figures computed from the live collections on every call.

use std::collections::BTreeMap;
use std::fmt;

use chrono::Datelike;

use crate::model::{BilledDisplay, Client, Contract, ContractStatus, Invoice, InvoiceStatus};

/// Invoices linked to a contract, in collection order.
pub fn contract_invoices<'a>(
    contract_uid: &str,
    invoices: &'a [Invoice],
) -> impl Iterator<Item = &'a Invoice> {
    invoices
        .iter()
        .filter(move |invoice| invoice.is_linked_to(contract_uid))
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub enum BilledTotal {
    Amount(f64),
    PaidOfTotal { paid: f64, total: f64 },
}

impl fmt::Display for BilledTotal {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match *self {
            BilledTotal::Amount(amount) => f.write_str(&money(amount)),
            BilledTotal::PaidOfTotal { paid, total } => {
                write!(f, "{} / {}", money(paid), money(total))
            }
        }
    }
}

pub fn contract_billed_total(
    contract_uid: &str,
    invoices: &[Invoice],
    mode: BilledDisplay,
) -> BilledTotal {
    let (paid, total) = contract_invoices(contract_uid, invoices).fold(
        (0.0, 0.0),
        |(paid, total), invoice| {
            let paid = if invoice.status == InvoiceStatus::Paid {
                paid + invoice.amount
            } else {
                paid
            };
            (paid, total + invoice.amount)
        },
    );

    match mode {
        BilledDisplay::PaidOnly => BilledTotal::Amount(paid),
        BilledDisplay::AllInvoices => BilledTotal::Amount(total),
        BilledDisplay::PaidVsTotal => BilledTotal::PaidOfTotal { paid, total },
    }
}

/// `$1,234.50` style rendering.
pub fn money(amount: f64) -> String {
    let negative = amount < 0.0;
    let cents = (amount.abs() * 100.0).round() as u64;
    let whole = (cents / 100).to_string();

    let mut grouped = String::with_capacity(whole.len() + whole.len() / 3);
    for (i, ch) in whole.chars().enumerate() {
        if i > 0 && (whole.len() - i) % 3 == 0 {
            grouped.push(',');
        }
        grouped.push(ch);
    }

    format!("{}${}.{:02}", if negative { "-" } else { "" }, grouped, cents % 100)
}

// ==========================================
// Joins
// ==========================================
// Clients are referenced by name from invoices and contracts. These are the
// only functions that know that.

pub fn client_by_name<'a>(clients: &'a [Client], name: &str) -> Option<&'a Client> {
    clients.iter().find(|client| client.name == name)
}

pub fn invoices_for_client<'a>(
    invoices: &'a [Invoice],
    client_name: &'a str,
) -> impl Iterator<Item = &'a Invoice> + 'a {
    invoices
        .iter()
        .filter(move |invoice| invoice.client_name == client_name)
}

pub fn contracts_for_client<'a>(
    contracts: &'a [Contract],
    client_name: &'a str,
) -> impl Iterator<Item = &'a Contract> + 'a {
    contracts
        .iter()
        .filter(move |contract| contract.client_name == client_name)
}

/// The live contract an invoice points at. `None` for standalone invoices
/// and for links left dangling by a deleted or archived contract.
pub fn contract_for_invoice<'a>(invoice: &Invoice, contracts: &'a [Contract]) -> Option<&'a Contract> {
    let uid = invoice.contract_uid.as_deref()?;
    contracts.iter().find(|contract| contract.uid == uid)
}

// ==========================================
// Dashboard
// ==========================================

#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct StatusTally {
    pub count: usize,
    pub amount: f64,
}

impl StatusTally {
    fn add(&mut self, amount: f64) {
        self.count += 1;
        self.amount += amount;
    }
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct DashboardStats {
    pub total_invoices: usize,
    pub paid: StatusTally,
    pub pending: StatusTally,
    pub overdue: StatusTally,
    pub active_contracts: usize,
    pub pending_contracts: usize,
    pub total_clients: usize,
}

pub fn dashboard_stats(invoices: &[Invoice], contracts: &[Contract], clients: &[Client]) -> DashboardStats {
    let mut stats = DashboardStats {
        total_invoices: invoices.len(),
        total_clients: clients.len(),
        ..DashboardStats::default()
    };

    for invoice in invoices {
        match invoice.status {
            InvoiceStatus::Paid => stats.paid.add(invoice.amount),
            InvoiceStatus::Pending => stats.pending.add(invoice.amount),
            InvoiceStatus::Overdue => stats.overdue.add(invoice.amount),
        }
    }

    for contract in contracts {
        match contract.status {
            ContractStatus::Active => stats.active_contracts += 1,
            ContractStatus::Pending => stats.pending_contracts += 1,
            _ => {}
        }
    }

    stats
}

/// Last `n` items of a collection, newest first.
pub fn recent<T>(items: &[T], n: usize) -> impl Iterator<Item = &T> {
    items.iter().rev().take(n)
}

// ==========================================
// Yearly summary
// ==========================================

/// Paid and unpaid sums.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct PaidSplit {
    pub paid: f64,
    pub unpaid: f64,
}

impl PaidSplit {
    pub fn total(&self) -> f64 {
        self.paid + self.unpaid
    }

    fn add(&mut self, invoice: &Invoice) {
        if invoice.status == InvoiceStatus::Paid {
            self.paid += invoice.amount;
        } else {
            self.unpaid += invoice.amount;
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct YearSummary {
    pub year: i32,
    /// Keyed by month number, 1-12.
    pub months: BTreeMap<u32, PaidSplit>,
    /// Sorted by total, largest first.
    pub clients: Vec<(String, PaidSplit)>,
}

impl YearSummary {
    pub fn totals(&self) -> PaidSplit {
        self.months.values().fold(PaidSplit::default(), |acc, split| PaidSplit {
            paid: acc.paid + split.paid,
            unpaid: acc.unpaid + split.unpaid,
        })
    }
}

/// Groups invoices due in `year` by month and by client.
pub fn year_summary(invoices: &[Invoice], year: i32) -> YearSummary {
    let mut months: BTreeMap<u32, PaidSplit> = BTreeMap::new();
    let mut clients: BTreeMap<String, PaidSplit> = BTreeMap::new();

    for invoice in invoices {
        let Some(due) = invoice.due_date.filter(|d| d.year() == year) else {
            continue;
        };
        months.entry(due.month()).or_default().add(invoice);
        clients.entry(invoice.client_name.clone()).or_default().add(invoice);
    }

    let mut clients: Vec<_> = clients.into_iter().collect();
    clients.sort_by(|a, b| b.1.total().total_cmp(&a.1.total()));

    YearSummary { year, months, clients }
}
