//! Status state machines for invoices and contracts.
//!
//! Everything here is pure: callers pass the current day in and decide what
//! to persist from the returned outcome.

use chrono::{Days, NaiveDate};

use crate::model::{Contract, ContractStatus, Invoice, InvoiceKind, InvoiceStatus, LineItem};

/// Days between contract completion and the due date of its final invoice.
pub const COMPLETION_INVOICE_TERMS_DAYS: u64 = 30;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InvoiceAction {
    MarkPaid,
    MarkPending,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ContractAction {
    Activate,
    Complete,
    MarkPending,
    Cancel,
}

/// Result of asking for a user-triggered transition.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Transition<S> {
    Moved { from: S, to: S },
    /// Already in the target state.
    Unchanged(S),
    /// Not a legal move from the current state.
    Rejected { from: S },
}

impl<S: Copy> Transition<S> {
    pub fn target(&self) -> Option<S> {
        match *self {
            Transition::Moved { to, .. } => Some(to),
            Transition::Unchanged(s) => Some(s),
            Transition::Rejected { .. } => None,
        }
    }

    pub fn is_moved(&self) -> bool {
        matches!(self, Transition::Moved { .. })
    }
}

pub fn invoice_transition(from: InvoiceStatus, action: InvoiceAction) -> Transition<InvoiceStatus> {
    use InvoiceStatus::*;
    let to = match (from, action) {
        (Pending | Overdue, InvoiceAction::MarkPaid) => Paid,
        (Paid, InvoiceAction::MarkPaid) => return Transition::Unchanged(Paid),
        (Paid, InvoiceAction::MarkPending) => Pending,
        (Pending, InvoiceAction::MarkPending) => return Transition::Unchanged(Pending),
        (Overdue, InvoiceAction::MarkPending) => return Transition::Rejected { from },
    };
    Transition::Moved { from, to }
}

pub fn contract_transition(from: ContractStatus, action: ContractAction) -> Transition<ContractStatus> {
    use ContractStatus::*;
    let to = match (from, action) {
        (Cancelled, ContractAction::Cancel) => return Transition::Unchanged(Cancelled),
        (_, ContractAction::Cancel) => Cancelled,
        (Pending | Completed, ContractAction::Activate) => Active,
        (Active, ContractAction::Activate) => return Transition::Unchanged(Active),
        (Active, ContractAction::Complete) => Completed,
        (Completed, ContractAction::Complete) => return Transition::Unchanged(Completed),
        (Expired, ContractAction::MarkPending) => Pending,
        (Pending, ContractAction::MarkPending) => return Transition::Unchanged(Pending),
        _ => return Transition::Rejected { from },
    };
    Transition::Moved { from, to }
}

// ==========================================
// Load-time reclassification
// ==========================================

/// `pending` past its due date becomes `overdue`. Returns whether it changed.
pub fn reclassify_invoice(invoice: &mut Invoice, today: NaiveDate) -> bool {
    match invoice.due_date {
        Some(due) if due < today && invoice.status == InvoiceStatus::Pending => {
            invoice.status = InvoiceStatus::Overdue;
            true
        }
        _ => false,
    }
}

/// `active` past its end date becomes `expired`. Returns whether it changed.
pub fn reclassify_contract(contract: &mut Contract, today: NaiveDate) -> bool {
    match contract.end_date {
        Some(end) if end < today && contract.status == ContractStatus::Active => {
            contract.status = ContractStatus::Expired;
            true
        }
        _ => false,
    }
}

/// Number of changed records.
pub fn reclassify_invoices(invoices: &mut [Invoice], today: NaiveDate) -> usize {
    invoices
        .iter_mut()
        .map(|invoice| reclassify_invoice(invoice, today))
        .filter(|changed| *changed)
        .count()
}

pub fn reclassify_contracts(contracts: &mut [Contract], today: NaiveDate) -> usize {
    contracts
        .iter_mut()
        .map(|contract| reclassify_contract(contract, today))
        .filter(|changed| *changed)
        .count()
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Reclassified {
    pub invoices: usize,
    pub contracts: usize,
}

impl Reclassified {
    pub fn any(&self) -> bool {
        self.invoices > 0 || self.contracts > 0
    }
}

// ==========================================
// Completion cascade
// ==========================================

/// Final invoice drafted when a contract completes. Identifiers are left
/// empty so the normal creation path assigns fresh ones.
pub fn completion_invoice(contract: &Contract, today: NaiveDate) -> Invoice {
    let due_date = today.checked_add_days(Days::new(COMPLETION_INVOICE_TERMS_DAYS));
    let line_item = LineItem {
        description: contract.title.clone(),
        quantity: contract.estimated_hours,
        rate: contract.hourly_rate,
        amount: contract.total_value,
    };

    Invoice {
        kind: InvoiceKind::ContractBased,
        contract_uid: Some(contract.uid.clone()),
        client_name: contract.client_name.clone(),
        due_date,
        status: InvoiceStatus::Pending,
        description: format!("Final invoice for {}", contract.title),
        line_items: vec![line_item],
        subtotal: contract.total_value,
        tax_percentage: 0.0,
        tax: 0.0,
        total: contract.total_value,
        amount: contract.total_value,
        ..Invoice::default()
    }
}
