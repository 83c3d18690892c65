use std::fmt;
use std::sync::LazyLock;

use chrono::{DateTime, Utc};
use regex::Regex;
use uuid::Uuid;

use crate::model::{EntityId, Invoice};

static INVOICE_NUMBER_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^INV-(\d+)$").expect("invoice number pattern is valid"));

/// Globally unique, opaque identifier that survives export/import.
pub fn generate_uid() -> String {
    Uuid::new_v4().to_string()
}

/// Human-facing invoice number, `INV-` plus at least four digits.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub struct InvoiceNumber(pub u32);

impl InvoiceNumber {
    pub fn parse(s: &str) -> Option<Self> {
        let caps = INVOICE_NUMBER_RE.captures(s.trim())?;
        caps[1].parse().ok().map(InvoiceNumber)
    }
}

impl fmt::Display for InvoiceNumber {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "INV-{:04}", self.0)
    }
}

/// Monotonic invoice counter. Numbers are never reused, even after the
/// invoice that carried one is deleted or archived.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Numbering {
    last: u32,
}

impl Numbering {
    pub fn starting_after(last: u32) -> Self {
        Self { last }
    }

    pub fn last(&self) -> u32 {
        self.last
    }

    pub fn next(&mut self) -> InvoiceNumber {
        self.last = self.last.saturating_add(1);
        InvoiceNumber(self.last)
    }

    /// Raises the counter to `number` if it is behind. Returns whether it moved.
    pub fn observe(&mut self, number: InvoiceNumber) -> bool {
        if number.0 > self.last {
            self.last = number.0;
            true
        } else {
            false
        }
    }

    /// Raises the counter past every number already present. Returns whether it moved.
    pub fn reconcile<'a>(&mut self, invoices: impl IntoIterator<Item = &'a Invoice>) -> bool {
        let highest = invoices
            .into_iter()
            .filter_map(|invoice| InvoiceNumber::parse(&invoice.invoice_number))
            .max()
            .unwrap_or(InvoiceNumber(0));
        self.observe(highest)
    }
}

/// Hands out numeric ids: epoch milliseconds, bumped past the last id issued
/// so two creations in the same millisecond stay distinct.
#[derive(Debug, Clone, Copy, Default)]
pub struct IdAllocator {
    last: EntityId,
}

impl IdAllocator {
    pub fn observe(&mut self, id: EntityId) {
        self.last = self.last.max(id);
    }

    pub fn next(&mut self, now: DateTime<Utc>) -> EntityId {
        let candidate = now.timestamp_millis().max(self.last + 1);
        self.last = candidate;
        candidate
    }
}
