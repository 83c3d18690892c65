//! In-memory entity collections, written through to storage on every mutation.

use std::fmt;
use std::time::Duration;

use chrono::{DateTime, Utc};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use tracing::{debug, info, warn};

use crate::aggregate::{self, BilledTotal, DashboardStats};
use crate::clock::{Clock, SystemClock};
use crate::error::StoreError;
use crate::ids::{IdAllocator, InvoiceNumber, Numbering, generate_uid};
use crate::lifecycle::{
    self, ContractAction, InvoiceAction, Reclassified, Transition, contract_transition,
    invoice_transition,
};
use crate::model::{
    BilledDisplay, Client, Contract, ContractStatus, EntityId, Invoice, InvoiceStatus, Profile,
    Theme,
};
use crate::store::{Persistence, Store, keys};

/// Live and archived collections of every entity kind.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Tables {
    pub contracts: Vec<Contract>,
    pub invoices: Vec<Invoice>,
    pub clients: Vec<Client>,
    pub archived_contracts: Vec<Contract>,
    pub archived_invoices: Vec<Invoice>,
    pub archived_clients: Vec<Client>,
}

/// What the creation path hands an entity so it can fill in missing identifiers.
pub struct Identity<'a> {
    pub now: DateTime<Utc>,
    ids: &'a mut IdAllocator,
    numbering: &'a mut Numbering,
}

impl Identity<'_> {
    pub fn next_id(&mut self) -> EntityId {
        self.ids.next(self.now)
    }

    pub fn next_invoice_number(&mut self) -> String {
        self.numbering.next().to_string()
    }

    /// Keeps the counter ahead of a number the caller chose.
    pub fn observe_invoice_number(&mut self, number: &str) {
        if let Some(number) = InvoiceNumber::parse(number) {
            self.numbering.observe(number);
        }
    }
}

/// Whether any live or archived entity of this kind matches.
fn taken<T: Entity>(tables: &Tables, matches: impl Fn(&T) -> bool) -> bool {
    T::live(tables).iter().chain(T::archived(tables)).any(matches)
}

/// An entity kind managed by the repository.
pub trait Entity: Clone + fmt::Debug + Serialize + DeserializeOwned {
    const KIND: &'static str;
    const LIVE_KEY: &'static str;
    const ARCHIVE_KEY: &'static str;

    fn id(&self) -> EntityId;

    fn live(tables: &Tables) -> &Vec<Self>;
    fn live_mut(tables: &mut Tables) -> &mut Vec<Self>;
    fn archived(tables: &Tables) -> &Vec<Self>;
    fn archived_mut(tables: &mut Tables) -> &mut Vec<Self>;

    /// Clears identifiers already used by a live or archived entity of the
    /// same kind so `assign_identity` hands out fresh ones. Returns whether
    /// anything was cleared.
    fn release_taken_identity(&mut self, tables: &Tables) -> bool;

    /// Assigns identifiers that are absent. Present ones are kept as-is.
    fn assign_identity(&mut self, identity: &mut Identity<'_>);

    /// Re-derives computed fields before the entity is stored.
    fn normalize(&mut self) {}
}

impl Entity for Contract {
    const KIND: &'static str = "contract";
    const LIVE_KEY: &'static str = keys::CONTRACTS;
    const ARCHIVE_KEY: &'static str = keys::ARCHIVED_CONTRACTS;

    fn id(&self) -> EntityId {
        self.id
    }

    fn live(tables: &Tables) -> &Vec<Self> {
        &tables.contracts
    }

    fn live_mut(tables: &mut Tables) -> &mut Vec<Self> {
        &mut tables.contracts
    }

    fn archived(tables: &Tables) -> &Vec<Self> {
        &tables.archived_contracts
    }

    fn archived_mut(tables: &mut Tables) -> &mut Vec<Self> {
        &mut tables.archived_contracts
    }

    fn release_taken_identity(&mut self, tables: &Tables) -> bool {
        let (id, uid) = (self.id, self.uid.clone());
        let mut released = false;
        if id != 0 && taken::<Self>(tables, |c| c.id == id) {
            self.id = 0;
            released = true;
        }
        if !uid.is_empty() && taken::<Self>(tables, |c| c.uid == uid) {
            self.uid.clear();
            released = true;
        }
        released
    }

    fn assign_identity(&mut self, identity: &mut Identity<'_>) {
        if self.id == 0 {
            self.id = identity.next_id();
        }
        if self.uid.is_empty() {
            self.uid = generate_uid();
        }
        self.created_at.get_or_insert(identity.now);
    }
}

impl Entity for Invoice {
    const KIND: &'static str = "invoice";
    const LIVE_KEY: &'static str = keys::INVOICES;
    const ARCHIVE_KEY: &'static str = keys::ARCHIVED_INVOICES;

    fn id(&self) -> EntityId {
        self.id
    }

    fn live(tables: &Tables) -> &Vec<Self> {
        &tables.invoices
    }

    fn live_mut(tables: &mut Tables) -> &mut Vec<Self> {
        &mut tables.invoices
    }

    fn archived(tables: &Tables) -> &Vec<Self> {
        &tables.archived_invoices
    }

    fn archived_mut(tables: &mut Tables) -> &mut Vec<Self> {
        &mut tables.archived_invoices
    }

    fn release_taken_identity(&mut self, tables: &Tables) -> bool {
        let (id, uid, number) = (self.id, self.uid.clone(), self.invoice_number.clone());
        let mut released = false;
        if id != 0 && taken::<Self>(tables, |i| i.id == id) {
            self.id = 0;
            released = true;
        }
        if !uid.is_empty() && taken::<Self>(tables, |i| i.uid == uid) {
            self.uid.clear();
            released = true;
        }
        if !number.is_empty() && taken::<Self>(tables, |i| i.invoice_number == number) {
            self.invoice_number.clear();
            released = true;
        }
        released
    }

    fn assign_identity(&mut self, identity: &mut Identity<'_>) {
        if self.id == 0 {
            self.id = identity.next_id();
        }
        if self.uid.is_empty() {
            self.uid = generate_uid();
        }
        if self.invoice_number.is_empty() {
            self.invoice_number = identity.next_invoice_number();
        } else {
            identity.observe_invoice_number(&self.invoice_number);
        }
        self.created_at.get_or_insert(identity.now);
    }

    fn normalize(&mut self) {
        self.recompute_totals();
    }
}

impl Entity for Client {
    const KIND: &'static str = "client";
    const LIVE_KEY: &'static str = keys::CLIENTS;
    const ARCHIVE_KEY: &'static str = keys::ARCHIVED_CLIENTS;

    fn id(&self) -> EntityId {
        self.id
    }

    fn live(tables: &Tables) -> &Vec<Self> {
        &tables.clients
    }

    fn live_mut(tables: &mut Tables) -> &mut Vec<Self> {
        &mut tables.clients
    }

    fn archived(tables: &Tables) -> &Vec<Self> {
        &tables.archived_clients
    }

    fn archived_mut(tables: &mut Tables) -> &mut Vec<Self> {
        &mut tables.archived_clients
    }

    fn release_taken_identity(&mut self, tables: &Tables) -> bool {
        let id = self.id;
        if id != 0 && taken::<Self>(tables, |c| c.id == id) {
            self.id = 0;
            return true;
        }
        false
    }

    fn assign_identity(&mut self, identity: &mut Identity<'_>) {
        if self.id == 0 {
            self.id = identity.next_id();
        }
        self.created_at.get_or_insert(identity.now);
    }
}

/// Outcome of completing a contract.
#[derive(Debug, Clone, PartialEq)]
pub struct Completion {
    pub transition: Transition<ContractStatus>,
    /// The final invoice generated by this call, if one was needed.
    pub invoice: Option<Invoice>,
}

/// Everything in a dataset, for export and import.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Snapshot {
    #[serde(default)]
    pub contracts: Vec<Contract>,
    #[serde(default)]
    pub invoices: Vec<Invoice>,
    #[serde(default)]
    pub clients: Vec<Client>,
    #[serde(default)]
    pub archived_contracts: Vec<Contract>,
    #[serde(default)]
    pub archived_invoices: Vec<Invoice>,
    #[serde(default)]
    pub archived_clients: Vec<Client>,
    #[serde(default)]
    pub last_invoice_number: u32,
    #[serde(default)]
    pub invoice_billed_display: BilledDisplay,
}

pub struct Repository<S: Store, C: Clock = SystemClock> {
    pub(crate) persistence: Persistence<S>,
    clock: C,
    pub(crate) tables: Tables,
    numbering: Numbering,
    ids: IdAllocator,
    billed_display: BilledDisplay,
    auto_updated: bool,
}

impl<S: Store, C: Clock> Repository<S, C> {
    /// Opens with every save written straight through.
    pub fn open(store: S, clock: C) -> Self {
        Self::open_with_delay(store, clock, Duration::ZERO)
    }

    /// Loads every collection and runs the reclassification pass before
    /// anything can be read.
    pub fn open_with_delay(store: S, clock: C, write_delay: Duration) -> Self {
        let persistence = Persistence::new(store, write_delay);

        let tables = Tables {
            contracts: persistence.load_collection(keys::CONTRACTS),
            invoices: persistence.load_collection(keys::INVOICES),
            clients: persistence.load_collection(keys::CLIENTS),
            archived_contracts: persistence.load_collection(keys::ARCHIVED_CONTRACTS),
            archived_invoices: persistence.load_collection(keys::ARCHIVED_INVOICES),
            archived_clients: persistence.load_collection(keys::ARCHIVED_CLIENTS),
        };
        let numbering = Numbering::starting_after(persistence.load_scalar(keys::LAST_INVOICE_NUMBER, 0));
        let billed_display = persistence.load_scalar(keys::BILLED_DISPLAY, BilledDisplay::default());
        let auto_updated = persistence.load_scalar(keys::AUTO_UPDATED, false);

        let mut repo = Self {
            persistence,
            clock,
            tables,
            numbering,
            ids: IdAllocator::default(),
            billed_display,
            auto_updated,
        };

        repo.observe_ids();
        repo.reconcile_numbering();
        repo.backfill_uids();

        let reclassified = repo.reclassify();
        debug!(
            contracts = repo.tables.contracts.len(),
            invoices = repo.tables.invoices.len(),
            clients = repo.tables.clients.len(),
            auto_updated = reclassified.any(),
            "repository opened"
        );
        repo
    }

    fn observe_ids(&mut self) {
        let t = &self.tables;
        let ids = t
            .contracts
            .iter()
            .chain(&t.archived_contracts)
            .map(|c| c.id)
            .chain(t.invoices.iter().chain(&t.archived_invoices).map(|i| i.id))
            .chain(t.clients.iter().chain(&t.archived_clients).map(|c| c.id));
        for id in ids {
            self.ids.observe(id);
        }
    }

    fn reconcile_numbering(&mut self) {
        let moved = self
            .numbering
            .reconcile(self.tables.invoices.iter().chain(&self.tables.archived_invoices));
        if moved {
            warn!(last = self.numbering.last(), "invoice counter was behind existing invoices, raised");
            self.persist_numbering();
        }
    }

    /// Gives a uid to any contract or invoice stored without one.
    fn backfill_uids(&mut self) {
        fn fill<T>(items: &mut [T], uid: impl Fn(&mut T) -> &mut String) -> bool {
            let mut changed = false;
            for item in items {
                let slot = uid(item);
                if slot.is_empty() {
                    *slot = generate_uid();
                    changed = true;
                }
            }
            changed
        }

        if fill(&mut self.tables.contracts, |c| &mut c.uid) {
            self.persist_live::<Contract>();
        }
        if fill(&mut self.tables.archived_contracts, |c| &mut c.uid) {
            self.persist_archived::<Contract>();
        }
        if fill(&mut self.tables.invoices, |i| &mut i.uid) {
            self.persist_live::<Invoice>();
        }
        if fill(&mut self.tables.archived_invoices, |i| &mut i.uid) {
            self.persist_archived::<Invoice>();
        }
    }

    /// Moves overdue invoices and expired contracts to their new status.
    ///
    /// Runs on open; safe to call again (a second pass changes nothing).
    /// Archived entities are left alone.
    pub fn reclassify(&mut self) -> Reclassified {
        let today = self.clock.today();
        let outcome = Reclassified {
            invoices: lifecycle::reclassify_invoices(&mut self.tables.invoices, today),
            contracts: lifecycle::reclassify_contracts(&mut self.tables.contracts, today),
        };

        if outcome.invoices > 0 {
            self.persist_live::<Invoice>();
        }
        if outcome.contracts > 0 {
            self.persist_live::<Contract>();
        }
        if outcome.any() {
            info!(
                invoices = outcome.invoices,
                contracts = outcome.contracts,
                %today,
                "statuses updated automatically"
            );
            self.auto_updated = true;
            self.persistence.save_scalar(keys::AUTO_UPDATED, &true);
        }
        outcome
    }

    // ==========================================
    // Read accessors
    // ==========================================

    pub fn contracts(&self) -> &[Contract] {
        &self.tables.contracts
    }

    pub fn invoices(&self) -> &[Invoice] {
        &self.tables.invoices
    }

    pub fn clients(&self) -> &[Client] {
        &self.tables.clients
    }

    pub fn archived_contracts(&self) -> &[Contract] {
        &self.tables.archived_contracts
    }

    pub fn archived_invoices(&self) -> &[Invoice] {
        &self.tables.archived_invoices
    }

    pub fn archived_clients(&self) -> &[Client] {
        &self.tables.archived_clients
    }

    pub fn live<T: Entity>(&self) -> &[T] {
        T::live(&self.tables)
    }

    pub fn archived<T: Entity>(&self) -> &[T] {
        T::archived(&self.tables)
    }

    pub fn get<T: Entity>(&self, id: EntityId) -> Option<&T> {
        T::live(&self.tables).iter().find(|e| e.id() == id)
    }

    pub fn clock(&self) -> &C {
        &self.clock
    }

    // ==========================================
    // Mutations
    // ==========================================

    /// Appends a new entity, assigning any missing identifiers. Identifiers
    /// that another entity already holds are replaced. Returns the stored copy.
    pub fn add<T: Entity>(&mut self, mut entity: T) -> T {
        if entity.release_taken_identity(&self.tables) {
            warn!(kind = T::KIND, "identifiers already in use were replaced");
        }
        let before = self.numbering;
        let mut identity = Identity {
            now: self.clock.now(),
            ids: &mut self.ids,
            numbering: &mut self.numbering,
        };
        entity.assign_identity(&mut identity);
        entity.normalize();
        self.ids.observe(entity.id());
        if self.numbering != before {
            self.persist_numbering();
        }

        debug!(kind = T::KIND, id = entity.id(), "added");
        T::live_mut(&mut self.tables).push(entity.clone());
        self.persist_live::<T>();
        entity
    }

    /// Replaces the live entity with the same id. Missing id is a no-op.
    pub fn update<T: Entity>(&mut self, mut entity: T) -> bool {
        let Some(slot) = T::live_mut(&mut self.tables)
            .iter_mut()
            .find(|e| e.id() == entity.id())
        else {
            debug!(kind = T::KIND, id = entity.id(), "update for unknown id ignored");
            return false;
        };
        entity.normalize();
        *slot = entity;
        self.persist_live::<T>();
        true
    }

    /// Removes a live entity. Nothing linked to it is touched.
    pub fn delete<T: Entity>(&mut self, id: EntityId) -> Option<T> {
        let removed = take_by_id(T::live_mut(&mut self.tables), id)?;
        debug!(kind = T::KIND, id, "deleted");
        self.persist_live::<T>();
        Some(removed)
    }

    /// Swaps a whole live collection in one write.
    pub fn bulk_replace<T: Entity>(&mut self, items: Vec<T>) {
        for item in &items {
            self.ids.observe(item.id());
        }
        *T::live_mut(&mut self.tables) = items;
        self.persist_live::<T>();
    }

    /// Applies `edit` to a copy of the invoice and stores it with totals re-derived.
    pub fn edit_invoice(&mut self, id: EntityId, edit: impl FnOnce(&mut Invoice)) -> bool {
        let Some(mut invoice) = self.get::<Invoice>(id).cloned() else {
            return false;
        };
        edit(&mut invoice);
        invoice.id = id;
        self.update(invoice)
    }

    /// Draws the next invoice number and persists the counter.
    pub fn next_invoice_number(&mut self) -> String {
        let number = self.numbering.next();
        self.persist_numbering();
        number.to_string()
    }

    pub fn last_invoice_number(&self) -> u32 {
        self.numbering.last()
    }

    // ==========================================
    // Status transitions
    // ==========================================

    fn transition_invoice(&mut self, id: EntityId, action: InvoiceAction) -> Option<Transition<InvoiceStatus>> {
        let mut invoice = self.get::<Invoice>(id)?.clone();
        let transition = invoice_transition(invoice.status, action);
        match transition {
            Transition::Moved { to, .. } => {
                invoice.status = to;
                self.update(invoice);
            }
            Transition::Rejected { from } => {
                warn!(id, %from, ?action, "invoice transition rejected");
            }
            Transition::Unchanged(_) => {}
        }
        Some(transition)
    }

    fn transition_contract(&mut self, id: EntityId, action: ContractAction) -> Option<Transition<ContractStatus>> {
        let mut contract = self.get::<Contract>(id)?.clone();
        let transition = contract_transition(contract.status, action);
        match transition {
            Transition::Moved { to, .. } => {
                contract.status = to;
                self.update(contract);
            }
            Transition::Rejected { from } => {
                warn!(id, %from, ?action, "contract transition rejected");
            }
            Transition::Unchanged(_) => {}
        }
        Some(transition)
    }

    pub fn mark_invoice_paid(&mut self, id: EntityId) -> Option<Transition<InvoiceStatus>> {
        self.transition_invoice(id, InvoiceAction::MarkPaid)
    }

    pub fn mark_invoice_pending(&mut self, id: EntityId) -> Option<Transition<InvoiceStatus>> {
        self.transition_invoice(id, InvoiceAction::MarkPending)
    }

    /// Marks every pending or overdue invoice paid. Returns how many changed.
    pub fn mark_all_invoices_paid(&mut self) -> usize {
        let mut changed = 0;
        let invoices: Vec<Invoice> = self
            .tables
            .invoices
            .iter()
            .cloned()
            .map(|mut invoice| {
                if invoice.status != InvoiceStatus::Paid {
                    invoice.status = InvoiceStatus::Paid;
                    changed += 1;
                }
                invoice
            })
            .collect();
        if changed > 0 {
            self.bulk_replace(invoices);
        }
        changed
    }

    pub fn activate_contract(&mut self, id: EntityId) -> Option<Transition<ContractStatus>> {
        self.transition_contract(id, ContractAction::Activate)
    }

    pub fn mark_contract_pending(&mut self, id: EntityId) -> Option<Transition<ContractStatus>> {
        self.transition_contract(id, ContractAction::MarkPending)
    }

    pub fn cancel_contract(&mut self, id: EntityId) -> Option<Transition<ContractStatus>> {
        self.transition_contract(id, ContractAction::Cancel)
    }

    /// Completes a contract and, unless a live invoice already references it,
    /// generates its final invoice.
    pub fn complete_contract(&mut self, id: EntityId) -> Option<Completion> {
        let transition = self.transition_contract(id, ContractAction::Complete)?;
        if transition.target() != Some(ContractStatus::Completed) {
            return Some(Completion { transition, invoice: None });
        }

        let contract = self.get::<Contract>(id)?.clone();
        if aggregate::contract_invoices(&contract.uid, &self.tables.invoices)
            .next()
            .is_some()
        {
            debug!(id, uid = %contract.uid, "contract already invoiced, no final invoice generated");
            return Some(Completion { transition, invoice: None });
        }

        let draft = lifecycle::completion_invoice(&contract, self.clock.today());
        let invoice = self.add(draft);
        info!(
            contract = %contract.title,
            invoice = %invoice.invoice_number,
            amount = invoice.amount,
            "final invoice generated for completed contract"
        );
        Some(Completion {
            transition,
            invoice: Some(invoice),
        })
    }

    // ==========================================
    // Aggregates
    // ==========================================

    pub fn contract_invoices(&self, contract_uid: &str) -> Vec<&Invoice> {
        aggregate::contract_invoices(contract_uid, &self.tables.invoices).collect()
    }

    /// Billed total in the current display mode.
    pub fn contract_billed_total(&self, contract_uid: &str) -> BilledTotal {
        aggregate::contract_billed_total(contract_uid, &self.tables.invoices, self.billed_display)
    }

    pub fn dashboard(&self) -> DashboardStats {
        aggregate::dashboard_stats(&self.tables.invoices, &self.tables.contracts, &self.tables.clients)
    }

    // ==========================================
    // Settings, notices and preferences
    // ==========================================

    pub fn billed_display(&self) -> BilledDisplay {
        self.billed_display
    }

    pub fn set_billed_display(&mut self, mode: BilledDisplay) {
        self.billed_display = mode;
        self.persistence.save_scalar(keys::BILLED_DISPLAY, &mode);
    }

    pub fn reset_settings(&mut self) {
        self.billed_display = BilledDisplay::default();
        self.persistence.remove(keys::BILLED_DISPLAY);
    }

    /// Whether an automatic status update is waiting to be announced.
    pub fn auto_update_pending(&self) -> bool {
        self.auto_updated
    }

    /// Returns the auto-update notice once, then clears it.
    pub fn take_auto_update_notice(&mut self) -> bool {
        let pending = std::mem::take(&mut self.auto_updated);
        if pending {
            self.persistence.remove(keys::AUTO_UPDATED);
        }
        pending
    }

    pub fn theme(&self) -> Theme {
        self.persistence.load_scalar(keys::THEME, Theme::default())
    }

    pub fn set_theme(&mut self, theme: Theme) {
        self.persistence.save_scalar(keys::THEME, &theme);
    }

    pub fn profile(&self) -> Option<Profile> {
        self.persistence.load_scalar(keys::USER, None)
    }

    pub fn save_profile(&mut self, profile: &Profile) {
        self.persistence.save_scalar(keys::USER, profile);
    }

    pub fn clear_profile(&mut self) {
        self.persistence.remove(keys::USER);
    }

    // ==========================================
    // Export / import
    // ==========================================

    pub fn export(&self) -> Snapshot {
        let t = &self.tables;
        Snapshot {
            contracts: t.contracts.clone(),
            invoices: t.invoices.clone(),
            clients: t.clients.clone(),
            archived_contracts: t.archived_contracts.clone(),
            archived_invoices: t.archived_invoices.clone(),
            archived_clients: t.archived_clients.clone(),
            last_invoice_number: self.numbering.last(),
            invoice_billed_display: self.billed_display,
        }
    }

    /// Replaces the whole dataset. Identifiers and invoice numbers are kept;
    /// the counter only ever moves forward.
    pub fn import(&mut self, snapshot: Snapshot) -> Reclassified {
        self.tables = Tables {
            contracts: snapshot.contracts,
            invoices: snapshot.invoices,
            clients: snapshot.clients,
            archived_contracts: snapshot.archived_contracts,
            archived_invoices: snapshot.archived_invoices,
            archived_clients: snapshot.archived_clients,
        };
        if snapshot.last_invoice_number > self.numbering.last() {
            self.numbering = Numbering::starting_after(snapshot.last_invoice_number);
        }
        self.persist_numbering();
        self.observe_ids();
        self.reconcile_numbering();
        self.backfill_uids();
        self.set_billed_display(snapshot.invoice_billed_display);

        self.persist_live::<Contract>();
        self.persist_live::<Invoice>();
        self.persist_live::<Client>();
        self.persist_archived::<Contract>();
        self.persist_archived::<Invoice>();
        self.persist_archived::<Client>();

        info!(
            contracts = self.tables.contracts.len(),
            invoices = self.tables.invoices.len(),
            clients = self.tables.clients.len(),
            "dataset imported"
        );
        self.reclassify()
    }

    // ==========================================
    // Persistence
    // ==========================================

    pub(crate) fn persist_live<T: Entity>(&mut self) {
        self.persistence
            .save_collection(T::LIVE_KEY, T::live(&self.tables));
    }

    pub(crate) fn persist_archived<T: Entity>(&mut self) {
        self.persistence
            .save_collection(T::ARCHIVE_KEY, T::archived(&self.tables));
    }

    fn persist_numbering(&mut self) {
        self.persistence
            .save_scalar(keys::LAST_INVOICE_NUMBER, &self.numbering.last());
    }

    /// Waits for every queued write to land.
    pub fn flush(&mut self) -> Result<(), StoreError> {
        self.persistence.flush()
    }

    pub fn store(&self) -> &S {
        self.persistence.store()
    }
}

pub(crate) fn take_by_id<T: Entity>(items: &mut Vec<T>, id: EntityId) -> Option<T> {
    let index = items.iter().position(|e| e.id() == id)?;
    Some(items.remove(index))
}
