use std::time::Duration;

use chrono::NaiveDate;
use loomlance::aggregate::BilledTotal;
use loomlance::lifecycle::Transition;
use loomlance::store::keys;
use loomlance::{
    BilledDisplay, Client, Contract, ContractStatus, FixedClock, Invoice, InvoiceKind, InvoiceStatus,
    LineItem, MemoryStore, Repository, Snapshot, StoreError,
};

fn day(y: i32, m: u32, d: u32) -> NaiveDate {
    NaiveDate::from_ymd_opt(y, m, d).unwrap()
}

fn open_on(store: &MemoryStore, today: NaiveDate) -> Repository<MemoryStore, FixedClock> {
    Repository::open(store.clone(), FixedClock::on(today))
}

fn invoice_for(client: &str, due: NaiveDate, amount: f64) -> Invoice {
    Invoice::standalone(client, due, vec![LineItem::new("Work", 1.0, amount)], 0.0)
}

fn active_contract(title: &str, end: NaiveDate) -> Contract {
    Contract {
        title: title.into(),
        client_name: "Tech Corp".into(),
        start_date: Some(day(2024, 1, 1)),
        end_date: Some(end),
        status: ContractStatus::Active,
        total_value: 5000.0,
        hourly_rate: 100.0,
        estimated_hours: 50.0,
        ..Contract::default()
    }
}

#[test]
fn reload_reclassifies_and_announces_once() {
    let store = MemoryStore::new();
    store.insert_raw(
        keys::INVOICES,
        r#"[
            {"id": 1, "uid": "a", "invoiceNumber": "INV-0001", "clientName": "Tech Corp",
             "dueDate": "2024-06-01", "status": "pending", "amount": 100},
            {"id": 2, "uid": "b", "invoiceNumber": "INV-0002", "clientName": "Tech Corp",
             "dueDate": "2024-06-01", "status": "paid", "amount": 100},
            {"id": 3, "uid": "c", "invoiceNumber": "INV-0003", "clientName": "Tech Corp",
             "dueDate": "2024-06-10", "status": "pending", "amount": 100}
        ]"#,
    );
    store.insert_raw(
        keys::CONTRACTS,
        r#"[
            {"id": 10, "uid": "k1", "title": "Site", "clientName": "Tech Corp",
             "endDate": "2024-05-31", "status": "active"},
            {"id": 11, "uid": "k2", "title": "App", "clientName": "Tech Corp",
             "endDate": "2024-05-31", "status": "completed"}
        ]"#,
    );

    let mut repo = open_on(&store, day(2024, 6, 10));
    let statuses: Vec<_> = repo.invoices().iter().map(|i| i.status).collect();
    assert_eq!(
        statuses,
        vec![InvoiceStatus::Overdue, InvoiceStatus::Paid, InvoiceStatus::Pending]
    );
    assert_eq!(repo.contracts()[0].status, ContractStatus::Expired);
    assert_eq!(repo.contracts()[1].status, ContractStatus::Completed);
    assert!(store.raw(keys::INVOICES).unwrap().contains("overdue"));
    assert_eq!(store.raw(keys::AUTO_UPDATED).as_deref(), Some("true"));

    assert!(repo.take_auto_update_notice());
    assert!(!repo.take_auto_update_notice());
    assert_eq!(store.raw(keys::AUTO_UPDATED), None);

    // a second pass on the same day changes nothing
    let before = store.raw(keys::INVOICES);
    let mut reopened = open_on(&store, day(2024, 6, 10));
    assert!(!reopened.take_auto_update_notice());
    assert!(!reopened.reclassify().any());
    assert_eq!(store.raw(keys::INVOICES), before);
}

#[test]
fn invoice_numbers_are_never_reused() {
    let store = MemoryStore::new();
    let mut repo = open_on(&store, day(2024, 3, 1));
    let due = day(2024, 4, 1);

    let first = repo.add(invoice_for("Tech Corp", due, 100.0));
    let second = repo.add(invoice_for("Tech Corp", due, 200.0));
    let third = repo.add(invoice_for("Tech Corp", due, 300.0));
    let numbers: Vec<&str> = [&first, &second, &third]
        .iter()
        .map(|i| i.invoice_number.as_str())
        .collect();
    assert_eq!(numbers, ["INV-0001", "INV-0002", "INV-0003"]);
    assert!(first.id < second.id && second.id < third.id);

    repo.delete::<Invoice>(third.id);
    repo.archive::<Invoice>(second.id);
    assert_eq!(repo.add(invoice_for("Tech Corp", due, 1.0)).invoice_number, "INV-0004");
    assert_eq!(store.raw(keys::LAST_INVOICE_NUMBER).as_deref(), Some("4"));

    drop(repo);
    let mut reopened = open_on(&store, day(2024, 3, 1));
    assert_eq!(reopened.next_invoice_number(), "INV-0005");
}

#[test]
fn counter_behind_stored_invoices_is_raised() {
    let store = MemoryStore::new();
    store.insert_raw(keys::LAST_INVOICE_NUMBER, "1");
    store.insert_raw(
        keys::ARCHIVED_INVOICES,
        r#"[{"id": 7, "uid": "x", "invoiceNumber": "INV-0007", "dueDate": "2030-01-01"}]"#,
    );

    let mut repo = open_on(&store, day(2024, 3, 1));
    assert_eq!(repo.last_invoice_number(), 7);
    assert_eq!(store.raw(keys::LAST_INVOICE_NUMBER).as_deref(), Some("7"));
    assert_eq!(
        repo.add(invoice_for("Tech Corp", day(2024, 4, 1), 10.0)).invoice_number,
        "INV-0008"
    );
}

#[test]
fn line_item_edits_keep_totals_derived() {
    let store = MemoryStore::new();
    let mut repo = open_on(&store, day(2024, 3, 1));
    let mut draft = Invoice::standalone(
        "Tech Corp",
        day(2024, 4, 1),
        vec![LineItem::new("Design", 10.0, 50.0), LineItem::new("Build", 4.0, 100.0)],
        10.0,
    );
    // stale figures are re-derived on the way in
    draft.total = 1.0;
    let invoice = repo.add(draft);
    assert!(invoice.totals_consistent());
    assert_eq!(invoice.subtotal, 900.0);

    assert!(repo.edit_invoice(invoice.id, |i| {
        i.set_line_item(1, 5.0, 100.0);
    }));
    let edited = repo.get::<Invoice>(invoice.id).unwrap();
    assert_eq!(edited.subtotal, 1000.0);
    assert!((edited.amount - 1100.0).abs() < 1e-6);
    assert!(edited.totals_consistent());

    // a raw replacement is normalized too
    let mut replaced = edited.clone();
    replaced.line_items[0].amount = 0.0;
    replaced.line_items[0].quantity = 0.0;
    assert!(repo.update(replaced));
    let stored = repo.get::<Invoice>(invoice.id).unwrap();
    assert_eq!(stored.subtotal, 500.0);
    assert!(stored.totals_consistent());

    assert!(!repo.edit_invoice(999, |_| {}));
}

#[test]
fn completing_a_contract_invoices_it_exactly_once() {
    let store = MemoryStore::new();
    let today = day(2024, 6, 10);
    let mut repo = open_on(&store, today);
    let contract = repo.add(active_contract("Website", day(2024, 12, 31)));

    let completion = repo.complete_contract(contract.id).unwrap();
    assert_eq!(
        completion.transition,
        Transition::Moved {
            from: ContractStatus::Active,
            to: ContractStatus::Completed
        }
    );
    let invoice = completion.invoice.unwrap();
    assert_eq!(invoice.kind, InvoiceKind::ContractBased);
    assert_eq!(invoice.contract_uid.as_deref(), Some(contract.uid.as_str()));
    assert_eq!(invoice.client_name, "Tech Corp");
    assert_eq!(invoice.due_date, Some(day(2024, 7, 10)));
    assert_eq!(invoice.status, InvoiceStatus::Pending);
    assert_eq!(invoice.amount, 5000.0);
    assert_eq!(invoice.line_items[0].quantity, 50.0);
    assert_eq!(invoice.line_items[0].rate, 100.0);
    assert_eq!(invoice.invoice_number, "INV-0001");

    // again: already completed, already invoiced
    let again = repo.complete_contract(contract.id).unwrap();
    assert_eq!(again.transition, Transition::Unchanged(ContractStatus::Completed));
    assert!(again.invoice.is_none());
    assert_eq!(repo.contract_invoices(&contract.uid).len(), 1);

    // once the final invoice is gone, completing again re-creates it
    repo.delete::<Invoice>(invoice.id);
    let recreated = repo.complete_contract(contract.id).unwrap().invoice.unwrap();
    assert_eq!(recreated.invoice_number, "INV-0002");
    assert_eq!(repo.contract_invoices(&contract.uid).len(), 1);
}

#[test]
fn an_existing_linked_invoice_suppresses_the_final_invoice() {
    let store = MemoryStore::new();
    let mut repo = open_on(&store, day(2024, 6, 10));
    let contract = repo.add(active_contract("Retainer", day(2024, 12, 31)));
    let mut deposit = invoice_for("Tech Corp", day(2024, 6, 1), 1000.0);
    deposit.kind = InvoiceKind::ContractBased;
    deposit.contract_uid = Some(contract.uid.clone());
    repo.add(deposit);

    let completion = repo.complete_contract(contract.id).unwrap();
    assert!(completion.transition.is_moved());
    assert!(completion.invoice.is_none());
    assert_eq!(repo.invoices().len(), 1);
}

#[test]
fn illegal_transitions_leave_state_alone() {
    let store = MemoryStore::new();
    let mut repo = open_on(&store, day(2024, 6, 10));
    let contract = repo.add(Contract {
        title: "Draft".into(),
        ..Contract::default()
    });

    let outcome = repo.complete_contract(contract.id).unwrap();
    assert_eq!(outcome.transition, Transition::Rejected { from: ContractStatus::Pending });
    assert!(outcome.invoice.is_none());
    assert!(repo.invoices().is_empty());

    assert!(repo.cancel_contract(contract.id).unwrap().is_moved());
    assert_eq!(
        repo.activate_contract(contract.id),
        Some(Transition::Rejected { from: ContractStatus::Cancelled })
    );
    assert_eq!(repo.activate_contract(404), None);

    let overdue = repo.add(Invoice {
        status: InvoiceStatus::Overdue,
        ..invoice_for("Tech Corp", day(2024, 1, 1), 10.0)
    });
    assert_eq!(
        repo.mark_invoice_pending(overdue.id),
        Some(Transition::Rejected { from: InvoiceStatus::Overdue })
    );
    assert!(repo.mark_invoice_paid(overdue.id).unwrap().is_moved());
    assert!(repo.mark_invoice_pending(overdue.id).unwrap().is_moved());
    assert_eq!(repo.get::<Invoice>(overdue.id).unwrap().status, InvoiceStatus::Pending);
}

#[test]
fn archive_and_restore_round_trip_every_kind() {
    let store = MemoryStore::new();
    let mut repo = open_on(&store, day(2024, 6, 10));
    let contract = repo.add(active_contract("Website", day(2024, 12, 31)));
    let invoice = repo.add(invoice_for("Tech Corp", day(2024, 7, 1), 250.0));
    let client = repo.add(Client {
        name: "Tech Corp".into(),
        email: "billing@techcorp.example".into(),
        ..Client::default()
    });

    assert!(repo.archive::<Contract>(contract.id));
    assert!(repo.archive::<Invoice>(invoice.id));
    assert!(repo.archive::<Client>(client.id));
    assert!(repo.contracts().is_empty() && repo.invoices().is_empty() && repo.clients().is_empty());

    // archived records survive a reload untouched
    drop(repo);
    let mut repo = open_on(&store, day(2025, 1, 1));
    assert_eq!(repo.archived_contracts(), &[contract.clone()]);
    assert!(!repo.take_auto_update_notice());

    assert!(repo.restore::<Invoice>(invoice.id));
    assert!(repo.restore::<Client>(client.id));
    assert!(repo.restore::<Contract>(contract.id));
    assert_eq!(repo.invoices(), &[invoice]);
    assert_eq!(repo.clients(), &[client]);
    assert_eq!(repo.contracts(), &[contract]);
}

#[test]
fn billed_totals_follow_the_display_mode() {
    let store = MemoryStore::new();
    let mut repo = open_on(&store, day(2024, 6, 10));
    let contract = repo.add(active_contract("Website", day(2024, 12, 31)));
    for (amount, paid) in [(1000.0, true), (500.0, false), (250.0, true)] {
        let mut invoice = invoice_for("Tech Corp", day(2024, 7, 1), amount);
        invoice.contract_uid = Some(contract.uid.clone());
        invoice.kind = InvoiceKind::ContractBased;
        if paid {
            invoice.status = InvoiceStatus::Paid;
        }
        repo.add(invoice);
    }
    repo.add(invoice_for("Tech Corp", day(2024, 7, 1), 9999.0));

    assert_eq!(
        repo.contract_billed_total(&contract.uid),
        BilledTotal::PaidOfTotal { paid: 1250.0, total: 1750.0 }
    );
    repo.set_billed_display(BilledDisplay::PaidOnly);
    assert_eq!(repo.contract_billed_total(&contract.uid), BilledTotal::Amount(1250.0));
    repo.set_billed_display(BilledDisplay::AllInvoices);
    assert_eq!(repo.contract_billed_total(&contract.uid), BilledTotal::Amount(1750.0));
    assert_eq!(repo.contract_billed_total("nobody"), BilledTotal::Amount(0.0));

    drop(repo);
    let mut repo = open_on(&store, day(2024, 6, 10));
    assert_eq!(repo.billed_display(), BilledDisplay::AllInvoices);
    repo.reset_settings();
    assert_eq!(repo.billed_display(), BilledDisplay::PaidVsTotal);
    assert_eq!(store.raw(keys::BILLED_DISPLAY), None);
}

#[test]
fn deleting_a_contract_leaves_its_invoices_dangling() {
    let store = MemoryStore::new();
    let mut repo = open_on(&store, day(2024, 6, 10));
    let contract = repo.add(active_contract("Website", day(2024, 12, 31)));
    let invoice = repo.complete_contract(contract.id).unwrap().invoice.unwrap();

    repo.delete::<Contract>(contract.id);
    let kept = repo.get::<Invoice>(invoice.id).unwrap();
    assert_eq!(kept.contract_uid.as_deref(), Some(contract.uid.as_str()));
    assert!(loomlance::aggregate::contract_for_invoice(kept, repo.contracts()).is_none());

    // the dangling invoice still counts for its uid
    assert_eq!(repo.contract_invoices(&contract.uid).len(), 1);

    // and every operation on it still works
    assert!(repo.mark_invoice_paid(invoice.id).unwrap().is_moved());
    assert!(repo.edit_invoice(invoice.id, |i| {
        i.set_tax_percentage(10.0);
    }));
    let mut edited = repo.get::<Invoice>(invoice.id).unwrap().clone();
    assert!((edited.amount - 5500.0).abs() < 1e-6);
    edited.description = "Final invoice (contract removed)".into();
    assert!(repo.update(edited.clone()));
    assert_eq!(repo.dashboard().paid.count, 1);

    assert!(repo.archive::<Invoice>(invoice.id));
    assert!(repo.restore::<Invoice>(invoice.id));
    let restored = repo.get::<Invoice>(invoice.id).unwrap();
    assert_eq!(restored, &edited);
    assert_eq!(restored.contract_uid.as_deref(), Some(contract.uid.as_str()));
}

#[test]
fn caller_chosen_invoice_numbers_advance_the_counter() {
    let store = MemoryStore::new();
    let mut repo = open_on(&store, day(2024, 3, 1));
    let due = day(2024, 4, 1);

    let imported = repo.add(Invoice {
        invoice_number: "INV-0001".into(),
        ..invoice_for("Tech Corp", due, 100.0)
    });
    assert_eq!(imported.invoice_number, "INV-0001");
    assert_eq!(store.raw(keys::LAST_INVOICE_NUMBER).as_deref(), Some("1"));

    let fresh = repo.add(invoice_for("Tech Corp", due, 200.0));
    assert_eq!(fresh.invoice_number, "INV-0002");

    // a number already in use, even archived, is replaced
    repo.archive::<Invoice>(imported.id);
    let duplicate = repo.add(Invoice {
        invoice_number: "INV-0001".into(),
        ..invoice_for("Tech Corp", due, 300.0)
    });
    assert_eq!(duplicate.invoice_number, "INV-0003");

    let ahead = repo.add(Invoice {
        invoice_number: "INV-0040".into(),
        ..invoice_for("Tech Corp", due, 1.0)
    });
    assert_eq!(ahead.invoice_number, "INV-0040");
    assert_eq!(repo.next_invoice_number(), "INV-0041");
}

#[test]
fn identifiers_in_use_are_never_shared() {
    let store = MemoryStore::new();
    let mut repo = open_on(&store, day(2024, 3, 1));
    let original = repo.add(active_contract("Website", day(2024, 12, 31)));

    let copy = repo.add(Contract {
        title: "Website (copy)".into(),
        ..original.clone()
    });
    assert_ne!(copy.id, original.id);
    assert_ne!(copy.uid, original.uid);
    assert_eq!(repo.contracts().len(), 2);

    // archived identifiers are taken too
    repo.archive::<Contract>(original.id);
    let again = repo.add(original.clone());
    assert_ne!(again.id, original.id);
    assert_ne!(again.uid, original.uid);

    let client = repo.add(Client {
        name: "Tech Corp".into(),
        ..Client::default()
    });
    let twin = repo.add(client.clone());
    assert_ne!(twin.id, client.id);

    assert!(repo.update(Contract {
        title: "Renamed".into(),
        ..copy.clone()
    }));
    assert_eq!(repo.get::<Contract>(again.id).unwrap().title, "Website");
}

#[test]
fn archiving_all_paid_invoices_moves_only_paid_ones() {
    let store = MemoryStore::new();
    let mut repo = open_on(&store, day(2024, 6, 10));
    let due = day(2024, 7, 1);
    let paid_a = repo.add(invoice_for("A", due, 10.0));
    let pending = repo.add(invoice_for("B", due, 20.0));
    let paid_b = repo.add(invoice_for("C", due, 30.0));
    let overdue = repo.add(Invoice {
        status: InvoiceStatus::Overdue,
        ..invoice_for("D", day(2024, 6, 1), 40.0)
    });
    repo.mark_invoice_paid(paid_a.id);
    repo.mark_invoice_paid(paid_b.id);

    let live_writes = store.write_count(keys::INVOICES);
    let archive_writes = store.write_count(keys::ARCHIVED_INVOICES);

    let moved = repo.archive_where::<Invoice>(|i| i.status == InvoiceStatus::Paid);
    assert_eq!(moved, 2);
    assert_eq!(store.write_count(keys::INVOICES), live_writes + 1);
    assert_eq!(store.write_count(keys::ARCHIVED_INVOICES), archive_writes + 1);

    let live: Vec<_> = repo.invoices().iter().map(|i| i.id).collect();
    let archived: Vec<_> = repo.archived_invoices().iter().map(|i| i.id).collect();
    assert_eq!(live, vec![pending.id, overdue.id]);
    assert_eq!(archived, vec![paid_a.id, paid_b.id]);
    assert!(repo.archived_invoices().iter().all(|i| i.status == InvoiceStatus::Paid));

    // nothing left to archive
    assert_eq!(repo.archive_where::<Invoice>(|i| i.status == InvoiceStatus::Paid), 0);
    assert_eq!(store.write_count(keys::ARCHIVED_INVOICES), archive_writes + 1);
}

#[test]
fn mark_all_paid_touches_only_unpaid_invoices() {
    let store = MemoryStore::new();
    let mut repo = open_on(&store, day(2024, 6, 10));
    let a = repo.add(invoice_for("A", day(2024, 7, 1), 10.0));
    let b = repo.add(invoice_for("B", day(2024, 7, 1), 20.0));
    repo.mark_invoice_paid(a.id);

    assert_eq!(repo.mark_all_invoices_paid(), 1);
    assert_eq!(repo.mark_all_invoices_paid(), 0);
    assert_eq!(repo.get::<Invoice>(b.id).unwrap().status, InvoiceStatus::Paid);
    assert_eq!(repo.dashboard().paid.count, 2);
}

#[test]
fn failed_writes_keep_memory_and_heal_on_next_save() {
    let store = MemoryStore::new();
    let mut repo = open_on(&store, day(2024, 6, 10));
    repo.add(Client {
        name: "First".into(),
        ..Client::default()
    });

    store.reject_writes(true);
    let second = repo.add(Client {
        name: "Second".into(),
        ..Client::default()
    });
    assert_eq!(repo.clients().len(), 2);
    assert!(!store.raw(keys::CLIENTS).unwrap().contains("Second"));

    store.reject_writes(false);
    repo.add(Client {
        name: "Third".into(),
        ..Client::default()
    });
    let persisted = store.raw(keys::CLIENTS).unwrap();
    assert!(persisted.contains("Second") && persisted.contains("Third"));
    assert_eq!(open_on(&store, day(2024, 6, 10)).get::<Client>(second.id), Some(&second));
}

#[test]
fn delayed_writes_land_on_flush_and_drop() {
    let store = MemoryStore::new();
    let clock = FixedClock::on(day(2024, 6, 10));
    let mut repo = Repository::open_with_delay(store.clone(), clock, Duration::from_secs(3600));

    let contract = repo.add(active_contract("Website", day(2024, 12, 31)));
    repo.update(Contract {
        title: "Website v2".into(),
        ..contract.clone()
    });
    assert_eq!(store.raw(keys::CONTRACTS), None);
    assert_eq!(repo.get::<Contract>(contract.id).unwrap().title, "Website v2");

    repo.flush().unwrap();
    assert!(store.raw(keys::CONTRACTS).unwrap().contains("Website v2"));

    repo.cancel_contract(contract.id);
    drop(repo);
    assert!(store.raw(keys::CONTRACTS).unwrap().contains("cancelled"));
}

#[test]
fn flush_reports_rejected_writes() {
    let store = MemoryStore::new();
    let clock = FixedClock::on(day(2024, 6, 10));
    let mut repo = Repository::open_with_delay(store.clone(), clock, Duration::from_secs(3600));
    repo.add(Client::default());

    store.reject_writes(true);
    assert!(matches!(repo.flush(), Err(StoreError::Rejected { .. })));
    store.reject_writes(false);
}

#[test]
fn import_replaces_the_dataset_and_reclassifies() {
    let source = MemoryStore::new();
    let mut repo = open_on(&source, day(2024, 1, 1));
    repo.add(active_contract("Website", day(2024, 3, 31)));
    repo.add(invoice_for("Tech Corp", day(2024, 2, 1), 300.0));
    repo.add(invoice_for("Tech Corp", day(2024, 2, 1), 300.0));
    repo.set_billed_display(BilledDisplay::PaidOnly);
    let snapshot: Snapshot = serde_json::from_str(&serde_json::to_string(&repo.export()).unwrap()).unwrap();
    assert_eq!(snapshot.last_invoice_number, 2);

    let target = MemoryStore::new();
    let mut other = open_on(&target, day(2024, 6, 10));
    let reclassified = other.import(snapshot);
    assert_eq!(reclassified.invoices, 2);
    assert_eq!(reclassified.contracts, 1);
    assert!(other.take_auto_update_notice());
    assert_eq!(other.billed_display(), BilledDisplay::PaidOnly);
    assert_eq!(
        other.add(invoice_for("Tech Corp", day(2024, 7, 1), 1.0)).invoice_number,
        "INV-0003"
    );

    let reopened = open_on(&target, day(2024, 6, 10));
    assert_eq!(reopened.invoices().len(), 3);
    assert_eq!(reopened.contracts()[0].status, ContractStatus::Expired);
}

#[test]
fn stored_records_without_uids_get_one() {
    let store = MemoryStore::new();
    store.insert_raw(keys::CONTRACTS, r#"[{"id": 1, "title": "Legacy", "status": "pending"}]"#);
    let repo = open_on(&store, day(2024, 6, 10));
    assert!(!repo.contracts()[0].uid.is_empty());
    assert!(store.raw(keys::CONTRACTS).unwrap().contains(&repo.contracts()[0].uid));
}

#[test]
fn profile_and_theme_are_stored_per_key() {
    let store = MemoryStore::new();
    let mut repo = open_on(&store, day(2024, 6, 10));
    assert_eq!(repo.profile(), None);

    repo.save_profile(&loomlance::Profile {
        name: "Ada".into(),
        role: "Consultant".into(),
        ..Default::default()
    });
    repo.set_theme(loomlance::Theme::Dark);
    assert_eq!(repo.profile().unwrap().name, "Ada");
    assert_eq!(store.raw(keys::THEME).as_deref(), Some("\"dark\""));

    repo.clear_profile();
    assert_eq!(repo.profile(), None);
    assert_eq!(repo.theme(), loomlance::Theme::Dark);
}
