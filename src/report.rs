//! Terminal tables for the command-line front end.

use chrono::NaiveDate;
use comfy_table::{Attribute, Cell, Color, Table};

use crate::aggregate::{self, DashboardStats, PaidSplit, YearSummary, money};
use crate::model::{BilledDisplay, Client, Contract, ContractStatus, Invoice, InvoiceStatus};

const PAID_GREEN: Color = Color::Rgb { r: 4, g: 120, b: 87 };
const UNPAID_RED: Color = Color::Rgb { r: 185, g: 28, b: 28 };
const UNKNOWN_CONTRACT: &str = "Unknown Contract";

fn date_cell(date: Option<NaiveDate>) -> Cell {
    match date {
        Some(d) => Cell::new(d.format("%m/%d/%Y")),
        None => Cell::new("-"),
    }
}

fn paid_cell(amount: f64) -> Cell {
    let cell = Cell::new(money(amount));
    if amount > 0.0 { cell.fg(PAID_GREEN) } else { cell }
}

fn unpaid_cell(amount: f64) -> Cell {
    let cell = Cell::new(money(amount));
    if amount > 0.0 { cell.fg(UNPAID_RED) } else { cell }
}

fn invoice_status_cell(status: InvoiceStatus) -> Cell {
    let cell = Cell::new(status);
    match status {
        InvoiceStatus::Paid => cell.fg(PAID_GREEN),
        InvoiceStatus::Overdue => cell.fg(UNPAID_RED).add_attribute(Attribute::Bold),
        InvoiceStatus::Pending => cell,
    }
}

fn contract_status_cell(status: ContractStatus) -> Cell {
    let cell = Cell::new(status);
    match status {
        ContractStatus::Active => cell.fg(PAID_GREEN),
        ContractStatus::Expired | ContractStatus::Cancelled => cell.fg(UNPAID_RED),
        _ => cell,
    }
}

pub fn contracts_table(contracts: &[Contract], invoices: &[Invoice], mode: BilledDisplay) -> Table {
    let mut table = Table::new();
    table.set_header(vec!["ID", "Title", "Client", "Start", "End", "Status", "Value", "Billed"]);
    for contract in contracts {
        let billed = aggregate::contract_billed_total(&contract.uid, invoices, mode);
        table.add_row(vec![
            Cell::new(contract.id),
            Cell::new(&contract.title),
            Cell::new(&contract.client_name),
            date_cell(contract.start_date),
            date_cell(contract.end_date),
            contract_status_cell(contract.status),
            Cell::new(money(contract.total_value)),
            Cell::new(billed),
        ]);
    }
    table
}

pub fn invoices_table(invoices: &[Invoice], contracts: &[Contract]) -> Table {
    let mut table = Table::new();
    table.set_header(vec!["ID", "Number", "Client", "Contract", "Due", "Status", "Amount"]);
    for invoice in invoices {
        let contract = match (&invoice.contract_uid, aggregate::contract_for_invoice(invoice, contracts)) {
            (None, _) => "-".to_string(),
            (Some(_), Some(contract)) => contract.title.clone(),
            (Some(_), None) => UNKNOWN_CONTRACT.to_string(),
        };
        table.add_row(vec![
            Cell::new(invoice.id),
            Cell::new(&invoice.invoice_number),
            Cell::new(&invoice.client_name),
            Cell::new(contract),
            date_cell(invoice.due_date),
            invoice_status_cell(invoice.status),
            Cell::new(money(invoice.amount)),
        ]);
    }
    table
}

pub fn line_items_table(invoice: &Invoice) -> Table {
    let mut table = Table::new();
    table.set_header(vec!["#", "Description", "Qty", "Rate", "Amount"]);
    for (index, item) in invoice.line_items.iter().enumerate() {
        table.add_row(vec![
            Cell::new(index),
            Cell::new(&item.description),
            Cell::new(item.quantity),
            Cell::new(money(item.rate)),
            Cell::new(money(item.amount)),
        ]);
    }
    table.add_row(vec![
        Cell::new(""),
        Cell::new("Subtotal"),
        Cell::new(""),
        Cell::new(""),
        Cell::new(money(invoice.subtotal)),
    ]);
    table.add_row(vec![
        Cell::new(""),
        Cell::new(format!("Tax ({}%)", invoice.tax_percentage)),
        Cell::new(""),
        Cell::new(""),
        Cell::new(money(invoice.tax)),
    ]);
    table.add_row(vec![
        Cell::new(""),
        Cell::new("Total").add_attribute(Attribute::Bold),
        Cell::new(""),
        Cell::new(""),
        Cell::new(money(invoice.total)).add_attribute(Attribute::Bold),
    ]);
    table
}

pub fn clients_table(clients: &[Client]) -> Table {
    let mut table = Table::new();
    table.set_header(vec!["ID", "Name", "Company", "Email", "Phone", "City", "State"]);
    for client in clients {
        table.add_row(vec![
            Cell::new(client.id),
            Cell::new(&client.name),
            Cell::new(&client.company),
            Cell::new(&client.email),
            Cell::new(&client.phone),
            Cell::new(&client.address.city),
            Cell::new(&client.address.state),
        ]);
    }
    table
}

pub fn dashboard_table(stats: &DashboardStats) -> Table {
    let mut table = Table::new();
    table.set_header(vec!["", "Count", "Amount"]);
    table.add_row(vec![Cell::new("Paid invoices"), Cell::new(stats.paid.count), paid_cell(stats.paid.amount)]);
    table.add_row(vec![
        Cell::new("Pending invoices"),
        Cell::new(stats.pending.count),
        Cell::new(money(stats.pending.amount)),
    ]);
    table.add_row(vec![
        Cell::new("Overdue invoices"),
        Cell::new(stats.overdue.count),
        unpaid_cell(stats.overdue.amount),
    ]);
    table.add_row(vec![
        Cell::new("All invoices").add_attribute(Attribute::Bold),
        Cell::new(stats.total_invoices),
        Cell::new(""),
    ]);
    table.add_row(vec![Cell::new("Active contracts"), Cell::new(stats.active_contracts), Cell::new("")]);
    table.add_row(vec![Cell::new("Pending contracts"), Cell::new(stats.pending_contracts), Cell::new("")]);
    table.add_row(vec![Cell::new("Clients"), Cell::new(stats.total_clients), Cell::new("")]);
    table
}

fn split_row(label: Cell, split: &PaidSplit) -> Vec<Cell> {
    vec![
        label,
        paid_cell(split.paid),
        unpaid_cell(split.unpaid),
        Cell::new(money(split.total())),
    ]
}

/// Monthly table (newest month first) and per-client table.
pub fn year_summary_tables(summary: &YearSummary) -> (Table, Table) {
    let mut monthly = Table::new();
    monthly.set_header(vec!["Month", "Paid", "Unpaid", "Total"]);
    for (month, split) in summary.months.iter().rev() {
        let label = NaiveDate::from_ymd_opt(summary.year, *month, 1)
            .map(|d| d.format("%B %Y").to_string())
            .unwrap_or_else(|| format!("{}-{:02}", summary.year, month));
        monthly.add_row(split_row(Cell::new(label), split));
    }

    let totals = summary.totals();
    monthly.add_row(vec![
        Cell::new(format!("Total ({})", summary.year)).add_attribute(Attribute::Bold),
        paid_cell(totals.paid).add_attribute(Attribute::Bold),
        unpaid_cell(totals.unpaid).add_attribute(Attribute::Bold),
        Cell::new(money(totals.total())).add_attribute(Attribute::Bold),
    ]);

    let mut clients = Table::new();
    clients.set_header(vec!["Client", "Paid", "Unpaid", "Total"]);
    for (client, split) in &summary.clients {
        clients.add_row(split_row(Cell::new(client), split));
    }

    (monthly, clients)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn dangling_links_render_as_unknown_contract() {
        let invoice = Invoice {
            id: 1,
            invoice_number: "INV-0001".into(),
            contract_uid: Some("deleted".into()),
            ..Invoice::default()
        };
        let rendered = invoices_table(&[invoice], &[]).to_string();
        assert!(rendered.contains(UNKNOWN_CONTRACT));
        assert!(rendered.contains("INV-0001"));
    }

    #[test]
    fn summary_has_total_row() {
        let summary = YearSummary {
            year: 2024,
            months: [(2, PaidSplit { paid: 10.0, unpaid: 5.0 })].into_iter().collect(),
            clients: vec![("Tech Corp".into(), PaidSplit { paid: 10.0, unpaid: 5.0 })],
        };
        let (monthly, clients) = year_summary_tables(&summary);
        let monthly = monthly.to_string();
        assert!(monthly.contains("February 2024"));
        assert!(monthly.contains("Total (2024)"));
        assert!(clients.to_string().contains("Tech Corp"));
    }
}
