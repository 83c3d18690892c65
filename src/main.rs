use std::fs;
use std::path::PathBuf;

use anyhow::{Context, Result, bail};
use chrono::{Datelike, Local, NaiveDate};
use clap::{Args, CommandFactory, Parser, Subcommand, ValueEnum};
use inquire::{Confirm, Text};
use tracing_subscriber::{EnvFilter, layer::SubscriberExt, util::SubscriberInitExt};

use loomlance::aggregate::{self, money};
use loomlance::lifecycle::Transition;
use loomlance::report;
use loomlance::{
    Address, BilledDisplay, Client, Config, Contract, ContractStatus, EntityId, FileStore, Invoice,
    InvoiceKind, InvoiceStatus, LineItem, Profile, Repository, Snapshot, SystemClock, Theme,
};

type Repo = Repository<FileStore, SystemClock>;

// ==========================================
// Command line
// ==========================================

#[derive(Parser)]
#[command(name = "loomlance", about = "Contracts, invoices and clients for freelancers")]
struct Cli {
    /// Data directory for this run (overrides the config file)
    #[arg(long, global = true)]
    data_root: Option<String>,

    /// Log level when RUST_LOG is not set (overrides the config file)
    #[arg(long, global = true)]
    log_level: Option<String>,

    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Subcommand)]
enum Commands {
    /// Manage contracts
    #[command(subcommand)]
    Contract(ContractCommand),
    /// Manage invoices
    #[command(subcommand)]
    Invoice(InvoiceCommand),
    /// Manage clients
    #[command(subcommand)]
    Client(ClientCommand),
    /// Browse or purge archived records
    #[command(subcommand)]
    Archive(ArchiveCommand),
    /// Show invoice and contract statistics
    Dashboard,
    /// Show monthly and per-client totals
    Summary {
        /// Year to summarize (defaults to current year)
        year: Option<i32>,
    },
    /// Display and theme preferences
    #[command(subcommand)]
    Settings(SettingsCommand),
    /// Business profile
    #[command(subcommand)]
    Profile(ProfileCommand),
    /// Write every collection to a JSON file
    Export { path: PathBuf },
    /// Replace every collection from a JSON export
    Import { path: PathBuf },
    /// Configure data directory (--data-root, prompted when absent) and write delay
    Config {
        #[arg(long)]
        write_delay_ms: Option<u64>,
    },
}

#[derive(Subcommand)]
enum ContractCommand {
    /// Create a contract
    Add(ContractFields),
    /// List contracts
    List {
        #[arg(long)]
        status: Option<ContractStatus>,
    },
    /// Show one contract with its invoices
    Show { id: EntityId },
    /// Change fields of a contract
    Edit {
        id: EntityId,
        #[command(flatten)]
        fields: ContractEdits,
    },
    /// pending/completed -> active
    Activate { id: EntityId },
    /// active -> completed, generating the final invoice
    Complete { id: EntityId },
    /// expired -> pending
    Pending { id: EntityId },
    /// any -> cancelled
    Cancel { id: EntityId },
    Delete { id: EntityId },
    Archive { id: EntityId },
    Restore { id: EntityId },
}

#[derive(Args)]
struct ContractFields {
    #[arg(long)]
    title: String,
    #[arg(long)]
    client: String,
    #[arg(long)]
    start: Option<NaiveDate>,
    #[arg(long)]
    end: Option<NaiveDate>,
    #[arg(long, default_value_t = 0.0)]
    value: f64,
    #[arg(long, default_value_t = 0.0)]
    rate: f64,
    #[arg(long, default_value_t = 0.0)]
    hours: f64,
    #[arg(long, default_value = "")]
    description: String,
    #[arg(long, default_value = "active")]
    status: ContractStatus,
}

#[derive(Args)]
struct ContractEdits {
    #[arg(long)]
    title: Option<String>,
    #[arg(long)]
    client: Option<String>,
    #[arg(long)]
    start: Option<NaiveDate>,
    #[arg(long)]
    end: Option<NaiveDate>,
    #[arg(long)]
    value: Option<f64>,
    #[arg(long)]
    rate: Option<f64>,
    #[arg(long)]
    hours: Option<f64>,
    #[arg(long)]
    description: Option<String>,
}

#[derive(Subcommand)]
enum InvoiceCommand {
    /// Create an invoice
    Add {
        #[arg(long)]
        client: String,
        #[arg(long)]
        due: NaiveDate,
        /// "description:quantity:rate" or "description:amount"; repeatable
        #[arg(long = "item", value_parser = parse_line_item, required = true)]
        items: Vec<LineItem>,
        #[arg(long, default_value_t = 0.0)]
        tax: f64,
        /// Link to a contract by uid
        #[arg(long)]
        contract: Option<String>,
        #[arg(long, default_value = "")]
        description: String,
    },
    /// List invoices
    List {
        #[arg(long)]
        status: Option<InvoiceStatus>,
    },
    /// Show one invoice with line items
    Show { id: EntityId },
    /// Mark invoice as paid
    Paid { id: EntityId },
    /// Revert a paid invoice to pending
    Pending { id: EntityId },
    /// Mark every pending and overdue invoice paid
    PayAll,
    /// Archive every paid invoice
    ArchivePaid,
    /// Change quantity and rate of one line item
    Item {
        id: EntityId,
        index: usize,
        #[arg(long)]
        quantity: f64,
        #[arg(long)]
        rate: f64,
    },
    /// Append a line item
    AddItem {
        id: EntityId,
        #[arg(value_parser = parse_line_item)]
        item: LineItem,
    },
    /// Remove a line item
    RemoveItem { id: EntityId, index: usize },
    /// Change the tax percentage
    Tax { id: EntityId, percentage: f64 },
    Delete { id: EntityId },
    Archive { id: EntityId },
    Restore { id: EntityId },
}

#[derive(Subcommand)]
enum ClientCommand {
    /// Add a client
    Add {
        #[arg(long)]
        name: String,
        #[arg(long, default_value = "")]
        email: String,
        #[arg(long, default_value = "")]
        phone: String,
        #[arg(long, default_value = "")]
        company: String,
        #[arg(long, default_value = "")]
        street: String,
        #[arg(long)]
        city: Option<String>,
        #[arg(long)]
        state: Option<String>,
        /// City and state are looked up from the ZIP code when omitted
        #[arg(long, default_value = "")]
        zip: String,
    },
    /// List clients
    List,
    /// Show a client with its contracts and invoices
    Show { id: EntityId },
    Delete { id: EntityId },
    Archive { id: EntityId },
    Restore { id: EntityId },
}

#[derive(Clone, Copy, ValueEnum)]
enum Kind {
    Contract,
    Invoice,
    Client,
}

#[derive(Subcommand)]
enum ArchiveCommand {
    /// List archived records
    List,
    /// Permanently delete an archived record
    Purge {
        kind: Kind,
        id: EntityId,
        /// Skip the confirmation prompt
        #[arg(long)]
        yes: bool,
    },
}

#[derive(Subcommand)]
enum SettingsCommand {
    /// Show current settings
    Show,
    /// paid-vs-total, paid-only or all-invoices
    BilledDisplay { mode: BilledDisplay },
    /// light or dark
    Theme { theme: Theme },
    /// Restore default settings
    Reset,
}

#[derive(Subcommand)]
enum ProfileCommand {
    Show,
    Set {
        #[arg(long)]
        name: String,
        #[arg(long, default_value = "")]
        email: String,
        #[arg(long, default_value = "")]
        role: String,
        #[arg(long, default_value = "")]
        company: String,
        #[arg(long, default_value = "")]
        phone: String,
        #[arg(long, default_value = "")]
        address: String,
    },
    Clear,
}

fn parse_line_item(s: &str) -> Result<LineItem, String> {
    let number = |raw: &str| {
        raw.trim()
            .parse::<f64>()
            .map_err(|_| format!("'{raw}' is not a number in item '{s}'"))
    };

    // description:quantity:rate, else description:amount (the description may hold colons)
    if let [rate, quantity, description] = s.rsplitn(3, ':').collect::<Vec<_>>().as_slice() {
        if let (Ok(quantity), Ok(rate)) = (number(*quantity), number(*rate)) {
            return Ok(LineItem::new(*description, quantity, rate));
        }
    }
    match s.rsplit_once(':') {
        Some((description, amount)) => Ok(LineItem::new(description, 1.0, number(amount)?)),
        None => Err(format!("item '{s}' must be description:quantity:rate or description:amount")),
    }
}

// ==========================================
// Main Function
// ==========================================

fn main() -> Result<()> {
    let cli = Cli::parse();

    let config_path = Config::default_path();
    let mut config = Config::load(&config_path)?;
    init_tracing(cli.log_level.as_deref().unwrap_or(&config.log_level));

    let Some(command) = cli.command else {
        Cli::command().print_help()?;
        return Ok(());
    };

    if let Commands::Config { write_delay_ms } = command {
        return configure(config, &config_path, cli.data_root, write_delay_ms);
    }

    if let Some(root) = cli.data_root {
        config.data_root = root;
    }
    let data_dir = config.data_dir();
    let store = FileStore::open(&data_dir)
        .with_context(|| format!("failed to open data directory {}", data_dir.display()))?;
    let mut repo = Repository::open_with_delay(store, SystemClock, config.write_delay());

    if repo.take_auto_update_notice() {
        println!("🔔 Overdue invoices and expired contracts were updated automatically.");
    }

    run(&mut repo, command)?;
    repo.flush().context("failed to save changes")?;
    Ok(())
}

fn init_tracing(level: &str) {
    tracing_subscriber::registry()
        .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| format!("loomlance={level},warn").into()))
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();
}

fn configure(
    mut config: Config,
    path: &std::path::Path,
    data_root: Option<String>,
    write_delay_ms: Option<u64>,
) -> Result<()> {
    println!("\n⚙️  --- Configuration Setup ---");
    let data_root = match data_root {
        Some(root) => root,
        None => Text::new("Enter Root Data Directory:")
            .with_default(&config.data_root)
            .prompt()?,
    };
    config.data_root = data_root;
    if let Some(delay) = write_delay_ms {
        config.write_delay_ms = delay;
    }
    config.save(path)?;
    println!("✅ Settings saved to {}", path.display());
    Ok(())
}

fn run(repo: &mut Repo, command: Commands) -> Result<()> {
    match command {
        Commands::Contract(cmd) => contract_command(repo, cmd),
        Commands::Invoice(cmd) => invoice_command(repo, cmd),
        Commands::Client(cmd) => client_command(repo, cmd),
        Commands::Archive(cmd) => archive_command(repo, cmd),
        Commands::Dashboard => {
            show_dashboard(repo);
            Ok(())
        }
        Commands::Summary { year } => {
            show_summary(repo, year);
            Ok(())
        }
        Commands::Settings(cmd) => {
            settings_command(repo, cmd);
            Ok(())
        }
        Commands::Profile(cmd) => {
            profile_command(repo, cmd);
            Ok(())
        }
        Commands::Export { path } => {
            let json = serde_json::to_string_pretty(&repo.export())?;
            fs::write(&path, json).with_context(|| format!("failed to write {}", path.display()))?;
            println!("✅ Exported to {}", path.display());
            Ok(())
        }
        Commands::Import { path } => {
            let content = fs::read_to_string(&path).with_context(|| format!("failed to read {}", path.display()))?;
            let snapshot: Snapshot =
                serde_json::from_str(&content).with_context(|| format!("{} is not a valid export", path.display()))?;
            let reclassified = repo.import(snapshot);
            println!(
                "✅ Imported {} contracts, {} invoices, {} clients",
                repo.contracts().len(),
                repo.invoices().len(),
                repo.clients().len()
            );
            if repo.take_auto_update_notice() {
                println!(
                    "🔔 {} invoices became overdue, {} contracts expired.",
                    reclassified.invoices, reclassified.contracts
                );
            }
            Ok(())
        }
        Commands::Config { .. } => unreachable!("handled before the repository is opened"),
    }
}

// ==========================================
// 1. Contracts
// ==========================================

fn report_transition<S: std::fmt::Display + Copy>(what: &str, id: EntityId, outcome: Option<Transition<S>>) -> Result<()> {
    match outcome {
        None => bail!("no {what} with id {id}"),
        Some(Transition::Moved { from, to }) => println!("✅ {what} {id}: {from} -> {to}"),
        Some(Transition::Unchanged(status)) => println!("ℹ️  {what} {id} is already {status}"),
        Some(Transition::Rejected { from }) => bail!("{what} {id} cannot make that change while {from}"),
    }
    Ok(())
}

fn contract_command(repo: &mut Repo, cmd: ContractCommand) -> Result<()> {
    match cmd {
        ContractCommand::Add(fields) => {
            let contract = repo.add(Contract {
                title: fields.title,
                client_name: fields.client,
                start_date: fields.start,
                end_date: fields.end,
                status: fields.status,
                description: fields.description,
                total_value: fields.value,
                hourly_rate: fields.rate,
                estimated_hours: fields.hours,
                ..Contract::default()
            });
            println!("✅ Contract created: {} (id {}, uid {})", contract.title, contract.id, contract.uid);
        }
        ContractCommand::List { status } => {
            let contracts: Vec<Contract> = repo
                .contracts()
                .iter()
                .filter(|c| status.is_none_or(|s| c.status == s))
                .cloned()
                .collect();
            if contracts.is_empty() {
                println!("(None found)");
            } else {
                println!("{}", report::contracts_table(&contracts, repo.invoices(), repo.billed_display()));
            }
        }
        ContractCommand::Show { id } => {
            let contract = repo.get::<Contract>(id).with_context(|| format!("no contract with id {id}"))?;
            println!("📄 {} ({})", contract.title, contract.status);
            println!("Client: {}", contract.client_name);
            if !contract.description.is_empty() {
                println!("{}", contract.description);
            }
            println!(
                "Value: {}  Rate: {}  Hours: {}",
                money(contract.total_value),
                money(contract.hourly_rate),
                contract.estimated_hours
            );
            println!("Billed: {}", repo.contract_billed_total(&contract.uid));
            let invoices: Vec<Invoice> = repo.contract_invoices(&contract.uid).into_iter().cloned().collect();
            if !invoices.is_empty() {
                println!("{}", report::invoices_table(&invoices, repo.contracts()));
            }
        }
        ContractCommand::Edit { id, fields } => {
            let mut contract = repo
                .get::<Contract>(id)
                .cloned()
                .with_context(|| format!("no contract with id {id}"))?;
            if let Some(title) = fields.title {
                contract.title = title;
            }
            if let Some(client) = fields.client {
                contract.client_name = client;
            }
            if fields.start.is_some() {
                contract.start_date = fields.start;
            }
            if fields.end.is_some() {
                contract.end_date = fields.end;
            }
            if let Some(value) = fields.value {
                contract.total_value = value;
            }
            if let Some(rate) = fields.rate {
                contract.hourly_rate = rate;
            }
            if let Some(hours) = fields.hours {
                contract.estimated_hours = hours;
            }
            if let Some(description) = fields.description {
                contract.description = description;
            }
            repo.update(contract);
            println!("✅ Contract {id} updated");
        }
        ContractCommand::Activate { id } => report_transition("contract", id, repo.activate_contract(id))?,
        ContractCommand::Pending { id } => report_transition("contract", id, repo.mark_contract_pending(id))?,
        ContractCommand::Cancel { id } => report_transition("contract", id, repo.cancel_contract(id))?,
        ContractCommand::Complete { id } => {
            let completion = repo.complete_contract(id);
            let invoice = completion.as_ref().and_then(|c| c.invoice.clone());
            report_transition("contract", id, completion.map(|c| c.transition))?;
            if let Some(invoice) = invoice {
                println!(
                    "🧾 Final invoice {} for {} due {}",
                    invoice.invoice_number,
                    money(invoice.amount),
                    invoice.due_date.map(|d| d.to_string()).unwrap_or_default()
                );
            }
        }
        ContractCommand::Delete { id } => {
            repo.delete::<Contract>(id).with_context(|| format!("no contract with id {id}"))?;
            println!("🗑️  Contract {id} deleted");
        }
        ContractCommand::Archive { id } => {
            if !repo.archive::<Contract>(id) {
                bail!("no contract with id {id}");
            }
            println!("📦 Contract {id} archived");
        }
        ContractCommand::Restore { id } => {
            if !repo.restore::<Contract>(id) {
                bail!("no archived contract with id {id}");
            }
            println!("♻️  Contract {id} restored");
        }
    }
    Ok(())
}

// ==========================================
// 2. Invoices
// ==========================================

fn invoice_command(repo: &mut Repo, cmd: InvoiceCommand) -> Result<()> {
    match cmd {
        InvoiceCommand::Add { client, due, items, tax, contract, description } => {
            let mut draft = Invoice::standalone(client, due, items, tax);
            draft.description = description;
            if let Some(uid) = contract {
                if !repo.contracts().iter().any(|c| c.uid == uid) {
                    println!("⚠️  No live contract has uid {uid}; linking anyway.");
                }
                draft.kind = InvoiceKind::ContractBased;
                draft.contract_uid = Some(uid);
            }
            let invoice = repo.add(draft);
            println!("✅ Invoice {} created for {} (id {})", invoice.invoice_number, money(invoice.amount), invoice.id);
        }
        InvoiceCommand::List { status } => {
            let invoices: Vec<Invoice> = repo
                .invoices()
                .iter()
                .filter(|i| status.is_none_or(|s| i.status == s))
                .cloned()
                .collect();
            if invoices.is_empty() {
                println!("(None found)");
            } else {
                println!("{}", report::invoices_table(&invoices, repo.contracts()));
            }
        }
        InvoiceCommand::Show { id } => {
            let invoice = repo.get::<Invoice>(id).with_context(|| format!("no invoice with id {id}"))?;
            println!("🧾 {} ({})", invoice.invoice_number, invoice.status);
            println!("Client: {}", invoice.client_name);
            if let Some(due) = invoice.due_date {
                println!("Due: {}", due.format("%m/%d/%Y"));
            }
            if invoice.contract_uid.is_some() {
                let title = aggregate::contract_for_invoice(invoice, repo.contracts())
                    .map(|c| c.title.as_str())
                    .unwrap_or("Unknown Contract");
                println!("Contract: {title}");
            }
            println!("{}", report::line_items_table(invoice));
        }
        InvoiceCommand::Paid { id } => report_transition("invoice", id, repo.mark_invoice_paid(id))?,
        InvoiceCommand::Pending { id } => report_transition("invoice", id, repo.mark_invoice_pending(id))?,
        InvoiceCommand::PayAll => {
            let changed = repo.mark_all_invoices_paid();
            println!("✅ {changed} invoices marked paid");
        }
        InvoiceCommand::ArchivePaid => {
            let moved = repo.archive_where::<Invoice>(|invoice| invoice.status == InvoiceStatus::Paid);
            println!("📦 {moved} paid invoices archived");
        }
        InvoiceCommand::Item { id, index, quantity, rate } => {
            let mut found = false;
            let edited = repo.edit_invoice(id, |invoice| found = invoice.set_line_item(index, quantity, rate));
            if !edited {
                bail!("no invoice with id {id}");
            }
            if !found {
                println!("ℹ️  Nothing changed");
            } else {
                println!("✅ Line item {index} of invoice {id} updated");
            }
        }
        InvoiceCommand::AddItem { id, item } => {
            if !repo.edit_invoice(id, |invoice| invoice.push_line_item(item)) {
                bail!("no invoice with id {id}");
            }
            println!("✅ Line item added to invoice {id}");
        }
        InvoiceCommand::RemoveItem { id, index } => {
            let mut removed = None;
            if !repo.edit_invoice(id, |invoice| removed = invoice.remove_line_item(index)) {
                bail!("no invoice with id {id}");
            }
            match removed {
                Some(item) => println!("🗑️  Removed '{}'", item.description),
                None => println!("ℹ️  Invoice {id} has no line item {index}"),
            }
        }
        InvoiceCommand::Tax { id, percentage } => {
            if !repo.edit_invoice(id, |invoice| {
                invoice.set_tax_percentage(percentage);
            }) {
                bail!("no invoice with id {id}");
            }
            println!("✅ Tax for invoice {id} set to {percentage}%");
        }
        InvoiceCommand::Delete { id } => {
            repo.delete::<Invoice>(id).with_context(|| format!("no invoice with id {id}"))?;
            println!("🗑️  Invoice {id} deleted");
        }
        InvoiceCommand::Archive { id } => {
            if !repo.archive::<Invoice>(id) {
                bail!("no invoice with id {id}");
            }
            println!("📦 Invoice {id} archived");
        }
        InvoiceCommand::Restore { id } => {
            if !repo.restore::<Invoice>(id) {
                bail!("no archived invoice with id {id}");
            }
            println!("♻️  Invoice {id} restored");
        }
    }
    Ok(())
}

// ==========================================
// 3. Clients
// ==========================================

fn lookup_zip(zip: &str) -> (String, String) {
    let (mut city, mut state) = (String::new(), String::new());
    if zip.trim().is_empty() {
        return (city, state);
    }
    match zipcodes::matching(zip, None) {
        Ok(results) => {
            if let Some(info) = results.first() {
                println!("🚀 Found: {}, {}", info.city, info.state);
                city = info.city.to_string();
                state = info.state.to_string();
            }
        }
        Err(_) => {}
    }
    (city, state)
}

fn client_command(repo: &mut Repo, cmd: ClientCommand) -> Result<()> {
    match cmd {
        ClientCommand::Add { name, email, phone, company, street, city, state, zip } => {
            if aggregate::client_by_name(repo.clients(), &name).is_some() {
                println!("⚠️  A client named {name} already exists; invoices match clients by name.");
            }
            let (city, state) = match (city, state) {
                (Some(city), Some(state)) => (city, state),
                (city, state) => {
                    let (found_city, found_state) = lookup_zip(&zip);
                    (city.unwrap_or(found_city), state.unwrap_or(found_state))
                }
            };
            let client = repo.add(Client {
                name,
                email,
                phone,
                company,
                address: Address {
                    street_address: street,
                    city,
                    state,
                    zip_code: zip,
                },
                ..Client::default()
            });
            println!("✅ Client created successfully: {} (id {})", client.name, client.id);
        }
        ClientCommand::List => {
            if repo.clients().is_empty() {
                println!("(None found)");
            } else {
                println!("{}", report::clients_table(repo.clients()));
            }
        }
        ClientCommand::Show { id } => {
            let client = repo.get::<Client>(id).with_context(|| format!("no client with id {id}"))?;
            println!("👤 {} {}", client.name, client.company);
            let contracts: Vec<Contract> = aggregate::contracts_for_client(repo.contracts(), &client.name)
                .cloned()
                .collect();
            let invoices: Vec<Invoice> = aggregate::invoices_for_client(repo.invoices(), &client.name)
                .cloned()
                .collect();
            if !contracts.is_empty() {
                println!("{}", report::contracts_table(&contracts, repo.invoices(), repo.billed_display()));
            }
            if !invoices.is_empty() {
                println!("{}", report::invoices_table(&invoices, repo.contracts()));
            }
        }
        ClientCommand::Delete { id } => {
            repo.delete::<Client>(id).with_context(|| format!("no client with id {id}"))?;
            println!("🗑️  Client {id} deleted");
        }
        ClientCommand::Archive { id } => {
            if !repo.archive::<Client>(id) {
                bail!("no client with id {id}");
            }
            println!("📦 Client {id} archived");
        }
        ClientCommand::Restore { id } => {
            if !repo.restore::<Client>(id) {
                bail!("no archived client with id {id}");
            }
            println!("♻️  Client {id} restored");
        }
    }
    Ok(())
}

// ==========================================
// 4. Archive
// ==========================================

fn archive_command(repo: &mut Repo, cmd: ArchiveCommand) -> Result<()> {
    match cmd {
        ArchiveCommand::List => {
            println!("--- Archived Contracts ---");
            if repo.archived_contracts().is_empty() {
                println!("(None found)");
            } else {
                println!(
                    "{}",
                    report::contracts_table(repo.archived_contracts(), repo.invoices(), repo.billed_display())
                );
            }
            println!("--- Archived Invoices ---");
            if repo.archived_invoices().is_empty() {
                println!("(None found)");
            } else {
                println!("{}", report::invoices_table(repo.archived_invoices(), repo.contracts()));
            }
            println!("--- Archived Clients ---");
            if repo.archived_clients().is_empty() {
                println!("(None found)");
            } else {
                println!("{}", report::clients_table(repo.archived_clients()));
            }
        }
        ArchiveCommand::Purge { kind, id, yes } => {
            let label = match kind {
                Kind::Contract => "contract",
                Kind::Invoice => "invoice",
                Kind::Client => "client",
            };
            if !yes {
                let confirmed = Confirm::new(&format!("Permanently delete archived {label} {id}?"))
                    .with_default(false)
                    .prompt()
                    .unwrap_or(false);
                if !confirmed {
                    println!("Cancelled");
                    return Ok(());
                }
            }
            let purged = match kind {
                Kind::Contract => repo.purge::<Contract>(id).is_some(),
                Kind::Invoice => repo.purge::<Invoice>(id).is_some(),
                Kind::Client => repo.purge::<Client>(id).is_some(),
            };
            if !purged {
                bail!("no archived {label} with id {id}");
            }
            println!("🗑️  Archived {label} {id} permanently deleted");
        }
    }
    Ok(())
}

// ==========================================
// 5. Reports
// ==========================================

fn show_dashboard(repo: &Repo) {
    let stats = repo.dashboard();
    println!("\n--- Dashboard ---");
    println!("{}", report::dashboard_table(&stats));

    let recent_invoices: Vec<Invoice> = aggregate::recent(repo.invoices(), 3).cloned().collect();
    if !recent_invoices.is_empty() {
        println!("\n--- Recent Invoices ---");
        println!("{}", report::invoices_table(&recent_invoices, repo.contracts()));
    }
    let recent_contracts: Vec<Contract> = aggregate::recent(repo.contracts(), 3).cloned().collect();
    if !recent_contracts.is_empty() {
        println!("\n--- Recent Contracts ---");
        println!("{}", report::contracts_table(&recent_contracts, repo.invoices(), repo.billed_display()));
    }
}

fn show_summary(repo: &Repo, year: Option<i32>) {
    let target_year = year.unwrap_or_else(|| Local::now().year());
    let summary = aggregate::year_summary(repo.invoices(), target_year);
    if summary.months.is_empty() {
        println!("No invoices due in {target_year}.");
        return;
    }

    let (monthly, clients) = report::year_summary_tables(&summary);
    println!("\n--- Monthly Invoice Summary ({target_year}) ---");
    println!("{monthly}");
    println!("\n--- Client Summary ({target_year}) ---");
    println!("{clients}");
}

// ==========================================
// 6. Settings & Profile
// ==========================================

fn settings_command(repo: &mut Repo, cmd: SettingsCommand) {
    match cmd {
        SettingsCommand::Show => {
            println!("Billed display: {}", repo.billed_display().as_str());
            println!("Theme: {:?}", repo.theme());
            println!("Last invoice number: {}", repo.last_invoice_number());
        }
        SettingsCommand::BilledDisplay { mode } => {
            repo.set_billed_display(mode);
            println!("✅ Billed display set to {}", mode.as_str());
        }
        SettingsCommand::Theme { theme } => {
            repo.set_theme(theme);
            println!("✅ Theme set to {theme:?}");
        }
        SettingsCommand::Reset => {
            repo.reset_settings();
            println!("✅ Settings reset");
        }
    }
}

fn profile_command(repo: &mut Repo, cmd: ProfileCommand) {
    match cmd {
        ProfileCommand::Show => match repo.profile() {
            Some(p) => {
                println!("{} ({})", p.name, p.role);
                println!("{} | {} | {}", p.company, p.email, p.phone);
                println!("{}", p.address);
            }
            None => println!("(No profile)"),
        },
        ProfileCommand::Set { name, email, role, company, phone, address } => {
            repo.save_profile(&Profile { name, email, role, company, phone, address });
            println!("✅ Profile saved");
        }
        ProfileCommand::Clear => {
            repo.clear_profile();
            println!("✅ Profile cleared");
        }
    }
}
