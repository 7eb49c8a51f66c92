mod config;
mod contact;
mod logging;
mod store;
mod ui;
mod validate;

use std::path::PathBuf;

use anyhow::{bail, Result};
use clap::{Args, Parser, Subcommand};
use tracing::{debug, warn};

use config::Config;
use contact::Contact;
use logging::Sink;
use store::ContactStore;

#[derive(Parser, Debug)]
#[command(name = "contactbook", about = "Keep a small book of personal contacts")]
struct Cli {
    /// Configuration file (defaults to <config dir>/contactbook/config.toml)
    #[arg(long, global = true, value_name = "PATH")]
    config: Option<PathBuf>,

    /// Contacts file, overriding `contacts_file` from the configuration
    #[arg(long, global = true, value_name = "PATH")]
    file: Option<PathBuf>,

    /// Log filter, e.g. `info` or `contactbook=debug`
    #[arg(long, global = true, value_name = "LEVEL")]
    log_level: Option<String>,

    #[command(subcommand)]
    command: Option<Command>,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Print every contact name with its number
    List,
    /// Print all fields of one contact
    Show(IndexArgs),
    /// Validate and append a contact
    Add(AddArgs),
    /// Remove one contact
    Delete(IndexArgs),
}

#[derive(Args, Debug)]
struct IndexArgs {
    /// Contact number as printed by `list` (starting at 1)
    number: usize,
}

#[derive(Args, Debug)]
struct AddArgs {
    #[arg(long)]
    name: String,
    #[arg(long)]
    email: String,
    #[arg(long)]
    father_name: String,
    #[arg(long)]
    phone: String,
    #[arg(long)]
    dob: String,
}

fn main() -> Result<()> {
    let cli = Cli::parse();
    let config = config::load(cli.config.as_deref())?;

    let level = cli.log_level.as_deref().unwrap_or(&config.log.level);
    let sink = if cli.command.is_some() {
        Sink::StderrAndFile
    } else {
        Sink::FileOnly
    };
    let _log_guard = logging::init_logging(level, config.log.file.as_deref(), sink)?;

    for warning in &config.warnings {
        warn!("{}", warning);
    }

    let contacts_file = cli.file.clone().unwrap_or_else(|| config.contacts_file.clone());
    let mut store = ContactStore::open(contacts_file)?;
    debug!(
        config = ?config.config_path,
        contacts = %store.path().display(),
        "opened contact book"
    );

    match cli.command {
        Some(Command::List) => handle_list(&store),
        Some(Command::Show(args)) => handle_show(&store, args),
        Some(Command::Add(args)) => handle_add(&mut store, args),
        Some(Command::Delete(args)) => handle_delete(&mut store, args),
        None => run_ui(&mut store, &config),
    }
}

fn run_ui(store: &mut ContactStore, config: &Config) -> Result<()> {
    let mut app = ui::app::App::new(store, config);
    app.run()
}

/// Convert a 1-based contact number into a store index.
fn index_for(store: &ContactStore, number: usize) -> Result<usize> {
    if number == 0 || number > store.len() {
        bail!(
            "no contact number {} (the book holds {})",
            number,
            store.len()
        );
    }
    Ok(number - 1)
}

fn handle_list(store: &ContactStore) -> Result<()> {
    if store.is_empty() {
        println!("No contacts");
        return Ok(());
    }
    for (idx, contact) in store.iter().enumerate() {
        println!("{}\t{}", idx + 1, contact.name);
    }
    Ok(())
}

fn handle_show(store: &ContactStore, args: IndexArgs) -> Result<()> {
    let index = index_for(store, args.number)?;
    if let Some(contact) = store.get(index) {
        for (label, value) in contact.labelled_fields() {
            println!("{}: {}", label, value);
        }
    }
    Ok(())
}

fn handle_add(store: &mut ContactStore, args: AddArgs) -> Result<()> {
    let contact = Contact::new(args.name, args.email, args.father_name, args.phone, args.dob);
    if let Err(err) = validate::validate(&contact) {
        bail!("{}", err);
    }
    let name = contact.name.clone();
    store.append(contact)?;
    println!("Added {}", name);
    Ok(())
}

fn handle_delete(store: &mut ContactStore, args: IndexArgs) -> Result<()> {
    let index = index_for(store, args.number)?;
    let removed = store.remove_at(Some(index))?;
    println!("Deleted {}", removed.name);
    Ok(())
}
