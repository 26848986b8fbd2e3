use anyhow::{anyhow, Context, Result};
use clap::{Parser, Subcommand};
use std::path::PathBuf;
use tracing::{info, warn};

use shop_ledger::attachments::FileKind;
use shop_ledger::calculator;
use shop_ledger::config::AppConfig;
use shop_ledger::logging::{init_logging, OperationTimer};
use shop_ledger::models::{
    ClientPatch, ClientQuery, JobPatch, NewClient, NewEvent, NewJob, ReportKind, SortOrder, Status,
};
use shop_ledger::report_writer::ReportFormat;
use shop_ledger::service::LedgerService;
use shop_ledger::validation::InputValidator;

#[derive(Parser)]
#[command(author, version, about, long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Add a client
    AddClient {
        /// Client name
        #[arg(short, long)]
        name: String,

        /// Phone number
        #[arg(short, long, default_value = "")]
        phone: String,

        /// Email address
        #[arg(short, long, default_value = "")]
        email: String,

        /// Street address
        #[arg(short, long, default_value = "")]
        address: String,

        /// Company name
        #[arg(short, long, default_value = "")]
        company: String,

        /// Initial status
        #[arg(short, long, default_value = "seguimiento")]
        status: String,
    },
    /// Edit a client; omitted fields are left untouched
    EditClient {
        /// Client id
        #[arg(long)]
        id: i64,

        /// New name
        #[arg(short, long)]
        name: Option<String>,

        /// New phone number
        #[arg(short, long)]
        phone: Option<String>,

        /// New email address
        #[arg(short, long)]
        email: Option<String>,

        /// New street address
        #[arg(short, long)]
        address: Option<String>,

        /// New company name
        #[arg(short, long)]
        company: Option<String>,

        /// New status
        #[arg(short, long)]
        status: Option<String>,
    },
    /// Delete a client and every job that belongs to it
    DeleteClient {
        /// Client id
        #[arg(long)]
        id: i64,
    },
    /// List clients, with optional filters
    ListClients {
        /// Free-text search over name, phone and authorized person ids
        #[arg(short, long)]
        search: Option<String>,

        /// Exact company match
        #[arg(short, long)]
        company: Option<String>,

        /// Exact status match
        #[arg(long)]
        status: Option<String>,

        /// Clients with at least one job using this material
        #[arg(short, long)]
        material: Option<String>,

        /// Sort order: asc, desc or recent
        #[arg(long, default_value = "recent")]
        sort: String,
    },
    /// Add a job to a client
    AddJob {
        /// Owning client id
        #[arg(long)]
        client_id: i64,

        /// Job name
        #[arg(short, long)]
        name: String,

        /// Material
        #[arg(short, long, default_value = "")]
        material: String,

        /// Measurements
        #[arg(long, default_value = "")]
        measures: String,

        /// Initial status
        #[arg(short, long, default_value = "seguimiento")]
        status: String,

        /// Details text
        #[arg(short, long, default_value = "")]
        details: String,
    },
    /// Edit a job; omitted fields are left untouched
    EditJob {
        /// Job id
        #[arg(long)]
        id: i64,

        /// New name
        #[arg(short, long)]
        name: Option<String>,

        /// New material
        #[arg(short, long)]
        material: Option<String>,

        /// New measurements
        #[arg(long)]
        measures: Option<String>,

        /// New status
        #[arg(short, long)]
        status: Option<String>,

        /// New details text
        #[arg(short, long)]
        details: Option<String>,

        /// New follow-up notes
        #[arg(long)]
        notes: Option<String>,
    },
    /// Delete a job
    DeleteJob {
        /// Job id
        #[arg(long)]
        id: i64,
    },
    /// Compute and save a job's pricing calculator
    Calc {
        /// Job id
        #[arg(long)]
        job_id: i64,

        /// Publicity cost
        #[arg(long)]
        publicity: Option<f64>,

        /// Services cost
        #[arg(long)]
        services: Option<f64>,

        /// Transport cost
        #[arg(long)]
        transport: Option<f64>,

        /// Provider cost
        #[arg(long)]
        provider_cost: Option<f64>,

        /// Packaging cost
        #[arg(long)]
        packaging_cost: Option<f64>,

        /// Design cost
        #[arg(long)]
        design_cost: Option<f64>,

        /// Installation cost
        #[arg(long)]
        installation_cost: Option<f64>,

        /// Profit margin percentage
        #[arg(long)]
        profit_margin: Option<f64>,

        /// Tax percentage
        #[arg(long)]
        iva: Option<f64>,

        /// Price before tax (leave unset to derive it)
        #[arg(long)]
        price_without_iva: Option<f64>,

        /// Final price (leave unset to derive it)
        #[arg(long)]
        final_price: Option<f64>,
    },
    /// Attach a local file to a job as a data URI
    AttachFile {
        /// Job id
        #[arg(long)]
        job_id: i64,

        /// File to ingest
        #[arg(short, long)]
        path: PathBuf,
    },
    /// Link an external URL to a job
    AttachUrl {
        /// Job id
        #[arg(long)]
        job_id: i64,

        /// The URL to link
        #[arg(short, long)]
        url: String,

        /// Kind of file: image, video, pdf or other
        #[arg(short, long, default_value = "other")]
        kind: String,
    },
    /// Add a calendar event
    AddEvent {
        /// Event title
        #[arg(short, long)]
        title: String,

        /// Description
        #[arg(short, long, default_value = "")]
        description: String,

        /// Date (YYYY-MM-DD)
        #[arg(long)]
        date: String,

        /// Time (HH:MM)
        #[arg(long, default_value = "")]
        time: String,

        /// Associated client id
        #[arg(long)]
        client_id: Option<i64>,
    },
    /// List events for a date or a month
    ListEvents {
        /// A single date (YYYY-MM-DD)
        #[arg(long)]
        date: Option<String>,

        /// A month (YYYY-MM)
        #[arg(long)]
        month: Option<String>,
    },
    /// Delete an event
    DeleteEvent {
        /// Event id
        #[arg(long)]
        id: i64,
    },
    /// Generate a report and export it
    Report {
        /// Report kind: clientsByStatus, jobsByMaterial, monthlyIncome or
        /// profits
        #[arg(short, long)]
        kind: String,

        /// Output format (csv or json)
        #[arg(short, long, default_value = "json")]
        format: String,

        /// Output directory
        #[arg(short, long)]
        output_dir: Option<PathBuf>,
    },
    /// Show the headline statistics panel
    Stats,
    /// Export the whole database to a JSON file
    Export {
        /// Target file; defaults to database_YYYY-MM-DD.json in the output
        /// directory
        #[arg(short, long)]
        path: Option<PathBuf>,
    },
    /// Import a database JSON file, replacing everything
    Import {
        /// Snapshot file to import
        #[arg(short, long)]
        path: PathBuf,
    },
    /// Discard everything and start a fresh database
    NewDatabase,
}

#[tokio::main]
async fn main() -> Result<()> {
    // Load configuration
    let config = AppConfig::load()?;

    // Initialize logging
    let _log_guard = init_logging(
        Some(&config.get_log_level()),
        config.logging.file_path.as_deref().map(std::path::Path::new),
    )?;

    info!("Starting shop-ledger");

    // Parse command line arguments
    let cli = Cli::parse();

    let mut service = LedgerService::open(config)?;

    match cli.command {
        Commands::AddClient {
            name,
            phone,
            email,
            address,
            company,
            status,
        } => {
            InputValidator::validate_client_name(&name)?;
            InputValidator::validate_phone(&phone)?;
            InputValidator::validate_email(&email)?;

            let client = service.add_client(NewClient {
                name,
                phone,
                email,
                address,
                company,
                status: Status::from(status),
                avatar: None,
                authorized_persons: Vec::new(),
            })?;
            println!("Created client {} ({})", client.name, client.id);
        }
        Commands::EditClient {
            id,
            name,
            phone,
            email,
            address,
            company,
            status,
        } => {
            if let Some(name) = &name {
                InputValidator::validate_client_name(name)?;
            }
            let client = service.update_client(id, ClientPatch {
                name,
                phone,
                email,
                address,
                company,
                status: status.map(Status::from),
                ..ClientPatch::default()
            })?;
            println!("Updated client {} ({})", client.name, client.id);
        }
        Commands::DeleteClient { id } => {
            let removed_jobs = service.delete_client(id)?;
            println!("Deleted client {id} and {removed_jobs} job(s)");
        }
        Commands::ListClients {
            search,
            company,
            status,
            material,
            sort,
        } => {
            let query = ClientQuery {
                search,
                company,
                status: status.map(Status::from),
                material,
                sort: parse_sort_order(&sort)?,
            };
            let clients = service.store().list_clients(&query);
            if clients.is_empty() {
                println!("No clients found");
            }
            for client in clients {
                let jobs = service.store().jobs_for_client(client.id).len();
                println!(
                    "{:>14}  {:<25} {:<20} {:<12} {} job(s)",
                    client.id, client.name, client.company, client.status, jobs
                );
            }
        }
        Commands::AddJob {
            client_id,
            name,
            material,
            measures,
            status,
            details,
        } => {
            InputValidator::validate_job_name(&name)?;
            let (job, change) = service.add_job(NewJob {
                client_id,
                name,
                material,
                measures,
                status: Status::from(status),
                details,
                follow_up_notes: String::new(),
                files: Vec::new(),
            })?;
            println!("Created job {} ({})", job.name, job.id);
            if let Some(change) = change {
                println!("Client status updated to: {}", change.current);
            }
        }
        Commands::EditJob {
            id,
            name,
            material,
            measures,
            status,
            details,
            notes,
        } => {
            if let Some(name) = &name {
                InputValidator::validate_job_name(name)?;
            }
            let (job, change) = service.update_job(id, JobPatch {
                name,
                material,
                measures,
                status: status.map(Status::from),
                details,
                follow_up_notes: notes,
                files: None,
            })?;
            println!("Updated job {} ({})", job.name, job.id);
            if let Some(change) = change {
                println!("Client status updated to: {}", change.current);
            }
        }
        Commands::DeleteJob { id } => {
            let change = service.delete_job(id)?;
            println!("Deleted job {id}");
            if let Some(change) = change {
                println!("Client status updated to: {}", change.current);
            }
        }
        Commands::Calc {
            job_id,
            publicity,
            services,
            transport,
            provider_cost,
            packaging_cost,
            design_cost,
            installation_cost,
            profit_margin,
            iva,
            price_without_iva,
            final_price,
        } => {
            // Start from the job's saved figures or the configured
            // defaults, then overlay whatever was passed on the command
            // line.
            let mut inputs = service.calculator_defaults(job_id);
            overlay(&mut inputs.publicity, publicity);
            overlay(&mut inputs.services, services);
            overlay(&mut inputs.transport, transport);
            overlay(&mut inputs.provider_cost, provider_cost);
            overlay(&mut inputs.packaging_cost, packaging_cost);
            overlay(&mut inputs.design_cost, design_cost);
            overlay(&mut inputs.installation_cost, installation_cost);
            overlay(&mut inputs.profit_margin, profit_margin);
            overlay(&mut inputs.iva, iva);
            overlay(&mut inputs.price_without_iva, price_without_iva);
            overlay(&mut inputs.final_price, final_price);

            let job = service.save_calculator(job_id, &inputs)?;
            let Some(calc) = job.calculator.as_ref() else {
                warn!(job_id, "calculator missing after save");
                return Ok(());
            };
            println!("Total cost:        {:.2}", calc.total_cost);
            println!("Price without IVA: {:.2}", calc.price_without_iva);
            println!("Final price:       {:.2}", calc.final_price);
            println!(
                "Profit:            {:.2} ({:.2}%)",
                calculator::profit(calc),
                calculator::margin_on_cost(calc)
            );
        }
        Commands::AttachFile { job_id, path } => {
            InputValidator::validate_file_path(&path)?;
            let timer = OperationTimer::new("attach_file");
            match service.attach_local_file(job_id, &path).await? {
                Some(job) => println!(
                    "Attached {} to job {} ({} file(s))",
                    path.display(),
                    job.id,
                    job.files.len()
                ),
                None => println!("Attachment dropped: context changed before the read finished"),
            }
            timer.finish();
        }
        Commands::AttachUrl { job_id, url, kind } => {
            let job = service.attach_url(job_id, &url, parse_file_kind(&kind)?)?;
            println!("Linked {} to job {} ({} file(s))", url, job.id, job.files.len());
        }
        Commands::AddEvent {
            title,
            description,
            date,
            time,
            client_id,
        } => {
            InputValidator::validate_event_title(&title)?;
            InputValidator::validate_event_date(&date)?;
            InputValidator::validate_event_time(&time)?;

            let event = service.add_event(NewEvent {
                title,
                description,
                date,
                time,
                client_id,
            })?;
            println!("Created event {} ({})", event.title, event.id);
        }
        Commands::ListEvents { date, month } => {
            let store = service.store();
            let events: Vec<_> = if let Some(date) = date {
                store.events_on(&date)
            } else if let Some(month) = month {
                let (year, month) = parse_month(&month)?;
                store.events_in_month(year, month)
            } else {
                store.events().iter().collect()
            };

            if events.is_empty() {
                println!("No events found");
            }
            for event in events {
                println!(
                    "{:>14}  {} {}  {}",
                    event.id,
                    event.date,
                    if event.time.is_empty() { "--:--" } else { event.time.as_str() },
                    event.title
                );
            }
        }
        Commands::DeleteEvent { id } => {
            service.delete_event(id)?;
            println!("Deleted event {id}");
        }
        Commands::Report {
            kind,
            format,
            output_dir,
        } => {
            let kind = parse_report_kind(&kind)?;
            let format: ReportFormat = format
                .parse()
                .map_err(|e: String| anyhow::anyhow!(e))?;
            let (report, path) =
                service.generate_report(kind, format, output_dir.as_deref())?;
            println!("{}", report.title);
            println!("{}", serde_json::to_string_pretty(&report.data)?);
            println!("Total: {}", report.total);
            println!("Written to {}", path.display());
        }
        Commands::Stats => {
            let stats = service.statistics();
            println!("Clients:        {} ({} active)", stats.total_clients, stats.active_clients);
            println!("Jobs:           {} ({} closed)", stats.total_jobs, stats.completed_jobs);
            println!("Total income:   {:.2}", stats.total_income);
            println!("Total cost:     {:.2}", stats.total_cost);
            println!("Total profit:   {:.2}", stats.total_profit);
            println!("Average income: {:.2}", stats.average_income);
            println!("Profit margin:  {:.2}%", stats.profit_margin);
        }
        Commands::Export { path } => {
            let written = service.export_snapshot(path.as_deref())?;
            println!("Database exported to {}", written.display());
        }
        Commands::Import { path } => {
            InputValidator::validate_file_path(&path)?;
            service
                .import_snapshot(&path)
                .context("Failed to import database file")?;
            println!(
                "Database imported: {} client(s), {} job(s), {} event(s)",
                service.store().clients().len(),
                service.store().jobs().len(),
                service.store().events().len()
            );
        }
        Commands::NewDatabase => {
            service.new_database()?;
            println!("New database created");
        }
    }

    Ok(())
}

/// Overlay a command-line value onto a calculator field when one was given.
fn overlay(field: &mut f64, value: Option<f64>) {
    if let Some(value) = value {
        *field = value;
    }
}

/// Parse the sort flag: asc, desc or recent.
fn parse_sort_order(input: &str) -> Result<SortOrder> {
    match input.to_lowercase().as_str() {
        "asc" => Ok(SortOrder::NameAsc),
        "desc" => Ok(SortOrder::NameDesc),
        "recent" | "" => Ok(SortOrder::Recent),
        other => Err(anyhow!("Unknown sort order: {other}. Use asc, desc or recent")),
    }
}

/// Parse a report kind by its wire name.
fn parse_report_kind(input: &str) -> Result<ReportKind> {
    match input {
        "clientsByStatus" => Ok(ReportKind::ClientsByStatus),
        "jobsByMaterial" => Ok(ReportKind::JobsByMaterial),
        "monthlyIncome" => Ok(ReportKind::MonthlyIncome),
        "profits" => Ok(ReportKind::Profits),
        other => Err(anyhow!(
            "Unknown report kind: {other}. Use clientsByStatus, jobsByMaterial, monthlyIncome or profits"
        )),
    }
}

/// Parse the declared kind of a linked file.
fn parse_file_kind(input: &str) -> Result<FileKind> {
    match input.to_lowercase().as_str() {
        "image" => Ok(FileKind::Image),
        "video" => Ok(FileKind::Video),
        "pdf" => Ok(FileKind::Pdf),
        "other" => Ok(FileKind::Other),
        other => Err(anyhow!("Unknown file kind: {other}. Use image, video, pdf or other")),
    }
}

/// Parse a `YYYY-MM` month argument.
fn parse_month(input: &str) -> Result<(i32, u32)> {
    let (year, month) = input
        .split_once('-')
        .ok_or_else(|| anyhow!("Invalid month: {input}. Use YYYY-MM"))?;
    let year: i32 = year
        .parse()
        .context("Invalid year in month argument, use YYYY-MM")?;
    let month: u32 = month
        .parse()
        .context("Invalid month in month argument, use YYYY-MM")?;
    if !(1..=12).contains(&month) {
        return Err(anyhow!("Month out of range: {month}"));
    }
    Ok((year, month))
}
