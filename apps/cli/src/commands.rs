//! CLI command definitions, routing, and tracing setup.

use std::path::{Path, PathBuf};

use clap::{Parser, Subcommand};
use color_eyre::eyre::{Result, eyre};
use indicatif::{ProgressBar, ProgressStyle};
use leadkit_clients::{GenderizeClient, WorkflowClient};
use leadkit_core::{ImportProgress, bulk_import};
use leadkit_ingest::{CsvLead, is_valid_email, is_valid_gender, normalize_gender, valid_inputs};
use leadkit_shared::{
    AppConfig, ImportResult, Lead, LeadError, LeadId, LeadInput, LeadUpdate, init_config,
    load_config,
};
use leadkit_storage::Storage;
use tracing::info;

// ---------------------------------------------------------------------------
// CLI structure
// ---------------------------------------------------------------------------

/// Import, deduplicate, and enrich sales leads.
#[derive(Parser)]
#[command(
    name = "leadkit",
    version,
    about = "Import lead spreadsheets into a local database and enrich them.",
    long_about = None,
)]
pub(crate) struct Cli {
    /// Log format: text (default) or json.
    #[arg(long, default_value = "text", global = true)]
    pub log_format: LogFormat,

    /// Verbosity level (-v, -vv, -vvv).
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    pub verbose: u8,

    #[command(subcommand)]
    pub command: Command,
}

/// Log output format.
#[derive(Clone, Debug, clap::ValueEnum)]
pub(crate) enum LogFormat {
    Text,
    Json,
}

/// Top-level CLI subcommands.
#[derive(Subcommand)]
pub(crate) enum Command {
    /// Parse a CSV file, report every row, and import the valid ones.
    Import {
        /// CSV file with a header row.
        file: PathBuf,

        /// Only parse and report; do not touch the database.
        #[arg(long)]
        dry_run: bool,

        /// Print the parsed rows and import summary as JSON.
        #[arg(long)]
        json: bool,
    },

    /// Add a single lead.
    Add {
        #[arg(long)]
        first_name: String,

        #[arg(long)]
        last_name: String,

        #[arg(long)]
        email: String,

        #[arg(long)]
        job_title: Option<String>,

        /// ISO country code.
        #[arg(long)]
        country_code: Option<String>,

        #[arg(long)]
        company_name: Option<String>,

        /// male, female, unknown, m, f, or u.
        #[arg(long)]
        gender: Option<String>,
    },

    /// List all stored leads.
    List {
        /// Print leads as JSON.
        #[arg(long)]
        json: bool,
    },

    /// Show one lead as JSON.
    Show { id: LeadId },

    /// Change a lead's first name and/or email.
    Update {
        id: LeadId,

        #[arg(long)]
        first_name: Option<String>,

        #[arg(long)]
        email: Option<String>,
    },

    /// Delete one or more leads.
    Delete {
        #[arg(required = true)]
        ids: Vec<LeadId>,
    },

    /// Infer each lead's gender from its first name.
    GuessGenders {
        #[arg(required = true)]
        ids: Vec<LeadId>,

        #[arg(long)]
        json: bool,
    },

    /// Run the email-verification workflow for each lead.
    VerifyEmails {
        #[arg(required = true)]
        ids: Vec<LeadId>,

        #[arg(long)]
        json: bool,
    },

    /// Render an outreach message for each lead.
    GenerateMessages {
        /// Message template with `{{firstName}}`-style placeholders.
        #[arg(short, long)]
        template: String,

        #[arg(required = true)]
        ids: Vec<LeadId>,

        #[arg(long)]
        json: bool,
    },

    /// Configuration management.
    Config {
        /// Config subcommand.
        #[command(subcommand)]
        action: ConfigAction,
    },
}

/// Config subcommands.
#[derive(Subcommand)]
pub(crate) enum ConfigAction {
    /// Initialize config file with defaults.
    Init,
    /// Show resolved configuration.
    Show,
}

// ---------------------------------------------------------------------------
// Tracing setup
// ---------------------------------------------------------------------------

/// Initialize tracing based on CLI flags.
pub(crate) fn init_tracing(cli: &Cli) {
    use tracing_subscriber::{EnvFilter, fmt};

    let filter = match cli.verbose {
        0 => "leadkit=info",
        1 => "leadkit=debug",
        _ => "leadkit=trace",
    };

    let env_filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(filter));

    match cli.log_format {
        LogFormat::Text => {
            fmt()
                .with_env_filter(env_filter)
                .with_target(false)
                .with_writer(std::io::stderr)
                .init();
        }
        LogFormat::Json => {
            fmt()
                .json()
                .with_env_filter(env_filter)
                .with_writer(std::io::stderr)
                .init();
        }
    }
}

// ---------------------------------------------------------------------------
// Command dispatch
// ---------------------------------------------------------------------------

/// Run the CLI command.
pub(crate) async fn run(cli: Cli) -> Result<()> {
    match cli.command {
        Command::Import {
            file,
            dry_run,
            json,
        } => cmd_import(&file, dry_run, json).await,
        Command::Add {
            first_name,
            last_name,
            email,
            job_title,
            country_code,
            company_name,
            gender,
        } => {
            let input = LeadInput {
                first_name: Some(first_name),
                last_name: Some(last_name),
                email: Some(email),
                job_title,
                country_code,
                company_name,
                gender,
            };
            cmd_add(input).await
        }
        Command::List { json } => cmd_list(json).await,
        Command::Show { id } => cmd_show(id).await,
        Command::Update {
            id,
            first_name,
            email,
        } => cmd_update(id, LeadUpdate { first_name, email }).await,
        Command::Delete { ids } => cmd_delete(&ids).await,
        Command::GuessGenders { ids, json } => cmd_guess_genders(&ids, json).await,
        Command::VerifyEmails { ids, json } => cmd_verify_emails(&ids, json).await,
        Command::GenerateMessages {
            template,
            ids,
            json,
        } => cmd_generate_messages(&template, &ids, json).await,
        Command::Config { action } => match action {
            ConfigAction::Init => cmd_config_init().await,
            ConfigAction::Show => cmd_config_show().await,
        },
    }
}

/// Open the configured database for writing, creating it if needed.
async fn open_storage(config: &AppConfig) -> Result<Storage> {
    let path = config.database_path()?;
    Ok(Storage::open(&path).await?)
}

/// Open the configured database for reading. It must already exist.
async fn open_storage_readonly(config: &AppConfig) -> Result<Storage> {
    let path = config.database_path()?;
    if !path.exists() {
        return Err(eyre!(
            "no lead database at '{}': run `leadkit import` or `leadkit add` first",
            path.display()
        ));
    }
    Ok(Storage::open_readonly(&path).await?)
}

// ---------------------------------------------------------------------------
// Import
// ---------------------------------------------------------------------------

async fn cmd_import(file: &Path, dry_run: bool, json: bool) -> Result<()> {
    let content = std::fs::read_to_string(file)
        .map_err(|e| eyre!("cannot read '{}': {e}", file.display()))?;

    let leads = leadkit_ingest::parse_csv(&content)?;
    let inputs = valid_inputs(&leads);

    info!(
        file = %file.display(),
        rows = leads.len(),
        valid = inputs.len(),
        dry_run,
        "parsed CSV"
    );

    let result = if dry_run || inputs.is_empty() {
        None
    } else {
        let config = load_config()?;
        let storage = open_storage(&config).await?;
        let progress = CliProgress::new();
        Some(bulk_import(&storage, &inputs, &progress).await?)
    };

    if json {
        let output = serde_json::json!({ "leads": leads, "result": result });
        println!("{}", serde_json::to_string_pretty(&output)?);
        return Ok(());
    }

    println!();
    println!("{}", report_header());
    for lead in &leads {
        println!("{}", report_line(lead));
    }
    println!();
    println!(
        "  {} rows, {} valid, {} invalid",
        leads.len(),
        inputs.len(),
        leads.len() - inputs.len()
    );

    match result {
        Some(result) => print_import_result(&result),
        None if dry_run => println!("  Dry run: nothing imported."),
        None => println!("  No valid rows to import."),
    }
    println!();

    Ok(())
}

fn report_header() -> String {
    format!(
        "  {:>5}  {:<7}  {:<28}  {:<32}  {}",
        "ROW", "STATUS", "NAME", "EMAIL", "ERRORS"
    )
}

/// One row of the per-row import report.
fn report_line(lead: &CsvLead) -> String {
    let name = format!("{} {}", lead.first_name, lead.last_name);
    let status = if lead.is_valid { "ok" } else { "invalid" };
    format!(
        "  {:>5}  {:<7}  {:<28}  {:<32}  {}",
        lead.row_index,
        status,
        name.trim(),
        lead.email,
        lead.errors.join("; ")
    )
}

fn print_import_result(result: &ImportResult) {
    println!();
    println!("  Import complete!");
    println!("  Imported:   {}", result.imported_count);
    println!("  Duplicates: {}", result.duplicates_skipped);
    println!("  Invalid:    {}", result.invalid_leads);
    println!("  Failed:     {}", result.errors.len());
    for failure in &result.errors {
        println!(
            "    - {} {}: {}",
            failure.lead.first_name.as_deref().unwrap_or_default(),
            failure.lead.last_name.as_deref().unwrap_or_default(),
            failure.error
        );
    }
}

// ---------------------------------------------------------------------------
// CLI progress reporter
// ---------------------------------------------------------------------------

/// CLI progress reporter using an indicatif spinner.
struct CliProgress {
    spinner: ProgressBar,
}

impl CliProgress {
    fn new() -> Self {
        let spinner = ProgressBar::new_spinner();
        spinner.set_style(
            ProgressStyle::with_template("{spinner:.cyan} {msg}")
                .expect("spinner template")
                .tick_strings(&["⠋", "⠙", "⠹", "⠸", "⠼", "⠴", "⠦", "⠧", "⠇", "⠏"]),
        );
        spinner.enable_steady_tick(std::time::Duration::from_millis(80));
        spinner.set_message("Checking for duplicates");
        Self { spinner }
    }
}

impl ImportProgress for CliProgress {
    fn started(&self, total: usize) {
        self.spinner.set_message(format!("Importing {total} leads"));
    }

    fn lead_processed(&self, current: usize, total: usize, name: &str) {
        self.spinner
            .set_message(format!("Importing [{current}/{total}] {name}"));
    }

    fn done(&self, _result: &ImportResult) {
        self.spinner.finish_and_clear();
    }
}

// ---------------------------------------------------------------------------
// Lead records
// ---------------------------------------------------------------------------

async fn cmd_add(mut input: LeadInput) -> Result<()> {
    if let Some(gender) = input.gender.as_deref().map(str::trim) {
        if !gender.is_empty() {
            if !is_valid_gender(gender) {
                return Err(eyre!("{}", leadkit_ingest::validator::GENDER_INVALID));
            }
            input.gender = Some(normalize_gender(gender));
        }
    }

    let lead = input
        .to_new_lead()
        .ok_or_else(|| eyre!("firstName, lastName, and email are required"))?;
    if !is_valid_email(&lead.email) {
        return Err(eyre!("invalid email format: '{}'", lead.email));
    }

    let config = load_config()?;
    let storage = open_storage(&config).await?;
    let created = storage.insert_lead(&lead).await?;

    info!(id = created.id, "lead added");
    println!("{}", serde_json::to_string_pretty(&created)?);
    Ok(())
}

async fn cmd_list(json: bool) -> Result<()> {
    let config = load_config()?;
    let storage = open_storage_readonly(&config).await?;
    let leads = storage.list_leads().await?;

    if json {
        println!("{}", serde_json::to_string_pretty(&leads)?);
        return Ok(());
    }

    if leads.is_empty() {
        println!("No leads stored.");
        return Ok(());
    }

    println!(
        "  {:>5}  {:<28}  {:<32}  {:<8}  {}",
        "ID", "NAME", "EMAIL", "GENDER", "VERIFIED"
    );
    for lead in &leads {
        println!("{}", lead_line(lead));
    }
    println!();
    println!("  {} leads", leads.len());
    Ok(())
}

fn lead_line(lead: &Lead) -> String {
    let verified = match lead.email_verified {
        Some(true) => "yes",
        Some(false) => "no",
        None => "-",
    };
    format!(
        "  {:>5}  {:<28}  {:<32}  {:<8}  {}",
        lead.id,
        lead.display_name(),
        lead.email,
        lead.gender.as_deref().unwrap_or("-"),
        verified
    )
}

async fn cmd_show(id: LeadId) -> Result<()> {
    let config = load_config()?;
    let storage = open_storage_readonly(&config).await?;
    let lead = storage
        .get_lead(id)
        .await?
        .ok_or_else(|| eyre!("lead {id} not found"))?;
    println!("{}", serde_json::to_string_pretty(&lead)?);
    Ok(())
}

async fn cmd_update(id: LeadId, update: LeadUpdate) -> Result<()> {
    if update.first_name.is_none() && update.email.is_none() {
        return Err(eyre!("nothing to update: pass --first-name and/or --email"));
    }
    if update
        .first_name
        .as_deref()
        .is_some_and(|f| f.trim().is_empty())
    {
        return Err(eyre!("first name cannot be blank"));
    }
    if let Some(email) = update.email.as_deref() {
        if !is_valid_email(email.trim()) {
            return Err(eyre!("invalid email format: '{email}'"));
        }
    }

    let config = load_config()?;
    let storage = open_storage(&config).await?;
    let lead = storage.update_lead(id, &update).await?;

    info!(id, "lead updated");
    println!("{}", serde_json::to_string_pretty(&lead)?);
    Ok(())
}

async fn cmd_delete(ids: &[LeadId]) -> Result<()> {
    let config = load_config()?;
    let storage = open_storage(&config).await?;

    if let [id] = ids {
        if !storage.delete_lead(*id).await? {
            return Err(eyre!("lead {id} not found"));
        }
        println!("Deleted lead {id}.");
        return Ok(());
    }

    let deleted = storage.delete_leads(ids).await?;
    info!(requested = ids.len(), deleted, "leads deleted");
    println!("Deleted {deleted} of {} leads.", ids.len());
    Ok(())
}

// ---------------------------------------------------------------------------
// Enrichment
// ---------------------------------------------------------------------------

async fn cmd_guess_genders(ids: &[LeadId], json: bool) -> Result<()> {
    let config = load_config()?;
    let storage = open_storage(&config).await?;
    let lookup = GenderizeClient::new(&config.genderize)?;

    let result = leadkit_core::guess_genders(&storage, &lookup, ids).await?;

    if json {
        println!("{}", serde_json::to_string_pretty(&result)?);
    } else {
        println!("Guessed gender for {} leads.", result.updated_count);
        print_lead_errors(&result.errors);
    }
    Ok(())
}

async fn cmd_verify_emails(ids: &[LeadId], json: bool) -> Result<()> {
    let config = load_config()?;
    let storage = open_storage(&config).await?;
    let verifier = WorkflowClient::new(&config.verification)?;

    let result = leadkit_core::verify_emails(&storage, &verifier, ids).await?;

    if json {
        println!("{}", serde_json::to_string_pretty(&result)?);
    } else {
        println!("Verified {} emails.", result.verified_count);
        for outcome in &result.results {
            let verdict = if outcome.email_verified {
                "valid"
            } else {
                "invalid"
            };
            println!("  lead {:>5}: {verdict}", outcome.lead_id);
        }
        print_lead_errors(&result.errors);
    }
    Ok(())
}

async fn cmd_generate_messages(template: &str, ids: &[LeadId], json: bool) -> Result<()> {
    let config = load_config()?;
    let storage = open_storage(&config).await?;

    let result = leadkit_core::generate_messages(&storage, template, ids).await?;

    if json {
        println!("{}", serde_json::to_string_pretty(&result)?);
    } else {
        println!("Generated {} messages.", result.generated_count);
        print_lead_errors(&result.errors);
    }
    Ok(())
}

fn print_lead_errors(errors: &[LeadError]) {
    if errors.is_empty() {
        return;
    }
    println!("{} failed:", errors.len());
    for e in errors {
        println!("  - [{}] {}: {}", e.lead_id, e.lead_name, e.error);
    }
}

// ---------------------------------------------------------------------------
// Config
// ---------------------------------------------------------------------------

async fn cmd_config_init() -> Result<()> {
    let path = init_config()?;
    println!("Config initialized at: {}", path.display());
    Ok(())
}

async fn cmd_config_show() -> Result<()> {
    let config: AppConfig = load_config()?;
    let toml_str = toml::to_string_pretty(&config)?;
    println!("{toml_str}");
    Ok(())
}
