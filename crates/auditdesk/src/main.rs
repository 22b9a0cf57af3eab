//! `auditdesk` - CLI for the audit management API
//!
//! This binary searches the audit workspace, prints the findings trend, and
//! manages organizations.

#![warn(missing_debug_implementations)]
#![deny(unsafe_code)]

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use anyhow::Context;
use clap::Parser;
use tokio::io::{AsyncBufReadExt, BufReader};

use auditdesk::cli::{
    AuditsCommand, Cli, Command, ConfigCommand, OrgCommand, OutputFormat, SearchCommand,
    TrendCommand, WatchCommand,
};
use auditdesk::{
    bucketize_with, init_logging, ApiClient, Audit, Config, ConfirmDialog, EntitySource,
    Organization, OrganizationInput, SearchAggregator, SearchOutcome, SearchResult,
    SearchSession, ThemeState, TrendBucket, TrendEvent,
};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    init_logging(cli.verbosity());

    let Cli {
        config, command, ..
    } = cli;

    if let Command::Config(config_cmd) = command {
        return handle_config(config, config_cmd);
    }

    let config = Config::load_from(config).context("failed to load configuration")?;
    match command {
        Command::Search(cmd) => handle_search(&config, &cmd).await,
        Command::Watch(cmd) => handle_watch(&config, &cmd).await,
        Command::Trend(cmd) => handle_trend(&config, &cmd).await,
        Command::Audits(cmd) => handle_audits(&config, &cmd).await,
        Command::Org(cmd) => handle_org(&config, cmd).await,
        Command::Config(_) => Ok(()),
    }
}

fn aggregator(config: &Config) -> anyhow::Result<SearchAggregator<ApiClient>> {
    let client = ApiClient::new(&config.api)?;
    Ok(SearchAggregator::with_options(client, config.search_options()))
}

async fn handle_search(config: &Config, cmd: &SearchCommand) -> anyhow::Result<()> {
    let aggregator = aggregator(config)?;
    if !aggregator.options().accepts(&cmd.query) {
        eprintln!(
            "Query must be at least {} characters.",
            aggregator.options().min_query_length
        );
        return Ok(());
    }

    let results = aggregator.search(&cmd.query).await.context("search failed")?;
    print_results(&results, cmd.format)
}

async fn handle_watch(config: &Config, cmd: &WatchCommand) -> anyhow::Result<()> {
    let debounce = cmd
        .debounce_ms
        .map_or_else(|| config.debounce(), std::time::Duration::from_millis);
    let session = SearchSession::new(aggregator(config)?, debounce);

    let mut updates = session.subscribe();
    let format = cmd.format;
    let printer = tokio::spawn(async move {
        while updates.changed().await.is_ok() {
            let outcome = updates.borrow_and_update().clone();
            if let Err(e) = print_outcome(&outcome, format) {
                tracing::error!(error = %e, "failed to print search results");
            }
        }
    });

    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    while let Some(line) = lines.next_line().await? {
        session.input(line);
    }

    session.flush().await;
    drop(session);
    printer.await?;
    Ok(())
}

async fn handle_trend(config: &Config, cmd: &TrendCommand) -> anyhow::Result<()> {
    let client = ApiClient::new(&config.api)?;
    let findings = client
        .list_findings()
        .await
        .context("failed to list findings")?;

    let events: Vec<TrendEvent> = findings.iter().filter_map(TrendEvent::from_finding).collect();
    let mut options = config.trend_options();
    if let Some(days) = cmd.days {
        options.window_days = days;
    }
    let today = cmd
        .today
        .unwrap_or_else(|| chrono::Utc::now().date_naive());

    let buckets = bucketize_with(&events, today, &options);
    print_trend(&buckets, cmd.format)
}

async fn handle_audits(config: &Config, cmd: &AuditsCommand) -> anyhow::Result<()> {
    let client = ApiClient::new(&config.api)?;
    let audits = match cmd.project {
        Some(project_id) => client.list_audits_for_project(project_id).await,
        None => client.list_audits().await,
    }
    .context("failed to list audits")?;

    print_audits(&audits, cmd.format)
}

async fn handle_org(config: &Config, cmd: OrgCommand) -> anyhow::Result<()> {
    let client = ApiClient::new(&config.api)?;
    match cmd {
        OrgCommand::List { format } => {
            let organizations = client
                .list_organizations()
                .await
                .context("failed to list organizations")?;
            print_organizations(&organizations, format)?;
        }
        OrgCommand::Create(fields) => {
            let input = OrganizationInput::from(fields);
            let created = client
                .create_organization(&input)
                .await
                .context("failed to create organization")?;
            println!("Created organization #{}: {}", created.id, created.name);
        }
        OrgCommand::Update { id, fields } => {
            let input = OrganizationInput::from(fields);
            let updated = client
                .update_organization(id, &input)
                .await
                .with_context(|| format!("failed to update organization #{id}"))?;
            println!("Updated organization #{}: {}", updated.id, updated.name);
        }
        OrgCommand::Delete { id, yes } => {
            let confirmed = Arc::new(AtomicBool::new(false));
            let mut dialog = ConfirmDialog::new();
            let flag = Arc::clone(&confirmed);
            dialog.open(
                format!("Delete organization #{id}?"),
                move || flag.store(true, Ordering::SeqCst),
                Some("Delete"),
            );
            dialog.on_cancel(|| eprintln!("Cancelled."));

            if yes {
                dialog.confirm();
            } else {
                dialog.answer_from(std::io::stdin().lock(), std::io::stderr())?;
            }

            if confirmed.load(Ordering::SeqCst) {
                client
                    .delete_organization(id)
                    .await
                    .with_context(|| format!("failed to delete organization #{id}"))?;
                println!("Deleted organization #{id}.");
            }
        }
    }
    Ok(())
}

fn handle_config(path: Option<std::path::PathBuf>, cmd: ConfigCommand) -> anyhow::Result<()> {
    match cmd {
        ConfigCommand::Show { json } => {
            let config = Config::load_from(path)?;
            if json {
                println!("{}", serde_json::to_string_pretty(&config)?);
            } else {
                println!("Current Configuration");
                println!("=====================");
                println!();
                println!("[API]");
                println!("  Base URL:           {}", config.api.base_url);
                println!(
                    "  Token:              {}",
                    if config.api.token.is_some() { "set" } else { "not set" }
                );
                println!("  Timeout (s):        {}", config.api.timeout_secs);
                println!("  Connect timeout (s): {}", config.api.connect_timeout_secs);
                println!();
                println!("[Search]");
                println!("  Min query length:   {}", config.search.min_query_length);
                println!("  Max results:        {}", config.search.max_results);
                println!("  Debounce (ms):      {}", config.search.debounce_ms);
                println!();
                println!("[Trend]");
                println!("  Window (days):      {}", config.trend.window_days);
                println!("  Span (days):        {}", config.trend.span_days);
                println!();
                println!("[UI]");
                println!(
                    "  Theme:              {}",
                    ThemeState::new(config.ui.dark_theme).theme()
                );
            }
        }
        ConfigCommand::Path => {
            println!("{}", Config::default_config_path().display());
        }
        ConfigCommand::Validate { file } => {
            let path = file.or(path).unwrap_or_else(Config::default_config_path);
            println!("Validating configuration: {}", path.display());
            match Config::load_from(Some(path)) {
                Ok(_) => println!("Configuration is valid."),
                Err(e) => println!("Configuration error: {e}"),
            }
        }
    }
    Ok(())
}

fn print_results(results: &[SearchResult], format: OutputFormat) -> anyhow::Result<()> {
    match format {
        OutputFormat::Json => println!("{}", serde_json::to_string_pretty(results)?),
        OutputFormat::Plain => {
            for result in results {
                match &result.subtitle {
                    Some(subtitle) => println!(
                        "{} #{}: {} ({subtitle})",
                        result.kind, result.id, result.title
                    ),
                    None => println!("{} #{}: {}", result.kind, result.id, result.title),
                }
            }
        }
        OutputFormat::Table => {
            println!("{:<13} {:>6}  {:<40} {}", "KIND", "ID", "TITLE", "DETAIL");
            for result in results {
                println!(
                    "{:<13} {:>6}  {:<40} {}",
                    result.kind.to_string(),
                    result.id,
                    truncate(&result.title, 40),
                    result.subtitle.as_deref().unwrap_or("")
                );
            }
        }
    }
    if results.is_empty() && format != OutputFormat::Json {
        println!("No results found.");
    }
    Ok(())
}

fn print_outcome(outcome: &SearchOutcome, format: OutputFormat) -> anyhow::Result<()> {
    if format == OutputFormat::Json {
        println!("{}", serde_json::to_string(outcome)?);
        return Ok(());
    }

    println!("> {}", outcome.query);
    if let Some(error) = &outcome.error {
        println!("Search failed: {error}");
        return Ok(());
    }
    print_results(&outcome.results, format)
}

fn print_trend(buckets: &[TrendBucket], format: OutputFormat) -> anyhow::Result<()> {
    match format {
        OutputFormat::Json => println!("{}", serde_json::to_string_pretty(buckets)?),
        OutputFormat::Plain => {
            for bucket in buckets {
                println!(
                    "{} critical={} high={} medium={} low={} total={}",
                    bucket.date, bucket.critical, bucket.high, bucket.medium, bucket.low,
                    bucket.total
                );
            }
        }
        OutputFormat::Table => {
            println!(
                "{:<8} {:>8} {:>6} {:>6} {:>6} {:>6}",
                "DAY", "CRITICAL", "HIGH", "MEDIUM", "LOW", "TOTAL"
            );
            for bucket in buckets {
                println!(
                    "{:<8} {:>8} {:>6} {:>6} {:>6} {:>6}",
                    bucket.short_label(),
                    bucket.critical,
                    bucket.high,
                    bucket.medium,
                    bucket.low,
                    bucket.total
                );
            }
        }
    }
    Ok(())
}

fn print_audits(audits: &[Audit], format: OutputFormat) -> anyhow::Result<()> {
    match format {
        OutputFormat::Json => println!("{}", serde_json::to_string_pretty(audits)?),
        OutputFormat::Plain => {
            for audit in audits {
                println!("audit #{}: {} ({})", audit.id, audit.name, audit.standard);
            }
        }
        OutputFormat::Table => {
            println!("{:>6}  {:<40} {:<16} {}", "ID", "NAME", "STANDARD", "PROJECT");
            for audit in audits {
                println!(
                    "{:>6}  {:<40} {:<16} {}",
                    audit.id,
                    truncate(&audit.name, 40),
                    audit.standard,
                    audit.project_id.map(|id| id.to_string()).unwrap_or_default()
                );
            }
        }
    }
    if audits.is_empty() && format != OutputFormat::Json {
        println!("No audits found.");
    }
    Ok(())
}

fn print_organizations(organizations: &[Organization], format: OutputFormat) -> anyhow::Result<()> {
    let status = |org: &Organization| match org.is_active {
        Some(true) => "active",
        Some(false) => "inactive",
        None => "",
    };

    match format {
        OutputFormat::Json => println!("{}", serde_json::to_string_pretty(organizations)?),
        OutputFormat::Plain => {
            for org in organizations {
                println!("organization #{}: {} {}", org.id, org.name, status(org));
            }
        }
        OutputFormat::Table => {
            println!("{:>6}  {:<40} {}", "ID", "NAME", "STATUS");
            for org in organizations {
                println!("{:>6}  {:<40} {}", org.id, truncate(&org.name, 40), status(org));
            }
        }
    }
    if organizations.is_empty() && format != OutputFormat::Json {
        println!("No organizations found.");
    }
    Ok(())
}

fn truncate(text: &str, max: usize) -> String {
    if text.chars().count() <= max {
        text.to_string()
    } else {
        let mut cut: String = text.chars().take(max.saturating_sub(1)).collect();
        cut.push('…');
        cut
    }
}
