#![deny(unsafe_code)]

//! Toolshelf CLI: browse the catalog, ask the assistant, run the relay.

use std::io::Write;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use tokio::io::{AsyncBufRead, AsyncBufReadExt, BufReader};
use tracing::info;
use tracing_subscriber::EnvFilter;

use toolshelf_config::AppConfig;
use toolshelf_core::catalog::{ALL_CATEGORIES, Catalog, validate_dir};
use toolshelf_core::chat::{
    ChatMessage, ChatOrchestrator, GREETING, ModelPreference, Notice, Session, initial_preference,
};
use toolshelf_core::guides::{self, DocKind, DocRef};
use toolshelf_core::match_query;
use toolshelf_core::relay::{self, RelayState};
use toolshelf_core::secrets::CredentialStore;

/// Toolshelf: a catalog of developer tools with a chat assistant.
#[derive(Parser, Debug)]
#[command(name = "toolshelf", version, about, long_about = None)]
struct Cli {
    /// Path to configuration file.
    #[arg(short, long, default_value = "toolshelf.toml")]
    config: PathBuf,

    /// Increase log verbosity (-v, -vv).
    #[arg(short, long, action = clap::ArgAction::Count)]
    verbose: u8,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug, PartialEq)]
enum Commands {
    /// Run the chat relay.
    Serve,

    /// Browse the catalog.
    Search {
        /// Only tools in this category.
        #[arg(long, default_value = ALL_CATEGORIES)]
        category: String,

        /// Text to look for in names, descriptions and tags.
        query: Option<String>,
    },

    /// List catalog categories.
    Categories,

    /// Show one tool by id.
    Show { id: String },

    /// Show the tools, guides and examples matched for a question.
    Match { query: String },

    /// List guides, or show where one guide lives.
    Guides { slug: Option<String> },

    /// List example projects, or show where one lives.
    Examples { slug: Option<String> },

    /// Ask the assistant. Without a message, starts an interactive chat.
    Chat {
        /// Model preference (auto, gemini, deepseek, gpt_oss).
        #[arg(long)]
        model: Option<String>,

        message: Option<String>,
    },

    /// List selectable models.
    Models,

    /// Manage the stored OpenRouter API key.
    Key {
        #[command(subcommand)]
        action: KeyAction,
    },

    /// Render the catalog as a markdown listing.
    Readme {
        /// Write to this file instead of stdout.
        #[arg(short, long)]
        output: Option<PathBuf>,
    },

    /// Check catalog data files.
    Validate {
        /// Directory to check. Defaults to `catalog.data_dir`.
        dir: Option<PathBuf>,
    },

    /// Validate and display configuration.
    Config {
        /// Show the resolved configuration.
        #[arg(long)]
        show: bool,
    },
}

#[derive(Subcommand, Debug, PartialEq)]
enum KeyAction {
    /// Save a key. Chat then talks to OpenRouter directly.
    Set { key: String },

    /// Remove the stored key. Chat goes back through the relay.
    Clear,

    /// Show whether a key is stored.
    Status,
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    let (config, found) = load_config(&cli.config).await?;

    let filter = match cli.verbose {
        0 => config.logging.level.as_str(),
        1 => "debug",
        _ => "trace",
    };
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(filter)),
        )
        .init();
    if !found {
        info!(path = %cli.config.display(), "Config file not found, using defaults");
    }

    match cli.command {
        Commands::Serve => cmd_serve(&config).await?,
        Commands::Search { category, query } => {
            cmd_search(&config, &category, query.as_deref().unwrap_or_default()).await?
        }
        Commands::Categories => cmd_categories(&config).await?,
        Commands::Show { id } => cmd_show(&config, &id).await?,
        Commands::Match { query } => cmd_match(&config, &query).await?,
        Commands::Guides { slug } => {
            cmd_docs(DocKind::Guide, slug.as_deref(), &config.catalog.guides_base_url)?
        }
        Commands::Examples { slug } => {
            cmd_docs(DocKind::Example, slug.as_deref(), &config.catalog.examples_base_url)?
        }
        Commands::Chat { model, message } => {
            cmd_chat(&config, model.as_deref(), message.as_deref()).await?
        }
        Commands::Models => cmd_models(&config),
        Commands::Key { action } => cmd_key(&config, action).await?,
        Commands::Readme { output } => cmd_readme(&config, output.as_deref()).await?,
        Commands::Validate { dir } => {
            let dir = dir.unwrap_or_else(|| PathBuf::from(&config.catalog.data_dir));
            cmd_validate(&dir).await?
        }
        Commands::Config { show } => cmd_config(&cli.config, &config, show)?,
    }

    Ok(())
}

async fn cmd_serve(config: &AppConfig) -> Result<()> {
    info!("Starting Toolshelf relay");
    let state = Arc::new(RelayState::from_config(config));
    relay::serve(config, state, async {
        let _ = tokio::signal::ctrl_c().await;
    })
    .await?;
    Ok(())
}

async fn cmd_search(config: &AppConfig, category: &str, query: &str) -> Result<()> {
    let catalog = load_catalog(config).await?;
    let tools = catalog.filter(category, query);
    if tools.is_empty() {
        println!("No tools found.");
        return Ok(());
    }
    for tool in tools {
        println!(
            "{:<20} {:<14} {:<9} {}",
            tool.name, tool.category, tool.status, tool.link
        );
    }
    Ok(())
}

async fn cmd_categories(config: &AppConfig) -> Result<()> {
    let catalog = load_catalog(config).await?;
    for category in catalog.categories() {
        println!("{category}");
    }
    Ok(())
}

async fn cmd_match(config: &AppConfig, query: &str) -> Result<()> {
    let catalog = load_catalog(config).await?;
    let result = match_query(query, &catalog);

    println!("Experience level: {}", result.level);
    println!("Tools:");
    for m in &result.tools {
        println!("  {:>3}  {} ({})", m.score, m.tool.name, m.tool.category);
    }
    println!("Guides:");
    for file in &result.guides {
        println!("  {file}");
    }
    println!("Example projects:");
    for file in &result.examples {
        println!("  {file}");
    }
    Ok(())
}

async fn cmd_show(config: &AppConfig, id: &str) -> Result<()> {
    let catalog = load_catalog(config).await?;
    let Some(tool) = catalog.get(id) else {
        anyhow::bail!("no tool with id '{id}'");
    };
    println!("{} ({})", tool.name, tool.category);
    println!("{}", tool.description);
    println!("Status: {}", tool.status);
    println!("Link:   {}", tool.link);
    if let Some(tutorial) = &tool.tutorial {
        println!("Docs:   {tutorial}");
    }
    if !tool.tags.is_empty() {
        println!("Tags:   {}", tool.tags.join(", "));
    }
    Ok(())
}

fn cmd_docs(kind: DocKind, slug: Option<&str>, base_url: &str) -> Result<()> {
    let Some(slug) = slug else {
        let docs: Box<dyn Iterator<Item = DocRef>> = match kind {
            DocKind::Guide => Box::new(guides::guides()),
            DocKind::Example => Box::new(guides::examples()),
        };
        for doc in docs {
            println!("{:<32} {}", doc.slug(), doc.url(base_url));
        }
        return Ok(());
    };
    match guides::find(kind, slug) {
        Some(doc) => {
            println!("{}", doc.url(base_url));
            Ok(())
        }
        None => {
            let noun = match kind {
                DocKind::Guide => "guide",
                DocKind::Example => "example project",
            };
            anyhow::bail!("no {noun} named '{slug}'")
        }
    }
}

async fn cmd_chat(config: &AppConfig, model: Option<&str>, message: Option<&str>) -> Result<()> {
    let catalog = Arc::new(load_catalog(config).await?);
    let preference = model
        .map(ModelPreference::parse)
        .unwrap_or_else(|| initial_preference(config));
    let store = credential_store(config);
    let session = Session::open(&store, preference)
        .await
        .map_err(|e| anyhow::anyhow!(Notice::for_credential_error(&e)))?;

    let orchestrator = ChatOrchestrator::from_config(catalog, config);
    let Some(message) = message else {
        let stdin = BufReader::new(tokio::io::stdin());
        return chat_loop(&orchestrator, &session, stdin, &mut std::io::stdout()).await;
    };
    match orchestrator.send_turn(&session, message).await {
        Ok(reply) => {
            println!("{}", reply.content);
            Ok(())
        }
        Err(err) => match err.notice() {
            Some(notice) => anyhow::bail!("{notice}"),
            None => anyhow::bail!("{err}"),
        },
    }
}

/// Interactive chat on one session, one message per input line.
///
/// `/model <key>` switches the model preference and `/quit` ends the chat,
/// as does end of input. A failed turn prints its notice and the loop goes on.
async fn chat_loop<R, W>(
    orchestrator: &ChatOrchestrator,
    session: &Session,
    input: R,
    out: &mut W,
) -> Result<()>
where
    R: AsyncBufRead + Unpin,
    W: Write,
{
    writeln!(out, "{GREETING}")?;
    writeln!(out, "Type /model <key> to switch models and /quit to leave.")?;

    let mut lines = input.lines();
    while let Some(line) = lines.next_line().await? {
        let line = line.trim();
        if line.is_empty() {
            continue;
        }
        if line == "/quit" || line == "/exit" {
            break;
        }
        if let Some(key) = line.strip_prefix("/model") {
            if !key.trim().is_empty() {
                session.set_preference(ModelPreference::parse(key));
            }
            writeln!(out, "Model: {}", session.preference().label())?;
            continue;
        }

        match orchestrator.send_turn(session, line).await {
            Ok(reply) => writeln!(out, "[{}] {}", reply_label(&reply), reply.content)?,
            Err(err) => match err.notice() {
                Some(notice) => writeln!(out, "{notice}")?,
                None => writeln!(out, "{err}")?,
            },
        }
        out.flush()?;
    }
    Ok(())
}

fn reply_label(reply: &ChatMessage) -> &'static str {
    reply.model.map_or("Assistant", |model| model.label())
}

fn cmd_models(config: &AppConfig) {
    let current = initial_preference(config);
    for preference in ModelPreference::all() {
        let marker = if preference == current { "*" } else { " " };
        println!("{marker} {:<10} {}", preference.key(), preference.label());
    }
}

async fn cmd_key(config: &AppConfig, action: KeyAction) -> Result<()> {
    let store = credential_store(config);
    match action {
        KeyAction::Set { key } => {
            store
                .save(&key)
                .await
                .map_err(|e| anyhow::anyhow!(Notice::for_credential_error(&e)))?;
            println!("{}", Notice::key_saved());
        }
        KeyAction::Clear => {
            store
                .clear()
                .await
                .map_err(|e| anyhow::anyhow!(Notice::for_credential_error(&e)))?;
            println!("{}", Notice::key_cleared());
        }
        KeyAction::Status => match store.load().await? {
            Some(key) => println!(
                "Using your OpenRouter key {} ({})",
                key.masked(),
                store.path().display()
            ),
            None => println!("No key stored. Chat goes through the relay."),
        },
    }
    Ok(())
}

async fn cmd_validate(dir: &Path) -> Result<()> {
    let reports = validate_dir(dir).await?;
    let mut failed = 0;
    for report in &reports {
        if report.is_valid() {
            println!("ok    {}", report.path.display());
            continue;
        }
        failed += 1;
        println!("FAIL  {}", report.path.display());
        for issue in &report.issues {
            println!("      {issue}");
        }
    }
    if failed > 0 {
        anyhow::bail!("{failed} of {} catalog file(s) failed validation", reports.len());
    }
    println!("{} catalog file(s) valid.", reports.len());
    Ok(())
}

async fn cmd_readme(config: &AppConfig, output: Option<&Path>) -> Result<()> {
    let catalog = load_catalog(config).await?;
    let markdown = catalog.render_markdown("Toolshelf");
    match output {
        Some(path) => {
            tokio::fs::write(path, markdown)
                .await
                .with_context(|| format!("failed to write {}", path.display()))?;
            println!("Wrote {} tools to {}", catalog.len(), path.display());
        }
        None => print!("{markdown}"),
    }
    Ok(())
}

fn cmd_config(config_path: &Path, config: &AppConfig, show: bool) -> Result<()> {
    if show {
        let toml_str = toml::to_string_pretty(config).context("failed to render config")?;
        println!("{toml_str}");
    } else {
        println!("Configuration at '{}' is valid.", config_path.display());
    }
    Ok(())
}

/// Load the config file, or defaults when it does not exist. The flag tells
/// whether the file was found.
async fn load_config(path: &Path) -> Result<(AppConfig, bool)> {
    if path.exists() {
        let config = AppConfig::load(path)
            .await
            .with_context(|| format!("failed to load {}", path.display()))?;
        Ok((config, true))
    } else {
        Ok((AppConfig::default(), false))
    }
}

async fn load_catalog(config: &AppConfig) -> Result<Catalog> {
    Ok(Catalog::load_dir(Path::new(&config.catalog.data_dir)).await?)
}

fn credential_store(config: &AppConfig) -> CredentialStore {
    CredentialStore::new(&config.credentials.path)
}
