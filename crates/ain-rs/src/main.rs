//! Compose prompt blocks, analyze them and draft proposals from the terminal.
//!
//! State lives in `.ain/` (override with `--state-dir` or `AIN_STATE_DIR`).
//! The proposal API defaults to `http://127.0.0.1:8000` (override with
//! `--api-url` or `AIN_API_URL`).
//!
//! # Examples
//!
//! ```sh
//! # Build up a prompt
//! ain add "Background: clinics still book visits by phone"
//! ain add "We need online booking and SMS reminders"
//! ain list
//!
//! # Analyze and reorder
//! ain quality
//! ain suggest --apply logical-flow
//!
//! # Start from a template instead
//! ain templates --category ai-assistant
//! ain use-template ai-chatbot
//!
//! # Send the enhanced prompt to the backend
//! ain run-prompt
//! ain proposal --purpose "Clinic booking" --budget 800000 --out proposals/
//! ```

use ain_rs::analysis::SuggestionKind;
use ain_rs::config::{API_URL_ENV, ComposerConfig};
use ain_rs::export::{self, FsSink};
use ain_rs::proposal::{extract_duration_months, split_proposal_into_sections};
use ain_rs::templates::{self, TemplateCategory};
use ain_rs::workspace::Workspace;
use ain_rs::{
    AinError, Language, ProposalClient, RefinementKind, RefinementRequest, Result, UserPayload,
};
use clap::{Args, Parser, Subcommand};
use std::path::PathBuf;
use std::process;
use std::time::Duration;
use tracing_subscriber::EnvFilter;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;

const NOTHING_TO_SEND: &str = "Nothing to send";

/// Compose prompt blocks, analyze them and draft proposals.
#[derive(Parser)]
#[command(name = "ain", version)]
struct Cli {
    /// Directory holding the persisted workspace
    #[arg(long, global = true)]
    state_dir: Option<PathBuf>,

    /// Base URL of the proposal API
    #[arg(long, global = true)]
    api_url: Option<String>,

    /// Skip the simulated analysis and compression delays
    #[arg(long, global = true)]
    no_delay: bool,

    /// HTTP timeout in seconds (default: none)
    #[arg(long, global = true)]
    timeout: Option<u64>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    // ── Blocks ─────────────────────────────────────────────────
    /// Add a text block
    Add { content: String },

    /// List blocks in priority order
    List {
        /// Only show blocks containing this text
        #[arg(long)]
        filter: Option<String>,
    },

    /// Replace the content of a block
    Edit { id: String, content: String },

    /// Delete a block
    Delete { id: String },

    /// Move a block to the position of another one
    Move { dragged: String, target: String },

    /// Delete every block
    Clear,

    /// Replace all blocks with a JSON export
    Import { file: PathBuf },

    /// Write blocks to prompt-blocks.json
    Export {
        #[arg(long, default_value = ".")]
        dir: PathBuf,
    },

    // ── Analysis ───────────────────────────────────────────────
    /// Print the 0-100 quality score with hints
    Score,

    /// Print the four-metric quality analysis
    Quality,

    /// Compute reorder suggestions
    Suggest {
        /// Apply the suggestion with this id (context-first, logical-flow,
        /// priority-based)
        #[arg(long)]
        apply: Option<SuggestionKind>,
    },

    /// Print the assembled prompt
    Assemble {
        /// First-sentence summary of each block
        #[arg(long, conflicts_with = "enhanced")]
        compress: bool,

        /// Wrap with the project context header
        #[arg(long)]
        enhanced: bool,
    },

    // ── Templates ──────────────────────────────────────────────
    /// List built-in templates
    Templates {
        #[arg(long)]
        search: Option<String>,

        #[arg(long)]
        category: Option<TemplateCategory>,
    },

    /// Replace all blocks with a template's blocks
    UseTemplate { id: String },

    // ── Settings ───────────────────────────────────────────────
    /// Show or change settings
    Settings {
        /// Interface language (en, ja)
        #[arg(long)]
        language: Option<Language>,

        /// Development time budget in months (1-18)
        #[arg(long)]
        dev_time: Option<u32>,
    },

    // ── Proposal API ───────────────────────────────────────────
    /// Short analysis of the project purpose
    Analyze(ProjectArgs),

    /// Generate a full proposal
    Proposal {
        #[command(flatten)]
        project: ProjectArgs,

        /// Save the proposal as markdown into this directory
        #[arg(long)]
        out: Option<PathBuf>,
    },

    /// Refine an existing proposal
    Refine {
        #[command(flatten)]
        project: ProjectArgs,

        /// Markdown file with the current proposal
        #[arg(long)]
        proposal: PathBuf,

        /// What to change or ask
        #[arg(long)]
        request: String,
    },

    /// Generate an optimized prompt from project requirements
    GeneratePrompt(ProjectArgs),

    /// Send the composed prompt to the backend
    RunPrompt {
        /// Send the plain assembled prompt instead of the enhanced one
        #[arg(long)]
        plain: bool,
    },
}

#[derive(Args)]
struct ProjectArgs {
    /// What the project is for
    #[arg(long)]
    purpose: String,

    #[arg(long, default_value = "web")]
    project_type: String,

    /// Budget in yen
    #[arg(long, default_value_t = 0)]
    budget: i64,

    #[arg(long, default_value = "beginner")]
    experience_level: String,

    #[arg(long, default_value = "10-20")]
    weekly_hours: String,
}

impl ProjectArgs {
    /// Request body for the proposal API, or `None` when the purpose is blank.
    fn payload(&self, workspace: &Workspace) -> Option<UserPayload> {
        if self.purpose.trim().is_empty() {
            return None;
        }
        Some(UserPayload {
            purpose: self.purpose.clone(),
            project_type: self.project_type.clone(),
            budget: self.budget,
            experience_level: self.experience_level.clone(),
            weekly_hours: self.weekly_hours.clone(),
            development_time: Some(workspace.development_time()),
            language: Some(workspace.language()),
        })
    }
}

#[tokio::main]
async fn main() {
    tracing_subscriber::registry()
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .init();

    let cli = Cli::parse();
    if let Err(e) = run(cli).await {
        eprintln!("Error: {e}");
        if let Some(hint) = network_hint(&e) {
            eprintln!("{hint}");
        }
        process::exit(1);
    }
}

/// Follow-up line for failures talking to the proposal API.
fn network_hint(err: &AinError) -> Option<String> {
    err.is_network().then(|| {
        format!("Check that the proposal API is running (set --api-url or {API_URL_ENV}).")
    })
}

fn config_from(cli: &Cli) -> ComposerConfig {
    let mut config = ComposerConfig::from_env();
    if let Some(dir) = &cli.state_dir {
        config = config.with_state_dir(dir);
    }
    if let Some(url) = &cli.api_url {
        config = config.with_api_base_url(url);
    }
    if cli.no_delay {
        config = config.without_delays();
    }
    if let Some(secs) = cli.timeout {
        config = config.with_request_timeout(Some(Duration::from_secs(secs)));
    }
    config
}

async fn run(cli: Cli) -> Result<()> {
    let config = config_from(&cli);
    let mut ws = Workspace::open(config.clone())?;

    match cli.command {
        Command::Add { content } => match ws.add_text(&content) {
            Some(block) => println!("Added {} at position {}", block.id, block.priority),
            None => println!("Nothing added: content is blank"),
        },
        Command::List { filter } => {
            let blocks = match &filter {
                Some(query) => ws.filter(query),
                None => ws.blocks().iter().collect(),
            };
            if blocks.is_empty() {
                println!("No blocks");
            }
            for block in blocks {
                println!(
                    "[{}] {} ({}, {} chars)\n    {}",
                    block.priority,
                    block.id,
                    block.block_type,
                    block.char_len(),
                    block.content.replace('\n', "\n    ")
                );
            }
        }
        Command::Edit { id, content } => report(ws.edit(&id, &content), "Updated", &id)?,
        Command::Delete { id } => report(ws.delete(&id), "Deleted", &id)?,
        Command::Move { dragged, target } => {
            move_block(&mut ws, &dragged, &target)?;
            println!("Moved {dragged}");
        }
        Command::Clear => {
            ws.clear();
            println!("Cleared all blocks");
        }
        Command::Import { file } => {
            let json = std::fs::read_to_string(&file)?;
            let count = ws.import_json(&json)?;
            println!("Imported {count} blocks from {}", file.display());
        }
        Command::Export { dir } => {
            let sink = FsSink::new(dir);
            ws.export_to(&sink)?;
            println!("{}", sink.path_for(export::BLOCKS_FILENAME).display());
        }

        Command::Score => {
            let report = ws.quality_score();
            println!("Quality: {}/100", report.score);
            for hint in &report.feedback {
                println!("  - {hint}");
            }
        }
        Command::Quality => {
            let analysis = ws.quality_analysis();
            let lang = ws.language();
            println!("Overall: {}/100", analysis.overall);
            for metric in &analysis.metrics {
                println!(
                    "  {:<28} {:>2}/{} {}",
                    metric.name,
                    metric.score,
                    metric.max_score,
                    metric.feedback.label(lang)
                );
                for suggestion in &metric.suggestions {
                    println!("      - {suggestion}");
                }
            }
        }
        Command::Suggest { apply } => {
            let suggestions = ws.analyze_reorder().await;
            if suggestions.is_empty() {
                println!("No reorder suggestions");
            }
            for s in suggestions {
                let order: Vec<&str> = s.new_order.iter().map(|b| b.id.as_str()).collect();
                println!("{} ({}%): {}", s.kind, s.confidence, s.reason);
                println!("    {}", order.join(" -> "));
            }
            if let Some(kind) = apply {
                ws.apply_suggestion(kind)?;
                println!("Applied {kind}");
            }
        }
        Command::Assemble { compress, enhanced } => {
            let text = if compress {
                ws.compressed_prompt().await
            } else if enhanced {
                ws.enhanced_prompt()
            } else {
                ws.assembled_prompt()
            };
            println!("{text}");
        }

        Command::Templates { search, category } => {
            let library = templates::template_library(ws.language(), ws.development_time());
            let found =
                templates::search_templates(&library, search.as_deref().unwrap_or(""), category);
            let lang = ws.language();
            for t in found {
                println!(
                    "{:<20} {} [{}, {}, ~{} months]\n    {}",
                    t.id,
                    t.name,
                    t.category.label(lang),
                    t.difficulty.label(lang),
                    t.estimated_months,
                    t.description
                );
            }
        }
        Command::UseTemplate { id } => {
            let template = ws.load_template(&id)?;
            println!(
                "Loaded '{}' ({} blocks)",
                template.name,
                template.blocks.len()
            );
        }

        Command::Settings { language, dev_time } => {
            if let Some(language) = language {
                ws.set_language(language);
            }
            if let Some(months) = dev_time {
                ws.set_development_time(months);
            }
            println!("language: {}", ws.language().display_name());
            println!("development time: {} months", ws.development_time());
            println!("blocks: {}", ws.blocks().len());
            println!("voice memos: {}", ws.voice_memos().len());
        }

        Command::Analyze(project) => {
            let Some(payload) = project.payload(&ws) else {
                println!("{NOTHING_TO_SEND}: purpose is blank");
                return Ok(());
            };
            let client = ProposalClient::from_config(&config)?;
            let reply = client.analyze_purpose(&payload).await?;
            println!("{}", reply.suggestion);
        }
        Command::Proposal { project, out } => {
            let Some(payload) = project.payload(&ws) else {
                println!("{NOTHING_TO_SEND}: purpose is blank");
                return Ok(());
            };
            let client = ProposalClient::from_config(&config)?;
            let reply = client.generate_full_proposal(&payload).await?;
            let sections = split_proposal_into_sections(&reply.suggestion);
            println!("{}", reply.suggestion);
            println!(
                "\n--- {} sections | ~{} months ---",
                sections.len(),
                extract_duration_months(&reply.suggestion)
            );
            if let Some(dir) = out {
                let sink = FsSink::new(dir);
                let filename = export::proposal_filename(chrono::Local::now().date_naive());
                export::export_markdown(&sink, &filename, &reply.suggestion)?;
                println!("Saved {}", sink.path_for(&filename).display());
            }
        }
        Command::Refine {
            project,
            proposal,
            request,
        } => {
            let Some(payload) = project.payload(&ws) else {
                println!("{NOTHING_TO_SEND}: purpose is blank");
                return Ok(());
            };
            if request.trim().is_empty() {
                println!("{NOTHING_TO_SEND}: request is blank");
                return Ok(());
            }
            let client = ProposalClient::from_config(&config)?;
            let body = RefinementRequest {
                user_payload: payload,
                current_proposal: std::fs::read_to_string(&proposal)?,
                refinement_request: request,
            };
            let reply = client.refine_proposal(&body).await?;
            match reply.kind {
                RefinementKind::Proposal => {
                    std::fs::write(&proposal, &reply.content)?;
                    println!("{}\n\nUpdated {}", reply.content, proposal.display());
                }
                RefinementKind::Answer | RefinementKind::Rejection => {
                    println!("{}", reply.content);
                }
            }
        }
        Command::GeneratePrompt(project) => {
            let Some(payload) = project.payload(&ws) else {
                println!("{NOTHING_TO_SEND}: purpose is blank");
                return Ok(());
            };
            let client = ProposalClient::from_config(&config)?;
            let reply = client.generate_prompt(&payload).await?;
            println!("{}", reply.suggestion);
        }
        Command::RunPrompt { plain } => {
            let Some(prompt) = prompt_to_send(&ws, plain) else {
                println!("{NOTHING_TO_SEND}: no blocks");
                return Ok(());
            };
            let client = ProposalClient::from_config(&config)?;
            let reply = client.execute_custom_prompt(&prompt, ws.language()).await?;
            println!("{}", reply.suggestion);
        }
    }
    Ok(())
}

/// Drop `dragged` onto `target`. Dropping a block onto itself is a no-op.
fn move_block(ws: &mut Workspace, dragged: &str, target: &str) -> Result<()> {
    if dragged == target || ws.move_block(dragged, target) {
        return Ok(());
    }
    let missing = if ws.store().get(dragged).is_none() {
        dragged
    } else {
        target
    };
    Err(AinError::UnknownBlock(missing.to_string()))
}

/// Prompt for `run-prompt`, or `None` when there is nothing to send.
fn prompt_to_send(ws: &Workspace, plain: bool) -> Option<String> {
    if ws.blocks().is_empty() {
        return None;
    }
    Some(if plain {
        ws.assembled_prompt()
    } else {
        ws.enhanced_prompt()
    })
}

fn report(changed: bool, verb: &str, id: &str) -> Result<()> {
    if !changed {
        return Err(AinError::UnknownBlock(id.to_string()));
    }
    println!("{verb} {id}");
    Ok(())
}
