//! Command-line interface for docloom
//!
//! Each invocation loads the workflow request from the session file, applies
//! one transition through the state machine, saves the result, and prints the
//! updated state. Exit codes distinguish usage errors, busy rejections, and
//! remote failures so scripts can branch on them.

use std::path::PathBuf;
use std::sync::Arc;

use anyhow::Result;
use clap::{Parser, Subcommand};

use crate::session;
use crate::{
    Config, DocumentType, ExitCode, HttpWorkflowClient, Stage, WorkflowEngine, WorkflowError,
    WorkflowRequest,
};

/// docloom - generate documents from a topic through an editable outline
#[derive(Parser)]
#[command(name = "docloom")]
#[command(about = "Three-stage document generation: draft an outline, edit it, generate")]
#[command(long_about = r#"
docloom drives a remote generation service through a three-stage workflow:

  1. `docloom new <topic>` asks the service to draft a title and outline.
  2. `docloom edit ...` revises the outline locally; nothing is sent yet.
  3. `docloom confirm` persists the outline, regenerates content, and renders
     the final document, printing its download URL.

EXAMPLES:
  # Start a new presentation on a topic
  docloom new "量化投资策略" --pages 15 --doc-type ppt

  # Inspect the drafted outline
  docloom show

  # Edit locally: retitle section 0, add a point to section 1
  docloom edit section-title 0 "研究背景"
  docloom edit add-point 1

  # Generate the document
  docloom confirm

  # After a remote failure, retry the generation from the current edits
  docloom retry

CONFIGURATION:
  The service endpoint and defaults come from docloom.toml in the working
  directory, from the path in DOCLOOM_CONFIG, or from --config. Built-in
  defaults target http://127.0.0.1:8000.

SESSION:
  Workflow state lives in docloom-session.json (override with --session).
  `docloom reset` discards it and starts over.
"#)]
#[command(version)]
pub struct Cli {
    /// Path to configuration file (overrides discovery)
    #[arg(long, global = true)]
    pub config: Option<PathBuf>,

    /// Path to the session file holding workflow state
    #[arg(long, global = true)]
    pub session: Option<PathBuf>,

    /// Enable verbose output
    #[arg(short, long, global = true)]
    pub verbose: bool,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand)]
pub enum Command {
    /// Submit a topic and draft an outline
    New {
        /// Topic to generate a document about
        topic: String,

        /// Page limit for the generated document
        #[arg(long)]
        pages: Option<u32>,

        /// Document type: ppt or word
        #[arg(long)]
        doc_type: Option<DocumentType>,
    },

    /// Print the current workflow state
    Show,

    /// Edit the title or outline locally
    #[command(subcommand)]
    Edit(EditCommand),

    /// Persist the outline, regenerate content, and render the document
    Confirm,

    /// Retry a failed generation from the current local edits
    Retry,

    /// Discard the session and start over
    Reset,
}

#[derive(Subcommand)]
pub enum EditCommand {
    /// Replace the document title
    Title { title: String },

    /// Append a new placeholder section
    AddSection,

    /// Remove the section at INDEX
    RemoveSection { index: usize },

    /// Retitle the section at INDEX
    SectionTitle { index: usize, title: String },

    /// Append a placeholder point to the section at SECTION
    AddPoint { section: usize },

    /// Remove point POINT from the section at SECTION
    RemovePoint { section: usize, point: usize },

    /// Rewrite point POINT of the section at SECTION
    Point {
        section: usize,
        point: usize,
        text: String,
    },
}

/// Parse arguments, run one command, print all output.
///
/// # Errors
///
/// Returns the process exit code on failure; all messages have already been
/// printed.
pub fn run() -> Result<(), ExitCode> {
    let cli = Cli::parse();

    if let Err(e) = docloom_utils::logging::init_tracing(cli.verbose) {
        eprintln!("warning: failed to initialize logging: {e}");
    }

    let runtime = match tokio::runtime::Runtime::new() {
        Ok(runtime) => runtime,
        Err(e) => {
            eprintln!("error: failed to start async runtime: {e}");
            return Err(ExitCode::INTERNAL);
        }
    };

    match runtime.block_on(dispatch(cli)) {
        Ok(()) => Ok(()),
        Err(error) => {
            eprintln!("error: {error:#}");
            Err(exit_code_for(&error))
        }
    }
}

/// Map an error to the exit code contract: workflow errors carry their own
/// code, config errors are usage errors, everything else is internal.
fn exit_code_for(error: &anyhow::Error) -> ExitCode {
    if let Some(workflow) = error.downcast_ref::<WorkflowError>() {
        return workflow.to_exit_code();
    }
    if error.downcast_ref::<docloom_utils::error::ConfigError>().is_some() {
        return ExitCode::USAGE;
    }
    ExitCode::INTERNAL
}

async fn dispatch(cli: Cli) -> Result<()> {
    let session_path = cli
        .session
        .unwrap_or_else(|| PathBuf::from(session::DEFAULT_SESSION_FILE));

    if let Command::Reset = cli.command {
        session::clear(&session_path)?;
        println!("Session cleared; start a new workflow with `docloom new <topic>`.");
        return Ok(());
    }

    let config = Config::discover(cli.config.as_deref())?;
    let client = Arc::new(HttpWorkflowClient::new(&config)?);

    match cli.command {
        Command::New { topic, pages, doc_type } => {
            let page_limit = pages.unwrap_or(config.defaults.page_limit);
            let document_type = doc_type.unwrap_or(config.defaults.document_type);

            let mut engine = WorkflowEngine::new(client, page_limit, document_type);
            engine.submit_topic(&topic, page_limit, document_type).await?;
            session::save(&session_path, engine.request())?;

            println!("Outline drafted. Review it, edit as needed, then `docloom confirm`.");
            print_request(engine.request());
        }
        Command::Show => {
            let request = session::load(&session_path)?;
            print_request(&request);
        }
        Command::Edit(edit) => {
            let request = session::load(&session_path)?;
            let mut engine = WorkflowEngine::from_request(client, request);
            apply_edit(&mut engine, edit)?;
            session::save(&session_path, engine.request())?;
            print_request(engine.request());
        }
        command @ (Command::Confirm | Command::Retry) => {
            let retrying = matches!(command, Command::Retry);
            let request = session::load(&session_path)?;
            let mut engine = WorkflowEngine::from_request(client, request);

            let result = if retrying {
                engine.retry().await
            } else {
                engine.confirm().await
            };
            // The failed stage is worth keeping too, so save before bailing.
            session::save(&session_path, engine.request())?;
            let url = result?;

            println!("Document ready.");
            println!("Download: {}{url}", config.base_url());
        }
        Command::Reset => unreachable!("handled above"),
    }

    Ok(())
}

fn apply_edit(engine: &mut WorkflowEngine, edit: EditCommand) -> Result<(), WorkflowError> {
    match edit {
        EditCommand::Title { title } => engine.set_title(title),
        EditCommand::AddSection => engine.add_section(),
        EditCommand::RemoveSection { index } => engine.remove_section(index),
        EditCommand::SectionTitle { index, title } => engine.set_section_title(index, title),
        EditCommand::AddPoint { section } => engine.add_point(section),
        EditCommand::RemovePoint { section, point } => engine.remove_point(section, point),
        EditCommand::Point { section, point, text } => engine.set_point(section, point, text),
    }
}

/// Human-readable dump of the workflow request: stage, title, numbered
/// outline, and whatever stage-specific extras apply.
fn print_request(request: &WorkflowRequest) {
    println!();
    println!("Stage: {}", request.stage);
    if let Some(id) = &request.request_id {
        println!("Request: {id}");
    }
    if !request.topic.is_empty() {
        println!("Topic: {}", request.topic);
    }
    println!(
        "Document: {} ({} pages max)",
        request.document_type, request.page_limit
    );
    if !request.title.is_empty() {
        println!("Title: {}", request.title);
    }

    if !request.outline.is_empty() {
        println!();
        println!("Outline:");
        for (i, section) in request.outline.sections().iter().enumerate() {
            println!("  [{i}] {}", section.title);
            for (j, point) in section.content.iter().enumerate() {
                println!("      [{j}] {point}");
            }
        }
    }

    if let Some(content) = &request.content {
        println!();
        println!("Generated content: {} section(s)", content.len());
    }
    if let Some(url) = &request.document_url {
        println!("Download path: {url}");
    }
    if let Some(error) = &request.last_error {
        println!();
        match (error.step, error.status) {
            (Some(step), Some(status)) => {
                println!("Last error: {step} failed with HTTP {status}: {}", error.message);
            }
            (Some(step), None) => println!("Last error: {step} failed: {}", error.message),
            _ => println!("Last error: {}", error.message),
        }
        if matches!(request.stage, Stage::Failed { .. }) {
            println!("Recover with `docloom retry`, or edit and confirm again.");
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn cli_definition_is_consistent() {
        Cli::command().debug_assert();
    }

    #[test]
    fn parses_new_with_options() {
        let cli = Cli::parse_from([
            "docloom", "new", "量化投资策略", "--pages", "15", "--doc-type", "word",
        ]);
        match cli.command {
            Command::New { topic, pages, doc_type } => {
                assert_eq!(topic, "量化投资策略");
                assert_eq!(pages, Some(15));
                assert_eq!(doc_type, Some(DocumentType::Word));
            }
            _ => panic!("expected new command"),
        }
    }

    #[test]
    fn parses_edit_point_rewrite() {
        let cli = Cli::parse_from(["docloom", "edit", "point", "1", "2", "新的要点"]);
        match cli.command {
            Command::Edit(EditCommand::Point { section, point, text }) => {
                assert_eq!((section, point), (1, 2));
                assert_eq!(text, "新的要点");
            }
            _ => panic!("expected edit point command"),
        }
    }

    #[test]
    fn rejects_unknown_doc_type() {
        let result = Cli::try_parse_from(["docloom", "new", "topic", "--doc-type", "pdf"]);
        assert!(result.is_err());
    }

    #[test]
    fn session_flag_is_global() {
        let cli = Cli::parse_from(["docloom", "show", "--session", "/tmp/s.json"]);
        assert_eq!(cli.session, Some(PathBuf::from("/tmp/s.json")));
    }
}
