//! Interactive REPL (Read-Eval-Print Loop) mode.
//!
//! Mirrors the manual flow: load a script, split it, then describe it one
//! batch at a time (or all at once), saving whenever convenient. Session
//! state lives only in memory.

use crate::cli::{ProfileAction, ProfileArgs};
use crate::commands::{self, read_text, split_source, write_text};
use crate::config::{storyboard_dir, Config};
use crate::error::{CliError, Result};
use crate::output::Formatter;
use rustyline::error::ReadlineError;
use rustyline::DefaultEditor;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use storyboard_domain::SchedulerState;
use storyboard_llm::{ChatProvider, OpenAiCompatibleProvider};
use storyboard_pipeline::{render_numbered, Advance, BatchScheduler, PipelineConfig, PipelineError};

/// Run the interactive REPL.
pub async fn run_repl(
    config: &mut Config,
    config_path: &Path,
    api_key: Option<&str>,
    formatter: &Formatter,
) -> Result<()> {
    println!("{}", formatter.info("Storyboard REPL - Type 'help' for commands, 'exit' to quit"));
    println!();

    // Initialize readline editor
    let mut editor = DefaultEditor::new().map_err(|e| {
        CliError::Io(std::io::Error::other(format!(
            "Failed to initialize editor: {}",
            e
        )))
    })?;

    // Load history
    let history_path = get_history_path()?;
    let _ = editor.load_history(&history_path);

    let mut session = Session::new(
        config.settings.pipeline.clone(),
        config.settings.style_suffix.clone(),
    )?;

    loop {
        let prompt = session.prompt();

        match editor.readline(&prompt) {
            Ok(line) => {
                let line = line.trim();

                if line.is_empty() {
                    continue;
                }

                editor.add_history_entry(line).ok();

                match parse_repl_command(line) {
                    Ok(ReplCommand::Exit) => {
                        println!("{}", formatter.info("Goodbye!"));
                        break;
                    }
                    Ok(ReplCommand::Help) => {
                        print_help(formatter);
                    }
                    Ok(ReplCommand::Profile(args)) => {
                        if let Err(e) = commands::execute_profile(args, config, config_path, formatter) {
                            eprintln!("{}", formatter.error(&e.to_string()));
                        }
                    }
                    Ok(cmd) if cmd.needs_provider() => {
                        let result = match build_provider(config, api_key) {
                            Ok(provider) => session.execute(cmd, Some(provider), formatter).await,
                            Err(e) => Err(e),
                        };
                        if let Err(e) = result {
                            eprintln!("{}", formatter.error(&e.to_string()));
                        }
                    }
                    Ok(cmd) => {
                        if let Err(e) = session
                            .execute::<OpenAiCompatibleProvider>(cmd, None, formatter)
                            .await
                        {
                            eprintln!("{}", formatter.error(&e.to_string()));
                        }
                    }
                    Err(e) => {
                        eprintln!("{}", formatter.error(&e.to_string()));
                    }
                }
            }
            Err(ReadlineError::Interrupted) => {
                println!("{}", formatter.info("Use 'exit' to quit"));
            }
            Err(ReadlineError::Eof) => {
                break;
            }
            Err(err) => {
                eprintln!("{}", formatter.error(&format!("Error: {}", err)));
                break;
            }
        }
    }

    // Save history
    editor.save_history(&history_path).ok();

    Ok(())
}

/// Provider for the active profile, resolved afresh for each action
fn build_provider(config: &Config, api_key: Option<&str>) -> Result<Arc<OpenAiCompatibleProvider>> {
    let provider_config = config.provider_config(api_key)?;
    Ok(Arc::new(OpenAiCompatibleProvider::new(provider_config)?))
}

/// REPL command type.
#[derive(Debug)]
pub enum ReplCommand {
    /// Read a source document
    Load(PathBuf),
    /// Show or set the character sheet
    Characters(Option<PathBuf>),
    /// Show or set the style suffix
    Style(Option<String>),
    /// Set the batch size
    Batch(usize),
    /// Split the loaded document
    Split,
    /// Show the segment list
    Segments,
    /// Describe the next batch
    Next,
    /// Describe every remaining batch
    Auto,
    /// Show progress
    Status,
    /// Discard segments and progress
    Reset,
    /// Write the storyboard so far
    Save(PathBuf),
    /// Write the numbered lines
    ExportSegments(PathBuf),
    /// Manage profiles
    Profile(ProfileArgs),
    /// Show help
    Help,
    /// Leave the REPL
    Exit,
}

impl ReplCommand {
    fn needs_provider(&self) -> bool {
        matches!(self, ReplCommand::Split | ReplCommand::Next | ReplCommand::Auto)
    }
}

/// Parse a REPL command line.
pub fn parse_repl_command(line: &str) -> Result<ReplCommand> {
    let parts: Vec<&str> = line.split_whitespace().collect();

    if parts.is_empty() {
        return Err(CliError::InvalidInput("Empty command".to_string()));
    }
    let args = &parts[1..];

    match parts[0] {
        "exit" | "quit" | "q" => Ok(ReplCommand::Exit),
        "help" | "?" => Ok(ReplCommand::Help),
        "load" => Ok(ReplCommand::Load(required_path(args, "load <file>")?)),
        "characters" | "cast" => Ok(ReplCommand::Characters(args.first().map(PathBuf::from))),
        "style" => Ok(ReplCommand::Style(
            (!args.is_empty()).then(|| args.join(" ")),
        )),
        "batch" => {
            let size = args
                .first()
                .and_then(|s| s.parse::<usize>().ok())
                .filter(|n| *n > 0)
                .ok_or_else(|| CliError::InvalidInput("Usage: batch <size> (size >= 1)".to_string()))?;
            Ok(ReplCommand::Batch(size))
        }
        "split" => Ok(ReplCommand::Split),
        "segments" | "ls" => Ok(ReplCommand::Segments),
        "next" | "n" => Ok(ReplCommand::Next),
        "auto" => Ok(ReplCommand::Auto),
        "status" => Ok(ReplCommand::Status),
        "reset" => Ok(ReplCommand::Reset),
        "save" => Ok(ReplCommand::Save(required_path(args, "save <file>")?)),
        "export-segments" => Ok(ReplCommand::ExportSegments(required_path(
            args,
            "export-segments <file>",
        )?)),
        "profile" => parse_profile_command(args),
        _ => Err(CliError::InvalidInput(format!(
            "Unknown command: {}. Type 'help' for available commands.",
            parts[0]
        ))),
    }
}

fn required_path(args: &[&str], usage: &str) -> Result<PathBuf> {
    if args.is_empty() {
        return Err(CliError::InvalidInput(format!("Usage: {}", usage)));
    }
    Ok(PathBuf::from(args.join(" ")))
}

fn parse_profile_command(args: &[&str]) -> Result<ReplCommand> {
    if args.is_empty() {
        return Ok(ReplCommand::Profile(ProfileArgs {
            action: ProfileAction::Show,
        }));
    }

    let action = match args[0] {
        "list" => ProfileAction::List,
        "show" => ProfileAction::Show,
        "switch" => {
            if args.len() < 2 {
                return Err(CliError::InvalidInput("Usage: profile switch <name>".to_string()));
            }
            ProfileAction::Switch {
                name: args[1].to_string(),
            }
        }
        _ => return Err(CliError::InvalidInput(format!("Unknown profile action: {}", args[0]))),
    };

    Ok(ReplCommand::Profile(ProfileArgs { action }))
}

/// In-memory state of one REPL session
#[derive(Debug)]
pub struct Session {
    pipeline: PipelineConfig,
    state: SchedulerState,
    source: Option<String>,
    characters: String,
    style: String,
}

impl Session {
    /// Create an empty session
    pub fn new(pipeline: PipelineConfig, style: String) -> Result<Self> {
        let state = SchedulerState::new(Vec::new(), pipeline.batch_size).map_err(PipelineError::from)?;
        Ok(Self {
            pipeline,
            state,
            source: None,
            characters: String::new(),
            style,
        })
    }

    /// Describe progress
    pub fn state(&self) -> &SchedulerState {
        &self.state
    }

    fn prompt(&self) -> String {
        if self.state.total() == 0 {
            "storyboard> ".to_string()
        } else {
            format!("storyboard [{}/{}]> ", self.state.current_index(), self.state.total())
        }
    }

    /// Execute one command; `provider` is required by split, next and auto.
    pub async fn execute<P: ChatProvider>(
        &mut self,
        cmd: ReplCommand,
        provider: Option<Arc<P>>,
        formatter: &Formatter,
    ) -> Result<()> {
        match cmd {
            ReplCommand::Load(path) => self.load(&path, formatter),
            ReplCommand::Characters(path) => self.characters(path.as_deref(), formatter),
            ReplCommand::Style(style) => {
                if let Some(style) = style {
                    self.style = style;
                }
                let shown = if self.style.is_empty() { "(none)" } else { self.style.as_str() };
                println!("Style: {}", shown);
                Ok(())
            }
            ReplCommand::Batch(size) => {
                self.state.set_batch_size(size).map_err(PipelineError::from)?;
                self.pipeline.batch_size = size;
                println!("{}", formatter.success(&format!("Batch size set to {}", size)));
                Ok(())
            }
            ReplCommand::Split => self.split(require(provider)?, formatter).await,
            ReplCommand::Segments => {
                println!(
                    "{}",
                    formatter.format_segments(self.state.segments(), self.pipeline.max_line_chars)?
                );
                Ok(())
            }
            ReplCommand::Next => self.next(require(provider)?, formatter).await,
            ReplCommand::Auto => self.auto(require(provider)?, formatter).await,
            ReplCommand::Status => {
                println!("{}", formatter.format_status(&self.state)?);
                Ok(())
            }
            ReplCommand::Reset => {
                self.state.reset();
                println!("{}", formatter.success("Segments and progress cleared"));
                Ok(())
            }
            ReplCommand::Save(path) => self.save(&path, formatter),
            ReplCommand::ExportSegments(path) => {
                if self.state.total() == 0 {
                    return Err(CliError::InvalidInput("No segments to export".to_string()));
                }
                write_text(&path, &render_numbered(self.state.segments()))?;
                println!(
                    "{}",
                    formatter.success(&format!("Segments written to {}", path.display()))
                );
                Ok(())
            }
            ReplCommand::Profile(_) | ReplCommand::Help | ReplCommand::Exit => Ok(()),
        }
    }

    fn load(&mut self, path: &Path, formatter: &Formatter) -> Result<()> {
        let text = read_text(path)?;
        if text.trim().is_empty() {
            return Err(CliError::InvalidInput(format!("'{}' is empty", path.display())));
        }
        println!(
            "{}",
            formatter.success(&format!(
                "Loaded {} characters from {}",
                text.chars().count(),
                path.display()
            ))
        );
        self.source = Some(text);
        Ok(())
    }

    fn characters(&mut self, path: Option<&Path>, formatter: &Formatter) -> Result<()> {
        if let Some(path) = path {
            self.characters = read_text(path)?;
            println!("{}", formatter.success("Character sheet loaded"));
        }
        if self.characters.trim().is_empty() {
            println!("{}", formatter.info("No character sheet"));
        } else {
            println!("{}", self.characters.trim_end());
        }
        Ok(())
    }

    async fn split<P: ChatProvider>(&mut self, provider: Arc<P>, formatter: &Formatter) -> Result<()> {
        let source = self
            .source
            .as_deref()
            .ok_or_else(|| CliError::InvalidInput("Nothing loaded; use 'load <file>' first".to_string()))?;

        let segments = split_source(source, provider, &self.pipeline).await?;
        self.state.load(segments);
        println!(
            "{}",
            formatter.format_segments(self.state.segments(), self.pipeline.max_line_chars)?
        );
        Ok(())
    }

    fn scheduler<P: ChatProvider>(&self, provider: Arc<P>) -> BatchScheduler<P> {
        BatchScheduler::describe(provider, &self.characters, &self.style, &self.pipeline)
    }

    async fn next<P: ChatProvider>(&mut self, provider: Arc<P>, formatter: &Formatter) -> Result<()> {
        let before = self.state.accumulated_output().len();

        match self.scheduler(provider).advance(&mut self.state).await? {
            Advance::Complete => {
                println!("{}", formatter.info("Every segment is already described"));
            }
            Advance::Progressed { batch, remaining } => {
                println!("{}", self.state.accumulated_output()[before..].trim_start());
                println!(
                    "{}",
                    formatter.success(&format!(
                        "Described segments {}-{}, {} remaining",
                        batch.start + 1,
                        batch.end,
                        remaining
                    ))
                );
            }
        }
        Ok(())
    }

    async fn auto<P: ChatProvider>(&mut self, provider: Arc<P>, formatter: &Formatter) -> Result<()> {
        let batches = self.scheduler(provider).run_to_completion(&mut self.state).await?;
        println!(
            "{}",
            formatter.success(&format!(
                "Ran {} batch(es); {}/{} segments described",
                batches,
                self.state.current_index(),
                self.state.total()
            ))
        );
        Ok(())
    }

    fn save(&self, path: &Path, formatter: &Formatter) -> Result<()> {
        if self.state.accumulated_output().is_empty() {
            return Err(CliError::InvalidInput("Nothing described yet".to_string()));
        }
        write_text(path, self.state.accumulated_output())?;
        println!(
            "{}",
            formatter.success(&format!("Storyboard saved to {}", path.display()))
        );
        Ok(())
    }
}

fn require<P>(provider: Option<Arc<P>>) -> Result<Arc<P>> {
    provider.ok_or_else(|| CliError::Config("No provider configured".to_string()))
}

fn get_history_path() -> Result<PathBuf> {
    let dir = storyboard_dir()?;
    std::fs::create_dir_all(&dir)?;
    Ok(dir.join("history.txt"))
}

fn print_help(formatter: &Formatter) {
    println!("{}", formatter.info("Available commands:"));
    println!();
    println!("  load <file>                 - Load a source document");
    println!("  characters [file]           - Show or load the character sheet");
    println!("  style [flags]               - Show or set the style suffix (e.g. --ar 9:16)");
    println!("  batch <size>                - Set segments per describe call");
    println!("  split                       - Split the loaded document");
    println!("  segments                    - Show segments with character counts");
    println!("  next                        - Describe the next batch");
    println!("  auto                        - Describe every remaining batch");
    println!("  status                      - Show progress");
    println!("  reset                       - Discard segments and progress");
    println!("  save <file>                 - Save the storyboard so far");
    println!("  export-segments <file>      - Save the numbered lines");
    println!("  profile [list|show|switch]  - Manage profiles");
    println!("  help, ?                     - Show this help");
    println!("  exit, quit, q               - Exit REPL");
    println!();
}
