//! REPL session management

use std::path::PathBuf;

use colored::Colorize;
use eyre::Result;
use rustyline::DefaultEditor;
use rustyline::error::ReadlineError;
use tracing::debug;

use super::{save_session, view};
use crate::domain::{PlatformCatalogue, PlatformId, PostState};
use crate::flows::{FlowOutcome, Flows};

/// What the REPL does with a line of plain text
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InputIntent {
    Generate,
    Refine,
}

impl InputIntent {
    /// Plain text is a topic until there is a draft, feedback afterwards
    pub fn for_draft(has_draft: bool) -> Self {
        if has_draft { Self::Refine } else { Self::Generate }
    }
}

/// Interactive REPL session
pub struct ReplSession {
    flows: Flows,
    catalogue: PlatformCatalogue,
}

impl ReplSession {
    /// Create a new REPL session
    pub fn new(flows: Flows, catalogue: PlatformCatalogue) -> Self {
        Self { flows, catalogue }
    }

    /// Run the REPL main loop
    pub async fn run(&mut self, initial_topic: Option<String>) -> Result<()> {
        self.print_welcome();

        if let Some(topic) = initial_topic {
            println!("{} {}", ">".bright_green(), topic);
            self.run_flow(InputIntent::Generate, &topic).await?;
        }

        let mut rl = DefaultEditor::new().map_err(|e| eyre::eyre!("Failed to initialize readline: {}", e))?;

        loop {
            let readline = rl.readline(&format!("{} ", ">".bright_green()));

            match readline {
                Ok(line) => {
                    let input = line.trim();
                    if input.is_empty() {
                        continue;
                    }

                    let _ = rl.add_history_entry(input);

                    if input.starts_with('/') {
                        match self.handle_slash_command(input).await? {
                            SlashResult::Continue => continue,
                            SlashResult::Quit => break,
                        }
                    } else {
                        let has_draft = !self.flows.store().snapshot().await?.is_empty_draft();
                        self.run_flow(InputIntent::for_draft(has_draft), input).await?;
                    }
                }
                Err(ReadlineError::Interrupted) => {
                    println!("^C");
                    continue;
                }
                Err(ReadlineError::Eof) => {
                    println!();
                    break;
                }
                Err(err) => {
                    return Err(eyre::eyre!("Readline error: {}", err));
                }
            }
        }

        println!("Goodbye!");
        Ok(())
    }

    /// Print welcome message
    fn print_welcome(&self) {
        println!();
        println!("{}", "PostCraft Interactive REPL".bright_cyan().bold());
        println!("Describe your post to generate a draft, then give feedback to refine it.");
        println!("Type {} for help, {} to quit", "/help".yellow(), "/quit".yellow());
        println!();
    }

    /// Run generate or refine and show the result
    async fn run_flow(&self, intent: InputIntent, input: &str) -> Result<()> {
        debug!(?intent, "run_flow: called");
        let outcome = match intent {
            InputIntent::Generate => {
                println!("{}", "Generating...".dimmed());
                self.flows.generate(input).await?
            }
            InputIntent::Refine => {
                println!("{}", "Refining...".dimmed());
                self.flows.refine(input).await?
            }
        };

        match outcome {
            FlowOutcome::InvalidInput => {
                println!("{}", "Nothing to do: enter some text (or generate a draft first).".dimmed());
            }
            FlowOutcome::Completed => {
                if intent == InputIntent::Generate {
                    self.format_pending().await?;
                }
                let state = self.flows.store().snapshot().await?;
                view::print_state(&state, &self.catalogue);
                if !state.selected_platforms.is_empty() && intent == InputIntent::Refine {
                    println!(
                        "{}",
                        "Variations still show the previous draft; use /reformat to refresh.".dimmed()
                    );
                } else if has_pending(&state) {
                    println!("{}", "Some platforms are not formatted yet; use /reformat to retry.".dimmed());
                }
            }
            other => view::print_outcome(&other),
        }
        Ok(())
    }

    /// Handle slash commands
    async fn handle_slash_command(&mut self, input: &str) -> Result<SlashResult> {
        let (cmd, rest) = match input.split_once(char::is_whitespace) {
            Some((cmd, rest)) => (cmd, rest.trim()),
            None => (input, ""),
        };
        debug!(%cmd, "handle_slash_command: called");

        match cmd {
            "/help" | "/h" => self.print_help(),
            "/quit" | "/q" | "/exit" => return Ok(SlashResult::Quit),
            "/generate" | "/g" => self.run_flow(InputIntent::Generate, rest).await?,
            "/refine" | "/r" => self.run_flow(InputIntent::Refine, rest).await?,
            "/toggle" | "/t" => self.toggle(rest).await?,
            "/reformat" => self.reformat().await?,
            "/show" | "/s" => {
                let state = self.flows.store().snapshot().await?;
                view::print_state(&state, &self.catalogue);
            }
            "/history" => {
                let state = self.flows.store().snapshot().await?;
                view::print_history(&state);
            }
            "/platforms" | "/p" => {
                let state = self.flows.store().snapshot().await?;
                view::print_platforms(&self.catalogue, Some(&state));
            }
            "/clear" | "/c" => {
                self.flows.store().clear_all().await?;
                println!("{}", "Session cleared.".dimmed());
            }
            "/save" => self.save(rest).await?,
            _ => {
                println!("{} Unknown command: {}", "?".yellow(), cmd);
                println!("Type {} for available commands", "/help".yellow());
            }
        }
        Ok(SlashResult::Continue)
    }

    /// Toggle each named platform in turn
    async fn toggle(&self, args: &str) -> Result<()> {
        if args.is_empty() {
            println!("Usage: {} <platform>...", "/toggle".yellow());
            return Ok(());
        }

        for name in args.split_whitespace() {
            let id: PlatformId = match self.catalogue.resolve(name) {
                Ok(id) => id,
                Err(e) => {
                    println!("{} {}", "?".yellow(), e);
                    continue;
                }
            };
            let outcome = self.flows.toggle_platform(&id).await?;
            println!("{}", id.as_str().yellow());
            view::print_outcome(&outcome);
        }

        let state = self.flows.store().snapshot().await?;
        view::print_variations(&state, &self.catalogue);
        println!();
        Ok(())
    }

    /// Format platforms that were selected before the draft existed
    async fn format_pending(&self) -> Result<()> {
        let outcomes = self.flows.format_pending().await?;
        if !outcomes.is_empty() {
            println!("{}", "Formatting selected platforms...".dimmed());
        }
        for (id, outcome) in &outcomes {
            if outcome.is_error() || *outcome == FlowOutcome::Stale {
                print!("{} ", id.as_str().yellow());
                view::print_outcome(outcome);
            }
        }
        Ok(())
    }

    /// Re-format the draft for every selected platform
    async fn reformat(&self) -> Result<()> {
        let outcomes = self.flows.reformat_selected().await?;
        if outcomes.is_empty() {
            println!("{}", "Nothing to reformat.".dimmed());
            return Ok(());
        }
        for (id, outcome) in &outcomes {
            if outcome.is_error() || *outcome == FlowOutcome::Stale {
                print!("{} ", id.as_str().yellow());
                view::print_outcome(outcome);
            }
        }
        let state = self.flows.store().snapshot().await?;
        view::print_variations(&state, &self.catalogue);
        println!();
        Ok(())
    }

    /// Write the session to a JSON file
    async fn save(&self, args: &str) -> Result<()> {
        if args.is_empty() {
            println!("Usage: {} <path>", "/save".yellow());
            return Ok(());
        }
        let path = PathBuf::from(args);
        let state = self.flows.store().snapshot().await?;
        match save_session(&state, &path) {
            Ok(()) => println!("{} {}", "Saved to".dimmed(), path.display()),
            Err(e) => println!("{} {:#}", "Error:".red(), e),
        }
        Ok(())
    }

    /// Print help message
    fn print_help(&self) {
        println!();
        println!("{}", "Available Commands:".bright_cyan());
        println!("  {:22} Generate a new draft from a topic", "/generate <topic>".yellow());
        println!("  {:22} Revise the draft from feedback", "/refine <feedback>".yellow());
        println!("  {:22} Select/deselect platforms", "/toggle <platform>...".yellow());
        println!("  {:22} Re-format the draft for selected platforms", "/reformat".yellow());
        println!("  {:22} Show draft and variations", "/show".yellow());
        println!("  {:22} Show conversation history", "/history".yellow());
        println!("  {:22} List platforms", "/platforms".yellow());
        println!("  {:22} Start over", "/clear".yellow());
        println!("  {:22} Save session as JSON", "/save <path>".yellow());
        println!("  {:22} Show this help", "/help".yellow());
        println!("  {:22} Exit the REPL", "/quit".yellow());
        println!();
        println!("Plain text generates a draft, or refines it once one exists.");
        println!();
    }
}

/// Whether a selected platform still lacks a variation
fn has_pending(state: &PostState) -> bool {
    state.selected_platforms.iter().any(|p| state.variation(p).is_none())
}

/// Result of handling a slash command
enum SlashResult {
    Continue,
    Quit,
}
