//! Terminal rendering of the post state

use colored::Colorize;

use crate::domain::{PlatformCatalogue, PostState, Role};
use crate::flows::FlowOutcome;

/// Characters of each message shown in the history listing
const HISTORY_PREVIEW_CHARS: usize = 60;

/// Placeholder for a selected platform whose variation is not in yet
const PENDING_PLACEHOLDER: &str = "⏳ Not formatted yet";

/// Print the current draft and the variation of each selected platform
pub fn print_state(state: &PostState, catalogue: &PlatformCatalogue) {
    println!();
    if state.is_empty_draft() {
        println!("{}", "No draft yet.".dimmed());
    } else {
        println!("{}", "Draft:".bright_cyan().bold());
        println!("{}", state.content);
    }
    print_variations(state, catalogue);
    if let Some(error) = &state.error {
        println!("{} {}", "⚠️".yellow(), error.red());
    }
    println!();
}

/// Print variations for the selected platforms, in selection order
pub fn print_variations(state: &PostState, catalogue: &PlatformCatalogue) {
    for id in &state.selected_platforms {
        let platform = catalogue.get(id);
        let name = platform.map(|p| p.name.as_str()).unwrap_or(id.as_str());
        println!();
        match (state.variation(id), platform) {
            (Some(text), Some(platform)) => {
                let count = crate::domain::Platform::char_count(text);
                let counter = format!("{}/{}", count, platform.character_limit);
                let counter = if platform.fits(text) {
                    counter.dimmed()
                } else {
                    counter.red()
                };
                println!("{} {}", format!("{} version:", name).bright_blue().bold(), counter);
                println!("{}", text);
            }
            (Some(text), None) => {
                println!("{}", format!("{} version:", name).bright_blue().bold());
                println!("{}", text);
            }
            (None, _) => {
                println!("{}", format!("{} version:", name).bright_blue().bold());
                println!("{}", PENDING_PLACEHOLDER.dimmed());
            }
        }
    }
}

/// Print the conversation ledger
pub fn print_history(state: &PostState) {
    if state.conversation_history.is_empty() {
        println!("{}", "No conversation history.".dimmed());
        return;
    }

    println!();
    println!("{}", "Conversation History:".bright_cyan());
    for (i, msg) in state.conversation_history.iter().enumerate() {
        let role = match msg.role {
            Role::User => "User".bright_green(),
            Role::Assistant => "Assistant".bright_blue(),
        };
        println!("  {}. {}: {}", i + 1, role, preview(&msg.content));
    }
    println!();
}

/// Print the platform catalogue, marking selected platforms
pub fn print_platforms(catalogue: &PlatformCatalogue, state: Option<&PostState>) {
    println!();
    println!("{}", "Platforms:".bright_cyan());
    for platform in catalogue.iter() {
        let marker = match state {
            Some(s) if s.is_selected(&platform.id) => "[x]".bright_green(),
            Some(_) => "[ ]".normal(),
            None => "-".normal(),
        };
        println!(
            "  {} {:10} {} ({} chars)",
            marker,
            platform.id.as_str().yellow(),
            platform.name,
            platform.character_limit
        );
    }
    println!();
}

/// Print a one-line summary of a flow outcome
pub fn print_outcome(outcome: &FlowOutcome) {
    match outcome {
        FlowOutcome::Completed | FlowOutcome::InvalidInput => {}
        FlowOutcome::RateLimited(message) => println!("{} {}", "Rate limited:".yellow(), message),
        FlowOutcome::Failed(message) => println!("{} {}", "Error:".red(), message),
        FlowOutcome::Stale => println!("{}", "Session was cleared; result discarded.".dimmed()),
        FlowOutcome::Deselected => println!("{}", "Platform deselected.".dimmed()),
        FlowOutcome::Cached => println!("{}", "Platform reselected (cached version).".dimmed()),
        FlowOutcome::SelectedWithoutContent => {
            println!("{}", "Platform selected; it will be formatted once there is a draft.".dimmed())
        }
    }
}

fn preview(text: &str) -> String {
    let flat = text.replace('\n', " ");
    if flat.chars().count() > HISTORY_PREVIEW_CHARS {
        let cut: String = flat.chars().take(HISTORY_PREVIEW_CHARS).collect();
        format!("{}...", cut)
    } else {
        flat
    }
}
