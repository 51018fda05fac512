// Colored terminal output for verdicts, send results, and history.
//
// main.rs delegates all display work here so command handlers stay short.

use colored::Colorize;

use crate::chat::models::{Message, Rendered};
use crate::chat::send::SendOutcome;
use crate::moderation::traits::{ToxicityLabel, ToxicityResult};

/// Placeholder shown instead of moderated content.
pub const MASKED_PLACEHOLDER: &str = "FILTERED TRANSMISSION";

/// Display a moderation verdict.
pub fn display_verdict(verdict: &ToxicityResult) {
    println!("\n{}", "=== Moderation Verdict ===".bold());
    println!("  Label:  {}", colorize_label(verdict.label));
    println!("  Score:  {}/100", verdict.score);
    println!("  Source: {}", verdict.source.as_str());
    println!("  Reason: {}", verdict.reason.dimmed());
}

/// Display the result of a send.
pub fn display_send_outcome(outcome: &SendOutcome) {
    match outcome {
        SendOutcome::Sent {
            message,
            verdict,
            masked,
        } => {
            if *masked {
                println!(
                    "{} Sent flagged as {} (message #{}); recipients see it masked.",
                    "~".yellow(),
                    colorize_label(verdict.label),
                    message.id
                );
            } else {
                println!("{} Sent (message #{}).", "✓".green(), message.id);
            }
        }
        SendOutcome::Blocked { notice, verdict } => {
            println!("{} {}", "✗".red().bold(), notice.red());
            println!("  {}", verdict.reason.dimmed());
        }
    }
}

/// Display a conversation, oldest first, from `viewer`'s point of view.
pub fn display_history(messages: &[Message], viewer: &str, title: &str) {
    if messages.is_empty() {
        println!("No messages yet in {title}.");
        return;
    }

    println!(
        "\n{}",
        format!("=== {title} ({} messages) ===", messages.len()).bold()
    );
    println!();

    for message in messages {
        let who = if message.sender_id == viewer {
            "you".bright_purple().bold()
        } else {
            message.sender_id.bright_blue().bold()
        };
        let time = message.created_at.get(11..16).unwrap_or("");
        println!("  {} {:<16} {}", time.dimmed(), who, render_line(message));
    }
    println!();
}

/// One display line for a message body.
fn render_line(message: &Message) -> colored::ColoredString {
    match message.rendered() {
        Rendered::Masked => MASKED_PLACEHOLDER.red().italic(),
        Rendered::Image(url) => {
            format!("[image] {}", super::truncate_chars(&url, 60)).cyan()
        }
        Rendered::Text(text) => super::truncate_chars(&text, 200).normal(),
    }
}

/// Colorize a moderation label.
fn colorize_label(label: ToxicityLabel) -> colored::ColoredString {
    match label {
        ToxicityLabel::HighlyToxic => label.as_str().red().bold(),
        ToxicityLabel::Toxic => label.as_str().bright_red(),
        ToxicityLabel::LowToxicity => label.as_str().yellow(),
        ToxicityLabel::Safe => label.as_str().green(),
    }
}
