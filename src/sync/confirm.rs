//! Yes/no confirmation before destructive or surprising steps.

use async_trait::async_trait;
use std::io::{stdin, stdout, IsTerminal, Write};

/// Set to skip interactive prompts; every question is then answered "no".
pub const NON_INTERACTIVE_ENV: &str = "SBSYNC_NON_INTERACTIVE";

#[async_trait]
pub trait Confirm: Send + Sync {
    /// Ask `prompt`. `true` means the user agreed.
    async fn confirm(&self, prompt: &str) -> bool;
}

/// Reads a single `y`/`n` key from the terminal.
///
/// Without a TTY nothing is asked and the answer is "no".
#[derive(Debug, Default, Clone, Copy)]
pub struct TerminalConfirm;

impl TerminalConfirm {
    pub fn new() -> Self {
        TerminalConfirm
    }
}

fn is_interactive() -> bool {
    if std::env::var_os(NON_INTERACTIVE_ENV).is_some() {
        return false;
    }
    stdin().is_terminal() && stdout().is_terminal()
}

fn read_answer(prompt: &str) -> bool {
    use crossterm::event::{read, Event, KeyCode, KeyEvent, KeyEventKind, KeyModifiers};
    use crossterm::terminal::{disable_raw_mode, enable_raw_mode};

    print!("{} [y/N]: ", prompt);
    stdout().flush().ok();

    if enable_raw_mode().is_err() {
        return false;
    }
    let answer = loop {
        match read() {
            Ok(Event::Key(KeyEvent {
                code,
                modifiers,
                kind: KeyEventKind::Press,
                ..
            })) => match code {
                KeyCode::Char('c') if modifiers.contains(KeyModifiers::CONTROL) => break false,
                KeyCode::Char('y') | KeyCode::Char('Y') => break true,
                KeyCode::Char('n')
                | KeyCode::Char('N')
                | KeyCode::Char('q')
                | KeyCode::Enter
                | KeyCode::Esc => break false,
                _ => {}
            },
            Ok(_) => {}
            Err(_) => break false,
        }
    };
    disable_raw_mode().ok();
    println!("{}", if answer { "y" } else { "n" });
    answer
}

#[async_trait]
impl Confirm for TerminalConfirm {
    async fn confirm(&self, prompt: &str) -> bool {
        if !is_interactive() {
            tracing::warn!("Not a terminal; treating '{}' as declined", prompt);
            return false;
        }
        let prompt = prompt.to_string();
        tokio::task::spawn_blocking(move || read_answer(&prompt))
            .await
            .unwrap_or(false)
    }
}

/// Always answers yes. Used for `--force`.
#[derive(Debug, Default, Clone, Copy)]
pub struct AssumeYes;

#[async_trait]
impl Confirm for AssumeYes {
    async fn confirm(&self, prompt: &str) -> bool {
        tracing::debug!("Auto-confirmed: {}", prompt);
        true
    }
}

/// Always gives the same answer.
#[derive(Debug, Clone, Copy)]
pub struct FixedAnswer(pub bool);

#[async_trait]
impl Confirm for FixedAnswer {
    async fn confirm(&self, _prompt: &str) -> bool {
        self.0
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn fixed_answers() {
        assert!(AssumeYes.confirm("Reset?").await);
        assert!(!FixedAnswer(false).confirm("Reset?").await);
        assert!(FixedAnswer(true).confirm("Reset?").await);
    }
}
