// SPDX-License-Identifier: GPL-3.0-only

//! Yes/no confirmation collaborator used before destructive gallery commands

use futures::future::BoxFuture;
use std::io::{BufRead, Write};
use tracing::warn;

pub trait UserPrompt: Send + Sync {
    /// Ask `question`, resolving to true when the user agrees
    fn confirm<'a>(&'a self, question: &'a str) -> BoxFuture<'a, bool>;
}

/// Always answers the same way (`--yes`, tests)
#[derive(Debug, Clone, Copy)]
pub struct FixedAnswer(pub bool);

impl UserPrompt for FixedAnswer {
    fn confirm<'a>(&'a self, _question: &'a str) -> BoxFuture<'a, bool> {
        Box::pin(std::future::ready(self.0))
    }
}

/// Reads `y`/`n` from the terminal
#[derive(Debug, Default, Clone, Copy)]
pub struct TerminalPrompt;

impl UserPrompt for TerminalPrompt {
    fn confirm<'a>(&'a self, question: &'a str) -> BoxFuture<'a, bool> {
        let question = question.to_string();
        Box::pin(async move {
            let answer = tokio::task::spawn_blocking(move || {
                let mut stdout = std::io::stdout();
                let _ = write!(stdout, "{} [y/N] ", question);
                let _ = stdout.flush();

                let mut line = String::new();
                std::io::stdin().lock().read_line(&mut line).map(|_| line)
            })
            .await;

            match answer {
                Ok(Ok(line)) => is_yes(&line),
                Ok(Err(e)) => {
                    warn!(error = %e, "Failed to read confirmation");
                    false
                }
                Err(e) => {
                    warn!(error = %e, "Confirmation task failed");
                    false
                }
            }
        })
    }
}

fn is_yes(answer: &str) -> bool {
    matches!(answer.trim().to_ascii_lowercase().as_str(), "y" | "yes")
}
