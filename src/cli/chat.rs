//! Interactive question loop
//!
//! Each line is an independent question; nothing is carried between turns.

use anyhow::Result;
use colored::Colorize;
use rustyline::error::ReadlineError;
use rustyline::DefaultEditor;
use std::path::PathBuf;

use crate::assistant::{greeting, Assistant};

/// What a line of input asks for
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ChatCommand {
    Start,
    Exit,
    Empty,
    Question(String),
}

impl ChatCommand {
    pub fn parse(line: &str) -> Self {
        match line.trim() {
            "" => ChatCommand::Empty,
            "/start" => ChatCommand::Start,
            "/exit" | "/quit" => ChatCommand::Exit,
            question => ChatCommand::Question(question.to_string()),
        }
    }
}

/// Readline front with optional persistent history
pub struct ChatInput {
    editor: DefaultEditor,
    history_path: Option<PathBuf>,
    prompt: String,
}

impl ChatInput {
    pub fn new() -> Result<Self> {
        Ok(Self {
            editor: DefaultEditor::new()?,
            history_path: None,
            prompt: "> ".to_string(),
        })
    }

    /// Load history from `history_file` if it exists; saved on `save_history`
    pub fn with_history(history_file: PathBuf) -> Result<Self> {
        let mut input = Self::new()?;
        if history_file.exists() {
            let _ = input.editor.load_history(&history_file);
        }
        input.history_path = Some(history_file);
        Ok(input)
    }

    /// `Ok(None)` on Ctrl-D or Ctrl-C
    pub fn read_line(&mut self) -> Result<Option<String>> {
        match self.editor.readline(&self.prompt) {
            Ok(line) => {
                let trimmed = line.trim();
                if !trimmed.is_empty() {
                    let _ = self.editor.add_history_entry(trimmed);
                }
                Ok(Some(trimmed.to_string()))
            }
            Err(ReadlineError::Interrupted) | Err(ReadlineError::Eof) => Ok(None),
            Err(err) => Err(anyhow::anyhow!("Readline error: {}", err)),
        }
    }

    pub fn save_history(&mut self) -> Result<()> {
        if let Some(ref path) = self.history_path {
            if let Some(parent) = path.parent() {
                std::fs::create_dir_all(parent)?;
            }
            self.editor.save_history(path)?;
        }
        Ok(())
    }
}

/// ~/.sitebuddy/history
pub fn default_history_path() -> Option<PathBuf> {
    dirs::home_dir().map(|home| home.join(".sitebuddy").join("history"))
}

/// Run the loop until `/exit` or end of input
pub async fn run(assistant: &Assistant, company: &str) -> Result<()> {
    let mut input = match default_history_path() {
        Some(path) => ChatInput::with_history(path)?,
        None => ChatInput::new()?,
    };

    println!("{}", greeting(company).bright_cyan());
    println!("{}", "Type /exit to quit.".dimmed());

    while let Some(line) = input.read_line()? {
        match ChatCommand::parse(&line) {
            ChatCommand::Empty => continue,
            ChatCommand::Exit => break,
            ChatCommand::Start => println!("{}", greeting(company).bright_cyan()),
            ChatCommand::Question(question) => match assistant.answer(&question).await {
                Ok(answer) => println!("{}\n", answer),
                Err(e) => {
                    tracing::error!(error = %e, "failed to answer");
                    println!("{} {}\n", "✗".red(), "Something went wrong, please try again later.".red());
                }
            },
        }
    }

    if let Err(e) = input.save_history() {
        tracing::warn!(error = %e, "failed to save chat history");
    }
    Ok(())
}
