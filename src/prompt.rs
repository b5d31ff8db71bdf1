//! Interactive operator input.
//!
//! Startup needs a human twice at most: to paste an OAuth token and to pick
//! a cloud or folder when the choice is ambiguous. Both go through [`Prompt`]
//! so they can be scripted.

use std::collections::VecDeque;

use async_trait::async_trait;
use thiserror::Error;
use tokio::io::{AsyncBufReadExt, AsyncWriteExt, BufReader, Lines, Stdin, Stdout};

#[derive(Debug, Error)]
pub enum PromptError {
    #[error("input closed while waiting for an answer")]
    Closed,

    #[error("console i/o: {0}")]
    Io(#[from] std::io::Error),
}

#[async_trait]
pub trait Prompt: Send {
    /// Show one line to the operator.
    async fn say(&mut self, line: &str) -> Result<(), PromptError>;

    /// Show `question` and read one line of input, trimmed.
    async fn ask(&mut self, question: &str) -> Result<String, PromptError>;
}

/// Prompt bound to the process stdin/stdout.
pub struct ConsolePrompt {
    input: Lines<BufReader<Stdin>>,
    output: Stdout,
}

impl ConsolePrompt {
    pub fn new() -> Self {
        Self {
            input: BufReader::new(tokio::io::stdin()).lines(),
            output: tokio::io::stdout(),
        }
    }
}

impl Default for ConsolePrompt {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl Prompt for ConsolePrompt {
    async fn say(&mut self, line: &str) -> Result<(), PromptError> {
        self.output.write_all(line.as_bytes()).await?;
        self.output.write_all(b"\n").await?;
        self.output.flush().await?;
        Ok(())
    }

    async fn ask(&mut self, question: &str) -> Result<String, PromptError> {
        self.output.write_all(question.as_bytes()).await?;
        self.output.flush().await?;
        match self.input.next_line().await? {
            Some(line) => Ok(line.trim().to_string()),
            None => Err(PromptError::Closed),
        }
    }
}

/// Prompt that replays canned answers and records everything shown.
///
/// Running out of answers behaves like a closed console.
#[derive(Debug, Default)]
pub struct ScriptedPrompt {
    answers: VecDeque<String>,
    transcript: Vec<String>,
    questions: usize,
}

impl ScriptedPrompt {
    pub fn new<I, S>(answers: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            answers: answers.into_iter().map(Into::into).collect(),
            transcript: Vec::new(),
            questions: 0,
        }
    }

    /// Lines and questions shown so far, in order.
    pub fn transcript(&self) -> &[String] {
        &self.transcript
    }

    /// How many times input was requested.
    pub fn questions_asked(&self) -> usize {
        self.questions
    }

    pub fn remaining_answers(&self) -> usize {
        self.answers.len()
    }
}

#[async_trait]
impl Prompt for ScriptedPrompt {
    async fn say(&mut self, line: &str) -> Result<(), PromptError> {
        self.transcript.push(line.to_string());
        Ok(())
    }

    async fn ask(&mut self, question: &str) -> Result<String, PromptError> {
        self.transcript.push(question.to_string());
        self.questions += 1;
        self.answers
            .pop_front()
            .map(|a| a.trim().to_string())
            .ok_or(PromptError::Closed)
    }
}
