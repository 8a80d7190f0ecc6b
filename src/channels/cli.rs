//! CLI channel: stdin/stdout REPL for walking through the questionnaire.

use std::io;
use std::sync::Arc;

use futures::{Stream, StreamExt, stream};
use tokio::io::{AsyncBufReadExt, BufReader};
use tokio::sync::broadcast;
use tracing::error;

use crate::chat::{ChatEvent, ChatService};
use crate::error::ChannelError;
use crate::flow::QuestionNode;
use crate::session::Sender;

/// What a line of input means.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CliCommand {
    Start,
    Reset,
    Submit,
    Help,
    Quit,
    Answer(String),
    /// Option number outside the offered range.
    BadChoice(usize),
    Empty,
}

impl CliCommand {
    /// Parse a line. A bare number picks that option of a fixed-choice node.
    pub fn parse(line: &str, current: Option<&QuestionNode>) -> Self {
        let trimmed = line.trim();
        match trimmed.to_lowercase().as_str() {
            "" => return Self::Empty,
            "/start" | "/new" => return Self::Start,
            "/reset" | "/clear" => return Self::Reset,
            "/submit" | "/done" => return Self::Submit,
            "/help" | "/?" => return Self::Help,
            "/quit" | "/exit" => return Self::Quit,
            _ => {}
        }

        if let (Some(node), Ok(n)) = (current, trimmed.parse::<usize>()) {
            if node.is_fixed_choice() {
                return match n.checked_sub(1).and_then(|i| node.options.get(i)) {
                    Some(option) => Self::Answer(option.clone()),
                    None => Self::BadChoice(n),
                };
            }
        }

        Self::Answer(line.to_string())
    }
}

/// A REPL bound to the chat service.
pub struct CliChannel {
    chat: Arc<ChatService>,
}

impl CliChannel {
    pub fn new(chat: Arc<ChatService>) -> Self {
        Self { chat }
    }

    /// Run on stdin until `/quit` or EOF.
    pub async fn run(&self) -> Result<(), ChannelError> {
        self.run_with(stdin_lines()).await
    }

    /// Run on any line source. A read error ends the session with
    /// `ChannelError::Disconnected`.
    pub async fn run_with<S>(&self, lines: S) -> Result<(), ChannelError>
    where
        S: Stream<Item = io::Result<String>>,
    {
        let printer = tokio::spawn(print_events(
            self.chat.subscribe(),
            Arc::clone(&self.chat),
        ));
        let result = self.repl(lines).await;
        printer.abort();
        result
    }

    async fn repl<S>(&self, lines: S) -> Result<(), ChannelError>
    where
        S: Stream<Item = io::Result<String>>,
    {
        eprintln!("Type /start to begin, /help for commands.");
        eprint!("> ");

        let mut lines = Box::pin(lines);
        while let Some(line) = lines.next().await {
            let line = line.map_err(|e| {
                error!("Error reading input: {}", e);
                ChannelError::Disconnected {
                    name: "cli".to_string(),
                    reason: e.to_string(),
                }
            })?;

            let current = self.chat.snapshot().await.current_node;
            match CliCommand::parse(&line, current.as_ref()) {
                CliCommand::Empty => {}
                CliCommand::Quit => break,
                CliCommand::Help => print_help(),
                CliCommand::Start => {
                    self.chat.start().await;
                }
                CliCommand::Reset => {
                    self.chat.reset().await;
                }
                CliCommand::Submit => {
                    if let Err(e) = self.chat.complete().await {
                        eprintln!("Could not send your information: {e}");
                    }
                }
                CliCommand::BadChoice(n) => eprintln!("There is no option {n}."),
                CliCommand::Answer(text) => {
                    if let Err(e) = self.chat.answer(&text).await {
                        eprintln!("{e}");
                    }
                }
            }
            eprint!("> ");
        }
        Ok(())
    }
}

/// Lines from stdin until EOF. A read error is yielded once, then the
/// stream ends.
fn stdin_lines() -> impl Stream<Item = io::Result<String>> {
    let lines = BufReader::new(tokio::io::stdin()).lines();
    stream::unfold(Some(lines), |state| async move {
        let mut lines = state?;
        match lines.next_line().await {
            Ok(Some(line)) => Some((Ok(line), Some(lines))),
            Ok(None) => None,
            Err(e) => Some((Err(e), None)),
        }
    })
}

fn print_help() {
    eprintln!("  /start   begin (or restart) the questionnaire");
    eprintln!("  /reset   discard the conversation");
    eprintln!("  /submit  save and send your information");
    eprintln!("  /quit    exit");
    eprintln!("  Pick an option by number, or type your answer.");
}

/// Render the options of a fixed-choice node as a numbered list.
pub fn format_options(node: &QuestionNode) -> Option<String> {
    if !node.is_fixed_choice() {
        return None;
    }
    let lines: Vec<String> = node
        .options
        .iter()
        .enumerate()
        .map(|(i, option)| format!("  {}. {}", i + 1, option))
        .collect();
    Some(lines.join("\n"))
}

async fn print_events(mut rx: broadcast::Receiver<ChatEvent>, chat: Arc<ChatService>) {
    loop {
        let event = match rx.recv().await {
            Ok(event) => event,
            Err(broadcast::error::RecvError::Lagged(_)) => continue,
            Err(broadcast::error::RecvError::Closed) => break,
        };

        match event {
            ChatEvent::SessionSync { session } => {
                if let Some(first) = session.transcript.first() {
                    println!("\n{}", first.text);
                }
                if let Some(options) = session.current_node.as_ref().and_then(format_options) {
                    println!("{options}");
                }
            }
            ChatEvent::MessageAppended { message } if message.sender == Sender::Assistant => {
                println!("\n{}", message.text);
                let current = chat.snapshot().await.current_node;
                if let Some(options) = current.as_ref().and_then(format_options) {
                    println!("{options}");
                }
            }
            ChatEvent::SessionComplete { .. } => {
                println!("\nChat completed! Type /submit to save and send your information.");
            }
            ChatEvent::Submitted { .. } => {
                println!("\nYour information has been sent. Thank you.");
            }
            ChatEvent::SessionReset => println!("\nConversation cleared."),
            _ => continue,
        }
        eprint!("> ");
    }
}
