//! Interactive chat loop over stdin.

use std::io::Write;

use courier_chat::{ChatError, Conversation, Router};
use courier_core::{AiMode, SessionStore};
use tokio::io::{AsyncBufReadExt, BufReader};

/// One line of user input.
#[derive(Debug, PartialEq, Eq)]
pub enum Command {
    Send(String),
    NewChat,
    ResetSession,
    Mode(Result<AiMode, String>),
    ShowSession,
    Help,
    Quit,
    Blank,
}

impl Command {
    pub fn parse(line: &str) -> Self {
        let line = line.trim();
        if line.is_empty() {
            return Command::Blank;
        }
        let Some(rest) = line.strip_prefix('/') else {
            return Command::Send(line.to_string());
        };
        let (name, arg) = match rest.split_once(char::is_whitespace) {
            Some((name, arg)) => (name, arg.trim()),
            None => (rest, ""),
        };
        match name {
            "new" => Command::NewChat,
            "reset" => Command::ResetSession,
            "mode" if arg.is_empty() => Command::Mode(Err("usage: /mode <gemini|workflow|hybrid>".into())),
            "mode" => Command::Mode(arg.parse()),
            "session" => Command::ShowSession,
            "quit" | "exit" => Command::Quit,
            "help" => Command::Help,
            _ => Command::Send(line.to_string()),
        }
    }
}

const HELP: &str = "/new      start a new chat (keeps the session)
/reset    replace the session identifier
/mode <m> switch routing mode (gemini, workflow, hybrid)
/session  show the session identifier
/quit     exit";

fn prompt(mode: AiMode) {
    print!("[{mode}] > ");
    let _ = std::io::stdout().flush();
}

/// Read lines until EOF or `/quit`.
pub async fn run(
    conversation: &Conversation,
    router: &Router,
    store: &SessionStore,
) -> Result<(), Box<dyn std::error::Error>> {
    println!("courier {} (type /help for commands)", env!("CARGO_PKG_VERSION"));
    let mut lines = BufReader::new(tokio::io::stdin()).lines();

    prompt(conversation.mode());
    while let Some(line) = lines.next_line().await? {
        match Command::parse(&line) {
            Command::Blank => {}
            Command::Quit => break,
            Command::Help => println!("{HELP}"),
            Command::NewChat => {
                conversation.new_chat();
                println!("Started a new chat.");
            }
            Command::ResetSession => match conversation.reset_session(store) {
                Ok(id) => println!("New session: {id}"),
                Err(e) => {
                    tracing::error!(error = %e, "Session reset failed");
                    println!("Could not reset the session: {e}");
                }
            },
            Command::Mode(Ok(mode)) => {
                conversation.set_mode(mode);
                println!("Mode set to {mode}.");
            }
            Command::Mode(Err(e)) => println!("{e}"),
            Command::ShowSession => println!("{}", conversation.session()),
            Command::Send(text) => match conversation.send(router, &text).await {
                Ok(reply) => println!("{}\n", reply.text),
                Err(ChatError::EmptyMessage) => {}
                Err(e) => println!("{e}"),
            },
        }
        prompt(conversation.mode());
    }
    Ok(())
}
