//! Line-oriented user commands.

use crate::error::{HostError, HostResult};
use tokio::io::{AsyncBufReadExt, AsyncRead, BufReader};
use tokio::sync::mpsc;

#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Command {
    /// Deliver the image behind the URL.
    Image(String),
    /// Send a video page link to the desktop app.
    Video(String),
    /// Deliver the most recent successful item again.
    Replay,
    Recent,
    Status,
    Quit,
}

impl Command {
    /// Parse one input line. Blank lines and `#` comments yield `None`.
    pub fn parse(line: &str) -> HostResult<Option<Command>> {
        let line = line.trim();
        if line.is_empty() || line.starts_with('#') {
            return Ok(None);
        }
        let (verb, rest) = match line.split_once(char::is_whitespace) {
            Some((verb, rest)) => (verb, rest.trim()),
            None => (line, ""),
        };
        let url = |name: &'static str| {
            if rest.is_empty() {
                Err(HostError::MissingUrl(name))
            } else {
                Ok(rest.to_string())
            }
        };
        let command = match verb.to_ascii_lowercase().as_str() {
            "image" | "img" => Command::Image(url("image")?),
            "video" => Command::Video(url("video")?),
            "replay" => Command::Replay,
            "recent" => Command::Recent,
            "status" => Command::Status,
            "quit" | "exit" => Command::Quit,
            _ => return Err(HostError::UnknownCommand(verb.to_string())),
        };
        Ok(Some(command))
    }
}

/// Read commands line by line and queue them for the dispatcher.
///
/// Stops at end of input, after queueing `quit`, or when the dispatcher is
/// gone. Unparseable lines are logged and skipped.
pub async fn read_commands<R>(input: R, tx: mpsc::Sender<Command>) -> HostResult<()>
where
    R: AsyncRead + Unpin,
{
    let mut lines = BufReader::new(input).lines();
    while let Some(line) = lines.next_line().await? {
        let command = match Command::parse(&line) {
            Ok(Some(c)) => c,
            Ok(None) => continue,
            Err(e) => {
                tracing::warn!("{}", e);
                continue;
            }
        };
        let quit = command == Command::Quit;
        if tx.send(command).await.is_err() {
            tracing::debug!("dispatcher closed; input reader stopping");
            break;
        }
        if quit {
            break;
        }
    }
    Ok(())
}
