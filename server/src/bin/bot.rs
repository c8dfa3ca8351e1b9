//! Scripted arena player for soak testing.
//!
//! Registers a name, then answers every turn prompt: a power move while the
//! menu still offers one, an attack otherwise.

use arena_protocol::{Command, TURN_PROMPT};
use clap::Parser;
use log::{info, warn};
use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::TcpStream;

#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
struct Args {
    /// Arena server address
    #[arg(short, long, default_value = "127.0.0.1:51360")]
    server: String,

    /// Display name to register with
    #[arg(short, long, default_value = "bot")]
    name: String,
}

/// Picks a reply for the text received since the last reply, if it ends a turn prompt.
fn choose_command(received: &str) -> Option<Command> {
    let menu = &received[received.rfind(TURN_PROMPT)?..];
    if menu.contains("(p)owermove") {
        Some(Command::PowerMove)
    } else {
        Some(Command::Attack)
    }
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error + Send + Sync>> {
    env_logger::init();
    let args = Args::parse();

    let mut stream = TcpStream::connect(&args.server).await?;
    info!("Connected to {}", args.server);
    stream
        .write_all(format!("{}\n", args.name).as_bytes())
        .await?;

    let mut buffer = [0u8; 1024];
    let mut received = String::new();

    loop {
        let len = stream.read(&mut buffer).await?;
        if len == 0 {
            warn!("Server closed the connection");
            return Ok(());
        }
        let chunk = String::from_utf8_lossy(&buffer[..len]);
        info!("{}", chunk.trim_end());
        received.push_str(&chunk);

        // the menu is complete once its last line has arrived
        if !received.ends_with("(m)ute chat\n") {
            continue;
        }
        if let Some(command) = choose_command(&received) {
            info!("Playing {:?}", command);
            stream
                .write_all(format!("{}\n", command.as_char()).as_bytes())
                .await?;
        }
        received.clear();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_prefers_power_move() {
        let text = format!("{}\n(a)ttack\n(p)owermove\n(m)ute chat\n", TURN_PROMPT);
        assert_eq!(choose_command(&text), Some(Command::PowerMove));
    }

    #[test]
    fn test_attacks_without_power_moves() {
        let text = format!("{}\n(a)ttack\n(s)peak something\n(m)ute chat\n", TURN_PROMPT);
        assert_eq!(choose_command(&text), Some(Command::Attack));
    }

    #[test]
    fn test_waits_without_prompt() {
        assert_eq!(choose_command("Waiting for Bob to strike...\n"), None);
    }
}
