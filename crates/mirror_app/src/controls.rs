use std::io::{self, BufRead};
use std::sync::mpsc;
use std::thread;

use mirror_core::Msg;
use mirror_logging::{mirror_info, mirror_warn};

/// Maps a console line to a run control message.
pub fn parse_command(line: &str) -> Option<Msg> {
    match line.trim().to_ascii_lowercase().as_str() {
        "p" | "pause" => Some(Msg::PauseClicked),
        "r" | "resume" => Some(Msg::ResumeClicked),
        "c" | "cancel" | "q" | "quit" => Some(Msg::CancelClicked),
        _ => None,
    }
}

/// Forwards pause/resume/cancel commands typed on stdin. Ends at EOF.
pub fn spawn_console(msg_tx: mpsc::Sender<Msg>) {
    thread::spawn(move || {
        for line in io::stdin().lock().lines() {
            let Ok(line) = line else { break };
            let Some(msg) = parse_command(&line) else {
                continue;
            };
            if msg_tx.send(msg).is_err() {
                break;
            }
        }
    });
}

/// Turns Ctrl-C into a cancel request instead of killing the process, so
/// the partial output can be removed.
pub fn spawn_ctrl_c(msg_tx: mpsc::Sender<Msg>) {
    thread::spawn(move || {
        let runtime = match tokio::runtime::Builder::new_current_thread()
            .enable_all()
            .build()
        {
            Ok(runtime) => runtime,
            Err(err) => {
                mirror_warn!("Ctrl-C handling unavailable: {}", err);
                return;
            }
        };
        runtime.block_on(async move {
            while tokio::signal::ctrl_c().await.is_ok() {
                mirror_info!("Ctrl-C received, cancelling run");
                if msg_tx.send(Msg::CancelClicked).is_err() {
                    break;
                }
            }
        });
    });
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn console_commands() {
        assert_eq!(parse_command("p\n"), Some(Msg::PauseClicked));
        assert_eq!(parse_command(" Resume "), Some(Msg::ResumeClicked));
        assert_eq!(parse_command("q"), Some(Msg::CancelClicked));
        assert_eq!(parse_command(""), None);
        assert_eq!(parse_command("start"), None);
    }
}
