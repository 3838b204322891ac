//! In this module, we implement the operator side of a running batch.
//! Commands are read line by line from stdin and forwarded to the scheduler,
//! while progress updates coming back are logged.

use std::io::BufRead;

use crossbeam_channel::{Receiver, Sender};
use tracing::{error, info};

use crate::{
    engine::SavePolicy,
    scheduler::{Command, Progress, ProgressEvent},
};

pub const HELP: &str =
    "commands: pause | resume | redo | restart | save | skip [save|discard] | abort | help";

/// Questions the console is waiting on an answer for
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Question {
    Restart,
    Abort,
    SkipSave,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Reply {
    Send(Command),
    Ask(&'static str),
    Say(&'static str),
}

/// Turns operator input into commands, asking for confirmation before
/// anything that throws away data
#[derive(Debug, Default)]
pub struct Console {
    question: Option<Question>,
}

impl Console {
    pub fn feed(&mut self, line: &str) -> Reply {
        let words: Vec<_> = line.split_whitespace().collect();
        if let Some(question) = self.question.take() {
            return Self::answer(question, words.first().copied().unwrap_or(""));
        }
        match words.as_slice() {
            ["pause"] => Reply::Send(Command::Pause),
            ["resume"] => Reply::Send(Command::Resume),
            ["redo"] => Reply::Send(Command::RedoSweep),
            ["save"] => Reply::Send(Command::SaveAndContinue),
            ["skip", "save"] => Reply::Send(Command::SkipWindow(SavePolicy::Save)),
            ["skip", "discard"] => Reply::Send(Command::SkipWindow(SavePolicy::Discard)),
            ["skip"] => {
                self.question = Some(Question::SkipSave);
                Reply::Ask("Save acquired data for the current window? [yes/no/cancel]")
            }
            ["restart"] => {
                self.question = Some(Question::Restart);
                Reply::Ask("Restart will erase all cached averages. Proceed? [yes/no]")
            }
            ["abort"] => {
                self.question = Some(Question::Abort);
                Reply::Ask("Aborting discards all unsaved data. Proceed? [yes/no]")
            }
            [] => Reply::Say(""),
            _ => Reply::Say(HELP),
        }
    }

    fn answer(question: Question, word: &str) -> Reply {
        let yes = matches!(word, "y" | "yes");
        let no = matches!(word, "n" | "no");
        match question {
            Question::Restart if yes => Reply::Send(Command::RestartAverages),
            Question::Abort if yes => Reply::Send(Command::AbortBatch),
            Question::SkipSave if yes => Reply::Send(Command::SkipWindow(SavePolicy::Save)),
            Question::SkipSave if no => Reply::Send(Command::SkipWindow(SavePolicy::Discard)),
            _ => Reply::Say("Cancelled"),
        }
    }
}

/// Forward stdin to the scheduler until stdin closes or the scheduler is gone
pub fn operator_console(input: impl BufRead, commands: Sender<Command>) {
    let mut console = Console::default();
    println!("{HELP}");
    for line in input.lines() {
        let Ok(line) = line else {
            break;
        };
        match console.feed(&line) {
            Reply::Send(cmd) => {
                if commands.send(cmd).is_err() {
                    break;
                }
            }
            Reply::Ask(text) | Reply::Say(text) => {
                if !text.is_empty() {
                    println!("{text}");
                }
            }
        }
    }
}

/// Log progress as it comes in; returns once the scheduler hangs up
pub fn progress_logger(progress: Receiver<Progress>) {
    for update in progress {
        let position = match update.entry_index {
            Some(i) if i < update.entry_count => format!("window {}/{}", i + 1, update.entry_count),
            _ => format!("{} windows", update.entry_count),
        };
        match (&update.event, update.sweep) {
            (ProgressEvent::Error(msg), _) => error!("{position}: {msg}"),
            (ProgressEvent::Point, Some(s)) => info!(
                "{position}: point {}/{} at {:.3} MHz, average {}/{} ({:?})",
                s.index + 1,
                s.points,
                s.frequency_mhz,
                s.completed_averages,
                s.target_averages,
                s.state
            ),
            (event, _) => info!("{position}: {event:?}"),
        }
    }
}

#[cfg(test)]
mod tests {
    use std::io::Cursor;

    use crossbeam_channel::unbounded;

    use super::*;

    #[test]
    fn test_plain_commands() {
        let mut console = Console::default();
        assert_eq!(console.feed("pause"), Reply::Send(Command::Pause));
        assert_eq!(console.feed("  resume "), Reply::Send(Command::Resume));
        assert_eq!(console.feed("redo"), Reply::Send(Command::RedoSweep));
        assert_eq!(console.feed("save"), Reply::Send(Command::SaveAndContinue));
        assert_eq!(
            console.feed("skip discard"),
            Reply::Send(Command::SkipWindow(SavePolicy::Discard))
        );
        assert_eq!(console.feed("bogus"), Reply::Say(HELP));
    }

    #[test]
    fn test_restart_needs_confirmation() {
        let mut console = Console::default();
        assert!(matches!(console.feed("restart"), Reply::Ask(_)));
        assert_eq!(console.feed("no"), Reply::Say("Cancelled"));
        assert!(matches!(console.feed("restart"), Reply::Ask(_)));
        assert_eq!(console.feed("yes"), Reply::Send(Command::RestartAverages));
    }

    #[test]
    fn test_skip_question() {
        let mut console = Console::default();
        assert!(matches!(console.feed("skip"), Reply::Ask(_)));
        assert_eq!(
            console.feed("n"),
            Reply::Send(Command::SkipWindow(SavePolicy::Discard))
        );
        assert!(matches!(console.feed("skip"), Reply::Ask(_)));
        assert_eq!(console.feed("cancel"), Reply::Say("Cancelled"));
    }

    #[test]
    fn test_console_forwards_commands() {
        let (tx, rx) = unbounded();
        let input = Cursor::new("pause\nabort\nyes\n");
        operator_console(input, tx);
        let cmds: Vec<_> = rx.try_iter().collect();
        assert_eq!(cmds, vec![Command::Pause, Command::AbortBatch]);
    }
}
