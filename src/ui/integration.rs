// Integration layer between the terminal UI and the session handle

use crate::engine::{Board, PieceKind, Square, StandardRules};
use crate::selector::RandomSelector;
use crate::session::{Mode, SessionHandle, SubmitOutcome};
use crate::ui::{GameInterface, InputValidator, Notification};
use std::io;
use tokio::io::{AsyncBufReadExt, BufReader};
use tracing::debug;

// ============================================================================
// COMMANDS
// ============================================================================

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Command {
    Move {
        from: Square,
        to: Square,
        promotion: Option<PieceKind>,
    },
    Select(Square),
    Clear,
    SetMode(Mode),
    Reset,
    History,
    Fen,
    Flip,
    Help,
    Quit,
    Nothing,
}

impl Command {
    pub fn parse(line: &str) -> Result<Command, String> {
        let mut words = line.split_whitespace();
        let Some(first) = words.next() else {
            return Ok(Command::Nothing);
        };
        let arg = words.next();

        let command = match (first.to_lowercase().as_str(), arg) {
            ("select" | "s", Some(square)) => Command::Select(
                square
                    .parse()
                    .map_err(|_| format!("Invalid square: {}", square))?,
            ),
            ("select" | "s", None) => return Err("Usage: select <square>".to_string()),
            ("clear", None) => Command::Clear,
            ("mode", Some(mode)) => {
                Command::SetMode(mode.parse().map_err(|e| format!("{}", e))?)
            }
            ("mode", None) => return Err("Usage: mode human|bot".to_string()),
            ("reset" | "new", None) => Command::Reset,
            ("history" | "pgn", None) => Command::History,
            ("fen", None) => Command::Fen,
            ("flip" | "f", None) => Command::Flip,
            ("help" | "h" | "?", None) => Command::Help,
            ("quit" | "exit" | "q", None) => Command::Quit,
            ("move" | "m", Some(text)) => Self::parse_move(text)?,
            (text, None) => Self::parse_move(text)?,
            (other, Some(_)) => return Err(format!("Unknown command: {}", other)),
        };
        Ok(command)
    }

    fn parse_move(text: &str) -> Result<Command, String> {
        let (from, to, promotion) = InputValidator::validate_move(text)?;
        Ok(Command::Move {
            from,
            to,
            promotion,
        })
    }
}

enum Flow {
    Continue,
    Quit,
}

// ============================================================================
// TERMINAL APP
// ============================================================================

pub struct TerminalApp {
    handle: SessionHandle<StandardRules, RandomSelector>,
    interface: GameInterface,
    notice: Option<Notification>,
    help_requested: bool,
}

impl TerminalApp {
    pub fn new(handle: SessionHandle<StandardRules, RandomSelector>, interface: GameInterface) -> Self {
        Self {
            handle,
            interface,
            notice: Some(Notification::info("Type 'help' for commands.")),
            help_requested: false,
        }
    }

    /// Read commands from stdin until `quit` or end of input, redrawing
    /// whenever the session changes (including delayed bot moves).
    pub async fn run(&mut self) -> io::Result<()> {
        let mut lines = BufReader::new(tokio::io::stdin()).lines();
        let mut views = self.handle.subscribe();

        loop {
            let view = views.borrow_and_update().clone();
            self.interface.show_game_screen(&view);
            if let Some(notice) = self.notice.take() {
                notice.show();
            }
            // after the redraw, which clears the screen in colour mode
            if std::mem::take(&mut self.help_requested) {
                print!("{}", self.interface.help_text());
            }
            GameInterface::prompt();

            tokio::select! {
                line = lines.next_line() => {
                    let Some(line) = line? else {
                        break;
                    };
                    if let Flow::Quit = self.execute(&line, &view.position).await {
                        break;
                    }
                }
                changed = views.changed() => {
                    if changed.is_err() {
                        break;
                    }
                    debug!("session changed, redrawing");
                }
            }
        }

        println!("\n👋 Thank you for playing! Goodbye!\n");
        Ok(())
    }

    async fn execute(&mut self, line: &str, position: &Board) -> Flow {
        let command = match Command::parse(line) {
            Ok(command) => command,
            Err(message) => {
                self.notice = Some(Notification::error(message));
                return Flow::Continue;
            }
        };

        match command {
            Command::Move {
                from,
                to,
                promotion,
            } => {
                let outcome = match promotion {
                    Some(kind) => {
                        self.handle
                            .submit_move_with_promotion(from, to, kind)
                            .await
                    }
                    None => self.handle.submit_move(from, to).await,
                };
                self.notice = Self::describe_outcome(outcome, from, to);
            }
            Command::Select(square) => {
                if self.handle.highlight_moves(square).await.is_empty() {
                    self.notice = Some(Notification::warning(format!(
                        "No legal moves from {}",
                        square
                    )));
                }
            }
            Command::Clear => self.handle.clear_highlights().await,
            Command::SetMode(mode) => {
                self.handle.set_mode(mode).await;
                self.notice = Some(Notification::success(format!("Mode set to {}", mode)));
            }
            Command::Reset => {
                self.handle.reset().await;
                self.notice = Some(Notification::success("New game started"));
            }
            Command::History => {
                let movetext = self.handle.view().history.movetext();
                self.notice = Some(Notification::info(if movetext.is_empty() {
                    "No moves yet".to_string()
                } else {
                    movetext
                }));
            }
            Command::Fen => self.notice = Some(Notification::info(position.to_fen())),
            Command::Flip => self.interface.display.flip_board = !self.interface.display.flip_board,
            Command::Help => self.help_requested = true,
            Command::Quit => return Flow::Quit,
            Command::Nothing => {}
        }
        Flow::Continue
    }

    fn describe_outcome(outcome: SubmitOutcome, from: Square, to: Square) -> Option<Notification> {
        if outcome.is_pre_move {
            Some(Notification::info(format!("Pre-move queued: {} → {}", from, to)))
        } else if let Some(rejection) = outcome.rejection {
            Some(Notification::error(rejection.to_string()))
        } else {
            None
        }
    }
}

impl GameInterface {
    fn prompt() {
        use crate::ui::colors::*;
        use std::io::Write;

        print!("{}chess > {}", BRIGHT_CYAN, RESET);
        let _ = io::stdout().flush();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::session::SessionController;
    use crate::ui::BoardDisplay;

    fn sq(name: &str) -> Square {
        name.parse().unwrap()
    }

    #[test]
    fn test_parse_moves() {
        assert_eq!(
            Command::parse("e2e4").unwrap(),
            Command::Move {
                from: sq("e2"),
                to: sq("e4"),
                promotion: None
            }
        );
        assert_eq!(
            Command::parse("move e7e8n").unwrap(),
            Command::Move {
                from: sq("e7"),
                to: sq("e8"),
                promotion: Some(PieceKind::Knight)
            }
        );
        assert!(Command::parse("e2e9").is_err());
    }

    #[test]
    fn test_parse_commands() {
        assert_eq!(Command::parse("select e2").unwrap(), Command::Select(sq("e2")));
        assert_eq!(Command::parse("mode bot").unwrap(), Command::SetMode(Mode::Bot));
        assert_eq!(Command::parse("  ").unwrap(), Command::Nothing);
        assert_eq!(Command::parse("RESET").unwrap(), Command::Reset);
        assert_eq!(Command::parse("quit").unwrap(), Command::Quit);
        assert!(Command::parse("mode chaos").is_err());
        assert!(Command::parse("select").is_err());
        assert!(Command::parse("dance now").is_err());
    }

    #[tokio::test]
    async fn test_help_survives_until_next_redraw() {
        let controller = SessionController::new(StandardRules::new(), RandomSelector::seeded(3));
        let handle = SessionHandle::spawn(controller, std::time::Duration::from_millis(500));
        let mut app = TerminalApp::new(handle, GameInterface::with_display(BoardDisplay::plain()));
        let position = app.handle.view().position;

        assert!(matches!(app.execute("help", &position).await, Flow::Continue));
        assert!(app.help_requested);
    }

    #[test]
    fn test_describe_outcome() {
        let queued = SubmitOutcome {
            accepted: false,
            is_pre_move: true,
            rejection: None,
        };
        assert!(TerminalApp::describe_outcome(queued, sq("e7"), sq("e5")).is_some());
        let applied = SubmitOutcome {
            accepted: true,
            is_pre_move: false,
            rejection: None,
        };
        assert!(TerminalApp::describe_outcome(applied, sq("e2"), sq("e4")).is_none());
    }
}
