//! Operator console driving the mock board.
//!
//! Each line read from the console is one command:
//!
//! | Command | Effect |
//! |---|---|
//! | `enter`, `up`, `down`, `right`, `left` | press a keypad button |
//! | `key up down left right up down` | ENTER followed by six presses |
//! | `bolt engaged` / `bolt disengaged` | set the bolt sensor |
//! | `power on` / `power off` | set the external power detector |
//! | `battery <raw>` | set the raw battery ADC sample |
//! | `quit` | stop the emulator |

use padlock_core::{BoltSensorState, Button, constants::KEY_LENGTH};
use padlock_hardware::mock::{MockBoardHandle, MockKeypadHandle};
use std::str::FromStr;
use thiserror::Error;
use tokio::io::{AsyncBufRead, AsyncBufReadExt};
use tracing::{info, warn};

#[derive(Debug, Error, PartialEq, Eq)]
pub enum ConsoleError {
    #[error("unknown command '{0}'")]
    UnknownCommand(String),

    #[error("'{command}' expects {expected}")]
    BadArgument {
        command: &'static str,
        expected: &'static str,
    },
}

/// One parsed console line.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ConsoleCommand {
    Press(Button),
    Key(Vec<Button>),
    Bolt(BoltSensorState),
    Power(bool),
    Battery(u16),
    Quit,
}

impl FromStr for ConsoleCommand {
    type Err = ConsoleError;

    fn from_str(line: &str) -> Result<Self, Self::Err> {
        let mut words = line.split_whitespace();
        let Some(head) = words.next() else {
            return Err(ConsoleError::UnknownCommand(String::new()));
        };
        let rest: Vec<&str> = words.collect();

        match (head.to_ascii_lowercase().as_str(), rest.as_slice()) {
            ("quit" | "exit", []) => Ok(Self::Quit),
            ("bolt", ["engaged"]) => Ok(Self::Bolt(BoltSensorState::Engaged)),
            ("bolt", ["disengaged"]) => Ok(Self::Bolt(BoltSensorState::Disengaged)),
            ("bolt", _) => Err(ConsoleError::BadArgument {
                command: "bolt",
                expected: "engaged or disengaged",
            }),
            ("power", ["on"]) => Ok(Self::Power(true)),
            ("power", ["off"]) => Ok(Self::Power(false)),
            ("power", _) => Err(ConsoleError::BadArgument {
                command: "power",
                expected: "on or off",
            }),
            ("battery", [raw]) => raw.parse().map(Self::Battery).map_err(|_| {
                ConsoleError::BadArgument {
                    command: "battery",
                    expected: "a raw sample between 0 and 65535",
                }
            }),
            ("battery", _) => Err(ConsoleError::BadArgument {
                command: "battery",
                expected: "a raw sample between 0 and 65535",
            }),
            ("key", symbols) => {
                let buttons: Option<Vec<Button>> = symbols
                    .iter()
                    .map(|s| s.parse::<Button>().ok().filter(|b| b.symbol().is_some()))
                    .collect();
                match buttons {
                    Some(buttons) if buttons.len() == KEY_LENGTH => Ok(Self::Key(buttons)),
                    _ => Err(ConsoleError::BadArgument {
                        command: "key",
                        expected: "six directions",
                    }),
                }
            }
            (name, []) => name
                .parse::<Button>()
                .map(Self::Press)
                .map_err(|_| ConsoleError::UnknownCommand(line.trim().to_string())),
            _ => Err(ConsoleError::UnknownCommand(line.trim().to_string())),
        }
    }
}

/// Board and keypad the console acts on.
#[derive(Debug, Clone)]
pub struct Console {
    keypad: MockKeypadHandle,
    board: MockBoardHandle,
}

impl Console {
    pub fn new(keypad: MockKeypadHandle, board: MockBoardHandle) -> Self {
        Self { keypad, board }
    }

    /// Apply one command. Returns `false` on `quit`.
    ///
    /// # Errors
    ///
    /// Returns an error if the keypad has been dropped.
    pub async fn apply(&self, command: ConsoleCommand) -> padlock_hardware::Result<bool> {
        match command {
            ConsoleCommand::Press(button) => self.keypad.press(button).await?,
            ConsoleCommand::Key(buttons) => self.keypad.enter_key(&buttons).await?,
            ConsoleCommand::Bolt(state) => self.board.set_bolt(state),
            ConsoleCommand::Power(present) => self.board.set_external_power(present),
            ConsoleCommand::Battery(raw) => self.board.set_battery_raw(raw),
            ConsoleCommand::Quit => return Ok(false),
        }
        Ok(true)
    }

    /// Read commands until `quit` or end of input.
    ///
    /// # Errors
    ///
    /// Returns an error if the input cannot be read.
    pub async fn run<I>(&self, input: I) -> std::io::Result<()>
    where
        I: AsyncBufRead + Unpin,
    {
        let mut lines = input.lines();
        while let Some(line) = lines.next_line().await? {
            if line.trim().is_empty() {
                continue;
            }
            let command = match line.parse::<ConsoleCommand>() {
                Ok(command) => command,
                Err(e) => {
                    warn!("{}", e);
                    continue;
                }
            };
            match self.apply(command).await {
                Ok(true) => {}
                Ok(false) => break,
                Err(e) => {
                    warn!("Keypad unavailable: {}", e);
                    break;
                }
            }
        }
        info!("Console closed");
        Ok(())
    }
}
