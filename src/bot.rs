use crate::game::{Board, Move, Side};
use rand::RngCore;
use std::io::{self, BufRead, Write};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum BotError {
    #[error("no legal move available")]
    NoMoveAvailable,
    #[error("asked to move when it is not my turn")]
    NotMyTurn,
    #[error("move input closed")]
    InputClosed,
    #[error("I/O error: {0}")]
    Io(#[from] io::Error),
}

/// Trait for anything that can pick moves for one side
pub trait Bot {
    /// Get the name of the bot
    fn name(&self) -> &str;

    /// Choose a move for the side to move on `board`.
    /// Randomness, if any, must come from `rng` so games can be replayed.
    fn get_move(&mut self, board: &Board, rng: &mut dyn RngCore) -> Result<Move, BotError>;

    /// Whether moves come from a person rather than a search
    fn is_manual(&self) -> bool {
        false
    }

    /// Notified when the game starts
    fn game_start(&mut self, _side: Side) {}

    /// Notified when a move is made (by either side)
    fn notify_move(&mut self, _mv: Move) {}

    /// Notified when the game ends
    fn game_end(&mut self) {}
}

/// Reads moves typed as `e5-e9`, one per line.
pub struct ManualPlayer<R, W> {
    name: String,
    input: R,
    output: W,
}

impl<R: BufRead, W: Write> ManualPlayer<R, W> {
    pub fn new(name: String, input: R, output: W) -> Self {
        ManualPlayer {
            name,
            input,
            output,
        }
    }
}

impl ManualPlayer<io::StdinLock<'static>, io::Stdout> {
    pub fn stdio(name: String) -> Self {
        Self::new(name, io::stdin().lock(), io::stdout())
    }
}

impl<R: BufRead, W: Write> Bot for ManualPlayer<R, W> {
    fn name(&self) -> &str {
        &self.name
    }

    fn get_move(&mut self, board: &Board, _rng: &mut dyn RngCore) -> Result<Move, BotError> {
        let mut line = String::new();
        loop {
            write!(self.output, "{}> ", board.turn().letter())?;
            self.output.flush()?;

            line.clear();
            if self.input.read_line(&mut line)? == 0 {
                return Err(BotError::InputClosed);
            }
            let text = line.trim();
            if text.is_empty() {
                continue;
            }

            match text.parse::<Move>() {
                Ok(mv) if board.is_legal(mv) => return Ok(mv),
                Ok(mv) => writeln!(self.output, "Illegal move: {}", mv)?,
                Err(e) => writeln!(self.output, "{}", e)?,
            }
        }
    }

    fn is_manual(&self) -> bool {
        true
    }
}
