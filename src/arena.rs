use crate::bot::{Bot, BotError};
use crate::game::{Board, Side, WinReason};
use rand::SeedableRng;
use rand::rngs::StdRng;
use serde::Serialize;

pub struct MatchConfig {
    /// Per-side move cap handed to the board; `None` for unlimited play.
    pub move_limit: Option<usize>,
    /// Seed for the shared random source; `None` draws from entropy.
    pub seed: Option<u64>,
    /// Safety net for games that neither side can finish.
    pub max_moves: usize,
}

impl Default for MatchConfig {
    fn default() -> Self {
        MatchConfig {
            move_limit: None,
            seed: None,
            max_moves: 1000,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum MatchResult {
    AttackersWin {
        winner_name: String,
        moves: usize,
        reason: WinReason,
    },
    DefendersWin {
        winner_name: String,
        moves: usize,
        reason: WinReason,
    },
    /// A player could not produce a move.
    NoMove { violator: String, winner: String },
    IllegalMove { violator: String, winner: String },
    Abandoned { moves: usize },
}

impl MatchResult {
    pub fn winner(&self) -> Option<&str> {
        match self {
            MatchResult::AttackersWin { winner_name, .. } => Some(winner_name),
            MatchResult::DefendersWin { winner_name, .. } => Some(winner_name),
            MatchResult::NoMove { winner, .. } => Some(winner),
            MatchResult::IllegalMove { winner, .. } => Some(winner),
            MatchResult::Abandoned { .. } => None,
        }
    }
}

/// Outcome record printed by the binary with `--json`.
#[derive(Debug, Serialize)]
pub struct MatchSummary {
    pub attackers: String,
    pub defenders: String,
    pub winner: Option<Side>,
    pub reason: Option<WinReason>,
    pub outcome: String,
    pub moves: usize,
    pub position: String,
}

pub struct Match {
    config: MatchConfig,
    board: Board,
    attacker_bot: Box<dyn Bot>,
    defender_bot: Box<dyn Bot>,
    rng: StdRng,
    verbose: bool,
}

impl Match {
    pub fn new(
        attacker_bot: Box<dyn Bot>,
        defender_bot: Box<dyn Bot>,
        config: MatchConfig,
        verbose: bool,
    ) -> Self {
        let mut board = Board::new();
        if let Some(limit) = config.move_limit {
            board.set_move_limit(limit);
        }
        let rng = match config.seed {
            Some(seed) => StdRng::seed_from_u64(seed),
            None => StdRng::from_entropy(),
        };

        Match {
            config,
            board,
            attacker_bot,
            defender_bot,
            rng,
            verbose,
        }
    }

    pub fn board(&self) -> &Board {
        &self.board
    }

    pub fn play(&mut self) -> MatchResult {
        self.attacker_bot.game_start(Side::Attacking);
        self.defender_bot.game_start(Side::Defending);

        if self.verbose {
            println!("Match starting:");
            println!("  Attackers: {}", self.attacker_bot.name());
            println!("  Defenders: {}", self.defender_bot.name());
            if let Some(limit) = self.board.move_limit() {
                println!("  Move limit: {}", limit);
            }
            println!("\nInitial board:");
            println!("{}", self.board);
        }

        while !self.board.is_game_over() {
            if self.board.move_count() >= self.config.max_moves {
                if self.verbose {
                    println!("\nMax moves ({}) reached - abandoned", self.config.max_moves);
                }
                return self.finish(MatchResult::Abandoned {
                    moves: self.board.move_count(),
                });
            }

            if let Some(result) = self.play_turn() {
                return self.finish(result);
            }
        }

        let moves = self.board.move_count();
        let reason = self.board.win_reason().unwrap_or(WinReason::NoMoves);
        let result = match self.board.winner() {
            Some(Side::Attacking) => MatchResult::AttackersWin {
                winner_name: self.attacker_bot.name().to_string(),
                moves,
                reason,
            },
            Some(Side::Defending) => MatchResult::DefendersWin {
                winner_name: self.defender_bot.name().to_string(),
                moves,
                reason,
            },
            None => MatchResult::Abandoned { moves },
        };

        if self.verbose {
            if let Some(side) = self.board.winner() {
                println!("\n{} win ({}) after {} moves", side, reason, moves);
            }
        }

        self.finish(result)
    }

    fn finish(&mut self, result: MatchResult) -> MatchResult {
        self.attacker_bot.game_end();
        self.defender_bot.game_end();
        result
    }

    fn play_turn(&mut self) -> Option<MatchResult> {
        let side = self.board.turn();
        let (bot, opponent) = match side {
            Side::Attacking => (&mut self.attacker_bot, &self.defender_bot),
            Side::Defending => (&mut self.defender_bot, &self.attacker_bot),
        };

        if self.verbose && !bot.is_manual() {
            println!(
                "\nMove {}: {} ({}) to play",
                self.board.move_count() + 1,
                bot.name(),
                side
            );
        }

        let mv = match bot.get_move(&self.board, &mut self.rng) {
            Ok(mv) => mv,
            Err(BotError::InputClosed) => {
                if self.verbose {
                    println!("{} left the game", bot.name());
                }
                return Some(MatchResult::Abandoned {
                    moves: self.board.move_count(),
                });
            }
            Err(e) => {
                if self.verbose {
                    println!("{} returned no move: {}", bot.name(), e);
                }
                return Some(MatchResult::NoMove {
                    violator: bot.name().to_string(),
                    winner: opponent.name().to_string(),
                });
            }
        };

        if let Err(e) = self.board.try_make_move(mv) {
            if self.verbose {
                println!("ILLEGAL MOVE: {} - {}", bot.name(), e);
            }
            return Some(MatchResult::IllegalMove {
                violator: bot.name().to_string(),
                winner: opponent.name().to_string(),
            });
        }

        if self.verbose {
            if !bot.is_manual() {
                println!("* {}", mv);
            }
            println!("{}", self.board);
        }

        self.attacker_bot.notify_move(mv);
        self.defender_bot.notify_move(mv);

        None
    }

    pub fn summary(&self, result: &MatchResult) -> MatchSummary {
        let outcome = match result {
            MatchResult::AttackersWin { .. } => "attackers_win",
            MatchResult::DefendersWin { .. } => "defenders_win",
            MatchResult::NoMove { .. } => "no_move",
            MatchResult::IllegalMove { .. } => "illegal_move",
            MatchResult::Abandoned { .. } => "abandoned",
        };

        MatchSummary {
            attackers: self.attacker_bot.name().to_string(),
            defenders: self.defender_bot.name().to_string(),
            winner: self.board.winner(),
            reason: self.board.win_reason(),
            outcome: outcome.to_string(),
            moves: self.board.move_count(),
            position: self.board.encoded(),
        }
    }
}
