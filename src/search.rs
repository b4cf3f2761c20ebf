//! Heuristic move selection.
//!
//! Defenders look for the cheapest way to walk the king to an edge, where
//! every square crossed costs one and every friendly piece in the way costs
//! one more. Attackers look for a move that captures, preferring a king
//! capture, then pieces under the most pressure.

use crate::bot::{Bot, BotError};
use crate::game::{Board, DIRECTIONS, Move, Piece, Side, Square};
use rand::{Rng, RngCore};
use std::collections::{BTreeMap, HashMap};

/// Paths costing more than this are abandoned.
const ESCAPE_SCORE_CEILING: u32 = 4;

#[derive(Debug, Clone)]
struct EscapePath {
    moves: Vec<Move>,
    at: Square,
    score: u32,
    complete: bool,
}

impl EscapePath {
    fn start(king: Square) -> Self {
        EscapePath {
            moves: Vec::new(),
            at: king,
            score: 0,
            complete: false,
        }
    }

    /// One new path per empty square reachable in a straight line. Rays stop
    /// at attackers and the board edge; friendly pieces are passed at a cost.
    fn extensions(&self, board: &Board) -> Vec<EscapePath> {
        let mut out = Vec::new();

        for (dc, dr) in DIRECTIONS {
            let mut crowd = 0;
            let mut cur = self.at;
            while let Some(next) = cur.offset(dc, dr) {
                cur = next;
                match board.get(next) {
                    Piece::Attacker => break,
                    Piece::Defender | Piece::King => crowd += 1,
                    Piece::Empty => {
                        let score = self.score + crowd + 1;
                        if score > ESCAPE_SCORE_CEILING {
                            break;
                        }
                        if let Some(step) = Move::new(self.at, next) {
                            let mut moves = self.moves.clone();
                            moves.push(step);
                            out.push(EscapePath {
                                moves,
                                at: next,
                                score,
                                complete: next.is_edge(),
                            });
                        }
                    }
                }
            }
        }

        out
    }
}

/// All complete escape paths for the king on `king`.
fn escape_paths(board: &Board, king: Square) -> Vec<EscapePath> {
    // Working copy with the king lifted so later legs can cross its square
    let mut scratch = board.clone();
    scratch.put(Piece::Empty, king);

    let mut best: HashMap<Square, u32> = HashMap::from([(king, 0)]);
    let mut open = vec![EscapePath::start(king)];
    let mut complete = Vec::new();

    while !open.is_empty() {
        let children: Vec<EscapePath> = open.iter().flat_map(|p| p.extensions(&scratch)).collect();
        for child in &children {
            let entry = best.entry(child.at).or_insert(child.score);
            *entry = (*entry).min(child.score);
        }

        // A path reaching a square at a higher cost than another can never
        // finish cheaper than it
        let (done, pending): (Vec<_>, Vec<_>) = children
            .into_iter()
            .filter(|c| best.get(&c.at).is_some_and(|&b| c.score <= b))
            .partition(|c| c.complete);
        complete.extend(done);
        open = pending;
    }

    complete
}

/// Direction preference when a blocker steps aside: east, west, north, south.
const LANE_ORDER: [(i32, i32); 4] = [(1, 0), (-1, 0), (0, 1), (0, -1)];

/// Longest move available to `blocker`; ties go to the earlier direction in
/// `LANE_ORDER`.
fn lane_clearing_move(board: &Board, blocker: Square) -> Option<Move> {
    let moves = board.moves_from(blocker);
    let heading = |mv: &Move| {
        (
            (mv.to().col() as i32 - mv.from().col() as i32).signum(),
            (mv.to().row() as i32 - mv.from().row() as i32).signum(),
        )
    };

    let mut best: Option<Move> = None;
    for dir in LANE_ORDER {
        for &mv in moves.iter().filter(|mv| heading(*mv) == dir) {
            if best.is_none_or(|b| mv.distance() > b.distance()) {
                best = Some(mv);
            }
        }
    }
    best
}

/// Neighbors that are off-board or enemy, minus neighbors that are friendly.
fn threat_score(board: &Board, sq: Square, side: Side) -> i32 {
    DIRECTIONS
        .iter()
        .map(|&(dc, dr)| match sq.offset(dc, dr).map(|n| board.get(n).side()) {
            None => 1,
            Some(Some(owner)) if owner == side => -1,
            Some(Some(_)) => 1,
            Some(None) => 0,
        })
        .sum()
}

/// A move by `side`'s ordinary pieces that captures something. Pieces are
/// tried in tiers of decreasing threat score.
fn capture_move(board: &Board, side: Side) -> Option<Move> {
    let mover = match side {
        Side::Attacking => Piece::Attacker,
        Side::Defending => Piece::Defender,
    };

    let mut tiers: BTreeMap<i32, Vec<Square>> = BTreeMap::new();
    for sq in board.pieces(mover) {
        tiers.entry(threat_score(board, sq, side)).or_default().push(sq);
    }

    tiers.values().rev().find_map(|tier| {
        tier.iter()
            .flat_map(|&sq| board.moves_from(sq))
            .find(|&mv| !board.captures_for(mv).is_empty())
    })
}

/// An attacker move onto the far side of the king from an attacker already
/// touching it, if that move takes the king.
fn king_capture_move(board: &Board) -> Option<Move> {
    let king = board.king_position()?;
    let moves = board.legal_moves(Side::Attacking);

    for (dc, dr) in DIRECTIONS {
        let (Some(anvil), Some(gap)) = (king.offset(dc, dr), king.offset(-dc, -dr)) else {
            continue;
        };
        if board.get(anvil) != Piece::Attacker || board.get(gap) != Piece::Empty {
            continue;
        }
        let hit = moves
            .iter()
            .copied()
            .filter(|mv| mv.to() == gap)
            .find(|&mv| board.captures_for(mv).contains(&king));
        if hit.is_some() {
            return hit;
        }
    }

    None
}

/// An attacker move that ends touching the king.
fn pressure_move(board: &Board) -> Option<Move> {
    let king = board.king_position()?;
    board
        .legal_moves(Side::Attacking)
        .into_iter()
        .find(|mv| king.neighbors().any(|n| n == mv.to()))
}

/// The built-in automated player.
pub struct TablutAi {
    name: String,
    side: Side,
}

impl TablutAi {
    pub fn new(name: String, side: Side) -> Self {
        TablutAi { name, side }
    }

    /// Pick a legal move for this side on `board`.
    pub fn find_move(&self, board: &Board, rng: &mut dyn RngCore) -> Result<Move, BotError> {
        if board.turn() != self.side {
            return Err(BotError::NotMyTurn);
        }

        let found = match self.side {
            Side::Defending => {
                Self::escape_move(board, rng).or_else(|| capture_move(board, Side::Defending))
            }
            Side::Attacking => king_capture_move(board)
                .or_else(|| capture_move(board, Side::Attacking))
                .or_else(|| pressure_move(board)),
        };

        found
            .or_else(|| board.legal_moves(self.side).first().copied())
            .ok_or(BotError::NoMoveAvailable)
    }

    /// First move of a cheapest escape path, chosen uniformly among ties. If
    /// friendly pieces block that move, one of them steps aside instead.
    fn escape_move(board: &Board, rng: &mut dyn RngCore) -> Option<Move> {
        let king = board.king_position()?;
        let paths = escape_paths(board, king);
        let cheapest = paths.iter().map(|p| p.score).min()?;
        let tied: Vec<&EscapePath> = paths.iter().filter(|p| p.score == cheapest).collect();

        let chosen = tied[rng.gen_range(0..tied.len())];
        let first = *chosen.moves.first()?;
        if board.is_legal(first) {
            return Some(first);
        }

        first
            .between()
            .filter(|&sq| board.get(sq) == Piece::Defender)
            .find_map(|sq| lane_clearing_move(board, sq))
    }
}

impl Bot for TablutAi {
    fn name(&self) -> &str {
        &self.name
    }

    fn get_move(&mut self, board: &Board, rng: &mut dyn RngCore) -> Result<Move, BotError> {
        self.find_move(board, rng)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::SeedableRng;
    use rand::rngs::StdRng;

    fn sq(col: usize, row: usize) -> Square {
        Square::new(col, row)
    }

    fn mv(from: Square, to: Square) -> Move {
        Move::new(from, to).unwrap()
    }

    fn board_with(turn: Side, pieces: &[(Piece, usize, usize)]) -> Board {
        let mut board = Board::empty(turn);
        for &(piece, col, row) in pieces {
            board.put(piece, sq(col, row));
        }
        board
    }

    fn propose(board: &Board, side: Side, seed: u64) -> Result<Move, BotError> {
        let ai = TablutAi::new("test".to_string(), side);
        ai.find_move(board, &mut StdRng::seed_from_u64(seed))
    }

    #[test]
    fn test_escape_along_open_file() {
        let board = board_with(
            Side::Defending,
            &[
                (Piece::King, 4, 4),
                (Piece::Attacker, 3, 4),
                (Piece::Attacker, 5, 4),
                (Piece::Attacker, 4, 3),
            ],
        );
        for seed in 0..8 {
            assert_eq!(propose(&board, Side::Defending, seed).unwrap(), mv(sq(4, 4), sq(4, 8)));
        }
    }

    #[test]
    fn test_escape_paths_minimal_score() {
        let board = board_with(
            Side::Defending,
            &[
                (Piece::King, 4, 4),
                (Piece::Attacker, 3, 4),
                (Piece::Attacker, 5, 4),
                (Piece::Attacker, 4, 3),
            ],
        );
        let paths = escape_paths(&board, sq(4, 4));
        assert!(paths.iter().all(|p| p.complete && p.at.is_edge()));
        assert!(paths.iter().all(|p| p.score <= ESCAPE_SCORE_CEILING));
        let cheapest: Vec<&EscapePath> = paths.iter().filter(|p| p.score == 1).collect();
        assert_eq!(cheapest.len(), 1);
        assert_eq!(cheapest[0].moves, vec![mv(sq(4, 4), sq(4, 8))]);
    }

    #[test]
    fn test_friendly_pieces_raise_path_cost() {
        let board = board_with(
            Side::Defending,
            &[(Piece::King, 2, 2), (Piece::Defender, 2, 1)],
        );
        let paths = escape_paths(&board, sq(2, 2));
        let south = paths
            .iter()
            .find(|p| p.moves == vec![mv(sq(2, 2), sq(2, 0))])
            .unwrap();
        assert_eq!(south.score, 2);
        let west = paths
            .iter()
            .find(|p| p.moves == vec![mv(sq(2, 2), sq(0, 2))])
            .unwrap();
        assert_eq!(west.score, 1);
    }

    #[test]
    fn test_escape_tie_break_follows_seed() {
        let board = board_with(Side::Defending, &[(Piece::King, 4, 4), (Piece::Attacker, 0, 0)]);
        let edges = [
            mv(sq(4, 4), sq(4, 8)),
            mv(sq(4, 4), sq(4, 0)),
            mv(sq(4, 4), sq(8, 4)),
            mv(sq(4, 4), sq(0, 4)),
        ];

        let mut seen = Vec::new();
        for seed in 0..32 {
            let first = propose(&board, Side::Defending, seed).unwrap();
            assert_eq!(first, propose(&board, Side::Defending, seed).unwrap());
            assert!(edges.contains(&first));
            if !seen.contains(&first) {
                seen.push(first);
            }
        }
        assert!(seen.len() > 1);
    }

    #[test]
    fn test_blocked_escape_clears_lane() {
        // Only escape within budget runs north through the defender at e7
        let board = board_with(
            Side::Defending,
            &[
                (Piece::King, 4, 4),
                (Piece::Defender, 4, 6),
                (Piece::Attacker, 3, 4),
                (Piece::Attacker, 5, 4),
                (Piece::Attacker, 4, 3),
                (Piece::Attacker, 3, 5),
                (Piece::Attacker, 5, 5),
            ],
        );
        let chosen = propose(&board, Side::Defending, 7).unwrap();
        assert_eq!(chosen, mv(sq(4, 6), sq(8, 6)));
        assert!(board.is_legal(chosen));
    }

    #[test]
    fn test_lane_clearing_prefers_east_on_ties() {
        // Six squares free both east and north
        let board = board_with(Side::Defending, &[(Piece::Defender, 2, 2)]);
        assert_eq!(lane_clearing_move(&board, sq(2, 2)), Some(mv(sq(2, 2), sq(8, 2))));

        // West beats north when east is shorter
        let board = board_with(
            Side::Defending,
            &[(Piece::Defender, 6, 2), (Piece::Attacker, 7, 2)],
        );
        assert_eq!(lane_clearing_move(&board, sq(6, 2)), Some(mv(sq(6, 2), sq(0, 2))));
    }

    #[test]
    fn test_trapped_king_falls_back_to_capture() {
        let board = board_with(
            Side::Defending,
            &[
                (Piece::King, 4, 4),
                (Piece::Attacker, 3, 4),
                (Piece::Attacker, 5, 4),
                (Piece::Attacker, 4, 3),
                (Piece::Attacker, 4, 5),
                (Piece::Attacker, 6, 1),
                (Piece::Defender, 7, 1),
                (Piece::Defender, 0, 1),
            ],
        );
        assert_eq!(
            propose(&board, Side::Defending, 0).unwrap(),
            mv(sq(0, 1), sq(5, 1))
        );
    }

    #[test]
    fn test_attackers_take_the_king() {
        let board = board_with(
            Side::Attacking,
            &[
                (Piece::King, 2, 2),
                (Piece::Attacker, 1, 2),
                (Piece::Attacker, 3, 6),
                (Piece::Defender, 7, 7),
                (Piece::Attacker, 7, 2),
            ],
        );
        let chosen = propose(&board, Side::Attacking, 0).unwrap();
        assert_eq!(chosen.to(), sq(3, 2));

        let mut after = board.clone();
        after.make_move(chosen);
        assert_eq!(after.winner(), Some(Side::Attacking));
    }

    #[test]
    fn test_attackers_capture_defender() {
        let board = board_with(
            Side::Attacking,
            &[
                (Piece::King, 7, 7),
                (Piece::Defender, 2, 3),
                (Piece::Attacker, 1, 3),
                (Piece::Attacker, 3, 0),
            ],
        );
        assert_eq!(
            propose(&board, Side::Attacking, 0).unwrap(),
            mv(sq(3, 0), sq(3, 3))
        );
    }

    #[test]
    fn test_attackers_close_in_when_nothing_to_capture() {
        let board = board_with(
            Side::Attacking,
            &[(Piece::King, 6, 6), (Piece::Attacker, 1, 6)],
        );
        let chosen = propose(&board, Side::Attacking, 0).unwrap();
        assert_eq!(chosen, mv(sq(1, 6), sq(5, 6)));
    }

    #[test]
    fn test_threat_score() {
        let board = board_with(
            Side::Attacking,
            &[
                (Piece::Attacker, 0, 2),
                (Piece::Defender, 1, 2),
                (Piece::Attacker, 0, 3),
            ],
        );
        // Off-board west, enemy east, friend north, empty south
        assert_eq!(threat_score(&board, sq(0, 2), Side::Attacking), 1);
    }

    #[test]
    fn test_out_of_turn_and_no_moves() {
        let board = Board::new();
        assert!(matches!(
            propose(&board, Side::Defending, 0),
            Err(BotError::NotMyTurn)
        ));

        let board = board_with(Side::Attacking, &[(Piece::King, 4, 4)]);
        assert!(matches!(
            propose(&board, Side::Attacking, 0),
            Err(BotError::NoMoveAvailable)
        ));
    }

    #[test]
    fn test_opening_moves_are_legal() {
        let board = Board::new();
        let mv = propose(&board, Side::Attacking, 0).unwrap();
        assert!(board.is_legal(mv));
    }
}
