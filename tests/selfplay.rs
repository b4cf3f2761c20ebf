use rand::SeedableRng;
use rand::rngs::StdRng;
use tablut::*;

fn ai_game(seed: u64, move_limit: Option<usize>) -> (MatchResult, Board) {
    let attackers = Box::new(TablutAi::new("Black".to_string(), Side::Attacking));
    let defenders = Box::new(TablutAi::new("White".to_string(), Side::Defending));
    let config = MatchConfig {
        move_limit,
        seed: Some(seed),
        max_moves: 400,
    };

    let mut game = Match::new(attackers, defenders, config, false);
    let result = game.play();
    (result, game.board().clone())
}

#[test]
fn test_ai_games_stay_legal() {
    for seed in 0..8 {
        let (result, board) = ai_game(seed, None);
        match result {
            MatchResult::AttackersWin { moves, reason, .. } => {
                assert_eq!(board.winner(), Some(Side::Attacking));
                assert_eq!(board.win_reason(), Some(reason));
                assert_eq!(board.move_count(), moves);
                if reason == WinReason::KingCaptured {
                    assert_eq!(board.king_position(), None);
                }
            }
            MatchResult::DefendersWin { moves, reason, .. } => {
                assert_eq!(board.winner(), Some(Side::Defending));
                assert_eq!(board.win_reason(), Some(reason));
                assert_eq!(board.move_count(), moves);
                if reason == WinReason::KingEscaped {
                    assert!(board.king_position().is_some_and(|sq| sq.is_edge()));
                }
            }
            MatchResult::Abandoned { moves } => {
                assert_eq!(moves, 400);
                assert!(!board.is_game_over());
            }
            other => panic!("seed {}: unexpected result {:?}", seed, other),
        }
    }
}

#[test]
fn test_same_seed_same_game() {
    let (first, first_board) = ai_game(42, None);
    let (second, second_board) = ai_game(42, None);
    assert_eq!(first, second);
    assert_eq!(first_board.encoded(), second_board.encoded());
}

#[test]
fn test_move_limit_ends_ai_game() {
    let (result, board) = ai_game(7, Some(3));
    assert!(board.is_game_over());
    assert!(board.move_count() <= 7);
    if board.win_reason() == Some(WinReason::MoveLimit) {
        assert_eq!(board.move_count(), 7);
        assert_eq!(result.winner(), Some("White"));
    }
}

#[test]
fn test_ai_moves_are_legal_each_turn() {
    let mut board = Board::new();
    let mut rng = StdRng::seed_from_u64(5);
    let mut attackers = TablutAi::new("Black".to_string(), Side::Attacking);
    let mut defenders = TablutAi::new("White".to_string(), Side::Defending);

    while !board.is_game_over() && board.move_count() < 200 {
        let bot: &mut dyn Bot = match board.turn() {
            Side::Attacking => &mut attackers,
            Side::Defending => &mut defenders,
        };
        let mv = bot.get_move(&board, &mut rng).unwrap();
        assert!(board.is_legal(mv), "{} proposed {}", bot.name(), mv);
        board.make_move(mv);
    }
}

#[test]
fn test_move_text_covers_every_square() {
    for sq in Square::all() {
        let text = sq.to_string();
        assert_eq!(text.parse::<Square>().unwrap(), sq);
    }
    assert!("j1".parse::<Square>().is_err());
    assert!("a0".parse::<Square>().is_err());
    assert!("e5e9".parse::<Move>().is_err());
    assert!("a1-b2".parse::<Move>().is_err());
}
