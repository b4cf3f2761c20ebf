use clap::{Parser, ValueEnum};
use std::process::ExitCode;
use tablut::*;

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
enum PlayerKind {
    /// Moves typed on stdin, e.g. `d1-c1`
    Manual,
    /// Heuristic search agent
    Ai,
}

#[derive(Parser, Debug)]
#[command(name = "tablut", version, about = "Play Tablut against the computer or a friend")]
struct Cli {
    /// Who plays the attacking side
    #[arg(long, value_enum, default_value_t = PlayerKind::Manual)]
    attackers: PlayerKind,

    /// Who plays the defending side
    #[arg(long, value_enum, default_value_t = PlayerKind::Ai)]
    defenders: PlayerKind,

    /// Seed for the agents' tie-breaking
    #[arg(long)]
    seed: Option<u64>,

    /// Moves allowed per side before that side loses
    #[arg(long)]
    move_limit: Option<usize>,

    /// Abandon the game after this many moves in total
    #[arg(long, default_value_t = 1000)]
    max_moves: usize,

    /// Only print the result
    #[arg(short, long)]
    quiet: bool,

    /// Print the result as JSON
    #[arg(long)]
    json: bool,
}

fn player(kind: PlayerKind, side: Side) -> Box<dyn Bot> {
    match kind {
        PlayerKind::Manual => Box::new(ManualPlayer::stdio(format!("{} (manual)", side))),
        PlayerKind::Ai => Box::new(TablutAi::new(format!("{} (ai)", side), side)),
    }
}

fn main() -> ExitCode {
    let cli = Cli::parse();

    let config = MatchConfig {
        move_limit: cli.move_limit,
        seed: cli.seed,
        max_moves: cli.max_moves,
    };

    let attackers = player(cli.attackers, Side::Attacking);
    let defenders = player(cli.defenders, Side::Defending);
    let verbose = !cli.quiet && !cli.json;

    let mut game = Match::new(attackers, defenders, config, verbose);
    let result = game.play();

    if cli.json {
        match serde_json::to_string_pretty(&game.summary(&result)) {
            Ok(json) => println!("{}", json),
            Err(e) => {
                eprintln!("failed to encode result: {}", e);
                return ExitCode::FAILURE;
            }
        }
        return ExitCode::SUCCESS;
    }

    println!("\n========================================");
    println!("Match Result:");
    match result {
        MatchResult::AttackersWin {
            winner_name,
            moves,
            reason,
        } => {
            println!("  {} wins as Attackers in {} moves ({})", winner_name, moves, reason);
        }
        MatchResult::DefendersWin {
            winner_name,
            moves,
            reason,
        } => {
            println!("  {} wins as Defenders in {} moves ({})", winner_name, moves, reason);
        }
        MatchResult::NoMove { violator, winner } => {
            println!("  {} wins, {} could not move", winner, violator);
        }
        MatchResult::IllegalMove { violator, winner } => {
            println!("  {} wins by illegal move (opponent: {})", winner, violator);
        }
        MatchResult::Abandoned { moves } => {
            println!("  Abandoned after {} moves", moves);
        }
    }
    println!("========================================");

    ExitCode::SUCCESS
}
