use std::env;
use std::io::{self, Write};
use std::path::PathBuf;

use tracing_subscriber::EnvFilter;

use photofun_quest::content::load_puzzle_catalog;
use photofun_quest::persistence::{MemoryPreferenceStore, PreferenceStore, SqlitePreferenceStore};
use photofun_quest::progress::ProgressSubscription;
use photofun_quest::rules::{rule_for, HINT_COST};
use photofun_quest::{
    AnswerOutcome, CompletionOutcome, Difficulty, Game, ProgressEvent, PuzzleCatalog, PuzzleId,
};

const COMMANDS: &str = concat!(
    "Commands: status | levels | level <n> | show <puzzle_id> | answer <puzzle_id> <text>",
    " | hint <puzzle_id> | hints <puzzle_id> | next | achievements",
    " | settings [haptics on|off | difficulty easy|medium|hard] | reset | quit"
);

struct Options {
    db_path: PathBuf,
    catalog_path: Option<PathBuf>,
    in_memory: bool,
}

fn main() {
    init_logging();
    let options = parse_options(env::args().skip(1).collect());

    let catalog = match &options.catalog_path {
        Some(path) => load_puzzle_catalog(path),
        None => PuzzleCatalog::bundled(),
    };
    let catalog = match catalog {
        Ok(catalog) => catalog,
        Err(err) => {
            eprintln!("Failed to load puzzle catalog: {}", err);
            std::process::exit(1);
        }
    };

    let prefs: Box<dyn PreferenceStore> = if options.in_memory {
        Box::new(MemoryPreferenceStore::new())
    } else {
        match SqlitePreferenceStore::open(&options.db_path) {
            Ok(store) => Box::new(store),
            Err(err) => {
                eprintln!(
                    "Failed to open preferences at {}: {}. Use --db <path> or --memory.",
                    options.db_path.display(),
                    err
                );
                std::process::exit(1);
            }
        }
    };

    let mut game = match Game::open(catalog, prefs) {
        Ok(game) => game,
        Err(err) => {
            eprintln!("Failed to read saved progress: {}", err);
            std::process::exit(1);
        }
    };
    let mut subscription = game.subscribe();

    println!("PhotoFun Quest");
    print_status(&game);
    println!("{}", COMMANDS);
    loop {
        print!("> ");
        let _ = io::stdout().flush();

        let mut input = String::new();
        match io::stdin().read_line(&mut input) {
            Ok(0) | Err(_) => break,
            Ok(_) => {}
        }
        let trimmed = input.trim();
        if trimmed.is_empty() {
            continue;
        }

        let (cmd, rest) = match trimmed.split_once(char::is_whitespace) {
            Some((cmd, rest)) => (cmd.to_lowercase(), rest.trim()),
            None => (trimmed.to_lowercase(), ""),
        };

        match cmd.as_str() {
            "quit" | "exit" => break,
            "help" => println!("{}", COMMANDS),
            "status" => print_status(&game),
            "levels" => print_levels(&game),
            "level" => match rest.parse::<u32>() {
                Ok(level) => print_level(&game, level),
                Err(_) => println!("Usage: level <n>"),
            },
            "show" => {
                if rest.is_empty() {
                    println!("Usage: show <puzzle_id>");
                } else {
                    print_puzzle(&game, &PuzzleId::new(rest));
                }
            }
            "answer" => match rest.split_once(char::is_whitespace) {
                Some((id, text)) => handle_answer(&mut game, &PuzzleId::new(id), text),
                None => println!("Usage: answer <puzzle_id> <text>"),
            },
            "hint" => {
                if rest.is_empty() {
                    println!("Usage: hint <puzzle_id>");
                } else {
                    handle_hint(&mut game, &PuzzleId::new(rest));
                }
            }
            "hints" => {
                if rest.is_empty() {
                    println!("Usage: hints <puzzle_id>");
                } else {
                    print_hints(&game, &PuzzleId::new(rest));
                }
            }
            "next" => match game.suggest_next_puzzle() {
                Some(puzzle) => {
                    let id = puzzle.id.clone();
                    print_puzzle(&game, &id);
                }
                None => println!("Nothing left to solve. Well done!"),
            },
            "achievements" => print_achievements(&game),
            "settings" => handle_settings(&mut game, rest),
            "reset" => {
                if confirm("Reset all progress? This cannot be undone. [y/N] ") {
                    game.reset();
                } else {
                    println!("Reset cancelled.");
                }
            }
            _ => println!("Unknown command. {}", COMMANDS),
        }

        print_events(&game, &mut subscription);
        game.end_frame();
    }

    if !game.flush() {
        eprintln!("Some progress could not be saved.");
    }
}

fn init_logging() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn"));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(io::stderr)
        .init();
}

fn parse_options(args: Vec<String>) -> Options {
    let mut iter = args.iter();
    let mut options = Options {
        db_path: PathBuf::from("./assets/db/preferences.db"),
        catalog_path: None,
        in_memory: false,
    };
    while let Some(arg) = iter.next() {
        match arg.as_str() {
            "--db" => {
                if let Some(value) = iter.next() {
                    options.db_path = PathBuf::from(value);
                }
            }
            "--catalog" => {
                if let Some(value) = iter.next() {
                    options.catalog_path = Some(PathBuf::from(value));
                }
            }
            "--memory" => options.in_memory = true,
            _ => {}
        }
    }
    options
}

fn confirm(prompt: &str) -> bool {
    print!("{}", prompt);
    let _ = io::stdout().flush();
    let mut input = String::new();
    if io::stdin().read_line(&mut input).is_err() {
        return false;
    }
    matches!(input.trim().to_lowercase().as_str(), "y" | "yes")
}

fn handle_answer(game: &mut Game, id: &PuzzleId, text: &str) {
    let haptics = game.store().settings().haptic_feedback;
    match game.submit_answer(id, text) {
        AnswerOutcome::UnknownPuzzle => println!("No puzzle {}", id),
        AnswerOutcome::Locked { level } => {
            println!("{} is in level {}, which is still locked.", id, level)
        }
        AnswerOutcome::Incorrect => {
            println!("Not quite right. Try again!");
            if haptics {
                println!("(buzz)");
            }
        }
        AnswerOutcome::Correct { points, completion } => {
            match completion {
                CompletionOutcome::AlreadyCompleted => {
                    println!("Correct! You already solved this one, so no new points.")
                }
                _ => println!("Correct! You earned {} points!", points),
            }
            if haptics {
                println!("(tap tap)");
            }
        }
    }
}

fn handle_hint(game: &mut Game, id: &PuzzleId) {
    match game.buy_hint(id) {
        Ok(hint) => println!("Hint (-{} points): {}", HINT_COST, hint),
        Err(err) => println!("No hint available: {}", err),
    }
}

fn handle_settings(game: &mut Game, args: &str) {
    let mut parts = args.split_whitespace();
    match (parts.next(), parts.next()) {
        (None, _) => {
            let settings = game.store().settings();
            println!(
                "haptics: {} | difficulty: {}",
                if settings.haptic_feedback { "on" } else { "off" },
                settings.preferred_difficulty
            );
        }
        (Some("haptics"), Some(value)) => match value {
            "on" => {
                game.set_haptic_feedback(true);
            }
            "off" => {
                game.set_haptic_feedback(false);
            }
            _ => println!("Usage: settings haptics on|off"),
        },
        (Some("difficulty"), Some(value)) => match value.parse::<Difficulty>() {
            Ok(difficulty) => {
                game.set_preferred_difficulty(difficulty);
            }
            Err(err) => println!("{}", err),
        },
        _ => println!("Usage: settings [haptics on|off | difficulty easy|medium|hard]"),
    }
}

fn print_status(game: &Game) {
    let snapshot = game.snapshot();
    println!(
        "Level {} | {} points | {}/{} puzzles | {} achievements",
        snapshot.current_level,
        snapshot.total_points,
        snapshot.completed,
        snapshot.total_puzzles,
        snapshot.achievements.len()
    );
}

fn print_levels(game: &Game) {
    for level in game.snapshot().levels {
        let lock = if level.unlocked { " " } else { "x" };
        println!(
            "[{}] Level {}: {}/{} solved",
            lock, level.level, level.completed, level.total
        );
    }
}

fn print_level(game: &Game, level: u32) {
    let store = game.store();
    let puzzles = store.puzzles_for_level(level);
    if puzzles.is_empty() {
        println!("No level {}", level);
        return;
    }
    if !store.is_level_unlocked(level) {
        println!("Level {} is locked.", level);
        return;
    }
    for puzzle in puzzles {
        let mark = if store.is_completed(&puzzle.id) { "*" } else { " " };
        println!(
            "{} {:<10} {:<28} {:<6} {} pts",
            mark, puzzle.id, puzzle.title, puzzle.difficulty, puzzle.points
        );
    }
}

fn print_puzzle(game: &Game, id: &PuzzleId) {
    let Some(puzzle) = game.puzzle(id) else {
        println!("No puzzle {}", id);
        return;
    };
    let level = game.store().level_of(id).unwrap_or(1);
    if !game.store().is_level_unlocked(level) {
        println!("{} is in level {}, which is still locked.", id, level);
        return;
    }
    println!(
        "{} - {} ({}, {} pts)",
        puzzle.id, puzzle.title, puzzle.difficulty, puzzle.points
    );
    println!("  {}", puzzle.description);
    let revealed = game.hints(id);
    for (index, hint) in revealed.iter().enumerate() {
        println!("  hint {}: {}", index + 1, hint);
    }
    if game.store().is_completed(id) {
        println!("  solved");
    } else if game.store().can_unlock_hint(id) {
        println!(
            "  ({} of {} hints left, {} points each)",
            puzzle.hints.len() - revealed.len(),
            puzzle.hints.len(),
            HINT_COST
        );
    }
}

fn print_hints(game: &Game, id: &PuzzleId) {
    let hints = game.hints(id);
    if hints.is_empty() {
        println!("No hints unlocked for {}", id);
        return;
    }
    for (index, hint) in hints.iter().enumerate() {
        println!("{}. {}", index + 1, hint);
    }
}

fn print_achievements(game: &Game) {
    let snapshot = game.snapshot();
    if snapshot.achievements.is_empty() {
        println!("No achievements yet.");
        return;
    }
    for achievement in &snapshot.achievements {
        println!(
            "{} - {} ({})",
            achievement.title,
            achievement.description,
            achievement.earned_at.format("%Y-%m-%d %H:%M")
        );
    }
}

fn print_events(game: &Game, subscription: &mut ProgressSubscription) {
    for event in game.read_events(subscription) {
        match event {
            ProgressEvent::LevelUnlocked { level } => println!("Level {} unlocked!", level),
            ProgressEvent::AchievementEarned { id } => {
                let title = rule_for(&id).map_or(id.as_str(), |rule| rule.title);
                println!("Achievement earned: {}", title);
            }
            ProgressEvent::ProgressReset => println!("Progress reset."),
            ProgressEvent::SettingsChanged => println!("Settings saved."),
            ProgressEvent::PuzzleCompleted { .. } | ProgressEvent::HintUnlocked { .. } => {}
        }
    }
}
