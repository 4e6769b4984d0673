use std::env;
use std::io::{self, Write};
use std::path::PathBuf;

use learnquest::persistence::SqliteStore;
use learnquest::remote::{InMemoryRemote, UserStatsRow};
use learnquest::{Session, Snapshot};

const COMMANDS: &str = "Commands: login <user> | logout | complete <id> | xp <n> | stats | modules [n] | quests | ack | reset | tick | quit";

fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "learnquest=info".into()),
        )
        .init();

    println!("Initializing LearnQuest progress core...");
    let store_path = parse_store_path(env::args().collect());

    let store = match SqliteStore::open(&store_path) {
        Ok(store) => store,
        Err(err) => {
            eprintln!("Failed to open store at {}: {}", store_path.display(), err);
            std::process::exit(1);
        }
    };

    let mut remote = InMemoryRemote::new();
    remote.seed_stats(UserStatsRow {
        user_id: "demo".to_string(),
        xp: 120,
        level: 2,
        current_streak: 3,
        last_activity: None,
    });
    remote.seed_completions("demo", &[1, 2]);

    let mut session = Session::new(Box::new(store), Box::new(remote));
    let snapshot = session.tick(Vec::new());
    print_events(&snapshot);
    print_stats(&snapshot);

    println!("{}", COMMANDS);
    loop {
        print!("> ");
        io::stdout().flush().unwrap();

        let mut input = String::new();
        if io::stdin().read_line(&mut input).is_err() {
            break;
        }
        let trimmed = input.trim();
        if trimmed.is_empty() {
            continue;
        }

        let mut parts = trimmed.split_whitespace();
        let cmd = parts.next().unwrap_or("").to_lowercase();

        match cmd.as_str() {
            "quit" | "exit" => break,
            "help" => {
                println!("{}", COMMANDS);
            }
            "login" => {
                if let Some(user_id) = parts.next() {
                    session.sign_in(user_id);
                    let snapshot = session.tick(Vec::new());
                    println!("Signed in as {}", user_id);
                    print_events(&snapshot);
                    print_stats(&snapshot);
                } else {
                    println!("Usage: login <user>");
                }
            }
            "logout" => {
                session.sign_out();
                println!("Signed out, back to guest mode");
            }
            "complete" => {
                if let Some(id_raw) = parts.next() {
                    match id_raw.parse::<u32>() {
                        Ok(module_id) => {
                            if session.is_module_locked(module_id) {
                                println!("Module {} is locked, finish module {} first", module_id, module_id - 1);
                            } else {
                                let snapshot = session.complete_module(module_id);
                                print_events(&snapshot);
                                print_stats(&snapshot);
                            }
                        }
                        Err(_) => println!("Invalid module id: {}", id_raw),
                    }
                } else {
                    println!("Usage: complete <module_id>");
                }
            }
            "xp" => {
                if let Some(amount_raw) = parts.next() {
                    match amount_raw.parse::<u32>() {
                        Ok(amount) => {
                            let snapshot = session.add_xp(amount);
                            print_events(&snapshot);
                            print_stats(&snapshot);
                        }
                        Err(_) => println!("Invalid XP amount: {}", amount_raw),
                    }
                } else {
                    println!("Usage: xp <amount>");
                }
            }
            "stats" => {
                let snapshot = session.tick(Vec::new());
                print_events(&snapshot);
                print_stats(&snapshot);
            }
            "modules" => {
                let count = parts
                    .next()
                    .and_then(|raw| raw.parse::<u32>().ok())
                    .unwrap_or(10);
                let snapshot = session.tick(Vec::new());
                print_modules(&session, &snapshot, count);
            }
            "quests" => {
                let snapshot = session.tick(Vec::new());
                print_events(&snapshot);
                print_quests(&snapshot);
            }
            "ack" => {
                let snapshot = session.acknowledge_level_up();
                if snapshot.pending_level_up.is_none() {
                    println!("Level-up acknowledged");
                }
                print_stats(&snapshot);
            }
            "reset" => {
                let snapshot = session.reset_progress();
                print_events(&snapshot);
                print_stats(&snapshot);
            }
            "tick" => {
                let snapshot = session.tick(Vec::new());
                print_events(&snapshot);
            }
            other => {
                println!("Unknown command: {}. Type help for the list.", other);
            }
        }
    }

    println!("Goodbye.");
}

fn parse_store_path(args: Vec<String>) -> PathBuf {
    let mut iter = args.iter();
    let mut store_path = PathBuf::from("./learnquest.db");
    while let Some(arg) = iter.next() {
        if arg.as_str() == "--store" {
            if let Some(value) = iter.next() {
                store_path = PathBuf::from(value);
            }
        }
    }
    store_path
}

fn print_stats(snapshot: &Snapshot) {
    let level_up = match snapshot.pending_level_up {
        Some(level) => format!(" [LEVEL UP -> {}! type ack]", level),
        None => String::new(),
    };
    println!(
        "Stats: xp={} level={} streak={} completed={}{}",
        snapshot.xp,
        snapshot.level,
        snapshot.current_streak,
        snapshot.completed_modules.len(),
        level_up
    );
}

fn print_modules(session: &Session, snapshot: &Snapshot, count: u32) {
    for module_id in 1..=count.max(1) {
        let marker = if snapshot.completed_modules.contains(&module_id) {
            "done"
        } else if session.is_module_locked(module_id) {
            "locked"
        } else {
            "open"
        };
        println!("  module {:>3}  {}", module_id, marker);
    }
}

fn print_quests(snapshot: &Snapshot) {
    if snapshot.quests.is_empty() {
        println!("No quests for today yet.");
        return;
    }
    for quest in &snapshot.quests {
        let status = if quest.completed { "x" } else { " " };
        println!(
            "  [{}] {} ({}/{}) +{} XP",
            status, quest.text, quest.progress, quest.goal, quest.xp_reward
        );
    }
}

fn print_events(snapshot: &Snapshot) {
    for event in &snapshot.events {
        println!("* {}", event);
    }
}
