//! Headless mode for Sakura Memories.
//!
//! This module provides a simple text-based interface for playing without
//! a TUI. It's designed for automated testing and AI agents.

use sakura_core::headless::{GameResponse, HeadlessGame};
use sakura_core::{GameState, SessionError};
use std::io::{self, BufRead, Write};

/// Run the game in headless mode.
///
/// This provides a simple line-oriented protocol:
/// - A number picks that choice (1-based)
/// - Lines starting with `#` are commands (status, history, restart, help, quit)
/// - All other output is story text or game state
pub async fn run_headless(mut game: HeadlessGame) -> Result<(), SessionError> {
    println!("=== Sakura Memories Headless Mode ===");
    println!("Player: {}", game.player_name());
    println!();
    print_help();
    println!();

    print!("[LOADING]");
    io::stdout().flush().ok();
    let response = game.start().await?;
    print!("\r         \r");
    print_response(&response);

    let stdin = io::stdin();
    let mut stdout = io::stdout();

    for line in stdin.lock().lines() {
        let line = match line {
            Ok(l) => l,
            Err(e) => {
                eprintln!("Error reading input: {e}");
                break;
            }
        };

        let line = line.trim();
        if line.is_empty() {
            continue;
        }

        // Handle commands
        if let Some(command) = line.strip_prefix('#') {
            match command.trim() {
                "quit" | "exit" => {
                    println!("Goodbye!");
                    break;
                }
                "status" => print_status(&game),
                "history" => {
                    println!("[HISTORY]");
                    for (i, entry) in game.session().history().entries().iter().enumerate() {
                        println!("  {}. {entry}", i + 1);
                    }
                }
                "restart" => {
                    print!("[LOADING]");
                    stdout.flush().ok();
                    let response = game.restart().await?;
                    print!("\r         \r");
                    print_response(&response);
                }
                "help" => {
                    println!("[HELP]");
                    print_help();
                }
                _ => println!("[ERROR] Unknown command. Type #help for help."),
            }
            stdout.flush().ok();
            continue;
        }

        let index = match line.parse::<usize>() {
            Ok(n) if n >= 1 => n - 1,
            _ => {
                println!("[ERROR] Enter a choice number, or #help for commands.");
                continue;
            }
        };

        if game.state() == GameState::Menu {
            println!("[ERROR] No story in progress. Type #restart to begin again.");
            continue;
        }

        print!("[LOADING]");
        stdout.flush().ok();

        match game.choose(index).await {
            Ok(response) => {
                print!("\r         \r");
                print_response(&response);
            }
            Err(e) => {
                print!("\r         \r");
                println!("[ERROR] {e}");
            }
        }
        stdout.flush().ok();
    }

    Ok(())
}

fn print_help() {
    println!("Commands:");
    println!("  <number>     - Pick that choice");
    println!("  #status      - Show turn and affection");
    println!("  #history     - Show the story so far");
    println!("  #restart     - Start a new story");
    println!("  #help        - Show this help");
    println!("  #quit        - Exit the game");
}

fn print_status(game: &HeadlessGame) {
    let affection = game.affection();
    println!("[STATUS]");
    println!("  State: {:?}", game.state());
    println!("  Turn: {}", game.session().turn_label());
    println!(
        "  Affection: yuki {}, haruka {}, aoi {}",
        affection.yuki, affection.haruka, affection.aoi
    );
}

fn print_response(response: &GameResponse) {
    if response.failed {
        println!("[ALERT] {}", response.text);
        if response.state == GameState::Menu {
            println!("Type #restart to begin again.");
        }
        println!();
        return;
    }

    match response.state {
        GameState::Ending => {
            println!("[ENDING]");
            for para in response.text.split("\n\n") {
                println!("{para}");
            }
            println!();
            println!("Type #restart to play again or #quit to exit.");
        }
        _ => {
            println!("[TURN {}]", response.turn);
            if let Some(speaker) = &response.speaker {
                println!("{speaker}:");
            }
            println!("{}", response.text);
            println!();
            for (i, choice) in response.choices.iter().enumerate() {
                println!("  {}. {choice}", i + 1);
            }
        }
    }
    println!();
}
