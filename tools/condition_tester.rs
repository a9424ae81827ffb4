/// Condition Tester — evaluates condition scripts against a RON game data file.
///
/// Usage: condition_tester <game_data.ron> [script]
///
/// With a script, prints the result and exits 0 (true), 1 (false) or 2 (error).
/// Without one, starts an interactive shell:
///   <script>         — evaluate against the whole roster
///   as <n> <script>  — evaluate against roster index n only
///   tokens <script>  — show the phrase tokens
///   tree <script>    — show the built expression tree
///   roster           — list the loaded characters
///   help             — list commands
///   quit             — exit

use std::io::{self, BufRead, Write};
use std::path::Path;
use std::process;

use storyboard_script::core::condition::ConditionParser;
use storyboard_script::core::lexer::tokenize;
use storyboard_script::core::tree::ConditionTree;
use storyboard_script::schema::game_data::GameData;
use storyboard_script::schema::stat::CharacterStat;
use tracing_subscriber::EnvFilter;

fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::from_default_env().add_directive(tracing::Level::INFO.into()),
        )
        .init();

    let args: Vec<String> = std::env::args().collect();

    if args.len() < 2 || args[1] == "--help" || args[1] == "-h" {
        println!("Usage: condition_tester <game_data.ron> [script]");
        process::exit(0);
    }

    let data = match GameData::load_from_ron(Path::new(&args[1])) {
        Ok(data) => data,
        Err(e) => {
            eprintln!("ERROR: Failed to load game data: {}", e);
            process::exit(2);
        }
    };
    tracing::info!(
        characters = data.characters.len(),
        encounter_traits = data.encounter_traits.len(),
        session_traits = data.session_traits.len(),
        "loaded game data"
    );

    if args.len() > 2 {
        let script = args[2..].join(" ");
        match ConditionParser::new(&data).evaluate(&script) {
            Ok(result) => {
                println!("{}", result);
                process::exit(if result { 0 } else { 1 });
            }
            Err(e) => {
                eprintln!("ERROR: {}", e);
                process::exit(2);
            }
        }
    }

    run_shell(&data);
}

fn run_shell(data: &GameData) {
    println!("Type 'help' for commands.\n");

    let stdin = io::stdin();
    let mut stdout = io::stdout();

    loop {
        print!("condition> ");
        stdout.flush().ok();

        let mut line = String::new();
        if stdin.lock().read_line(&mut line).is_err() || line.is_empty() {
            break;
        }
        let line = line.trim();
        if line.is_empty() {
            continue;
        }

        let (cmd, rest) = match line.split_once(char::is_whitespace) {
            Some((cmd, rest)) => (cmd.to_lowercase(), rest.trim()),
            None => (line.to_lowercase(), ""),
        };

        match cmd.as_str() {
            "quit" | "exit" | "q" => {
                println!("Goodbye.");
                break;
            }
            "help" | "h" => print_help(),
            "roster" => print_roster(data),
            "tokens" => match tokenize(rest) {
                Ok(tokens) => {
                    for token in tokens {
                        println!("  {:?}", token);
                    }
                }
                Err(e) => println!("ERROR: {}", e),
            },
            "tree" => match ConditionTree::parse(rest) {
                Ok(tree) => println!("{:#?}", tree.root),
                Err(e) => println!("ERROR: {}", e),
            },
            "as" => {
                let Some((index, script)) = rest.split_once(char::is_whitespace) else {
                    println!("Usage: as <n> <script>");
                    continue;
                };
                let Ok(index) = index.parse::<usize>() else {
                    println!("Not a roster index: {}", index);
                    continue;
                };
                if index >= data.characters.len() {
                    println!("Roster has {} characters", data.characters.len());
                    continue;
                }
                evaluate_and_print(&data.for_players(&[index]), script);
            }
            _ => evaluate_and_print(data, line),
        }
    }
}

fn evaluate_and_print(data: &GameData, script: &str) {
    match ConditionParser::new(data).evaluate(script) {
        Ok(result) => println!("{}", result),
        Err(e) => println!("ERROR: {}", e),
    }
}

fn print_roster(data: &GameData) {
    for (index, character) in data.characters.iter().enumerate() {
        let stats: Vec<String> = CharacterStat::ALL
            .iter()
            .map(|stat| format!("{}={}", stat.abbreviation(), character.stat(*stat)))
            .collect();
        println!(
            "  [{}] {} ({}){}",
            index,
            character.name,
            stats.join(" "),
            if character.is_alive() { "" } else { " DEAD" }
        );
        if !character.traits.is_empty() {
            println!("      traits: {}", character.traits.join(", "));
        }
    }
    println!("  encounter: {}", data.encounter_traits.join(", "));
    println!("  session:   {}", data.session_traits.join(", "));
}

fn print_help() {
    println!("Commands:");
    println!("  <script>         evaluate against the whole roster");
    println!("  as <n> <script>  evaluate against roster index n only");
    println!("  tokens <script>  show the phrase tokens");
    println!("  tree <script>    show the built expression tree");
    println!("  roster           list the loaded characters");
    println!("  help             show this message");
    println!("  quit             exit");
}
