mod config;
mod crash;

use std::io::{self, BufRead, Write};
use std::path::Path;

use adventure_save::player::Facing;
use adventure_save::{
    create_new_save, delete_save, list_saves, load_save, make_save, processed_saves, BackupPrompt,
    LoadOptions, SaveDirs,
};
use adventure_world::Position;
use config::AdventureConfig;
use tracing::{error, info};

const CONFIG_FILE: &str = "adventure.toml";

const USAGE: &str = "usage:
  adventure list
  adventure new <display name> <player name> [seed]
  adventure load <save>
  adventure visit <save> <x> <y>
  adventure walk <save> <north|south|east|west> [steps]
  adventure delete <save>";

/// Asks on the terminal.
struct StdinPrompt;

impl BackupPrompt for StdinPrompt {
    fn ask_backup(&mut self, save_name: &str, is_older: bool) -> bool {
        let age = if is_older { "an older version" } else { "a newer version" };
        print!(
            "\"{save_name}\" is {age} than what it should be! Do you want to backup the save before loading it? [y/N] "
        );
        io::stdout().flush().ok();
        let mut answer = String::new();
        if io::stdin().lock().read_line(&mut answer).is_err() {
            return false;
        }
        matches!(answer.trim().to_lowercase().as_str(), "y" | "yes")
    }
}

fn parse_facing(text: &str) -> Option<Facing> {
    match text.to_lowercase().as_str() {
        "north" | "n" => Some(Facing::North),
        "south" | "s" => Some(Facing::South),
        "east" | "e" => Some(Facing::East),
        "west" | "w" => Some(Facing::West),
        _ => None,
    }
}

fn arg<'a>(args: &'a [String], index: usize, name: &str) -> Result<&'a str, String> {
    args.get(index)
        .map(String::as_str)
        .ok_or_else(|| format!("missing <{name}>\n{USAGE}"))
}

fn run(args: &[String], config: &AdventureConfig, dirs: &SaveDirs) -> Result<(), Box<dyn std::error::Error>> {
    let options = LoadOptions {
        backup_choice: config.game.backup_choice,
        automatic_backup: config.game.auto_backup,
    };

    match args.first().map(String::as_str) {
        None | Some("list") => {
            let listings = list_saves(dirs)?;
            for problem in listings.iter().filter_map(|listing| listing.problem()) {
                println!("{problem}");
            }
            for (save_name, text) in processed_saves(&listings) {
                println!("[{save_name}]\n{text}\n");
            }
        }
        Some("new") => {
            let display_name = arg(args, 1, "display name")?;
            let player_name = arg(args, 2, "player name")?;
            let seed = match args.get(3) {
                Some(seed) => seed.parse()?,
                None => rand::random(),
            };
            let session = create_new_save(display_name, player_name, seed, dirs)?;
            println!("Created save \"{}\" (seed {seed})", session.save_name);
        }
        Some("load") => {
            let save_name = arg(args, 1, "save")?;
            let session = load_save(save_name, dirs, options, &mut StdinPrompt)?;
            let player = &session.player;
            println!(
                "{}: {} at {} facing {:?}, hp {}/{}",
                session.display_name,
                player.name,
                player.position,
                player.facing,
                player.current_hp,
                player.base_max_hp
            );
        }
        Some("visit") => {
            let save_name = arg(args, 1, "save")?;
            let x: i64 = arg(args, 2, "x")?.parse()?;
            let y: i64 = arg(args, 3, "y")?.parse()?;
            let mut session = load_save(save_name, dirs, options, &mut StdinPrompt)?;
            session.player.position = Position::new(x, y);
            for line in session.visit_current_tile(dirs) {
                println!("{line}");
            }
            make_save(&mut session, dirs, true)?;
        }
        Some("walk") => {
            let save_name = arg(args, 1, "save")?;
            let facing = parse_facing(arg(args, 2, "direction")?)
                .ok_or_else(|| format!("unknown direction\n{USAGE}"))?;
            let steps: u32 = match args.get(3) {
                Some(steps) => steps.parse()?,
                None => 1,
            };
            let mut session = load_save(save_name, dirs, options, &mut StdinPrompt)?;
            for _ in 0..steps {
                let (position, lines) = session.move_player(facing, dirs);
                println!("{position}");
                for line in lines {
                    println!("  {line}");
                }
            }
            make_save(&mut session, dirs, true)?;
        }
        Some("delete") => {
            let save_name = arg(args, 1, "save")?;
            delete_save(save_name, dirs)?;
            println!("Deleted \"{save_name}\"");
        }
        Some(other) => return Err(format!("unknown command {other:?}\n{USAGE}").into()),
    }
    Ok(())
}

fn main() {
    let config = match AdventureConfig::load_or_default(CONFIG_FILE) {
        Ok(c) => c,
        Err(e) => {
            eprintln!("Failed to load {CONFIG_FILE}: {e}");
            std::process::exit(1);
        }
    };

    let filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(&config.logging.level));

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(true)
        .init();

    let root = Path::new(&config.game.root_folder);
    crash::install_hook(root);

    info!("Progress Adventure v{} starting", env!("CARGO_PKG_VERSION"));
    let dirs = SaveDirs::new(root);

    let args: Vec<String> = std::env::args().skip(1).collect();
    if let Err(e) = run(&args, &config, &dirs) {
        error!(error = %e, "Command failed");
        eprintln!("{e}");
        std::process::exit(1);
    }
}
