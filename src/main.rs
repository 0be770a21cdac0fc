use clap::{CommandFactory, FromArgMatches, Parser, Subcommand};
use gearforge::character::CharacterContext;
use gearforge::config::Config;
use gearforge::data::loader::load_inventory_file;
use gearforge::data::GameData;
use std::process;
use tracing::error;
use tracing_subscriber::EnvFilter;

mod cmd;
mod reports;

#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    #[arg(global = true, short, long, default_value = "data/game.json")]
    data: String,

    #[arg(global = true, short = 'C', long, default_value = "data/character.json")]
    character: String,

    /// Tab-separated `item<TAB>count` listing that replaces the character's inventory.
    #[arg(global = true, short, long)]
    inventory: Option<String>,

    /// JSON preferences file; flags given on the command line win.
    #[arg(global = true, short, long)]
    prefs: Option<String>,

    #[arg(global = true, long, default_value_t = false)]
    debug: bool,
}

#[derive(Subcommand, Debug)]
enum Commands {
    Maximize(cmd::maximize::MaximizeArgs),
    Parse(cmd::parse::ParseArgs),
}

fn fail(msg: impl std::fmt::Display) -> ! {
    error!("{}", msg);
    process::exit(1);
}

fn main() {
    // 1. Raw matches tell user input apart from defaults
    let matches = Cli::command().get_matches();
    let cli = Cli::from_arg_matches(&matches).unwrap_or_else(|e| e.exit());

    let level = if cli.debug { "debug" } else { "info" };
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(level)))
        .with_writer(std::io::stderr)
        .with_target(false)
        .init();

    println!("\n🚀 Initializing GearForge...");

    // 2. Game data and character
    println!("📂 Loading Game Data: {}", cli.data);
    let data = GameData::load_from_file(&cli.data).unwrap_or_else(|e| fail(e));

    println!("👤 Loading Character: {}", cli.character);
    let mut ctx = CharacterContext::load_from_file(&cli.character).unwrap_or_else(|e| fail(e));
    if let Some(path) = &cli.inventory {
        println!("🎒 Loading Inventory: {}", path);
        ctx.inventory = load_inventory_file(path, &data).unwrap_or_else(|e| fail(e));
    }

    // 3. Preferences: file first, then explicit flags from the subcommand
    let (cli_config, sub_name) = match &cli.command {
        Commands::Maximize(args) => (&args.config, "maximize"),
        Commands::Parse(args) => (&args.config, "parse"),
    };
    let mut config = match &cli.prefs {
        Some(path) => {
            println!("⚖️  Loading Preferences from: {}", path);
            Config::load_from_file(path).unwrap_or_else(|e| fail(e))
        }
        None => Config::default(),
    };
    if let Some(sub_matches) = matches.subcommand_matches(sub_name) {
        config.prefs.merge_from_cli(&cli_config.prefs, sub_matches);
    }

    // 4. Execute
    match cli.command {
        Commands::Maximize(args) => cmd::maximize::run(&args, &data, &ctx, &config.prefs),
        Commands::Parse(args) => cmd::parse::run(&args, &data, &ctx, &config.prefs),
    }
}
