use crate::reports;
use clap::Args;
use gearforge::character::CharacterContext;
use gearforge::config::{Config, MaximizerPrefs};
use gearforge::data::GameData;
use gearforge::optimizer::Maximizer;
use gearforge::GearForgeError;
use std::process;
use tracing::error;

#[derive(Args, Debug, Clone)]
pub struct MaximizeArgs {
    #[command(flatten)]
    pub config: Config,

    /// e.g. "10 item drop, -combat, equip lucky hat"
    pub expression: String,

    /// Print the result as JSON instead of tables.
    #[arg(long, default_value_t = false)]
    pub json: bool,
}

pub fn run(args: &MaximizeArgs, data: &GameData, ctx: &CharacterContext, prefs: &MaximizerPrefs) {
    println!("🎯 Maximizing: {}", args.expression);

    let result = match Maximizer::new(data, ctx, prefs).maximize(&args.expression) {
        Ok(r) => r,
        Err(GearForgeError::Unsatisfiable { score }) => {
            error!(
                "No loadout satisfies '{}' (best attempt scored {:.2})",
                args.expression, score
            );
            process::exit(1);
        }
        Err(e) => {
            error!("{}", e);
            process::exit(1);
        }
    };

    if args.json {
        match serde_json::to_string_pretty(&result) {
            Ok(json) => println!("{}", json),
            Err(e) => {
                error!("{}", e);
                process::exit(1);
            }
        }
        return;
    }

    reports::print_loadout(&result);
    reports::print_highlights(&result);
    println!(
        "\n✅ Score {:.2} (tiebreaker {:.2}), {} change(s), {} configurations scored",
        result.score, result.tiebreaker, result.changes, result.evaluated
    );
}
