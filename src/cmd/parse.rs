use crate::reports;
use clap::Args;
use gearforge::character::CharacterContext;
use gearforge::config::{Config, MaximizerPrefs};
use gearforge::data::GameData;
use gearforge::scorer::Evaluator;
use std::process;
use tracing::error;

#[derive(Args, Debug, Clone)]
pub struct ParseArgs {
    #[command(flatten)]
    pub config: Config,

    pub expression: String,
}

pub fn run(args: &ParseArgs, data: &GameData, ctx: &CharacterContext, prefs: &MaximizerPrefs) {
    println!("🔎 Parsing: {}", args.expression);

    match Evaluator::parse(&args.expression, data, ctx, prefs) {
        Ok(ev) => reports::print_weights(&ev, data, ctx),
        Err(e) => {
            error!("{}", e);
            process::exit(1);
        }
    }
}
