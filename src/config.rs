use crate::error::{GearForgeError, GfResult};
use clap::{parser::ValueSource, ArgMatches, Args};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;

/// Built-in secondary objective used to break ties between equal scores.
pub const DEFAULT_TIEBREAKER: &str = "1 familiar weight, 1 familiar experience, 1 initiative, 5 exp, 1 item, 1 meat, 0.1 DA 1000 max, 1 DR, 0.5 all res, -10 mana cost, 1.0 mus, 0.5 mys, 1.0 mox, 1.5 mainstat, 1 HP, 1 MP, 1 weapon damage, 1 ranged damage, 1 spell damage, 1 cold damage, 1 hot damage, 1 sleaze damage, 1 spooky damage, 1 stench damage, 1 cold spell damage, 1 hot spell damage, 1 sleaze spell damage, 1 spooky spell damage, 1 stench spell damage, -1 fumble, 1 HP regen max, 3 MP regen max, 1 critical hit percent, 0.1 food drop, 0.1 booze drop, 0.1 hat drop, 0.1 weapon drop, 0.1 offhand drop, 0.1 shirt drop, 0.1 pants drop, 0.1 accessory drop, 1 DB combat damage, 0.1 sixgun damage";

#[derive(Args, Debug, Clone, Serialize, Deserialize, Default)]
pub struct Config {
    #[command(flatten)]
    pub prefs: MaximizerPrefs,
}

impl Config {
    pub fn load_from_file<P: AsRef<Path>>(path: P) -> GfResult<Self> {
        let content = fs::read_to_string(path)?;
        let config: Self = serde_json::from_str(&content)?;
        config.prefs.validate()?;
        Ok(config)
    }
}

#[derive(Args, Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct MaximizerPrefs {
    /// Treat currently worn gear as a candidate even without `current`.
    #[arg(long, default_value_t = false)]
    pub always_current: bool,

    /// Count fold-group siblings as available copies.
    #[arg(long, default_value_t = true, action = clap::ArgAction::Set)]
    pub allow_foldables: bool,

    #[arg(long, default_value = DEFAULT_TIEBREAKER)]
    pub tiebreaker: String,

    /// Minimum dump level applied on top of the expression's own `dump`.
    #[arg(long, default_value_t = 0)]
    pub verbose_dump: u8,
}

impl Default for MaximizerPrefs {
    fn default() -> Self {
        Self {
            always_current: false,
            allow_foldables: true,
            tiebreaker: DEFAULT_TIEBREAKER.to_string(),
            verbose_dump: 0,
        }
    }
}

impl MaximizerPrefs {
    pub fn load_from_file<P: AsRef<Path>>(path: P) -> GfResult<Self> {
        let content = fs::read_to_string(path)?;
        let prefs: Self = serde_json::from_str(&content)?;
        prefs.validate()?;
        Ok(prefs)
    }

    pub fn validate(&self) -> GfResult<()> {
        if self.tiebreaker.trim().is_empty() {
            return Err(GearForgeError::Config(
                "tiebreaker expression must not be empty".to_string(),
            ));
        }
        Ok(())
    }

    pub fn merge_from_cli(&mut self, cli_prefs: &MaximizerPrefs, matches: &ArgMatches) {
        macro_rules! update_if_present {
            ($field:ident, $arg_name:expr) => {
                if matches.value_source($arg_name) == Some(ValueSource::CommandLine) {
                    self.$field = cli_prefs.$field.clone();
                }
            };
        }

        update_if_present!(always_current, "always_current");
        update_if_present!(allow_foldables, "allow_foldables");
        update_if_present!(tiebreaker, "tiebreaker");
        update_if_present!(verbose_dump, "verbose_dump");
    }
}
