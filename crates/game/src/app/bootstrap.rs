use std::path::PathBuf;

use overworld::{Overworld, OverworldConfig};
use tracing::info;
use tracing_subscriber::EnvFilter;

use super::scenario::{self, ScenarioError, ScriptStep};

const SCENARIO_PATH_ENV_VAR: &str = "OVERWORLD_SCENARIO";
const LANGUAGE_ENV_VAR: &str = "OVERWORLD_LANG";
const DEFAULT_LANGUAGE: &str = "en";

pub(crate) struct AppWiring {
    pub(crate) overworld: Overworld,
    pub(crate) script: Vec<ScriptStep>,
}

pub(crate) fn build_app() -> Result<AppWiring, ScenarioError> {
    init_tracing();
    info!("=== Overworld Demo Startup ===");

    let scenario = match scenario_path_from_env() {
        Some(path) => scenario::load_scenario(&path)?,
        None => {
            info!("using_builtin_scenario");
            scenario::default_scenario()?
        }
    };
    let config = OverworldConfig {
        language: language_from_env(),
        ..OverworldConfig::default()
    };
    let overworld = scenario.build(config)?;

    Ok(AppWiring {
        overworld,
        script: scenario.script,
    })
}

fn init_tracing() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .compact()
        .init();
}

fn scenario_path_from_env() -> Option<PathBuf> {
    std::env::var_os(SCENARIO_PATH_ENV_VAR)
        .filter(|raw| !raw.is_empty())
        .map(PathBuf::from)
}

fn language_from_env() -> String {
    parse_language(std::env::var(LANGUAGE_ENV_VAR).ok().as_deref())
}

fn parse_language(raw: Option<&str>) -> String {
    raw.map(str::trim)
        .filter(|code| !code.is_empty())
        .unwrap_or(DEFAULT_LANGUAGE)
        .to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn language_defaults_to_english() {
        assert_eq!(parse_language(None), "en");
        assert_eq!(parse_language(Some("  ")), "en");
        assert_eq!(parse_language(Some(" fr ")), "fr");
    }
}
