use std::env;

use engine::{resolve_app_paths, LoopConfig, SceneMachine};
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

use super::config::{load_locations, ConfigError};
use super::context::GameContext;
use super::scenes::{build_scene_machine, GameScene};

const START_SCENE_ENV_VAR: &str = "VALLEY_START_SCENE";

pub(crate) struct AppWiring {
    pub(crate) config: LoopConfig,
    pub(crate) scenes: SceneMachine<GameContext>,
    pub(crate) context: GameContext,
}

pub(crate) fn build_app() -> Result<AppWiring, ConfigError> {
    init_tracing();
    info!("=== Valley Startup ===");

    let assets_dir = match resolve_app_paths() {
        Ok(paths) => {
            info!(root = %paths.root.display(), "project_root");
            Some(paths.assets_dir)
        }
        Err(error) => {
            warn!(error = %error, "project_root_unresolved");
            None
        }
    };
    let locations = load_locations(assets_dir.as_deref())?;
    for gap in locations.range_gaps() {
        warn!(gap = %gap, "location_range_gap");
    }

    let start = parse_start_scene(env::var(START_SCENE_ENV_VAR).ok().as_deref());
    info!(scene = %start.key(), "start_scene");

    Ok(AppWiring {
        config: LoopConfig::default(),
        scenes: build_scene_machine(start),
        context: GameContext::new(locations),
    })
}

fn init_tracing() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_thread_names(true)
        .compact()
        .init();
}

fn parse_start_scene(raw: Option<&str>) -> GameScene {
    let Some(raw) = raw.map(str::trim).filter(|value| !value.is_empty()) else {
        return GameScene::Overworld;
    };
    match GameScene::from_name(raw) {
        Some(scene) if scene.is_gameplay() => scene,
        _ => {
            warn!(var = START_SCENE_ENV_VAR, value = raw, "unknown_start_scene");
            GameScene::Overworld
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn start_scene_defaults_to_overworld() {
        assert_eq!(parse_start_scene(None), GameScene::Overworld);
        assert_eq!(parse_start_scene(Some("  ")), GameScene::Overworld);
    }

    #[test]
    fn start_scene_accepts_gameplay_scenes_only() {
        assert_eq!(parse_start_scene(Some("fishing")), GameScene::Fishing);
        assert_eq!(parse_start_scene(Some("House")), GameScene::House);
        assert_eq!(parse_start_scene(Some("map")), GameScene::Overworld);
        assert_eq!(parse_start_scene(Some("lighthouse")), GameScene::Overworld);
    }
}
