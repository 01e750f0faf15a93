use engine::{SceneKey, SceneMachine, Vec2};
use serde::{Deserialize, Serialize};

use super::context::GameContext;
use super::locations::{LocationId, SubsceneId};
use super::triggers::{Rect, TriggerKind, TriggerZone};

mod gameplay;
pub(crate) mod map;

pub(crate) use gameplay::GameplayScene;
pub(crate) use map::MapOverlayScene;

pub(crate) const OVERWORLD: SceneKey = SceneKey::new("overworld");
pub(crate) const HOUSE: SceneKey = SceneKey::new("house");
pub(crate) const FISHING: SceneKey = SceneKey::new("fishing");
pub(crate) const MAP: SceneKey = SceneKey::new("map");

const OVERWORLD_AUTHORED_SPAWN: Vec2 = Vec2::new(108.0, 1100.0);
const HOUSE_AUTHORED_SPAWN: Vec2 = Vec2::new(320.0, 410.0);
const FISHING_AUTHORED_SPAWN: Vec2 = Vec2::new(180.0, 300.0);

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub(crate) enum GameScene {
    Overworld,
    House,
    Fishing,
    Map,
}

impl GameScene {
    pub(crate) const fn key(self) -> SceneKey {
        match self {
            GameScene::Overworld => OVERWORLD,
            GameScene::House => HOUSE,
            GameScene::Fishing => FISHING,
            GameScene::Map => MAP,
        }
    }

    pub(crate) fn from_name(name: &str) -> Option<Self> {
        match name.trim().to_ascii_lowercase().as_str() {
            "overworld" => Some(GameScene::Overworld),
            "house" => Some(GameScene::House),
            "fishing" => Some(GameScene::Fishing),
            "map" => Some(GameScene::Map),
            _ => None,
        }
    }

    /// Scenes the player can be spawned into. The map is only ever an overlay.
    pub(crate) const fn is_gameplay(self) -> bool {
        !matches!(self, GameScene::Map)
    }
}

pub(crate) fn build_scene_machine(initial: GameScene) -> SceneMachine<GameContext> {
    let mut machine = SceneMachine::new(initial.key());
    machine.register(OVERWORLD, Box::new(overworld()));
    machine.register(HOUSE, Box::new(house()));
    machine.register(FISHING, Box::new(fishing()));
    machine.register(MAP, Box::new(MapOverlayScene::new()));
    machine
}

fn overworld() -> GameplayScene {
    GameplayScene::new(GameScene::Overworld, OVERWORLD_AUTHORED_SPAWN, None)
        .with_location_tracking()
        .with_zone(TriggerZone::new(
            "moomin_house_door",
            Rect::around(Vec2::new(2588.0, 921.0), 70.0, 80.0),
            TriggerKind::EnterSubscene {
                target: GameScene::House,
                subscene: SubsceneId::House,
            },
        ))
        .with_zone(TriggerZone::new(
            "bridge_fishing_spot",
            Rect::around(Vec2::new(-1470.0, 1114.0), 80.0, 60.0),
            TriggerKind::EnterSubscene {
                target: GameScene::Fishing,
                subscene: SubsceneId::Fishing,
            },
        ))
}

fn house() -> GameplayScene {
    GameplayScene::new(
        GameScene::House,
        HOUSE_AUTHORED_SPAWN,
        Some(LocationId::MoominHouse),
    )
    .with_zone(TriggerZone::new(
        "front_door",
        Rect::around(HOUSE_AUTHORED_SPAWN, 60.0, 40.0),
        TriggerKind::ExitToOverworld {
            subscene: SubsceneId::House,
        },
    ))
}

fn fishing() -> GameplayScene {
    GameplayScene::new(
        GameScene::Fishing,
        FISHING_AUTHORED_SPAWN,
        Some(LocationId::Bridge),
    )
    .with_zone(TriggerZone::new(
        "go_home_path",
        Rect::around(FISHING_AUTHORED_SPAWN, 60.0, 60.0),
        TriggerKind::ExitToOverworld {
            subscene: SubsceneId::Fishing,
        },
    ))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn scene_names_round_trip_through_keys() {
        for scene in [
            GameScene::Overworld,
            GameScene::House,
            GameScene::Fishing,
            GameScene::Map,
        ] {
            assert_eq!(GameScene::from_name(scene.key().name()), Some(scene));
        }
        assert_eq!(GameScene::from_name(" House "), Some(GameScene::House));
        assert_eq!(GameScene::from_name("attic"), None);
    }

    #[test]
    fn machine_registers_every_scene() {
        let machine = build_scene_machine(GameScene::Overworld);
        for key in [OVERWORLD, HOUSE, FISHING, MAP] {
            assert!(machine.is_registered(key), "{key} missing");
        }
        assert_eq!(machine.active_scene(), OVERWORLD);
    }
}
