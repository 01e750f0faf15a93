use engine::{SceneKey, SceneWorld, Vec2, PLAYER_TAG};
use thiserror::Error;
use tracing::{debug, error, info, warn};

use super::context::GameContext;
use super::locations::{Location, LocationId, LocationRegistry};
use super::scenes::GameScene;
use super::session::{SessionState, TransitionIntent};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum SpawnRule {
    SameSceneRestore,
    FixedSpawn,
    AuthoredDefault,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub(crate) struct SpawnResolution {
    pub(crate) rule: SpawnRule,
    /// `None` leaves the player at the position the scene placed it.
    pub(crate) position: Option<Vec2>,
    pub(crate) location: LocationId,
}

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub(crate) enum ResolveError {
    #[error("scene {scene} has no entity tagged {node}")]
    MissingRequiredNode { scene: SceneKey, node: &'static str },
}

/// Decides where the player appears when a gameplay scene becomes active.
///
/// Rules are tried in order and the first match wins:
/// 1. a saved position taken in this scene,
/// 2. the fixed spawn for a sub-scene return or map selection aimed at this scene,
/// 3. the authored position, with the location fixed per scene or inferred from X.
///
/// Both the intent and the saved position are consumed whichever rule fires.
#[derive(Debug, Clone, Copy)]
pub(crate) struct SceneEntryResolver {
    scene: GameScene,
    fixed_location: Option<LocationId>,
}

impl SceneEntryResolver {
    pub(crate) fn new(scene: GameScene, fixed_location: Option<LocationId>) -> Self {
        Self {
            scene,
            fixed_location,
        }
    }

    pub(crate) fn resolve(
        &self,
        current_position: Vec2,
        session: &mut SessionState,
        locations: &LocationRegistry,
    ) -> SpawnResolution {
        let saved = session.consume_saved_position(self.scene.key());
        let intent = session.consume_intent();

        if let Some(position) = saved {
            return SpawnResolution {
                rule: SpawnRule::SameSceneRestore,
                position: Some(position),
                location: session.current_location(),
            };
        }

        if let Some(destination) = self.fixed_spawn(intent, locations) {
            session.record_location(destination.id);
            return SpawnResolution {
                rule: SpawnRule::FixedSpawn,
                position: Some(destination.spawn_position),
                location: destination.id,
            };
        }

        let inferred = self
            .fixed_location
            .or_else(|| locations.infer_from_position(current_position.x));
        match inferred {
            Some(location) => session.record_location(location),
            None => warn!(
                scene = %self.scene.key(),
                x = current_position.x,
                kept = %session.current_location(),
                "location_not_inferred"
            ),
        }
        SpawnResolution {
            rule: SpawnRule::AuthoredDefault,
            position: None,
            location: session.current_location(),
        }
    }

    /// Resolves against the scene's player entity and moves it in place.
    ///
    /// Without a player the session fields are still consumed.
    pub(crate) fn resolve_into_world(
        &self,
        world: &mut SceneWorld,
        ctx: &mut GameContext,
    ) -> Result<SpawnResolution, ResolveError> {
        let scene = self.scene.key();
        let Some(player) = world.first_tagged_mut(PLAYER_TAG) else {
            ctx.session.consume_saved_position(scene);
            ctx.session.consume_intent();
            return Err(ResolveError::MissingRequiredNode {
                scene,
                node: PLAYER_TAG,
            });
        };

        let resolution = self.resolve(player.position, &mut ctx.session, &ctx.locations);
        if let Some(position) = resolution.position {
            player.position = position;
        }
        info!(
            scene = %scene,
            rule = ?resolution.rule,
            location = %resolution.location,
            position = %player.position,
            "spawn_resolved"
        );
        Ok(resolution)
    }

    fn fixed_spawn<'a>(
        &self,
        intent: TransitionIntent,
        locations: &'a LocationRegistry,
    ) -> Option<&'a Location> {
        let lookup = match intent {
            TransitionIntent::None => return None,
            TransitionIntent::FromSubscene(subscene) => locations.subscene_return(subscene),
            TransitionIntent::FromMapSelection(location) => locations.resolve(location),
        };
        match lookup {
            Ok(destination) if destination.scene == self.scene => Some(destination),
            Ok(destination) => {
                debug!(
                    scene = %self.scene.key(),
                    intent = ?intent,
                    destination = %destination.scene.key(),
                    "intent_for_other_scene"
                );
                None
            }
            Err(lookup_error) => {
                warn!(
                    scene = %self.scene.key(),
                    error = %lookup_error,
                    "spawn_lookup_failed"
                );
                None
            }
        }
    }
}

/// Logged in every build; fatal in debug builds.
pub(crate) fn report_missing_node(resolve_error: &ResolveError) {
    error!(error = %resolve_error, "missing_required_node");
    if cfg!(debug_assertions) {
        panic!("{resolve_error}");
    }
}

#[cfg(test)]
mod tests {
    use super::super::locations::{LocationTable, SubsceneId};
    use super::super::session::Departure;
    use super::*;

    fn registry() -> LocationRegistry {
        LocationRegistry::builtin().expect("builtin registry")
    }

    fn overworld() -> SceneEntryResolver {
        SceneEntryResolver::new(GameScene::Overworld, None)
    }

    fn fishing() -> SceneEntryResolver {
        SceneEntryResolver::new(GameScene::Fishing, Some(LocationId::Bridge))
    }

    fn departing_with(intent: TransitionIntent) -> SessionState {
        let mut session = SessionState::default();
        session.set_departure(Departure::Replace {
            target: GameScene::Overworld.key(),
            intent,
        });
        session
    }

    #[test]
    fn saved_position_wins_over_intent() {
        let registry = registry();
        let mut session =
            departing_with(TransitionIntent::FromMapSelection(LocationId::MoominHouse));
        session.snapshot_position(Vec2::new(640.0, 1020.0), GameScene::Overworld.key());

        let resolution = overworld().resolve(Vec2::new(108.0, 1100.0), &mut session, &registry);

        assert_eq!(resolution.rule, SpawnRule::SameSceneRestore);
        assert_eq!(resolution.position, Some(Vec2::new(640.0, 1020.0)));
        assert_eq!(session.current_location(), LocationId::Tent);
        assert_eq!(session.transition_intent(), TransitionIntent::None);
        assert!(!session.has_saved_position());
    }

    #[test]
    fn subscene_return_uses_fixed_spawn() {
        let registry = registry();
        let mut session = departing_with(TransitionIntent::FromSubscene(
            SubsceneId::House,
        ));

        let resolution = overworld().resolve(Vec2::new(108.0, 1100.0), &mut session, &registry);

        assert_eq!(resolution.rule, SpawnRule::FixedSpawn);
        assert_eq!(resolution.position, Some(Vec2::new(2588.0, 921.0)));
        assert_eq!(session.current_location(), LocationId::MoominHouse);
    }

    #[test]
    fn stale_saved_position_falls_through_to_intent() {
        let registry = registry();
        let mut session = departing_with(TransitionIntent::FromMapSelection(LocationId::Bridge));
        session.snapshot_position(Vec2::new(300.0, 410.0), GameScene::House.key());

        let resolution = overworld().resolve(Vec2::new(108.0, 1100.0), &mut session, &registry);

        assert_eq!(resolution.rule, SpawnRule::FixedSpawn);
        assert_eq!(resolution.position, Some(Vec2::new(-1470.0, 1114.0)));
        assert!(!session.has_saved_position());
    }

    #[test]
    fn default_rule_infers_location_from_authored_position() {
        let registry = registry();
        let mut session = SessionState::default();
        session.record_location(LocationId::Bridge);

        let resolution = overworld().resolve(Vec2::new(2700.0, 900.0), &mut session, &registry);

        assert_eq!(resolution.rule, SpawnRule::AuthoredDefault);
        assert_eq!(resolution.position, None);
        assert_eq!(resolution.location, LocationId::MoominHouse);
    }

    #[test]
    fn default_rule_keeps_location_inside_range_gap() {
        let registry = registry();
        let mut session = SessionState::default();
        session.record_location(LocationId::MoominHouse);

        let resolution = overworld().resolve(Vec2::new(1750.0, 900.0), &mut session, &registry);

        assert_eq!(resolution.position, None);
        assert_eq!(session.current_location(), LocationId::MoominHouse);
    }

    #[test]
    fn intent_aimed_at_other_scene_is_consumed_and_ignored() {
        let registry = registry();
        let mut session = departing_with(TransitionIntent::FromSubscene(
            SubsceneId::Fishing,
        ));

        let resolution = fishing().resolve(Vec2::new(180.0, 300.0), &mut session, &registry);

        assert_eq!(resolution.rule, SpawnRule::AuthoredDefault);
        assert_eq!(resolution.position, None);
        assert_eq!(resolution.location, LocationId::Bridge);
        assert_eq!(session.transition_intent(), TransitionIntent::None);
    }

    #[test]
    fn unknown_subscene_row_falls_back_to_default() {
        let mut table = LocationTable::builtin();
        table.subscene_returns.clear();
        let registry = LocationRegistry::from_table(table).expect("registry");
        let mut session = departing_with(TransitionIntent::FromSubscene(
            SubsceneId::House,
        ));

        let resolution = overworld().resolve(Vec2::new(108.0, 1100.0), &mut session, &registry);

        assert_eq!(resolution.rule, SpawnRule::AuthoredDefault);
        assert_eq!(resolution.location, LocationId::Tent);
    }

    #[test]
    fn resolve_into_world_moves_player() {
        let mut ctx = GameContext::new(registry());
        ctx.session.set_departure(Departure::Replace {
            target: GameScene::Overworld.key(),
            intent: TransitionIntent::FromMapSelection(LocationId::Bridge),
        });
        let mut world = SceneWorld::default();
        let player = world.spawn_tagged("player", Vec2::new(108.0, 1100.0), &[PLAYER_TAG]);
        world.apply_pending();

        overworld()
            .resolve_into_world(&mut world, &mut ctx)
            .expect("resolution");

        let position = world.find_entity(player).expect("player").position;
        assert_eq!(position, Vec2::new(-1470.0, 1114.0));
        assert_eq!(ctx.session.current_location(), LocationId::Bridge);
    }

    #[test]
    fn missing_player_still_consumes_session_fields() {
        let mut ctx = GameContext::new(registry());
        ctx.session.snapshot_position(Vec2::new(1.0, 1.0), GameScene::Overworld.key());
        ctx.session.set_departure(Departure::Overlay {
            overlay: GameScene::Map.key(),
            return_to: GameScene::Overworld.key(),
        });
        let mut world = SceneWorld::default();

        let result = overworld().resolve_into_world(&mut world, &mut ctx);

        assert_eq!(
            result,
            Err(ResolveError::MissingRequiredNode {
                scene: GameScene::Overworld.key(),
                node: PLAYER_TAG,
            })
        );
        assert!(!ctx.session.has_saved_position());
        assert_eq!(ctx.session.transition_intent(), TransitionIntent::None);
    }

    #[cfg(debug_assertions)]
    #[test]
    #[should_panic(expected = "has no entity tagged Player")]
    fn missing_node_is_fatal_in_debug_builds() {
        report_missing_node(&ResolveError::MissingRequiredNode {
            scene: GameScene::House.key(),
            node: PLAYER_TAG,
        });
    }
}
