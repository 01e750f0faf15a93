use engine::{SceneCommand, SceneKey, Vec2};
use tracing::{info, warn};

use super::context::GameContext;
use super::locations::{LocationId, SubsceneId};
use super::scenes::{GameScene, MAP, OVERWORLD};
use super::session::{Departure, SessionState, TransitionIntent};

/// Axis-aligned box in world space. Edges are inclusive.
#[derive(Debug, Clone, Copy, PartialEq)]
pub(crate) struct Rect {
    pub(crate) min: Vec2,
    pub(crate) max: Vec2,
}

impl Rect {
    pub(crate) fn around(center: Vec2, half_width: f32, half_height: f32) -> Self {
        Self {
            min: Vec2::new(center.x - half_width, center.y - half_height),
            max: Vec2::new(center.x + half_width, center.y + half_height),
        }
    }

    pub(crate) fn contains(&self, point: Vec2) -> bool {
        point.x >= self.min.x
            && point.x <= self.max.x
            && point.y >= self.min.y
            && point.y <= self.max.y
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum TriggerKind {
    EnterSubscene {
        target: GameScene,
        subscene: SubsceneId,
    },
    ExitToOverworld {
        subscene: SubsceneId,
    },
    TravelTo {
        location: LocationId,
    },
}

impl TriggerKind {
    /// Records the departure in the session and returns the load to request.
    pub(crate) fn fire(self, ctx: &mut GameContext) -> SceneCommand {
        let (target, intent) = match self {
            TriggerKind::EnterSubscene { target, subscene } => {
                (target.key(), TransitionIntent::FromSubscene(subscene))
            }
            TriggerKind::ExitToOverworld { subscene } => {
                (OVERWORLD, TransitionIntent::FromSubscene(subscene))
            }
            TriggerKind::TravelTo { location } => match ctx.locations.resolve(location) {
                Ok(destination) => (
                    destination.scene.key(),
                    TransitionIntent::FromMapSelection(location),
                ),
                Err(error) => {
                    warn!(error = %error, "travel_target_unknown");
                    return SceneCommand::None;
                }
            },
        };

        ctx.session.set_departure(Departure::Replace { target, intent });
        info!(scene = %target, intent = ?intent, "transition_requested");
        SceneCommand::SwitchTo(target)
    }
}

/// Something the player can activate by standing on it and pressing interact.
pub(crate) trait Interactable {
    fn can_interact(&self, actor_position: Vec2) -> bool;
    fn interact(&self, ctx: &mut GameContext) -> SceneCommand;
}

#[derive(Debug, Clone)]
pub(crate) struct TriggerZone {
    pub(crate) name: &'static str,
    pub(crate) area: Rect,
    pub(crate) kind: TriggerKind,
}

impl TriggerZone {
    pub(crate) fn new(name: &'static str, area: Rect, kind: TriggerKind) -> Self {
        Self { name, area, kind }
    }
}

impl Interactable for TriggerZone {
    fn can_interact(&self, actor_position: Vec2) -> bool {
        self.area.contains(actor_position)
    }

    fn interact(&self, ctx: &mut GameContext) -> SceneCommand {
        info!(zone = self.name, "zone_activated");
        self.kind.fire(ctx)
    }
}

/// Snapshots the player in `scene` and asks for the map to be shown over it.
pub(crate) fn open_map(
    scene: SceneKey,
    player_position: Vec2,
    session: &mut SessionState,
) -> SceneCommand {
    session.snapshot_position(player_position, scene);
    session.set_departure(Departure::Overlay {
        overlay: MAP,
        return_to: scene,
    });
    info!(scene = %scene, position = %player_position, "transition_requested");
    SceneCommand::OpenOverlay(MAP)
}

#[cfg(test)]
mod tests {
    use super::super::locations::LocationRegistry;
    use super::super::scenes::{FISHING, HOUSE};
    use super::*;

    fn context() -> GameContext {
        GameContext::new(LocationRegistry::builtin().expect("builtin registry"))
    }

    #[test]
    fn rect_edges_are_inclusive() {
        let rect = Rect::around(Vec2::new(0.0, 0.0), 10.0, 5.0);
        assert!(rect.contains(Vec2::new(10.0, 5.0)));
        assert!(rect.contains(Vec2::new(-10.0, -5.0)));
        assert!(!rect.contains(Vec2::new(10.5, 0.0)));
    }

    #[test]
    fn entering_subscene_sets_intent_without_snapshot() {
        let mut ctx = context();
        let command = TriggerKind::EnterSubscene {
            target: GameScene::Fishing,
            subscene: SubsceneId::Fishing,
        }
        .fire(&mut ctx);

        assert_eq!(command, SceneCommand::SwitchTo(FISHING));
        assert_eq!(
            ctx.session.transition_intent(),
            TransitionIntent::FromSubscene(SubsceneId::Fishing)
        );
        assert!(!ctx.session.has_saved_position());
    }

    #[test]
    fn exiting_subscene_targets_overworld() {
        let mut ctx = context();
        let command = TriggerKind::ExitToOverworld {
            subscene: SubsceneId::House,
        }
        .fire(&mut ctx);

        assert_eq!(command, SceneCommand::SwitchTo(OVERWORLD));
        assert_eq!(
            ctx.session.transition_intent(),
            TransitionIntent::FromSubscene(SubsceneId::House)
        );
    }

    #[test]
    fn travel_targets_the_location_scene_and_drops_snapshot() {
        let mut ctx = context();
        open_map(HOUSE, Vec2::new(300.0, 410.0), &mut ctx.session);

        let command = TriggerKind::TravelTo {
            location: LocationId::Bridge,
        }
        .fire(&mut ctx);

        assert_eq!(command, SceneCommand::SwitchTo(OVERWORLD));
        assert_eq!(
            ctx.session.transition_intent(),
            TransitionIntent::FromMapSelection(LocationId::Bridge)
        );
        assert!(!ctx.session.has_saved_position());
        assert_eq!(ctx.session.pending_return_scene(), None);
    }

    #[test]
    fn open_map_snapshots_and_records_return_scene() {
        let mut session = SessionState::default();
        let command = open_map(HOUSE, Vec2::new(300.0, 410.0), &mut session);

        assert_eq!(command, SceneCommand::OpenOverlay(MAP));
        assert_eq!(session.pending_return_scene(), Some(HOUSE));
        assert_eq!(session.transition_intent(), TransitionIntent::None);
        assert_eq!(
            session.consume_saved_position(HOUSE),
            Some(Vec2::new(300.0, 410.0))
        );
    }

    #[test]
    fn zone_requires_actor_inside() {
        let zone = TriggerZone::new(
            "door",
            Rect::around(Vec2::new(100.0, 100.0), 20.0, 20.0),
            TriggerKind::ExitToOverworld {
                subscene: SubsceneId::House,
            },
        );
        assert!(zone.can_interact(Vec2::new(110.0, 90.0)));
        assert!(!zone.can_interact(Vec2::new(200.0, 100.0)));
    }
}
