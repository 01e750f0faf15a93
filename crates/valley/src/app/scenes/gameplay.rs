use engine::{InputSnapshot, Scene, SceneCommand, SceneWorld, Vec2, PLAYER_TAG};
use tracing::{debug, info, warn};

use super::super::context::GameContext;
use super::super::locations::LocationId;
use super::super::resolver::{report_missing_node, SceneEntryResolver};
use super::super::triggers::{open_map, Interactable, TriggerZone};
use super::GameScene;

const PLAYER_SPEED_PX_PER_SECOND: f32 = 240.0;

/// A walkable scene with a player, interaction zones and the map shortcut.
pub(crate) struct GameplayScene {
    scene: GameScene,
    authored_spawn: Vec2,
    resolver: SceneEntryResolver,
    zones: Vec<TriggerZone>,
    tracks_location: bool,
}

impl GameplayScene {
    pub(crate) fn new(
        scene: GameScene,
        authored_spawn: Vec2,
        fixed_location: Option<LocationId>,
    ) -> Self {
        Self {
            scene,
            authored_spawn,
            resolver: SceneEntryResolver::new(scene, fixed_location),
            zones: Vec::new(),
            tracks_location: false,
        }
    }

    pub(crate) fn with_zone(mut self, zone: TriggerZone) -> Self {
        self.zones.push(zone);
        self
    }

    /// Keeps the session's current location in step with the player's X while walking.
    pub(crate) fn with_location_tracking(mut self) -> Self {
        self.tracks_location = true;
        self
    }

    fn resolve_spawn(&self, world: &mut SceneWorld, ctx: &mut GameContext) {
        if let Err(resolve_error) = self.resolver.resolve_into_world(world, ctx) {
            report_missing_node(&resolve_error);
        }
    }
}

fn log_session(ctx: &GameContext) {
    let session = &ctx.session;
    debug!(
        location = %session.current_location(),
        intent = ?session.transition_intent(),
        saved_position = session.has_saved_position(),
        return_scene = ?session.pending_return_scene(),
        "session_settled"
    );
}

impl Scene<GameContext> for GameplayScene {
    fn load(&mut self, world: &mut SceneWorld, _ctx: &mut GameContext) {
        world.spawn_tagged("player", self.authored_spawn, &[PLAYER_TAG]);
    }

    fn ready(&mut self, world: &mut SceneWorld, ctx: &mut GameContext) {
        self.resolve_spawn(world, ctx);
        log_session(ctx);
    }

    fn update(
        &mut self,
        fixed_dt_seconds: f32,
        input: &InputSnapshot,
        world: &mut SceneWorld,
        ctx: &mut GameContext,
    ) -> SceneCommand {
        let Some(player) = world.first_tagged_mut(PLAYER_TAG) else {
            return SceneCommand::None;
        };

        let axis = input.move_axis();
        let length = (axis.x * axis.x + axis.y * axis.y).sqrt();
        if length > 0.0 {
            let step = PLAYER_SPEED_PX_PER_SECOND * fixed_dt_seconds / length;
            player.position = player.position.offset(Vec2::new(axis.x * step, axis.y * step));
        }
        let position = player.position;

        if self.tracks_location {
            if let Some(location) = ctx.locations.infer_from_position(position.x) {
                ctx.session.record_location(location);
            }
        }

        if input.open_map_pressed() {
            return open_map(self.scene.key(), position, &mut ctx.session);
        }

        if input.interact_pressed() {
            if let Some(zone) = self.zones.iter().find(|zone| zone.can_interact(position)) {
                return zone.interact(ctx);
            }
        }

        SceneCommand::None
    }

    fn resume(&mut self, world: &mut SceneWorld, ctx: &mut GameContext) {
        self.resolve_spawn(world, ctx);
        let resumed = self.scene.key();
        if let Some(expected) = ctx
            .session
            .take_return_scene()
            .filter(|scene| *scene != resumed)
        {
            warn!(expected = %expected, resumed = %resumed, "return_scene_mismatch");
        }
        info!(scene = %resumed, "gameplay_resumed");
        log_session(ctx);
    }

    fn unload(&mut self, world: &mut SceneWorld, _ctx: &mut GameContext) {
        world.clear();
    }

    fn debug_title(&self, _world: &SceneWorld, ctx: &GameContext) -> Option<String> {
        Some(format!(
            "Valley - {} @ {}",
            self.scene.key(),
            ctx.session.current_location()
        ))
    }
}
