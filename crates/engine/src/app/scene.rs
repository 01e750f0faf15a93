use std::collections::HashMap;
use std::fmt;

use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::{debug, info, warn};

use super::input::{ActionStates, InputAction};

/// Group membership carried by the controllable player entity.
pub const PLAYER_TAG: &str = "Player";

/// Opaque reference to a loadable scene.
///
/// Used both as a load destination and as a provenance tag for data that is only
/// valid inside one scene.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct SceneKey(&'static str);

impl SceneKey {
    pub const fn new(name: &'static str) -> Self {
        Self(name)
    }

    pub const fn name(self) -> &'static str {
        self.0
    }
}

impl fmt::Display for SceneKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.0)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SceneCommand {
    None,
    /// Unloads the active scene (and any overlay) and loads `SceneKey` fresh.
    SwitchTo(SceneKey),
    /// Shows a layer on top of the active scene and pauses the scene underneath.
    OpenOverlay(SceneKey),
    /// Hides the overlay layer and resumes the scene underneath.
    CloseOverlay,
}

/// What a tick changed in the scene stack, for logging by the caller.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SceneChange {
    Switched { from: SceneKey, to: SceneKey },
    OverlayOpened(SceneKey),
    OverlayClosed(SceneKey),
}

#[derive(Debug, Error, PartialEq, Eq)]
pub enum SceneError {
    #[error("scene {0} is not registered")]
    Unregistered(SceneKey),
}

#[derive(Debug, Clone, Copy, Default)]
pub struct InputSnapshot {
    actions: ActionStates,
    interact_pressed: bool,
    open_map_pressed: bool,
    cancel_pressed: bool,
    cursor_position_px: Option<Vec2>,
    pointer_pressed: bool,
    pointer_down: bool,
    pointer_released: bool,
    window_width: u32,
    window_height: u32,
}

impl InputSnapshot {
    pub fn empty() -> Self {
        Self::default()
    }

    #[allow(clippy::too_many_arguments)]
    pub(crate) fn new(
        actions: ActionStates,
        interact_pressed: bool,
        open_map_pressed: bool,
        cancel_pressed: bool,
        cursor_position_px: Option<Vec2>,
        pointer_pressed: bool,
        pointer_down: bool,
        pointer_released: bool,
        window_size: (u32, u32),
    ) -> Self {
        Self {
            actions,
            interact_pressed,
            open_map_pressed,
            cancel_pressed,
            cursor_position_px,
            pointer_pressed,
            pointer_down,
            pointer_released,
            window_width: window_size.0,
            window_height: window_size.1,
        }
    }

    pub fn is_down(&self, action: InputAction) -> bool {
        self.actions.is_down(action)
    }

    /// Continuous movement axis in world space (+x right, +y down), not normalized.
    pub fn move_axis(&self) -> Vec2 {
        let axis = |negative: InputAction, positive: InputAction| -> f32 {
            let mut value = 0.0;
            if self.is_down(negative) {
                value -= 1.0;
            }
            if self.is_down(positive) {
                value += 1.0;
            }
            value
        };
        Vec2 {
            x: axis(InputAction::MoveLeft, InputAction::MoveRight),
            y: axis(InputAction::MoveUp, InputAction::MoveDown),
        }
    }

    pub fn interact_pressed(&self) -> bool {
        self.interact_pressed
    }

    pub fn open_map_pressed(&self) -> bool {
        self.open_map_pressed
    }

    pub fn cancel_pressed(&self) -> bool {
        self.cancel_pressed
    }

    pub fn cursor_position_px(&self) -> Option<Vec2> {
        self.cursor_position_px
    }

    pub fn pointer_pressed(&self) -> bool {
        self.pointer_pressed
    }

    pub fn pointer_down(&self) -> bool {
        self.pointer_down
    }

    pub fn pointer_released(&self) -> bool {
        self.pointer_released
    }

    pub fn window_size(&self) -> (u32, u32) {
        (self.window_width, self.window_height)
    }

    pub fn with_action_down(mut self, action: InputAction, is_down: bool) -> Self {
        self.actions.set(action, is_down);
        self
    }

    pub fn with_interact_pressed(mut self, pressed: bool) -> Self {
        self.interact_pressed = pressed;
        self
    }

    pub fn with_open_map_pressed(mut self, pressed: bool) -> Self {
        self.open_map_pressed = pressed;
        self
    }

    pub fn with_cancel_pressed(mut self, pressed: bool) -> Self {
        self.cancel_pressed = pressed;
        self
    }

    pub fn with_cursor_position_px(mut self, cursor_position_px: Option<Vec2>) -> Self {
        self.cursor_position_px = cursor_position_px;
        self
    }

    pub fn with_pointer_pressed(mut self, pressed: bool) -> Self {
        self.pointer_pressed = pressed;
        if pressed {
            self.pointer_down = true;
        }
        self
    }

    pub fn with_pointer_down(mut self, down: bool) -> Self {
        self.pointer_down = down;
        self
    }

    pub fn with_pointer_released(mut self, released: bool) -> Self {
        self.pointer_released = released;
        if released {
            self.pointer_down = false;
        }
        self
    }

    pub fn with_window_size(mut self, window_size: (u32, u32)) -> Self {
        self.window_width = window_size.0;
        self.window_height = window_size.1;
        self
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct Vec2 {
    pub x: f32,
    pub y: f32,
}

impl Vec2 {
    pub const fn new(x: f32, y: f32) -> Self {
        Self { x, y }
    }

    pub fn is_finite(self) -> bool {
        self.x.is_finite() && self.y.is_finite()
    }

    pub fn distance_squared(self, other: Vec2) -> f32 {
        let dx = self.x - other.x;
        let dy = self.y - other.y;
        dx * dx + dy * dy
    }

    pub fn offset(self, other: Vec2) -> Vec2 {
        Vec2 {
            x: self.x + other.x,
            y: self.y + other.y,
        }
    }

    pub fn delta_to(self, other: Vec2) -> Vec2 {
        Vec2 {
            x: other.x - self.x,
            y: other.y - self.y,
        }
    }
}

impl fmt::Display for Vec2 {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "({}, {})", self.x, self.y)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct EntityId(pub u64);

#[derive(Debug, Clone)]
pub struct Entity {
    pub id: EntityId,
    pub name: &'static str,
    pub position: Vec2,
    tags: Vec<&'static str>,
}

impl Entity {
    pub fn has_tag(&self, tag: &str) -> bool {
        self.tags.iter().any(|candidate| *candidate == tag)
    }
}

#[derive(Debug, Default)]
pub struct EntityIdAllocator {
    next: u64,
}

impl EntityIdAllocator {
    pub fn allocate(&mut self) -> EntityId {
        let id = EntityId(self.next);
        self.next = self.next.saturating_add(1);
        id
    }
}

/// Entities owned by one scene.
///
/// Spawns are queued and only become visible after
/// [`apply_pending`](Self::apply_pending), which the scene machine runs after
/// every load and tick.
#[derive(Debug, Default)]
pub struct SceneWorld {
    allocator: EntityIdAllocator,
    entities: Vec<Entity>,
    pending_spawns: Vec<Entity>,
}

impl SceneWorld {
    pub fn spawn(&mut self, name: &'static str, position: Vec2) -> EntityId {
        self.spawn_tagged(name, position, &[])
    }

    pub fn spawn_tagged(
        &mut self,
        name: &'static str,
        position: Vec2,
        tags: &[&'static str],
    ) -> EntityId {
        let id = self.allocator.allocate();
        self.pending_spawns.push(Entity {
            id,
            name,
            position,
            tags: tags.to_vec(),
        });
        id
    }

    pub fn apply_pending(&mut self) {
        self.entities.append(&mut self.pending_spawns);
    }

    pub fn clear(&mut self) {
        self.entities.clear();
        self.pending_spawns.clear();
    }

    pub fn entity_count(&self) -> usize {
        self.entities.len()
    }

    pub fn find_entity(&self, id: EntityId) -> Option<&Entity> {
        self.entities.iter().find(|entity| entity.id == id)
    }

    pub fn find_entity_mut(&mut self, id: EntityId) -> Option<&mut Entity> {
        self.entities.iter_mut().find(|entity| entity.id == id)
    }

    pub fn first_tagged(&self, tag: &str) -> Option<&Entity> {
        self.entities.iter().find(|entity| entity.has_tag(tag))
    }

    pub fn first_tagged_mut(&mut self, tag: &str) -> Option<&mut Entity> {
        self.entities.iter_mut().find(|entity| entity.has_tag(tag))
    }
}

/// A gameplay scene driven by the [`SceneMachine`].
///
/// `C` is the game context lent to the scene for the duration of each call. It
/// is the only channel for state that outlives a scene.
///
/// Activation is two-phase: `load` builds the scene's entities, then `ready`
/// runs at the start of the scene's next tick once every entity from `load` is
/// applied.
pub trait Scene<C> {
    fn load(&mut self, world: &mut SceneWorld, ctx: &mut C);
    fn ready(&mut self, _world: &mut SceneWorld, _ctx: &mut C) {}
    fn update(
        &mut self,
        fixed_dt_seconds: f32,
        input: &InputSnapshot,
        world: &mut SceneWorld,
        ctx: &mut C,
    ) -> SceneCommand;
    /// Called on the scene underneath an overlay when the overlay closes.
    fn resume(&mut self, _world: &mut SceneWorld, _ctx: &mut C) {}
    fn unload(&mut self, world: &mut SceneWorld, ctx: &mut C);
    fn debug_title(&self, _world: &SceneWorld, _ctx: &C) -> Option<String> {
        None
    }
}

struct SceneRuntime<C> {
    scene: Box<dyn Scene<C>>,
    world: SceneWorld,
    is_loaded: bool,
    awaiting_ready: bool,
}

impl<C> SceneRuntime<C> {
    fn load(&mut self, ctx: &mut C) {
        self.world.clear();
        self.scene.load(&mut self.world, ctx);
        self.world.apply_pending();
        self.is_loaded = true;
        self.awaiting_ready = true;
    }

    fn unload(&mut self, ctx: &mut C) {
        if !self.is_loaded {
            return;
        }
        self.scene.unload(&mut self.world, ctx);
        self.world.clear();
        self.is_loaded = false;
        self.awaiting_ready = false;
    }
}

/// Owns every registered scene, the active scene and an optional overlay layer.
///
/// While an overlay is shown it is the only scene that ticks; the active scene
/// stays loaded but paused until the overlay closes.
pub struct SceneMachine<C> {
    runtimes: HashMap<SceneKey, SceneRuntime<C>>,
    active_scene: SceneKey,
    overlay: Option<SceneKey>,
}

impl<C> SceneMachine<C> {
    pub fn new(initial_scene: SceneKey) -> Self {
        Self {
            runtimes: HashMap::new(),
            active_scene: initial_scene,
            overlay: None,
        }
    }

    pub fn register(&mut self, key: SceneKey, scene: Box<dyn Scene<C>>) {
        let runtime = SceneRuntime {
            scene,
            world: SceneWorld::default(),
            is_loaded: false,
            awaiting_ready: false,
        };
        if self.runtimes.insert(key, runtime).is_some() {
            warn!(scene = %key, "scene was already registered and has been replaced");
        }
    }

    pub fn is_registered(&self, key: SceneKey) -> bool {
        self.runtimes.contains_key(&key)
    }

    pub fn active_scene(&self) -> SceneKey {
        self.active_scene
    }

    pub fn overlay(&self) -> Option<SceneKey> {
        self.overlay
    }

    pub fn is_paused(&self) -> bool {
        self.overlay.is_some()
    }

    /// Loads the initial scene. Its `ready` phase runs on the first tick.
    pub fn start(&mut self, ctx: &mut C) -> Result<(), SceneError> {
        let key = self.active_scene;
        let runtime = self
            .runtimes
            .get_mut(&key)
            .ok_or(SceneError::Unregistered(key))?;
        runtime.load(ctx);
        info!(
            scene = %key,
            entity_count = runtime.world.entity_count(),
            "scene_loaded"
        );
        Ok(())
    }

    /// Runs one fixed step on the focused scene and applies the command it returns.
    pub fn tick(
        &mut self,
        fixed_dt_seconds: f32,
        input: &InputSnapshot,
        ctx: &mut C,
    ) -> Option<SceneChange> {
        let focused = self.focused_scene();
        let command = match self.runtimes.get_mut(&focused) {
            Some(runtime) if runtime.is_loaded => {
                if runtime.awaiting_ready {
                    runtime.awaiting_ready = false;
                    runtime.scene.ready(&mut runtime.world, ctx);
                    runtime.world.apply_pending();
                }
                let command =
                    runtime
                        .scene
                        .update(fixed_dt_seconds, input, &mut runtime.world, ctx);
                runtime.world.apply_pending();
                command
            }
            _ => {
                warn!(scene = %focused, "focused scene is not loaded; skipping tick");
                SceneCommand::None
            }
        };

        self.apply_command(command, ctx)
    }

    pub fn apply_command(&mut self, command: SceneCommand, ctx: &mut C) -> Option<SceneChange> {
        match command {
            SceneCommand::None => None,
            SceneCommand::SwitchTo(next) => self.switch_to(next, ctx),
            SceneCommand::OpenOverlay(key) => self.open_overlay(key, ctx),
            SceneCommand::CloseOverlay => self.close_overlay(ctx),
        }
    }

    pub fn world(&self, key: SceneKey) -> Option<&SceneWorld> {
        self.runtimes
            .get(&key)
            .filter(|runtime| runtime.is_loaded)
            .map(|runtime| &runtime.world)
    }

    pub fn world_mut(&mut self, key: SceneKey) -> Option<&mut SceneWorld> {
        self.runtimes
            .get_mut(&key)
            .filter(|runtime| runtime.is_loaded)
            .map(|runtime| &mut runtime.world)
    }

    pub fn active_world(&self) -> Option<&SceneWorld> {
        self.world(self.active_scene)
    }

    pub fn debug_title(&self, ctx: &C) -> Option<String> {
        let runtime = self.runtimes.get(&self.focused_scene())?;
        runtime.scene.debug_title(&runtime.world, ctx)
    }

    pub fn shutdown_all(&mut self, ctx: &mut C) {
        if let Some(overlay) = self.overlay.take() {
            if let Some(runtime) = self.runtimes.get_mut(&overlay) {
                runtime.unload(ctx);
            }
        }
        for runtime in self.runtimes.values_mut() {
            runtime.unload(ctx);
        }
    }

    fn focused_scene(&self) -> SceneKey {
        self.overlay.unwrap_or(self.active_scene)
    }

    fn switch_to(&mut self, next: SceneKey, ctx: &mut C) -> Option<SceneChange> {
        if !self.runtimes.contains_key(&next) {
            warn!(scene = %next, "attempted to switch to unregistered scene");
            return None;
        }

        if let Some(overlay) = self.overlay.take() {
            if let Some(runtime) = self.runtimes.get_mut(&overlay) {
                runtime.unload(ctx);
            }
        }

        let previous = self.active_scene;
        if let Some(runtime) = self.runtimes.get_mut(&previous) {
            runtime.unload(ctx);
        }

        self.active_scene = next;
        let runtime = self.runtimes.get_mut(&next)?;
        runtime.load(ctx);
        debug!(from = %previous, to = %next, "scene_replaced");
        Some(SceneChange::Switched {
            from: previous,
            to: next,
        })
    }

    fn open_overlay(&mut self, key: SceneKey, ctx: &mut C) -> Option<SceneChange> {
        if let Some(current) = self.overlay {
            warn!(overlay = %current, requested = %key, "overlay already open, skipping");
            return None;
        }
        if key == self.active_scene {
            warn!(scene = %key, "scene cannot be shown as an overlay over itself");
            return None;
        }
        let Some(runtime) = self.runtimes.get_mut(&key) else {
            warn!(scene = %key, "attempted to open unregistered overlay");
            return None;
        };

        runtime.load(ctx);
        self.overlay = Some(key);
        Some(SceneChange::OverlayOpened(key))
    }

    fn close_overlay(&mut self, ctx: &mut C) -> Option<SceneChange> {
        let Some(overlay) = self.overlay.take() else {
            debug!("no overlay open, skipping close");
            return None;
        };
        if let Some(runtime) = self.runtimes.get_mut(&overlay) {
            runtime.unload(ctx);
        }
        if let Some(runtime) = self.runtimes.get_mut(&self.active_scene) {
            if runtime.is_loaded {
                runtime.scene.resume(&mut runtime.world, ctx);
                runtime.world.apply_pending();
            }
        }
        Some(SceneChange::OverlayClosed(overlay))
    }
}
