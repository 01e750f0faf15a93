use engine::{SceneKey, Vec2};
use tracing::debug;

use super::locations::{LocationId, SubsceneId};

/// Why the next gameplay scene is being entered.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub(crate) enum TransitionIntent {
    #[default]
    None,
    FromSubscene(SubsceneId),
    FromMapSelection(LocationId),
}

/// How the player is leaving the focused scene.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum Departure {
    /// The focused scene is unloaded and `target` is loaded fresh.
    Replace {
        target: SceneKey,
        intent: TransitionIntent,
    },
    /// `overlay` is shown over `return_to`, which stays loaded and paused.
    Overlay {
        overlay: SceneKey,
        return_to: SceneKey,
    },
}

/// A player position that is only meaningful inside the scene it was taken in.
#[derive(Debug, Clone, Copy, PartialEq)]
pub(crate) struct SavedPosition {
    pub(crate) position: Vec2,
    pub(crate) scene: SceneKey,
}

/// Cross-scene transition state, owned by the game context.
///
/// Every `consume_*` call is read-and-clear: a value can be observed once.
#[derive(Debug, Clone)]
pub(crate) struct SessionState {
    transition_intent: TransitionIntent,
    current_location: LocationId,
    pending_return_scene: Option<SceneKey>,
    saved_position: Option<SavedPosition>,
}

impl Default for SessionState {
    fn default() -> Self {
        Self {
            transition_intent: TransitionIntent::None,
            current_location: LocationId::Tent,
            pending_return_scene: None,
            saved_position: None,
        }
    }
}

impl SessionState {
    pub(crate) fn set_departure(&mut self, departure: Departure) {
        match departure {
            Departure::Replace { target, intent } => {
                self.transition_intent = intent;
                self.pending_return_scene = None;
                if let Some(stale) = self.saved_position.take() {
                    debug!(
                        scene = %stale.scene,
                        position = %stale.position,
                        "saved_position_dropped"
                    );
                }
                debug!(scene = %target, intent = ?intent, "departure_replace");
            }
            Departure::Overlay { overlay, return_to } => {
                self.transition_intent = TransitionIntent::None;
                self.pending_return_scene = Some(return_to);
                debug!(overlay = %overlay, return_to = %return_to, "departure_overlay");
            }
        }
    }

    pub(crate) fn snapshot_position(&mut self, position: Vec2, scene: SceneKey) {
        self.saved_position = Some(SavedPosition { position, scene });
        debug!(scene = %scene, position = %position, "position_snapshot");
    }

    pub(crate) fn consume_intent(&mut self) -> TransitionIntent {
        std::mem::take(&mut self.transition_intent)
    }

    /// Returns the saved position only when it was taken in `scene`.
    ///
    /// The slot is cleared either way.
    pub(crate) fn consume_saved_position(&mut self, scene: SceneKey) -> Option<Vec2> {
        let saved = self.saved_position.take()?;
        if saved.scene == scene {
            return Some(saved.position);
        }
        debug!(
            owner = %saved.scene,
            requested_by = %scene,
            "stale_saved_position_discarded"
        );
        None
    }

    pub(crate) fn record_location(&mut self, location: LocationId) {
        if self.current_location != location {
            debug!(from = %self.current_location, to = %location, "location_changed");
        }
        self.current_location = location;
    }

    pub(crate) fn take_return_scene(&mut self) -> Option<SceneKey> {
        self.pending_return_scene.take()
    }

    pub(crate) fn current_location(&self) -> LocationId {
        self.current_location
    }

    pub(crate) fn pending_return_scene(&self) -> Option<SceneKey> {
        self.pending_return_scene
    }

    pub(crate) fn has_saved_position(&self) -> bool {
        self.saved_position.is_some()
    }

    pub(crate) fn transition_intent(&self) -> TransitionIntent {
        self.transition_intent
    }
}
