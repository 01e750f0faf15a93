use super::locations::LocationRegistry;
use super::session::SessionState;

/// State that outlives any one scene. Lent to the focused scene on every call.
#[derive(Debug)]
pub(crate) struct GameContext {
    pub(crate) session: SessionState,
    pub(crate) locations: LocationRegistry,
}

impl GameContext {
    pub(crate) fn new(locations: LocationRegistry) -> Self {
        Self {
            session: SessionState::default(),
            locations,
        }
    }
}
