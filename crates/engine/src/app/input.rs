#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum InputAction {
    MoveUp,
    MoveDown,
    MoveLeft,
    MoveRight,
}

const ACTION_COUNT: usize = 4;

#[derive(Debug, Clone, Copy, Default)]
pub(crate) struct ActionStates {
    down: [bool; ACTION_COUNT],
}

impl ActionStates {
    pub(crate) fn set(&mut self, action: InputAction, is_down: bool) {
        self.down[action.index()] = is_down;
    }

    pub(crate) fn is_down(&self, action: InputAction) -> bool {
        self.down[action.index()]
    }
}

impl InputAction {
    const fn index(self) -> usize {
        match self {
            InputAction::MoveUp => 0,
            InputAction::MoveDown => 1,
            InputAction::MoveLeft => 2,
            InputAction::MoveRight => 3,
        }
    }
}

/// Turns level key/button state into one-tick press and release edges.
///
/// A held key reports a single press edge; another edge needs a release first.
#[derive(Debug, Clone, Copy, Default)]
pub(crate) struct EdgeLatch {
    is_down: bool,
    pressed_edge: bool,
    released_edge: bool,
}

impl EdgeLatch {
    pub(crate) fn handle(&mut self, is_pressed: bool) {
        if is_pressed {
            if !self.is_down {
                self.pressed_edge = true;
            }
            self.is_down = true;
        } else {
            if self.is_down {
                self.released_edge = true;
            }
            self.is_down = false;
        }
    }

    pub(crate) fn is_down(&self) -> bool {
        self.is_down
    }

    pub(crate) fn take_pressed(&mut self) -> bool {
        std::mem::take(&mut self.pressed_edge)
    }

    pub(crate) fn take_released(&mut self) -> bool {
        std::mem::take(&mut self.released_edge)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn held_key_reports_one_press_edge() {
        let mut latch = EdgeLatch::default();
        latch.handle(true);
        assert!(latch.take_pressed());

        latch.handle(true);
        assert!(!latch.take_pressed());
        assert!(latch.is_down());
    }

    #[test]
    fn release_then_press_rearms_edge() {
        let mut latch = EdgeLatch::default();
        latch.handle(true);
        latch.take_pressed();
        latch.handle(false);
        assert!(latch.take_released());
        assert!(!latch.take_released());

        latch.handle(true);
        assert!(latch.take_pressed());
    }

    #[test]
    fn release_without_press_is_ignored() {
        let mut latch = EdgeLatch::default();
        latch.handle(false);
        assert!(!latch.take_released());
        assert!(!latch.is_down());
    }

    #[test]
    fn action_states_track_each_action_independently() {
        let mut states = ActionStates::default();
        states.set(InputAction::MoveLeft, true);
        assert!(states.is_down(InputAction::MoveLeft));
        assert!(!states.is_down(InputAction::MoveRight));

        states.set(InputAction::MoveLeft, false);
        assert!(!states.is_down(InputAction::MoveLeft));
    }
}
