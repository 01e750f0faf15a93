use engine::{EntityId, InputSnapshot, Scene, SceneCommand, SceneWorld, Vec2};
use tracing::{debug, error, info};

use super::super::context::GameContext;
use super::super::locations::{LocationId, LocationRegistry};
use super::super::triggers::TriggerKind;

#[derive(Debug, Clone, Copy, PartialEq)]
pub(crate) enum DragState {
    Idle,
    /// `handle_offset` is the avatar position relative to the grab point.
    Dragging { handle_offset: Vec2 },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum HoverState {
    NotHovering,
    Hovering(LocationId),
}

/// The player's stand-in on the map. Moving it never touches the session.
#[derive(Debug, Clone, Copy, PartialEq)]
pub(crate) struct AvatarProxy {
    position: Vec2,
    drag: DragState,
    hover: HoverState,
}

impl AvatarProxy {
    pub(crate) fn new(position: Vec2) -> Self {
        Self {
            position,
            drag: DragState::Idle,
            hover: HoverState::NotHovering,
        }
    }

    pub(crate) fn position(&self) -> Vec2 {
        self.position
    }

    pub(crate) fn drag(&self) -> DragState {
        self.drag
    }

    pub(crate) fn hover(&self) -> HoverState {
        self.hover
    }

    pub(crate) fn is_dragging(&self) -> bool {
        matches!(self.drag, DragState::Dragging { .. })
    }

    /// Starts a drag if `cursor` is on the avatar. Returns whether it grabbed.
    pub(crate) fn begin_drag(&mut self, cursor: Vec2, grab_radius: f32) -> bool {
        let on_avatar = self.position.distance_squared(cursor) <= grab_radius * grab_radius;
        if self.is_dragging() || !on_avatar {
            return false;
        }
        self.drag = DragState::Dragging {
            handle_offset: cursor.delta_to(self.position),
        };
        true
    }

    pub(crate) fn drag_to(&mut self, cursor: Vec2) {
        if let DragState::Dragging { handle_offset } = self.drag {
            self.position = cursor.offset(handle_offset);
        }
    }

    pub(crate) fn end_drag(&mut self) -> bool {
        let was_dragging = self.is_dragging();
        self.drag = DragState::Idle;
        was_dragging
    }

    pub(crate) fn refresh_hover(&mut self, locations: &LocationRegistry) {
        self.hover = match locations.marker_at(self.position) {
            Some(location) => HoverState::Hovering(location),
            None => HoverState::NotHovering,
        };
    }

    /// The location a confirm would travel to, if confirming is allowed now.
    pub(crate) fn selection(&self) -> Option<LocationId> {
        match (self.drag, self.hover) {
            (DragState::Idle, HoverState::Hovering(location)) => Some(location),
            _ => None,
        }
    }
}

/// Placement of the map inside the window.
///
/// The window centre is the map origin. The map is shrunk, never enlarged, so
/// every marker's hit circle stays on screen.
#[derive(Debug, Clone, Copy, PartialEq)]
pub(crate) struct MapFrame {
    pub(crate) center_px: Vec2,
    pub(crate) pixels_per_unit: f32,
}

impl MapFrame {
    pub(crate) fn fit(window_size: (u32, u32), locations: &LocationRegistry) -> Self {
        let half_width = window_size.0 as f32 * 0.5;
        let half_height = window_size.1 as f32 * 0.5;
        let extent = locations.marker_extent();
        let pixels_per_unit = if window_size.0 == 0 || window_size.1 == 0 {
            1.0
        } else {
            axis_scale(half_width, extent.x)
                .min(axis_scale(half_height, extent.y))
                .min(1.0)
        };
        Self {
            center_px: Vec2::new(half_width, half_height),
            pixels_per_unit,
        }
    }

    pub(crate) fn screen_to_map(&self, cursor_px: Vec2) -> Vec2 {
        Vec2::new(
            (cursor_px.x - self.center_px.x) / self.pixels_per_unit,
            (cursor_px.y - self.center_px.y) / self.pixels_per_unit,
        )
    }
}

fn axis_scale(half_window_px: f32, extent: f32) -> f32 {
    if extent > 0.0 {
        half_window_px / extent
    } else {
        1.0
    }
}

/// Overlay shown over a paused gameplay scene for picking a travel destination.
pub(crate) struct MapOverlayScene {
    avatar: Option<AvatarProxy>,
    avatar_entity: Option<EntityId>,
}

impl MapOverlayScene {
    pub(crate) fn new() -> Self {
        Self {
            avatar: None,
            avatar_entity: None,
        }
    }
}

impl Scene<GameContext> for MapOverlayScene {
    fn load(&mut self, world: &mut SceneWorld, ctx: &mut GameContext) {
        for location in ctx.locations.locations() {
            world.spawn(location.id.name(), location.map_marker_position);
        }

        let current = ctx.session.current_location();
        let start = match ctx.locations.resolve(current) {
            Ok(location) => location.map_marker_position,
            Err(lookup_error) => {
                error!(error = %lookup_error, "map_avatar_unplaced");
                return;
            }
        };
        let mut avatar = AvatarProxy::new(start);
        avatar.refresh_hover(&ctx.locations);
        self.avatar = Some(avatar);
        self.avatar_entity = Some(world.spawn("map_avatar", start));
        info!(location = %current, marker = %start, "map_opened");
    }

    fn update(
        &mut self,
        _fixed_dt_seconds: f32,
        input: &InputSnapshot,
        world: &mut SceneWorld,
        ctx: &mut GameContext,
    ) -> SceneCommand {
        if input.cancel_pressed() || input.open_map_pressed() {
            info!("map_dismissed");
            return SceneCommand::CloseOverlay;
        }
        let Some(avatar) = self.avatar.as_mut() else {
            return SceneCommand::None;
        };

        let frame = MapFrame::fit(input.window_size(), &ctx.locations);
        let cursor = input
            .cursor_position_px()
            .map(|px| frame.screen_to_map(px));
        if let Some(cursor) = cursor {
            let grab_radius = ctx.locations.marker_hit_radius();
            if input.pointer_pressed() && avatar.begin_drag(cursor, grab_radius) {
                debug!(cursor = %cursor, "map_avatar_grabbed");
            }
            if input.pointer_down() || input.pointer_released() {
                avatar.drag_to(cursor);
            }
        }
        if input.pointer_released() && avatar.end_drag() {
            debug!(position = %avatar.position(), "map_avatar_dropped");
        }
        avatar.refresh_hover(&ctx.locations);

        if let Some(entity) = self.avatar_entity.and_then(|id| world.find_entity_mut(id)) {
            entity.position = avatar.position();
        }

        if input.interact_pressed() {
            match avatar.selection() {
                Some(location) => return TriggerKind::TravelTo { location }.fire(ctx),
                None => debug!(
                    drag = ?avatar.drag(),
                    hover = ?avatar.hover(),
                    "map_confirm_ignored"
                ),
            }
        }
        SceneCommand::None
    }

    fn unload(&mut self, world: &mut SceneWorld, _ctx: &mut GameContext) {
        self.avatar = None;
        self.avatar_entity = None;
        world.clear();
    }

    fn debug_title(&self, _world: &SceneWorld, _ctx: &GameContext) -> Option<String> {
        let hover = match self.avatar.map(|avatar| avatar.hover()) {
            Some(HoverState::Hovering(location)) => location.name(),
            _ => "-",
        };
        Some(format!("Valley - map [{hover}]"))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn registry() -> LocationRegistry {
        LocationRegistry::builtin().expect("builtin registry")
    }

    #[test]
    fn screen_centre_is_map_origin() {
        let frame = MapFrame::fit((1600, 1200), &registry());
        assert_eq!(frame.pixels_per_unit, 1.0);
        assert_eq!(
            frame.screen_to_map(Vec2::new(800.0, 600.0)),
            Vec2::new(0.0, 0.0)
        );
        assert_eq!(
            frame.screen_to_map(Vec2::new(908.0, 803.0)),
            Vec2::new(108.0, 203.0)
        );
    }

    #[test]
    fn short_window_shrinks_map_to_fit_markers() {
        let registry = registry();
        let frame = MapFrame::fit((1280, 720), &registry);
        assert_eq!(frame.pixels_per_unit, 360.0 / 595.0);

        let bottom_edge = frame.screen_to_map(Vec2::new(640.0, 720.0));
        assert_eq!(bottom_edge.x, 0.0);
        assert!((bottom_edge.y - 595.0).abs() < 0.01);
        for location in registry.locations() {
            let marker = location.map_marker_position;
            assert!(marker.x.abs() * frame.pixels_per_unit < 640.0);
            assert!(marker.y.abs() * frame.pixels_per_unit < 360.0);
        }
    }

    #[test]
    fn every_marker_is_hoverable_from_a_pixel_in_the_default_window() {
        let registry = registry();
        let window = (1280, 720);
        let frame = MapFrame::fit(window, &registry);
        let mut reachable = Vec::new();
        for y in 0..window.1 {
            for x in 0..window.0 {
                let point = frame.screen_to_map(Vec2::new(x as f32, y as f32));
                if let Some(location) = registry.marker_at(point) {
                    if !reachable.contains(&location) {
                        reachable.push(location);
                    }
                }
            }
        }

        for id in LocationId::ALL {
            assert!(reachable.contains(&id), "{id} unreachable");
        }
    }

    #[test]
    fn unknown_window_size_keeps_unit_scale() {
        let frame = MapFrame::fit((0, 0), &registry());
        assert_eq!(frame.pixels_per_unit, 1.0);
        assert_eq!(frame.screen_to_map(Vec2::new(5.0, 7.0)), Vec2::new(5.0, 7.0));
    }

    #[test]
    fn drag_keeps_grab_offset() {
        let mut avatar = AvatarProxy::new(Vec2::new(100.0, 100.0));
        assert!(avatar.begin_drag(Vec2::new(110.0, 95.0), 48.0));

        avatar.drag_to(Vec2::new(210.0, 195.0));
        assert_eq!(avatar.position(), Vec2::new(200.0, 200.0));

        assert!(avatar.end_drag());
        avatar.drag_to(Vec2::new(0.0, 0.0));
        assert_eq!(avatar.position(), Vec2::new(200.0, 200.0));
    }

    #[test]
    fn press_away_from_avatar_does_not_grab() {
        let mut avatar = AvatarProxy::new(Vec2::new(0.0, 0.0));
        assert!(!avatar.begin_drag(Vec2::new(100.0, 0.0), 48.0));
        assert_eq!(avatar.drag(), DragState::Idle);
        assert!(!avatar.end_drag());
    }

    #[test]
    fn selection_requires_idle_and_hovering() {
        let registry = registry();
        let mut avatar = AvatarProxy::new(Vec2::new(108.0, 203.0));
        avatar.refresh_hover(&registry);
        assert_eq!(avatar.selection(), Some(LocationId::Tent));

        avatar.begin_drag(Vec2::new(108.0, 203.0), registry.marker_hit_radius());
        assert_eq!(avatar.selection(), None);

        avatar.drag_to(Vec2::new(-239.0, 547.0));
        avatar.refresh_hover(&registry);
        assert_eq!(avatar.hover(), HoverState::Hovering(LocationId::MoominHouse));
        assert_eq!(avatar.selection(), None);

        avatar.end_drag();
        assert_eq!(avatar.selection(), Some(LocationId::MoominHouse));

        avatar.begin_drag(Vec2::new(-239.0, 547.0), registry.marker_hit_radius());
        avatar.drag_to(Vec2::new(600.0, 600.0));
        avatar.end_drag();
        avatar.refresh_hover(&registry);
        assert_eq!(avatar.hover(), HoverState::NotHovering);
        assert_eq!(avatar.selection(), None);
    }

    #[test]
    fn load_places_avatar_on_current_location_marker() {
        let mut ctx = GameContext::new(registry());
        ctx.session.record_location(LocationId::Bridge);
        let mut scene = MapOverlayScene::new();
        let mut world = SceneWorld::default();

        scene.load(&mut world, &mut ctx);
        world.apply_pending();

        let avatar = scene.avatar.expect("avatar");
        assert_eq!(avatar.position(), Vec2::new(290.0, 134.0));
        assert_eq!(avatar.hover(), HoverState::Hovering(LocationId::Bridge));
        assert_eq!(world.entity_count(), 4);
    }

    #[test]
    fn confirm_without_hover_keeps_map_open() {
        let mut ctx = GameContext::new(registry());
        let mut scene = MapOverlayScene::new();
        let mut world = SceneWorld::default();
        scene.load(&mut world, &mut ctx);
        world.apply_pending();

        let window = (1600, 1200);
        let grab = InputSnapshot::empty()
            .with_window_size(window)
            .with_cursor_position_px(Some(Vec2::new(908.0, 803.0)))
            .with_pointer_pressed(true);
        scene.update(0.016, &grab, &mut world, &mut ctx);
        let drop_far = InputSnapshot::empty()
            .with_window_size(window)
            .with_cursor_position_px(Some(Vec2::new(1500.0, 100.0)))
            .with_pointer_released(true);
        scene.update(0.016, &drop_far, &mut world, &mut ctx);

        let confirm = InputSnapshot::empty().with_interact_pressed(true);
        assert_eq!(
            scene.update(0.016, &confirm, &mut world, &mut ctx),
            SceneCommand::None
        );
        assert!(!ctx.session.has_saved_position());
        assert_eq!(ctx.session.current_location(), LocationId::Tent);
    }

    #[test]
    fn cancel_and_open_map_both_close() {
        let mut ctx = GameContext::new(registry());
        let mut scene = MapOverlayScene::new();
        let mut world = SceneWorld::default();
        scene.load(&mut world, &mut ctx);

        for input in [
            InputSnapshot::empty().with_cancel_pressed(true),
            InputSnapshot::empty().with_open_map_pressed(true),
        ] {
            assert_eq!(
                scene.update(0.016, &input, &mut world, &mut ctx),
                SceneCommand::CloseOverlay
            );
        }
    }
}
