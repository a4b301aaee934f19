use runtime::event_bus::EventBus;
use tracing::debug;

use crate::entity::{EntityId, PickedObject};
use crate::events::ViewportEvent;
use crate::renderer::Renderer;

/// What is selected, and why.
///
/// `reason` is an opaque tag (for example `"storytelling"`) handed through to
/// selection-aware components; the controller never interprets it.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SelectionState {
    pub entity_id: Option<EntityId>,
    pub reason: Option<String>,
}

impl SelectionState {
    pub fn new(entity_id: Option<EntityId>, reason: Option<String>) -> Self {
        Self { entity_id, reason }
    }

    pub fn is_selected(&self, id: &EntityId) -> bool {
        self.entity_id.as_ref() == Some(id)
    }
}

/// Single writer of [`SelectionState`] and of the renderer's selected-entity slot.
///
/// Three triggers funnel through here:
/// - the externally supplied target id (`sync_external`),
/// - explicit UI requests (`select`),
/// - renderer clicks (`handle_pick`).
///
/// The slot write is one-way (controller → renderer); the renderer only talks
/// back through `handle_pick`, which ends up in `select`.
#[derive(Debug, Default)]
pub struct SelectionController {
    state: SelectionState,
    last_external: Option<EntityId>,
}

impl SelectionController {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn state(&self) -> &SelectionState {
        &self.state
    }

    pub fn selected(&self) -> Option<&EntityId> {
        self.state.entity_id.as_ref()
    }

    pub fn reason(&self) -> Option<&str> {
        self.state.reason.as_deref()
    }

    /// Adopts the externally driven target id.
    ///
    /// A different id resets the reason; the same id as last time keeps it, so a
    /// programmatic re-selection does not clobber an in-flight reason tag.
    pub fn sync_external(&mut self, id: Option<&EntityId>, renderer: &mut dyn Renderer) {
        if self.last_external.as_ref() == id {
            return;
        }
        self.last_external = id.cloned();
        self.state = SelectionState::new(id.cloned(), None);
        debug!(selected = ?self.state.entity_id, "selection adopted from props");
        self.push_to_renderer(renderer);
    }

    /// Explicit selection request. Emits [`ViewportEvent::Selected`] with the id only.
    pub fn select(
        &mut self,
        id: Option<EntityId>,
        reason: Option<String>,
        renderer: &mut dyn Renderer,
        bus: &mut EventBus<ViewportEvent>,
    ) {
        let next = SelectionState::new(id, reason);
        if next == self.state {
            return;
        }
        self.state = next;
        debug!(
            selected = ?self.state.entity_id,
            reason = ?self.state.reason,
            "selection changed"
        );
        bus.emit(ViewportEvent::Selected(self.state.entity_id.clone()));
        self.push_to_renderer(renderer);
    }

    /// Renderer click.
    ///
    /// Clicking empty space or a non-entity clears the selection. Clicking an
    /// entity tagged non-selectable is ignored.
    pub fn handle_pick(
        &mut self,
        picked: Option<&PickedObject>,
        renderer: &mut dyn Renderer,
        bus: &mut EventBus<ViewportEvent>,
    ) {
        match picked {
            Some(PickedObject::Entity(entity)) if !entity.is_click_selectable() => {
                debug!(entity = %entity.id, "ignoring click on unselectable entity");
            }
            Some(PickedObject::Entity(entity)) => {
                self.select(Some(entity.id.clone()), None, renderer, bus);
            }
            Some(PickedObject::Other) | None => self.select(None, None, renderer, bus),
        }
    }

    fn push_to_renderer(&self, renderer: &mut dyn Renderer) {
        let target = self
            .state
            .entity_id
            .as_ref()
            .and_then(|id| renderer.entity(id.as_str()))
            .map(|entity| entity.id);
        if renderer.selected_entity() != target {
            renderer.set_selected_entity(target.as_ref());
        }
    }
}

#[cfg(test)]
mod tests {
    use super::{SelectionController, SelectionState};
    use crate::entity::{EntityId, EntityInfo, PickedObject};
    use crate::events::ViewportEvent;
    use crate::headless::HeadlessRenderer;
    use crate::properties::PropertyBag;
    use crate::renderer::Renderer;
    use pretty_assertions::assert_eq;
    use runtime::event_bus::EventBus;

    fn renderer() -> HeadlessRenderer {
        let mut r = HeadlessRenderer::new();
        r.insert_entity(EntityInfo::new("a"));
        r.insert_entity(EntityInfo::new("b"));
        r.insert_entity(EntityInfo::new("locked").with_properties(PropertyBag::unselectable()));
        r
    }

    fn id(s: &str) -> EntityId {
        EntityId::new(s)
    }

    #[test]
    fn select_notifies_with_id_only_and_pushes_slot() {
        let mut r = renderer();
        let mut bus = EventBus::new();
        let mut c = SelectionController::new();

        c.select(Some(id("a")), Some("storytelling".into()), &mut r, &mut bus);

        assert_eq!(
            c.state(),
            &SelectionState::new(Some(id("a")), Some("storytelling".into()))
        );
        assert_eq!(bus.drain(), vec![ViewportEvent::Selected(Some(id("a")))]);
        assert_eq!(r.selected_entity(), Some(id("a")));
    }

    #[test]
    fn unknown_entity_clears_renderer_slot() {
        let mut r = renderer();
        let mut bus = EventBus::new();
        let mut c = SelectionController::new();
        c.select(Some(id("a")), None, &mut r, &mut bus);
        c.select(Some(id("ghost")), None, &mut r, &mut bus);
        assert_eq!(c.selected(), Some(&id("ghost")));
        assert_eq!(r.selected_entity(), None);
    }

    #[test]
    fn external_change_resets_reason_same_id_preserves_it() {
        let mut r = renderer();
        let mut bus = EventBus::new();
        let mut c = SelectionController::new();

        c.sync_external(Some(&id("a")), &mut r);
        c.select(Some(id("a")), Some("storytelling".into()), &mut r, &mut bus);

        c.sync_external(Some(&id("a")), &mut r);
        assert_eq!(c.reason(), Some("storytelling"));

        c.sync_external(Some(&id("b")), &mut r);
        assert_eq!(c.state(), &SelectionState::new(Some(id("b")), None));
        assert_eq!(r.selected_entity(), Some(id("b")));
    }

    #[test]
    fn click_on_unselectable_entity_keeps_selection() {
        let mut r = renderer();
        let mut bus = EventBus::new();
        let mut c = SelectionController::new();
        c.select(Some(id("a")), None, &mut r, &mut bus);
        bus.drain();

        let locked = r.entity("locked").expect("entity");
        c.handle_pick(Some(&PickedObject::Entity(locked)), &mut r, &mut bus);

        assert_eq!(c.selected(), Some(&id("a")));
        assert!(bus.is_empty());
    }

    #[test]
    fn unselectable_entity_can_still_be_selected_programmatically() {
        let mut r = renderer();
        let mut bus = EventBus::new();
        let mut c = SelectionController::new();
        c.select(Some(id("locked")), None, &mut r, &mut bus);
        assert_eq!(r.selected_entity(), Some(id("locked")));
    }

    #[test]
    fn click_on_nothing_clears_and_click_on_entity_selects() {
        let mut r = renderer();
        let mut bus = EventBus::new();
        let mut c = SelectionController::new();

        let b = r.entity("b").expect("entity");
        c.handle_pick(Some(&PickedObject::Entity(b)), &mut r, &mut bus);
        assert_eq!(c.state(), &SelectionState::new(Some(id("b")), None));

        c.handle_pick(Some(&PickedObject::Other), &mut r, &mut bus);
        assert_eq!(c.selected(), None);
        assert_eq!(r.selected_entity(), None);
        assert_eq!(
            bus.drain(),
            vec![
                ViewportEvent::Selected(Some(id("b"))),
                ViewportEvent::Selected(None)
            ]
        );
    }

    #[test]
    fn repeated_identical_select_is_silent() {
        let mut r = renderer();
        let mut bus = EventBus::new();
        let mut c = SelectionController::new();
        c.select(Some(id("a")), None, &mut r, &mut bus);
        c.select(Some(id("a")), None, &mut r, &mut bus);
        assert_eq!(bus.drain().len(), 1);
    }
}
