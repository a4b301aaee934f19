//! Scene composition root.
//!
//! `Viewport` owns the renderer handle and every controller that writes to it.
//! The host feeds it props, renderer events and the current time, then reads
//! back the composed [`SceneGraph`] and drains [`ViewportEvent`]s.

use std::collections::{BTreeMap, BTreeSet};
use std::sync::Arc;

use foundation::camera::CameraState;
use foundation::time::Millis;
use layers::{ImageryReconciler, Layer, LayerLookup};
use plugins::component::{ComponentProps, PluginApi};
use plugins::fetch::ModuleFetcher;
use plugins::plugin_ref::{BUILTIN_PLUGIN_ID, ExtensionKind, PluginRef};
use plugins::resolver::{PluginResolver, ResolvedComponent};
use plugins::widget::Widget;
use runtime::event_bus::EventBus;
use runtime::listeners::ListenerId;
use scene::camera::CameraBridge;
use scene::entity::{EntityId, PickedObject};
use scene::environment::{Environment, SceneProperty};
use scene::events::ViewportEvent;
use scene::photo_overlay::{PhotoOverlay, PhotoOverlaySettings};
use scene::renderer::{
    BoundingSphere, Flight, Renderer, RendererEvent, RendererEventKind, SphereOffset,
};
use scene::selection::{SelectionController, SelectionState};
use tracing::{debug, info, warn};

use crate::config::ViewerConfig;
use crate::graph::{PrimitiveNode, SceneContents, SceneGraph};
use crate::props::ViewportProps;

pub const PHOTO_OVERLAY_EXTENSION: &str = "photooverlay";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Phase {
    Uninitialized,
    Ready,
    Unmounted,
}

pub struct Viewport<R: Renderer> {
    renderer: R,
    config: ViewerConfig,
    phase: Phase,
    props: ViewportProps,
    scene_property: Arc<SceneProperty>,
    selection: SelectionController,
    camera: CameraBridge,
    imagery: ImageryReconciler,
    resolver: PluginResolver,
    overlays: BTreeMap<String, PhotoOverlay>,
    /// Last pose a plugin flew to; the return pose for storytelling selections.
    authored_camera: Option<CameraState>,
    /// Camera prop as last received from the host.
    external_camera: Option<CameraState>,
    click_listener: Option<ListenerId>,
    bus: EventBus<ViewportEvent>,
    now: Millis,
}

impl<R: Renderer> Viewport<R> {
    pub fn new(renderer: R, config: ViewerConfig) -> Self {
        let resolver = PluginResolver::new(config.plugin_hosts.clone());
        Self {
            renderer,
            config,
            phase: Phase::Uninitialized,
            props: ViewportProps::default(),
            scene_property: Arc::new(SceneProperty::default()),
            selection: SelectionController::new(),
            camera: CameraBridge::new(),
            imagery: ImageryReconciler::default(),
            resolver,
            overlays: BTreeMap::new(),
            authored_camera: None,
            external_camera: None,
            click_listener: None,
            bus: EventBus::new(),
            now: Millis::ZERO,
        }
    }

    pub fn phase(&self) -> Phase {
        self.phase
    }

    pub fn is_ready(&self) -> bool {
        self.phase == Phase::Ready
    }

    pub fn renderer(&self) -> &R {
        &self.renderer
    }

    pub fn renderer_mut(&mut self) -> &mut R {
        &mut self.renderer
    }

    pub fn selection(&self) -> &SelectionState {
        self.selection.state()
    }

    pub fn photo_overlay(&self, layer_id: &str) -> Option<&PhotoOverlay> {
        self.overlays.get(layer_id)
    }

    /// Earliest time at which [`Viewport::advance`] has work to do.
    pub fn next_due(&self) -> Option<Millis> {
        self.overlays.values().filter_map(PhotoOverlay::next_due).min()
    }

    pub fn update(&mut self, props: ViewportProps, now: Millis) {
        if self.phase == Phase::Unmounted {
            return;
        }
        self.tick(now);
        if *self.scene_property != props.scene_property {
            self.scene_property = Arc::new(props.scene_property.clone());
        }
        self.props = props;

        match self.phase {
            Phase::Uninitialized if self.props.initial_load => self.initialize(),
            Phase::Ready => {
                if self.props.camera != self.external_camera {
                    self.external_camera = self.props.camera;
                    self.camera.sync(&mut self.renderer, self.props.camera.as_ref());
                }
            }
            _ => return,
        }

        let selected = self.props.selected_layer_id.as_deref().map(EntityId::from);
        self.selection.sync_external(selected.as_ref(), &mut self.renderer);
        self.sync_photo_overlays();
        self.drive_photo_overlays();
    }

    fn initialize(&mut self) {
        let token = self
            .config
            .ion_token
            .clone()
            .or_else(|| self.scene_property.default.ion.clone())
            .filter(|t| !t.is_empty());
        if let Some(token) = token {
            self.renderer.set_access_token(&token);
        }
        self.external_camera = self.props.camera;
        self.camera
            .mount(&mut self.renderer, self.props.camera.as_ref(), &mut self.bus);
        if self.click_listener.is_none() {
            self.click_listener = Some(self.renderer.subscribe(RendererEventKind::Click));
        }
        self.phase = Phase::Ready;
        info!("viewport ready");
    }

    /// UI-driven selection request.
    pub fn select(&mut self, id: Option<&str>, reason: Option<&str>, now: Millis) {
        if !self.is_ready() {
            return;
        }
        self.tick(now);
        self.selection.select(
            id.map(EntityId::from),
            reason.map(str::to_string),
            &mut self.renderer,
            &mut self.bus,
        );
        self.drive_photo_overlays();
    }

    pub fn handle(&mut self, event: RendererEvent, now: Millis) {
        if !self.is_ready() {
            return;
        }
        self.tick(now);
        match event {
            RendererEvent::CameraMoveEnd => {
                if self.camera.is_mounted() {
                    self.camera.on_move_end(&mut self.renderer, &mut self.bus);
                }
            }
            RendererEvent::Click(picked) => self.handle_click(picked.as_ref()),
        }
        self.drive_photo_overlays();
    }

    fn handle_click(&mut self, picked: Option<&PickedObject>) {
        // Selection settles before any plugin handler observes it.
        self.selection
            .handle_pick(picked, &mut self.renderer, &mut self.bus);

        let Some(PickedObject::Entity(entity)) = picked else {
            return;
        };
        if !entity.is_click_selectable() {
            return;
        }
        let Some(layer) = self.props.layers.layer(entity.id.as_str()) else {
            return;
        };
        self.bus.emit(ViewportEvent::LayerClicked {
            layer_id: layer.id.to_string(),
        });

        let Some(resolved) = self
            .resolver
            .resolve_ref(&PluginRef::from(layer), ExtensionKind::Primitive)
            .resolved()
            .cloned()
        else {
            return;
        };
        let props = PropsContext {
            props: &self.props,
            scene_property: &self.scene_property,
            selection: self.selection.state(),
        }
        .layer(layer, &resolved);

        let mut api = ViewportApi {
            renderer: &mut self.renderer,
            selection: &mut self.selection,
            camera: &mut self.camera,
            bus: &mut self.bus,
            layers: &self.props.layers,
            authored_camera: &mut self.authored_camera,
        };
        resolved.component.handle_click(&props, &mut api);
    }

    /// Click on a rendered widget.
    pub fn click_widget(&mut self, widget_id: &str, now: Millis) {
        if !self.is_ready() {
            return;
        }
        self.tick(now);
        let Some(widget) = self
            .props
            .widgets
            .iter()
            .find(|w| w.enabled && w.id == widget_id)
        else {
            debug!(widget_id, "click on unknown widget");
            return;
        };
        let Some(resolved) = self
            .resolver
            .resolve_ref(&PluginRef::from(widget), ExtensionKind::Widget)
            .resolved()
            .cloned()
        else {
            return;
        };
        let props = PropsContext {
            props: &self.props,
            scene_property: &self.scene_property,
            selection: self.selection.state(),
        }
        .widget(widget, &resolved);

        let mut api = ViewportApi {
            renderer: &mut self.renderer,
            selection: &mut self.selection,
            camera: &mut self.camera,
            bus: &mut self.bus,
            layers: &self.props.layers,
            authored_camera: &mut self.authored_camera,
        };
        resolved.component.handle_click(&props, &mut api);
        self.drive_photo_overlays();
    }

    /// Fires photo-overlay steps and field-of-view tweens due by `now`.
    pub fn advance(&mut self, now: Millis) {
        if !self.is_ready() {
            return;
        }
        self.tick(now);
        for overlay in self.overlays.values_mut() {
            overlay.advance(self.now, &mut self.camera, &mut self.renderer);
        }
    }

    pub fn render(&mut self) -> SceneGraph {
        if !self.is_ready() {
            return SceneGraph::Loading;
        }
        let environment = Environment::from_property(&self.scene_property);
        let imagery = self.imagery.reconcile(&self.props.tiles);
        let ctx = PropsContext {
            props: &self.props,
            scene_property: &self.scene_property,
            selection: self.selection.state(),
        };

        let mut widgets = Vec::new();
        for widget in self.props.widgets.iter().filter(|w| w.enabled) {
            let resolution = self
                .resolver
                .resolve_ref(&PluginRef::from(widget), ExtensionKind::Widget);
            let Some(resolved) = resolution.resolved() else {
                continue;
            };
            if let Some(node) = resolved.component.render(&ctx.widget(widget, resolved)) {
                widgets.push(node);
            }
        }

        let mut primitives = Vec::new();
        for layer in &self.props.layers {
            let resolution = self
                .resolver
                .resolve_ref(&PluginRef::from(layer), ExtensionKind::Primitive);
            let Some(resolved) = resolution.resolved() else {
                continue;
            };
            if let Some(node) = resolved.component.render(&ctx.layer(layer, resolved)) {
                let photo = self
                    .overlays
                    .get(layer.id.as_str())
                    .and_then(PhotoOverlay::view);
                primitives.push(PrimitiveNode { node, photo });
            }
        }

        SceneGraph::Scene(SceneContents {
            environment,
            imagery,
            widgets,
            primitives,
        })
    }

    pub fn has_pending_modules(&self) -> bool {
        self.resolver.has_pending()
    }

    /// Loads every plugin module queued by [`Viewport::render`].
    pub async fn fetch_pending<F: ModuleFetcher>(&mut self, fetcher: &F) -> usize {
        self.resolver.fetch_pending(fetcher).await
    }

    pub fn drain_events(&mut self) -> Vec<ViewportEvent> {
        self.bus.drain()
    }

    /// Releases every renderer listener and pending transition. Later calls
    /// into the viewport are ignored.
    pub fn unmount(&mut self) {
        if self.phase == Phase::Unmounted {
            return;
        }
        self.camera.unmount(&mut self.renderer);
        if let Some(id) = self.click_listener.take() {
            self.renderer.unsubscribe(id);
        }
        for overlay in self.overlays.values_mut() {
            overlay.cancel();
        }
        self.phase = Phase::Unmounted;
        info!("viewport unmounted");
    }

    fn tick(&mut self, now: Millis) {
        self.now = self.now.max(now);
    }

    fn sync_photo_overlays(&mut self) {
        let mut live = BTreeSet::new();
        for layer in self.props.layers.iter().filter(|l| is_photo_overlay(l)) {
            let settings = photo_overlay_settings(layer);
            let id = layer.id.to_string();
            match self.overlays.get_mut(&id) {
                Some(overlay) if overlay.settings() != &settings => {
                    overlay.set_settings(settings)
                }
                Some(_) => {}
                None => {
                    self.overlays
                        .insert(id.clone(), PhotoOverlay::new(settings));
                }
            }
            live.insert(id);
        }
        self.overlays.retain(|id, overlay| {
            let keep = live.contains(id);
            if !keep {
                overlay.cancel();
            }
            keep
        });
    }

    fn drive_photo_overlays(&mut self) {
        let state = self.selection.state().clone();
        for (id, overlay) in self.overlays.iter_mut() {
            let selected = state
                .entity_id
                .as_ref()
                .is_some_and(|e| e.as_str() == id);
            overlay.set_selected(
                selected,
                state.reason.as_deref(),
                self.authored_camera.as_ref(),
                self.now,
                &mut self.camera,
                &mut self.renderer,
            );
        }
    }
}

fn is_photo_overlay(layer: &Layer) -> bool {
    layer.plugin_id.as_deref() == Some(BUILTIN_PLUGIN_ID)
        && layer.extension_id.as_deref() == Some(PHOTO_OVERLAY_EXTENSION)
}

fn photo_overlay_settings(layer: &Layer) -> PhotoOverlaySettings {
    let Some(default) = layer.property.get("default") else {
        return PhotoOverlaySettings::default();
    };
    serde_json::from_value(default.clone()).unwrap_or_else(|e| {
        warn!(layer = %layer.id, "invalid photo overlay property: {e}");
        PhotoOverlaySettings::default()
    })
}

struct PropsContext<'a> {
    props: &'a ViewportProps,
    scene_property: &'a Arc<SceneProperty>,
    selection: &'a SelectionState,
}

impl PropsContext<'_> {
    fn base(
        &self,
        id: &str,
        plugin: &PluginRef,
        resolved: &ResolvedComponent,
    ) -> ComponentProps {
        let mut props = ComponentProps::new(
            id,
            plugin.plugin_id.as_deref().unwrap_or_default(),
            plugin.extension_id.as_deref().unwrap_or_default(),
        );
        props.is_editable = self.props.is_editable;
        props.is_built = self.props.is_building;
        props.property = plugin.property.clone();
        props.plugin_property = plugin.plugin_property.clone();
        props.scene_property = Arc::clone(self.scene_property);
        props.selection = self.selection.clone();
        props.plugin_base_url = resolved.base_url.clone();
        props
    }

    fn layer(&self, layer: &Layer, resolved: &ResolvedComponent) -> ComponentProps {
        let mut props = self.base(layer.id.as_str(), &PluginRef::from(layer), resolved);
        props.is_visible = layer.is_visible;
        props.is_selected = self
            .selection
            .entity_id
            .as_ref()
            .is_some_and(|e| e.as_str() == layer.id.as_str());
        props.is_editing = props.is_editable && props.is_selected;
        props
    }

    fn widget(&self, widget: &Widget, resolved: &ResolvedComponent) -> ComponentProps {
        self.base(&widget.id, &PluginRef::from(widget), resolved)
    }
}

/// Capabilities handed to plugin click handlers. Writes go through the
/// selection controller and camera bridge.
struct ViewportApi<'a, R: Renderer> {
    renderer: &'a mut R,
    selection: &'a mut SelectionController,
    camera: &'a mut CameraBridge,
    bus: &'a mut EventBus<ViewportEvent>,
    layers: &'a [Layer],
    authored_camera: &'a mut Option<CameraState>,
}

impl<R: Renderer> PluginApi for ViewportApi<'_, R> {
    fn selection(&self) -> SelectionState {
        self.selection.state().clone()
    }

    fn select(&mut self, id: Option<&str>, reason: Option<&str>) {
        self.selection.select(
            id.map(EntityId::from),
            reason.map(str::to_string),
            &mut *self.renderer,
            &mut *self.bus,
        );
    }

    fn layer(&self, id: &str) -> Option<Layer> {
        self.layers.layer(id).cloned()
    }

    fn camera(&self) -> Option<CameraState> {
        self.camera.read(&*self.renderer)
    }

    fn fly_to(&mut self, destination: &CameraState, duration_ms: u64) {
        *self.authored_camera = Some(*destination);
        self.camera
            .fly_to(&mut *self.renderer, &Flight::new(*destination, duration_ms));
    }

    fn fly_to_sphere(
        &mut self,
        sphere: &BoundingSphere,
        offset: &SphereOffset,
        duration_ms: u64,
    ) {
        self.camera
            .fly_to_bounding_sphere(&mut *self.renderer, sphere, offset, duration_ms);
        *self.authored_camera = self.camera.read(&*self.renderer);
    }
}

#[cfg(test)]
mod tests {
    use super::{Phase, Viewport};
    use crate::config::ViewerConfig;
    use crate::graph::SceneGraph;
    use crate::props::ViewportProps;
    use foundation::camera::CameraState;
    use foundation::time::Millis;
    use layers::{Layer, TileLayerSpec};
    use plugins::fetch::StaticModuleFetcher;
    use plugins::widget::Widget;
    use pretty_assertions::assert_eq;
    use scene::entity::{EntityId, EntityInfo, PickedObject};
    use scene::events::ViewportEvent;
    use scene::headless::{HeadlessRenderer, RendererCommand};
    use scene::photo_overlay::Stage;
    use scene::properties::PropertyBag;
    use scene::renderer::{Renderer, RendererEvent};
    use serde_json::json;

    fn home() -> CameraState {
        CameraState::new(0.1, 0.1, 10_000.0)
    }

    fn photo_camera() -> CameraState {
        CameraState::new(0.2, 0.3, 150.0)
            .with_orientation(1.0, -0.2, 0.0)
            .with_fov(0.4)
    }

    fn strip_fov(c: CameraState) -> CameraState {
        CameraState { fov: None, ..c }
    }

    fn marker(id: &str) -> Layer {
        Layer::new(id, "reearth", "marker")
            .with_property(json!({"default": {"location": {"lat": 1.0, "lng": 2.0}}}))
    }

    fn photo_layer(id: &str) -> Layer {
        Layer::new(id, "reearth", "photooverlay").with_property(json!({
            "default": {
                "location": {"lat": 1.0, "lng": 2.0},
                "image": "https://example.com/photo.jpg",
                "camera": photo_camera(),
            }
        }))
    }

    fn ready_props(layers: Vec<Layer>) -> ViewportProps {
        ViewportProps {
            initial_load: true,
            layers,
            ..ViewportProps::default()
        }
    }

    fn viewport() -> Viewport<HeadlessRenderer> {
        let mut renderer = HeadlessRenderer::new().with_pose(home());
        for id in ["a", "b", "photo"] {
            renderer.insert_entity(EntityInfo::new(id));
        }
        renderer.insert_entity(
            EntityInfo::new("ghost").with_properties(PropertyBag::unselectable()),
        );
        Viewport::new(renderer, ViewerConfig::default())
    }

    fn click(vp: &mut Viewport<HeadlessRenderer>, id: Option<&str>, at: u64) {
        let picked = id.map(|id| {
            vp.renderer()
                .entity(id)
                .map_or(PickedObject::Other, PickedObject::Entity)
        });
        vp.handle(RendererEvent::Click(picked), Millis(at));
    }

    #[test]
    fn without_initial_load_only_the_placeholder_renders() {
        let mut vp = viewport();
        vp.update(
            ViewportProps {
                initial_load: false,
                camera: Some(home()),
                selected_layer_id: Some("a".into()),
                layers: vec![marker("a")],
                tiles: vec![TileLayerSpec::new("t", "default")],
                ..ViewportProps::default()
            },
            Millis(0),
        );
        assert_eq!(vp.phase(), Phase::Uninitialized);
        assert_eq!(vp.render(), SceneGraph::Loading);
        assert_eq!(vp.renderer().listener_count(), 0);
        assert!(vp.renderer().commands().is_empty());

        vp.handle(RendererEvent::CameraMoveEnd, Millis(10));
        assert!(vp.drain_events().is_empty());
    }

    #[test]
    fn initializes_once_and_applies_token() {
        let mut vp = viewport();
        let mut props = ready_props(vec![]);
        props.scene_property.default.ion = Some("scene-token".into());

        vp.update(props.clone(), Millis(0));
        vp.update(props, Millis(1));

        assert!(vp.is_ready());
        let tokens: Vec<_> = vp
            .renderer()
            .commands()
            .iter()
            .filter(|c| matches!(c, RendererCommand::SetAccessToken { .. }))
            .collect();
        assert_eq!(
            tokens,
            vec![&RendererCommand::SetAccessToken {
                token: "scene-token".into()
            }]
        );
        assert_eq!(vp.renderer().listener_count(), 2);

        // No external camera: the renderer's pose is adopted once.
        let events = vp.drain_events();
        assert_eq!(events.len(), 1);
        assert!(matches!(events[0], ViewportEvent::CameraChanged(_)));
    }

    #[test]
    fn configured_token_wins_over_scene_token() {
        let config = ViewerConfig {
            ion_token: Some("env-token".into()),
            ..ViewerConfig::default()
        };
        let mut vp = Viewport::new(HeadlessRenderer::new(), config);
        let mut props = ready_props(vec![]);
        props.scene_property.default.ion = Some("scene-token".into());
        vp.update(props, Millis(0));
        assert_eq!(
            vp.renderer().commands()[0],
            RendererCommand::SetAccessToken {
                token: "env-token".into()
            }
        );
    }

    #[test]
    fn composes_imagery_enabled_widgets_and_primitives() {
        let mut vp = viewport();
        let mut props =
            ready_props(vec![marker("a"), marker("b"), Layer::new("c", "abc", "x")]);
        props.selected_layer_id = Some("b".into());
        props.tiles = vec![
            TileLayerSpec::new("t1", "default"),
            TileLayerSpec::new("t2", "nope"),
        ];
        let mut hidden = Widget::new("w2", "reearth", "splashscreen");
        hidden.enabled = false;
        props.widgets = vec![Widget::new("w1", "reearth", "menu"), hidden];
        vp.update(props, Millis(0));

        let graph = vp.render();
        let contents = graph.contents().expect("ready");
        assert_eq!(contents.imagery.providers.len(), 1);
        assert_eq!(
            contents.widgets.iter().map(|w| w.key.as_str()).collect::<Vec<_>>(),
            vec!["w1"]
        );
        let primitives: Vec<_> = contents
            .primitives
            .iter()
            .map(|p| (p.node.key.as_str(), p.node.selected))
            .collect();
        assert_eq!(primitives, vec![("a", false), ("b", true)]);
        assert!(contents.environment.sky_atmosphere);
    }

    #[test]
    fn imagery_is_reused_across_renders() {
        let mut vp = viewport();
        let mut props = ready_props(vec![]);
        props.tiles = vec![TileLayerSpec::new("t1", "default")];
        vp.update(props.clone(), Millis(0));
        let first = vp.render();
        vp.update(props, Millis(1));
        let second = vp.render();
        let (Some(a), Some(b)) = (first.contents(), second.contents()) else {
            panic!("viewport not ready");
        };
        assert!(std::sync::Arc::ptr_eq(&a.imagery, &b.imagery));
    }

    #[test]
    fn clicks_select_layers_and_clear_on_empty_space() {
        let mut vp = viewport();
        vp.update(ready_props(vec![marker("a")]), Millis(0));
        vp.drain_events();

        click(&mut vp, Some("a"), 10);
        assert_eq!(vp.selection().entity_id, Some(EntityId::from("a")));
        assert_eq!(
            vp.drain_events(),
            vec![
                ViewportEvent::Selected(Some(EntityId::from("a"))),
                ViewportEvent::LayerClicked {
                    layer_id: "a".into()
                },
            ]
        );
        assert_eq!(vp.renderer().selected_entity(), Some(EntityId::from("a")));

        click(&mut vp, None, 20);
        assert_eq!(vp.selection().entity_id, None);
        assert_eq!(vp.drain_events(), vec![ViewportEvent::Selected(None)]);
        assert_eq!(vp.renderer().selected_entity(), None);
    }

    #[test]
    fn unselectable_entity_click_keeps_selection() {
        let mut vp = viewport();
        vp.update(ready_props(vec![marker("a"), marker("ghost")]), Millis(0));
        click(&mut vp, Some("a"), 10);
        vp.drain_events();

        click(&mut vp, Some("ghost"), 20);
        assert_eq!(vp.selection().entity_id, Some(EntityId::from("a")));
        assert!(vp.drain_events().is_empty());
    }

    #[test]
    fn external_selection_resets_reason() {
        let mut vp = viewport();
        vp.update(ready_props(vec![marker("a"), marker("b")]), Millis(0));
        vp.select(Some("a"), Some("storytelling"), Millis(5));
        assert_eq!(vp.selection().reason.as_deref(), Some("storytelling"));

        let mut props = ready_props(vec![marker("a"), marker("b")]);
        props.selected_layer_id = Some("b".into());
        vp.update(props, Millis(10));
        assert_eq!(vp.selection().entity_id, Some(EntityId::from("b")));
        assert_eq!(vp.selection().reason, None);
    }

    #[test]
    fn remote_primitives_render_after_their_module_loads() {
        let mut vp = viewport();
        vp.update(
            ready_props(vec![
                Layer::new("r", "acme#1.0.0", "pin"),
                Layer::new("broken", "gone#2.0.0", "pin"),
                marker("a"),
            ]),
            Millis(0),
        );

        let graph = vp.render();
        let keys: Vec<_> = graph
            .contents()
            .expect("ready")
            .primitives
            .iter()
            .map(|p| p.node.key.clone())
            .collect();
        assert_eq!(keys, vec!["a".to_string()]);
        assert!(vp.has_pending_modules());

        let fetcher = StaticModuleFetcher::new().with_module(
            "/plugins/primitives/acme/1.0.0/index.js",
            r#"{"primitives":{"pin":{"element":"pin"}}}"#,
        );
        assert_eq!(pollster::block_on(vp.fetch_pending(&fetcher)), 2);

        let graph = vp.render();
        let primitives = &graph.contents().expect("ready").primitives;
        assert_eq!(primitives.len(), 2);
        assert_eq!(primitives[0].node.key, "r");
        assert_eq!(
            primitives[0].node.base_url.as_deref(),
            Some("/plugins/primitives/acme/1.0.0")
        );
        assert_eq!(pollster::block_on(vp.fetch_pending(&fetcher)), 0);
    }

    #[test]
    fn selecting_a_photo_overlay_runs_the_full_sequence() {
        let mut vp = viewport();
        vp.update(ready_props(vec![photo_layer("photo")]), Millis(0));
        vp.renderer_mut().take_commands();

        click(&mut vp, Some("photo"), 100);
        assert_eq!(vp.photo_overlay("photo").map(|o| o.stage()), Some(Stage::Flying));
        assert_eq!(vp.renderer().flights(), vec![strip_fov(photo_camera())]);

        vp.advance(Millis(3100));
        vp.advance(Millis(3600));
        assert_eq!(vp.photo_overlay("photo").map(|o| o.stage()), Some(Stage::Photo));
        let graph = vp.render();
        let photo = graph.contents().expect("ready").primitives[0]
            .photo
            .clone()
            .expect("photo mounted");
        assert_eq!(photo.opacity, 1.0);

        click(&mut vp, None, 4000);
        vp.advance(Millis(10_000));
        assert_eq!(vp.photo_overlay("photo").map(|o| o.stage()), Some(Stage::Normal));
        assert_eq!(vp.renderer().flights().last(), Some(&strip_fov(home())));
        assert!(vp.render().contents().expect("ready").primitives[0].photo.is_none());
    }

    #[test]
    fn storytelling_returns_to_the_story_pose() {
        let story_pose = CameraState::new(0.5, 0.5, 3000.0);
        let mut vp = viewport();
        let mut props = ready_props(vec![photo_layer("photo")]);
        props.widgets = vec![Widget::new("story", "reearth", "storytelling").with_property(
            json!({"stories": [{"layer": "photo", "camera": story_pose}]}),
        )];
        vp.update(props, Millis(0));

        vp.click_widget("story", Millis(100));
        assert_eq!(vp.selection().reason.as_deref(), Some("storytelling"));
        assert_eq!(
            vp.photo_overlay("photo").and_then(|o| o.prev_camera()).copied(),
            Some(story_pose)
        );

        vp.advance(Millis(4000));
        vp.select(None, None, Millis(5000));
        vp.advance(Millis(10_000));
        assert_eq!(vp.renderer().flights().last(), Some(&strip_fov(story_pose)));
    }

    #[test]
    fn story_pages_can_frame_a_bounding_sphere() {
        let mut vp = viewport();
        let mut props = ready_props(vec![marker("a")]);
        props.widgets = vec![Widget::new("story", "reearth", "storytelling").with_property(
            json!({"stories": [{
                "layer": "a",
                "sphere": {"lng": 0.3, "lat": 0.4, "height": 10.0, "radius": 200.0}
            }]}),
        )];
        vp.update(props, Millis(0));
        vp.renderer_mut().take_commands();

        vp.click_widget("story", Millis(10));
        assert_eq!(
            vp.renderer().commands()[0],
            RendererCommand::FlyToBoundingSphere {
                lng: 0.3,
                lat: 0.4,
                radius: 200.0,
                duration_ms: 3000,
            }
        );
        assert_eq!(vp.selection().entity_id, Some(EntityId::from("a")));
        assert_eq!(
            vp.drain_events().last(),
            Some(&ViewportEvent::Selected(Some(EntityId::from("a"))))
        );
    }

    #[test]
    fn sphere_page_hands_its_framing_to_the_photo_overlay() {
        let page_pose = CameraState::new(0.5, 0.5, 3000.0);
        let mut vp = viewport();
        let mut props = ready_props(vec![marker("a"), photo_layer("photo")]);
        props.widgets = vec![Widget::new("story", "reearth", "storytelling").with_property(
            json!({"stories": [
                {"layer": "a", "camera": page_pose},
                {"layer": "photo",
                 "sphere": {"lng": 0.3, "lat": 0.4, "height": 10.0, "radius": 200.0}}
            ]}),
        )];
        vp.update(props, Millis(0));

        vp.click_widget("story", Millis(10));
        vp.click_widget("story", Millis(4000));
        assert_eq!(vp.selection().entity_id, Some(EntityId::from("photo")));

        let prev = vp
            .photo_overlay("photo")
            .and_then(|o| o.prev_camera())
            .copied()
            .map(strip_fov);
        assert_eq!(prev, Some(CameraState::new(0.3, 0.4, 610.0)));
    }

    #[test]
    fn unrelated_updates_keep_the_user_camera() {
        let mut vp = viewport();
        let mut props = ready_props(vec![marker("a")]);
        props.camera = Some(home());
        vp.update(props.clone(), Millis(0));
        assert_eq!(vp.renderer().set_view_count(), 1);

        let dragged = CameraState::new(1.0, 1.0, 500.0);
        vp.renderer_mut().user_move(dragged);
        vp.handle(RendererEvent::CameraMoveEnd, Millis(10));

        props.selected_layer_id = Some("a".into());
        vp.update(props.clone(), Millis(20));
        assert_eq!(vp.renderer().set_view_count(), 1);
        assert_eq!(vp.renderer().camera_pose(), Some(dragged));

        // A new camera from the host still moves the view.
        props.camera = Some(CameraState::new(2.0, 2.0, 800.0));
        vp.update(props, Millis(30));
        assert_eq!(vp.renderer().set_view_count(), 2);
    }

    #[test]
    fn unmount_releases_listeners_and_timers() {
        let mut vp = viewport();
        vp.update(ready_props(vec![photo_layer("photo")]), Millis(0));
        click(&mut vp, Some("photo"), 10);
        assert!(vp.next_due().is_some());
        assert_eq!(vp.renderer().listener_count(), 2);

        vp.unmount();
        assert_eq!(vp.phase(), Phase::Unmounted);
        assert_eq!(vp.renderer().listener_count(), 0);
        assert_eq!(vp.next_due(), None);

        let before = vp.renderer().commands().len();
        vp.advance(Millis(10_000));
        click(&mut vp, None, 10_001);
        assert_eq!(vp.renderer().commands().len(), before);
    }
}
