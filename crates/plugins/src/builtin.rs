//! Components compiled into the viewer, addressed by [`BUILTIN_PLUGIN_ID`].
//!
//! [`BUILTIN_PLUGIN_ID`]: crate::plugin_ref::BUILTIN_PLUGIN_ID

use std::collections::BTreeMap;
use std::sync::Arc;

use foundation::camera::CameraState;
use scene::photo_overlay::STORYTELLING_REASON;
use scene::renderer::{BoundingSphere, SphereOffset};
use serde::Deserialize;
use serde_json::Value;
use tracing::warn;

use crate::component::{Component, ComponentProps, PluginApi, SceneNode};
use crate::plugin_ref::ExtensionKind;

pub const DEFAULT_STORY_FLIGHT_MS: u64 = 3000;

/// Built-in primitive rendering `property.default` as-is once its required
/// field is present.
#[derive(Debug)]
pub struct BuiltinPrimitive {
    element: &'static str,
    required: &'static str,
}

impl BuiltinPrimitive {
    pub const fn new(element: &'static str, required: &'static str) -> Self {
        Self { element, required }
    }
}

impl Component for BuiltinPrimitive {
    fn render(&self, props: &ComponentProps) -> Option<SceneNode> {
        if !props.is_visible {
            return None;
        }
        props.default_field(self.required).filter(|v| !v.is_null())?;
        let attributes = props.property.get("default").cloned().unwrap_or(Value::Null);
        let mut node = SceneNode::new(props.id.clone(), self.element, attributes);
        node.selected = props.is_selected;
        Some(node)
    }
}

/// Built-in widget; widgets never take part in selection.
#[derive(Debug)]
pub struct BuiltinWidget {
    element: &'static str,
}

impl BuiltinWidget {
    pub const fn new(element: &'static str) -> Self {
        Self { element }
    }
}

impl Component for BuiltinWidget {
    fn render(&self, props: &ComponentProps) -> Option<SceneNode> {
        Some(SceneNode::new(
            props.id.clone(),
            self.element,
            props.property.clone(),
        ))
    }

    fn handle_click(&self, _props: &ComponentProps, _api: &mut dyn PluginApi) {}
}

#[derive(Debug, Deserialize)]
struct StoryPage {
    layer: Option<String>,
    camera: Option<CameraState>,
    /// Framed instead of `camera` when no camera is authored.
    sphere: Option<BoundingSphere>,
    #[serde(default)]
    offset: SphereOffset,
}

/// Steps through authored story pages: each click flies to the next page's
/// camera (or frames its bounding sphere) and selects its layer with the
/// storytelling reason.
#[derive(Debug)]
pub struct StorytellingWidget;

impl Component for StorytellingWidget {
    fn render(&self, props: &ComponentProps) -> Option<SceneNode> {
        Some(SceneNode::new(
            props.id.clone(),
            "storytelling",
            props.property.clone(),
        ))
    }

    fn handle_click(&self, props: &ComponentProps, api: &mut dyn PluginApi) {
        let Some(raw) = props.property.get("stories") else {
            return;
        };
        let pages: Vec<StoryPage> = match serde_json::from_value(raw.clone()) {
            Ok(pages) => pages,
            Err(e) => {
                warn!(widget = %props.id, "invalid story pages: {e}");
                return;
            }
        };
        if pages.is_empty() {
            return;
        }

        let current = api.selection().entity_id;
        let position = pages.iter().position(|p| {
            p.layer.is_some() && p.layer.as_deref() == current.as_ref().map(|id| id.as_str())
        });
        let page = &pages[position.map_or(0, |i| (i + 1) % pages.len())];

        let duration_ms = props
            .default_field("duration")
            .and_then(Value::as_u64)
            .unwrap_or(DEFAULT_STORY_FLIGHT_MS);
        match (&page.camera, &page.sphere) {
            (Some(camera), _) => api.fly_to(camera, duration_ms),
            (None, Some(sphere)) => api.fly_to_sphere(sphere, &page.offset, duration_ms),
            (None, None) => {}
        }
        api.select(page.layer.as_deref(), Some(STORYTELLING_REASON));
    }
}

const PRIMITIVES: &[(&str, &str)] = &[
    ("marker", "location"),
    ("polyline", "coordinates"),
    ("polygon", "polygon"),
    ("rect", "rect"),
    ("ellipsoid", "position"),
    ("photooverlay", "location"),
    ("model", "model"),
    ("resource", "url"),
];

/// Static registry of built-in components.
#[derive(Debug, Default, Clone)]
pub struct BuiltinRegistry {
    primitives: BTreeMap<String, Arc<dyn Component>>,
    widgets: BTreeMap<String, Arc<dyn Component>>,
}

impl BuiltinRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Registry with every built-in extension.
    pub fn standard() -> Self {
        let mut registry = Self::new();
        for (name, required) in PRIMITIVES {
            registry.register(
                ExtensionKind::Primitive,
                name,
                Arc::new(BuiltinPrimitive::new(name, required)),
            );
        }
        registry.register(ExtensionKind::Widget, "menu", Arc::new(BuiltinWidget::new("menu")));
        registry.register(
            ExtensionKind::Widget,
            "splashscreen",
            Arc::new(BuiltinWidget::new("splashscreen")),
        );
        registry.register(ExtensionKind::Widget, "storytelling", Arc::new(StorytellingWidget));
        registry
    }

    pub fn register(&mut self, kind: ExtensionKind, name: &str, component: Arc<dyn Component>) {
        let map = match kind {
            ExtensionKind::Primitive => &mut self.primitives,
            ExtensionKind::Widget => &mut self.widgets,
        };
        map.insert(name.to_string(), component);
    }

    pub fn get(&self, kind: ExtensionKind, extension_id: &str) -> Option<Arc<dyn Component>> {
        let map = match kind {
            ExtensionKind::Primitive => &self.primitives,
            ExtensionKind::Widget => &self.widgets,
        };
        map.get(extension_id).cloned()
    }
}
