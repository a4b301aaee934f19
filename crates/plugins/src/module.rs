//! Remote plugin modules.
//!
//! A module is a JSON manifest listing the components a plugin exports,
//! grouped by extension kind:
//!
//! ```json
//! { "primitives": { "pin": { "element": "pin", "required": ["location"] } } }
//! ```

use std::collections::BTreeMap;
use std::sync::Arc;

use serde::{Deserialize, Serialize};

use crate::component::{Component, ComponentProps, PluginApi, SceneNode};
use crate::plugin_ref::ExtensionKind;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ModuleError {
    Parse(String),
    Invalid(String),
}

impl std::fmt::Display for ModuleError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ModuleError::Parse(msg) => write!(f, "plugin module parse error: {msg}"),
            ModuleError::Invalid(msg) => write!(f, "invalid plugin module: {msg}"),
        }
    }
}

impl std::error::Error for ModuleError {}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ClickAction {
    /// The click handler selects the component's own layer.
    #[default]
    Select,
    /// The click handler does nothing.
    ///
    /// Only the handler's own selection is suppressed. Picking a primitive in
    /// the renderer selects its layer before any handler runs, so this is
    /// only observable for widgets.
    Ignore,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ComponentDescriptor {
    pub element: String,
    /// `property.default` fields that must be present to render.
    #[serde(default)]
    pub required: Vec<String>,
    #[serde(default)]
    pub click: ClickAction,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct RemoteModule {
    #[serde(default)]
    pub primitives: BTreeMap<String, ComponentDescriptor>,
    #[serde(default)]
    pub widgets: BTreeMap<String, ComponentDescriptor>,
}

impl RemoteModule {
    pub fn parse(source: &str) -> Result<Self, ModuleError> {
        let module: RemoteModule =
            serde_json::from_str(source).map_err(|e| ModuleError::Parse(e.to_string()))?;
        if let Some((name, _)) = module
            .primitives
            .iter()
            .chain(module.widgets.iter())
            .find(|(_, d)| d.element.is_empty())
        {
            return Err(ModuleError::Invalid(format!("export `{name}` has no element")));
        }
        Ok(module)
    }

    pub fn export(&self, kind: ExtensionKind, extension_id: &str) -> Option<&ComponentDescriptor> {
        match kind {
            ExtensionKind::Primitive => self.primitives.get(extension_id),
            ExtensionKind::Widget => self.widgets.get(extension_id),
        }
    }

    /// Component for `extension_id`, carrying the plugin's base URL.
    pub fn component(
        &self,
        kind: ExtensionKind,
        extension_id: &str,
        base_url: &str,
    ) -> Option<Arc<dyn Component>> {
        let descriptor = self.export(kind, extension_id)?.clone();
        Some(Arc::new(RemoteComponent {
            descriptor,
            base_url: base_url.to_string(),
        }))
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RemoteComponent {
    pub descriptor: ComponentDescriptor,
    pub base_url: String,
}

impl Component for RemoteComponent {
    fn render(&self, props: &ComponentProps) -> Option<SceneNode> {
        if !props.is_visible {
            return None;
        }
        for field in &self.descriptor.required {
            props.default_field(field).filter(|v| !v.is_null())?;
        }
        let mut node = SceneNode::new(
            props.id.clone(),
            self.descriptor.element.clone(),
            props.property.clone(),
        );
        node.selected = props.is_selected;
        node.base_url = Some(self.base_url.clone());
        Some(node)
    }

    fn handle_click(&self, props: &ComponentProps, api: &mut dyn PluginApi) {
        if self.descriptor.click == ClickAction::Select {
            api.select(Some(&props.id), None);
        }
    }
}
