//! Scripted replay of host interactions against the headless renderer.

use std::collections::BTreeMap;
use std::path::Path;

use foundation::camera::{CameraState, Frustum};
use foundation::time::Millis;
use plugins::fetch::{ModuleFetcher, StaticModuleFetcher};
use scene::entity::{EntityInfo, PickedObject};
use scene::events::ViewportEvent;
use scene::headless::{HeadlessRenderer, RendererCommand};
use scene::renderer::{Renderer, RendererEvent};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use tracing::debug;

use crate::config::ViewerConfig;
use crate::graph::SceneGraph;
use crate::props::ViewportProps;
use crate::viewport::Viewport;

/// Upper bound on timer firings while draining after the last step.
const MAX_SETTLE_STEPS: usize = 1024;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ScenarioError {
    Io(String),
    Parse(String),
}

impl std::fmt::Display for ScenarioError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ScenarioError::Io(msg) => write!(f, "scenario unreadable: {msg}"),
            ScenarioError::Parse(msg) => write!(f, "scenario invalid: {msg}"),
        }
    }
}

impl std::error::Error for ScenarioError {}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct RendererSetup {
    pub pose: Option<CameraState>,
    pub orthographic: bool,
    pub entities: Vec<EntityInfo>,
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(tag = "action", rename_all = "snake_case")]
pub enum Action {
    Update { props: Box<ViewportProps> },
    Click { entity: Option<String> },
    ClickWidget { widget: String },
    /// User drag ending in a move-end event.
    MoveCamera { pose: CameraState },
    Select {
        id: Option<String>,
        reason: Option<String>,
    },
    Advance,
    Unmount,
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct Step {
    pub at: u64,
    #[serde(flatten)]
    pub action: Action,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct Scenario {
    pub renderer: RendererSetup,
    /// Plugin modules served from the scenario instead of the network, keyed
    /// by module URL.
    pub modules: BTreeMap<String, Value>,
    pub steps: Vec<Step>,
}

impl Scenario {
    pub fn from_json(json: &str) -> Result<Self, ScenarioError> {
        serde_json::from_str(json).map_err(|e| ScenarioError::Parse(e.to_string()))
    }

    pub fn load(path: &Path) -> Result<Self, ScenarioError> {
        let json = std::fs::read_to_string(path)
            .map_err(|e| ScenarioError::Io(format!("{}: {e}", path.display())))?;
        Self::from_json(&json)
    }

    pub fn module_fetcher(&self) -> StaticModuleFetcher {
        let mut fetcher = StaticModuleFetcher::new();
        for (url, module) in &self.modules {
            let source = match module {
                Value::String(source) => source.clone(),
                other => other.to_string(),
            };
            fetcher.insert(url.clone(), source);
        }
        fetcher
    }

    fn renderer(&self) -> HeadlessRenderer {
        let mut renderer = HeadlessRenderer::new();
        if let Some(pose) = self.renderer.pose {
            renderer = renderer.with_pose(pose);
        }
        if self.renderer.orthographic {
            renderer = renderer.with_frustum(Some(Frustum::Orthographic));
        }
        for entity in &self.renderer.entities {
            renderer.insert_entity(entity.clone());
        }
        renderer
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ReplayReport {
    pub commands: Vec<RendererCommand>,
    pub events: Vec<ViewportEvent>,
    pub scene: SceneGraph,
}

/// Runs every step in order, ticking the clock by `config.tick_ms` between
/// steps, then lets pending transitions finish.
pub async fn replay<F: ModuleFetcher>(
    scenario: &Scenario,
    config: ViewerConfig,
    fetcher: &F,
) -> ReplayReport {
    let tick = config.tick_ms.max(1);
    let mut viewport = Viewport::new(scenario.renderer(), config);
    let mut events = Vec::new();
    let mut now = 0;

    for step in &scenario.steps {
        while now < step.at {
            now = (now + tick).min(step.at);
            viewport.advance(Millis(now));
        }
        now = now.max(step.at);
        let at = Millis(now);
        debug!(at = now, action = ?step.action, "replay step");

        match &step.action {
            Action::Update { props } => viewport.update(props.as_ref().clone(), at),
            Action::Click { entity } => {
                let picked = entity.as_deref().map(|id| {
                    viewport
                        .renderer()
                        .entity(id)
                        .map_or(PickedObject::Other, PickedObject::Entity)
                });
                viewport.handle(RendererEvent::Click(picked), at);
            }
            Action::ClickWidget { widget } => viewport.click_widget(widget, at),
            Action::MoveCamera { pose } => {
                viewport.renderer_mut().user_move(*pose);
                viewport.handle(RendererEvent::CameraMoveEnd, at);
            }
            Action::Select { id, reason } => {
                viewport.select(id.as_deref(), reason.as_deref(), at)
            }
            Action::Advance => viewport.advance(at),
            Action::Unmount => viewport.unmount(),
        }

        viewport.render();
        if viewport.has_pending_modules() {
            viewport.fetch_pending(fetcher).await;
        }
        events.extend(viewport.drain_events());
    }

    for _ in 0..MAX_SETTLE_STEPS {
        let Some(due) = viewport.next_due() else {
            break;
        };
        viewport.advance(due);
    }
    events.extend(viewport.drain_events());

    let scene = viewport.render();
    ReplayReport {
        commands: viewport.renderer_mut().take_commands(),
        events,
        scene,
    }
}
