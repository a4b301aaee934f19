use std::collections::BTreeMap;
use std::sync::Arc;

use tracing::{debug, warn};

use crate::builtin::BuiltinRegistry;
use crate::component::Component;
use crate::fetch::{FetchError, ModuleFetcher};
use crate::module::RemoteModule;
use crate::plugin_ref::{
    BUILTIN_PLUGIN_ID, ExtensionKind, PluginHosts, PluginRef, RemotePluginId, module_url,
};

#[derive(Debug, Clone)]
pub struct ResolvedComponent {
    pub component: Arc<dyn Component>,
    /// Set for remote plugins only.
    pub base_url: Option<String>,
}

#[derive(Debug, Clone)]
pub enum Resolution {
    Resolved(ResolvedComponent),
    /// Nothing renders for this reference.
    Unresolved,
    /// The plugin module is still loading.
    Pending,
}

impl Resolution {
    pub fn resolved(&self) -> Option<&ResolvedComponent> {
        match self {
            Resolution::Resolved(resolved) => Some(resolved),
            _ => None,
        }
    }

    pub fn is_pending(&self) -> bool {
        matches!(self, Resolution::Pending)
    }
}

#[derive(Debug, Clone)]
enum ModuleSlot {
    Pending,
    Loaded(Arc<RemoteModule>),
    Failed,
}

/// Maps `(plugin id, extension id)` to a component.
///
/// Built-in references resolve synchronously. Remote references queue one
/// module request per module URL; the outcome is cached for the resolver's
/// lifetime, failures included.
#[derive(Debug)]
pub struct PluginResolver {
    hosts: PluginHosts,
    builtins: BuiltinRegistry,
    modules: BTreeMap<String, ModuleSlot>,
    requests: Vec<String>,
}

impl Default for PluginResolver {
    fn default() -> Self {
        Self::new(PluginHosts::default())
    }
}

impl PluginResolver {
    pub fn new(hosts: PluginHosts) -> Self {
        Self::with_builtins(hosts, BuiltinRegistry::standard())
    }

    pub fn with_builtins(hosts: PluginHosts, builtins: BuiltinRegistry) -> Self {
        Self {
            hosts,
            builtins,
            modules: BTreeMap::new(),
            requests: Vec::new(),
        }
    }

    pub fn hosts(&self) -> &PluginHosts {
        &self.hosts
    }

    pub fn resolve_ref(&mut self, plugin: &PluginRef, kind: ExtensionKind) -> Resolution {
        self.resolve(
            plugin.plugin_id.as_deref(),
            plugin.extension_id.as_deref(),
            kind,
        )
    }

    pub fn resolve(
        &mut self,
        plugin_id: Option<&str>,
        extension_id: Option<&str>,
        kind: ExtensionKind,
    ) -> Resolution {
        let (Some(plugin_id), Some(extension_id)) = (plugin_id, extension_id) else {
            return Resolution::Unresolved;
        };

        if plugin_id == BUILTIN_PLUGIN_ID {
            return match self.builtins.get(kind, extension_id) {
                Some(component) => Resolution::Resolved(ResolvedComponent {
                    component,
                    base_url: None,
                }),
                None => Resolution::Unresolved,
            };
        }

        let Some(remote) = RemotePluginId::parse(plugin_id) else {
            debug!(plugin_id, "plugin id without version; not resolvable");
            return Resolution::Unresolved;
        };
        let base_url = self.hosts.base_url(kind, &remote);
        let url = module_url(&base_url);

        match self.modules.get(&url) {
            None => {
                debug!(%url, "queueing plugin module");
                self.modules.insert(url.clone(), ModuleSlot::Pending);
                self.requests.push(url);
                Resolution::Pending
            }
            Some(ModuleSlot::Pending) => Resolution::Pending,
            Some(ModuleSlot::Failed) => Resolution::Unresolved,
            Some(ModuleSlot::Loaded(module)) => {
                match module.component(kind, extension_id, &base_url) {
                    Some(component) => Resolution::Resolved(ResolvedComponent {
                        component,
                        base_url: Some(base_url),
                    }),
                    None => {
                        debug!(%url, extension_id, "module has no such export");
                        Resolution::Unresolved
                    }
                }
            }
        }
    }

    /// Module URLs queued since the last call.
    pub fn take_requests(&mut self) -> Vec<String> {
        std::mem::take(&mut self.requests)
    }

    pub fn has_pending(&self) -> bool {
        self.modules
            .values()
            .any(|slot| matches!(slot, ModuleSlot::Pending))
    }

    /// Records the outcome of a module request. Errors are absorbed: the
    /// module's references resolve to nothing.
    pub fn complete(&mut self, url: &str, result: Result<String, FetchError>) {
        let slot = match result.map_err(|e| e.to_string()).and_then(|source| {
            RemoteModule::parse(&source).map_err(|e| e.to_string())
        }) {
            Ok(module) => ModuleSlot::Loaded(Arc::new(module)),
            Err(msg) => {
                warn!(%url, "plugin module unavailable: {msg}");
                ModuleSlot::Failed
            }
        };
        self.modules.insert(url.to_string(), slot);
    }

    /// Fetches every queued module. Returns how many were requested.
    pub async fn fetch_pending<F: ModuleFetcher>(&mut self, fetcher: &F) -> usize {
        let requests = self.take_requests();
        for url in &requests {
            let result = fetcher.fetch(url).await;
            self.complete(url, result);
        }
        requests.len()
    }
}
