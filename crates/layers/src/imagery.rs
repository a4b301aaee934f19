//! Declarative tile layer specs → imagery provider descriptions.

use std::sync::Arc;

use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

/// Declarative imagery layer as authored in the scene.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TileLayerSpec {
    pub id: String,
    #[serde(rename = "type", default)]
    pub kind: Option<String>,
    #[serde(default)]
    pub url: Option<String>,
    #[serde(default)]
    pub min_level: Option<u32>,
    #[serde(default)]
    pub max_level: Option<u32>,
}

impl TileLayerSpec {
    pub fn new(id: impl Into<String>, kind: &str) -> Self {
        Self {
            id: id.into(),
            kind: Some(kind.to_string()),
            url: None,
            min_level: None,
            max_level: None,
        }
    }

    pub fn with_url(mut self, url: impl Into<String>) -> Self {
        self.url = Some(url.into());
        self
    }
}

/// Where a provider pulls its tiles from.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum ProviderSource {
    Ion { asset_id: u32 },
    UrlTemplate { url: String },
    OpenStreetMap { url: String },
    ArcGisMapServer { url: String },
}

/// One renderer imagery provider, in z-order position.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ImageryProvider {
    pub layer_id: String,
    pub source: ProviderSource,
    pub min_level: Option<u32>,
    pub max_level: Option<u32>,
}

type ProviderFactory = fn(&TileLayerSpec) -> Option<ProviderSource>;

const STAMEN_WATERCOLOR: &str = "https://stamen-tiles.a.ssl.fastly.net/watercolor/{z}/{x}/{y}.jpg";
const STAMEN_TONER: &str = "https://stamen-tiles.a.ssl.fastly.net/toner/{z}/{x}/{y}.png";
const OPEN_STREET_MAP: &str = "https://a.tile.openstreetmap.org/";
const ESRI_WORLD_TOPOGRAPHY: &str =
    "https://services.arcgisonline.com/ArcGIS/rest/services/World_Topo_Map/MapServer";
const JAPAN_GSI_STANDARD: &str = "https://cyberjapandata.gsi.go.jp/xyz/std/{z}/{x}/{y}.png";

/// Closed provider registry, keyed by `TileLayerSpec::kind`.
const PROVIDER_FACTORIES: &[(&str, ProviderFactory)] = &[
    ("default", ion_aerial),
    ("default_label", ion_aerial_labels),
    ("default_road", ion_road),
    ("stamen_watercolor", stamen_watercolor),
    ("stamen_toner", stamen_toner),
    ("open_street_map", open_street_map),
    ("esri_world_topography", esri_world_topography),
    ("black_marble", black_marble),
    ("japan_gsi_standard", japan_gsi_standard),
    ("url", url_template),
];

fn ion_aerial(_: &TileLayerSpec) -> Option<ProviderSource> {
    Some(ProviderSource::Ion { asset_id: 2 })
}

fn ion_aerial_labels(_: &TileLayerSpec) -> Option<ProviderSource> {
    Some(ProviderSource::Ion { asset_id: 3 })
}

fn ion_road(_: &TileLayerSpec) -> Option<ProviderSource> {
    Some(ProviderSource::Ion { asset_id: 4 })
}

fn black_marble(_: &TileLayerSpec) -> Option<ProviderSource> {
    Some(ProviderSource::Ion { asset_id: 3812 })
}

fn stamen_watercolor(_: &TileLayerSpec) -> Option<ProviderSource> {
    Some(template(STAMEN_WATERCOLOR))
}

fn stamen_toner(_: &TileLayerSpec) -> Option<ProviderSource> {
    Some(template(STAMEN_TONER))
}

fn japan_gsi_standard(_: &TileLayerSpec) -> Option<ProviderSource> {
    Some(template(JAPAN_GSI_STANDARD))
}

fn open_street_map(_: &TileLayerSpec) -> Option<ProviderSource> {
    Some(ProviderSource::OpenStreetMap {
        url: OPEN_STREET_MAP.to_string(),
    })
}

fn esri_world_topography(_: &TileLayerSpec) -> Option<ProviderSource> {
    Some(ProviderSource::ArcGisMapServer {
        url: ESRI_WORLD_TOPOGRAPHY.to_string(),
    })
}

fn url_template(spec: &TileLayerSpec) -> Option<ProviderSource> {
    let url = spec.url.as_deref().filter(|u| !u.is_empty())?;
    Some(template(url))
}

fn template(url: &str) -> ProviderSource {
    ProviderSource::UrlTemplate {
        url: url.to_string(),
    }
}

pub fn provider_kinds() -> impl Iterator<Item = &'static str> {
    PROVIDER_FACTORIES.iter().map(|(kind, _)| *kind)
}

/// Resolves one spec; `None` for an unset or unknown type or a template without URL.
pub fn imagery_provider(spec: &TileLayerSpec) -> Option<ImageryProvider> {
    let kind = spec.kind.as_deref()?;
    let Some((_, factory)) = PROVIDER_FACTORIES.iter().find(|(k, _)| *k == kind) else {
        warn!(layer = %spec.id, kind, "unknown imagery provider type");
        return None;
    };
    let source = factory(spec)?;
    Some(ImageryProvider {
        layer_id: spec.id.clone(),
        source,
        min_level: spec.min_level,
        max_level: spec.max_level,
    })
}

/// Maps specs to providers, dropping unresolvable ones and keeping input order.
pub fn imagery_providers(specs: &[TileLayerSpec]) -> Vec<ImageryProvider> {
    specs.iter().filter_map(imagery_provider).collect()
}

/// Provider list produced by one reconciliation.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize)]
pub struct ImageryLayers {
    /// Bumped on every recomputation; equal generations mean the same instances.
    pub generation: u64,
    pub providers: Vec<ImageryProvider>,
}

/// Memoizes [`imagery_providers`] on deep equality of the spec list.
#[derive(Debug, Default)]
pub struct ImageryReconciler {
    specs: Option<Vec<TileLayerSpec>>,
    current: Arc<ImageryLayers>,
    generation: u64,
}

impl ImageryReconciler {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn current(&self) -> Arc<ImageryLayers> {
        Arc::clone(&self.current)
    }

    /// Returns the cached list when `specs` equals the previous input, and a
    /// freshly built one otherwise.
    pub fn reconcile(&mut self, specs: &[TileLayerSpec]) -> Arc<ImageryLayers> {
        if self.specs.as_deref() == Some(specs) {
            return self.current();
        }
        self.generation += 1;
        let providers = imagery_providers(specs);
        debug!(
            generation = self.generation,
            specs = specs.len(),
            providers = providers.len(),
            "imagery reconciled"
        );
        self.specs = Some(specs.to_vec());
        self.current = Arc::new(ImageryLayers {
            generation: self.generation,
            providers,
        });
        self.current()
    }
}

#[cfg(test)]
mod tests {
    use super::{
        ImageryReconciler, ProviderSource, TileLayerSpec, imagery_provider, imagery_providers,
        provider_kinds,
    };
    use pretty_assertions::assert_eq;
    use std::sync::Arc;

    #[test]
    fn equal_contents_reuse_the_same_list() {
        let mut r = ImageryReconciler::new();
        let a = r.reconcile(&[TileLayerSpec::new("a", "default")]);
        let b = r.reconcile(&[TileLayerSpec::new("a", "default")]);
        assert!(Arc::ptr_eq(&a, &b));
        assert_eq!(a.providers.len(), 1);
    }

    #[test]
    fn changed_specs_produce_fresh_instances() {
        let mut r = ImageryReconciler::new();
        let a = r.reconcile(&[TileLayerSpec::new("a", "default")]);
        let b = r.reconcile(&[TileLayerSpec::new("a", "default_road")]);
        assert!(!Arc::ptr_eq(&a, &b));
        assert!(b.generation > a.generation);
        assert_eq!(b.providers[0].source, ProviderSource::Ion { asset_id: 4 });
    }

    #[test]
    fn empty_and_url_without_url_yield_nothing() {
        assert!(imagery_providers(&[]).is_empty());
        assert!(imagery_providers(&[TileLayerSpec::new("u", "url")]).is_empty());
        assert!(imagery_providers(&[TileLayerSpec::new("u", "url").with_url("")]).is_empty());
    }

    #[test]
    fn unknown_or_unset_type_is_dropped_and_order_is_kept() {
        let mut unset = TileLayerSpec::new("x", "default");
        unset.kind = None;
        let specs = vec![
            TileLayerSpec::new("1", "open_street_map"),
            TileLayerSpec::new("2", "not_a_provider"),
            unset,
            TileLayerSpec::new("3", "url").with_url("https://tiles.example.com/{z}/{x}/{y}.png"),
            TileLayerSpec::new("4", "black_marble"),
        ];
        let ids: Vec<_> = imagery_providers(&specs)
            .into_iter()
            .map(|p| p.layer_id)
            .collect();
        assert_eq!(ids, vec!["1", "3", "4"]);
    }

    #[test]
    fn levels_pass_through() {
        let mut spec = TileLayerSpec::new("t", "japan_gsi_standard");
        spec.min_level = Some(2);
        spec.max_level = Some(18);
        let p = imagery_provider(&spec).expect("provider");
        assert_eq!((p.min_level, p.max_level), (Some(2), Some(18)));
    }

    #[test]
    fn parses_type_key() {
        let spec: TileLayerSpec =
            serde_json::from_str(r#"{"id":"a","type":"stamen_toner","max_level":12}"#)
                .expect("parse");
        assert_eq!(spec.kind.as_deref(), Some("stamen_toner"));
        assert!(imagery_provider(&spec).is_some());
    }

    #[test]
    fn registry_is_closed() {
        assert_eq!(provider_kinds().count(), 10);
        assert!(provider_kinds().any(|k| k == "url"));
    }
}
