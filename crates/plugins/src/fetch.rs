use std::cell::Cell;
use std::collections::BTreeMap;
use std::future::Future;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FetchError {
    NotFound(String),
    Status { url: String, status: u16 },
    Network(String),
}

impl std::fmt::Display for FetchError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            FetchError::NotFound(url) => write!(f, "plugin module not found: {url}"),
            FetchError::Status { url, status } => {
                write!(f, "plugin module request failed ({status}): {url}")
            }
            FetchError::Network(msg) => write!(f, "plugin module fetch error: {msg}"),
        }
    }
}

impl std::error::Error for FetchError {}

/// Loads the source text of a remote plugin module.
pub trait ModuleFetcher {
    fn fetch(&self, url: &str) -> impl Future<Output = Result<String, FetchError>>;
}

/// Serves modules from memory and counts requests.
#[derive(Debug, Default)]
pub struct StaticModuleFetcher {
    modules: BTreeMap<String, String>,
    requests: Cell<usize>,
}

impl StaticModuleFetcher {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_module(mut self, url: impl Into<String>, source: impl Into<String>) -> Self {
        self.insert(url, source);
        self
    }

    pub fn insert(&mut self, url: impl Into<String>, source: impl Into<String>) {
        self.modules.insert(url.into(), source.into());
    }

    pub fn request_count(&self) -> usize {
        self.requests.get()
    }
}

impl ModuleFetcher for StaticModuleFetcher {
    fn fetch(&self, url: &str) -> impl Future<Output = Result<String, FetchError>> {
        self.requests.set(self.requests.get() + 1);
        let result = self
            .modules
            .get(url)
            .cloned()
            .ok_or_else(|| FetchError::NotFound(url.to_string()));
        std::future::ready(result)
    }
}

#[cfg(not(target_arch = "wasm32"))]
mod http {
    use super::{FetchError, ModuleFetcher};
    use std::future::Future;

    /// Fetches modules over HTTP. Relative URLs are joined onto `origin`.
    #[derive(Debug, Clone)]
    pub struct HttpModuleFetcher {
        client: reqwest::Client,
        origin: String,
    }

    impl HttpModuleFetcher {
        pub fn new(origin: impl Into<String>) -> Self {
            Self {
                client: reqwest::Client::new(),
                origin: origin.into().trim_end_matches('/').to_string(),
            }
        }

        fn absolute(&self, url: &str) -> String {
            if url.starts_with("http://") || url.starts_with("https://") {
                url.to_string()
            } else {
                format!("{}/{}", self.origin, url.trim_start_matches('/'))
            }
        }
    }

    impl ModuleFetcher for HttpModuleFetcher {
        fn fetch(&self, url: &str) -> impl Future<Output = Result<String, FetchError>> {
            let url = self.absolute(url);
            async move {
                let resp = self
                    .client
                    .get(&url)
                    .send()
                    .await
                    .map_err(|e| FetchError::Network(e.to_string()))?;
                let status = resp.status();
                if status == reqwest::StatusCode::NOT_FOUND {
                    return Err(FetchError::NotFound(url));
                }
                if !status.is_success() {
                    return Err(FetchError::Status {
                        url,
                        status: status.as_u16(),
                    });
                }
                resp.text()
                    .await
                    .map_err(|e| FetchError::Network(e.to_string()))
            }
        }
    }
}

#[cfg(not(target_arch = "wasm32"))]
pub use http::HttpModuleFetcher;

#[cfg(test)]
mod tests {
    use super::{FetchError, ModuleFetcher, StaticModuleFetcher};
    use pretty_assertions::assert_eq;

    #[test]
    fn static_fetcher_serves_and_counts() {
        let fetcher = StaticModuleFetcher::new().with_module("/a/index.js", "{}");
        assert_eq!(pollster::block_on(fetcher.fetch("/a/index.js")), Ok("{}".into()));
        assert_eq!(
            pollster::block_on(fetcher.fetch("/b/index.js")),
            Err(FetchError::NotFound("/b/index.js".into()))
        );
        assert_eq!(fetcher.request_count(), 2);
    }
}
