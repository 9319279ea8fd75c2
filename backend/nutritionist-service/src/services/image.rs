/// Resolves stored image references to client-facing URLs.
pub trait ImageUrlResolver: Send + Sync {
    fn resolve(&self, reference: Option<&str>) -> Option<String>;
}

/// Joins relative references onto a CDN/static base URL.
#[derive(Debug, Clone)]
pub struct CdnImageResolver {
    base_url: String,
}

impl CdnImageResolver {
    pub fn new(base_url: impl Into<String>) -> Self {
        let base_url = base_url.into().trim_end_matches('/').to_string();
        Self { base_url }
    }
}

impl ImageUrlResolver for CdnImageResolver {
    fn resolve(&self, reference: Option<&str>) -> Option<String> {
        let reference = reference.map(str::trim).filter(|r| !r.is_empty())?;

        if reference.starts_with("http://") || reference.starts_with("https://") {
            return Some(reference.to_string());
        }

        Some(format!(
            "{}/{}",
            self.base_url,
            reference.trim_start_matches('/')
        ))
    }
}
