use tracing::debug;

use medkb_core::lexicon::DOMAIN_KEYWORDS;

/// Rejects queries that mention none of the domain keywords.
#[derive(Debug, Clone)]
pub struct DomainFilter {
    keywords: Vec<String>,
}

impl Default for DomainFilter {
    fn default() -> Self { Self::new(DOMAIN_KEYWORDS.iter().copied()) }
}

impl DomainFilter {
    pub fn new<I, S>(keywords: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        Self { keywords: keywords.into_iter().map(|k| k.as_ref().to_lowercase()).collect() }
    }

    pub fn keywords(&self) -> &[String] { &self.keywords }

    /// Keywords found in `query`, in vocabulary order.
    pub fn matched(&self, query: &str) -> Vec<&str> {
        let query = query.to_lowercase();
        self.keywords.iter().filter(|k| query.contains(k.as_str())).map(String::as_str).collect()
    }

    pub fn is_in_domain(&self, query: &str) -> bool {
        let query = query.to_lowercase();
        let hit = self.keywords.iter().any(|k| query.contains(k.as_str()));
        if !hit {
            debug!(query, "query outside the domain vocabulary");
        }
        hit
    }
}
