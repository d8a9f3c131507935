//! Link entity as seen by the checker.

/// A stored link whose liveness is being checked.
///
/// Links are owned by the surrounding bookmark registry. The checker only reads
/// `id` and `url` when a run starts and writes back the cached validity fields
/// through [`crate::domain::repositories::LinkRepository::update_validity`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Link {
    pub id: i64,
    pub url: String,
}

impl Link {
    /// Creates a new Link instance.
    pub fn new(id: i64, url: impl Into<String>) -> Self {
        Self { id, url: url.into() }
    }

    /// Returns true if the URL starts with `http://` or `https://`.
    ///
    /// The scheme comparison ignores ASCII case, so `HTTPS://example.com`
    /// is accepted as well.
    pub fn has_http_scheme(&self) -> bool {
        has_http_scheme(&self.url)
    }
}

pub(crate) fn has_http_scheme(url: &str) -> bool {
    ["http://", "https://"].iter().any(|scheme| {
        url.get(..scheme.len())
            .is_some_and(|prefix| prefix.eq_ignore_ascii_case(scheme))
    })
}
