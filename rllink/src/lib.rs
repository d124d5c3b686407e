//! Deep-link routing for Radiolink.
//!
//! Maps OS-level notification-tap URIs (`radiolink://<path>`) to in-app
//! navigation targets. Resolution is a table match on `(scheme, path)` with
//! one terminal fallback rule: any URI that fails every explicit entry
//! resolves to the player home screen, so navigation state is never left
//! undefined. `resolve` is total; it never returns an error and never panics.
//!
//! # Example
//!
//! ```
//! use rllink::{DeepLinkRouter, NavigationTarget};
//!
//! let router = DeepLinkRouter::new("radiolink");
//! assert_eq!(
//!     router.resolve("radiolink://notification.click"),
//!     NavigationTarget::Player
//! );
//! ```

use tracing::debug;
use url::Url;

/// Reserved path delivered by the native media-control tap callback.
///
/// The OS invokes this path when the user taps the playback notification;
/// it carries no application-defined route and must land on the player.
pub const NOTIFICATION_CLICK_PATH: &str = "notification.click";

/// An in-app navigation destination.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum NavigationTarget {
    /// The player home screen (also the terminal fallback).
    Player,
    /// A named secondary screen (news, polls, settings, ...).
    Screen(String),
}

impl NavigationTarget {
    /// Human-readable label, mainly for logging.
    pub fn as_str(&self) -> &str {
        match self {
            NavigationTarget::Player => "player",
            NavigationTarget::Screen(name) => name.as_str(),
        }
    }
}

/// One explicit routing rule.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DeepLinkRoute {
    /// URI scheme the rule applies to (lowercase)
    pub scheme: String,
    /// Normalized path (lowercase, no leading/trailing '/')
    pub path: String,
    /// Destination when the rule matches
    pub target: NavigationTarget,
}

/// Table-driven URI to navigation-target resolver.
///
/// Explicit entries are evaluated in registration order; the fallback rule is
/// evaluated only after all explicit entries fail to match.
#[derive(Debug, Clone)]
pub struct DeepLinkRouter {
    scheme: String,
    routes: Vec<DeepLinkRoute>,
    fallback: NavigationTarget,
}

impl DeepLinkRouter {
    /// Create a router for the given app scheme.
    ///
    /// The reserved notification-click path is registered up front so the
    /// fallback never has to cover it implicitly.
    pub fn new(scheme: impl Into<String>) -> Self {
        let scheme = scheme.into().to_ascii_lowercase();
        let mut router = Self {
            scheme: scheme.clone(),
            routes: Vec::new(),
            fallback: NavigationTarget::Player,
        };
        router.register(NOTIFICATION_CLICK_PATH, NavigationTarget::Player);
        // Bare "return to app" URI with no path at all.
        router.register("", NavigationTarget::Player);
        router
    }

    /// Register an explicit route for a path under the app scheme.
    pub fn register(&mut self, path: &str, target: NavigationTarget) {
        self.routes.push(DeepLinkRoute {
            scheme: self.scheme.clone(),
            path: Self::normalize_path(path),
            target,
        });
    }

    /// The app scheme this router answers for.
    pub fn scheme(&self) -> &str {
        &self.scheme
    }

    /// Registered explicit routes (fallback excluded).
    pub fn routes(&self) -> &[DeepLinkRoute] {
        &self.routes
    }

    /// Resolve a URI to a navigation target.
    ///
    /// Unparseable URIs, foreign schemes, and unregistered paths all resolve
    /// to the fallback target.
    pub fn resolve(&self, uri: &str) -> NavigationTarget {
        let Some((scheme, path)) = Self::split_uri(uri) else {
            debug!(uri, "Unparseable deep link, using fallback");
            return self.fallback.clone();
        };

        if scheme != self.scheme {
            debug!(uri, scheme = %scheme, "Foreign scheme, using fallback");
            return self.fallback.clone();
        }

        for route in &self.routes {
            if route.path == path {
                debug!(uri, target = route.target.as_str(), "Deep link matched");
                return route.target.clone();
            }
        }

        // Terminal fallback rule: evaluated only after every explicit entry
        // failed to match.
        debug!(uri, "Unmatched deep link, using fallback");
        self.fallback.clone()
    }

    /// Split a URI into (scheme, normalized path).
    ///
    /// Custom schemes are non-hierarchical, so `url::Url` may park the first
    /// segment in the host position (`radiolink://notification.click` parses
    /// with host `notification.click` and an empty path). Both positions are
    /// folded back into a single path key.
    fn split_uri(uri: &str) -> Option<(String, String)> {
        if let Ok(parsed) = Url::parse(uri) {
            let scheme = parsed.scheme().to_ascii_lowercase();
            let host = parsed.host_str().unwrap_or("");
            let joined = format!("{}/{}", host, parsed.path());
            return Some((scheme, Self::normalize_path(&joined)));
        }

        // Manual fallback for forms the url crate rejects (e.g. "scheme:path").
        let (scheme, rest) = uri.split_once(':')?;
        if scheme.is_empty() {
            return None;
        }
        let rest = rest.trim_start_matches('/');
        Some((
            scheme.to_ascii_lowercase(),
            Self::normalize_path(rest),
        ))
    }

    fn normalize_path(path: &str) -> String {
        path.trim_matches('/')
            .split('/')
            .filter(|segment| !segment.is_empty())
            .collect::<Vec<_>>()
            .join("/")
            .to_ascii_lowercase()
    }
}
