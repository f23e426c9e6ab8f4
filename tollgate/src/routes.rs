//! Route registry: which (method, path) pairs are gated, and by what.
//!
//! Lookup is exact-match on a normalized key. Pattern routing stays in
//! the host framework; by the time a request reaches the gate, its
//! concrete method and path either are registered here or are not.

use std::collections::HashMap;
use std::collections::hash_map::Entry;
use std::fmt;

use crate::chain::ChainId;
use crate::error::ConfigurationError;
use crate::proto::PaymentOption;

/// Normalized route key.
///
/// Methods are uppercased; paths get a leading slash and lose trailing
/// ones, so `get /weather/` and `GET /weather` collide as intended.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct RouteKey {
    method: String,
    path: String,
}

impl RouteKey {
    /// Creates a normalized key.
    pub fn new(method: &str, path: &str) -> Self {
        Self {
            method: method.trim().to_ascii_uppercase(),
            path: normalize_path(path),
        }
    }

    /// Returns the normalized HTTP method.
    #[must_use]
    pub fn method(&self) -> &str {
        &self.method
    }

    /// Returns the normalized path.
    #[must_use]
    pub fn path(&self) -> &str {
        &self.path
    }
}

impl fmt::Display for RouteKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} {}", self.method, self.path)
    }
}

fn normalize_path(path: &str) -> String {
    let trimmed = path.trim();
    let mut normalized = if trimmed.starts_with('/') {
        trimmed.to_owned()
    } else {
        format!("/{trimmed}")
    };
    while normalized.len() > 1 && normalized.ends_with('/') {
        normalized.pop();
    }
    normalized
}

/// What a route charges, as written at registration time.
///
/// Carries the ordered option list plus route-level description and MIME
/// type defaults that are stamped onto options not setting their own.
#[derive(Debug, Clone)]
pub struct RouteSpec {
    options: Vec<PaymentOption>,
    description: Option<String>,
    mime_type: Option<String>,
}

impl RouteSpec {
    /// Creates a spec from an ordered option list.
    #[must_use]
    pub const fn new(options: Vec<PaymentOption>) -> Self {
        Self {
            options,
            description: None,
            mime_type: None,
        }
    }

    /// Sets the description default for options without their own.
    #[must_use]
    pub fn with_description<S: Into<String>>(mut self, description: S) -> Self {
        self.description = Some(description.into());
        self
    }

    /// Sets the MIME type default for options without their own.
    #[must_use]
    pub fn with_mime_type<S: Into<String>>(mut self, mime_type: S) -> Self {
        self.mime_type = Some(mime_type.into());
        self
    }

    /// Returns the options as written, before defaults are stamped.
    #[must_use]
    pub fn options(&self) -> &[PaymentOption] {
        &self.options
    }

    fn into_requirement(self, key: RouteKey) -> Result<RouteRequirement, ConfigurationError> {
        if self.options.is_empty() {
            return Err(ConfigurationError::EmptyOptions {
                method: key.method,
                path: key.path,
            });
        }
        let Self {
            options,
            description,
            mime_type,
        } = self;
        let options = options
            .into_iter()
            .map(|mut option| {
                if option.description.is_none() {
                    option.description.clone_from(&description);
                }
                if option.mime_type.is_none() {
                    option.mime_type.clone_from(&mime_type);
                }
                option
            })
            .collect();
        Ok(RouteRequirement { key, options })
    }
}

/// A gated route: its key plus the options that satisfy it, in
/// registration order.
#[derive(Debug, Clone)]
pub struct RouteRequirement {
    key: RouteKey,
    options: Vec<PaymentOption>,
}

impl RouteRequirement {
    /// Returns the route's key.
    #[must_use]
    pub const fn key(&self) -> &RouteKey {
        &self.key
    }

    /// Returns the advertised options in registration order.
    #[must_use]
    pub fn options(&self) -> &[PaymentOption] {
        &self.options
    }

    /// Finds the first option payable via the given (network, scheme)
    /// pair.
    #[must_use]
    pub fn matching_option(&self, network: &ChainId, scheme: &str) -> Option<&PaymentOption> {
        self.options
            .iter()
            .find(|option| option.matches(network, scheme))
    }
}

/// Exact-match table of gated routes.
#[derive(Debug, Default)]
pub struct RouteTable {
    routes: HashMap<RouteKey, RouteRequirement>,
}

impl RouteTable {
    /// Creates an empty table.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers a route.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigurationError::EmptyOptions`] for an empty option
    /// list and [`ConfigurationError::DuplicateRoute`] when the
    /// normalized (method, path) is already registered.
    pub fn insert(
        &mut self,
        method: &str,
        path: &str,
        spec: RouteSpec,
    ) -> Result<(), ConfigurationError> {
        let key = RouteKey::new(method, path);
        let requirement = spec.into_requirement(key.clone())?;
        match self.routes.entry(key) {
            Entry::Occupied(occupied) => Err(ConfigurationError::DuplicateRoute {
                method: occupied.key().method().to_owned(),
                path: occupied.key().path().to_owned(),
            }),
            Entry::Vacant(vacant) => {
                vacant.insert(requirement);
                Ok(())
            }
        }
    }

    /// Looks up the requirement for a request's method and path.
    #[must_use]
    pub fn lookup(&self, method: &str, path: &str) -> Option<&RouteRequirement> {
        self.routes.get(&RouteKey::new(method, path))
    }

    /// Iterates over all registered requirements, in no particular
    /// order.
    pub fn iter(&self) -> impl Iterator<Item = &RouteRequirement> {
        self.routes.values()
    }

    /// Returns the number of gated routes.
    #[must_use]
    pub fn len(&self) -> usize {
        self.routes.len()
    }

    /// Returns whether any route is gated.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.routes.is_empty()
    }
}
