//! Fallback priority order.

use crate::BackendCatalog;
use peroot_core::BackendId;
use peroot_error::{ConfigError, PerootError, PerootResult};
use serde::{Deserialize, Serialize};

/// Backend ids in the order they are attempted. First listed, first tried.
///
/// Never contains duplicates.
///
/// # Examples
///
/// ```
/// use peroot_gateway::FallbackOrder;
///
/// assert!(FallbackOrder::new(["a", "b", "a"]).is_err());
///
/// let order = FallbackOrder::new(["b", "a"]).unwrap();
/// let ids: Vec<_> = order.iter().map(|id| id.as_str()).collect();
/// assert_eq!(ids, ["b", "a"]);
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "Vec<BackendId>", into = "Vec<BackendId>")]
pub struct FallbackOrder(Vec<BackendId>);

impl FallbackOrder {
    /// Build an order, rejecting duplicate ids.
    ///
    /// # Errors
    ///
    /// Returns a configuration error naming the first duplicate.
    pub fn new<I, T>(ids: I) -> PerootResult<Self>
    where
        I: IntoIterator<Item = T>,
        T: Into<BackendId>,
    {
        let mut order: Vec<BackendId> = Vec::new();
        for id in ids {
            let id = id.into();
            if order.contains(&id) {
                return Err(ConfigError::new(format!(
                    "Duplicate backend id in fallback order: {}",
                    id
                ))
                .into());
            }
            order.push(id);
        }
        Ok(Self(order))
    }

    /// Build an order whose every id resolves in the catalog.
    ///
    /// # Errors
    ///
    /// Returns a configuration error for duplicates or unknown ids.
    pub fn validated<I, T>(ids: I, catalog: &BackendCatalog) -> PerootResult<Self>
    where
        I: IntoIterator<Item = T>,
        T: Into<BackendId>,
    {
        let order = Self::new(ids)?;
        let unresolved = order.unresolved(catalog);
        if !unresolved.is_empty() {
            let names: Vec<&str> = unresolved.iter().map(|id| id.as_str()).collect();
            return Err(ConfigError::new(format!(
                "Fallback order references unknown backends: {}",
                names.join(", ")
            ))
            .into());
        }
        Ok(order)
    }

    /// Ids that do not resolve in the catalog.
    pub fn unresolved(&self, catalog: &BackendCatalog) -> Vec<&BackendId> {
        self.0.iter().filter(|id| !catalog.contains(id)).collect()
    }

    /// Ids in priority order.
    pub fn iter(&self) -> impl Iterator<Item = &BackendId> {
        self.0.iter()
    }

    /// Number of ids.
    pub fn len(&self) -> usize {
        self.0.len()
    }

    /// Whether the order is empty.
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl Default for FallbackOrder {
    fn default() -> Self {
        Self(
            ["gemini-2.0-flash", "gemini-1.5-flash", "llama-3-70b", "deepseek-chat"]
                .into_iter()
                .map(BackendId::from)
                .collect(),
        )
    }
}

impl TryFrom<Vec<BackendId>> for FallbackOrder {
    type Error = PerootError;

    fn try_from(ids: Vec<BackendId>) -> Result<Self, Self::Error> {
        Self::new(ids)
    }
}

impl From<FallbackOrder> for Vec<BackendId> {
    fn from(order: FallbackOrder) -> Self {
        order.0
    }
}
