//! Get-or-create reconciliation for a single named object.
//!
//! An existing object is never diffed, patched, or replaced: whatever the API
//! server holds under the name wins, and the desired object is discarded.

use tracing::{debug, warn};

use crate::cluster::ObjectApi;
use crate::error::{self, Error, Result};

/// Outcome of [`get_or_create`].
#[derive(Clone, Debug, PartialEq)]
pub enum Ensured<K> {
    /// This run created the object
    Created(K),
    /// The object already existed (possibly created by a concurrent run)
    Existing(K),
}

impl<K> Ensured<K> {
    /// Whether this run created the object
    pub fn created(&self) -> bool {
        matches!(self, Ensured::Created(_))
    }

    /// The object, however it came to exist
    pub fn into_inner(self) -> K {
        match self {
            Ensured::Created(k) | Ensured::Existing(k) => k,
        }
    }
}

/// Fetch an object by name, mapping 404 to `None`.
///
/// Any other failure is returned unchanged.
pub async fn fetch<K>(api: &dyn ObjectApi<K>, name: &str) -> Result<Option<K>>
where
    K: Send + Sync + 'static,
{
    match api.get(name).await {
        Ok(object) => Ok(Some(object)),
        Err(e) if error::is_not_found(&e) => Ok(None),
        Err(e) => Err(e.into()),
    }
}

/// Create an object, folding a concurrent create into success.
///
/// On 409 the object stored by the winning writer is read back and returned
/// as [`Ensured::Existing`].
pub async fn create_or_adopt<K>(
    api: &dyn ObjectApi<K>,
    name: &str,
    desired: &K,
) -> Result<Ensured<K>>
where
    K: Send + Sync + 'static,
{
    match api.create(desired).await {
        Ok(created) => Ok(Ensured::Created(created)),
        Err(e) if error::is_already_exists(&e) => {
            warn!(name = %name, "Object was created concurrently, adopting it");
            match fetch(api, name).await? {
                Some(existing) => Ok(Ensured::Existing(existing)),
                None => Err(Error::Kube(e)),
            }
        }
        Err(e) => Err(e.into()),
    }
}

/// Return the object named `name`, creating it from `desired` if absent.
pub async fn get_or_create<K>(api: &dyn ObjectApi<K>, name: &str, desired: K) -> Result<Ensured<K>>
where
    K: Send + Sync + 'static,
{
    if let Some(existing) = fetch(api, name).await? {
        debug!(name = %name, "Object exists, leaving it untouched");
        return Ok(Ensured::Existing(existing));
    }
    debug!(name = %name, "Object not found, creating");
    create_or_adopt(api, name, &desired).await
}
