use std::collections::BTreeMap;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Mutex, MutexGuard};

use tracing::{debug, warn};

use super::{Repository, StoreError};
use crate::domain::Entity;
use crate::tenancy::{TenantError, TenantScope};

/// Process-local repository; rows are kept in id order.
pub struct MemoryRepository<T> {
    rows: Mutex<BTreeMap<u64, T>>,
    sequence: AtomicU64,
}

impl<T> Default for MemoryRepository<T> {
    fn default() -> Self {
        Self {
            rows: Mutex::new(BTreeMap::new()),
            sequence: AtomicU64::new(1),
        }
    }
}

impl<T: Entity> MemoryRepository<T> {
    fn rows(&self) -> Result<MutexGuard<'_, BTreeMap<u64, T>>, StoreError> {
        self.rows
            .lock()
            .map_err(|_| StoreError::Unavailable(format!("{} table lock poisoned", T::KIND)))
    }
}

impl<T: Entity> Repository<T> for MemoryRepository<T> {
    fn insert(&self, scope: &TenantScope, mut entity: T) -> Result<T, StoreError> {
        scope.stamp(&mut entity)?;
        let id = self.sequence.fetch_add(1, Ordering::Relaxed);
        entity.assign_id(id);

        self.rows()?.insert(id, entity.clone());
        debug!(table = T::KIND.table(), id, owner = %entity.tenant(), "row inserted");
        Ok(entity)
    }

    fn update(&self, scope: &TenantScope, entity: T) -> Result<T, StoreError> {
        let mut rows = self.rows()?;
        let id = entity.id();

        let existing = match rows.get(&id) {
            Some(row) if scope.allows(row.tenant()) => *row.tenant(),
            Some(row) => {
                warn!(
                    table = T::KIND.table(),
                    id,
                    %scope,
                    owner = %row.tenant(),
                    "refused update outside tenant scope"
                );
                return Err(StoreError::NotFound { kind: T::KIND, id });
            }
            None => return Err(StoreError::NotFound { kind: T::KIND, id }),
        };

        let requested = *entity.tenant();
        if requested.organization != existing.organization || !scope.allows(&requested) {
            return Err(TenantError::CrossTenantWrite {
                kind: T::KIND,
                scope: *scope,
                found: requested,
            }
            .into());
        }

        rows.insert(id, entity.clone());
        Ok(entity)
    }

    fn get(&self, scope: &TenantScope, id: u64) -> Result<Option<T>, StoreError> {
        Ok(self
            .rows()?
            .get(&id)
            .filter(|row| scope.allows(row.tenant()))
            .cloned())
    }

    fn list(&self, scope: &TenantScope) -> Result<Vec<T>, StoreError> {
        Ok(self
            .rows()?
            .values()
            .filter(|row| scope.allows(row.tenant()))
            .cloned()
            .collect())
    }
}
