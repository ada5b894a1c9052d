//! Persistence behind the isolation filter.
//!
//! Repositories take the [`TenantScope`] on every call; [`ScopedStore`] binds one scope up
//! front so handlers and services never pass it around (or forget it).

mod memory;

pub use memory::MemoryRepository;

use std::sync::Arc;

use crate::domain::{
    AccountingEntry, Document, Entity, Expense, Lease, MaintenanceRequest, Payment, Property,
    Tenant,
};
use crate::tasks::Task;
use crate::tenancy::{EntityKind, TenantError, TenantScope};

/// Storage abstraction for one entity type.
pub trait Repository<T: Entity>: Send + Sync {
    /// Stamp ownership from `scope`, assign an id and persist.
    fn insert(&self, scope: &TenantScope, entity: T) -> Result<T, StoreError>;
    /// Replace a row visible under `scope`. Ownership may not move to another organization.
    fn update(&self, scope: &TenantScope, entity: T) -> Result<T, StoreError>;
    fn get(&self, scope: &TenantScope, id: u64) -> Result<Option<T>, StoreError>;
    fn list(&self, scope: &TenantScope) -> Result<Vec<T>, StoreError>;
}

#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    #[error(transparent)]
    Tenant(#[from] TenantError),
    #[error("{kind} {id} not found")]
    NotFound { kind: EntityKind, id: u64 },
    #[error("repository unavailable: {0}")]
    Unavailable(String),
}

/// One repository per tenant-scoped entity type.
#[derive(Clone)]
pub struct Store {
    pub properties: Arc<dyn Repository<Property>>,
    pub tenants: Arc<dyn Repository<Tenant>>,
    pub leases: Arc<dyn Repository<Lease>>,
    pub payments: Arc<dyn Repository<Payment>>,
    pub expenses: Arc<dyn Repository<Expense>>,
    pub maintenance_requests: Arc<dyn Repository<MaintenanceRequest>>,
    pub documents: Arc<dyn Repository<Document>>,
    pub accounting_entries: Arc<dyn Repository<AccountingEntry>>,
    pub tasks: Arc<dyn Repository<Task>>,
}

impl Store {
    pub fn in_memory() -> Self {
        Self {
            properties: Arc::new(MemoryRepository::default()),
            tenants: Arc::new(MemoryRepository::default()),
            leases: Arc::new(MemoryRepository::default()),
            payments: Arc::new(MemoryRepository::default()),
            expenses: Arc::new(MemoryRepository::default()),
            maintenance_requests: Arc::new(MemoryRepository::default()),
            documents: Arc::new(MemoryRepository::default()),
            accounting_entries: Arc::new(MemoryRepository::default()),
            tasks: Arc::new(MemoryRepository::default()),
        }
    }

    pub fn scoped(&self, scope: TenantScope) -> ScopedStore<'_> {
        ScopedStore { store: self, scope }
    }
}

impl Default for Store {
    fn default() -> Self {
        Self::in_memory()
    }
}

/// A [`Store`] view confined to one scope.
#[derive(Clone, Copy)]
pub struct ScopedStore<'a> {
    store: &'a Store,
    scope: TenantScope,
}

impl<'a> ScopedStore<'a> {
    pub fn scope(&self) -> TenantScope {
        self.scope
    }

    pub fn properties(&self) -> Scoped<'a, Property> {
        self.bind(self.store.properties.as_ref())
    }

    pub fn tenants(&self) -> Scoped<'a, Tenant> {
        self.bind(self.store.tenants.as_ref())
    }

    pub fn leases(&self) -> Scoped<'a, Lease> {
        self.bind(self.store.leases.as_ref())
    }

    pub fn payments(&self) -> Scoped<'a, Payment> {
        self.bind(self.store.payments.as_ref())
    }

    pub fn expenses(&self) -> Scoped<'a, Expense> {
        self.bind(self.store.expenses.as_ref())
    }

    pub fn maintenance_requests(&self) -> Scoped<'a, MaintenanceRequest> {
        self.bind(self.store.maintenance_requests.as_ref())
    }

    pub fn documents(&self) -> Scoped<'a, Document> {
        self.bind(self.store.documents.as_ref())
    }

    pub fn accounting_entries(&self) -> Scoped<'a, AccountingEntry> {
        self.bind(self.store.accounting_entries.as_ref())
    }

    pub fn tasks(&self) -> Scoped<'a, Task> {
        self.bind(self.store.tasks.as_ref())
    }

    fn bind<T: Entity>(&self, repository: &'a dyn Repository<T>) -> Scoped<'a, T> {
        Scoped {
            repository,
            scope: self.scope,
        }
    }
}

/// Repository handle with the scope already applied.
pub struct Scoped<'a, T: Entity> {
    repository: &'a dyn Repository<T>,
    scope: TenantScope,
}

impl<T: Entity> Scoped<'_, T> {
    pub fn insert(&self, entity: T) -> Result<T, StoreError> {
        self.repository.insert(&self.scope, entity)
    }

    pub fn update(&self, entity: T) -> Result<T, StoreError> {
        self.repository.update(&self.scope, entity)
    }

    pub fn get(&self, id: u64) -> Result<Option<T>, StoreError> {
        self.repository.get(&self.scope, id)
    }

    pub fn list(&self) -> Result<Vec<T>, StoreError> {
        self.repository.list(&self.scope)
    }

    /// Like [`Scoped::get`] but a row outside the scope is an error.
    pub fn require(&self, id: u64) -> Result<T, StoreError> {
        self.get(id)?.ok_or(StoreError::NotFound { kind: T::KIND, id })
    }
}
