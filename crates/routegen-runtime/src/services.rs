//! Service container.
//!
//! Services are registered at startup and handed to handler parameters
//! bound from services.
//!
//! ```rust
//! use routegen_runtime::Services;
//! use std::sync::Arc;
//!
//! struct Database {
//!     url: String,
//! }
//!
//! let mut services = Services::new();
//! services.register(Arc::new(Database { url: "postgres://localhost/db".to_string() }));
//!
//! let db: Arc<Database> = services.require().unwrap();
//! assert_eq!(db.url, "postgres://localhost/db");
//! ```

use crate::error::ExtractionError;
use std::any::{Any, TypeId};
use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;

/// Type-keyed service container.
///
/// Services are stored as `Arc<T>` and resolved by type. The container is
/// `Send + Sync` and shared by every request context.
#[derive(Default)]
pub struct Services {
    services: HashMap<TypeId, Arc<dyn Any + Send + Sync>>,
}

impl Services {
    /// Creates an empty container.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers a service, replacing any earlier one of the same type.
    pub fn register<T: Send + Sync + 'static>(&mut self, service: Arc<T>) {
        self.services.insert(TypeId::of::<T>(), service);
    }

    /// Resolves a service, `None` if it is not registered.
    #[must_use]
    pub fn get<T: Send + Sync + 'static>(&self) -> Option<Arc<T>> {
        self.services
            .get(&TypeId::of::<T>())
            .and_then(|s| Arc::clone(s).downcast::<T>().ok())
    }

    /// Resolves a service that must be registered.
    ///
    /// # Errors
    ///
    /// Returns a service-unavailable [`ExtractionError`] if it is not.
    pub fn require<T: Send + Sync + 'static>(&self) -> Result<Arc<T>, ExtractionError> {
        self.get()
            .ok_or_else(|| ExtractionError::service_unavailable(std::any::type_name::<T>()))
    }

    /// Checks if a service is registered.
    #[must_use]
    pub fn contains<T: Send + Sync + 'static>(&self) -> bool {
        self.services.contains_key(&TypeId::of::<T>())
    }

    /// Returns the number of registered services.
    #[must_use]
    pub fn len(&self) -> usize {
        self.services.len()
    }

    /// Returns `true` if no services are registered.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.services.is_empty()
    }
}

impl fmt::Debug for Services {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Services")
            .field("service_count", &self.services.len())
            .finish()
    }
}
