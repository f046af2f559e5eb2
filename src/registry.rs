//! Application-scoped provider registry.
//!
//! The composition root builds one [`Registry`] at startup and passes it by
//! reference to whatever needs a singleton. There is no hidden global: two
//! registries hold two independent sets of instances, which also keeps
//! tests isolated from each other.
//!
//! ```rust
//! use singleton_catalog::{Registry, Strategy};
//!
//! let registry = Registry::builder()
//!     .register::<String>(Strategy::DoubleChecked, Box::new(|| Ok("db".to_string())))
//!     .unwrap()
//!     .build();
//!
//! let a = registry.get::<String>().unwrap();
//! let b = registry.get::<String>().unwrap();
//! assert!(std::sync::Arc::ptr_eq(&a, &b));
//! ```

use crate::error::SingletonError;
use crate::strategy::{self, Accessor, Constructor, Strategy};
use std::any::{type_name, Any, TypeId};
use std::collections::HashMap;
use std::sync::Arc;
use tracing::debug;

type ErasedProvider = Box<dyn Any + Send + Sync>;

#[derive(Default)]
pub struct RegistryBuilder {
    providers: HashMap<TypeId, ErasedProvider>,
}

impl RegistryBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers a provider for `T` built with `strategy`.
    ///
    /// An eager strategy constructs the instance here.
    pub fn register<T>(
        self,
        strategy: Strategy,
        constructor: Constructor<T>,
    ) -> Result<Self, SingletonError>
    where
        T: Send + Sync + 'static,
    {
        let provider = strategy::provider(strategy, constructor)?;
        self.register_provider(provider)
    }

    pub fn register_provider<T>(
        mut self,
        provider: Arc<dyn Accessor<T>>,
    ) -> Result<Self, SingletonError>
    where
        T: Send + Sync + 'static,
    {
        let key = TypeId::of::<T>();
        if self.providers.contains_key(&key) {
            return Err(SingletonError::AlreadyRegistered {
                type_name: type_name::<T>(),
            });
        }

        debug!("registering {} provider for {}", provider.strategy(), type_name::<T>());
        self.providers.insert(key, Box::new(provider));
        Ok(self)
    }

    pub fn build(self) -> Registry {
        Registry {
            providers: self.providers,
        }
    }
}

pub struct Registry {
    providers: HashMap<TypeId, ErasedProvider>,
}

impl Registry {
    pub fn builder() -> RegistryBuilder {
        RegistryBuilder::new()
    }

    pub fn provider<T>(&self) -> Result<Arc<dyn Accessor<T>>, SingletonError>
    where
        T: Send + Sync + 'static,
    {
        self.providers
            .get(&TypeId::of::<T>())
            .and_then(|erased| erased.downcast_ref::<Arc<dyn Accessor<T>>>())
            .cloned()
            .ok_or(SingletonError::NotRegistered {
                type_name: type_name::<T>(),
            })
    }

    /// Shorthand for `provider::<T>()?.get_instance()`.
    pub fn get<T>(&self) -> Result<Arc<T>, SingletonError>
    where
        T: Send + Sync + 'static,
    {
        self.provider::<T>()?.get_instance()
    }

    pub fn contains<T: 'static>(&self) -> bool {
        self.providers.contains_key(&TypeId::of::<T>())
    }

    pub fn len(&self) -> usize {
        self.providers.len()
    }

    pub fn is_empty(&self) -> bool {
        self.providers.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::thread;

    #[derive(Debug)]
    struct Database {
        url: String,
    }

    #[test]
    fn test_lookup_returns_same_instance() {
        let registry = Registry::builder()
            .register::<Database>(
                Strategy::Synchronized,
                Box::new(|| {
                    Ok(Database {
                        url: "postgres://localhost".to_string(),
                    })
                }),
            )
            .unwrap()
            .build();

        let first = registry.get::<Database>().unwrap();
        let second = registry.get::<Database>().unwrap();
        assert!(Arc::ptr_eq(&first, &second));
        assert_eq!(first.url, "postgres://localhost");
    }

    #[test]
    fn test_unregistered_type() {
        let registry = Registry::builder().build();
        assert!(registry.is_empty());
        assert!(!registry.contains::<Database>());
        assert!(matches!(
            registry.get::<Database>(),
            Err(SingletonError::NotRegistered { .. })
        ));
    }

    #[test]
    fn test_duplicate_registration_is_rejected() {
        let result = Registry::builder()
            .register::<u32>(Strategy::Eager, Box::new(|| Ok(1)))
            .and_then(|b| b.register::<u32>(Strategy::DoubleChecked, Box::new(|| Ok(2))));

        assert!(matches!(
            result,
            Err(SingletonError::AlreadyRegistered { type_name: "u32" })
        ));
    }

    #[test]
    fn test_types_are_independent() {
        let registry = Registry::builder()
            .register::<u32>(Strategy::Eager, Box::new(|| Ok(7)))
            .unwrap()
            .register::<String>(Strategy::DoubleChecked, Box::new(|| Ok("seven".to_string())))
            .unwrap()
            .build();

        assert_eq!(registry.len(), 2);
        assert_eq!(*registry.get::<u32>().unwrap(), 7);
        assert_eq!(*registry.get::<String>().unwrap(), "seven");
    }

    #[test]
    fn test_registry_shared_across_threads() {
        let builds = Arc::new(AtomicUsize::new(0));
        let counter = Arc::clone(&builds);
        let registry = Registry::builder()
            .register::<Vec<u8>>(
                Strategy::DoubleChecked,
                Box::new(move || {
                    counter.fetch_add(1, Ordering::SeqCst);
                    Ok(vec![0; 16])
                }),
            )
            .unwrap()
            .build();

        thread::scope(|scope| {
            for _ in 0..8 {
                scope.spawn(|| registry.get::<Vec<u8>>().unwrap());
            }
        });

        assert_eq!(builds.load(Ordering::SeqCst), 1);
        assert_eq!(registry.provider::<Vec<u8>>().unwrap().creation_count(), 1);
    }
}
