//! Scope-bound fixture store chain.
//!
//! One store exists per active scope, linked to the store of the enclosing
//! scope. A store owns the slots for the fixtures scheduled at its scope;
//! requests for anything else walk up the chain. Values are built on first
//! request, exactly once even under concurrent access, and torn down in
//! reverse construction order when the scope ends.

use std::panic::{AssertUnwindSafe, catch_unwind};
use std::sync::{Arc, Mutex};

use indexmap::{IndexMap, IndexSet};
use once_cell::sync::OnceCell;
use verdict_core::FixtureValue;

use crate::error::{FixtureError, FixtureResult};
use crate::fixture::{FixtureArgs, Scope};
use crate::registry::FixtureRegistry;

type Slot = OnceCell<Result<FixtureValue, String>>;

/// Cache of built fixture values for one scope.
pub struct FixtureStore {
    scope: Scope,
    parent: Option<Arc<FixtureStore>>,
    slots: IndexMap<String, Slot>,
    // names in construction order, pushed only by the initializing caller
    order: Mutex<Vec<String>>,
}

impl FixtureStore {
    /// Create the outermost store of a chain
    #[must_use]
    pub fn root(scope: Scope, names: &IndexSet<String>) -> Self {
        Self::build(scope, None, names)
    }

    /// Create a store nested under `parent`
    #[must_use]
    pub fn child(parent: Arc<FixtureStore>, scope: Scope, names: &IndexSet<String>) -> Self {
        Self::build(scope, Some(parent), names)
    }

    fn build(scope: Scope, parent: Option<Arc<FixtureStore>>, names: &IndexSet<String>) -> Self {
        let slots = names
            .iter()
            .map(|name| (name.clone(), Slot::new()))
            .collect();
        Self {
            scope,
            parent,
            slots,
            order: Mutex::new(Vec::new()),
        }
    }

    /// The scope this store caches for
    #[must_use]
    pub fn scope(&self) -> Scope {
        self.scope
    }

    /// Whether this store (not its parents) owns a slot for `name`
    #[must_use]
    pub fn owns(&self, name: &str) -> bool {
        self.slots.contains_key(name)
    }

    /// Whether any store in the chain owns a slot for `name`
    #[must_use]
    pub fn chain_owns(&self, name: &str) -> bool {
        self.owns(name) || self.parent.as_ref().is_some_and(|p| p.chain_owns(name))
    }

    /// Resolve a fixture value, building it on first request.
    ///
    /// A failed build is cached; later requests observe the same
    /// [`FixtureError::Setup`] without re-running the factory.
    ///
    /// # Errors
    ///
    /// Returns [`FixtureError::Setup`] if the factory failed or panicked,
    /// [`FixtureError::NotScheduled`] if no store in the chain owns `name`,
    /// or an error from resolving a dependency.
    pub fn get(&self, name: &str, registry: &FixtureRegistry) -> FixtureResult<FixtureValue> {
        let Some(slot) = self.slots.get(name) else {
            return match &self.parent {
                Some(parent) => parent.get(name, registry),
                None => Err(FixtureError::NotScheduled {
                    name: name.to_string(),
                }),
            };
        };

        let outcome = slot.get_or_init(|| {
            let built = self.construct(name, registry);
            if built.is_ok() {
                self.order
                    .lock()
                    .unwrap_or_else(std::sync::PoisonError::into_inner)
                    .push(name.to_string());
            }
            built.map_err(|err| err.to_string())
        });

        match outcome {
            Ok(value) => Ok(Arc::clone(value)),
            Err(message) => Err(FixtureError::Setup {
                name: name.to_string(),
                message: message.clone(),
            }),
        }
    }

    fn construct(&self, name: &str, registry: &FixtureRegistry) -> FixtureResult<FixtureValue> {
        let Some(fixture) = registry.get(name) else {
            return Err(FixtureError::NotScheduled {
                name: name.to_string(),
            });
        };

        let mut values = IndexMap::new();
        for dependency in &fixture.dependencies {
            values.insert(dependency.clone(), self.get(dependency, registry)?);
        }
        let args = FixtureArgs::new(values);

        let factory = fixture.factory();
        match catch_unwind(AssertUnwindSafe(|| factory(&args))) {
            Ok(Ok(value)) => Ok(value),
            Ok(Err(err)) => Err(FixtureError::Setup {
                name: name.to_string(),
                message: err.to_string(),
            }),
            Err(panic) => Err(FixtureError::Setup {
                name: name.to_string(),
                message: panic_message(&panic),
            }),
        }
    }

    /// Eagerly build every fixture this store owns.
    ///
    /// # Errors
    ///
    /// Stops at the first failing build and returns its error.
    pub fn build_all(&self, registry: &FixtureRegistry) -> FixtureResult<()> {
        for name in self.slots.keys() {
            self.get(name, registry)?;
        }
        Ok(())
    }

    /// Names of the fixtures built so far, in construction order
    #[must_use]
    pub fn built_names(&self) -> Vec<String> {
        self.order
            .lock()
            .unwrap_or_else(std::sync::PoisonError::into_inner)
            .clone()
    }

    /// Tear down every built fixture in reverse construction order.
    ///
    /// A failing teardown never stops the others; all failures are
    /// collected and returned.
    #[must_use]
    pub fn teardown(&self, registry: &FixtureRegistry) -> Vec<FixtureError> {
        let order = self.built_names();
        let mut failures = Vec::new();

        for name in order.iter().rev() {
            let Some(Some(Ok(value))) = self.slots.get(name).map(OnceCell::get) else {
                continue;
            };
            let Some(teardown) = registry.get(name).and_then(|f| f.teardown()) else {
                continue;
            };
            match catch_unwind(AssertUnwindSafe(|| teardown(value))) {
                Ok(Ok(())) => {}
                Ok(Err(err)) => {
                    tracing::error!(fixture = %name, error = %err, "fixture teardown failed");
                    failures.push(FixtureError::Teardown {
                        name: name.clone(),
                        message: err.to_string(),
                    });
                }
                Err(panic) => {
                    let message = panic_message(&panic);
                    tracing::error!(fixture = %name, error = %message, "fixture teardown panicked");
                    failures.push(FixtureError::Teardown {
                        name: name.clone(),
                        message,
                    });
                }
            }
        }
        failures
    }
}

impl std::fmt::Debug for FixtureStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("FixtureStore")
            .field("scope", &self.scope)
            .field("slots", &self.slots.keys().collect::<Vec<_>>())
            .field("chained", &self.parent.is_some())
            .finish()
    }
}

fn panic_message(panic: &(dyn std::any::Any + Send)) -> String {
    if let Some(message) = panic.downcast_ref::<&str>() {
        (*message).to_string()
    } else if let Some(message) = panic.downcast_ref::<String>() {
        message.clone()
    } else {
        "unhandled panic".to_string()
    }
}

#[cfg(test)]
mod tests {
    use std::sync::atomic::{AtomicUsize, Ordering};

    use super::*;
    use crate::fixture::Fixture;

    fn names(list: &[&str]) -> IndexSet<String> {
        list.iter().map(|n| (*n).to_string()).collect()
    }

    #[test]
    fn test_value_built_once_and_cached() {
        static CALLS: AtomicUsize = AtomicUsize::new(0);

        let mut registry = FixtureRegistry::new();
        registry
            .register(
                Fixture::new("counter", Scope::Session, |_| {
                    CALLS.fetch_add(1, Ordering::SeqCst);
                    Ok(Arc::new(7u32) as FixtureValue)
                })
                .unwrap(),
            )
            .unwrap();

        let store = FixtureStore::root(Scope::Session, &names(&["counter"]));
        let first = store.get("counter", &registry).unwrap();
        let second = store.get("counter", &registry).unwrap();

        assert_eq!(CALLS.load(Ordering::SeqCst), 1);
        assert!(Arc::ptr_eq(&first, &second));
    }

    #[test]
    fn test_failed_build_is_cached() {
        static CALLS: AtomicUsize = AtomicUsize::new(0);

        let mut registry = FixtureRegistry::new();
        registry
            .register(
                Fixture::new("flaky", Scope::Test, |_| {
                    CALLS.fetch_add(1, Ordering::SeqCst);
                    anyhow::bail!("backend down")
                })
                .unwrap(),
            )
            .unwrap();

        let store = FixtureStore::root(Scope::Test, &names(&["flaky"]));
        assert!(matches!(
            store.get("flaky", &registry),
            Err(FixtureError::Setup { .. })
        ));
        assert!(matches!(
            store.get("flaky", &registry),
            Err(FixtureError::Setup { .. })
        ));
        assert_eq!(CALLS.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn test_panicking_factory_reports_setup_error() {
        let mut registry = FixtureRegistry::new();
        registry
            .register(
                Fixture::new("boom", Scope::Test, |_| panic!("exploded"))
                    .unwrap(),
            )
            .unwrap();

        let store = FixtureStore::root(Scope::Test, &names(&["boom"]));
        match store.get("boom", &registry) {
            Err(FixtureError::Setup { message, .. }) => assert_eq!(message, "exploded"),
            other => panic!("expected setup error, got {other:?}"),
        }
    }

    #[test]
    fn test_chain_resolves_in_parent() {
        let mut registry = FixtureRegistry::new();
        registry
            .register(
                Fixture::new("db", Scope::Session, |_| {
                    Ok(Arc::new("db".to_string()) as FixtureValue)
                })
                .unwrap(),
            )
            .unwrap();
        registry
            .register(
                Fixture::new("conn", Scope::Test, |args| {
                    let db = args.get_as::<String>("db").unwrap();
                    Ok(Arc::new(format!("{db}/conn")) as FixtureValue)
                })
                .unwrap()
                .with_dependencies(&["db"]),
            )
            .unwrap();

        let session = Arc::new(FixtureStore::root(Scope::Session, &names(&["db"])));
        let test = FixtureStore::child(Arc::clone(&session), Scope::Test, &names(&["conn"]));

        let conn = test.get("conn", &registry).unwrap();
        let conn = verdict_core::downcast_fixture::<String>(&conn).unwrap();
        assert_eq!(*conn, "db/conn");

        // dependency was cached at its own scope, not the child's
        assert_eq!(session.built_names(), vec!["db"]);
        assert_eq!(test.built_names(), vec!["conn"]);
    }

    #[test]
    fn test_unscheduled_fixture_rejected() {
        let registry = FixtureRegistry::new();
        let store = FixtureStore::root(Scope::Test, &names(&[]));
        assert!(matches!(
            store.get("ghost", &registry),
            Err(FixtureError::NotScheduled { .. })
        ));
    }

    #[test]
    fn test_teardown_reverse_order_collects_failures() {
        let log: Arc<Mutex<Vec<String>>> = Arc::new(Mutex::new(Vec::new()));

        let mut registry = FixtureRegistry::new();
        for name in ["first", "second", "third"] {
            let log_teardown = Arc::clone(&log);
            let owned = name.to_string();
            registry
                .register(
                    Fixture::new(name, Scope::Suite, |_| Ok(Arc::new(()) as FixtureValue))
                        .unwrap()
                        .with_teardown(move |_| {
                            log_teardown.lock().unwrap().push(owned.clone());
                            if owned == "second" {
                                anyhow::bail!("cleanup failed")
                            }
                            Ok(())
                        }),
                )
                .unwrap();
        }

        let store = FixtureStore::root(Scope::Suite, &names(&["first", "second", "third"]));
        store.get("first", &registry).unwrap();
        store.get("second", &registry).unwrap();
        store.get("third", &registry).unwrap();

        let failures = store.teardown(&registry);
        assert_eq!(failures.len(), 1);
        assert!(matches!(
            failures[0],
            FixtureError::Teardown { ref name, .. } if name == "second"
        ));
        assert_eq!(*log.lock().unwrap(), vec!["third", "second", "first"]);
    }
}
