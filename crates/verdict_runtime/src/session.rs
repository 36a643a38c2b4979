//! Session scheduler.
//!
//! Drives a validated suite forest through its lifecycle: pre-run and
//! session fixtures, per-suite setup/teardown, test bodies, and the event
//! stream every listener observes. Configuration problems surface as
//! [`RunError`]; anything that happens once the session is underway
//! degrades to report data.

use std::panic::{AssertUnwindSafe, catch_unwind};
use std::sync::Arc;

use indexmap::{IndexMap, IndexSet};
use verdict_core::{FixtureValue, Location, LogLevel, NodePath, RunCapability};
use verdict_events::{Event, EventBus, EventKind, Listener, SuiteInfo, TestInfo};
use verdict_fixture::{FixtureError, FixtureRegistry, FixtureStore, Scope};
use verdict_model::{BodyContext, Hook, SuiteDescriptor, TestDescriptor, forest_fixtures};
use verdict_report::ReportBuilder;

use crate::config::{RunConfig, RunError};
use crate::context::TestContext;
use crate::pool::{PoolTask, run_tasks};

const SKIP_SESSION_SETUP: &str = "session setup failed";
const SKIP_SUITE_SETUP: &str = "suite setup failed";
const SKIP_RUN_STOPPED: &str = "tests execution stopped";

/// Execute a suite forest and return whether every enabled test passed.
///
/// The forest and registry are validated up front; validation problems and
/// pre-run fixture failures are the only error returns. Test failures,
/// aborts, panics and teardown errors land in the report instead.
///
/// # Errors
///
/// Returns [`RunError`] for an invalid thread count, a missing parallelism
/// capability, registry/suite validation failures, or a pre-run fixture
/// that could not be built.
pub fn run(
    suites: &[SuiteDescriptor],
    registry: &FixtureRegistry,
    listeners: Vec<Box<dyn Listener>>,
    config: &RunConfig,
) -> Result<bool, RunError> {
    if config.nb_threads == 0 {
        return Err(RunError::InvalidThreadCount { nb_threads: 0 });
    }
    let parallel = config.nb_threads > 1;
    if parallel && !config.capabilities.allows(RunCapability::Parallelism) {
        return Err(RunError::MissingCapability {
            capability: RunCapability::Parallelism,
        });
    }
    registry.validate()?;
    registry.check_against_suites(suites)?;
    std::fs::create_dir_all(&config.report_dir).map_err(|source| RunError::ReportDir {
        path: config.report_dir.clone(),
        source,
    })?;

    let builder = ReportBuilder::new();
    let report = builder.report();
    let mut all_listeners: Vec<Box<dyn Listener>> = vec![Box::new(builder)];
    all_listeners.extend(listeners);
    let bus = if parallel {
        EventBus::aggregated(all_listeners)
    } else {
        EventBus::inline(all_listeners)
    };

    let used = forest_fixtures(suites);
    let closure = registry.dependency_closure(used.iter().map(String::as_str), "suites")?;

    // pre-run fixtures live outside any reported node; their failures are
    // configuration-grade
    let pre_run = Arc::new(FixtureStore::root(
        Scope::PreRun,
        &registry.scheduled_for(&closure, Scope::PreRun),
    ));
    if let Err(err) = pre_run.build_all(registry) {
        for failure in pre_run.teardown(registry) {
            tracing::error!(error = %failure, "pre-run fixture teardown failed");
        }
        let _ = bus.finish();
        return Err(pre_run_error(err));
    }

    bus.fire(Event::now(EventKind::SessionStart));

    let session_names = registry.scheduled_for(&closure, Scope::Session);
    let session_store = Arc::new(FixtureStore::child(
        Arc::clone(&pre_run),
        Scope::Session,
        &session_names,
    ));
    let mut session_setup_ok = true;
    if !session_names.is_empty() {
        bus.fire(Event::now(EventKind::SessionSetupStart));
        if let Err(err) = session_store.build_all(registry) {
            bus.fire(Event::now(EventKind::Log {
                location: Location::SessionSetup,
                level: LogLevel::Error,
                message: err.to_string(),
            }));
            session_setup_ok = false;
        }
        bus.fire(Event::now(EventKind::SessionSetupEnd));
    }

    let runner = Runner {
        registry,
        bus: &bus,
        config,
    };
    let skip_all = (!session_setup_ok).then_some(SKIP_SESSION_SETUP);

    if parallel {
        let tasks: Vec<PoolTask<'_>> = suites
            .iter()
            .map(|suite| {
                let runner = &runner;
                let session_store = Arc::clone(&session_store);
                Box::new(move |stopped: bool| {
                    let skip = skip_all.or(stopped.then_some(SKIP_RUN_STOPPED));
                    runner.run_suite(suite, None, &session_store, skip, false)
                }) as PoolTask<'_>
            })
            .collect();
        run_tasks(tasks, config.nb_threads, config.stop_on_failure);
    } else {
        let mut stopped = false;
        for suite in suites {
            let skip = skip_all.or(stopped.then_some(SKIP_RUN_STOPPED));
            let ok = runner.run_suite(suite, None, &session_store, skip, false);
            if !ok && config.stop_on_failure {
                stopped = true;
            }
        }
    }

    if !session_store.built_names().is_empty() {
        bus.fire(Event::now(EventKind::SessionTeardownStart));
        for failure in session_store.teardown(registry) {
            bus.fire(Event::now(EventKind::Log {
                location: Location::SessionTeardown,
                level: LogLevel::Error,
                message: failure.to_string(),
            }));
        }
        bus.fire(Event::now(EventKind::SessionTeardownEnd));
    }
    for failure in pre_run.teardown(registry) {
        tracing::error!(error = %failure, "pre-run fixture teardown failed");
    }

    bus.fire(Event::now(EventKind::SessionEnd));
    drop(bus.finish());

    let success = report
        .lock()
        .unwrap_or_else(std::sync::PoisonError::into_inner)
        .is_successful();
    Ok(success)
}

fn pre_run_error(err: FixtureError) -> RunError {
    match &err {
        FixtureError::Setup { name, .. } | FixtureError::NotScheduled { name } => {
            RunError::PreRunFixture {
                name: name.clone(),
                error: err.clone(),
            }
        }
        _ => RunError::Fixture(err),
    }
}

struct Runner<'a> {
    registry: &'a FixtureRegistry,
    bus: &'a EventBus,
    config: &'a RunConfig,
}

impl Runner<'_> {
    // Returns false when this subtree produced a new failure.
    fn run_suite(
        &self,
        suite: &SuiteDescriptor,
        parent: Option<&NodePath>,
        parent_store: &Arc<FixtureStore>,
        skip: Option<&'static str>,
        parent_disabled: bool,
    ) -> bool {
        let path = match parent {
            Some(parent) => parent.child(&suite.name),
            None => NodePath::root(&suite.name),
        };
        let disabled = parent_disabled || suite.disabled;
        self.bus.fire(Event::now(EventKind::SuiteStart {
            suite: suite_info(suite, &path),
        }));

        if let Some(reason) = skip {
            for test in &suite.tests {
                self.bypass_test(test, &path, Some(reason), disabled);
            }
            for sub_suite in &suite.suites {
                self.run_suite(sub_suite, Some(&path), parent_store, Some(reason), disabled);
            }
            self.bus
                .fire(Event::now(EventKind::SuiteEnd { path }));
            return true;
        }

        let local = match self
            .registry
            .dependency_closure(suite.local_fixtures().iter().map(String::as_str), &suite.name)
        {
            Ok(closure) => closure,
            Err(err) => {
                // ruled out by the pre-flight check
                tracing::error!(error = %err, suite = %path, "fixture closure failed");
                IndexSet::new()
            }
        };
        let owned: IndexSet<String> = self
            .registry
            .scheduled_for(&local, Scope::Suite)
            .into_iter()
            .filter(|name| !parent_store.chain_owns(name))
            .collect();
        let store = Arc::new(FixtureStore::child(
            Arc::clone(parent_store),
            Scope::Suite,
            &owned,
        ));

        let mut setup_ok = true;
        if suite.setup.is_some() || !owned.is_empty() {
            self.bus
                .fire(Event::now(EventKind::SuiteSetupStart { path: path.clone() }));
            if let Err(err) = store.build_all(self.registry) {
                self.bus.fire(Event::now(EventKind::Log {
                    location: Location::SuiteSetup(path.clone()),
                    level: LogLevel::Error,
                    message: err.to_string(),
                }));
                setup_ok = false;
            }
            if setup_ok {
                if let Some(hook) = &suite.setup {
                    setup_ok = self.run_hook(hook, Location::SuiteSetup(path.clone()), &store);
                }
            }
            self.bus
                .fire(Event::now(EventKind::SuiteSetupEnd { path: path.clone() }));
        }

        let mut all_ok = setup_ok;
        let child_skip = (!setup_ok).then_some(SKIP_SUITE_SETUP);
        for test in &suite.tests {
            all_ok &= self.run_test(test, &path, &store, child_skip, disabled);
        }
        for sub_suite in &suite.suites {
            all_ok &= self.run_suite(sub_suite, Some(&path), &store, child_skip, disabled);
        }

        // teardown is always attempted, even after a failed setup
        if suite.teardown.is_some() || !store.built_names().is_empty() {
            self.bus.fire(Event::now(EventKind::SuiteTeardownStart {
                path: path.clone(),
            }));
            if let Some(hook) = &suite.teardown {
                all_ok &= self.run_hook(hook, Location::SuiteTeardown(path.clone()), &store);
            }
            for failure in store.teardown(self.registry) {
                self.bus.fire(Event::now(EventKind::Log {
                    location: Location::SuiteTeardown(path.clone()),
                    level: LogLevel::Error,
                    message: failure.to_string(),
                }));
                all_ok = false;
            }
            self.bus.fire(Event::now(EventKind::SuiteTeardownEnd {
                path: path.clone(),
            }));
        }

        self.bus.fire(Event::now(EventKind::SuiteEnd { path }));
        all_ok
    }

    fn run_test(
        &self,
        test: &TestDescriptor,
        suite_path: &NodePath,
        store: &Arc<FixtureStore>,
        skip: Option<&'static str>,
        parent_disabled: bool,
    ) -> bool {
        let path = suite_path.child(&test.name);
        if self.bypass_if_needed(test, &path, skip, parent_disabled) {
            return true;
        }

        let closure = match self
            .registry
            .dependency_closure(test.fixtures.iter().map(String::as_str), &test.name)
        {
            Ok(closure) => closure,
            Err(err) => {
                tracing::error!(error = %err, test = %path, "fixture closure failed");
                IndexSet::new()
            }
        };
        let test_store = FixtureStore::child(
            Arc::clone(store),
            Scope::Test,
            &self.registry.scheduled_for(&closure, Scope::Test),
        );

        self.bus.fire(Event::now(EventKind::TestStart {
            test: test_info(test, &path),
        }));
        let location = Location::Test(path.clone());

        let mut success = match self.resolve(&test.fixtures, &test_store) {
            Ok(fixtures) => {
                let mut ctx = TestContext::new(location.clone(), self.bus, fixtures);
                let body = test.body();
                match catch_unwind(AssertUnwindSafe(|| body(&mut ctx))) {
                    Ok(Ok(())) => {}
                    Ok(Err(abort)) => ctx.log(LogLevel::Error, &abort.to_string()),
                    Err(panic) => {
                        ctx.log(
                            LogLevel::Error,
                            &format!("unhandled error: {}", panic_message(&panic)),
                        );
                    }
                }
                !ctx.has_failed()
            }
            Err(err) => {
                self.bus.fire(Event::now(EventKind::Log {
                    location: location.clone(),
                    level: LogLevel::Error,
                    message: err.to_string(),
                }));
                false
            }
        };

        for failure in test_store.teardown(self.registry) {
            self.bus.fire(Event::now(EventKind::Log {
                location: location.clone(),
                level: LogLevel::Error,
                message: failure.to_string(),
            }));
            success = false;
        }

        self.bus.fire(Event::now(EventKind::TestEnd { path }));
        success
    }

    fn run_hook(&self, hook: &Hook, location: Location, store: &Arc<FixtureStore>) -> bool {
        match self.resolve(&hook.fixtures, store) {
            Ok(fixtures) => {
                let mut ctx = TestContext::new(location, self.bus, fixtures);
                let body = hook.body();
                match catch_unwind(AssertUnwindSafe(|| body(&mut ctx))) {
                    Ok(Ok(())) => {}
                    Ok(Err(abort)) => ctx.log(LogLevel::Error, &abort.to_string()),
                    Err(panic) => {
                        ctx.log(
                            LogLevel::Error,
                            &format!("unhandled error: {}", panic_message(&panic)),
                        );
                    }
                }
                !ctx.has_failed()
            }
            Err(err) => {
                self.bus.fire(Event::now(EventKind::Log {
                    location,
                    level: LogLevel::Error,
                    message: err.to_string(),
                }));
                false
            }
        }
    }

    fn resolve(
        &self,
        names: &[String],
        store: &FixtureStore,
    ) -> Result<IndexMap<String, FixtureValue>, FixtureError> {
        let mut fixtures = IndexMap::new();
        for name in names {
            fixtures.insert(name.clone(), store.get(name, self.registry)?);
        }
        Ok(fixtures)
    }

    // Returns true when the test was bypassed.
    fn bypass_if_needed(
        &self,
        test: &TestDescriptor,
        path: &NodePath,
        skip: Option<&'static str>,
        parent_disabled: bool,
    ) -> bool {
        let disabled = (test.disabled || parent_disabled) && !self.config.force_disabled;
        if disabled {
            self.bus.fire(Event::now(EventKind::TestDisabled {
                test: test_info(test, path),
            }));
            return true;
        }
        if let Some(reason) = skip {
            self.bus.fire(Event::now(EventKind::TestSkipped {
                test: test_info(test, path),
                reason: reason.to_string(),
            }));
            return true;
        }
        false
    }

    fn bypass_test(
        &self,
        test: &TestDescriptor,
        suite_path: &NodePath,
        skip: Option<&'static str>,
        parent_disabled: bool,
    ) {
        let path = suite_path.child(&test.name);
        self.bypass_if_needed(test, &path, skip, parent_disabled);
    }
}

fn suite_info(suite: &SuiteDescriptor, path: &NodePath) -> SuiteInfo {
    SuiteInfo {
        path: path.clone(),
        name: suite.name.clone(),
        description: suite.description.clone(),
        metadata: suite.metadata.clone(),
    }
}

fn test_info(test: &TestDescriptor, path: &NodePath) -> TestInfo {
    TestInfo {
        path: path.clone(),
        name: test.name.clone(),
        description: test.description.clone(),
        metadata: test.metadata.clone(),
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
