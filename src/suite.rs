//! Explicitly registered test cases and the runner that drives them
//! against a loaded environment.

use std::time::Instant;

use anyhow::{bail, ensure, Result};
use serde::Serialize;
use tracing::{debug, info, warn};

use crate::environment::Environment;
use crate::session::TestSession;

/// Body of a test case.
pub type CaseFn = fn(&Environment) -> Result<()>;

/// A named test case.
#[derive(Clone, Copy)]
pub struct TestCase {
    pub name: &'static str,
    pub run: CaseFn,
}

impl std::fmt::Debug for TestCase {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TestCase").field("name", &self.name).finish()
    }
}

/// Ordered list of test cases, in registration order.
#[derive(Debug, Default, Clone)]
pub struct CaseRegistry {
    cases: Vec<TestCase>,
}

impl CaseRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a case. Names must be unique within the registry.
    pub fn register(&mut self, name: &'static str, run: CaseFn) -> Result<()> {
        if self.cases.iter().any(|c| c.name == name) {
            bail!("Test case {:?} is already registered", name);
        }
        self.cases.push(TestCase { name, run });
        Ok(())
    }

    /// Register every case from `cases`, stopping at the first duplicate.
    pub fn extend<I>(&mut self, cases: I) -> Result<()>
    where
        I: IntoIterator<Item = TestCase>,
    {
        for case in cases {
            self.register(case.name, case.run)?;
        }
        Ok(())
    }

    pub fn cases(&self) -> &[TestCase] {
        &self.cases
    }

    pub fn len(&self) -> usize {
        self.cases.len()
    }

    pub fn is_empty(&self) -> bool {
        self.cases.is_empty()
    }
}

/// A case paired with the environment it runs against.
#[derive(Debug, Clone)]
pub struct BoundCase {
    case: TestCase,
    environment: Environment,
}

impl BoundCase {
    pub fn name(&self) -> &'static str {
        self.case.name
    }

    pub fn run(&self) -> CaseOutcome {
        let started = Instant::now();
        let result = (self.case.run)(&self.environment);
        let duration_ms = started.elapsed().as_millis() as u64;

        match result {
            Ok(()) => {
                debug!("Case {} passed in {}ms", self.case.name, duration_ms);
                CaseOutcome {
                    name: self.case.name.to_string(),
                    passed: true,
                    message: None,
                    duration_ms,
                }
            }
            Err(e) => {
                warn!("Case {} failed: {:#}", self.case.name, e);
                CaseOutcome {
                    name: self.case.name.to_string(),
                    passed: false,
                    message: Some(format!("{:#}", e)),
                    duration_ms,
                }
            }
        }
    }
}

/// Pair every registered case with `environment`.
pub fn bind(registry: &CaseRegistry, environment: &Environment) -> Vec<BoundCase> {
    registry
        .cases()
        .iter()
        .map(|case| BoundCase {
            case: *case,
            environment: environment.clone(),
        })
        .collect()
}

/// Result of a single case
#[derive(Debug, Clone, Serialize)]
pub struct CaseOutcome {
    pub name: String,
    pub passed: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
    pub duration_ms: u64,
}

/// Result of a whole suite run
#[derive(Debug, Clone, Serialize)]
pub struct SuiteReport {
    pub environment: Environment,
    pub outcomes: Vec<CaseOutcome>,
    pub passed: usize,
    pub failed: usize,
}

impl SuiteReport {
    pub fn all_passed(&self) -> bool {
        self.failed == 0
    }
}

/// Wait for the session's environment, then run every registered case.
///
/// Fails only if the environment never arrives; case failures are recorded
/// in the report.
pub fn run_suite(session: &TestSession, registry: &CaseRegistry) -> Result<SuiteReport> {
    let environment = session.environment()?;
    let bound = bind(registry, &environment);
    info!(
        "Running {} cases against environment {}",
        bound.len(),
        environment.name
    );

    let outcomes: Vec<CaseOutcome> = bound.iter().map(BoundCase::run).collect();
    let passed = outcomes.iter().filter(|o| o.passed).count();
    let failed = outcomes.len() - passed;

    if failed > 0 {
        warn!("{} of {} cases failed", failed, outcomes.len());
    } else {
        info!("✅ All {} cases passed", passed);
    }

    Ok(SuiteReport {
        environment,
        outcomes,
        passed,
        failed,
    })
}

/// Smoke checks every loaded environment should satisfy.
pub fn builtin_cases() -> CaseRegistry {
    CaseRegistry {
        cases: vec![
            TestCase {
                name: "environment_has_name",
                run: environment_has_name,
            },
            TestCase {
                name: "environment_has_id",
                run: environment_has_id,
            },
            TestCase {
                name: "environment_loaded_in_past",
                run: environment_loaded_in_past,
            },
        ],
    }
}

fn environment_has_name(env: &Environment) -> Result<()> {
    ensure!(!env.name.trim().is_empty(), "environment name is empty");
    Ok(())
}

fn environment_has_id(env: &Environment) -> Result<()> {
    ensure!(!env.id.is_nil(), "environment id is nil");
    Ok(())
}

fn environment_loaded_in_past(env: &Environment) -> Result<()> {
    let now = chrono::Utc::now();
    ensure!(
        env.loaded_at <= now,
        "environment load time {} is after {}",
        env.loaded_at,
        now
    );
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::SessionConfig;

    fn always_fails(_: &Environment) -> Result<()> {
        bail!("boom")
    }

    fn always_passes(_: &Environment) -> Result<()> {
        Ok(())
    }

    #[test]
    fn test_registry_rejects_duplicates() {
        let mut registry = CaseRegistry::new();
        registry.register("a", always_passes).unwrap();
        assert!(registry.register("a", always_fails).is_err());
        assert_eq!(registry.len(), 1);
    }

    #[test]
    fn test_registry_keeps_order() {
        let mut registry = CaseRegistry::new();
        registry.register("first", always_passes).unwrap();
        registry.register("second", always_fails).unwrap();

        let names: Vec<_> = registry.cases().iter().map(|c| c.name).collect();
        assert_eq!(names, vec!["first", "second"]);
    }

    #[test]
    fn test_bind_pairs_every_case_with_environment() {
        let registry = builtin_cases();
        let env = Environment::new("env-42");
        let bound = bind(&registry, &env);

        assert_eq!(bound.len(), registry.len());
        assert!(bound.iter().all(|b| b.environment == env));
        assert_eq!(bound[0].name(), "environment_has_name");
    }

    #[test]
    fn test_bound_case_records_failure_message() {
        let mut registry = CaseRegistry::new();
        registry.register("fails", always_fails).unwrap();
        let outcome = bind(&registry, &Environment::new("env"))[0].run();

        assert!(!outcome.passed);
        assert_eq!(outcome.message.as_deref(), Some("boom"));
    }

    #[test]
    fn test_builtin_case_names_are_unique() {
        let builtin = builtin_cases();
        assert_eq!(builtin.len(), 3);

        // Re-registering through the checked path accepts every builtin.
        let mut registry = CaseRegistry::new();
        registry.extend(builtin.cases().iter().copied()).unwrap();
        assert_eq!(registry.len(), builtin.len());
        assert!(registry.extend(builtin.cases().iter().copied()).is_err());
    }

    #[test]
    fn test_builtin_cases_fail_on_blank_name() {
        let env = Environment::new("  ");
        assert!(environment_has_name(&env).is_err());
        assert!(environment_has_id(&env).is_ok());
    }

    #[test]
    fn test_run_suite_against_session() {
        let mut session = TestSession::new(
            SessionConfig::default().with_overrides(Some(2_000), Some(10)),
        );
        session.start().unwrap();

        let mut registry = builtin_cases();
        registry.register("fails", always_fails).unwrap();

        let report = run_suite(&session, &registry).unwrap();
        assert_eq!(report.environment.name, "env-42");
        assert_eq!(report.passed, 3);
        assert_eq!(report.failed, 1);
        assert!(!report.all_passed());

        let json = serde_json::to_value(&report).unwrap();
        assert_eq!(json["outcomes"].as_array().unwrap().len(), 4);
        assert!(json["outcomes"][0].get("message").is_none());
    }

    #[test]
    fn test_run_suite_fails_without_environment() {
        let session = TestSession::new(
            SessionConfig::default().with_overrides(Some(20), None),
        );
        assert!(run_suite(&session, &builtin_cases()).is_err());
    }
}
