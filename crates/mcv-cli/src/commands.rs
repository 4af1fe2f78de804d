//! Subcommand bodies, kept out of `main` so they can be tested

use crate::source::FileWorkload;
use anyhow::Context;
use mcv_convergence::{ConvergenceChecker, ConvergenceReport, Workload};
use mcv_core::McvConfig;
use mcv_retry::RetryPolicy;
use mcv_structpath::{Assertion, PathExpression, Snapshot};
use std::path::Path;
use std::sync::Arc;
use std::time::Duration;

/// Matches of `expr` in the dump at `path`, as JSON values
///
/// # Errors
/// Fails if the expression does not parse or the file cannot be loaded
pub fn query(expr: &str, path: &Path) -> anyhow::Result<Vec<serde_json::Value>> {
    let expression = PathExpression::parse(expr).context("invalid query expression")?;
    let snapshot = FileWorkload::new(path).load()?;
    matches(&expression, &snapshot)
}

fn matches(
    expression: &PathExpression,
    snapshot: &Snapshot,
) -> anyhow::Result<Vec<serde_json::Value>> {
    expression
        .evaluate(snapshot)
        .into_iter()
        .map(|found| serde_json::to_value(found).context("failed to render match"))
        .collect()
}

/// Build assertions from `--exists` and `--absent` expressions
///
/// # Errors
/// Fails naming the first expression that does not parse
pub fn assertions(exists: &[String], absent: &[String]) -> anyhow::Result<Vec<Assertion>> {
    let present = exists.iter().map(|expr| {
        Assertion::exists(expr).with_context(|| format!("invalid --exists expression `{expr}`"))
    });
    let missing = absent.iter().map(|expr| {
        Assertion::not_exists(expr).with_context(|| format!("invalid --absent expression `{expr}`"))
    });
    present.chain(missing).collect()
}

/// Retry policy from optional config plus command-line overrides
///
/// # Errors
/// Fails if the config file cannot be loaded
pub fn policy(
    config: Option<&Path>,
    timeout_ms: Option<u64>,
    interval_ms: Option<u64>,
) -> anyhow::Result<RetryPolicy> {
    let mut policy = match config {
        Some(path) => McvConfig::from_file(path)?.retry,
        None => RetryPolicy::default(),
    };
    if let Some(ms) = timeout_ms {
        policy = policy.with_timeout(Duration::from_millis(ms));
    }
    if let Some(ms) = interval_ms {
        policy = policy.with_delay(Duration::from_millis(ms));
    }
    Ok(policy)
}

/// Poll the dump at `path` until every assertion holds
///
/// # Errors
/// Fails with the convergence error once the policy runs out or the
/// checker's token is cancelled
pub async fn assert(
    checker: &ConvergenceChecker,
    path: &Path,
    assertions: &[Assertion],
    policy: &RetryPolicy,
) -> anyhow::Result<ConvergenceReport> {
    let workload: Arc<dyn Workload> = Arc::new(FileWorkload::new(path));
    let report = checker.wait_for_route(&[workload], assertions, policy).await?;
    Ok(report)
}
