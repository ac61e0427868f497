//! End-to-end tests for the orchestrator: validation, retry accounting,
//! timeouts and failure classification.

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use serde_json::{json, Map, Value};
use tokio_test::{assert_err, assert_ok};
use tool_orchestrator::{
    ClassifiedError, EchoExecutor, ErrorKind, ExecutionOptions, Orchestrator,
    OrchestratorConfig, Tool, ToolExecutor,
};

/// Executor that fails a fixed number of times, then echoes its input
struct ScriptedExecutor {
    failures: usize,
    calls: Arc<AtomicUsize>,
}

#[async_trait]
impl ToolExecutor for ScriptedExecutor {
    async fn invoke(&self, tool: &Tool, input: &Value) -> Result<Value, String> {
        let call = self.calls.fetch_add(1, Ordering::SeqCst);
        if call < self.failures {
            return Err(format!("attempt {} failed", call + 1));
        }
        Ok(json!({"executed": true, "tool": tool.name(), "input": input}))
    }
}

/// Executor that sleeps on its first `slow_calls` invocations
struct SlowExecutor {
    slow_calls: usize,
    delay: Duration,
    calls: Arc<AtomicUsize>,
}

#[async_trait]
impl ToolExecutor for SlowExecutor {
    async fn invoke(&self, _tool: &Tool, _input: &Value) -> Result<Value, String> {
        let call = self.calls.fetch_add(1, Ordering::SeqCst);
        if call < self.slow_calls {
            tokio::time::sleep(self.delay).await;
        }
        Ok(json!({"call": call + 1}))
    }
}

struct PanickingExecutor {
    calls: Arc<AtomicUsize>,
}

#[async_trait]
impl ToolExecutor for PanickingExecutor {
    async fn invoke(&self, _tool: &Tool, _input: &Value) -> Result<Value, String> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        panic!("handler exploded");
    }
}

fn scripted(failures: usize) -> (Orchestrator, Arc<AtomicUsize>) {
    let calls = Arc::new(AtomicUsize::new(0));
    let executor = ScriptedExecutor {
        failures,
        calls: calls.clone(),
    };
    (Orchestrator::new(Box::new(executor)), calls)
}

fn echo_spec() -> Value {
    json!({"name": "echo", "description": "Echo", "input_schema": {}})
}

#[tokio::test]
async fn test_echo_end_to_end() {
    let orchestrator = Orchestrator::new(Box::new(EchoExecutor));

    let result = assert_ok!(
        orchestrator
            .execute(&echo_spec(), &json!({"message": "hi"}), None)
            .await
    );

    assert_eq!(
        result,
        json!({"executed": true, "tool": "echo", "input": {"message": "hi"}})
    );
}

#[tokio::test]
async fn test_missing_fields_is_invalid() {
    let orchestrator = Orchestrator::default();

    let err = assert_err!(orchestrator.execute(&json!({"name": "test"}), &json!({}), None).await);

    assert_eq!(err.kind(), ErrorKind::Invalid);
}

#[tokio::test]
async fn test_non_map_input_is_invalid() {
    let orchestrator = Orchestrator::default();

    let err = assert_err!(
        orchestrator
            .execute(&echo_spec(), &json!("not-a-map"), None)
            .await
    );

    assert_eq!(err.kind(), ErrorKind::Invalid);
    assert!(err.to_string().contains("input must be a map"));
    assert!(matches!(
        err,
        ClassifiedError::InvalidInput { field: Some(ref f), value: Some(ref v), .. }
            if f == "input" && v == "not-a-map"
    ));
}

#[tokio::test]
async fn test_retry_accounting() {
    for failures in 0..4usize {
        for retry in 0..4u32 {
            let (orchestrator, calls) = scripted(failures);
            let options = ExecutionOptions::new().with_retry(retry);

            let result = orchestrator
                .execute(&echo_spec(), &json!({}), Some(options))
                .await;

            let expect_success = retry as usize >= failures;
            assert_eq!(
                result.is_ok(),
                expect_success,
                "failures={} retry={}",
                failures,
                retry
            );
            assert_eq!(
                calls.load(Ordering::SeqCst),
                failures.min(retry as usize) + 1,
                "failures={} retry={}",
                failures,
                retry
            );
        }
    }
}

#[tokio::test]
async fn test_exhausted_retries_classified_as_execution() {
    let (orchestrator, _calls) = scripted(10);
    let options = ExecutionOptions::new().with_retry(2);

    let err = assert_err!(
        orchestrator
            .execute(&echo_spec(), &json!({}), Some(options))
            .await
    );

    assert_eq!(err.kind(), ErrorKind::Execution);
    assert_eq!(err.details()["tool"], "echo");
    assert_eq!(err.details()["reason"], "attempt 3 failed");
    assert!(err.message().contains("attempt 3 failed"));
}

#[tokio::test]
async fn test_invalid_spec_never_invokes_executor() {
    let (orchestrator, calls) = scripted(0);
    let options = ExecutionOptions::new().with_retry(5);

    let err = assert_err!(
        orchestrator
            .execute(&json!({"name": "broken"}), &json!({}), Some(options))
            .await
    );

    assert_eq!(err.kind(), ErrorKind::Invalid);
    assert_eq!(calls.load(Ordering::SeqCst), 0);
}

#[tokio::test]
async fn test_invalid_input_never_invokes_executor() {
    let (orchestrator, calls) = scripted(0);
    let options = ExecutionOptions::new().with_retry(5);

    let err = assert_err!(
        orchestrator
            .execute(&echo_spec(), &json!(42), Some(options))
            .await
    );

    assert_eq!(err.kind(), ErrorKind::Invalid);
    assert_eq!(calls.load(Ordering::SeqCst), 0);
}

#[tokio::test]
async fn test_timeout_is_execution_failure() {
    let calls = Arc::new(AtomicUsize::new(0));
    let orchestrator = Orchestrator::new(Box::new(SlowExecutor {
        slow_calls: usize::MAX,
        delay: Duration::from_millis(500),
        calls: calls.clone(),
    }));
    let options = ExecutionOptions::new().with_timeout(20);

    let err = assert_err!(
        orchestrator
            .execute(&echo_spec(), &json!({}), Some(options))
            .await
    );

    assert_eq!(err.kind(), ErrorKind::Execution);
    assert_eq!(err.details()["timed_out"], true);
    assert_eq!(err.details()["timeout_ms"], 20);
    assert_eq!(calls.load(Ordering::SeqCst), 1);
}

#[tokio::test]
async fn test_timeout_is_retried() {
    let calls = Arc::new(AtomicUsize::new(0));
    let orchestrator = Orchestrator::new(Box::new(SlowExecutor {
        slow_calls: 1,
        delay: Duration::from_millis(500),
        calls: calls.clone(),
    }));
    let options = ExecutionOptions::new().with_timeout(20).with_retry(1);

    let result = assert_ok!(
        orchestrator
            .execute(&echo_spec(), &json!({}), Some(options))
            .await
    );

    assert_eq!(result, json!({"call": 2}));
    assert_eq!(calls.load(Ordering::SeqCst), 2);
}

#[tokio::test]
async fn test_tool_timeout_tightens_deadline() {
    let calls = Arc::new(AtomicUsize::new(0));
    let orchestrator = Orchestrator::new(Box::new(SlowExecutor {
        slow_calls: usize::MAX,
        delay: Duration::from_millis(500),
        calls: calls.clone(),
    }));
    let spec = json!({
        "name": "slow",
        "description": "Slow tool",
        "input_schema": {},
        "timeout": 20
    });

    let err = assert_err!(orchestrator.execute(&spec, &json!({}), None).await);

    assert_eq!(err.kind(), ErrorKind::Execution);
    assert_eq!(err.details()["timeout_ms"], 20);
}

#[tokio::test]
async fn test_timeout_not_enforced_when_disabled() {
    let calls = Arc::new(AtomicUsize::new(0));
    let orchestrator = Orchestrator::new(Box::new(SlowExecutor {
        slow_calls: usize::MAX,
        delay: Duration::from_millis(50),
        calls: calls.clone(),
    }))
    .with_config(OrchestratorConfig::new().with_enforce_timeout(false));
    let options = ExecutionOptions::new().with_timeout(1);

    let result = assert_ok!(
        orchestrator
            .execute(&echo_spec(), &json!({}), Some(options))
            .await
    );

    assert_eq!(result, json!({"call": 1}));
}

#[tokio::test]
async fn test_panic_classified_as_internal() {
    let calls = Arc::new(AtomicUsize::new(0));
    let orchestrator = Orchestrator::new(Box::new(PanickingExecutor {
        calls: calls.clone(),
    }));
    let options = ExecutionOptions::new().with_retry(3);

    let err = assert_err!(
        orchestrator
            .execute(&echo_spec(), &json!({}), Some(options))
            .await
    );

    assert_eq!(err.kind(), ErrorKind::Internal);
    assert_eq!(err.details()["tool"], "echo");
    assert_eq!(err.details()["error"], "handler exploded");
    assert_eq!(calls.load(Ordering::SeqCst), 1);
}

#[tokio::test]
async fn test_execute_with_context() {
    let (orchestrator, calls) = scripted(1);

    let mut context = Map::new();
    context.insert("request_id".to_string(), json!("req-42"));
    let options = ExecutionOptions::new()
        .with_retry(1)
        .with_context_entry("tenant", "acme");

    let result = assert_ok!(
        orchestrator
            .execute_with_context(&echo_spec(), &json!({"message": "hi"}), context, Some(options))
            .await
    );

    // Context is for correlation only and never reaches the executor
    assert_eq!(
        result,
        json!({"executed": true, "tool": "echo", "input": {"message": "hi"}})
    );
    assert_eq!(calls.load(Ordering::SeqCst), 2);
}

#[tokio::test]
async fn test_execute_with_context_validates_like_execute() {
    let orchestrator = Orchestrator::default();

    let err = assert_err!(
        orchestrator
            .execute_with_context(&echo_spec(), &json!([]), Map::new(), None)
            .await
    );

    assert_eq!(err.kind(), ErrorKind::Invalid);
}

#[tokio::test]
async fn test_options_from_raw_mapping() {
    let (orchestrator, calls) = scripted(2);
    let options = assert_ok!(ExecutionOptions::from_value(&json!({"retry": 2, "timeout": 1000})));

    assert_ok!(
        orchestrator
            .execute(&echo_spec(), &json!({}), Some(options))
            .await
    );
    assert_eq!(calls.load(Ordering::SeqCst), 3);
}

#[tokio::test]
async fn test_concurrent_calls_are_independent() {
    let orchestrator = Arc::new(Orchestrator::default());

    let handles: Vec<_> = (0..8)
        .map(|i| {
            let orchestrator = orchestrator.clone();
            tokio::spawn(async move {
                orchestrator
                    .execute(&echo_spec(), &json!({"n": i}), None)
                    .await
            })
        })
        .collect();

    for (i, handle) in handles.into_iter().enumerate() {
        let result = handle.await.unwrap().unwrap();
        assert_eq!(result["input"]["n"], i);
    }
}
