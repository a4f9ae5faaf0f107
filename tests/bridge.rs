mod common;

use common::{adder, adder_call, call, calls, exploding, ScriptedProvider};
use serde_json::json;
use std::sync::Arc;
use toolbridge::provider::gemini;
use toolbridge::{
    BridgeError, LlmResponse, ProviderAdapter, RequestOptions, Strategy, Tool, ToolBridge,
    ToolRef,
};

fn provider_bridge(provider: &Arc<ScriptedProvider>) -> ToolBridge {
    let mut bridge = ToolBridge::with_provider(provider.clone());
    bridge
        .register_tools([adder(), exploding("bad input")])
        .unwrap();
    bridge
}

fn adapter_bridge(provider: &Arc<ScriptedProvider>) -> ToolBridge {
    let adapter = ProviderAdapter::new(provider.clone(), gemini::CAPABILITIES);
    let mut bridge = ToolBridge::with_adapter(Arc::new(adapter));
    bridge
        .register_tools([adder(), exploding("bad input")])
        .unwrap();
    bridge
}

// -- Provider strategy -------------------------------------------------------

#[tokio::test]
async fn round_cap_returns_last_response() {
    let provider = Arc::new(ScriptedProvider::repeating(calls(vec![adder_call("c")])));
    let bridge = provider_bridge(&provider);

    let response = bridge
        .execute("loop", None, 1, &RequestOptions::new())
        .await
        .unwrap();

    assert_eq!(provider.call_count(), 2);
    assert!(response.has_tool_calls());
    assert!(response.truncated);
    assert_eq!(bridge.backend().strategy(), Strategy::Provider);
}

#[tokio::test]
async fn results_accumulate_across_rounds() {
    let provider = Arc::new(ScriptedProvider::new(vec![
        calls(vec![adder_call("first")]),
        calls(vec![call("explode", json!({})).with_call_id("second")]),
        LlmResponse::text("done"),
    ]));
    let bridge = provider_bridge(&provider);

    let response = bridge
        .execute("go", None, 5, &RequestOptions::new())
        .await
        .unwrap();

    assert_eq!(response.content.as_deref(), Some("done"));
    assert!(!response.truncated);

    let recorded = provider.calls();
    assert_eq!(recorded.len(), 3);
    assert_eq!(recorded[0].tool_names, ["adder", "explode"]);
    assert!(recorded[1].tool_names.is_empty());
    assert!(recorded[2].tool_names.is_empty());

    let last = recorded[2].tool_results.as_ref().unwrap();
    assert_eq!(last["first"], json!(3));
    assert_eq!(last["second"], json!({"error": "bad input", "success": false}));
}

#[tokio::test]
async fn no_tool_calls_returns_first_response() {
    let provider = Arc::new(ScriptedProvider::new(vec![LlmResponse::text("hello")]));
    let bridge = provider_bridge(&provider);

    let response = bridge
        .execute("hi", None, 3, &RequestOptions::new())
        .await
        .unwrap();

    assert_eq!(response, LlmResponse::text("hello"));
    assert_eq!(provider.call_count(), 1);
}

#[tokio::test]
async fn registry_tools_are_callable_when_not_offered() {
    let provider = Arc::new(ScriptedProvider::new(vec![
        calls(vec![adder_call("c"), call("ghost", json!({}))]),
        LlmResponse::text("ok"),
    ]));
    let bridge = provider_bridge(&provider);
    let only_explode = [ToolRef::from("explode")];

    bridge
        .execute("x", Some(&only_explode), 2, &RequestOptions::new())
        .await
        .unwrap();

    let recorded = provider.calls();
    assert_eq!(recorded[0].tool_names, ["explode"]);
    let results = recorded[1].tool_results.as_ref().unwrap();
    assert_eq!(results["c"], json!(3));
    assert_eq!(
        results["ghost"],
        json!({"error": "Tool 'ghost' not found", "success": false})
    );
}

#[tokio::test]
async fn provider_failure_surfaces_uniformly() {
    let provider = Arc::new(ScriptedProvider::failing("503 from vendor"));
    let bridge = provider_bridge(&provider);

    let err = bridge
        .execute("x", None, 1, &RequestOptions::new())
        .await
        .unwrap_err();

    assert!(matches!(err, BridgeError::Provider(_)));
    assert!(err.to_string().contains("503 from vendor"));
}

// -- Adapter strategy --------------------------------------------------------

#[tokio::test]
async fn adapter_strategy_runs_two_rounds() {
    let provider = Arc::new(ScriptedProvider::new(vec![
        calls(vec![adder_call("call_1")]),
        LlmResponse::text("3"),
    ]));
    let bridge = adapter_bridge(&provider);

    let response = bridge
        .execute("add", Some(&[ToolRef::from("adder")]), 10, &RequestOptions::new())
        .await
        .unwrap();

    assert_eq!(response.content.as_deref(), Some("3"));
    assert_eq!(bridge.backend().name(), "scripted");
    assert_eq!(bridge.backend().strategy(), Strategy::Adapter);

    let recorded = provider.calls();
    assert_eq!(recorded.len(), 2);
    assert_eq!(recorded[0].tool_names, ["adder"]);
    assert_eq!(
        recorded[1].tool_results.as_ref().unwrap()["call_1"],
        json!({"result": 3, "success": true})
    );
}

#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn adapter_strategy_on_multi_thread_runtime() {
    let provider = Arc::new(ScriptedProvider::repeating(calls(vec![adder_call("c")])));
    let bridge = adapter_bridge(&provider);

    let response = bridge
        .execute("add", None, 1, &RequestOptions::new())
        .await
        .unwrap();

    assert_eq!(provider.call_count(), 2);
    assert!(response.truncated);
}

#[tokio::test]
async fn inline_tools_need_no_registration() {
    let provider = Arc::new(ScriptedProvider::new(vec![LlmResponse::text("fine")]));
    let bridge = adapter_bridge(&provider);
    let inline = Tool::new("inline", "Not registered");

    bridge
        .execute("x", Some(&[ToolRef::from(inline)]), 1, &RequestOptions::new())
        .await
        .unwrap();

    assert_eq!(provider.calls()[0].tool_names, ["inline"]);
}

// -- Validation --------------------------------------------------------------

#[tokio::test]
async fn zero_cap_rejected_for_both_strategies() {
    let provider = Arc::new(ScriptedProvider::new(vec![]));

    for bridge in [provider_bridge(&provider), adapter_bridge(&provider)] {
        let err = bridge
            .execute("x", None, 0, &RequestOptions::new())
            .await
            .unwrap_err();
        assert!(matches!(err, BridgeError::InvalidMaxToolCalls(0)));
    }
    assert_eq!(provider.call_count(), 0);
}

#[tokio::test]
async fn unknown_tool_name_fails_before_io() {
    let provider = Arc::new(ScriptedProvider::new(vec![]));
    let bridge = adapter_bridge(&provider);

    let err = bridge
        .execute("x", Some(&[ToolRef::from("missing")]), 1, &RequestOptions::new())
        .await
        .unwrap_err();

    assert!(matches!(err, BridgeError::ToolNotFound(ref name) if name == "missing"));
    assert_eq!(provider.call_count(), 0);
}

// -- Blocking entry point ----------------------------------------------------

#[test]
fn execute_sync_drives_both_strategies() {
    let provider = Arc::new(ScriptedProvider::new(vec![
        calls(vec![adder_call("a")]),
        LlmResponse::text("from provider loop"),
        calls(vec![adder_call("b")]),
        LlmResponse::text("from adapter"),
    ]));

    let response = provider_bridge(&provider)
        .execute_sync("x", None, 3, &RequestOptions::new())
        .unwrap();
    assert_eq!(response.content.as_deref(), Some("from provider loop"));

    let response = adapter_bridge(&provider)
        .execute_sync("x", None, 3, &RequestOptions::new())
        .unwrap();
    assert_eq!(response.content.as_deref(), Some("from adapter"));

    assert_eq!(provider.call_count(), 4);
}
