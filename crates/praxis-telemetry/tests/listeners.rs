//! Diagnostic listeners driven by real invocations.

use http::{Method, StatusCode};
use metrics_exporter_prometheus::PrometheusBuilder;
use praxis_core::{
    ActionDescriptor, ActionError, EmptyResult, HandlerDescriptor, HandlerMethod, HttpContext,
    RouteData, StatusCodeResult,
};
use praxis_pipeline::ActionPipeline;
use praxis_telemetry::{MetricsListener, TracingListener};
use std::sync::Arc;

fn pipeline(method: HandlerMethod) -> ActionPipeline {
    ActionPipeline::builder(
        ActionDescriptor::new("/Orders").with_handler(HandlerDescriptor::new(Method::GET, method)),
    )
    .listener(Arc::new(MetricsListener))
    .listener(Arc::new(TracingListener))
    .build()
}

#[test]
fn test_metrics_listener_counts_invocations_by_status() {
    let ok = pipeline(HandlerMethod::result(|_| async {
        Ok(StatusCodeResult(StatusCode::OK))
    }));
    let failing = pipeline(HandlerMethod::result(|_| async {
        Err::<EmptyResult, _>(ActionError::handler("boom"))
    }));

    let recorder = PrometheusBuilder::new().build_recorder();
    let handle = recorder.handle();
    let runtime = tokio::runtime::Builder::new_current_thread()
        .build()
        .unwrap();

    metrics::with_local_recorder(&recorder, || {
        runtime.block_on(async {
            for _ in 0..2 {
                ok.invoke(HttpContext::default(), RouteData::new())
                    .await
                    .unwrap();
            }
            failing
                .invoke(HttpContext::default(), RouteData::new())
                .await
                .unwrap_err();
        });
    });

    let rendered = handle.render();
    assert!(rendered.contains(r#"praxis_actions_total{action="/Orders",status="completed"} 2"#));
    assert!(rendered.contains(r#"praxis_actions_total{action="/Orders",status="faulted"} 1"#));
    assert!(rendered.contains(r#"praxis_handler_invocations_total{handler="GET:default"} 3"#));
}

#[test]
fn test_tracing_listener_under_subscriber() {
    let ok = pipeline(HandlerMethod::unit(|_| async { Ok(()) }));
    let subscriber = tracing_subscriber::fmt()
        .with_max_level(tracing::Level::DEBUG)
        .with_test_writer()
        .finish();

    let runtime = tokio::runtime::Builder::new_current_thread()
        .build()
        .unwrap();
    tracing::subscriber::with_default(subscriber, || {
        assert!(praxis_pipeline::DiagnosticListener::is_enabled(
            &TracingListener,
            "praxis.before_action"
        ));
        runtime
            .block_on(ok.invoke(HttpContext::default(), RouteData::new()))
            .unwrap();
    });
}
