//! A configured application: configuration, pipeline, telemetry and the test
//! client together.

use http::{Method, StatusCode};
use metrics_exporter_prometheus::PrometheusBuilder;
use praxis::prelude::*;
use praxis_test::{EventLog, RecordingFilter, TestClient};
use serde_json::json;

// =============================================================================
// Helpers
// =============================================================================

fn orders_action() -> ActionDescriptor {
    ActionDescriptor::new("/Orders")
        .with_handler(HandlerDescriptor::new(
            Method::GET,
            HandlerMethod::result(|_| async { Ok(ContentResult::text("all orders")) }),
        ))
        .with_handler(
            HandlerDescriptor::new(
                Method::POST,
                HandlerMethod::result(|args: Arguments| async move {
                    let id: u32 = args.get_as("id")?;
                    Ok(ContentResult::text(format!("cancelled {id}")))
                }),
            )
            .named("cancel")
            .with_parameter(ParameterDescriptor::required("id")),
        )
        .with_handler(
            HandlerDescriptor::new(
                Method::POST,
                HandlerMethod::unit(|_| async { Err(ActionError::handler("ledger offline")) }),
            )
            .named("archive"),
        )
}

fn config(toml: &str) -> PraxisConfig {
    ConfigLoader::new()
        .with_string(toml, "toml")
        .unwrap()
        .load()
        .unwrap()
}

fn client(config: &PraxisConfig, builder: ActionPipelineBuilder) -> TestClient {
    TestClient::new(config.configure_pipeline(builder).build())
}

// =============================================================================
// Selection
// =============================================================================

#[tokio::test]
async fn test_custom_handler_key_selects_named_handler() {
    let config = config("[selection]\nhandler_key = \"op\"");
    let client = client(&config, ActionPipeline::builder(orders_action()));

    let response = client
        .post("/orders")
        .query(&[("op", "cancel"), ("id", "7")])
        .send()
        .await
        .unwrap();
    response.assert_status(StatusCode::OK).assert_text("cancelled 7");

    // the default key no longer selects anything
    let response = client
        .post("/orders")
        .query(&[("handler", "cancel"), ("id", "7")])
        .send()
        .await
        .unwrap();
    assert!(response.result_is::<EmptyResult>());
}

#[tokio::test]
async fn test_route_value_names_handler() {
    let config = PraxisConfig::default();
    let client = client(&config, ActionPipeline::builder(orders_action()));

    let response = client
        .post("/orders")
        .route("handler", "cancel")
        .route("id", "12")
        .send()
        .await
        .unwrap();
    response.assert_text("cancelled 12");
}

#[tokio::test]
async fn test_head_fallback_follows_config() {
    let enabled = client(&PraxisConfig::default(), ActionPipeline::builder(orders_action()));
    enabled
        .head("/orders")
        .send()
        .await
        .unwrap()
        .assert_text("all orders");

    let config = config("[selection]\nhead_falls_back_to_get = false");
    let disabled = client(&config, ActionPipeline::builder(orders_action()));
    let response = disabled.head("/orders").send().await.unwrap();
    assert!(response.result_is::<EmptyResult>());
    assert!(response.body().is_empty());
}

// =============================================================================
// Filters
// =============================================================================

#[tokio::test]
async fn test_missing_required_argument_rejected_by_filter() {
    struct RequireValidModel;

    impl SyncFilter<ActionExecutingContext> for RequireValidModel {
        fn on_executing(&self, ctx: &mut ActionExecutingContext) -> Result<(), ActionError> {
            if !ctx.action_context().model_state().is_valid() {
                ctx.set_result(StatusCodeResult(StatusCode::BAD_REQUEST));
            }
            Ok(())
        }
    }

    let client = client(
        &PraxisConfig::default(),
        ActionPipeline::builder(orders_action()).filter(Filter::action(RequireValidModel)),
    );

    let response = client
        .post("/orders?handler=cancel")
        .send()
        .await
        .unwrap();

    response
        .assert_status(StatusCode::BAD_REQUEST)
        .assert_visited(PipelineState::ActionExecuted);
    assert_eq!(
        response.model_state().errors_for("id"),
        ["The id field is required."]
    );
}

#[tokio::test]
async fn test_exception_filter_renders_problem() {
    let log = EventLog::new();
    let problem = FnExceptionFilter::new("problem", |ctx: &mut ExceptionContext| {
        let detail = ctx.exception().error().to_string();
        ctx.handle_with(
            JsonResult::new(json!({ "title": "failed", "detail": detail }))
                .with_status(StatusCode::INTERNAL_SERVER_ERROR),
        );
        Ok(())
    });
    let client = client(
        &PraxisConfig::production(),
        ActionPipeline::builder(orders_action())
            .filter(Filter::exception(problem))
            .filter(Filter::result(RecordingFilter::new("render", &log))),
    );

    let response = client
        .post("/orders?handler=archive")
        .send()
        .await
        .unwrap();

    response.assert_status(StatusCode::INTERNAL_SERVER_ERROR);
    let body = response.json_value().unwrap();
    assert_eq!(body["title"], "failed");
    assert!(body["detail"].as_str().unwrap().contains("ledger offline"));
    assert!(log.contains("render.executed canceled=false faulted=false"));
}

// =============================================================================
// Telemetry
// =============================================================================

fn render_metrics_for(config: &PraxisConfig) -> String {
    let client = client(config, ActionPipeline::builder(orders_action()));
    let recorder = PrometheusBuilder::new().build_recorder();
    let handle = recorder.handle();
    let runtime = tokio::runtime::Builder::new_current_thread()
        .build()
        .unwrap();

    metrics::with_local_recorder(&recorder, || {
        runtime.block_on(async {
            client.get("/orders").send().await.unwrap();
            client
                .post("/orders?handler=archive")
                .send()
                .await
                .unwrap_err();
        });
    });
    handle.render()
}

#[test]
fn test_metrics_recorded_when_enabled() {
    let rendered = render_metrics_for(&PraxisConfig::default());
    assert!(rendered.contains(r#"praxis_actions_total{action="/Orders",status="completed"} 1"#));
    assert!(rendered.contains(r#"praxis_actions_total{action="/Orders",status="faulted"} 1"#));
}

#[test]
fn test_no_metrics_when_disabled() {
    for toml in [
        "[pipeline]\ndiagnostics = false",
        "[telemetry.metrics]\nenabled = false",
    ] {
        let rendered = render_metrics_for(&config(toml));
        assert!(!rendered.contains("praxis_actions_total"), "{toml}");
    }
}

#[test]
fn test_telemetry_config_from_development_preset() {
    let telemetry = ConfigLoader::new()
        .with_development()
        .load()
        .unwrap()
        .telemetry_config();

    assert_eq!(telemetry.logging.level, "debug");
    assert_eq!(telemetry.logging.format, praxis::telemetry::LogFormat::Pretty);
    assert!(telemetry.metrics.enabled);
}
