use actix_cors::Cors;
use actix_web::{
    get, post, web, App, HttpResponse, HttpServer, Responder, Result as ActixResult,
};
use actix_ws::Message;
use legocore::{ComponentCategory, FlowDefinition};
use legoruntime::{ExecutionMode, FlowRuntime, RuntimeConfig};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tracing::{error, info, warn};
use tracing_subscriber::EnvFilter;
use uuid::Uuid;

/// Application state shared across handlers
struct AppState {
    runtime: Arc<FlowRuntime>,
}

/// Request body for flow execution
#[derive(Debug, Deserialize)]
struct ExecuteRequest {
    flow: FlowDefinition,
    /// Run independent steps concurrently
    #[serde(default)]
    concurrent: bool,
}

#[derive(Debug, Deserialize)]
struct ComponentQuery {
    category: Option<ComponentCategory>,
    search: Option<String>,
}

#[derive(Debug, Deserialize)]
struct EventsQuery {
    execution_id: Option<Uuid>,
}

#[derive(Debug, Serialize)]
struct ValidationResponse {
    valid: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    order: Option<Vec<String>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    error: Option<String>,
}

/// Health check endpoint
#[get("/health")]
async fn health_check() -> impl Responder {
    HttpResponse::Ok().json(serde_json::json!({
        "status": "healthy",
        "version": env!("CARGO_PKG_VERSION"),
        "service": "lego-flow-engine"
    }))
}

/// Execute a flow and return its result
#[post("/api/flows/execute")]
async fn execute_flow(
    data: web::Data<AppState>,
    req: web::Json<ExecuteRequest>,
) -> ActixResult<impl Responder> {
    let ExecuteRequest { flow, concurrent } = req.into_inner();

    info!("Executing flow: {} ({})", flow.name, flow.id);

    let mut engine = data.runtime.engine(flow);
    if concurrent {
        engine = engine.with_config(RuntimeConfig {
            execution_mode: ExecutionMode::Concurrent,
            ..data.runtime.config().clone()
        });
    }

    let result = engine.execute().await;
    if result.success {
        info!(
            "Flow {} completed in {}ms",
            result.flow_id, result.execution_time_ms
        );
        Ok(HttpResponse::Ok().json(result))
    } else {
        error!(
            "Flow {} failed at {:?}",
            result.flow_id,
            result.failed_step()
        );
        Ok(HttpResponse::UnprocessableEntity().json(result))
    }
}

/// Validate a flow without running it
#[post("/api/flows/validate")]
async fn validate_flow(
    data: web::Data<AppState>,
    flow: web::Json<FlowDefinition>,
) -> ActixResult<impl Responder> {
    match data.runtime.validate(&flow) {
        Ok(order) => Ok(HttpResponse::Ok().json(ValidationResponse {
            valid: true,
            order: Some(order),
            error: None,
        })),
        Err(e) => {
            warn!("Flow {} is invalid: {}", flow.id, e);
            Ok(HttpResponse::UnprocessableEntity().json(ValidationResponse {
                valid: false,
                order: None,
                error: Some(e.to_string()),
            }))
        }
    }
}

/// List catalog components, optionally filtered
#[get("/api/components")]
async fn list_components(
    data: web::Data<AppState>,
    query: web::Query<ComponentQuery>,
) -> ActixResult<impl Responder> {
    let registry = data.runtime.components();
    let components = match &query.search {
        Some(search) => registry.search(search),
        None => registry.all(),
    };

    let components: Vec<_> = components
        .into_iter()
        .filter(|c| query.category.map_or(true, |category| c.category == category))
        .collect();

    Ok(HttpResponse::Ok().json(components))
}

/// List registered API providers
#[get("/api/providers")]
async fn list_providers(data: web::Data<AppState>) -> ActixResult<impl Responder> {
    let providers: Vec<_> = data
        .runtime
        .providers()
        .all()
        .iter()
        .map(|p| {
            serde_json::json!({
                "name": p.name(),
                "baseUrl": p.base_url(),
            })
        })
        .collect();

    Ok(HttpResponse::Ok().json(providers))
}

/// WebSocket endpoint for real-time execution events
#[get("/api/events")]
async fn websocket_events(
    req: actix_web::HttpRequest,
    stream: web::Payload,
    data: web::Data<AppState>,
    query: web::Query<EventsQuery>,
) -> ActixResult<HttpResponse> {
    let (res, mut session, mut msg_stream) = actix_ws::handle(&req, stream)?;
    let only = query.execution_id;

    info!("WebSocket client connected");

    let mut events = data.runtime.subscribe_events();

    actix_web::rt::spawn(async move {
        loop {
            tokio::select! {
                event = events.recv() => {
                    match event {
                        Ok(event) => {
                            if only.is_some_and(|id| id != event.execution_id()) {
                                continue;
                            }
                            if let Ok(json) = serde_json::to_string(&event) {
                                if session.text(json).await.is_err() {
                                    break;
                                }
                            }
                        }
                        Err(_) => break,
                    }
                }

                Some(Ok(msg)) = msg_stream.recv() => {
                    match msg {
                        Message::Ping(bytes) => {
                            if session.pong(&bytes).await.is_err() {
                                break;
                            }
                        }
                        Message::Close(_) => break,
                        _ => {}
                    }
                }

                else => break,
            }
        }

        info!("WebSocket client disconnected");
        let _ = session.close(None).await;
    });

    Ok(res)
}

fn routes(cfg: &mut web::ServiceConfig) {
    cfg.service(health_check)
        .service(execute_flow)
        .service(validate_flow)
        .service(list_components)
        .service(list_providers)
        .service(websocket_events);
}

#[actix_web::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .init();

    info!("🚀 Starting LEGO Flow Engine Server");

    let components = legoproviders::default_component_registry();
    let providers = legoproviders::default_provider_registry()?;
    let runtime = FlowRuntime::new(
        Arc::new(components),
        Arc::new(providers),
        RuntimeConfig::default(),
    );

    info!(
        "✅ Runtime initialized with {} components and providers {:?}",
        runtime.components().len(),
        runtime.providers().names()
    );

    let app_state = web::Data::new(AppState {
        runtime: Arc::new(runtime),
    });

    let bind_address = std::env::var("BIND_ADDRESS").unwrap_or_else(|_| "0.0.0.0:3000".to_string());

    info!("🌐 Server starting on http://{}", bind_address);

    HttpServer::new(move || {
        let cors = Cors::default()
            .allow_any_origin()
            .allow_any_method()
            .allow_any_header()
            .max_age(3600);

        App::new()
            .app_data(app_state.clone())
            .wrap(cors)
            .wrap(actix_web::middleware::Logger::default())
            .configure(routes)
    })
    .bind(&bind_address)?
    .run()
    .await?;

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use actix_web::{http::StatusCode, test};
    use legoruntime::ProviderRegistry;
    use serde_json::{json, Value};

    fn state() -> web::Data<AppState> {
        let runtime = FlowRuntime::new(
            Arc::new(legoproviders::default_component_registry()),
            Arc::new(ProviderRegistry::new()),
            RuntimeConfig::default(),
        );
        web::Data::new(AppState {
            runtime: Arc::new(runtime),
        })
    }

    fn layout_flow() -> Value {
        json!({
            "id": "flow_ui",
            "name": "Static page",
            "steps": [
                {"id": "header", "componentId": "diia-header", "config": {"title": "Fines"}},
                {"id": "done", "componentId": "success-banner", "config": {"title": "Paid"}}
            ],
            "connections": [{"from": "header", "to": "done"}]
        })
    }

    #[actix_web::test]
    async fn executes_config_only_flow() {
        let app = test::init_service(App::new().app_data(state()).configure(routes)).await;

        let req = test::TestRequest::post()
            .uri("/api/flows/execute")
            .set_json(json!({"flow": layout_flow()}))
            .to_request();
        let body: Value = test::call_and_read_body_json(&app, req).await;

        assert_eq!(body["success"], json!(true));
        assert_eq!(body["results"]["header"], json!({"title": "Fines"}));
        assert_eq!(body["results"]["done"], json!({"title": "Paid"}));
    }

    #[actix_web::test]
    async fn validate_rejects_cycles() {
        let app = test::init_service(App::new().app_data(state()).configure(routes)).await;

        let mut flow = layout_flow();
        flow["connections"]
            .as_array_mut()
            .unwrap()
            .push(json!({"from": "done", "to": "header"}));

        let req = test::TestRequest::post()
            .uri("/api/flows/validate")
            .set_json(flow)
            .to_request();
        let resp = test::call_service(&app, req).await;
        assert_eq!(resp.status(), StatusCode::UNPROCESSABLE_ENTITY);

        let body: Value = test::read_body_json(resp).await;
        assert_eq!(body["valid"], json!(false));
    }

    #[actix_web::test]
    async fn filters_components_by_category() {
        let app = test::init_service(App::new().app_data(state()).configure(routes)).await;

        let req = test::TestRequest::get()
            .uri("/api/components?category=payment")
            .to_request();
        let body: Vec<Value> = test::call_and_read_body_json(&app, req).await;

        let ids: Vec<_> = body.iter().map(|c| c["id"].as_str().unwrap()).collect();
        assert_eq!(ids, ["liqpay-payment", "monobank-payment"]);
    }
}
