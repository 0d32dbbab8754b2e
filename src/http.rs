#![forbid(unsafe_code)]
#![deny(warnings)]
#![warn(clippy::pedantic)]

use actix_web::http::StatusCode;
use actix_web::{get, post, web, App, HttpResponse, HttpServer};
use serde_json::json;
use tracing::{error, info, warn};

use crate::config::Config;
use crate::domain::{AppState, CpuLoadQuery, MemoryQuery, MemoryReservoir};
use crate::error::LoadError;
use crate::metrics::Metrics;
use crate::service::LoadRunner;

#[post("/cpu")]
pub async fn trigger_cpu(query: web::Query<CpuLoadQuery>, data: web::Data<AppState>) -> HttpResponse {
    let query = query.into_inner();
    let runner = LoadRunner::from_state(&data);
    info!(
        percentage = query.percentage,
        cores = query.cores,
        sleep_time = query.sleep_time,
        "cpu load request"
    );
    match runner.start_cpu(&query) {
        Ok(receipt) => HttpResponse::Ok().json(receipt),
        Err(e) => load_error(&e),
    }
}

#[post("/memory")]
pub async fn trigger_memory(query: web::Query<MemoryQuery>, data: web::Data<AppState>) -> HttpResponse {
    let query = query.into_inner();
    let runner = LoadRunner::from_state(&data);
    info!(memory = query.memory, "memory allocation request");
    match runner.allocate_memory(&query).await {
        Ok(bytes) => HttpResponse::Ok().json(json!({"status":"ok","bytes":bytes})),
        Err(e) => load_error(&e),
    }
}

#[get("/health")]
pub async fn health(data: web::Data<AppState>) -> HttpResponse {
    let runner = LoadRunner::from_state(&data);
    HttpResponse::Ok().json(runner.health())
}

#[get("/metrics")]
pub async fn scrape_metrics(data: web::Data<AppState>) -> HttpResponse {
    let runner = LoadRunner::from_state(&data);
    match runner.encode_metrics() {
        Ok(buf) => HttpResponse::Ok()
            .content_type("text/plain; version=0.0.4")
            .body(buf),
        Err(e) => {
            error!(error=%format!("{e:#}"), "encode metrics failed");
            HttpResponse::InternalServerError().body("encode metrics failed")
        }
    }
}

pub fn status_for(err: &LoadError) -> StatusCode {
    match err {
        LoadError::InvalidParameter { .. } => StatusCode::BAD_REQUEST,
        LoadError::AllocationFailure { .. } => StatusCode::INTERNAL_SERVER_ERROR,
        LoadError::SpawnFailure { .. } => StatusCode::SERVICE_UNAVAILABLE,
    }
}

pub fn app_state() -> std::io::Result<AppState> {
    let metrics =
        Metrics::new().map_err(|e| std::io::Error::other(format!("metrics init: {e:#}")))?;
    Ok(AppState {
        reservoir: MemoryReservoir::default(),
        metrics,
    })
}

pub async fn serve(config: &Config) -> std::io::Result<()> {
    let state = app_state()?;
    HttpServer::new(move || {
        App::new()
            .app_data(web::Data::new(state.clone()))
            .service(health)
            .service(trigger_cpu)
            .service(trigger_memory)
            .service(scrape_metrics)
    })
    .bind(config.bind_addr)?
    .run()
    .await
}

fn load_error(err: &LoadError) -> HttpResponse {
    let code = status_for(err);
    if err.is_invalid_parameter() {
        warn!(error = %err, "request rejected");
    } else {
        error!(error = %err, "load request failed");
    }
    json_error(code, &err.to_string())
}

fn json_error(code: StatusCode, reason: &str) -> HttpResponse {
    HttpResponse::build(code).json(json!({"status":"error","reason":reason}))
}
