use crate::bridge::model::ReadingsModel;
use crate::generator::profile::{build_pcm_stream, GeneratorConfig};
use crate::workflow::runner::Runner;
use anyhow::Result;
use log::{error, info};
use serde_json::json;
use std::{
    net::SocketAddr,
    sync::{Arc, RwLock},
    thread,
};
use tokio::runtime::Builder;
use warp::{http::StatusCode, hyper::body::Bytes, Filter};

fn bridge_bind_address() -> SocketAddr {
    SocketAddr::from(([127, 0, 0, 1], 9000))
}

#[derive(Debug)]
struct MeterError;

impl warp::reject::Reject for MeterError {}

type SharedModel = Arc<RwLock<ReadingsModel>>;

fn store(state: &SharedModel, model: ReadingsModel) {
    match state.write() {
        Ok(mut guard) => *guard = model,
        Err(poisoned) => *poisoned.into_inner() = model,
    }
}

fn meter_reply(
    result: Result<crate::workflow::runner::StreamReport>,
    state: &SharedModel,
    description: Option<String>,
) -> Result<warp::reply::WithStatus<warp::reply::Json>, warp::Rejection> {
    match result {
        Ok(report) => {
            store(state, ReadingsModel::from(&report));
            Ok(warp::reply::with_status(
                warp::reply::json(&json!({
                    "status": "ok",
                    "blocks": report.readings.len(),
                    "overall_rms": report.overall_rms,
                    "description": description.unwrap_or_default(),
                })),
                StatusCode::OK,
            ))
        }
        Err(err) => {
            error!("ingest error: {:#}", err);
            Err(warp::reject::custom(MeterError))
        }
    }
}

/// Bridge that hosts the readings HTTP endpoint and meters posted audio.
pub struct MeterBridge {
    state: SharedModel,
}

impl MeterBridge {
    pub fn new(runner: Arc<Runner>) -> Self {
        let state: SharedModel = Arc::new(RwLock::new(ReadingsModel::default()));
        let state_for_filter = state.clone();
        let state_filter = warp::any().map(move || state_for_filter.clone());
        let runner_filter = warp::any().map(move || runner.clone());

        let get_route = warp::path("readings")
            .and(warp::get())
            .and(state_filter.clone())
            .map(|state: SharedModel| {
                let model = state.read().map(|g| g.clone()).unwrap_or_default();
                warp::reply::json(&model)
            });

        let post_route = warp::path("ingest")
            .and(warp::post())
            .and(warp::body::bytes())
            .and(state_filter.clone())
            .and(runner_filter.clone())
            .and_then(
                |body: Bytes, state: SharedModel, runner: Arc<Runner>| async move {
                    meter_reply(runner.execute(&body, None), &state, None)
                },
            );

        let generator_route = warp::path("ingest-config")
            .and(warp::post())
            .and(warp::body::json())
            .and(state_filter)
            .and(runner_filter)
            .and_then(
                |config: GeneratorConfig, state: SharedModel, runner: Arc<Runner>| async move {
                    let result = build_pcm_stream(&config)
                        .and_then(|stream| runner.execute(&stream, Some(config.container)));
                    meter_reply(result, &state, config.description.clone())
                },
            );

        thread::spawn(move || {
            let routes = get_route.or(post_route).or(generator_route);
            let runtime = match Builder::new_current_thread().enable_all().build() {
                Ok(runtime) => runtime,
                Err(err) => {
                    error!("failed to build bridge runtime: {}", err);
                    return;
                }
            };
            runtime.block_on(async move {
                warp::serve(routes).run(bridge_bind_address()).await;
            });
        });

        Self { state }
    }

    pub fn publish(&self, model: &ReadingsModel) -> Result<()> {
        store(&self.state, model.clone());
        info!(
            "[bridge] readings: {}, overall rms: {:?}",
            model.readings.len(),
            model.overall_rms
        );
        Ok(())
    }

    pub fn publish_status(&self, message: &str) {
        info!("[bridge] {}", message);
    }

    #[cfg(test)]
    pub fn snapshot(&self) -> ReadingsModel {
        self.state.read().map(|g| g.clone()).unwrap_or_default()
    }
}
