use crate::workflow::runner::BeamSummary;
use anyhow::Context;
use serde::Serialize;
use std::collections::VecDeque;
use std::{
    net::SocketAddr,
    sync::{Arc, RwLock},
    thread,
};
use tokio::runtime::Builder;
use tsbeam::telemetry::MetricsSnapshot;
use warp::Filter;

const MAX_RECENT_BEAMS: usize = 64;

pub fn bridge_bind_address() -> SocketAddr {
    SocketAddr::from(([127, 0, 0, 1], 9000))
}

/// State served over HTTP: the latest beam summaries and the reader counters.
#[derive(Debug, Clone, Default, Serialize)]
pub struct BridgeModel {
    pub beams: VecDeque<BeamSummary>,
    pub metrics: MetricsSnapshot,
}

type SharedModel = Arc<RwLock<BridgeModel>>;

fn read_model(state: &SharedModel) -> BridgeModel {
    match state.read() {
        Ok(guard) => guard.clone(),
        Err(poisoned) => poisoned.into_inner().clone(),
    }
}

fn routes(
    state: SharedModel,
) -> impl Filter<Extract = (impl warp::Reply,), Error = warp::Rejection> + Clone {
    let state_filter = warp::any().map(move || state.clone());

    let beams_route = warp::path("beams")
        .and(warp::path::end())
        .and(warp::get())
        .and(state_filter.clone())
        .map(|state: SharedModel| warp::reply::json(&read_model(&state).beams));

    let metrics_route = warp::path("metrics")
        .and(warp::path::end())
        .and(warp::get())
        .and(state_filter)
        .map(|state: SharedModel| warp::reply::json(&read_model(&state).metrics));

    beams_route.or(metrics_route)
}

/// Bridge that exposes beam summaries on `GET /beams` and `GET /metrics`.
pub struct SpectraBridge {
    state: SharedModel,
}

impl SpectraBridge {
    pub fn new() -> Self {
        Self {
            state: Arc::new(RwLock::new(BridgeModel::default())),
        }
    }

    /// Starts the HTTP endpoint on its own thread.
    pub fn serve(&self, addr: SocketAddr) -> anyhow::Result<()> {
        let routes = routes(self.state.clone());
        let runtime = Builder::new_current_thread()
            .enable_all()
            .build()
            .context("building bridge runtime")?;
        thread::spawn(move || {
            runtime.block_on(async move {
                warp::serve(routes).run(addr).await;
            });
        });
        log::info!("spectra bridge listening on {}", addr);
        Ok(())
    }

    pub fn publish(&self, summary: BeamSummary, metrics: MetricsSnapshot) {
        let mut guard = match self.state.write() {
            Ok(guard) => guard,
            Err(poisoned) => poisoned.into_inner(),
        };
        if guard.beams.len() == MAX_RECENT_BEAMS {
            guard.beams.pop_front();
        }
        guard.beams.push_back(summary);
        guard.metrics = metrics;
    }

    pub fn publish_status(&self, message: &str) {
        println!("[bridge] {}", message);
    }

    #[cfg(test)]
    pub fn snapshot(&self) -> BridgeModel {
        read_model(&self.state)
    }
}

impl Default for SpectraBridge {
    fn default() -> Self {
        Self::new()
    }
}
