use metrics_exporter_prometheus::{PrometheusBuilder, PrometheusHandle};

/// Builds the axum router serving the Prometheus text exposition format at
/// `/metrics`. Installed once at startup and bound to `METRICS_ADDR`.
pub fn build_router() -> axum::Router<()> {
    use axum::routing::get;

    let recorder = PrometheusBuilder::new()
        .set_buckets(&[
            0.001, 0.0025, 0.005, 0.01, 0.025, 0.05, 0.1, 0.25, 0.5, 1.0, 2.5, 5.0, 10.0, 30.0,
        ])
        .expect("calculating histogram buckets")
        .install_recorder()
        .expect("failed to install prometheus recorder");

    build_info_gauge();

    axum::Router::new()
        .route("/metrics", get(prometheus_metrics))
        .with_state(recorder)
}

fn build_info_gauge() {
    metrics::gauge!(
        "gnmi_writer_build_info",
        "version" => env!("CARGO_PKG_VERSION"),
        "commit" => option_env!("GIT_COMMIT").unwrap_or("unknown"),
        "date" => option_env!("BUILD_DATE").unwrap_or("unknown"),
    )
    .set(1.0);
}

#[tracing::instrument(skip_all)]
async fn prometheus_metrics(
    axum::extract::State(handle): axum::extract::State<PrometheusHandle>,
) -> (axum::http::StatusCode, String) {
    (axum::http::StatusCode::OK, handle.render())
}
