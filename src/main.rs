use anyhow::Context;
use clap::Parser;
use gnmi_writer::config::Config;
use gnmi_writer::consumer::Consumer;
use gnmi_writer::processor::Processor;
use gnmi_writer::schema::Schema;
use gnmi_writer::writer::{ClickhouseSink, Sink, StdoutSink};
use gnmi_writer::{logging, metrics_server};

#[tokio::main(flavor = "multi_thread")]
async fn main() -> anyhow::Result<()> {
    let config = Config::parse();
    logging::install(config.verbose);

    config.validate().context("invalid configuration")?;

    tracing::info!(
        output = config.output,
        topic = config.kafka_topic,
        "starting gnmi-writer"
    );

    let schema = Schema::load().context("failed to load embedded schema")?;

    let metrics_addr = metrics_bind_addr(&config.metrics_addr)?;
    let metrics_router = metrics_server::build_router();
    let metrics_listener = tokio::net::TcpListener::bind(metrics_addr)
        .await
        .context("failed to bind metrics listener")?;
    tokio::spawn(async move {
        if let Err(err) = axum::serve(metrics_listener, metrics_router).await {
            tracing::error!(%err, "metrics server exited");
        }
    });

    let cancel = tokio_util::sync::CancellationToken::new();
    let ctrl_c_token = cancel.clone();
    tokio::spawn(async move {
        if let Err(err) = tokio::signal::ctrl_c().await {
            tracing::warn!(%err, "failed to install ctrl-c handler");
            return;
        }
        tracing::info!("received ctrl-c, initiating shutdown");
        ctrl_c_token.cancel();
    });

    let consumer = Consumer::new(
        &config.kafka_brokers.join(","),
        &config.kafka_topic,
        &config.kafka_group,
        &config.kafka_auth(),
        config.kafka_tls_disabled,
        config.kafka_idle_timeout,
    )
    .context("failed to construct kafka consumer")?;

    let sink: Box<dyn Sink> = build_sink(&config);

    let processor = Processor::new(consumer, sink, schema);
    processor.run(cancel).await;

    tracing::info!("gnmi-writer stopped");
    Ok(())
}

fn build_sink(config: &Config) -> Box<dyn Sink> {
    match config.output.as_str() {
        "clickhouse" => {
            let addr = config
                .clickhouse_addr
                .as_deref()
                .expect("validated: CLICKHOUSE_ADDR present when OUTPUT=clickhouse");
            let url = clickhouse_url(addr, config.clickhouse_tls_disabled);
            Box::new(ClickhouseSink::new(
                &url,
                &config.clickhouse_db,
                &config.clickhouse_user,
                &config.clickhouse_pass,
            ))
        }
        _ => Box::new(StdoutSink),
    }
}

/// Prefixes `addr` with the scheme implied by `CLICKHOUSE_TLS_DISABLED` when
/// it doesn't already carry one, so operators can pass either a bare
/// `host:port` or a fully-qualified URL.
fn clickhouse_url(addr: &str, tls_disabled: bool) -> String {
    if addr.contains("://") {
        return addr.to_string();
    }
    let scheme = if tls_disabled { "http" } else { "https" };
    format!("{scheme}://{addr}")
}

fn metrics_bind_addr(addr: &str) -> anyhow::Result<std::net::SocketAddr> {
    let addr = if addr.starts_with(':') {
        format!("0.0.0.0{addr}")
    } else {
        addr.to_string()
    };
    addr.parse()
        .with_context(|| format!("invalid METRICS_ADDR '{addr}'"))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn clickhouse_url_defaults_to_https() {
        assert_eq!(clickhouse_url("clickhouse.internal:9440", false), "https://clickhouse.internal:9440");
    }

    #[test]
    fn clickhouse_url_drops_to_http_when_tls_disabled() {
        assert_eq!(clickhouse_url("localhost:8123", true), "http://localhost:8123");
    }

    #[test]
    fn clickhouse_url_leaves_explicit_scheme_alone() {
        assert_eq!(
            clickhouse_url("http://localhost:8123", false),
            "http://localhost:8123"
        );
    }

    #[test]
    fn metrics_bind_addr_expands_bare_port() {
        let addr = metrics_bind_addr(":2112").unwrap();
        assert_eq!(addr.port(), 2112);
    }
}
