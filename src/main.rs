use std::net::SocketAddr;
use std::sync::Arc;

use anyhow::Context;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use translate_proxy::config::{self, Config};
use translate_proxy::prompt::ConsolePrompt;
use translate_proxy::{proxy, startup};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cfg = config::load()?;
    init_tracing(&cfg);

    let result = run(cfg).await;
    if let Err(ref e) = result {
        tracing::error!("{:#}", e);
    }
    result
}

fn init_tracing(cfg: &Config) {
    let filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| "translate_proxy=info,tower_http=info".into());

    let (plain, json) = if cfg.log_json {
        (None, Some(tracing_subscriber::fmt::layer().json()))
    } else {
        (Some(tracing_subscriber::fmt::layer()), None)
    };

    tracing_subscriber::registry()
        .with(filter)
        .with(plain)
        .with(json)
        .init();
}

async fn run(cfg: Config) -> anyhow::Result<()> {
    let mut prompt = ConsolePrompt::new();
    let state = startup::bootstrap(&cfg, &mut prompt).await?;
    tracing::info!(
        cloud_id = %state.translator.scope().cloud_id,
        folder_id = %state.translator.scope().folder_id,
        "translation folder ready"
    );

    let app = proxy::router(Arc::new(state), cfg.accesslog);
    let addr = resolve_address(&cfg.address).await?;

    match &cfg.tls {
        Some(tls) => {
            let rustls = axum_server::tls_rustls::RustlsConfig::from_pem_file(&tls.cert, &tls.key)
                .await
                .with_context(|| {
                    format!(
                        "load TLS certificate {} and key {}",
                        tls.cert.display(),
                        tls.key.display()
                    )
                })?;
            tracing::info!("translate-proxy listening on https://{}", addr);
            axum_server::bind_rustls(addr, rustls)
                .serve(app.into_make_service())
                .await?;
        }
        None => {
            let listener = tokio::net::TcpListener::bind(addr)
                .await
                .with_context(|| format!("bind {}", addr))?;
            tracing::info!("translate-proxy listening on http://{}", addr);
            axum::serve(listener, app).await?;
        }
    }

    Ok(())
}

/// `host:port`, where host may be a name such as `localhost`.
async fn resolve_address(address: &str) -> anyhow::Result<SocketAddr> {
    tokio::net::lookup_host(address)
        .await
        .with_context(|| format!("resolve listen address {}", address))?
        .next()
        .with_context(|| format!("listen address {} resolves to nothing", address))
}
