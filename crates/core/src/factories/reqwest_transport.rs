//! A reqwest-based streaming transport.
//!
//! Streams response bodies chunk by chunk, reporting byte-level progress
//! to the fetch events as data arrives. Cancellation through the returned
//! handle aborts the in-flight request without emitting a terminal event.

use bytes::BytesMut;
use futures_util::StreamExt;
use pictor_api::{builder::Builder, config::Config, *};
use std::sync::{Arc, Mutex};
use std::time::Duration;
use tokio::sync::oneshot;

/// ReqwestTransport configuration types.
mod config {
    use pictor_api::config::ModConfig;

    /// Configuration parameters for [ReqwestTransportFactory](super::ReqwestTransportFactory).
    #[derive(Debug, Clone, serde::Serialize, serde::Deserialize)]
    #[serde(rename_all = "camelCase")]
    pub struct ReqwestTransportConfig {
        /// Connect timeout in ms. Default: 10 000.
        pub connect_timeout_ms: u64,

        /// Whole-request timeout in ms. Default: 30 000.
        pub request_timeout_ms: u64,

        /// Maximum accepted payload size in bytes. Default: 32 MiB.
        pub max_bytes: u64,

        /// The user agent sent with every request.
        pub user_agent: String,
    }

    impl Default for ReqwestTransportConfig {
        fn default() -> Self {
            Self {
                connect_timeout_ms: 10_000,
                request_timeout_ms: 30_000,
                max_bytes: 32 * 1024 * 1024,
                user_agent: "pictor/0".to_string(),
            }
        }
    }

    /// Module-level configuration for ReqwestTransport.
    #[derive(Debug, Default, Clone, serde::Serialize, serde::Deserialize)]
    #[serde(rename_all = "camelCase")]
    pub struct ReqwestTransportModConfig {
        /// ReqwestTransport configuration.
        pub reqwest_transport: ReqwestTransportConfig,
    }

    impl ModConfig for ReqwestTransportModConfig {
        const MODULE_NAME: &'static str = "reqwestTransport";
    }
}

pub use config::*;

/// A production-ready reqwest-based transport factory.
#[derive(Debug)]
pub struct ReqwestTransportFactory {}

impl ReqwestTransportFactory {
    /// Construct a new ReqwestTransportFactory.
    pub fn create() -> DynTransportFactory {
        let out: DynTransportFactory = Arc::new(Self {});
        out
    }
}

impl TransportFactory for ReqwestTransportFactory {
    fn default_config(&self, config: &mut Config) -> PicResult<()> {
        config.set_module_config(&ReqwestTransportModConfig::default())
    }

    fn create(
        &self,
        builder: Arc<Builder>,
    ) -> BoxFut<'static, PicResult<DynTransport>> {
        Box::pin(async move {
            let config: ReqwestTransportModConfig =
                builder.config.get_module_config()?;
            let config = config.reqwest_transport;
            let client = reqwest::Client::builder()
                .connect_timeout(Duration::from_millis(
                    config.connect_timeout_ms,
                ))
                .timeout(Duration::from_millis(config.request_timeout_ms))
                .user_agent(config.user_agent.clone())
                .build()
                .map_err(|err| {
                    PicError::transport_src("could not build http client", err)
                })?;
            let out: DynTransport =
                Arc::new(ReqwestTransport { client, config });
            Ok(out)
        })
    }
}

/// A streaming HTTP transport.
#[derive(Debug)]
pub struct ReqwestTransport {
    client: reqwest::Client,
    config: ReqwestTransportConfig,
}

#[derive(Debug)]
struct ReqwestFetchHandle {
    cancel: Mutex<Option<oneshot::Sender<()>>>,
}

impl FetchHandle for ReqwestFetchHandle {
    fn cancel(&self) {
        if let Some(cancel) = self.cancel.lock().unwrap().take() {
            let _ = cancel.send(());
        }
    }
}

impl Transport for ReqwestTransport {
    fn fetch(
        &self,
        request: Arc<ImageRequest>,
        events: DynFetchEvents,
    ) -> BoxFut<'_, PicResult<DynFetchHandle>> {
        Box::pin(async move {
            let (cancel_tx, cancel_rx) = oneshot::channel::<()>();
            let client = self.client.clone();
            let max_bytes = self.config.max_bytes;

            tokio::task::spawn(async move {
                tokio::select! {
                    // a cancelled fetch emits no terminal event
                    _ = cancel_rx => {}
                    _ = Self::drive(client, request, events, max_bytes) => {}
                }
            });

            let out: DynFetchHandle = Arc::new(ReqwestFetchHandle {
                cancel: Mutex::new(Some(cancel_tx)),
            });
            Ok(out)
        })
    }

    fn invalidate(&self) {
        // the client keeps no derived response state beyond pooled
        // connections, which remain valid
        tracing::debug!("reqwest transport invalidated");
    }

    fn clear_cache(&self) {
        // no transport-level response cache
        tracing::debug!("reqwest transport cache cleared");
    }
}

impl ReqwestTransport {
    async fn drive(
        client: reqwest::Client,
        request: Arc<ImageRequest>,
        events: DynFetchEvents,
        max_bytes: u64,
    ) {
        let mut address = request.address.clone();
        if let Some(token) = &request.transport_options.cache_buster {
            address.query_pairs_mut().append_pair("cb", token);
        }

        let mut req = client.get(address.as_str());
        for (key, value) in &request.transport_options.headers {
            req = req.header(key, value);
        }

        let response = match req.send().await {
            Ok(response) => response,
            Err(err) => {
                return events.on_complete(Err(PicError::transport_src(
                    format!("request to {} failed", request.address),
                    err,
                )));
            }
        };

        let status = response.status();
        if !status.is_success() {
            return events.on_complete(Err(PicError::transport(format!(
                "http status {status} from {}",
                request.address
            ))));
        }

        let total = response.content_length();
        if let Some(total) = total {
            if total > max_bytes {
                return events.on_complete(Err(PicError::transport(
                    format!("response exceeds {max_bytes} bytes"),
                )));
            }
        }

        events.on_progress(0, total);

        let mut buf = BytesMut::new();
        let mut stream = response.bytes_stream();
        while let Some(chunk) = stream.next().await {
            let chunk = match chunk {
                Ok(chunk) => chunk,
                Err(err) => {
                    return events.on_complete(Err(PicError::transport_src(
                        format!("stream from {} failed", request.address),
                        err,
                    )));
                }
            };
            if buf.len() as u64 + chunk.len() as u64 > max_bytes {
                return events.on_complete(Err(PicError::transport(
                    format!("response exceeds {max_bytes} bytes"),
                )));
            }
            buf.extend_from_slice(&chunk);
            events.on_progress(buf.len() as u64, total);
        }

        events.on_complete(Ok(FetchOutput {
            bytes: buf.freeze(),
        }));
    }
}
