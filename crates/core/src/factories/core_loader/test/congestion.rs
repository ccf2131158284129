use super::{make_loader, CoreLoaderConfig};
use crate::factories::mem_transport::{MemTransport, MemTransportConfig};
use pictor_api::*;
use pictor_test_utils::{
    enable_tracing, iter_check, png_bytes,
    request::{test_address, test_request},
    sink::RecordingSink,
};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;

#[tokio::test(flavor = "multi_thread")]
async fn congestion_control_defers_and_orders_admission() {
    enable_tracing();
    let transport = MemTransport::new(MemTransportConfig {
        progress_chunks: 2,
        chunk_delay_ms: 40,
    });
    for name in ["a.png", "b.png", "c.png"] {
        transport.seed(test_address(name), png_bytes(8, 8));
    }
    let config = CoreLoaderConfig {
        max_concurrent_fetches: 1,
        ..Default::default()
    };
    let loader = make_loader(config, transport.clone(), None);

    let sink = RecordingSink::new();
    let a = LoadTask::new(test_request("a.png"), sink.clone());
    let b = LoadTask::new(test_request("b.png"), sink.clone());
    let c = LoadTask::new(test_request("c.png"), sink.clone());
    let order = vec![a.id, b.id, c.id];
    loader.submit(a).await.unwrap();
    loader.submit(b).await.unwrap();
    loader.submit(c).await.unwrap();

    iter_check!({
        if transport.fetch_count() == 1 {
            break;
        }
    });
    // the other fetches stay deferred while the only slot is held
    tokio::time::sleep(Duration::from_millis(20)).await;
    assert_eq!(1, transport.fetch_count());

    iter_check!(5000, {
        if sink.completion_count() == 3 {
            break;
        }
    });
    assert_eq!(3, transport.fetch_count());
    // released in submission order once slots free
    assert_eq!(order, sink.completed_ids());
}

#[tokio::test(flavor = "multi_thread")]
async fn disabling_congestion_control_starts_fetches_immediately() {
    enable_tracing();
    let transport = MemTransport::new(MemTransportConfig {
        progress_chunks: 2,
        chunk_delay_ms: 100,
    });
    for name in ["a.png", "b.png", "c.png"] {
        transport.seed(test_address(name), png_bytes(8, 8));
    }
    let config = CoreLoaderConfig {
        max_concurrent_fetches: 1,
        congestion_control: false,
        ..Default::default()
    };
    let loader = make_loader(config, transport.clone(), None);

    let sink = RecordingSink::new();
    for name in ["a.png", "b.png", "c.png"] {
        let task = LoadTask::new(test_request(name), sink.clone());
        loader.submit(task).await.unwrap();
    }

    // all three are executing before any of them completes
    iter_check!({
        if transport.fetch_count() == 3 {
            break;
        }
    });
    assert_eq!(0, sink.completion_count());
}

#[derive(Debug, Default)]
struct ConcurrencyProbe {
    current: AtomicUsize,
    peak: AtomicUsize,
}

impl ConcurrencyProbe {
    fn enter(&self) {
        let now = self.current.fetch_add(1, Ordering::SeqCst) + 1;
        self.peak.fetch_max(now, Ordering::SeqCst);
    }

    fn exit(&self) {
        self.current.fetch_sub(1, Ordering::SeqCst);
    }

    fn peak(&self) -> usize {
        self.peak.load(Ordering::SeqCst)
    }
}

#[derive(Debug)]
struct ProbedDecoder {
    probe: Arc<ConcurrencyProbe>,
}

impl ImageDecoder for ProbedDecoder {
    fn decode(&self, bytes: bytes::Bytes) -> Option<image::DynamicImage> {
        self.probe.enter();
        std::thread::sleep(Duration::from_millis(20));
        let out = image::load_from_memory(&bytes).ok();
        self.probe.exit();
        out
    }
}

#[tokio::test(flavor = "multi_thread")]
async fn decode_stage_serializes_by_default() {
    enable_tracing();
    let transport = MemTransport::new(MemTransportConfig::default());
    let names = ["a.png", "b.png", "c.png", "d.png"];
    for name in names {
        transport.seed(test_address(name), png_bytes(8, 8));
    }
    let probe = Arc::new(ConcurrencyProbe::default());
    let loader = super::CoreLoader::new(
        CoreLoaderConfig::default(),
        Arc::new(crate::common::StdRequestPolicy),
        Arc::new(ProbedDecoder {
            probe: probe.clone(),
        }),
        transport.clone(),
        None,
    );

    let sink = RecordingSink::new();
    for name in names {
        let task = LoadTask::new(test_request(name), sink.clone());
        loader.submit(task).await.unwrap();
    }

    iter_check!(5000, {
        if sink.completion_count() == names.len() {
            break;
        }
    });
    // decode runs with a concurrency cap of one
    assert_eq!(1, probe.peak());
}
