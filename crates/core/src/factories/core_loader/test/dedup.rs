use super::{make_loader, CoreLoaderConfig};
use crate::common::StdRequestPolicy;
use crate::factories::mem_byte_cache::{MemByteCache, MemByteCacheConfig};
use crate::factories::mem_transport::{MemTransport, MemTransportConfig};
use bytes::Bytes;
use futures::future::BoxFuture;
use pictor_api::*;
use pictor_test_utils::{
    enable_tracing, iter_check, png_bytes,
    request::{test_address, test_request},
    sink::RecordingSink,
};
use std::sync::{Arc, Mutex};

#[tokio::test(flavor = "multi_thread")]
async fn load_equivalent_requests_share_one_fetch() {
    enable_tracing();
    let transport = MemTransport::new(MemTransportConfig {
        progress_chunks: 2,
        chunk_delay_ms: 20,
    });
    transport.seed(test_address("cat.png"), png_bytes(64, 64));
    let loader =
        make_loader(CoreLoaderConfig::default(), transport.clone(), None);

    let sink = RecordingSink::new();
    let r1 = LoadTask::new(
        test_request("cat.png").with_target_size(100, 100),
        sink.clone(),
    );
    let r2 = LoadTask::new(
        test_request("cat.png").with_target_size(200, 200),
        sink.clone(),
    );
    let (r1_id, r2_id) = (r1.id, r2.id);

    loader.submit(r1).await.unwrap();
    loader.submit(r2).await.unwrap();

    iter_check!(2000, {
        if sink.completion_count() == 2 {
            break;
        }
    });

    // one underlying fetch for the whole load-equivalence class
    assert_eq!(1, transport.fetch_count());

    // independently resized results
    let img1 = sink.completion_for(r1_id).unwrap().unwrap();
    let img2 = sink.completion_for(r2_id).unwrap().unwrap();
    assert_eq!((100, 100), (img1.width(), img1.height()));
    assert_eq!((200, 200), (img2.width(), img2.height()));

    // both tasks observed the same fraction stream
    let p1 = sink.progress_for(r1_id);
    let p2 = sink.progress_for(r2_id);
    assert_eq!(p1, p2);
    assert_eq!(2, p1.len());
}

#[tokio::test(flavor = "multi_thread")]
async fn cache_equivalent_requests_reuse_the_cache_not_the_fetch() {
    enable_tracing();
    let transport = MemTransport::new(MemTransportConfig {
        progress_chunks: 2,
        chunk_delay_ms: 20,
    });
    transport.seed(test_address("dog.png"), png_bytes(32, 32));
    let policy: DynRequestPolicy = Arc::new(StdRequestPolicy);
    let cache = Arc::new(MemByteCache::new(
        MemByteCacheConfig::default(),
        policy,
    ));
    let loader = make_loader(
        CoreLoaderConfig::default(),
        transport.clone(),
        Some(cache.clone()),
    );

    let sink = RecordingSink::new();
    // same cacheable output, different transport options: cache-equivalent
    // but not load-equivalent
    let a = LoadTask::new(
        test_request("dog.png").with_target_size(50, 50),
        sink.clone(),
    );
    let b = LoadTask::new(
        test_request("dog.png")
            .with_target_size(50, 50)
            .with_cache_buster("tok"),
        sink.clone(),
    );
    loader.submit(a).await.unwrap();
    loader.submit(b).await.unwrap();

    iter_check!(2000, {
        if sink.completion_count() == 2 {
            break;
        }
    });

    // no fetch sharing across load-equivalence classes
    assert_eq!(2, transport.fetch_count());

    // once populated, the cache serves the whole cache class without a
    // further fetch
    iter_check!({
        if !cache.is_empty() {
            break;
        }
    });
    let c = LoadTask::new(
        test_request("dog.png").with_target_size(50, 50),
        sink.clone(),
    );
    let c_id = c.id;
    loader.submit(c).await.unwrap();
    iter_check!(2000, {
        if sink.completion_for(c_id).is_some() {
            break;
        }
    });
    assert_eq!(2, transport.fetch_count());
    assert!(sink.completion_for(c_id).unwrap().is_ok());
}

#[derive(Debug, Default)]
struct CountingCache {
    stores: Mutex<Vec<Arc<ImageRequest>>>,
}

impl ByteCache for CountingCache {
    fn lookup(
        &self,
        _request: Arc<ImageRequest>,
    ) -> BoxFuture<'_, PicResult<Option<Bytes>>> {
        Box::pin(async { Ok(None) })
    }

    fn store(
        &self,
        _bytes: Bytes,
        request: Arc<ImageRequest>,
    ) -> BoxFuture<'_, PicResult<()>> {
        self.stores.lock().unwrap().push(request);
        Box::pin(async { Ok(()) })
    }

    fn clear_all(&self) -> BoxFuture<'_, PicResult<()>> {
        self.stores.lock().unwrap().clear();
        Box::pin(async { Ok(()) })
    }
}

#[tokio::test(flavor = "multi_thread")]
async fn fetched_bytes_are_stored_once_per_cache_class() {
    enable_tracing();
    let transport = MemTransport::new(MemTransportConfig {
        progress_chunks: 2,
        chunk_delay_ms: 20,
    });
    transport.seed(test_address("bird.png"), png_bytes(16, 16));
    let cache = Arc::new(CountingCache::default());
    let loader = make_loader(
        CoreLoaderConfig::default(),
        transport.clone(),
        Some(cache.clone()),
    );

    let sink = RecordingSink::new();
    // one shared fetch carrying two distinct cacheable outputs
    let a = LoadTask::new(
        test_request("bird.png").with_target_size(10, 10),
        sink.clone(),
    );
    let b = LoadTask::new(
        test_request("bird.png").with_target_size(20, 20),
        sink.clone(),
    );
    let c = LoadTask::new(
        test_request("bird.png").with_target_size(10, 10),
        sink.clone(),
    );
    loader.submit(a).await.unwrap();
    loader.submit(b).await.unwrap();
    loader.submit(c).await.unwrap();

    iter_check!(2000, {
        if sink.completion_count() == 3 {
            break;
        }
    });

    assert_eq!(1, transport.fetch_count());
    // a and c share one cache class, b has its own
    assert_eq!(2, cache.stores.lock().unwrap().len());
}
