use super::{capturing_transport, make_loader, CoreLoaderConfig, TestHandle};
use crate::common::StdRequestPolicy;
use crate::factories::mem_byte_cache::{MemByteCache, MemByteCacheConfig};
use crate::factories::mem_transport::{MemTransport, MemTransportConfig};
use bytes::Bytes;
use pictor_api::*;
use pictor_test_utils::{
    enable_tracing, iter_check, png_bytes,
    request::{test_address, test_request},
    sink::RecordingSink,
};
use std::sync::{Arc, Mutex};
use std::time::Duration;

fn mem_cache() -> Arc<MemByteCache> {
    let policy: DynRequestPolicy = Arc::new(StdRequestPolicy);
    Arc::new(MemByteCache::new(MemByteCacheConfig::default(), policy))
}

#[tokio::test(flavor = "multi_thread")]
async fn cache_hit_skips_the_fetch_stage() {
    enable_tracing();
    let transport = MemTransport::new(MemTransportConfig::default());
    let cache = mem_cache();
    let request = test_request("cat.png");
    cache
        .store(png_bytes(12, 12), Arc::new(request.clone()))
        .await
        .unwrap();
    let loader = make_loader(
        CoreLoaderConfig::default(),
        transport.clone(),
        Some(cache),
    );

    let sink = RecordingSink::new();
    let task = LoadTask::new(request, sink.clone());
    let task_id = task.id;
    loader.submit(task).await.unwrap();

    iter_check!(2000, {
        if sink.completion_for(task_id).is_some() {
            break;
        }
    });

    let img = sink.completion_for(task_id).unwrap().unwrap();
    assert_eq!((12, 12), (img.width(), img.height()));
    // the transport was never asked for anything
    assert_eq!(0, transport.fetch_count());
}

#[tokio::test(flavor = "multi_thread")]
async fn fetch_error_is_shared_by_all_attached_tasks() {
    enable_tracing();
    let captured: Arc<Mutex<Vec<DynFetchEvents>>> =
        Arc::new(Mutex::new(Vec::new()));
    let handle = Arc::new(TestHandle::default());
    let transport = capturing_transport(captured.clone(), handle);
    let loader = make_loader(CoreLoaderConfig::default(), transport, None);

    let sink = RecordingSink::new();
    let a = LoadTask::new(test_request("cat.png"), sink.clone());
    let b = LoadTask::new(test_request("cat.png"), sink.clone());
    let (a_id, b_id) = (a.id, b.id);
    loader.submit(a).await.unwrap();
    loader.submit(b).await.unwrap();

    iter_check!({
        if !captured.lock().unwrap().is_empty() {
            break;
        }
    });

    let events = captured.lock().unwrap()[0].clone();
    events.on_complete(Err(PicError::transport("connection reset")));

    iter_check!(2000, {
        if sink.completion_count() == 2 {
            break;
        }
    });

    assert_eq!(1, captured.lock().unwrap().len());
    for id in [a_id, b_id] {
        let err = sink.completion_for(id).unwrap().unwrap_err();
        assert!(matches!(err, PicError::Transport { .. }), "got {err}");
    }
}

#[tokio::test(flavor = "multi_thread")]
async fn undecodable_bytes_fail_with_decoding_error() {
    enable_tracing();
    let transport = MemTransport::new(MemTransportConfig::default());
    transport
        .seed(test_address("junk.bin"), Bytes::from_static(b"not an image"));
    let loader =
        make_loader(CoreLoaderConfig::default(), transport.clone(), None);

    let sink = RecordingSink::new();
    let task = LoadTask::new(test_request("junk.bin"), sink.clone());
    let task_id = task.id;
    loader.submit(task).await.unwrap();

    iter_check!(2000, {
        if sink.completion_for(task_id).is_some() {
            break;
        }
    });

    let err = sink.completion_for(task_id).unwrap().unwrap_err();
    assert!(matches!(err, PicError::DecodingFailed { .. }), "got {err}");
}

#[tokio::test(flavor = "multi_thread")]
async fn failing_processing_step_fails_with_processing_error() {
    enable_tracing();
    let transport = MemTransport::new(MemTransportConfig::default());
    transport.seed(test_address("cat.png"), png_bytes(8, 8));
    let loader =
        make_loader(CoreLoaderConfig::default(), transport.clone(), None);

    let sink = RecordingSink::new();
    // a zero-sized resize target can never produce an image
    let task = LoadTask::new(
        test_request("cat.png").with_target_size(0, 10),
        sink.clone(),
    );
    let task_id = task.id;
    loader.submit(task).await.unwrap();

    iter_check!(2000, {
        if sink.completion_for(task_id).is_some() {
            break;
        }
    });

    let err = sink.completion_for(task_id).unwrap().unwrap_err();
    assert!(matches!(err, PicError::ProcessingFailed { .. }), "got {err}");
}

#[tokio::test(flavor = "multi_thread")]
async fn late_attacher_receives_replayed_progress() {
    enable_tracing();
    let transport = MemTransport::new(MemTransportConfig {
        progress_chunks: 2,
        chunk_delay_ms: 60,
    });
    transport.seed(test_address("cat.png"), png_bytes(8, 8));
    let loader =
        make_loader(CoreLoaderConfig::default(), transport.clone(), None);

    let sink = RecordingSink::new();
    let a = LoadTask::new(test_request("cat.png"), sink.clone());
    let a_id = a.id;
    loader.submit(a).await.unwrap();

    // attach the second task only after the fetch made progress
    iter_check!({
        if !sink.progress_for(a_id).is_empty() {
            break;
        }
    });
    let b = LoadTask::new(test_request("cat.png"), sink.clone());
    let b_id = b.id;
    loader.submit(b).await.unwrap();

    iter_check!(2000, {
        if sink.completion_count() == 2 {
            break;
        }
    });

    assert_eq!(1, transport.fetch_count());
    // the replayed update closed the gap: both saw the same stream
    assert_eq!(sink.progress_for(a_id), sink.progress_for(b_id));
}

#[tokio::test(flavor = "multi_thread")]
async fn invalidate_and_clear_cache_propagate_to_collaborators() {
    enable_tracing();
    let transport = MemTransport::new(MemTransportConfig::default());
    let cache = mem_cache();
    cache
        .store(png_bytes(4, 4), Arc::new(test_request("cat.png")))
        .await
        .unwrap();
    let loader = make_loader(
        CoreLoaderConfig::default(),
        transport.clone(),
        Some(cache.clone()),
    );

    loader.invalidate();
    assert_eq!(1, transport.invalidate_count());
    // invalidation does not touch the byte cache
    assert!(!cache.is_empty());

    loader.clear_cache().await.unwrap();
    assert!(cache.is_empty());
    assert_eq!(1, transport.clear_cache_count());
}

#[tokio::test(flavor = "multi_thread")]
async fn submit_is_idempotent_per_task_id() {
    enable_tracing();
    let transport = MemTransport::new(MemTransportConfig {
        progress_chunks: 2,
        chunk_delay_ms: 20,
    });
    transport.seed(test_address("cat.png"), png_bytes(8, 8));
    let loader =
        make_loader(CoreLoaderConfig::default(), transport.clone(), None);

    let sink = RecordingSink::new();
    let task = LoadTask::new(test_request("cat.png"), sink.clone());
    loader.submit(task.clone()).await.unwrap();
    loader.submit(task).await.unwrap();

    iter_check!(2000, {
        if sink.completion_count() == 1 {
            break;
        }
    });
    tokio::time::sleep(Duration::from_millis(50)).await;

    assert_eq!(1, transport.fetch_count());
    assert_eq!(1, sink.completion_count());
}
