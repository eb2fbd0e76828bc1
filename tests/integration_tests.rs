//! Integration tests for the worker pool.

use html2pdf_pool::factory::mock::{MockRendererFactory, mock_pdf_bytes};
use html2pdf_pool::prelude::*;
use std::thread;
use std::time::{Duration, Instant};

fn build_pool(size: usize, factory: MockRendererFactory) -> SharedWorkerPool {
    WorkerPool::builder()
        .config(
            WorkerPoolConfigBuilder::new()
                .pool_size(size)
                .build()
                .unwrap(),
        )
        .factory(Box::new(factory))
        .build()
        .unwrap()
        .into_shared()
}

fn submit_all(pool: &SharedWorkerPool, docs: Vec<String>) -> Vec<(String, Result<Vec<u8>>)> {
    let threads: Vec<_> = docs
        .into_iter()
        .map(|html| {
            let pool = pool.clone();
            thread::spawn(move || {
                let result = pool.submit(html.clone());
                (html, result)
            })
        })
        .collect();

    threads.into_iter().map(|t| t.join().unwrap()).collect()
}

/// Three documents on five workers each come back to their own caller.
#[test]
fn test_each_caller_gets_its_own_pdf() {
    let pool = build_pool(5, MockRendererFactory::new());

    let docs = vec!["<p>A</p>", "<p>B</p>", "<p>C</p>"]
        .into_iter()
        .map(String::from)
        .collect();

    for (html, result) in submit_all(&pool, docs) {
        assert_eq!(result.unwrap(), mock_pdf_bytes(&html));
    }

    pool.shutdown().unwrap();
}

/// One worker renders ten 50ms documents strictly one after another.
#[test]
fn test_single_worker_serializes_renders() {
    let factory = MockRendererFactory::new().with_delay(Duration::from_millis(50));
    let stats = factory.stats();
    let pool = build_pool(1, factory);

    let docs = (0..10).map(|i| format!("<p>{}</p>", i)).collect();

    let started = Instant::now();
    let results = submit_all(&pool, docs);
    let elapsed = started.elapsed();

    assert!(results.iter().all(|(_, r)| r.is_ok()));
    assert!(
        elapsed >= Duration::from_millis(500),
        "Ten serialized renders finished in {:?}",
        elapsed
    );
    assert_eq!(stats.max_concurrent_renders(), 1);

    pool.shutdown().unwrap();
}

/// Blank HTML is rejected before it reaches the renderer.
#[test]
fn test_blank_html_rejected() {
    let factory = MockRendererFactory::new();
    let stats = factory.stats();
    let pool = build_pool(2, factory);

    assert!(matches!(pool.submit(""), Err(RenderPoolError::InvalidInput)));
    assert!(matches!(pool.submit(" \n "), Err(RenderPoolError::InvalidInput)));

    assert_eq!(stats.pages_opened(), 0);
    assert_eq!(pool.stats().queued, 0);

    pool.shutdown().unwrap();
}

/// Submissions after shutdown are refused.
#[test]
fn test_submit_after_shutdown() {
    let pool = build_pool(2, MockRendererFactory::new());
    pool.shutdown().unwrap();

    assert!(matches!(
        pool.submit("<p>late</p>"),
        Err(RenderPoolError::PoolClosed)
    ));
    assert_eq!(pool.stats().queued, 0);
}

/// A second shutdown returns AlreadyClosed without waiting for the first.
#[test]
fn test_second_shutdown_returns_immediately() {
    let factory = MockRendererFactory::new().with_delay(Duration::from_millis(300));
    let stats = factory.stats();
    let pool = build_pool(1, factory);

    let submitter = {
        let pool = pool.clone();
        thread::spawn(move || pool.submit("<p>slow</p>"))
    };
    thread::sleep(Duration::from_millis(30));

    let closer = {
        let pool = pool.clone();
        thread::spawn(move || pool.shutdown())
    };
    thread::sleep(Duration::from_millis(30));

    let started = Instant::now();
    assert!(matches!(pool.shutdown(), Err(RenderPoolError::AlreadyClosed)));
    assert!(
        started.elapsed() < Duration::from_millis(150),
        "Second shutdown blocked for {:?}",
        started.elapsed()
    );

    pool.await_termination();
    assert!(pool.is_terminated());

    // Accepted before shutdown, so it completes
    assert!(submitter.join().unwrap().is_ok());
    assert!(closer.join().unwrap().is_ok());
    assert_eq!(stats.sessions_closed(), 1);
}

/// Every task yields exactly one result, and it is the right one.
#[test]
fn test_no_lost_or_duplicated_results() {
    let factory = MockRendererFactory::new().with_delay(Duration::from_millis(5));
    let stats = factory.stats();
    let pool = build_pool(4, factory);

    let docs = (0..40).map(|i| format!("<h1>doc {}</h1>", i)).collect();
    let results = submit_all(&pool, docs);

    assert_eq!(results.len(), 40);
    for (html, result) in &results {
        assert_eq!(result.as_ref().unwrap(), &mock_pdf_bytes(html));
    }
    assert_eq!(stats.renders_completed(), 40);
    assert_eq!(pool.stats().completed, 40);

    pool.shutdown().unwrap();
}

/// Renders overlap, but never more than pool_size at once.
#[test]
fn test_concurrency_bounded_by_pool_size() {
    let factory = MockRendererFactory::new().with_delay(Duration::from_millis(30));
    let stats = factory.stats();
    let pool = build_pool(3, factory);

    let docs = (0..12).map(|i| format!("<p>{}</p>", i)).collect();
    let results = submit_all(&pool, docs);

    assert!(results.iter().all(|(_, r)| r.is_ok()));
    assert!(stats.max_concurrent_renders() <= 3);
    assert!(
        stats.max_concurrent_renders() > 1,
        "Renders never overlapped on a session that allows it"
    );
    assert!(pool.stats().in_flight <= 3);

    pool.shutdown().unwrap();
}

/// A renderer that cannot overlap pages caps the pool at one render.
#[test]
fn test_serial_renderer_caps_concurrency() {
    let factory = MockRendererFactory::new()
        .serial()
        .with_delay(Duration::from_millis(10));
    let stats = factory.stats();
    let pool = build_pool(4, factory);

    let docs = (0..8).map(|i| format!("<p>{}</p>", i)).collect();
    let results = submit_all(&pool, docs);

    assert!(results.iter().all(|(_, r)| r.is_ok()));
    assert_eq!(stats.max_concurrent_renders(), 1);

    pool.shutdown().unwrap();
}

/// A failing document only fails its own caller.
#[test]
fn test_render_failure_is_isolated() {
    let pool = build_pool(3, MockRendererFactory::new().fail_on("broken"));

    let docs = vec!["<p>one</p>", "<p>broken</p>", "<p>three</p>"]
        .into_iter()
        .map(String::from)
        .collect();

    for (html, result) in submit_all(&pool, docs) {
        if html.contains("broken") {
            assert!(matches!(result, Err(RenderPoolError::RenderFailed(_))));
        } else {
            assert_eq!(result.unwrap(), mock_pdf_bytes(&html));
        }
    }

    assert!(pool.submit("<p>after</p>").is_ok());
    assert_eq!(pool.stats().failed, 1);

    pool.shutdown().unwrap();
}

/// After the session is lost, every later task fails with NotReady.
#[test]
fn test_session_loss_fails_later_tasks() {
    let factory = MockRendererFactory::new().fatal_on("crash");
    let stats = factory.stats();
    let pool = build_pool(2, factory);

    let err = pool.submit("<p>crash</p>").unwrap_err();
    assert!(matches!(err, RenderPoolError::SessionLost(_)));
    assert!(err.is_session_fatal());

    for i in 0..3 {
        assert!(matches!(
            pool.submit(format!("<p>{}</p>", i)),
            Err(RenderPoolError::NotReady)
        ));
    }

    assert_eq!(stats.sessions_closed(), 1);
    assert!(pool.ping().is_err());

    // Pool teardown still works with the session already gone
    pool.shutdown().unwrap();
    assert_eq!(stats.sessions_closed(), 1);
}

/// A panicking render is reported and the worker keeps serving.
#[test]
fn test_worker_survives_renderer_panic() {
    let pool = build_pool(1, MockRendererFactory::new().panic_on("explode"));

    assert!(matches!(
        pool.submit("<p>explode</p>"),
        Err(RenderPoolError::RenderFailed(_))
    ));
    assert!(pool.submit("<p>calm</p>").is_ok());

    pool.shutdown().unwrap();
}

/// Work accepted before shutdown completes, the rest is refused.
#[test]
fn test_shutdown_drains_accepted_tasks() {
    let factory = MockRendererFactory::new().with_delay(Duration::from_millis(50));
    let stats = factory.stats();
    let pool = build_pool(2, factory);

    let submitters: Vec<_> = (0..6)
        .map(|i| {
            let pool = pool.clone();
            thread::spawn(move || pool.submit(format!("<p>{}</p>", i)))
        })
        .collect();

    thread::sleep(Duration::from_millis(10));
    pool.shutdown().unwrap();

    let mut completed = 0;
    for submitter in submitters {
        match submitter.join().unwrap() {
            Ok(_) => completed += 1,
            Err(RenderPoolError::PoolClosed) => {}
            Err(e) => panic!("Unexpected error during drain: {:?}", e),
        }
    }

    assert!(completed >= 1);
    assert_eq!(stats.renders_completed(), completed);
    assert_eq!(stats.current_renders(), 0);
    assert!(pool.is_terminated());
}

/// A factory that cannot establish a session yields no pool.
#[test]
fn test_pool_init_failure() {
    let result = WorkerPool::builder()
        .factory(Box::new(MockRendererFactory::always_fails("Chrome missing")))
        .build();

    match result {
        Err(RenderPoolError::InitFailed(msg)) => assert!(msg.contains("Chrome missing")),
        other => panic!("Expected InitFailed, got {:?}", other.map(|_| ())),
    }
}
