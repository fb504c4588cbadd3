//! # Example: chained
//!
//! Demonstrates a two-step chain tracked by a pipeline.
//!
//! Shows how to:
//! - Gate a task on a predecessor with [`MutableTask::with_predecessor`]
//! - Look tasks up by name while they run
//! - Read terminal history after they finish
//! - Cancel a hanging task and observe the belated result being rejected
//!
//! ## Flow
//! ```text
//! main()
//!   ├─► insert "download" (future, 300ms) and "unpack" (after download)
//!   ├─► start both; unpack waits for download
//!   ├─► lookup("download") while running
//!   ├─► download succeeds ─► unpack body runs ─► unpack succeeds
//!   └─► insert "stuck" (never resolves) ─► pipeline.cancel("stuck")
//! ```
//!
//! ## Run
//! ```bash
//! RUST_LOG=info cargo run --example chained --features logging
//! ```

use std::sync::Arc;
use std::time::Duration;

use taskpipe::{Cancellable, MutableTask, Pipeline, Progress, Status, Subscribe};
use tokio_util::sync::CancellationToken;
use tracing_subscriber::EnvFilter;

#[tokio::main(flavor = "current_thread")]
async fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .init();

    println!("=== chained example ===\n");

    // 1. Pipeline, optionally with the logging subscriber (requires "logging" feature)
    let pipeline = Pipeline::default();

    #[cfg(feature = "logging")]
    let subs: Vec<Arc<dyn Subscribe>> = vec![Arc::new(taskpipe::LogWriter)];
    #[cfg(not(feature = "logging"))]
    let subs: Vec<Arc<dyn Subscribe>> = Vec::new();
    let _guards: Vec<Cancellable> = subs
        .into_iter()
        .map(|s| pipeline.spawn_subscriber(s))
        .collect();

    let _watch = pipeline.on_status_of("unpack", |status| {
        println!("[watch] unpack -> {status}");
    });

    // 2. Download: a future that reports progress through its task handle
    let download = MutableTask::<usize, String>::new(|task| {
        let handle = tokio::spawn(async move {
            for done in 1..=3 {
                tokio::time::sleep(Duration::from_millis(100)).await;
                let _ = task.progress(Some(Progress::new(done, 3)));
            }
            let _ = task.succeed(1024);
        });
        handle.into()
    });

    // 3. Unpack runs only after download succeeded
    let unpack = MutableTask::<String, String>::from_action(|| "unpacked 1024 bytes".into())
        .with_predecessor(download.to_ref());

    pipeline.insert(&download, "download").expect("fresh task");
    pipeline.insert(&unpack, "unpack").expect("fresh task");

    unpack.start();
    download.start();

    if let Some(task) = pipeline.lookup("download") {
        println!("[main] download is live: {}", task.status_description());
    }

    match unpack.wait().await {
        Status::Success(msg) => println!("[main] unpack finished: {msg}"),
        other => println!("[main] unpack ended as {}", other.description()),
    }
    println!("[main] download history: {:?}", pipeline.history("download"));

    // 4. A task that never resolves on its own
    let token = CancellationToken::new();
    let body_token = token.clone();
    let stuck = MutableTask::<(), String>::new(move |_task| body_token.into());
    pipeline.insert(&stuck, "stuck").expect("fresh task");
    stuck.start();

    pipeline.cancel("stuck");
    println!("[main] stuck body token cancelled: {}", token.is_cancelled());
    if let Err(e) = stuck.succeed(()) {
        println!("[main] belated result rejected: {e}");
    }

    println!("[main] live tasks: {:?}", pipeline.live_names());
    println!("\n=== done ===");
}
