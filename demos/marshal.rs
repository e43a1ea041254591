//! Marshalled delivery: handlers hop onto a dedicated execution context.
//!
//! Run with: `cargo run --example marshal`

use std::sync::Arc;
use std::time::Duration;

use typebus::{ContextDispatcher, Dispatch, Hub, MarshalProxy, Message, SubscribeOptions};

struct Redraw {
    frame: u32,
}
impl Message for Redraw {}

#[tokio::main(flavor = "multi_thread")]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .init();

    let hub = Hub::new();

    // One context plays the role of a UI loop: every Redraw handler runs
    // there, no matter which thread publishes.
    let ui = ContextDispatcher::spawn();

    let probe = Arc::clone(&ui);
    let _token = hub.subscribe_with(
        SubscribeOptions::new(move |r: &Redraw| {
            assert!(probe.is_on_context());
            println!("redraw frame {} on the ui context", r.frame);
        })
        .with_proxy(Arc::new(MarshalProxy::new(
            Arc::clone(&ui) as Arc<dyn Dispatch>
        ))),
    );

    // Publish from a couple of worker threads; publish returns immediately
    // after hand-off, deliveries queue up on the ui context.
    let mut workers = Vec::new();
    for frame in 0..3 {
        let publisher = hub.clone();
        workers.push(std::thread::spawn(move || {
            publisher.publish(Redraw { frame });
        }));
    }
    for worker in workers {
        worker.join().expect("publisher thread");
    }

    // Delayed scheduling through the same context.
    ui.run_after(
        Duration::from_millis(50),
        Box::new(|| println!("deferred vsync tick")),
    )
    .await?;

    ui.shutdown().await;
    Ok(())
}
