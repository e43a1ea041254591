//! Basic walkthrough: subscribe, filter, weak subscriptions, async publish.
//!
//! Run with: `cargo run --example pingpong`

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use typebus::{HandlerRef, Hub, Message, SubscribeOptions};

struct Ping {
    seq: u64,
}
impl Message for Ping {}

#[tokio::main(flavor = "multi_thread")]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .init();

    let hub = Hub::new();

    // Plain subscription: sees every Ping.
    let all = hub.subscribe(|p: &Ping| println!("[all] ping #{}", p.seq));

    // Filtered subscription: even sequence numbers only.
    let evens = hub.subscribe_with(
        SubscribeOptions::new(|p: &Ping| println!("[even] ping #{}", p.seq))
            .with_filter(|p| p.seq % 2 == 0),
    );

    // Weak subscription: expires as soon as we drop our handler Arc.
    let counted = Arc::new(AtomicU64::new(0));
    let count = Arc::clone(&counted);
    let weak_handler: HandlerRef<Ping> = Arc::new(move |_| {
        count.fetch_add(1, Ordering::Relaxed);
    });
    let _weak = hub.subscribe_with(SubscribeOptions::weak(&weak_handler));

    for seq in 1..=4 {
        hub.publish(Ping { seq });
    }
    println!("weak handler saw {} pings", counted.load(Ordering::Relaxed));

    drop(weak_handler);
    hub.publish(Ping { seq: 5 });
    println!(
        "after dropping the handler it still saw {} (expired subscriptions are swept)",
        counted.load(Ordering::Relaxed)
    );

    // Fire-and-forget publishing; the completion is awaitable when needed.
    let completion = hub.publish_async(Ping { seq: 6 });
    completion.await?;

    evens.release();
    all.release();
    println!(
        "done: {} publishes, {} contained failures",
        hub.published_count(),
        hub.failed_delivery_count()
    );
    Ok(())
}
