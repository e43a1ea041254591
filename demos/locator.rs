//! Composition-root wiring through the optional global locator.
//!
//! Run with: `cargo run --example locator --features locator`

use typebus::{locator, Hub, Message};

struct AppStarted {
    name: &'static str,
}
impl Message for AppStarted {}

#[tokio::main(flavor = "current_thread")]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .init();

    // The composition root installs the one hub...
    locator::install(Hub::new())?;

    // ...and components far away reach it without plumbing.
    let token = locator::subscribe(|m: &AppStarted| {
        println!("component saw startup of {}", m.name);
    });

    locator::publish(AppStarted { name: "demo" });

    token.release();
    locator::reset();
    Ok(())
}
