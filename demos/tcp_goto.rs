//! GoTo over a network-attached AUX bus.
//!
//! Connects to a WiFi mount adapter (or a simulator) that exposes the AUX
//! bus on a TCP port, slews to a star, tracks it for a while and parks.
//!
//! ```text
//! RUST_LOG=aux_mount=debug cargo run --example tcp_goto -- 1.2.3.4:2000 [mount.toml]
//! ```

use std::time::Duration;

use tracing::info;
use tracing_subscriber::EnvFilter;

use aux_mount::{CoordSetMode, Degrees, Hours, Mount, StreamTransport, Target};

#[tokio::main]
async fn main() -> aux_mount::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .init();

    let mut args = std::env::args().skip(1);
    let address = args.next().unwrap_or_else(|| "1.2.3.4:2000".to_string());

    let transport = StreamTransport::connect(&address, Duration::from_secs(1)).await?;
    let mut builder = Mount::builder(transport);
    if let Some(path) = args.next() {
        builder = builder.config_file(path)?;
    }
    let mount = builder.build()?;

    let position = mount.read_position().await?;
    info!(azm = position.azm, alt = position.alt, "connected to {address}");

    // Vega
    let target = Target::sidereal(Hours(18.6156), Degrees(38.7836));
    mount.goto_equatorial(target, CoordSetMode::Track).await?;
    info!("on target, tracking for 30 s");

    for _ in 0..6 {
        tokio::time::sleep(Duration::from_secs(5)).await;
        let status = mount.poll_status().await?;
        info!(
            ra = status.equatorial.ra.value(),
            dec = status.equatorial.dec.value(),
            tracking = status.tracking,
            "status"
        );
    }

    mount.set_tracking(false).await?;
    mount.park().await?;
    info!("done");
    Ok(())
}
