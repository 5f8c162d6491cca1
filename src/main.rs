//! Process entry point: CLI parsing, signal wiring, and supervisor startup.

use std::sync::Arc;
use std::time::Duration;

use clap::Parser;
use tokio_util::sync::CancellationToken;

use feedguard::{
    spawn_listener, wait_for_shutdown_signal, Bus, Config, ConsoleWriter, Escalator, Event,
    EventKind, IncidentApi, PagerTreeApi, Subscribe, Supervisor, TcpTransport,
};

/// Command line options.
#[derive(Parser, Debug)]
#[command(name = "feedguard", version, about = "Keep-alive monitor for a streaming feed endpoint")]
struct Options {
    /// Feed host to monitor: a literal IP address or a DNS name.
    #[arg(long, default_value = "127.0.0.1")]
    host: String,

    /// Feed port to monitor.
    #[arg(short = 'x', long, default_value_t = 9300)]
    port: u16,

    /// Incident integration id; when present, outages open an incident.
    #[arg(long)]
    incident_id: Option<String>,
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let opts = Options::parse();

    let cfg = Config {
        host: opts.host,
        port: opts.port,
        incident_id: opts.incident_id,
        ..Config::default()
    };
    cfg.validate()?;

    let bus = Bus::new(cfg.bus_capacity_clamped());
    let subs: Vec<Arc<dyn Subscribe>> = vec![Arc::new(ConsoleWriter)];
    let listener = spawn_listener(&bus, subs);

    let api: Option<Arc<dyn IncidentApi>> = cfg
        .incident_id
        .as_deref()
        .map(|id| Arc::new(PagerTreeApi::new(id)) as Arc<dyn IncidentApi>);
    let escalator = Escalator::new(api, bus.clone());
    let mut supervisor = Supervisor::new(cfg, TcpTransport::factory(), escalator, bus.clone());

    // OS interrupt → cancellation; the core only ever sees the token.
    let token = CancellationToken::new();
    let canceller = token.clone();
    let signal_bus = bus.clone();
    tokio::spawn(async move {
        if wait_for_shutdown_signal().await.is_ok() {
            signal_bus.publish(Event::now(EventKind::ShutdownRequested));
            canceller.cancel();
        }
    });

    supervisor.run(token).await;

    // Drop every bus sender so the listener drains and exits, flushing the
    // farewell line before the process ends.
    drop(supervisor);
    drop(bus);
    let _ = tokio::time::timeout(Duration::from_secs(1), listener).await;

    Ok(())
}
