//! A runnable multi-process demo of `groupcache-rs`.
//!
//! Three subcommands:
//!
//! - `demo` (the default: `cargo run --bin groupcache-demo`) spawns a
//!   three-node ring as child processes on loopback, drives sample traffic
//!   against it, prints what it observes, then tears the ring down. One
//!   command, no manual coordination.
//! - `serve` runs a single cache node, for wiring up a real multi-host
//!   cluster by hand (one terminal per node):
//!   ```text
//!   groupcache-demo serve --self-addr http://127.0.0.1:8001 \
//!       --peers http://127.0.0.1:8001,http://127.0.0.1:8002,http://127.0.0.1:8003
//!   ```
//! - `drive` is the client half of that: fire sample reads at an
//!   already-running cluster and report what each peer returns.
//!
//! There's no build/deploy tooling here on purpose — it mirrors the
//! reference source's own bare unit test, not a production bootstrap.

use std::net::SocketAddr;
use std::sync::Arc;
use std::time::{Duration, Instant};

use clap::{Parser, Subcommand};
use groupcache_rs::group::{loader_fn, Group};
use groupcache_rs::peer::PeerGetter;
use groupcache_rs::transport::http::{router, HttpPeerGetter, HttpPeerPool, DEFAULT_BASE_PATH};
use rand::Rng;
use tracing::info;

const DEFAULT_GROUP: &str = "demo";
const DEMO_PORTS: [u16; 3] = [18001, 18002, 18003];

#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
struct Args {
    #[command(subcommand)]
    command: Option<Command>,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Boot a self-contained three-node ring, drive it, tear it down.
    Demo(DemoArgs),
    /// Run one cache node, serving peer requests over HTTP and joining the
    /// consistent-hash ring described by `--peers`.
    Serve(ServeArgs),
    /// Fire sample reads at an already-running cluster and report what each
    /// peer returns.
    Drive(DriveArgs),
}

#[derive(Parser, Debug, Clone)]
struct DemoArgs {
    /// Cache namespace the ring serves.
    #[arg(long, default_value = DEFAULT_GROUP)]
    group: String,

    /// Number of distinct keys to sample once the ring is up.
    #[arg(long, default_value_t = 8)]
    keys: usize,

    /// Concurrent requests fired per key, to show single-flight coalescing.
    #[arg(long, default_value_t = 20)]
    concurrency: usize,

    /// Loopback ports the three nodes bind to.
    #[arg(long, value_delimiter = ',', default_value = "18001,18002,18003")]
    ports: Vec<u16>,
}

impl Default for DemoArgs {
    fn default() -> Self {
        Self {
            group: DEFAULT_GROUP.to_string(),
            keys: 8,
            concurrency: 20,
            ports: DEMO_PORTS.to_vec(),
        }
    }
}

#[derive(Parser, Debug)]
struct ServeArgs {
    /// This node's own address, as the rest of the cluster names it, e.g.
    /// `http://127.0.0.1:8001`. Must appear verbatim in `--peers`.
    #[arg(long)]
    self_addr: String,

    /// The full cluster membership, including this node's own `--self-addr`,
    /// comma-separated.
    #[arg(long, value_delimiter = ',')]
    peers: Vec<String>,

    /// Cache namespace this node serves.
    #[arg(long, default_value = DEFAULT_GROUP)]
    group: String,

    /// Byte budget for this node's local LRU.
    #[arg(long, default_value_t = 1 << 20)]
    max_bytes: usize,

    /// Simulated backend floor latency in milliseconds, for the demo
    /// loader's artificial "slow database" delay.
    #[arg(long, default_value_t = 15)]
    backend_latency_floor_ms: u64,

    /// Simulated backend jitter in milliseconds, added on top of the floor.
    #[arg(long, default_value_t = 35)]
    backend_latency_jitter_ms: u64,
}

#[derive(Parser, Debug, Clone)]
struct DriveArgs {
    /// Every peer's address, comma-separated; requests are spread across
    /// all of them to show that the answer for a given key doesn't depend
    /// on which peer you ask.
    #[arg(long, value_delimiter = ',')]
    peers: Vec<String>,

    /// Cache namespace to query.
    #[arg(long, default_value = DEFAULT_GROUP)]
    group: String,

    /// Number of distinct keys to sample.
    #[arg(long, default_value_t = 8)]
    keys: usize,

    /// Concurrent requests fired per key, all against the same peer, to
    /// show single-flight coalescing collapsing them into one backend load
    /// on whichever node owns that key.
    #[arg(long, default_value_t = 20)]
    concurrency: usize,
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .init();

    let args = Args::parse();
    match args.command.unwrap_or_else(|| Command::Demo(DemoArgs::default())) {
        Command::Demo(args) => run_demo(args).await,
        Command::Serve(args) => serve(args).await,
        Command::Drive(args) => drive(args).await,
    }
}

/// Spawns `serve` as three child processes on loopback, waits for them to
/// come up, runs the same traffic [`drive`] would against an externally-run
/// cluster, then kills the children.
async fn run_demo(args: DemoArgs) -> Result<(), Box<dyn std::error::Error>> {
    let current_exe = std::env::current_exe()?;
    let self_addrs: Vec<String> = args.ports.iter().map(|p| format!("http://127.0.0.1:{p}")).collect();
    let peers_csv = self_addrs.join(",");

    info!(nodes = ?self_addrs, "booting demo ring");
    let mut children = Vec::with_capacity(self_addrs.len());
    for addr in &self_addrs {
        let child = tokio::process::Command::new(&current_exe)
            .args([
                "serve",
                "--self-addr",
                addr,
                "--peers",
                &peers_csv,
                "--group",
                &args.group,
            ])
            .kill_on_drop(true)
            .spawn()?;
        children.push(child);
    }

    // Give the listeners a moment to bind before driving traffic at them;
    // the demo has no separate readiness probe, matching its "one command,
    // no coordination" scope.
    tokio::time::sleep(Duration::from_millis(400)).await;

    let drive_result = drive(DriveArgs {
        peers: self_addrs,
        group: args.group,
        keys: args.keys,
        concurrency: args.concurrency,
    })
    .await;

    for mut child in children {
        let _ = child.start_kill();
        let _ = child.wait().await;
    }

    drive_result
}

async fn serve(args: ServeArgs) -> Result<(), Box<dyn std::error::Error>> {
    let base_path = DEFAULT_BASE_PATH;
    let self_full = format!("{}{base_path}", args.self_addr.trim_end_matches('/'));
    let peer_fulls: Vec<String> = args
        .peers
        .iter()
        .map(|p| format!("{}{base_path}", p.trim_end_matches('/')))
        .collect();

    let floor = args.backend_latency_floor_ms;
    let jitter = args.backend_latency_jitter_ms;
    let self_addr_for_log = args.self_addr.clone();
    let group = Group::new(
        args.group.clone(),
        args.max_bytes,
        loader_fn(move |key: &str| {
            let key = key.to_string();
            let self_addr_for_log = self_addr_for_log.clone();
            async move {
                let delay = floor + rand::thread_rng().gen_range(0..=jitter.max(1));
                tokio::time::sleep(Duration::from_millis(delay)).await;
                info!(node = %self_addr_for_log, key, delay_ms = delay, "loaded from simulated backend");
                Ok(bytes::Bytes::from(format!("value-for-{key}")))
            }
        }),
    );

    let pool = Arc::new(HttpPeerPool::new(self_full.clone()));
    pool.set_peers(peer_fulls);
    group.register_peers(pool);

    let listen_addr = addr_to_socket(&args.self_addr)?;
    info!(%listen_addr, self_addr = %args.self_addr, group = %args.group, "starting groupcache node");

    let app = axum::Router::new().nest(base_path.trim_end_matches('/'), router());
    let listener = tokio::net::TcpListener::bind(listen_addr).await?;
    axum::serve(listener, app).await?;
    Ok(())
}

async fn drive(args: DriveArgs) -> Result<(), Box<dyn std::error::Error>> {
    if args.peers.is_empty() {
        return Err("drive requires at least one --peers address".into());
    }
    let base_path = DEFAULT_BASE_PATH;
    let client = reqwest::Client::new();
    let getters: Vec<HttpPeerGetter> = args
        .peers
        .iter()
        .map(|p| HttpPeerGetter::new(client.clone(), format!("{}{base_path}", p.trim_end_matches('/'))))
        .collect();

    for i in 0..args.keys {
        let key = format!("key-{i}");

        // Ask every peer for the same key: the answer must agree regardless
        // of which peer in the cluster fields the request, since ownership
        // is determined solely by the ring, not by who you happen to ask.
        let mut answers = Vec::new();
        for (peer_addr, getter) in args.peers.iter().zip(&getters) {
            let started = Instant::now();
            let value = getter.get(&args.group, &key).await?;
            answers.push((peer_addr.clone(), value, started.elapsed()));
        }
        let first_value = answers[0].1.clone();
        for (peer_addr, value, elapsed) in &answers {
            println!("{key} via {peer_addr} -> {:?} ({elapsed:?})", String::from_utf8_lossy(value));
            assert_eq!(value, &first_value, "same key must resolve to the same value from every peer");
        }

        // Fire a burst of concurrent requests for one fresh key at a single
        // peer: with single-flight coalescing, all of them should complete
        // in roughly the time of one backend load, not `concurrency` of them.
        let burst_key = format!("burst-{i}");
        let target_peer = &args.peers[i % args.peers.len()];
        let target = HttpPeerGetter::new(client.clone(), format!("{}{base_path}", target_peer.trim_end_matches('/')));
        let target = Arc::new(target);
        let started = Instant::now();
        let mut handles = Vec::with_capacity(args.concurrency);
        for _ in 0..args.concurrency {
            let target = target.clone();
            let group = args.group.clone();
            let burst_key = burst_key.clone();
            handles.push(tokio::spawn(async move { target.get(&group, &burst_key).await }));
        }
        for h in handles {
            h.await??;
        }
        println!(
            "{burst_key}: {} concurrent callers against {target_peer} finished in {:?}",
            args.concurrency,
            started.elapsed()
        );
    }
    Ok(())
}

/// Turns `http://host:port` into the `SocketAddr` to bind the listener on.
fn addr_to_socket(self_addr: &str) -> Result<SocketAddr, Box<dyn std::error::Error>> {
    let hostport = self_addr
        .trim_start_matches("http://")
        .trim_start_matches("https://")
        .trim_end_matches('/');
    hostport.parse::<SocketAddr>().map_err(|e| format!("--self-addr must be host:port, got {self_addr:?}: {e}").into())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_self_addr_into_a_bindable_socket() {
        assert_eq!(addr_to_socket("http://127.0.0.1:8001").unwrap(), "127.0.0.1:8001".parse().unwrap());
        assert_eq!(addr_to_socket("http://127.0.0.1:8001/").unwrap(), "127.0.0.1:8001".parse().unwrap());
    }

    #[test]
    fn rejects_an_address_with_no_port() {
        assert!(addr_to_socket("http://127.0.0.1").is_err());
    }
}
