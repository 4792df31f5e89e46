mod errors;
mod params;
mod services;

use std::io;
use std::net::TcpListener;
use actix_web::dev::Server;
use actix_web::{web, App, HttpServer};
use arbiter_core::{start_arbiter_node, RunningNode, Topology};
use clap::Parser;
use tracing_subscriber::EnvFilter;
use crate::params::Args;
use crate::services::AppState;

fn to_io(e: arbiter_core::ArbiterError) -> io::Error {
    io::Error::new(io::ErrorKind::Other, e)
}

/// Serves the node's HTTP surface on an already bound listener.
fn serve(running: &RunningNode, listener: TcpListener, max_upload_bytes: usize) -> io::Result<Server> {
    let state = web::Data::new(AppState {
        node: running.node.clone(),
        inbox: running.inbox.clone(),
        max_upload_bytes,
    });

    Ok(HttpServer::new(move || {
        App::new()
            .app_data(state.clone())
            .app_data(web::PayloadConfig::new(max_upload_bytes))
            .configure(services::configure)
    })
        .listen(listener)?
        .run())
}

/// Serves until the server stops or one of the node's pipeline loops ends. A
/// node whose Counter or Decider is gone cannot take part in votes, so its
/// server goes down with it.
async fn run(running: RunningNode, listener: TcpListener, max_upload_bytes: usize) -> io::Result<()> {
    let server = serve(&running, listener, max_upload_bytes)?;
    let server_handle = server.handle();
    let identity = running.node.identity;

    tokio::select! {
        served = server => {
            tracing::info!("Arbiter {} shutting down", identity);
            served
        }
        stopped = running.handle.join() => {
            let reason = match stopped {
                Ok(()) => "a subscription closed".to_string(),
                Err(e) => e.to_string(),
            };
            tracing::error!("Arbiter {} pipeline stopped ({}), stopping the server", identity, reason);
            server_handle.stop(true).await;
            Err(io::Error::new(io::ErrorKind::Other, format!("pipeline stopped: {}", reason)))
        }
    }
}

#[actix_web::main]
async fn main() -> io::Result<()> {
    let args = Args::parse();
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .init();

    let topology = Topology::with_size(args.identities).map_err(to_io)?;
    let running = start_arbiter_node(args.identity, topology, args.peers, &args.data_dir)
        .await
        .map_err(to_io)?;

    let listener = TcpListener::bind(&args.http_addr)?;
    tracing::info!("Arbiter {} listening on {}", args.identity, args.http_addr);
    run(running, listener, args.max_upload_bytes).await
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;
    use std::time::Duration;
    use arbiter_core::{
        ArbiterNode, BlobMeta, CountRecord, Decision, Identity, InMemoryBus, MemoryStorage, MessageBus, Peer, Topic,
    };
    use serde_json::Value;
    use tokio::sync::broadcast;
    use super::*;

    struct LiveNode {
        addr: String,
        running: RunningNode,
        decisions: broadcast::Receiver<Decision>,
        _dir: tempfile::TempDir,
    }

    /// Two real servers talking to each other over the HTTP bus.
    async fn live_pair() -> Vec<LiveNode> {
        let listeners: Vec<TcpListener> = (0..2).map(|_| TcpListener::bind("127.0.0.1:0").unwrap()).collect();
        let peers: Vec<Peer> = listeners
            .iter()
            .enumerate()
            .map(|(i, l)| Peer { identity: Identity::new(i as u8), addr: l.local_addr().unwrap().to_string() })
            .collect();

        let mut nodes = Vec::new();
        for (peer, listener) in peers.iter().zip(listeners) {
            let dir = tempfile::tempdir().unwrap();
            let running = start_arbiter_node(peer.identity, Topology::binary(), peers.clone(), dir.path())
                .await
                .unwrap();
            let decisions = running.node.subscribe_decisions();
            actix_web::rt::spawn(serve(&running, listener, 1024 * 1024).unwrap());
            nodes.push(LiveNode { addr: peer.addr.clone(), running, decisions, _dir: dir });
        }
        nodes
    }

    /// Uploads the way the original clients do: a multipart form with a `file` field.
    async fn upload(client: &reqwest::Client, node: &LiveNode, payload: &'static [u8]) -> BlobMeta {
        let form = reqwest::multipart::Form::new().part("file", reqwest::multipart::Part::bytes(payload).file_name("1"));
        let resp: Value = client
            .post(format!("http://{}/upload/", node.addr))
            .multipart(form)
            .send()
            .await
            .unwrap()
            .json()
            .await
            .unwrap();
        serde_json::from_value(resp["metadata"].clone()).unwrap()
    }

    async fn settle(nodes: &mut [LiveNode], id: &str) {
        for node in nodes.iter_mut() {
            tokio::time::timeout(Duration::from_secs(10), async {
                while node.decisions.recv().await.unwrap().id != id {}
            })
            .await
            .expect("no decision in time");
        }
    }

    async fn file_status(client: &reqwest::Client, node: &LiveNode, id: &str) -> u16 {
        client
            .get(format!("http://{}/file/{}", node.addr, id))
            .send()
            .await
            .unwrap()
            .status()
            .as_u16()
    }

    #[actix_web::test]
    async fn test_arbitration_over_http() {
        let mut nodes = live_pair().await;
        let client = reqwest::Client::new();

        // more ones, uploaded to the zero node
        let meta = upload(&client, &nodes[0], b"\x01\x01\x01\x01\x00\x00").await;
        settle(&mut nodes, &meta.id).await;
        assert_eq!(file_status(&client, &nodes[0], &meta.id).await, 404);
        assert_eq!(file_status(&client, &nodes[1], &meta.id).await, 200);

        // more zeros, uploaded to the one node
        let meta = upload(&client, &nodes[1], b"\x00\x00\x00\x00\x01\x01").await;
        settle(&mut nodes, &meta.id).await;
        assert_eq!(file_status(&client, &nodes[0], &meta.id).await, 200);
        assert_eq!(file_status(&client, &nodes[1], &meta.id).await, 404);

        // tie
        let meta = upload(&client, &nodes[0], b"\x00\x00\x00\x01\x01\x01").await;
        settle(&mut nodes, &meta.id).await;
        for node in &nodes {
            let body: Value = client
                .get(format!("http://{}/file/{}", node.addr, meta.id))
                .send()
                .await
                .unwrap()
                .json()
                .await
                .unwrap();
            assert_eq!(body["data"], "\u{0}\u{0}\u{0}\u{1}\u{1}\u{1}");
        }

        let size: Value = client
            .get(format!("http://{}/size/", nodes[0].addr))
            .send()
            .await
            .unwrap()
            .json()
            .await
            .unwrap();
        assert_eq!(size["total_size"], 12);

        for node in nodes {
            node.running.handle.shutdown();
        }
    }

    #[actix_web::test]
    async fn test_server_stops_with_its_pipeline() {
        let bus = Arc::new(InMemoryBus::new());
        let node = ArbiterNode::new(Identity::new(0), Topology::binary(), bus.clone(), Arc::new(MemoryStorage::new()))
            .unwrap();
        let handle = node.start().await.unwrap();
        let running = RunningNode { node, inbox: bus.clone(), handle };
        let listener = TcpListener::bind("127.0.0.1:0").unwrap();
        let serving = actix_web::rt::spawn(run(running, listener, 1024));

        // slot 0 already counted, so the zero node's Counter refuses it
        let mut record = CountRecord::new(BlobMeta::new("1", 1, None), vec![0], &Topology::binary());
        record.counts = vec![Some(1), None];
        bus.publish(&Topic::Count(Identity::new(0)), record.encode().unwrap()).await.unwrap();

        let served = tokio::time::timeout(Duration::from_secs(10), serving)
            .await
            .expect("server kept running")
            .unwrap();
        assert!(served.is_err());
    }
}
