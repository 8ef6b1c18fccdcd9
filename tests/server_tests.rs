//! End-to-end tests over a real TCP connection on an ephemeral port.

use mixtape::dispatch::AppState;
use mixtape::ids::IdAllocator;
use mixtape::persist::Documents;
use mixtape::server;
use mixtape::store::Store;
use serde_json::{json, Value};
use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;
use tempfile::TempDir;
use tokio::io::{AsyncBufReadExt, AsyncWriteExt, BufReader, Lines};
use tokio::net::tcp::{OwnedReadHalf, OwnedWriteHalf};
use tokio::net::{TcpListener, TcpStream};

async fn test_state() -> (AppState, TempDir) {
    let dir = tempfile::tempdir().unwrap();
    let docs = Documents::new(dir.path().join("db"));
    docs.ensure_dirs().await.unwrap();
    let ids = IdAllocator::open(docs.counters_path()).unwrap();
    let store = Store::open(docs, ids).await.unwrap();
    let music_dir = dir.path().join("musics");
    tokio::fs::create_dir_all(&music_dir).await.unwrap();
    let state = AppState {
        store: Arc::new(store),
        music_dir,
    };
    (state, dir)
}

async fn spawn_server(workers: usize) -> (SocketAddr, TempDir) {
    let (state, dir) = test_state().await;
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(server::run(
        listener,
        state,
        workers,
        std::future::pending::<()>(),
    ));
    (addr, dir)
}

struct Client {
    lines: Lines<BufReader<OwnedReadHalf>>,
    write: OwnedWriteHalf,
}

impl Client {
    async fn connect(addr: SocketAddr) -> Client {
        let stream = TcpStream::connect(addr).await.unwrap();
        let (read, write) = stream.into_split();
        Client {
            lines: BufReader::new(read).lines(),
            write,
        }
    }

    async fn send_line(&mut self, line: &str) {
        self.write.write_all(line.as_bytes()).await.unwrap();
        self.write.write_all(b"\n").await.unwrap();
    }

    async fn recv(&mut self) -> Value {
        let line = self.lines.next_line().await.unwrap().unwrap();
        serde_json::from_str(&line).unwrap()
    }

    async fn request(&mut self, action: &str, data: Value) -> Value {
        let line = json!({ "action": action, "requestId": "e2e", "data": data }).to_string();
        self.send_line(&line).await;
        self.recv().await
    }
}

#[tokio::test]
async fn register_and_login_round_trip() {
    let (addr, _dir) = spawn_server(4).await;
    let mut client = Client::connect(addr).await;

    let resp = client
        .request(
            "register",
            json!({ "email": "a@x.com", "username": "alice", "password": "pw" }),
        )
        .await;
    assert_eq!(resp["status"], "success");
    assert_eq!(resp["message"], "User registered");
    assert_eq!(resp["requestId"], "e2e");

    let resp = client
        .request("login", json!({ "email": "a@x.com", "password": "pw" }))
        .await;
    assert_eq!(resp["status"], "success");
    assert_eq!(resp["data"]["username"], "alice");

    // A second connection sees the same account.
    let mut other = Client::connect(addr).await;
    let resp = other.request("list_users", json!({})).await;
    assert_eq!(resp["data"].as_array().unwrap().len(), 1);
}

#[tokio::test]
async fn malformed_line_keeps_the_connection_usable() {
    let (addr, _dir) = spawn_server(4).await;
    let mut client = Client::connect(addr).await;

    client.send_line("definitely not json").await;
    let resp = client.recv().await;
    assert_eq!(resp["status"], "error");
    assert_eq!(resp["message"], "Invalid JSON format");
    assert!(resp.get("requestId").is_none());

    let resp = client
        .request(
            "register",
            json!({ "email": "a@x.com", "username": "alice", "password": "pw" }),
        )
        .await;
    assert_eq!(resp["status"], "success");
}

#[tokio::test]
async fn saturated_worker_pool_delays_the_next_session() {
    let (addr, _dir) = spawn_server(1).await;

    // The first session takes the only permit and keeps it by staying
    // connected.
    let mut first = Client::connect(addr).await;
    let resp = first
        .request(
            "register",
            json!({ "email": "a@x.com", "username": "alice", "password": "pw" }),
        )
        .await;
    assert_eq!(resp["status"], "success");

    let mut second = Client::connect(addr).await;
    second
        .send_line(&json!({ "action": "list_users", "requestId": "q", "data": {} }).to_string())
        .await;
    let waited = tokio::time::timeout(Duration::from_millis(300), second.recv()).await;
    assert!(waited.is_err(), "second session served while pool was full");

    // Closing the first connection frees the permit and the queued
    // session gets its answer.
    drop(first);
    let resp = tokio::time::timeout(Duration::from_secs(5), second.recv())
        .await
        .expect("second session never served");
    assert_eq!(resp["status"], "success");
    assert_eq!(resp["message"], "Users retrieved");
}

#[tokio::test]
async fn shutdown_future_stops_the_accept_loop() {
    let (state, _dir) = test_state().await;
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let (tx, rx) = tokio::sync::oneshot::channel::<()>();
    let handle = tokio::spawn(server::run(listener, state, 4, async {
        rx.await.ok();
    }));

    tx.send(()).unwrap();
    let joined = tokio::time::timeout(Duration::from_secs(5), handle)
        .await
        .expect("accept loop did not stop");
    assert!(joined.unwrap().is_ok());
}
