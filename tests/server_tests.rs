//! End-to-end tests for sccd
//!
//! Each test binds an ephemeral port, runs one dispatcher strategy, and
//! talks to it over real TCP. Every protocol-level test runs against
//! both strategies, since they must be externally indistinguishable.

use std::net::SocketAddr;
use std::sync::Arc;

use tokio::io::{AsyncBufReadExt, AsyncWriteExt, BufReader};
use tokio::net::tcp::OwnedReadHalf;
use tokio::net::TcpStream;
use tokio::sync::watch;
use tokio::time::{timeout, Duration};

use sccd::dispatch::{proactor, reactor, Strategy};
use sccd::SharedState;

struct TestServer {
    addr: SocketAddr,
    shared: Arc<SharedState>,
    shutdown: watch::Sender<bool>,
    dispatcher: tokio::task::JoinHandle<sccd::Result<()>>,
}

impl TestServer {
    async fn start(mode: Strategy) -> Self {
        let shared = Arc::new(SharedState::new());
        let listener = tokio::net::TcpListener::bind("127.0.0.1:0")
            .await
            .expect("bind ephemeral port");
        let addr = listener.local_addr().expect("local addr");
        let (shutdown, rx) = watch::channel(false);
        let dispatcher = match mode {
            Strategy::Reactor => tokio::spawn(reactor::serve(listener, Arc::clone(&shared), rx)),
            Strategy::Proactor => tokio::spawn(proactor::serve(listener, Arc::clone(&shared), rx)),
        };
        Self {
            addr,
            shared,
            shutdown,
            dispatcher,
        }
    }

    async fn connect(&self) -> Client {
        let stream = TcpStream::connect(self.addr).await.expect("connect");
        let (read, write) = stream.into_split();
        Client {
            reader: BufReader::new(read),
            writer: write,
        }
    }

    async fn stop(self) {
        self.shutdown.send(true).expect("signal shutdown");
        self.dispatcher
            .await
            .expect("dispatcher join")
            .expect("dispatcher result");
    }
}

struct Client {
    reader: BufReader<OwnedReadHalf>,
    writer: tokio::net::tcp::OwnedWriteHalf,
}

impl Client {
    async fn send(&mut self, line: &str) {
        self.writer
            .write_all(format!("{line}\n").as_bytes())
            .await
            .expect("write line");
    }

    async fn recv(&mut self) -> String {
        let mut line = String::new();
        let n = timeout(Duration::from_secs(5), self.reader.read_line(&mut line))
            .await
            .expect("response before timeout")
            .expect("read line");
        assert!(n > 0, "server closed the connection unexpectedly");
        line.trim_end_matches('\n').to_string()
    }

    async fn roundtrip(&mut self, line: &str) -> String {
        self.send(line).await;
        self.recv().await
    }
}

async fn build_canonical_graph(client: &mut Client) {
    assert_eq!(client.roundtrip("Newgraph 4 4").await, "Send the edges.");
    for edge in ["1 2", "2 3", "3 1"] {
        client.send(edge).await;
    }
    client.send("3 4").await;
    assert_eq!(client.recv().await, "New graph created.");
}

/// Parse `SCC k is: <ids>` lines into sorted id sets.
fn component_sets(lines: &[String]) -> Vec<Vec<u32>> {
    let mut sets: Vec<Vec<u32>> = lines
        .iter()
        .map(|line| {
            let ids = line.split("is: ").nth(1).expect("component ids");
            let mut ids: Vec<u32> = ids
                .split_whitespace()
                .map(|s| s.parse().expect("vertex id"))
                .collect();
            ids.sort_unstable();
            ids
        })
        .collect();
    sets.sort();
    sets
}

async fn canonical_scenario(mode: Strategy) {
    let server = TestServer::start(mode).await;
    let mut client = server.connect().await;

    build_canonical_graph(&mut client).await;

    client.send("Kosaraju").await;
    let lines = vec![client.recv().await, client.recv().await];
    assert!(lines.iter().all(|l| l.starts_with("SCC ")));
    assert_eq!(component_sets(&lines), vec![vec![1, 2, 3], vec![4]]);

    // 3 of 4 vertices in one component: strict majority.
    assert!(server.shared.majority());

    server.stop().await;
}

#[tokio::test]
async fn canonical_scenario_reactor() {
    canonical_scenario(Strategy::Reactor).await;
}

#[tokio::test]
async fn canonical_scenario_proactor() {
    canonical_scenario(Strategy::Proactor).await;
}

async fn error_texts(mode: Strategy) {
    let server = TestServer::start(mode).await;
    let mut client = server.connect().await;

    assert_eq!(client.roundtrip("sccs please").await, "Invalid command.");
    assert_eq!(client.roundtrip("newgraph 2").await, "Invalid command.");

    assert_eq!(client.roundtrip("newgraph 2 0").await, "Send the edges.");
    assert_eq!(client.recv().await, "New graph created.");
    assert_eq!(client.roundtrip("newedge 1 3").await, "Invalid vertex.");
    assert_eq!(client.roundtrip("removeedge 0 1").await, "Invalid vertex.");

    // the connection survives every rejected command
    assert_eq!(client.roundtrip("newedge 1 2").await, "Edge added.");
    assert_eq!(client.roundtrip("removeedge 1 2").await, "Edge removed.");
    // removing an absent edge is still an acknowledgement
    assert_eq!(client.roundtrip("removeedge 1 2").await, "Edge removed.");

    server.stop().await;
}

#[tokio::test]
async fn error_texts_reactor() {
    error_texts(Strategy::Reactor).await;
}

#[tokio::test]
async fn error_texts_proactor() {
    error_texts(Strategy::Proactor).await;
}

async fn edge_subprotocol_survives_garbage(mode: Strategy) {
    let server = TestServer::start(mode).await;
    let mut client = server.connect().await;

    assert_eq!(client.roundtrip("newgraph 2 2").await, "Send the edges.");
    assert_eq!(client.roundtrip("not an edge").await, "Invalid edge.");
    assert_eq!(client.roundtrip("1 99").await, "Invalid edge.");
    client.send("1 2").await;
    assert_eq!(client.roundtrip("2 1").await, "New graph created.");

    client.send("kosaraju").await;
    let lines = vec![client.recv().await];
    assert_eq!(component_sets(&lines), vec![vec![1, 2]]);

    server.stop().await;
}

#[tokio::test]
async fn edge_subprotocol_survives_garbage_reactor() {
    edge_subprotocol_survives_garbage(Strategy::Reactor).await;
}

#[tokio::test]
async fn edge_subprotocol_survives_garbage_proactor() {
    edge_subprotocol_survives_garbage(Strategy::Proactor).await;
}

async fn disconnect_leaves_other_sessions_alone(mode: Strategy) {
    let server = TestServer::start(mode).await;
    let mut first = server.connect().await;
    let second = server.connect().await;

    assert_eq!(first.roundtrip("newgraph 3 0").await, "Send the edges.");
    assert_eq!(first.recv().await, "New graph created.");

    drop(second); // peer hangs up mid-session

    // the surviving session and the shared graph are unaffected
    assert_eq!(first.roundtrip("newedge 1 2").await, "Edge added.");
    assert_eq!(server.shared.with_graph(|g| g.edge_count()), 1);

    server.stop().await;
}

#[tokio::test]
async fn disconnect_leaves_other_sessions_alone_reactor() {
    disconnect_leaves_other_sessions_alone(Strategy::Reactor).await;
}

#[tokio::test]
async fn disconnect_leaves_other_sessions_alone_proactor() {
    disconnect_leaves_other_sessions_alone(Strategy::Proactor).await;
}

/// A reactor serves interleaved commands from multiple clients in one
/// task without mixing up their responses.
#[tokio::test]
async fn reactor_interleaves_sessions() {
    let server = TestServer::start(Strategy::Reactor).await;
    let mut a = server.connect().await;
    let mut b = server.connect().await;

    assert_eq!(a.roundtrip("newgraph 2 0").await, "Send the edges.");
    assert_eq!(a.recv().await, "New graph created.");

    assert_eq!(b.roundtrip("newedge 1 2").await, "Edge added.");
    assert_eq!(a.roundtrip("newedge 2 1").await, "Edge added.");
    assert_eq!(b.roundtrip("bogus").await, "Invalid command.");

    a.send("kosaraju").await;
    let lines = vec![a.recv().await];
    assert_eq!(component_sets(&lines), vec![vec![1, 2]]);

    server.stop().await;
}

/// A session whose buffer always holds complete lines must not starve
/// later sessions: the reactor services every ready socket per wake.
#[tokio::test]
async fn reactor_flooded_session_does_not_starve_others() {
    let server = TestServer::start(Strategy::Reactor).await;
    let mut flooder = server.connect().await;
    let mut other = server.connect().await;

    // Park the first session in the edge sub-protocol with a huge m and
    // keep its read buffer permanently full of valid edge lines; those
    // produce no responses, so there is no write backpressure either.
    assert_eq!(
        flooder.roundtrip("newgraph 4 1000000").await,
        "Send the edges."
    );
    let flood = tokio::spawn(async move {
        let chunk = "1 2\n".repeat(4096);
        loop {
            if flooder.writer.write_all(chunk.as_bytes()).await.is_err() {
                break;
            }
        }
    });

    // The second session still gets serviced while the flood runs.
    // (Graph-independent assertions only: the flooder may commit its
    // graph at any point.)
    assert_eq!(other.roundtrip("bogus").await, "Invalid command.");
    assert_eq!(other.roundtrip("kosaraju please").await, "Invalid command.");
    assert_eq!(other.roundtrip("fl ood").await, "Invalid command.");

    flood.abort();
    server.stop().await;
}

/// N proactor workers hammering one graph never corrupt the adjacency:
/// every acknowledged add lands, so the final edge count must match.
#[tokio::test]
async fn proactor_concurrent_mutation_is_consistent() {
    const WORKERS: usize = 8;
    const EDGES_PER_WORKER: usize = 50;

    let server = TestServer::start(Strategy::Proactor).await;

    let mut setup = server.connect().await;
    assert_eq!(setup.roundtrip("newgraph 10 0").await, "Send the edges.");
    assert_eq!(setup.recv().await, "New graph created.");

    let mut tasks = Vec::new();
    for worker in 0..WORKERS {
        let mut client = server.connect().await;
        tasks.push(tokio::spawn(async move {
            for i in 0..EDGES_PER_WORKER {
                let u = (worker + i) % 10 + 1;
                let v = (worker * 3 + i * 7) % 10 + 1;
                assert_eq!(client.roundtrip(&format!("newedge {u} {v}")).await, "Edge added.");
                if i % 10 == 0 {
                    client.send("kosaraju").await;
                    // 10 vertices: every component line starts with "SCC";
                    // drain exactly the partition's lines
                    let first = client.recv().await;
                    assert!(first.starts_with("SCC 1 is:"));
                    let mut seen = first
                        .split("is: ")
                        .nth(1)
                        .map(|ids| ids.split_whitespace().count())
                        .unwrap_or(0);
                    while seen < 10 {
                        let line = client.recv().await;
                        assert!(line.starts_with("SCC "));
                        seen += line
                            .split("is: ")
                            .nth(1)
                            .map(|ids| ids.split_whitespace().count())
                            .unwrap_or(0);
                    }
                }
            }
        }));
    }
    for task in tasks {
        task.await.expect("worker task");
    }

    assert_eq!(
        server.shared.with_graph(|g| g.edge_count()),
        WORKERS * EDGES_PER_WORKER
    );

    server.stop().await;
}
