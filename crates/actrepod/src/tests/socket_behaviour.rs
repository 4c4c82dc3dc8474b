//! Behavioural tests for the socket listeners.

use std::cell::RefCell;
use std::net::{SocketAddr, TcpListener, TcpStream};
use std::path::PathBuf;
use std::sync::Arc;

use rstest::fixture;
use rstest_bdd_macros::{given, scenario, then, when};
use tempfile::TempDir;

use actrepo_config::SocketEndpoint;

use crate::transport::{ListenerHandle, Peer, RecordingHandler, SocketListener, WorkerTracker};

struct ListenerWorld {
    endpoint: SocketEndpoint,
    listener: Option<ListenerHandle>,
    handler: Arc<RecordingHandler>,
    address: Option<SocketAddr>,
    bind_error: Option<String>,
    reserved: Option<TcpListener>,
    socket_dir: TempDir,
}

impl ListenerWorld {
    fn new() -> Self {
        Self {
            endpoint: SocketEndpoint::tcp("127.0.0.1", 0),
            listener: None,
            handler: RecordingHandler::new(),
            address: None,
            bind_error: None,
            reserved: None,
            socket_dir: TempDir::new().expect("create socket directory"),
        }
    }

    fn socket_path(&self) -> PathBuf {
        self.socket_dir.path().join("listener.sock")
    }

    fn use_unix_endpoint(&mut self) {
        let path = self
            .socket_path()
            .to_str()
            .expect("socket path should be UTF-8")
            .to_owned();
        self.endpoint = SocketEndpoint::unix(path);
    }

    fn start_listener(&mut self) {
        match SocketListener::bind(&self.endpoint) {
            Ok(listener) => {
                self.address = listener.local_addr();
                let handler = Arc::clone(&self.handler);
                match listener.start(handler, WorkerTracker::new()) {
                    Ok(handle) => self.listener = Some(handle),
                    Err(error) => self.bind_error = Some(error.to_string()),
                }
            }
            Err(error) => self.bind_error = Some(error.to_string()),
        }
    }

    fn stop_listener(&mut self) {
        if let Some(handle) = self.listener.take() {
            handle.shutdown();
            handle.join().expect("listener thread should exit cleanly");
        }
    }

    fn reserve_port(&mut self) {
        let listener = TcpListener::bind(("127.0.0.1", 0)).expect("bind reserved port");
        let port = listener.local_addr().expect("local addr").port();
        self.endpoint = SocketEndpoint::tcp("127.0.0.1", port);
        self.reserved = Some(listener);
    }

    fn connect_clients(&self, count: usize) {
        for _ in 0..count {
            match &self.endpoint {
                SocketEndpoint::Tcp { .. } => {
                    let addr = self.address.expect("listener address should be set");
                    TcpStream::connect(addr).expect("connect client");
                }
                SocketEndpoint::Unix { path } => {
                    std::os::unix::net::UnixStream::connect(path.as_std_path())
                        .expect("connect unix client");
                }
            }
        }
    }
}

impl Drop for ListenerWorld {
    fn drop(&mut self) {
        if let Some(handle) = self.listener.take() {
            handle.shutdown();
            let _ = handle.join();
        }
        self.reserved = None;
    }
}

#[fixture]
fn world() -> RefCell<ListenerWorld> {
    RefCell::new(ListenerWorld::new())
}

#[given("a TCP socket listener is running")]
fn given_tcp_listener(world: &RefCell<ListenerWorld>) {
    world.borrow_mut().start_listener();
    assert!(
        world.borrow().bind_error.is_none(),
        "listener start failed: {:?}",
        world.borrow().bind_error
    );
}

#[given("a Unix socket listener is running")]
fn given_unix_listener(world: &RefCell<ListenerWorld>) {
    world.borrow_mut().use_unix_endpoint();
    given_tcp_listener(world);
}

#[given("a TCP socket is already bound")]
fn given_tcp_in_use(world: &RefCell<ListenerWorld>) {
    world.borrow_mut().reserve_port();
}

#[when("a client connects")]
fn when_client_connects(world: &RefCell<ListenerWorld>) {
    world.borrow().connect_clients(1);
}

#[when("two clients connect")]
fn when_two_clients_connect(world: &RefCell<ListenerWorld>) {
    world.borrow().connect_clients(2);
}

#[when("the listener starts on the same socket")]
fn when_listener_starts_same_socket(world: &RefCell<ListenerWorld>) {
    world.borrow_mut().start_listener();
}

#[when("the listener stops")]
fn when_listener_stops(world: &RefCell<ListenerWorld>) {
    world.borrow_mut().stop_listener();
}

#[then("the listener records {count} connections")]
fn then_listener_records_plural(world: &RefCell<ListenerWorld>, count: usize) {
    assert_listener_records(world, count);
}

#[then("the listener records {count} connection")]
fn then_listener_records_singular(world: &RefCell<ListenerWorld>, count: usize) {
    assert_listener_records(world, count);
}

fn assert_listener_records(world: &RefCell<ListenerWorld>, count: usize) {
    let world = world.borrow();
    assert!(
        world.handler.wait_for(count),
        "expected {count} connections, got {}",
        world.handler.peers().len()
    );
}

#[then("every peer is a unix peer")]
fn then_unix_peers(world: &RefCell<ListenerWorld>) {
    let peers = world.borrow().handler.peers();
    assert!(
        peers.iter().all(|peer| matches!(peer, Peer::Unix(_))),
        "expected unix peers, got {peers:?}"
    );
}

#[then("the listener socket file is removed")]
fn then_listener_socket_removed(world: &RefCell<ListenerWorld>) {
    let path = world.borrow().socket_path();
    assert!(!path.exists(), "socket file {} should be removed", path.display());
}

#[then("starting the listener fails")]
fn then_listener_fails(world: &RefCell<ListenerWorld>) {
    assert!(
        world.borrow().bind_error.is_some(),
        "expected listener start to fail"
    );
}

#[scenario(
    path = "tests/features/daemon_socket.feature",
    name = "TCP listener accepts a connection"
)]
fn tcp_listener_accepts_a_connection(#[from(world)] world: RefCell<ListenerWorld>) {
    drop(world);
}

#[scenario(
    path = "tests/features/daemon_socket.feature",
    name = "TCP listener accepts several connections"
)]
fn tcp_listener_accepts_several_connections(#[from(world)] world: RefCell<ListenerWorld>) {
    drop(world);
}

#[scenario(
    path = "tests/features/daemon_socket.feature",
    name = "Binding a port already in use fails"
)]
fn binding_a_port_in_use_fails(#[from(world)] world: RefCell<ListenerWorld>) {
    drop(world);
}

#[scenario(
    path = "tests/features/daemon_socket.feature",
    name = "Unix listener accepts connections and removes its socket"
)]
fn unix_listener_accepts_and_removes_socket(#[from(world)] world: RefCell<ListenerWorld>) {
    drop(world);
}
