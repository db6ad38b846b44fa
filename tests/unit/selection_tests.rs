//! Transport selection policy and provider memoization.

use std::sync::{Arc, Barrier};
use std::thread;

use lsp_connection::{
    ConnectionConfig, ConnectionEndpoint, ConnectionSelector, Transport, TransportVariant,
};

fn config(
    client_host: Option<&str>,
    client_port: Option<u16>,
    server_port: Option<u16>,
) -> ConnectionConfig {
    ConnectionConfig {
        client_host: client_host.map(str::to_owned),
        client_port,
        server_port,
        ..ConnectionConfig::default()
    }
}

#[test]
fn client_port_selects_client_socket() {
    let selector = ConnectionSelector::new(config(Some("localhost"), Some(9000), None));
    assert_eq!(
        selector.transport(),
        Transport::ClientSocket(ConnectionEndpoint::new("localhost", 9000))
    );
}

#[test]
fn client_wins_over_server() {
    for server_port in [None, Some(9001), Some(9000)] {
        let selector = ConnectionSelector::new(config(Some("10.1.1.1"), Some(9000), server_port));
        assert_eq!(
            selector.selected_provider().variant(),
            TransportVariant::ClientSocket,
            "server_port {server_port:?}"
        );
    }
}

#[test]
fn client_host_defaults_to_localhost() {
    let selector = ConnectionSelector::new(config(None, Some(9000), None));
    let transport = selector.transport();
    assert_eq!(transport.endpoint().map(|e| e.host.as_str()), Some("localhost"));
}

#[test]
fn server_port_alone_selects_server_socket_on_all_interfaces() {
    let selector = ConnectionSelector::new(config(None, None, Some(9001)));
    assert_eq!(
        selector.transport(),
        Transport::ServerSocket(ConnectionEndpoint::new("0.0.0.0", 9001))
    );
}

#[test]
fn client_host_without_port_does_not_select_client() {
    let selector = ConnectionSelector::new(config(Some("localhost"), None, Some(9001)));
    assert_eq!(selector.transport().variant(), TransportVariant::ServerSocket);
}

#[test]
fn nothing_configured_selects_stdio() {
    let selector = ConnectionSelector::new(ConnectionConfig::default());
    assert_eq!(selector.transport(), Transport::Stdio);
    assert!(selector.transport().endpoint().is_none());
}

#[test]
fn repeated_selection_returns_same_provider() {
    let selector = ConnectionSelector::new(config(None, None, Some(9001)));
    let first = selector.selected_provider();
    for _ in 0..10 {
        assert!(Arc::ptr_eq(&first, &selector.selected_provider()));
    }
}

#[test]
fn concurrent_selection_publishes_one_provider() {
    const CALLERS: usize = 16;
    let selector = Arc::new(ConnectionSelector::new(config(Some("localhost"), Some(9000), None)));
    let barrier = Arc::new(Barrier::new(CALLERS));

    let handles: Vec<_> = (0..CALLERS)
        .map(|_| {
            let selector = Arc::clone(&selector);
            let barrier = Arc::clone(&barrier);
            thread::spawn(move || {
                barrier.wait();
                selector.selected_provider()
            })
        })
        .collect();

    let providers: Vec<_> = handles
        .into_iter()
        .map(|h| h.join().expect("selector thread"))
        .collect();
    let first = &providers[0];
    assert!(providers.iter().all(|p| Arc::ptr_eq(first, p)));
}
