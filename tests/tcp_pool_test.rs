//! Resource pool over real TCP sessions

use connpool::connection::TcpConnection;
use connpool::{ConnectionParams, OwnerId, PoolConfig, PoolError, ResourcePool};
use std::net::{TcpListener, TcpStream};
use std::sync::Arc;
use std::thread;
use std::time::Duration;

fn tcp_pool(listener: &TcpListener, capacity: usize) -> ResourcePool<TcpConnection> {
    let port = listener.local_addr().unwrap().port();
    let config = PoolConfig {
        capacity,
        checkout_timeout: 0.5,
        connection: ConnectionParams::new()
            .with("host", "127.0.0.1")
            .with("port", port)
            .with("connect_timeout_ms", 500),
        ..Default::default()
    };
    ResourcePool::new(config).unwrap()
}

#[test]
fn test_tcp_pool_reuses_sessions() {
    let listener = TcpListener::bind("127.0.0.1:0").unwrap();
    let pool = tcp_pool(&listener, 2);

    let first = pool.acquire(OwnerId::new()).unwrap();
    let (_server, _) = listener.accept().unwrap();

    let owner = OwnerId::new();
    let second: Result<Arc<TcpConnection>, PoolError> =
        pool.with_resource(owner, |conn| Ok(Arc::clone(conn)));
    let second = second.unwrap();
    let (_server2, _) = listener.accept().unwrap();

    assert!(!Arc::ptr_eq(&first, &second));
    assert_eq!(pool.size(), 2);
    assert_eq!(pool.available_count(), 1);

    let third = pool.acquire(OwnerId::new()).unwrap();
    assert!(Arc::ptr_eq(&second, &third));
    assert_eq!(pool.size(), 2);

    pool.disconnect_all();
}

#[test]
fn test_tcp_pool_drops_sessions_closed_by_peer() {
    let listener = TcpListener::bind("127.0.0.1:0").unwrap();
    let pool = tcp_pool(&listener, 2);

    pool.acquire(OwnerId::new()).unwrap();
    let (server_a, _) = listener.accept().unwrap();
    pool.acquire(OwnerId::new()).unwrap();
    let (_server_b, _) = listener.accept().unwrap();

    drop(server_a);
    thread::sleep(Duration::from_millis(50));

    pool.drop_stale_connections();
    assert_eq!(pool.size(), 1);
    assert_eq!(pool.available_count(), 1);
    assert_eq!(pool.reserved_count(), 0);

    pool.disconnect_all();
    assert!(!pool.is_connected());
}

#[test]
fn test_tcp_pool_open_error_propagates() {
    let listener = TcpListener::bind("127.0.0.1:0").unwrap();
    let pool = tcp_pool(&listener, 1);
    drop(listener);

    let err = pool.acquire(OwnerId::new()).unwrap_err();
    assert!(matches!(err, PoolError::Connection(_)));
    assert!(!pool.is_connected());
}

#[test]
fn test_tcp_pool_exhausted() {
    let listener = TcpListener::bind("127.0.0.1:0").unwrap();
    let pool = tcp_pool(&listener, 1);

    let _held = pool.acquire(OwnerId::new()).unwrap();
    let _server: TcpStream = listener.accept().unwrap().0;

    let err = pool.acquire(OwnerId::new()).unwrap_err();
    assert!(err.is_retryable());
}
