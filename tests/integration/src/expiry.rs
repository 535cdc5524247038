//! Integration tests for expiration behavior.

use std::time::Duration;

use cinder_protocol::Frame;

use crate::helpers::{ServerOptions, TestServer};

#[tokio::test]
async fn set_with_ex_expires() {
    let server = TestServer::start();
    let mut c = server.connect().await;

    c.ok(&["SET", "k", "v", "EX", "1"]).await;
    assert_eq!(c.get_bulk(&["GET", "k"]).await, Some("v".into()));

    tokio::time::sleep(Duration::from_millis(1500)).await;
    assert!(matches!(c.cmd(&["GET", "k"]).await, Frame::Null));
}

#[tokio::test]
async fn set_with_px_expires() {
    let server = TestServer::start();
    let mut c = server.connect().await;

    c.ok(&["SET", "k", "v", "PX", "80"]).await;
    assert_eq!(c.get_bulk(&["GET", "k"]).await, Some("v".into()));

    tokio::time::sleep(Duration::from_millis(200)).await;
    assert!(matches!(c.cmd(&["GET", "k"]).await, Frame::Null));
    assert_eq!(c.get_int(&["EXISTS", "k"]).await, 0);
}

#[tokio::test]
async fn expire_and_pexpire_commands() {
    let server = TestServer::start();
    let mut c = server.connect().await;

    c.ok(&["SET", "a", "1"]).await;
    c.ok(&["SET", "b", "2"]).await;

    assert_eq!(c.get_int(&["EXPIRE", "a", "100"]).await, 1);
    assert_eq!(c.get_int(&["PEXPIRE", "b", "80"]).await, 1);
    assert_eq!(c.get_int(&["EXPIRE", "missing", "100"]).await, 0);

    tokio::time::sleep(Duration::from_millis(200)).await;
    // b is gone, a is still far from its deadline
    assert!(matches!(c.cmd(&["GET", "b"]).await, Frame::Null));
    assert_eq!(c.get_bulk(&["GET", "a"]).await, Some("1".into()));
}

#[tokio::test]
async fn plain_set_clears_pending_expiration() {
    let server = TestServer::start();
    let mut c = server.connect().await;

    c.ok(&["SET", "k", "v1", "PX", "100"]).await;
    // overwriting without a TTL removes the pending expiration
    c.ok(&["SET", "k", "v2"]).await;

    tokio::time::sleep(Duration::from_millis(250)).await;
    assert_eq!(c.get_bulk(&["GET", "k"]).await, Some("v2".into()));
}

#[tokio::test]
async fn expired_key_counts_as_absent_for_nx() {
    let server = TestServer::start();
    let mut c = server.connect().await;

    c.ok(&["SET", "k", "old", "PX", "50"]).await;
    tokio::time::sleep(Duration::from_millis(150)).await;

    // NX succeeds because the old entry is logically gone
    c.ok(&["SET", "k", "new", "NX"]).await;
    assert_eq!(c.get_bulk(&["GET", "k"]).await, Some("new".into()));
}

#[tokio::test]
async fn push_after_expiry_recreates_without_ttl() {
    let server = TestServer::start();
    let mut c = server.connect().await;

    c.ok(&["SET", "k", "v", "PX", "50"]).await;
    tokio::time::sleep(Duration::from_millis(150)).await;

    // the expired string is gone; the push creates a fresh list with
    // no expiration
    assert_eq!(c.get_int(&["RPUSH", "k", "x"]).await, 1);
    tokio::time::sleep(Duration::from_millis(150)).await;
    assert_eq!(c.get_int(&["LLEN", "k"]).await, 1);
}

#[tokio::test]
async fn sweeper_removes_untouched_keys() {
    // fast sweeps so the test doesn't have to wait long
    let server = TestServer::start_with(ServerOptions {
        sweep_interval_ms: Some(20),
        ..ServerOptions::default()
    });
    let mut c = server.connect().await;

    for i in 0..20 {
        let key = format!("temp:{i}");
        c.ok(&["SET", &key, "gone", "PX", "40"]).await;
    }

    // give the sweeper a few cycles; nothing reads these keys
    tokio::time::sleep(Duration::from_millis(400)).await;

    // every key is gone — observable or not, the sweeper has had
    // plenty of passes to evict all of them
    for i in 0..20 {
        let key = format!("temp:{i}");
        assert_eq!(c.get_int(&["EXISTS", &key]).await, 0);
    }
}

#[tokio::test]
async fn expire_on_list_key() {
    let server = TestServer::start();
    let mut c = server.connect().await;

    c.get_int(&["RPUSH", "list", "a", "b"]).await;
    assert_eq!(c.get_int(&["PEXPIRE", "list", "60"]).await, 1);

    tokio::time::sleep(Duration::from_millis(150)).await;
    assert_eq!(c.get_int(&["LLEN", "list"]).await, 0);
    assert!(matches!(c.cmd(&["LRANGE", "list", "0", "-1"]).await, Frame::NullArray));
}
