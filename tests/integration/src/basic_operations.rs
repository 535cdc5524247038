//! Integration tests for basic string/key operations.

use cinder_protocol::Frame;

use crate::helpers::TestServer;

#[tokio::test]
async fn ping_pong() {
    let server = TestServer::start();
    let mut c = server.connect().await;

    let resp = c.cmd(&["PING"]).await;
    assert!(matches!(resp, Frame::Simple(ref s) if s == "PONG"));
}

#[tokio::test]
async fn ping_with_message() {
    let server = TestServer::start();
    let mut c = server.connect().await;

    let resp = c.cmd(&["PING", "hello"]).await;
    assert!(matches!(resp, Frame::Simple(ref s) if s == "hello"));
}

#[tokio::test]
async fn set_get_roundtrip() {
    let server = TestServer::start();
    let mut c = server.connect().await;

    c.ok(&["SET", "foo", "bar"]).await;
    let val = c.get_bulk(&["GET", "foo"]).await;
    assert_eq!(val, Some("bar".into()));
}

#[tokio::test]
async fn get_missing_key() {
    let server = TestServer::start();
    let mut c = server.connect().await;

    let resp = c.cmd(&["GET", "nonexistent"]).await;
    assert!(matches!(resp, Frame::Null));
}

#[tokio::test]
async fn set_overwrites_value() {
    let server = TestServer::start();
    let mut c = server.connect().await;

    c.ok(&["SET", "key", "first"]).await;
    c.ok(&["SET", "key", "second"]).await;
    assert_eq!(c.get_bulk(&["GET", "key"]).await, Some("second".into()));
}

#[tokio::test]
async fn set_with_nx() {
    let server = TestServer::start();
    let mut c = server.connect().await;

    c.ok(&["SET", "key", "first", "NX"]).await;
    // second SET NX returns nil — the key already exists
    let resp = c.cmd(&["SET", "key", "second", "NX"]).await;
    assert!(matches!(resp, Frame::Null));
    // original value preserved
    assert_eq!(c.get_bulk(&["GET", "key"]).await, Some("first".into()));
}

#[tokio::test]
async fn set_with_xx() {
    let server = TestServer::start();
    let mut c = server.connect().await;

    // XX on a missing key returns nil
    let resp = c.cmd(&["SET", "key", "val", "XX"]).await;
    assert!(matches!(resp, Frame::Null));

    c.ok(&["SET", "key", "val"]).await;
    c.ok(&["SET", "key", "updated", "XX"]).await;
    assert_eq!(c.get_bulk(&["GET", "key"]).await, Some("updated".into()));
}

#[tokio::test]
async fn del_counts_removed_keys() {
    let server = TestServer::start();
    let mut c = server.connect().await;

    c.ok(&["SET", "a", "1"]).await;
    c.ok(&["SET", "b", "2"]).await;

    let count = c.get_int(&["DEL", "a", "b", "c"]).await;
    assert_eq!(count, 2);
    assert!(matches!(c.cmd(&["GET", "a"]).await, Frame::Null));
}

#[tokio::test]
async fn del_duplicate_keys_count_once() {
    let server = TestServer::start();
    let mut c = server.connect().await;

    c.ok(&["SET", "a", "1"]).await;
    let count = c.get_int(&["DEL", "a", "a", "a"]).await;
    assert_eq!(count, 1);
}

#[tokio::test]
async fn exists_counts_duplicates_each_time() {
    let server = TestServer::start();
    let mut c = server.connect().await;

    c.ok(&["SET", "here", "yes"]).await;
    assert_eq!(c.get_int(&["EXISTS", "here"]).await, 1);
    assert_eq!(c.get_int(&["EXISTS", "here", "here", "here"]).await, 3);
    assert_eq!(c.get_int(&["EXISTS", "here", "gone"]).await, 1);
    assert_eq!(c.get_int(&["EXISTS", "gone"]).await, 0);
}

#[tokio::test]
async fn unknown_command_keeps_connection_usable() {
    let server = TestServer::start();
    let mut c = server.connect().await;

    let msg = c.err(&["FLOOB", "x"]).await;
    assert!(msg.contains("unknown command"), "got: {msg}");

    // the same connection still works
    let resp = c.cmd(&["PING"]).await;
    assert!(matches!(resp, Frame::Simple(ref s) if s == "PONG"));
}

#[tokio::test]
async fn lowercase_command_is_unknown() {
    let server = TestServer::start();
    let mut c = server.connect().await;

    let msg = c.err(&["ping"]).await;
    assert!(msg.contains("unknown command"), "got: {msg}");
}

#[tokio::test]
async fn wrong_arity_keeps_connection_usable() {
    let server = TestServer::start();
    let mut c = server.connect().await;

    let msg = c.err(&["GET"]).await;
    assert!(msg.contains("wrong number of arguments"), "got: {msg}");

    c.ok(&["SET", "k", "v"]).await;
    assert_eq!(c.get_bulk(&["GET", "k"]).await, Some("v".into()));
}

#[tokio::test]
async fn get_on_list_key_is_wrongtype() {
    let server = TestServer::start();
    let mut c = server.connect().await;

    assert_eq!(c.get_int(&["RPUSH", "list", "x"]).await, 1);
    let msg = c.err(&["GET", "list"]).await;
    assert!(msg.starts_with("WRONGTYPE"), "got: {msg}");

    // SET replaces the list entirely; GET works afterwards
    c.ok(&["SET", "list", "now-a-string"]).await;
    assert_eq!(
        c.get_bulk(&["GET", "list"]).await,
        Some("now-a-string".into())
    );
}

#[tokio::test]
async fn many_clients_see_the_same_store() {
    let server = TestServer::start();
    let mut writer = server.connect().await;
    let mut reader = server.connect().await;

    writer.ok(&["SET", "shared", "value"]).await;
    assert_eq!(reader.get_bulk(&["GET", "shared"]).await, Some("value".into()));
}
