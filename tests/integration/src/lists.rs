//! Integration tests for list operations.

use cinder_protocol::Frame;

use crate::helpers::TestServer;

/// Extracts an array reply as UTF-8 strings.
fn as_strings(frame: Frame) -> Vec<String> {
    match frame {
        Frame::Array(items) => items
            .into_iter()
            .map(|f| match f {
                Frame::Bulk(data) => String::from_utf8_lossy(&data).to_string(),
                other => panic!("expected Bulk element, got {other:?}"),
            })
            .collect(),
        other => panic!("expected Array, got {other:?}"),
    }
}

#[tokio::test]
async fn lpush_order() {
    let server = TestServer::start();
    let mut c = server.connect().await;

    assert_eq!(c.get_int(&["LPUSH", "list", "a", "b", "c"]).await, 3);
    // values are pushed one-by-one onto the front: c, b, a
    let items = as_strings(c.cmd(&["LRANGE", "list", "0", "-1"]).await);
    assert_eq!(items, vec!["c", "b", "a"]);
}

#[tokio::test]
async fn rpush_order() {
    let server = TestServer::start();
    let mut c = server.connect().await;

    assert_eq!(c.get_int(&["RPUSH", "list", "a", "b", "c"]).await, 3);
    let items = as_strings(c.cmd(&["LRANGE", "list", "0", "-1"]).await);
    assert_eq!(items, vec!["a", "b", "c"]);
}

#[tokio::test]
async fn push_returns_new_length() {
    let server = TestServer::start();
    let mut c = server.connect().await;

    assert_eq!(c.get_int(&["RPUSH", "list", "a"]).await, 1);
    assert_eq!(c.get_int(&["LPUSH", "list", "b"]).await, 2);
    assert_eq!(c.get_int(&["RPUSH", "list", "c", "d"]).await, 4);
}

#[tokio::test]
async fn lpop_rpop() {
    let server = TestServer::start();
    let mut c = server.connect().await;

    c.get_int(&["RPUSH", "list", "a", "b", "c"]).await;
    assert_eq!(c.get_bulk(&["LPOP", "list"]).await, Some("a".into()));
    assert_eq!(c.get_bulk(&["RPOP", "list"]).await, Some("c".into()));
    assert_eq!(c.get_int(&["LLEN", "list"]).await, 1);
}

#[tokio::test]
async fn pop_missing_key_is_nil() {
    let server = TestServer::start();
    let mut c = server.connect().await;

    assert_eq!(c.get_bulk(&["LPOP", "nope"]).await, None);
    assert_eq!(c.get_bulk(&["RPOP", "nope"]).await, None);
}

#[tokio::test]
async fn emptied_list_keeps_its_type() {
    let server = TestServer::start();
    let mut c = server.connect().await;

    c.get_int(&["RPUSH", "list", "only"]).await;
    assert_eq!(c.get_bulk(&["LPOP", "list"]).await, Some("only".into()));

    // the key survives as an empty list
    assert_eq!(c.get_int(&["LLEN", "list"]).await, 0);
    assert_eq!(c.get_bulk(&["LPOP", "list"]).await, None);
    assert_eq!(c.get_int(&["EXISTS", "list"]).await, 1);
    let msg = c.err(&["GET", "list"]).await;
    assert!(msg.starts_with("WRONGTYPE"), "got: {msg}");

    // and accepts new pushes
    assert_eq!(c.get_int(&["RPUSH", "list", "again"]).await, 1);
}

#[tokio::test]
async fn llen_missing_is_zero() {
    let server = TestServer::start();
    let mut c = server.connect().await;

    assert_eq!(c.get_int(&["LLEN", "nope"]).await, 0);
}

#[tokio::test]
async fn lrange_negative_and_clamped_indices() {
    let server = TestServer::start();
    let mut c = server.connect().await;

    c.get_int(&["RPUSH", "list", "a", "b", "c", "d", "e"]).await;

    let items = as_strings(c.cmd(&["LRANGE", "list", "1", "3"]).await);
    assert_eq!(items, vec!["b", "c", "d"]);

    let items = as_strings(c.cmd(&["LRANGE", "list", "-2", "-1"]).await);
    assert_eq!(items, vec!["d", "e"]);

    // oversized stop saturates to the last element
    let items = as_strings(c.cmd(&["LRANGE", "list", "0", "100"]).await);
    assert_eq!(items.len(), 5);

    // start beyond the list is empty
    let items = as_strings(c.cmd(&["LRANGE", "list", "10", "20"]).await);
    assert!(items.is_empty());

    // inverted range is empty
    let items = as_strings(c.cmd(&["LRANGE", "list", "3", "1"]).await);
    assert!(items.is_empty());
}

#[tokio::test]
async fn lrange_missing_key_is_nil_array() {
    let server = TestServer::start();
    let mut c = server.connect().await;

    let resp = c.cmd(&["LRANGE", "nope", "0", "-1"]).await;
    assert!(matches!(resp, Frame::NullArray), "got: {resp:?}");
}

#[tokio::test]
async fn list_commands_on_string_key_are_wrongtype() {
    let server = TestServer::start();
    let mut c = server.connect().await;

    c.ok(&["SET", "s", "val"]).await;
    for args in [
        vec!["LPUSH", "s", "x"],
        vec!["RPUSH", "s", "x"],
        vec!["LPOP", "s"],
        vec!["RPOP", "s"],
        vec!["LLEN", "s"],
        vec!["LRANGE", "s", "0", "-1"],
    ] {
        let msg = c.err(&args).await;
        assert!(msg.starts_with("WRONGTYPE"), "{args:?} got: {msg}");
    }
}
