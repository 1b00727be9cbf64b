//! Frame reassembly vector tests.

#![allow(clippy::unwrap_used)]
#![allow(clippy::expect_used)]
#![allow(clippy::panic)]

use hubsocket_core::protocol::frame::FrameAccumulator;

use vector_loader::load_frame;

#[test]
fn frame_vectors() {
    let files = [
        "frame_single.json",
        "frame_split_ascii.json",
        "frame_split_multibyte.json",
        "frame_invalid_utf8.json",
    ];

    for f in files {
        let v = load_frame(f);
        let mut acc = FrameAccumulator::new();
        for c in &v.chunks {
            acc.push(&c.decode());
        }
        let res = acc.finish();
        assert_eq!(acc.pending(), 0, "vector={}", v.description);

        if let Some(err) = v.expect_error {
            let e = res.expect_err("expected error");
            assert_eq!(e.client_code().as_str(), err.code, "vector={}", v.description);
            continue;
        }

        let text = res.expect("expected ok message");
        assert_eq!(Some(text), v.expect_text, "vector={}", v.description);
    }
}

#[test]
fn any_chunking_yields_the_same_message() {
    let message = r#"{"methodName":"Echo","data":{"text":"héllo wörld ✓"},"promiseId":"p1"}"#;
    let bytes = message.as_bytes();

    for size in 1..=bytes.len() {
        let mut acc = FrameAccumulator::new();
        for chunk in bytes.chunks(size) {
            acc.push(chunk);
        }
        assert_eq!(acc.finish().unwrap(), message, "chunk size {size}");
    }
}

#[test]
fn only_bytes_read_are_accumulated() {
    // A reused read buffer whose tail still holds zeros must not leak into the message.
    let mut buf = [0u8; 16];
    let mut acc = FrameAccumulator::new();

    let part = b"{\"a\":";
    buf[..part.len()].copy_from_slice(part);
    acc.push(&buf[..part.len()]);

    let part = b"1}";
    buf[..part.len()].copy_from_slice(part);
    acc.push(&buf[..part.len()]);

    assert_eq!(acc.finish().unwrap(), "{\"a\":1}");
}

#[test]
fn invalid_message_does_not_bleed_into_next() {
    let mut acc = FrameAccumulator::new();
    acc.push(&[0xff, 0xfe]);
    assert!(acc.finish().is_err());

    acc.push(b"ok");
    assert_eq!(acc.finish().unwrap(), "ok");
}
