//! Integration tests for FrameCodec and PeerCodec over Tokio streams.
//!
//! A peer and a device are connected through an in-memory duplex pipe and
//! exchange command frames and status notifications.

use futures::{SinkExt, StreamExt};
use padlock_core::{AccessKey, DeviceStatus};
use padlock_protocol::{
    Command, CommandFrame, CommandFrameDecoder, FrameCodec, PeerCodec, UnlockGate,
};
use tokio::io::{AsyncWriteExt, DuplexStream};
use tokio_util::codec::{Framed, FramedRead};

/// Helper function to create a connected (peer, device) pair.
fn create_framed_duplex(
    buffer_size: usize,
) -> (
    Framed<DuplexStream, PeerCodec>,
    Framed<DuplexStream, FrameCodec>,
) {
    let (peer, device) = tokio::io::duplex(buffer_size);
    (
        Framed::new(peer, PeerCodec::new()),
        Framed::new(device, FrameCodec::new()),
    )
}

#[tokio::test]
async fn test_unlock_frame_reaches_device() {
    let (mut peer, mut device) = create_framed_duplex(64);

    let key = AccessKey::new([1, 1, 2, 2, 3, 3]);
    peer.send(CommandFrame::unlock(&key)).await.unwrap();

    let frame = device.next().await.unwrap().unwrap();
    assert_eq!(
        CommandFrameDecoder::decode_frame(&frame),
        Some(Command::AttemptUnlock {
            key,
            gate: UnlockGate::Always
        })
    );
}

#[tokio::test]
async fn test_status_notification_reaches_peer() {
    let (mut peer, mut device) = create_framed_duplex(64);

    let status = DeviceStatus::from_parts(0x0001, 0x1000);
    device.send(status).await.unwrap();

    assert_eq!(peer.next().await.unwrap().unwrap(), status);
}

#[tokio::test]
async fn test_frames_in_sequence() {
    let (mut peer, mut device) = create_framed_duplex(256);

    let commands = [
        Command::SetAutoClose(true),
        Command::SetKey(AccessKey::new([4, 4, 3, 3, 2, 2])),
        Command::AttemptUnlock {
            key: AccessKey::new([4, 4, 3, 3, 2, 2]),
            gate: UnlockGate::AutoCloseEnabled,
        },
    ];

    for command in &commands {
        peer.send(command.to_frame()).await.unwrap();
    }

    for expected in commands {
        let frame = device.next().await.unwrap().unwrap();
        assert_eq!(CommandFrameDecoder::decode_frame(&frame), Some(expected));
    }
}

#[tokio::test]
async fn test_frame_split_across_writes() {
    let (mut raw_peer, device) = tokio::io::duplex(64);
    let mut device = FramedRead::new(device, FrameCodec::new());

    let frame = CommandFrame::set_auto_close(true);
    let (head, tail) = frame.as_bytes().split_at(3);

    raw_peer.write_all(head).await.unwrap();
    raw_peer.flush().await.unwrap();
    raw_peer.write_all(tail).await.unwrap();

    assert_eq!(device.next().await.unwrap().unwrap(), frame);
}

#[tokio::test]
async fn test_noise_between_frames_is_skipped() {
    let (mut raw_peer, device) = tokio::io::duplex(128);
    let mut device = FramedRead::new(device, FrameCodec::new());

    let first = CommandFrame::unlock(&AccessKey::default());
    let second = CommandFrame::set_auto_close(false);

    raw_peer.write_all(b"\x00\x01").await.unwrap();
    raw_peer.write_all(first.as_bytes()).await.unwrap();
    raw_peer.write_all(b"\xFE").await.unwrap();
    raw_peer.write_all(second.as_bytes()).await.unwrap();
    drop(raw_peer);

    assert_eq!(device.next().await.unwrap().unwrap(), first);
    assert_eq!(device.next().await.unwrap().unwrap(), second);
    assert!(device.next().await.is_none());
    assert_eq!(device.decoder().discarded(), 3);
}

#[tokio::test]
async fn test_malformed_frame_is_delivered_but_not_decoded() {
    let (mut peer, mut device) = create_framed_duplex(64);

    let unknown = CommandFrame::from_bytes([0x55, 1, 2, 3, 4, 1, 2, 0x42]);
    peer.send(unknown).await.unwrap();

    let frame = device.next().await.unwrap().unwrap();
    assert_eq!(frame, unknown);
    assert_eq!(CommandFrameDecoder::decode_frame(&frame), None);
}

#[tokio::test]
async fn test_truncated_frame_at_eof_is_dropped() {
    let (mut raw_peer, device) = tokio::io::duplex(64);
    let mut device = FramedRead::new(device, FrameCodec::new());

    raw_peer.write_all(&[0x55, 1, 2, 3]).await.unwrap();
    drop(raw_peer);

    assert!(device.next().await.is_none());
}
