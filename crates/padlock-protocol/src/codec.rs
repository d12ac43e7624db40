//! Tokio codecs for carrying command frames over a byte stream.
//!
//! The radio delivers each command frame as one characteristic write. A byte
//! stream (the emulator's TCP link, a UART bridge) has no such boundaries, so
//! these codecs restore them:
//!
//! ```text
//! peer  --CommandFrame (8 bytes)-->  device    PeerCodec -> FrameCodec
//! peer  <--DeviceStatus (4 bytes LE)--  device  FrameCodec -> PeerCodec
//! ```
//!
//! # Usage with Tokio Framed
//!
//! ```rust,no_run
//! use futures::StreamExt;
//! use padlock_protocol::{CommandFrameDecoder, FrameCodec};
//! use tokio::net::TcpListener;
//! use tokio_util::codec::Framed;
//!
//! # async fn example() -> std::io::Result<()> {
//! let listener = TcpListener::bind("127.0.0.1:7878").await?;
//! let (socket, _) = listener.accept().await?;
//! let mut framed = Framed::new(socket, FrameCodec::new());
//!
//! while let Some(Ok(frame)) = framed.next().await {
//!     println!("{:?}", CommandFrameDecoder::decode_frame(&frame));
//! }
//! # Ok(())
//! # }
//! ```

use bytes::{Buf, BufMut, BytesMut};
use padlock_core::{
    DeviceStatus,
    constants::{FRAME_LENGTH, START_MARKER},
};
use tokio_util::codec::{Decoder, Encoder};

use crate::{
    error::{ProtocolError, Result},
    frame::CommandFrame,
};

/// Bytes in an encoded status notification.
pub const STATUS_LENGTH: usize = 4;

/// Device-side codec: decodes command frames, encodes status notifications.
///
/// The decoder resynchronizes on the start marker: bytes before the next
/// `0x55` are discarded. Once aligned it yields the next 8 bytes as a frame
/// without judging them; decoding decides whether they carry a command.
#[derive(Debug, Default)]
pub struct FrameCodec {
    discarded: usize,
}

impl FrameCodec {
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of bytes dropped while searching for a start marker.
    pub fn discarded(&self) -> usize {
        self.discarded
    }

    fn resync(&mut self, src: &mut BytesMut) {
        match src.iter().position(|&b| b == START_MARKER) {
            Some(0) => {}
            Some(pos) => {
                self.discarded += pos;
                src.advance(pos);
            }
            None => {
                self.discarded += src.len();
                src.clear();
            }
        }
    }
}

impl Decoder for FrameCodec {
    type Item = CommandFrame;
    type Error = ProtocolError;

    fn decode(&mut self, src: &mut BytesMut) -> Result<Option<Self::Item>> {
        self.resync(src);

        if src.len() < FRAME_LENGTH {
            src.reserve(FRAME_LENGTH - src.len());
            return Ok(None);
        }

        let bytes = src.split_to(FRAME_LENGTH);
        CommandFrame::from_slice(&bytes).map(Some)
    }

    fn decode_eof(&mut self, src: &mut BytesMut) -> Result<Option<Self::Item>> {
        match self.decode(src)? {
            Some(frame) => Ok(Some(frame)),
            None => {
                // A truncated trailing frame is dropped like any malformed one.
                self.discarded += src.len();
                src.clear();
                Ok(None)
            }
        }
    }
}

impl Encoder<DeviceStatus> for FrameCodec {
    type Error = ProtocolError;

    fn encode(&mut self, item: DeviceStatus, dst: &mut BytesMut) -> Result<()> {
        dst.reserve(STATUS_LENGTH);
        dst.put_u32_le(item.as_u32());
        Ok(())
    }
}

/// Peer-side codec: encodes command frames, decodes status notifications.
#[derive(Debug, Default)]
pub struct PeerCodec;

impl PeerCodec {
    pub fn new() -> Self {
        PeerCodec
    }
}

impl Decoder for PeerCodec {
    type Item = DeviceStatus;
    type Error = ProtocolError;

    fn decode(&mut self, src: &mut BytesMut) -> Result<Option<Self::Item>> {
        if src.len() < STATUS_LENGTH {
            return Ok(None);
        }
        Ok(Some(DeviceStatus::from_u32(src.get_u32_le())))
    }
}

impl Encoder<CommandFrame> for PeerCodec {
    type Error = ProtocolError;

    fn encode(&mut self, item: CommandFrame, dst: &mut BytesMut) -> Result<()> {
        dst.extend_from_slice(item.as_bytes());
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use padlock_core::AccessKey;

    #[test]
    fn test_decode_complete_frame() {
        let mut codec = FrameCodec::new();
        let frame = CommandFrame::unlock(&AccessKey::default());
        let mut buffer = BytesMut::from(&frame.as_bytes()[..]);

        assert_eq!(codec.decode(&mut buffer).unwrap(), Some(frame));
        assert!(buffer.is_empty());
        assert_eq!(codec.discarded(), 0);
    }

    #[test]
    fn test_decode_partial_frame() {
        let mut codec = FrameCodec::new();
        let mut buffer = BytesMut::from(&[0x55, 1, 2, 3][..]);

        assert_eq!(codec.decode(&mut buffer).unwrap(), None);
        assert_eq!(buffer.len(), 4);

        buffer.extend_from_slice(&[4, 1, 2, 0xAA]);
        let frame = codec.decode(&mut buffer).unwrap().unwrap();
        assert_eq!(frame.into_bytes(), [0x55, 1, 2, 3, 4, 1, 2, 0xAA]);
    }

    #[test]
    fn test_decode_skips_garbage_before_marker() {
        let mut codec = FrameCodec::new();
        let mut buffer = BytesMut::from(&[0x00, 0x13, 0x37][..]);
        buffer.extend_from_slice(CommandFrame::set_auto_close(true).as_bytes());

        let frame = codec.decode(&mut buffer).unwrap().unwrap();
        assert_eq!(frame, CommandFrame::set_auto_close(true));
        assert_eq!(codec.discarded(), 3);
    }

    #[test]
    fn test_decode_drops_buffer_without_marker() {
        let mut codec = FrameCodec::new();
        let mut buffer = BytesMut::from(&b"no marker here"[..]);

        assert_eq!(codec.decode(&mut buffer).unwrap(), None);
        assert!(buffer.is_empty());
        assert_eq!(codec.discarded(), 14);
    }

    #[test]
    fn test_decode_multiple_frames_in_buffer() {
        let mut codec = FrameCodec::new();
        let first = CommandFrame::unlock(&AccessKey::default());
        let second = CommandFrame::set_auto_close(false);
        let mut buffer = BytesMut::new();
        buffer.extend_from_slice(first.as_bytes());
        buffer.extend_from_slice(second.as_bytes());

        assert_eq!(codec.decode(&mut buffer).unwrap(), Some(first));
        assert_eq!(codec.decode(&mut buffer).unwrap(), Some(second));
        assert_eq!(codec.decode(&mut buffer).unwrap(), None);
    }

    #[test]
    fn test_decode_eof_drops_truncated_frame() {
        let mut codec = FrameCodec::new();
        let mut buffer = BytesMut::from(&[0x55, 1, 2][..]);

        assert_eq!(codec.decode_eof(&mut buffer).unwrap(), None);
        assert!(buffer.is_empty());
    }

    #[test]
    fn test_encode_status_little_endian() {
        let mut codec = FrameCodec::new();
        let mut buffer = BytesMut::new();

        codec
            .encode(DeviceStatus::from_parts(0x0001, 0x0FA0), &mut buffer)
            .unwrap();
        assert_eq!(&buffer[..], &[0x01, 0x00, 0xA0, 0x0F]);
    }

    #[test]
    fn test_peer_codec_decodes_status() {
        let mut codec = PeerCodec::new();
        let mut buffer = BytesMut::from(&[0x03, 0x00, 0x34][..]);
        assert_eq!(codec.decode(&mut buffer).unwrap(), None);

        buffer.put_u8(0x12);
        assert_eq!(
            codec.decode(&mut buffer).unwrap(),
            Some(DeviceStatus::from_u32(0x1234_0003))
        );
    }
}
