//! Producers feeding the tick loop.
//!
//! [`FrameInbox`] is called from the link layer with every write to the
//! command characteristic. [`forward_presses`] pumps a [`ButtonSource`] into
//! the keypad mailbox. Neither touches controller state.

use crate::mailbox::Mailbox;
use padlock_core::Button;
use padlock_hardware::ButtonSource;
use padlock_protocol::{Command, CommandFrame, CommandFrameDecoder, ProtocolError};
use tracing::{debug, trace};

/// Entry point for command frame writes.
#[derive(Debug, Clone)]
pub struct FrameInbox {
    commands: Mailbox<Command>,
}

impl FrameInbox {
    pub fn new(commands: Mailbox<Command>) -> Self {
        Self { commands }
    }

    /// Accept a raw write at offset 0.
    ///
    /// # Errors
    ///
    /// Returns `InvalidLength` unless exactly 8 bytes were written.
    pub fn on_frame(&self, data: &[u8]) -> Result<bool, ProtocolError> {
        self.on_write(0, data)
    }

    /// Accept a write at `offset`.
    ///
    /// Returns `true` when a command was queued. Writes that arrive whole but
    /// do not decode are dropped with `Ok(false)`.
    ///
    /// # Errors
    ///
    /// Returns `InvalidOffset` or `InvalidLength` for a write the link layer
    /// must reject.
    pub fn on_write(&self, offset: usize, data: &[u8]) -> Result<bool, ProtocolError> {
        let frame = CommandFrame::from_write(offset, data)?;
        Ok(self.accept(&frame))
    }

    /// Queue the command carried by `frame`, if any.
    pub fn accept(&self, frame: &CommandFrame) -> bool {
        let Some(command) = CommandFrameDecoder::decode_frame(frame) else {
            trace!("Dropping malformed frame {:?}", frame);
            return false;
        };

        trace!("Queued {} command", command.opcode());
        if let Some(displaced) = self.commands.post(command) {
            debug!("Unprocessed {} command replaced", displaced.opcode());
        }
        true
    }
}

/// Move keypad presses into `mailbox` until the source disconnects.
pub async fn forward_presses<K: ButtonSource>(mut keypad: K, mailbox: Mailbox<Button>) {
    loop {
        match keypad.next_press().await {
            Ok(button) => {
                if let Some(missed) = mailbox.post(button) {
                    debug!("Keypad press {} overwritten before scan", missed);
                }
            }
            Err(e) => {
                debug!("Keypad source ended: {}", e);
                break;
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use padlock_core::{AccessKey, constants::SET_KEY_MASK};
    use padlock_hardware::mock::MockKeypad;
    use padlock_protocol::UnlockGate;
    use rstest::rstest;

    fn inbox() -> (FrameInbox, Mailbox<Command>) {
        let mailbox = Mailbox::new();
        (FrameInbox::new(mailbox.clone()), mailbox)
    }

    #[test]
    fn test_valid_frame_is_queued() {
        let (inbox, mailbox) = inbox();
        let key = AccessKey::new([1, 1, 2, 2, 3, 3]);

        assert!(inbox.on_frame(CommandFrame::unlock(&key).as_bytes()).unwrap());
        assert_eq!(
            mailbox.take(),
            Some(Command::AttemptUnlock {
                key,
                gate: UnlockGate::Always
            })
        );
    }

    #[test]
    fn test_set_key_frame_is_unmasked() {
        let (inbox, mailbox) = inbox();
        let mut raw = [0x55, 0, 0, 0, 0, 0, 0, 0xBB];
        raw[1..7].copy_from_slice(&SET_KEY_MASK);

        inbox.on_frame(&raw).unwrap();
        assert_eq!(mailbox.take(), Some(Command::SetKey(AccessKey::new([0; 6]))));
    }

    #[rstest]
    #[case([0x54, 1, 2, 3, 4, 1, 2, 0xAA])]
    #[case([0x55, 1, 2, 3, 4, 1, 2, 0x00])]
    #[case([0x55, 0, 0, 0, 0, 0, 7, 0xCC])]
    fn test_malformed_frame_is_dropped(#[case] raw: [u8; 8]) {
        let (inbox, mailbox) = inbox();
        assert!(!inbox.on_frame(&raw).unwrap());
        assert!(mailbox.is_empty());
    }

    #[rstest]
    #[case(0, &[0x55; 7])]
    #[case(0, &[0x55; 9])]
    #[case(2, &[0x55; 8])]
    fn test_bad_write_rejected(#[case] offset: usize, #[case] data: &[u8]) {
        let (inbox, mailbox) = inbox();
        assert!(inbox.on_write(offset, data).is_err());
        assert!(mailbox.is_empty());
    }

    #[test]
    fn test_newer_frame_displaces_unprocessed() {
        let (inbox, mailbox) = inbox();
        inbox.accept(&CommandFrame::set_auto_close(true));
        inbox.accept(&CommandFrame::set_auto_close(false));
        assert_eq!(mailbox.take(), Some(Command::SetAutoClose(false)));
        assert!(mailbox.is_empty());
    }

    #[tokio::test]
    async fn test_forward_presses_until_disconnect() {
        let (keypad, handle) = MockKeypad::new();
        let mailbox = Mailbox::new();

        handle.press(Button::Enter).await.unwrap();
        handle.press(Button::Left).await.unwrap();
        drop(handle);

        forward_presses(keypad, mailbox.clone()).await;
        assert_eq!(mailbox.take(), Some(Button::Left));
    }
}
