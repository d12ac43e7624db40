//! Host emulator wiring.

use crate::{config::EmulatorConfig, console::Console, link::LinkServer};
use anyhow::Result;
use padlock_firmware::{
    AccessController, ChannelTransport, NotifyGate, Padlock, StatusPublisher, forward_presses,
};
use padlock_hardware::{
    LockActuator, StatusIndicator,
    mock::{MockBoard, MockKeypad},
};
use padlock_storage::{Database, KeyStore, SqliteRecordStore};
use std::future::Future;
use tokio::io::BufReader;
use tracing::{info, warn};

/// Run the emulator until `shutdown` resolves or the console quits.
///
/// # Errors
///
/// Returns an error if the database cannot be opened or the link cannot
/// bind.
pub async fn run<F>(config: EmulatorConfig, shutdown: F) -> Result<()>
where
    F: Future<Output = ()>,
{
    let timing = config.padlock.timing.clone();

    let db = Database::new(config.padlock.storage.clone()).await?;
    let store = KeyStore::open(SqliteRecordStore::from_database(&db)).await?;
    for fault in store.boot_faults() {
        warn!("Repaired at boot: {}", fault);
    }

    let (board, board_handle) = MockBoard::new();
    let (keypad, keypad_handle) = MockKeypad::new();
    let (transport, statuses) = ChannelTransport::new(config.link.status_queue);
    let gate = NotifyGate::new();

    let publisher = StatusPublisher::new(transport, gate.clone());
    let reader = publisher.reader();
    let controller = AccessController::new(
        store,
        LockActuator::new(board.clone(), board.clone(), timing.drive_pulse_ticks),
        StatusIndicator::new(board),
        publisher,
        timing.clone(),
    );
    let mut padlock = Padlock::new(controller, &timing);

    let link = LinkServer::bind(
        config.link.listen_addr,
        padlock.frame_inbox(),
        gate,
        reader,
        statuses,
    )
    .await?;
    let link_task = tokio::spawn(async move {
        if let Err(e) = link.serve().await {
            warn!("Link stopped: {}", e);
        }
    });
    let keypad_task = tokio::spawn(forward_presses(keypad, padlock.button_mailbox()));

    let console = Console::new(keypad_handle, board_handle);
    let console_done = async move {
        if let Err(e) = console.run(BufReader::new(tokio::io::stdin())).await {
            warn!("Console input failed: {}", e);
        }
    };

    info!("Emulator started");
    padlock
        .run(async {
            tokio::select! {
                _ = shutdown => {}
                _ = console_done => {}
            }
        })
        .await;

    link_task.abort();
    keypad_task.abort();
    db.close().await;
    info!("Emulator stopped");
    Ok(())
}
