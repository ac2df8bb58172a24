//! Background auto-save. A front-end publishes the latest reading snapshot
//! after each change; a worker thread writes the most recent one to the
//! gateway on every tick, so position is never more than one interval old
//! even if the process dies without a clean close.

use crate::store::{PersistenceGateway, ReadingRecord};
use log::{debug, warn};
use std::sync::mpsc::{self, RecvTimeoutError, Sender};
use std::sync::{Arc, Mutex};
use std::thread::JoinHandle;
use std::time::Duration;

/// Periodic writer of reading snapshots. Only the newest published record
/// is kept; intermediate snapshots between two ticks are superseded, which
/// is the point — the store sees at most one write per interval.
pub struct AutoSaver {
    slot: Arc<Mutex<Option<ReadingRecord>>>,
    shutdown: Sender<()>,
    handle: Option<JoinHandle<()>>,
}

impl AutoSaver {
    pub fn start(store: Arc<dyn PersistenceGateway>, interval: Duration) -> Self {
        let slot: Arc<Mutex<Option<ReadingRecord>>> = Arc::new(Mutex::new(None));
        let (shutdown, ticks) = mpsc::channel::<()>();
        let worker_slot = Arc::clone(&slot);

        let handle = std::thread::spawn(move || loop {
            let stopping = !matches!(
                ticks.recv_timeout(interval),
                Err(RecvTimeoutError::Timeout)
            );
            let pending = worker_slot.lock().ok().and_then(|mut slot| slot.take());
            if let Some(record) = pending {
                match store.save_record(&record) {
                    Ok(()) => debug!(
                        "Auto-saved {} at {}:{}",
                        record.book, record.last_position.chapter, record.last_position.page
                    ),
                    Err(e) => warn!("Auto-save for {} failed: {e}", record.book),
                }
            }
            if stopping {
                break;
            }
        });

        Self {
            slot,
            shutdown,
            handle: Some(handle),
        }
    }

    /// Queue a snapshot for the next tick, replacing any unsaved one.
    /// Never blocks on I/O.
    pub fn publish(&self, record: ReadingRecord) {
        if let Ok(mut slot) = self.slot.lock() {
            *slot = Some(record);
        }
    }

    /// Shut the worker down after one final flush of the pending snapshot.
    pub fn stop(mut self) {
        self.shutdown_and_join();
    }

    fn shutdown_and_join(&mut self) {
        let _ = self.shutdown.send(());
        if let Some(handle) = self.handle.take() {
            let _ = handle.join();
        }
    }
}

impl Drop for AutoSaver {
    fn drop(&mut self) {
        self.shutdown_and_join();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::position::Position;
    use crate::store::JsonStore;
    use chrono::Utc;

    fn record(book: &str, page: usize) -> ReadingRecord {
        ReadingRecord {
            book: book.to_string(),
            last_position: Position::new(0, page),
            total_reading_seconds: 0,
            last_opened_at: Utc::now(),
        }
    }

    #[test]
    fn test_stop_flushes_pending_snapshot() {
        let store: Arc<dyn PersistenceGateway> = Arc::new(JsonStore::ephemeral());
        let saver = AutoSaver::start(store.clone(), Duration::from_secs(3600));
        saver.publish(record("b", 4));
        saver.stop();

        let loaded = store.load_record("b").unwrap().unwrap();
        assert_eq!(loaded.last_position, Position::new(0, 4));
    }

    #[test]
    fn test_latest_snapshot_supersedes_earlier_ones() {
        let store: Arc<dyn PersistenceGateway> = Arc::new(JsonStore::ephemeral());
        let saver = AutoSaver::start(store.clone(), Duration::from_secs(3600));
        saver.publish(record("b", 1));
        saver.publish(record("b", 9));
        saver.stop();

        let loaded = store.load_record("b").unwrap().unwrap();
        assert_eq!(loaded.last_position, Position::new(0, 9));
    }

    #[test]
    fn test_drop_without_stop_still_flushes() {
        let store: Arc<dyn PersistenceGateway> = Arc::new(JsonStore::ephemeral());
        {
            let saver = AutoSaver::start(store.clone(), Duration::from_secs(3600));
            saver.publish(record("b", 2));
        }
        assert!(store.load_record("b").unwrap().is_some());
    }

    #[test]
    fn test_periodic_tick_writes_without_shutdown() {
        let store: Arc<dyn PersistenceGateway> = Arc::new(JsonStore::ephemeral());
        let saver = AutoSaver::start(store.clone(), Duration::from_millis(5));
        saver.publish(record("b", 3));

        for _ in 0..200 {
            if store.load_record("b").unwrap().is_some() {
                break;
            }
            std::thread::sleep(Duration::from_millis(5));
        }
        assert!(store.load_record("b").unwrap().is_some());
        saver.stop();
    }
}
