use std::sync::mpsc;
use std::thread;
use std::time::Duration;

use tracing::warn;

use bodega_events::{KeyScoped, Subscription};

/// Handle to control and join a background worker.
#[derive(Debug)]
pub struct WorkerHandle {
    shutdown: mpsc::Sender<()>,
    join: Option<thread::JoinHandle<()>>,
}

impl WorkerHandle {
    /// Request graceful shutdown and wait for the worker to stop.
    pub fn shutdown(mut self) {
        let _ = self.shutdown.send(());
        if let Some(j) = self.join.take() {
            let _ = j.join();
        }
    }

    /// Wait for the worker to stop on its own (its source was dropped).
    pub fn join(mut self) {
        if let Some(j) = self.join.take() {
            let _ = j.join();
        }
    }
}

/// Worker loop reacting to changes of a single storage key.
///
/// - Drains a store subscription
/// - Ignores messages for other keys
/// - Runs `on_start` once before the first message, then `handler` per match
/// - Stops on shutdown or when the store side of the subscription is dropped
#[derive(Debug)]
pub struct KeyWatcher;

impl KeyWatcher {
    /// Spawn the watcher thread.
    ///
    /// The subscription must be taken by the caller *before* any initial work
    /// so that no change between subscribing and starting is missed.
    pub fn spawn<M, H, E>(
        name: &'static str,
        sub: Subscription<M>,
        key: String,
        mut handler: H,
    ) -> std::io::Result<WorkerHandle>
    where
        M: KeyScoped + Send + 'static,
        H: FnMut(Option<M>) -> Result<(), E> + Send + 'static,
        E: core::fmt::Debug + Send + 'static,
    {
        let (shutdown_tx, shutdown_rx) = mpsc::channel::<()>();

        let join = thread::Builder::new()
            .name(name.to_string())
            .spawn(move || worker_loop(name, sub, shutdown_rx, &key, &mut handler))?;

        Ok(WorkerHandle {
            shutdown: shutdown_tx,
            join: Some(join),
        })
    }
}

fn worker_loop<M, H, E>(
    name: &'static str,
    sub: Subscription<M>,
    shutdown_rx: mpsc::Receiver<()>,
    key: &str,
    handler: &mut H,
) where
    M: KeyScoped,
    H: FnMut(Option<M>) -> Result<(), E>,
    E: core::fmt::Debug,
{
    let tick = Duration::from_millis(250);

    // Initial pass: state may already have changed before anyone watched.
    if let Err(err) = handler(None) {
        warn!(worker = name, error = ?err, "initial run failed");
    }

    loop {
        if shutdown_rx.try_recv().is_ok() {
            break;
        }

        match sub.recv_timeout(tick) {
            Ok(msg) => {
                if msg.key() != key {
                    continue;
                }

                if let Err(err) = handler(Some(msg)) {
                    warn!(worker = name, error = ?err, "watcher handler failed");
                }
            }
            Err(mpsc::RecvTimeoutError::Timeout) => continue,
            Err(mpsc::RecvTimeoutError::Disconnected) => break,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use bodega_events::{ChangeBus, InMemoryChangeBus, StorageEvent};

    #[test]
    fn handler_sees_initial_run_and_matching_keys_only() {
        let bus = InMemoryChangeBus::new();
        let (seen_tx, seen_rx) = mpsc::channel::<Option<String>>();

        let handle = KeyWatcher::spawn("test-watcher", bus.subscribe(), "watched".into(), move |msg: Option<StorageEvent>| {
            seen_tx.send(msg.map(|m| m.key)).map_err(|_| "closed")
        })
        .unwrap();

        bus.publish(StorageEvent::new("other", None, Some("x".into()))).unwrap();
        bus.publish(StorageEvent::new("watched", None, Some("y".into()))).unwrap();

        let timeout = Duration::from_secs(2);
        assert_eq!(seen_rx.recv_timeout(timeout).unwrap(), None);
        assert_eq!(seen_rx.recv_timeout(timeout).unwrap(), Some("watched".to_string()));

        handle.shutdown();
        assert!(seen_rx.try_recv().is_err());
    }

    #[test]
    fn failing_handler_is_logged_and_the_loop_continues() {
        let bus = InMemoryChangeBus::new();
        let (seen_tx, seen_rx) = mpsc::channel::<String>();
        let mut calls = 0u32;

        let handle = KeyWatcher::spawn("test-watcher", bus.subscribe(), "watched".into(), move |msg: Option<StorageEvent>| {
            calls += 1;
            let Some(msg) = msg else { return Ok(()) };
            if calls == 2 {
                return Err("first change fails");
            }
            seen_tx.send(msg.new_value.unwrap_or_default()).map_err(|_| "closed")
        })
        .unwrap();

        bus.publish(StorageEvent::new("watched", None, Some("first".into()))).unwrap();
        bus.publish(StorageEvent::new("watched", None, Some("second".into()))).unwrap();

        assert_eq!(seen_rx.recv_timeout(Duration::from_secs(2)).unwrap(), "second");
        handle.shutdown();
    }

    #[test]
    fn worker_stops_when_source_is_dropped() {
        let bus: InMemoryChangeBus<StorageEvent> = InMemoryChangeBus::new();
        let handle = KeyWatcher::spawn("test-watcher", bus.subscribe(), "k".into(), |_| Ok::<(), ()>(())).unwrap();
        drop(bus);
        handle.join();
    }
}
