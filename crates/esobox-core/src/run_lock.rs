//! Single-slot gate for exclusive session operations.
//!
//! Run, export, hello-world loading and language switching all mutate the
//! session, so at most one of them may execute at a time. Each admitted
//! operation snapshots the enabled state of every input surface, disables
//! them all, runs, and restores the snapshot before releasing the slot.

use crate::error::{CoreError, Result};
use crate::session::{InputStates, Session};
use async_trait::async_trait;
use futures::FutureExt;
use std::future::Future;
use std::panic::AssertUnwindSafe;
use std::sync::Arc;
use strum::Display;
use tokio::sync::{RwLock, Semaphore};
use tracing::Instrument;

/// Operations serialized by the [`RunLock`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Display)]
#[strum(serialize_all = "kebab-case")]
pub enum ExclusiveOp {
    Run,
    Export,
    HelloWorld,
    LanguageSwitch,
}

/// The set of input surfaces an exclusive operation locks.
#[async_trait]
pub trait InputSurfaces: Send + Sync {
    /// Records which surfaces are enabled, then disables all of them.
    async fn snapshot_and_disable(&self) -> InputStates;

    /// Puts every surface back to the recorded state.
    async fn restore(&self, states: InputStates);
}

#[async_trait]
impl InputSurfaces for RwLock<Session> {
    async fn snapshot_and_disable(&self) -> InputStates {
        let mut session = self.write().await;
        let states = session.input_states();
        session.set_all_enabled(false);
        states
    }

    async fn restore(&self, states: InputStates) {
        self.write().await.restore_input_states(&states);
    }
}

/// Mutual-exclusion gate with capacity one, owned per session.
///
/// Waiters are admitted in arrival order. Once admitted, an operation runs
/// to completion on its own task even if the caller stops waiting for it;
/// there is no cancellation.
#[derive(Clone)]
pub struct RunLock {
    slot: Arc<Semaphore>,
    surfaces: Arc<dyn InputSurfaces>,
}

impl RunLock {
    pub fn new(surfaces: Arc<dyn InputSurfaces>) -> Self {
        Self {
            slot: Arc::new(Semaphore::new(1)),
            surfaces,
        }
    }

    /// Whether an exclusive operation currently holds the slot.
    pub fn is_held(&self) -> bool {
        self.slot.available_permits() == 0
    }

    /// Waits for the slot, then runs `body` with all input surfaces disabled.
    ///
    /// Input states are restored whatever `body` returns, and also when it
    /// panics; the panic is then resumed on the caller.
    ///
    /// # Errors
    ///
    /// Returns an internal fault if the runtime shut down before the
    /// operation finished.
    pub async fn run_exclusive<F, Fut, T>(&self, op: ExclusiveOp, body: F) -> Result<T>
    where
        F: FnOnce() -> Fut + Send + 'static,
        Fut: Future<Output = T> + Send + 'static,
        T: Send + 'static,
    {
        let permit = self
            .slot
            .clone()
            .acquire_owned()
            .await
            .map_err(|_| CoreError::internal("run lock closed"))?;

        let surfaces = Arc::clone(&self.surfaces);
        let span = tracing::debug_span!("exclusive", op = %op);

        let task = tokio::spawn(
            async move {
                let _permit = permit;
                let states = surfaces.snapshot_and_disable().await;
                tracing::trace!("[RunLock] Acquired, {} surfaces disabled", states.len());

                let outcome = AssertUnwindSafe(async move { body().await })
                    .catch_unwind()
                    .await;

                surfaces.restore(states).await;
                tracing::trace!("[RunLock] Released");
                outcome
            }
            .instrument(span),
        );

        match task.await {
            Ok(Ok(value)) => Ok(value),
            Ok(Err(panic)) => std::panic::resume_unwind(panic),
            Err(err) => Err(CoreError::internal(format!(
                "{} operation did not complete: {}",
                op, err
            ))),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::encoding::EncodingRegistry;
    use crate::session::Field;
    use std::sync::Mutex;
    use std::time::Duration;

    /// Surfaces that record every lock transition into a shared log.
    struct RecordingSurfaces {
        log: Arc<Mutex<Vec<String>>>,
    }

    #[async_trait]
    impl InputSurfaces for RecordingSurfaces {
        async fn snapshot_and_disable(&self) -> InputStates {
            self.log.lock().unwrap().push("disable".to_string());
            InputStates::default()
        }

        async fn restore(&self, _states: InputStates) {
            self.log.lock().unwrap().push("restore".to_string());
        }
    }

    fn recording_lock() -> (RunLock, Arc<Mutex<Vec<String>>>) {
        let log = Arc::new(Mutex::new(Vec::new()));
        let surfaces = Arc::new(RecordingSurfaces { log: log.clone() });
        (RunLock::new(surfaces), log)
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn test_concurrent_operations_never_overlap() {
        let (lock, log) = recording_lock();

        let run = {
            let lock = lock.clone();
            let log = log.clone();
            tokio::spawn(async move {
                lock.run_exclusive(ExclusiveOp::Run, move || async move {
                    log.lock().unwrap().push("run:start".to_string());
                    tokio::time::sleep(Duration::from_millis(30)).await;
                    log.lock().unwrap().push("run:end".to_string());
                })
                .await
            })
        };
        let export = {
            let lock = lock.clone();
            let log = log.clone();
            tokio::spawn(async move {
                lock.run_exclusive(ExclusiveOp::Export, move || async move {
                    log.lock().unwrap().push("export:start".to_string());
                    tokio::time::sleep(Duration::from_millis(30)).await;
                    log.lock().unwrap().push("export:end".to_string());
                })
                .await
            })
        };

        run.await.unwrap().unwrap();
        export.await.unwrap().unwrap();

        let log = log.lock().unwrap().clone();
        assert_eq!(log.len(), 8);
        for window in log.chunks(4) {
            assert_eq!(window[0], "disable");
            assert_eq!(window[3], "restore");
            let op = window[1].trim_end_matches(":start");
            assert_eq!(window[2], format!("{}:end", op));
        }
        assert_ne!(log[1], log[5]);
        assert!(!lock.is_held());
    }

    #[tokio::test]
    async fn test_waiters_admitted_in_arrival_order() {
        let (lock, _log) = recording_lock();
        let order = Arc::new(Mutex::new(Vec::new()));

        let gate = Arc::new(tokio::sync::Notify::new());
        let first = {
            let lock = lock.clone();
            let gate = gate.clone();
            let order = order.clone();
            tokio::spawn(async move {
                lock.run_exclusive(ExclusiveOp::Run, move || async move {
                    gate.notified().await;
                    order.lock().unwrap().push(0);
                })
                .await
            })
        };
        while !lock.is_held() {
            tokio::task::yield_now().await;
        }

        let mut waiters = Vec::new();
        for i in 1..=5 {
            let lock = lock.clone();
            let order = order.clone();
            waiters.push(tokio::spawn(async move {
                lock.run_exclusive(ExclusiveOp::Export, move || async move {
                    order.lock().unwrap().push(i);
                })
                .await
            }));
            // Let the waiter enqueue before spawning the next one.
            for _ in 0..10 {
                tokio::task::yield_now().await;
            }
        }

        gate.notify_one();
        first.await.unwrap().unwrap();
        for waiter in waiters {
            waiter.await.unwrap().unwrap();
        }

        assert_eq!(*order.lock().unwrap(), vec![0, 1, 2, 3, 4, 5]);
    }

    #[tokio::test]
    async fn test_input_states_restored_after_error_result() {
        let session = Arc::new(RwLock::new(Session::blank(
            "Text",
            &EncodingRegistry::default(),
        )));
        let lock = RunLock::new(session.clone());

        let observer = session.clone();
        let result: Result<std::result::Result<(), String>> = lock
            .run_exclusive(ExclusiveOp::Run, move || async move {
                let inner = observer.read().await;
                assert!(Field::all().all(|f| !inner.is_enabled(f)));
                Err("interpreter failed".to_string())
            })
            .await;
        assert!(result.unwrap().is_err());

        let session = session.read().await;
        assert!(session.is_enabled(Field::Code));
        assert!(!session.is_enabled(Field::Output));
    }

    #[tokio::test]
    async fn test_snapshot_taken_on_every_acquisition() {
        let session = Arc::new(RwLock::new(Session::blank(
            "Text",
            &EncodingRegistry::default(),
        )));
        let lock = RunLock::new(session.clone());

        lock.run_exclusive(ExclusiveOp::Export, || async {})
            .await
            .unwrap();
        assert!(!session.read().await.is_enabled(Field::Output));

        session.write().await.set_enabled(Field::Output, true);

        lock.run_exclusive(ExclusiveOp::Run, || async {})
            .await
            .unwrap();
        assert!(session.read().await.is_enabled(Field::Output));
    }

    #[tokio::test]
    async fn test_panic_restores_and_releases() {
        let (lock, log) = recording_lock();

        let panicking = {
            let lock = lock.clone();
            tokio::spawn(async move {
                lock.run_exclusive::<_, _, ()>(ExclusiveOp::HelloWorld, || async {
                    panic!("invariant broken")
                })
                .await
            })
        };
        let err = panicking.await.unwrap_err();
        assert!(err.is_panic());
        assert_eq!(*log.lock().unwrap(), vec!["disable", "restore"]);

        let value = lock
            .run_exclusive(ExclusiveOp::LanguageSwitch, || async { 7 })
            .await
            .unwrap();
        assert_eq!(value, 7);
    }

    #[tokio::test]
    async fn test_admitted_operation_completes_without_caller() {
        let (lock, log) = recording_lock();
        let done = Arc::new(tokio::sync::Notify::new());

        let caller = {
            let lock = lock.clone();
            let done = done.clone();
            tokio::spawn(async move {
                lock.run_exclusive(ExclusiveOp::Run, move || async move {
                    tokio::time::sleep(Duration::from_millis(20)).await;
                    done.notify_one();
                })
                .await
            })
        };
        while !lock.is_held() {
            tokio::task::yield_now().await;
        }
        caller.abort();

        done.notified().await;
        lock.run_exclusive(ExclusiveOp::Export, || async {})
            .await
            .unwrap();
        assert_eq!(
            *log.lock().unwrap(),
            vec!["disable", "restore", "disable", "restore"]
        );
    }
}
