use std::sync::Arc;

use tokio::sync::{OwnedRwLockWriteGuard, RwLock, RwLockReadGuard};

/// Reader/writer gate serializing access to one database.
///
/// Reads claim shared access and run concurrently with each other; writes
/// and transactions claim exclusive access, which is granted only once every
/// outstanding read has released. Acquisition is fair (FIFO), so a stream of
/// new readers cannot starve a waiting writer, and vice versa. There are no
/// timeouts: a reader that never releases blocks all future writers.
#[derive(Debug, Clone, Default)]
pub(crate) struct Gate {
    inner: Arc<RwLock<()>>,
}

impl Gate {
    pub(crate) fn new() -> Self {
        Self::default()
    }

    /// Claim shared (read) access, held while a cursor is walked.
    pub(crate) async fn shared(&self) -> RwLockReadGuard<'_, ()> {
        self.inner.read().await
    }

    /// Claim exclusive (write/transaction) access.
    ///
    /// The guard is owned so an explicit transaction can hold it across
    /// calls. Dropping the guard releases the gate exactly once, failure
    /// paths included.
    pub(crate) async fn exclusive(&self) -> OwnedRwLockWriteGuard<()> {
        Arc::clone(&self.inner).write_owned().await
    }
}

#[cfg(test)]
mod tests {
    use std::time::Duration;

    use tokio::time::timeout;

    use super::Gate;

    #[tokio::test]
    async fn readers_run_concurrently() {
        let gate = Gate::new();
        // All claims succeed without any earlier one being released.
        let mut guards = Vec::new();
        for _ in 0..8 {
            guards.push(
                timeout(Duration::from_millis(100), gate.shared())
                    .await
                    .expect("shared claim should not wait on other readers"),
            );
        }
    }

    #[tokio::test]
    async fn writer_waits_for_outstanding_readers() {
        let gate = Gate::new();
        let reader = gate.shared().await;

        let waiting_writer = timeout(Duration::from_millis(50), gate.exclusive()).await;
        assert!(
            waiting_writer.is_err(),
            "exclusive claim must wait for the reader"
        );

        drop(reader);
        timeout(Duration::from_millis(100), gate.exclusive())
            .await
            .expect("exclusive claim should proceed once readers release");
    }

    #[tokio::test]
    async fn writer_excludes_readers_and_writers() {
        let gate = Gate::new();
        let writer = gate.exclusive().await;

        assert!(
            timeout(Duration::from_millis(50), gate.shared())
                .await
                .is_err()
        );
        assert!(
            timeout(Duration::from_millis(50), gate.exclusive())
                .await
                .is_err()
        );

        drop(writer);
        timeout(Duration::from_millis(100), gate.shared())
            .await
            .expect("shared claim should proceed once the writer releases");
    }
}
