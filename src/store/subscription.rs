// src/store/subscription.rs

use futures::Stream;
use tokio::{sync::watch, task::JoinHandle};

use crate::{
    error::AppError,
    models::user_stats::{StatsDocument, UserStats},
};

pub(crate) type SnapshotSender = watch::Sender<Result<StatsDocument, AppError>>;
pub(crate) type SnapshotReceiver = watch::Receiver<Result<StatsDocument, AppError>>;

/// Aborts the background listener when the subscription goes away.
struct ListenerGuard(JoinHandle<()>);

impl Drop for ListenerGuard {
    fn drop(&mut self) {
        self.0.abort();
    }
}

/// Live view of one user's stats document.
///
/// The first `next()` resolves immediately with the current aggregate, every
/// later call waits for the next change. Dropping the subscription releases
/// the underlying listener, whichever way the consumer exits.
pub struct StatsSubscription {
    rx: SnapshotReceiver,
    primed: bool,
    _listener: Option<ListenerGuard>,
}

impl StatsSubscription {
    pub(crate) fn new(rx: SnapshotReceiver, listener: Option<JoinHandle<()>>) -> Self {
        Self {
            rx,
            primed: false,
            _listener: listener.map(ListenerGuard),
        }
    }

    /// Next snapshot, or `None` once the store side has shut down.
    pub async fn next(&mut self) -> Option<Result<UserStats, AppError>> {
        if !self.primed {
            self.primed = true;
        } else if self.rx.changed().await.is_err() {
            return None;
        }

        let snapshot = self.rx.borrow_and_update().clone();
        Some(snapshot.map(UserStats::from))
    }

    pub fn into_stream(self) -> impl Stream<Item = Result<UserStats, AppError>> + Send {
        futures::stream::unfold(self, |mut sub| async move {
            sub.next().await.map(|item| (item, sub))
        })
    }
}
