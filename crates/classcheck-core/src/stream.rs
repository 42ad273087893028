// ── Roster subscriptions ──
//
// Handed out by `RosterStore::subscribe`. Each item is the whole roster,
// ordered by id, as of the last refresh or single-entry change.

use std::pin::Pin;
use std::sync::Arc;
use std::task::{Context, Poll};

use futures_core::Stream;
use tokio::sync::watch;
use tokio_stream::wrappers::WatchStream;

use crate::model::Student;

/// Shared, ordered roster snapshot.
pub type Roster = Arc<Vec<Arc<Student>>>;

/// Live view of the roster cache.
pub struct RosterStream {
    seen: Roster,
    rx: watch::Receiver<Roster>,
}

impl RosterStream {
    pub(crate) fn new(rx: watch::Receiver<Roster>) -> Self {
        let seen = rx.borrow().clone();
        Self { seen, rx }
    }

    /// The roster as of the last `changed()` (or subscription).
    pub fn seen(&self) -> &Roster {
        &self.seen
    }

    /// The roster right now, without marking it seen.
    pub fn latest(&self) -> Roster {
        self.rx.borrow().clone()
    }

    /// Wait for the roster to change. `None` once the store is gone.
    pub async fn changed(&mut self) -> Option<Roster> {
        self.rx.changed().await.ok()?;
        self.seen = self.rx.borrow_and_update().clone();
        Some(Arc::clone(&self.seen))
    }

    pub fn into_stream(self) -> RosterUpdates {
        RosterUpdates {
            inner: WatchStream::new(self.rx),
        }
    }
}

/// [`Stream`] of roster snapshots: the current one first, then one per change.
pub struct RosterUpdates {
    inner: WatchStream<Roster>,
}

impl Stream for RosterUpdates {
    type Item = Roster;

    fn poll_next(mut self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Option<Roster>> {
        Pin::new(&mut self.inner).poll_next(cx)
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use chrono::Utc;
    use futures_util::StreamExt;

    use super::*;
    use crate::model::StudentId;

    fn roster(rolls: &[&str]) -> Roster {
        Arc::new(
            rolls
                .iter()
                .zip(1..)
                .map(|(roll, id)| {
                    Arc::new(Student {
                        id: StudentId::new(id),
                        name: format!("Student {id}"),
                        roll_no: (*roll).into(),
                        department: "EE".into(),
                        created_at: Utc::now(),
                    })
                })
                .collect(),
        )
    }

    #[tokio::test]
    async fn changed_moves_the_seen_snapshot() {
        let (tx, rx) = watch::channel(roster(&["EE01"]));
        let mut sub = RosterStream::new(rx);
        assert_eq!(sub.seen().len(), 1);

        tx.send_replace(roster(&["EE01", "EE02"]));
        assert_eq!(sub.seen().len(), 1);
        assert_eq!(sub.latest().len(), 2);

        let next = sub.changed().await.unwrap();
        assert_eq!(next[1].roll_no, "EE02");
        assert_eq!(sub.seen().len(), 2);

        drop(tx);
        assert!(sub.changed().await.is_none());
    }

    #[tokio::test]
    async fn updates_start_with_current_roster() {
        let (tx, rx) = watch::channel(roster(&[]));
        let mut updates = RosterStream::new(rx).into_stream();

        assert!(updates.next().await.unwrap().is_empty());
        tx.send_replace(roster(&["EE07"]));
        assert_eq!(updates.next().await.unwrap()[0].roll_no, "EE07");
    }
}
