// ── Room list subscriptions ──
//
// Watches the store's room list, optionally narrowed by a RoomFilter.
// Every item is a full ordered snapshot, never a diff.

mod filter;

use std::pin::Pin;
use std::sync::Arc;
use std::task::{Context, Poll};

use futures_core::Stream;
use tokio::sync::watch;
use tokio_stream::wrappers::WatchStream;

use crate::model::RoomEntry;

pub use filter::RoomFilter;

type RoomList = Arc<Vec<Arc<RoomEntry>>>;

fn narrow(filter: Option<&RoomFilter>, rooms: RoomList) -> RoomList {
    match filter {
        None | Some(RoomFilter::All) => rooms,
        Some(f) => Arc::new(rooms.iter().filter(|r| f.matches(r)).cloned().collect()),
    }
}

/// A subscription to the projected room list.
///
/// `current()` is the view as of creation or the last `changed()`;
/// store order is preserved after filtering.
pub struct RoomStream {
    filter: Option<Arc<RoomFilter>>,
    current: RoomList,
    receiver: watch::Receiver<RoomList>,
}

impl RoomStream {
    pub(crate) fn new(receiver: watch::Receiver<RoomList>) -> Self {
        let current = receiver.borrow().clone();
        Self {
            filter: None,
            current,
            receiver,
        }
    }

    /// Only yield rooms matching `filter`.
    #[must_use]
    pub fn filtered(mut self, filter: RoomFilter) -> Self {
        let all = self.receiver.borrow().clone();
        self.current = narrow(Some(&filter), all);
        self.filter = Some(Arc::new(filter));
        self
    }

    pub fn current(&self) -> &RoomList {
        &self.current
    }

    /// Wait for the next store change to the room list. `None` once the
    /// store is gone.
    pub async fn changed(&mut self) -> Option<RoomList> {
        self.receiver.changed().await.ok()?;
        let all = self.receiver.borrow_and_update().clone();
        self.current = narrow(self.filter.as_deref(), all);
        Some(Arc::clone(&self.current))
    }

    /// Convert into a `Stream`. The first item is the list at conversion
    /// time.
    pub fn into_stream(self) -> RoomWatchStream {
        RoomWatchStream {
            filter: self.filter,
            inner: WatchStream::new(self.receiver),
        }
    }
}

/// `Stream` of filtered room list snapshots.
pub struct RoomWatchStream {
    filter: Option<Arc<RoomFilter>>,
    inner: WatchStream<RoomList>,
}

impl Stream for RoomWatchStream {
    type Item = RoomList;

    fn poll_next(mut self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Option<Self::Item>> {
        let this = &mut *self;
        Pin::new(&mut this.inner)
            .poll_next(cx)
            .map(|next| next.map(|rooms| narrow(this.filter.as_deref(), rooms)))
    }
}
