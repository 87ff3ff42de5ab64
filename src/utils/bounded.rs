use std::collections::VecDeque;
use std::sync::Mutex;

use crate::utils::error::{Error, Result};

/// What to do when an insertion would push a container past its limit.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OverflowPolicy {
    /// Drop elements from the front until the new element fits.
    EvictOldest,
    /// Fail the insertion and leave the container unchanged.
    Reject,
}

/// An ordered sequence with a fixed capacity and a pluggable overflow policy.
///
/// Insertion order is preserved; no two elements are ever reordered relative
/// to each other. `limit = None` means unbounded. The container is internally
/// synchronized, so the overflow check and the mutation are one atomic unit
/// even with concurrent callers.
///
/// The topic's message history uses `EvictOldest`; its participant sets use
/// `Reject`.
#[derive(Debug)]
pub struct BoundedContainer<T> {
    items: Mutex<VecDeque<T>>,
    limit: Option<usize>,
    policy: OverflowPolicy,
}

impl<T> BoundedContainer<T> {
    pub fn new(limit: Option<usize>, policy: OverflowPolicy) -> Self {
        Self {
            items: Mutex::new(VecDeque::new()),
            limit,
            policy,
        }
    }

    pub fn limit(&self) -> Option<usize> {
        self.limit
    }

    pub fn len(&self) -> usize {
        self.items.lock().unwrap().len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.lock().unwrap().is_empty()
    }

    /// Appends `item` at the back, evicting or rejecting per policy.
    pub fn append(&self, item: T) -> Result<()> {
        let mut items = self.items.lock().unwrap();
        self.make_room(&mut items, 1)?;
        items.push_back(item);
        Ok(())
    }

    /// Appends every element of `batch` in order.
    ///
    /// Under `Reject` the whole batch is refused if it does not fit. Under
    /// `EvictOldest` the oldest elements (including the head of the batch
    /// itself, when the batch alone exceeds the limit) are dropped so that
    /// exactly the newest `limit` elements remain.
    pub fn append_all(&self, batch: Vec<T>) -> Result<()> {
        let mut items = self.items.lock().unwrap();
        if let Some(limit) = self.limit {
            if batch.len() > limit {
                match self.policy {
                    OverflowPolicy::Reject => return Err(Error::Oversize { limit }),
                    OverflowPolicy::EvictOldest => {
                        items.clear();
                        let skip = batch.len() - limit;
                        items.extend(batch.into_iter().skip(skip));
                        return Ok(());
                    }
                }
            }
        }
        self.make_room(&mut items, batch.len())?;
        items.extend(batch);
        Ok(())
    }

    /// Inserts `item` at `index` (clamped to the current length), evicting or
    /// rejecting per policy.
    pub fn insert_at(&self, index: usize, item: T) -> Result<()> {
        let mut items = self.items.lock().unwrap();
        self.make_room(&mut items, 1)?;
        let index = index.min(items.len());
        items.insert(index, item);
        Ok(())
    }

    /// Removes every element matching `pred`, returning how many were removed.
    pub fn remove_where<F>(&self, mut pred: F) -> usize
    where
        F: FnMut(&T) -> bool,
    {
        let mut items = self.items.lock().unwrap();
        let before = items.len();
        items.retain(|item| !pred(item));
        before - items.len()
    }

    fn make_room(&self, items: &mut VecDeque<T>, incoming: usize) -> Result<()> {
        let Some(limit) = self.limit else {
            return Ok(());
        };
        if items.len() + incoming <= limit {
            return Ok(());
        }
        match self.policy {
            OverflowPolicy::Reject => Err(Error::Oversize { limit }),
            OverflowPolicy::EvictOldest => {
                let excess = items.len() + incoming - limit;
                for _ in 0..excess.min(items.len()) {
                    items.pop_front();
                }
                Ok(())
            }
        }
    }
}

impl<T: Clone> BoundedContainer<T> {
    /// Returns a point-in-time copy of the contents in FIFO order.
    pub fn snapshot(&self) -> Vec<T> {
        self.items.lock().unwrap().iter().cloned().collect()
    }
}
