use std::cmp::Reverse;
use std::collections::BinaryHeap;

/// Keeps the `k` greatest items pushed into it.
///
/// Backed by a min-heap: when a push takes the heap past `k` items the current
/// minimum is evicted, so memory stays at `k + 1` items whatever the input size.
#[derive(Debug)]
pub struct TopK<T: Ord> {
    k: usize,
    heap: BinaryHeap<Reverse<T>>,
}

impl<T: Ord> TopK<T> {
    pub fn new(k: usize) -> Self {
        Self {
            k,
            heap: BinaryHeap::with_capacity(k.saturating_add(1).min(1024)),
        }
    }

    pub fn push(&mut self, item: T) {
        if self.k == 0 {
            return;
        }
        self.heap.push(Reverse(item));
        if self.heap.len() > self.k {
            self.heap.pop();
        }
    }

    pub fn len(&self) -> usize {
        self.heap.len()
    }

    pub fn is_empty(&self) -> bool {
        self.heap.is_empty()
    }

    /// The smallest retained item, i.e. the next one to be evicted.
    pub fn min(&self) -> Option<&T> {
        self.heap.peek().map(|Reverse(item)| item)
    }

    /// Drains the heap (ascending) and reverses it: greatest first.
    pub fn into_sorted_vec(mut self) -> Vec<T> {
        let mut out = Vec::with_capacity(self.heap.len());
        while let Some(Reverse(item)) = self.heap.pop() {
            out.push(item);
        }
        out.reverse();
        out
    }
}

impl<T: Ord> Extend<T> for TopK<T> {
    fn extend<I: IntoIterator<Item = T>>(&mut self, iter: I) {
        for item in iter {
            self.push(item);
        }
    }
}
