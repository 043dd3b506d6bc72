//! A binary min-heap used as the open list of an A* search.
//!
//! The tree is implicit and 1-indexed: the root sits in slot 1, the parent of slot `i` is
//! `i / 2` and its children are `2i` and `2i + 1`. Swaps only happen when a key is strictly
//! smaller, so items with equal keys keep their relative order along a sift path. This decides
//! which of several equally good nodes a search expands first and keeps searches deterministic.
//!
//! ```text
//!          [1]
//!        /     \
//!     [2]       [3]
//!    /   \     /   \
//!  [4]   [5] [6]   [7]
//! ```
//!

use crate::prelude::*;
use bevy::prelude::*;

/// Anything which can be ordered by an A* `f` score
pub trait HeapItem {
	/// The priority key, lower is extracted first
	fn f(&self) -> u32;
}

/// Binary min-heap with bounded growth
#[derive(Clone, Debug)]
pub struct PathHeap<T: HeapItem> {
	/// Items in tree order, slot `i` of the tree lives at `items[i - 1]`
	items: Vec<T>,
	/// Number of tree slots including the unused slot 0
	size: usize,
}

impl<T: HeapItem> PathHeap<T> {
	/// Create a new instance of [PathHeap] with room for `initial_size - 1` items
	pub fn new(initial_size: usize) -> Self {
		let size = initial_size.clamp(2, HEAP_SIZE_CEILING);
		PathHeap {
			items: Vec::with_capacity(size - 1),
			size,
		}
	}
	/// Number of items in the heap
	pub fn len(&self) -> usize {
		self.items.len()
	}
	/// Whether the heap holds nothing
	pub fn is_empty(&self) -> bool {
		self.items.is_empty()
	}
	/// Number of tree slots currently allocated, including slot 0
	pub fn get_size(&self) -> usize {
		self.size
	}
	/// Peek at tree slot `index` (1-indexed)
	pub fn get(&self, index: usize) -> Option<&T> {
		index.checked_sub(1).and_then(|i| self.items.get(i))
	}
	/// Peek at the minimum
	pub fn peek(&self) -> Option<&T> {
		self.items.first()
	}
	/// Add an item, growing the heap when it is full.
	///
	/// Growth is by doubling (at least 4 slots), a heap that would need more than
	/// [HEAP_SIZE_CEILING] slots fails with [NavMeshError::HeapCeilingExceeded]
	pub fn insert(&mut self, item: T) -> Result<(), NavMeshError> {
		if self.items.len() + 1 == self.size {
			let requested = (self.size + 4).max(self.size * 2);
			if requested > HEAP_SIZE_CEILING {
				error!(
					"Search heap tried to grow to {} slots, the ceiling is {}",
					requested, HEAP_SIZE_CEILING
				);
				return Err(NavMeshError::HeapCeilingExceeded { requested });
			}
			self.items.reserve_exact(requested - self.size);
			self.size = requested;
		}
		self.items.push(item);
		let last = self.items.len();
		self.sift_up(last);
		Ok(())
	}
	/// Remove and return the item with the lowest key
	pub fn extract_min(&mut self) -> Result<T, NavMeshError> {
		let last = self.items.pop().ok_or(NavMeshError::HeapEmpty)?;
		if self.items.is_empty() {
			return Ok(last);
		}
		let root = std::mem::replace(&mut self.items[0], last);
		self.sift_down();
		Ok(root)
	}
	/// Forget every item, the allocation is kept for the next search
	pub fn clear(&mut self) {
		self.items.clear();
	}
	/// Restore heap order after keys have been changed in place by re-running the sift-up step
	/// on every slot from 2 onwards
	pub fn rebuild(&mut self) {
		for i in 2..=self.items.len() {
			self.sift_up(i);
		}
	}
	/// Mutate every item (for instance after the search target moved) and restore heap order
	pub fn retarget(&mut self, mut update: impl FnMut(&mut T)) {
		for item in self.items.iter_mut() {
			update(item);
		}
		self.rebuild();
	}
	/// Move the item in tree slot `slot` towards the root while its parent has a larger key
	fn sift_up(&mut self, mut slot: usize) {
		while slot > 1 {
			let parent = slot / 2;
			if self.items[slot - 1].f() < self.items[parent - 1].f() {
				self.items.swap(slot - 1, parent - 1);
				slot = parent;
			} else {
				break;
			}
		}
	}
	/// Move the root down while either child has a smaller key, the left child wins ties
	fn sift_down(&mut self) {
		let count = self.items.len();
		let mut parent = 1;
		loop {
			let mut swap = parent;
			let left = parent * 2;
			let right = left + 1;
			if left <= count && self.items[left - 1].f() < self.items[swap - 1].f() {
				swap = left;
			}
			if right <= count && self.items[right - 1].f() < self.items[swap - 1].f() {
				swap = right;
			}
			if swap == parent {
				break;
			}
			self.items.swap(parent - 1, swap - 1);
			parent = swap;
		}
	}
}

#[rustfmt::skip]
#[cfg(test)]
mod tests {
	use super::*;
	use rand::{rngs::StdRng, Rng, SeedableRng};

	impl HeapItem for (u32, char) {
		fn f(&self) -> u32 {
			self.0
		}
	}
	impl HeapItem for u32 {
		fn f(&self) -> u32 {
			*self
		}
	}

	#[test]
	fn extracts_in_ascending_order() {
		let mut rng = StdRng::seed_from_u64(7);
		let mut heap = PathHeap::new(4);
		let mut inserted = Vec::new();
		for _ in 0..500 {
			let k: u32 = rng.random_range(0..100);
			heap.insert(k).unwrap();
			inserted.push(k);
		}
		let mut result = Vec::new();
		while !heap.is_empty() {
			result.push(heap.extract_min().unwrap());
		}
		inserted.sort();
		assert_eq!(inserted, result);
	}
	#[test]
	fn interleaved_operations_always_return_minimum() {
		let mut rng = StdRng::seed_from_u64(99);
		let mut heap = PathHeap::new(8);
		let mut shadow: Vec<u32> = Vec::new();
		for _ in 0..2000 {
			if shadow.is_empty() || rng.random_bool(0.6) {
				let k: u32 = rng.random_range(0..1000);
				heap.insert(k).unwrap();
				shadow.push(k);
			} else {
				let min = *shadow.iter().min().unwrap();
				let pos = shadow.iter().position(|x| *x == min).unwrap();
				shadow.swap_remove(pos);
				assert_eq!(min, heap.extract_min().unwrap());
			}
		}
	}
	#[test]
	fn equal_keys_keep_insertion_order() {
		let mut heap = PathHeap::new(8);
		heap.insert((5, 'a')).unwrap();
		heap.insert((3, 'b')).unwrap();
		heap.insert((3, 'c')).unwrap();
		heap.insert((1, 'd')).unwrap();
		let mut result = Vec::new();
		while let Ok(item) = heap.extract_min() {
			result.push(item);
		}
		let actual = vec![(1, 'd'), (3, 'b'), (3, 'c'), (5, 'a')];
		assert_eq!(actual, result);
	}
	#[test]
	fn extract_from_empty() {
		let mut heap: PathHeap<u32> = PathHeap::new(4);
		assert_eq!(Err(NavMeshError::HeapEmpty), heap.extract_min());
	}
	#[test]
	fn grows_by_doubling() {
		let mut heap = PathHeap::new(4);
		for k in 0..3 {
			heap.insert(k).unwrap();
		}
		assert_eq!(4, heap.get_size());
		heap.insert(3).unwrap();
		assert_eq!(8, heap.get_size());
	}
	#[test]
	fn grows_by_at_least_four() {
		let mut heap = PathHeap::new(2);
		heap.insert(1).unwrap();
		heap.insert(2).unwrap();
		assert_eq!(6, heap.get_size());
	}
	#[test]
	fn growth_ceiling_is_fatal() {
		let mut heap = PathHeap::new(HEAP_SIZE_CEILING / 2);
		// slot 0 is never used so one fewer item than slots fits
		for k in 0..(HEAP_SIZE_CEILING - 1) as u32 {
			heap.insert(k).unwrap();
		}
		assert_eq!(HEAP_SIZE_CEILING - 1, heap.len());
		let result = heap.insert(0);
		let actual = Err(NavMeshError::HeapCeilingExceeded { requested: HEAP_SIZE_CEILING * 2 });
		assert_eq!(actual, result);
		// nothing was silently dropped
		assert_eq!(HEAP_SIZE_CEILING - 1, heap.len());
	}
	#[test]
	fn clear_keeps_allocation() {
		let mut heap = PathHeap::new(4);
		for k in 0..20 {
			heap.insert(k).unwrap();
		}
		let size = heap.get_size();
		heap.clear();
		assert!(heap.is_empty());
		assert_eq!(size, heap.get_size());
		heap.insert(9).unwrap();
		assert_eq!(Some(&9), heap.peek());
	}
	#[test]
	fn rebuild_after_keys_change() {
		let mut heap = PathHeap::new(16);
		for k in [10, 20, 30, 40, 50] {
			heap.insert((k, 'x')).unwrap();
		}
		// invert every key so the previously largest becomes the smallest
		heap.retarget(|item| item.0 = 100 - item.0);
		let mut result = Vec::new();
		while let Ok(item) = heap.extract_min() {
			result.push(item.0);
		}
		assert_eq!(vec![50, 60, 70, 80, 90], result);
	}
	#[test]
	fn one_indexed_peek() {
		let mut heap = PathHeap::new(4);
		heap.insert(4).unwrap();
		heap.insert(2).unwrap();
		assert_eq!(None, heap.get(0));
		assert_eq!(Some(&2), heap.get(1));
		assert_eq!(Some(&4), heap.get(2));
	}
}
