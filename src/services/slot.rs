//! Replay-latest broadcast slot.
//!
//! Holds at most one value. Subscribers receive the current value when they
//! register and every value published afterwards. There is no history.

use std::cell::RefCell;
use std::rc::{Rc, Weak};

type Callback<T> = Rc<dyn Fn(Option<&T>)>;

struct SlotInner<T> {
	value: Option<Rc<T>>,
	next_id: u64,
	subscribers: Vec<(u64, Callback<T>)>,
}

pub struct LatestSlot<T> {
	inner: Rc<RefCell<SlotInner<T>>>,
}

impl<T> Clone for LatestSlot<T> {
	fn clone(&self) -> Self {
		Self {
			inner: self.inner.clone(),
		}
	}
}

impl<T: 'static> Default for LatestSlot<T> {
	fn default() -> Self {
		Self::new()
	}
}

impl<T: 'static> LatestSlot<T> {
	pub fn new() -> Self {
		Self {
			inner: Rc::new(RefCell::new(SlotInner {
				value: None,
				next_id: 0,
				subscribers: Vec::new(),
			})),
		}
	}

	pub fn latest(&self) -> Option<Rc<T>> {
		self.inner.borrow().value.clone()
	}

	/// Replace the held value and notify every subscriber.
	pub fn publish(&self, value: T) {
		let value = Rc::new(value);
		let subscribers = {
			let mut inner = self.inner.borrow_mut();
			inner.value = Some(value.clone());
			inner.subscribers.iter().map(|(_, cb)| cb.clone()).collect::<Vec<_>>()
		};
		for cb in subscribers {
			cb(Some(&*value));
		}
	}

	/// Register `f`; it is invoked immediately with the current value.
	pub fn subscribe(&self, f: impl Fn(Option<&T>) + 'static) -> Subscription {
		let cb: Callback<T> = Rc::new(f);
		let (id, current) = {
			let mut inner = self.inner.borrow_mut();
			let id = inner.next_id;
			inner.next_id += 1;
			inner.subscribers.push((id, cb.clone()));
			(id, inner.value.clone())
		};
		cb(current.as_deref());

		let weak: Weak<RefCell<SlotInner<T>>> = Rc::downgrade(&self.inner);
		Subscription {
			unsubscribe: Some(Box::new(move || {
				if let Some(inner) = weak.upgrade() {
					inner.borrow_mut().subscribers.retain(|(sid, _)| *sid != id);
				}
			})),
		}
	}

	pub fn subscriber_count(&self) -> usize {
		self.inner.borrow().subscribers.len()
	}
}

/// Keeps a slot callback registered until dropped.
#[must_use = "dropping a Subscription unsubscribes immediately"]
pub struct Subscription {
	unsubscribe: Option<Box<dyn FnOnce()>>,
}

impl Drop for Subscription {
	fn drop(&mut self) {
		if let Some(unsubscribe) = self.unsubscribe.take() {
			unsubscribe();
		}
	}
}

#[cfg(test)]
mod tests {
	use std::cell::RefCell;
	use std::rc::Rc;

	use pretty_assertions::assert_eq;

	use super::*;

	fn recorder() -> (Rc<RefCell<Vec<Option<u32>>>>, impl Fn(Option<&u32>) + 'static) {
		let seen = Rc::new(RefCell::new(Vec::new()));
		let sink = seen.clone();
		(seen, move |v: Option<&u32>| sink.borrow_mut().push(v.copied()))
	}

	#[test]
	fn subscriber_gets_none_before_first_publish() {
		let slot = LatestSlot::<u32>::new();
		let (seen, cb) = recorder();
		let _sub = slot.subscribe(cb);
		slot.publish(7);
		assert_eq!(*seen.borrow(), vec![None, Some(7)]);
	}

	#[test]
	fn late_subscriber_sees_only_latest() {
		let slot = LatestSlot::new();
		slot.publish(1);
		slot.publish(2);
		let (seen, cb) = recorder();
		let _sub = slot.subscribe(cb);
		assert_eq!(*seen.borrow(), vec![Some(2)]);
		assert_eq!(slot.latest().as_deref(), Some(&2));
	}

	#[test]
	fn every_subscriber_is_notified() {
		let slot = LatestSlot::new();
		let (first, cb1) = recorder();
		let (second, cb2) = recorder();
		let _a = slot.subscribe(cb1);
		let _b = slot.subscribe(cb2);
		slot.publish(5);
		assert_eq!(*first.borrow(), vec![None, Some(5)]);
		assert_eq!(*second.borrow(), vec![None, Some(5)]);
	}

	#[test]
	fn dropping_subscription_unregisters() {
		let slot = LatestSlot::new();
		let (seen, cb) = recorder();
		let sub = slot.subscribe(cb);
		assert_eq!(slot.subscriber_count(), 1);
		drop(sub);
		assert_eq!(slot.subscriber_count(), 0);
		slot.publish(3);
		assert_eq!(*seen.borrow(), vec![None]);
	}

	#[test]
	fn callbacks_may_publish_again() {
		let slot = LatestSlot::new();
		let inner = slot.clone();
		let _sub = slot.subscribe(move |v: Option<&u32>| {
			if v == Some(&1) {
				inner.publish(2);
			}
		});
		slot.publish(1);
		assert_eq!(slot.latest().as_deref(), Some(&2));
	}

	#[test]
	fn subscription_outliving_slot_is_harmless() {
		let slot = LatestSlot::<u32>::new();
		let sub = slot.subscribe(|_| {});
		drop(slot);
		drop(sub);
	}
}
