use evictor::{Cache, CacheEntry, CacheError, NullValidator, TimeValidator};
use std::{sync::Arc, thread, time::Duration};

fn valid_entry(payload: i32) -> CacheEntry<i32> {
  CacheEntry::new(payload, Arc::new(NullValidator::new(true)))
}

#[test]
fn add_get_remove_round_trip() {
  let mut cache = Cache::new();
  cache.add_with_key("a", valid_entry(7)).unwrap();

  let entry = cache.get("a").expect("entry should be present");
  assert_eq!(*entry.payload(), 7);
  assert_eq!(cache.len(), 1);

  let removed = cache.remove("a").expect("entry should be removable");
  assert_eq!(*removed.payload(), 7);
  assert!(!cache.contains("a"));
  assert!(cache.is_empty());
}

#[test]
fn add_without_key_uses_the_entry_id() {
  let mut cache = Cache::new();
  let entry = valid_entry(1);
  let id = entry.id().to_string();
  cache.add(entry).unwrap();
  assert!(cache.contains(&id));
}

#[test]
fn duplicate_add_rejected_first_entry_survives() {
  let mut cache = Cache::new();
  cache.add_with_key("k", valid_entry(1)).unwrap();

  let err = cache.add_with_key("k", valid_entry(2)).unwrap_err();
  assert!(matches!(err, CacheError::DuplicateKey(_)));

  assert_eq!(*cache.get("k").unwrap().payload(), 1);
  assert_eq!(cache.len(), 1);
}

#[test]
fn empty_key_and_empty_id_rejected() {
  let mut cache = Cache::new();
  let err = cache.add_with_key("", valid_entry(1)).unwrap_err();
  assert_eq!(err, CacheError::EmptyKey);

  let err = CacheEntry::with_id("", 1, Arc::new(NullValidator::new(true))).unwrap_err();
  assert_eq!(err, CacheError::EmptyId);
}

#[test]
fn replace_requires_an_existing_key() {
  let mut cache = Cache::new();
  let err = cache.replace("missing", valid_entry(1)).unwrap_err();
  assert!(matches!(err, CacheError::KeyNotFound(_)));

  cache.add_with_key("k", valid_entry(1)).unwrap();
  let old = cache.replace("k", valid_entry(2)).unwrap();
  assert_eq!(*old.payload(), 1);
  assert_eq!(*cache.get("k").unwrap().payload(), 2);
  assert_eq!(cache.len(), 1);
}

#[test]
fn purge_removes_exactly_the_invalid_entries() {
  let mut cache = Cache::new();
  cache.add_with_key("keep", valid_entry(1)).unwrap();
  let expiring = CacheEntry::new(2, Arc::new(TimeValidator::new(Duration::from_millis(25))));
  cache.add_with_key("drop", expiring).unwrap();

  thread::sleep(Duration::from_millis(60));

  let removed = cache.purge();
  assert_eq!(removed.len(), 1);
  assert_eq!(*removed[0].payload(), 2);
  assert!(cache.contains("keep"));
  assert!(!cache.contains("drop"));

  // A second pass finds nothing left to remove.
  assert!(cache.purge().is_empty());
  assert!(cache.try_purge().is_none());
}

#[test]
fn expired_entry_purged_end_to_end() {
  let mut cache: Cache<i32> = Cache::new();
  let entry = CacheEntry::new(42, Arc::new(TimeValidator::new(Duration::from_millis(50))));
  cache.add_with_key("item", entry).unwrap();

  thread::sleep(Duration::from_millis(80));

  let removed = cache.purge();
  assert_eq!(removed.len(), 1);
  assert_eq!(*removed[0].payload(), 42);
  assert_eq!(cache.len(), 0);
}

#[test]
fn clear_removes_everything() {
  let mut cache = Cache::new();
  cache.add_with_key("a", valid_entry(1)).unwrap();
  cache.add_with_key("b", valid_entry(2)).unwrap();

  let removed = cache.clear();
  assert_eq!(removed.len(), 2);
  assert!(cache.is_empty());
}

#[test]
fn validity_check_stamps_the_check_instant() {
  let mut cache = Cache::new();
  cache.add_with_key("k", valid_entry(1)).unwrap();

  let entry = cache.get("k").unwrap();
  assert!(entry.last_validity_check().is_none());
  assert!(entry.is_valid());
  assert!(entry.last_validity_check().is_some());

  // The stamp is a diagnostic side effect only; the entry stays put.
  assert!(cache.purge().is_empty());
  assert!(cache.contains("k"));
}

#[test]
fn payload_access_stamps_the_access_instant() {
  let mut cache = Cache::new();
  cache.add_with_key("k", valid_entry(1)).unwrap();

  assert!(cache.get("k").unwrap().last_payload_access().is_none());
  let _ = cache.get("k").unwrap().payload();
  assert!(cache.get("k").unwrap().last_payload_access().is_some());

  let entry = cache.get_mut("k").unwrap();
  entry.set_payload(9);
  assert_eq!(*entry.payload(), 9);
}

#[test]
fn mark_invalid_forces_the_next_purge() {
  let mut cache = Cache::new();
  cache.add_with_key("k", valid_entry(1)).unwrap();

  cache.get("k").unwrap().validator().mark_invalid();
  let removed = cache.purge();
  assert_eq!(removed.len(), 1);
  assert!(cache.is_empty());
}
