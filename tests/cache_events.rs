use evictor::{
  Cache, CacheEntry, CacheEvent, CacheListener, EntryField, NullValidator, TimeValidator,
};
use std::sync::{Arc, Mutex};
use std::time::Duration;

/// Records every event as a short string so tests can assert kind, payload,
/// and order in one pass.
#[derive(Default)]
struct Recorder {
  events: Mutex<Vec<String>>,
}

impl Recorder {
  fn take(&self) -> Vec<String> {
    std::mem::take(&mut *self.events.lock().unwrap())
  }
}

impl CacheListener<i32> for Recorder {
  fn on_change(&self, event: &CacheEvent<'_, i32>) {
    let rendered = match event {
      CacheEvent::Added(entry) => format!("add:{}", entry.payload()),
      CacheEvent::Removed(entry) => format!("remove:{}", entry.payload()),
      CacheEvent::Replaced { old, new } => {
        format!("replace:{}->{}", old.payload(), new.payload())
      }
      CacheEvent::Reset => "reset".to_string(),
    };
    self.events.lock().unwrap().push(rendered);
  }

  fn on_entry_change(&self, _entry: &CacheEntry<i32>, field: EntryField) {
    self.events.lock().unwrap().push(format!("entry:{:?}", field));
  }
}

fn cache_with_recorder() -> (Cache<i32>, Arc<Recorder>) {
  let cache = Cache::new();
  let recorder = Arc::new(Recorder::default());
  cache.add_listener(recorder.clone());
  (cache, recorder)
}

fn valid_entry(payload: i32) -> CacheEntry<i32> {
  CacheEntry::new(payload, Arc::new(NullValidator::new(true)))
}

#[test]
fn events_follow_mutation_order() {
  let (mut cache, recorder) = cache_with_recorder();

  cache.add_with_key("a", valid_entry(1)).unwrap();
  cache.add_with_key("b", valid_entry(2)).unwrap();
  cache.remove("a").unwrap();

  assert_eq!(recorder.take(), vec!["add:1", "add:2", "remove:1"]);
}

#[test]
fn replace_fires_one_event_with_old_and_new() {
  let (mut cache, recorder) = cache_with_recorder();
  cache.add_with_key("k", valid_entry(1)).unwrap();
  recorder.take();

  cache.replace("k", valid_entry(2)).unwrap();
  assert_eq!(recorder.take(), vec!["replace:1->2"]);
}

#[test]
fn failed_mutations_emit_nothing() {
  let (mut cache, recorder) = cache_with_recorder();
  cache.add_with_key("k", valid_entry(1)).unwrap();
  recorder.take();

  cache.add_with_key("k", valid_entry(2)).unwrap_err();
  cache.replace("missing", valid_entry(3)).unwrap_err();
  assert!(cache.remove("missing").is_none());

  assert!(recorder.take().is_empty());
}

#[test]
fn clear_fires_per_entry_removes_then_one_reset() {
  let (mut cache, recorder) = cache_with_recorder();
  cache.add_with_key("a", valid_entry(1)).unwrap();
  cache.add_with_key("b", valid_entry(2)).unwrap();
  recorder.take();

  cache.clear();
  let events = recorder.take();
  assert_eq!(events.len(), 3);
  assert_eq!(events.last().map(String::as_str), Some("reset"));
  assert!(events[..2].iter().all(|e| e.starts_with("remove:")));
}

#[test]
fn purge_fires_a_remove_per_evicted_entry() {
  let (mut cache, recorder) = cache_with_recorder();
  cache.add_with_key("keep", valid_entry(1)).unwrap();
  let dead = CacheEntry::new(2, Arc::new(TimeValidator::new(Duration::ZERO)));
  cache.add_with_key("drop", dead).unwrap();
  recorder.take();

  cache.purge();
  assert_eq!(recorder.take(), vec!["remove:2"]);
}

#[test]
fn entry_field_setters_notify_by_field() {
  let (mut cache, recorder) = cache_with_recorder();
  cache.add_with_key("k", valid_entry(1)).unwrap();
  recorder.take();

  let entry = cache.get_mut("k").unwrap();
  entry.set_payload(5);
  entry.set_validator(Arc::new(NullValidator::new(true)));

  assert_eq!(recorder.take(), vec!["entry:Payload", "entry:Validator"]);
}

#[test]
fn removed_entries_stop_notifying() {
  let (mut cache, recorder) = cache_with_recorder();
  cache.add_with_key("k", valid_entry(1)).unwrap();

  let mut removed = cache.remove("k").unwrap();
  recorder.take();

  removed.set_payload(9);
  assert!(recorder.take().is_empty());
}
