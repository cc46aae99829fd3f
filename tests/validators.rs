use evictor::{NullValidator, TimeValidator, Validator};
use std::{
  thread,
  time::{Duration, Instant},
};

const SHORT_TTL: Duration = Duration::from_millis(40);
const SLEEP_MARGIN: Duration = Duration::from_millis(40);

#[test]
fn time_validator_valid_until_deadline() {
  let validator = TimeValidator::new(SHORT_TTL);
  assert!(validator.is_valid());
  thread::sleep(SHORT_TTL + SLEEP_MARGIN);
  assert!(!validator.is_valid(), "validator should have expired");
}

#[test]
fn time_validator_reset_rearms_from_the_reset_instant() {
  let ttl = Duration::from_millis(100);
  let validator = TimeValidator::new(ttl);

  thread::sleep(Duration::from_millis(50));
  let before = Instant::now();
  validator.reset();
  let after = Instant::now();

  // The new deadline must be reset-time + original ttl, not the old
  // deadline + ttl: repeated resets slide a constant-width window.
  let deadline = validator.expires_at();
  assert!(
    deadline >= before + ttl - Duration::from_millis(1),
    "deadline re-armed from something earlier than the reset instant"
  );
  assert!(
    deadline <= after + ttl + Duration::from_millis(1),
    "deadline accumulated beyond reset-time + ttl"
  );
}

#[test]
fn time_validator_ttl_is_the_construction_delta() {
  let validator = TimeValidator::new(SHORT_TTL);
  assert_eq!(validator.ttl(), SHORT_TTL);
  validator.reset();
  assert_eq!(validator.ttl(), SHORT_TTL);
}

#[test]
fn time_validator_mark_invalid_is_sticky_until_reset() {
  let validator = TimeValidator::new(Duration::from_secs(3600));
  assert!(validator.is_valid());

  validator.mark_invalid();
  assert!(!validator.is_valid());
  // Still invalid on a later check; the mark does not decay.
  assert!(!validator.is_valid());

  validator.reset();
  assert!(validator.is_valid());
}

#[test]
fn time_validator_reset_at_overrides_the_deadline() {
  let validator = TimeValidator::new(Duration::from_secs(3600));
  validator.reset_at(Instant::now() - Duration::from_millis(1));
  assert!(!validator.is_valid(), "past deadline should be invalid");

  validator.mark_invalid();
  validator.reset_at(Instant::now() + Duration::from_secs(60));
  assert!(validator.is_valid(), "reset_at should clear the invalid mark");
}

#[test]
fn null_validator_reports_its_response() {
  let validator = NullValidator::new(true);
  assert!(validator.is_valid());

  validator.set_response(false);
  assert!(!validator.is_valid());
  assert!(!validator.response());

  validator.set_response(true);
  assert!(validator.is_valid());
}

#[test]
fn null_validator_mark_invalid_overrides_response() {
  let validator = NullValidator::new(true);
  validator.mark_invalid();
  assert!(!validator.is_valid());
  assert!(validator.response(), "response is untouched by the mark");

  validator.reset();
  assert!(validator.is_valid());
}
