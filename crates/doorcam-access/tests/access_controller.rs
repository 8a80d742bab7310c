//! Integration tests for AccessController
//!
//! The controller runs against the mock reader and relay and a scripted
//! authorizer, under a paused clock so pulse widths and cooldown deadlines
//! are exact.

use std::collections::VecDeque;
use std::sync::{Arc, Mutex};
use std::time::Duration;

use doorcam_access::{AccessController, AccessSettings, AccessState, Authorizer};
use doorcam_core::{CredentialId, Verdict};
use doorcam_hardware::mock::{MockActuator, MockActuatorHandle, MockReader, MockReaderHandle};

/// Authorizer answering from a queue and recording what it was asked.
#[derive(Debug, Clone, Default)]
struct ScriptedAuthorizer {
    verdicts: Arc<Mutex<VecDeque<Verdict>>>,
    seen: Arc<Mutex<Vec<String>>>,
}

impl ScriptedAuthorizer {
    fn answer(&self, status: u16, body: &str) {
        self.verdicts
            .lock()
            .unwrap()
            .push_back(Verdict::from_response(status, body));
    }

    fn seen(&self) -> Vec<String> {
        self.seen.lock().unwrap().clone()
    }
}

impl Authorizer for ScriptedAuthorizer {
    async fn authorize(&self, id: &CredentialId) -> Verdict {
        self.seen.lock().unwrap().push(id.to_string());
        self.verdicts
            .lock()
            .unwrap()
            .pop_front()
            .unwrap_or_else(|| Verdict::transport_failure("no scripted verdict"))
    }
}

struct Rig {
    controller: AccessController<MockReader, MockActuator, ScriptedAuthorizer>,
    reader: MockReaderHandle,
    relay: MockActuatorHandle,
    authorizer: ScriptedAuthorizer,
}

async fn rig(settings: AccessSettings) -> Rig {
    let (reader, reader_handle) = MockReader::new();
    let (actuator, relay) = MockActuator::new();
    let authorizer = ScriptedAuthorizer::default();

    let controller = AccessController::new(reader, actuator, authorizer.clone(), settings)
        .await
        .unwrap();

    Rig {
        controller,
        reader: reader_handle,
        relay,
        authorizer,
    }
}

fn settings() -> AccessSettings {
    AccessSettings {
        pulse_width: Duration::from_millis(1000),
        debounce: Duration::from_millis(3000),
        cooldown_on_denial: false,
    }
}

impl Rig {
    /// Step until `target` is reached, returning every state visited.
    async fn step_until(&mut self, target: AccessState) -> Vec<AccessState> {
        let mut visited = Vec::new();
        for _ in 0..16 {
            let state = self.controller.step().await;
            visited.push(state);
            if state == target {
                return visited;
            }
        }
        panic!("never reached {target}, visited {visited:?}");
    }
}

#[tokio::test(start_paused = true)]
async fn test_idle_without_token() {
    let mut rig = rig(settings()).await;

    for _ in 0..5 {
        assert_eq!(rig.controller.step().await, AccessState::Idle);
    }
    assert!(rig.authorizer.seen().is_empty());
    assert_eq!(rig.reader.read_count(), 0);
}

#[tokio::test(start_paused = true)]
async fn test_approved_scan_pulses_once_then_cools_down() {
    let mut rig = rig(settings()).await;
    rig.authorizer.answer(200, r#"{"status":"ok"}"#);
    rig.reader.present_token(vec![0x0A, 0xFF]).await.unwrap();

    let visited = rig.step_until(AccessState::Cooldown).await;
    assert_eq!(
        visited,
        vec![
            AccessState::TokenDetected,
            AccessState::IdentifierExtracted,
            AccessState::AwaitingAuthorization,
            AccessState::DoorOpen,
            AccessState::Cooldown,
        ]
    );

    assert_eq!(rig.authorizer.seen(), vec!["0AFF".to_string()]);
    assert_eq!(rig.reader.halt_count(), 1);
    assert_eq!(rig.controller.pulse_count(), 1);
    assert!(rig.controller.last_verdict().unwrap().is_approved());

    let pulses = rig.relay.pulses();
    assert_eq!(pulses.len(), 1);
    assert_eq!(pulses[0].width(), Some(Duration::from_millis(1000)));
    assert!(!rig.relay.is_engaged());

    // Still cooling down just before the deadline
    tokio::time::advance(Duration::from_millis(2999)).await;
    assert_eq!(rig.controller.step().await, AccessState::Cooldown);
    assert_eq!(
        rig.controller.cooldown_remaining(),
        Some(Duration::from_millis(1))
    );

    tokio::time::advance(Duration::from_millis(1)).await;
    assert_eq!(rig.controller.step().await, AccessState::Idle);
    assert_eq!(rig.relay.pulse_count(), 1);
}

#[tokio::test(start_paused = true)]
async fn test_denied_scan_returns_to_idle_immediately() {
    let mut rig = rig(settings()).await;
    rig.authorizer.answer(200, r#"{"status":"denied"}"#);
    rig.reader.present_token(vec![0x0A, 0xFF]).await.unwrap();

    let visited = rig.step_until(AccessState::Idle).await;
    assert_eq!(
        visited,
        vec![
            AccessState::TokenDetected,
            AccessState::IdentifierExtracted,
            AccessState::AwaitingAuthorization,
            AccessState::Rejected,
            AccessState::Idle,
        ]
    );

    assert_eq!(rig.relay.pulse_count(), 0);
    assert_eq!(rig.controller.pulse_count(), 0);
    assert_eq!(rig.reader.halt_count(), 1);

    let verdict = rig.controller.last_verdict().unwrap();
    assert!(!verdict.is_approved());
    assert_eq!(verdict.payload(), r#"{"status":"denied"}"#);
}

#[tokio::test(start_paused = true)]
async fn test_transport_failure_is_a_denial() {
    let mut rig = rig(settings()).await;
    // No scripted verdict: the authorizer reports a transport failure
    rig.reader.present_token(vec![0x01, 0x02, 0x03, 0x04]).await.unwrap();

    let visited = rig.step_until(AccessState::Idle).await;
    assert!(visited.contains(&AccessState::Rejected));
    assert!(!visited.contains(&AccessState::DoorOpen));
    assert_eq!(rig.relay.pulse_count(), 0);
    assert_eq!(rig.controller.last_verdict().unwrap().status(), None);
}

#[tokio::test(start_paused = true)]
async fn test_marker_with_error_status_is_denied() {
    let mut rig = rig(settings()).await;
    rig.authorizer.answer(500, r#"{"status":"ok"}"#);
    rig.reader.present_token(vec![0x0A, 0xFF]).await.unwrap();

    let visited = rig.step_until(AccessState::Idle).await;
    assert!(visited.contains(&AccessState::Rejected));
    assert_eq!(rig.relay.pulse_count(), 0);
}

#[tokio::test(start_paused = true)]
async fn test_detections_during_cooldown_are_ignored() {
    let mut rig = rig(settings()).await;
    rig.authorizer.answer(200, r#"{"status":"ok"}"#);
    rig.authorizer.answer(200, r#"{"status":"ok"}"#);
    rig.reader.present_token(vec![0x0A, 0xFF]).await.unwrap();

    rig.step_until(AccessState::Cooldown).await;

    for _ in 0..3 {
        rig.reader.present_token(vec![0x0A, 0xFF]).await.unwrap();
        tokio::time::advance(Duration::from_millis(500)).await;
        assert_eq!(rig.controller.step().await, AccessState::Cooldown);
    }

    assert_eq!(rig.controller.ignored_tokens(), 3);
    assert_eq!(rig.relay.pulse_count(), 1);
    assert_eq!(rig.authorizer.seen().len(), 1);

    tokio::time::advance(Duration::from_millis(1500)).await;
    assert_eq!(rig.controller.step().await, AccessState::Idle);

    // A scan after the cooldown is handled normally
    rig.reader.present_token(vec![0x0A, 0xFF]).await.unwrap();
    rig.step_until(AccessState::Cooldown).await;
    assert_eq!(rig.relay.pulse_count(), 2);
    assert_eq!(rig.authorizer.seen().len(), 2);
}

#[tokio::test(start_paused = true)]
async fn test_cooldown_on_denial() {
    let mut rig = rig(AccessSettings {
        cooldown_on_denial: true,
        ..settings()
    })
    .await;
    rig.authorizer.answer(200, r#"{"status":"denied"}"#);
    rig.reader.present_token(vec![0x0A, 0xFF]).await.unwrap();

    let visited = rig.step_until(AccessState::Cooldown).await;
    assert_eq!(visited[visited.len() - 2], AccessState::Rejected);
    assert_eq!(rig.relay.pulse_count(), 0);

    tokio::time::advance(Duration::from_millis(3000)).await;
    assert_eq!(rig.controller.step().await, AccessState::Idle);
}

#[tokio::test(start_paused = true)]
async fn test_read_failure_returns_to_idle_without_authorization() {
    let mut rig = rig(settings()).await;
    rig.reader.fail_next_read().await.unwrap();

    assert_eq!(rig.controller.step().await, AccessState::TokenDetected);
    assert_eq!(rig.controller.step().await, AccessState::Idle);

    assert!(rig.authorizer.seen().is_empty());
    assert_eq!(rig.reader.halt_count(), 0);
    assert!(rig.controller.last_verdict().is_none());
}

#[tokio::test(start_paused = true)]
async fn test_oversized_uid_returns_to_idle() {
    let mut rig = rig(settings()).await;
    rig.reader.present_token(vec![0x11; 11]).await.unwrap();

    assert_eq!(rig.controller.step().await, AccessState::TokenDetected);
    assert_eq!(rig.controller.step().await, AccessState::Idle);
    assert!(rig.authorizer.seen().is_empty());
}

#[tokio::test(start_paused = true)]
async fn test_reader_fault_is_not_fatal() {
    let Rig {
        mut controller,
        reader,
        ..
    } = rig(settings()).await;

    // Dropping the only handle disconnects the mock reader
    drop(reader);

    for _ in 0..3 {
        assert_eq!(controller.step().await, AccessState::Idle);
    }
}

#[tokio::test(start_paused = true)]
async fn test_actuator_fault_still_cools_down() {
    let mut rig = rig(settings()).await;
    rig.authorizer.answer(200, r#"{"status":"ok"}"#);
    rig.relay.fail_next_engage();
    rig.reader.present_token(vec![0x0A, 0xFF]).await.unwrap();

    rig.step_until(AccessState::Cooldown).await;
    assert!(!rig.relay.is_engaged());
    assert_eq!(rig.relay.pulse_count(), 0);
    assert_eq!(rig.controller.pulse_count(), 0);
}

#[tokio::test(start_paused = true)]
async fn test_history_records_each_transition() {
    let mut rig = rig(settings()).await;
    rig.authorizer.answer(200, r#"{"status":"ok"}"#);
    rig.reader.present_token(vec![0x0A, 0xFF]).await.unwrap();

    rig.step_until(AccessState::Cooldown).await;
    tokio::time::advance(Duration::from_millis(3000)).await;
    rig.controller.step().await;

    let targets: Vec<_> = rig
        .controller
        .machine()
        .history()
        .iter()
        .map(|t| t.to)
        .collect();
    assert_eq!(
        targets,
        vec![
            AccessState::TokenDetected,
            AccessState::IdentifierExtracted,
            AccessState::AwaitingAuthorization,
            AccessState::DoorOpen,
            AccessState::Cooldown,
            AccessState::Idle,
        ]
    );
}
