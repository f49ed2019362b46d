//! End-to-end tests for publishing recalculated permissions to live
//! sessions through the designated context.
//!
//! Test flows:
//! 1. mutation off the main thread: refresh is queued until the host pumps
//! 2. mutation on the main thread: refresh runs inline
//! 3. dedicated worker context: refresh arrives asynchronously
//! 4. group edit followed by member recalculation reaches the session
//! 5. attaching a session off the main thread queues the initial apply

use perms_model::{GroupDefinition, GroupStore};
use perms_runtime::{MainThread, RecordingAttachment, RefreshOutcome, SessionBridge};
use perms_subject::{CachePublisher, DefaultPermissions, SubjectRegistry};
use std::sync::Arc;
use std::thread;
use std::time::Duration;
use uuid::Uuid;

fn store() -> Arc<GroupStore> {
    let defs = vec![
        GroupDefinition::new("default").with_permission("chat"),
        GroupDefinition::new("staff")
            .with_parent("default")
            .with_permission("kick"),
    ];
    Arc::new(GroupStore::from_definitions("default", &defs).unwrap())
}

#[test]
fn test_off_thread_mutation_waits_for_pump() {
    let (main_thread, mut pump) = MainThread::bind_current();
    let bridge = Arc::new(SessionBridge::new());
    let publisher = CachePublisher::new(Arc::new(main_thread), bridge.clone());
    let registry = SubjectRegistry::new(store(), publisher);

    let subject = registry.get_or_create(Uuid::now_v7());
    let attachment = Arc::new(RecordingAttachment::new());
    bridge.attach_subject(&subject, attachment.clone());
    assert_eq!(attachment.applications(), 1);

    let worker_subject = subject.clone();
    thread::spawn(move || {
        worker_subject.add_additional_permission("fly");
    })
    .join()
    .unwrap();

    // The cache is already rebuilt, the session is not.
    assert!(subject.has_permission("fly"));
    assert!(!attachment.current().unwrap().is_granted("fly"));

    assert_eq!(pump.run_pending().unwrap(), 1);
    assert_eq!(attachment.applications(), 2);
    assert!(attachment.current().unwrap().is_granted("fly"));
}

#[test]
fn test_on_thread_mutation_is_inline() {
    let (main_thread, mut pump) = MainThread::bind_current();
    let bridge = Arc::new(SessionBridge::new());
    let publisher = CachePublisher::new(Arc::new(main_thread), bridge.clone());
    let registry = SubjectRegistry::new(store(), publisher);

    let subject = registry.get_or_create(Uuid::now_v7());
    let attachment = Arc::new(RecordingAttachment::new());
    bridge.attach(subject.id(), attachment.clone());

    subject.set_main_group(registry.store().get("staff").unwrap());
    assert!(attachment.current().unwrap().is_granted("kick"));
    assert_eq!(pump.run_pending().unwrap(), 0);
}

#[tokio::test]
async fn test_worker_context_delivers_refresh() {
    let (main_thread, handle) = MainThread::spawn("perms-main").unwrap();
    let bridge = Arc::new(SessionBridge::new());
    let mut events = bridge.subscribe();
    let publisher = CachePublisher::new(Arc::new(main_thread), bridge.clone());

    let seed = DefaultPermissions::new().with_permission("spawn.use");
    let registry = SubjectRegistry::new(store(), publisher).with_seeder(Arc::new(seed));

    let subject = registry.get_or_create(Uuid::now_v7());
    let attachment = Arc::new(RecordingAttachment::new());
    bridge.attach(subject.id(), attachment.clone());

    subject.add_additional_permission("-chat");

    let event = tokio::time::timeout(Duration::from_secs(5), events.recv())
        .await
        .expect("refresh not delivered")
        .unwrap();
    assert_eq!(event.subject_id, subject.id());
    assert_eq!(event.outcome, RefreshOutcome::Applied);

    let applied = attachment.current().unwrap();
    assert!(applied.is_granted("spawn.use"));
    assert!(applied.is_revoked("chat"));

    drop(subject);
    drop(registry);
    handle.join().unwrap();
}

#[test]
fn test_group_edit_reaches_session_after_member_recalc() {
    let bridge = Arc::new(SessionBridge::new());
    let publisher = CachePublisher::new(Arc::new(perms_subject::InlineContext), bridge.clone());
    let registry = SubjectRegistry::new(store(), publisher);

    let subject = registry.get_or_create(Uuid::now_v7());
    subject.set_main_group(registry.store().get("staff").unwrap());
    let attachment = Arc::new(RecordingAttachment::new());
    bridge.attach_subject(&subject, attachment.clone());

    registry.store().get("default").unwrap().add_permission("-chat");
    assert!(attachment.current().unwrap().is_granted("chat"));

    assert_eq!(registry.recalculate_members("default"), 1);
    assert!(attachment.current().unwrap().is_revoked("chat"));
}

#[test]
fn test_off_thread_attach_is_queued() {
    let (main_thread, mut pump) = MainThread::bind_current();
    let bridge = Arc::new(SessionBridge::new());
    let publisher = CachePublisher::new(Arc::new(main_thread), bridge.clone());
    let registry = SubjectRegistry::new(store(), publisher);

    let subject = registry.get_or_create(Uuid::now_v7());
    subject.add_additional_permission("fly");
    let attachment = Arc::new(RecordingAttachment::new());

    let worker_bridge = bridge.clone();
    let worker_subject = subject.clone();
    let worker_attachment = attachment.clone();
    thread::spawn(move || {
        worker_bridge.attach_subject(&worker_subject, worker_attachment);
    })
    .join()
    .unwrap();

    assert!(bridge.is_active(&subject.id()));
    assert_eq!(attachment.applications(), 0);

    assert_eq!(pump.run_pending().unwrap(), 1);
    let (applied, count) = attachment.snapshot();
    assert_eq!(count, 1);
    assert!(applied.unwrap().is_granted("fly"));
}
