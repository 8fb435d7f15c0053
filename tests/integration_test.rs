//! End-to-end scheduling scenarios against the in-process backend.

use std::sync::Arc;

use anyhow::Result;
use chrono::{Duration, Utc};
use petcare_notify::{
    DeliveryDecision, Frequency, MemoryBackend, NotificationScheduler, PendingNotification,
    PetId, PreferenceStore, ReminderId, ReminderMetadata, ReminderType, SchedulerBuilder,
    StaticPermissionGate, TypePreference,
};
use tokio::sync::mpsc;
use tokio::time::{Duration as TokioDuration, timeout};

fn init_tracing() {
    let _ = tracing_subscriber::fmt().with_test_writer().try_init();
}

fn build_scheduler() -> (Arc<MemoryBackend>, NotificationScheduler) {
    init_tracing();
    let backend = Arc::new(MemoryBackend::new());
    let scheduler = SchedulerBuilder::new()
        .with_backend(backend.clone())
        .with_permissions(Arc::new(StaticPermissionGate::granted()))
        .with_preferences(PreferenceStore::default())
        .build();
    (backend, scheduler)
}

fn walk_metadata(reminder_id: &str) -> ReminderMetadata {
    ReminderMetadata::new()
        .with_type(ReminderType::Hygiene)
        .with_reminder_id(ReminderId::new(reminder_id))
        .with_pet(PetId::new("pet-1"), "Luna")
}

#[tokio::test]
async fn scheduled_notification_fires_through_the_delivery_filter() -> Result<()> {
    let (backend, scheduler) = build_scheduler();
    scheduler.install_delivery_filter();

    let target = Utc::now() + Duration::hours(2);
    let handle = scheduler
        .schedule("Bath time", "Luna needs a bath", target, walk_metadata("rem-1"))
        .await
        .expect("scheduled");

    let decision = backend.fire(handle).expect("trigger was pending");
    assert_eq!(decision, DeliveryDecision::shown(true));
    assert_eq!(scheduler.badge_count().await, 1);
    assert!(scheduler.pending().await.is_empty());
    Ok(())
}

#[tokio::test]
async fn delivery_filter_sees_preference_changes_made_after_scheduling() -> Result<()> {
    let (backend, scheduler) = build_scheduler();
    scheduler.install_delivery_filter();

    let target = Utc::now() + Duration::hours(2);
    let handle = scheduler
        .schedule("Bath time", "Luna needs a bath", target, walk_metadata("rem-1"))
        .await
        .expect("scheduled");

    // The user flips the global switch off after the trigger is registered.
    scheduler
        .preferences()
        .update(|preferences| preferences.enabled = false);

    let decision = backend.fire(handle).expect("trigger was pending");
    assert_eq!(decision, DeliveryDecision::suppressed());
    assert_eq!(scheduler.badge_count().await, 0);
    Ok(())
}

#[tokio::test]
async fn imminent_target_is_rejected_through_the_public_api() {
    let (_backend, scheduler) = build_scheduler();
    let handle = scheduler
        .schedule(
            "Bath time",
            "too soon",
            Utc::now() + Duration::seconds(30),
            ReminderMetadata::new(),
        )
        .await;
    assert_eq!(handle, None);
    assert!(scheduler.pending().await.is_empty());
}

#[tokio::test]
async fn rescheduling_keeps_a_single_pending_record_per_reminder() {
    let (_backend, scheduler) = build_scheduler();

    scheduler
        .schedule(
            "Bath time",
            "first",
            Utc::now() + Duration::hours(2),
            walk_metadata("rem-1"),
        )
        .await
        .expect("first schedule");
    scheduler
        .schedule(
            "Bath time",
            "second",
            Utc::now() + Duration::hours(6),
            walk_metadata("rem-1"),
        )
        .await
        .expect("second schedule");

    let pending = scheduler.pending().await;
    assert_eq!(pending.len(), 1);
    assert_eq!(pending[0].content.body, "second");
}

#[tokio::test]
async fn recurring_schedule_stamps_the_frequency_into_the_payload() {
    let (_backend, scheduler) = build_scheduler();

    scheduler
        .schedule_recurring(
            "Flea treatment",
            "Monthly flea treatment for Luna",
            Frequency::Monthly,
            10,
            30,
            walk_metadata("rem-2"),
        )
        .await
        .expect("scheduled");

    let pending = scheduler.pending().await;
    assert_eq!(pending.len(), 1);
    let payload = &pending[0].content.payload;
    assert_eq!(payload.metadata.frequency, Some(Frequency::Monthly));
    assert!(payload.scheduled_at > Utc::now());
    assert_eq!(payload.scheduled_at, pending[0].fire_at);
}

#[tokio::test]
async fn stats_group_by_type_and_report_the_earliest_fire_instant() {
    let (_backend, scheduler) = build_scheduler();
    let now = Utc::now();

    let medication = |id: &str| {
        ReminderMetadata::new()
            .with_type(ReminderType::Medication)
            .with_reminder_id(ReminderId::new(id))
    };
    scheduler
        .schedule("Pills", "evening dose", now + Duration::hours(8), medication("rem-1"))
        .await
        .expect("scheduled");
    let earliest = now + Duration::hours(3);
    scheduler
        .schedule("Pills", "afternoon dose", earliest, medication("rem-2"))
        .await
        .expect("scheduled");
    scheduler
        .schedule("Checkup", "untyped", now + Duration::hours(5), ReminderMetadata::new())
        .await
        .expect("scheduled");

    let stats = scheduler.stats().await;
    assert_eq!(stats.total, 3);
    assert_eq!(stats.by_type.get(&ReminderType::Medication), Some(&2));
    assert_eq!(stats.by_type.get(&ReminderType::Other), Some(&1));
    assert_eq!(stats.next_fire, Some(earliest));
}

#[tokio::test]
async fn notify_now_respects_the_type_gate_but_not_the_future_guard() {
    let (_backend, scheduler) = build_scheduler();
    scheduler.preferences().update(|preferences| {
        preferences
            .type_preferences
            .insert(ReminderType::Food, TypePreference::disabled());
    });

    let blocked = scheduler
        .notify_now(
            "Dinner",
            "feed now",
            ReminderMetadata::new().with_type(ReminderType::Food),
        )
        .await;
    assert_eq!(blocked, None);

    let sent = scheduler
        .notify_now("Dinner", "feed now", ReminderMetadata::new())
        .await;
    assert!(sent.is_some(), "immediate sends skip the future guard");
}

#[tokio::test]
async fn tapped_notifications_reach_the_registered_callback() -> Result<()> {
    let (backend, scheduler) = build_scheduler();

    let (tx, mut rx) = mpsc::unbounded_channel::<PendingNotification>();
    scheduler.start_listeners(Some(Arc::new(move |notification| {
        let _ = tx.send(notification);
    })));
    assert!(scheduler.listeners_active());

    scheduler
        .schedule(
            "Bath time",
            "Luna needs a bath",
            Utc::now() + Duration::hours(2),
            walk_metadata("rem-1"),
        )
        .await
        .expect("scheduled");
    let record = scheduler.pending().await[0].clone();
    backend.tap(record.clone());

    let tapped = timeout(TokioDuration::from_secs(1), rx.recv())
        .await?
        .expect("callback invoked");
    assert_eq!(tapped.id, record.id);
    assert_eq!(
        tapped.content.payload.metadata.reminder_id,
        Some(ReminderId::new("rem-1"))
    );

    scheduler.stop_listeners();
    assert!(!scheduler.listeners_active());
    Ok(())
}

#[tokio::test]
async fn restarting_listeners_replaces_the_tap_callback() -> Result<()> {
    let (backend, scheduler) = build_scheduler();

    let (first_tx, mut first_rx) = mpsc::unbounded_channel::<PendingNotification>();
    scheduler.start_listeners(Some(Arc::new(move |notification| {
        let _ = first_tx.send(notification);
    })));

    let (second_tx, mut second_rx) = mpsc::unbounded_channel::<PendingNotification>();
    scheduler.start_listeners(Some(Arc::new(move |notification| {
        let _ = second_tx.send(notification);
    })));

    scheduler
        .schedule(
            "Bath time",
            "Luna needs a bath",
            Utc::now() + Duration::hours(2),
            walk_metadata("rem-1"),
        )
        .await
        .expect("scheduled");
    let record = scheduler.pending().await[0].clone();
    backend.tap(record);

    timeout(TokioDuration::from_secs(1), second_rx.recv())
        .await?
        .expect("second callback invoked");
    assert!(
        first_rx.try_recv().is_err(),
        "the first registration was torn down, not stacked"
    );
    Ok(())
}

#[tokio::test]
async fn cancel_and_cancel_all_empty_the_pending_store() {
    let (_backend, scheduler) = build_scheduler();
    let now = Utc::now();

    let handle = scheduler
        .schedule("Pills", "dose", now + Duration::hours(2), walk_metadata("rem-1"))
        .await
        .expect("scheduled");
    scheduler
        .schedule("Pills", "dose", now + Duration::hours(3), walk_metadata("rem-2"))
        .await
        .expect("scheduled");

    scheduler.cancel(handle).await;
    assert_eq!(scheduler.pending().await.len(), 1);

    scheduler.cancel_all().await;
    assert!(scheduler.pending().await.is_empty());
}

#[tokio::test]
async fn badge_round_trips_and_clears() {
    let (_backend, scheduler) = build_scheduler();
    scheduler.set_badge_count(4).await;
    assert_eq!(scheduler.badge_count().await, 4);
    scheduler.clear_badge().await;
    assert_eq!(scheduler.badge_count().await, 0);
}

#[tokio::test]
async fn undetermined_permissions_block_until_requested() {
    init_tracing();
    let backend = Arc::new(MemoryBackend::new());
    let scheduler = SchedulerBuilder::new()
        .with_backend(backend.clone())
        .with_permissions(Arc::new(StaticPermissionGate::undetermined(true)))
        .build();

    let blocked = scheduler
        .schedule(
            "Pills",
            "dose",
            Utc::now() + Duration::hours(2),
            ReminderMetadata::new(),
        )
        .await;
    assert_eq!(blocked, None, "undetermined short-circuits to a no-op");

    assert!(scheduler.request_permissions().await);
    let handle = scheduler
        .schedule(
            "Pills",
            "dose",
            Utc::now() + Duration::hours(2),
            ReminderMetadata::new(),
        )
        .await;
    assert!(handle.is_some());
}
