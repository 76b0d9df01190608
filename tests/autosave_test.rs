mod helpers;

use citynotes::autosave::SaveStatus;
use helpers::{amsterdam, manual_editor, memory_store, ms, persisted, rotterdam};

#[tokio::test]
async fn keystrokes_coalesce_into_one_write() {
    let (mut store, backend) = memory_store();
    store.add(amsterdam());
    store.flush().await;
    let baseline = backend.write_count();

    let (mut editor, clock) = manual_editor();
    assert!(editor.open(&mut store, "ams"));

    for (at, text) in [(0, "c"), (100, "ca"), (200, "can"), (900, "canals")] {
        clock.set(ms(at));
        editor.edit(text);
        assert!(editor.tick(&mut store).is_none());
        assert_eq!(editor.status(), SaveStatus::Pending);
    }

    clock.set(ms(1899));
    assert!(editor.tick(&mut store).is_none());
    store.flush().await;
    assert_eq!(backend.write_count(), baseline);

    clock.set(ms(1900));
    let ticket = editor.tick(&mut store).expect("debounce elapsed");
    assert_eq!(editor.status(), SaveStatus::Writing);
    store.flush().await;
    assert!(store.is_durable(ticket));

    // Nothing further is written while idle.
    clock.set(ms(5000));
    editor.tick(&mut store);
    editor.tick(&mut store);
    store.flush().await;

    assert_eq!(backend.write_count(), baseline + 1);
    let saved = persisted(&*backend).unwrap();
    assert_eq!(saved.get("ams").unwrap().notes, "canals");
    assert_eq!(editor.status(), SaveStatus::Clean);
}

#[tokio::test]
async fn clean_is_not_reported_before_floor() {
    let (mut store, _) = memory_store();
    store.add(amsterdam());
    let (mut editor, clock) = manual_editor();
    editor.open(&mut store, "ams");

    editor.edit("tulips");
    clock.set(ms(1000));
    editor.tick(&mut store).unwrap();
    store.flush().await;

    clock.set(ms(1400));
    editor.tick(&mut store);
    assert_eq!(editor.status(), SaveStatus::Writing);
    assert_eq!(editor.next_wakeup(), Some(clock_at(&clock, 1500)));

    clock.set(ms(1500));
    editor.tick(&mut store);
    assert_eq!(editor.status(), SaveStatus::Clean);
}

fn clock_at(clock: &citynotes::autosave::ManualClock, at: u64) -> std::time::Instant {
    use citynotes::autosave::Clock;
    clock.now() - clock.elapsed() + ms(at)
}

#[tokio::test]
async fn switching_records_flushes_pending_edit_first() {
    let (mut store, backend) = memory_store();
    store.add(amsterdam());
    store.add(rotterdam());
    let (mut editor, clock) = manual_editor();

    editor.open(&mut store, "ams");
    editor.edit("museum quarter");
    clock.set(ms(300));
    assert_eq!(editor.status(), SaveStatus::Pending);

    assert!(editor.open(&mut store, "rot"));

    // The write for A was issued before B became active.
    assert_eq!(store.get("ams").unwrap().notes, "museum quarter");
    assert_eq!(editor.open_id(), Some("rot"));
    assert_eq!(editor.draft(), Some(""));
    // B is not reported saved while A's write is still queued.
    assert_eq!(editor.status(), SaveStatus::Writing);

    store.flush().await;
    let saved = persisted(&*backend).unwrap();
    assert_eq!(saved.get("ams").unwrap().notes, "museum quarter");

    // A's old timer is gone: ticking past its deadline writes nothing for A.
    let writes = backend.write_count();
    clock.set(ms(2000));
    assert!(editor.tick(&mut store).is_none());
    store.flush().await;
    assert_eq!(backend.write_count(), writes);
}

#[tokio::test]
async fn edits_during_writing_rearm_debounce() {
    let (mut store, _) = memory_store();
    store.add(amsterdam());
    let (mut editor, clock) = manual_editor();
    editor.open(&mut store, "ams");

    editor.edit("one");
    clock.set(ms(1000));
    editor.tick(&mut store).unwrap();

    clock.set(ms(1100));
    editor.edit("one two");
    assert_eq!(editor.status(), SaveStatus::Pending);

    clock.set(ms(2099));
    assert!(editor.tick(&mut store).is_none());
    clock.set(ms(2100));
    assert!(editor.tick(&mut store).is_some());
    assert_eq!(store.get("ams").unwrap().notes, "one two");
}

#[tokio::test]
async fn reopening_waits_for_outstanding_write() {
    let (mut store, _) = memory_store();
    store.add(amsterdam());
    let (mut editor, clock) = manual_editor();

    editor.open(&mut store, "ams");
    editor.edit("first visit");
    editor.close(&mut store);

    editor.open(&mut store, "ams");
    assert_eq!(editor.draft(), Some("first visit"));
    assert_eq!(editor.status(), SaveStatus::Writing);

    store.flush().await;
    clock.set(ms(500));
    editor.tick(&mut store);
    assert_eq!(editor.status(), SaveStatus::Clean);

    // Nothing outstanding: the next open is Clean straight away.
    editor.open(&mut store, "ams");
    assert_eq!(editor.status(), SaveStatus::Clean);
}

#[tokio::test]
async fn reopening_after_failed_write_is_not_clean() {
    let (mut store, backend) = memory_store();
    store.add(amsterdam());
    store.add(rotterdam());
    store.flush().await;
    backend.set_failing(true);
    let (mut editor, clock) = manual_editor();

    editor.open(&mut store, "ams");
    editor.edit("lost if crash");
    editor.open(&mut store, "rot");
    store.flush().await;

    editor.open(&mut store, "ams");
    assert_eq!(editor.draft(), Some("lost if crash"));
    assert_eq!(editor.status(), SaveStatus::Writing);

    clock.set(ms(5000));
    assert!(editor.tick(&mut store).is_some());
    store.flush().await;
    editor.tick(&mut store);
    assert_eq!(editor.status(), SaveStatus::Writing);
    assert!(store.has_unsaved_changes());
    assert_eq!(persisted(&*backend).unwrap().get("ams").unwrap().notes, "");
}

#[tokio::test]
async fn failed_write_is_retried_once_backend_recovers() {
    use citynotes::autosave::Clock;

    let (mut store, backend) = memory_store();
    store.add(amsterdam());
    store.flush().await;
    backend.set_failing(true);
    let (mut editor, clock) = manual_editor();

    editor.open(&mut store, "ams");
    editor.edit("recovered");
    clock.set(ms(1000));
    let first = editor.tick(&mut store).unwrap();
    store.flush().await;
    assert!(!store.is_durable(first));

    clock.set(ms(1500));
    let second = editor.tick(&mut store).expect("failed write is retried");
    assert!(second > first);
    store.flush().await;
    assert_eq!(editor.status(), SaveStatus::Writing);
    assert!(editor.next_wakeup().unwrap() > clock.now());

    backend.set_failing(false);
    clock.set(ms(2500));
    assert!(editor.next_wakeup().unwrap() > clock.now());
    let third = editor.tick(&mut store).expect("still failing, retried again");
    store.flush().await;
    assert!(store.is_durable(third));

    editor.tick(&mut store);
    assert_eq!(editor.status(), SaveStatus::Clean);
    assert!(editor.next_wakeup().is_none());
    assert!(!store.has_unsaved_changes());
    assert_eq!(persisted(&*backend).unwrap().get("ams").unwrap().notes, "recovered");
}
