use std::path::PathBuf;
use std::time::Duration;

use rustc_hash::FxHashSet;
use tempfile::TempDir;

use super::classifier::EventClassifier;
use super::debouncer::{Changes, DEBOUNCE_MS, Debouncer};
use super::types::{ChangeKind, WatchEvent};
use super::{FsActor, WatchRoot};
use crate::logger::MemorySink;
use crate::utils::path::normalize_path;

fn debouncer() -> Debouncer {
    Debouncer::new(MemorySink::logger().0)
}

fn make_event(paths: Vec<&str>, kind: notify::EventKind) -> notify::Event {
    notify::Event {
        kind,
        paths: paths.into_iter().map(PathBuf::from).collect(),
        attrs: Default::default(),
    }
}

fn modify_kind() -> notify::EventKind {
    notify::EventKind::Modify(notify::event::ModifyKind::Data(
        notify::event::DataChange::Any,
    ))
}

fn create_kind() -> notify::EventKind {
    notify::EventKind::Create(notify::event::CreateKind::File)
}

fn remove_kind() -> notify::EventKind {
    notify::EventKind::Remove(notify::event::RemoveKind::File)
}

fn rename_kind(mode: notify::event::RenameMode) -> notify::EventKind {
    notify::EventKind::Modify(notify::event::ModifyKind::Name(mode))
}

#[test]
fn test_debouncer_empty() {
    let debouncer = debouncer();
    assert!(!debouncer.is_ready());
    assert_eq!(debouncer.sleep_duration(), Duration::from_secs(86400));
}

#[test]
fn test_event_routing_by_kind() {
    let mut debouncer = debouncer();

    debouncer.add_event(&make_event(vec!["/tmp/a.json"], create_kind()));
    debouncer.add_event(&make_event(vec!["/tmp/b.json"], modify_kind()));
    debouncer.add_event(&make_event(vec!["/tmp/c.json"], remove_kind()));

    let kinds: Vec<_> = debouncer.changes.values().copied().collect();
    assert_eq!(
        kinds,
        vec![ChangeKind::Created, ChangeKind::Modified, ChangeKind::Removed]
    );
}

#[test]
fn test_metadata_ignored() {
    let mut debouncer = debouncer();
    let kind = notify::EventKind::Modify(notify::event::ModifyKind::Metadata(
        notify::event::MetadataKind::WriteTime,
    ));
    debouncer.add_event(&make_event(vec!["/tmp/a.json"], kind));

    assert!(debouncer.changes.is_empty());
    assert!(debouncer.last_event.is_none());
}

#[test]
fn test_temp_file_ignored() {
    let mut debouncer = debouncer();

    debouncer.add_event(&make_event(vec!["/tmp/real.json"], modify_kind()));
    let first_time = debouncer.last_event.unwrap();

    std::thread::sleep(Duration::from_millis(5));

    debouncer.add_event(&make_event(vec!["/tmp/.en-US.json.swp"], modify_kind()));
    debouncer.add_event(&make_event(vec!["/tmp/en-US.json~"], modify_kind()));
    assert_eq!(debouncer.last_event.unwrap(), first_time);
    assert_eq!(debouncer.changes.len(), 1);
}

#[test]
fn test_dedup_first_event_wins() {
    let mut debouncer = debouncer();

    debouncer.add_event(&make_event(vec!["/tmp/a.json"], create_kind()));
    debouncer.add_event(&make_event(vec!["/tmp/a.json"], modify_kind()));

    assert_eq!(debouncer.changes.len(), 1);
    assert_eq!(
        debouncer.changes[&PathBuf::from("/tmp/a.json")],
        ChangeKind::Created
    );
}

#[test]
fn test_created_then_removed_discarded() {
    let mut debouncer = debouncer();

    debouncer.add_event(&make_event(vec!["/tmp/a.json"], create_kind()));
    debouncer.add_event(&make_event(vec!["/tmp/a.json"], remove_kind()));

    assert!(debouncer.changes.is_empty());
}

#[test]
fn test_removed_then_created_restored() {
    let mut debouncer = debouncer();

    debouncer.add_event(&make_event(vec!["/tmp/a.json"], remove_kind()));
    debouncer.add_event(&make_event(vec!["/tmp/a.json"], create_kind()));

    assert_eq!(
        debouncer.changes[&PathBuf::from("/tmp/a.json")],
        ChangeKind::Created
    );
}

#[test]
fn test_rename_both_splits() {
    use notify::event::RenameMode;

    let mut debouncer = debouncer();
    debouncer.add_event(&make_event(
        vec!["/tmp/en-US.json", "/tmp/en-GB.json"],
        rename_kind(RenameMode::Both),
    ));

    assert_eq!(
        debouncer.changes[&PathBuf::from("/tmp/en-US.json")],
        ChangeKind::Removed
    );
    assert_eq!(
        debouncer.changes[&PathBuf::from("/tmp/en-GB.json")],
        ChangeKind::Created
    );
}

#[test]
fn test_take_waits_for_quiet_period() {
    let mut debouncer = debouncer();
    debouncer.add_event(&make_event(vec!["/tmp/a.json"], modify_kind()));

    assert!(debouncer.take_if_ready().is_none());
    assert!(debouncer.sleep_duration() <= Duration::from_millis(DEBOUNCE_MS));

    std::thread::sleep(Duration::from_millis(DEBOUNCE_MS + 20));
    let changes = debouncer.take_if_ready().unwrap();
    assert_eq!(changes.len(), 1);
    assert!(debouncer.take_if_ready().is_none());
}

#[test]
fn test_classifier_corrects_by_existence() {
    let temp = TempDir::new().unwrap();
    let root = normalize_path(temp.path());
    let present = root.join("present.json");
    std::fs::write(&present, "{}").unwrap();
    let gone = root.join("gone.json");

    let mut raw = Changes::default();
    raw.insert(present.clone(), ChangeKind::Removed);
    raw.insert(gone.clone(), ChangeKind::Modified);
    raw.insert(root.join("ghost.json"), ChangeKind::Created);
    raw.insert(root.clone(), ChangeKind::Modified);

    let (logger, _) = MemorySink::logger();
    let classifier = EventClassifier {
        only: None,
        logger: &logger,
    };
    let events = classifier.classify(raw);

    assert_eq!(
        events,
        vec![(present, ChangeKind::Modified), (gone, ChangeKind::Removed)]
    );
}

#[test]
fn test_classifier_selects_files() {
    let temp = TempDir::new().unwrap();
    let root = normalize_path(temp.path());
    let wanted = root.join("scenarios.json");
    let other = root.join("other.json");
    std::fs::write(&wanted, "{}").unwrap();
    std::fs::write(&other, "{}").unwrap();

    let mut raw = Changes::default();
    raw.insert(other, ChangeKind::Modified);
    raw.insert(wanted.clone(), ChangeKind::Modified);

    let only: FxHashSet<PathBuf> = [wanted.clone()].into_iter().collect();
    let (logger, _) = MemorySink::logger();
    let classifier = EventClassifier {
        only: Some(&only),
        logger: &logger,
    };

    assert_eq!(classifier.classify(raw), vec![(wanted, ChangeKind::Modified)]);
}

#[tokio::test]
async fn test_stream_ready_then_add() {
    let temp = TempDir::new().unwrap();
    let root = normalize_path(temp.path());
    let (logger, _) = MemorySink::logger();

    let mut stream = FsActor::spawn(vec![WatchRoot::recursive(&root)], None, logger).unwrap();
    assert_eq!(stream.recv().await, Some(WatchEvent::Ready));

    let file = root.join("en-US.json");
    std::fs::write(&file, r#"{"value":"test"}"#).unwrap();

    let event = tokio::time::timeout(Duration::from_secs(5), stream.recv())
        .await
        .unwrap()
        .unwrap();
    assert_eq!(event.path(), Some(file.as_path()));
    assert!(matches!(event, WatchEvent::Add(_) | WatchEvent::Change(_)));
}

#[tokio::test]
async fn test_missing_root_still_ready() {
    let temp = TempDir::new().unwrap();
    let (logger, _) = MemorySink::logger();

    let mut stream = FsActor::spawn(
        vec![WatchRoot::shallow(temp.path().join("not-yet"))],
        None,
        logger,
    )
    .unwrap();
    assert_eq!(stream.recv().await, Some(WatchEvent::Ready));
}
