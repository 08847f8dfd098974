//! File watching for live reload.

use std::path::{Path, PathBuf};
use std::sync::mpsc;
use std::time::Duration;

use notify::{RecommendedWatcher, RecursiveMode, Watcher};
use tokio::sync::mpsc as async_mpsc;

use vitrine_stories::slug::split_story_name;
use vitrine_stories::SourceKind;

/// Quiet period before a burst of changes is forwarded.
const DEBOUNCE: Duration = Duration::from_millis(100);

/// Events emitted by the file watcher.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum WatchEvent {
    /// A story file was created, modified or removed
    StoryChanged(PathBuf),

    /// Some other entry appeared or disappeared (may hide story files)
    TreeChanged(PathBuf),

    /// Some other file was modified
    SourceModified(PathBuf),
}

impl WatchEvent {
    /// Whether the story catalog must be rebuilt.
    pub fn needs_rebuild(&self) -> bool {
        !matches!(self, WatchEvent::SourceModified(_))
    }

    pub fn path(&self) -> &Path {
        match self {
            WatchEvent::StoryChanged(p)
            | WatchEvent::TreeChanged(p)
            | WatchEvent::SourceModified(p) => p,
        }
    }
}

/// File watcher for detecting changes.
pub struct FileWatcher {
    _watcher: RecommendedWatcher,
}

impl FileWatcher {
    /// Create a new file watcher for the given paths.
    ///
    /// Returns the watcher and a channel to receive events. Events are
    /// forwarded once changes have been quiet for a short moment, with
    /// duplicates within a burst removed.
    pub fn new(
        paths: &[PathBuf],
        kinds: Vec<SourceKind>,
    ) -> Result<(Self, async_mpsc::Receiver<WatchEvent>), std::io::Error> {
        let (sync_tx, sync_rx) = mpsc::channel();
        let (async_tx, async_rx) = async_mpsc::channel(100);

        let mut watcher = notify::recommended_watcher(move |res: Result<notify::Event, _>| {
            if let Ok(event) = res {
                let _ = sync_tx.send(event);
            }
        })
        .map_err(std::io::Error::other)?;

        for path in paths {
            if path.exists() {
                watcher
                    .watch(path, RecursiveMode::Recursive)
                    .map_err(std::io::Error::other)?;
            }
        }

        std::thread::spawn(move || {
            while let Ok(first) = sync_rx.recv() {
                let mut batch: Vec<WatchEvent> = Vec::new();
                collect(&first, &kinds, &mut batch);

                while let Ok(event) = sync_rx.recv_timeout(DEBOUNCE) {
                    collect(&event, &kinds, &mut batch);
                }

                for event in batch {
                    if async_tx.blocking_send(event).is_err() {
                        return;
                    }
                }
            }
        });

        Ok((Self { _watcher: watcher }, async_rx))
    }
}

fn collect(event: &notify::Event, kinds: &[SourceKind], batch: &mut Vec<WatchEvent>) {
    for path in &event.paths {
        if let Some(e) = classify_event(path, &event.kind, kinds) {
            if !batch.contains(&e) {
                batch.push(e);
            }
        }
    }
}

/// Classify a notify event into a WatchEvent.
fn classify_event(
    path: &Path,
    kind: &notify::EventKind,
    kinds: &[SourceKind],
) -> Option<WatchEvent> {
    use notify::EventKind;

    let is_story = path
        .file_name()
        .and_then(|n| n.to_str())
        .and_then(|n| split_story_name(n, kinds))
        .is_some();

    let path = path.to_path_buf();

    match kind {
        EventKind::Create(_) | EventKind::Remove(_) | EventKind::Modify(_) if is_story => {
            Some(WatchEvent::StoryChanged(path))
        }
        EventKind::Create(_) | EventKind::Remove(_) => Some(WatchEvent::TreeChanged(path)),
        EventKind::Modify(notify::event::ModifyKind::Name(_)) => {
            Some(WatchEvent::TreeChanged(path))
        }
        EventKind::Modify(_) => Some(WatchEvent::SourceModified(path)),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use notify::event::{CreateKind, DataChange, ModifyKind, RemoveKind, RenameMode};
    use notify::EventKind;
    use std::fs;
    use tempfile::tempdir;

    #[test]
    fn classifies_story_changes() {
        let story = Path::new("components/widgets/button.story.tsx");

        assert_eq!(
            classify_event(
                story,
                &EventKind::Modify(ModifyKind::Data(DataChange::Content)),
                &SourceKind::ALL
            ),
            Some(WatchEvent::StoryChanged(story.to_path_buf()))
        );
        assert_eq!(
            classify_event(story, &EventKind::Remove(RemoveKind::File), &SourceKind::ALL),
            Some(WatchEvent::StoryChanged(story.to_path_buf()))
        );
    }

    #[test]
    fn classifies_other_changes() {
        let component = Path::new("components/widgets/button.tsx");
        let dir = Path::new("components/widgets");

        let modified = classify_event(
            component,
            &EventKind::Modify(ModifyKind::Data(DataChange::Content)),
            &SourceKind::ALL,
        )
        .unwrap();
        assert_eq!(modified, WatchEvent::SourceModified(component.to_path_buf()));
        assert!(!modified.needs_rebuild());

        let renamed = classify_event(
            dir,
            &EventKind::Modify(ModifyKind::Name(RenameMode::Any)),
            &SourceKind::ALL,
        )
        .unwrap();
        assert!(renamed.needs_rebuild());

        assert_eq!(
            classify_event(dir, &EventKind::Create(CreateKind::Folder), &SourceKind::ALL),
            Some(WatchEvent::TreeChanged(dir.to_path_buf()))
        );
    }

    #[test]
    fn ignores_stories_of_unwatched_kinds() {
        let story = Path::new("components/button.story.js");

        assert_eq!(
            classify_event(
                story,
                &EventKind::Modify(ModifyKind::Data(DataChange::Content)),
                &[SourceKind::Tsx]
            ),
            Some(WatchEvent::SourceModified(story.to_path_buf()))
        );
    }

    #[tokio::test]
    async fn watches_story_files() {
        let temp = tempdir().unwrap();
        let story = temp.path().join("card.story.tsx");

        let (watcher, mut rx) =
            FileWatcher::new(&[temp.path().to_path_buf()], SourceKind::ALL.to_vec()).unwrap();

        // Give inotify time to set up
        tokio::time::sleep(Duration::from_millis(100)).await;

        fs::write(&story, "export default () => <div />;").unwrap();

        let event = tokio::time::timeout(Duration::from_secs(3), rx.recv()).await;

        drop(watcher);

        let event = event
            .expect("timeout waiting for file watch event")
            .expect("channel should not be closed");
        assert!(event.needs_rebuild());
    }
}
