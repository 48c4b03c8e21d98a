//! B-roll generation lifecycle.
//!
//! Each segment moves `Pending -> Generating -> Completed | Failed`, and a
//! failed segment may be retried. The collection itself is never edited in
//! place: every transition builds a new [`BRollCollection`] with one entry
//! swapped, and publishes it through a `watch` channel that acts as the
//! single writer.

use std::{ops::Deref, sync::Arc};

use tokio::{sync::watch, task::JoinHandle};
use tracing::{debug, info, warn};

use crate::{
    gemini::ImageGenerator,
    types::{BRollSegment, BRollStatus},
};

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum GenerationEvent {
    /// User asked for an image (first attempt or retry).
    Start,
    Succeed(String),
    Fail,
}

impl BRollStatus {
    /// The legal transition table. Returns `None` for anything else.
    pub fn transition(&self, event: GenerationEvent) -> Option<BRollStatus> {
        match (self, event) {
            (BRollStatus::Pending | BRollStatus::Failed, GenerationEvent::Start) => {
                Some(BRollStatus::Generating)
            }
            (BRollStatus::Generating, GenerationEvent::Succeed(image_url)) => {
                Some(BRollStatus::Completed { image_url })
            }
            (BRollStatus::Generating, GenerationEvent::Fail) => Some(BRollStatus::Failed),
            _ => None,
        }
    }

    pub fn can_start(&self) -> bool {
        matches!(self, BRollStatus::Pending | BRollStatus::Failed)
    }
}

/// An immutable, cheaply cloned snapshot of the B-roll list.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct BRollCollection {
    segments: Arc<[BRollSegment]>,
}

impl BRollCollection {
    pub fn new(segments: Vec<BRollSegment>) -> Self {
        Self {
            segments: segments.into(),
        }
    }

    pub fn get(&self, id: &str) -> Option<&BRollSegment> {
        self.segments.iter().find(|s| s.id == id)
    }

    /// A fresh collection with the segment `id` carrying `status`.
    pub fn with_status(&self, id: &str, status: BRollStatus) -> Option<Self> {
        let index = self.segments.iter().position(|s| s.id == id)?;
        let mut segments = self.segments.to_vec();
        segments[index].status = status;
        Some(Self::new(segments))
    }

    pub fn count_where(&self, predicate: impl Fn(&BRollStatus) -> bool) -> usize {
        self.segments.iter().filter(|s| predicate(&s.status)).count()
    }

    pub fn to_vec(&self) -> Vec<BRollSegment> {
        self.segments.to_vec()
    }
}

impl Deref for BRollCollection {
    type Target = [BRollSegment];

    fn deref(&self) -> &Self::Target {
        &self.segments
    }
}

/// Owns the B-roll collection and drives image generation for it.
#[derive(Clone)]
pub struct BRollBoard {
    state: Arc<watch::Sender<BRollCollection>>,
    images: Arc<dyn ImageGenerator>,
}

impl BRollBoard {
    pub fn new(segments: Vec<BRollSegment>, images: Arc<dyn ImageGenerator>) -> Self {
        let (state, _) = watch::channel(BRollCollection::new(segments));
        Self {
            state: Arc::new(state),
            images,
        }
    }

    /// The latest committed collection.
    pub fn snapshot(&self) -> BRollCollection {
        self.state.borrow().clone()
    }

    /// Receive every committed collection as it is published.
    pub fn subscribe(&self) -> watch::Receiver<BRollCollection> {
        self.state.subscribe()
    }

    /// Apply `event` to segment `id` by swapping in a new collection.
    /// Returns the updated segment, or `None` if the id is unknown or the
    /// transition is not legal from its current status.
    fn apply(
        state: &watch::Sender<BRollCollection>,
        id: &str,
        event: GenerationEvent,
    ) -> Option<BRollSegment> {
        let mut applied = None;
        state.send_if_modified(|current| {
            let Some(next) = current.get(id).and_then(|s| s.status.transition(event)) else {
                return false;
            };
            let Some(updated) = current.with_status(id, next) else {
                return false;
            };
            applied = updated.get(id).cloned();
            *current = updated;
            true
        });
        applied
    }

    /// Start generating the image for `id`.
    ///
    /// The segment is marked `Generating` before this returns; the model call
    /// runs on a spawned task whose handle is returned. Unknown ids and
    /// segments that are already generating or completed are ignored.
    pub fn trigger(&self, id: &str) -> Option<JoinHandle<()>> {
        let Some(segment) = Self::apply(&self.state, id, GenerationEvent::Start) else {
            debug!(segment = id, "Ignoring generate request for ineligible segment");
            return None;
        };

        let state = Arc::clone(&self.state);
        let images = Arc::clone(&self.images);

        Some(tokio::spawn(async move {
            info!(segment = %segment.id, "Generating B-roll image");
            let event = match images.generate(&segment.image_prompt).await {
                Ok(image_url) => GenerationEvent::Succeed(image_url),
                Err(e) => {
                    warn!(segment = %segment.id, error = %e, "B-roll image generation failed");
                    GenerationEvent::Fail
                }
            };

            match Self::apply(&state, &segment.id, event) {
                Some(updated) => info!(segment = %updated.id, status = updated.status.label(), "B-roll updated"),
                None => debug!(segment = %segment.id, "Dropping result for segment that left generating"),
            }
        }))
    }

    /// Trigger every segment that is currently pending or failed.
    pub fn trigger_all(&self) -> Vec<JoinHandle<()>> {
        let ids: Vec<String> = self
            .snapshot()
            .iter()
            .filter(|s| s.status.can_start())
            .map(|s| s.id.clone())
            .collect();

        ids.iter().filter_map(|id| self.trigger(id)).collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::CollaboratorError;
    use async_trait::async_trait;
    use std::sync::atomic::{AtomicUsize, Ordering};

    /// Fails the first `fail_first` calls, then renders `data:` URIs.
    struct FlakyImages {
        fail_first: usize,
        calls: AtomicUsize,
    }

    impl FlakyImages {
        fn new(fail_first: usize) -> Arc<Self> {
            Arc::new(Self {
                fail_first,
                calls: AtomicUsize::new(0),
            })
        }
    }

    #[async_trait]
    impl ImageGenerator for FlakyImages {
        async fn generate(&self, prompt: &str) -> Result<String, CollaboratorError> {
            let call = self.calls.fetch_add(1, Ordering::SeqCst);
            if call < self.fail_first {
                return Err(CollaboratorError::NoImagePayload);
            }
            Ok(format!("data:image/png;base64,{}", prompt.len()))
        }
    }

    fn segment(id: &str, status: BRollStatus) -> BRollSegment {
        BRollSegment {
            id: id.into(),
            start_time: 3.0,
            end_time: 8.0,
            description: "skyline".into(),
            image_prompt: "city skyline".into(),
            status,
        }
    }

    #[test]
    fn transition_table() {
        use BRollStatus::*;
        use GenerationEvent::*;

        assert_eq!(Pending.transition(Start), Some(Generating));
        assert_eq!(Failed.transition(Start), Some(Generating));
        assert_eq!(Generating.transition(Fail), Some(Failed));
        assert_eq!(
            Generating.transition(Succeed("u".into())),
            Some(Completed { image_url: "u".into() })
        );

        assert_eq!(Generating.transition(Start), None);
        assert_eq!(Pending.transition(Fail), None);
        assert_eq!(Pending.transition(Succeed("u".into())), None);
        let done = Completed { image_url: "u".into() };
        assert_eq!(done.transition(Start), None);
        assert_eq!(done.transition(Fail), None);
    }

    #[test]
    fn with_status_leaves_original_untouched() {
        let original = BRollCollection::new(vec![
            segment("a", BRollStatus::Pending),
            segment("b", BRollStatus::Pending),
        ]);
        let updated = original.with_status("b", BRollStatus::Generating).unwrap();

        assert_eq!(original.get("b").unwrap().status, BRollStatus::Pending);
        assert_eq!(updated.get("b").unwrap().status, BRollStatus::Generating);
        assert_eq!(updated.get("a"), original.get("a"));
        assert!(original.with_status("missing", BRollStatus::Failed).is_none());
    }

    #[tokio::test]
    async fn trigger_marks_generating_before_call_resolves() {
        let board = BRollBoard::new(vec![segment("b1", BRollStatus::Pending)], FlakyImages::new(0));

        let handle = board.trigger("b1").expect("pending segment is eligible");
        assert_eq!(board.snapshot().get("b1").unwrap().status, BRollStatus::Generating);

        handle.await.unwrap();
        let snapshot = board.snapshot();
        let done = snapshot.get("b1").unwrap();
        assert!(done.is_completed());
        assert_eq!(done.generated_image_url(), Some("data:image/png;base64,12"));
    }

    #[tokio::test]
    async fn generating_segment_cannot_be_retriggered() {
        let board = BRollBoard::new(vec![segment("b1", BRollStatus::Pending)], FlakyImages::new(0));
        let first = board.trigger("b1").unwrap();
        assert!(board.trigger("b1").is_none());
        first.await.unwrap();
    }

    #[tokio::test]
    async fn completed_and_unknown_segments_are_ignored() {
        let completed = BRollStatus::Completed {
            image_url: "data:image/png;base64,AA".into(),
        };
        let board = BRollBoard::new(vec![segment("b1", completed.clone())], FlakyImages::new(0));

        let before = board.snapshot();
        assert!(board.trigger("b1").is_none());
        assert!(board.trigger("nope").is_none());
        assert_eq!(board.snapshot(), before);
        assert_eq!(board.snapshot().get("b1").unwrap().status, completed);
    }

    #[tokio::test]
    async fn failure_then_retry_completes() {
        let images = FlakyImages::new(1);
        let board = BRollBoard::new(vec![segment("b1", BRollStatus::Pending)], images.clone());

        board.trigger("b1").unwrap().await.unwrap();
        let failed = board.snapshot();
        assert_eq!(failed.get("b1").unwrap().status, BRollStatus::Failed);
        assert_eq!(failed.get("b1").unwrap().generated_image_url(), None);

        board.trigger("b1").unwrap().await.unwrap();
        assert!(board.snapshot().get("b1").unwrap().is_completed());
        assert_eq!(images.calls.load(Ordering::SeqCst), 2);
    }

    #[tokio::test]
    async fn failure_is_isolated_to_one_segment() {
        let board = BRollBoard::new(
            vec![
                segment("a", BRollStatus::Pending),
                segment("b", BRollStatus::Pending),
            ],
            FlakyImages::new(1),
        );

        for handle in board.trigger_all() {
            handle.await.unwrap();
        }

        let snapshot = board.snapshot();
        assert_eq!(snapshot.count_where(|s| *s == BRollStatus::Failed), 1);
        assert_eq!(snapshot.count_where(|s| matches!(s, BRollStatus::Completed { .. })), 1);
    }

    #[tokio::test]
    async fn subscribers_see_each_commit() {
        let board = BRollBoard::new(vec![segment("b1", BRollStatus::Pending)], FlakyImages::new(0));
        let mut rx = board.subscribe();

        let handle = board.trigger("b1").unwrap();
        assert!(rx.has_changed().unwrap());
        assert_eq!(rx.borrow_and_update().get("b1").unwrap().status, BRollStatus::Generating);

        handle.await.unwrap();
        rx.changed().await.unwrap();
        assert!(rx.borrow().get("b1").unwrap().is_completed());
    }
}
