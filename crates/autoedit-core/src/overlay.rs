use crate::types::{ActiveOverlay, BRollSegment, Caption};

/// First caption, in collection order, whose window contains `time`.
pub fn active_caption(time: f64, captions: &[Caption]) -> Option<&Caption> {
    captions.iter().find(|c| c.contains(time))
}

/// First completed B-roll with an image whose window contains `time`.
/// Segments still pending, generating or failed are never surfaced.
pub fn active_b_roll(time: f64, segments: &[BRollSegment]) -> Option<&BRollSegment> {
    segments
        .iter()
        .find(|b| b.contains(time) && b.generated_image_url().is_some_and(|url| !url.is_empty()))
}

/// Resolve what should be drawn over the video at `time`.
pub fn resolve<'a>(
    time: f64,
    captions: &'a [Caption],
    segments: &'a [BRollSegment],
) -> ActiveOverlay<'a> {
    ActiveOverlay {
        caption: active_caption(time, captions),
        b_roll: active_b_roll(time, segments),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::BRollStatus;

    fn segment(id: &str, start: f64, end: f64, status: BRollStatus) -> BRollSegment {
        BRollSegment {
            id: id.into(),
            start_time: start,
            end_time: end,
            description: format!("{id} description"),
            image_prompt: format!("{id} prompt"),
            status,
        }
    }

    fn completed(url: &str) -> BRollStatus {
        BRollStatus::Completed {
            image_url: url.into(),
        }
    }

    #[test]
    fn overlapping_captions_resolve_to_first() {
        let captions = vec![
            Caption::new(0.0, 6.0, "first"),
            Caption::new(4.0, 8.0, "second"),
        ];
        assert_eq!(active_caption(5.0, &captions).unwrap().text, "first");
        assert_eq!(active_caption(7.0, &captions).unwrap().text, "second");
    }

    #[test]
    fn gaps_resolve_to_nothing() {
        let captions = vec![Caption::new(0.0, 1.0, "a"), Caption::new(3.0, 4.0, "b")];
        assert_eq!(active_caption(2.0, &captions), None);
        assert_eq!(active_caption(-0.1, &captions), None);
    }

    #[test]
    fn generating_segment_is_never_active() {
        let segments = vec![segment("b1", 0.0, 10.0, BRollStatus::Generating)];
        assert_eq!(active_b_roll(5.0, &segments), None);
    }

    #[test]
    fn failed_and_pending_segments_are_skipped_for_later_completed_one() {
        let segments = vec![
            segment("b1", 0.0, 10.0, BRollStatus::Failed),
            segment("b2", 0.0, 10.0, BRollStatus::Pending),
            segment("b3", 2.0, 6.0, completed("data:image/png;base64,AA")),
        ];
        assert_eq!(active_b_roll(5.0, &segments).unwrap().id, "b3");
        assert_eq!(active_b_roll(7.0, &segments), None);
    }

    #[test]
    fn overlapping_completed_segments_resolve_to_first() {
        let segments = vec![
            segment("b1", 0.0, 10.0, completed("one")),
            segment("b2", 0.0, 10.0, completed("two")),
        ];
        assert_eq!(active_b_roll(1.0, &segments).unwrap().id, "b1");
    }

    #[test]
    fn resolve_is_deterministic() {
        let captions = vec![Caption::new(0.0, 5.0, "Hi"), Caption::new(5.0, 10.0, "there")];
        let segments = vec![segment("b1", 3.0, 8.0, completed("img"))];

        let first = resolve(5.0, &captions, &segments);
        for _ in 0..10 {
            assert_eq!(resolve(5.0, &captions, &segments), first);
        }
        assert_eq!(first.caption.unwrap().text, "Hi");
        assert_eq!(first.b_roll.unwrap().id, "b1");
    }
}
