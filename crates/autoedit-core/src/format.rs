use crate::{
    timeline::{marker_span, offset_from_position},
    types::{ActiveOverlay, AnalysisResult, BRollSegment, BRollStatus, Caption},
};

/// Format seconds as MM:SS timestamp
pub fn format_timestamp(seconds: f64) -> String {
    let seconds = seconds.max(0.0);
    let mins = (seconds / 60.0) as u32;
    let secs = (seconds % 60.0) as u32;
    format!("{:02}:{:02}", mins, secs)
}

/// Like [`format_timestamp`], but `--:--` while the duration is unknown
pub fn format_duration_label(duration: f64) -> String {
    if duration > 0.0 {
        format_timestamp(duration)
    } else {
        "--:--".to_string()
    }
}

fn status_marker(status: &BRollStatus) -> &'static str {
    match status {
        BRollStatus::Pending => "○",
        BRollStatus::Generating => "◐",
        BRollStatus::Completed { .. } => "●",
        BRollStatus::Failed => "✕",
    }
}

pub fn format_analysis_readable(result: &AnalysisResult) -> String {
    let mut output = String::new();
    output.push_str(&format!("# {}\n\n", result.title));
    output.push_str(&result.summary);
    output.push_str("\n\n");

    output.push_str("## Captions\n\n");
    for caption in &result.captions {
        output.push_str(&format!(
            "[{}–{}] {}\n",
            format_timestamp(caption.start_time),
            format_timestamp(caption.end_time),
            caption.text.trim()
        ));
    }
    output.push('\n');

    output.push_str("## B-roll\n\n");
    for segment in &result.b_roll {
        output.push_str(&format!(
            "{} [{}–{}] {} ({})\n   prompt: {}\n",
            status_marker(&segment.status),
            format_timestamp(segment.start_time),
            format_timestamp(segment.end_time),
            segment.description,
            segment.status.label(),
            segment.image_prompt
        ));
    }

    output
}

fn paint_track(
    width: usize,
    duration: f64,
    windows: impl Iterator<Item = (f64, f64, char)>,
) -> String {
    let mut track = vec!['·'; width];
    for (start, end, fill) in windows {
        let Some((left, span)) = marker_span(start, end, duration) else {
            continue;
        };
        let from = (left * width as f64).floor() as usize;
        let to = (((left + span) * width as f64).ceil() as usize).max(from + 1);
        for cell in track.iter_mut().take(to.min(width)).skip(from) {
            *cell = fill;
        }
    }
    track.into_iter().collect()
}

/// Three text rows: caption markers, B-roll markers, and the playhead.
pub fn format_timeline(
    width: usize,
    current_time: f64,
    duration: f64,
    captions: &[Caption],
    b_roll: &[BRollSegment],
) -> String {
    let width = width.max(1);
    let captions_row = paint_track(
        width,
        duration,
        captions.iter().map(|c| (c.start_time, c.end_time, '▬')),
    );
    let b_roll_row = paint_track(
        width,
        duration,
        b_roll.iter().map(|b| {
            let fill = if b.is_completed() { '█' } else { '░' };
            (b.start_time, b.end_time, fill)
        }),
    );

    let head = offset_from_position(current_time, width as f64, duration) as usize;
    let progress: String = (0..width)
        .map(|i| match i.cmp(&head.min(width - 1)) {
            std::cmp::Ordering::Less => '━',
            std::cmp::Ordering::Equal => '●',
            std::cmp::Ordering::Greater => '─',
        })
        .collect();

    format!(
        "{captions_row}\n{b_roll_row}\n{progress}  {} / {}",
        format_timestamp(current_time),
        format_duration_label(duration)
    )
}

/// One line describing what is on screen.
pub fn format_overlay(current_time: f64, overlay: &ActiveOverlay<'_>) -> String {
    let caption = overlay
        .caption
        .map(|c| format!("\"{}\"", c.text.trim()))
        .unwrap_or_else(|| "—".to_string());
    match overlay.b_roll {
        Some(b_roll) => format!(
            "[{}] {}  [B-Roll: {}]",
            format_timestamp(current_time),
            caption,
            b_roll.description
        ),
        None => format!("[{}] {}", format_timestamp(current_time), caption),
    }
}
