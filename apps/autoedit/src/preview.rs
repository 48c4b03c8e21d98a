use std::time::Duration;

use autoedit_core::{
    AnalysisResult, EditSession, OverlayFrame, SimulatedClock,
    format::{format_overlay, format_timeline},
};
use console::style;

const TIMELINE_WIDTH: usize = 60;

/// Media length as implied by the analysis: the latest window end.
pub fn media_length(result: &AnalysisResult) -> f64 {
    let captions = result.captions.iter().map(|c| c.end_time);
    let b_roll = result.b_roll.iter().map(|b| b.end_time);
    captions.chain(b_roll).fold(0.0, f64::max)
}

fn print_timeline(session: &EditSession<SimulatedClock>) {
    let state = session.playback();
    let b_roll = session.b_roll();
    println!(
        "{}",
        style(format_timeline(
            TIMELINE_WIDTH,
            state.current_time,
            state.duration,
            session.captions(),
            &b_roll,
        ))
        .dim()
    );
}

/// Play the session on its simulated clock, printing the overlay each time
/// it changes. Ctrl-C stops early.
pub async fn run(session: &mut EditSession<SimulatedClock>, tick: Duration) {
    println!("\n{}  {}\n", style("Preview").cyan().bold(), style("(Ctrl-C to stop)").dim());
    print_timeline(session);
    println!();

    session.set_playing(true);
    if !session.playback().is_playing {
        println!("{}", style("Nothing to play.").yellow());
        return;
    }

    let ctrl_c = tokio::signal::ctrl_c();
    tokio::pin!(ctrl_c);
    let mut interval = tokio::time::interval(tick);
    let mut last: Option<OverlayFrame> = None;

    loop {
        tokio::select! {
            _ = &mut ctrl_c => {
                session.set_playing(false);
                println!("{}", style("Stopped.").dim());
                break;
            }
            _ = interval.tick() => {
                let frame = session.tick();
                if last.as_ref().is_none_or(|prev| frame.differs_from(prev)) {
                    println!("{}", format_overlay(frame.time, &frame.as_overlay()));
                }
                last = Some(frame);

                if !session.playback().is_playing {
                    break;
                }
            }
        }
    }

    println!();
    print_timeline(session);
}

#[cfg(test)]
mod tests {
    use super::*;
    use autoedit_core::{BRollSegment, BRollStatus, Caption};

    #[test]
    fn media_length_is_latest_window_end() {
        let result = AnalysisResult {
            title: String::new(),
            summary: String::new(),
            captions: vec![Caption::new(0.0, 12.5, "a")],
            b_roll: vec![BRollSegment {
                id: "b".into(),
                start_time: 10.0,
                end_time: 14.0,
                description: String::new(),
                image_prompt: String::new(),
                status: BRollStatus::Pending,
            }],
        };
        assert_eq!(media_length(&result), 14.0);
    }

    #[test]
    fn empty_analysis_has_no_length() {
        let result = AnalysisResult {
            title: String::new(),
            summary: String::new(),
            captions: Vec::new(),
            b_roll: Vec::new(),
        };
        assert_eq!(media_length(&result), 0.0);
    }
}
