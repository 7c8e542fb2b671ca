use tokio::sync::mpsc;

use synth_signal::event::AppEvent;
use synth_signal::model::signal::{Direction, Signal, SignalKey};
use synth_signal::presenter::{FeedbackLog, LogPresenter, Sentiment, SignalSink};

fn signal(minute: u64, symbol: &str, direction: Direction) -> Signal {
    Signal {
        minute_index: minute,
        symbol: symbol.to_string(),
        direction,
        score: 0.02,
    }
}

#[test]
/// Verifies feedback is keyed by the signal identity:
/// the same minute and symbol with a different direction is a different entry.
fn feedback_is_keyed_by_minute_symbol_direction() {
    let mut log = FeedbackLog::default();
    let up = signal(10, "R_10", Direction::Up).key();
    let down = signal(10, "R_10", Direction::Down).key();

    log.record(up.clone(), Sentiment::Positive, "  clean breakout ");
    log.record(down.clone(), Sentiment::Negative, "");

    assert_eq!(log.len(), 2);
    assert_eq!(log.get(&up).map(|f| f.note.as_str()), Some("clean breakout"));
    assert_eq!(log.get(&down).map(|f| f.sentiment), Some(Sentiment::Negative));

    let summary = log.summary();
    assert_eq!(summary.positive, 1);
    assert_eq!(summary.negative, 1);
    assert_eq!(summary.total(), 2);
}

#[test]
/// Verifies re-recording replaces the earlier feedback for the same signal.
fn feedback_rerecord_replaces_entry() {
    let mut log = FeedbackLog::default();
    let key = SignalKey {
        minute_index: 3,
        symbol: "R_50".to_string(),
        direction: Direction::Up,
    };
    log.record(key.clone(), Sentiment::Negative, "first");
    log.record(key.clone(), Sentiment::Positive, "second");
    assert_eq!(log.len(), 1);
    assert_eq!(log.get(&key).map(|f| f.sentiment), Some(Sentiment::Positive));
    assert_eq!(log.summary().positive, 1);
}

#[test]
/// Verifies the log presenter keeps only the latest signal.
fn log_presenter_tracks_latest() {
    let mut presenter = LogPresenter::default();
    assert!(presenter.latest().is_none());
    presenter.present(&signal(1, "R_10", Direction::Up));
    presenter.present(&signal(2, "R_25", Direction::Down));
    assert_eq!(presenter.latest().map(|s| s.minute_index), Some(2));
}

#[test]
/// Verifies channel delivery:
/// a sender sink forwards signals as events and drops them when the channel is full.
fn sender_sink_forwards_events() {
    let (mut tx, mut rx) = mpsc::channel::<AppEvent>(1);
    tx.present(&signal(1, "R_10", Direction::Up));
    tx.present(&signal(2, "R_10", Direction::Up));

    match rx.try_recv() {
        Ok(AppEvent::SignalEmitted(s)) => assert_eq!(s.minute_index, 1),
        other => panic!("unexpected event: {:?}", other),
    }
    assert!(rx.try_recv().is_err());
}
