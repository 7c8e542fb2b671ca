use std::collections::HashMap;

use synth_signal::config::SignalConfig;
use synth_signal::model::signal::Direction;
use synth_signal::scorer::SignalScorer;
use synth_signal::window::MinuteWindow;

fn window(rows: &[(&str, Vec<f64>)]) -> MinuteWindow {
    let mut w = MinuteWindow::default();
    for (symbol, prices) in rows {
        for p in prices {
            w.push(symbol, *p);
        }
    }
    w
}

fn scorer_with(factors: &[(&str, f64)]) -> SignalScorer {
    SignalScorer::new(SignalConfig {
        normalization: factors
            .iter()
            .map(|(s, f)| (s.to_string(), *f))
            .collect::<HashMap<_, _>>(),
        ..SignalConfig::default()
    })
}

#[test]
/// Verifies normalization:
/// with equal absolute moves the symbol with the smaller factor scores higher and is chosen.
fn smaller_factor_is_preferred_for_equal_moves() {
    let scorer = scorer_with(&[("AAA", 4.0), ("BBB", 2.0)]);
    let w = window(&[
        ("AAA", vec![10.0, 10.0, 10.0, 10.0, 10.2]),
        ("BBB", vec![10.0, 10.0, 10.0, 10.0, 10.2]),
    ]);
    let signal = scorer.evaluate(7, Some(&w)).expect("signal expected");
    assert_eq!(signal.symbol, "BBB");
    assert!((signal.score - 0.1).abs() < 1e-9);
}

#[test]
/// Verifies unknown symbols use a factor of one.
fn unknown_symbol_uses_unit_factor() {
    let scorer = SignalScorer::default();
    let w = window(&[("XYZ", vec![1.0, 1.0, 1.0, 1.0, 1.25])]);
    let signal = scorer.evaluate(1, Some(&w)).expect("signal expected");
    assert!((signal.score - 0.25).abs() < 1e-9);
}

#[test]
/// Verifies direction depends only on first and last price:
/// an intra-minute dip does not change an UP result.
fn direction_uses_first_and_last_price() {
    let scorer = SignalScorer::default();
    let w = window(&[("R_10", vec![100.0, 90.0, 80.0, 95.0, 100.5])]);
    assert_eq!(scorer.evaluate(1, Some(&w)).unwrap().direction, Direction::Up);

    let w = window(&[("R_10", vec![100.0, 110.0, 120.0, 105.0, 99.5])]);
    assert_eq!(scorer.evaluate(1, Some(&w)).unwrap().direction, Direction::Down);
}

#[test]
/// Verifies flat windows:
/// when every candidate is flat no signal fires, but a moving symbol beats a flat one.
fn flat_sequences_never_fire() {
    let scorer = SignalScorer::default();
    let flat = window(&[
        ("R_10", vec![5.0; 6]),
        ("R_25", vec![7.0; 5]),
    ]);
    assert!(scorer.evaluate(1, Some(&flat)).is_none());

    let mixed = window(&[
        ("R_10", vec![5.0; 6]),
        ("R_25", vec![7.0, 7.0, 7.0, 7.0, 7.5]),
    ]);
    assert_eq!(scorer.evaluate(1, Some(&mixed)).unwrap().symbol, "R_25");
}

#[test]
/// Verifies the sample floor is configurable and applies per symbol.
fn min_samples_is_per_symbol() {
    let scorer = SignalScorer::new(SignalConfig {
        min_samples: 3,
        ..SignalConfig::default()
    });
    let w = window(&[
        ("R_10", vec![1.0, 9.0]),
        ("R_25", vec![1.0, 1.0, 1.1]),
    ]);
    let signal = scorer.evaluate(1, Some(&w)).expect("signal expected");
    assert_eq!(signal.symbol, "R_25");
    assert!((signal.score - 0.04).abs() < 1e-9);
}

#[test]
/// Verifies the threshold boundary is inclusive.
fn score_equal_to_threshold_is_accepted() {
    let scorer = SignalScorer::new(SignalConfig {
        score_threshold: 0.5,
        ..SignalConfig::default()
    });
    let w = window(&[("R_10", vec![1.0, 1.0, 1.0, 1.0, 1.5])]);
    assert!(scorer.evaluate(1, Some(&w)).is_some());
}
