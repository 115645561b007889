//! Stress tests for Trisieve
//!
//! Run with: cargo test --release stress -- --ignored

use std::time::Instant;
use trisieve::*;

#[test]
#[ignore] // Run manually with --ignored
fn stress_test_full_universe() {
    let generator = Generator::new(GeneratorConfig::default());
    let selector = PositionSelector::all();

    let start = Instant::now();
    let report = generator.run(&SequenceSet::new(), &selector, &CancelToken::new(), &mut |_| {});
    let elapsed = start.elapsed();
    let rate = report.evaluated as f64 / elapsed.as_secs_f64();

    println!("Generated {} candidates in {:?}", report.new.len(), elapsed);
    println!("Rate: {:.0} candidates/second", rate);

    assert!(report.completed());
    assert_eq!(report.new.len(), 4_782_969);
    assert!(
        rate > 500_000.0,
        "Should evaluate at least 500k candidates/s, got {:.0}",
        rate
    );
}

#[test]
#[ignore]
fn stress_test_cancel_latency() {
    let handle = GenerationJob::spawn(
        std::sync::Arc::new(SequenceSet::new()),
        PositionSelector::all(),
        GeneratorConfig::default(),
    );

    // wait for the first batch, then cancel
    for event in handle.events().iter() {
        if matches!(event, GenerationEvent::Partial(_)) {
            break;
        }
    }
    let start = Instant::now();
    handle.cancel();
    let report = handle.join();
    let latency = start.elapsed();

    println!("Cancelled after {} candidates in {:?}", report.evaluated, latency);

    assert_eq!(report.status, GenerationStatus::Cancelled);
    assert!(report.evaluated < report.universe);
    assert!(
        latency.as_millis() < 500,
        "Cancellation should be honoured quickly, took {:?}",
        latency
    );
}

#[test]
#[ignore]
fn stress_test_filter_pipeline() {
    let mut session = Session::new();
    session.set_selector(PositionSelector::all()).unwrap();
    session.generate(&CancelToken::new(), &mut |_| {}).unwrap();

    let start = Instant::now();
    let conditions = session.config().basic.active_conditions();
    let after_basic = session.apply_basic(&conditions).unwrap();
    let params = session.config().mystic.params();
    let outcome = session.run_mystic(&params).unwrap();
    let elapsed = start.elapsed();

    println!(
        "Pipeline 4782969 -> {} -> {} in {:?}",
        after_basic,
        outcome.ranked.len(),
        elapsed
    );

    assert!(after_basic > 0);
    assert!(outcome.ranked.len() <= after_basic);
}
