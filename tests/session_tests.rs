//! Session workflow and persistence tests

use std::fs;
use tempfile::tempdir;
use trisieve::*;

fn seq(text: &str) -> Sequence {
    Sequence::parse(text).unwrap()
}

#[test]
fn test_full_workflow_with_files() {
    let dir = tempdir().unwrap();
    let base_path = dir.path().join("base.txt");
    let template_path = dir.path().join("template.txt");
    let out_path = dir.path().join("result.txt");

    fs::write(&base_path, "33333333333333\n\n11111111111111\n").unwrap();
    // positions 0 and 13 vary, everything else is WIN
    fs::write(&template_path, "33333333333333\n13333333333330\n03333333333331\n").unwrap();

    let mut session = Session::new();
    assert_eq!(session.load_base(&base_path).unwrap(), 2);
    assert_eq!(session.load_template(&template_path).unwrap().universe_size(), 9);

    let report = session.generate(&CancelToken::new(), &mut |_| {}).unwrap();
    assert!(report.completed());
    assert_eq!(report.new.len(), 8);
    assert!(!session.working().contains(&seq("33333333333333")));

    let kept = session
        .apply_basic(&[FilterCondition::new(FeatureId::LossCount, 0, 0)])
        .unwrap();
    assert_eq!(kept, 3);

    session.save_current_set(&out_path).unwrap();
    assert_eq!(
        fs::read_to_string(&out_path).unwrap(),
        "13333333333331\n13333333333333\n33333333333331\n"
    );
}

#[test]
fn test_load_base_rejects_bad_file_and_keeps_state() {
    let dir = tempdir().unwrap();
    let good = dir.path().join("good.txt");
    let bad = dir.path().join("bad.txt");
    fs::write(&good, "33333333333333\n").unwrap();
    fs::write(&bad, "33333333333333\n3333333333333x\n").unwrap();

    let mut session = Session::new();
    session.load_base(&good).unwrap();

    let err = session.load_base(&bad).unwrap_err();
    assert!(matches!(
        err,
        SieveError::Validation(ValidationError::InvalidSymbol { line: 2, .. })
    ));
    assert_eq!(session.base().len(), 1);
}

#[test]
fn test_missing_file_is_io_error() {
    let dir = tempdir().unwrap();
    let mut session = Session::new();
    let err = session.load_base(dir.path().join("nope.txt")).unwrap_err();
    assert!(matches!(err, SieveError::Io { .. }));
}

#[test]
fn test_mask_import_replaces_list_and_export_roundtrip() {
    let dir = tempdir().unwrap();
    let import_path = dir.path().join("masks.txt");
    let export_path = dir.path().join("exported.txt");
    fs::write(&import_path, "3#############\n3############\n#############0\n").unwrap();

    let mut session = Session::new();
    session.masks_mut().insert(PositionMask::wildcard());

    let import = session.import_masks(&import_path).unwrap();
    assert_eq!(import.accepted, 2);
    assert_eq!(import.rejected, 1);
    assert_eq!(session.masks().len(), 2);
    assert!(!session.masks().contains(&PositionMask::wildcard()));

    session.export_masks(&export_path).unwrap();
    assert_eq!(
        fs::read_to_string(&export_path).unwrap(),
        "3#############\n#############0\n"
    );
}

#[test]
fn test_masks_from_choices_then_filter() {
    let mut session = Session::new();
    session
        .set_base(
            ["31333333333333", "30333333333333", "11333333333333"]
                .iter()
                .map(|t| seq(t))
                .collect(),
        )
        .unwrap();

    let mut choices = [SymbolSet::EMPTY; SEQUENCE_LEN];
    choices[0] = SymbolSet::only(Symbol::Win);
    choices[1] = SymbolSet::FAVORABLE;
    assert_eq!(session.masks_mut().add_from_choices(&choices), 2);

    assert_eq!(session.apply_masks(MaskMode::Keep).unwrap(), 1);
    assert_eq!(session.working().sorted(), vec![seq("31333333333333")]);

    session.reset_to_base().unwrap();
    assert_eq!(session.apply_masks(MaskMode::Exclude).unwrap(), 2);
}

#[test]
fn test_background_generation_through_session() {
    let mut session = Session::with_config(EngineConfig {
        generator: GeneratorConfig::default().with_batch_size(100),
        ..EngineConfig::default()
    });
    session
        .set_selector(PositionSelector::uniform(SymbolSet::FAVORABLE))
        .unwrap();

    let handle = session.start_generate().unwrap();
    let mut partials = 0;
    let mut terminal = None;
    for event in handle.events().iter() {
        match event {
            GenerationEvent::Partial(_) => partials += 1,
            e if e.is_terminal() => terminal = Some(e),
            _ => {}
        }
    }
    let report = handle.join();

    assert_eq!(terminal, Some(GenerationEvent::Done(16_384)));
    assert_eq!(partials, 164);
    assert_eq!(session.finish_generate(report).unwrap(), GenerationStatus::Completed);
    assert_eq!(session.working().len(), 16_384);
}

#[test]
fn test_cancelled_generation_keeps_partial_pool() {
    let mut session = Session::with_config(EngineConfig {
        generator: GeneratorConfig::default().with_batch_size(10),
        ..EngineConfig::default()
    });
    session
        .set_selector(PositionSelector::uniform(SymbolSet::FAVORABLE))
        .unwrap();

    let cancel = CancelToken::new();
    let token = cancel.clone();
    let report = session
        .generate(&cancel, &mut |event| {
            if event == GenerationEvent::Partial(30) {
                token.cancel();
            }
        })
        .unwrap();

    assert_eq!(report.status, GenerationStatus::Cancelled);
    assert_eq!(report.new.len(), 30);
    assert_eq!(session.pool().len(), 30);
    assert_eq!(session.working().len(), 30);
}

#[test]
fn test_mystic_through_session_with_suggestion() {
    let mut session = Session::new();
    session
        .set_selector(PositionSelector::uniform(SymbolSet::FAVORABLE))
        .unwrap();
    session.generate(&CancelToken::new(), &mut |_| {}).unwrap();

    let suggestion = session.suggest_mystic_params();
    assert_eq!(suggestion.max_tolerance, 4);
    assert_eq!(suggestion.strength, 30);

    let params = MysticParams::new(5, suggestion.max_tolerance as f64, suggestion.strength);
    let outcome = session.run_mystic(&params).unwrap();
    // no losses anywhere: every stage but the shrink keeps everything
    assert_eq!(outcome.after_tolerance, 16_384);
    assert_eq!(session.working().len(), 16_384 * 30 / 100);

    let preview = session.preview(5);
    assert_eq!(preview.len(), 5);
    assert!(preview.iter().all(|s| session.working().contains(s)));
}

#[test]
fn test_config_drives_session_defaults() {
    let config = EngineConfig::from_json(
        r#"{ "mystic": { "anchor_count": 14, "max_tolerance": 0.0, "strength": 100 } }"#,
    )
    .unwrap();
    let params = config.mystic.params();

    let mut session = Session::with_config(config);
    session
        .set_base(
            ["33333333333333", "03333333333333"]
                .iter()
                .map(|t| seq(t))
                .collect(),
        )
        .unwrap();
    session.run_mystic(&params).unwrap();
    assert_eq!(session.working().sorted(), vec![seq("33333333333333")]);
}
