// Trisieve CLI - Subcommands
// Copyright (c) 2025 David Martin Venti
//
// Dual-licensed under AGPL-3.0 and Commercial License.
// See LICENSE file for details.

//! Subcommand arguments and their implementations.
//!
//! Every command builds a fresh [`Session`], loads its input as the base set,
//! runs one stage and writes the resulting working set.

use crate::error::{CliError, Result};
use crate::export::{ReportFormat, StatsReport};
use crate::metrics;
use clap::Args;
use rand::rngs::StdRng;
use rand::SeedableRng;
use std::path::{Path, PathBuf};
use std::time::Instant;
use tokio::task::JoinError;
use tracing::{debug, info, warn};
use trisieve::{
    EngineConfig, FeatureId, FilterCondition, GenerationEvent, GenerationHandle,
    GenerationReport, GenerationStatus, MaskMode, MysticParams, PositionSelector, Session,
    SymbolSet, ValidationError, SEQUENCE_LEN,
};
use trisieve_testdata::{generate_pool, OutcomeProfile, OutcomeWeights, PoolConfig};

// ============================================================================
// Argument parsers
// ============================================================================

/// Parse a selector written as 14 comma-separated symbol groups.
///
/// `"31,31,,0,..."`; an empty group allows every symbol at that position.
pub fn parse_selector(text: &str) -> Result<PositionSelector> {
    let groups: Vec<&str> = text.split(',').map(str::trim).collect();
    if groups.len() != SEQUENCE_LEN {
        return Err(ValidationError::RecordLength {
            expected: SEQUENCE_LEN,
            actual: groups.len(),
        }
        .into());
    }

    let mut choices = [SymbolSet::ALL; SEQUENCE_LEN];
    for (position, group) in groups.iter().enumerate() {
        if !group.is_empty() {
            choices[position] = SymbolSet::parse(group)?;
        }
    }
    Ok(PositionSelector::from_choices(choices))
}

/// Parse `FEATURE:min:max` or `FEATURE:value`.
pub fn parse_condition(text: &str) -> Result<FilterCondition> {
    let parts: Vec<&str> = text.split(':').map(str::trim).collect();
    let feature = parts
        .first()
        .and_then(|name| FeatureId::from_name(name))
        .ok_or_else(|| CliError::InvalidArgument(format!("unknown feature in {:?}", text)))?;

    let bound = |s: &str| {
        s.parse::<u32>()
            .map_err(|_| CliError::InvalidArgument(format!("bad bound {:?} in {:?}", s, text)))
    };
    let condition = match parts.as_slice() {
        [_, value] => FilterCondition::exactly(feature, bound(*value)?),
        [_, min, max] => FilterCondition::new(feature, bound(*min)?, bound(*max)?),
        _ => {
            return Err(CliError::InvalidArgument(format!(
                "expected FEATURE:min:max, got {:?}",
                text
            )))
        }
    };
    condition.validate()?;
    Ok(condition)
}

/// Parse `win,draw,loss` relative weights.
pub fn parse_weights(text: &str) -> Result<OutcomeWeights> {
    let values = text
        .split(',')
        .map(|s| s.trim().parse::<f64>())
        .collect::<std::result::Result<Vec<_>, _>>()
        .map_err(|e| CliError::InvalidArgument(format!("weights {:?}: {}", text, e)))?;
    match values.as_slice() {
        &[win, draw, loss] => Ok(OutcomeWeights::new(win, draw, loss)),
        _ => Err(CliError::InvalidArgument(format!(
            "expected three weights win,draw,loss, got {:?}",
            text
        ))),
    }
}

/// Session with the configuration file applied, if any.
pub fn new_session(config: Option<&Path>) -> Result<Session> {
    let config = match config {
        Some(path) => {
            info!("Loading configuration from {}", path.display());
            EngineConfig::from_json_file(path)?
        }
        None => EngineConfig::default(),
    };
    Ok(Session::with_config(config))
}

fn load_input(session: &mut Session, input: &Path) -> Result<()> {
    let started = Instant::now();
    let n = session.load_base(input)?;
    info!("Loaded {} sequences from {}", n, input.display());
    metrics::record_stage("input", n, started.elapsed().as_secs_f64());
    Ok(())
}

fn save_output(session: &Session, out: &Path) -> Result<()> {
    session.save_current_set(out)?;
    info!(
        "Wrote {} sequences to {}",
        session.working().len(),
        out.display()
    );
    Ok(())
}

// ============================================================================
// generate
// ============================================================================

#[derive(Args, Debug)]
pub struct GenerateArgs {
    /// Base set; candidates already in it are skipped
    #[arg(long)]
    pub base: Option<PathBuf>,

    /// Template file deriving the allowed symbols per position
    #[arg(long, conflicts_with = "positions")]
    pub template: Option<PathBuf>,

    /// Allowed symbols per position, e.g. "31,31,,0,..." (14 groups)
    #[arg(long)]
    pub positions: Option<String>,

    /// Output sequence file
    #[arg(short, long)]
    pub out: PathBuf,
}

/// Forward a job's events to metrics and logs, then wait for its report.
fn drain_events(handle: GenerationHandle) -> GenerationReport {
    for event in handle.events().iter() {
        metrics::record_event(&event);
        match &event {
            GenerationEvent::Progress(p) => debug!("progress {:.1}%", p),
            GenerationEvent::Partial(n) => debug!("{} new candidates so far", n),
            terminal => info!("generation finished: {:?}", terminal),
        }
        if event.is_terminal() {
            break;
        }
    }
    handle.join()
}

/// Unlock the session when the draining task died before returning a report.
fn settle_generation(
    session: &mut Session,
    joined: std::result::Result<GenerationReport, JoinError>,
) -> Result<GenerationReport> {
    joined.or_else(|e| {
        // the handle was dropped with the task, which cancelled the job
        session.abort_generate()?;
        Err(CliError::Task(e.to_string()))
    })
}

pub async fn generate(session: &mut Session, args: &GenerateArgs) -> Result<()> {
    if let Some(base) = &args.base {
        load_input(session, base)?;
    }
    if let Some(template) = &args.template {
        session.load_template(template)?;
    } else if let Some(positions) = &args.positions {
        session.set_selector(parse_selector(positions)?)?;
    } else {
        info!("No template given, generating over the full universe");
    }

    let universe = session.selector().universe_size();
    info!("Generating over {} candidates", universe);

    let started = Instant::now();
    let handle = session.start_generate()?;
    let token = handle.cancel_token();
    let interrupt = tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            warn!("Interrupt received, cancelling generation");
            token.cancel();
        }
    });

    let joined = tokio::task::spawn_blocking(move || drain_events(handle)).await;
    interrupt.abort();
    let report = settle_generation(session, joined)?;

    metrics::record_generation(&report);
    metrics::record_stage("generate", report.new.len(), started.elapsed().as_secs_f64());

    let status = session.finish_generate(report)?;
    save_output(session, &args.out)?;

    match status {
        GenerationStatus::Completed => Ok(()),
        GenerationStatus::Cancelled => {
            warn!("Generation cancelled, partial pool written");
            Ok(())
        }
        GenerationStatus::Failed(msg) => Err(CliError::Task(msg)),
    }
}

// ============================================================================
// basic
// ============================================================================

#[derive(Args, Debug)]
pub struct BasicArgs {
    /// Input sequence file
    #[arg(short, long)]
    pub input: PathBuf,

    /// Output sequence file
    #[arg(short, long)]
    pub out: PathBuf,

    /// Condition FEATURE:min:max (repeatable); defaults to the enabled presets
    #[arg(long = "cond")]
    pub conditions: Vec<String>,
}

pub fn basic(session: &mut Session, args: &BasicArgs) -> Result<()> {
    let conditions = if args.conditions.is_empty() {
        session.config().basic.active_conditions()
    } else {
        args.conditions
            .iter()
            .map(|c| parse_condition(c))
            .collect::<Result<Vec<_>>>()?
    };
    for condition in &conditions {
        debug!("condition {}", condition);
    }

    load_input(session, &args.input)?;
    let started = Instant::now();
    let kept = session.apply_basic(&conditions)?;
    metrics::record_stage("basic", kept, started.elapsed().as_secs_f64());
    info!("Basic filter kept {} sequences", kept);
    save_output(session, &args.out)
}

// ============================================================================
// mask
// ============================================================================

#[derive(Args, Debug)]
pub struct MaskArgs {
    /// Input sequence file
    #[arg(short, long)]
    pub input: PathBuf,

    /// Output sequence file
    #[arg(short, long)]
    pub out: PathBuf,

    /// Mask file, one 14-character mask per line
    #[arg(short, long)]
    pub masks: PathBuf,

    /// keep or exclude the matching sequences
    #[arg(long, default_value = "keep")]
    pub mode: String,
}

pub fn mask(session: &mut Session, args: &MaskArgs) -> Result<()> {
    let mode: MaskMode = args.mode.parse().map_err(CliError::InvalidArgument)?;
    let import = session.import_masks(&args.masks)?;
    info!(
        "Imported {} masks ({} duplicates, {} rejected)",
        import.accepted, import.duplicates, import.rejected
    );

    load_input(session, &args.input)?;
    let started = Instant::now();
    let kept = session.apply_masks(mode)?;
    metrics::record_stage("mask", kept, started.elapsed().as_secs_f64());
    info!("Mask filter ({:?}) kept {} sequences", mode, kept);
    save_output(session, &args.out)
}

// ============================================================================
// mystic
// ============================================================================

#[derive(Args, Debug)]
pub struct MysticArgs {
    /// Input sequence file
    #[arg(short, long)]
    pub input: PathBuf,

    /// Output sequence file
    #[arg(short, long)]
    pub out: PathBuf,

    /// Number of anchor positions (1-14)
    #[arg(long)]
    pub anchors: Option<usize>,

    /// Maximum weighted loss (0-5)
    #[arg(long)]
    pub tolerance: Option<f64>,

    /// Percentage kept after ranking (0-100)
    #[arg(long)]
    pub strength: Option<u32>,

    /// Use the suggested tolerance and strength for the input size
    #[arg(long)]
    pub auto: bool,
}

/// Explicit flags win over `--auto`, which wins over the configuration.
fn mystic_params(session: &Session, args: &MysticArgs) -> MysticParams {
    let mut params = session.config().mystic.params();
    if args.auto {
        let suggestion = session.suggest_mystic_params();
        info!(
            "Suggested tolerance {} and strength {}",
            suggestion.max_tolerance, suggestion.strength
        );
        params.max_tolerance = f64::from(suggestion.max_tolerance);
        params.strength = suggestion.strength;
    }
    if let Some(anchors) = args.anchors {
        params.anchor_count = anchors;
    }
    if let Some(tolerance) = args.tolerance {
        params.max_tolerance = tolerance;
    }
    if let Some(strength) = args.strength {
        params.strength = strength;
    }
    params
}

pub fn mystic(session: &mut Session, args: &MysticArgs) -> Result<()> {
    load_input(session, &args.input)?;
    let params = mystic_params(session, args);
    params.validate()?;

    let started = Instant::now();
    let outcome = session.run_mystic(&params)?;
    metrics::record_mystic(&outcome);
    metrics::record_stage("mystic", outcome.ranked.len(), started.elapsed().as_secs_f64());
    info!(
        "Mystic: anchors {:?}, {} -> {} -> {} -> {}",
        outcome.anchors,
        outcome.input,
        outcome.after_anchor,
        outcome.after_tolerance,
        outcome.ranked.len()
    );
    save_output(session, &args.out)
}

// ============================================================================
// suggest / preview / stats
// ============================================================================

#[derive(Args, Debug)]
pub struct SuggestArgs {
    /// Input sequence file
    #[arg(short, long)]
    pub input: PathBuf,
}

pub fn suggest(session: &mut Session, args: &SuggestArgs) -> Result<()> {
    load_input(session, &args.input)?;
    let suggestion = session.suggest_mystic_params();
    println!("tolerance={}", suggestion.max_tolerance);
    println!("strength={}", suggestion.strength);
    Ok(())
}

#[derive(Args, Debug)]
pub struct PreviewArgs {
    /// Input sequence file
    #[arg(short, long)]
    pub input: PathBuf,

    /// Sample size; defaults to the configured preview size
    #[arg(short = 'n', long)]
    pub count: Option<usize>,

    /// Seed for a reproducible sample
    #[arg(long)]
    pub seed: Option<u64>,
}

pub fn preview(session: &mut Session, args: &PreviewArgs) -> Result<()> {
    load_input(session, &args.input)?;
    let n = args.count.unwrap_or(session.config().mystic.preview_size);
    let sample = match args.seed {
        Some(seed) => session.preview_with(n, &mut StdRng::seed_from_u64(seed)),
        None => session.preview(n),
    };
    for sequence in sample.sorted() {
        println!("{}", sequence);
    }
    Ok(())
}

#[derive(Args, Debug)]
pub struct StatsArgs {
    /// Input sequence file
    #[arg(short, long)]
    pub input: PathBuf,

    /// Report file (.csv or .json)
    #[arg(short, long)]
    pub out: PathBuf,

    /// csv or json; guessed from the extension when omitted
    #[arg(long)]
    pub format: Option<String>,

    /// Number of trigrams listed
    #[arg(long, default_value = "10")]
    pub top: usize,
}

pub fn stats(session: &mut Session, args: &StatsArgs) -> Result<()> {
    let format = match &args.format {
        Some(f) => f.parse::<ReportFormat>()?,
        None => ReportFormat::from_path(&args.out),
    };
    load_input(session, &args.input)?;
    let report = StatsReport::from_stats(session.frequency_stats(), args.top);
    report.write(&args.out, format)?;
    info!(
        "Wrote statistics of {} sequences to {}",
        report.sample_count,
        args.out.display()
    );
    Ok(())
}

// ============================================================================
// synth
// ============================================================================

#[derive(Args, Debug)]
pub struct SynthArgs {
    /// Directory receiving the sequence file and its manifest
    #[arg(long, default_value = ".")]
    pub out_dir: PathBuf,

    /// Pool name
    #[arg(long, default_value = "pool")]
    pub name: String,

    /// Number of distinct sequences
    #[arg(long, default_value = "1000")]
    pub size: usize,

    /// Random seed
    #[arg(long)]
    pub seed: Option<u64>,

    /// uniform or weighted
    #[arg(long, default_value = "uniform")]
    pub profile: String,

    /// Relative weights win,draw,loss for the weighted profile
    #[arg(long)]
    pub weights: Option<String>,
}

fn synth_profile(args: &SynthArgs) -> Result<OutcomeProfile> {
    match args.profile.to_ascii_lowercase().as_str() {
        "uniform" => Ok(OutcomeProfile::Uniform),
        "weighted" => {
            let weights = args.weights.as_deref().ok_or_else(|| {
                CliError::InvalidArgument("weighted profile needs --weights".to_string())
            })?;
            Ok(OutcomeProfile::Weighted(parse_weights(weights)?))
        }
        other => Err(CliError::InvalidArgument(format!(
            "unknown profile: {}",
            other
        ))),
    }
}

pub fn synth(args: &SynthArgs) -> Result<()> {
    let mut config = PoolConfig::new()
        .with_name(&args.name)
        .with_size(args.size)
        .with_profile(synth_profile(args)?);
    if let Some(seed) = args.seed {
        config = config.with_seed(seed);
    }

    let pool = generate_pool(&config)?;
    if pool.sequences.len() < args.size {
        warn!(
            "Profile exhausted after {} of {} sequences",
            pool.sequences.len(),
            args.size
        );
    }
    std::fs::create_dir_all(&args.out_dir)?;
    let path = pool.save(&args.out_dir)?;
    info!("Wrote {} sequences to {}", pool.sequences.len(), path.display());
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;
    use trisieve::{Sequence, SequenceSet, Symbol};

    #[test]
    fn test_parse_selector() {
        let selector = parse_selector("3,31,,0,3,3,3,3,3,3,3,3,3,3").unwrap();
        assert_eq!(selector.allowed(0), SymbolSet::only(Symbol::Win));
        assert_eq!(selector.allowed(1), SymbolSet::FAVORABLE);
        assert_eq!(selector.allowed(2), SymbolSet::ALL);
        assert_eq!(selector.universe_size(), 6);

        let err = parse_selector("3,3,3").unwrap_err();
        assert!(!err.to_string().contains("Line"));
        assert!(matches!(
            err,
            CliError::Sieve(trisieve::SieveError::Validation(ValidationError::RecordLength {
                expected: 14,
                actual: 3
            }))
        ));
        let err = parse_selector("3,3,3,3,3,3,3,3,3,3,3,3,3,X").unwrap_err();
        assert!(matches!(
            err,
            CliError::Sieve(trisieve::SieveError::Validation(ValidationError::RecordSymbol {
                column: 1,
                found: 'X'
            }))
        ));
    }

    #[test]
    fn test_parse_condition() {
        let c = parse_condition("WIN_COUNT:5:7").unwrap();
        assert_eq!(c, FilterCondition::new(FeatureId::WinCount, 5, 7));
        let c = parse_condition("loss_count:0").unwrap();
        assert_eq!(c, FilterCondition::exactly(FeatureId::LossCount, 0));

        assert!(parse_condition("Nope:1:2").is_err());
        assert!(parse_condition("WIN_COUNT:7:5").is_err());
        assert!(parse_condition("WIN_COUNT:a:5").is_err());
        assert!(parse_condition("WIN_COUNT:1:2:3").is_err());
    }

    #[test]
    fn test_parse_weights() {
        let w = parse_weights("2, 1, 1").unwrap();
        assert_eq!(w, OutcomeWeights::new(2.0, 1.0, 1.0));
        assert!(parse_weights("1,1").is_err());
        assert!(parse_weights("1,x,1").is_err());
    }

    #[test]
    fn test_mystic_params_precedence() {
        let mut session = Session::new();
        session.set_base(SequenceSet::new()).unwrap();
        let args = MysticArgs {
            input: PathBuf::from("in.txt"),
            out: PathBuf::from("out.txt"),
            anchors: Some(2),
            tolerance: None,
            strength: Some(80),
            auto: true,
        };
        let params = mystic_params(&session, &args);
        assert_eq!(params.anchor_count, 2);
        // suggestion for an empty set: tolerance 0
        assert_eq!(params.max_tolerance, 0.0);
        assert_eq!(params.strength, 80);
    }

    #[test]
    fn test_basic_command() {
        let dir = tempdir().unwrap();
        let input = dir.path().join("in.txt");
        let out = dir.path().join("out.txt");
        std::fs::write(&input, "33333333333333\n00000000000000\n33333331111111\n").unwrap();

        let mut session = Session::new();
        basic(
            &mut session,
            &BasicArgs {
                input,
                out: out.clone(),
                conditions: vec!["LOSS_COUNT:0:0".to_string(), "WIN_COUNT:7:14".to_string()],
            },
        )
        .unwrap();

        let written = std::fs::read_to_string(&out).unwrap();
        assert_eq!(written.lines().collect::<Vec<_>>(), vec!["33333331111111", "33333333333333"]);
    }

    #[test]
    fn test_mask_command_exclude() {
        let dir = tempdir().unwrap();
        let input = dir.path().join("in.txt");
        let masks = dir.path().join("masks.txt");
        let out = dir.path().join("out.txt");
        std::fs::write(&input, "33333333333333\n03333333333333\n").unwrap();
        std::fs::write(&masks, "0#############\nnot a mask\n").unwrap();

        let mut session = Session::new();
        mask(
            &mut session,
            &MaskArgs {
                input,
                out: out.clone(),
                masks,
                mode: "exclude".to_string(),
            },
        )
        .unwrap();

        let written = std::fs::read_to_string(&out).unwrap();
        assert_eq!(written.trim(), "33333333333333");
    }

    #[test]
    fn test_mask_command_bad_mode() {
        let mut session = Session::new();
        let args = MaskArgs {
            input: PathBuf::from("in.txt"),
            out: PathBuf::from("out.txt"),
            masks: PathBuf::from("masks.txt"),
            mode: "invert".to_string(),
        };
        assert!(matches!(
            mask(&mut session, &args),
            Err(CliError::InvalidArgument(_))
        ));
    }

    #[tokio::test]
    async fn test_generate_command() {
        let dir = tempdir().unwrap();
        let base = dir.path().join("base.txt");
        let out = dir.path().join("pool.txt");
        std::fs::write(&base, "33333333333333\n").unwrap();

        let mut session = Session::new();
        generate(
            &mut session,
            &GenerateArgs {
                base: Some(base),
                template: None,
                positions: Some("31,3,3,3,3,3,3,3,3,3,3,3,3,3".to_string()),
                out: out.clone(),
            },
        )
        .await
        .unwrap();

        let written = std::fs::read_to_string(&out).unwrap();
        assert_eq!(written.trim(), "13333333333333");
        assert!(!session.is_generating());
        assert_eq!(
            session.working().sorted(),
            vec![Sequence::parse("13333333333333").unwrap()]
        );
    }

    #[tokio::test]
    async fn test_failed_drain_unlocks_session() {
        let mut session = Session::new();
        session.set_base(SequenceSet::new()).unwrap();
        let handle = session.start_generate().unwrap();
        let token = handle.cancel_token();

        let joined = tokio::task::spawn_blocking(move || -> GenerationReport {
            drop(handle);
            panic!("event consumer failed")
        })
        .await;
        assert!(joined.is_err());

        let err = settle_generation(&mut session, joined).unwrap_err();
        assert!(matches!(err, CliError::Task(_)));
        assert!(token.is_cancelled());
        assert!(!session.is_generating());
        session.reset_to_base().unwrap();
        assert!(session.start_generate().is_ok());
    }

    #[test]
    fn test_synth_command() {
        let dir = tempdir().unwrap();
        let args = SynthArgs {
            out_dir: dir.path().to_path_buf(),
            name: "unit".to_string(),
            size: 50,
            seed: Some(9),
            profile: "weighted".to_string(),
            weights: Some("2,1,1".to_string()),
        };
        synth(&args).unwrap();

        let text = std::fs::read_to_string(dir.path().join("unit.txt")).unwrap();
        assert_eq!(text.lines().count(), 50);
    }

    #[test]
    fn test_synth_profile_needs_weights() {
        let args = SynthArgs {
            out_dir: PathBuf::from("."),
            name: "p".to_string(),
            size: 1,
            seed: None,
            profile: "weighted".to_string(),
            weights: None,
        };
        assert!(synth_profile(&args).is_err());
    }
}
