// Trisieve Testdata - Outcome profiles
// Copyright (c) 2025 David Martin Venti
//
// Dual-licensed under AGPL-3.0 and Commercial License.
// See LICENSE file for details.

//! Outcome profiles for synthetic sequences.
//!
//! A profile decides, position by position, how likely each outcome is.
//! Profiles range from a flat distribution to a drifting "form" that makes
//! favourable results cluster.

use rand::prelude::*;
use rand_distr::Normal;
use serde::{Deserialize, Serialize};
use trisieve::{Sequence, Symbol, SEQUENCE_LEN};

/// Relative likelihood of the three outcomes.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct OutcomeWeights {
    pub win: f64,
    pub draw: f64,
    pub loss: f64,
}

impl Default for OutcomeWeights {
    fn default() -> Self {
        Self::EVEN
    }
}

impl OutcomeWeights {
    /// All three outcomes equally likely.
    pub const EVEN: OutcomeWeights = OutcomeWeights {
        win: 1.0,
        draw: 1.0,
        loss: 1.0,
    };

    pub fn new(win: f64, draw: f64, loss: f64) -> Self {
        Self { win, draw, loss }
    }

    /// Non-negative finite weights with a positive sum.
    pub fn is_valid(&self) -> bool {
        let all = [self.win, self.draw, self.loss];
        all.iter().all(|w| w.is_finite() && *w >= 0.0) && self.total() > 0.0
    }

    pub fn total(&self) -> f64 {
        self.win + self.draw + self.loss
    }

    /// Probability of WIN or DRAW.
    pub fn favorable_probability(&self) -> f64 {
        let total = self.total();
        if total <= 0.0 {
            return 0.0;
        }
        (self.win + self.draw) / total
    }

    /// Draw one outcome.
    pub fn sample<R: Rng + ?Sized>(&self, rng: &mut R) -> Symbol {
        let r = rng.gen::<f64>() * self.total();
        if r < self.win {
            Symbol::Win
        } else if r < self.win + self.draw {
            Symbol::Draw
        } else {
            Symbol::Loss
        }
    }
}

/// How outcomes are drawn along a sequence.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub enum OutcomeProfile {
    /// Every outcome equally likely everywhere.
    #[default]
    Uniform,

    /// The same weights at every position.
    Weighted(OutcomeWeights),

    /// Independent weights per position.
    PerPosition([OutcomeWeights; SEQUENCE_LEN]),

    /// Weights skewed by a form value that drifts along the sequence.
    ///
    /// Form starts at 0 and takes a normal step of `drift_std` after each
    /// position; positive form moves mass from LOSS to WIN.
    Form {
        base: OutcomeWeights,
        drift_std: f64,
    },
}

impl OutcomeProfile {
    /// Short name for manifests and logs.
    pub fn name(&self) -> &'static str {
        match self {
            OutcomeProfile::Uniform => "uniform",
            OutcomeProfile::Weighted(_) => "weighted",
            OutcomeProfile::PerPosition(_) => "per_position",
            OutcomeProfile::Form { .. } => "form",
        }
    }

    pub fn is_valid(&self) -> bool {
        match self {
            OutcomeProfile::Uniform => true,
            OutcomeProfile::Weighted(w) => w.is_valid(),
            OutcomeProfile::PerPosition(ws) => ws.iter().all(OutcomeWeights::is_valid),
            OutcomeProfile::Form { base, drift_std } => {
                base.is_valid() && drift_std.is_finite() && *drift_std >= 0.0
            }
        }
    }

    /// Draw one sequence.
    pub fn sample<R: Rng + ?Sized>(&self, rng: &mut R) -> Sequence {
        let mut symbols = [Symbol::Loss; SEQUENCE_LEN];
        match self {
            OutcomeProfile::Uniform => {
                for s in symbols.iter_mut() {
                    *s = OutcomeWeights::EVEN.sample(rng);
                }
            }
            OutcomeProfile::Weighted(weights) => {
                for s in symbols.iter_mut() {
                    *s = weights.sample(rng);
                }
            }
            OutcomeProfile::PerPosition(weights) => {
                for (s, w) in symbols.iter_mut().zip(weights.iter()) {
                    *s = w.sample(rng);
                }
            }
            OutcomeProfile::Form { base, drift_std } => {
                let mut form: f64 = 0.0;
                let step = Normal::new(0.0, *drift_std).ok();
                for s in symbols.iter_mut() {
                    let skewed = OutcomeWeights {
                        win: base.win * (1.0 + form),
                        draw: base.draw,
                        loss: base.loss * (1.0 - form),
                    };
                    *s = skewed.sample(rng);
                    if let Some(normal) = &step {
                        form = (form + normal.sample(rng)).clamp(-0.9, 0.9);
                    }
                }
            }
        }
        Sequence::from_symbols(symbols)
    }

    /// Expected favourable probability at each position (form ignored).
    pub fn expected_favorable(&self) -> [f64; SEQUENCE_LEN] {
        match self {
            OutcomeProfile::Uniform => [2.0 / 3.0; SEQUENCE_LEN],
            OutcomeProfile::Weighted(w) => [w.favorable_probability(); SEQUENCE_LEN],
            OutcomeProfile::PerPosition(ws) => {
                let mut out = [0.0; SEQUENCE_LEN];
                for (o, w) in out.iter_mut().zip(ws.iter()) {
                    *o = w.favorable_probability();
                }
                out
            }
            OutcomeProfile::Form { base, .. } => [base.favorable_probability(); SEQUENCE_LEN],
        }
    }
}
