//! Score bands and their colours.
//!
//! Three views colour scores with slightly different cut-offs:
//!
//! | View            | Strong | Fair  | Weak  |
//! |-----------------|--------|-------|-------|
//! | ATS card        | > 69   | > 49  | else  |
//! | Summary / gauge | > 70   | > 49  | else  |
//! | Detail badges   | > 69   | > 39  | else  |
//!
//! A tip is shown as Strong when it is `good` and Weak when it is `improve`.

use crate::feedback::TipKind;
use serde::Serialize;

/// Colour band a score falls into.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum ScoreBand {
    Strong,
    Fair,
    Weak,
}

/// Lower bounds (exclusive) for the strong and fair bands.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Thresholds {
    pub strong_above: u32,
    pub fair_above: u32,
}

pub const ATS_THRESHOLDS: Thresholds = Thresholds {
    strong_above: 69,
    fair_above: 49,
};

pub const SUMMARY_THRESHOLDS: Thresholds = Thresholds {
    strong_above: 70,
    fair_above: 49,
};

pub const DETAIL_THRESHOLDS: Thresholds = Thresholds {
    strong_above: 69,
    fair_above: 39,
};

impl Thresholds {
    pub fn band(&self, score: u32) -> ScoreBand {
        if score > self.strong_above {
            ScoreBand::Strong
        } else if score > self.fair_above {
            ScoreBand::Fair
        } else {
            ScoreBand::Weak
        }
    }
}

impl ScoreBand {
    pub fn for_tip(kind: TipKind) -> Self {
        match kind {
            TipKind::Good => ScoreBand::Strong,
            TipKind::Improve => ScoreBand::Weak,
        }
    }

    /// Palette name: emerald, amber, rose.
    pub fn palette(self) -> &'static str {
        match self {
            ScoreBand::Strong => "emerald",
            ScoreBand::Fair => "amber",
            ScoreBand::Weak => "rose",
        }
    }

    /// ANSI foreground colour for terminals.
    pub fn ansi(self) -> &'static str {
        match self {
            ScoreBand::Strong => "\x1b[32m",
            ScoreBand::Fair => "\x1b[33m",
            ScoreBand::Weak => "\x1b[31m",
        }
    }
}

/// Headline shown on the ATS card.
pub fn ats_subtitle(score: u32) -> &'static str {
    match ATS_THRESHOLDS.band(score) {
        ScoreBand::Strong => "Great Job!",
        ScoreBand::Fair => "Good Start",
        ScoreBand::Weak => "Needs Improvement",
    }
}
