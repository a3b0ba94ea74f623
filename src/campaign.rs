//! Simulated samples known to the batch driver.

use std::fmt;
use std::path::{Path, PathBuf};

use crate::config::FileFormat;

pub const CAMPAIGNS: [&str; 6] = ["mc20a", "mc20d", "mc20e", "mc23a", "mc23d", "mc23e"];

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PileUp {
    With,
    Without,
}

impl PileUp {
    pub const ALL: [PileUp; 2] = [PileUp::With, PileUp::Without];

    pub fn as_str(self) -> &'static str {
        match self {
            PileUp::With => "withPU",
            PileUp::Without => "noPU",
        }
    }
}

/// One simulated sample: a campaign with or without pile-up.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Sample {
    pub campaign: &'static str,
    pub pileup: PileUp,
}

impl Sample {
    /// `{campaign}_{pileup}`, e.g. `mc20a_withPU`.
    pub fn stem(&self) -> String {
        self.to_string()
    }

    pub fn input_path(&self, dir: &Path, format: FileFormat) -> PathBuf {
        dir.join(format!("{}.{}", self.stem(), format.extension()))
    }
}

impl fmt::Display for Sample {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}_{}", self.campaign, self.pileup.as_str())
    }
}

/// Which samples a run covers.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RunMode {
    /// Only `mc20a_withPU`.
    Test,
    /// Every campaign, with and without pile-up.
    Full,
}

impl RunMode {
    pub fn samples(self) -> Vec<Sample> {
        match self {
            RunMode::Test => vec![Sample {
                campaign: CAMPAIGNS[0],
                pileup: PileUp::With,
            }],
            RunMode::Full => CAMPAIGNS
                .iter()
                .flat_map(|&campaign| PileUp::ALL.map(|pileup| Sample { campaign, pileup }))
                .collect(),
        }
    }
}
