//! Stage identifiers
//!
//! Stages are numbered 1-8 in execution order:
//! - 1: Settings - resolve run settings from configuration
//! - 2: Storage - ensure log directory, load run state
//! - 3: Welcome - one-time welcome email
//! - 4: Fetch - activity window through the retry wrapper
//! - 5: AccessGuard - provider credential precondition
//! - 6: Summary - daily log generation and persistence
//! - 7: Questions - discussion question generation
//! - 8: Notify - email/inbox fan-out

use serde::Serialize;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "kebab-case")]
pub enum PipelineStage {
    Settings = 1,
    Storage = 2,
    Welcome = 3,
    Fetch = 4,
    AccessGuard = 5,
    Summary = 6,
    Questions = 7,
    Notify = 8,
}

impl PipelineStage {
    pub fn as_u8(&self) -> u8 {
        *self as u8
    }

    pub fn name(&self) -> &'static str {
        match self {
            Self::Settings => "Settings",
            Self::Storage => "Storage",
            Self::Welcome => "Welcome",
            Self::Fetch => "Fetch",
            Self::AccessGuard => "Access Guard",
            Self::Summary => "Summary",
            Self::Questions => "Questions",
            Self::Notify => "Notify",
        }
    }

    /// Total number of stages
    pub const COUNT: usize = 8;

    pub fn from_u8(stage: u8) -> Option<Self> {
        match stage {
            1 => Some(Self::Settings),
            2 => Some(Self::Storage),
            3 => Some(Self::Welcome),
            4 => Some(Self::Fetch),
            5 => Some(Self::AccessGuard),
            6 => Some(Self::Summary),
            7 => Some(Self::Questions),
            8 => Some(Self::Notify),
            _ => None,
        }
    }
}

impl std::fmt::Display for PipelineStage {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.name())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_stage_numbering_round_trips() {
        for n in 1..=PipelineStage::COUNT as u8 {
            let stage = PipelineStage::from_u8(n).unwrap();
            assert_eq!(stage.as_u8(), n);
        }
        assert_eq!(PipelineStage::from_u8(0), None);
        assert_eq!(PipelineStage::from_u8(9), None);
    }
}
