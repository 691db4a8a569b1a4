//! Accumulator configuration.

use serde::{Deserialize, Serialize};

/// What to do when a record has no usable author.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[cfg_attr(feature = "cli", derive(clap::ValueEnum))]
#[serde(rename_all = "kebab-case")]
pub enum RecoveryMode {
    /// Log the record and move on.
    #[default]
    SkipAndContinue,
    /// Stop and return the error. The partial graph stays on the accumulator.
    Abort,
}

/// How a record whose slots name the same target more than once is counted,
/// e.g. a quote and a repost of posts by the same author.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[cfg_attr(feature = "cli", derive(clap::ValueEnum))]
#[serde(rename_all = "kebab-case")]
pub enum MultiSlotPolicy {
    /// Every slot is one interaction.
    #[default]
    CountEach,
    /// A target counts once per record no matter how many slots name it.
    OncePerTarget,
}

/// What to do with a quote or repost slot that carries no author.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[cfg_attr(feature = "cli", derive(clap::ValueEnum))]
#[serde(rename_all = "kebab-case")]
pub enum TargetAnomalyPolicy {
    /// No target is derived from that slot.
    #[default]
    Ignore,
    /// The whole record is malformed.
    Reject,
}

/// Accumulator settings. Every field has a default, so a partial
/// JSON/TOML document deserializes.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct AccumulatorConfig {
    pub recovery: RecoveryMode,
    pub multi_slot: MultiSlotPolicy,
    pub target_anomaly: TargetAnomalyPolicy,
    /// Keep author → self edges (self-replies in threads).
    pub self_loops: bool,
    /// Log progress every N records. 0 disables.
    pub progress_interval: u64,
}

impl Default for AccumulatorConfig {
    fn default() -> Self {
        Self {
            recovery: RecoveryMode::SkipAndContinue,
            multi_slot: MultiSlotPolicy::CountEach,
            target_anomaly: TargetAnomalyPolicy::Ignore,
            self_loops: true,
            progress_interval: 100_000,
        }
    }
}

impl AccumulatorConfig {
    pub fn with_recovery(mut self, recovery: RecoveryMode) -> Self {
        self.recovery = recovery;
        self
    }

    pub fn with_multi_slot(mut self, policy: MultiSlotPolicy) -> Self {
        self.multi_slot = policy;
        self
    }

    pub fn with_target_anomaly(mut self, policy: TargetAnomalyPolicy) -> Self {
        self.target_anomaly = policy;
        self
    }

    pub fn with_self_loops(mut self, keep: bool) -> Self {
        self.self_loops = keep;
        self
    }

    pub fn with_progress_interval(mut self, every: u64) -> Self {
        self.progress_interval = every;
        self
    }
}
