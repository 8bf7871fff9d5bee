/*
 * This modules contains some quality of life structs. Most importantly, it contains the
 * `DivisionConfig` struct, which implements the default trait. This config can be passed to the
 * `divide_corpus_conf` function to simplify its arguments.
*/
use crate::division::{BalancePasses, InitialPartition};
use crate::stats::ProportionMode;
use std::fmt::Display;

/// Score-difference tolerance of the hand-tagged redistribution pass: a swap
/// that keeps both scores within this bound of their old value is accepted.
pub const DEFAULT_TOLERANCE: f64 = 0.05;

/// Number of folds used by the reference experiment.
pub const DEFAULT_FOLDS: usize = 5;

#[derive(Clone, Debug, PartialEq)]
/// Config struct used to simplify the inputs of parameters to the main functions of `foldev`. It
/// implements the default trait. The defaults replicate the reference experiment: five folds,
/// contiguous chunking, inflated proportion denominators and a single balancing pass.
pub struct DivisionConfig {
    /// Number of folds to divide the corpus into. Must be at least one.
    n_folds: usize,
    /// How the initial folds are formed before balancing.
    partition: InitialPartition,
    /// How subset proportions are computed. See `ProportionMode` for the
    /// reproducibility caveat.
    proportion_mode: ProportionMode,
    /// Whether the balancer runs a single pass or iterates to convergence.
    passes: BalancePasses,
    /// Tolerance of the hand-tagged redistribution pass.
    tolerance: f64,
    /// Fold (numbered from 1) that hand-tagged documents are moved out of. If
    /// `None`, the fold holding the fewest hand-tagged documents is chosen.
    designated_fold: Option<usize>,
}

impl Default for DivisionConfig {
    fn default() -> Self {
        Self {
            n_folds: DEFAULT_FOLDS,
            partition: InitialPartition::default(),
            proportion_mode: ProportionMode::default(),
            passes: BalancePasses::default(),
            tolerance: DEFAULT_TOLERANCE,
            designated_fold: None,
        }
    }
}

impl DivisionConfig {
    pub fn n_folds(&self) -> usize {
        self.n_folds
    }
    pub fn partition(&self) -> InitialPartition {
        self.partition
    }
    pub fn proportion_mode(&self) -> ProportionMode {
        self.proportion_mode
    }
    pub fn passes(&self) -> BalancePasses {
        self.passes
    }
    pub fn tolerance(&self) -> f64 {
        self.tolerance
    }
    pub fn designated_fold(&self) -> Option<usize> {
        self.designated_fold
    }
}

impl Display for DivisionConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let string = format!("Number of folds: {}\n Initial partition: {:?}\n Proportion mode: {:?}\n Balancing passes: {:?}\n Redistribution tolerance: {}\n Designated fold: {:?}", self.n_folds, self.partition, self.proportion_mode, self.passes, self.tolerance, self.designated_fold);
        write!(f, "{}", string)
    }
}

/// This builder can be used to build and customize a `DivisionConfig` structure.
pub struct DivisionConfigBuilder {
    n_folds: usize,
    partition: InitialPartition,
    proportion_mode: ProportionMode,
    passes: BalancePasses,
    tolerance: f64,
    designated_fold: Option<usize>,
}

impl Default for DivisionConfigBuilder {
    fn default() -> Self {
        Self::new()
    }
}

impl DivisionConfigBuilder {
    pub fn new() -> Self {
        Self {
            n_folds: DEFAULT_FOLDS,
            partition: InitialPartition::default(),
            proportion_mode: ProportionMode::default(),
            passes: BalancePasses::default(),
            tolerance: DEFAULT_TOLERANCE,
            designated_fold: None,
        }
    }
    pub fn n_folds(mut self, n_folds: usize) -> Self {
        self.n_folds = n_folds;
        self
    }
    pub fn partition(mut self, partition: InitialPartition) -> Self {
        self.partition = partition;
        self
    }
    pub fn proportion_mode(mut self, proportion_mode: ProportionMode) -> Self {
        self.proportion_mode = proportion_mode;
        self
    }
    pub fn passes(mut self, passes: BalancePasses) -> Self {
        self.passes = passes;
        self
    }
    pub fn tolerance(mut self, tolerance: f64) -> Self {
        self.tolerance = tolerance;
        self
    }
    pub fn designated_fold(mut self, designated_fold: usize) -> Self {
        self.designated_fold = Some(designated_fold);
        self
    }
    pub fn build(self) -> DivisionConfig {
        DivisionConfig {
            n_folds: self.n_folds,
            partition: self.partition,
            proportion_mode: self.proportion_mode,
            passes: self.passes,
            tolerance: self.tolerance,
            designated_fold: self.designated_fold,
        }
    }
}

#[cfg(test)]
mod test {
    use super::*;
    use rstest::rstest;

    #[rstest]
    #[case(ProportionMode::InflatedDenominator)]
    #[case(ProportionMode::Exact)]
    fn test_builder_setters_proportion_mode(#[case] mode: ProportionMode) {
        let builder = DivisionConfigBuilder::default();
        let config = builder.proportion_mode(mode).build();
        assert_eq!(config.proportion_mode(), mode)
    }

    #[rstest]
    #[case(BalancePasses::Single)]
    #[case(BalancePasses::ToConvergence)]
    fn test_builder_setters_passes(#[case] passes: BalancePasses) {
        let builder = DivisionConfigBuilder::default();
        let config = builder.passes(passes).build();
        assert_eq!(config.passes(), passes)
    }

    #[rstest]
    #[case(InitialPartition::Contiguous)]
    #[case(InitialPartition::Random { seed: None })]
    #[case(InitialPartition::Random { seed: Some(42) })]
    fn test_builder_setters_partition(#[case] partition: InitialPartition) {
        let builder = DivisionConfigBuilder::default();
        let config = builder.partition(partition).build();
        assert_eq!(config.partition(), partition)
    }

    #[test]
    fn test_builder_setters_n_folds() {
        let config = DivisionConfigBuilder::default().n_folds(10).build();
        assert_eq!(config.n_folds(), 10)
    }

    #[test]
    fn test_builder_setters_designated_fold() {
        let config = DivisionConfigBuilder::default().designated_fold(3).build();
        assert_eq!(config.designated_fold(), Some(3))
    }

    #[test]
    fn test_default_replicates_reference() {
        let config = DivisionConfig::default();
        assert_eq!(config.n_folds(), 5);
        assert_eq!(config.partition(), InitialPartition::Contiguous);
        assert_eq!(
            config.proportion_mode(),
            ProportionMode::InflatedDenominator
        );
        assert_eq!(config.passes(), BalancePasses::Single);
        assert_eq!(config.tolerance(), DEFAULT_TOLERANCE);
        assert_eq!(config.designated_fold(), None);
    }
}
