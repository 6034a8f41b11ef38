//! Signal dynamics: reinforcement on access and per-strand multiplicative
//! decay.

use crate::config::{DecayConfig, ReinforcementConfig};
use crate::model::{Engram, Strand, Synapse};

/// `signal <- min(signal + boost, 1.0)`.
pub fn reinforce_engram(engram: &mut Engram, config: ReinforcementConfig) {
    engram.set_signal((engram.signal + config.engram_boost).min(1.0));
}

/// Same saturating boost, applied to a synapse's weight.
pub fn reinforce_synapse(synapse: &mut Synapse, config: ReinforcementConfig) {
    synapse.reinforce(config.synapse_boost);
}

/// One decay cycle for a single strand-rate pair: `signal <-
/// max(signal * rate, min_signal)`, applied only when `signal > min_signal`
/// (idempotent once the floor is reached — re-applying never lowers it
/// further, so a cycle racing with concurrent ingestion stays safe).
pub fn decay_signal(signal: f32, rate: f32, min_signal: f32) -> f32 {
    if signal > min_signal {
        (signal * rate).max(min_signal)
    } else {
        signal
    }
}

/// Applies one decay cycle to every engram of a given strand.
pub fn decay_strand(engrams: &mut [Engram], strand: Strand, config: DecayConfig) -> usize {
    let rate = config.rate_for(strand);
    let mut affected = 0;
    for e in engrams.iter_mut().filter(|e| e.strand == strand) {
        let before = e.signal;
        let after = decay_signal(before, rate, config.min_signal);
        if after != before {
            e.set_signal(after);
            affected += 1;
        }
    }
    affected
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    #[test]
    fn reinforcement_clamps_at_one() {
        let mut e = Engram::new("o", "c", "h", Strand::General, vec![], HashMap::new(), vec![], 0.5, 0.1);
        reinforce_engram(&mut e, ReinforcementConfig { engram_boost: 0.6, synapse_boost: 0.05 });
        assert_eq!(e.signal, 1.0);
    }

    #[test]
    fn decay_with_rate_one_is_noop() {
        assert_eq!(decay_signal(0.5, 1.0, 0.01), 0.5);
    }

    #[test]
    fn decay_below_rate_one_strictly_decreases() {
        let s1 = decay_signal(0.1, 0.9, 0.01);
        assert!((s1 - 0.09).abs() < 1e-6);
        let s2 = decay_signal(s1, 0.9, 0.01);
        assert!((s2 - 0.081).abs() < 1e-6);
    }

    #[test]
    fn decay_floors_at_min_signal() {
        let mut signal = 0.02;
        for _ in 0..200 {
            signal = decay_signal(signal, 0.5, 0.01);
        }
        assert_eq!(signal, 0.01);
        // idempotent once floored
        assert_eq!(decay_signal(signal, 0.5, 0.01), 0.01);
    }

    #[test]
    fn decay_strand_only_touches_matching_strand() {
        let mut engrams = vec![
            Engram::new("o", "a", "ha", Strand::Factual, vec![], HashMap::new(), vec![], 0.5, 0.1),
            Engram::new("o", "b", "hb", Strand::Procedural, vec![], HashMap::new(), vec![], 0.5, 0.1),
        ];
        let config = DecayConfig::default();
        decay_strand(&mut engrams, Strand::Factual, config);
        assert!(engrams[0].signal < 0.5);
        assert_eq!(engrams[1].signal, 0.5);
    }
}
