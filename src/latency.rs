// src/latency.rs
// Latency models defining how long messages take to travel between agents
// and how much compute time the exchange needs once a message arrives.

use rand::{Rng, SeedableRng};
use rand_chacha::ChaCha8Rng;
use std::sync::Mutex;

use crate::messages::AgentId;

/// Produces network and compute delays. A pure function of agent ids plus
/// whatever internal PRNG state the model owns — never the kernel's clock
/// or any other shared state.
pub trait LatencyModel: Send + Sync {
    /// Network delay for a message travelling from `from` to `to`.
    fn delay_ns(&self, from: AgentId, to: AgentId) -> u64;

    /// Extra processing delay charged when `agent_id` is the receiver.
    fn compute_ns(&self, _agent_id: AgentId) -> u64 {
        0
    }
}

/// Fixed network and compute delay for every message, regardless of sender
/// or recipient. Useful for tests and trivial scenarios.
pub struct FixedLatency {
    network_delay_ns: u64,
    compute_delay_ns: u64,
}

impl FixedLatency {
    pub fn new(network_delay_ns: u64, compute_delay_ns: u64) -> Self {
        Self { network_delay_ns, compute_delay_ns }
    }
}

impl LatencyModel for FixedLatency {
    fn delay_ns(&self, _from: AgentId, _to: AgentId) -> u64 {
        self.network_delay_ns
    }

    fn compute_ns(&self, _agent_id: AgentId) -> u64 {
        self.compute_delay_ns
    }
}

/// Two-stage RPC model: uplink (agent -> exchange), compute (at the
/// exchange), downlink (exchange -> agent), with optional symmetric uniform
/// jitter on the downlink. This is the model spec.md §4.2/§6 describes as
/// the concrete default.
pub struct TwoStageRpcLatency {
    exchange_id: AgentId,
    rpc_up_ns: u64,
    rpc_down_ns: u64,
    compute_ns: u64,
    down_jitter_ns: i64,
    rng: Mutex<ChaCha8Rng>,
}

impl TwoStageRpcLatency {
    pub fn new(
        exchange_id: AgentId,
        rpc_up_ns: u64,
        rpc_down_ns: u64,
        compute_ns: u64,
        down_jitter_ns: u64,
        seed: u64,
    ) -> Self {
        Self {
            exchange_id,
            rpc_up_ns,
            rpc_down_ns,
            compute_ns,
            down_jitter_ns: down_jitter_ns as i64,
            rng: Mutex::new(ChaCha8Rng::seed_from_u64(seed)),
        }
    }

    fn jitter_ns(&self) -> i64 {
        if self.down_jitter_ns == 0 {
            return 0;
        }
        let mut rng = self.rng.lock().expect("latency PRNG poisoned");
        rng.gen_range(-self.down_jitter_ns..=self.down_jitter_ns)
    }
}

impl LatencyModel for TwoStageRpcLatency {
    fn delay_ns(&self, from: AgentId, to: AgentId) -> u64 {
        if to == self.exchange_id && from != self.exchange_id {
            self.rpc_up_ns
        } else if from == self.exchange_id && to != self.exchange_id {
            let jitter = self.jitter_ns();
            (self.rpc_down_ns as i64 + jitter).max(0) as u64
        } else {
            0
        }
    }

    fn compute_ns(&self, agent_id: AgentId) -> u64 {
        if agent_id == self.exchange_id {
            self.compute_ns
        } else {
            0
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn two_stage_layers_up_compute_down() {
        let model = TwoStageRpcLatency::new(1, 200_000_000, 200_000_000, 300_000_000, 0, 7);
        // agent (not exchange) -> exchange: uplink only on delay_ns, compute separately.
        assert_eq!(model.delay_ns(2, 1), 200_000_000);
        assert_eq!(model.compute_ns(1), 300_000_000);
        // exchange -> agent: downlink only, no compute.
        assert_eq!(model.delay_ns(1, 2), 200_000_000);
        assert_eq!(model.compute_ns(2), 0);
        // agent -> agent (no exchange involved): zero.
        assert_eq!(model.delay_ns(2, 3), 0);
    }

    #[test]
    fn jitter_stays_within_bound() {
        let model = TwoStageRpcLatency::new(1, 0, 1_000_000, 0, 500_000, 42);
        for _ in 0..200 {
            let d = model.delay_ns(1, 2);
            assert!((500_000..=1_500_000).contains(&d), "delay {d} out of jitter bound");
        }
    }

    #[test]
    fn fixed_latency_ignores_direction() {
        let model = FixedLatency::new(10, 5);
        assert_eq!(model.delay_ns(1, 2), 10);
        assert_eq!(model.delay_ns(2, 1), 10);
        assert_eq!(model.compute_ns(1), 5);
    }
}
