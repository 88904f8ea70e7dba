// Copyright (c) 2026 Gamehost Contributors
// SPDX-License-Identifier: AGPL-3.0

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::domain::runtime::RawContainerStats;

const BYTES_PER_MB: f64 = 1024.0 * 1024.0;

/// Normalized resource sample derived from one runtime poll. Never cached.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StatsSnapshot {
    pub timestamp: DateTime<Utc>,
    pub cpu_percent: f64,
    pub memory_used_bytes: u64,
    pub memory_limit_bytes: u64,
    pub memory_percent: f64,
    pub network_rx_bytes: u64,
    pub network_tx_bytes: u64,
}

impl StatsSnapshot {
    pub fn from_raw(raw: &RawContainerStats, timestamp: DateTime<Utc>) -> Self {
        let (network_rx_bytes, network_tx_bytes) = raw
            .networks
            .iter()
            .fold((0u64, 0u64), |(rx, tx), iface| {
                (rx.saturating_add(iface.rx_bytes), tx.saturating_add(iface.tx_bytes))
            });

        Self {
            timestamp,
            cpu_percent: cpu_percent(raw),
            memory_used_bytes: raw.memory_usage,
            memory_limit_bytes: raw.memory_limit,
            memory_percent: ratio_percent(raw.memory_usage as f64, raw.memory_limit as f64),
            network_rx_bytes,
            network_tx_bytes,
        }
    }

    pub fn memory_used_mb(&self) -> f64 {
        self.memory_used_bytes as f64 / BYTES_PER_MB
    }

    pub fn memory_limit_mb(&self) -> f64 {
        self.memory_limit_bytes as f64 / BYTES_PER_MB
    }

    pub fn network_rx_mb(&self) -> f64 {
        self.network_rx_bytes as f64 / BYTES_PER_MB
    }

    pub fn network_tx_mb(&self) -> f64 {
        self.network_tx_bytes as f64 / BYTES_PER_MB
    }
}

/// Container CPU delta over system CPU delta, scaled by core count.
fn cpu_percent(raw: &RawContainerStats) -> f64 {
    let cpu_delta = raw.cpu_total_usage.saturating_sub(raw.precpu_total_usage) as f64;
    let system_delta = raw.system_cpu_usage.saturating_sub(raw.presystem_cpu_usage) as f64;
    let cores = raw.online_cpus.max(1) as f64;
    ratio_percent(cpu_delta, system_delta) * cores
}

fn ratio_percent(part: f64, whole: f64) -> f64 {
    if whole <= 0.0 {
        0.0
    } else {
        part / whole * 100.0
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::runtime::InterfaceCounters;

    fn raw() -> RawContainerStats {
        RawContainerStats {
            cpu_total_usage: 3_000,
            precpu_total_usage: 1_000,
            system_cpu_usage: 20_000,
            presystem_cpu_usage: 10_000,
            online_cpus: 4,
            memory_usage: 256 * 1024 * 1024,
            memory_limit: 1024 * 1024 * 1024,
            networks: vec![
                InterfaceCounters { name: "eth0".into(), rx_bytes: 100, tx_bytes: 40 },
                InterfaceCounters { name: "eth1".into(), rx_bytes: 50, tx_bytes: 10 },
            ],
        }
    }

    #[test]
    fn test_cpu_percent_is_rate_scaled_by_cores() {
        let snapshot = StatsSnapshot::from_raw(&raw(), Utc::now());
        // (2000 / 10000) * 4 * 100
        assert!((snapshot.cpu_percent - 80.0).abs() < 1e-9);
    }

    #[test]
    fn test_memory_and_network_totals() {
        let snapshot = StatsSnapshot::from_raw(&raw(), Utc::now());
        assert!((snapshot.memory_percent - 25.0).abs() < 1e-9);
        assert!((snapshot.memory_used_mb() - 256.0).abs() < 1e-9);
        assert_eq!(snapshot.network_rx_bytes, 150);
        assert_eq!(snapshot.network_tx_bytes, 50);
    }

    #[test]
    fn test_zero_deltas_do_not_divide_by_zero() {
        let snapshot = StatsSnapshot::from_raw(&RawContainerStats::default(), Utc::now());
        assert_eq!(snapshot.cpu_percent, 0.0);
        assert_eq!(snapshot.memory_percent, 0.0);
        assert_eq!(snapshot.network_rx_bytes, 0);
    }
}
