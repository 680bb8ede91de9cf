use pcmon::metrics::{Activity, Baseline, Calibration, MetricsRecord, compute};
use pcmon::system::snapshot::{DiskCounters, GpuReading, NetworkCounters, Snapshot};
use proptest::prelude::*;

fn mock_snapshot(tx: u64, rx: u64, read: u64, written: u64) -> Snapshot {
    Snapshot {
        cpu_usage_percent: 42.0,
        cpu_temperature: Some(55.0),
        memory_used: 6_700,
        memory_total: 10_000,
        gpus: vec![GpuReading {
            utilization_percent: Some(10.0),
            temperature: Some(40.0),
            memory_utilization_percent: Some(5.0),
        }],
        network: NetworkCounters {
            interface: "eth0".to_string(),
            rx_bytes: rx,
            tx_bytes: tx,
        },
        disk: DiskCounters {
            read_bytes: read,
            written_bytes: written,
        },
    }
}

fn baseline(tx: u64, rx: u64, disk: u64, t: u64) -> Baseline {
    Baseline {
        rx_bytes: rx,
        tx_bytes: tx,
        disk_io_bytes: disk,
        timestamp_ms: t,
        last_activity: Activity::default(),
    }
}

#[test]
fn reference_scenario_matches_hand_computation() {
    let snap = mock_snapshot(5120, 10240, 2_097_152, 0);
    let (record, _) = compute(&snap, &baseline(0, 0, 0, 0), 1000, &Calibration::default());
    assert_eq!(
        record,
        MetricsRecord {
            cpu: 42,
            cput: 55,
            mem: 67,
            gpu: 10,
            gput: 40,
            gpum: 5,
            netu: 1,
            netd: 1,
            disk: 4,
        }
    );
}

#[test]
fn missing_cpu_temperature_reads_zero() {
    let mut snap = mock_snapshot(0, 0, 0, 0);
    snap.cpu_temperature = None;
    let (record, _) = compute(&snap, &baseline(0, 0, 0, 0), 1000, &Calibration::default());
    assert_eq!(record.cput, 0);
}

#[test]
fn no_graphics_controller_reads_zero() {
    let mut snap = mock_snapshot(0, 0, 0, 0);
    snap.gpus.clear();
    let (record, _) = compute(&snap, &baseline(0, 0, 0, 0), 1000, &Calibration::default());
    assert_eq!((record.gpu, record.gput, record.gpum), (0, 0, 0));
}

#[test]
fn saturating_traffic_caps_at_one_hundred() {
    let snap = mock_snapshot(1 << 40, 1 << 40, 1 << 40, 1 << 40);
    let (record, _) = compute(&snap, &baseline(0, 0, 0, 0), 1000, &Calibration::default());
    assert_eq!((record.netu, record.netd, record.disk), (100, 100, 100));
}

proptest! {
    #[test]
    fn outputs_stay_in_range(
        tx in 0u64..1 << 48,
        rx in 0u64..1 << 48,
        read in 0u64..1 << 48,
        written in 0u64..1 << 48,
        base_tx in 0u64..1 << 48,
        base_rx in 0u64..1 << 48,
        base_disk in 0u64..1 << 49,
        elapsed_ms in 1u64..120_000,
        cpu in 0.0f32..=100.0,
        used_frac in 0.0f64..=1.0,
        total in 1u64..1 << 40,
    ) {
        let mut snap = mock_snapshot(tx, rx, read, written);
        snap.cpu_usage_percent = cpu;
        snap.memory_total = total;
        snap.memory_used = (total as f64 * used_frac) as u64;
        let base = baseline(base_tx, base_rx, base_disk, 1_000);

        let (record, next) = compute(&snap, &base, 1_000 + elapsed_ms, &Calibration::default());

        prop_assert!(record.netu <= 100);
        prop_assert!(record.netd <= 100);
        prop_assert!(record.disk <= 100);
        prop_assert!(record.mem <= 100);
        prop_assert!(record.cpu <= 100);
        prop_assert_eq!(next.timestamp_ms, 1_000 + elapsed_ms);
        prop_assert_eq!(next.disk_io_bytes, read + written);
    }

    #[test]
    fn counter_resets_never_go_negative(
        drop_tx in 1u64..1 << 40,
        drop_rx in 1u64..1 << 40,
        drop_disk in 1u64..1 << 40,
        elapsed_ms in 1u64..10_000,
    ) {
        let base = baseline(drop_tx, drop_rx, drop_disk, 0);
        let snap = mock_snapshot(0, 0, 0, 0);
        let (record, _) = compute(&snap, &base, elapsed_ms, &Calibration::default());
        prop_assert_eq!((record.netu, record.netd, record.disk), (0, 0, 0));
    }

    #[test]
    fn unchanged_counters_read_idle(
        tx in 0u64..1 << 48,
        rx in 0u64..1 << 48,
        read in 0u64..1 << 47,
        written in 0u64..1 << 47,
        first_gap in 1u64..10_000,
        second_gap in 1u64..10_000,
    ) {
        let snap = mock_snapshot(tx, rx, read, written);
        let cal = Calibration::default();
        let (_, after_first) = compute(&snap, &baseline(0, 0, 0, 0), first_gap, &cal);
        let (second, _) = compute(&snap, &after_first, first_gap + second_gap, &cal);
        prop_assert_eq!((second.netu, second.netd, second.disk), (0, 0, 0));
    }
}
