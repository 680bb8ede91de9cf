/// Human-readable throughput, e.g. `1.5 MB/s`. Negative after a counter reset.
pub fn format_rate(bytes_per_sec: f64) -> String {
    const KB: f64 = 1024.0;
    const MB: f64 = 1024.0 * 1024.0;
    const GB: f64 = 1024.0 * 1024.0 * 1024.0;

    if !bytes_per_sec.is_finite() {
        return "n/a".to_string();
    }
    let sign = if bytes_per_sec < 0.0 { "-" } else { "" };
    let bytes = bytes_per_sec.abs();

    if bytes >= GB {
        format!("{sign}{:.1} GB/s", bytes / GB)
    } else if bytes >= MB {
        format!("{sign}{:.1} MB/s", bytes / MB)
    } else if bytes >= KB {
        format!("{sign}{:.0} KB/s", bytes / KB)
    } else {
        format!("{sign}{bytes:.0} B/s")
    }
}
