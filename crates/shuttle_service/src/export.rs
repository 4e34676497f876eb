//! Report export: pretty JSON and a flat per-trip CSV.

use std::fs::File;
use std::io::Write;
use std::path::Path;

use crate::error::ServiceError;
use crate::report::SnapshotReport;

pub const CSV_HEADER: [&str; 11] = [
    "trip_code",
    "health_tier",
    "health_message",
    "last_update",
    "center_lat",
    "center_lng",
    "strength",
    "rider_count",
    "total_riders",
    "computed_at",
    "rider_ids",
];

pub fn write_report_json<W: Write>(mut writer: W, report: &SnapshotReport) -> Result<(), ServiceError> {
    serde_json::to_writer_pretty(&mut writer, report)?;
    writeln!(writer)?;
    Ok(())
}

/// One row per registered trip; cluster columns are empty when the trip has no cluster.
pub fn write_report_csv<W: Write>(writer: W, report: &SnapshotReport) -> Result<(), ServiceError> {
    let mut wtr = csv::Writer::from_writer(writer);
    wtr.write_record(CSV_HEADER)?;

    for (trip_code, status) in &report.health {
        let last_update = status
            .last_update
            .map(|at| at.to_rfc3339())
            .unwrap_or_default();
        let cluster_columns = match report.clusters.get(trip_code) {
            Some(cluster) => [
                cluster.center.lat.to_string(),
                cluster.center.lng.to_string(),
                format!("{:.4}", cluster.strength),
                cluster.rider_count.to_string(),
                cluster.total_riders.to_string(),
                cluster.computed_at.to_rfc3339(),
                cluster.rider_ids.join(";"),
            ],
            None => Default::default(),
        };

        let mut record = vec![
            trip_code.clone(),
            status.tier.as_str().to_string(),
            status.message.clone(),
            last_update,
        ];
        record.extend(cluster_columns);
        wtr.write_record(&record)?;
    }

    wtr.flush()?;
    Ok(())
}

pub fn export_report_csv(path: &Path, report: &SnapshotReport) -> Result<(), ServiceError> {
    let file = File::create(path).map_err(|error| {
        ServiceError::Export(format!("failed to create '{}': {error}", path.display()))
    })?;
    write_report_csv(file, report)?;
    tracing::info!(path = %path.display(), rows = report.health.len(), "wrote report csv");
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::EngineConfig;
    use shuttle_core::test_helpers::{fixed_now, ping_secs_ago, trip};
    use shuttle_store::Snapshot;

    fn sample_report() -> SnapshotReport {
        let snapshot = Snapshot {
            trips: vec![trip("T1"), trip("T2")],
            pings: vec![
                ping_secs_ago("T1", "R1", 6.5244, 3.3792, 30),
                ping_secs_ago("T1", "R2", 6.5246, 3.3794, 60),
            ],
        };
        SnapshotReport::from_snapshot(&snapshot, &EngineConfig::default(), fixed_now())
    }

    #[test]
    fn csv_has_a_row_per_trip() {
        let mut buffer = Vec::new();
        write_report_csv(&mut buffer, &sample_report()).expect("csv");
        let text = String::from_utf8(buffer).expect("utf8");
        let lines: Vec<&str> = text.lines().collect();

        assert_eq!(lines.len(), 3);
        assert_eq!(lines[0], CSV_HEADER.join(","));
        assert!(lines[1].starts_with("T1,ACTIVE,Live,"));
        assert!(lines[1].ends_with(",1.0000,2,2,2024-05-01T08:30:00+00:00,R1;R2"));
        assert_eq!(lines[2], "T2,NO_SIGNAL,No signal yet,,,,,,,,");
    }

    #[test]
    fn json_export_is_parseable() {
        let mut buffer = Vec::new();
        write_report_json(&mut buffer, &sample_report()).expect("json");
        let value: serde_json::Value = serde_json::from_slice(&buffer).expect("parse");
        assert_eq!(value["health"]["T1"]["tier"], "ACTIVE");
        assert_eq!(value["clusters"]["T1"]["riderCount"], 2);
    }
}
