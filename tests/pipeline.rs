use attack_insight_engine::arrow_handler::build_scored_batch;
use attack_insight_engine::config::FeatureConfig;
use attack_insight_engine::insight_core::FeatureBuilder;
use attack_insight_engine::{AnalysisError, Column, Dataset, Pipeline, PipelineConfig, Record};
use std::fs;

fn record(i: usize, attack: &str, protocol: &str) -> Record {
    Record {
        timestamp: Some(format!("2023-05-{:02} 06:33:58", i % 28 + 1)),
        source_ip: Some(format!("10.0.{}.{}", i / 250, i % 250)),
        destination_ip: Some("84.9.164.252".to_string()),
        source_port: Some(1024.0 + i as f64),
        destination_port: Some(if i % 2 == 0 { 80.0 } else { 443.0 }),
        protocol: Some(protocol.to_string()),
        packet_length: Some(64.0 + (i * 37 % 1400) as f64),
        packet_type: Some(if i % 2 == 0 { "Data" } else { "Control" }.to_string()),
        traffic_type: Some(["HTTP", "DNS", "FTP"][i % 3].to_string()),
        payload_data: Some(format!("payload {}", i)),
        malware_indicators: Some("IoC Detected".to_string()),
        anomaly_scores: Some((i * 13 % 100) as f64),
        attack_type: Some(attack.to_string()),
        attack_signature: Some("Known Pattern A".to_string()),
        action_taken: Some(["Logged", "Blocked", "Ignored"][i % 3].to_string()),
        severity_level: Some(["Low", "Medium", "High"][(i / 3) % 3].to_string()),
        user_information: Some(format!("user {}", i)),
        device_information: Some("Mozilla/5.0".to_string()),
        network_segment: Some(["Segment A", "Segment B"][i % 2].to_string()),
        geo_location: Some("Pune, Maharashtra".to_string()),
        proxy_information: Some("150.9.97.135".to_string()),
        firewall_logs: Some("Log Data".to_string()),
        ids_ips_alerts: Some("Alert Data".to_string()),
        alerts_warnings: Some("Alert Triggered".to_string()),
        log_source: Some(["Server", "Firewall"][i % 2].to_string()),
    }
}

fn to_csv(records: &[Record]) -> String {
    let mut writer = csv::Writer::from_writer(Vec::new());
    for r in records {
        writer.serialize(r).unwrap();
    }
    String::from_utf8(writer.into_inner().unwrap()).unwrap()
}

/// Ten rows: three miss a column no feature uses, the rest hold 3 DoS, 2 Malware, 2 Intrusion
fn ten_row_csv() -> String {
    let mut records = vec![
        record(0, "DoS", "TCP"),
        record(1, "Malware", "UDP"),
        record(2, "DoS", "TCP"),
        record(3, "Intrusion", "ICMP"),
        record(4, "DoS", "UDP"),
        record(5, "Malware", "TCP"),
        record(6, "Intrusion", "ICMP"),
        record(7, "Malware", "UDP"),
        record(8, "DoS", "TCP"),
        record(9, "Intrusion", "TCP"),
    ];
    records[7].payload_data = None;
    records[8].payload_data = None;
    records[9].payload_data = None;
    to_csv(&records)
}

fn synthetic_records(n: usize) -> Vec<Record> {
    (0..n)
        .map(|i| match i % 3 {
            0 => record(i, "DoS", "TCP"),
            1 => record(i, "Malware", "UDP"),
            _ => record(i, "Intrusion", "ICMP"),
        })
        .collect()
}

#[test]
fn ten_row_scenario_cleans_and_encodes() {
    let dataset = Dataset::from_csv("ten".to_string(), &ten_row_csv()).unwrap();
    assert_eq!(dataset.len(), 10);

    let (cleaned, summary) = dataset.drop_missing();
    assert_eq!(cleaned.len(), 7);
    assert_eq!(summary.missing_by_column, vec![(Column::PayloadData, 3)]);

    let config = FeatureConfig::default();
    let encoded = FeatureBuilder::new(&config).build(&cleaned).unwrap();
    assert_eq!(encoded.features.nrows(), 7);
    assert_eq!(encoded.labels.len(), 7);
    assert_eq!(encoded.encoder.n_classes(), 3);

    let count = |class: &str| {
        let code = encoded.encoder.code(class).unwrap();
        encoded.labels.iter().filter(|&&c| c == code).count()
    };
    assert_eq!(count("DoS"), 3);
    assert_eq!(count("Malware"), 2);
    assert_eq!(count("Intrusion"), 2);

    // every label decodes back to the Attack Type of its row
    for (row, &code) in cleaned.data.iter().zip(encoded.labels.iter()) {
        assert_eq!(
            encoded.encoder.decode(code),
            row.get_text(Column::AttackType)
        );
    }
}

#[test]
fn indicator_groups_are_one_hot() {
    let dataset = Dataset::from_csv("ten".to_string(), &ten_row_csv()).unwrap();
    let (cleaned, _) = dataset.drop_missing();
    let config = FeatureConfig::default();
    let encoded = FeatureBuilder::new(&config).build(&cleaned).unwrap();

    let protocol = encoded.features.group(Column::Protocol).unwrap();
    assert_eq!(protocol.len(), 3);
    for group in encoded.features.groups() {
        for row in encoded.features.values().rows() {
            let hot: f64 = group.range().map(|i| row[i]).sum();
            assert_eq!(hot, 1.0, "group {}", group.column);
        }
    }

    // free text never becomes a feature
    assert!(encoded
        .features
        .names()
        .iter()
        .all(|n| !n.starts_with("Payload Data") && !n.starts_with("Attack Type")));
}

#[test]
fn loading_cleaning_and_encoding_is_repeatable() {
    let csv_text = to_csv(&synthetic_records(40));
    let config = FeatureConfig::default();

    let build = || {
        let dataset = Dataset::from_csv("repeat".to_string(), &csv_text).unwrap();
        let (cleaned, _) = dataset.drop_missing();
        FeatureBuilder::new(&config).build(&cleaned).unwrap()
    };
    let first = build();
    let second = build();

    assert_eq!(first.features.names(), second.features.names());
    assert_eq!(first.labels, second.labels);
    let bits = |e: &attack_insight_engine::insight_core::EncodedDataset| -> Vec<u64> {
        e.features.values().iter().map(|v| v.to_bits()).collect()
    };
    assert_eq!(bits(&first), bits(&second));
}

#[test]
fn end_to_end_from_file_with_export() {
    let dir = tempfile::tempdir().unwrap();
    let csv_path = dir.path().join("events.csv");
    let mut records = synthetic_records(300);
    records[10].geo_location = None;
    records[20].proxy_information = None;
    fs::write(&csv_path, to_csv(&records)).unwrap();

    let pipeline = Pipeline::new(PipelineConfig::new().with_contamination(0.05)).unwrap();
    let report = pipeline.run_path(&csv_path).unwrap();

    assert_eq!(report.cleaning.rows_before, 300);
    assert_eq!(report.cleaning.rows_after, 298);
    assert_eq!(report.classes.len(), 3);

    let confusion = &report.report.confusion;
    assert_eq!(confusion.counts.len(), confusion.size());
    assert!(confusion.counts.iter().all(|row| row.len() == confusion.size()));
    for (row, metrics) in confusion.counts.iter().zip(&report.report.per_class) {
        assert_eq!(row.iter().sum::<usize>(), metrics.support);
    }
    assert_eq!(confusion.total(), 60);

    assert_eq!(report.scored.nrows(), 298);
    assert!(report.outlier_count <= 298 / 10);

    let batch = build_scored_batch(&report.scored).unwrap();
    assert_eq!(batch.num_rows(), 298);
    assert_eq!(batch.num_columns(), report.feature_count + 3);

    let export_path = dir.path().join("scored.arrow");
    attack_insight_engine::arrow_handler::write_scored_ipc(&export_path, &report.scored).unwrap();
    assert!(fs::metadata(&export_path).unwrap().len() > 0);
}

#[test]
fn not_a_number_cells_are_dropped_before_scoring() {
    let mut records = synthetic_records(60);
    records[5].packet_length = Some(1234.5);
    records[6].anomaly_scores = Some(4321.5);
    let csv = to_csv(&records)
        .replace(",1234.5,", ",NaN,")
        .replace(",4321.5,", ",inf,");

    let dataset = Dataset::from_csv("nan".to_string(), &csv).unwrap();
    let pipeline = Pipeline::new(PipelineConfig::new()).unwrap();
    let report = pipeline.run_dataset(dataset).unwrap();

    assert_eq!(report.cleaning.rows_before, 60);
    assert_eq!(report.cleaning.rows_after, 58);
    assert_eq!(report.scored.nrows(), 58);
    assert!(report.scored.scores.iter().all(|s| s.is_finite()));
}

#[test]
fn missing_file_is_input_error() {
    let dir = tempfile::tempdir().unwrap();
    let pipeline = Pipeline::new(PipelineConfig::new()).unwrap();
    let err = pipeline.run_path(&dir.path().join("absent.csv")).unwrap_err();
    assert!(matches!(err, AnalysisError::InputError(_)));
}

#[test]
fn config_from_json_overrides_defaults() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("config.json");
    fs::write(
        &path,
        r#"{"split": {"test_ratio": 0.25, "seed": 7}, "forest": {"n_trees": 20}}"#,
    )
    .unwrap();

    let config = PipelineConfig::from_path(&path).unwrap();
    assert_eq!(config.split.test_ratio, 0.25);
    assert_eq!(config.split.seed, 7);
    assert_eq!(config.forest.n_trees, 20);
    assert_eq!(config.forest.max_samples, 256);
    assert_eq!(config.top_features, 10);
}
