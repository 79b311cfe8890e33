use serde::de::Error as _;
use serde::{Deserialize, Deserializer, Serialize};
use std::fmt;
use std::fs::File;
use std::io::Read;
use std::path::Path;
use std::str::FromStr;
use tracing::{debug, info};

use crate::utils::AnalysisError;

/// The 25 attributes of a network-event record, in file order
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum Column {
    #[serde(rename = "Timestamp")]
    Timestamp,
    #[serde(rename = "Source IP Address")]
    SourceIp,
    #[serde(rename = "Destination IP Address")]
    DestinationIp,
    #[serde(rename = "Source Port")]
    SourcePort,
    #[serde(rename = "Destination Port")]
    DestinationPort,
    #[serde(rename = "Protocol")]
    Protocol,
    #[serde(rename = "Packet Length")]
    PacketLength,
    #[serde(rename = "Packet Type")]
    PacketType,
    #[serde(rename = "Traffic Type")]
    TrafficType,
    #[serde(rename = "Payload Data")]
    PayloadData,
    #[serde(rename = "Malware Indicators")]
    MalwareIndicators,
    #[serde(rename = "Anomaly Scores")]
    AnomalyScores,
    #[serde(rename = "Attack Type")]
    AttackType,
    #[serde(rename = "Attack Signature")]
    AttackSignature,
    #[serde(rename = "Action Taken")]
    ActionTaken,
    #[serde(rename = "Severity Level")]
    SeverityLevel,
    #[serde(rename = "User Information")]
    UserInformation,
    #[serde(rename = "Device Information")]
    DeviceInformation,
    #[serde(rename = "Network Segment")]
    NetworkSegment,
    #[serde(rename = "Geo-location Data")]
    GeoLocation,
    #[serde(rename = "Proxy Information")]
    ProxyInformation,
    #[serde(rename = "Firewall Logs")]
    FirewallLogs,
    #[serde(rename = "IDS/IPS Alerts")]
    IdsIpsAlerts,
    #[serde(rename = "Alerts/Warnings")]
    AlertsWarnings,
    #[serde(rename = "Log Source")]
    LogSource,
}

/// Primitive type of a column's cells
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ColumnKind {
    Text,
    Number,
}

impl Column {
    pub const ALL: [Column; 25] = [
        Column::Timestamp,
        Column::SourceIp,
        Column::DestinationIp,
        Column::SourcePort,
        Column::DestinationPort,
        Column::Protocol,
        Column::PacketLength,
        Column::PacketType,
        Column::TrafficType,
        Column::PayloadData,
        Column::MalwareIndicators,
        Column::AnomalyScores,
        Column::AttackType,
        Column::AttackSignature,
        Column::ActionTaken,
        Column::SeverityLevel,
        Column::UserInformation,
        Column::DeviceInformation,
        Column::NetworkSegment,
        Column::GeoLocation,
        Column::ProxyInformation,
        Column::FirewallLogs,
        Column::IdsIpsAlerts,
        Column::AlertsWarnings,
        Column::LogSource,
    ];

    /// Header text as it appears in the CSV file
    pub fn header(self) -> &'static str {
        match self {
            Column::Timestamp => "Timestamp",
            Column::SourceIp => "Source IP Address",
            Column::DestinationIp => "Destination IP Address",
            Column::SourcePort => "Source Port",
            Column::DestinationPort => "Destination Port",
            Column::Protocol => "Protocol",
            Column::PacketLength => "Packet Length",
            Column::PacketType => "Packet Type",
            Column::TrafficType => "Traffic Type",
            Column::PayloadData => "Payload Data",
            Column::MalwareIndicators => "Malware Indicators",
            Column::AnomalyScores => "Anomaly Scores",
            Column::AttackType => "Attack Type",
            Column::AttackSignature => "Attack Signature",
            Column::ActionTaken => "Action Taken",
            Column::SeverityLevel => "Severity Level",
            Column::UserInformation => "User Information",
            Column::DeviceInformation => "Device Information",
            Column::NetworkSegment => "Network Segment",
            Column::GeoLocation => "Geo-location Data",
            Column::ProxyInformation => "Proxy Information",
            Column::FirewallLogs => "Firewall Logs",
            Column::IdsIpsAlerts => "IDS/IPS Alerts",
            Column::AlertsWarnings => "Alerts/Warnings",
            Column::LogSource => "Log Source",
        }
    }

    pub fn kind(self) -> ColumnKind {
        match self {
            Column::SourcePort
            | Column::DestinationPort
            | Column::PacketLength
            | Column::AnomalyScores => ColumnKind::Number,
            _ => ColumnKind::Text,
        }
    }

    /// Look up a column by its CSV header text
    pub fn from_header(header: &str) -> Option<Column> {
        Column::ALL.iter().copied().find(|c| c.header() == header)
    }
}

impl fmt::Display for Column {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.header())
    }
}

impl FromStr for Column {
    type Err = AnalysisError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Column::from_header(s.trim()).ok_or_else(|| {
            AnalysisError::ValidationError(format!("unknown column '{}'", s))
        })
    }
}

/// A typed view of one cell
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Value<'a> {
    Text(&'a str),
    Number(f64),
}

/// Cell spellings read as missing in numeric columns
const MISSING_MARKERS: [&str; 19] = [
    "", "#N/A", "#N/A N/A", "#NA", "-1.#IND", "-1.#QNAN", "-NaN", "-nan", "1.#IND", "1.#QNAN",
    "<NA>", "N/A", "NA", "NULL", "NaN", "None", "n/a", "nan", "null",
];

/// Numeric cell reader: missing markers and non-finite values load as `None`
fn finite_or_missing<'de, D>(deserializer: D) -> Result<Option<f64>, D::Error>
where
    D: Deserializer<'de>,
{
    let Some(raw) = Option::<String>::deserialize(deserializer)? else {
        return Ok(None);
    };
    let raw = raw.trim();
    if MISSING_MARKERS.contains(&raw) {
        return Ok(None);
    }
    let value: f64 = raw
        .parse()
        .map_err(|_| D::Error::custom(format!("'{}' is not a number", raw)))?;
    Ok(value.is_finite().then_some(value))
}

/// One network-event observation
///
/// Every attribute is optional so an empty cell survives loading and can be
/// dropped by the cleaner.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Record {
    #[serde(rename = "Timestamp")]
    pub timestamp: Option<String>,
    #[serde(rename = "Source IP Address")]
    pub source_ip: Option<String>,
    #[serde(rename = "Destination IP Address")]
    pub destination_ip: Option<String>,
    #[serde(rename = "Source Port", deserialize_with = "finite_or_missing")]
    pub source_port: Option<f64>,
    #[serde(rename = "Destination Port", deserialize_with = "finite_or_missing")]
    pub destination_port: Option<f64>,
    #[serde(rename = "Protocol")]
    pub protocol: Option<String>,
    #[serde(rename = "Packet Length", deserialize_with = "finite_or_missing")]
    pub packet_length: Option<f64>,
    #[serde(rename = "Packet Type")]
    pub packet_type: Option<String>,
    #[serde(rename = "Traffic Type")]
    pub traffic_type: Option<String>,
    #[serde(rename = "Payload Data")]
    pub payload_data: Option<String>,
    #[serde(rename = "Malware Indicators")]
    pub malware_indicators: Option<String>,
    #[serde(rename = "Anomaly Scores", deserialize_with = "finite_or_missing")]
    pub anomaly_scores: Option<f64>,
    #[serde(rename = "Attack Type")]
    pub attack_type: Option<String>,
    #[serde(rename = "Attack Signature")]
    pub attack_signature: Option<String>,
    #[serde(rename = "Action Taken")]
    pub action_taken: Option<String>,
    #[serde(rename = "Severity Level")]
    pub severity_level: Option<String>,
    #[serde(rename = "User Information")]
    pub user_information: Option<String>,
    #[serde(rename = "Device Information")]
    pub device_information: Option<String>,
    #[serde(rename = "Network Segment")]
    pub network_segment: Option<String>,
    #[serde(rename = "Geo-location Data")]
    pub geo_location: Option<String>,
    #[serde(rename = "Proxy Information")]
    pub proxy_information: Option<String>,
    #[serde(rename = "Firewall Logs")]
    pub firewall_logs: Option<String>,
    #[serde(rename = "IDS/IPS Alerts")]
    pub ids_ips_alerts: Option<String>,
    #[serde(rename = "Alerts/Warnings")]
    pub alerts_warnings: Option<String>,
    #[serde(rename = "Log Source")]
    pub log_source: Option<String>,
}

impl Record {
    /// Get a cell value, `None` when missing
    pub fn value(&self, column: Column) -> Option<Value<'_>> {
        fn text(v: &Option<String>) -> Option<Value<'_>> {
            v.as_deref().map(Value::Text)
        }
        fn number(v: &Option<f64>) -> Option<Value<'static>> {
            v.map(Value::Number)
        }

        match column {
            Column::Timestamp => text(&self.timestamp),
            Column::SourceIp => text(&self.source_ip),
            Column::DestinationIp => text(&self.destination_ip),
            Column::SourcePort => number(&self.source_port),
            Column::DestinationPort => number(&self.destination_port),
            Column::Protocol => text(&self.protocol),
            Column::PacketLength => number(&self.packet_length),
            Column::PacketType => text(&self.packet_type),
            Column::TrafficType => text(&self.traffic_type),
            Column::PayloadData => text(&self.payload_data),
            Column::MalwareIndicators => text(&self.malware_indicators),
            Column::AnomalyScores => number(&self.anomaly_scores),
            Column::AttackType => text(&self.attack_type),
            Column::AttackSignature => text(&self.attack_signature),
            Column::ActionTaken => text(&self.action_taken),
            Column::SeverityLevel => text(&self.severity_level),
            Column::UserInformation => text(&self.user_information),
            Column::DeviceInformation => text(&self.device_information),
            Column::NetworkSegment => text(&self.network_segment),
            Column::GeoLocation => text(&self.geo_location),
            Column::ProxyInformation => text(&self.proxy_information),
            Column::FirewallLogs => text(&self.firewall_logs),
            Column::IdsIpsAlerts => text(&self.ids_ips_alerts),
            Column::AlertsWarnings => text(&self.alerts_warnings),
            Column::LogSource => text(&self.log_source),
        }
    }

    /// Get a text cell
    pub fn get_text(&self, column: Column) -> Option<&str> {
        match self.value(column)? {
            Value::Text(s) => Some(s),
            Value::Number(_) => None,
        }
    }

    /// Get a numeric cell
    pub fn get_numeric(&self, column: Column) -> Option<f64> {
        match self.value(column)? {
            Value::Number(n) => Some(n),
            Value::Text(_) => None,
        }
    }

    /// True when no attribute is missing
    pub fn is_complete(&self) -> bool {
        Column::ALL.iter().all(|&c| self.value(c).is_some())
    }
}

/// Outcome of dropping incomplete rows
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CleaningSummary {
    pub rows_before: usize,
    pub rows_after: usize,
    /// Missing-cell count per column, columns without gaps omitted
    pub missing_by_column: Vec<(Column, usize)>,
}

impl CleaningSummary {
    pub fn rows_dropped(&self) -> usize {
        self.rows_before - self.rows_after
    }
}

/// A collection of records in file order
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Dataset {
    pub name: String,
    pub data: Vec<Record>,
}

impl Dataset {
    /// Create a new empty dataset
    pub fn new(name: String) -> Self {
        Self {
            name,
            data: Vec::new(),
        }
    }

    /// Add a record to the dataset
    pub fn add_record(&mut self, record: Record) {
        self.data.push(record);
    }

    /// Get the number of records
    pub fn len(&self) -> usize {
        self.data.len()
    }

    /// Check if dataset is empty
    pub fn is_empty(&self) -> bool {
        self.data.is_empty()
    }

    /// Load dataset from CSV text
    pub fn from_csv(name: String, csv_data: &str) -> Result<Self, AnalysisError> {
        Self::from_reader(name, csv_data.as_bytes())
    }

    /// Load dataset from a CSV file on disk
    pub fn from_path(name: String, path: &Path) -> Result<Self, AnalysisError> {
        let file = File::open(path).map_err(|e| {
            AnalysisError::InputError(format!("cannot open '{}': {}", path.display(), e))
        })?;
        Self::from_reader(name, file)
    }

    /// Load dataset from any CSV byte source
    ///
    /// Every column of the schema must be present in the header row. Empty
    /// cells load as missing; a non-numeric value in a numeric column fails
    /// the whole load.
    pub fn from_reader<R: Read>(name: String, source: R) -> Result<Self, AnalysisError> {
        let mut reader = csv::ReaderBuilder::new()
            .has_headers(true)
            .trim(csv::Trim::All)
            .from_reader(source);

        let headers = reader.headers()?.clone();
        let missing: Vec<&str> = Column::ALL
            .iter()
            .map(|c| c.header())
            .filter(|h| !headers.iter().any(|found| found == *h))
            .collect();
        if !missing.is_empty() {
            return Err(AnalysisError::InputError(format!(
                "missing required columns: {}",
                missing.join(", ")
            )));
        }

        let mut dataset = Dataset::new(name);
        for (line, result) in reader.deserialize::<Record>().enumerate() {
            let record = result.map_err(|e| {
                AnalysisError::InputError(format!("malformed row {}: {}", line + 1, e))
            })?;
            dataset.add_record(record);
        }

        info!(dataset = %dataset.name, rows = dataset.len(), "loaded dataset");
        Ok(dataset)
    }

    /// Drop every record with at least one missing cell
    ///
    /// Applies to all columns, including ones the feature builder never reads.
    pub fn drop_missing(&self) -> (Dataset, CleaningSummary) {
        let mut missing_counts = [0usize; 25];
        let mut cleaned = Dataset::new(self.name.clone());

        for record in &self.data {
            let mut complete = true;
            for (i, &column) in Column::ALL.iter().enumerate() {
                if record.value(column).is_none() {
                    missing_counts[i] += 1;
                    complete = false;
                }
            }
            if complete {
                cleaned.add_record(record.clone());
            }
        }

        let missing_by_column = Column::ALL
            .iter()
            .zip(missing_counts)
            .filter(|(_, n)| *n > 0)
            .map(|(&c, n)| (c, n))
            .collect();

        let summary = CleaningSummary {
            rows_before: self.len(),
            rows_after: cleaned.len(),
            missing_by_column,
        };

        debug!(missing = ?summary.missing_by_column, "missing cells per column");
        info!(
            rows_before = summary.rows_before,
            rows_after = summary.rows_after,
            dropped = summary.rows_dropped(),
            "dropped incomplete rows"
        );

        (cleaned, summary)
    }
}
