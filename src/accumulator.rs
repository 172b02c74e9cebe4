//! Measurement sinks
//!
//! A collection cycle reports each enabled stats section through an
//! [`Accumulator`]. [`MemoryAccumulator`] buffers measurements in memory and
//! [`LineProtocolFormatter`] renders them as InfluxDB line protocol.
//!
//! # Format
//!
//! ```text
//! <measurement>[,<tag>=<value>...] <field>=<value>[,<field>=<value>...] [<timestamp>]
//! ```

use std::time::{SystemTime, UNIX_EPOCH};

use crate::collector::{FieldValue, Fields, Tags};

/// Receives `(measurement, fields, tags)` reports from a collection cycle
pub trait Accumulator: Send {
    /// Record one measurement
    fn add_fields(&mut self, measurement: &str, fields: Fields, tags: &Tags);
}

/// A single reported measurement
#[derive(Debug, Clone, PartialEq)]
pub struct Measurement {
    /// Measurement name (e.g. `beat_libbeat`)
    pub name: String,
    /// Flattened fields
    pub fields: Fields,
    /// Identity tags
    pub tags: Tags,
    /// Unix timestamp in nanoseconds at which the measurement was recorded
    pub timestamp: Option<u128>,
}

/// Accumulator that keeps every measurement in memory
#[derive(Debug, Default)]
pub struct MemoryAccumulator {
    measurements: Vec<Measurement>,
}

impl MemoryAccumulator {
    /// Create an empty accumulator
    pub fn new() -> Self {
        Self::default()
    }

    /// Recorded measurements, in report order
    pub fn measurements(&self) -> &[Measurement] {
        &self.measurements
    }

    /// First measurement with the given name
    pub fn find(&self, name: &str) -> Option<&Measurement> {
        self.measurements.iter().find(|m| m.name == name)
    }

    /// Number of recorded measurements
    pub fn len(&self) -> usize {
        self.measurements.len()
    }

    /// Whether nothing has been recorded
    pub fn is_empty(&self) -> bool {
        self.measurements.is_empty()
    }

    /// Take all recorded measurements, leaving the accumulator empty
    pub fn drain(&mut self) -> Vec<Measurement> {
        std::mem::take(&mut self.measurements)
    }
}

impl Accumulator for MemoryAccumulator {
    fn add_fields(&mut self, measurement: &str, fields: Fields, tags: &Tags) {
        let timestamp = SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .ok()
            .map(|d| d.as_nanos());

        self.measurements.push(Measurement {
            name: measurement.to_string(),
            fields,
            tags: tags.clone(),
            timestamp,
        });
    }
}

/// InfluxDB line protocol formatter
#[derive(Debug, Clone, Default)]
pub struct LineProtocolFormatter {
    /// Include timestamp in output
    include_timestamp: bool,
}

impl LineProtocolFormatter {
    /// Create a new formatter
    pub fn new() -> Self {
        Self::default()
    }

    /// Set whether to include timestamps in output
    pub fn with_timestamps(mut self, include: bool) -> Self {
        self.include_timestamp = include;
        self
    }

    /// Format measurements, one line each
    ///
    /// Fields with an empty key are dropped, and a measurement left without
    /// fields produces no line since line protocol requires at least one.
    pub fn format(&self, measurements: &[Measurement]) -> String {
        let mut output = String::with_capacity(measurements.len() * 256);

        for measurement in measurements {
            if let Some(line) = self.format_line(measurement) {
                output.push_str(&line);
                output.push('\n');
            }
        }

        output
    }

    /// Format a single measurement line
    pub fn format_line(&self, measurement: &Measurement) -> Option<String> {
        let fields: Vec<String> = measurement
            .fields
            .iter()
            .filter(|(k, _)| !k.is_empty())
            .map(|(k, v)| format!("{}={}", Self::escape_key(k), Self::format_value(v)))
            .collect();

        if fields.is_empty() {
            return None;
        }

        let mut line = Self::escape_measurement(&measurement.name);

        // Tags are already sorted by key
        for (k, v) in &measurement.tags {
            if v.is_empty() {
                continue;
            }
            line.push(',');
            line.push_str(&Self::escape_key(k));
            line.push('=');
            line.push_str(&Self::escape_key(v));
        }

        line.push(' ');
        line.push_str(&fields.join(","));

        if self.include_timestamp {
            if let Some(ts) = measurement.timestamp {
                line.push(' ');
                line.push_str(&ts.to_string());
            }
        }

        Some(line)
    }

    /// Format a field value
    ///
    /// - Floats use the shortest round-trip representation
    /// - Booleans are `true` / `false`
    /// - Strings are double-quoted with `"` and `\` escaped
    fn format_value(value: &FieldValue) -> String {
        match value {
            FieldValue::Float(f) => format!("{}", f),
            FieldValue::Bool(b) => b.to_string(),
            FieldValue::String(s) => {
                let mut escaped = String::with_capacity(s.len() + 2);
                escaped.push('"');
                for c in s.chars() {
                    if c == '"' || c == '\\' {
                        escaped.push('\\');
                    }
                    escaped.push(c);
                }
                escaped.push('"');
                escaped
            }
        }
    }

    /// Escape measurement names (commas and spaces)
    fn escape_measurement(name: &str) -> String {
        let mut escaped = String::with_capacity(name.len());
        for c in name.chars() {
            if c == ',' || c == ' ' {
                escaped.push('\\');
            }
            escaped.push(c);
        }
        escaped
    }

    /// Escape tag keys, tag values and field keys (commas, equals signs and spaces)
    fn escape_key(key: &str) -> String {
        let mut escaped = String::with_capacity(key.len());
        for c in key.chars() {
            if c == ',' || c == '=' || c == ' ' {
                escaped.push('\\');
            }
            escaped.push(c);
        }
        escaped
    }
}
