// Copyright (c) 2026 bad-antics
// Licensed under the MIT License. See LICENSE file in the project root.
// https://github.com/bad-antics/gripwatch

//! Line protocol decoder: `sensor_id,timestamp,resistance`

use std::collections::BTreeSet;

use super::{ChannelId, Reading};
use crate::error::{PipelineError, Result};

/// Decodes raw protocol lines into readings for a fixed channel set
#[derive(Debug, Clone)]
pub struct LineParser {
    delimiter: char,
    channels: BTreeSet<ChannelId>,
}

impl LineParser {
    pub fn new(delimiter: char, channels: impl IntoIterator<Item = ChannelId>) -> Self {
        Self {
            delimiter,
            channels: channels.into_iter().collect(),
        }
    }

    pub fn channels(&self) -> impl Iterator<Item = ChannelId> + '_ {
        self.channels.iter().copied()
    }

    /// Decode one line.
    ///
    /// Checks run in a fixed order: field count and types
    /// (`MalformedLine`), finiteness of the resistance (`NonFiniteValue`),
    /// then channel membership (`UnknownChannel`).
    pub fn parse(&self, line: &str) -> Result<Reading> {
        let line = line.trim();
        let fields: Vec<&str> = line.split(self.delimiter).map(str::trim).collect();
        if fields.len() != 3 {
            return Err(malformed(line, format!("expected 3 fields, got {}", fields.len())));
        }

        let sensor_id: i64 = fields[0]
            .parse()
            .map_err(|e| malformed(line, format!("sensor id {:?}: {}", fields[0], e)))?;
        let timestamp: f64 = fields[1]
            .parse()
            .map_err(|e| malformed(line, format!("timestamp {:?}: {}", fields[1], e)))?;
        let resistance: f64 = fields[2]
            .parse()
            .map_err(|e| malformed(line, format!("resistance {:?}: {}", fields[2], e)))?;

        if !resistance.is_finite() {
            return Err(PipelineError::NonFiniteValue {
                line: line.to_string(),
            });
        }

        match ChannelId::try_from(sensor_id) {
            Ok(id) if self.channels.contains(&id) => Ok(Reading::new(id, timestamp, resistance)),
            _ => Err(PipelineError::UnknownChannel(sensor_id)),
        }
    }
}

fn malformed(line: &str, reason: String) -> PipelineError {
    PipelineError::MalformedLine {
        line: line.to_string(),
        reason,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn parser() -> LineParser {
        LineParser::new(',', 1..=5)
    }

    #[test]
    fn test_parse_valid_line() {
        let reading = parser().parse("3,12.5,480.25\r").unwrap();
        assert_eq!(reading, Reading::new(3, 12.5, 480.25));
    }

    #[test]
    fn test_wrong_field_count_is_malformed() {
        let p = parser();
        assert!(matches!(p.parse("1,2"), Err(PipelineError::MalformedLine { .. })));
        assert!(matches!(p.parse("1,2,3,4"), Err(PipelineError::MalformedLine { .. })));
        assert!(matches!(p.parse(""), Err(PipelineError::MalformedLine { .. })));
    }

    #[test]
    fn test_bad_field_types_are_malformed() {
        let p = parser();
        assert!(matches!(p.parse("1.5,2,3"), Err(PipelineError::MalformedLine { .. })));
        assert!(matches!(p.parse("1,abc,3"), Err(PipelineError::MalformedLine { .. })));
        assert!(matches!(p.parse("1,2,ohm"), Err(PipelineError::MalformedLine { .. })));
    }

    #[test]
    fn test_non_finite_resistance() {
        let p = parser();
        assert!(matches!(p.parse("1,2,inf"), Err(PipelineError::NonFiniteValue { .. })));
        assert!(matches!(p.parse("1,2,NaN"), Err(PipelineError::NonFiniteValue { .. })));
        assert!(matches!(p.parse("1,2,-inf"), Err(PipelineError::NonFiniteValue { .. })));
    }

    #[test]
    fn test_unknown_channel() {
        let p = parser();
        assert!(matches!(p.parse("9,2,3"), Err(PipelineError::UnknownChannel(9))));
        assert!(matches!(p.parse("-1,2,3"), Err(PipelineError::UnknownChannel(-1))));
    }

    #[test]
    fn test_custom_delimiter_and_channel_set() {
        let p = LineParser::new(';', [7, 11]);
        assert_eq!(p.parse("11;1;2").unwrap().sensor_id, 11);
        assert!(p.parse("11,1,2").is_err());
    }
}
