// Copyright (c) 2026 bad-antics
// Licensed under the MIT License. See LICENSE file in the project root.
// https://github.com/bad-antics/gripwatch

//! Line sources that replay recorded or scripted input

use std::collections::VecDeque;
use std::io::BufRead;

use super::{LineSource, LinkStatus};
use crate::error::{PipelineError, Result};

/// Replays any buffered reader line by line; end of input is a lost link
pub struct ReaderSource<R> {
    name: String,
    reader: Option<R>,
    status: LinkStatus,
}

impl<R: BufRead + Send> ReaderSource<R> {
    pub fn new(name: &str, reader: R) -> Self {
        Self {
            name: name.to_string(),
            reader: Some(reader),
            status: LinkStatus::Connected,
        }
    }
}

impl<R: BufRead + Send> LineSource for ReaderSource<R> {
    fn name(&self) -> &str {
        &self.name
    }

    fn status(&self) -> LinkStatus {
        self.status
    }

    fn read_line(&mut self) -> Result<Option<String>> {
        let Some(reader) = self.reader.as_mut() else {
            return Err(PipelineError::ConnectionLost(format!("{} is closed", self.name)));
        };

        let mut line = String::new();
        match reader.read_line(&mut line) {
            Ok(0) => {
                self.status = LinkStatus::Lost;
                Err(PipelineError::ConnectionLost(format!("{}: end of input", self.name)))
            }
            Ok(_) => Ok(Some(line.trim_end_matches(['\r', '\n']).to_string())),
            Err(e) => {
                self.status = LinkStatus::Lost;
                Err(PipelineError::ConnectionLost(format!("{}: {}", self.name, e)))
            }
        }
    }

    fn close(&mut self) -> Result<()> {
        self.reader = None;
        self.status = LinkStatus::Disconnected;
        Ok(())
    }
}

/// One step of a scripted session
#[derive(Debug, Clone, PartialEq)]
pub enum ScriptStep {
    Line(String),
    Timeout,
    Disconnect,
}

/// Deterministic in-memory source for tests and dry runs.
///
/// Once the script is exhausted the link reports itself lost.
#[derive(Debug)]
pub struct ScriptedSource {
    steps: VecDeque<ScriptStep>,
    status: LinkStatus,
    reads: usize,
}

impl ScriptedSource {
    pub fn new(steps: impl IntoIterator<Item = ScriptStep>) -> Self {
        Self {
            steps: steps.into_iter().collect(),
            status: LinkStatus::Connected,
            reads: 0,
        }
    }

    pub fn from_lines<S: AsRef<str>>(lines: impl IntoIterator<Item = S>) -> Self {
        Self::new(lines.into_iter().map(|l| ScriptStep::Line(l.as_ref().to_string())))
    }

    /// Number of `read_line` calls served so far
    pub fn reads(&self) -> usize {
        self.reads
    }
}

impl LineSource for ScriptedSource {
    fn name(&self) -> &str {
        "script"
    }

    fn status(&self) -> LinkStatus {
        self.status
    }

    fn read_line(&mut self) -> Result<Option<String>> {
        self.reads += 1;
        match self.steps.pop_front() {
            Some(ScriptStep::Line(line)) => Ok(Some(line)),
            Some(ScriptStep::Timeout) => Ok(None),
            Some(ScriptStep::Disconnect) | None => {
                self.status = LinkStatus::Lost;
                Err(PipelineError::ConnectionLost("script ended".to_string()))
            }
        }
    }

    fn close(&mut self) -> Result<()> {
        self.status = LinkStatus::Disconnected;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Cursor;

    #[test]
    fn test_reader_source_strips_terminators_then_reports_loss() {
        let mut source = ReaderSource::new("mem", Cursor::new("1,1,1\r\n2,2,2\n"));
        assert_eq!(source.read_line().unwrap().as_deref(), Some("1,1,1"));
        assert_eq!(source.read_line().unwrap().as_deref(), Some("2,2,2"));
        assert!(matches!(source.read_line(), Err(PipelineError::ConnectionLost(_))));
        assert_eq!(source.status(), LinkStatus::Lost);
    }

    #[test]
    fn test_scripted_source_timeouts() {
        let mut source = ScriptedSource::new([
            ScriptStep::Timeout,
            ScriptStep::Line("1,1,1".to_string()),
        ]);
        assert_eq!(source.read_line().unwrap(), None);
        assert_eq!(source.read_line().unwrap().as_deref(), Some("1,1,1"));
        assert!(source.read_line().is_err());
        assert_eq!(source.reads(), 3);
    }
}
