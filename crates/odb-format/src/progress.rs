use std::{
    fs::File,
    io::{BufRead, BufReader},
    path::Path,
    sync::mpsc,
};

use crate::{
    error::{OdbError, OdbResult},
    schema::TableNameList,
};

/// Encode reports once per this many lines.
pub const ENCODE_PROGRESS_LINES: u64 = 256;
/// Decode reports once per this many bytes.
pub const DECODE_PROGRESS_BYTES: u64 = 128 << 10;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Progress {
    /// 0..=100
    pub percentage: u8,
    pub current_file: String,
}

/// Receives progress updates from a running conversion.
pub trait ProgressSink {
    fn report(&mut self, progress: Progress);
}

impl<F: FnMut(Progress)> ProgressSink for F {
    #[inline]
    fn report(&mut self, progress: Progress) {
        self(progress)
    }
}

/// A dropped receiver only means nobody is watching anymore.
impl ProgressSink for mpsc::Sender<Progress> {
    #[inline]
    fn report(&mut self, progress: Progress) {
        let _ = self.send(progress);
    }
}

/// Discards every update.
#[derive(Debug, Default, Clone, Copy)]
pub struct NoProgress;

impl ProgressSink for NoProgress {
    #[inline]
    fn report(&mut self, _progress: Progress) {}
}

/// Rate-limits reports to one per `step` units and keeps the reported
/// percentage monotonic and within 0..=100.
pub struct ProgressTracker<S: ProgressSink> {
    sink: S,
    total: u64,
    done: u64,
    step: u64,
    next_report: u64,
    last_pct: Option<u8>,
}

impl<S: ProgressSink> ProgressTracker<S> {
    pub fn new(sink: S, total: u64, step: u64) -> Self {
        let step = step.max(1);
        Self {
            sink,
            total,
            done: 0,
            step,
            next_report: step,
            last_pct: None,
        }
    }

    #[inline]
    pub fn position(&self) -> u64 {
        self.done
    }

    #[inline]
    pub fn total(&self) -> u64 {
        self.total
    }

    /// Moves forward by `delta` units.
    #[inline(always)]
    pub fn advance(&mut self, delta: u64, current_file: &str) {
        self.set_position(self.done.saturating_add(delta), current_file);
    }

    /// Moves to an absolute position. Positions behind the current one are ignored.
    #[inline(always)]
    pub fn set_position(&mut self, position: u64, current_file: &str) {
        if position <= self.done {
            return;
        }
        self.done = position;
        if self.done >= self.next_report {
            while self.next_report <= self.done {
                self.next_report = self.next_report.saturating_add(self.step);
            }
            self.emit(self.percentage(), current_file);
        }
    }

    /// Final 100% report.
    pub fn complete(&mut self, current_file: &str) {
        self.done = self.done.max(self.total);
        self.emit(100, current_file);
    }

    pub fn into_sink(self) -> S {
        self.sink
    }

    fn percentage(&self) -> u8 {
        if self.total == 0 {
            return 100;
        }
        (self.done.saturating_mul(100) / self.total).min(100) as u8
    }

    fn emit(&mut self, pct: u8, current_file: &str) {
        let pct = match self.last_pct {
            Some(last) => pct.max(last),
            None => pct,
        };
        self.last_pct = Some(pct);
        self.sink.report(Progress {
            percentage: pct,
            current_file: current_file.to_string(),
        });
    }
}

/// Number of lines `path` yields when read line by line. A last line without
/// a terminator still counts.
pub fn count_lines(path: &Path) -> OdbResult<u64> {
    let file = File::open(path).map_err(|e| OdbError::file(path, e))?;
    let mut r = BufReader::with_capacity(1 << 20, file);
    let mut lines = 0u64;
    let mut pending = false;

    loop {
        let buf = r.fill_buf().map_err(|e| OdbError::file(path, e))?;
        if buf.is_empty() {
            break;
        }
        let n = buf.len();
        lines += buf.iter().filter(|&&b| b == b'\n').count() as u64;
        pending = buf[n - 1] != b'\n';
        r.consume(n);
    }

    Ok(lines + pending as u64)
}

/// Total lines over every named slot of `names`, files resolved in `dir`.
pub fn count_table_lines(names: &TableNameList, dir: &Path) -> OdbResult<u64> {
    names
        .named()
        .try_fold(0u64, |acc, (_, name)| -> OdbResult<u64> {
            Ok(acc + count_lines(&dir.join(name))?)
        })
}
