//! Table multiplexing: many text files in one container and back.

use std::{
    fs::{File, OpenOptions},
    io::{BufRead, BufReader, BufWriter, Read, Write},
    path::{Path, PathBuf},
};

use tracing::debug;

use crate::{
    error::{OdbError, OdbResult},
    progress::{ProgressSink, ProgressTracker},
    reader::ContainerReader,
    record::Record,
    schema::{MAX_TABLES, TableNameList},
    writer::ContainerWriter,
};

const TEXT_BUF: usize = 1 << 20;

/// What a decode pass produced.
#[derive(Debug, Clone)]
pub struct MuxStats {
    pub records: u64,
    written: [bool; MAX_TABLES],
}

impl Default for MuxStats {
    fn default() -> Self {
        Self {
            records: 0,
            written: [false; MAX_TABLES],
        }
    }
}

impl MuxStats {
    #[inline]
    pub fn wrote(&self, table: u8) -> bool {
        self.written[table as usize]
    }

    /// Slots that received at least one line, ascending.
    pub fn tables(&self) -> impl Iterator<Item = u8> + '_ {
        (0..=u8::MAX).filter(|&t| self.wrote(t))
    }

    pub fn table_count(&self) -> usize {
        self.written.iter().filter(|&&w| w).count()
    }
}

/// Calls `f` once per line of `path`. The `\n` terminator and one trailing
/// `\r` are stripped; a last line without terminator is still a line.
fn for_each_line(path: &Path, mut f: impl FnMut(&[u8]) -> OdbResult<()>) -> OdbResult<()> {
    let file = File::open(path).map_err(|e| OdbError::file(path, e))?;
    let mut r = BufReader::with_capacity(TEXT_BUF, file);
    let mut buf = Vec::with_capacity(256);

    loop {
        buf.clear();
        let n = r
            .read_until(b'\n', &mut buf)
            .map_err(|e| OdbError::file(path, e))?;
        if n == 0 {
            return Ok(());
        }
        let mut line = buf.as_slice();
        if let Some(rest) = line.strip_suffix(b"\n") {
            line = rest;
        }
        if let Some(rest) = line.strip_suffix(b"\r") {
            line = rest;
        }
        f(line)?;
    }
}

/// Writes every named slot of `names`, in slot order, into a new container
/// at `out_path`. Files are read from `src_dir`; null slots are skipped.
/// Returns the number of records written.
pub fn encode_tables<S: ProgressSink>(
    names: &TableNameList,
    src_dir: &Path,
    out_path: &Path,
    row_count: u32,
    tracker: &mut ProgressTracker<S>,
) -> OdbResult<u64> {
    let mut w = ContainerWriter::create(out_path, row_count)?;

    for (table, name) in names.named() {
        let path = src_dir.join(name);
        let before = w.records_written();
        for_each_line(&path, |line| {
            w.write_record(table, line).map_err(|e| e.at(out_path))?;
            tracker.advance(1, name);
            Ok(())
        })?;
        debug!(
            table,
            name,
            lines = w.records_written() - before,
            "encoded table"
        );
    }

    let n = w.records_written();
    w.finish().map_err(|e| e.at(out_path))?;
    Ok(n)
}

/// One-table container (index 0), used for lineups and transactions.
pub fn encode_single_table<S: ProgressSink>(
    name: &str,
    src_dir: &Path,
    out_path: &Path,
    row_count: u32,
    tracker: &mut ProgressTracker<S>,
) -> OdbResult<u64> {
    encode_tables(
        &TableNameList::single(name),
        src_dir,
        out_path,
        row_count,
        tracker,
    )
}

struct OpenTable {
    table: u8,
    path: PathBuf,
    w: BufWriter<File>,
}

impl OpenTable {
    fn open(table: u8, path: PathBuf, append: bool) -> OdbResult<Self> {
        let file = if append {
            OpenOptions::new().append(true).open(&path)
        } else {
            File::create(&path)
        }
        .map_err(|e| OdbError::file(&path, e))?;
        Ok(Self {
            table,
            path,
            w: BufWriter::with_capacity(TEXT_BUF, file),
        })
    }

    fn write_line(&mut self, line: &[u8]) -> OdbResult<()> {
        self.w
            .write_all(line)
            .and_then(|()| self.w.write_all(b"\n"))
            .map_err(|e| OdbError::file(&self.path, e))
    }

    fn close(mut self) -> OdbResult<()> {
        self.w.flush().map_err(|e| OdbError::file(&self.path, e))
    }
}

/// Streams `reader` and routes each record to the text file its slot names
/// in `names`, under `dst_dir`.
///
/// A change of table index closes the current file and opens the next one.
/// A slot seen again after another slot is appended to, so its file is only
/// truncated once per pass. Progress is reported as `base + bytes consumed`.
pub fn decode_tables<R: Read, S: ProgressSink>(
    reader: &mut ContainerReader<R>,
    names: &TableNameList,
    dst_dir: &Path,
    tracker: &mut ProgressTracker<S>,
    base: u64,
) -> OdbResult<MuxStats> {
    let mut stats = MuxStats::default();
    let mut current: Option<OpenTable> = None;
    let mut record = Record::default();

    while reader.read_record_into(&mut record)? {
        let table = record.table;

        let open = match current.take() {
            Some(open) if open.table == table => open,
            prev => {
                if let Some(prev) = prev {
                    prev.close()?;
                }
                let name = names.get(table).ok_or(OdbError::UndefinedTable(table))?;
                let append = stats.wrote(table);
                debug!(table, name, append, "switching table");
                stats.written[table as usize] = true;
                OpenTable::open(table, dst_dir.join(name), append)?
            }
        };
        current.insert(open).write_line(&record.line)?;
        stats.records += 1;

        let file = names.get(table).unwrap_or_default();
        tracker.set_position(base + reader.bytes_read(), file);
    }

    if let Some(last) = current.take() {
        last.close()?;
    }
    Ok(stats)
}
