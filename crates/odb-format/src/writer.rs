use std::{
    fs::File,
    io::{BufWriter, Write},
    path::Path,
};

use crate::{
    error::{OdbError, OdbResult},
    record::{MAX_LINE_LEN, to_container_delimiters},
};

const WRITE_BUF: usize = 8 << 20;

/// Writes the header then one framed record per call.
pub struct ContainerWriter<W: Write> {
    w: W,
    scratch: Vec<u8>,
    records: u64,
}

impl<W: Write> ContainerWriter<W> {
    /// Writes the reserved byte and `row_count`. The count is only a hint for
    /// readers, nothing checks it against the records that follow.
    pub fn new(mut w: W, row_count: u32) -> OdbResult<Self> {
        w.write_all(&[0u8])?;
        w.write_all(&row_count.to_le_bytes())?;
        Ok(Self {
            w,
            scratch: Vec::with_capacity(1024),
            records: 0,
        })
    }

    #[inline]
    pub fn write_record(&mut self, table: u8, line: &[u8]) -> OdbResult<()> {
        if line.len() > MAX_LINE_LEN {
            return Err(OdbError::LineTooLong {
                table,
                len: line.len(),
            });
        }

        self.scratch.clear();
        self.scratch.extend_from_slice(line);
        to_container_delimiters(&mut self.scratch);

        self.w.write_all(&[table])?;
        self.w.write_all(&(line.len() as u16).to_le_bytes())?;
        self.w.write_all(&self.scratch)?;
        self.records += 1;
        Ok(())
    }

    #[inline]
    pub fn records_written(&self) -> u64 {
        self.records
    }

    #[inline]
    pub fn flush(&mut self) -> OdbResult<()> {
        self.w.flush()?;
        Ok(())
    }

    /// Flushes and hands back the inner writer.
    pub fn finish(mut self) -> OdbResult<W> {
        self.flush()?;
        Ok(self.w)
    }
}

impl ContainerWriter<BufWriter<File>> {
    /// Creates (or truncates) `path` and writes the header.
    pub fn create(path: &Path, row_count: u32) -> OdbResult<Self> {
        let file = File::create(path).map_err(|e| OdbError::file(path, e))?;
        Self::new(BufWriter::with_capacity(WRITE_BUF, file), row_count)
            .map_err(|e| e.at(path))
    }
}

/// One-shot write of a whole container. Returns the number of records.
pub fn write_container<I, L>(path: &Path, row_count: u32, records: I) -> OdbResult<u64>
where
    I: IntoIterator<Item = (u8, L)>,
    L: AsRef<[u8]>,
{
    let mut w = ContainerWriter::create(path, row_count)?;
    for (table, line) in records {
        w.write_record(table, line.as_ref())
            .map_err(|e| e.at(path))?;
    }
    let n = w.records_written();
    w.finish().map_err(|e| e.at(path))?;
    Ok(n)
}
