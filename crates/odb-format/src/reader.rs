use std::{
    fs::File,
    io::{self, BufRead, BufReader, Read},
    path::Path,
};

use crate::{
    error::{OdbError, OdbResult},
    record::{HEADER_LEN, RECORD_PREFIX_LEN, Record, to_text_delimiters},
};

const READ_BUF: usize = 8 << 20;

/// Streams records out of a container until physical EOF.
///
/// The declared row count from the header is exposed for progress estimates
/// but never used to decide when to stop.
pub struct ContainerReader<R: Read> {
    reader: BufReader<R>,
    declared_rows: u32,
    bytes_read: u64,
    failed: bool,
}

impl<R: Read> ContainerReader<R> {
    /// Wraps `inner` and consumes the 5-byte header.
    pub fn new(inner: R) -> OdbResult<Self> {
        Self::with_capacity(inner, READ_BUF)
    }

    pub fn with_capacity(inner: R, io_buf_bytes: usize) -> OdbResult<Self> {
        let mut reader = BufReader::with_capacity(io_buf_bytes, inner);
        let mut header = [0u8; HEADER_LEN];
        read_exact_or_eof(&mut reader, &mut header, "container header")?;
        let declared_rows = u32::from_le_bytes([header[1], header[2], header[3], header[4]]);

        Ok(Self {
            reader,
            declared_rows,
            bytes_read: HEADER_LEN as u64,
            failed: false,
        })
    }

    #[inline]
    pub fn declared_rows(&self) -> u32 {
        self.declared_rows
    }

    /// Bytes consumed so far, header included.
    #[inline]
    pub fn bytes_read(&self) -> u64 {
        self.bytes_read
    }

    /// Reads the next record into `out`, reusing its allocation.
    /// - Ok(true)  => record produced
    /// - Ok(false) => clean EOF on a record boundary
    pub fn read_record_into(&mut self, out: &mut Record) -> OdbResult<bool> {
        let more = self.read_raw_record_into(out)?;
        to_text_delimiters(&mut out.line);
        Ok(more)
    }

    /// Like [`Self::read_record_into`] but leaves the payload as stored, tab
    /// separated. Commas inside a field stay distinguishable from separators.
    pub fn read_raw_record_into(&mut self, out: &mut Record) -> OdbResult<bool> {
        out.clear();

        let table = match self.reader.fill_buf()?.first() {
            Some(&b) => b,
            None => return Ok(false),
        };
        self.reader.consume(1);

        let mut len = [0u8; 2];
        read_exact_or_eof(&mut self.reader, &mut len, "record length")?;
        let len = u16::from_le_bytes(len) as usize;

        out.table = table;
        out.line.resize(len, 0);
        read_exact_or_eof(&mut self.reader, &mut out.line, "record payload").map_err(|e| {
            match e {
                OdbError::UnexpectedEof(_) => OdbError::UnexpectedEof(format!(
                    "record payload: table {table} declares {len} bytes at offset {}",
                    self.bytes_read
                )),
                other => other,
            }
        })?;

        self.bytes_read += (RECORD_PREFIX_LEN + len) as u64;
        Ok(true)
    }

    pub fn into_inner(self) -> R {
        self.reader.into_inner()
    }
}

impl ContainerReader<File> {
    pub fn open(path: &Path) -> OdbResult<Self> {
        let file = File::open(path).map_err(|e| OdbError::file(path, e))?;
        Self::new(file).map_err(|e| e.at(path))
    }
}

/// Lazy, forward-only record sequence. Stops for good after the first error.
impl<R: Read> Iterator for ContainerReader<R> {
    type Item = OdbResult<Record>;

    fn next(&mut self) -> Option<Self::Item> {
        if self.failed {
            return None;
        }
        let mut record = Record::default();
        match self.read_record_into(&mut record) {
            Ok(true) => Some(Ok(record)),
            Ok(false) => None,
            Err(e) => {
                self.failed = true;
                Some(Err(e))
            }
        }
    }
}

fn read_exact_or_eof<R: Read>(r: &mut R, buf: &mut [u8], what: &str) -> OdbResult<()> {
    match r.read_exact(buf) {
        Ok(()) => Ok(()),
        Err(e) if e.kind() == io::ErrorKind::UnexpectedEof => {
            Err(OdbError::UnexpectedEof(what.to_string()))
        }
        Err(e) => Err(OdbError::Io(e)),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::writer::ContainerWriter;

    fn scenario() -> Vec<u8> {
        let mut w = ContainerWriter::new(Vec::new(), 3).unwrap();
        w.write_record(0, b"1,2").unwrap();
        w.write_record(0, b"3,4").unwrap();
        w.write_record(1, b"x,y").unwrap();
        w.finish().unwrap()
    }

    #[test]
    fn reads_records_back_in_text_form() {
        let bytes = scenario();
        let r = ContainerReader::new(bytes.as_slice()).unwrap();
        assert_eq!(r.declared_rows(), 3);
        let records: Vec<Record> = r.collect::<OdbResult<_>>().unwrap();
        assert_eq!(
            records,
            vec![
                Record::new(0, b"1,2".to_vec()),
                Record::new(0, b"3,4".to_vec()),
                Record::new(1, b"x,y".to_vec()),
            ]
        );
    }

    #[test]
    fn declared_count_is_not_a_loop_bound() {
        let mut bytes = scenario();
        bytes[1] = 1;
        let r = ContainerReader::new(bytes.as_slice()).unwrap();
        assert_eq!(r.declared_rows(), 1);
        assert_eq!(r.count(), 3);

        let mut bytes = scenario();
        bytes[1] = 200;
        let r = ContainerReader::new(bytes.as_slice()).unwrap();
        assert_eq!(r.count(), 3);
    }

    #[test]
    fn header_only_container_is_empty() {
        let bytes = [0u8, 0, 0, 0, 0];
        let mut r = ContainerReader::new(&bytes[..]).unwrap();
        let mut rec = Record::default();
        assert!(!r.read_record_into(&mut rec).unwrap());
        assert_eq!(r.bytes_read(), 5);
    }

    #[test]
    fn short_header_is_an_error() {
        let bytes = [0u8, 3, 0];
        assert!(matches!(
            ContainerReader::new(&bytes[..]),
            Err(OdbError::UnexpectedEof(_))
        ));
    }

    #[test]
    fn truncated_payload_is_an_error() {
        let mut bytes = scenario();
        bytes.truncate(bytes.len() - 1);
        let results: Vec<OdbResult<Record>> = ContainerReader::new(bytes.as_slice())
            .unwrap()
            .collect();
        assert_eq!(results.len(), 3);
        assert!(results[0].is_ok());
        assert!(results[1].is_ok());
        assert!(matches!(results[2], Err(OdbError::UnexpectedEof(_))));
    }

    #[test]
    fn truncated_length_is_an_error() {
        let mut bytes = vec![0u8, 1, 0, 0, 0];
        bytes.extend_from_slice(&[0, 3]);
        let mut r = ContainerReader::new(bytes.as_slice()).unwrap();
        let mut rec = Record::default();
        assert!(matches!(
            r.read_record_into(&mut rec),
            Err(OdbError::UnexpectedEof(_))
        ));
    }

    #[test]
    fn raw_read_keeps_container_delimiters() {
        let bytes = scenario();
        let mut r = ContainerReader::new(bytes.as_slice()).unwrap();
        let mut rec = Record::default();
        assert!(r.read_raw_record_into(&mut rec).unwrap());
        assert_eq!(rec, Record::new(0, b"1\t2".to_vec()));
        assert!(r.read_record_into(&mut rec).unwrap());
        assert_eq!(rec, Record::new(0, b"3,4".to_vec()));
    }

    #[test]
    fn tracks_consumed_bytes() {
        let bytes = scenario();
        let mut r = ContainerReader::new(bytes.as_slice()).unwrap();
        let mut rec = Record::default();
        while r.read_record_into(&mut rec).unwrap() {}
        assert_eq!(r.bytes_read(), bytes.len() as u64);
    }
}
