use super::preamble::{read_preamble, DecodedPreamble, Preamble};
use super::reader::ByteStreamReader;
use super::record::{finish_response_block, read_record};
use crate::error::{MdmError, MdmResult};
use crate::metrics::FilteredTimeSeries;

/// Lazily decodes a stream of concatenated response blocks, yielding one
/// record at a time in wire order. The relay that concatenates blocks stamps
/// each one with its own version byte, which is discarded here; every block
/// then carries a full response (preamble, tables, records, trailer).
///
/// Forward-only and never restartable: once a record is yielded the cursor
/// has advanced past it, and the first error ends the stream permanently.
pub struct FilteredTimeSeriesStream {
    reader: ByteStreamReader,
    remaining_blocks: u32,
    current: Option<BlockState>,
    started: bool,
    failed: bool,
}

struct BlockState {
    preamble: DecodedPreamble,
    remaining_records: u32,
}

impl FilteredTimeSeriesStream {
    pub(crate) fn new(body: Vec<u8>) -> Self {
        Self {
            reader: ByteStreamReader::new(body),
            remaining_blocks: 0,
            current: None,
            started: false,
            failed: false,
        }
    }

    fn next_record(&mut self) -> MdmResult<Option<FilteredTimeSeries>> {
        if !self.started {
            self.started = true;
            self.remaining_blocks = self.reader.read_var_u32()?;
        }

        loop {
            if let Some(block) = self.current.as_mut() {
                if block.remaining_records > 0 {
                    block.remaining_records -= 1;
                    let record = read_record(&mut self.reader, &block.preamble)?;
                    return Ok(Some(record));
                }
                let finished = self.current.take().expect("block state present");
                finish_response_block(&mut self.reader, &finished.preamble)?;
            }

            if self.remaining_blocks == 0 {
                return Ok(None);
            }
            self.remaining_blocks -= 1;

            // Relay-stamped version byte, not part of the block's payload.
            let _relay_version = self.reader.read_u8()?;
            match read_preamble(&mut self.reader)? {
                Preamble::CompleteFailure {
                    error_code,
                    message,
                    request_json,
                } => {
                    return Err(MdmError::ServerFailure {
                        code: error_code,
                        message,
                        request: request_json,
                    });
                }
                Preamble::Data(preamble) => {
                    self.current = Some(BlockState {
                        remaining_records: preamble.header.series_count,
                        preamble,
                    });
                }
            }
        }
    }
}

impl Iterator for FilteredTimeSeriesStream {
    type Item = MdmResult<FilteredTimeSeries>;

    fn next(&mut self) -> Option<Self::Item> {
        if self.failed {
            return None;
        }
        match self.next_record() {
            Ok(Some(record)) => Some(Ok(record)),
            Ok(None) => None,
            Err(error) => {
                self.failed = true;
                Some(Err(error))
            }
        }
    }
}
