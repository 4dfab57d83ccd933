//! Binary wire format for filtered time-series query responses.
//!
//! A response body starts with a version byte, then a fixed header, two
//! interning tables (strings, and from version 3 the series shapes)
//! addressed through relative offsets, the series records, and a trailing
//! diagnostics region. Everything multi-byte is little-endian; counts and
//! offsets use a base-128 varint encoding.

mod preamble;
mod reader;
mod record;
mod stream;
mod values;

#[cfg(test)]
pub(crate) mod testutil;

use crate::error::MdmResult;
use crate::query::FilteredTimeSeriesQueryResponse;
use self::reader::ByteStreamReader;

pub use self::stream::FilteredTimeSeriesStream;

/// Highest response version this decoder understands. Record layout differs
/// by version, so anything newer is rejected outright instead of being
/// parsed on a guess.
pub(crate) const NEXT_VERSION: u8 = 3;

/// Sentinel version stamped by the server when the whole query failed; the
/// payload switches to an error envelope instead of the table layout.
pub(crate) const COMPLETE_FAILURE_VERSION: u8 = 0xFF;

/// Eagerly decodes one complete response body into memory.
pub fn deserialize_query_response(body: Vec<u8>) -> MdmResult<FilteredTimeSeriesQueryResponse> {
    let mut reader = ByteStreamReader::new(body);
    record::read_response(&mut reader)
}

/// Wraps a multi-block stream body in a lazy record iterator, for query
/// results too large to materialize at once.
pub fn stream_query_response(body: Vec<u8>) -> FilteredTimeSeriesStream {
    FilteredTimeSeriesStream::new(body)
}
