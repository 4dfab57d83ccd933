use super::reader::ByteStreamReader;
use super::{COMPLETE_FAILURE_VERSION, NEXT_VERSION};
use crate::error::{MdmError, MdmResult};
use crate::metrics::{MetricIdentifier, QueryResultQualityInfo, SeriesMetadata};
use chrono::{DateTime, TimeZone, Utc};
use std::sync::Arc;
use tracing::debug;

/// Index-to-string interning table. Every string reference after the header
/// is an index into this table; indices are only valid within the response
/// that carried the table.
pub(crate) struct StringTable {
    entries: Vec<String>,
}

impl StringTable {
    fn read(reader: &mut ByteStreamReader) -> MdmResult<Self> {
        let count = reader.read_var_u32()? as usize;
        let mut entries = Vec::with_capacity(count.min(4096));
        for _ in 0..count {
            entries.push(reader.read_string()?);
        }
        Ok(Self { entries })
    }

    pub fn get(&self, index: u32) -> MdmResult<&str> {
        self.entries
            .get(index as usize)
            .map(String::as_str)
            .ok_or_else(|| MdmError::Format {
                message: format!(
                    "string table index {} out of range (table has {} entries)",
                    index,
                    self.entries.len()
                ),
            })
    }

    #[cfg(test)]
    pub fn len(&self) -> usize {
        self.entries.len()
    }
}

/// Index-to-shape interning table, version 3 and later. Lets one response
/// carry series from several distinct metrics without repeating the shape
/// per record.
pub(crate) struct MetadataTable {
    entries: Vec<Arc<SeriesMetadata>>,
}

impl MetadataTable {
    fn empty() -> Self {
        Self {
            entries: Vec::new(),
        }
    }

    fn read(reader: &mut ByteStreamReader, strings: &StringTable) -> MdmResult<Self> {
        let count = reader.read_var_u32()? as usize;
        let mut entries = Vec::with_capacity(count.min(4096));
        for _ in 0..count {
            entries.push(Arc::new(read_series_metadata(reader, strings)?));
        }
        Ok(Self { entries })
    }

    pub fn get(&self, index: u32) -> MdmResult<Arc<SeriesMetadata>> {
        self.entries
            .get(index as usize)
            .cloned()
            .ok_or_else(|| MdmError::Format {
                message: format!(
                    "metadata table index {} out of range (table has {} entries)",
                    index,
                    self.entries.len()
                ),
            })
    }
}

pub(crate) struct ResponseHeader {
    pub version: u8,
    pub start_time: DateTime<Utc>,
    pub end_time: DateTime<Utc>,
    pub resolution_minutes: u32,
    pub series_count: u32,
}

pub(crate) struct DecodedPreamble {
    pub header: ResponseHeader,
    pub strings: StringTable,
    pub metadata: MetadataTable,
    /// The single shape shared by every record before version 3; for
    /// version 3 the first table entry, reflecting the request's identifier.
    pub ambient_metadata: Option<Arc<SeriesMetadata>>,
    pub string_table_bytes: u64,
    pub metadata_table_bytes: u64,
}

pub(crate) enum Preamble {
    Data(DecodedPreamble),
    CompleteFailure {
        error_code: i16,
        message: String,
        request_json: Option<String>,
    },
}

/// Parses the fixed response header and both interning tables, leaving the
/// cursor at the first series record.
pub(crate) fn read_preamble(reader: &mut ByteStreamReader) -> MdmResult<Preamble> {
    let version = reader.read_u8()?;
    if version == 0 {
        return Err(MdmError::Format {
            message: "response version is 0: the server failed to stamp a version".to_string(),
        });
    }
    if version == COMPLETE_FAILURE_VERSION {
        let error_code = reader.read_i16()?;
        let message = reader.read_string()?;
        let request_json = if reader.read_bool()? {
            Some(reader.read_string()?)
        } else {
            None
        };
        return Ok(Preamble::CompleteFailure {
            error_code,
            message,
            request_json,
        });
    }
    if version > NEXT_VERSION {
        return Err(MdmError::UnsupportedVersion {
            supported: NEXT_VERSION,
            received: version,
        });
    }

    if reader.read_bool()? {
        let quality = read_quality_info(reader)?;
        debug!(
            "query result quality: estimated {} series, dropped {} ({} reasons)",
            quality.estimated_series_count,
            quality.dropped_series_count,
            quality.drop_reasons.len()
        );
    }

    let start_minutes = reader.read_var_u64()?;
    let duration_minutes = reader.read_var_u32()?;
    let start_time = minutes_to_utc(start_minutes)?;
    let end_time = minutes_to_utc(start_minutes + duration_minutes as u64)?;
    let resolution_minutes = reader.read_var_u32()?;
    let series_count = reader.read_var_u32()?;

    let (strings, string_table_bytes) = read_offset_table(reader, StringTable::read)?;
    let (metadata, metadata_table_bytes) = if version >= 3 {
        read_offset_table(reader, |r| MetadataTable::read(r, &strings))?
    } else {
        (MetadataTable::empty(), 0)
    };

    let ambient_metadata = if series_count > 0 {
        if version < 3 {
            // Legacy single-shape format: the one shape sits inline in the
            // main stream, not behind an offset.
            Some(Arc::new(read_series_metadata(reader, &strings)?))
        } else {
            Some(metadata.get(0)?)
        }
    } else {
        None
    };

    Ok(Preamble::Data(DecodedPreamble {
        header: ResponseHeader {
            version,
            start_time,
            end_time,
            resolution_minutes,
            series_count,
        },
        strings,
        metadata,
        ambient_metadata,
        string_table_bytes,
        metadata_table_bytes,
    }))
}

/// Reads a table stored behind a relative offset. The offset is an 8-byte
/// field measured from the position immediately after the field itself; the
/// cursor is restored to that same position once the table is consumed, so
/// sequential header decoding continues unbroken. Returns the table and the
/// number of bytes its encoding occupies.
fn read_offset_table<T>(
    reader: &mut ByteStreamReader,
    read: impl FnOnce(&mut ByteStreamReader) -> MdmResult<T>,
) -> MdmResult<(T, u64)> {
    let relative_offset = reader.read_u64()?;
    let resume = reader.position();
    let table_start = resume + relative_offset;
    reader.set_position(table_start);
    let table = read(reader)?;
    let table_bytes = reader.position() - table_start;
    reader.set_position(resume);
    Ok((table, table_bytes))
}

fn read_series_metadata(
    reader: &mut ByteStreamReader,
    strings: &StringTable,
) -> MdmResult<SeriesMetadata> {
    let account = strings.get(reader.read_var_u32()?)?.to_string();
    let namespace = strings.get(reader.read_var_u32()?)?.to_string();
    let name = strings.get(reader.read_var_u32()?)?.to_string();

    let dimension_count = reader.read_u8()? as usize;
    let mut dimension_names = Vec::with_capacity(dimension_count);
    for _ in 0..dimension_count {
        dimension_names.push(strings.get(reader.read_var_u32()?)?.to_string());
    }

    Ok(SeriesMetadata {
        metric: MetricIdentifier::new(account, namespace, name),
        dimension_names,
    })
}

fn read_quality_info(reader: &mut ByteStreamReader) -> MdmResult<QueryResultQualityInfo> {
    let version = reader.read_u8()?;
    let estimated_series_count = reader.read_i32()?;
    let dropped_series_count = reader.read_i32()?;

    let mut drop_reasons = Vec::new();
    if version >= 2 {
        let count = reader.read_var_u32()?;
        for _ in 0..count {
            let reason = reader.read_string()?;
            let dropped = reader.read_i32()?;
            drop_reasons.push((reason, dropped));
        }
    }

    Ok(QueryResultQualityInfo {
        estimated_series_count,
        dropped_series_count,
        drop_reasons,
    })
}

fn minutes_to_utc(minutes: u64) -> MdmResult<DateTime<Utc>> {
    let seconds = i64::try_from(minutes)
        .ok()
        .and_then(|m| m.checked_mul(60))
        .ok_or_else(|| MdmError::Format {
            message: format!("start time {} minutes is out of range", minutes),
        })?;
    Utc.timestamp_opt(seconds, 0)
        .single()
        .ok_or_else(|| MdmError::Format {
            message: format!("start time {} minutes is out of range", minutes),
        })
}
