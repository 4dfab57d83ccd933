use super::preamble::{read_preamble, DecodedPreamble, Preamble};
use super::reader::ByteStreamReader;
use super::values::read_double_array;
use crate::error::{MdmError, MdmResult};
use crate::metrics::{FilteredTimeSeries, QueryMessage, SamplingType};
use crate::query::FilteredTimeSeriesQueryResponse;
use std::sync::Arc;
use tracing::debug;

/// Decodes one series record at the current cursor position. Version 3
/// records carry their own metadata table index; earlier versions share the
/// single shape the preamble resolved.
pub(crate) fn read_record(
    reader: &mut ByteStreamReader,
    preamble: &DecodedPreamble,
) -> MdmResult<FilteredTimeSeries> {
    let metadata = if preamble.header.version >= 3 {
        let index = reader.read_var_u32()?;
        preamble.metadata.get(index)?
    } else {
        Arc::clone(preamble.ambient_metadata.as_ref().ok_or_else(|| {
            MdmError::Format {
                message: "record present but the response declared no series shape".to_string(),
            }
        })?)
    };

    let mut dimensions = Vec::with_capacity(metadata.dimension_names.len());
    for name in &metadata.dimension_names {
        let value = preamble.strings.get(reader.read_var_u32()?)?.to_string();
        dimensions.push((name.clone(), value));
    }

    // Only the first evaluated property is meaningful today; the rest are
    // consumed to keep the cursor aligned.
    let property_count = reader.read_u8()?;
    let mut evaluated_result = f64::NAN;
    for i in 0..property_count {
        let _name = preamble.strings.get(reader.read_var_u32()?)?;
        let value = reader.read_f64()?;
        if i == 0 {
            evaluated_result = value;
        }
    }

    let sampling_type_count = reader.read_u8()?;
    let mut values = Vec::with_capacity(sampling_type_count as usize);
    for _ in 0..sampling_type_count {
        let name = preamble.strings.get(reader.read_var_u32()?)?;
        let sampling_type = SamplingType::from_name(name);
        let series_values = read_double_array(reader)?;
        values.push((sampling_type, series_values));
    }

    Ok(FilteredTimeSeries::new(
        metadata.metric.clone(),
        dimensions,
        evaluated_result,
        values,
    ))
}

/// Consumes everything between the last record and the end of the response
/// block: the table regions (already decoded out-of-line, but physically
/// stored here) and, for version 2 and later, the trailing diagnostic
/// messages.
pub(crate) fn finish_response_block(
    reader: &mut ByteStreamReader,
    preamble: &DecodedPreamble,
) -> MdmResult<()> {
    reader.skip(preamble.string_table_bytes + preamble.metadata_table_bytes);

    if preamble.header.version >= 2 {
        let message_count = reader.read_u8()?;
        for _ in 0..message_count {
            let message = read_query_message(reader)?;
            debug!(
                "query diagnostic (topic {}, level {}, source {}): {}",
                message.topic, message.level, message.source, message.content
            );
        }
    }

    Ok(())
}

fn read_query_message(reader: &mut ByteStreamReader) -> MdmResult<QueryMessage> {
    let topic = reader.read_u8()?;
    let level = reader.read_u8()?;
    let source = reader.read_u8()?;
    let content = reader.read_string()?;
    Ok(QueryMessage {
        topic,
        level,
        source,
        content,
    })
}

/// Decodes one complete response block eagerly: preamble, every declared
/// record, and the trailing region. A complete-failure envelope surfaces as
/// `MdmError::ServerFailure` rather than a decoded response.
pub(crate) fn read_response(
    reader: &mut ByteStreamReader,
) -> MdmResult<FilteredTimeSeriesQueryResponse> {
    match read_preamble(reader)? {
        Preamble::CompleteFailure {
            error_code,
            message,
            request_json,
        } => Err(MdmError::ServerFailure {
            code: error_code,
            message,
            request: request_json,
        }),
        Preamble::Data(preamble) => {
            let series_count = preamble.header.series_count as usize;
            let mut time_series = Vec::with_capacity(series_count.min(4096));
            for _ in 0..series_count {
                time_series.push(read_record(reader, &preamble)?);
            }
            finish_response_block(reader, &preamble)?;

            Ok(FilteredTimeSeriesQueryResponse {
                start_time: preamble.header.start_time,
                end_time: preamble.header.end_time,
                resolution_minutes: preamble.header.resolution_minutes,
                error_code: 0,
                time_series,
            })
        }
    }
}
