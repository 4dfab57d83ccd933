use super::reader::ByteStreamReader;
use crate::error::MdmResult;

/// Decodes a length-prefixed array of IEEE-754 doubles: a varint count
/// followed by that many little-endian 8-byte values.
pub(crate) fn read_double_array(reader: &mut ByteStreamReader) -> MdmResult<Vec<f64>> {
    let count = reader.read_var_u32()? as usize;
    // Count is wire-controlled: cap the preallocation, a short buffer fails on read.
    let mut values = Vec::with_capacity(count.min(4096));
    for _ in 0..count {
        values.push(reader.read_f64()?);
    }
    Ok(values)
}
