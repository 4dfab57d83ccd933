use crate::error::{MdmError, MdmResult};
use byteorder::{LittleEndian, ReadBytesExt};
use std::io::{Cursor, Read};

/// Sequential cursor over a fully buffered response body. The interning
/// tables are addressed by relative offsets computed from absolute stream
/// positions, so the body must be seekable; callers buffer it before
/// decoding starts.
pub(crate) struct ByteStreamReader {
    cursor: Cursor<Vec<u8>>,
}

impl ByteStreamReader {
    pub fn new(data: Vec<u8>) -> Self {
        Self {
            cursor: Cursor::new(data),
        }
    }

    pub fn position(&self) -> u64 {
        self.cursor.position()
    }

    pub fn set_position(&mut self, position: u64) {
        self.cursor.set_position(position);
    }

    pub fn skip(&mut self, bytes: u64) {
        let position = self.cursor.position();
        self.cursor.set_position(position + bytes);
    }

    pub fn len(&self) -> u64 {
        self.cursor.get_ref().len() as u64
    }

    pub fn read_u8(&mut self) -> MdmResult<u8> {
        Ok(self.cursor.read_u8()?)
    }

    pub fn read_i16(&mut self) -> MdmResult<i16> {
        Ok(self.cursor.read_i16::<LittleEndian>()?)
    }

    pub fn read_i32(&mut self) -> MdmResult<i32> {
        Ok(self.cursor.read_i32::<LittleEndian>()?)
    }

    pub fn read_u64(&mut self) -> MdmResult<u64> {
        Ok(self.cursor.read_u64::<LittleEndian>()?)
    }

    pub fn read_f64(&mut self) -> MdmResult<f64> {
        Ok(self.cursor.read_f64::<LittleEndian>()?)
    }

    pub fn read_bool(&mut self) -> MdmResult<bool> {
        Ok(self.read_u8()? != 0)
    }

    /// Base-128 varint, little-endian: 7 payload bits per byte, high bit
    /// signals continuation.
    pub fn read_var_u32(&mut self) -> MdmResult<u32> {
        let mut value = 0u32;
        let mut shift = 0;

        loop {
            let byte = self.read_u8()?;
            value |= ((byte & 0x7F) as u32) << shift;
            if byte & 0x80 == 0 {
                break;
            }
            shift += 7;
            if shift >= 35 {
                return Err(MdmError::Format {
                    message: "varint exceeds 32 bits".to_string(),
                });
            }
        }

        Ok(value)
    }

    pub fn read_var_u64(&mut self) -> MdmResult<u64> {
        let mut value = 0u64;
        let mut shift = 0;

        loop {
            let byte = self.read_u8()?;
            value |= ((byte & 0x7F) as u64) << shift;
            if byte & 0x80 == 0 {
                break;
            }
            shift += 7;
            if shift >= 70 {
                return Err(MdmError::Format {
                    message: "varint exceeds 64 bits".to_string(),
                });
            }
        }

        Ok(value)
    }

    /// Length-prefixed string: varint byte count followed by UTF-8 bytes.
    pub fn read_string(&mut self) -> MdmResult<String> {
        let length = self.read_var_u32()? as usize;
        // Length is wire-controlled: allocate only up to what the buffer can hold.
        let mut bytes = vec![0u8; length.min(self.cursor.get_ref().len())];
        if bytes.len() < length {
            return Err(MdmError::Format {
                message: format!(
                    "string length {} exceeds remaining response bytes",
                    length
                ),
            });
        }
        self.cursor.read_exact(&mut bytes)?;
        String::from_utf8(bytes).map_err(|e| MdmError::Format {
            message: format!("string is not valid UTF-8: {}", e),
        })
    }
}
