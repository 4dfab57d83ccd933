//! Test-only encoder for the filtered query wire format. Mirrors the layout
//! the decoder expects: tables are written after the record stream and
//! referenced through relative offsets.

use byteorder::{LittleEndian, WriteBytesExt};

pub(crate) struct WireWriter {
    buf: Vec<u8>,
}

impl WireWriter {
    pub fn new() -> Self {
        Self { buf: Vec::new() }
    }

    pub fn into_bytes(self) -> Vec<u8> {
        self.buf
    }

    pub fn write_u8(&mut self, value: u8) {
        self.buf.push(value);
    }

    pub fn write_i16(&mut self, value: i16) {
        self.buf.write_i16::<LittleEndian>(value).unwrap();
    }

    pub fn write_i32(&mut self, value: i32) {
        self.buf.write_i32::<LittleEndian>(value).unwrap();
    }

    pub fn write_u64(&mut self, value: u64) {
        self.buf.write_u64::<LittleEndian>(value).unwrap();
    }

    pub fn write_f64(&mut self, value: f64) {
        self.buf.write_f64::<LittleEndian>(value).unwrap();
    }

    pub fn write_bool(&mut self, value: bool) {
        self.write_u8(value as u8);
    }

    pub fn write_var_u32(&mut self, value: u32) {
        self.write_var_u64(value as u64);
    }

    pub fn write_var_u64(&mut self, mut value: u64) {
        while value >= 0x80 {
            self.buf.push((value & 0x7F) as u8 | 0x80);
            value >>= 7;
        }
        self.buf.push(value as u8);
    }

    pub fn write_string(&mut self, text: &str) {
        self.write_var_u32(text.len() as u32);
        self.buf.extend_from_slice(text.as_bytes());
    }

    pub fn write_raw(&mut self, bytes: &[u8]) {
        self.buf.extend_from_slice(bytes);
    }
}

/// (account index, namespace index, name index, dimension name indices),
/// all referring to the response's string table.
pub(crate) type MetadataEntryRef = (u32, u32, u32, Vec<u32>);

fn encode_metadata_entry(writer: &mut WireWriter, entry: &MetadataEntryRef) {
    writer.write_var_u32(entry.0);
    writer.write_var_u32(entry.1);
    writer.write_var_u32(entry.2);
    writer.write_u8(entry.3.len() as u8);
    for &dimension in &entry.3 {
        writer.write_var_u32(dimension);
    }
}

pub(crate) struct RecordSpec {
    /// Metadata table index; only written for version >= 3 records.
    pub meta_index: Option<u32>,
    pub dimension_value_indices: Vec<u32>,
    pub properties: Vec<(u32, f64)>,
    pub samples: Vec<(u32, Vec<f64>)>,
}

fn encode_record(record: &RecordSpec) -> Vec<u8> {
    let mut writer = WireWriter::new();
    if let Some(index) = record.meta_index {
        writer.write_var_u32(index);
    }
    for &index in &record.dimension_value_indices {
        writer.write_var_u32(index);
    }
    writer.write_u8(record.properties.len() as u8);
    for &(name_index, value) in &record.properties {
        writer.write_var_u32(name_index);
        writer.write_f64(value);
    }
    writer.write_u8(record.samples.len() as u8);
    for (name_index, values) in &record.samples {
        writer.write_var_u32(*name_index);
        writer.write_var_u32(values.len() as u32);
        for &value in values {
            writer.write_f64(value);
        }
    }
    writer.into_bytes()
}

pub(crate) struct QualitySpec {
    pub version: u8,
    pub estimated: i32,
    pub dropped: i32,
    pub reasons: Vec<(String, i32)>,
}

pub(crate) struct ResponseSpec {
    pub version: u8,
    pub quality: Option<QualitySpec>,
    pub start_minutes: u64,
    pub duration_minutes: u32,
    pub resolution_minutes: u32,
    pub strings: Vec<String>,
    /// The metadata table for version >= 3; the single inline shape
    /// (first entry) for earlier versions.
    pub metadata: Vec<MetadataEntryRef>,
    pub records: Vec<RecordSpec>,
    pub messages: Vec<(u8, u8, u8, String)>,
}

impl ResponseSpec {
    pub fn new(version: u8) -> Self {
        Self {
            version,
            quality: None,
            start_minutes: 0,
            duration_minutes: 1,
            resolution_minutes: 1,
            strings: Vec::new(),
            metadata: Vec::new(),
            records: Vec::new(),
            messages: Vec::new(),
        }
    }

    pub fn encode(&self) -> Vec<u8> {
        let mut writer = WireWriter::new();
        writer.write_u8(self.version);

        match &self.quality {
            Some(quality) => {
                writer.write_bool(true);
                writer.write_u8(quality.version);
                writer.write_i32(quality.estimated);
                writer.write_i32(quality.dropped);
                if quality.version >= 2 {
                    writer.write_var_u32(quality.reasons.len() as u32);
                    for (reason, count) in &quality.reasons {
                        writer.write_string(reason);
                        writer.write_i32(*count);
                    }
                }
            }
            None => writer.write_bool(false),
        }

        writer.write_var_u64(self.start_minutes);
        writer.write_var_u32(self.duration_minutes);
        writer.write_var_u32(self.resolution_minutes);
        writer.write_var_u32(self.records.len() as u32);

        let mut strings_seg = WireWriter::new();
        strings_seg.write_var_u32(self.strings.len() as u32);
        for text in &self.strings {
            strings_seg.write_string(text);
        }
        let strings_seg = strings_seg.into_bytes();

        let records_seg: Vec<u8> = self.records.iter().flat_map(encode_record).collect();

        if self.version >= 3 {
            let mut meta_seg = WireWriter::new();
            meta_seg.write_var_u32(self.metadata.len() as u32);
            for entry in &self.metadata {
                encode_metadata_entry(&mut meta_seg, entry);
            }
            let meta_seg = meta_seg.into_bytes();

            // String offset is measured from the end of its own field, so the
            // metadata offset field still ahead of the records counts too.
            writer.write_u64(8 + records_seg.len() as u64);
            writer.write_u64(records_seg.len() as u64 + strings_seg.len() as u64);
            writer.write_raw(&records_seg);
            writer.write_raw(&strings_seg);
            writer.write_raw(&meta_seg);
        } else {
            let mut inline = WireWriter::new();
            if !self.records.is_empty() {
                encode_metadata_entry(&mut inline, &self.metadata[0]);
            }
            let inline = inline.into_bytes();

            writer.write_u64(inline.len() as u64 + records_seg.len() as u64);
            writer.write_raw(&inline);
            writer.write_raw(&records_seg);
            writer.write_raw(&strings_seg);
        }

        if self.version >= 2 {
            writer.write_u8(self.messages.len() as u8);
            for (topic, level, source, content) in &self.messages {
                writer.write_u8(*topic);
                writer.write_u8(*level);
                writer.write_u8(*source);
                writer.write_string(content);
            }
        }

        writer.into_bytes()
    }
}

pub(crate) fn encode_complete_failure(
    code: i16,
    message: &str,
    request_json: Option<&str>,
) -> Vec<u8> {
    let mut writer = WireWriter::new();
    writer.write_u8(0xFF);
    writer.write_i16(code);
    writer.write_string(message);
    match request_json {
        Some(json) => {
            writer.write_bool(true);
            writer.write_string(json);
        }
        None => writer.write_bool(false),
    }
    writer.into_bytes()
}

pub(crate) fn encode_stream_body(relay_version: u8, blocks: &[Vec<u8>]) -> Vec<u8> {
    let mut writer = WireWriter::new();
    writer.write_var_u32(blocks.len() as u32);
    for block in blocks {
        writer.write_u8(relay_version);
        writer.write_raw(block);
    }
    writer.into_bytes()
}
