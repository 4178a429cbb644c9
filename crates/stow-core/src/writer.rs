use std::io::Write;

use crate::buffer::BlockWriter;
use crate::config::StowConfig;
use crate::error::{StowError, StowResult};
use crate::node::Storage;
use crate::tag::RecordTag;

/// Encodes a tree as tagged records into a [`BlockWriter`].
///
/// Per node: scalars in key order, one array record if the array is
/// non-empty, children in key order, then the end marker.
pub struct TreeWriter<'a, W: Write> {
    out: &'a mut BlockWriter<W>,
    max_string_len: usize,
}

impl<'a, W: Write> TreeWriter<'a, W> {
    pub fn new(out: &'a mut BlockWriter<W>, config: &StowConfig) -> Self {
        Self {
            out,
            max_string_len: config.max_string_len,
        }
    }

    /// Header text followed by the root's record stream.
    pub fn write_file(&mut self, root: &Storage) -> StowResult<()> {
        self.write_string(&root.header)?;
        self.write_object(root)
    }

    /// One node's records, terminated by the end marker.
    pub fn write_object(&mut self, node: &Storage) -> StowResult<()> {
        for (key, value) in node.scalars() {
            self.write_tag(RecordTag::Scalar)?;
            self.write_string(key)?;
            self.write_string(value)?;
        }

        if !node.array.is_empty() {
            let count = u32::try_from(node.array.len()).map_err(|_| StowError::CountOverflow {
                count: node.array.len(),
            })?;
            self.write_tag(RecordTag::Array)?;
            self.write_word(count)?;
            for element in &node.array {
                self.write_object(element)?;
            }
        }

        for (key, child) in node.children() {
            self.write_tag(RecordTag::Object)?;
            self.write_string(key)?;
            self.write_object(child)?;
        }

        self.write_tag(RecordTag::End)
    }

    fn write_tag(&mut self, tag: RecordTag) -> StowResult<()> {
        self.out.write(&[tag.to_byte()])
    }

    fn write_word(&mut self, word: u32) -> StowResult<()> {
        self.out.write(&word.to_ne_bytes())
    }

    /// Length word then raw bytes. Strings the decoder would reject are
    /// refused here so a save never produces an unloadable file.
    fn write_string(&mut self, s: &str) -> StowResult<()> {
        if s.len() > self.max_string_len {
            return Err(StowError::StringTooLong {
                len: s.len(),
                max: self.max_string_len,
            });
        }
        self.write_word(s.len() as u32)?;
        self.out.write(s.as_bytes())
    }
}

/// Encode a whole file image in memory (no disk I/O).
pub fn encode_to_bytes(root: &Storage) -> StowResult<Vec<u8>> {
    encode_to_bytes_with(root, &StowConfig::default())
}

pub fn encode_to_bytes_with(root: &Storage, config: &StowConfig) -> StowResult<Vec<u8>> {
    config.validate()?;
    let mut out = BlockWriter::with_capacity(Vec::new(), config.buffer_capacity);
    TreeWriter::new(&mut out, config).write_file(root)?;
    out.finish()?;
    Ok(out.into_inner())
}
