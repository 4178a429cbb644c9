use std::io::{self, Read};

use tracing::debug;

use crate::config::StowConfig;
use crate::error::{StowError, StowResult};
use crate::node::Storage;
use crate::tag::RecordTag;

/// Upper bound on array pre-allocation; a corrupt count word must not
/// trigger a huge allocation before any element is read.
const MAX_PREALLOC: usize = 1024;

/// Decodes tagged records from an input stream.
///
/// Decoding is tag-driven: records may arrive in any order and repeat, and
/// each object ends only at an explicit end marker. Running out of input
/// before that marker is an error, so truncated files are always rejected.
/// Text that is not valid UTF-8 is rejected as well.
///
/// Each nested object costs one stack frame and as little as five input
/// bytes. With `max_depth` unset a hostile file can nest deep enough to
/// overflow the stack; set [`StowConfig::max_depth`] when reading
/// untrusted input.
pub struct TreeReader<R: Read> {
    input: R,
    max_string_len: usize,
    max_depth: Option<usize>,
}

impl<R: Read> TreeReader<R> {
    pub fn new(input: R, config: &StowConfig) -> Self {
        Self {
            input,
            max_string_len: config.max_string_len,
            max_depth: config.max_depth,
        }
    }

    /// Header text followed by the root object, decoded into a fresh node.
    ///
    /// Bytes after the root's end marker are not inspected.
    pub fn read_file(&mut self) -> StowResult<Storage> {
        let header = self.read_header()?;
        let mut root = self.read_object(0)?;
        root.header = header;
        Ok(root)
    }

    pub fn read_header(&mut self) -> StowResult<String> {
        self.read_string("header")
    }

    /// Read records until the end marker. Any failure discards the partial
    /// node; nothing is attached to a parent until it decoded completely.
    pub fn read_object(&mut self, depth: usize) -> StowResult<Storage> {
        if let Some(max) = self.max_depth {
            if depth > max {
                return Err(StowError::DepthExceeded { max });
            }
        }

        let mut node = Storage::new();
        loop {
            let byte = match self.read_tag_byte()? {
                Some(b) => b,
                None => return Err(StowError::MissingSentinel),
            };
            let tag = RecordTag::from_byte(byte).ok_or(StowError::UnknownTag { tag: byte })?;

            match tag {
                RecordTag::Scalar => {
                    let key = self.read_string("scalar key")?;
                    let value = self.read_string("scalar value")?;
                    node.insert_scalar(key, value);
                }
                RecordTag::Object => {
                    let key = self.read_string("object key")?;
                    let child = self.read_object(depth + 1)?;
                    node.set_child(key, child);
                }
                RecordTag::Array => {
                    let count = self.read_word("array count")? as usize;
                    node.array.reserve(count.min(MAX_PREALLOC));
                    for _ in 0..count {
                        let element = self.read_object(depth + 1)?;
                        node.array.push(element);
                    }
                }
                RecordTag::End => return Ok(node),
            }
        }
    }

    pub fn into_inner(self) -> R {
        self.input
    }

    /// `None` on clean end of input.
    fn read_tag_byte(&mut self) -> StowResult<Option<u8>> {
        let mut buf = [0u8; 1];
        loop {
            match self.input.read(&mut buf) {
                Ok(0) => return Ok(None),
                Ok(_) => return Ok(Some(buf[0])),
                Err(e) if e.kind() == io::ErrorKind::Interrupted => continue,
                Err(e) => return Err(e.into()),
            }
        }
    }

    fn read_word(&mut self, field: &'static str) -> StowResult<u32> {
        let mut buf = [0u8; 4];
        self.read_exact(&mut buf, field)?;
        Ok(u32::from_ne_bytes(buf))
    }

    fn read_string(&mut self, field: &'static str) -> StowResult<String> {
        let len = self.read_word(field)? as usize;
        if len > self.max_string_len {
            debug!(field, len, max = self.max_string_len, "string length out of range");
            return Err(StowError::StringTooLong {
                len,
                max: self.max_string_len,
            });
        }
        let mut buf = vec![0u8; len];
        self.read_exact(&mut buf, field)?;
        String::from_utf8(buf).map_err(|e| {
            debug!(field, valid_up_to = e.utf8_error().valid_up_to(), "invalid UTF-8");
            StowError::InvalidText { field }
        })
    }

    fn read_exact(&mut self, buf: &mut [u8], field: &'static str) -> StowResult<()> {
        match self.input.read_exact(buf) {
            Ok(()) => Ok(()),
            Err(e) if e.kind() == io::ErrorKind::UnexpectedEof => {
                Err(StowError::Truncated { field })
            }
            Err(e) => Err(e.into()),
        }
    }
}

/// Decode a whole file image from memory.
pub fn decode_from_bytes(data: &[u8]) -> StowResult<Storage> {
    decode_from_bytes_with(data, &StowConfig::default())
}

pub fn decode_from_bytes_with(data: &[u8], config: &StowConfig) -> StowResult<Storage> {
    TreeReader::new(data, config).read_file()
}
