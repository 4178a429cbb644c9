/// Discriminator byte that precedes every record in the stream.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum RecordTag {
    /// Scalar entry: key text, value text.
    Scalar,
    /// Named child object: key text, nested record stream.
    Object,
    /// Unkeyed array: count word, that many nested record streams.
    Array,
    /// End of the current object's record stream.
    End,
}

impl RecordTag {
    /// Serialize to the wire byte.
    pub fn to_byte(self) -> u8 {
        match self {
            Self::Scalar => 1,
            Self::Object => 2,
            Self::Array => 3,
            Self::End => 99,
        }
    }

    /// Parse a wire byte. Returns `None` for anything outside {1, 2, 3, 99}.
    pub fn from_byte(byte: u8) -> Option<Self> {
        match byte {
            1 => Some(Self::Scalar),
            2 => Some(Self::Object),
            3 => Some(Self::Array),
            99 => Some(Self::End),
            _ => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn wire_bytes() {
        assert_eq!(RecordTag::Scalar.to_byte(), 1);
        assert_eq!(RecordTag::Object.to_byte(), 2);
        assert_eq!(RecordTag::Array.to_byte(), 3);
        assert_eq!(RecordTag::End.to_byte(), 99);
    }

    #[test]
    fn parse_known() {
        for tag in [RecordTag::Scalar, RecordTag::Object, RecordTag::Array, RecordTag::End] {
            assert_eq!(RecordTag::from_byte(tag.to_byte()), Some(tag));
        }
    }

    #[test]
    fn parse_unknown() {
        assert!(RecordTag::from_byte(0).is_none());
        assert!(RecordTag::from_byte(4).is_none());
        assert!(RecordTag::from_byte(98).is_none());
        assert!(RecordTag::from_byte(100).is_none());
        assert!(RecordTag::from_byte(255).is_none());
    }
}
