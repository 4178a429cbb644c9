//! Tagged-record binary format for hierarchical key-value save data.
//!
//! A file holds one tree of [`Storage`] nodes: text scalars, named child
//! nodes and an unkeyed array of nodes, preceded by a free-form header.
//!
//! # Architecture
//!
//! - **BlockWriter**: coalesces field writes into large sink writes; one per save
//! - **TreeWriter / TreeReader**: recursive record codec over the tag stream
//! - **Typed accessors**: int/bool/float/double views over text scalars
//! - **Persistence**: save, load and header-only load through an [`Opener`]
//!
//! # Wire Format
//!
//! ```text
//! file          := header-text root-object
//! root-object   := record* 99
//! scalar-record := 1 key-text value-text
//! object-record := 2 key-text record* 99
//! array-record  := 3 count-word (record* 99){count}
//! text          := length-word bytes
//! ```
//!
//! Words are 4 bytes in host byte order. Strings longer than
//! [`DEFAULT_MAX_STRING_LEN`] bytes are rejected on both encode and decode.

pub mod buffer;
pub mod config;
pub mod error;
pub mod hexfloat;
pub mod node;
pub mod persist;
pub mod reader;
pub mod tag;
pub mod value;
pub mod writer;

pub use buffer::BlockWriter;
pub use config::{LoadMode, LoadOptions, StowConfig, DEFAULT_BUFFER_CAPACITY, DEFAULT_MAX_STRING_LEN};
pub use error::{StowError, StowResult};
pub use node::Storage;
pub use persist::{FsOpener, Opener, Persistence, SaveReport};
pub use reader::{decode_from_bytes, decode_from_bytes_with, TreeReader};
pub use tag::RecordTag;
pub use writer::{encode_to_bytes, encode_to_bytes_with, TreeWriter};
