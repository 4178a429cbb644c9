use std::fs::File;
use std::io::{self, BufReader, Read, Write};
use std::path::Path;

use tracing::{debug, error, info};

use crate::buffer::BlockWriter;
use crate::config::{LoadMode, LoadOptions, StowConfig};
use crate::error::{StowError, StowResult};
use crate::node::Storage;
use crate::reader::TreeReader;
use crate::writer::TreeWriter;

/// Opens file handles for save and load.
///
/// Paths are arbitrary Unicode text; implementations report failure only
/// after every strategy they have is exhausted.
pub trait Opener {
    type Reader: Read;
    type Writer: Write;

    fn open_read(&self, path: &Path) -> io::Result<Self::Reader>;

    /// Create or truncate for writing.
    fn create(&self, path: &Path) -> io::Result<Self::Writer>;
}

/// The local file system. `std::fs` already takes native Unicode paths on
/// every platform, so no encoding fallback is needed.
#[derive(Clone, Copy, Debug, Default)]
pub struct FsOpener;

impl Opener for FsOpener {
    type Reader = File;
    type Writer = File;

    fn open_read(&self, path: &Path) -> io::Result<File> {
        File::open(path)
    }

    fn create(&self, path: &Path) -> io::Result<File> {
        File::create(path)
    }
}

/// Diagnostics from a completed save.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct SaveReport {
    pub bytes: u64,
    pub flushes: usize,
}

/// Saves and loads trees through an [`Opener`].
///
/// Each save owns a fresh [`BlockWriter`], so independent `Persistence`
/// values never share buffer state.
#[derive(Clone, Debug, Default)]
pub struct Persistence<O: Opener = FsOpener> {
    opener: O,
    config: StowConfig,
}

impl Persistence<FsOpener> {
    pub fn new(config: StowConfig) -> Self {
        Self {
            opener: FsOpener,
            config,
        }
    }
}

impl<O: Opener> Persistence<O> {
    pub fn with_opener(opener: O, config: StowConfig) -> Self {
        Self { opener, config }
    }

    pub fn config(&self) -> &StowConfig {
        &self.config
    }

    pub fn opener(&self) -> &O {
        &self.opener
    }

    /// Write `root` (header and records) to `path`.
    ///
    /// There is no atomic commit: a failure part-way leaves whatever was
    /// already flushed on disk.
    pub fn save(&self, root: &Storage, path: &Path) -> StowResult<SaveReport> {
        self.config.validate()?;
        let sink = self.opener.create(path).map_err(|source| {
            error!(path = %path.display(), error = %source, "saving failed");
            StowError::Open {
                path: path.to_path_buf(),
                source,
            }
        })?;

        let mut out = BlockWriter::with_capacity(sink, self.config.buffer_capacity);
        out.reset();
        let result = TreeWriter::new(&mut out, &self.config).write_file(root);
        let result = result.and_then(|()| out.finish());

        match result {
            Ok(()) => {
                let report = SaveReport {
                    bytes: out.bytes_written(),
                    flushes: out.flush_count(),
                };
                info!(
                    path = %path.display(),
                    bytes = report.bytes,
                    flushes = report.flushes,
                    "saved data"
                );
                Ok(report)
            }
            Err(e) => {
                error!(path = %path.display(), error = %e, "failed saving data");
                Err(e)
            }
        }
    }

    /// Decode `path` into `target`.
    ///
    /// The file is decoded completely before `target` is touched, so a
    /// failed load leaves `target` as it was.
    pub fn load(&self, target: &mut Storage, path: &Path, options: LoadOptions) -> StowResult<()> {
        let input = self.open_for_load(path, options.report_missing)?;
        let decoded = TreeReader::new(BufReader::new(input), &self.config).read_file();

        let decoded = match decoded {
            Ok(root) => root,
            Err(e) => {
                error!(path = %path.display(), error = %e, "loading storage failed");
                return Err(e);
            }
        };

        debug!(
            path = %path.display(),
            nodes = decoded.node_count(),
            mode = ?options.mode,
            "loaded storage"
        );
        match options.mode {
            LoadMode::Merge => target.merge_from(decoded),
            LoadMode::Replace => {
                let dirty = target.is_dirty();
                *target = decoded;
                target.set_dirty(dirty);
            }
        }
        Ok(())
    }

    /// Read only the header text at the start of `path`.
    pub fn load_header(&self, path: &Path) -> StowResult<String> {
        let input = self.open_for_load(path, false)?;
        TreeReader::new(BufReader::new(input), &self.config).read_header()
    }

    fn open_for_load(&self, path: &Path, report_missing: bool) -> StowResult<O::Reader> {
        self.opener.open_read(path).map_err(|source| {
            if report_missing {
                error!(path = %path.display(), error = %source, "cannot open storage");
            } else {
                debug!(path = %path.display(), error = %source, "storage not opened");
            }
            StowError::Open {
                path: path.to_path_buf(),
                source,
            }
        })
    }
}

impl Storage {
    /// Save to `path` with the default configuration.
    pub fn save(&self, path: impl AsRef<Path>) -> StowResult<SaveReport> {
        Persistence::new(StowConfig::default()).save(self, path.as_ref())
    }

    /// Load from `path` with the default configuration.
    pub fn load(&mut self, path: impl AsRef<Path>, options: LoadOptions) -> StowResult<()> {
        Persistence::new(StowConfig::default()).load(self, path.as_ref(), options)
    }

    /// Read a file's header without decoding its records.
    pub fn load_header(path: impl AsRef<Path>) -> StowResult<String> {
        Persistence::new(StowConfig::default()).load_header(path.as_ref())
    }
}
