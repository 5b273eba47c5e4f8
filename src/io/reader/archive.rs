/*! Continuous reading of a list of `.tar.gz` archives.

[ArchiveCursor] presents an ordered list of gzipped tar archives as a single sequence of
regular file entries. Directories are never surfaced, and moving past the last entry of an
archive transparently opens the next one.

The cursor keeps track of how much of the current entry has been consumed, and skips what is
left over before reading the next header, so that callers can leave an entry half-read
without desynchronizing the stream.

An archive that can't be opened, decompressed or read is logged and abandoned: the cursor goes on
with the next one.
!*/
use std::fs::File;
use std::io::{self, BufReader, Read};
use std::path::{Path, PathBuf};

use flate2::read::MultiGzDecoder;
use log::{debug, error, info, trace};
use tar::{Header, PaxExtensions};

use crate::entity::Format;
use crate::error::Error;

const BLOCK_SIZE: u64 = 512;
// declared sizes come from the archive: never preallocate more than this
const MAX_PREALLOC: u64 = 1 << 20;
// long names and pax records above this size are treated as corruption
const MAX_EXTENSION_SIZE: u64 = 1 << 20;

type TarStream = BufReader<MultiGzDecoder<File>>;

/// A tar entry, as seen by the cursor.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ArchiveEntry {
    name: String,
    size: u64,
    is_dir: bool,
}

impl ArchiveEntry {
    /// Slash-delimited path of the entry inside the archive.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Declared size, in bytes.
    pub fn size(&self) -> u64 {
        self.size
    }

    pub fn is_dir(&self) -> bool {
        self.is_dir
    }
}

/// Cursor over the entries of a list of archives.
///
/// Starts positioned before the first entry of the first archive.
pub struct ArchiveCursor {
    archives: Vec<PathBuf>,
    next_archive: usize,
    // index of the last opened archive
    opened: Option<usize>,
    reader: Option<TarStream>,
    entry: Option<ArchiveEntry>,
    // unread bytes of the current entry, and the padding up to the next block
    remaining: u64,
    padding: u64,
}

impl ArchiveCursor {
    /// Create a cursor over `archives`, that will be read in the provided order.
    pub fn new(archives: Vec<PathBuf>) -> Self {
        Self {
            archives,
            next_archive: 0,
            opened: None,
            reader: None,
            entry: None,
            remaining: 0,
            padding: 0,
        }
    }

    pub fn archives(&self) -> &[PathBuf] {
        &self.archives
    }

    /// Entry the cursor is positioned on.
    pub fn current_entry(&self) -> Option<&ArchiveEntry> {
        self.entry.as_ref()
    }

    /// Archive the current entry comes from.
    pub fn current_archive(&self) -> Option<&Path> {
        self.opened
            .and_then(|idx| self.archives.get(idx))
            .map(PathBuf::as_path)
    }

    /// Move to the next regular file entry, opening the next archives if needed.
    ///
    /// Returns `false` when every archive has been exhausted.
    pub fn advance(&mut self) -> bool {
        loop {
            if self.reader.is_none() && !self.open_next() {
                self.entry = None;
                return false;
            }

            match self.next_header() {
                Ok(Some(entry)) if entry.is_dir => {
                    trace!("skipping directory {}", entry.name);
                }
                Ok(Some(entry)) => {
                    self.entry = Some(entry);
                    return true;
                }
                Ok(None) => {
                    debug!("end of dump {:?}", self.current_archive());
                    self.close();
                }
                Err(e) => {
                    error!(
                        "Error while reading the input: {:?}: {}",
                        self.current_archive(),
                        e
                    );
                    self.close();
                }
            }
        }
    }

    /// Read what is left of the current entry and append it to `data`.
    ///
    /// Bytes are decoded as UTF-8, invalid sequences being replaced by U+FFFD.
    /// On failure, the archive is abandoned and the error returned.
    pub fn read_entry(&mut self, data: &mut String) -> Result<(), Error> {
        let expected = self.remaining;
        let reader = self.reader.as_mut().ok_or_else(|| {
            Error::Custom("read_entry called without a current entry".to_string())
        })?;

        let mut bytes = Vec::with_capacity(expected.min(MAX_PREALLOC) as usize);
        let result = reader.take(expected).read_to_end(&mut bytes);
        self.remaining = 0;

        match result {
            Ok(n) if n as u64 == expected => {
                data.push_str(&String::from_utf8_lossy(&bytes));
                Ok(())
            }
            Ok(n) => Err(self.abandon(io::Error::new(
                io::ErrorKind::UnexpectedEof,
                format!("entry truncated: read {} of {} bytes", n, expected),
            ))),
            Err(e) => Err(self.abandon(e)),
        }
    }

    /// Discard what is left of the current entry.
    pub fn skip_entry(&mut self) -> Result<(), Error> {
        let expected = self.remaining;
        let reader = self.reader.as_mut().ok_or_else(|| {
            Error::Custom("skip_entry called without a current entry".to_string())
        })?;

        let result = io::copy(&mut reader.take(expected), &mut io::sink());
        self.remaining = 0;

        match result {
            Ok(n) if n == expected => Ok(()),
            Ok(n) => Err(self.abandon(io::Error::new(
                io::ErrorKind::UnexpectedEof,
                format!("entry truncated: skipped {} of {} bytes", n, expected),
            ))),
            Err(e) => Err(self.abandon(e)),
        }
    }

    /// Open the next archive of the list, skipping the ones that can't be opened.
    fn open_next(&mut self) -> bool {
        while self.next_archive < self.archives.len() {
            let idx = self.next_archive;
            self.next_archive += 1;

            let path = &self.archives[idx];
            info!("Reading dump: {:?}", path);
            match File::open(path) {
                Ok(f) => {
                    self.reader = Some(BufReader::new(MultiGzDecoder::new(f)));
                    self.opened = Some(idx);
                    return true;
                }
                Err(e) => error!("Could not open dump {:?}: {}", path, e),
            }
        }
        false
    }

    /// Drop the current archive reader.
    fn close(&mut self) {
        self.reader = None;
        self.remaining = 0;
        self.padding = 0;
    }

    /// Log the error, close the current archive and return the error.
    fn abandon(&mut self, e: io::Error) -> Error {
        error!(
            "Error while reading the input: {:?}, entry {:?}: {}",
            self.current_archive(),
            self.entry.as_ref().map(ArchiveEntry::name),
            e
        );
        self.close();
        Error::Io(e)
    }

    /// Skip the leftovers of the current entry.
    fn drain(reader: &mut TarStream, len: u64) -> io::Result<()> {
        if len == 0 {
            return Ok(());
        }
        let skipped = io::copy(&mut reader.take(len), &mut io::sink())?;
        if skipped != len {
            return Err(io::Error::new(
                io::ErrorKind::UnexpectedEof,
                "archive truncated inside an entry",
            ));
        }
        Ok(())
    }

    /// Read the next entry header of the current archive.
    ///
    /// Returns [None] at the end of the archive.
    fn next_header(&mut self) -> io::Result<Option<ArchiveEntry>> {
        let reader = match self.reader.as_mut() {
            Some(r) => r,
            None => return Ok(None),
        };

        Self::drain(reader, self.remaining + self.padding)?;
        self.remaining = 0;
        self.padding = 0;

        let mut long_name: Option<String> = None;
        let mut pax_path: Option<String> = None;
        let mut pax_size: Option<u64> = None;
        let mut block = [0u8; BLOCK_SIZE as usize];

        loop {
            if !read_block(reader, &mut block)? {
                return Ok(None);
            }
            // end of archive marker
            if block.iter().all(|b| *b == 0) {
                return Ok(None);
            }

            let header = Header::from_byte_slice(&block);
            let declared = header.entry_size()?;
            let kind = header.entry_type();

            if kind.is_gnu_longname() {
                let mut name = Self::read_extension(reader, declared)?;
                while name.last() == Some(&0) {
                    name.pop();
                }
                long_name = Some(String::from_utf8_lossy(&name).into_owned());
                continue;
            }
            if kind.is_pax_local_extensions() {
                let data = Self::read_extension(reader, declared)?;
                for extension in PaxExtensions::new(&data) {
                    let extension = extension?;
                    match extension.key() {
                        Ok("path") => {
                            pax_path =
                                Some(String::from_utf8_lossy(extension.value_bytes()).into_owned())
                        }
                        Ok("size") => {
                            pax_size = extension.value().ok().and_then(|v| v.parse().ok())
                        }
                        _ => (),
                    }
                }
                continue;
            }
            if kind.is_pax_global_extensions() {
                // archive-wide defaults, nothing we use
                Self::read_extension(reader, declared)?;
                continue;
            }

            let size = pax_size.take().unwrap_or(declared);
            let padding = padding(size);
            let name = match (pax_path.take(), long_name.take()) {
                (Some(name), _) | (None, Some(name)) => name,
                (None, None) => String::from_utf8_lossy(&header.path_bytes()).into_owned(),
            };

            if kind.is_file() || kind.is_dir() {
                self.remaining = size;
                self.padding = padding;
                return Ok(Some(ArchiveEntry {
                    name,
                    size,
                    is_dir: kind.is_dir(),
                }));
            }

            // links, devices...
            trace!("skipping {:?} record {}", kind, name);
            Self::drain(reader, size + padding)?;
        }
    }

    /// Read the data of a long name or pax record, padding included.
    fn read_extension(reader: &mut TarStream, size: u64) -> io::Result<Vec<u8>> {
        if size > MAX_EXTENSION_SIZE {
            return Err(io::Error::new(
                io::ErrorKind::InvalidData,
                format!("header extension of {} bytes", size),
            ));
        }
        let mut data = Vec::with_capacity(size as usize);
        reader.take(size).read_to_end(&mut data)?;
        if data.len() as u64 != size {
            return Err(io::Error::new(
                io::ErrorKind::UnexpectedEof,
                "archive truncated inside a header extension",
            ));
        }
        Self::drain(reader, padding(size))?;
        Ok(data)
    }
}

/// Fill `block`. Returns `false` on a clean end of stream.
fn read_block<R: Read>(reader: &mut R, block: &mut [u8]) -> io::Result<bool> {
    let mut filled = 0;
    while filled < block.len() {
        match reader.read(&mut block[filled..]) {
            Ok(0) if filled == 0 => return Ok(false),
            Ok(0) => {
                return Err(io::Error::new(
                    io::ErrorKind::UnexpectedEof,
                    "archive truncated inside a header",
                ))
            }
            Ok(n) => filled += n,
            Err(e) if e.kind() == io::ErrorKind::Interrupted => continue,
            Err(e) => return Err(e),
        }
    }
    Ok(true)
}

#[inline]
fn padding(size: u64) -> u64 {
    (BLOCK_SIZE - size % BLOCK_SIZE) % BLOCK_SIZE
}

/// List the archives of `src` matching the dataset format, sorted by file name.
///
/// Sorting matters: two consecutive archives can hold parts of the same entity.
/// Errors if there is no matching archive.
pub fn list_archives(src: &Path, format: Format) -> Result<Vec<PathBuf>, Error> {
    let src_str = src
        .to_str()
        .ok_or_else(|| Error::Custom(format!("source path is not valid unicode: {:?}", src)))?;
    let pattern = format!("{}/{}", glob::Pattern::escape(src_str), format.glob());

    let mut archives = Vec::new();
    for path in glob::glob(&pattern)? {
        let path = path?;
        let matches = path
            .file_name()
            .and_then(|name| name.to_str())
            .map(|name| format.matches(name))
            .unwrap_or(false);
        if matches && path.is_file() {
            archives.push(path);
        }
    }

    if archives.is_empty() {
        return Err(Error::NoArchives(src.to_path_buf()));
    }

    archives.sort_by(|a, b| a.file_name().cmp(&b.file_name()));
    info!(
        "Creating index from input located at {:?} ({} files)",
        src,
        archives.len()
    );
    Ok(archives)
}

#[cfg(test)]
/// Write a tar.gz archive. Entries with a trailing slash are directories.
pub(crate) fn write_archive(path: &Path, entries: &[(&str, &str)]) {
    use flate2::{write::GzEncoder, Compression};

    let file = File::create(path).unwrap();
    let mut builder = tar::Builder::new(GzEncoder::new(file, Compression::default()));
    for (name, content) in entries {
        let mut header = tar::Header::new_gnu();
        if name.ends_with('/') {
            header.set_entry_type(tar::EntryType::Directory);
            header.set_size(0);
            header.set_mode(0o755);
            header.set_cksum();
            builder.append_data(&mut header, name, io::empty()).unwrap();
        } else {
            header.set_size(content.len() as u64);
            header.set_mode(0o644);
            header.set_cksum();
            builder
                .append_data(&mut header, name, content.as_bytes())
                .unwrap();
        }
    }
    builder.into_inner().unwrap().finish().unwrap();
}
