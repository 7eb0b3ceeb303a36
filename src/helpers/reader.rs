use std::fs::File;
use std::io::BufReader;
use std::io::Cursor;
use std::io::Read;
use std::io::Seek;
use std::path::Path;

/// Leading bytes of a Compound File Binary container (encrypted OOXML or legacy .xls)
const CFB_SIGNATURE: [u8; 8] = [0xD0, 0xCF, 0x11, 0xE0, 0xA1, 0xB1, 0x1A, 0xE1];

/// A unified reader over a spreadsheet that lives either on disk or in memory
pub(crate) enum SourceReader {
    /// Local file reader
    Local(BufReader<File>),
    /// In-memory buffer, e.g. an upload that never touched the disk
    Memory(Cursor<Vec<u8>>),
}

impl SourceReader {
    /// Opens a local file
    ///
    /// # Arguments
    /// * `path` - Path to the file
    ///
    /// # Returns
    /// * `std::io::Result<SourceReader>` - Reader for the file content
    pub(crate) fn open<P: AsRef<Path>>(path: P) -> std::io::Result<SourceReader> {
        let file = File::open(path)?;
        Ok(SourceReader::Local(BufReader::new(file)))
    }

    /// Wraps an in-memory buffer
    pub(crate) fn from_bytes(bytes: Vec<u8>) -> SourceReader {
        SourceReader::Memory(Cursor::new(bytes))
    }

    /// Checks whether the stream starts with the CFB signature.
    /// The position is restored to the start afterwards.
    pub(crate) fn is_compound_file(&mut self) -> std::io::Result<bool> {
        let mut signature = [0u8; 8];
        self.rewind()?;
        let mut filled = 0;
        while filled < signature.len() {
            let count = self.read(&mut signature[filled..])?;
            if count == 0 {
                break;
            }
            filled += count;
        }
        self.rewind()?;
        Ok(filled == signature.len() && signature == CFB_SIGNATURE)
    }
}

impl Read for SourceReader {
    fn read(&mut self, buf: &mut [u8]) -> std::io::Result<usize> {
        match self {
            SourceReader::Local(reader) => reader.read(buf),
            SourceReader::Memory(reader) => reader.read(buf),
        }
    }
}

impl Seek for SourceReader {
    fn seek(&mut self, pos: std::io::SeekFrom) -> std::io::Result<u64> {
        match self {
            SourceReader::Local(reader) => reader.seek(pos),
            SourceReader::Memory(reader) => reader.seek(pos),
        }
    }
}
