use std::io::{BufRead, Read};
use flate2::bufread::MultiGzDecoder;

pub const GZIP_SUFFIX: &str = ".gz";

/// Reader over an activity file that may or may not be gzip-compressed.
/// Decompression happens on the fly; nothing is written back to disk.
pub struct PotentiallyCompressedStream<R: BufRead> {
    stream: PotentiallyCompressedStreamState<R>,
}

pub enum PotentiallyCompressedStreamState<R: BufRead> {
    Uncompressed(R),
    GzipCompressed(MultiGzDecoder<R>),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CompressionType {
    None,
    Gzip,
}

impl CompressionType {
    pub fn from_file_name(name: &str) -> Self {
        if name.ends_with(GZIP_SUFFIX) {
            CompressionType::Gzip
        } else {
            CompressionType::None
        }
    }
}

impl<R: BufRead> PotentiallyCompressedStream<R> {
    pub fn new(stream: R, kind: CompressionType) -> Self {
        let stream = match kind {
            CompressionType::None => PotentiallyCompressedStreamState::Uncompressed(stream),
            CompressionType::Gzip => PotentiallyCompressedStreamState::GzipCompressed(MultiGzDecoder::new(stream)),
        };
        Self { stream }
    }

    /// Reads the remaining (decompressed) contents as text.
    pub fn read_text(&mut self) -> std::io::Result<String> {
        let mut text = String::new();
        self.read_to_string(&mut text)?;
        Ok(text)
    }
}

impl<R: BufRead> Read for PotentiallyCompressedStream<R> {
    fn read(&mut self, buf: &mut [u8]) -> std::io::Result<usize> {
        match &mut self.stream {
            PotentiallyCompressedStreamState::Uncompressed(reader) => reader.read(buf),
            PotentiallyCompressedStreamState::GzipCompressed(decoder) => decoder.read(buf),
        }
    }
}
