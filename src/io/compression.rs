//! Transparent compression for inputs and the output file.
//!
//! `sstabledump` output is large and usually archived compressed, so inputs
//! are unwrapped automatically: first by file extension, then by the magic
//! bytes at the start of the stream (which also covers standard input). The
//! optional output file is compressed when its extension names a codec, and
//! is only complete after [`FinishWrite::finish`].
//!
//! Built-in codecs, each behind a feature flag:
//! - **gzip** (`.gz`, `.gzip`) - `compression-gzip`
//! - **zstd** (`.zst`, `.zstd`) - `compression-zstd`
//! - **bzip2** (`.bz2`, `.bzip2`) - `compression-bzip2`
//! - **xz** (`.xz`) - `compression-xz`
//!
//! Further codecs can be added at runtime with [`register_codec`].
//!
//! ```no_run
//! use fss::io::compression::auto_detect_reader;
//! use std::fs::File;
//! # fn main() -> anyhow::Result<()> {
//! let file = File::open("dump.json.gz")?;
//! let reader = auto_detect_reader(file, "dump.json.gz")?;
//! # Ok(())
//! # }
//! ```

use anyhow::{Context, Result};
use std::io::{BufRead, BufReader, BufWriter, Read, Write};
use std::path::Path;
use std::sync::{Arc, LazyLock, PoisonError, RwLock};

static CODECS: LazyLock<RwLock<Vec<Arc<dyn CompressionCodec>>>> =
    LazyLock::new(|| RwLock::new(builtin_codecs()));

fn builtin_codecs() -> Vec<Arc<dyn CompressionCodec>> {
    vec![
        #[cfg(feature = "compression-gzip")]
        Arc::new(GzipCodec),
        #[cfg(feature = "compression-zstd")]
        Arc::new(ZstdCodec),
        #[cfg(feature = "compression-bzip2")]
        Arc::new(Bzip2Codec),
        #[cfg(feature = "compression-xz")]
        Arc::new(XzCodec),
    ]
}

fn codecs() -> Vec<Arc<dyn CompressionCodec>> {
    CODECS
        .read()
        .unwrap_or_else(PoisonError::into_inner)
        .clone()
}

/// Add a codec to the set consulted by [`auto_detect_reader`] and
/// [`auto_detect_writer`]. Built-in codecs are checked first.
pub fn register_codec(codec: Arc<dyn CompressionCodec>) {
    CODECS
        .write()
        .unwrap_or_else(PoisonError::into_inner)
        .push(codec);
}

/// A compression format that can wrap readers and writers.
///
/// Implementations live in a process-wide registry and must be `Send + Sync`.
pub trait CompressionCodec: Send + Sync {
    /// Short name used in error context (e.g. `"gzip"`).
    fn name(&self) -> &str;

    /// Lowercase file extensions including the leading dot.
    fn extensions(&self) -> &[&str];

    /// Signature at the start of a compressed stream, if the format has one.
    fn magic_bytes(&self) -> Option<&[u8]>;

    /// Wrap `reader` so that reads yield decompressed bytes.
    fn wrap_reader_dyn(&self, reader: Box<dyn Read>) -> std::io::Result<Box<dyn Read>>;

    /// Wrap `writer` so that written bytes are compressed.
    fn wrap_writer_dyn(&self, writer: Box<dyn Write + Send>)
    -> std::io::Result<Box<dyn FinishWrite>>;
}

/// A writer whose stream must be completed explicitly.
///
/// Compressors write their trailer in [`finish`](Self::finish). Dropping one
/// unfinished may truncate the output, and any error at that point is lost.
pub trait FinishWrite: Write + Send {
    /// Write any trailer and flush everything down to the underlying writer.
    ///
    /// # Errors
    /// Returns the first I/O error raised while completing the stream.
    fn finish(self: Box<Self>) -> std::io::Result<()>;
}

impl<W: Write + Send> FinishWrite for BufWriter<W> {
    fn finish(mut self: Box<Self>) -> std::io::Result<()> {
        self.flush()
    }
}

impl FinishWrite for Box<dyn Write + Send> {
    fn finish(mut self: Box<Self>) -> std::io::Result<()> {
        self.flush()
    }
}

/// Codec whose extension ends `path`, case-insensitively.
#[must_use]
pub fn codec_for_path(path: impl AsRef<Path>) -> Option<Arc<dyn CompressionCodec>> {
    let name = path.as_ref().to_string_lossy().to_lowercase();
    codecs()
        .into_iter()
        .find(|codec| codec.extensions().iter().any(|ext| name.ends_with(ext)))
}

/// Codec whose magic bytes start the buffered stream. Does not consume input.
fn codec_for_magic<R: BufRead>(reader: &mut R) -> Option<Arc<dyn CompressionCodec>> {
    let head = reader.fill_buf().ok()?;
    if head.is_empty() {
        return None;
    }
    codecs().into_iter().find(|codec| {
        codec
            .magic_bytes()
            .is_some_and(|magic| head.starts_with(magic))
    })
}

/// Wrap `reader` with a decompressor when `path_hint` or the stream's first
/// bytes identify a codec; otherwise return it buffered and unchanged.
///
/// # Errors
/// Returns an error if the codec fails to initialise.
pub fn auto_detect_reader<R: Read + 'static>(
    reader: R,
    path_hint: impl AsRef<Path>,
) -> Result<Box<dyn Read>> {
    if let Some(codec) = codec_for_path(&path_hint) {
        return codec
            .wrap_reader_dyn(Box::new(reader))
            .with_context(|| format!("wrap reader with {} codec", codec.name()));
    }

    let mut buffered = BufReader::new(reader);
    if let Some(codec) = codec_for_magic(&mut buffered) {
        return codec
            .wrap_reader_dyn(Box::new(buffered))
            .with_context(|| format!("wrap reader with {} codec", codec.name()));
    }
    Ok(Box::new(buffered))
}

/// Wrap `writer` with a compressor when the extension of `path_hint`
/// identifies a codec; otherwise return it buffered.
///
/// Call [`FinishWrite::finish`] once all data is written; only then is a
/// compressed stream complete.
///
/// # Errors
/// Returns an error if the codec fails to initialise.
pub fn auto_detect_writer<W: Write + Send + 'static>(
    writer: W,
    path_hint: impl AsRef<Path>,
) -> Result<Box<dyn FinishWrite>> {
    if let Some(codec) = codec_for_path(&path_hint) {
        return codec
            .wrap_writer_dyn(Box::new(writer))
            .with_context(|| format!("wrap writer with {} codec", codec.name()));
    }
    Ok(Box::new(BufWriter::new(writer)))
}

#[cfg(feature = "compression-gzip")]
struct GzipCodec;

#[cfg(feature = "compression-gzip")]
impl CompressionCodec for GzipCodec {
    fn name(&self) -> &str {
        "gzip"
    }

    fn extensions(&self) -> &[&str] {
        &[".gz", ".gzip"]
    }

    fn magic_bytes(&self) -> Option<&[u8]> {
        Some(&[0x1f, 0x8b])
    }

    fn wrap_reader_dyn(&self, reader: Box<dyn Read>) -> std::io::Result<Box<dyn Read>> {
        // concatenated members are common in rotated dumps
        Ok(Box::new(flate2::read::MultiGzDecoder::new(reader)))
    }

    fn wrap_writer_dyn(
        &self,
        writer: Box<dyn Write + Send>,
    ) -> std::io::Result<Box<dyn FinishWrite>> {
        use flate2::Compression;
        use flate2::write::GzEncoder;
        Ok(Box::new(GzEncoder::new(writer, Compression::default())))
    }
}

#[cfg(feature = "compression-gzip")]
impl<W: Write + Send> FinishWrite for flate2::write::GzEncoder<W> {
    fn finish(self: Box<Self>) -> std::io::Result<()> {
        flate2::write::GzEncoder::finish(*self)?.flush()
    }
}

#[cfg(feature = "compression-zstd")]
struct ZstdCodec;

#[cfg(feature = "compression-zstd")]
impl CompressionCodec for ZstdCodec {
    fn name(&self) -> &str {
        "zstd"
    }

    fn extensions(&self) -> &[&str] {
        &[".zst", ".zstd"]
    }

    fn magic_bytes(&self) -> Option<&[u8]> {
        Some(&[0x28, 0xb5, 0x2f, 0xfd])
    }

    fn wrap_reader_dyn(&self, reader: Box<dyn Read>) -> std::io::Result<Box<dyn Read>> {
        zstd::stream::read::Decoder::new(reader).map(|d| Box::new(d) as Box<dyn Read>)
    }

    fn wrap_writer_dyn(
        &self,
        writer: Box<dyn Write + Send>,
    ) -> std::io::Result<Box<dyn FinishWrite>> {
        zstd::stream::write::Encoder::new(writer, 3)
            .map(|e| Box::new(e) as Box<dyn FinishWrite>)
    }
}

#[cfg(feature = "compression-zstd")]
impl<W: Write + Send> FinishWrite for zstd::stream::write::Encoder<'static, W> {
    fn finish(self: Box<Self>) -> std::io::Result<()> {
        zstd::stream::write::Encoder::finish(*self)?.flush()
    }
}

#[cfg(feature = "compression-bzip2")]
struct Bzip2Codec;

#[cfg(feature = "compression-bzip2")]
impl CompressionCodec for Bzip2Codec {
    fn name(&self) -> &str {
        "bzip2"
    }

    fn extensions(&self) -> &[&str] {
        &[".bz2", ".bzip2"]
    }

    fn magic_bytes(&self) -> Option<&[u8]> {
        Some(b"BZh")
    }

    fn wrap_reader_dyn(&self, reader: Box<dyn Read>) -> std::io::Result<Box<dyn Read>> {
        Ok(Box::new(bzip2::read::MultiBzDecoder::new(reader)))
    }

    fn wrap_writer_dyn(
        &self,
        writer: Box<dyn Write + Send>,
    ) -> std::io::Result<Box<dyn FinishWrite>> {
        use bzip2::Compression;
        use bzip2::write::BzEncoder;
        Ok(Box::new(BzEncoder::new(writer, Compression::default())))
    }
}

#[cfg(feature = "compression-bzip2")]
impl<W: Write + Send> FinishWrite for bzip2::write::BzEncoder<W> {
    fn finish(self: Box<Self>) -> std::io::Result<()> {
        bzip2::write::BzEncoder::finish(*self)?.flush()
    }
}

#[cfg(feature = "compression-xz")]
struct XzCodec;

#[cfg(feature = "compression-xz")]
impl CompressionCodec for XzCodec {
    fn name(&self) -> &str {
        "xz"
    }

    fn extensions(&self) -> &[&str] {
        &[".xz"]
    }

    fn magic_bytes(&self) -> Option<&[u8]> {
        Some(&[0xfd, 0x37, 0x7a, 0x58, 0x5a, 0x00])
    }

    fn wrap_reader_dyn(&self, reader: Box<dyn Read>) -> std::io::Result<Box<dyn Read>> {
        Ok(Box::new(xz2::read::XzDecoder::new_multi_decoder(reader)))
    }

    fn wrap_writer_dyn(
        &self,
        writer: Box<dyn Write + Send>,
    ) -> std::io::Result<Box<dyn FinishWrite>> {
        Ok(Box::new(xz2::write::XzEncoder::new(writer, 6)))
    }
}

#[cfg(feature = "compression-xz")]
impl<W: Write + Send> FinishWrite for xz2::write::XzEncoder<W> {
    fn finish(self: Box<Self>) -> std::io::Result<()> {
        xz2::write::XzEncoder::finish(*self)?.flush()
    }
}
