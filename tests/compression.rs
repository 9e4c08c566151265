#[cfg(any(
    feature = "compression-gzip",
    feature = "compression-zstd",
    feature = "compression-bzip2",
    feature = "compression-xz"
))]
mod compression_tests {
    use anyhow::Result;
    use fss::io::compression::{
        CompressionCodec, FinishWrite, auto_detect_reader, auto_detect_writer, codec_for_path,
        register_codec,
    };
    use fss::testing::*;
    use fss::{Pipeline, PipelineConfig, Source};
    use serde_json::Value;
    use std::fs::File;
    use std::io::{Read, Write};
    use std::path::{Path, PathBuf};
    use std::sync::Arc;
    use std::sync::atomic::{AtomicBool, Ordering};
    use tempfile::TempDir;

    /// Write `data` to `path`, compressed according to `codec_hint`.
    fn write_compressed(path: &Path, codec_hint: &str, data: impl AsRef<[u8]>) -> Result<()> {
        let file = File::create(path)?;
        let mut writer = auto_detect_writer(file, codec_hint)?;
        writer.write_all(data.as_ref())?;
        writer.finish()?;
        Ok(())
    }

    fn flatten_files(paths: &[PathBuf]) -> Result<Vec<Value>> {
        let sources: Vec<Source> = paths.iter().cloned().map(Source::Path).collect();
        let pipeline = Pipeline::new(PipelineConfig {
            workers: 2,
            ..PipelineConfig::default()
        })?;
        let mut out = Vec::new();
        pipeline.run(&sources, &mut out)?;
        output_lines(&out)?
            .iter()
            .map(|line| Ok(serde_json::from_str(line)?))
            .collect()
    }

    fn check_extension(ext: &str) -> Result<()> {
        let dir = TempDir::new()?;
        let path = dir.path().join(format!("dump.json{ext}"));
        let input = sample_dump();
        write_compressed(&path, path.to_str().unwrap(), &input)?;

        let raw = std::fs::read(&path)?;
        assert_ne!(raw, input.as_bytes(), "{ext} file was not compressed");

        let docs = flatten_files(&[path])?;
        assert_documents_unordered_equal(&docs, &expected_documents(&input)?);
        Ok(())
    }

    /// Compressed content under a name with no compression extension.
    fn check_magic(ext: &str) -> Result<()> {
        let dir = TempDir::new()?;
        let path = dir.path().join("dump.json");
        let input = generated_dump(4, 25);
        write_compressed(&path, &format!("hint{ext}"), &input)?;

        let docs = flatten_files(&[path])?;
        assert_documents_unordered_equal(&docs, &expected_documents(&input)?);
        Ok(())
    }

    #[cfg(feature = "compression-gzip")]
    #[test]
    fn gzip_input() -> Result<()> {
        check_extension(".gz")?;
        check_magic(".gz")
    }

    #[cfg(feature = "compression-gzip")]
    #[test]
    fn concatenated_gzip_members() -> Result<()> {
        let dir = TempDir::new()?;
        let path = dir.path().join("dump.json.gz");
        let input = sample_dump();
        let (head, tail) = input.as_bytes().split_at(input.len() / 2);

        let first = dir.path().join("a.gz");
        let second = dir.path().join("b.gz");
        write_compressed(&first, "a.gz", head)?;
        write_compressed(&second, "b.gz", tail)?;
        let mut joined = std::fs::read(&first)?;
        joined.extend(std::fs::read(&second)?);
        std::fs::write(&path, joined)?;

        let docs = flatten_files(&[path])?;
        assert_documents_unordered_equal(&docs, &expected_documents(&input)?);
        Ok(())
    }

    /// Accepts writes until `broken` is set.
    struct BreakableSink {
        broken: Arc<AtomicBool>,
    }

    impl Write for BreakableSink {
        fn write(&mut self, buf: &[u8]) -> std::io::Result<usize> {
            if self.broken.load(Ordering::SeqCst) {
                return Err(std::io::Error::other("device gone"));
            }
            Ok(buf.len())
        }

        fn flush(&mut self) -> std::io::Result<()> {
            Ok(())
        }
    }

    /// The trailer is written by `finish`, so its failure must be reported there.
    fn check_finish_reports_trailer_error(ext: &str) -> Result<()> {
        let broken = Arc::new(AtomicBool::new(false));
        let sink = BreakableSink {
            broken: Arc::clone(&broken),
        };
        let mut writer = auto_detect_writer(sink, format!("out.jsonl{ext}"))?;
        writer.write_all(sample_dump().as_bytes())?;
        writer.flush()?;

        broken.store(true, Ordering::SeqCst);
        let err = writer.finish().expect_err("trailer write must fail");
        assert_eq!(err.to_string(), "device gone");
        Ok(())
    }

    #[cfg(feature = "compression-gzip")]
    #[test]
    fn gzip_finish_reports_trailer_error() -> Result<()> {
        check_finish_reports_trailer_error(".gz")
    }

    #[cfg(feature = "compression-zstd")]
    #[test]
    fn zstd_finish_reports_trailer_error() -> Result<()> {
        check_finish_reports_trailer_error(".zst")
    }

    #[cfg(feature = "compression-zstd")]
    #[test]
    fn zstd_input() -> Result<()> {
        check_extension(".zst")?;
        check_magic(".zst")
    }

    #[cfg(feature = "compression-bzip2")]
    #[test]
    fn bzip2_input() -> Result<()> {
        check_extension(".bz2")?;
        check_magic(".bz2")
    }

    #[cfg(feature = "compression-xz")]
    #[test]
    fn xz_input() -> Result<()> {
        check_extension(".xz")?;
        check_magic(".xz")
    }

    #[cfg(feature = "compression-gzip")]
    #[test]
    fn extension_match_ignores_case() {
        assert!(codec_for_path("DUMP.JSON.GZ").is_some());
        assert!(codec_for_path("dump.json").is_none());
    }

    #[test]
    fn plain_input_passes_through() -> Result<()> {
        let dir = TempDir::new()?;
        let path = dir.path().join("dump.json");
        let input = sample_dump();
        std::fs::write(&path, &input)?;

        let mut text = String::new();
        auto_detect_reader(File::open(&path)?, &path)?.read_to_string(&mut text)?;
        assert_eq!(text, input);
        Ok(())
    }

    #[cfg(feature = "compression-gzip")]
    #[test]
    fn compressed_output_reads_back() -> Result<()> {
        let dir = TempDir::new()?;
        let path = dir.path().join("out.jsonl.gz");
        let input = sample_dump();

        let pipeline = Pipeline::new(PipelineConfig::default())?;
        let mut sink = auto_detect_writer(File::create(&path)?, &path)?;
        pipeline.run(&[MemoryInput::new("sample", input.as_str())], &mut sink)?;
        sink.finish()?;

        let mut text = String::new();
        auto_detect_reader(File::open(&path)?, &path)?.read_to_string(&mut text)?;
        let lines = output_lines(text.as_bytes())?;
        assert_compact_lines(&lines);
        let docs: Vec<Value> = lines
            .iter()
            .map(|line| serde_json::from_str(line))
            .collect::<Result<_, _>>()?;
        assert_documents_unordered_equal(&docs, &expected_documents(&input)?);
        Ok(())
    }

    #[test]
    fn custom_codec() -> Result<()> {
        /// Stores bytes unchanged under its own extension.
        struct PassthroughCodec;

        impl CompressionCodec for PassthroughCodec {
            fn name(&self) -> &str {
                "passthrough"
            }

            fn extensions(&self) -> &[&str] {
                &[".fsstest"]
            }

            fn magic_bytes(&self) -> Option<&[u8]> {
                None
            }

            fn wrap_reader_dyn(&self, reader: Box<dyn Read>) -> std::io::Result<Box<dyn Read>> {
                Ok(reader)
            }

            fn wrap_writer_dyn(
                &self,
                writer: Box<dyn Write + Send>,
            ) -> std::io::Result<Box<dyn FinishWrite>> {
                Ok(Box::new(writer))
            }
        }

        register_codec(Arc::new(PassthroughCodec));
        let codec = codec_for_path("dump.json.fsstest").expect("codec registered");
        assert_eq!(codec.name(), "passthrough");

        let dir = TempDir::new()?;
        let path = dir.path().join("dump.json.fsstest");
        let input = sample_dump();
        write_compressed(&path, path.to_str().unwrap(), &input)?;
        assert_eq!(std::fs::read_to_string(&path)?, input);

        let docs = flatten_files(&[path])?;
        assert_documents_unordered_equal(&docs, &expected_documents(&input)?);
        Ok(())
    }
}
