//! Argument resolution and file inputs.

use anyhow::Result;
use fss::testing::*;
use fss::{Input, Pipeline, PipelineConfig, STDIN_SENTINEL, Source};
use std::fs::create_dir_all;
use std::path::PathBuf;
use tempfile::TempDir;

#[test]
fn no_arguments_means_stdin() -> Result<()> {
    let none: [&str; 0] = [];
    assert_eq!(Source::from_args(&none)?, vec![Source::Stdin]);
    Ok(())
}

#[test]
fn dash_means_stdin() -> Result<()> {
    assert_eq!(
        Source::from_args(&[STDIN_SENTINEL, "dump.json"])?,
        vec![Source::Stdin, Source::Path(PathBuf::from("dump.json"))]
    );
    assert_eq!(Source::Stdin.to_string(), "<stdin>");
    assert_eq!(Source::Stdin.name(), "<stdin>");
    Ok(())
}

#[test]
fn glob_expands_sorted_files_only() -> Result<()> {
    let dir = TempDir::new()?;
    let base = dir.path();
    std::fs::write(base.join("b.json"), "[]")?;
    std::fs::write(base.join("a.json"), "[]")?;
    std::fs::write(base.join("notes.txt"), "")?;
    create_dir_all(base.join("c.json"))?;

    let pattern = format!("{}/*.json", base.display());
    assert_eq!(
        Source::from_args(&[pattern])?,
        vec![
            Source::Path(base.join("a.json")),
            Source::Path(base.join("b.json")),
        ]
    );
    Ok(())
}

#[test]
fn glob_without_matches_is_an_error() -> Result<()> {
    let dir = TempDir::new()?;
    let pattern = format!("{}/*.json", dir.path().display());

    let err = Source::from_args(&[pattern]).expect_err("empty glob must fail");
    assert!(err.to_string().contains("no files found"), "{err:#}");
    Ok(())
}

#[test]
fn existing_file_with_glob_characters_is_literal() -> Result<()> {
    let dir = TempDir::new()?;
    let path = dir.path().join("dump[1].json");
    std::fs::write(&path, "[]")?;

    let arg = path.to_string_lossy().into_owned();
    assert_eq!(Source::from_args(&[arg])?, vec![Source::Path(path)]);
    Ok(())
}

#[test]
fn files_from_a_glob_are_flattened_together() -> Result<()> {
    let dir = TempDir::new()?;
    let first = generated_dump(2, 2);
    let second = sample_dump();
    std::fs::write(dir.path().join("part-1.json"), &first)?;
    std::fs::write(dir.path().join("part-2.json"), &second)?;

    let sources = Source::from_args(&[format!("{}/part-*.json", dir.path().display())])?;
    let pipeline = Pipeline::new(PipelineConfig::default())?;
    let mut out = Vec::new();
    let summary = pipeline.run(&sources, &mut out)?;

    let mut expected = expected_documents(&first)?;
    expected.extend(expected_documents(&second)?);
    let docs: Vec<serde_json::Value> = output_lines(&out)?
        .iter()
        .map(|line| serde_json::from_str(line))
        .collect::<Result<_, _>>()?;
    assert_documents_unordered_equal(&docs, &expected);
    assert_eq!(summary.sources, 2);
    Ok(())
}

#[test]
fn missing_file_fails_with_its_name() -> Result<()> {
    let dir = TempDir::new()?;
    let path = dir.path().join("missing.json");
    let pipeline = Pipeline::new(PipelineConfig::default())?;

    let err = pipeline
        .run(&[Source::Path(path.clone())], &mut Vec::<u8>::new())
        .expect_err("missing file must fail");

    assert!(err.to_string().starts_with("open "), "{err:#}");
    assert!(err.to_string().contains("missing.json"), "{err:#}");
    let io_err = err
        .downcast_ref::<std::io::Error>()
        .expect("root cause is an I/O error");
    assert_eq!(io_err.kind(), std::io::ErrorKind::NotFound);
    Ok(())
}
