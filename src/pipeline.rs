//! End-to-end generation: parse → scan → extract → emit → render → commit
//!
//! Every unit is rendered fully in memory before anything is written. Each
//! artifact is then staged in a temporary file next to its target, and only
//! once every unit is staged are they renamed into place, so a failed run
//! never leaves a truncated or half-updated output.

use crate::config::{Config, OutputFormat};
use crate::frontend::Frontend;
use crate::marker::{self, MarkerConfig};
use crate::reflect::descriptor::DescriptorGraph;
use crate::reflect::emit::{self, LayoutOptions};
use crate::reflect::errors::ReflectError;
use crate::reflect::extract;
use crate::reflect::render;
use log::{debug, info, warn};
use rayon::prelude::*;
use rustc_hash::FxHashMap;
use std::io::Write;
use std::path::{Path, PathBuf};
use tempfile::NamedTempFile;

/// One input file and where its artifact goes
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Job {
    pub input: PathBuf,
    pub output: PathBuf,
}

/// A rendered artifact, ready to commit
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Rendered {
    pub job: Job,
    pub contents: String,
    pub aggregates: usize,
}

/// Parse `input` and build its descriptor graph
pub fn analyze<F: Frontend + ?Sized>(
    frontend: &F,
    config: &Config,
    input: &Path,
) -> Result<DescriptorGraph, ReflectError> {
    let parsed = frontend.parse(input)?;
    for diagnostic in &parsed.diagnostics {
        warn!("{}:{}", input.display(), diagnostic);
    }

    let interest = marker::scan(&parsed.unit, &MarkerConfig::from(config));
    let graph = extract::extract(&parsed.unit, &interest)?;
    debug!("{}: extracted {} aggregate(s)", input.display(), graph.len());
    Ok(graph)
}

/// Render the artifact for `input` without writing anything
pub fn render_unit<F: Frontend + ?Sized>(
    frontend: &F,
    config: &Config,
    job: &Job,
) -> Result<Rendered, ReflectError> {
    let graph = analyze(frontend, config, &job.input)?;
    let options = LayoutOptions {
        prefix: symbol_prefix(config, &job.input),
        registry: config.registry,
    };
    let artifact = emit::emit(&graph, &options)?;
    let contents = render::render(&artifact, config.format, &config.header_include)?;
    Ok(Rendered {
        job: job.clone(),
        contents,
        aggregates: artifact.aggregates.len(),
    })
}

/// Render every job in parallel, then commit them all.
///
/// Nothing is written unless every unit renders and stages successfully.
pub fn generate_all<F: Frontend + ?Sized>(
    frontend: &F,
    config: &Config,
    jobs: &[Job],
) -> Result<Vec<Rendered>, ReflectError> {
    check_distinct_outputs(jobs)?;

    let rendered = jobs
        .par_iter()
        .map(|job| render_unit(frontend, config, job))
        .collect::<Result<Vec<_>, _>>()?;

    let staged = rendered
        .iter()
        .map(|unit| stage(&unit.job.output, &unit.contents))
        .collect::<Result<Vec<_>, _>>()?;

    for (unit, temp) in rendered.iter().zip(staged) {
        persist(temp, &unit.job.output)?;
        info!(
            "{} -> {} ({} aggregate(s))",
            unit.job.input.display(),
            unit.job.output.display(),
            unit.aggregates
        );
    }
    Ok(rendered)
}

/// Reject job lists where two inputs would write the same artifact
pub fn check_distinct_outputs(jobs: &[Job]) -> Result<(), ReflectError> {
    let mut claimed: FxHashMap<&Path, &Path> = FxHashMap::default();
    for job in jobs {
        if let Some(first) = claimed.insert(&job.output, &job.input) {
            return Err(ReflectError::DuplicateOutput {
                path: job.output.clone(),
                first: first.to_path_buf(),
                second: job.input.clone(),
            });
        }
    }
    Ok(())
}

/// Atomically replace `path` with `contents`
pub fn commit(path: &Path, contents: &str) -> Result<(), ReflectError> {
    let temp = stage(path, contents)?;
    persist(temp, path)
}

/// Write `contents` to a temporary file in the directory of `path`.
///
/// Dropping the result without persisting it removes the file.
fn stage(path: &Path, contents: &str) -> Result<NamedTempFile, ReflectError> {
    let dir = match path.parent() {
        Some(parent) if !parent.as_os_str().is_empty() => parent,
        _ => Path::new("."),
    };
    let mut temp = NamedTempFile::new_in(dir).map_err(|e| ReflectError::io(dir, e))?;
    temp.write_all(contents.as_bytes())
        .and_then(|()| temp.flush())
        .map_err(|e| ReflectError::io(temp.path(), e))?;
    debug!("staged {} at {}", path.display(), temp.path().display());
    Ok(temp)
}

fn persist(temp: NamedTempFile, path: &Path) -> Result<(), ReflectError> {
    temp.persist(path)
        .map_err(|e| ReflectError::io(path, e.error))?;
    Ok(())
}

/// Configured prefix, or the input's stem as an identifier plus `_`
pub fn symbol_prefix(config: &Config, input: &Path) -> String {
    if let Some(prefix) = &config.symbol_prefix {
        return prefix.clone();
    }
    let stem = input
        .file_stem()
        .map(|s| s.to_string_lossy())
        .unwrap_or_default();
    let mut prefix: String = stem
        .chars()
        .map(|c| if c.is_ascii_alphanumeric() { c } else { '_' })
        .collect();
    if prefix.starts_with(|c: char| c.is_ascii_digit()) {
        prefix.insert(0, '_');
    }
    prefix.push('_');
    prefix
}

/// Where the artifact for `input` is written.
///
/// Without `out` it sits next to the input, named by
/// [`OutputFormat::artifact_name`].
/// `out` names the file itself for a single input, and a directory when
/// there are several inputs or it already is one.
pub fn output_path(input: &Path, out: Option<&Path>, format: OutputFormat, single: bool) -> PathBuf {
    let stem = input
        .file_stem()
        .map(|s| s.to_string_lossy())
        .unwrap_or_default();
    let file_name = format.artifact_name(&stem);
    match out {
        Some(out) if single && !out.is_dir() => out.to_path_buf(),
        Some(dir) => dir.join(file_name),
        None => input.with_file_name(file_name),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::frontend::CFrontend;
    use std::fs;

    const SOURCE: &str = "struct CINSPECT_STRUCT Point { int x; int y; };\n";

    #[test]
    fn test_symbol_prefix_from_stem() {
        let config = Config::default();
        assert_eq!(symbol_prefix(&config, Path::new("test/test_output.c")), "test_output_");
        assert_eq!(symbol_prefix(&config, Path::new("game-types.h")), "game_types_");
        assert_eq!(symbol_prefix(&config, Path::new("3d.c")), "_3d_");
        let custom = Config::new().with_symbol_prefix("g_");
        assert_eq!(symbol_prefix(&custom, Path::new("x.c")), "g_");
    }

    #[test]
    fn test_output_path() {
        let input = Path::new("src/scene.c");
        assert_eq!(
            output_path(input, None, OutputFormat::C, true),
            PathBuf::from("src/scene_structinfo.c")
        );
        assert_eq!(
            output_path(input, Some(Path::new("gen/out.c")), OutputFormat::C, true),
            PathBuf::from("gen/out.c")
        );
        assert_eq!(
            output_path(input, Some(Path::new("gen")), OutputFormat::Json, false),
            PathBuf::from("gen/scene_structinfo.json")
        );
    }

    #[test]
    fn test_commit_replaces_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("out.c");
        commit(&path, "first").unwrap();
        commit(&path, "second").unwrap();
        assert_eq!(std::fs::read_to_string(&path).unwrap(), "second");
        assert_eq!(std::fs::read_dir(dir.path()).unwrap().count(), 1);
    }

    #[test]
    fn test_same_stem_in_two_directories_is_rejected() {
        let root = tempfile::tempdir().unwrap();
        let out = root.path().join("out");
        fs::create_dir(&out).unwrap();
        let mut jobs = Vec::new();
        for sub in ["a", "b"] {
            let dir = root.path().join(sub);
            fs::create_dir(&dir).unwrap();
            let input = dir.join("x.c");
            fs::write(&input, SOURCE).unwrap();
            jobs.push(Job {
                output: output_path(&input, Some(&out), OutputFormat::C, false),
                input,
            });
        }

        match generate_all(&CFrontend::default(), &Config::default(), &jobs) {
            Err(ReflectError::DuplicateOutput { path, first, second }) => {
                assert_eq!(path, out.join("x_structinfo.c"));
                assert_eq!(first, jobs[0].input);
                assert_eq!(second, jobs[1].input);
            }
            other => panic!("Expected DuplicateOutput, got {:?}", other),
        }
        assert_eq!(fs::read_dir(&out).unwrap().count(), 0);
    }

    #[test]
    fn test_staging_failure_leaves_earlier_outputs_untouched() {
        let dir = tempfile::tempdir().unwrap();
        let first = dir.path().join("first.c");
        let second = dir.path().join("second.c");
        fs::write(&first, SOURCE).unwrap();
        fs::write(&second, SOURCE).unwrap();

        let kept = dir.path().join("first_structinfo.c");
        fs::write(&kept, "old").unwrap();
        let jobs = vec![
            Job {
                input: first,
                output: kept.clone(),
            },
            Job {
                input: second,
                output: dir.path().join("missing").join("second_structinfo.c"),
            },
        ];

        let err = generate_all(&CFrontend::default(), &Config::default(), &jobs).unwrap_err();
        assert!(matches!(err, ReflectError::Io { .. }), "{err}");
        assert_eq!(fs::read_to_string(&kept).unwrap(), "old");
        assert_eq!(fs::read_dir(dir.path()).unwrap().count(), 3);
    }
}
