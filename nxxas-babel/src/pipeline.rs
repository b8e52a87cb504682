//! Batch conversion
//!
//! A run expands file patterns lazily and pushes each match through
//! load → convert → save:
//!
//! ```text
//!     pattern ──glob──> file ──load──> record ──convert──> output ──save──> sink
//!                                        │
//!                                   index += 1
//! ```
//!
//! Every arrow is guarded on its own. A failure is logged against the input
//! file, recorded in the [`RunReport`] and skips only that unit of work: the
//! file, the record or the single output. Unsupported conversions are logged
//! as warnings, everything else as errors; both fail the run.
//!
//! The entry index counts decoded source records. All outputs of one source
//! share its index and are told apart by their mode.

use crate::container::OutputNaming;
use crate::convert::ConversionRegistry;
use crate::error::Error;
use crate::format::{Format, FormatOptions, RecordSink, SaveOutcome};
use crate::model::Record;
use crate::registry::FormatRegistry;
use std::fmt;
use std::fs;
use std::io;
use std::path::{Path, PathBuf};

/// What to do when the output already exists.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum Overwrite {
    /// Delete it and start a new file.
    #[default]
    Replace,
    /// Ask the confirmation callback; abort the run if it declines.
    Prompt,
    /// Abort the run.
    Refuse,
}

/// Stage of a unit of work, attached to every failure.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Stage {
    Expand,
    Load,
    Convert,
    Save,
}

impl fmt::Display for Stage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Stage::Expand => "expand",
            Stage::Load => "load",
            Stage::Convert => "convert",
            Stage::Save => "save",
        })
    }
}

/// One failed unit of work.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Failure {
    pub file: PathBuf,
    pub stage: Stage,
    pub message: String,
    pub expected: bool,
}

/// Outcome of a run.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RunReport {
    pub failures: Vec<Failure>,
    /// Locations of the records written, in order.
    pub written: Vec<String>,
    /// Records without data.
    pub skipped: usize,
}

impl RunReport {
    pub fn is_success(&self) -> bool {
        self.failures.is_empty()
    }

    /// 0 when every unit of work succeeded, 1 otherwise.
    pub fn exit_code(&self) -> i32 {
        if self.is_success() {
            0
        } else {
            1
        }
    }

    fn fail(&mut self, file: &Path, stage: Stage, err: Error) {
        let message = error_chain(&err);
        let expected = err.is_expected();
        let file_name = file.display();
        if expected {
            tracing::warn!(file = %file_name, %stage, "{message}");
        } else {
            tracing::error!(file = %file_name, %stage, "{message}");
        }
        self.failures.push(Failure {
            file: file.to_path_buf(),
            stage,
            message,
            expected,
        });
    }
}

/// `err` followed by its sources, separated by `: `.
fn error_chain(err: &dyn std::error::Error) -> String {
    let mut message = err.to_string();
    let mut source = err.source();
    while let Some(cause) = source {
        let text = cause.to_string();
        if !message.ends_with(&text) {
            message.push_str(": ");
            message.push_str(&text);
        }
        source = cause.source();
    }
    message
}

#[derive(Debug, Clone, Default)]
pub struct PipelineOptions {
    pub overwrite: Overwrite,
    pub format: FormatOptions,
}

impl PipelineOptions {
    pub fn with_naming(mut self, naming: OutputNaming) -> Self {
        self.format.naming = naming;
        self
    }
}

/// Converts batches of files into one output of a given format.
pub struct ConversionPipeline<'a> {
    formats: &'a FormatRegistry,
    conversions: &'a ConversionRegistry,
    options: PipelineOptions,
}

impl<'a> ConversionPipeline<'a> {
    pub fn new(
        formats: &'a FormatRegistry,
        conversions: &'a ConversionRegistry,
        options: PipelineOptions,
    ) -> Self {
        Self {
            formats,
            conversions,
            options,
        }
    }

    /// Convert every file matching `patterns` into `output`, written with the
    /// format named `output_format`.
    ///
    /// Failures of single units of work end up in the report. An `Err` means
    /// the run itself could not proceed: unknown format, output refused, or the
    /// output could not be opened or flushed.
    pub fn run<S: AsRef<str>>(
        &self,
        patterns: &[S],
        output: &Path,
        output_format: &str,
        confirm: &mut dyn FnMut(&Path) -> bool,
    ) -> Result<RunReport, Error> {
        let format = self.formats.get(output_format)?;
        if !format.supports_saving() {
            return Err(Error::unsupported(format!(
                "format '{output_format}' does not support saving"
            )));
        }
        self.prepare_output(output, confirm)?;
        let mut sink = format.sink(output, &self.options.format)?;

        tracing::info!(output = %output.display(), format = output_format, "conversion started");
        let mut report = RunReport::default();
        let mut index = 0;
        for pattern in patterns {
            self.run_pattern(pattern.as_ref(), format, sink.as_mut(), &mut index, &mut report);
        }
        sink.finish()?;

        tracing::info!(
            written = report.written.len(),
            skipped = report.skipped,
            failed = report.failures.len(),
            "conversion finished"
        );
        Ok(report)
    }

    fn prepare_output(&self, output: &Path, confirm: &mut dyn FnMut(&Path) -> bool) -> Result<(), Error> {
        if output.exists() {
            let replace = match self.options.overwrite {
                Overwrite::Replace => true,
                Overwrite::Prompt => confirm(output),
                Overwrite::Refuse => false,
            };
            if !replace {
                return Err(Error::io(
                    output,
                    io::Error::new(io::ErrorKind::AlreadyExists, "output exists, not replaced"),
                ));
            }
            tracing::debug!(output = %output.display(), "replacing existing output");
            fs::remove_file(output).map_err(|err| Error::io(output, err))?;
        }
        match output.parent() {
            Some(parent) if !parent.as_os_str().is_empty() => {
                fs::create_dir_all(parent).map_err(|err| Error::io(parent, err))
            }
            _ => Ok(()),
        }
    }

    fn run_pattern(
        &self,
        pattern: &str,
        format: &dyn Format,
        sink: &mut dyn RecordSink,
        index: &mut usize,
        report: &mut RunReport,
    ) {
        let paths = match glob::glob(pattern) {
            Ok(paths) => paths,
            Err(err) => {
                let err = io::Error::new(io::ErrorKind::InvalidInput, err.to_string());
                report.fail(Path::new(pattern), Stage::Expand, Error::io(pattern, err));
                return;
            }
        };
        let mut matched = 0;
        for entry in paths {
            matched += 1;
            match entry {
                Ok(path) => self.run_file(&path, format, sink, index, report),
                Err(err) => {
                    let path = err.path().to_path_buf();
                    report.fail(&path, Stage::Expand, Error::io(&path, err.into_error()));
                }
            }
        }
        if matched == 0 {
            tracing::warn!(pattern, "pattern matched no files");
        }
    }

    fn run_file(
        &self,
        path: &Path,
        format: &dyn Format,
        sink: &mut dyn RecordSink,
        index: &mut usize,
        report: &mut RunReport,
    ) {
        tracing::debug!(file = %path.display(), "loading");
        let records = match self
            .formats
            .detect(path)
            .and_then(|input| input.load(path, &self.options.format))
        {
            Ok(records) => records,
            Err(err) => return report.fail(path, Stage::Load, err),
        };
        for record in records {
            match record {
                Ok(record) => {
                    *index += 1;
                    self.run_record(path, record, format, sink, *index, report);
                }
                Err(err) => report.fail(path, Stage::Load, err),
            }
        }
    }

    fn run_record(
        &self,
        path: &Path,
        record: Record,
        format: &dyn Format,
        sink: &mut dyn RecordSink,
        index: usize,
        report: &mut RunReport,
    ) {
        let outputs = match self.conversions.convert(record, format.record_kind()) {
            Ok(outputs) => outputs,
            Err(err) => return report.fail(path, Stage::Convert, err),
        };
        let mut produced = 0;
        for output in outputs {
            let output = match output {
                Ok(output) => output,
                Err(err) => {
                    report.fail(path, Stage::Convert, err);
                    continue;
                }
            };
            produced += 1;
            match sink.save(&output, index) {
                Ok(SaveOutcome::Saved(location)) => {
                    tracing::info!(file = %path.display(), %location, "saved");
                    report.written.push(location);
                }
                Ok(SaveOutcome::SkippedNoData) => {
                    tracing::debug!(file = %path.display(), index, "no data, skipped");
                    report.skipped += 1;
                }
                Err(err) => report.fail(path, Stage::Save, err),
            }
        }
        if produced == 0 {
            tracing::debug!(file = %path.display(), index, "nothing to convert");
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::container::{NodePath, TreeContainer};
    use crate::format::Backend;

    const CO_FOIL: &str = "# XDI/1.0\n# Column.1: energy eV\n# Column.2: mutrans\n# Element.edge: K\n# Element.symbol: Co\n# ///\n# room temperature\n#----\n7509.0 -0.5\n7519.0 -0.7\n";
    const BOTH_MODES: &str = "# XDI/1.0\n# Column.1: energy eV\n# Column.2: mutrans\n# Column.3: mufluor\n# Element.edge: K\n# Element.symbol: Fe\n# ---\n7100 0.1 0.3\n7110 0.2 0.4\n";
    const NO_SPECTRUM: &str = "# XDI/1.0\n# Column.1: energy eV\n# Element.edge: K\n# Element.symbol: Fe\n# ---\n7100\n";

    struct Fixture {
        dir: tempfile::TempDir,
        formats: FormatRegistry,
        conversions: ConversionRegistry,
    }

    impl Fixture {
        fn new() -> Self {
            Self {
                dir: tempfile::tempdir().unwrap(),
                formats: FormatRegistry::with_defaults(),
                conversions: ConversionRegistry::with_defaults(),
            }
        }

        fn file(&self, name: &str, text: &str) -> PathBuf {
            let path = self.dir.path().join(name);
            fs::write(&path, text).unwrap();
            path
        }

        fn pattern(&self, glob: &str) -> String {
            self.dir.path().join(glob).display().to_string()
        }

        fn run(&self, mut options: PipelineOptions, format: &str, output: &Path) -> Result<RunReport, Error> {
            options.format.backend = Backend::Tree;
            let pipeline = ConversionPipeline::new(&self.formats, &self.conversions, options);
            pipeline.run(&[self.pattern("*.xdi")], output, format, &mut |_| false)
        }
    }

    #[test]
    fn failures_are_isolated_per_file() {
        let fx = Fixture::new();
        fx.file("a.xdi", CO_FOIL);
        fx.file("b.xdi", "# XDI/1.0\n# Element.symbol: Co\n# ---\n1 abc\n");
        fx.file("c.xdi", CO_FOIL);
        let output = fx.dir.path().join("out").join("all.nxs");

        let report = fx.run(PipelineOptions::default(), "nexus", &output).unwrap();

        assert_eq!(report.exit_code(), 1);
        assert_eq!(report.failures.len(), 1);
        assert!(report.failures[0].file.ends_with("b.xdi"));
        assert_eq!(report.failures[0].stage, Stage::Load);
        assert!(!report.failures[0].expected);
        assert_eq!(report.written.len(), 2);

        let tree = TreeContainer::load(&output).unwrap();
        assert!(tree.node(&NodePath::parse("/dataset01/energy").unwrap()).is_some());
        assert!(tree.node(&NodePath::parse("/dataset02/energy").unwrap()).is_some());
        assert!(tree.node(&NodePath::parse("/dataset03").unwrap()).is_none());
    }

    #[test]
    fn two_modes_share_one_entry_index() {
        let fx = Fixture::new();
        fx.file("fe.xdi", BOTH_MODES);
        let output = fx.dir.path().join("fe.nxs");

        let report = fx.run(PipelineOptions::default(), "nexus", &output).unwrap();

        assert!(report.is_success());
        let tree = TreeContainer::load(&output).unwrap();
        for mode in ["transmission", "fluorescence_yield"] {
            let path = NodePath::parse(&format!("/dataset01/{mode}/intensity")).unwrap();
            assert!(tree.node(&path).is_some(), "{path}");
        }
    }

    #[test]
    fn records_without_spectra_write_nothing() {
        let fx = Fixture::new();
        fx.file("fe.xdi", NO_SPECTRUM);
        let report = fx
            .run(PipelineOptions::default(), "nexus", &fx.dir.path().join("fe.nxs"))
            .unwrap();
        assert!(report.is_success());
        assert!(report.written.is_empty());
    }

    #[test]
    fn unrecognized_inputs_are_expected_failures() {
        let fx = Fixture::new();
        fx.file("notes.xdi", "just some notes\n");
        let report = fx
            .run(PipelineOptions::default(), "nexus", &fx.dir.path().join("out.nxs"))
            .unwrap();
        assert_eq!(report.failures.len(), 1);
        assert!(report.failures[0].expected);
        assert_eq!(report.exit_code(), 1);
    }

    #[test]
    fn xdi_output_writes_one_file_per_record() {
        let fx = Fixture::new();
        fx.file("a.xdi", CO_FOIL);
        fx.file("b.xdi", CO_FOIL);
        let output = fx.dir.path().join("out").join("co.txt");

        let report = fx.run(PipelineOptions::default(), "xdi", &output).unwrap();

        assert!(report.is_success());
        assert!(fx.dir.path().join("out/co_01.txt").exists());
        assert!(fx.dir.path().join("out/co_02.txt").exists());
    }

    #[test]
    fn existing_outputs_follow_the_overwrite_policy() {
        let fx = Fixture::new();
        fx.file("a.xdi", CO_FOIL);
        let output = fx.file("out.nxs", "stale");

        let refuse = PipelineOptions {
            overwrite: Overwrite::Refuse,
            ..PipelineOptions::default()
        };
        assert!(fx.run(refuse, "nexus", &output).is_err());
        assert_eq!(fs::read_to_string(&output).unwrap(), "stale");

        let prompt = PipelineOptions {
            overwrite: Overwrite::Prompt,
            ..PipelineOptions::default()
        };
        let pipeline = ConversionPipeline::new(&fx.formats, &fx.conversions, prompt);
        let mut asked = Vec::new();
        let report = pipeline
            .run(&[fx.pattern("*.xdi")], &output, "nexus", &mut |path| {
                asked.push(path.to_path_buf());
                true
            })
            .unwrap();
        assert_eq!(asked, vec![output.clone()]);
        assert!(report.is_success());
        assert!(TreeContainer::load(&output).is_ok());
    }

    #[test]
    fn unknown_output_format_aborts_the_run() {
        let fx = Fixture::new();
        let err = fx
            .run(PipelineOptions::default(), "csv", &fx.dir.path().join("out.csv"))
            .err()
            .unwrap();
        assert!(err.to_string().contains("csv"));
    }

    #[test]
    fn invalid_patterns_are_reported() {
        let fx = Fixture::new();
        let pipeline = ConversionPipeline::new(&fx.formats, &fx.conversions, PipelineOptions::default());
        let report = pipeline
            .run(&["a[b"], &fx.dir.path().join("out.nxs"), "nexus", &mut |_| false)
            .unwrap();
        assert_eq!(report.failures[0].stage, Stage::Expand);
    }

    #[test]
    fn error_chain_joins_sources() {
        let err = Error::io("a.xdi", io::Error::new(io::ErrorKind::NotFound, "gone"));
        assert_eq!(error_chain(&err), "a.xdi: gone");
    }
}
