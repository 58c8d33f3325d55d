use crate::config::schema::{CommandDef, ConverterDef};
use crate::convert::CadConverter;
use crate::error::TitleBlockError;
use std::path::{Path, PathBuf};
use std::process::{Command, Output};
use tracing::{debug, info};

/// Converter that drives an external program, one per CAD application.
///
/// Each conversion runs in a fresh temporary output directory; the PDF the
/// program leaves there is read back and returned.
pub struct CommandConverter {
    def: ConverterDef,
    extensions: Vec<String>,
}

impl CommandConverter {
    /// Run the startup hook (if any) and return a converter ready for use.
    pub fn start(def: ConverterDef) -> Result<Self, TitleBlockError> {
        if let Some(ref hook) = def.startup {
            info!(converter = %def.name, program = %hook.program, "starting converter host");
            run_hook(&def.name, "startup", hook)?;
        }
        let extensions = def
            .extensions
            .iter()
            .map(|e| e.trim().trim_start_matches('.').to_lowercase())
            .collect();
        Ok(CommandConverter { def, extensions })
    }

    fn expected_output_name(&self, stem: &str) -> String {
        match self.def.output_name {
            Some(ref template) => template.replace("{stem}", stem),
            None => format!("{stem}.pdf"),
        }
    }
}

impl CadConverter for CommandConverter {
    fn name(&self) -> &str {
        &self.def.name
    }

    fn extensions(&self) -> &[String] {
        &self.extensions
    }

    fn convert(&mut self, source: &Path) -> Result<Vec<u8>, TitleBlockError> {
        let failed = |reason: String| TitleBlockError::ConversionFailed {
            source_path: source.to_path_buf(),
            reason,
        };

        if !source.is_file() {
            return Err(failed("source file does not exist".into()));
        }
        let input = std::path::absolute(source)?;
        let stem = input
            .file_stem()
            .and_then(|s| s.to_str())
            .unwrap_or("output")
            .to_string();

        let outdir = tempfile::tempdir().map_err(|e| failed(e.to_string()))?;
        let output = outdir.path().join(self.expected_output_name(&stem));

        let vars = Placeholders {
            input: &input,
            output: &output,
            outdir: outdir.path(),
            stem: &stem,
        };
        let args: Vec<String> = self.def.args.iter().map(|a| vars.apply(a)).collect();

        debug!(converter = %self.def.name, program = %self.def.program, ?args, "running converter");
        let result = run(&self.def.program, &args)?;
        if !result.status.success() {
            let code = result.status.code().unwrap_or(-1);
            let stderr = String::from_utf8_lossy(&result.stderr).trim().to_string();
            return Err(failed(format!("{} exited with code {code}: {stderr}", self.def.program)));
        }

        let produced = locate_output(&output, outdir.path())
            .ok_or_else(|| failed(format!("{} produced no PDF", self.def.program)))?;
        let bytes = std::fs::read(&produced)?;
        if !bytes.starts_with(b"%PDF") {
            return Err(failed(format!("{} is not a PDF", produced.display())));
        }
        Ok(bytes)
    }

    fn shutdown(&mut self) -> Result<(), TitleBlockError> {
        match self.def.shutdown {
            Some(ref hook) => {
                info!(converter = %self.def.name, program = %hook.program, "stopping converter host");
                run_hook(&self.def.name, "shutdown", hook)
            }
            None => Ok(()),
        }
    }
}

struct Placeholders<'a> {
    input: &'a Path,
    output: &'a Path,
    outdir: &'a Path,
    stem: &'a str,
}

impl Placeholders<'_> {
    fn apply(&self, arg: &str) -> String {
        arg.replace("{input}", &self.input.to_string_lossy())
            .replace("{output}", &self.output.to_string_lossy())
            .replace("{outdir}", &self.outdir.to_string_lossy())
            .replace("{stem}", self.stem)
    }
}

fn run(program: &str, args: &[String]) -> Result<Output, TitleBlockError> {
    Command::new(program).args(args).output().map_err(|e| {
        if e.kind() == std::io::ErrorKind::NotFound {
            TitleBlockError::ConverterNotFound {
                program: program.to_string(),
            }
        } else {
            TitleBlockError::Io(e)
        }
    })
}

fn run_hook(name: &str, stage: &'static str, hook: &CommandDef) -> Result<(), TitleBlockError> {
    let output = run(&hook.program, &hook.args)?;
    if output.status.success() {
        return Ok(());
    }
    Err(TitleBlockError::ConverterCommand {
        name: name.to_string(),
        stage,
        reason: format!(
            "exit code {}: {}",
            output.status.code().unwrap_or(-1),
            String::from_utf8_lossy(&output.stderr).trim()
        ),
    })
}

/// The expected output file, or else the only PDF the program wrote.
fn locate_output(expected: &Path, outdir: &Path) -> Option<PathBuf> {
    if expected.is_file() {
        return Some(expected.to_path_buf());
    }
    let mut pdfs: Vec<PathBuf> = std::fs::read_dir(outdir)
        .ok()?
        .flatten()
        .map(|e| e.path())
        .filter(|p| {
            p.extension()
                .is_some_and(|ext| ext.eq_ignore_ascii_case("pdf"))
        })
        .collect();
    if pdfs.len() == 1 {
        pdfs.pop()
    } else {
        None
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::convert::has_extension;

    fn def(program: &str, args: &[&str]) -> ConverterDef {
        ConverterDef {
            name: "test".into(),
            extensions: vec![".SLDDRW".into()],
            program: program.into(),
            args: args.iter().map(|s| s.to_string()).collect(),
            output_name: None,
            startup: None,
            shutdown: None,
        }
    }

    #[test]
    fn test_placeholders_are_substituted() {
        let vars = Placeholders {
            input: Path::new("/in/part.slddrw"),
            output: Path::new("/out/part.pdf"),
            outdir: Path::new("/out"),
            stem: "part",
        };
        assert_eq!(vars.apply("--in={input}"), "--in=/in/part.slddrw");
        assert_eq!(vars.apply("{outdir}/{stem}.pdf"), "/out/part.pdf");
        assert_eq!(vars.apply("{output}"), "/out/part.pdf");
        assert_eq!(vars.apply("-silent"), "-silent");
    }

    #[test]
    fn test_extensions_are_normalized() {
        let conv = CommandConverter::start(def("true", &[])).unwrap();
        assert_eq!(conv.extensions(), &["slddrw".to_string()]);
        assert!(has_extension(Path::new("A.SldDrw"), conv.extensions()));
    }

    #[test]
    fn test_output_name_template() {
        let mut d = def("true", &[]);
        d.output_name = Some("{stem}-sheet1.pdf".into());
        let conv = CommandConverter::start(d).unwrap();
        assert_eq!(conv.expected_output_name("part"), "part-sheet1.pdf");
    }

    #[test]
    fn test_missing_program_reported() {
        let dir = tempfile::tempdir().unwrap();
        let src = dir.path().join("a.slddrw");
        std::fs::write(&src, b"x").unwrap();
        let mut conv =
            CommandConverter::start(def("titleblock-no-such-program", &["{input}"])).unwrap();
        let err = conv.convert(&src).unwrap_err();
        assert!(matches!(err, TitleBlockError::ConverterNotFound { .. }));
    }

    #[test]
    fn test_missing_source_reported() {
        let mut conv = CommandConverter::start(def("true", &[])).unwrap();
        let err = conv.convert(Path::new("/nonexistent/a.slddrw")).unwrap_err();
        assert!(matches!(err, TitleBlockError::ConversionFailed { .. }));
    }

    #[cfg(unix)]
    #[test]
    fn test_shell_converter_round_trip() {
        let dir = tempfile::tempdir().unwrap();
        let src = dir.path().join("part.slddrw");
        std::fs::write(&src, b"%PDF-1.4 fake").unwrap();
        // `cp` stands in for a CAD exporter writing {output}.
        let mut conv = CommandConverter::start(def("cp", &["{input}", "{output}"])).unwrap();
        let bytes = conv.convert(&src).unwrap();
        assert_eq!(bytes, b"%PDF-1.4 fake");
        conv.shutdown().unwrap();
    }

    #[cfg(unix)]
    #[test]
    fn test_failing_startup_hook() {
        let mut d = def("true", &[]);
        d.startup = Some(CommandDef {
            program: "false".into(),
            args: vec![],
        });
        let err = CommandConverter::start(d).err().unwrap();
        assert!(matches!(err, TitleBlockError::ConverterCommand { stage: "startup", .. }));
    }
}
