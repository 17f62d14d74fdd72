//! Thin command-line driver.
//!
//! Reads the input files through the file-system host, runs the pipeline,
//! writes the outputs, and prints diagnostics. Project-file handling
//! (`tsconfig.json` and friends) is deliberately absent.

use crate::diagnostics::Severity;
use crate::module_namer::DefaultModuleNamer;
use crate::pipeline::{translate_program, TranslationOptions};
use crate::program::{CompilerHost, FsHost};
use anyhow::{bail, Context, Result};
use clap::Parser;
use std::path::PathBuf;

/// CLI arguments for the closurize binary.
#[derive(Parser, Debug)]
#[command(
    name = "closurize",
    version,
    about = "Translate TypeScript to Closure-annotated JavaScript"
)]
pub struct CliArgs {
    /// Write the collected externs to this file.
    #[arg(long)]
    pub externs: Option<PathBuf>,

    /// Directory for emitted .js files (defaults to alongside the inputs).
    #[arg(long = "outDir", alias = "out-dir")]
    pub out_dir: Option<PathBuf>,

    /// Annotate every type as {?}.
    #[arg(long)]
    pub untyped: bool,

    /// Disable the decorator downlevel pass.
    #[arg(long = "noDownlevelDecorators", alias = "no-downlevel-decorators")]
    pub no_downlevel_decorators: bool,

    /// Fast path: skip checking and annotation, only convert modules.
    #[arg(long)]
    pub dev: bool,

    /// Surface type-translation warnings.
    #[arg(short, long)]
    pub verbose: bool,

    /// Input files to translate.
    #[arg(value_name = "FILE", required = true)]
    pub files: Vec<PathBuf>,
}

/// Run the driver. Returns the process exit code.
pub fn run(args: CliArgs) -> Result<i32> {
    let host = FsHost;
    let namer = DefaultModuleNamer;
    let options = TranslationOptions {
        untyped: args.untyped,
        downlevel_decorators: !args.no_downlevel_decorators,
        dev_mode: args.dev,
        verbose: args.verbose,
    };
    let root_files: Vec<String> = args
        .files
        .iter()
        .map(|path| path.to_string_lossy().replace('\\', "/"))
        .collect();
    for file in &root_files {
        if !host.file_exists(file) {
            bail!("input file not found: {}", file);
        }
    }

    let result = translate_program(&host, &namer, &root_files, &options);

    for diagnostic in &result.diagnostics {
        if diagnostic.severity == Severity::Warning && !args.verbose {
            continue;
        }
        let source = host.read_file(&diagnostic.file_name).unwrap_or_default();
        eprintln!("{}", diagnostic.format(&source));
    }

    for (output_path, text) in &result.js_files {
        let target = match &args.out_dir {
            Some(dir) => dir.join(output_path),
            None => PathBuf::from(output_path),
        };
        if let Some(parent) = target.parent() {
            std::fs::create_dir_all(parent)
                .with_context(|| format!("creating {}", parent.display()))?;
        }
        std::fs::write(&target, text)
            .with_context(|| format!("writing {}", target.display()))?;
    }

    if let Some(externs_path) = &args.externs {
        std::fs::write(externs_path, &result.externs)
            .with_context(|| format!("writing {}", externs_path.display()))?;
    }

    Ok(if result.success { 0 } else { 1 })
}
