//! Command implementations for the CLI tool.

use std::fs::File;
use std::io::{BufReader, BufWriter};
use std::path::{Path, PathBuf};

use ppmrc::volume::{FilePartSink, FilePartSource, PartConfig};
use ppmrc::write::{SplitOptions, SplitStrategy};
use ppmrc::{CoderOptions, Compressor, Expander, Model};

use crate::exit_codes::{ExitCode, error_to_exit_code};
use crate::output::create_formatter;
use crate::{ModelArgs, OutputFormat};

/// Configuration for the compress command.
pub struct CompressConfig<'a> {
    pub input: &'a Path,
    pub output: Option<&'a Path>,
    pub split: Option<u64>,
    pub pad: bool,
    pub strategy: SplitStrategy,
    pub model: &'a ModelArgs,
    pub format: OutputFormat,
    pub quiet: bool,
}

/// Configuration for the expand command.
pub struct ExpandConfig<'a> {
    pub input: &'a Path,
    pub output: Option<&'a Path>,
    pub parts: bool,
    pub model: &'a ModelArgs,
    pub format: OutputFormat,
    pub quiet: bool,
}

/// Compress command implementation
pub fn compress(config: &CompressConfig<'_>) -> ExitCode {
    let formatter = create_formatter(config.format);
    let (options, model) = match load_model(config.model) {
        Ok(pair) => pair,
        Err(code) => return code,
    };
    let mut compressor = match model {
        Some(model) => Compressor::with_model(model, &options),
        None => match Compressor::new(options) {
            Ok(c) => c,
            Err(e) => return report("Error", &e),
        },
    };

    let input = match File::open(config.input) {
        Ok(f) => f,
        Err(e) => {
            eprintln!("Error opening {}: {}", config.input.display(), e);
            return ExitCode::IoError;
        }
    };

    let result = match config.split {
        Some(part_max) => {
            let base = config
                .output
                .map(Path::to_path_buf)
                .unwrap_or_else(|| config.input.to_path_buf());
            let split = SplitOptions::new(part_max)
                .pad(config.pad)
                .strategy(config.strategy);
            let mut sink = FilePartSink::new(PartConfig::new(base, part_max));
            compressor.compress_split(input, &mut sink, &split)
        }
        None => {
            let output = config
                .output
                .map(Path::to_path_buf)
                .unwrap_or_else(|| with_suffix(config.input, ".ppm"));
            match File::create(&output) {
                Ok(f) => compressor.compress(input, BufWriter::new(f)),
                Err(e) => {
                    eprintln!("Error creating {}: {}", output.display(), e);
                    return ExitCode::IoError;
                }
            }
        }
    };

    let summary = match result {
        Ok(s) => s,
        Err(e) => return report("Compression failed", &e),
    };
    if let Some(code) = export_model(config.model, compressor.model()) {
        return code;
    }
    if !config.quiet {
        print!("{}", formatter.format_compress(&summary));
    }
    ExitCode::Success
}

/// Expand command implementation
pub fn expand(config: &ExpandConfig<'_>) -> ExitCode {
    let formatter = create_formatter(config.format);
    let (options, model) = match load_model(config.model) {
        Ok(pair) => pair,
        Err(code) => return code,
    };
    let mut expander = match model {
        Some(model) => Expander::with_model(model, &options),
        None => match Expander::new(options) {
            Ok(e) => e,
            Err(e) => return report("Error", &e),
        },
    };

    let output_path = config
        .output
        .map(Path::to_path_buf)
        .unwrap_or_else(|| default_expand_path(config.input));
    let output = match File::create(&output_path) {
        Ok(f) => BufWriter::new(f),
        Err(e) => {
            eprintln!("Error creating {}: {}", output_path.display(), e);
            return ExitCode::IoError;
        }
    };

    let result = if config.parts {
        let source = FilePartSource::new(PartConfig::with_default_size(config.input));
        expander.expand_parts(source, output)
    } else {
        match File::open(config.input) {
            Ok(f) => expander.expand(f, output),
            Err(e) => {
                eprintln!("Error opening {}: {}", config.input.display(), e);
                return ExitCode::IoError;
            }
        }
    };

    let summary = match result {
        Ok(s) => s,
        Err(e) => return report("Expansion failed", &e),
    };
    if let Some(code) = export_model(config.model, expander.model()) {
        return code;
    }
    if !config.quiet {
        print!("{}", formatter.format_expand(&summary));
    }
    ExitCode::Success
}

/// Train command implementation
pub fn train(
    input: &Path,
    output: &Path,
    model_args: &ModelArgs,
    format: OutputFormat,
    quiet: bool,
) -> ExitCode {
    let formatter = create_formatter(format);
    let (options, model) = match load_model(model_args) {
        Ok(pair) => pair,
        Err(code) => return code,
    };
    let mut expander = match model {
        Some(model) => Expander::with_model(model, &options),
        None => match Expander::new(options) {
            Ok(e) => e,
            Err(e) => return report("Error", &e),
        },
    };

    let coded = match File::open(input) {
        Ok(f) => f,
        Err(e) => {
            eprintln!("Error opening {}: {}", input.display(), e);
            return ExitCode::IoError;
        }
    };
    if let Err(e) = expander.train(coded) {
        return report("Training failed", &e);
    }

    let written = File::create(output)
        .map_err(ppmrc::Error::from)
        .and_then(|f| expander.export_model(BufWriter::new(f)));
    if let Err(e) = written {
        return report("Error writing model", &e);
    }
    if !quiet {
        print!("{}", formatter.format_model(expander.model()));
    }
    ExitCode::Success
}

/// Info command implementation
pub fn info(path: &Path, format: OutputFormat) -> ExitCode {
    let formatter = create_formatter(format);
    match read_model(path) {
        Ok(model) => {
            print!("{}", formatter.format_model(&model));
            ExitCode::Success
        }
        Err(e) => report("Error reading model", &e),
    }
}

/// Builds coder options from the flags, importing a model if one was given.
fn load_model(args: &ModelArgs) -> Result<(CoderOptions, Option<Model>), ExitCode> {
    let options = CoderOptions::new()
        .max_order(args.order)
        .map_err(|e| report("Error", &e))?
        .compatibility_mode(args.compat)
        .static_model(args.static_model);

    let model = match &args.model {
        Some(path) => {
            let mut model = read_model(path).map_err(|e| report("Error reading model", &e))?;
            model.set_adaptive(!args.static_model);
            Some(model)
        }
        None => None,
    };
    Ok((options, model))
}

fn read_model(path: &Path) -> ppmrc::Result<Model> {
    let file = File::open(path)?;
    Model::import(BufReader::new(file))
}

fn export_model(args: &ModelArgs, model: &Model) -> Option<ExitCode> {
    let path = args.export_model.as_ref()?;
    let written = File::create(path)
        .map_err(ppmrc::Error::from)
        .and_then(|f| model.export(BufWriter::new(f)));
    written.err().map(|e| report("Error writing model", &e))
}

fn report(context: &str, error: &ppmrc::Error) -> ExitCode {
    eprintln!("{}: {}", context, error);
    error_to_exit_code(error)
}

fn with_suffix(path: &Path, suffix: &str) -> PathBuf {
    let mut name = path.as_os_str().to_os_string();
    name.push(suffix);
    PathBuf::from(name)
}

fn default_expand_path(input: &Path) -> PathBuf {
    match input.extension() {
        Some(ext) if ext == "ppm" => input.with_extension(""),
        _ => with_suffix(input, ".out"),
    }
}
