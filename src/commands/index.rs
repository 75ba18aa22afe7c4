//! Index command handler

use std::fs::{self, File};
use std::io::{self, BufWriter, Write};
use std::path::Path;

use anyhow::{Context, Result};
use humansize::{format_size, BINARY};

use cdxj_indexer::cli::IndexArgs;
use cdxj_indexer::output::{CompressingWriter, LineSink, PlainWriter, SortingWriter};
use cdxj_indexer::{Indexer, IndexerOptions, Input};

/// Load options, apply the flags and index every input.
pub fn handle(args: &IndexArgs) -> Result<()> {
    let file_options = IndexerOptions::load(args.config.as_deref())?;
    let options = args.apply_to(file_options);
    let mut indexer = Indexer::new(options.clone())?;

    let inputs: Vec<Input> = args.inputs.iter().map(|arg| Input::from_arg(arg)).collect();
    let out = open_output(args.output.as_deref())?;
    let mut sink = build_sink(&options, out)?;

    let summary = indexer.run(inputs, sink.as_mut())?;

    if let Some(path) = options.compress_path() {
        let size = fs::metadata(&path).map(|m| m.len()).unwrap_or(0);
        tracing::info!(
            path = %path.display(),
            size = %format_size(size, BINARY),
            lines = summary.lines_written,
            "wrote compressed index data"
        );
    }
    Ok(())
}

/// Index output: the `--output` file, or stdout.
fn open_output(path: Option<&Path>) -> Result<Box<dyn Write>> {
    match path {
        Some(path) => {
            let file = File::create(path)
                .with_context(|| format!("Failed to create output file: {}", path.display()))?;
            Ok(Box::new(BufWriter::new(file)))
        }
        None => Ok(Box::new(BufWriter::new(io::stdout().lock()))),
    }
}

/// Stack the writers the options ask for on top of `out`.
fn build_sink(options: &IndexerOptions, out: Box<dyn Write>) -> Result<Box<dyn LineSink>> {
    let sink: Box<dyn LineSink> = match options.compress_path() {
        Some(path) => {
            let data = File::create(&path).with_context(|| {
                format!("Failed to create compressed data file: {}", path.display())
            })?;
            Box::new(CompressingWriter::new(
                out,
                BufWriter::new(data),
                path.to_string_lossy(),
                options.lines,
            ))
        }
        None => Box::new(PlainWriter::new(out)),
    };

    if options.sort {
        Ok(Box::new(SortingWriter::new(sink)))
    } else {
        Ok(sink)
    }
}
