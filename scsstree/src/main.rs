use std::io::Read;
use std::path::PathBuf;
use std::process::ExitCode;

use anyhow::Context;
use clap::Parser;
use miette::{NamedSource, Report};
use tracing::{info, info_span};

use scsstree::config::{warn_unknown_keys, Args, Config, EmitMode};
use scsstree::emit::emit;
use scsstree::logging::tracing_init;

fn main() -> anyhow::Result<ExitCode> {
    let args = Args::parse();
    let (config, unknown_keys) = Config::load(&args)?;
    tracing_init(config.log_level.into())?;
    warn_unknown_keys(&unknown_keys);

    let mut failed = 0;
    for (name, source) in read_inputs(&args.files)? {
        let _span = info_span!("input", %name).entered();
        match emit(&source, &config) {
            Ok(output) if config.emit == EmitMode::Check => println!("{name}: {output}"),
            Ok(output) => println!("{output}"),
            Err(err) => {
                failed += 1;
                let report = Report::new(err).with_source_code(NamedSource::new(name, source));
                eprintln!("{report:?}");
            }
        }
    }

    info!(failed, "done");
    Ok(if failed == 0 {
        ExitCode::SUCCESS
    } else {
        ExitCode::FAILURE
    })
}

fn read_inputs(files: &[PathBuf]) -> anyhow::Result<Vec<(String, String)>> {
    if files.is_empty() {
        let mut source = String::new();
        std::io::stdin()
            .read_to_string(&mut source)
            .context("could not read standard input")?;
        return Ok(vec![("<stdin>".to_owned(), source)]);
    }
    files
        .iter()
        .map(|path| {
            let source = std::fs::read_to_string(path)
                .with_context(|| format!("could not read {}", path.display()))?;
            Ok((path.display().to_string(), source))
        })
        .collect()
}
