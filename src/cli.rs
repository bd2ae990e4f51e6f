use crate::config::{Config, load_config};
use crate::state::NODE_WARNING_THRESHOLD;
use anyhow::Result;
use clap::{Parser, ValueEnum};
use std::io::{self, Read, Write};
use std::path::{Path, PathBuf};

#[derive(Parser, Debug)]
#[command(
    name = "planviz",
    version,
    about = "Convert query execution plans (EXPLAIN output) into Excalidraw scenes"
)]
pub struct Args {
    /// Input file with plan text or a boxed EXPLAIN report, '-' for stdin
    #[arg(short = 'i', long = "input")]
    pub input: Option<PathBuf>,

    /// Output scene file (.excalidraw). Defaults to stdout.
    #[arg(short = 'o', long = "output")]
    pub output: Option<PathBuf>,

    /// Config JSON file (theme variables, layout overrides)
    #[arg(short = 'c', long = "configFile")]
    pub config: Option<PathBuf>,

    /// Color theme, used when no config file is given
    #[arg(short = 't', long = "theme", value_enum, default_value = "light")]
    pub theme: ThemeChoice,

    /// Pretty-print the scene JSON
    #[arg(short = 'p', long = "pretty")]
    pub pretty: bool,
}

#[derive(ValueEnum, Debug, Clone, Copy, PartialEq, Eq)]
pub enum ThemeChoice {
    Light,
    Dark,
}

pub fn run() -> Result<()> {
    let args = Args::parse();
    let config = resolve_config(&args)?;

    let input = read_input(args.input.as_deref())?;
    let scene = crate::convert_with_config(&input, &config)?;

    if scene.rectangle_count() > NODE_WARNING_THRESHOLD {
        eprintln!(
            "warning: plan has {} operators; large scenes can be slow to interact with",
            scene.rectangle_count()
        );
    }

    let json = if args.pretty {
        serde_json::to_string_pretty(&scene)?
    } else {
        serde_json::to_string(&scene)?
    };
    write_output(&json, args.output.as_deref())?;
    Ok(())
}

fn resolve_config(args: &Args) -> Result<Config> {
    if args.config.is_some() {
        return load_config(args.config.as_deref());
    }
    Ok(match args.theme {
        ThemeChoice::Light => Config::light(),
        ThemeChoice::Dark => Config::dark(),
    })
}

fn read_input(path: Option<&Path>) -> Result<String> {
    if let Some(path) = path {
        if path == Path::new("-") {
            let mut buf = String::new();
            io::stdin().read_to_string(&mut buf)?;
            return Ok(buf);
        }
        return Ok(std::fs::read_to_string(path)?);
    }

    let mut buf = String::new();
    io::stdin().read_to_string(&mut buf)?;
    Ok(buf)
}

fn write_output(json: &str, path: Option<&Path>) -> Result<()> {
    match path {
        Some(path) => {
            std::fs::write(path, json)?;
        }
        None => {
            let mut stdout = io::stdout().lock();
            stdout.write_all(json.as_bytes())?;
            stdout.write_all(b"\n")?;
        }
    }
    Ok(())
}
