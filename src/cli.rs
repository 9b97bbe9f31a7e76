use std::env;
use std::path::PathBuf;

use crate::config::UsageKind;

pub struct CliOptions {
    pub config: Option<PathBuf>,
    pub preset: Option<String>,
    pub train: Option<PathBuf>,
    pub test: Option<PathBuf>,
    pub usage: Option<UsageKind>,
    pub predictions_out: Option<PathBuf>,
    pub adjustments_out: Option<PathBuf>,
}

pub fn parse_args() -> Result<CliOptions, String> {
    let args: Vec<String> = env::args().skip(1).collect();
    parse_args_from(args)
}

fn parse_args_from(args: Vec<String>) -> Result<CliOptions, String> {
    if args.len() == 1 && (args[0] == "--help" || args[0] == "-h") {
        print_usage();
        std::process::exit(0);
    }
    parse_options(&args)
}

fn set_once<T>(slot: &mut Option<T>, value: T, flag: &str) -> Result<(), String> {
    if slot.replace(value).is_some() {
        return Err(format!("{flag} provided more than once"));
    }
    Ok(())
}

fn parse_options(args: &[String]) -> Result<CliOptions, String> {
    let mut i = 0usize;
    let mut config = None;
    let mut preset = None;
    let mut train = None;
    let mut test = None;
    let mut usage = None;
    let mut predictions_out = None;
    let mut adjustments_out = None;

    while i < args.len() {
        let flag = args[i].as_str();
        match flag {
            "--config" => {
                i += 1;
                let path =
                    args.next_or_err(i, "missing value for --config (expected a TOML file path)")?;
                set_once(&mut config, PathBuf::from(path), flag)?;
            }
            "--preset" => {
                i += 1;
                let name =
                    args.next_or_err(i, "missing value for --preset (expected a preset name)")?;
                set_once(&mut preset, name.to_string(), flag)?;
            }
            "--train" => {
                i += 1;
                let path = args.next_or_err(i, "missing value for --train (expected a CSV path)")?;
                set_once(&mut train, PathBuf::from(path), flag)?;
            }
            "--test" => {
                i += 1;
                let path = args.next_or_err(i, "missing value for --test (expected a CSV path)")?;
                set_once(&mut test, PathBuf::from(path), flag)?;
            }
            "--usage" => {
                i += 1;
                let value = args.next_or_err(
                    i,
                    "missing value for --usage (expected `observed` or `predicted`)",
                )?;
                let kind = UsageKind::parse(value).ok_or_else(|| {
                    format!("invalid value for --usage: {value} (expected `observed` or `predicted`)")
                })?;
                set_once(&mut usage, kind, flag)?;
            }
            "--predictions-out" => {
                i += 1;
                let path = args.next_or_err(
                    i,
                    "missing value for --predictions-out (expected a file path)",
                )?;
                set_once(&mut predictions_out, PathBuf::from(path), flag)?;
            }
            "--adjustments-out" => {
                i += 1;
                let path = args.next_or_err(
                    i,
                    "missing value for --adjustments-out (expected a file path)",
                )?;
                set_once(&mut adjustments_out, PathBuf::from(path), flag)?;
            }
            "--help" | "-h" => {
                print_usage();
                std::process::exit(0);
            }
            other => return Err(format!("unknown argument: {other}")),
        }
        i += 1;
    }

    if config.is_some() && preset.is_some() {
        return Err(
            "arguments `--config` and `--preset` are mutually exclusive; choose one source"
                .to_string(),
        );
    }

    if config.is_none() && preset.is_none() {
        preset = Some("baseline".to_string());
    }

    Ok(CliOptions {
        config,
        preset,
        train,
        test,
        usage,
        predictions_out,
        adjustments_out,
    })
}

trait SliceArgExt {
    fn next_or_err(&self, index: usize, err: &str) -> Result<&str, String>;
}

impl SliceArgExt for [String] {
    fn next_or_err(&self, index: usize, err: &str) -> Result<&str, String> {
        self.get(index)
            .map(String::as_str)
            .ok_or_else(|| err.to_string())
    }
}

pub fn print_usage() {
    eprintln!("Usage:");
    eprintln!(
        "  bikeshare-sim [--config <path> | --preset <name>] --train <csv> --test <csv> \
         [--usage observed|predicted] [--predictions-out <path>] [--adjustments-out <path>]"
    );
    eprintln!();
    eprintln!("Presets: baseline (default), conservative, aggressive");
    eprintln!("Set RUST_LOG (e.g. RUST_LOG=debug) to control log verbosity.");
}
