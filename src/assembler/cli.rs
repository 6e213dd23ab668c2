// SPDX-License-Identifier: GPL-3.0-or-later
// Copyright (C) 2026 Erik van der Tier

//! Command-line interface parsing and argument validation.

use std::env;
use std::path::{Path, PathBuf};

use clap::{ArgAction, Parser, ValueEnum};

use crate::assembler::AssembleFailure;
use crate::core::patch_stack::DEFAULT_STACK_CAPACITY;
use crate::registry_defaults::build_default_registry;

pub const VERSION: &str = env!("CARGO_PKG_VERSION");

const DEFAULT_CPU: &str = "z80";

const LONG_ABOUT: &str =
    "Structured control flow compiler for 8-bit targets (8080/8085, Z80, 6502/65C02, 6809).

Source files contain .if/.else/.endif, .switch/.case/.endcase/.endswitch and
.do/.while/.until/.enddo/.forever/.loop/.break/.continue constructs plus raw
.byte data. Branches are emitted in a single pass and backpatched.

Outputs are opt-in: specify -x/--hex and/or -b/--bin. With neither, a hex file
named after the input (or -o BASE) is written.";

#[derive(Parser, Debug)]
#[command(
    name = "flowforge",
    version = VERSION,
    about = "Single-pass structured control flow compiler with backpatched branches",
    long_about = LONG_ABOUT
)]
pub struct Cli {
    #[arg(
        long = "format",
        value_enum,
        default_value_t = OutputFormat::Text,
        long_help = "Select diagnostic output format. text is default; json prints one JSON object per diagnostic."
    )]
    pub format: OutputFormat,
    #[arg(
        short = 'q',
        long = "quiet",
        action = ArgAction::SetTrue,
        long_help = "Suppress warnings for successful runs. Errors are still reported."
    )]
    pub quiet: bool,
    #[arg(
        long = "verbose",
        action = ArgAction::SetTrue,
        long_help = "Log every emission, reservation and patch at debug level. RUST_LOG overrides."
    )]
    pub verbose: bool,
    #[arg(
        long = "cpu",
        value_name = "ID",
        long_help = "Target CPU: 8080, 8085, z80, 6502, 65c02 or 6809. Defaults to z80."
    )]
    pub cpu: Option<String>,
    #[arg(
        long = "origin",
        value_name = "HEX",
        long_help = "Load address of the first emitted byte (1-4 hex digits). A leading .org in the source overrides it."
    )]
    pub origin: Option<String>,
    #[arg(
        long = "depth",
        value_name = "N",
        long_help = "Nesting capacity of each patch stack. Defaults to 12."
    )]
    pub depth: Option<usize>,
    #[arg(
        short = 'x',
        long = "hex",
        value_name = "FILE",
        num_args = 0..=1,
        default_missing_value = "",
        long_help = "Emit an Intel Hex file. FILE is optional; when omitted, the output base is used and a .hex extension is added."
    )]
    pub hex_name: Option<String>,
    #[arg(
        short = 'b',
        long = "bin",
        value_name = "FILE",
        num_args = 0..=1,
        default_missing_value = "",
        long_help = "Emit a raw binary image starting at the origin. FILE is optional; when omitted, the output base is used and a .bin extension is added."
    )]
    pub bin_name: Option<String>,
    #[arg(
        short = 'o',
        long = "outfile",
        value_name = "BASE",
        long_help = "Output filename base when -x/-b omit filenames. Defaults to the input path without its extension."
    )]
    pub outfile: Option<String>,
    #[arg(
        short = 'g',
        long = "go",
        value_name = "aaaa",
        long_help = "Set execution start address (1-4 hex digits). Adds a Start Address record to hex output. Requires hex output."
    )]
    pub go_addr: Option<String>,
    #[arg(value_name = "INPUT", long_help = "Source file to compile.")]
    pub input: PathBuf,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, ValueEnum)]
pub enum OutputFormat {
    #[default]
    Text,
    Json,
}

/// Validated CLI configuration.
#[derive(Debug, Clone)]
pub struct CliConfig {
    pub input_path: PathBuf,
    pub cpu: String,
    pub origin: u16,
    pub depth: usize,
    pub hex_path: Option<PathBuf>,
    pub bin_path: Option<PathBuf>,
    pub go_addr: Option<u16>,
    pub output_format: OutputFormat,
    pub quiet: bool,
    pub verbose: bool,
}

pub fn parse_hex_address(s: &str) -> Option<u16> {
    let digits = s.strip_prefix('$').unwrap_or(s);
    if !(1..=4).contains(&digits.len()) || !digits.chars().all(|c| c.is_ascii_hexdigit()) {
        return None;
    }
    u16::from_str_radix(digits, 16).ok()
}

pub fn resolve_output_path(base: &str, name: Option<&str>, extension: &str) -> Option<PathBuf> {
    let name = name?;
    if name.is_empty() {
        return Some(PathBuf::from(format!("{base}.{extension}")));
    }
    let path = PathBuf::from(name);
    if path.extension().is_none() {
        return Some(PathBuf::from(format!("{name}.{extension}")));
    }
    Some(path)
}

pub fn input_base_from_path(path: &Path) -> String {
    path.with_extension("").to_string_lossy().to_string()
}

fn cli_error(message: impl Into<String>) -> AssembleFailure {
    AssembleFailure::cli(message)
}

fn parse_env_bool(var_name: &str) -> Result<Option<bool>, AssembleFailure> {
    let Some(raw) = env::var_os(var_name) else {
        return Ok(None);
    };
    let value = raw.to_string_lossy().trim().to_ascii_lowercase();
    let parsed = match value.as_str() {
        "1" | "true" | "yes" | "on" => Some(true),
        "0" | "false" | "no" | "off" => Some(false),
        "" => None,
        _ => {
            return Err(cli_error(format!(
                "Invalid boolean value for {var_name}: {value}"
            )))
        }
    };
    Ok(parsed)
}

fn parse_env_usize(var_name: &str) -> Result<Option<usize>, AssembleFailure> {
    let Some(value) = parse_env_string(var_name) else {
        return Ok(None);
    };
    value
        .parse::<usize>()
        .map(Some)
        .map_err(|_| cli_error(format!("Invalid integer value for {var_name}: {value}")))
}

fn parse_env_string(var_name: &str) -> Option<String> {
    let raw = env::var_os(var_name)?;
    let value = raw.to_string_lossy().trim().to_string();
    (!value.is_empty()).then_some(value)
}

/// Validate CLI arguments and return parsed configuration.
///
/// Environment defaults (`FLOWFORGE_CPU`, `FLOWFORGE_DEPTH`,
/// `FLOWFORGE_QUIET`) apply only where the flag is not given.
pub fn validate_cli(cli: &Cli) -> Result<CliConfig, AssembleFailure> {
    let env_cpu = parse_env_string("FLOWFORGE_CPU");
    let env_depth = parse_env_usize("FLOWFORGE_DEPTH")?;
    let env_quiet = parse_env_bool("FLOWFORGE_QUIET")?;

    let cpu = cli
        .cpu
        .clone()
        .or(env_cpu)
        .unwrap_or_else(|| DEFAULT_CPU.to_string());
    let registry = build_default_registry();
    if !registry.contains(&cpu) {
        return Err(cli_error(format!(
            "Unknown CPU '{cpu}'. Supported: {}",
            registry.cpu_name_list().join(", ")
        )));
    }

    let depth = cli.depth.or(env_depth).unwrap_or(DEFAULT_STACK_CAPACITY);
    if depth == 0 {
        return Err(cli_error("Stack depth must be at least 1"));
    }

    let origin = match cli.origin.as_deref() {
        Some(text) => parse_hex_address(text)
            .ok_or_else(|| cli_error(format!("Invalid origin '{text}'. Must be 1-4 hex digits.")))?,
        None => 0,
    };

    let go_addr = match cli.go_addr.as_deref() {
        Some(text) => Some(parse_hex_address(text).ok_or_else(|| {
            cli_error(format!("Invalid go address '{text}'. Must be 1-4 hex digits."))
        })?),
        None => None,
    };

    let base = cli
        .outfile
        .clone()
        .unwrap_or_else(|| input_base_from_path(&cli.input));
    let default_outputs = cli.hex_name.is_none() && cli.bin_name.is_none();
    let hex_name = if default_outputs {
        Some("")
    } else {
        cli.hex_name.as_deref()
    };
    let hex_path = resolve_output_path(&base, hex_name, "hex");
    let bin_path = resolve_output_path(&base, cli.bin_name.as_deref(), "bin");
    if go_addr.is_some() && hex_path.is_none() {
        return Err(cli_error("-g/--go requires hex output (-x/--hex)"));
    }

    Ok(CliConfig {
        input_path: cli.input.clone(),
        cpu,
        origin,
        depth,
        hex_path,
        bin_path,
        go_addr,
        output_format: cli.format,
        quiet: cli.quiet || env_quiet.unwrap_or(false),
        verbose: cli.verbose,
    })
}
