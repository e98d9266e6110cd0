// src/bin/lrr.rs

//! Driver program _lrr_ (Login Record Reader).
//!
//! Processes user-passed command-line arguments, finds login accounting
//! files, then processes them with a [`BatchProcessor`], writing one CSV per
//! file.
//!
//! [`BatchProcessor`]: lrrlib::readers::batchprocessor::BatchProcessor

#![allow(non_camel_case_types)]

use std::collections::BTreeMap;
use std::io::{Error, ErrorKind};
use std::path::{Path, PathBuf};
use std::process::ExitCode;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use ::clap::Parser;
use ::const_format::concatcp;
#[allow(unused_imports)]
use ::si_trace_print::{defn, defo, defx, defñ};
use ::si_trace_print::stack::stack_offset_set;

use ::lrrlib::common::{FPath, FileType, LoginFileKind};
use ::lrrlib::data::datetime::{parse_tz_offset, FixedOffset, TimeNormalizer};
use ::lrrlib::data::principal::{PasswdDirectory, PASSWD_PATH_DEFAULT};
#[allow(unused_imports)]
use ::lrrlib::debug::printers::{de_err, de_wrn, e_err, e_wrn};
use ::lrrlib::printer::csvsink::{CsvSink, TabularSink};
use ::lrrlib::printer::summary::print_summary;
use ::lrrlib::readers::batchprocessor::{
    BatchConfig,
    BatchProcessor,
    FileProcessingResult,
    MapPathResult,
    PrincipalDirectoryP,
    INDEXED_TABLE_THREADS_DEFAULT,
};
use ::lrrlib::readers::blockreader::{BlockSz, BLOCKSZ_DEF, BLOCKSZ_MAX, BLOCKSZ_MIN};
use ::lrrlib::readers::filepreprocessor::{process_path, ProcessPathResult};
use ::lrrlib::readers::helpers::basename;

// --------------------
// command-line parsing

const CLI_HELP_AFTER: &str = concatcp!(
    "\
Sequential session logs are files named wtmp, utmp, btmp, optionally with a
rotation suffix like \"wtmp.1\" or \"btmp-20240101\", and optionally gzip
compressed \".gz\". The indexed table is a file named \"lastlog\".
A file passed directly is processed regardless of name; an unrecognized name is
read as a sequential log.

Each file FILE is written to \"FILE.csv\".

DateTimes are written in the fixed timezone offset TZ_OFFSET, default \"",
    "+08:00",
    "\".
A zero timestamp of a record without data is written as \"Never logged in\".

Exit code is 0 if every file was processed, otherwise 1.
"
);

/// `clap` command-line arguments build-time definitions.
//
// Note:
// * the `about` is taken from `Cargo.toml:[package]:description`.
#[derive(Parser, Debug)]
#[clap(
    about = env!("CARGO_PKG_DESCRIPTION"),
    author = env!("CARGO_PKG_AUTHORS"),
    name = "lrr",
    // write expanded information for the `--version` output
    version = concatcp!(
        "(Login Record Reader)\n",
        "Version: ",
        env!("CARGO_PKG_VERSION_MAJOR"), ".",
        env!("CARGO_PKG_VERSION_MINOR"), ".",
        env!("CARGO_PKG_VERSION_PATCH"), "\n",
        "MSRV: ", env!("CARGO_PKG_RUST_VERSION"), "\n",
        "License: ", env!("CARGO_PKG_LICENSE"), "\n",
        "Author: ", env!("CARGO_PKG_AUTHORS"), "\n",
    ),
    after_help = CLI_HELP_AFTER,
    verbatim_doc_comment,
)]
struct CLI_Args {
    /// Path(s) of login accounting files or directories.
    /// Directories are searched one level deep for recognized file names.
    #[clap(
        required = true,
        verbatim_doc_comment,
    )]
    paths: Vec<String>,

    /// Timezone offset of written datetimes.
    /// Example values, "+08:00", "-0500", "+2", or "Z".
    /// To pass a value with leading "-" use "=" notation, e.g. "-t=-0800".
    #[clap(
        short = 't',
        long,
        verbatim_doc_comment,
        value_parser = cli_process_tz_offset,
        default_value = "+08:00",
    )]
    tz_offset: FixedOffset,

    /// passwd(5) format file naming the principals (users) of a lastlog file.
    /// Usually the "/etc/passwd" of the system the lastlog file came from.
    #[clap(
        short = 'p',
        long,
        verbatim_doc_comment,
        default_value = PASSWD_PATH_DEFAULT,
    )]
    passwd: String,

    /// Directory to write CSV files. Default is the directory of each
    /// input file.
    #[clap(
        short = 'o',
        long,
        verbatim_doc_comment,
    )]
    output_dir: Option<String>,

    /// Write CSV to STDOUT instead of files.
    /// Only one file may be processed.
    #[clap(
        long,
        verbatim_doc_comment,
    )]
    stdout: bool,

    /// Read blocks of this size in bytes.
    /// May pass value as any radix (hexadecimal, decimal, octal, binary).
    /// Using the default value is recommended.
    /// Most useful for developers.
    #[clap(
        required = false,
        short = 'b',
        long,
        verbatim_doc_comment,
        default_value_t = BLOCKSZ_DEF.to_string(),
        value_parser = cli_parse_blocksz,
    )]
    blocksz: String,

    /// Print a summary of files processed to stderr.
    #[clap(
        short,
        long,
        verbatim_doc_comment,
    )]
    summary: bool,
}

/// `clap` argument processor for `--blocksz`.
/// This implementation, as opposed to clap built-in number parsing, allows more
/// flexibility for how the user may pass a number
/// e.g. "0xF00", or "0b10100", etc.
fn cli_process_blocksz(blockszs: &str) -> std::result::Result<BlockSz, String> {
    let errs = format!("Unable to parse a number for --blocksz {:?}", blockszs);
    let (digits, radix): (&str, u32) = if let Some(digits) = blockszs.strip_prefix("0x") {
        (digits, 16)
    } else if let Some(digits) = blockszs.strip_prefix("0o") {
        (digits, 8)
    } else if let Some(digits) = blockszs.strip_prefix("0b") {
        (digits, 2)
    } else {
        (blockszs, 10)
    };
    let blocksz_: BlockSz = match BlockSz::from_str_radix(digits, radix) {
        Ok(val) => val,
        Err(err) => return Err(format!("{} {}", errs, err)),
    };
    if !(BLOCKSZ_MIN <= blocksz_ && blocksz_ <= BLOCKSZ_MAX) {
        return Err(format!("--blocksz must be {} ≤ BLOCKSZ ≤ {}, it was {:?}", BLOCKSZ_MIN, BLOCKSZ_MAX, blockszs));
    }

    Ok(blocksz_)
}

/// `clap` argument parser for `--blocksz`.
fn cli_parse_blocksz(blockszs: &str) -> std::result::Result<String, String> {
    match cli_process_blocksz(blockszs) {
        Ok(val) => Ok(val.to_string()),
        Err(err) => Err(err),
    }
}

/// `clap` argument parser for `--tz-offset`.
fn cli_process_tz_offset(tzo: &str) -> std::result::Result<FixedOffset, String> {
    parse_tz_offset(tzo).map_err(|err| err.to_string())
}

/// `--stdout` writes one CSV stream so it takes exactly one file; the
/// headers and rows of several files would interleave.
fn cli_check_stdout(stdout: bool, sources: &[(FPath, FileType)]) -> std::result::Result<(), String> {
    if stdout && sources.len() > 1 {
        return Err(format!(
            "--stdout requires exactly one file, found {}; use --output-dir instead",
            sources.len(),
        ));
    }

    Ok(())
}

/// Path of the CSV file written for `path`.
fn csv_output_path(path: &FPath, output_dir: &Option<String>) -> PathBuf {
    let name: String = format!("{}.csv", basename(path));
    match output_dir {
        Some(dir) => Path::new(dir).join(name),
        None => match Path::new(path).parent() {
            Some(parent) => parent.join(name),
            None => PathBuf::from(name),
        },
    }
}

/// set a process signal handler; the first interrupt stops all file
/// processing threads, leaving finished CSV files in place.
pub fn set_signal_handler(cancel: Arc<AtomicBool>) -> anyhow::Result<(), ctrlc::Error> {
    defn!();
    ctrlc::set_handler(move || {
        defñ!("signal received");
        cancel.store(true, Ordering::SeqCst);
    })?;
    defx!();

    Ok(())
}

/// Process the user-passed command-line arguments.
/// Process every file found.
/// Determine a process return code.
pub fn main() -> ExitCode {
    if cfg!(debug_assertions) {
        stack_offset_set(Some(0));
    }
    defn!();
    let args = CLI_Args::parse();
    defo!("args {:?}", args);
    // `cli_parse_blocksz` already validated the value
    let blocksz: BlockSz = cli_process_blocksz(args.blocksz.as_str()).unwrap_or(BLOCKSZ_DEF as BlockSz);

    let mut results = MapPathResult::new();
    let mut sources: Vec<(FPath, FileType)> = Vec::with_capacity(args.paths.len());
    for path in args.paths.iter() {
        for ppresult in process_path(path).into_iter() {
            defo!("{:?}", ppresult);
            match ppresult {
                ProcessPathResult::FileValid(fpath, filetype) => sources.push((fpath, filetype)),
                ProcessPathResult::FileErrNotSupported(fpath) => {
                    results.insert(fpath, FileProcessingResult::FileErrNotSupported);
                }
                ProcessPathResult::FileErrNotAFile(fpath) => {
                    let err = Error::new(ErrorKind::InvalidInput, format!("not a file {:?}", fpath));
                    results.insert(fpath, FileProcessingResult::FileErrIo(err));
                }
                ProcessPathResult::FileErrNotExist(fpath) => {
                    let err = Error::new(ErrorKind::NotFound, format!("path does not exist {:?}", fpath));
                    results.insert(fpath, FileProcessingResult::FileErrIo(err));
                }
            }
        }
    }
    if sources.is_empty() && results.is_empty() {
        e_err!("no login accounting files found in {:?}", args.paths);
        defx!("return FAILURE");
        return ExitCode::FAILURE;
    }
    if let Err(err) = cli_check_stdout(args.stdout, &sources) {
        e_err!("{}", err);
        defx!("return FAILURE");
        return ExitCode::FAILURE;
    }

    // the principal directory is only read if there is an indexed table
    let mut principals: Option<PrincipalDirectoryP> = None;
    if sources
        .iter()
        .any(|(_, filetype)| filetype.kind() == Some(LoginFileKind::IndexedTable))
    {
        match PasswdDirectory::from_path(&args.passwd) {
            Ok(pd) => principals = Some(Arc::new(pd)),
            Err(err) => e_err!("{}", err),
        }
    }

    let config = BatchConfig {
        blocksz,
        normalizer: TimeNormalizer::new(args.tz_offset),
        principals,
        indexed_table_threads: INDEXED_TABLE_THREADS_DEFAULT,
    };
    let batchprocessor = BatchProcessor::new(config);
    if let Err(err) = set_signal_handler(batchprocessor.cancel_flag()) {
        e_wrn!("failed to set signal handler {}", err);
    }

    let mut outputs: BTreeMap<FPath, PathBuf> = BTreeMap::new();
    let batch_results: MapPathResult = batchprocessor.process(
        &sources,
        |path: &FPath, _kind: LoginFileKind| -> std::io::Result<Box<dyn TabularSink>> {
            if args.stdout {
                return Ok(Box::new(CsvSink::new(std::io::stdout())));
            }
            let output: PathBuf = csv_output_path(path, &args.output_dir);
            defo!("create {:?}", output);
            let file = match std::fs::File::create(&output) {
                Ok(file) => file,
                Err(err) => {
                    return Err(Error::new(err.kind(), format!("{} for {:?}", err, output)));
                }
            };
            outputs.insert(path.clone(), output);
            Ok(Box::new(CsvSink::new(file)))
        },
    );
    results.extend(batch_results);

    let mut all_ok: bool = true;
    for (path, result) in results.iter() {
        if result.is_ok() {
            if let Some(output) = outputs.get(path) {
                eprintln!("Output written to: {}", output.display());
            }
            continue;
        }
        all_ok = false;
        match result {
            FileProcessingResult::FileErrNotSupported => e_err!("file type not supported {:?}", path),
            _ => e_err!("{}", result),
        }
    }
    if args.summary {
        if let Err(err) = print_summary(&mut std::io::stderr(), &results) {
            e_err!("print_summary failed {}", err);
        }
    }

    let exitcode = if all_ok { ExitCode::SUCCESS } else { ExitCode::FAILURE };
    defx!("exitcode {:?}", exitcode);

    exitcode
}
