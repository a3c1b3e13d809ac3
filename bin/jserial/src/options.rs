//! Command-line option handling
//!
//! Options take a single leading dash and a full word (`-nocontent`), and
//! any unambiguous prefix of an option is accepted (`-noconn` selects
//! `-noconnect`; `-noc` is rejected as ambiguous). Everything that does not
//! start with a dash is an input file.

use std::path::PathBuf;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Opt {
    Help,
    Debug,
    NoContent,
    NoClasses,
    NoInstances,
    ShowArrays,
    NoConnect,
    FixNames,
    Filter,
    BlockData,
    BlockDataManifest,
}

struct OptSpec {
    name: &'static str,
    opt: Opt,
    takes_arg: bool,
    help: &'static str,
}

const OPTIONS: &[OptSpec] = &[
    OptSpec {
        name: "help",
        opt: Opt::Help,
        takes_arg: false,
        help: "print this help",
    },
    OptSpec {
        name: "debug",
        opt: Opt::Debug,
        takes_arg: false,
        help: "trace every step of the parse",
    },
    OptSpec {
        name: "nocontent",
        opt: Opt::NoContent,
        takes_arg: false,
        help: "don't list the content items",
    },
    OptSpec {
        name: "noclasses",
        opt: Opt::NoClasses,
        takes_arg: false,
        help: "don't print class declarations",
    },
    OptSpec {
        name: "noinstances",
        opt: Opt::NoInstances,
        takes_arg: false,
        help: "don't dump instances",
    },
    OptSpec {
        name: "showarrays",
        opt: Opt::ShowArrays,
        takes_arg: false,
        help: "include array classes in class output",
    },
    OptSpec {
        name: "noconnect",
        opt: Opt::NoConnect,
        takes_arg: false,
        help: "don't reconnect member classes to their outer class",
    },
    OptSpec {
        name: "fixnames",
        opt: Opt::FixNames,
        takes_arg: false,
        help: "rewrite characters that are illegal in Java identifiers",
    },
    OptSpec {
        name: "filter",
        opt: Opt::Filter,
        takes_arg: true,
        help: "regex of class names to exclude from class output",
    },
    OptSpec {
        name: "blockdata",
        opt: Opt::BlockData,
        takes_arg: true,
        help: "write all block data, concatenated, to this file",
    },
    OptSpec {
        name: "blockdatamanifest",
        opt: Opt::BlockDataManifest,
        takes_arg: true,
        help: "write one block-data size per line to this file",
    },
];

#[derive(Debug, Default)]
pub struct Options {
    pub help: bool,
    pub debug: bool,
    pub no_content: bool,
    pub no_classes: bool,
    pub no_instances: bool,
    pub show_arrays: bool,
    pub no_connect: bool,
    pub fix_names: bool,
    pub filter: Option<String>,
    pub block_data: Option<PathBuf>,
    pub block_data_manifest: Option<PathBuf>,
    pub files: Vec<PathBuf>,
}

pub fn usage() -> String {
    let mut out = String::from("usage: jserial [options] file ...\n");
    for spec in OPTIONS {
        let arg = if spec.takes_arg { " <arg>" } else { "" };
        out.push_str(&format!("  -{}{:<10} {}\n", spec.name, arg, spec.help));
    }
    out
}

fn resolve(word: &str) -> Result<&'static OptSpec, String> {
    if let Some(spec) = OPTIONS.iter().find(|spec| spec.name == word) {
        return Ok(spec);
    }
    let matches: Vec<&OptSpec> = OPTIONS
        .iter()
        .filter(|spec| spec.name.starts_with(word))
        .collect();
    match matches.len() {
        1 => Ok(matches[0]),
        0 => Err(format!("unknown option '-{}'", word)),
        _ => {
            let names: Vec<&str> = matches.iter().map(|spec| spec.name).collect();
            Err(format!(
                "ambiguous option '-{}' (matches {})",
                word,
                names.join(", ")
            ))
        }
    }
}

pub fn parse_args<I: Iterator<Item = String>>(args: I) -> Result<Options, String> {
    let mut options = Options::default();
    let mut args = args;
    while let Some(arg) = args.next() {
        if let Some(word) = arg.strip_prefix('-').filter(|w| !w.is_empty()) {
            let spec = resolve(word)?;
            let value = if spec.takes_arg {
                Some(
                    args.next()
                        .ok_or_else(|| format!("option '-{}' needs an argument", spec.name))?,
                )
            } else {
                None
            };
            match spec.opt {
                Opt::Help => options.help = true,
                Opt::Debug => options.debug = true,
                Opt::NoContent => options.no_content = true,
                Opt::NoClasses => options.no_classes = true,
                Opt::NoInstances => options.no_instances = true,
                Opt::ShowArrays => options.show_arrays = true,
                Opt::NoConnect => options.no_connect = true,
                Opt::FixNames => options.fix_names = true,
                Opt::Filter => options.filter = value,
                Opt::BlockData => options.block_data = value.map(PathBuf::from),
                Opt::BlockDataManifest => options.block_data_manifest = value.map(PathBuf::from),
            }
        } else {
            options.files.push(PathBuf::from(arg));
        }
    }
    if options.files.is_empty() && !options.help {
        return Err("no input files".to_string());
    }
    Ok(options)
}
