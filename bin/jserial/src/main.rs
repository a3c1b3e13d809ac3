use jserial::dump::{self, DumpOptions};
use jserial::{Content, Parsed};
use std::env;
use std::fs::File;
use std::io::{self, BufReader, BufWriter, Write};
use std::path::Path;
use std::process;

mod options;
use options::{parse_args, usage, Options};

fn main() {
    process::exit(run());
}

fn run() -> i32 {
    let options = match parse_args(env::args().skip(1)) {
        Ok(options) => options,
        Err(message) => {
            eprintln!("jserial: {}", message);
            eprint!("{}", usage());
            return 1;
        }
    };
    if options.help {
        eprint!("{}", usage());
        return 1;
    }

    let mut builder = env_logger::Builder::from_default_env();
    if options.debug {
        builder.filter_level(log::LevelFilter::Debug);
    }
    builder.init();

    let mut dump_options = DumpOptions {
        show_arrays: options.show_arrays,
        fix_names: options.fix_names,
        filter: None,
    };
    if let Some(pattern) = &options.filter {
        if let Err(err) = dump_options.set_filter(pattern) {
            eprintln!("jserial: {}", err);
            return 1;
        }
    }

    let mut extraction = match Extraction::open(&options) {
        Ok(extraction) => extraction,
        Err(err) => {
            eprintln!("jserial: {}", err);
            return 1;
        }
    };

    let mut failed = false;
    for file in &options.files {
        log::info!("reading '{}'", file.display());
        if let Err(err) = process_file(file, &options, &dump_options, &mut extraction) {
            eprintln!("jserial: {}: {}", file.display(), err);
            failed = true;
        }
    }
    if let Err(err) = extraction.finish() {
        eprintln!("jserial: {}", err);
        failed = true;
    }
    if failed {
        1
    } else {
        0
    }
}

fn process_file(
    path: &Path,
    options: &Options,
    dump_options: &DumpOptions,
    extraction: &mut Extraction,
) -> Result<(), Box<dyn std::error::Error>> {
    let file = File::open(path)?;
    let parsed = jserial::parse(BufReader::new(file), !options.no_connect)?;

    let stdout = io::stdout();
    let mut out = stdout.lock();
    writeln!(out, "//// {}", path.display())?;

    if !options.no_content {
        writeln!(out, "\n// stream contents")?;
        for item in &parsed.contents {
            writeln!(out, "{}", dump::describe(&parsed.arena, *item))?;
        }
    }
    if !options.no_classes {
        writeln!(out, "\n// classes")?;
        dump::write_class_declarations(&mut out, &parsed.arena, &parsed.epochs, dump_options)?;
    }
    if !options.no_instances {
        writeln!(out, "\n// instances")?;
        write_instances(&mut out, &parsed, dump_options)?;
    }

    extraction.record(&parsed)?;
    Ok(())
}

/// Dump every instance of every epoch, in handle order.
fn write_instances<W: Write>(
    out: &mut W,
    parsed: &Parsed,
    dump_options: &DumpOptions,
) -> io::Result<()> {
    for epoch in &parsed.epochs {
        let mut handles: Vec<_> = epoch.iter().collect();
        handles.sort_unstable_by_key(|&(&handle, _)| handle);
        for (_, &id) in handles {
            if let Content::Instance(instance) = parsed.arena.get(id) {
                dump::write_instance(out, &parsed.arena, instance, dump_options)?;
            }
        }
    }
    Ok(())
}

/// Block-data extraction across all input files
struct Extraction {
    data: Option<BufWriter<File>>,
    manifest: Option<BufWriter<File>>,
}

impl Extraction {
    fn open(options: &Options) -> io::Result<Extraction> {
        let data = match &options.block_data {
            Some(path) => Some(BufWriter::new(File::create(path)?)),
            None => None,
        };
        let mut manifest = match &options.block_data_manifest {
            Some(path) => Some(BufWriter::new(File::create(path)?)),
            None => None,
        };
        if let Some(out) = manifest.as_mut() {
            writeln!(out, "# one block-data size per line, in stream order")?;
        }
        Ok(Extraction { data, manifest })
    }

    fn record(&mut self, parsed: &Parsed) -> io::Result<()> {
        if self.data.is_none() && self.manifest.is_none() {
            return Ok(());
        }
        for item in parsed.contents.iter().flatten() {
            if let Content::BlockData(block) = parsed.arena.get(*item) {
                if let Some(out) = self.data.as_mut() {
                    out.write_all(&block.bytes)?;
                }
                if let Some(out) = self.manifest.as_mut() {
                    writeln!(out, "{}", block.bytes.len())?;
                }
            }
        }
        Ok(())
    }

    fn finish(&mut self) -> io::Result<()> {
        if let Some(out) = self.data.as_mut() {
            out.flush()?;
        }
        if let Some(out) = self.manifest.as_mut() {
            out.flush()?;
        }
        Ok(())
    }
}
