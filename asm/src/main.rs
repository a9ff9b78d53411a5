use basm::SymbolMap;
use color_print::cprintln;
use std::fs::File;
use std::path::Path;

const HELP_TEMPLATE: &str = "\
{before-help}{bin} {version}
  {about}

{usage-heading}
{tab}{usage}

{all-args}{after-help}";

#[derive(Debug, clap::Parser)]
#[clap(version, about, help_template = HELP_TEMPLATE)]
struct Args {
    /// Input source file (absolute path)
    input: String,

    /// Output binary image (absolute path)
    output: String,

    /// Print the resolved label table after assembly
    #[clap(short, long)]
    dump: bool,

    /// Write a YAML symbol map to the given path
    #[clap(short, long)]
    symbols: Option<String>,

    /// Print per-stage progress
    #[clap(short, long)]
    verbose: bool,
}

fn main() {
    use clap::Parser;

    let args = Args::parse();

    for (what, path) in [("input", &args.input), ("output", &args.output)] {
        if !Path::new(path).is_absolute() {
            cprintln!("<red,bold>error</>: {} path must be absolute: {}", what, path);
            std::process::exit(1);
        }
    }

    if args.verbose {
        println!("1. Read Source");
        println!("  < {}", args.input);
    }
    let input = match File::open(&args.input) {
        Ok(file) => file,
        Err(e) => {
            cprintln!("<red,bold>error</>: cannot open {}: {}", args.input, e);
            std::process::exit(1);
        }
    };
    let output = match File::create(&args.output) {
        Ok(file) => file,
        Err(e) => {
            cprintln!("<red,bold>error</>: cannot create {}: {}", args.output, e);
            std::process::exit(1);
        }
    };

    if args.verbose {
        println!("2. Assemble (two passes)");
    }
    let gen = match basm::assemble(input, output) {
        Ok(gen) => gen,
        Err(e) => {
            let (line, col) = e.pos().map(|p| (p.line, p.col)).unwrap_or((0, 0));
            cprintln!("<red,bold>[{}]</>:{}:{} {}", e.kind(), line, col, e);
            std::process::exit(1);
        }
    };
    if args.verbose {
        println!("  > {} ({} bytes)", args.output, gen.counter());
    }

    if let Some(path) = &args.symbols {
        let map = SymbolMap::generate(gen.labels());
        let yaml = match serde_yaml::to_string(&map) {
            Ok(yaml) => yaml,
            Err(e) => {
                cprintln!("<red,bold>error</>: cannot serialize symbol map: {}", e);
                std::process::exit(1);
            }
        };
        if let Err(e) = std::fs::write(path, yaml) {
            cprintln!("<red,bold>error</>: cannot write {}: {}", path, e);
            std::process::exit(1);
        }
        if args.verbose {
            println!("  > {}", path);
        }
    }

    if args.dump {
        println!("------------------+-------");
        for symbol in gen.labels().iter() {
            match symbol.address {
                Some(addr) => cprintln!(" <green>{:<16}</> | 0x{:04X}", symbol.name, addr),
                None => cprintln!(" <yellow>{:<16}</> | ?", symbol.name),
            }
        }
        println!("------------------+-------");
    }
}
