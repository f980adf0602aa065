use clap::Parser;
use std::{fs, process};

use stencil::CompileOptions;

#[derive(Parser, Debug)]
#[command(author, version, about = "Precompile template opcode programs", long_about = None)]
struct Cli {
    /// JSON-encoded opcode program to compile
    #[arg(help = "The program .json file to compile")]
    input: String,

    /// Write the artifact to a file instead of stdout
    #[arg(long)]
    out: Option<String>,

    /// Print only the main render function
    #[arg(long, help = "Emit the main function instead of the manifest")]
    main_only: bool,

    #[arg(long, help = "Enable legacy depth-aware root lookups")]
    compat: bool,

    #[arg(long, help = "Throw on missing path segments")]
    strict: bool,

    #[arg(long, help = "Assume intermediate path segments are objects")]
    assume_objects: bool,

    #[arg(long, help = "Track string-mode parameter provenance")]
    string_params: bool,

    #[arg(long, help = "Track value provenance ids")]
    track_ids: bool,

    #[arg(long, help = "Thread ambient request data through nested calls")]
    data: bool,

    #[arg(long, help = "The emitter resolved all helpers statically")]
    known_helpers_only: bool,
}

fn main() {
    env_logger::init();
    let cli = Cli::parse();

    let text = match fs::read_to_string(&cli.input) {
        Ok(text) => text,
        Err(err) => {
            eprintln!("{}: {err}", cli.input);
            process::exit(1);
        }
    };
    let program: opcode::Program = match serde_json::from_str(&text) {
        Ok(program) => program,
        Err(err) => {
            eprintln!("{}: {err}", cli.input);
            process::exit(1);
        }
    };

    let opts = CompileOptions {
        string_params: cli.string_params,
        track_ids: cli.track_ids,
        compat: cli.compat,
        strict: cli.strict,
        assume_objects: cli.assume_objects,
        data: cli.data,
        known_helpers_only: cli.known_helpers_only,
    };

    let template = match stencil::compile(&program, &opts) {
        Ok(template) => template,
        Err(err) => {
            eprintln!("compile error: {err}");
            process::exit(1);
        }
    };

    let output = if cli.main_only {
        template.main.clone()
    } else {
        template.to_source()
    };

    match cli.out {
        Some(path) => {
            if let Err(err) = fs::write(&path, output) {
                eprintln!("{path}: {err}");
                process::exit(1);
            }
        }
        None => println!("{output}"),
    }
}
