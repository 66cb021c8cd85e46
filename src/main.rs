use std::io::{stdout, Write};

use miette::{Diagnostic, IntoDiagnostic, Report, Result};
use rustyline::error::ReadlineError;
use tracing_subscriber::EnvFilter;

use objmap::{
    script::{compile, Interpreter},
    Side, TableOpts,
};

fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .with_writer(std::io::stderr)
        .init();

    let mut args: Vec<_> = std::env::args().skip(1).collect();
    let side = consume_arg(&mut args, |arg| (arg == "--server").then(|| Side::Server))
        .unwrap_or(Side::Client);
    let limit = match args.iter().position(|arg| arg == "--limit") {
        Some(idx) if idx + 1 < args.len() => {
            let value = args.remove(idx + 1);
            args.remove(idx);
            Some(value.parse::<u32>().into_diagnostic()?)
        }
        _ => None,
    };
    let file = consume_arg(&mut args, |arg| {
        if arg.starts_with("--") {
            None
        } else {
            Some(arg.to_string())
        }
    });
    if !args.is_empty() {
        eprintln!("Unrecognized arguments: {:?}", args);
        eprintln!("Usage: objmap [--server] [--limit N] [file]");
        std::process::exit(64);
    }

    let opts = match limit {
        Some(limit) => TableOpts::default().with_max_objects(limit),
        None => TableOpts::default(),
    };
    if let Some(file) = file {
        run_file(file, side, opts)?;
    } else {
        run_prompt(side, opts)?;
    }

    Ok(())
}

fn consume_arg<T, F: Fn(&str) -> Option<T>>(args: &mut Vec<String>, predicate: F) -> Option<T> {
    let found = args
        .iter()
        .enumerate()
        .filter_map(|(idx, arg)| predicate(arg).map(|val| (idx, val)))
        .next();

    if let Some((idx, val)) = found {
        args.remove(idx);
        Some(val)
    } else {
        None
    }
}

fn report_all_errors<E: Diagnostic + Send + Sync + 'static>(errors: impl IntoIterator<Item = E>) {
    for error in errors {
        println!("{:?}", Report::new(error));
    }
}

fn run_file(file_name: String, side: Side, opts: TableOpts) -> Result<()> {
    let path = std::fs::canonicalize(file_name).into_diagnostic()?;
    let source = std::fs::read_to_string(&path).into_diagnostic()?;
    let mut stdout = stdout();

    match compile(&path.to_string_lossy(), &source) {
        Ok(script) => {
            let mut interpreter = Interpreter::new(&mut stdout, side, opts);
            interpreter.run(&script)?;
        }
        Err(errors) => {
            report_all_errors(errors);
            std::process::exit(65);
        }
    }

    stdout.flush().into_diagnostic()
}

fn run_prompt(side: Side, opts: TableOpts) -> Result<()> {
    let mut stdout = stdout();
    let mut interpreter = Interpreter::new(&mut stdout, side, opts);
    let mut rl = rustyline::Editor::<()>::new();
    let mut repl_line: usize = 1;
    loop {
        match rl.readline(&format!("{}> ", repl_line)) {
            Ok(line) => {
                rl.add_history_entry(line.as_str());
                match compile(&format!("<repl-{}>", repl_line), &format!("{}\n", line)) {
                    Ok(script) => {
                        if let Err(err) = interpreter.run(&script) {
                            println!("{:?}", Report::new(err));
                        }
                    }
                    Err(errors) => report_all_errors(errors),
                }
            }
            Err(ReadlineError::Interrupted) => return Ok(()),
            Err(ReadlineError::Eof) => return Ok(()),
            Err(err) => return Err(err).into_diagnostic(),
        }
        repl_line += 1;
    }
}
