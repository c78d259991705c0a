use std::fs;
use std::io::{self, BufRead, Write};
use std::path::{Path, PathBuf};

use clap::Parser as ClapParser;
use log::debug;

use lox::ast_printer::AstPrinter;
use lox::error::LoxError;
use lox::interpreter::Interpreter;
use lox::parser::Parser;
use lox::resolver::Resolver;
use lox::scanner::{self, ScanOptions};

#[derive(ClapParser, Debug)]
#[command(version, about = "A tree-walking interpreter for the Lox language.", long_about = None)]
struct Cli {
    /// Script to execute; omit to enter interactive mode
    script: Option<PathBuf>,
}

fn main() -> anyhow::Result<()> {
    env_logger::init();

    let args: Cli = Cli::parse();

    match args.script {
        Some(path) => {
            if let Err(e) = run_file(&path) {
                eprintln!("{}", e);
                std::process::exit(64);
            }
        }

        None => run_prompt()?,
    }

    Ok(())
}

fn run_file(path: &Path) -> anyhow::Result<()> {
    let source: Vec<u8> = fs::read(path)?;

    let mut interpreter = Interpreter::new();

    exec(&source, &mut interpreter);

    Ok(())
}

/// Interactive mode.  A trimmed line ending in `;` or `}` runs as
/// statements; anything else is evaluated as a bare expression and its value
/// printed.  `:q` quits, `:blk` reads a multi-line block terminated by an
/// empty line.
fn run_prompt() -> anyhow::Result<()> {
    let stdin = io::stdin();
    let mut interpreter = Interpreter::new();
    let mut line = String::new();

    loop {
        print!("> ");
        io::stdout().flush()?;

        line.clear();
        if stdin.lock().read_line(&mut line)? == 0 {
            break;
        }

        let input = line.trim();

        if input.is_empty() {
            continue;
        }

        if let Some(meta) = input.strip_prefix(':') {
            match meta {
                "q" => break,

                "blk" => {
                    let source = read_block(&stdin)?;
                    exec(source.as_bytes(), &mut interpreter);
                }

                other => eprintln!("Unknown command ':{}'", other),
            }

            continue;
        }

        if input.ends_with(';') || input.ends_with('}') {
            exec(input.as_bytes(), &mut interpreter);
        } else {
            exec_expr(input.as_bytes(), &mut interpreter);
        }
    }

    Ok(())
}

fn read_block(stdin: &io::Stdin) -> anyhow::Result<String> {
    let mut source = String::new();
    let mut line = String::new();

    loop {
        line.clear();
        if stdin.lock().read_line(&mut line)? == 0 {
            break;
        }

        if line.trim().is_empty() {
            break;
        }

        source.push_str(&line);
    }

    Ok(source)
}

/// Full pipeline: scan, parse, resolve, interpret.  Any scan, parse or
/// resolve error blocks evaluation.
fn exec(source: &[u8], interpreter: &mut Interpreter) {
    let (tokens, scan_ok) = scanner::scan(source, ScanOptions::default(), report);

    let (statements, parse_ok) = Parser::new(tokens, report).parse();

    if !scan_ok || !parse_ok {
        return;
    }

    for stmt in &statements {
        debug!("ast: {}", AstPrinter::print_stmt(stmt));
    }

    if let Err(e) = Resolver::new(interpreter).resolve(&statements) {
        report(&e);
        return;
    }

    interpreter.interpret(&statements, report);
}

/// Expression pipeline for the prompt: scan, parse a single expression,
/// evaluate, print the value.
fn exec_expr(source: &[u8], interpreter: &mut Interpreter) {
    let (tokens, scan_ok) = scanner::scan(source, ScanOptions::default(), report);

    if !scan_ok {
        return;
    }

    let (expr, parse_ok) = Parser::new(tokens, report).parse_expression();

    if !parse_ok {
        return;
    }

    let Some(expr) = expr else {
        return;
    };

    debug!("ast: {}", AstPrinter::print(&expr));

    match interpreter.evaluate(&expr) {
        Ok(value) => println!("{}", value),

        Err(e) => report(&e),
    }
}

fn report(err: &LoxError) {
    eprintln!("{}", err);
}
