use std::io::{self, Read};
use std::process;

use schemelet::evaluator::Interpreter;
use schemelet::{parser, tokenizer};

/// Read the whole input stream, evaluate each top-level expression in source
/// order printing its rendering, and stop at the first error with a single
/// diagnostic. Exit status 0 on a clean run, 1 on any error.
fn main() {
    let mut source = String::new();
    if let Err(err) = io::stdin().read_to_string(&mut source) {
        println!("Error: {err}");
        process::exit(1);
    }
    process::exit(run(&source));
}

fn run(source: &str) -> i32 {
    let forest = match tokenizer::tokenize(source).and_then(|tokens| parser::parse(&tokens)) {
        Ok(forest) => forest,
        Err(err) => {
            println!("Error: {err}");
            return 1;
        }
    };

    let mut interp = Interpreter::new();
    for expr in &forest {
        match interp.eval(expr) {
            // Void renders as nothing, leaving a bare newline
            Ok(value) => println!("{value}"),
            Err(err) => {
                println!("Error: {err}");
                return 1;
            }
        }
    }
    0
}
