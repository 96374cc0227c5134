use rustyline::DefaultEditor;
use rustyline::error::ReadlineError;
use schemelet::ast::Value;
use schemelet::evaluator::Interpreter;
use schemelet::{parser, tokenizer};
use std::panic;
use std::process;

fn main() {
    let result = panic::catch_unwind(|| {
        run_repl();
    });

    if let Err(panic_info) = result {
        eprintln!("The REPL encountered an unexpected error and must exit.");

        if let Some(msg) = panic_info.downcast_ref::<&str>() {
            eprintln!("Error: {msg}");
        } else if let Some(msg) = panic_info.downcast_ref::<String>() {
            eprintln!("Error: {msg}");
        } else {
            eprintln!("Error: Unknown panic occurred");
        }

        process::exit(1);
    }
}

fn run_repl() {
    println!("Schemelet - a minimal Scheme dialect");
    println!("Enter S-expressions like: (+ 1 2)");
    println!("Type :help for more commands, or Ctrl+C to exit.");
    println!();

    let mut rl = DefaultEditor::new().expect("Could not initialize REPL");
    let mut interp = Interpreter::new();
    let mut show_tokens = false;

    loop {
        match rl.readline("schemelet> ") {
            Ok(line) => {
                let line = line.trim();
                if line.is_empty() {
                    continue;
                }

                // Add the line to history
                let _ = rl.add_history_entry(line);

                // Handle special commands
                match line {
                    ":help" => {
                        print_help();
                        continue;
                    }
                    ":env" => {
                        print_environment(&interp);
                        continue;
                    }
                    ":tokens" => {
                        show_tokens = !show_tokens;
                        if show_tokens {
                            println!("Token display enabled: inputs show their token stream first");
                        } else {
                            println!("Token display disabled");
                        }
                        continue;
                    }
                    ":quit" | ":exit" => {
                        println!("Goodbye!");
                        break;
                    }
                    _ => {}
                }

                let tokens = match tokenizer::tokenize(line) {
                    Ok(tokens) => tokens,
                    Err(e) => {
                        println!("Error: {e}");
                        continue;
                    }
                };
                if show_tokens {
                    for token in &tokens {
                        println!("{token}");
                    }
                }

                let forest = match parser::parse(&tokens) {
                    Ok(forest) => forest,
                    Err(e) => {
                        println!("Error: {e}");
                        continue;
                    }
                };

                for expr in &forest {
                    match interp.eval(expr) {
                        Ok(result) => {
                            // Don't print empty lines for Void results (e.g., from define)
                            if !matches!(result, Value::Void) {
                                println!("{result}");
                            }
                        }
                        Err(e) => {
                            println!("Error: {e}");
                            break;
                        }
                    }
                }
            }

            Err(ReadlineError::Eof) | Err(ReadlineError::Interrupted) => {
                println!("Goodbye!");
                break;
            }
            Err(err) => {
                println!("Error: {err:?}");
                break;
            }
        }
    }
}

fn print_help() {
    println!("Schemelet REPL commands:");
    println!("  :help    - Show this help message");
    println!("  :env     - Show current global bindings");
    println!("  :tokens  - Toggle diagnostic token display");
    println!("  :quit    - Exit the interpreter");
    println!("  :exit    - Exit the interpreter");
    println!("  Ctrl+C   - Exit the interpreter");
    println!();
    println!("The language:");
    println!("  Literals: 42, -7, 3.5, .5, #t/#f, \"text\"");
    println!("  Special forms: if, let, quote, define, lambda");
    println!("  Primitives: null?, car, cdr, cons, +, map");
    println!("  `}}` closes every open parenthesis at once");
    println!();
    println!("Examples:");
    println!("  (define add-one (lambda (x) (+ x 1)))");
    println!("  (add-one 41)");
    println!("  (map car (quote ((1 2) (3 4))))");
    println!("  (let ((x 1) (y 2)) (cons x y}}");
    println!();
}

fn print_environment(interp: &Interpreter) {
    let bindings = interp.global_bindings();

    if bindings.is_empty() {
        println!("Environment is empty.");
        return;
    }

    println!("Global bindings ({} total):", bindings.len());
    println!();

    // Separate built-in primitives from user-defined values
    let mut builtins = Vec::new();
    let mut user_defined = Vec::new();

    for (name, value) in bindings {
        match value {
            Value::Primitive(_) => builtins.push(name),
            _ => user_defined.push((name, value)),
        }
    }

    if !builtins.is_empty() {
        println!("Built-in primitives ({}):", builtins.len());
        let mut col = 0;
        for name in builtins {
            print!("  {name:<8}");
            col += 1;
            if col % 6 == 0 {
                println!();
            }
        }
        if col % 6 != 0 {
            println!();
        }
        println!();
    }

    if !user_defined.is_empty() {
        println!("User-defined values ({}):", user_defined.len());
        for (name, value) in user_defined {
            match value {
                Value::Void => println!("  {name}"),
                _ => println!("  {name} = {value}"),
            }
        }
    }
}
