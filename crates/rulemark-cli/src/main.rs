use std::env;
use std::fs;
use std::io::{self, Read};
use std::process;

use rulemark_core::{transform, transform_sanitized};

fn main() {
    let mut input: Option<String> = None;
    let mut sanitized = false;
    let mut language = String::new();

    let mut args = env::args().skip(1);
    while let Some(arg) = args.next() {
        match arg.as_str() {
            "-h" | "--help" => {
                print_usage();
                return;
            }
            "-s" | "--sanitized" => sanitized = true,
            "-l" | "--language" => {
                language = match args.next() {
                    Some(value) => value,
                    None => {
                        eprintln!("--language expects a value");
                        print_usage();
                        process::exit(2);
                    }
                };
            }
            _ => {
                if arg.starts_with('-') && arg != "-" {
                    eprintln!("unknown option: {}", arg);
                    print_usage();
                    process::exit(2);
                }
                if input.is_none() {
                    input = Some(arg);
                } else {
                    eprintln!("unexpected argument: {}", arg);
                    print_usage();
                    process::exit(2);
                }
            }
        }
    }

    let source = match input.as_deref() {
        Some(path) if path != "-" => fs::read_to_string(path).unwrap_or_else(|err| {
            eprintln!("failed to read {}: {}", path, err);
            process::exit(1);
        }),
        _ => {
            let mut buffer = String::new();
            io::stdin()
                .read_to_string(&mut buffer)
                .unwrap_or_else(|err| {
                    eprintln!("failed to read stdin: {}", err);
                    process::exit(1);
                });
            buffer
        }
    };

    let html = if sanitized {
        transform_sanitized(&source, &language)
    } else {
        transform(&source, &language)
    };

    print!("{}", html);
}

fn print_usage() {
    eprintln!("Usage: rulemark-cli [-l|--language <language>] [-s|--sanitized] [input|-]");
}
