use std::fs;
use std::io::{self, Write};

use anyhow::{Context, Result};
use clap::{Parser as ClapParser, Subcommand};
use colored::Colorize;

use serval::interpreter::Interpreter;
use serval::lexer::{Lexer, Token, TokenType};
use serval::parser;

#[derive(ClapParser)]
#[command(name = "serval")]
#[command(version = serval::VERSION)]
#[command(about = serval::DESCRIPTION, long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Run a Serval source file
    Run {
        /// The source file to run
        file: String,

        /// Maximum call depth before execution aborts
        #[arg(long, default_value_t = 1000)]
        recursion_limit: usize,

        /// Reject decorated functions with unconvertible tail returns
        #[arg(long)]
        strict_tco: bool,
    },
    /// Start a REPL session
    Repl,
    /// Lex a file and print the tokens (for debugging)
    Lex {
        /// The source file to lex
        file: String,

        /// Highlight token types with colors
        #[arg(short, long)]
        color: bool,
    },
    /// Parse a file and print the AST (for debugging)
    Parse {
        /// The source file to parse
        file: String,

        /// Show every top-level statement
        #[arg(short, long)]
        verbose: bool,
    },
    /// Check a file for syntax errors
    Check {
        /// The source file to check
        file: String,
    },
}

fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("warn")),
        )
        .with_writer(io::stderr)
        .init();

    let cli = Cli::parse();

    match cli.command {
        Commands::Run {
            file,
            recursion_limit,
            strict_tco,
        } => {
            run_file(&file, recursion_limit, strict_tco)?;
        }
        Commands::Repl => {
            run_repl()?;
        }
        Commands::Lex { file, color } => {
            lex_file(&file, color)?;
        }
        Commands::Parse { file, verbose } => {
            parse_file(&file, verbose)?;
        }
        Commands::Check { file } => {
            check_file(&file)?;
        }
    }

    Ok(())
}

fn load_module(filename: &str) -> Result<Option<serval::ast::Module>> {
    let source = fs::read_to_string(filename)
        .with_context(|| format!("Failed to read file: {}", filename))?;

    let mut lexer = Lexer::new(&source);
    let tokens = lexer.tokenize();

    let lexer_errors = lexer.get_errors();
    if !lexer_errors.is_empty() {
        eprintln!("Lexical errors found in '{}':", filename);
        for error in lexer_errors {
            eprintln!("  {}", error);
        }
        return Ok(None);
    }

    match parser::parse(tokens) {
        Ok(module) => Ok(Some(module)),
        Err(errors) => {
            eprintln!("Syntax errors found in '{}':", filename);
            for error in errors {
                eprintln!("  {}", error.get_message());
            }
            Ok(None)
        }
    }
}

fn run_file(filename: &str, recursion_limit: usize, strict_tco: bool) -> Result<()> {
    let Some(module) = load_module(filename)? else {
        return Ok(());
    };

    let mut interpreter = Interpreter::with_recursion_limit(recursion_limit).strict_tco(strict_tco);
    if let Err(error) = interpreter.interpret(&module) {
        eprintln!("{} {}", "Runtime error:".bright_red(), error);
    }

    Ok(())
}

fn run_repl() -> Result<()> {
    println!("{}", "Serval REPL".bright_green());
    println!("Type 'exit' or press Ctrl+D to exit");

    let mut interpreter = Interpreter::new();
    let mut input_buffer = String::new();
    let mut paren_level = 0;
    let mut bracket_level = 0;
    let mut in_multiline_block = false;

    loop {
        let prompt = if !input_buffer.is_empty() {
            "... ".bright_yellow().to_string()
        } else {
            ">>> ".bright_green().to_string()
        };

        print!("{}", prompt);
        io::stdout().flush()?;

        let mut input = String::new();
        if io::stdin().read_line(&mut input)? == 0 {
            break;
        }

        let input = input.trim_end();

        if input_buffer.is_empty() && input == "exit" {
            break;
        }

        input_buffer.push_str(input);
        input_buffer.push('\n');

        update_repl_state(
            input,
            &mut paren_level,
            &mut bracket_level,
            &mut in_multiline_block,
        );

        let should_execute = !in_multiline_block
            && paren_level == 0
            && bracket_level == 0
            && (input.trim().is_empty() || !input.trim().ends_with(':'));

        if should_execute {
            let complete_input = input_buffer.trim();

            if !complete_input.is_empty() {
                let mut lexer = Lexer::new(complete_input);
                let tokens = lexer.tokenize();

                let lexer_errors = lexer.get_errors();
                if !lexer_errors.is_empty() {
                    for error in lexer_errors {
                        eprintln!("{}", error.to_string().bright_red());
                    }
                } else {
                    match parser::parse(tokens) {
                        Ok(module) => {
                            if let Err(error) = interpreter.interpret(&module) {
                                eprintln!("{}", error.to_string().bright_red());
                            }
                        }
                        Err(errors) => {
                            for error in errors {
                                eprintln!("{}", error.get_message().bright_red());
                            }
                        }
                    }
                }
            }

            input_buffer.clear();
            paren_level = 0;
            bracket_level = 0;
            in_multiline_block = false;
        }
    }

    println!("Goodbye!");
    Ok(())
}

/// Updates the REPL state based on the current line of input
fn update_repl_state(
    input: &str,
    paren_level: &mut usize,
    bracket_level: &mut usize,
    in_multiline_block: &mut bool,
) {
    for c in input.chars() {
        match c {
            '(' => *paren_level += 1,
            ')' => {
                if *paren_level > 0 {
                    *paren_level -= 1
                }
            }
            '[' => *bracket_level += 1,
            ']' => {
                if *bracket_level > 0 {
                    *bracket_level -= 1
                }
            }
            _ => {}
        }
    }

    if input.trim().ends_with(':') {
        *in_multiline_block = true;
    } else if input.trim().is_empty() && *in_multiline_block {
        *in_multiline_block = false;
    }
}

fn lex_file(filename: &str, use_color: bool) -> Result<()> {
    let source = fs::read_to_string(filename)
        .with_context(|| format!("Failed to read file: {}", filename))?;

    let mut lexer = Lexer::new(&source);
    let tokens = lexer.tokenize();

    let errors = lexer.get_errors();
    if !errors.is_empty() {
        eprintln!("Lexical errors found in '{}':", filename);
        for error in errors {
            if use_color {
                eprintln!("{}", error.to_string().bright_red());
            } else {
                eprintln!("{}", error);
            }
        }
    }

    println!("Tokens from file '{}':", filename);
    for token in &tokens {
        println!("{}", format_token(token, use_color));
    }

    Ok(())
}

fn parse_file(filename: &str, verbose: bool) -> Result<()> {
    let Some(module) = load_module(filename)? else {
        return Ok(());
    };

    println!("Successfully parsed file: {}", filename);

    if verbose {
        for (i, stmt) in module.body.iter().enumerate() {
            println!("  {}: {}", i + 1, stmt);
        }
    } else {
        println!("AST contains {} top-level statements", module.body.len());

        let max_preview = 5;
        let preview_count = std::cmp::min(max_preview, module.body.len());
        if preview_count > 0 {
            println!("Top-level statements:");
            for (i, stmt) in module.body.iter().take(preview_count).enumerate() {
                println!("  {}: {}", i + 1, stmt);
            }
            if module.body.len() > max_preview {
                println!("  ... and {} more", module.body.len() - max_preview);
            }
        }
    }

    Ok(())
}

fn check_file(filename: &str) -> Result<()> {
    let source = fs::read_to_string(filename)
        .with_context(|| format!("Failed to read file: {}", filename))?;

    let mut lexer = Lexer::new(&source);
    let tokens = lexer.tokenize();

    let lexer_errors = lexer.get_errors();
    if !lexer_errors.is_empty() {
        eprintln!("✗ Lexical errors found in '{}':", filename);
        for error in lexer_errors {
            eprintln!("  {}", error);
        }
        return Ok(());
    }

    match parser::parse(tokens) {
        Ok(_) => {
            println!("✓ No syntax errors found in '{}'", filename);
        }
        Err(errors) => {
            eprintln!("✗ Syntax errors found in '{}':", filename);
            for error in errors {
                eprintln!("  {}", error.get_message());
            }
        }
    }

    Ok(())
}

fn format_token(token: &Token, use_color: bool) -> String {
    if !use_color {
        return format!("{}", token);
    }

    match &token.token_type {
        TokenType::Invalid(_) => format!("{}", token).bright_red().to_string(),
        TokenType::Indent | TokenType::Dedent | TokenType::Newline => {
            format!("{}", token).bright_magenta().to_string()
        }
        TokenType::Identifier(_) => format!("{}", token).bright_yellow().to_string(),
        TokenType::Def
        | TokenType::If
        | TokenType::Elif
        | TokenType::Else
        | TokenType::For
        | TokenType::While
        | TokenType::Return => format!("{}", token).bright_blue().to_string(),
        TokenType::StringLiteral(_) => format!("{}", token).bright_green().to_string(),
        TokenType::IntLiteral(_) | TokenType::FloatLiteral(_) => {
            format!("{}", token).bright_cyan().to_string()
        }
        _ => format!("{}", token),
    }
}
