pub mod ast;
pub mod interpreter;
pub mod lexer;
pub mod parser;
pub mod tco;

pub use interpreter::{Interpreter, RuntimeError, Value};
pub use lexer::{Lexer, Token, TokenType};

pub const VERSION: &str = env!("CARGO_PKG_VERSION");
pub const DESCRIPTION: &str = env!("CARGO_PKG_DESCRIPTION");

#[cfg(test)]
mod tests {
    #[test]
    fn hello() {
        assert_eq!(2 + 2, 4);
    }
}
