#[cfg(test)]
mod lexer_tests {
    use serval::lexer::{Lexer, Token, TokenType};

    fn tokenize(source: &str) -> Vec<Token> {
        let mut lexer = Lexer::new(source);
        let tokens = lexer.tokenize();
        assert!(lexer.get_errors().is_empty(), "{:?}", lexer.get_errors());
        tokens
    }

    fn token_types(source: &str) -> Vec<TokenType> {
        tokenize(source).into_iter().map(|t| t.token_type).collect()
    }

    #[test]
    fn test_decorated_function_token_stream() {
        let types = token_types("@tco(floor=0)\ndef f(n):\n    return f(n - 1)\n");
        assert_eq!(
            types,
            vec![
                TokenType::At,
                TokenType::Identifier("tco".to_string()),
                TokenType::LeftParen,
                TokenType::Identifier("floor".to_string()),
                TokenType::Assign,
                TokenType::IntLiteral(0),
                TokenType::RightParen,
                TokenType::Newline,
                TokenType::Def,
                TokenType::Identifier("f".to_string()),
                TokenType::LeftParen,
                TokenType::Identifier("n".to_string()),
                TokenType::RightParen,
                TokenType::Colon,
                TokenType::Newline,
                TokenType::Indent,
                TokenType::Return,
                TokenType::Identifier("f".to_string()),
                TokenType::LeftParen,
                TokenType::Identifier("n".to_string()),
                TokenType::Minus,
                TokenType::IntLiteral(1),
                TokenType::RightParen,
                TokenType::Newline,
                TokenType::Dedent,
                TokenType::EOF,
            ]
        );
    }

    #[test]
    fn test_nested_blocks_emit_matching_dedents() {
        let types = token_types("if a:\n    if b:\n        pass\n");
        let indents = types.iter().filter(|t| **t == TokenType::Indent).count();
        let dedents = types.iter().filter(|t| **t == TokenType::Dedent).count();
        assert_eq!(indents, 2);
        assert_eq!(dedents, 2);
    }

    #[test]
    fn test_dedent_to_intermediate_level() {
        let types = token_types(
            "\
while a:
    if b:
        pass
    x = 1
",
        );
        // Dedent back to the loop body, then out of the loop at EOF
        let dedents = types.iter().filter(|t| **t == TokenType::Dedent).count();
        assert_eq!(dedents, 2);
    }

    #[test]
    fn test_float_and_int_literals() {
        let types = token_types("a = 3.5\nb = 10\nc = 2.\n");
        assert!(types.contains(&TokenType::FloatLiteral(3.5)));
        assert!(types.contains(&TokenType::IntLiteral(10)));
        assert!(types.contains(&TokenType::FloatLiteral(2.0)));
    }

    #[test]
    fn test_keywords_are_not_identifiers() {
        let types = token_types("not True and False or None in x\n");
        assert_eq!(
            types,
            vec![
                TokenType::Not,
                TokenType::True,
                TokenType::And,
                TokenType::False,
                TokenType::Or,
                TokenType::None,
                TokenType::In,
                TokenType::Identifier("x".to_string()),
                TokenType::Newline,
                TokenType::EOF,
            ]
        );
    }

    #[test]
    fn test_line_continuation_joins_lines() {
        let types = token_types("x = 1 + \\\n    2\n");
        assert_eq!(
            types,
            vec![
                TokenType::Identifier("x".to_string()),
                TokenType::Assign,
                TokenType::IntLiteral(1),
                TokenType::Plus,
                TokenType::IntLiteral(2),
                TokenType::Newline,
                TokenType::EOF,
            ]
        );
    }

    #[test]
    fn test_newline_suppressed_inside_brackets() {
        let types = token_types("xs = [\n    1,\n    2,\n]\n");
        let newlines = types.iter().filter(|t| **t == TokenType::Newline).count();
        assert_eq!(newlines, 1);
        assert!(!types.contains(&TokenType::Indent));
    }

    #[test]
    fn test_token_positions() {
        let tokens = tokenize("x = 1\ny = 2\n");
        assert_eq!(tokens[0].line, 1);
        assert_eq!(tokens[0].column, 1);
        let y = tokens
            .iter()
            .find(|t| t.token_type == TokenType::Identifier("y".to_string()))
            .unwrap();
        assert_eq!(y.line, 2);
        assert_eq!(y.column, 1);
    }

    #[test]
    fn test_compound_assignment_operators() {
        let types = token_types("a += 1\nb -= 2\nc *= 3\nd /= 4\ne %= 5\n");
        assert!(types.contains(&TokenType::PlusAssign));
        assert!(types.contains(&TokenType::MinusAssign));
        assert!(types.contains(&TokenType::MulAssign));
        assert!(types.contains(&TokenType::DivAssign));
        assert!(types.contains(&TokenType::ModAssign));
    }

    #[test]
    fn test_inconsistent_dedent_is_an_error() {
        let mut lexer = Lexer::new("if a:\n        pass\n    pass\n");
        lexer.tokenize();
        assert!(!lexer.get_errors().is_empty());
    }
}
