#[cfg(test)]
mod scanner_tests {
    use lox::scanner::{scan, ScanOptions, Scanner};
    use lox::token::TokenType;

    fn scan_ok(source: &str) -> Vec<(TokenType, String)> {
        let (tokens, ok) = scan(source.as_bytes(), ScanOptions::default(), |e| {
            panic!("unexpected scan error: {}", e)
        });

        assert!(ok);

        tokens
            .into_iter()
            .map(|t| (t.token_type, t.lexeme))
            .collect()
    }

    fn assert_token_sequence(source: &str, expected: &[(TokenType, &str)]) {
        let tokens = scan_ok(source);

        assert_eq!(tokens.len(), expected.len(), "token count for {:?}", source);

        for (actual, (expected_type, expected_lexeme)) in tokens.iter().zip(expected.iter()) {
            assert_eq!(&actual.0, expected_type);
            assert_eq!(actual.1, *expected_lexeme);
        }
    }

    #[test]
    fn test_scanner_01_symbols() {
        assert_token_sequence(
            "({*.,+*})",
            &[
                (TokenType::LEFT_PAREN, "("),
                (TokenType::LEFT_BRACE, "{"),
                (TokenType::STAR, "*"),
                (TokenType::DOT, "."),
                (TokenType::COMMA, ","),
                (TokenType::PLUS, "+"),
                (TokenType::STAR, "*"),
                (TokenType::RIGHT_BRACE, "}"),
                (TokenType::RIGHT_PAREN, ")"),
                (TokenType::EOF, ""),
            ],
        );
    }

    #[test]
    fn test_scanner_02_ternary_punctuation() {
        assert_token_sequence(
            "a ? b : c;",
            &[
                (TokenType::IDENTIFIER, "a"),
                (TokenType::QUESTION, "?"),
                (TokenType::IDENTIFIER, "b"),
                (TokenType::COLON, ":"),
                (TokenType::IDENTIFIER, "c"),
                (TokenType::SEMICOLON, ";"),
                (TokenType::EOF, ""),
            ],
        );
    }

    #[test]
    fn test_scanner_03_two_char_operators_maximal_munch() {
        assert_token_sequence(
            "!= == <= >= ! = < > =",
            &[
                (TokenType::BANG_EQUAL, "!="),
                (TokenType::EQUAL_EQUAL, "=="),
                (TokenType::LESS_EQUAL, "<="),
                (TokenType::GREATER_EQUAL, ">="),
                (TokenType::BANG, "!"),
                (TokenType::EQUAL, "="),
                (TokenType::LESS, "<"),
                (TokenType::GREATER, ">"),
                (TokenType::EQUAL, "="),
                (TokenType::EOF, ""),
            ],
        );
    }

    #[test]
    fn test_scanner_04_keywords_beat_identifiers() {
        assert_token_sequence(
            "var while break fun breaker _while",
            &[
                (TokenType::VAR, "var"),
                (TokenType::WHILE, "while"),
                (TokenType::BREAK, "break"),
                (TokenType::FUN, "fun"),
                (TokenType::IDENTIFIER, "breaker"),
                (TokenType::IDENTIFIER, "_while"),
                (TokenType::EOF, ""),
            ],
        );
    }

    #[test]
    fn test_scanner_05_numbers() {
        // No trailing or leading dot: "1." is 1 then DOT, ".5" is DOT then 5.
        assert_token_sequence(
            "123 1.5 1. .5",
            &[
                (TokenType::NUMBER(0.0), "123"),
                (TokenType::NUMBER(0.0), "1.5"),
                (TokenType::NUMBER(0.0), "1"),
                (TokenType::DOT, "."),
                (TokenType::DOT, "."),
                (TokenType::NUMBER(0.0), "5"),
                (TokenType::EOF, ""),
            ],
        );
    }

    #[test]
    fn test_scanner_06_number_payloads() {
        let tokens = scan_ok("42 2.5");

        match &tokens[0].0 {
            TokenType::NUMBER(n) => assert_eq!(*n, 42.0),
            other => panic!("expected number, got {:?}", other),
        }

        match &tokens[1].0 {
            TokenType::NUMBER(n) => assert_eq!(*n, 2.5),
            other => panic!("expected number, got {:?}", other),
        }
    }

    #[test]
    fn test_scanner_07_string_literal() {
        let tokens = scan_ok("\"hello world\"");

        match &tokens[0].0 {
            TokenType::STRING(s) => assert_eq!(s, "hello world"),
            other => panic!("expected string, got {:?}", other),
        }

        // The lexeme keeps the quotes; the payload drops them.
        assert_eq!(tokens[0].1, "\"hello world\"");
    }

    #[test]
    fn test_scanner_08_multiline_string_tracks_lines() {
        let (tokens, ok) = scan("\"a\nb\"\nx".as_bytes(), ScanOptions::default(), |e| {
            panic!("unexpected scan error: {}", e)
        });

        assert!(ok);

        match &tokens[0].token_type {
            TokenType::STRING(s) => assert_eq!(s, "a\nb"),
            other => panic!("expected string, got {:?}", other),
        }

        assert_eq!(tokens[1].token_type, TokenType::IDENTIFIER);
        assert_eq!(tokens[1].line, 3);
    }

    #[test]
    fn test_scanner_09_unterminated_string() {
        let mut errors: Vec<String> = Vec::new();

        let (tokens, ok) = scan("\"abc".as_bytes(), ScanOptions::default(), |e| {
            errors.push(e.to_string())
        });

        assert!(!ok);
        assert_eq!(errors.len(), 1);
        assert!(errors[0].contains("Unterminated string."));

        // The error still contributes an ERROR token, then EOF.
        assert_eq!(tokens.len(), 2);
        assert_eq!(tokens[0].token_type, TokenType::ERROR);
        assert_eq!(tokens[0].lexeme, "\"abc");
        assert_eq!(tokens[1].token_type, TokenType::EOF);
    }

    #[test]
    fn test_scanner_10_line_comment_dropped() {
        assert_token_sequence(
            "1 // the rest is ignored == != \n2",
            &[
                (TokenType::NUMBER(0.0), "1"),
                (TokenType::NUMBER(0.0), "2"),
                (TokenType::EOF, ""),
            ],
        );
    }

    #[test]
    fn test_scanner_11_block_comment_dropped() {
        assert_token_sequence(
            "1 /* spanning\ntwo lines */ 2",
            &[
                (TokenType::NUMBER(0.0), "1"),
                (TokenType::NUMBER(0.0), "2"),
                (TokenType::EOF, ""),
            ],
        );
    }

    #[test]
    fn test_scanner_12_block_comments_do_not_nest() {
        // The comment ends at the FIRST "*/"; the tail lexes as ordinary
        // tokens.
        assert_token_sequence(
            "/* a /* b */ c */",
            &[
                (TokenType::IDENTIFIER, "c"),
                (TokenType::STAR, "*"),
                (TokenType::SLASH, "/"),
                (TokenType::EOF, ""),
            ],
        );
    }

    #[test]
    fn test_scanner_13_unterminated_block_comment() {
        let mut errors: Vec<String> = Vec::new();

        let (_, ok) = scan("/* never closed".as_bytes(), ScanOptions::default(), |e| {
            errors.push(e.to_string())
        });

        assert!(!ok);
        assert_eq!(errors.len(), 1);
        assert!(errors[0].contains("Unterminated block comment."));
    }

    #[test]
    fn test_scanner_14_slash_is_division() {
        assert_token_sequence(
            "1 / 2",
            &[
                (TokenType::NUMBER(0.0), "1"),
                (TokenType::SLASH, "/"),
                (TokenType::NUMBER(0.0), "2"),
                (TokenType::EOF, ""),
            ],
        );
    }

    #[test]
    fn test_scanner_15_trivia_tokens_on_request() {
        let options = ScanOptions {
            include_whitespace: true,
            include_comments: true,
        };

        let (tokens, ok) = scan("1 // hi\n2".as_bytes(), options, |e| {
            panic!("unexpected scan error: {}", e)
        });

        assert!(ok);

        let kinds: Vec<TokenType> = tokens.iter().map(|t| t.token_type.clone()).collect();

        assert_eq!(
            kinds,
            vec![
                TokenType::NUMBER(0.0),
                TokenType::WHITESPACE,
                TokenType::COMMENT,
                TokenType::WHITESPACE,
                TokenType::NUMBER(0.0),
                TokenType::EOF,
            ]
        );

        assert_eq!(tokens[2].lexeme, "// hi");
    }

    #[test]
    fn test_scanner_16_lexemes_reconstruct_source() {
        let source = "var x = 1.5; // note\n/* block */ \"str\" @ while";

        let options = ScanOptions {
            include_whitespace: true,
            include_comments: true,
        };

        let mut errors: Vec<String> = Vec::new();

        let (tokens, ok) = scan(source.as_bytes(), options, |e| errors.push(e.to_string()));

        // '@' is an error, but its lexeme still lands in the stream.
        assert!(!ok);
        assert_eq!(errors.len(), 1);

        let rebuilt: String = tokens.iter().map(|t| t.lexeme.as_str()).collect();

        assert_eq!(rebuilt, source);
    }

    #[test]
    fn test_scanner_17_exactly_one_trailing_eof() {
        for source in ["", "1 + 2", "// only a comment", "\"s\""] {
            let (tokens, _) = scan(source.as_bytes(), ScanOptions::default(), |_| {});

            let eof_count = tokens
                .iter()
                .filter(|t| t.token_type == TokenType::EOF)
                .count();

            assert_eq!(eof_count, 1, "source {:?}", source);
            assert_eq!(tokens.last().unwrap().token_type, TokenType::EOF);
        }
    }

    #[test]
    fn test_scanner_18_unexpected_chars_reported_and_spliced() {
        let mut errors: Vec<String> = Vec::new();

        let (tokens, ok) = scan(",.$(#".as_bytes(), ScanOptions::default(), |e| {
            errors.push(e.to_string())
        });

        assert!(!ok);
        assert_eq!(errors.len(), 2);

        for err in &errors {
            assert!(
                err.contains("Unexpected character"),
                "error message should contain 'Unexpected character', got: {}",
                err
            );
        }

        let kinds: Vec<TokenType> = tokens.iter().map(|t| t.token_type.clone()).collect();

        assert_eq!(
            kinds,
            vec![
                TokenType::COMMA,
                TokenType::DOT,
                TokenType::ERROR,
                TokenType::LEFT_PAREN,
                TokenType::ERROR,
                TokenType::EOF,
            ]
        );
    }

    #[test]
    fn test_scanner_19_iterator_is_fused() {
        let mut scanner = Scanner::new(b"1".to_vec());

        assert!(scanner.next().is_some()); // NUMBER
        assert!(scanner.next().is_some()); // EOF
        assert!(scanner.next().is_none());
        assert!(scanner.next().is_none());
    }

    #[test]
    fn test_scanner_20_line_numbers() {
        let (tokens, ok) = scan("1\n2\n\n3".as_bytes(), ScanOptions::default(), |e| {
            panic!("unexpected scan error: {}", e)
        });

        assert!(ok);
        assert_eq!(tokens[0].line, 1);
        assert_eq!(tokens[1].line, 2);
        assert_eq!(tokens[2].line, 4);
    }
}
