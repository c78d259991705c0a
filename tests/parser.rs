#[cfg(test)]
mod parser_tests {
    use lox::ast::{Expr, Stmt};
    use lox::ast_printer::AstPrinter;
    use lox::parser::Parser;
    use lox::scanner::{scan, ScanOptions};

    fn parse_program(source: &str) -> (Vec<Stmt>, bool, Vec<String>) {
        let mut errors: Vec<String> = Vec::new();

        let (tokens, _) = scan(source.as_bytes(), ScanOptions::default(), |e| {
            errors.push(e.to_string())
        });

        let (statements, ok) = Parser::new(tokens, |e| errors.push(e.to_string())).parse();

        (statements, ok, errors)
    }

    fn parse_expr(source: &str) -> (Option<Expr>, bool, Vec<String>) {
        let mut errors: Vec<String> = Vec::new();

        let (tokens, _) = scan(source.as_bytes(), ScanOptions::default(), |e| {
            errors.push(e.to_string())
        });

        let (expr, ok) = Parser::new(tokens, |e| errors.push(e.to_string())).parse_expression();

        (expr, ok, errors)
    }

    /// Parse a single expression that must succeed and render its shape.
    fn shape(source: &str) -> String {
        let (expr, ok, errors) = parse_expr(source);

        assert!(ok, "unexpected parse errors: {:?}", errors);

        AstPrinter::print(&expr.expect("expression"))
    }

    #[test]
    fn test_parser_01_precedence() {
        assert_eq!(shape("1 + 2 * 3"), "(+ 1 (* 2 3))");
        assert_eq!(shape("1 * 2 + 3"), "(+ (* 1 2) 3)");
        assert_eq!(shape("1 < 2 == true"), "(== (< 1 2) true)");
        assert_eq!(shape("1 + 2 < 3 + 4"), "(< (+ 1 2) (+ 3 4))");
    }

    #[test]
    fn test_parser_02_left_associativity() {
        assert_eq!(shape("1 - 2 - 3"), "(- (- 1 2) 3)");
        assert_eq!(shape("8 / 4 / 2"), "(/ (/ 8 4) 2)");
    }

    #[test]
    fn test_parser_03_unary() {
        assert_eq!(shape("-1 - -2"), "(- (- 1) (- 2))");
        assert_eq!(shape("!!true"), "(! (! true))");
    }

    #[test]
    fn test_parser_04_grouping() {
        assert_eq!(shape("(1 + 2) * 3"), "(* (group (+ 1 2)) 3)");
    }

    #[test]
    fn test_parser_05_ternary_right_associative() {
        assert_eq!(shape("a ? b : c ? d : e"), "(?: a b (?: c d e))");
    }

    #[test]
    fn test_parser_06_assignment_right_associative() {
        assert_eq!(shape("a = b = 1"), "(= a (= b 1))");
    }

    #[test]
    fn test_parser_07_logical_precedence() {
        assert_eq!(shape("a or b and c"), "(or a (and b c))");
    }

    #[test]
    fn test_parser_08_comma_at_top_level() {
        assert_eq!(shape("1, 2, 3"), "(, (, 1 2) 3)");
    }

    #[test]
    fn test_parser_09_comma_excluded_from_arguments() {
        assert_eq!(shape("f(1, 2)"), "(call f 1 2)");
        // Parenthesised, the comma operator is available again.
        assert_eq!(shape("f((1, 2))"), "(call f (group (, 1 2)))");
    }

    #[test]
    fn test_parser_10_chained_calls() {
        assert_eq!(shape("f()()"), "(call (call f))");
    }

    #[test]
    fn test_parser_11_function_expression() {
        assert_eq!(
            shape("fun (a, b) { return a; }"),
            "(fun (a b) (return a))"
        );
    }

    #[test]
    fn test_parser_12_string_and_nil_literals() {
        assert_eq!(shape("\"hi\" + \"ho\""), "(+ hi ho)");
        assert_eq!(shape("nil == nil"), "(== nil nil)");
    }

    #[test]
    fn test_parser_13_missing_left_operand_recovers() {
        let (expr, ok, errors) = parse_expr("* 3");

        assert!(!ok);
        assert_eq!(errors.len(), 1);
        assert!(errors[0].contains("left-hand operand"));

        assert_eq!(AstPrinter::print(&expr.expect("expression")), "(* (nothing) 3)");
    }

    #[test]
    fn test_parser_14_missing_right_operand_recovers() {
        let (statements, ok, errors) = parse_program("1 +;");

        assert!(!ok);
        assert_eq!(errors.len(), 1);

        assert_eq!(statements.len(), 1);
        assert_eq!(
            AstPrinter::print_stmt(&statements[0]),
            "(expr (+ 1 (nothing)))"
        );
    }

    #[test]
    fn test_parser_15_missing_colon_is_hard_error() {
        let (expr, ok, errors) = parse_expr("a ? b");

        assert!(!ok);
        assert!(expr.is_none());
        assert!(errors.iter().any(|e| e.contains("Expect ':'")));
    }

    #[test]
    fn test_parser_16_synchronization_recovers_later_statements() {
        let (statements, ok, errors) = parse_program("var = 1; print 2;");

        assert!(!ok);
        assert_eq!(errors.len(), 1);
        assert!(errors[0].contains("Expect variable name."));

        // The parser resynchronised after the ';' and kept going.
        assert_eq!(statements.len(), 1);
        assert_eq!(AstPrinter::print_stmt(&statements[0]), "(print 2)");
    }

    #[test]
    fn test_parser_17_for_desugars_to_while() {
        let (statements, ok, errors) =
            parse_program("for (var i = 0; i < 3; i = i + 1) print i;");

        assert!(ok, "unexpected parse errors: {:?}", errors);
        assert_eq!(statements.len(), 1);

        assert_eq!(
            AstPrinter::print_stmt(&statements[0]),
            "(block (var i 0) (while (< i 3) (block (print i) (expr (= i (+ i 1))))))"
        );
    }

    #[test]
    fn test_parser_18_for_with_empty_clauses() {
        let (statements, ok, errors) = parse_program("for (;;) break;");

        assert!(ok, "unexpected parse errors: {:?}", errors);
        assert_eq!(
            AstPrinter::print_stmt(&statements[0]),
            "(while true (break))"
        );
    }

    #[test]
    fn test_parser_19_argument_limit() {
        let args: Vec<String> = (0..256).map(|i| i.to_string()).collect();
        let source = format!("f({});", args.join(", "));

        let (_, ok, errors) = parse_program(&source);

        assert!(!ok);
        assert!(errors
            .iter()
            .any(|e| e.contains("Cannot have more than 255 arguments.")));
    }

    #[test]
    fn test_parser_20_parameter_limit() {
        let params: Vec<String> = (0..256).map(|i| format!("p{}", i)).collect();
        let source = format!("fun f({}) {{}}", params.join(", "));

        let (_, ok, errors) = parse_program(&source);

        assert!(!ok);
        assert!(errors
            .iter()
            .any(|e| e.contains("Cannot have more than 255 parameters.")));
    }

    #[test]
    fn test_parser_21_invalid_assignment_target() {
        let (statements, ok, errors) = parse_program("1 = 2;");

        assert!(!ok);
        assert!(errors
            .iter()
            .any(|e| e.contains("Invalid assignment target.")));

        // The statement still parses; evaluation is refused by the driver.
        assert_eq!(statements.len(), 1);
    }

    #[test]
    fn test_parser_22_named_function_declaration() {
        let (statements, ok, errors) = parse_program("fun f(a) { return a; }");

        assert!(ok, "unexpected parse errors: {:?}", errors);
        assert_eq!(
            AstPrinter::print_stmt(&statements[0]),
            "(fun f (a) (return a))"
        );
    }

    #[test]
    fn test_parser_23_fun_expression_statement_needs_no_name() {
        // `fun` followed by '(' is an expression, not a declaration.
        let (statements, ok, errors) = parse_program("fun () {}();");

        assert!(ok, "unexpected parse errors: {:?}", errors);
        assert_eq!(
            AstPrinter::print_stmt(&statements[0]),
            "(expr (call (fun ())))"
        );
    }

    #[test]
    fn test_parser_24_if_else_binds_to_nearest() {
        let (statements, ok, errors) =
            parse_program("if (a) if (b) print 1; else print 2;");

        assert!(ok, "unexpected parse errors: {:?}", errors);
        assert_eq!(
            AstPrinter::print_stmt(&statements[0]),
            "(if a (if b (print 1) (print 2)))"
        );
    }

    #[test]
    fn test_parser_25_while_and_break() {
        let (statements, ok, errors) = parse_program("while (i < 3) { i = i + 1; break; }");

        assert!(ok, "unexpected parse errors: {:?}", errors);
        assert_eq!(
            AstPrinter::print_stmt(&statements[0]),
            "(while (< i 3) (block (expr (= i (+ i 1))) (break)))"
        );
    }

    #[test]
    fn test_parser_26_expression_mode_rejects_trailing_tokens() {
        let (_, ok, errors) = parse_expr("1 + 2 3");

        assert!(!ok);
        assert!(errors.iter().any(|e| e.contains("Expect end of expression.")));
    }

    #[test]
    fn test_parser_27_var_declaration_forms() {
        let (statements, ok, errors) = parse_program("var a; var b = 2;");

        assert!(ok, "unexpected parse errors: {:?}", errors);
        assert_eq!(AstPrinter::print_stmt(&statements[0]), "(var a)");
        assert_eq!(AstPrinter::print_stmt(&statements[1]), "(var b 2)");
    }
}
