//! Parser integration tests.
//!
//! Full CST dumps are used sparingly; most tests snapshot a node-only
//! outline, which is enough to pin precedence and nesting.

use insta::assert_snapshot;
use tbind_parser::ast::{AstNode, Expr, Stmt, TempBinding};
use tbind_parser::{debug_tree, parse, SyntaxKind, SyntaxNode};

/// Indented node kinds, tokens omitted.
fn outline(source: &str) -> String {
    fn walk(node: &SyntaxNode, depth: usize, out: &mut Vec<String>) {
        out.push(format!("{}{:?}", "  ".repeat(depth), node.kind()));
        for child in node.children() {
            walk(&child, depth + 1, out);
        }
    }
    let parse = parse(source);
    let mut lines = Vec::new();
    walk(&parse.syntax(), 0, &mut lines);
    for err in parse.errors() {
        lines.push(format!("error: {} @{}..{}", err.message, err.span.start, err.span.end));
    }
    lines.join("\n")
}

fn error_messages(source: &str) -> Vec<String> {
    parse(source).errors().iter().map(|e| e.message.clone()).collect()
}

// ── Lossless tree ────────────────────────────────────────────────────────

#[test]
fn declaration_form_full_tree() {
    let parse = parse("let($) x = 1, $;");
    assert!(parse.ok());
    assert_snapshot!(debug_tree(&parse.syntax()), @r#"
    SOURCE_FILE@0..16
      TEMP_BINDING_DECL@0..16
        LET_KW@0..3 "let"
        BINDING_MARKER@3..6
          L_PAREN@3..4 "("
          IDENT@4..5 "$"
          R_PAREN@5..6 ")"
        WHITESPACE@6..7 " "
        IDENT@7..8 "x"
        WHITESPACE@8..9 " "
        EQ@9..10 "="
        WHITESPACE@10..11 " "
        STEP_LIST@11..15
          LITERAL@11..12
            NUMBER@11..12 "1"
          COMMA@12..13 ","
          WHITESPACE@13..14 " "
          NAME_REF@14..15
            IDENT@14..15 "$"
        SEMICOLON@15..16 ";"
      EOF@16..16 ""
    "#);
}

#[test]
fn tree_text_round_trips_source() {
    let source = "  // lead\nfunction f(a, ...b) {\n  return a /* mid */ + b.length;\n}\n";
    let parse = parse(source);
    assert!(parse.ok(), "{:?}", parse.errors());
    assert_eq!(parse.syntax().text().to_string(), source);
}

// ── Temporary bindings ───────────────────────────────────────────────────

#[test]
fn expression_form_as_statement() {
    assert_snapshot!(outline("let(a) = [1, 2], a[a.length - 1];"), @r"
    SOURCE_FILE
      EXPR_STMT
        TEMP_BINDING_EXPR
          BINDING_MARKER
          STEP_LIST
            ARRAY_EXPR
              LITERAL
              LITERAL
            INDEX_EXPR
              NAME_REF
              BINARY_EXPR
                FIELD_EXPR
                  NAME_REF
                LITERAL
    ");
}

#[test]
fn expression_form_in_return() {
    assert_snapshot!(outline("return let(a) = f(), a + 1;"), @r"
    SOURCE_FILE
      RETURN_STMT
        TEMP_BINDING_EXPR
          BINDING_MARKER
          STEP_LIST
            CALL_EXPR
              NAME_REF
              ARG_LIST
            BINARY_EXPR
              NAME_REF
              LITERAL
    ");
}

#[test]
fn step_list_is_greedy_inside_arguments() {
    let parse = parse("f(var(_) = a, _, b);");
    assert!(parse.ok());
    let Some(Stmt::ExprStmt(stmt)) = parse.tree().stmts().next() else {
        panic!("expected expression statement");
    };
    let Some(Expr::CallExpr(call)) = stmt.expr() else {
        panic!("expected call");
    };
    let args: Vec<_> = call.arg_list().map(|l| l.args().collect()).unwrap_or_default();
    assert_eq!(args.len(), 1);
    let tb = call
        .syntax()
        .descendants()
        .find_map(tbind_parser::ast::TempBindingExpr::cast)
        .expect("temp binding");
    assert_eq!(tb.step_list().map(|s| s.exprs().count()), Some(3));
}

#[test]
fn parenthesized_expression_form_ends_at_paren() {
    assert_snapshot!(outline("g((let(t) = 1, t), 2);"), @r"
    SOURCE_FILE
      EXPR_STMT
        CALL_EXPR
          NAME_REF
          ARG_LIST
            PAREN_EXPR
              TEMP_BINDING_EXPR
                BINDING_MARKER
                STEP_LIST
                  LITERAL
                  NAME_REF
            LITERAL
    ");
}

#[test]
fn nested_constructs() {
    assert_snapshot!(outline("const($) y = 1, let($) = $ + 1, $ * 2;"), @r"
    SOURCE_FILE
      TEMP_BINDING_DECL
        BINDING_MARKER
        STEP_LIST
          LITERAL
          TEMP_BINDING_EXPR
            BINDING_MARKER
            STEP_LIST
              BINARY_EXPR
                NAME_REF
                LITERAL
              BINARY_EXPR
                NAME_REF
                LITERAL
    ");
}

#[test]
fn malformed_markers_still_parse() {
    for source in ["const() x = 1;", "const($ $) x = 1;", "let(1) = 2, 3;", "var(a b) = 1"] {
        assert!(parse(source).ok(), "{source}: {:?}", error_messages(source));
    }
}

#[test]
fn marker_tokens_are_exposed() {
    let parse = parse("let($ , x) = 1;");
    let tb = parse
        .syntax()
        .descendants()
        .find_map(tbind_parser::ast::TempBindingExpr::cast)
        .expect("temp binding");
    let marker = tb.marker().expect("marker");
    assert!(marker.is_closed());
    let inner: Vec<_> = marker.inner_tokens().iter().map(|t| t.text().to_string()).collect();
    assert_eq!(inner, vec!["$", ",", "x"]);
}

#[test]
fn unclosed_marker_stops_at_eq() {
    let parse = parse("let($ = 1, 2;");
    assert!(parse.ok());
    let tb = parse
        .syntax()
        .descendants()
        .find_map(tbind_parser::ast::TempBindingExpr::cast)
        .expect("temp binding");
    let marker = tb.marker().expect("marker");
    assert!(!marker.is_closed());
    assert!(tb.eq_token().is_some());
    assert_eq!(tb.step_list().map(|s| s.exprs().count()), Some(2));
}

#[test]
fn declaration_without_eq_has_no_step_list() {
    let parse = parse("const($) x;");
    assert!(parse.ok());
    let Some(Stmt::TempBindingDecl(decl)) = parse.tree().stmts().next() else {
        panic!("expected temp binding declaration");
    };
    assert_eq!(decl.name().map(|t| t.text().to_string()), Some("x".to_string()));
    assert!(decl.eq_token().is_none());
    assert!(decl.step_list().is_none());
}

#[test]
fn empty_step_slots_are_kept_for_the_engine() {
    let parse = parse("let(a) = 1, , a;");
    assert!(parse.ok());
    let step_list = parse
        .syntax()
        .descendants()
        .find(|n| n.kind() == SyntaxKind::STEP_LIST)
        .expect("step list");
    let commas = step_list
        .children_with_tokens()
        .filter(|t| t.kind() == SyntaxKind::COMMA)
        .count();
    assert_eq!(commas, 2);
}

#[test]
fn temp_binding_in_for_header_is_an_error() {
    assert_eq!(
        error_messages("for (let(i) = 0, i; ;) {}"),
        vec!["temporary binding is not allowed in a `for` header".to_string()]
    );
}

#[test]
fn temp_binding_in_for_body_is_fine() {
    assert!(parse("for (let i = 0; i < 3; i++) { let($) x = i, $ * 2; }").ok());
}

// ── Host grammar ─────────────────────────────────────────────────────────

#[test]
fn precedence_and_associativity() {
    assert_snapshot!(outline("a = b ?? c || d && e == f < g + h * i ** j ** k;"), @r"
    SOURCE_FILE
      EXPR_STMT
        ASSIGN_EXPR
          NAME_REF
          BINARY_EXPR
            NAME_REF
            BINARY_EXPR
              NAME_REF
              BINARY_EXPR
                NAME_REF
                BINARY_EXPR
                  NAME_REF
                  BINARY_EXPR
                    NAME_REF
                    BINARY_EXPR
                      NAME_REF
                      BINARY_EXPR
                        NAME_REF
                        BINARY_EXPR
                          NAME_REF
                          BINARY_EXPR
                            NAME_REF
                            NAME_REF
    ");
}

#[test]
fn arrow_functions() {
    assert_snapshot!(outline("xs.map(x => x * 2); f(async (a, b) => { await a; });"), @r"
    SOURCE_FILE
      EXPR_STMT
        CALL_EXPR
          FIELD_EXPR
            NAME_REF
          ARG_LIST
            ARROW_FN
              PARAM_LIST
                PARAM
              BINARY_EXPR
                NAME_REF
                LITERAL
      EXPR_STMT
        CALL_EXPR
          NAME_REF
          ARG_LIST
            ARROW_FN
              PARAM_LIST
                PARAM
                PARAM
              BLOCK
                EXPR_STMT
                  PREFIX_EXPR
                    NAME_REF
    ");
}

#[test]
fn objects_templates_and_optional_chains() {
    assert_snapshot!(outline("o = { a: 1, b, [k]: 2, ...r }; t = `x${o?.a}y`;"), @r"
    SOURCE_FILE
      EXPR_STMT
        ASSIGN_EXPR
          NAME_REF
          OBJECT_EXPR
            PROPERTY
              LITERAL
            SHORTHAND_PROPERTY
            PROPERTY
              COMPUTED_KEY
                NAME_REF
              LITERAL
            SPREAD
              NAME_REF
      EXPR_STMT
        ASSIGN_EXPR
          NAME_REF
          TEMPLATE_LITERAL
            INTERPOLATION
              FIELD_EXPR
                NAME_REF
    ");
}

#[test]
fn statements() {
    assert_snapshot!(outline("if (a) b(); else { while (c) break; } for (const x of xs) throw x;"), @r"
    SOURCE_FILE
      IF_STMT
        NAME_REF
        EXPR_STMT
          CALL_EXPR
            NAME_REF
            ARG_LIST
        ELSE_BRANCH
          BLOCK
            WHILE_STMT
              NAME_REF
              BREAK_STMT
      FOR_OF_STMT
        NAME_REF
        THROW_STMT
          NAME_REF
    ");
}

#[test]
fn new_and_calls() {
    assert_snapshot!(outline("new a.B(1).c();"), @r"
    SOURCE_FILE
      EXPR_STMT
        CALL_EXPR
          FIELD_EXPR
            NEW_EXPR
              FIELD_EXPR
                NAME_REF
              ARG_LIST
                LITERAL
          ARG_LIST
    ");
}

// ── Errors ───────────────────────────────────────────────────────────────

#[test]
fn recovery_continues_after_bad_statement() {
    let parse = parse("let = 1; let y = 2;");
    assert_eq!(parse.errors().len(), 1);
    assert_eq!(parse.errors()[0].message, "expected identifier");
    let decls = parse
        .tree()
        .stmts()
        .filter(|s| matches!(s, Stmt::VarDecl(_)))
        .count();
    assert_eq!(decls, 2);
}

#[test]
fn unclosed_paren_points_at_opener() {
    let parse = parse("f(1, 2;");
    let err = &parse.errors()[0];
    assert_eq!(err.message, "expected `)`");
    assert_eq!(err.related.as_ref().map(|(_, s)| (s.start, s.end)), Some((1, 2)));
}

#[test]
fn invalid_assignment_target() {
    assert_eq!(error_messages("1 = 2;"), vec!["invalid assignment target".to_string()]);
}

#[test]
fn lexer_errors_are_reported() {
    assert_eq!(error_messages("a = 'x"), vec!["unterminated string literal".to_string(), "expected expression".to_string()]);
}
