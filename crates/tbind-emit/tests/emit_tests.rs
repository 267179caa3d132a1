//! Emitter integration tests: source is parsed and lowered by the engine,
//! then printed.

use insta::assert_snapshot;
use tbind_emit::{emit, EmitConfig};
use tbind_lower::{lower_source, LowerOptions, RejectPolicy, Target};

fn lowered(source: &str) -> String {
    lowered_with(source, &LowerOptions::default())
}

fn lowered_with(source: &str, options: &LowerOptions) -> String {
    let result = lower_source(source, options);
    assert!(result.parse_errors.is_empty(), "{:?}", result.parse_errors);
    emit(&result.program, &EmitConfig::default()).code
}

// ── Canonical layout ─────────────────────────────────────────────────────

#[test]
fn parentheses_follow_precedence() {
    let source = "\
let a = (1 + 2) * 3;
let b = 2 ** 3 ** 2;
let c = (-2) ** 2;
({ a: 1 }).a;
(function () {})();
let d = x ?? (y || z);
let f = (p, q) => ({ p, q });
";
    assert_snapshot!(lowered(source), @r"
    let a = (1 + 2) * 3;
    let b = 2 ** 3 ** 2;
    let c = (-2) ** 2;
    ({ a: 1 }.a);
    (function () {})();
    let d = x ?? (y || z);
    let f = (p, q) => ({ p, q });
    ");
}

#[test]
fn control_flow_layout() {
    let source = "if (a > 1) b = 2; else { c = 3; }\nfor (let i = 0; i < 3; i++) log(`i=${i}`);";
    assert_snapshot!(lowered(source), @r"
    if (a > 1)
      b = 2;
    else {
      c = 3;
    }
    for (let i = 0; i < 3; i++)
      log(`i=${i}`);
    ");
}

#[test]
fn long_argument_lists_break() {
    let source = "call(firstArgumentName, secondArgumentName, thirdArgumentName, fourthArgumentName);";
    assert_snapshot!(lowered(source), @r"
    call(
      firstArgumentName,
      secondArgumentName,
      thirdArgumentName,
      fourthArgumentName,
    );
    ");
}

// ── Lowered constructs ───────────────────────────────────────────────────

#[test]
fn declaration_form() {
    assert_snapshot!(lowered("const($) x = 10, $ + 2, $ * 2;"), @r"
    let __tb1 = 10;
    const x = (__tb1 = __tb1 + 2, __tb1 = __tb1 * 2);
    ");
}

#[test]
fn expression_form_in_return() {
    let source = "function last(getArray) { return let(a) = getArray(), a[a.length - 1]; }";
    assert_snapshot!(lowered(source), @r"
    function last(getArray) {
      return (() => {
        let __tb1 = getArray();
        return __tb1 = __tb1[__tb1.length - 1];
      })();
    }
    ");
}

#[test]
fn nested_construct_is_lowered_inside_outer() {
    let source = "const($) x = 1, (let($) = $ + 1, $ * 10), $ + 5;";
    assert_snapshot!(lowered(source), @r"
    let __tb1 = 1;
    const x = (__tb1 = (() => {
      let __tb2 = __tb1 + 1;
      return __tb2 = __tb2 * 10;
    })(), __tb1 = __tb1 + 5);
    ");
}

#[test]
fn es5_target() {
    let options = LowerOptions {
        target: Target::Es5,
        ..LowerOptions::default()
    };
    let source = "var($) y = 2, $ * 3;\nlog(var(t) = 5, t + 1);";
    assert_snapshot!(lowered_with(source, &options), @r"
    var __tb1 = 2;
    var y = __tb1 = __tb1 * 3;
    log((function () {
      var __tb2 = 5;
      return __tb2 = __tb2 + 1;
    }).call(this));
    ");
}

#[test]
fn es5_result_declarations_use_var() {
    let options = LowerOptions {
        target: Target::Es5,
        ..LowerOptions::default()
    };
    let source = "const($) x = 10, $ + 2;\nlet(n) m = 1, n * 2;";
    assert_snapshot!(lowered_with(source, &options), @r"
    var __tb1 = 10;
    var x = __tb1 = __tb1 + 2;
    var __tb2 = 1;
    var m = __tb2 = __tb2 * 2;
    ");
}

#[test]
fn rejected_construct_is_dropped_or_kept() {
    let source = "let x = 1;\nconst(1) y = 2;\nlet z = 3;";
    assert_snapshot!(lowered(source), @r"
    let x = 1;
    let z = 3;
    ");

    let keep = LowerOptions {
        on_reject: RejectPolicy::Keep,
        ..LowerOptions::default()
    };
    assert_snapshot!(lowered_with(source, &keep), @r"
    let x = 1;
    const(1) y = 2;
    let z = 3;
    ");
}

#[test]
fn rejected_expression_becomes_void() {
    assert_snapshot!(lowered("f((let() = 1, 2));"), @"f(void 0);");
}

// ── Span map ─────────────────────────────────────────────────────────────

#[test]
fn mapping_covers_the_replacement() {
    let source = "const($) x = 1, $ + 1;";
    let result = lower_source(source, &LowerOptions::default());
    let emitted = emit(&result.program, &EmitConfig::default());
    assert_eq!(emitted.mappings.len(), 1);
    let mapping = emitted.mappings[0];
    assert_eq!(mapping.original.range(), 0..source.len());
    assert_eq!(
        &emitted.code[mapping.generated.range()],
        "let __tb1 = 1;\nconst x = __tb1 = __tb1 + 1;"
    );
}

#[test]
fn innermost_mapping_wins() {
    let source = "const($) x = 1, (let($) = $ + 1, $ * 10);";
    let result = lower_source(source, &LowerOptions::default());
    let emitted = emit(&result.program, &EmitConfig::default());
    assert_eq!(emitted.mappings.len(), 2);

    let inner_at = emitted.code.find("let __tb2").expect("inner binding emitted") as u32;
    let mapping = emitted.mapping_at(inner_at).expect("mapped");
    assert_eq!(mapping.construct.0, 1);
    assert_eq!(&source[mapping.original.range()], "let($) = $ + 1, $ * 10");

    let outer = emitted.mapping_at(0).expect("mapped");
    assert_eq!(outer.construct.0, 0);
}

// ── Idempotence ──────────────────────────────────────────────────────────

#[test]
fn emitted_code_is_a_fixed_point() {
    let sources = [
        "const($) x = 10, $ + 2, $ * 2;",
        "function f(a) { return let(a) = a * 2, a + 1; }",
        "let o = { k: let($) = 1, $ + 1 };",
        "if (c) var($) v = 1, $; else v = 0;",
    ];
    for source in sources {
        let once = lowered(source);
        let twice = lowered(&once);
        assert_eq!(once, twice, "not a fixed point for {source:?}");
    }
}
