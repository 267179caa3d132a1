//! Interpreter tests. Programs are built by the lowering engine; where a
//! program holds temporary bindings it is run both unlowered and lowered,
//! and the two must print the same thing.

use insta::assert_snapshot;
use tbind_eval::{run, EvalConfig, EvalError, Outcome};
use tbind_hir::ConstructId;
use tbind_lower::{lower_source, parse_program, LowerOptions, RejectPolicy, Target};

fn direct(source: &str) -> Outcome {
    let (program, diagnostics) = parse_program(source);
    assert!(
        !diagnostics.iter().any(|d| d.is_error()),
        "{diagnostics:?}"
    );
    run(&program, &EvalConfig::default())
}

fn lowered_with(source: &str, options: &LowerOptions) -> Outcome {
    let result = lower_source(source, options);
    assert!(result.ok(), "{:?}", result.diagnostics);
    run(&result.program, &EvalConfig::default())
}

/// Output of `source`, checked to agree lowered (both targets) and not.
fn output(source: &str) -> String {
    let reference = direct(source);
    assert!(reference.result.is_ok(), "{:?}", reference.result);
    for target in [Target::Es2015, Target::Es5] {
        let options = LowerOptions {
            target,
            ..LowerOptions::default()
        };
        let lowered = lowered_with(source, &options);
        assert!(lowered.result.is_ok(), "{target:?}: {:?}", lowered.result);
        assert_eq!(lowered.output, reference.output, "{target:?}");
    }
    reference.output.join("\n")
}

// ── Host subset ──────────────────────────────────────────────────────────

#[test]
fn console_log_formats_like_node() {
    let source = r#"console.log(1 + 2, "a", [1, "b"], { k: true, n: null }, 0.1 * 3);"#;
    assert_snapshot!(output(source), @"3 a [ 1, 'b' ] { k: true, n: null } 0.30000000000000004");
}

#[test]
fn let_loop_variables_are_per_iteration() {
    let source = "\
const fs = [];
for (let i = 0; i < 3; i++) fs.push(() => i);
var gs = [];
for (var j = 0; j < 3; j++) gs.push(() => j);
console.log(fs.map(f => f()).join(','), gs.map(g => g()).join(','));
";
    assert_snapshot!(output(source), @"0,1,2 3,3,3");
}

#[test]
fn declarations_are_hoisted() {
    let source = r#"console.log(f(), v); var v = 1; function f() { return "hoisted"; }"#;
    assert_snapshot!(output(source), @"hoisted undefined");
}

#[test]
fn constructors_and_methods() {
    let source = "\
function Point(x, y) { this.x = x; this.y = y; }
const p = new Point(1, 2);
console.log(p instanceof Point, p.x + p.y, typeof p, typeof missing);
const e = new Error('boom');
console.log(e instanceof Error, e.message);
";
    assert_snapshot!(output(source), @r"
    true 3 object undefined
    true boom
    ");
}

#[test]
fn strings_and_templates() {
    let source = r#"
const name = "tb";
console.log(`hi ${name.toUpperCase()}!`, 'a-b-c'.split('-').length, "x\ty".length);
"#;
    assert_snapshot!(output(source), @"hi TB! 3 3");
}

#[test]
fn rest_spread_and_optional_chaining() {
    let source = "\
function sum(...xs) { return xs.reduce((a, b) => a + b, 0); }
const xs = [1, 2, 3];
const o = { ...{ a: 1 }, b: 2, ['c' + 1]: 3 };
console.log(sum(...xs, 4), Object.keys(o).join(''), o?.missing?.deep, o.nope?.());
";
    assert_snapshot!(output(source), @"10 abc1 undefined undefined");
}

#[test]
fn async_functions_settle_synchronously() {
    let source = "\
async function twice(n) { return n * 2; }
async function main() { const r = await twice(21); console.log(r); }
console.log(main());
";
    assert_snapshot!(output(source), @r"
    42
    Promise { undefined }
    ");
}

#[test]
fn functions_stringify_to_their_inspect_form() {
    let source = "function f() {}\nconsole.log('a' + f, `${() => 1}`, String(Math.max));";
    assert_snapshot!(output(source), @"a[Function: f] [Function (anonymous)] [Function: max]");
}

// ── Temporary bindings ───────────────────────────────────────────────────

#[test]
fn declaration_form_threads_the_binding() {
    let source = "const($) x = 10, $ + 2, $ * 2;\nconsole.log(x);";
    assert_snapshot!(output(source), @"24");
}

#[test]
fn steps_run_once_in_order() {
    let source = "\
const calls = [];
function step(n) { calls.push(n); return n; }
const($) r = step(1), step($ + 1), step($ + 1);
console.log(r, calls.join(' '));
";
    assert_snapshot!(output(source), @"3 1 2 3");
}

#[test]
fn last_item_reads_the_array_once() {
    let source = "\
let count = 0;
function getArray() { count++; return [3, 1, 4]; }
const(a) lastItem = getArray(), a[a.length - 1];
console.log(lastItem, count);
";
    assert_snapshot!(output(source), @"4 1");
}

#[test]
fn top_rank_in_expression_position() {
    let source = "\
const items = [{ score: 5, name: 'e' }, { score: 2, name: 'b' }, { score: 9, name: 'z' }, { score: 1, name: 'a' }];
function calc() { return 6; }
function cmp(p, q) { return p.score - q.score; }
const _ = 'outer';
const best = (let(_) = calc(), items.filter(x => x.score < _), _.sort(cmp), _[0]).name;
console.log(best, _);
";
    assert_snapshot!(output(source), @"a outer");
}

#[test]
fn this_is_preserved_in_expression_form() {
    let source = "\
function Counter() {
  this.n = 1;
  this.next = function () { return var($) = this.n, $ + 1; };
}
console.log(new Counter().next());
";
    assert_snapshot!(output(source), @"2");
}

#[test]
fn await_inside_steps() {
    let source = "\
async function g() { return 20; }
async function main() { const r = let($) = await g(), $ + 1; console.log(r); }
main();
";
    assert_snapshot!(output(source), @"21");
}

#[test]
fn closures_see_the_final_binding_value() {
    let source = "\
let later;
const r = let($) = 1, (later = () => $, $ + 1), $ * 10;
console.log(r, later());
";
    assert_snapshot!(output(source), @"20 20");
}

// ── Faults ───────────────────────────────────────────────────────────────

#[test]
fn runaway_loops_hit_the_step_limit() {
    let (program, _) = parse_program("while (true) {}");
    let config = EvalConfig {
        max_steps: 1_000,
        ..EvalConfig::default()
    };
    assert!(matches!(run(&program, &config).result, Err(EvalError::StepLimit)));
}

#[test]
fn unbounded_recursion_overflows() {
    let outcome = direct("function f() { return f(); }\nf();");
    assert!(matches!(outcome.result, Err(EvalError::StackOverflow)));
}

#[test]
fn const_bindings_and_unbound_names() {
    let outcome = direct("const a = 1;\na = 2;");
    assert_snapshot!(outcome.result.unwrap_err().to_string(), @"TypeError: assignment to constant variable `a`");
    let outcome = direct("console.log('before');\nnope;");
    assert_eq!(outcome.output, ["before"]);
    assert_snapshot!(outcome.result.unwrap_err().to_string(), @"ReferenceError: nope is not defined");
}

#[test]
fn uncaught_throw_stops_the_run() {
    let outcome = direct("console.log(1);\nthrow 'bad';\nconsole.log(2);");
    assert_eq!(outcome.stdout(), "1\n");
    assert!(matches!(outcome.result, Err(EvalError::Thrown(_))));
}

#[test]
fn kept_rejected_constructs_fault_when_reached() {
    let source = "console.log('a');\nconst(1) y = 2;\nconsole.log('b');";
    let dropped = lower_source(source, &LowerOptions::default());
    let outcome = run(&dropped.program, &EvalConfig::default());
    assert!(outcome.result.is_ok());
    assert_eq!(outcome.output, ["a", "b"]);

    let keep = LowerOptions {
        on_reject: RejectPolicy::Keep,
        ..LowerOptions::default()
    };
    let kept = lower_source(source, &keep);
    let outcome = run(&kept.program, &EvalConfig::default());
    assert_eq!(outcome.output, ["a"]);
    assert!(matches!(
        outcome.result,
        Err(EvalError::Rejected(ConstructId(0)))
    ));
}
