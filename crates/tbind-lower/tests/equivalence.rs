// Property tests: a lowered program prints exactly what the unlowered
// program and its hand-written expansion print, and runs each step once,
// in order.

use proptest::prelude::*;
use tbind_eval::{run, EvalConfig};
use tbind_lower::{lower_source, parse_program, LowerOptions, Target};

fn direct(source: &str) -> Vec<String> {
    let (program, diagnostics) = parse_program(source);
    assert!(diagnostics.is_empty(), "{source}: {diagnostics:?}");
    let outcome = run(&program, &EvalConfig::default());
    assert!(outcome.result.is_ok(), "{source}: {:?}", outcome.result);
    outcome.output
}

fn lowered(source: &str, target: Target) -> Vec<String> {
    let options = LowerOptions {
        target,
        ..LowerOptions::default()
    };
    let result = lower_source(source, &options);
    assert!(result.ok(), "{source}: {:?}", result.diagnostics);
    let outcome = run(&result.program, &EvalConfig::default());
    assert!(outcome.result.is_ok(), "{source}: {:?}", outcome.result);
    outcome.output
}

fn operand() -> impl Strategy<Value = String> {
    prop_oneof![Just("$".to_string()), (0u32..20).prop_map(|n| n.to_string())]
}

/// A step reading the binding: `$ + 3`, `7 * $`, `$ - $`, ...
fn step() -> impl Strategy<Value = String> {
    (operand(), prop::sample::select(vec!["+", "-", "*", "%"]), operand())
        .prop_map(|(a, op, b)| format!("{a} {op} {b}"))
}

fn pipeline() -> impl Strategy<Value = (u32, Vec<String>)> {
    (0u32..100, prop::collection::vec(step(), 0..6))
}

/// The steps spelled out with an ordinary variable `t`.
fn manual_expansion(first: u32, rest: &[String]) -> String {
    let mut out = format!("let t = {first};\n");
    for step in rest {
        out.push_str(&format!("t = {};\n", step.replace('$', "t")));
    }
    out
}

fn steps_text(first: u32, rest: &[String]) -> String {
    std::iter::once(first.to_string())
        .chain(rest.iter().cloned())
        .collect::<Vec<_>>()
        .join(", ")
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(48))]

    #[test]
    fn declaration_form_matches_manual_expansion((first, rest) in pipeline()) {
        let source = format!("const($) x = {};\nconsole.log(x);", steps_text(first, &rest));
        let manual = format!("{}const x = t;\nconsole.log(x);", manual_expansion(first, &rest));

        let expected = direct(&manual);
        prop_assert_eq!(&direct(&source), &expected);
        prop_assert_eq!(&lowered(&source, Target::Es2015), &expected);
        prop_assert_eq!(&lowered(&source, Target::Es5), &expected);
    }

    #[test]
    fn expression_form_matches_manual_expansion((first, rest) in pipeline()) {
        let source = format!("console.log(let($) = {});", steps_text(first, &rest));
        let manual = format!("{}console.log(t);", manual_expansion(first, &rest));

        let expected = direct(&manual);
        prop_assert_eq!(&direct(&source), &expected);
        prop_assert_eq!(&lowered(&source, Target::Es2015), &expected);
        prop_assert_eq!(&lowered(&source, Target::Es5), &expected);
    }

    #[test]
    fn value_survives_as_a_subexpression((first, rest) in pipeline(), k in 1u32..10) {
        let source = format!("console.log({k} * (let($) = {}) - 1);", steps_text(first, &rest));
        let manual = format!("{}console.log({k} * t - 1);", manual_expansion(first, &rest));
        prop_assert_eq!(&lowered(&source, Target::Es2015), &direct(&manual));
    }

    #[test]
    fn every_step_runs_once_in_order(n in 1usize..8) {
        let steps: Vec<String> = (0..n)
            .map(|i| if i == 0 { "tick(0)".to_string() } else { format!("tick({i}) + v") })
            .collect();
        let source = format!(
            "const calls = [];\nfunction tick(i) {{ calls.push(i); return 1; }}\n\
             const(v) r = {};\nconsole.log(r, calls.join(' '));",
            steps.join(", "),
        );
        let order: Vec<String> = (0..n).map(|i| i.to_string()).collect();
        let expected = vec![format!("{n} {}", order.join(" "))];
        prop_assert_eq!(&direct(&source), &expected);
        prop_assert_eq!(&lowered(&source, Target::Es2015), &expected);
        prop_assert_eq!(&lowered(&source, Target::Es5), &expected);
    }
}
