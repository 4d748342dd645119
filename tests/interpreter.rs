use numen::{
    diagnostics::{ErrorKind, NumenError},
    interpreter::Interpreter,
    parser,
    stack::OperandStack,
    token::{Token, TypeLiteral},
};

fn eval(source: &str) -> Interpreter {
    let mut interpreter = Interpreter::new();
    interpreter
        .run_source(source)
        .expect("evaluation should succeed");
    interpreter
}

fn eval_stack(source: &str) -> Vec<Token> {
    eval(source).operands().to_vec()
}

fn eval_error(source: &str) -> NumenError {
    let mut interpreter = Interpreter::new();
    match interpreter.run_source(source) {
        Ok(()) => panic!("expected error for `{source}`"),
        Err(err) => err,
    }
}

fn error_kind(source: &str) -> ErrorKind {
    eval_error(source)
        .kind()
        .expect("expected a diagnostic error")
}

#[test]
fn literals_push_themselves() {
    let stack = eval_stack(r#"42 3.5 "hi" true int foo"#);
    assert_eq!(
        stack,
        vec![
            Token::Int(42),
            Token::Float(3.5),
            Token::Str("hi".into()),
            Token::Bool(true),
            Token::Type(TypeLiteral::Int),
            Token::Symbol("foo".into()),
        ]
    );
}

#[test]
fn adds_integers() {
    assert_eq!(eval_stack("2 3 +"), vec![Token::Int(5)]);
}

#[test]
fn arithmetic_promotes_mixed_operands_to_float() {
    assert_eq!(eval_stack("2 3.5 +"), vec![Token::Float(5.5)]);
    assert_eq!(eval_stack("1.5 2 *"), vec![Token::Float(3.0)]);
    assert_eq!(eval_stack("2 0.5 -"), vec![Token::Float(1.5)]);
}

#[test]
fn integer_arithmetic_stays_integral() {
    assert_eq!(eval_stack("5 2 -"), vec![Token::Int(3)]);
    assert_eq!(eval_stack("4 3 *"), vec![Token::Int(12)]);
    assert_eq!(eval_stack("7 2 /"), vec![Token::Int(3)]);
}

#[test]
fn division_with_float_operand_keeps_the_fraction() {
    assert_eq!(eval_stack("3.0 2 /"), vec![Token::Float(1.5)]);
}

#[test]
fn string_concatenation_puts_the_later_operand_in_front() {
    assert_eq!(
        eval_stack(r#""foo" "bar" +"#),
        vec![Token::Str("barfoo".into())]
    );
}

#[test]
fn division_by_zero_fails() {
    assert_eq!(error_kind("1 0 /"), ErrorKind::DivisionByZero);
    assert_eq!(error_kind("1.0 0.0 /"), ErrorKind::DivisionByZero);
}

#[test]
fn arithmetic_rejects_incompatible_tags() {
    assert_eq!(error_kind(r#"1 "x" +"#), ErrorKind::TypeError);
    assert_eq!(error_kind("true false -"), ErrorKind::TypeError);
}

#[test]
fn integer_literals_recognise_base_prefixes() {
    assert_eq!(
        eval_stack("0x2A 0o17 0b101"),
        vec![Token::Int(42), Token::Int(15), Token::Int(5)]
    );
}

#[test]
fn unparseable_numerals_are_skipped() {
    assert!(eval_stack("1.2.3").is_empty());
    assert!(eval_stack("99999999999999999999").is_empty());
}

#[test]
fn type_literals_match_case_insensitively() {
    assert_eq!(
        eval_stack("INT Float sTr ANY"),
        vec![
            Token::Type(TypeLiteral::Int),
            Token::Type(TypeLiteral::Float),
            Token::Type(TypeLiteral::Str),
            Token::Type(TypeLiteral::Any),
        ]
    );
}

#[test]
fn comparisons_evaluate_in_push_order() {
    assert_eq!(eval_stack("2 3 <"), vec![Token::Bool(true)]);
    assert_eq!(eval_stack("2 3 >"), vec![Token::Bool(false)]);
    assert_eq!(eval_stack("2 2 <="), vec![Token::Bool(true)]);
    assert_eq!(eval_stack("2 2.5 <"), vec![Token::Bool(true)]);
    assert_eq!(eval_stack("3 3 >="), vec![Token::Bool(true)]);
}

#[test]
fn equality_compares_payloads_and_mixed_numerics() {
    assert_eq!(eval_stack("1 1 =="), vec![Token::Bool(true)]);
    assert_eq!(eval_stack("1 1.0 =="), vec![Token::Bool(true)]);
    assert_eq!(eval_stack("1 2 !="), vec![Token::Bool(true)]);
    assert_eq!(eval_stack(r#""a" "a" =="#), vec![Token::Bool(true)]);
    assert_eq!(eval_stack("true true =="), vec![Token::Bool(true)]);
}

#[test]
fn equality_across_tags_is_false() {
    assert_eq!(eval_stack(r#""a" 1 =="#), vec![Token::Bool(false)]);
    assert_eq!(eval_stack(r#"1 "1" !="#), vec![Token::Bool(true)]);
}

#[test]
fn equality_on_blocks_fails() {
    assert_eq!(error_kind("{ } { } =="), ErrorKind::TypeError);
}

#[test]
fn comparison_rejects_non_numeric_operands() {
    assert_eq!(error_kind(r#""a" "b" <"#), ErrorKind::TypeError);
}

#[test]
fn stack_shufflers_have_documented_effects() {
    assert_eq!(eval_stack("1 dup"), vec![Token::Int(1), Token::Int(1)]);
    assert_eq!(eval_stack("1 2 drop"), vec![Token::Int(1)]);
    assert_eq!(eval_stack("1 2 swap"), vec![Token::Int(2), Token::Int(1)]);
    assert_eq!(
        eval_stack("1 2 over"),
        vec![Token::Int(1), Token::Int(2), Token::Int(1)]
    );
    assert_eq!(
        eval_stack("1 2 3 rot"),
        vec![Token::Int(2), Token::Int(3), Token::Int(1)]
    );
}

#[test]
fn push_appends_to_a_stack_value() {
    assert_eq!(
        eval_stack("3 ( 1 2 ) push"),
        vec![Token::Stack(vec![
            Token::Int(1),
            Token::Int(2),
            Token::Int(3)
        ])]
    );
}

#[test]
fn pop_splits_a_stack_value() {
    assert_eq!(
        eval_stack("( 1 2 3 ) pop"),
        vec![
            Token::Stack(vec![Token::Int(1), Token::Int(2)]),
            Token::Int(3)
        ]
    );
}

#[test]
fn pop_on_an_empty_stack_value_fails() {
    assert_eq!(error_kind("( ) pop"), ErrorKind::StackUnderflow);
}

#[test]
fn store_then_load_round_trips_through_scope() {
    let interpreter = eval("42 x store x load");
    assert_eq!(interpreter.operands(), &[Token::Int(42)]);
    assert_eq!(interpreter.global("x"), Some(&Token::Int(42)));
}

#[test]
fn load_of_an_unbound_name_fails() {
    assert_eq!(error_kind("x load"), ErrorKind::NotFound);
}

#[test]
fn storeto_builds_a_record() {
    let stack = eval_stack("5 k [] storeto");
    assert_eq!(stack.len(), 1);
    let entries = stack[0].expect_memory().expect("storeto should push a Memory");
    assert_eq!(entries.len(), 1);
    assert_eq!(entries.get("k"), Some(&Token::Int(5)));
}

#[test]
fn loadfrom_reads_a_record_key() {
    assert_eq!(
        eval_stack("5 k [] storeto m store k m loadfrom"),
        vec![Token::Int(5)]
    );
}

#[test]
fn loadfrom_missing_key_fails() {
    assert_eq!(
        error_kind("5 k [] storeto m store q m loadfrom"),
        ErrorKind::NotFound
    );
}

#[test]
fn storeto_leaves_the_source_record_unchanged() {
    let interpreter = eval(
        r#"
        5 k [] storeto m store
        6 k m storeto m2 store
        k m loadfrom
        "#,
    );
    assert_eq!(interpreter.operands(), &[Token::Int(5)]);
    match interpreter.global("m2") {
        Some(Token::Memory(entries)) => {
            assert_eq!(entries.get("k"), Some(&Token::Int(6)));
        }
        other => panic!("expected m2 to be a Memory, found {other:?}"),
    }
}

#[test]
fn record_operations_resolve_symbols_through_scope() {
    assert_eq!(error_kind("1 k m storeto"), ErrorKind::NotFound);
    assert_eq!(error_kind("1 x store 2 k x storeto"), ErrorKind::TypeError);
}

#[test]
fn run_executes_a_block_in_place() {
    assert_eq!(eval_stack("{ 1 2 + } run"), vec![Token::Int(3)]);
    assert_eq!(eval_stack("{ { 7 } run } run"), vec![Token::Int(7)]);
}

#[test]
fn runfrom_consults_the_record_before_globals() {
    let interpreter = eval("1 v store 9 v [] storeto { v } runfrom");
    assert_eq!(interpreter.operands(), &[Token::Int(9)]);
    assert_eq!(interpreter.global("v"), Some(&Token::Int(1)));
}

#[test]
fn call_runs_the_code_entry() {
    assert_eq!(
        eval_stack("{ 40 2 + } code [] storeto call"),
        vec![Token::Int(42)]
    );
}

#[test]
fn call_resolves_a_named_record() {
    assert_eq!(
        eval_stack("{ 9 } code [] storeto f store f call"),
        vec![Token::Int(9)]
    );
}

#[test]
fn call_without_code_entry_fails() {
    assert_eq!(error_kind("[] call"), ErrorKind::NotFound);
}

#[test]
fn call_rejects_a_non_block_code_entry() {
    assert_eq!(error_kind("1 code [] storeto call"), ErrorKind::TypeError);
}

#[test]
fn if_runs_the_block_only_on_true() {
    assert_eq!(
        eval_stack("true { 1 } if false { 2 } if"),
        vec![Token::Int(1)]
    );
}

#[test]
fn if_requires_a_boolean_condition() {
    assert_eq!(error_kind("1 { 2 } if"), ErrorKind::TypeError);
}

#[test]
fn break_terminates_the_loop_after_one_iteration() {
    assert_eq!(eval_stack("{ 1 break } loop"), vec![Token::Int(1)]);
}

#[test]
fn break_outside_a_loop_fails() {
    assert_eq!(error_kind("break"), ErrorKind::BreakOutsideLoop);
}

#[test]
fn counting_loop_terminates_on_its_flag() {
    let interpreter = eval(
        "0 n store { n load dup dbgprint 5 == { break } if n load 1 + n store } loop",
    );
    assert_eq!(
        interpreter.operands(),
        &[
            Token::Int(0),
            Token::Int(1),
            Token::Int(2),
            Token::Int(3),
            Token::Int(4),
            Token::Int(5),
        ]
    );
    assert_eq!(interpreter.global("n"), Some(&Token::Int(5)));
}

#[test]
fn break_targets_the_innermost_loop() {
    let interpreter = eval(
        r#"
        0 i store
        { i load 1 + i store { break } loop i load 3 == { break } if } loop
        "#,
    );
    assert!(interpreter.operands().is_empty());
    assert_eq!(interpreter.global("i"), Some(&Token::Int(3)));
}

#[test]
fn len_reports_size_and_keeps_the_value() {
    assert_eq!(
        eval_stack(r#""abc" len"#),
        vec![Token::Str("abc".into()), Token::Int(3)]
    );
    assert_eq!(
        eval_stack(r#""é" len"#),
        vec![Token::Str("é".into()), Token::Int(2)]
    );
    assert_eq!(
        eval_stack("( 1 2 ) len"),
        vec![
            Token::Stack(vec![Token::Int(1), Token::Int(2)]),
            Token::Int(2)
        ]
    );
    assert_eq!(
        eval_stack("[] len"),
        vec![Token::Memory(Default::default()), Token::Int(0)]
    );
}

#[test]
fn len_rejects_unsized_values() {
    assert_eq!(error_kind("1 len"), ErrorKind::TypeError);
}

#[test]
fn dbgprint_on_an_empty_stack_fails() {
    assert_eq!(error_kind("dbgprint"), ErrorKind::StackUnderflow);
}

#[test]
fn comments_are_discarded() {
    assert_eq!(
        eval_stack("1 // two three\n4"),
        vec![Token::Int(1), Token::Int(4)]
    );
    assert_eq!(
        eval_stack("1 /* 2 3 */ 4"),
        vec![Token::Int(1), Token::Int(4)]
    );
    assert_eq!(
        eval_stack("1 /* * ** */ 2"),
        vec![Token::Int(1), Token::Int(2)]
    );
}

#[test]
fn lone_slash_still_divides() {
    assert_eq!(eval_stack("8 2 / // halved\n"), vec![Token::Int(4)]);
}

#[test]
fn string_escapes_decode() {
    assert_eq!(
        eval_stack(r#""a\nb\tc\"d\\e""#),
        vec![Token::Str("a\nb\tc\"d\\e".into())]
    );
}

#[test]
fn unknown_string_escapes_are_dropped() {
    assert_eq!(eval_stack(r#""x\qy""#), vec![Token::Str("xy".into())]);
}

#[test]
fn blocks_capture_nested_braces_verbatim() {
    assert_eq!(
        eval_stack("{ a { b } c }"),
        vec![Token::Block("a { b } c".into())]
    );
}

#[test]
fn blocks_trim_surrounding_whitespace() {
    assert_eq!(eval_stack("{   1 2   }"), vec![Token::Block("1 2".into())]);
}

#[test]
fn stacks_parse_their_contents_eagerly() {
    assert_eq!(
        eval_stack(r#"( 1 ( 2 3 ) "s" )"#),
        vec![Token::Stack(vec![
            Token::Int(1),
            Token::Stack(vec![Token::Int(2), Token::Int(3)]),
            Token::Str("s".into()),
        ])]
    );
}

#[test]
fn memory_literals_must_be_empty() {
    assert_eq!(eval_stack("[ ]"), vec![Token::Memory(Default::default())]);
    assert_eq!(error_kind("[ 1 ]"), ErrorKind::Parse);
}

#[test]
fn unclosed_constructs_are_parse_errors() {
    for source in ["{ 1", "( 1", r#""abc"#, "[ ", "/* x"] {
        let err = eval_error(source);
        assert_eq!(err.kind(), Some(ErrorKind::Parse), "{source}");
        let message = format!("{err}");
        assert!(message.contains("never closed"), "{message}");
    }
}

#[test]
fn canonical_serialisation_round_trips() {
    let source = r#"42 -7 3.5 true false "a\nb" foo int any ( 1 2 ) { x y }"#;
    let first = parser::parse_collect(source).expect("parse");
    let canonical: Vec<String> = first.iter().map(Token::to_source).collect();
    let second = parser::parse_collect(&canonical.join(" ")).expect("reparse");
    assert_eq!(first, second);
}

#[test]
fn typed_pops_name_the_caller_and_observed_tag() {
    let mut stack = OperandStack::new();
    stack.push(Token::Str("s".into()));
    let err = stack.pop_int("+").expect_err("tag mismatch");
    let message = format!("{err}");
    assert!(message.contains("`+` expected Integer, found String"), "{message}");

    let mut empty = OperandStack::new();
    let err = empty.pop_any("dup").expect_err("underflow");
    assert_eq!(err.kind(), Some(ErrorKind::StackUnderflow));
}

#[test]
fn push_front_inserts_below_everything_else() {
    let mut stack = OperandStack::new();
    stack.push(Token::Int(1));
    stack.push_front(Token::Int(2));
    assert_eq!(stack.as_slice(), &[Token::Int(2), Token::Int(1)]);
}
