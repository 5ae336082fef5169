// tests/combinator_tests.rs

use kireji::text::{line_begin, literal, newline, pattern};
use kireji::{
    choice, cond, failure, not, peek, sep, seq, seq_select, success, ParseResult, ParseState,
    StateValue,
};

// ---
// Sequencing
// ---

#[test]
fn test_sequence_consumption_is_associative() {
    // seq([a, b, c]) consumes exactly as much as seq([seq([a, b]), c]).
    let flat = seq(vec![literal("ab"), literal("cd"), literal("ef")]);
    let nested = seq(vec![
        seq(vec![literal("ab"), literal("cd")]).text(),
        literal("ef"),
    ]);
    let inputs = ["abcdef", "abcdefgh"];
    for input in inputs {
        let mut state = ParseState::new();
        let flat_index = flat.exec(input, 0, &mut state).index();
        let nested_index = nested.exec(input, 0, &mut state).index();
        assert_eq!(flat_index, nested_index, "input: {input}");
        assert_eq!(flat_index, 6, "input: {input}");
    }
}

#[test]
fn test_sequence_fails_with_first_child_failure() {
    let parser = seq(vec![literal("ab"), literal("cd"), literal("ef")]);
    let cases = [("xx", 0), ("abxx", 2), ("abcdxx", 4)];
    for (input, expected_index) in cases {
        let mut state = ParseState::new();
        assert_eq!(
            parser.exec(input, 0, &mut state),
            failure(expected_index),
            "input: {input}"
        );
    }
}

#[test]
fn test_sequence_selector_keeps_one_element() {
    let parser = seq_select(vec![literal("<"), pattern("[a-z]+"), literal(">")], 1);
    assert_eq!(parser.parse("<div>"), success(5, "div".to_string()));
}

// ---
// Ordered choice
// ---

#[test]
fn test_choice_commits_to_the_first_match() {
    // Both alternatives match the same prefix; the first one always wins,
    // even though the second would match more input.
    let parser = choice(vec![literal("ab"), literal("abcd")]);
    assert_eq!(
        parser.exec("abcd", 0, &mut ParseState::new()),
        success(2, "ab".to_string())
    );
}

#[test]
fn test_choice_failure_reports_the_original_position() {
    // Sub-failures reach index 3, but the documented behavior is to report
    // the position where the choice began.
    let parser = choice(vec![
        seq(vec![literal("abc"), literal("x")]),
        seq(vec![literal("abc"), literal("y")]),
    ]);
    assert_eq!(parser.exec("abczz", 0, &mut ParseState::new()), failure(0));
    assert_eq!(parser.exec("bczz", 1, &mut ParseState::new()), failure(1));
}

// ---
// Repetition
// ---

#[test]
fn test_repetition_minimum_bound() {
    let parser = literal("a").many(2);
    let cases: [(&str, ParseResult<Vec<String>>); 3] = [
        ("a", failure(1)),
        ("aa", success(2, vec!["a".to_string(); 2])),
        ("aaa", success(3, vec!["a".to_string(); 3])),
    ];
    for (input, expected) in cases {
        let mut state = ParseState::new();
        assert_eq!(parser.exec(input, 0, &mut state), expected, "input: {input}");
    }
}

#[test]
fn test_repetition_terminator_is_not_consumed() {
    let item = pattern("[a-z]");
    let parser = item.many_until(1, &literal("."));
    assert_eq!(
        parser.exec("ab.cd", 0, &mut ParseState::new()),
        success(2, vec!["a".to_string(), "b".to_string()])
    );
}

#[test]
fn test_separated_items_require_the_minimum() {
    let parser = sep(&literal("abc"), &literal(","), 2);
    assert_eq!(
        parser.parse("abc,abc"),
        success(7, vec!["abc".to_string(), "abc".to_string()])
    );
    assert!(parser.parse("abc").is_failure());
}

// ---
// Lookahead and optionality
// ---

#[test]
fn test_lookahead_is_zero_width() {
    let parser = peek(&literal("a"));
    let result = parser.exec("a", 0, &mut ParseState::new());
    assert_eq!(result, success(0, "a".to_string()));
    assert_eq!(result.index(), 0);
}

#[test]
fn test_negative_lookahead_is_zero_width() {
    let parser = not(&literal("a"));
    let mut state = ParseState::new();
    assert_eq!(parser.exec("b", 0, &mut state), success(0, ()));
    assert_eq!(parser.exec("a", 0, &mut state), failure(0));
}

#[test]
fn test_option_yields_none_without_consuming() {
    let parser = literal("-").option().then(&pattern("[0-9]+"));
    let mut state = ParseState::new();
    assert_eq!(
        parser.exec("-5", 0, &mut state),
        success(2, (Some("-".to_string()), "5".to_string()))
    );
    assert_eq!(
        parser.exec("5", 0, &mut state),
        success(1, (None, "5".to_string()))
    );
}

// ---
// Span capture and transformation
// ---

#[test]
fn test_span_capture_round_trips_the_input() {
    let parser = seq(vec![literal("a"), literal("b")]).text();
    assert_eq!(parser.parse("ab"), success(2, "ab".to_string()));
}

#[test]
fn test_map_identity_is_observationally_equal() {
    let bare = pattern("[0-9]+");
    let mapped = bare.map(|v| v);
    let inputs = ["123", "12x", "x", ""];
    for input in inputs {
        let mut state = ParseState::new();
        assert_eq!(
            bare.exec(input, 0, &mut state),
            mapped.exec(input, 0, &mut state),
            "input: {input}"
        );
    }
}

// ---
// Scoped state
// ---

#[test]
fn test_scoped_state_restores_after_success_and_failure() {
    let reader = cond::<str>(|state| {
        state.get("k").and_then(StateValue::as_int) == Some(1)
    });
    let succeeding = literal("a").with_state("k", |_| StateValue::Int(2));
    let failing = literal("z").with_state("k", |_| StateValue::Int(2));

    // Whatever the scoped parser did, a sibling reading "k" sees the
    // pre-existing value.
    let after_success = succeeding.skip(&reader);
    let after_failure = failing.option().skip(&reader);
    let mut state = ParseState::new();
    state.set("k", 1i64);
    assert!(after_success.exec("a", 0, &mut state.clone()).is_success());
    assert!(after_failure.exec("a", 0, &mut state.clone()).is_success());
}

#[test]
fn test_scoped_state_nests_lifo() {
    let depth_is = |expected: i64| {
        cond::<str>(move |state| {
            state.get("depth").and_then(StateValue::as_int) == Some(expected)
        })
    };
    let inner = depth_is(2).with_state("depth", |state| {
        StateValue::Int(state.get("depth").and_then(StateValue::as_int).unwrap_or(0) + 1)
    });
    let outer = inner
        .skip(&depth_is(1))
        .with_state("depth", |state| {
            StateValue::Int(state.get("depth").and_then(StateValue::as_int).unwrap_or(0) + 1)
        })
        .skip(&depth_is(0));
    let mut state = ParseState::new();
    state.set("depth", 0i64);
    assert!(outer.exec("", 0, &mut state).is_success());
}

#[test]
fn test_choice_branches_cannot_observe_sibling_state() {
    // The first branch installs an entry and then fails; the second branch
    // must not see it.
    let polluting = literal("a")
        .skip(&literal("!"))
        .with_state("seen", |_| StateValue::Bool(true));
    let unseen = not(&cond::<str>(|state| state.contains("seen")));
    let clean = literal("a").skip(&unseen);
    let parser = choice(vec![polluting, clean]);
    assert!(parser.exec("a", 0, &mut ParseState::new()).is_success());
}

// ---
// Newline family
// ---

#[test]
fn test_newline_and_line_begin() {
    let mut state = ParseState::new();
    assert_eq!(
        newline().exec("\r\n", 0, &mut state),
        success(2, "\r\n".to_string())
    );
    assert_eq!(line_begin().exec("a\nb", 2, &mut state), success(2, ()));
    assert_eq!(line_begin().exec("a\nb", 1, &mut state), failure(1));
}
