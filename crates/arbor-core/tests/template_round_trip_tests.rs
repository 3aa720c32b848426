//! Template text round trips: compiling the reconstructed text of a
//! compiled template must reproduce the same token list, for any input.

use arbor_core::format::{FieldModifier, FieldTemplate, TemplateToken};
use proptest::prelude::*;

/// One raw field reference with an arbitrary modifier and a legal name
fn arb_field_ref() -> impl Strategy<Value = String> {
    let modifier = prop_oneof![
        Just(String::new()),
        Just("*".to_string()),
        Just("**".to_string()),
        Just("***".to_string()),
        Just("?".to_string()),
        Just("!".to_string()),
        Just("&".to_string()),
        Just("#".to_string()),
    ];
    (modifier, "[A-Za-z][A-Za-z0-9_.-]{0,8}")
        .prop_map(|(modifier, name)| format!("{{*{}{}*}}", modifier, name))
}

/// Literal text drawn from an alphabet that includes template delimiter
/// characters and whitespace, so broken references get generated too
fn arb_literal() -> impl Strategy<Value = String> {
    "[ a-zA-Z0-9*{}?!&#<>]{1,12}"
}

/// Raw template text assembled from literal chunks and field references
fn arb_template_text() -> impl Strategy<Value = String> {
    prop::collection::vec(
        prop_oneof![arb_literal(), arb_field_ref()],
        0..8,
    )
    .prop_map(|parts| parts.concat())
}

proptest! {
    #[test]
    fn compile_to_text_compile_is_a_fixed_point(raw in arb_template_text()) {
        let compiled = FieldTemplate::compile(&raw);
        let reparsed = FieldTemplate::compile(&compiled.to_text());
        prop_assert_eq!(reparsed, compiled);
    }

    #[test]
    fn compile_survives_arbitrary_text(raw in ".{0,40}") {
        let compiled = FieldTemplate::compile(&raw);
        let reparsed = FieldTemplate::compile(&compiled.to_text());
        prop_assert_eq!(reparsed, compiled);
    }

    #[test]
    fn compiled_literals_never_sit_adjacent(raw in arb_template_text()) {
        let compiled = FieldTemplate::compile(&raw);
        let mut previous_was_literal = false;
        for token in compiled.tokens() {
            let is_literal = matches!(token, TemplateToken::Literal(_));
            prop_assert!(
                !(is_literal && previous_was_literal),
                "adjacent literal tokens in {:?}",
                compiled.tokens()
            );
            previous_was_literal = is_literal;
        }
    }

    #[test]
    fn reconstructed_text_has_no_whitespace_runs(raw in arb_template_text()) {
        let text = FieldTemplate::compile(&raw).to_text();
        prop_assert!(!text.contains("  "), "double space in {:?}", text);
        prop_assert!(!text.starts_with(' '), "leading space in {:?}", text);
        prop_assert!(!text.ends_with(' '), "trailing space in {:?}", text);
    }
}

// ===== TARGETED PARSE TESTS =====

#[test]
fn test_every_modifier_form_round_trips() {
    for raw in [
        "{*Name*}",
        "{**Name*}",
        "{***Name*}",
        "{*?Name*}",
        "{*!Name*}",
        "{*&Name*}",
        "{*#Name*}",
    ] {
        let compiled = FieldTemplate::compile(raw);
        assert_eq!(compiled.to_text(), raw);
        assert_eq!(compiled.tokens().len(), 1);
    }
}

#[test]
fn test_modifier_classification() {
    let cases = [
        ("{*Name*}", FieldModifier::None),
        ("{**Name*}", FieldModifier::LevelsUp(1)),
        ("{***Name*}", FieldModifier::LevelsUp(2)),
        ("{*?Name*}", FieldModifier::Exists),
        ("{*!Name*}", FieldModifier::Nonempty),
        ("{*&Name*}", FieldModifier::Join),
        ("{*#Name*}", FieldModifier::Numbered),
    ];
    for (raw, expected) in cases {
        let compiled = FieldTemplate::compile(raw);
        match &compiled.tokens()[0] {
            TemplateToken::FieldRef { name, modifier } => {
                assert_eq!(name, "Name");
                assert_eq!(modifier, &expected, "for {}", raw);
            }
            other => panic!("expected field reference for {}, got {:?}", raw, other),
        }
    }
}

#[test]
fn test_broken_references_stay_literal() {
    for raw in ["{*unclosed", "{* spaced *}", "{*%bad*}", "{**}", "plain text"] {
        let compiled = FieldTemplate::compile(raw);
        assert_eq!(
            compiled.tokens().len(),
            1,
            "expected one literal token for {}",
            raw
        );
        assert!(
            matches!(&compiled.tokens()[0], TemplateToken::Literal(text) if text == raw),
            "expected literal pass-through for {}",
            raw
        );
    }
}

#[test]
fn test_whitespace_collapses_before_parsing() {
    let compiled = FieldTemplate::compile("First   {*Name*}\n\n  Last");
    assert_eq!(compiled.to_text(), "First {*Name*} Last");
}

#[test]
fn test_adjacent_references_keep_order() {
    let compiled = FieldTemplate::compile("{*First*}{*Last*}");
    let names: Vec<&str> = compiled
        .tokens()
        .iter()
        .map(|token| match token {
            TemplateToken::FieldRef { name, .. } => name.as_str(),
            TemplateToken::Literal(_) => panic!("unexpected literal"),
        })
        .collect();
    assert_eq!(names, ["First", "Last"]);
}
