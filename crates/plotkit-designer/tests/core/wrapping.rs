use plotkit_designer::{HersheySimplex, LayoutEngine, LayoutOptions};
use proptest::prelude::*;

fn engine(max_width_mm: f64) -> LayoutEngine<HersheySimplex> {
    LayoutEngine::new(
        HersheySimplex::new(),
        LayoutOptions {
            max_line_width_mm: Some(max_width_mm),
            ..LayoutOptions::default()
        },
    )
    .unwrap()
}

#[test]
fn test_short_text_stays_on_one_line() {
    let engine = engine(140.0);
    assert_eq!(engine.wrap("Hi there"), vec!["Hi there"]);
}

#[test]
fn test_long_sentence_wraps_between_words() {
    let engine = engine(60.0);
    let lines = engine.wrap("the quick brown fox jumps over the lazy dog");
    assert!(lines.len() > 1);
    assert_eq!(
        lines.join(" "),
        "the quick brown fox jumps over the lazy dog"
    );
}

#[test]
fn test_trailing_newlines_do_not_add_lines() {
    let engine = engine(140.0);
    let block = engine.prepare("Hello\n\n\n");
    assert_eq!(block.lines.len(), 1);
}

proptest! {
    #[test]
    fn prop_wrapped_lines_fit_budget(
        words in prop::collection::vec("[A-Za-z0-9]{1,24}", 1..12),
        max_width_mm in 8.0f64..140.0,
    ) {
        let engine = engine(max_width_mm);
        let text = words.join(" ");
        let lines = engine.wrap(&text);

        for line in &lines {
            let width = engine.line_width_units(line);
            // A lone glyph wider than the budget cannot be split further
            prop_assert!(
                width <= engine.max_width_units() || line.chars().count() == 1,
                "line {:?} is {} units, budget {}", line, width, engine.max_width_units()
            );
        }

        let original: String = text.split_whitespace().collect();
        let wrapped: String = lines.iter().flat_map(|l| l.split_whitespace()).collect();
        prop_assert_eq!(original, wrapped);
    }

    #[test]
    fn prop_explicit_breaks_are_kept(
        lines in prop::collection::vec("[a-z]{0,6}", 1..6),
    ) {
        let engine = engine(140.0);
        let text = lines.join("\n");
        let wrapped = engine.wrap(&text);
        prop_assert_eq!(wrapped.len(), text.lines().count().max(1));
    }
}
