//! Suggestion index matching.

use market_view::SuggestionIndex;

fn index() -> SuggestionIndex {
    SuggestionIndex::new(["Potion of Health", "Elixir", "War Potion"])
}

#[test]
fn short_fragments_suggest_nothing() {
    let index = index();
    assert!(index.suggest("").is_empty());
    assert!(index.suggest("ab").is_empty());
    assert!(index.suggest("po").is_empty());
}

#[test]
fn matches_keep_list_order() {
    assert_eq!(index().suggest("pot"), vec!["Potion of Health", "War Potion"]);
}

#[test]
fn matching_ignores_case() {
    assert_eq!(index().suggest("ELIX"), vec!["Elixir"]);
    assert_eq!(index().suggest("wAr p"), vec!["War Potion"]);
}

#[test]
fn no_match_is_empty() {
    assert!(index().suggest("leapstone").is_empty());
}

#[test]
fn loads_from_json_list() {
    let index = SuggestionIndex::from_json(r#"["Solar Grace", "Solar Blessing", "Honor Shard"]"#).unwrap();
    assert_eq!(index.len(), 3);
    assert_eq!(index.suggest("solar"), vec!["Solar Grace", "Solar Blessing"]);
}

#[test]
fn malformed_json_is_an_error() {
    assert!(SuggestionIndex::from_json("{\"not\": \"a list\"}").is_err());
}
