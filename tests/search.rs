//! Search and replace through a range

mod common;

use common::input_doc;
use exrange::ex::OptionName;
use exrange::{Bounds, SearchError, TextRange};

const TEXT: &str = "One\nTwo\nThree";

fn range(text: &str) -> TextRange {
    TextRange::new(&input_doc(text))
}

// ========================================================================
// Find
// ========================================================================

#[test]
fn test_find_moves_to_next_match_and_wraps() {
    let mut r = range(TEXT);
    assert_eq!(r.matched(), None);
    assert!(r.find("T", "").unwrap());
    assert_eq!(r.bounds(), Bounds::new(4, 5));
    assert_eq!(r.matched(), Some(true));

    assert!(r.find("T", "").unwrap());
    assert_eq!(r.bounds(), Bounds::new(8, 9));

    // wrapscan is on by default
    assert!(r.find("T", "").unwrap());
    assert_eq!(r.bounds(), Bounds::new(4, 5));
}

#[test]
fn test_find_without_wrap_keeps_bounds() {
    let mut r = range(TEXT);
    r.set_bounds((8, 9));
    assert!(!r.find("T", "W").unwrap());
    assert_eq!(r.bounds(), Bounds::new(8, 9));
    assert_eq!(r.matched(), Some(false));

    assert!(!r.find_next("T", true, false).unwrap());
}

#[test]
fn test_single_match_never_repeats() {
    let mut r = range("abc needle xyz");
    assert!(r.find("needle", "").unwrap());
    let first = r.bounds();
    assert!(!r.find("needle", "").unwrap());
    assert_eq!(r.bounds(), first);

    // from elsewhere it is found again
    r.set_bounds((0, 0));
    assert!(r.find("needle", "").unwrap());
}

#[test]
fn test_find_backward() {
    let mut r = range("ab ab ab");
    r.set_bounds((8, 8));
    assert!(r.find("ab", "b").unwrap());
    assert_eq!(r.bounds(), Bounds::new(6, 8));
    assert!(r.find_next("ab", false, true).unwrap());
    assert_eq!(r.bounds(), Bounds::new(3, 5));
    assert!(r.find("ab", "b").unwrap());
    assert_eq!(r.bounds(), Bounds::new(0, 2));

    // wraps to the last occurrence
    assert!(r.find("ab", "b").unwrap());
    assert_eq!(r.bounds(), Bounds::new(6, 8));
}

#[test]
fn test_find_case_flags_and_option() {
    let doc = input_doc(TEXT);
    let mut r = TextRange::new(&doc);
    assert!(!r.find("one", "").unwrap());
    assert!(r.find("one", "i").unwrap());
    assert_eq!(r.bounds(), Bounds::new(0, 3));

    doc.borrow_mut()
        .options_mut()
        .set_flag(OptionName::Ignorecase, true)
        .unwrap();
    r.set_bounds((0, 0));
    assert!(r.find("ONE", "").unwrap());
    // uppercase flag turns the option back off
    r.set_bounds((0, 0));
    assert!(!r.find("ONE", "I").unwrap());
}

#[test]
fn test_find_sticky_and_restricted() {
    let mut r = range(TEXT);
    assert!(r.find("One", "y").unwrap());
    assert_eq!(r.bounds(), Bounds::new(0, 3));
    assert!(!r.find("Two", "y").unwrap());

    r.set_line(3);
    assert!(r.find("e", "r").unwrap());
    assert_eq!(r.bounds(), Bounds::new(11, 12));

    // nothing outside the bounds
    r.set_line(2);
    assert!(!r.find("e", "r").unwrap());
}

#[test]
fn test_find_multiline_anchors() {
    let mut r = range(TEXT);
    assert!(!r.find("^Two", "").unwrap());
    assert!(r.find("^Two", "m").unwrap());
    assert_eq!(r.bounds(), Bounds::new(4, 7));
}

#[test]
fn test_find_literal_without_magic() {
    let mut r = range("a.b axb");
    r.set_bounds((1, 1));
    assert!(r.find("a.b", "X").unwrap());
    assert_eq!(r.bounds(), Bounds::new(0, 3));
    assert!(!r.find("a.b", "X").unwrap());
}

#[test]
fn test_find_errors() {
    let mut r = range(TEXT);
    assert!(matches!(r.find("(", ""), Err(SearchError::Pattern(_))));
    assert!(matches!(r.find("x", "q"), Err(SearchError::BadFlag('q'))));
}

// ========================================================================
// Replace
// ========================================================================

#[test]
fn test_replace_inside_bounds() {
    let doc = input_doc(TEXT);
    let mut r = TextRange::new(&doc);
    r.set_lines(2, 3);
    assert_eq!(r.replace("[et]", "*", "i", true).unwrap(), 4);
    assert_eq!(doc.borrow().text(), "One\n*wo\n*hr**");
    assert_eq!(r.text(), "*wo\n*hr**");
}

#[test]
fn test_replace_first_or_last() {
    let doc = input_doc("aXbXc");
    let mut r = TextRange::with_bounds(&doc, (0, 5));
    assert_eq!(r.replace("X", "-", "", false).unwrap(), 1);
    assert_eq!(doc.borrow().text(), "a-bXc");

    r.set_bounds((0, 5));
    assert_eq!(r.replace("[X-]", "+", "b", false).unwrap(), 1);
    assert_eq!(doc.borrow().text(), "a-b+c");
}

#[test]
fn test_replace_no_match_leaves_text() {
    let doc = input_doc(TEXT);
    let mut r = TextRange::with_bounds(&doc, (0, 3));
    assert_eq!(r.replace("Two", "2", "", true).unwrap(), 0);
    assert_eq!(doc.borrow().text(), TEXT);
    assert!(doc.borrow().history().is_empty());
}

#[test]
fn test_replace_template_escapes() {
    let doc = input_doc("bob@host");
    let mut r = TextRange::with_bounds(&doc, (0, 8));
    r.replace(r"(\w+)@(\w+)", r"\2 at \u\1 (&)", "", false).unwrap();
    assert_eq!(doc.borrow().text(), "host at Bob (bob@host)");

    let doc = input_doc("shout");
    let mut r = TextRange::with_bounds(&doc, (0, 5));
    r.replace("h.*", r"\U&\E!", "", false).unwrap();
    assert_eq!(doc.borrow().text(), "sHOUT!");
}

#[test]
fn test_replace_literal_without_magic() {
    let doc = input_doc("a.b axb");
    let mut r = TextRange::with_bounds(&doc, (0, 7));
    r.replace("a.b", r"[\&]", "X", true).unwrap();
    assert_eq!(doc.borrow().text(), "[a.b] axb");
}

#[test]
fn test_replace_sees_context_before_bounds() {
    // the word boundary before "cat" is decided by the text outside the range
    let doc = input_doc("concat cat");
    let mut r = TextRange::with_bounds(&doc, (3, 10));
    assert_eq!(r.replace(r"\bcat", "dog", "", true).unwrap(), 1);
    assert_eq!(doc.borrow().text(), "concat dog");
}
