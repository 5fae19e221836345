//! The same operations over every surface kind

mod common;

use common::{all_surfaces, content_doc};
use exrange::surface::{probe, Element, Node, Surface, SurfaceKind};
use exrange::{Bounds, Document, RangeError, Session, TextRange};

const TEXT: &str = "One\nTwo\nThree";

#[test]
fn test_probe_picks_surface() {
    let kind = |e: Element| probe(e).kind();
    assert_eq!(kind(Element::TextControl { value: "x".into() }), SurfaceKind::Input);
    assert_eq!(kind(Element::ContentEditable { nodes: vec![] }), SurfaceKind::Content);
    assert_eq!(kind(Element::Static { text: "x".into() }), SurfaceKind::Fallback);
}

#[test]
fn test_text_and_lines_agree() {
    for (name, doc) in all_surfaces(TEXT) {
        let mut r = TextRange::new(&doc);
        assert_eq!(r.len(), 13, "{name}");
        r.set_line(2);
        assert_eq!(r.text(), "Two", "{name}");
        assert_eq!(r.bounds(), Bounds::new(4, 7), "{name}");
        r.set_lines(2, 3);
        assert_eq!(r.lines(), (2, 3), "{name}");
    }
}

#[test]
fn test_set_text_agrees() {
    for (name, doc) in all_surfaces(TEXT) {
        let mut r = TextRange::new(&doc);
        r.set_line(2);
        r.set_text("2\n2b");
        assert_eq!(doc.borrow().text(), "One\n2\n2b\nThree", "{name}");
        assert_eq!(doc.borrow().surface().text(), "One\n2\n2b\nThree", "{name}");

        r.set_bounds((0, 4));
        r.set_text("");
        assert_eq!(doc.borrow().text(), "2\n2b\nThree", "{name}");
    }
}

#[test]
fn test_selection_round_trips() {
    for (name, doc) in all_surfaces(TEXT) {
        doc.borrow_mut().focus();
        let mut r = TextRange::new(&doc);
        r.set_bounds((5, 10));
        r.select();
        assert_eq!(doc.borrow().surface().selection(), Some(Bounds::new(5, 10)), "{name}");
        assert_eq!(r.selection(), Bounds::new(5, 10), "{name}");
    }
}

#[test]
fn test_search_agrees() {
    for (name, doc) in all_surfaces(TEXT) {
        let mut r = TextRange::new(&doc);
        assert!(r.find("T.", "").unwrap(), "{name}");
        assert_eq!(r.bounds(), Bounds::new(4, 6), "{name}");
        assert!(r.find("T.", "").unwrap(), "{name}");
        assert_eq!(r.text(), "Th", "{name}");
    }
}

#[tokio::test]
async fn test_ex_agrees() {
    for (name, doc) in all_surfaces(TEXT) {
        let mut r = TextRange::new(&doc);
        let mut session = Session::new();
        let status = session.ex(&mut r, "%g/e/ s/e/E/g").await;
        assert!(status.is_completed(), "{name}: {status:?}");
        let status = session.ex(&mut r, "2m0|$a end").await;
        assert!(status.is_completed(), "{name}: {status:?}");
        assert_eq!(doc.borrow().text(), "Two\nOnE\nThrEE\nend", "{name}");
        assert_eq!(r.lines(), (4, 4), "{name}");
    }
}

#[test]
fn test_wrap_only_on_structured_content() {
    for (name, doc) in all_surfaces(TEXT) {
        let mut r = TextRange::new(&doc);
        r.set_line(2);
        let result = r.wrap("b");
        if name == "content" {
            assert!(result.is_ok());
        } else {
            assert!(matches!(
                result,
                Err(RangeError::UnsupportedOperation { operation: "wrap", .. })
            ));
        }
        // text content is never affected
        assert_eq!(doc.borrow().text(), TEXT, "{name}");
    }
}

#[test]
fn test_edit_inside_nested_element() {
    let doc = Document::from_element(Element::ContentEditable {
        nodes: vec![
            Node::text("One"),
            Node::Break,
            Node::element("b", vec![Node::text("Two")]),
        ],
    })
    .shared();
    let mut r = TextRange::with_bounds(&doc, (5, 6));
    assert_eq!(r.text(), "w");
    r.set_text("WW");
    assert_eq!(doc.borrow().text(), "One\nTWWo");
    r.set_line(2);
    assert_eq!(r.text(), "TWWo");
}

#[test]
fn test_content_lines_from_breaks() {
    let doc = content_doc("a\n\nb");
    let mut r = TextRange::new(&doc);
    r.set_line(3);
    assert_eq!(r.text(), "b");
    assert_eq!(doc.borrow().surface().visual_line(4), 2);
}
