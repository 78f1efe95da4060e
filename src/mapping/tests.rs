use std::rc::Rc;

use super::{Marker, Variable};
use crate::mapping::Mapping;

fn var(name: &str, id: usize) -> Rc<Variable> {
    Rc::new(Variable::new(name.to_string(), id))
}

#[test]
fn from_markers_builds_spans_for_each_variable() {
    let text = "abcdef";
    let m = var("match", 0);
    let g = var("g", 1);

    let markers = vec![
        (Marker::Open(m.clone()), 0),
        (Marker::Open(g.clone()), 1),
        (Marker::Close(g.clone()), 3),
        (Marker::Close(m.clone()), 6),
    ];

    let mapping = Mapping::from_markers(text, markers.into_iter()).unwrap();
    assert_eq!(mapping.main_span(), Some(0..6));
    assert_eq!(
        mapping.iter_groups_text().collect::<Vec<_>>(),
        vec![("g", "bc")]
    );
}

#[test]
fn from_markers_filters_ill_formed_match() {
    let text = "abc";
    let m = var("match", 0);

    let markers = vec![(Marker::Open(m), 0)];
    assert!(Mapping::from_markers(text, markers.into_iter()).is_none());
}

#[test]
fn from_markers_drops_unvisited_non_match_group() {
    let text = "abc";
    let m = var("match", 0);
    let g = var("g", 1);

    // `g` never gets a Close: its alternative branch wasn't taken on this run.
    let markers = vec![
        (Marker::Open(m.clone()), 0),
        (Marker::Close(m), 3),
        (Marker::Open(g), 1),
    ];

    let mapping = Mapping::from_markers(text, markers.into_iter()).unwrap();
    assert_eq!(mapping.iter_groups().count(), 0);
}

#[test]
fn marker_ordering_puts_all_opens_before_closes() {
    let a = var("a", 0);
    let b = var("b", 1);

    let mut markers = vec![
        Marker::Close(a.clone()),
        Marker::Open(b.clone()),
        Marker::Open(a.clone()),
        Marker::Close(b),
    ];
    markers.sort();

    assert!(matches!(markers[0], Marker::Open(_)));
    assert!(matches!(markers[1], Marker::Open(_)));
    assert!(matches!(markers[2], Marker::Close(_)));
    assert!(matches!(markers[3], Marker::Close(_)));
}
