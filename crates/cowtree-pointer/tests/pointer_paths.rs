use cowtree_pointer::{format_pointer, parse_pointer, PathSegment};

#[test]
fn format_then_parse_keeps_keys() {
    let keys = ["", "a", "a/b", "m~n", "~1", "/", "with space", "ünïcode"];
    for key in keys {
        let path = vec![PathSegment::from("root"), PathSegment::from(key)];
        let pointer = format_pointer(&path);
        assert_eq!(parse_pointer(&pointer).unwrap(), path, "key {key:?}");
    }
}

#[test]
fn indices_survive_as_numeric_keys() {
    let path = vec![PathSegment::from("items"), PathSegment::Index(10)];
    let parsed = parse_pointer(&format_pointer(&path)).unwrap();
    assert_eq!(parsed[1].as_index(), Some(10));
    assert_eq!(parsed[0].as_index(), None);
}

#[test]
fn empty_segments_are_preserved() {
    let parsed = parse_pointer("/").unwrap();
    assert_eq!(parsed, vec![PathSegment::from("")]);
    let parsed = parse_pointer("/a//b").unwrap();
    assert_eq!(
        parsed,
        vec![PathSegment::from("a"), PathSegment::from(""), PathSegment::from("b")]
    );
}
