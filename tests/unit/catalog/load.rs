use super::*;

#[test]
fn parses_array_with_dutch_aliases() {
    let json = br#"[
        {"nummer": 1, "artiest": "Queen", "titel": "Bohemian Rhapsody"},
        {"position": 2, "artist": "Eagles", "song": "Hotel California"}
    ]"#;
    let c = parse_catalog(json).unwrap();
    assert_eq!(c.len(), 2);
    assert_eq!(c.entries()[0].title, "Bohemian Rhapsody");
    assert_eq!(c.entries()[1].title, "Hotel California");
}

#[test]
fn parses_legacy_map_in_numeric_order() {
    let json = br#"{
        "10": {"artist": "B", "song": "b"},
        "9": {"artist": "A", "song": "a"},
        "x": {"artist": "C", "song": "c"}
    }"#;
    let c = parse_catalog(json).unwrap();
    let positions: Vec<u32> = c.entries().iter().map(|e| e.position).collect();
    assert_eq!(positions, vec![9, 10]);
}

#[test]
fn skips_positions_out_of_range() {
    let json = br#"[
        {"position": -1, "artist": "A", "title": "a"},
        {"position": 1000, "artist": "B", "title": "b"},
        {"position": 1001, "artist": "C", "title": "c"}
    ]"#;
    let c = parse_catalog(json).unwrap();
    assert_eq!(c.len(), 1);
    assert_eq!(c.entries()[0].position, 1000);
}

#[test]
fn malformed_json_is_a_serde_error() {
    let err = parse_catalog(b"{not json").unwrap_err();
    assert!(matches!(err, WheelError::Serde(_)));
}

#[test]
fn missing_file_degrades_to_empty() {
    let dir = tempfile::tempdir().unwrap();
    let c = load_or_empty(&dir.path().join("nope.json"));
    assert!(c.is_empty());
}

#[test]
fn load_from_disk() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("g1000.json");
    std::fs::write(&path, br#"[{"position": 7, "artist": "A", "title": "T"}]"#).unwrap();
    let c = load_catalog(&path).unwrap();
    assert_eq!(c.find(7).unwrap().artist, "A");
}
