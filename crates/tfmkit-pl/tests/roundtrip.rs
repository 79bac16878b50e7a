use tfmkit_config::Config;
use tfmkit_pl::{emit_pl, parse_and_cook, EmitOptions};

fn roundtrips(src: &str) {
    let cfg = Config::default();
    let tree = parse_and_cook(src, &cfg, None).expect("parse");
    let rendered = emit_pl(&tree, &EmitOptions::default(), None).expect("emit");
    let reparsed = parse_and_cook(&rendered, &cfg, None).expect("reparse");
    assert_eq!(tree, reparsed, "round-trip mismatch for {src:?}, rendered as {rendered:?}");
}

#[test]
fn flat_properties_round_trip() {
    roundtrips("(FAMILY XYZ)\n(CHECKSUM O 7777777)\n(DESIGNSIZE R 10.0)\n");
}

#[test]
fn nested_character_round_trips() {
    roundtrips(
        "(CHARACTER C A\n   (CHARWD R 0.5)\n   (CHARHT R 0.7)\n   (CHARDP R 0.0)\n   )\n",
    );
}

#[test]
fn comments_do_not_survive_round_trip_but_rest_does() {
    let cfg = Config::default();
    let tree = parse_and_cook("(FAMILY XYZ (COMMENT dropped) D 1)", &cfg, None).unwrap();
    let rendered = emit_pl(&tree, &EmitOptions::default(), None).unwrap();
    assert!(!rendered.contains("COMMENT"));
    assert!(!rendered.contains("dropped"));
}

#[test]
fn ligtable_with_multiple_instructions_round_trips() {
    roundtrips(
        "(LIGTABLE\n   (LABEL C f)\n   (LIG C i C 1)\n   (STOP)\n   )\n",
    );
}
