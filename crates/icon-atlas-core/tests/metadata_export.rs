use icon_atlas_core::prelude::*;
use icon_atlas_core::{AtlasMeta, emit_records, sidecar_from_json, sidecar_from_xml, to_json, to_xml};
use image::RgbaImage;

fn blank(id: &str, w: u32, h: u32) -> Tile {
    Tile::new(id, RgbaImage::new(w, h))
}

#[test]
fn records_follow_input_order_not_packing_order() {
    let cfg = AtlasConfig::builder().with_max_dimensions(256, 4096).build();
    let tiles = vec![blank("big", 40, 40), blank("small", 8, 8), blank("mid", 16, 16)];
    let job = AtlasJob::fresh("sorted").with_sort(true);
    let out = pack_atlas(tiles, &job, &cfg).expect("pack");

    let ids: Vec<&str> = out.records.iter().map(|r| r.id.as_str()).collect();
    assert_eq!(ids, vec!["big", "small", "mid"]);
    assert_eq!(out.records[0].rect(), Rect::new(25, 0, 41, 40));
    assert_eq!(out.records[1].rect(), Rect::new(0, 0, 8, 8));
    assert_eq!(out.meta.seed_id.as_deref(), Some("small"));
    assert_eq!(out.meta.width, 256);
    assert_eq!(out.meta.height, 40);
}

#[test]
fn emit_skips_unplaced_tiles() {
    let tiles = vec![blank("a", 2, 2)];
    assert!(emit_records(&tiles).is_empty());
}

#[test]
fn json_sidecar_shape_and_round_trip() {
    let records = vec![
        AtlasRecord { id: "open".into(), x: 0, y: 0, width: 32, height: 32 },
        AtlasRecord { id: "save".into(), x: 32, y: 0, width: 33, height: 32 },
    ];
    let meta = AtlasMeta::new(4096, 32, Some("open".into()));
    let value = to_json(&records, &meta);

    let obj = value.as_object().expect("object");
    assert!(obj.contains_key("records"));
    assert!(obj.contains_key("meta"));
    let first = &value["records"][0];
    for key in ["id", "x", "y", "width", "height"] {
        assert!(first.get(key).is_some(), "missing {}", key);
    }
    assert_eq!(value["records"][1]["x"], 32);
    assert_eq!(value["meta"]["placement_pad"], 1);

    let text = serde_json::to_string_pretty(&value).expect("serialize");
    let back = sidecar_from_json(&text).expect("parse");
    assert_eq!(back.records, records);
    assert_eq!(back.meta, meta);
}

#[test]
fn sidecar_with_unknown_schema_is_rejected() {
    let mut meta = AtlasMeta::new(64, 8, None);
    meta.schema_version = "9".into();
    let text = serde_json::to_string(&to_json(&[], &meta)).expect("serialize");
    assert!(matches!(sidecar_from_json(&text), Err(AtlasError::Legacy(_))));
    assert!(matches!(sidecar_from_json("{ not json"), Err(AtlasError::Json(_))));
}

#[test]
fn xml_sidecar_has_one_tag_per_record() {
    let records = vec![
        AtlasRecord { id: "a&b".into(), x: 0, y: 0, width: 4, height: 4 },
        AtlasRecord { id: "\"quoted\"".into(), x: 4, y: 0, width: 5, height: 4 },
    ];
    let xml = to_xml(&records, &AtlasMeta::new(64, 4, None));
    assert!(xml.starts_with("<?xml"));
    assert_eq!(xml.matches("<tile ").count(), 2);
    assert!(xml.contains(r#"<tile id="a&amp;b" x="0" y="0" width="4" height="4"/>"#));
    assert!(xml.contains("&quot;quoted&quot;"));
    assert!(xml.contains(r#"width="64" height="4""#));
    assert!(xml.contains(r#"schema_version="1""#));
    assert!(!xml.contains("seed_id"));
    assert!(xml.trim_end().ends_with("</atlas>"));
}

#[test]
fn xml_sidecar_reads_back_with_seed_and_escaped_ids() {
    let records = vec![
        AtlasRecord { id: "tools/a&b".into(), x: 0, y: 0, width: 4, height: 4 },
        AtlasRecord { id: "<quoted> 'x'".into(), x: 4, y: 0, width: 5, height: 3 },
    ];
    let meta = AtlasMeta::new(64, 4, Some("tools/a&b".into()));
    let xml = to_xml(&records, &meta);
    assert!(xml.contains(r#"seed_id="tools/a&amp;b""#));

    let back = sidecar_from_xml(&xml).expect("parse xml");
    assert_eq!(back.records, records);
    assert_eq!(back.meta, meta);
}

#[test]
fn xml_sidecar_with_bad_header_or_tiles_is_rejected() {
    let meta = AtlasMeta::new(64, 4, None);
    let xml = to_xml(&[], &meta).replace(r#"schema_version="1""#, r#"schema_version="2""#);
    assert!(matches!(sidecar_from_xml(&xml), Err(AtlasError::Legacy(_))));

    assert!(matches!(sidecar_from_xml("<tiles/>"), Err(AtlasError::Legacy(_))));

    let bad_tile = to_xml(
        &[AtlasRecord { id: "a".into(), x: 0, y: 0, width: 4, height: 4 }],
        &meta,
    )
    .replace(r#"x="0""#, r#"x="left""#);
    assert!(matches!(sidecar_from_xml(&bad_tile), Err(AtlasError::Legacy(_))));
}

#[test]
fn stats_report_occupancy() {
    let cfg = AtlasConfig::builder().with_max_dimensions(64, 4096).build();
    let tiles = vec![blank("a", 16, 16), blank("b", 16, 16)];
    let out = pack_atlas(tiles, &AtlasJob::fresh("stats"), &cfg).expect("pack");
    let stats = out.stats();
    assert_eq!(stats.num_tiles, 2);
    assert_eq!(stats.canvas_area, 64 * 16);
    assert_eq!(stats.used_area, 16 * 16 + 17 * 16);
    assert!(stats.occupancy > 0.0 && stats.occupancy <= 1.0);
    assert_eq!(stats.wasted_area(), 64 * 16 - (16 * 16 + 17 * 16));
    let waste = stats.waste_percentage();
    assert!((waste - (100.0 - stats.occupancy * 100.0)).abs() < 1e-9);
    assert!(stats.summary().contains("Tiles: 2"));
    assert!(stats.summary().contains(&format!("({:.2}%)", waste)));
}
