use crate::error::{AtlasError, Result};
use crate::export::{AtlasMeta, AtlasSidecar, SIDECAR_SCHEMA_VERSION};
use crate::model::AtlasRecord;
use std::collections::HashMap;

/// Build the tag-per-record XML sidecar.
///
/// ```text
/// <?xml version="1.0" encoding="UTF-8"?>
/// <atlas schema_version="1" app="icon-atlas" version="0.1.0" width="4096" height="128" format="RGBA8888" pad="1" seed_id="open">
///   <tile id="open" x="0" y="0" width="32" height="32"/>
/// </atlas>
/// ```
pub fn to_xml(records: &[AtlasRecord], meta: &AtlasMeta) -> String {
    let mut s = String::new();
    s.push_str("<?xml version=\"1.0\" encoding=\"UTF-8\"?>\n");
    s.push_str(&format!(
        "<atlas schema_version=\"{}\" app=\"{}\" version=\"{}\" width=\"{}\" height=\"{}\" format=\"{}\" pad=\"{}\"",
        xml_escape(&meta.schema_version),
        xml_escape(&meta.app),
        xml_escape(&meta.version),
        meta.width,
        meta.height,
        xml_escape(&meta.format),
        meta.placement_pad,
    ));
    if let Some(seed) = &meta.seed_id {
        s.push_str(&format!(" seed_id=\"{}\"", xml_escape(seed)));
    }
    s.push_str(">\n");
    for r in records {
        s.push_str(&format!(
            "  <tile id=\"{}\" x=\"{}\" y=\"{}\" width=\"{}\" height=\"{}\"/>\n",
            xml_escape(&r.id),
            r.x,
            r.y,
            r.width,
            r.height,
        ));
    }
    s.push_str("</atlas>\n");
    s
}

/// Parse a sidecar produced by [`to_xml`].
///
/// Only the shape `to_xml` writes is understood: one `<atlas>` element with
/// self-closing `<tile/>` children and double-quoted attributes.
pub fn sidecar_from_xml(text: &str) -> Result<AtlasSidecar> {
    let atlas = tag_bodies(text, "atlas")
        .next()
        .ok_or_else(|| AtlasError::Legacy("XML sidecar has no <atlas> element".into()))?;
    let attrs = parse_attrs(atlas)?;

    let schema_version = required(&attrs, "atlas", "schema_version")?.to_string();
    if schema_version != SIDECAR_SCHEMA_VERSION {
        return Err(AtlasError::Legacy(format!(
            "unsupported sidecar schema version {}",
            schema_version
        )));
    }
    let meta = AtlasMeta {
        schema_version,
        app: optional(&attrs, "app"),
        version: optional(&attrs, "version"),
        format: optional(&attrs, "format"),
        width: number(&attrs, "atlas", "width")?,
        height: number(&attrs, "atlas", "height")?,
        placement_pad: number(&attrs, "atlas", "pad")?,
        seed_id: attrs.get("seed_id").cloned(),
    };

    let mut records = Vec::new();
    for body in tag_bodies(text, "tile") {
        let attrs = parse_attrs(body)?;
        records.push(AtlasRecord {
            id: required(&attrs, "tile", "id")?.to_string(),
            x: number(&attrs, "tile", "x")?,
            y: number(&attrs, "tile", "y")?,
            width: number(&attrs, "tile", "width")?,
            height: number(&attrs, "tile", "height")?,
        });
    }
    Ok(AtlasSidecar { records, meta })
}

/// Attribute text of every `<name ...>` start tag, in document order.
fn tag_bodies<'a>(text: &'a str, name: &'a str) -> impl Iterator<Item = &'a str> + 'a {
    let open = format!("<{}", name);
    let starts: Vec<usize> = text
        .match_indices(open.as_str())
        .map(|(i, _)| i + open.len())
        .collect();
    starts.into_iter().filter_map(move |start| {
        let rest = &text[start..];
        // `<atlas` must not match `<atlasfoo`.
        if !rest.starts_with(|c: char| c.is_ascii_whitespace() || c == '>' || c == '/') {
            return None;
        }
        let end = rest.find('>')?;
        Some(rest[..end].trim_end_matches('/'))
    })
}

fn parse_attrs(body: &str) -> Result<HashMap<String, String>> {
    let mut attrs = HashMap::new();
    let mut rest = body.trim_start();
    while !rest.is_empty() {
        let eq = rest
            .find('=')
            .ok_or_else(|| AtlasError::Legacy(format!("malformed XML attributes: {}", body.trim())))?;
        let name = rest[..eq].trim();
        let after = rest[eq + 1..].trim_start();
        let value = after
            .strip_prefix('"')
            .and_then(|v| v.find('"').map(|close| (&v[..close], &v[close + 1..])));
        let Some((value, tail)) = value else {
            return Err(AtlasError::Legacy(format!(
                "unquoted XML attribute '{}'",
                name
            )));
        };
        attrs.insert(name.to_string(), xml_unescape(value));
        rest = tail.trim_start();
    }
    Ok(attrs)
}

fn required<'a>(attrs: &'a HashMap<String, String>, tag: &str, key: &str) -> Result<&'a str> {
    attrs
        .get(key)
        .map(String::as_str)
        .ok_or_else(|| AtlasError::Legacy(format!("<{}> is missing '{}'", tag, key)))
}

fn optional(attrs: &HashMap<String, String>, key: &str) -> String {
    attrs.get(key).cloned().unwrap_or_default()
}

fn number(attrs: &HashMap<String, String>, tag: &str, key: &str) -> Result<u32> {
    let raw = required(attrs, tag, key)?;
    raw.parse().map_err(|_| {
        AtlasError::Legacy(format!("<{}> attribute '{}' is not a number: {}", tag, key, raw))
    })
}

fn xml_escape(s: &str) -> String {
    s.replace('&', "&amp;")
        .replace('<', "&lt;")
        .replace('>', "&gt;")
        .replace('"', "&quot;")
        .replace('\'', "&apos;")
}

fn xml_unescape(s: &str) -> String {
    s.replace("&lt;", "<")
        .replace("&gt;", ">")
        .replace("&quot;", "\"")
        .replace("&apos;", "'")
        .replace("&amp;", "&")
}
