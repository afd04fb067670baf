//! `FBXHeaderExtension` and `GlobalSettings`.

use tracing::debug;

use crate::core::{CoordinateSystem, TimeBase, LEGACY_TC_DEFINITION};
use crate::node::{Node, NodeTag};
use crate::scene::Document;
use crate::util::{Error, Result};

/// Oldest supported file version.
pub const MIN_VERSION: u32 = 7000;

/// Read version, application names and creation time.
///
/// Fails with [`Error::UnsupportedVersion`] for files older than 7.0.
pub fn read_header(doc: &mut Document, root: &Node) -> Result<()> {
    let Some(header) = root.child(NodeTag::HeaderExtension) else {
        return Ok(());
    };

    if let Some(version) = header.child(NodeTag::FbxVersion).and_then(|v| v.i64_at(0)) {
        let version = u32::try_from(version).unwrap_or(0);
        if version < MIN_VERSION {
            return Err(Error::UnsupportedVersion(version));
        }
        doc.header.version = version;
    }

    if let Some(scene_info) = header.child(NodeTag::SceneInfo) {
        for entry in scene_info.properties70() {
            let value = entry.str().map(str::to_string);
            match entry.name() {
                "Original|ApplicationName" => doc.header.original_application = value,
                "LastSaved|ApplicationName" => doc.header.last_saved_application = value,
                _ => {}
            }
        }
    }

    if let Some(stamp) = header.child(NodeTag::CreationTimeStamp) {
        let part = |tag| stamp.child(tag).and_then(|n| n.i32_at(0)).unwrap_or(0);
        doc.header.creation_time = Some(format!(
            "{:04}-{:02}-{:02} {:02}:{:02}:{:02}.{:03}",
            part(NodeTag::Year),
            part(NodeTag::Month),
            part(NodeTag::Day),
            part(NodeTag::Hour),
            part(NodeTag::Minute),
            part(NodeTag::Second),
            part(NodeTag::Millisecond),
        ));
    }

    debug!(
        "FBX {} from {}",
        doc.header.version,
        doc.header.original_application.as_deref().unwrap_or("unknown application")
    );
    Ok(())
}

/// Read `GlobalSettings` (top level, else under `Objects`) and the time code
/// flag, then derive the time base and coordinate conversion.
pub fn read_global_settings(doc: &mut Document, root: &Node) {
    let settings = root
        .child(NodeTag::GlobalSettings)
        .or_else(|| root.child(NodeTag::Objects).and_then(|o| o.child(NodeTag::GlobalSettings)));
    if let Some(node) = settings {
        doc.settings.read(node);
    }

    let tc_definition = root
        .child(NodeTag::OtherFlags)
        .or_else(|| root.child(NodeTag::HeaderExtension).and_then(|h| h.child(NodeTag::OtherFlags)))
        .and_then(|flags| flags.child(NodeTag::TcDefinition))
        .and_then(|tc| tc.i32_at(0));
    if let Some(tc) = tc_definition {
        doc.header.new_time_code = tc != LEGACY_TC_DEFINITION;
    }

    doc.time_base = TimeBase::new(doc.header.version, doc.header.new_time_code);
    doc.coords = CoordinateSystem::new(&doc.settings, &doc.options);
    debug!(
        "settings: {} fps, unit scale {}, right handed {}, {} ticks/s",
        doc.settings.frame_rate(),
        doc.settings.unit_scale_factor,
        doc.coords.is_right_handed,
        doc.time_base.ticks_per_second()
    );
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::{ImportOptions, TICKS_PER_SECOND_NEW};
    use crate::node::property_entry;

    fn header(version: i32) -> Node {
        Node::new("FBXHeaderExtension")
            .with_child(Node::new("FBXVersion").with_property(version))
            .with_child(Node::new("OtherFlags").with_child(Node::new("TCDefinition").with_property(0i32)))
            .with_child(
                Node::new("SceneInfo").with_child(Node::new("Properties70").with_child(property_entry(
                    "Original|ApplicationName",
                    "KString",
                    "",
                    ["Blender".into()],
                ))),
            )
            .with_child(
                Node::new("CreationTimeStamp")
                    .with_child(Node::new("Year").with_property(2024i32))
                    .with_child(Node::new("Month").with_property(3i32))
                    .with_child(Node::new("Day").with_property(9i32)),
            )
    }

    #[test]
    fn test_old_version_is_fatal() {
        let root = Node::new("").with_child(header(6100));
        let mut doc = Document::new(ImportOptions::default(), true);
        assert!(matches!(read_header(&mut doc, &root), Err(Error::UnsupportedVersion(6100))));
    }

    #[test]
    fn test_header_fields() {
        let root = Node::new("").with_child(header(7700));
        let mut doc = Document::new(ImportOptions::default(), true);
        read_header(&mut doc, &root).unwrap();
        assert_eq!(doc.header.version, 7700);
        assert_eq!(doc.header.original_application.as_deref(), Some("Blender"));
        assert_eq!(doc.header.creation_time.as_deref(), Some("2024-03-09 00:00:00.000"));
    }

    #[test]
    fn test_new_time_code_from_header_flags() {
        let root = Node::new("").with_child(header(7700));
        let mut doc = Document::new(ImportOptions::default(), true);
        read_header(&mut doc, &root).unwrap();
        read_global_settings(&mut doc, &root);
        assert!(doc.header.new_time_code);
        assert_eq!(doc.time_base.ticks_per_second(), TICKS_PER_SECOND_NEW);
    }

    #[test]
    fn test_settings_under_objects_rebuild_coords() {
        let settings = Node::new("GlobalSettings").with_child(
            Node::new("Properties70")
                .with_child(property_entry("UnitScaleFactor", "double", "", [100.0f64.into()]))
                .with_child(property_entry("CoordAxisSign", "int", "", [(-1i32).into()])),
        );
        let root = Node::new("").with_child(Node::new("Objects").with_child(settings));
        let mut doc = Document::new(ImportOptions::default(), false);
        read_global_settings(&mut doc, &root);
        assert_eq!(doc.settings.unit_scale_factor, 100.0);
        assert_eq!(doc.coords.scale, 1.0);
        assert!(!doc.coords.is_right_handed);
    }

    #[test]
    fn test_missing_header_is_fine() {
        let mut doc = Document::new(ImportOptions::default(), false);
        read_header(&mut doc, &Node::new("")).unwrap();
        assert_eq!(doc.header.version, 0);
    }
}
