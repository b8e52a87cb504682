//! XDI fixtures converted end to end into tree containers

use nxxas_babel::container::tree::Node;
use nxxas_babel::definitions::validate_instance;
use nxxas_babel::model::Value;
use nxxas_babel::{
    Backend, BuiltinDefinitions, ConversionPipeline, ConversionRegistry, FormatRegistry, NodePath,
    PipelineOptions, Record, RecordKind, TreeContainer,
};
use nxxas_parser::xdi::{encode, XdiDecoder};
use nxxas_parser::{UnitValue, XdiLoader};
use std::path::{Path, PathBuf};

fn fixture(name: &str) -> PathBuf {
    Path::new(env!("CARGO_MANIFEST_DIR"))
        .join("../nxxas-parser/tests/fixtures")
        .join(name)
}

fn convert(inputs: &[&str], output: &Path) -> TreeContainer {
    let formats = FormatRegistry::with_defaults();
    let conversions = ConversionRegistry::with_defaults();
    let mut options = PipelineOptions::default();
    options.format.backend = Backend::Tree;
    let pipeline = ConversionPipeline::new(&formats, &conversions, options);
    let patterns: Vec<String> = inputs
        .iter()
        .map(|name| fixture(name).display().to_string())
        .collect();
    let report = pipeline
        .run(&patterns, output, "nexus", &mut |_| false)
        .unwrap();
    assert!(report.is_success(), "{:?}", report.failures);
    TreeContainer::load(output).unwrap()
}

fn text_at<'a>(tree: &'a TreeContainer, path: &str) -> Option<&'a str> {
    match tree.node(&NodePath::parse(path).unwrap())? {
        Node::Dataset { value, .. } => value.as_text(),
        _ => None,
    }
}

fn attr_at<'a>(tree: &'a TreeContainer, path: &str, name: &str) -> Option<&'a Value> {
    tree.node(&NodePath::parse(path).unwrap())?.attr(name)
}

#[test]
fn transmission_file_becomes_one_entry() {
    let dir = tempfile::tempdir().unwrap();
    let tree = convert(&["co_metal_foil.xdi"], &dir.path().join("co.nxs"));

    assert_eq!(attr_at(&tree, "/", "NX_class"), Some(&Value::from("NXroot")));
    assert_eq!(attr_at(&tree, "/", "default"), Some(&Value::from("dataset01")));
    assert_eq!(attr_at(&tree, "/dataset01", "NX_class"), Some(&Value::from("NXentry")));
    assert_eq!(attr_at(&tree, "/dataset01", "default"), Some(&Value::from("plot")));
    assert_eq!(
        text_at(&tree, "/dataset01/title"),
        Some("APS-13-ID-C: Co K (transmission)")
    );
    assert_eq!(text_at(&tree, "/dataset01/instrument/name"), Some("APS-13-ID-C"));
    assert_eq!(
        attr_at(&tree, "/dataset01/energy", "units"),
        Some(&Value::from("eV"))
    );
    assert_eq!(
        tree.node(&NodePath::parse("/dataset01/plot/energy").unwrap()),
        Some(&Node::SoftLink {
            target: "/dataset01/energy".into()
        })
    );
    assert!(validate_instance(&BuiltinDefinitions::new(), &tree).is_ok());
}

#[test]
fn two_mode_file_becomes_two_subentries() {
    let dir = tempfile::tempdir().unwrap();
    let tree = convert(&["fe_fluorescence.xdi"], &dir.path().join("fe.nxs"));

    for (mode, title) in [
        ("transmission", "ESRF-BM23: Fe K (transmission)"),
        ("fluorescence_yield", "ESRF-BM23: Fe K (fluorescence yield)"),
    ] {
        let entry = format!("/dataset01/{mode}");
        assert_eq!(
            attr_at(&tree, &entry, "NX_class"),
            Some(&Value::from("NXsubentry"))
        );
        assert_eq!(text_at(&tree, &format!("{entry}/title")), Some(title));
        assert_eq!(
            attr_at(&tree, &format!("{entry}/energy"), "units"),
            Some(&Value::from("keV"))
        );
    }
    assert_eq!(attr_at(&tree, "/dataset01", "NX_class"), Some(&Value::from("NXentry")));
    assert!(validate_instance(&BuiltinDefinitions::new(), &tree).is_ok());
}

#[test]
fn files_share_one_container() {
    let dir = tempfile::tempdir().unwrap();
    let tree = convert(
        &["co_metal_foil.xdi", "fe_fluorescence.xdi"],
        &dir.path().join("all.nxs"),
    );
    assert!(text_at(&tree, "/dataset01/title").is_some());
    assert!(text_at(&tree, "/dataset02/transmission/title").is_some());
}

#[test]
fn spectra_survive_a_round_trip_through_entries() {
    let source = XdiLoader::from_path(fixture("fe_fluorescence.xdi"))
        .unwrap()
        .decode()
        .unwrap();
    let registry = ConversionRegistry::with_defaults();
    let entries: Vec<Record> = registry
        .convert(Record::from(source.clone()), RecordKind::Entry)
        .unwrap()
        .collect::<Result<_, _>>()
        .unwrap();
    assert_eq!(entries.len(), 2);

    for (entry, column) in entries.into_iter().zip(["mutrans", "mufluor"]) {
        let back: Vec<Record> = registry
            .convert(entry, RecordKind::Xdi)
            .unwrap()
            .collect::<Result<_, _>>()
            .unwrap();
        let Record::Xdi(xdi) = &back[0] else {
            panic!("expected an XDI record");
        };
        let decoded = XdiDecoder::new().decode(&encode(xdi)).unwrap();
        assert_eq!(decoded.data.get("energy"), source.data.get("energy"));
        assert_eq!(decoded.data.get(column), source.data.get(column));
        assert_eq!(decoded.beamline.text("name").as_deref(), Some("BM23"));
        assert_eq!(
            decoded.data.get("energy").map(UnitValue::unit).map(ToString::to_string),
            Some("keV".to_string())
        );
    }
}
