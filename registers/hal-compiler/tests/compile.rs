// Licensed under the Apache-2.0 license

//! End-to-end runs of `compile` over real directory trees.

use log::LevelFilter;
use registers_hal_compiler::{compile, CompileRequest, HalError, ParseErrorKind};
use simple_logger::SimpleLogger;
use std::fs;
use std::path::{Path, PathBuf};
use tempfile::TempDir;

const HEADERS: [&str; 6] = [
    "dev_bus.h",
    "dev_fb.h",
    "dev_graphics.h",
    "dev_master.h",
    "dev_pri.h",
    "dev_disp.h",
];

const DEVICES: &str = r#"
[[device]]
name = "gp100"
header_dir = "pascal/gp100"

[[device]]
name = "gp100b"
header_dir = "pascal/gp100"

[[device]]
name = "gv100"
header_dir = "volta/gv100"
"#;

struct Tree {
    dir: TempDir,
}

impl Tree {
    fn new(dsl: &str) -> Self {
        let _ = SimpleLogger::new().with_level(LevelFilter::Debug).init();
        let tree = Self {
            dir: TempDir::new().unwrap(),
        };
        tree.write("defs/registers.def", dsl);
        tree.write("defs/devices.toml", DEVICES);
        fs::create_dir_all(tree.path("drivers")).unwrap();
        tree
    }

    fn path(&self, rel: &str) -> PathBuf {
        self.dir.path().join(rel)
    }

    fn write(&self, rel: &str, contents: &str) {
        let path = self.path(rel);
        fs::create_dir_all(path.parent().unwrap()).unwrap();
        fs::write(path, contents).unwrap();
    }

    /// Writes every default header for `dir` under `root`, `dev_bus.h`
    /// holding `defines`.
    fn headers(&self, root: &str, dir: &str, defines: &str) {
        for header in HEADERS {
            let contents = if header == "dev_bus.h" { defines } else { "" };
            self.write(&format!("drivers/{root}/{dir}/{header}"), contents);
        }
    }

    fn request(&self, dest: &str) -> CompileRequest {
        CompileRequest::new(
            &self.path("defs/registers.def"),
            &self.path("defs/devices.toml"),
            &self.path("drivers"),
            &self.path(dest),
        )
    }

    fn read(&self, rel: &str) -> String {
        fs::read_to_string(self.path(rel)).unwrap()
    }
}

#[test]
fn test_table_and_dependencies() {
    let tree = Tree::new("LW_FOO\n    _A\n");
    tree.headers("hw/inc", "pascal/gp100", "#define LW_FOO_A 0x100\n");
    let request = tree
        .request("out/lwhal_table_gp100.c")
        .dependencies_file(&tree.path("out/lwhal_table_gp100.d"));
    compile(&request).unwrap();

    let table = tree.read("out/lwhal_table_gp100.c");
    assert_eq!(table.matches("/* LWHAL_FOO_A */").count(), 1);
    assert!(table.contains("#if defined(LW_FOO_A) && !defined(LW_FOO_A__SIZE_1)\n"));
    assert!(table.contains("LWHAL_FIELD(LW_FOO_A), 0),\n#elif defined(LW_FOO_A)\n"));
    assert!(!table.contains("/* LWHAL_FOO */"));
    assert!(table.contains("LWHAL_REGISTER_TABLE(gp100, lwhalTable_gp100);"));
    assert!(table.contains("LWHAL_REGISTER_TABLE(gp100b, lwhalTable_gp100);"));

    let deps = tree.read("out/lwhal_table_gp100.d");
    let table_path = tree.path("out/lwhal_table_gp100.c");
    assert!(deps.starts_with(&format!("{}:", table_path.display())));
    assert!(deps.contains(&format!("{}:\n", tree.path("defs/registers.def").display())));
    for header in HEADERS {
        let path = tree.path(&format!("drivers/hw/inc/pascal/gp100/{header}"));
        assert!(deps.contains(&format!("{}:\n", path.display())), "{header}");
    }
}

#[test]
fn test_deps_artifact_uses_fallback_root() {
    let tree = Tree::new("LW_FOO\n");
    tree.headers("hw/inc/published", "pascal/gp100", "#define LW_FOO 0x0\n");
    compile(&tree.request("out/lwhal_table_gp100.d")).unwrap();

    let deps = tree.read("out/lwhal_table_gp100.d");
    assert!(deps.starts_with(&format!(
        "{}:",
        tree.path("out/lwhal_table_gp100.c").display()
    )));
    assert!(deps.contains("hw/inc/published/pascal/gp100/dev_bus.h"));
}

#[test]
fn test_display_header_from_display_dir() {
    let tree = Tree::new("LW_PDISP_CAPS\n");
    tree.write(
        "defs/devices.toml",
        "[[device]]\nname = \"gv100\"\nheader_dir = \"volta/gv100\"\ndisplay_dir = \"disp/v03_00\"\n",
    );
    for header in HEADERS.iter().filter(|h| **h != "dev_disp.h") {
        tree.write(&format!("drivers/hw/inc/volta/gv100/{header}"), "");
    }
    tree.write(
        "drivers/hw/inc/disp/v03_00/dev_disp.h",
        "#define LW_PDISP_CAPS 0x610000\n",
    );
    let request = tree
        .request("out/lwhal_table_gv100.c")
        .dependencies_file(&tree.path("out/lwhal_table_gv100.d"));
    compile(&request).unwrap();

    let table = tree.read("out/lwhal_table_gv100.c");
    assert!(table.contains("/* LWHAL_PDISP_CAPS */"));
    assert!(table.contains("LWHAL_CAP_NONE, LW_PDISP_CAPS, 0),"));
    let deps = tree.read("out/lwhal_table_gv100.d");
    let disp = tree.path("drivers/hw/inc/disp/v03_00/dev_disp.h");
    assert!(deps.contains(&format!("{}:\n", disp.display())), "{deps}");
    assert!(!deps.contains("volta/gv100/dev_disp.h"));
}

#[test]
fn test_duplicate_and_headerless_devices_get_stubs() {
    let tree = Tree::new("LW_FOO\n");
    tree.headers("hw/inc", "pascal/gp100", "#define LW_FOO 0x0\n");

    compile(&tree.request("out/lwhal_table_gp100b.c")).unwrap();
    let stub = tree.read("out/lwhal_table_gp100b.c");
    assert!(stub.contains("No register table for gp100b: shares the table of gp100."));
    assert!(!stub.contains("LWHAL_ROW"));

    compile(&tree.request("out/lwhal_table_gv100.c")).unwrap();
    assert!(tree
        .read("out/lwhal_table_gv100.c")
        .contains("No register table for gv100: no register headers."));
}

#[test]
fn test_unknown_device_writes_nothing() {
    let tree = Tree::new("LW_FOO\n");
    let result = compile(&tree.request("out/lwhal_table_tu102.c"));
    assert!(matches!(result, Err(HalError::UnknownDevice(name)) if name == "tu102"));
    assert!(!tree.path("out/lwhal_table_tu102.c").exists());
}

#[test]
fn test_identity_headers() {
    let tree = Tree::new("LW_A\n  _X\n    _ON\nLW_B\n");
    compile(&tree.request("inc/lwhal_addr_ids.h")).unwrap();
    compile(&tree.request("inc/lwhal_field_ids.h")).unwrap();

    let addrs = tree.read("inc/lwhal_addr_ids.h");
    assert!(addrs.contains("#define LWHAL_A 0x40010000\n#define LWHAL_B 0x40020000\n"));
    let fields = tree.read("inc/lwhal_field_ids.h");
    assert!(fields.contains("#define LWHAL_A_X 0x80010100\n"));
}

#[test]
fn test_ids_are_stable_across_runs() {
    let tree = Tree::new("LW_A 4\n  _X\nLW_B\n  _Y 2\n    _Z\n");
    compile(&tree.request("one/lwhal_value_ids.h")).unwrap();
    compile(&tree.request("two/lwhal_value_ids.h")).unwrap();
    assert_eq!(
        tree.read("one/lwhal_value_ids.h"),
        tree.read("two/lwhal_value_ids.h")
    );
}

#[test]
fn test_bindings_omit_unknown_symbols() {
    let tree = Tree::new("LW_A\n  _X\nLW_B\n");
    tree.write("defs/allowlist.txt", "LWHAL_A_X\nLWHAL_B\nLWHAL_NOT_COMPILED\n");
    compile(&tree.request("py/lwhal_bindings.py")).unwrap();

    let bindings = tree.read("py/lwhal_bindings.py");
    assert!(bindings.contains("    \"A_X\": 0x8001_0100,\n    \"B\": 0x4002_0000,\n}\n"));
    assert!(!bindings.contains("NOT_COMPILED"));
}

#[test]
fn test_unordered_allow_list_is_fatal() {
    let tree = Tree::new("LW_A\nLW_B\n");
    tree.write("lists/exports.txt", "# exports\nLWHAL_B\nLWHAL_A\n");
    let request = tree
        .request("py/lwhal_bindings.py")
        .allow_list(&tree.path("lists/exports.txt"));
    match compile(&request) {
        Err(HalError::Parse { path, error }) => {
            assert_eq!(path, tree.path("lists/exports.txt"));
            assert_eq!(error.line, 3);
        }
        other => panic!("expected allow-list error, got {other:?}"),
    }
    assert!(!tree.path("py/lwhal_bindings.py").exists());
}

#[test]
fn test_dsl_error_reports_line_and_writes_nothing() {
    let tree = Tree::new("LW_B\nLW_A\n");
    match compile(&tree.request("inc/lwhal_addr_ids.h")) {
        Err(HalError::Parse { path, error }) => {
            assert_eq!(path, tree.path("defs/registers.def"));
            assert_eq!(error.line, 2);
            assert_eq!(error.text, "LW_A");
            assert!(matches!(error.kind, ParseErrorKind::OutOfOrder { .. }));
        }
        other => panic!("expected parse error, got {other:?}"),
    }
    assert!(!tree.path("inc/lwhal_addr_ids.h").exists());
}

#[test]
fn test_macro_cycle_is_fatal() {
    let tree = Tree::new("LW_A\n");
    tree.headers("hw/inc", "pascal/gp100", "#define LW_A LW_B\n#define LW_B LW_A\n");
    let result = compile(&tree.request("out/lwhal_table_gp100.c"));
    assert!(matches!(result, Err(HalError::MacroCycle(_))));
    assert!(!tree.path("out/lwhal_table_gp100.c").exists());
}

#[test]
fn test_config_file_narrows_headers() {
    let tree = Tree::new("LWX_PMC\n");
    tree.write(
        "defs/hal.toml",
        "source_prefix = \"LWX_\"\nheader_files = [\"dev_master.h\"]\n",
    );
    tree.write(
        "drivers/hw/inc/volta/gv100/dev_master.h",
        "#define LWX_PMC 0x0 /* RW-4R */\n",
    );
    let request = tree
        .request("out/lwhal_table_gv100.c")
        .config(&tree.path("defs/hal.toml"));
    compile(&request).unwrap();
    let table = tree.read("out/lwhal_table_gv100.c");
    assert!(table.contains("/* LWHAL_PMC */"));
    assert!(table.contains("LWHAL_CAP_NONE, LWX_PMC, 0),"));
}

#[test]
fn test_missing_drivers_root() {
    let tree = Tree::new("LW_A\n");
    let request = CompileRequest::new(
        &tree.path("defs/registers.def"),
        &tree.path("defs/devices.toml"),
        Path::new("/nonexistent/drivers"),
        &tree.path("inc/lwhal_addr_ids.h"),
    );
    assert!(matches!(
        compile(&request),
        Err(HalError::MissingDriversRoot(_))
    ));
}
