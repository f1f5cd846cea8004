//! End-to-end resolution of inclusions and module imports.

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::thread;
use std::time::Duration;

use inox_common::MemoryFs;
use inox_module::{
    parse_local_module, sha256_hex, Context, HttpClient, HttpGetOptions, ModuleError, ModuleParsingConfig,
    ModuleResult, PermissionSet,
};
use inox_syntax::ChunkCache;
use pretty_assertions::assert_eq;

fn config_with(fs: MemoryFs) -> ModuleParsingConfig {
    ModuleParsingConfig::new(Context::new(Arc::new(fs)))
}

// ═══════════════════════════════════════════════════════════════════════════
// Inclusions
// ═══════════════════════════════════════════════════════════════════════════

#[test]
fn test_single_inclusion() {
    let fs = MemoryFs::new()
        .with_file("/main.ix", "manifest {}\nimport ./dep.ix")
        .with_file("/dep.ix", "includable-file\n\nfn f(){}");

    let module = parse_local_module("/main.ix", &config_with(fs)).unwrap();
    assert!(module.errors.is_empty(), "{:?}", module.errors);
    assert_eq!(module.included_chunk_forest.len(), 1);
    assert_eq!(module.flattened_included_chunks.len(), 1);
    assert_eq!(module.included_chunk_forest[0].name(), "/dep.ix");
    assert!(module.included_chunks.contains_key("/dep.ix"));
    assert_eq!(module.inclusion_statements.len(), 1);
}

#[test]
fn test_duplicate_inclusion() {
    let fs = MemoryFs::new()
        .with_file("/main.ix", "manifest {}\nimport ./dep.ix\nimport ./dep.ix")
        .with_file("/dep.ix", "includable-file");

    let module = parse_local_module("/main.ix", &config_with(fs)).unwrap();
    assert_eq!(module.flattened_included_chunks.len(), 1);
    assert_eq!(module.errors.len(), 1);
    assert!(matches!(module.errors[0].error, ModuleError::FileAlreadyIncluded(_)));
    assert_eq!(module.errors[0].location.to_string(), "/main.ix:3:1: ");
}

#[test]
fn test_nested_duplicate_inclusion() {
    let fs = MemoryFs::new()
        .with_file("/main.ix", "manifest {}\nimport ./dep1.ix")
        .with_file("/dep1.ix", "includable-file\nimport ./dep2.ix\nimport ./dep2.ix")
        .with_file("/dep2.ix", "includable-file");

    let module = parse_local_module("/main.ix", &config_with(fs)).unwrap();
    assert_eq!(module.flattened_included_chunks.len(), 2);
    assert_eq!(module.included_chunk_forest.len(), 1);
    assert_eq!(module.included_chunk_forest[0].forest.len(), 1);

    let locations: Vec<String> = module.errors.iter().map(|e| e.location.to_string()).collect();
    assert_eq!(locations, vec!["/main.ix:2:1: /dep1.ix:3:1: ", "/main.ix:2:1: "]);
    assert!(module
        .errors
        .iter()
        .all(|e| matches!(e.error, ModuleError::FileAlreadyIncluded(_))));
}

#[test]
fn test_inclusion_cycle_is_a_duplicate() {
    let fs = MemoryFs::new()
        .with_file("/main.ix", "manifest {}\nimport ./a.ix")
        .with_file("/a.ix", "includable-file\nimport ./b.ix")
        .with_file("/b.ix", "includable-file\nimport ./a.ix");

    let module = parse_local_module("/main.ix", &config_with(fs)).unwrap();
    assert_eq!(module.flattened_included_chunks.len(), 2);
    assert!(module
        .errors
        .iter()
        .any(|e| matches!(e.error, ModuleError::FileAlreadyIncluded(ref p) if p == "/a.ix")));
}

#[test]
fn test_included_file_with_manifest() {
    let fs = MemoryFs::new()
        .with_file("/main.ix", "manifest {}\nimport ./dep.ix")
        .with_file("/dep.ix", "manifest {}");

    let module = parse_local_module("/main.ix", &config_with(fs)).unwrap();
    assert!(module.included_chunk_forest.is_empty());
    assert_eq!(module.errors.len(), 1);
    assert!(matches!(module.errors[0].error, ModuleError::NotAnIncludableFile(_)));
}

#[test]
fn test_included_file_without_marker() {
    let fs = MemoryFs::new()
        .with_file("/main.ix", "manifest {}\nimport ./dep.ix")
        .with_file("/dep.ix", "fn f(){}");

    let module = parse_local_module("/main.ix", &config_with(fs)).unwrap();
    assert_eq!(module.included_chunk_forest.len(), 1);
    assert_eq!(module.errors.len(), 1);
    assert!(matches!(module.errors[0].error, ModuleError::MissingIncludableMarker(_)));
}

#[test]
fn test_missing_included_file() {
    let fs = || MemoryFs::new().with_file("/main.ix", "manifest {}\nimport ./dep.ix");

    let err = parse_local_module("/main.ix", &config_with(fs())).unwrap_err();
    assert!(err.is_not_found());

    let config = config_with(fs()).recover_from_non_existing_files(true);
    let module = parse_local_module("/main.ix", &config).unwrap();
    assert_eq!(module.errors.len(), 1);
    assert!(matches!(module.errors[0].error, ModuleError::FileToIncludeDoesNotExist(_)));
}

#[test]
fn test_dot_dot_in_inclusion_path() {
    let fs = MemoryFs::new()
        .with_file("/dir/main.ix", "manifest {}\nimport ../dep.ix")
        .with_file("/dep.ix", "includable-file");

    let err = parse_local_module("/dir/main.ix", &config_with(fs)).unwrap_err();
    assert!(matches!(err, ModuleError::IncludedPathContainsDotDot));
}

#[test]
fn test_chunk_cache_is_shared() {
    let fs = MemoryFs::new()
        .with_file("/main.ix", "manifest {}\nimport ./dep.ix")
        .with_file("/dep.ix", "includable-file");
    let cache = Arc::new(ChunkCache::new());
    let config = config_with(fs).with_chunk_cache(cache.clone());

    let first = parse_local_module("/main.ix", &config).unwrap();
    let second = parse_local_module("/main.ix", &config).unwrap();
    assert!(Arc::ptr_eq(&first.main_chunk, &second.main_chunk));
    assert!(Arc::ptr_eq(
        &first.included_chunk_forest[0].chunk,
        &second.included_chunk_forest[0].chunk
    ));
    assert_eq!(cache.len(), 2);
}

// ═══════════════════════════════════════════════════════════════════════════
// Module imports
// ═══════════════════════════════════════════════════════════════════════════

#[test]
fn test_module_import() {
    let fs = MemoryFs::new()
        .with_file("/main.ix", "manifest {}\nimport lib ./lib.ix {}\nimport lib2 /lib.ix {}")
        .with_file("/lib.ix", "manifest {}\nreturn 1");

    let module = parse_local_module("/main.ix", &config_with(fs)).unwrap();
    assert!(module.errors.is_empty(), "{:?}", module.errors);
    assert_eq!(module.imported_modules.len(), 1);
    assert_eq!(module.imported_modules_by_statement.len(), 2);
    assert_eq!(module.imported_modules["/lib.ix"].name(), "/lib.ix");
}

#[test]
fn test_imported_module_errors_are_relocated() {
    let fs = MemoryFs::new()
        .with_file("/main.ix", "manifest {}\nimport res ./lib.ix {}")
        .with_file("/lib.ix", "manifest {}\nvar = 1");

    let module = parse_local_module("/main.ix", &config_with(fs)).unwrap();
    assert_eq!(module.errors.len(), 1);
    assert_eq!(module.errors[0].location.len(), 2);
    assert!(module.errors[0].location.to_string().starts_with("/main.ix:2:1: /lib.ix:2:"));
    assert_eq!(module.file_level_parsing_errors.len(), 1);
}

#[test]
fn test_missing_imported_module() {
    let fs = || MemoryFs::new().with_file("/main.ix", "manifest {}\nimport res ./lib.ix {}");

    let err = parse_local_module("/main.ix", &config_with(fs())).unwrap_err();
    assert!(err.is_not_found());

    let config = config_with(fs()).recover_from_non_existing_files(true);
    let module = parse_local_module("/main.ix", &config).unwrap();
    assert!(module.imported_modules.is_empty());
    assert_eq!(module.errors.len(), 1);
    assert!(matches!(module.errors[0].error, ModuleError::ImportedModuleDoesNotExist(_)));
}

#[test]
fn test_import_without_extension() {
    let fs = MemoryFs::new()
        .with_file("/main.ix", "manifest {}\nimport res ./lib {}")
        .with_file("/lib", "manifest {}");

    let err = parse_local_module("/main.ix", &config_with(fs)).unwrap_err();
    assert!(matches!(err, ModuleError::InvalidImport(_)));
}

#[test]
fn test_max_import_depth() {
    let fs = || {
        let fs = MemoryFs::new();
        for i in 0..6 {
            fs.add_file(format!("/m{}.ix", i), format!("manifest {{}}\nimport next ./m{}.ix {{}}", i + 1));
        }
        fs.add_file("/m6.ix", "manifest {}");
        fs
    };

    let err = parse_local_module("/m0.ix", &config_with(fs())).unwrap_err();
    assert!(err.is_max_depth_exceeded(), "{}", err);

    let config = config_with(fs()).with_max_import_depth(6);
    let module = parse_local_module("/m0.ix", &config).unwrap();
    assert!(module.errors.is_empty());
}

#[test]
fn test_self_import() {
    for code in ["manifest {}\nimport m /main.ix {}", "manifest {}\nimport m ./main.ix {}"] {
        let fs = MemoryFs::new().with_file("/main.ix", code);
        let err = parse_local_module("/main.ix", &config_with(fs)).unwrap_err();
        assert!(err.is_import_cycle(), "{}", err);
    }
}

#[test]
fn test_mutual_import() {
    let fs = MemoryFs::new()
        .with_file("/a.ix", "manifest {}\nimport b ./b.ix {}")
        .with_file("/b.ix", "manifest {}\nimport a ./a.ix {}");

    let err = parse_local_module("/a.ix", &config_with(fs)).unwrap_err();
    assert!(err.is_import_cycle(), "{}", err);
}

#[test]
fn test_validation_mismatch() {
    let fs = MemoryFs::new()
        .with_file("/main.ix", "manifest {}\nimport lib ./lib.ix {validation: \"0000\"}")
        .with_file("/lib.ix", "manifest {}");

    let err = parse_local_module("/main.ix", &config_with(fs)).unwrap_err();
    assert!(matches!(err, ModuleError::ValidationFailed(_)), "{}", err);
}

#[test]
fn test_validation_match() {
    let lib = "manifest {}";
    let main = format!("manifest {{}}\nimport lib ./lib.ix {{validation: \"{}\"}}", sha256_hex(lib.as_bytes()));
    let fs = MemoryFs::new().with_file("/main.ix", main).with_file("/lib.ix", lib);

    let module = parse_local_module("/main.ix", &config_with(fs)).unwrap();
    assert_eq!(module.imported_modules.len(), 1);
}

#[test]
fn test_permission_denied() {
    let fs = MemoryFs::new()
        .with_file("/main.ix", "manifest {}\nimport lib ./lib.ix {}")
        .with_file("/lib.ix", "manifest {}");
    let ctx = Context::new(Arc::new(fs)).with_permissions(PermissionSet::new().allow_fs_read("/main.ix"));

    let err = parse_local_module("/main.ix", &ModuleParsingConfig::new(ctx)).unwrap_err();
    assert!(matches!(err, ModuleError::PermissionDenied(_)));
}

#[derive(Debug)]
struct StaticHttp(Vec<(&'static str, &'static str)>);

impl HttpClient for StaticHttp {
    fn get(&self, url: &str, _options: HttpGetOptions) -> ModuleResult<Vec<u8>> {
        self.0
            .iter()
            .find(|(u, _)| *u == url)
            .map(|(_, body)| body.as_bytes().to_vec())
            .ok_or_else(|| ModuleError::Retrieval(format!("no such url: {}", url)))
    }
}

#[test]
fn test_url_import_with_relative_sub_import() {
    let fs = MemoryFs::new().with_file("/main.ix", "manifest {}\nimport lib https://example.com/lib/a.ix {}");
    let http = StaticHttp(vec![
        ("https://example.com/lib/a.ix", "manifest {}\nimport b ./b.ix {}"),
        ("https://example.com/lib/b.ix", "manifest {}"),
    ]);
    let config = config_with(fs).with_http_client(http);

    let module = parse_local_module("/main.ix", &config).unwrap();
    assert!(module.errors.is_empty(), "{:?}", module.errors);
    let lib = &module.imported_modules["https://example.com/lib/a.ix"];
    assert!(lib.has_url_source());
    assert!(lib.imported_modules.contains_key("https://example.com/lib/b.ix"));
}

/// Serves one URL slowly and counts how many times it is requested.
#[derive(Debug)]
struct CountingHttp {
    pages: Vec<(&'static str, String)>,
    counted_url: &'static str,
    hits: Arc<AtomicUsize>,
}

impl HttpClient for CountingHttp {
    fn get(&self, url: &str, _options: HttpGetOptions) -> ModuleResult<Vec<u8>> {
        if url == self.counted_url {
            self.hits.fetch_add(1, Ordering::SeqCst);
            thread::sleep(Duration::from_millis(200));
        }
        self.pages
            .iter()
            .find(|(u, _)| *u == url)
            .map(|(_, body)| body.as_bytes().to_vec())
            .ok_or_else(|| ModuleError::Retrieval(format!("no such url: {}", url)))
    }
}

#[test]
fn test_shared_validated_import_is_fetched_once() {
    const SHARED: &str = "manifest {}";
    let hash = sha256_hex(SHARED.as_bytes());
    let importer = format!("manifest {{}}\nimport d ./d.ix {{validation: \"{}\"}}", hash);

    let fs = MemoryFs::new().with_file(
        "/a.ix",
        "manifest {}\nimport b https://e.com/b.ix {}\nimport c https://e.com/c.ix {}",
    );
    let hits = Arc::new(AtomicUsize::new(0));
    let http = CountingHttp {
        pages: vec![
            ("https://e.com/b.ix", importer.clone()),
            ("https://e.com/c.ix", importer),
            ("https://e.com/d.ix", SHARED.to_string()),
        ],
        counted_url: "https://e.com/d.ix",
        hits: hits.clone(),
    };
    let config = config_with(fs).with_http_client(http);

    let module = parse_local_module("/a.ix", &config).unwrap();
    assert!(module.errors.is_empty(), "{:?}", module.errors);
    assert!(module.imported_modules["https://e.com/b.ix"]
        .imported_modules
        .contains_key("https://e.com/d.ix"));
    assert!(module.imported_modules["https://e.com/c.ix"]
        .imported_modules
        .contains_key("https://e.com/d.ix"));
    assert_eq!(hits.load(Ordering::SeqCst), 1);
}

#[test]
fn test_absolute_path_in_url_module() {
    let fs = MemoryFs::new().with_file("/main.ix", "manifest {}\nimport lib https://example.com/a.ix {}");
    let http = StaticHttp(vec![("https://example.com/a.ix", "manifest {}\nimport b /b.ix {}")]);
    let config = config_with(fs).with_http_client(http);

    let err = parse_local_module("/main.ix", &config).unwrap_err();
    assert!(matches!(err, ModuleError::AbsolutePathInUrlModule));
}

#[test]
fn test_real_filesystem() {
    let dir = tempfile::tempdir().unwrap();
    std::fs::write(dir.path().join("main.ix"), "manifest {}\nimport ./dep.ix\nimport lib ./lib.ix {}").unwrap();
    std::fs::write(dir.path().join("dep.ix"), "includable-file").unwrap();
    std::fs::write(dir.path().join("lib.ix"), "manifest {}").unwrap();

    let module = parse_local_module(dir.path().join("main.ix"), &ModuleParsingConfig::default()).unwrap();
    assert!(module.errors.is_empty(), "{:?}", module.errors);
    assert_eq!(module.included_chunk_forest.len(), 1);
    assert_eq!(module.imported_modules.len(), 1);
}
