mod common;

use crate::common::{Counting, local_generator, write_class, write_jar};
use resrc::{Cancellation, Effort, Generated, Position, SourceGenerator};
use resrc_cache::{CacheKey, ContentCache, ContentHash, FORMAT_VERSION};
use resrc_classpath::{BinaryRoot, ClassPath, SymbolRef};
use resrc_storage::backend::{LocalBackend, MockBackend};
use std::cell::RefCell;
use std::path::Path;
use std::sync::Arc;

fn symbol(s: &str) -> SymbolRef {
    SymbolRef::parse(s).unwrap()
}

fn directory(path: &Path) -> BinaryRoot {
    BinaryRoot::new(path).unwrap()
}

#[test]
fn test_end_to_end() {
    let dir = tempfile::tempdir().unwrap();
    let (r1, r2) = (dir.path().join("r1"), dir.path().join("r2"));
    write_class(&r1, "Foo.class", b"foo from r1");
    write_class(&r2, "Foo.class", b"foo from r2");
    let classpath = ClassPath::new([directory(&r1), directory(&r2)]);
    let cache_dir = dir.path().join("cache");
    let (engine, generator) = local_generator(&cache_dir);

    let first = generator.generate(&classpath, &symbol("Foo"), &Cancellation::new()).unwrap();
    assert_eq!(engine.calls(), 1);
    assert_eq!(first.effort, Effort::Generated);
    assert_eq!(first.diagnostics.len(), 1);

    let key = CacheKey::for_root(&directory(&r1));
    let file = cache_dir.join("gensrc").join(key.as_str()).join("Foo.java");
    assert_eq!(generator.local_path(&first), Some(file.clone()));
    let text = std::fs::read_to_string(&file).unwrap();
    assert!(text.contains("// foo from r1"));
    assert!(std::fs::metadata(&file).unwrap().permissions().readonly());

    let sidecar: serde_json::Value =
        serde_json::from_slice(&std::fs::read(cache_dir.join("gensrc").join(key.as_str()).join("Foo.java.attrs")).unwrap())
            .unwrap();
    let expected = ContentHash::compute(&FORMAT_VERSION, b"foo from r1");
    assert_eq!(sidecar["origin-hash"], expected.as_str());
    assert_eq!(sidecar["disable-java-errors"], true);
    assert_eq!(sidecar["classfile-root"], directory(&r1).url().unwrap().as_str());
    assert_eq!(sidecar["classfile-binaryName"], "Foo");

    let second = generator.generate(&classpath, &symbol("Foo"), &Cancellation::new()).unwrap();
    assert_eq!(engine.calls(), 1);
    assert_eq!(second.effort, Effort::Reused);
    assert_eq!(second.artifact, first.artifact);
    assert_eq!(std::fs::read_to_string(&file).unwrap(), text);
}

#[test]
fn test_invalidation() {
    let dir = tempfile::tempdir().unwrap();
    let classes = dir.path().join("classes");
    write_class(&classes, "a/Foo.class", b"version one");
    let classpath = ClassPath::new([directory(&classes)]);
    let (engine, generator) = local_generator(&dir.path().join("cache"));

    let before = generator.generate(&classpath, &symbol("a.Foo"), &Cancellation::new()).unwrap();
    let before_text = generator.cache().read_text(&before.artifact).unwrap();

    write_class(&classes, "a/Foo.class", b"version two");
    let after = generator.generate(&classpath, &symbol("a.Foo"), &Cancellation::new()).unwrap();
    let after_text = generator.cache().read_text(&after.artifact).unwrap();

    assert_eq!(engine.calls(), 2);
    assert_eq!(after.effort, Effort::Regenerated);
    assert_eq!(after.artifact.path, before.artifact.path);
    assert_ne!(after.artifact.attributes.origin_hash, before.artifact.attributes.origin_hash);
    assert_ne!(after_text, before_text);
    assert!(after_text.contains("// version two"));
}

#[test]
fn test_root_ordering_with_archive() {
    let dir = tempfile::tempdir().unwrap();
    let jar = dir.path().join("lib.jar");
    write_jar(&jar, &[("a/Foo.class", b"from jar"), ("a/Foo$Inner.class", b"inner")]);
    let classes = dir.path().join("classes");
    write_class(&classes, "a/Foo.class", b"from classes");
    let (engine, generator) = local_generator(&dir.path().join("cache"));

    let jar_first = ClassPath::new([directory(&jar), directory(&classes)]);
    let generated = generator.generate(&jar_first, &symbol("a.Foo#run()"), &Cancellation::new()).unwrap();
    assert_eq!(generated.artifact.key, CacheKey::for_root(&BinaryRoot::Archive(jar.clone())));
    assert_eq!(generated.artifact.attributes.classfile_root.scheme(), "jar");
    assert!(generator.cache().read_text(&generated.artifact).unwrap().contains("// from jar"));
    assert_eq!(engine.companions(), vec!["a/Foo$Inner.class"]);

    let classes_first = ClassPath::new([directory(&classes), directory(&jar)]);
    let generated = generator.generate(&classes_first, &symbol("a.Foo"), &Cancellation::new()).unwrap();
    assert_eq!(generated.artifact.key, CacheKey::for_root(&directory(&classes)));
    assert!(generator.cache().read_text(&generated.artifact).unwrap().contains("// from classes"));
    assert!(engine.companions().is_empty());
}

#[test]
fn test_partition_isolation() {
    let dir = tempfile::tempdir().unwrap();
    let (left, right) = (dir.path().join("left"), dir.path().join("right"));
    write_class(&left, "a/Foo.class", b"left");
    write_class(&right, "a/Foo.class", b"right");
    let (engine, generator) = local_generator(&dir.path().join("cache"));

    let from_left = generator
        .generate(&ClassPath::new([directory(&left)]), &symbol("a.Foo"), &Cancellation::new())
        .unwrap();
    let from_right = generator
        .generate(&ClassPath::new([directory(&right)]), &symbol("a.Foo"), &Cancellation::new())
        .unwrap();
    assert_eq!(engine.calls(), 2);
    assert_ne!(from_left.artifact.path, from_right.artifact.path);
    assert!(generator.cache().read_text(&from_left.artifact).unwrap().contains("// left"));
    assert!(generator.cache().read_text(&from_right.artifact).unwrap().contains("// right"));

    // Both survive: neither generation touched the other partition.
    let again = generator
        .generate(&ClassPath::new([directory(&left)]), &symbol("a.Foo"), &Cancellation::new())
        .unwrap();
    assert_eq!(again.effort, Effort::Reused);
    assert_eq!(generator.cache().list(None).unwrap().len(), 2);
    assert_eq!(generator.cache().list(Some(&from_left.artifact.key)).unwrap(), vec![from_left.artifact]);
}

#[test]
fn test_format_version_bump() {
    let dir = tempfile::tempdir().unwrap();
    let classes = dir.path().join("classes");
    write_class(&classes, "a/Foo.class", b"foo");
    let classpath = ClassPath::new([directory(&classes)]);
    let backend = Arc::new(LocalBackend::new("cache", dir.path().join("cache")).unwrap());
    let engine = Arc::new(Counting::default());

    let old = SourceGenerator::new(ContentCache::new(backend.clone()), engine.clone());
    let before = old.generate(&classpath, &symbol("a.Foo"), &Cancellation::new()).unwrap();
    assert_eq!(old.generate(&classpath, &symbol("a.Foo"), &Cancellation::new()).unwrap().effort, Effort::Reused);

    let bumped = SourceGenerator::new(ContentCache::new(backend).with_format_version([0xFF, 0x02]), engine.clone());
    let after = bumped.generate(&classpath, &symbol("a.Foo"), &Cancellation::new()).unwrap();
    assert_eq!(after.effort, Effort::Regenerated);
    assert_ne!(after.artifact.attributes.origin_hash, before.artifact.attributes.origin_hash);
    assert_eq!(engine.calls(), 2);
}

#[test]
fn test_concurrent_requests_regenerate_once() {
    let dir = tempfile::tempdir().unwrap();
    let classes = dir.path().join("classes");
    write_class(&classes, "a/Foo.class", b"foo");
    let classpath = ClassPath::new([directory(&classes)]);
    let backend = Arc::new(MockBackend::default());
    let engine = Arc::new(Counting::default());
    let generator = SourceGenerator::new(ContentCache::new(backend.clone()), engine.clone());

    let results: Vec<Option<Generated>> = std::thread::scope(|scope| {
        let handles: Vec<_> = (0..8)
            .map(|_| scope.spawn(|| generator.generate(&classpath, &symbol("a.Foo"), &Cancellation::new())))
            .collect();
        handles.into_iter().map(|h| h.join().unwrap()).collect()
    });
    assert!(results.iter().all(Option::is_some));
    assert_eq!(engine.calls(), 1);
    // Source text and sidecar.
    assert_eq!(backend.writes(), 2);
}

#[test]
fn test_open_positions() {
    let dir = tempfile::tempdir().unwrap();
    let classes = dir.path().join("classes");
    write_class(&classes, "a/Foo.class", b"foo");
    let classpath = ClassPath::new([directory(&classes)]);
    let (_engine, generator) = local_generator(&dir.path().join("cache"));
    let opened = RefCell::new(Vec::new());
    let opener = |generated: &Generated, position: Position| {
        opened.borrow_mut().push((generated.artifact.binary_name.to_string(), position));
        true
    };

    assert!(resrc::open(&generator, &classpath, &symbol("a.Foo#run()"), &Cancellation::new(), &opener));
    assert!(resrc::open(&generator, &classpath, &symbol("a.Foo#missing()"), &Cancellation::new(), &opener));
    assert!(resrc::open(&generator, &classpath, &symbol("a.Foo$1"), &Cancellation::new(), &opener));
    assert!(!resrc::open(&generator, &classpath, &symbol("a.Bar"), &Cancellation::new(), &opener));
    assert!(!resrc::open(&generator, &classpath, &symbol("package:a"), &Cancellation::new(), &opener));

    let opened = opened.into_inner();
    assert_eq!(opened.len(), 3);
    assert!(opened.iter().all(|(name, _)| name == "a/Foo"));
    assert_eq!((opened[0].1.line, opened[0].1.column), (10, 5));
    assert_eq!(opened[1].1, Position::START);
    assert_eq!((opened[2].1.line, opened[2].1.column), (6, 1));
}

#[test]
fn test_open_cancelled() {
    let dir = tempfile::tempdir().unwrap();
    let classes = dir.path().join("classes");
    write_class(&classes, "a/Foo.class", b"foo");
    let classpath = ClassPath::new([directory(&classes)]);
    let (engine, generator) = local_generator(&dir.path().join("cache"));
    let cancel = Cancellation::new();
    cancel.cancel();
    let opener = |_: &Generated, _: Position| -> bool { panic!("opened after cancellation") };
    assert!(!resrc::open(&generator, &classpath, &symbol("a.Foo"), &cancel, &opener));
    assert_eq!(engine.calls(), 0);
    assert!(generator.cache().list(None).unwrap().is_empty());
}
