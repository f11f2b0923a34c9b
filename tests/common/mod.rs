#![allow(dead_code)]

use resrc::SourceGenerator;
use resrc_cache::ContentCache;
use resrc_classpath::BinaryName;
use resrc_decompile::error::Result as DecompileResult;
use resrc_decompile::{ClassFileSource, Decompiler, Output, ResultCollector, SinkType};
use resrc_storage::backend::LocalBackend;
use std::io::Write;
use std::path::Path;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

/// Writes the class bytes into a comment of an otherwise fixed class body, so
/// the text changes whenever the bytes do.
#[derive(Default)]
pub struct Counting {
    calls: AtomicUsize,
    companions: Mutex<Vec<String>>,
}

impl Counting {
    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }

    /// Companion class files offered with the last class.
    pub fn companions(&self) -> Vec<String> {
        self.companions.lock().unwrap().clone()
    }
}

impl Decompiler for Counting {
    fn name(&self) -> &str {
        "counting"
    }

    fn decompile(
        &self,
        bytes: &[u8],
        name: &BinaryName,
        source: &dyn ClassFileSource,
        sink: &mut ResultCollector,
    ) -> DecompileResult<()> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        *self.companions.lock().unwrap() = source.companions(name)?.into_iter().map(|c| c.resource).collect();
        let package = name.package().map(|p| format!("package {};\n\n", p.replace('/', "."))).unwrap_or_default();
        let java = format!(
            "/*\n * Decompiled from {} bytes.\n */\n{package}public class {} {{\n    // {}\n    private int count;\n\n    public void run() {{\n    }}\n}}\n",
            bytes.len(),
            name.simple_name(),
            String::from_utf8_lossy(bytes),
        );
        sink.accept(SinkType::Progress, Output::Text(format!("Processing {}", name.dotted())));
        sink.accept(SinkType::Java, Output::Text(java));
        Ok(())
    }
}

pub fn local_generator(cache_dir: &Path) -> (Arc<Counting>, SourceGenerator) {
    let backend = Arc::new(LocalBackend::new("cache", cache_dir).unwrap());
    let decompiler = Arc::new(Counting::default());
    let generator = SourceGenerator::new(ContentCache::new(backend), decompiler.clone());
    (decompiler, generator)
}

pub fn write_class(root: &Path, resource: &str, data: &[u8]) {
    let path = root.join(resource);
    std::fs::create_dir_all(path.parent().unwrap()).unwrap();
    std::fs::write(path, data).unwrap();
}

pub fn write_jar(path: &Path, entries: &[(&str, &[u8])]) {
    let file = std::fs::File::create(path).unwrap();
    let mut zip = zip::ZipWriter::new(file);
    for (name, data) in entries {
        zip.start_file(*name, zip::write::FileOptions::default()).unwrap();
        zip.write_all(data).unwrap();
    }
    zip.finish().unwrap();
}
