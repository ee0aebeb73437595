//! Integration tests against the public `Engine` API, exercising real
//! directory trees under `tempfile::tempdir()` rather than unit fixtures.

use gattr_core::{AttributeValue, Engine, Flags};
use std::fs;
use std::path::Path;

fn write(dir: &Path, rel: &str, contents: &str) {
    let full = dir.join(rel);
    if let Some(parent) = full.parent() {
        fs::create_dir_all(parent).unwrap();
    }
    fs::write(full, contents).unwrap();
}

mod precedence {
    use super::*;

    #[test]
    fn closer_directory_file_outranks_root() {
        let tmp = tempfile::tempdir().unwrap();
        write(tmp.path(), ".gitattributes", "*.bin -text\n");
        write(tmp.path(), "src/.gitattributes", "*.bin text\n");

        let engine = Engine::for_workdir(tmp.path());
        let value = engine
            .get(&Flags::new(), &tmp.path().join("src/blob.bin"), false, "text")
            .unwrap();
        assert_eq!(value, AttributeValue::True);
    }

    #[test]
    fn root_file_still_applies_outside_subdirectory() {
        let tmp = tempfile::tempdir().unwrap();
        write(tmp.path(), ".gitattributes", "*.bin -text\n");
        write(tmp.path(), "src/.gitattributes", "*.rs text\n");

        let engine = Engine::for_workdir(tmp.path());
        let value = engine
            .get(&Flags::new(), &tmp.path().join("other/blob.bin"), false, "text")
            .unwrap();
        assert_eq!(value, AttributeValue::False);
    }

    #[test]
    fn last_matching_rule_in_one_file_wins() {
        let tmp = tempfile::tempdir().unwrap();
        write(tmp.path(), ".gitattributes", "*.log text\n*.log -text\n");

        let engine = Engine::for_workdir(tmp.path());
        let value = engine
            .get(&Flags::new(), &tmp.path().join("app.log"), false, "text")
            .unwrap();
        assert_eq!(value, AttributeValue::False);
    }
}

mod patterns {
    use super::*;

    #[test]
    fn anchored_pattern_only_matches_from_its_own_directory() {
        let tmp = tempfile::tempdir().unwrap();
        write(tmp.path(), ".gitattributes", "/build.rs text\n");

        let engine = Engine::for_workdir(tmp.path());
        let flags = Flags::new();
        assert_eq!(
            engine.get(&flags, &tmp.path().join("build.rs"), false, "text").unwrap(),
            AttributeValue::True
        );
        assert_eq!(
            engine.get(&flags, &tmp.path().join("sub/build.rs"), false, "text").unwrap(),
            AttributeValue::Unspecified
        );
    }

    #[test]
    fn negated_pattern_leaves_attribute_unspecified() {
        let tmp = tempfile::tempdir().unwrap();
        write(tmp.path(), ".gitattributes", "!important.log text\n");

        let engine = Engine::for_workdir(tmp.path());
        let value = engine
            .get(&Flags::new(), &tmp.path().join("important.log"), false, "text")
            .unwrap();
        assert_eq!(value, AttributeValue::Unspecified);
    }

    #[test]
    fn directory_only_pattern_requires_is_dir_contents() {
        let tmp = tempfile::tempdir().unwrap();
        write(tmp.path(), ".gitattributes", "vendor/ -diff\n");

        let engine = Engine::for_workdir(tmp.path());
        let flags = Flags::new();
        assert_eq!(
            engine
                .get(&flags, &tmp.path().join("vendor/lib.rs"), false, "diff")
                .unwrap(),
            AttributeValue::False
        );
        assert_eq!(
            engine
                .get(&flags, &tmp.path().join("vendored.rs"), false, "diff")
                .unwrap(),
            AttributeValue::Unspecified
        );
    }
}

mod macros {
    use super::*;

    #[test]
    fn macro_expands_to_its_own_assignments() {
        let tmp = tempfile::tempdir().unwrap();
        write(tmp.path(), ".gitattributes", "[attr]binary -diff -text -merge\n*.png binary\n");

        let engine = Engine::for_workdir(tmp.path());
        let flags = Flags::new();
        let path = tmp.path().join("logo.png");
        assert_eq!(engine.get(&flags, &path, false, "diff").unwrap(), AttributeValue::False);
        assert_eq!(engine.get(&flags, &path, false, "text").unwrap(), AttributeValue::False);
        assert_eq!(engine.get(&flags, &path, false, "merge").unwrap(), AttributeValue::False);
    }

    #[test]
    fn direct_assignment_on_rule_beats_macro_expansion() {
        let tmp = tempfile::tempdir().unwrap();
        write(
            tmp.path(),
            ".gitattributes",
            "[attr]binary -diff -text\n*.png binary diff\n",
        );

        let engine = Engine::for_workdir(tmp.path());
        let value = engine
            .get(&Flags::new(), &tmp.path().join("logo.png"), false, "diff")
            .unwrap();
        assert_eq!(value, AttributeValue::True);
    }

    #[test]
    fn add_macro_is_usable_without_any_file_defining_it() {
        let tmp = tempfile::tempdir().unwrap();
        write(tmp.path(), ".gitattributes", "*.woff binary\n");

        let engine = Engine::for_workdir(tmp.path());
        engine.add_macro("binary", "-diff -merge").unwrap();

        let value = engine
            .get(&Flags::new(), &tmp.path().join("font.woff"), false, "merge")
            .unwrap();
        assert_eq!(value, AttributeValue::False);
    }
}

mod enumeration {
    use super::*;

    #[test]
    fn foreach_reports_every_mentioned_attribute_once() {
        let tmp = tempfile::tempdir().unwrap();
        write(tmp.path(), ".gitattributes", "*.cpp diff=cpp text\n");

        let engine = Engine::for_workdir(tmp.path());
        let mut seen = Vec::new();
        engine
            .foreach(&Flags::new(), &tmp.path().join("a.cpp"), false, |name, value| {
                seen.push((name.to_string(), value.clone()));
                0
            })
            .unwrap();

        assert_eq!(seen.len(), 2);
        assert!(seen.contains(&("diff".to_string(), AttributeValue::String("cpp".to_string()))));
        assert!(seen.contains(&("text".to_string(), AttributeValue::True)));
    }

    #[test]
    fn get_many_matches_individual_get_calls() {
        let tmp = tempfile::tempdir().unwrap();
        write(tmp.path(), ".gitattributes", "*.cpp diff=cpp text\n");

        let engine = Engine::for_workdir(tmp.path());
        let flags = Flags::new();
        let path = tmp.path().join("a.cpp");
        let batched = engine.get_many(&flags, &path, false, &["diff", "text", "eol"]).unwrap();
        assert_eq!(batched[0], engine.get(&flags, &path, false, "diff").unwrap());
        assert_eq!(batched[1], engine.get(&flags, &path, false, "text").unwrap());
        assert_eq!(batched[2], engine.get(&flags, &path, false, "eol").unwrap());
    }
}

mod source_order {
    use super::*;
    use gattr_core::repo::FileSystemApi;
    use gattr_core::{ContentSignature, Engine, ObjectDb, Repository, SourceOrder};
    use std::collections::HashMap;
    use std::io;
    use std::path::PathBuf;
    use std::sync::Arc;

    /// A `Repository` backed by plain maps instead of a real index/object
    /// database, so `SourceOrder`/`include_head` can be exercised without a
    /// real git repository underneath. Working-tree reads still hit disk
    /// (like `FsRepository` does), since those tests write real files.
    struct FakeRepository {
        workdir: PathBuf,
        index: HashMap<PathBuf, String>,
        head_tree: HashMap<PathBuf, String>,
    }

    impl Repository for FakeRepository {
        fn workdir(&self) -> Option<&Path> {
            Some(&self.workdir)
        }

        fn is_bare(&self) -> bool {
            false
        }

        fn index_entry(&self, path: &Path) -> io::Result<Option<String>> {
            Ok(self.index.get(path).cloned())
        }

        fn commit_tree_entry(&self, commit: &str, path: &Path) -> io::Result<Option<String>> {
            if commit != "HEAD" {
                return Ok(None);
            }
            Ok(self.head_tree.get(path).cloned())
        }

        fn info_attributes_path(&self) -> Option<PathBuf> {
            None
        }

        fn attributes_extra_path(&self) -> Option<PathBuf> {
            None
        }
    }

    impl FileSystemApi for FakeRepository {
        fn stat(&self, path: &Path) -> io::Result<Option<ContentSignature>> {
            match std::fs::metadata(path) {
                Ok(meta) => Ok(Some(ContentSignature::FileStat {
                    size: meta.len(),
                    mtime_nanos: 0,
                    inode: 0,
                    mode: 0,
                })),
                Err(e) if e.kind() == io::ErrorKind::NotFound => Ok(None),
                Err(e) => Err(e),
            }
        }

        fn open_read(&self, path: &Path) -> io::Result<Vec<u8>> {
            std::fs::read(path)
        }
    }

    struct FakeObjectDb(HashMap<String, Vec<u8>>);

    impl ObjectDb for FakeObjectDb {
        fn read_blob(&self, oid: &str) -> io::Result<Vec<u8>> {
            self.0
                .get(oid)
                .cloned()
                .ok_or_else(|| io::Error::new(io::ErrorKind::NotFound, "no such blob"))
        }
    }

    fn engine(repository: Arc<FakeRepository>, blobs: HashMap<String, Vec<u8>>) -> Engine {
        Engine::new(
            repository.clone() as Arc<dyn Repository>,
            repository as Arc<dyn FileSystemApi>,
            Arc::new(FakeObjectDb(blobs)) as Arc<dyn ObjectDb>,
        )
    }

    #[test]
    fn index_only_with_no_index_entry_ignores_working_tree_file() {
        let tmp = tempfile::tempdir().unwrap();
        // A working-tree .gitattributes exists and would match, but
        // INDEX_ONLY never consults it when the index has no entry for it.
        write(tmp.path(), ".gitattributes", "*.rs text\n");

        let repository = Arc::new(FakeRepository {
            workdir: tmp.path().to_path_buf(),
            index: HashMap::new(),
            head_tree: HashMap::new(),
        });
        let engine = engine(repository, HashMap::new());
        let flags = Flags::new().with_source_order(SourceOrder::IndexOnly);
        let value = engine.get(&flags, &tmp.path().join("a.rs"), false, "text").unwrap();
        assert_eq!(value, AttributeValue::Unspecified);
    }

    #[test]
    fn index_only_uses_the_indexed_blob_when_present() {
        let tmp = tempfile::tempdir().unwrap();
        // No working-tree .gitattributes at all -- the rule exists only as
        // an index blob.
        let mut index = HashMap::new();
        index.insert(PathBuf::from(".gitattributes"), "oid-1".to_string());
        let mut blobs = HashMap::new();
        blobs.insert("oid-1".to_string(), b"*.rs text\n".to_vec());

        let repository = Arc::new(FakeRepository {
            workdir: tmp.path().to_path_buf(),
            index,
            head_tree: HashMap::new(),
        });
        let engine = engine(repository, blobs);
        let flags = Flags::new().with_source_order(SourceOrder::IndexOnly);
        let value = engine.get(&flags, &tmp.path().join("a.rs"), false, "text").unwrap();
        assert_eq!(value, AttributeValue::True);
    }

    #[test]
    fn index_then_file_prefers_the_index_blob_over_the_working_tree_file() {
        let tmp = tempfile::tempdir().unwrap();
        write(tmp.path(), ".gitattributes", "*.rs -text\n");

        let mut index = HashMap::new();
        index.insert(PathBuf::from(".gitattributes"), "oid-1".to_string());
        let mut blobs = HashMap::new();
        blobs.insert("oid-1".to_string(), b"*.rs text\n".to_vec());

        let repository = Arc::new(FakeRepository {
            workdir: tmp.path().to_path_buf(),
            index,
            head_tree: HashMap::new(),
        });
        let engine = engine(repository, blobs);
        let flags = Flags::new().with_source_order(SourceOrder::IndexThenFile);
        let value = engine.get(&flags, &tmp.path().join("a.rs"), false, "text").unwrap();
        assert_eq!(value, AttributeValue::True);
    }

    #[test]
    fn include_head_pulls_in_a_commit_only_attributes_file() {
        let tmp = tempfile::tempdir().unwrap();
        // No working-tree file and no index entry -- HEAD's tree is the only
        // source of the rule.
        let mut head_tree = HashMap::new();
        head_tree.insert(PathBuf::from(".gitattributes"), "oid-head".to_string());
        let mut blobs = HashMap::new();
        blobs.insert("oid-head".to_string(), b"*.rs text\n".to_vec());

        let repository = Arc::new(FakeRepository {
            workdir: tmp.path().to_path_buf(),
            index: HashMap::new(),
            head_tree,
        });
        let engine = engine(repository, blobs);
        let flags = Flags::new().with_include_head(true);
        let value = engine.get(&flags, &tmp.path().join("a.rs"), false, "text").unwrap();
        assert_eq!(value, AttributeValue::True);
    }
}

mod edge_cases {
    use super::*;

    #[test]
    fn missing_gitattributes_is_not_an_error() {
        let tmp = tempfile::tempdir().unwrap();
        write(tmp.path(), "a.rs", "fn main() {}");

        let engine = Engine::for_workdir(tmp.path());
        let value = engine.get(&Flags::new(), &tmp.path().join("a.rs"), false, "text").unwrap();
        assert_eq!(value, AttributeValue::Unspecified);
    }

    #[test]
    fn comment_and_blank_lines_do_not_produce_rules() {
        let tmp = tempfile::tempdir().unwrap();
        write(tmp.path(), ".gitattributes", "# comment\n\n*.rs text\n");

        let engine = Engine::for_workdir(tmp.path());
        let value = engine.get(&Flags::new(), &tmp.path().join("a.rs"), false, "text").unwrap();
        assert_eq!(value, AttributeValue::True);
    }

    #[test]
    fn macro_defined_in_a_nested_directory_is_not_trusted() {
        // Macros are only trusted at the work-tree root, the info file, the
        // extra file, and the system file -- never a nested directory's own
        // `.gitattributes` (spec §4.3).
        let tmp = tempfile::tempdir().unwrap();
        write(tmp.path(), "sub/.gitattributes", "[attr]binary -text\n*.dat binary\n");

        let engine = Engine::for_workdir(tmp.path());
        let value = engine
            .get(&Flags::new(), &tmp.path().join("sub/payload.dat"), false, "text")
            .unwrap();
        // The rule line itself still applied ("binary" is True on *.dat), but
        // the macro's own contents never registered, so "binary" doesn't
        // expand to anything for "text".
        assert_eq!(value, AttributeValue::Unspecified);
    }
}
