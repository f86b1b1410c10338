//! Source registry.
//!
//! Owns the tracked source units and hands a consistent snapshot to the
//! merge engine after every mutation. All parse and write failures stop
//! here: they are logged and the registry keeps its last good state.

use crate::merger::{shortest_namespace, MergeEngine, MergeOutcome, Units};
use monofile_core::{parse_file, SourceUnit};
use std::path::Path;
use tracing::{debug, error, warn};

/// The set of tracked units plus the engine that merges them.
pub struct SourceRegistry {
    units: Units,
    engine: MergeEngine,
}

impl SourceRegistry {
    pub fn new(engine: MergeEngine) -> Self {
        Self {
            units: Units::new(),
            engine,
        }
    }

    /// Parses `path` and inserts or replaces its unit.
    ///
    /// With `force_merge` set a merge pass follows a successful parse.
    /// Otherwise the caller is batching adds and merges once at the end.
    /// On parse failure any previous unit for `path` is kept and no merge runs.
    ///
    /// Returns whether the parse succeeded.
    pub fn add_or_replace(&mut self, path: &Path, force_merge: bool) -> bool {
        debug!("Add java file {}", path.display());
        if !self.parse_into(path) {
            return false;
        }
        if force_merge {
            self.merge();
        }
        true
    }

    /// Re-parses `path`, then merges whether or not the parse succeeded.
    pub fn modify(&mut self, path: &Path) -> Option<MergeOutcome> {
        debug!("Modify java file {}", path.display());
        self.parse_into(path);
        self.merge()
    }

    /// Drops the unit for `path` and merges, even if nothing was tracked there.
    pub fn remove(&mut self, path: &Path) -> Option<MergeOutcome> {
        let removed = self.units.remove(path).is_some();
        debug!("Deleted java file {} (tracked: {})", path.display(), removed);
        self.merge()
    }

    /// Drops every unit in `paths`, then merges once.
    ///
    /// Used when a whole directory disappears in one event, so the output
    /// never shows the tree with only part of that directory removed.
    pub fn remove_all<I, P>(&mut self, paths: I) -> Option<MergeOutcome>
    where
        I: IntoIterator<Item = P>,
        P: AsRef<Path>,
    {
        for path in paths {
            let path = path.as_ref();
            let removed = self.units.remove(path).is_some();
            debug!("Deleted java file {} (tracked: {})", path.display(), removed);
        }
        self.merge()
    }

    /// Runs one merge pass over the current units.
    ///
    /// Returns None when the pass failed to write; the failure is logged.
    pub fn merge(&self) -> Option<MergeOutcome> {
        match self.engine.merge(&self.units) {
            Ok(outcome) => Some(outcome),
            Err(e) => {
                error!("Merge failed: {}", e);
                None
            }
        }
    }

    pub fn get(&self, path: &Path) -> Option<&SourceUnit> {
        self.units.get(path)
    }

    pub fn contains(&self, path: &Path) -> bool {
        self.units.contains_key(path)
    }

    pub fn len(&self) -> usize {
        self.units.len()
    }

    pub fn is_empty(&self) -> bool {
        self.units.is_empty()
    }

    /// The shortest declared package among tracked units.
    pub fn shortest_namespace(&self) -> Option<&str> {
        shortest_namespace(&self.units)
    }

    fn parse_into(&mut self, path: &Path) -> bool {
        match parse_file(path) {
            Ok(parsed) => {
                let unit = SourceUnit::from_parsed(path, parsed);
                self.units.insert(path.to_path_buf(), unit);
                true
            }
            Err(e) => {
                warn!("Failed to parse {}: {}", path.display(), e);
                false
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::merger::MergeOptions;
    use proptest::prelude::*;
    use std::collections::BTreeMap;
    use std::fs;
    use std::path::PathBuf;
    use tempfile::{tempdir, TempDir};

    const MAIN: &str = "package p;\n\nimport x.Y;\n\n\
                        public class Main {\n    public static void main(String[] args) {}\n}\n";
    const HELPER: &str = "package p;\n\nimport x.Y;\n\npublic class Helper {}\n";

    struct Fixture {
        src: TempDir,
        out: TempDir,
        registry: SourceRegistry,
    }

    impl Fixture {
        fn new() -> Self {
            let src = tempdir().unwrap();
            let out = tempdir().unwrap();
            let engine = MergeEngine::new(MergeOptions::new(out.path().join("Main.java")));
            Self {
                src,
                out,
                registry: SourceRegistry::new(engine),
            }
        }

        fn write(&self, name: &str, content: &str) -> PathBuf {
            let path = self.src.path().join(name);
            fs::write(&path, content).unwrap();
            path
        }

        fn output(&self) -> PathBuf {
            self.out.path().join("Main.java")
        }

        fn read_output(&self) -> Option<String> {
            fs::read_to_string(self.output()).ok()
        }
    }

    #[test]
    fn test_batched_adds_do_not_merge() {
        let mut fx = Fixture::new();
        let a = fx.write("A.java", MAIN);
        let b = fx.write("B.java", HELPER);

        assert!(fx.registry.add_or_replace(&a, false));
        assert!(fx.registry.add_or_replace(&b, false));
        assert_eq!(fx.registry.len(), 2);
        assert!(fx.read_output().is_none());

        assert!(fx.registry.merge().unwrap().is_merged());
        let output = fx.read_output().unwrap();
        assert_eq!(output.matches("import x.Y;").count(), 1);
        assert!(output.starts_with("import x.Y;\n\nclass Main {"));
        assert!(output.contains("\n\npublic class Helper {}\n"));
    }

    #[test]
    fn test_forced_add_merges() {
        let mut fx = Fixture::new();
        let a = fx.write("A.java", MAIN);

        assert!(fx.registry.add_or_replace(&a, true));
        assert!(fx.read_output().is_some());
    }

    #[test]
    fn test_failed_parse_keeps_previous_unit() {
        let mut fx = Fixture::new();
        let a = fx.write("A.java", MAIN);
        assert!(fx.registry.add_or_replace(&a, true));
        let before = fx.read_output().unwrap();

        fs::write(&a, "package p;\npublic class Main {\n  void broken( {\n").unwrap();
        assert!(!fx.registry.add_or_replace(&a, true));

        let unit = fx.registry.get(&a).unwrap();
        assert!(unit.is_entry);
        assert_eq!(unit.type_name.as_deref(), Some("Main"));
        assert_eq!(fx.read_output().unwrap(), before);
    }

    #[test]
    fn test_failed_first_parse_tracks_nothing() {
        let mut fx = Fixture::new();
        let a = fx.write("A.java", "");
        assert!(!fx.registry.add_or_replace(&a, true));
        assert!(!fx.registry.contains(&a));
    }

    #[test]
    fn test_modify_reparses_and_resets_entry() {
        let mut fx = Fixture::new();
        let a = fx.write("A.java", MAIN);
        let b = fx.write("B.java", HELPER);
        fx.registry.add_or_replace(&a, false);
        fx.registry.add_or_replace(&b, false);
        assert!(fx.registry.merge().unwrap().is_merged());
        let before = fx.read_output().unwrap();

        // Removing the main method means there is no entry left.
        fs::write(&a, "package q;\n\npublic class Main {}\n").unwrap();
        assert_eq!(fx.registry.modify(&a), Some(MergeOutcome::NoEntry));

        let unit = fx.registry.get(&a).unwrap();
        assert!(!unit.is_entry);
        assert_eq!(unit.namespace.as_deref(), Some("q"));
        assert_eq!(fx.read_output().unwrap(), before);
    }

    #[test]
    fn test_modify_with_parse_error_still_merges() {
        let mut fx = Fixture::new();
        let a = fx.write("A.java", MAIN);
        fx.registry.add_or_replace(&a, false);

        fs::write(&a, "public class Main {").unwrap();
        let outcome = fx.registry.modify(&a).unwrap();
        assert!(outcome.is_merged());
        assert!(fx.registry.get(&a).unwrap().is_entry);
    }

    #[test]
    fn test_ambiguous_entry_then_resolved() {
        let mut fx = Fixture::new();
        let a = fx.write("A.java", MAIN);
        let c = fx.write("C.java", &MAIN.replace("Main", "Other"));
        fx.registry.add_or_replace(&a, false);
        fx.registry.add_or_replace(&c, false);

        assert!(matches!(
            fx.registry.merge(),
            Some(MergeOutcome::AmbiguousEntry(_))
        ));
        assert!(fx.read_output().is_none());

        let outcome = fx.registry.remove(&c).unwrap();
        assert!(outcome.is_merged());
        assert!(fx.read_output().unwrap().contains("class Main {"));
    }

    #[test]
    fn test_remove_untracked_still_merges() {
        let mut fx = Fixture::new();
        let a = fx.write("A.java", MAIN);
        fx.registry.add_or_replace(&a, false);

        let outcome = fx.registry.remove(&fx.src.path().join("Nope.java"));
        assert!(outcome.unwrap().is_merged());
        assert_eq!(fx.registry.len(), 1);
    }

    #[test]
    fn test_write_failure_is_contained() {
        let src = tempdir().unwrap();
        let out = tempdir().unwrap();
        let output = out.path().join("missing").join("Main.java");
        let mut registry = SourceRegistry::new(MergeEngine::new(MergeOptions::new(&output)));

        let a = src.path().join("A.java");
        fs::write(&a, MAIN).unwrap();
        assert!(registry.add_or_replace(&a, false));
        assert!(registry.merge().is_none());
        assert_eq!(registry.len(), 1);
    }

    #[test]
    fn test_shortest_namespace() {
        let mut fx = Fixture::new();
        let a = fx.write("A.java", MAIN);
        let d = fx.write("D.java", "package p.deep.er;\nclass D {}\n");
        fx.registry.add_or_replace(&a, false);
        fx.registry.add_or_replace(&d, false);
        assert_eq!(fx.registry.shortest_namespace(), Some("p"));
    }

    #[test]
    fn test_remove_all_merges_once_after_dropping_everything() {
        let mut fx = Fixture::new();
        let a = fx.write("A.java", HELPER);
        let z = fx.write("Z.java", MAIN);
        fx.registry.add_or_replace(&a, false);
        fx.registry.add_or_replace(&z, false);
        assert!(fx.registry.merge().unwrap().is_merged());
        let before = fx.read_output().unwrap();

        // The helper sorts first; dropping it alone would rewrite the output.
        let outcome = fx.registry.remove_all([&a, &z]);

        assert_eq!(outcome, Some(MergeOutcome::NoEntry));
        assert!(fx.registry.is_empty());
        assert_eq!(fx.read_output().unwrap(), before);
    }

    #[derive(Debug, Clone)]
    enum Op {
        /// Writes file `n`, with or without a `main` method, and announces it.
        Write(usize, bool),
        /// Deletes file `n` and announces it.
        Remove(usize),
    }

    fn arb_op() -> impl Strategy<Value = Op> {
        prop_oneof![
            (0..4usize, any::<bool>()).prop_map(|(n, entry)| Op::Write(n, entry)),
            (0..4usize).prop_map(Op::Remove),
        ]
    }

    fn class_source(n: usize, entry: bool) -> String {
        let body = if entry {
            "\n    public static void main(String[] args) {}\n"
        } else {
            ""
        };
        format!("package p;\n\nimport x.Y;\n\npublic class T{n} {{{body}}}\n")
    }

    fn stripped_entry(n: usize) -> String {
        format!("class T{n} {{\n    public static void main(String[] args) {{}}\n}}")
    }

    proptest! {
        #![proptest_config(ProptestConfig::with_cases(64))]

        /// With exactly one entry unit the merged file opens with its stripped
        /// declaration, once; otherwise the previous output stays as it was.
        #[test]
        fn entry_is_first_block_exactly_once(ops in prop::collection::vec(arb_op(), 1..24)) {
            let mut fx = Fixture::new();
            let mut model: BTreeMap<usize, bool> = BTreeMap::new();

            for op in ops {
                let before = fx.read_output();

                match op {
                    Op::Write(n, entry) => {
                        let path = fx.write(&format!("T{n}.java"), &class_source(n, entry));
                        if model.insert(n, entry).is_some() {
                            fx.registry.modify(&path);
                        } else {
                            prop_assert!(fx.registry.add_or_replace(&path, true));
                        }
                    }
                    Op::Remove(n) => {
                        let path = fx.src.path().join(format!("T{n}.java"));
                        let _ = fs::remove_file(&path);
                        model.remove(&n);
                        fx.registry.remove(&path);
                    }
                }

                prop_assert_eq!(fx.registry.len(), model.len());
                let entries: Vec<usize> =
                    model.iter().filter(|(_, e)| **e).map(|(n, _)| *n).collect();

                match entries.as_slice() {
                    [n] => {
                        let output = fx.read_output().unwrap();
                        let first = stripped_entry(*n);
                        let expected_prefix = format!("import x.Y;\n\n{first}");
                        prop_assert!(output.starts_with(&expected_prefix));
                        prop_assert_eq!(output.matches(first.as_str()).count(), 1);
                    }
                    _ => {
                        prop_assert_eq!(fx.read_output(), before);
                    }
                }
            }
        }
    }
}
