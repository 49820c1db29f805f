use std::path::Path;

use proptest::prelude::*;

use pyxregen::generate::{RULES, RuleKind, SourceFile, match_rule};

#[test]
fn template_suffix_wins_over_plain_pyx() {
    let rule = match_rule("_segmentation.pyx.in").expect("template rule");
    assert_eq!(rule.kind, RuleKind::TemplateThenCompile);
    assert_eq!(rule.output_ext, ".c");
    assert_eq!(rule.intermediate_ext, Some(".pyx"));

    let rule = match_rule("_segmentation.pyx").expect("direct rule");
    assert_eq!(rule.kind, RuleKind::Direct);
    assert_eq!(rule.intermediate_ext, None);
}

#[test]
fn unknown_and_bare_extensions_do_not_match() {
    for name in [".pyx", ".pyx.in", "setup.py", "module.pxd", "notes.pyx.bak", "a.c", "README"] {
        assert!(match_rule(name).is_none(), "{name} should not match");
    }
}

#[test]
fn rule_table_is_ordered_longest_suffix_first() {
    for pair in RULES.windows(2) {
        assert!(pair[0].source_ext.len() >= pair[1].source_ext.len());
    }
}

#[test]
fn direct_source_derives_sibling_output() {
    let source = SourceFile::from_path("nipy/labs/bindings/linalg.pyx").expect("matches");
    assert_eq!(source.kind(), RuleKind::Direct);
    assert_eq!(source.dir(), Path::new("nipy/labs/bindings"));
    assert_eq!(source.file_name(), "linalg.pyx");
    assert_eq!(source.output_name(), "linalg.c");
    assert_eq!(source.output_path(), Path::new("nipy/labs/bindings/linalg.c"));
    assert_eq!(source.intermediate_path(), None);
}

#[test]
fn template_source_derives_intermediate_and_output() {
    let source = SourceFile::from_path("nipy/algorithms/_onestep.pyx.in").expect("matches");
    assert_eq!(source.kind(), RuleKind::TemplateThenCompile);
    assert_eq!(source.output_name(), "_onestep.c");
    assert_eq!(source.intermediate_name().as_deref(), Some("_onestep.pyx"));
    assert_eq!(
        source.intermediate_path().as_deref(),
        Some(Path::new("nipy/algorithms/_onestep.pyx"))
    );
}

#[test]
fn source_at_top_level_has_empty_dir() {
    let source = SourceFile::from_path("mod.pyx").expect("matches");
    assert_eq!(source.dir(), Path::new(""));
    assert_eq!(source.output_path(), Path::new("mod.c"));
}

proptest! {
    #[test]
    fn other_extensions_never_match(
        stem in "[a-z_][a-z0-9_]{0,10}",
        ext in prop::sample::select(vec!["py", "pxd", "pxi", "c", "h", "in", "txt", "pyx.orig", "pyxin"]),
    ) {
        let name = format!("{stem}.{ext}");
        let path = format!("pkg/{name}");
        prop_assert!(match_rule(&name).is_none());
        prop_assert!(SourceFile::from_path(path).is_none());
    }

    #[test]
    fn outputs_keep_the_stem(stem in "[a-z_][a-z0-9_]{0,10}", template in any::<bool>()) {
        let name = if template { format!("{stem}.pyx.in") } else { format!("{stem}.pyx") };
        let expected_output = format!("{stem}.c");
        let source = SourceFile::from_path(format!("pkg/{name}")).expect("matches");
        prop_assert_eq!(source.output_name(), expected_output);
        prop_assert_eq!(source.intermediate_path().is_some(), template);
    }
}
