//! End-to-end tests for ACNU0001 (remove `ref`) and ACNU0002 (`ref` to
//! `out`): detection, the rewrite of the declaration and of every call.

mod support;

use sharpfix_analyzers::{
    apply_fix, detect_all, fix_all, AnalyzerError, FixAllScope, ProgramModel, RuleId, RuleSet,
    Solution,
};
use support::{anchors, findings, fix_first, fix_one, solution};
use tokio_util::sync::CancellationToken;

// ============================================================================
// Remove Unnecessary Ref
// ============================================================================

mod remove_ref {
    use super::*;

    #[test]
    fn unwritten_parameter_loses_ref_everywhere() {
        let texts = fix_first(
            &[
                ("Lib.cs", "class Lib\n{\n    public static void M(ref int a) {}\n}\n"),
                (
                    "App.cs",
                    "class App\n{\n    void Run()\n    {\n        int x = 0;\n        Lib.M(ref x);\n        Lib.M(ref x);\n    }\n}\n",
                ),
            ],
            RuleId::RemoveUnnecessaryRef,
        );
        assert_eq!(texts[0], "class Lib\n{\n    public static void M(int a) {}\n}\n");
        assert_eq!(
            texts[1],
            "class App\n{\n    void Run()\n    {\n        int x = 0;\n        Lib.M(x);\n        Lib.M(x);\n    }\n}\n"
        );
    }

    #[test]
    fn fixed_method_is_not_reported_again() {
        let source = "class C { void M(ref int a) { } void N() { int x = 0; M(ref x); } }";
        let fixed = fix_one(source, RuleId::RemoveUnnecessaryRef);
        assert_eq!(fixed, "class C { void M(int a) { } void N() { int x = 0; M(x); } }");
        assert!(anchors(&fixed).is_empty());
    }

    #[test]
    fn block_comments_around_ref_are_kept() {
        let fixed = fix_one(
            "class C { void M(/*before*/ ref /*after*/ int a) { } }",
            RuleId::RemoveUnnecessaryRef,
        );
        assert_eq!(fixed, "class C { void M(/*before*/ /*after*/ int a) { } }");
    }

    #[test]
    fn line_comment_above_ref_is_kept() {
        let source = "class C
{
    void M(
        // the value
        ref int a) { }
}";
        let expected = "class C
{
    void M(
        // the value
        int a) { }
}";
        assert_eq!(fix_one(source, RuleId::RemoveUnnecessaryRef), expected);
    }

    #[test]
    fn no_whitespace_is_left_after_the_open_paren() {
        assert_eq!(
            fix_one("class C { void M(ref\tint a) { } }", RuleId::RemoveUnnecessaryRef),
            "class C { void M(int a) { } }"
        );
        assert_eq!(
            fix_one(
                "class C { void M(ref int a) { } void N() { int x = 0; M(ref /*k*/ x); } }",
                RuleId::RemoveUnnecessaryRef,
            ),
            "class C { void M(int a) { } void N() { int x = 0; M(/*k*/ x); } }"
        );
    }

    #[test]
    fn calls_that_do_not_pass_a_plain_variable_are_left() {
        let source = "class C {
    void M(ref int a) { }
    void N(int[] xs) { int y = 0; M(ref xs[0]); M(ref y); }
}";
        let fixed = fix_one(source, RuleId::RemoveUnnecessaryRef);
        assert_eq!(
            fixed,
            "class C {
    void M(int a) { }
    void N(int[] xs) { int y = 0; M(ref xs[0]); M(y); }
}"
        );
    }

    #[test]
    fn same_named_overload_is_untouched() {
        let source = "class C {
    void M(ref int a) { }
    void M(ref string s) { s = \"\"; }
    void N() { int x = 0; string t = null; M(ref x); M(ref t); }
}";
        let fixed = fix_one(source, RuleId::RemoveUnnecessaryRef);
        assert_eq!(
            fixed,
            "class C {
    void M(int a) { }
    void M(ref string s) { s = \"\"; }
    void N() { int x = 0; string t = null; M(x); M(ref t); }
}"
        );
    }
}

// ============================================================================
// Convert Ref To Out
// ============================================================================

mod ref_to_out {
    use super::*;

    const SCENARIO: &str = "class C
{
    void M(ref int a, ref int b)
    {
        a = 0;
        System.Console.WriteLine(a);
        System.Console.WriteLine(b);
        b = 0;
    }

    void N()
    {
        int x = 1, y = 2;
        M(ref x, ref y);
    }
}";

    #[test]
    fn only_the_parameter_assigned_first_qualifies() {
        let found = findings(&[("C.cs", SCENARIO)], RuleId::ConvertRefToOut);
        assert_eq!(found.len(), 1);
        assert_eq!(found[0].arguments, vec!["a".to_string()]);
        assert_eq!(&SCENARIO[found[0].span.start..found[0].span.end], "ref");
    }

    #[test]
    fn ref_becomes_out_at_declaration_and_call() {
        let fixed = fix_one(SCENARIO, RuleId::ConvertRefToOut);
        assert!(fixed.contains("void M(out int a, ref int b)"));
        assert!(fixed.contains("M(out x, ref y);"));
        assert_eq!(fixed.len(), SCENARIO.len());
    }

    #[test]
    fn keyword_trivia_is_unchanged() {
        let fixed = fix_one(
            "class C { void M( /*k*/ ref  int a) { a = 1; } }",
            RuleId::ConvertRefToOut,
        );
        assert_eq!(fixed, "class C { void M( /*k*/ out  int a) { a = 1; } }");
    }

    #[test]
    fn fixed_method_is_not_reported_again() {
        let fixed = fix_one("class C { void M(ref int a) { a = 1; } }", RuleId::ConvertRefToOut);
        assert_eq!(fixed, "class C { void M(out int a) { a = 1; } }");
        let rules: Vec<RuleId> = anchors(&fixed).into_iter().map(|(rule, _, _)| rule).collect();
        assert_eq!(rules, vec![RuleId::OutParameterToReturn]);
    }
}

// ============================================================================
// Incomplete Call Sites
// ============================================================================

mod incomplete_call_sites {
    use super::*;

    const B: &str = "class B { public void M(ref int a) { } }";
    const C: &str = "class C {
    void N(System.Collections.Generic.List<B> list, B[] arr, int x) {
        foreach (var b in list) { b.M(ref x); }
        arr[0].M(ref x);
    }
}";

    #[test]
    fn unbound_call_withholds_the_fix() {
        let model = ProgramModel::build(&solution(&[("B.cs", B), ("C.cs", C)]));
        let findings = detect_all(&model, &RuleSet::only([RuleId::RemoveUnnecessaryRef])).unwrap();
        assert_eq!(findings.len(), 1);
        let result = apply_fix(&model, &findings[0], &CancellationToken::new());
        assert!(matches!(
            result,
            Err(AnalyzerError::UnboundCallSite { ref path, .. }) if path == "C.cs"
        ));
    }

    #[test]
    fn fix_all_drops_the_withheld_fix() {
        let model = ProgramModel::build(&solution(&[("B.cs", B), ("C.cs", C)]));
        let rules = RuleSet::only([RuleId::RemoveUnnecessaryRef]);
        let findings = detect_all(&model, &rules).unwrap();
        let outcome = fix_all(
            &model,
            &findings,
            &FixAllScope::Rules(rules),
            &CancellationToken::new(),
        )
        .unwrap();
        assert!(outcome.applied.is_empty());
        assert_eq!(outcome.dropped.len(), 1);
        assert!(outcome.documents.is_empty());
    }

    #[test]
    fn unparseable_file_naming_the_method_withholds_the_fix() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join("B.cs"), B).unwrap();
        std::fs::write(dir.path().join("Broken.cs"), "class D { void N(B b) { int x = 0; b.M(ref x); ").unwrap();
        let solution = Solution::load(dir.path()).unwrap();
        assert_eq!(solution.skipped().len(), 1);

        let model = ProgramModel::build(&solution);
        let findings = detect_all(&model, &RuleSet::only([RuleId::RemoveUnnecessaryRef])).unwrap();
        let result = apply_fix(&model, &findings[0], &CancellationToken::new());
        assert!(matches!(
            result,
            Err(AnalyzerError::UnboundCallSite { ref path, .. }) if path == "Broken.cs"
        ));
    }

    #[test]
    fn unparseable_file_without_the_name_does_not_block() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join("B.cs"), B).unwrap();
        std::fs::write(dir.path().join("Broken.cs"), "class D { void Mx() {").unwrap();
        let solution = Solution::load(dir.path()).unwrap();

        let model = ProgramModel::build(&solution);
        let findings = detect_all(&model, &RuleSet::only([RuleId::RemoveUnnecessaryRef])).unwrap();
        let outcome = apply_fix(&model, &findings[0], &CancellationToken::new())
            .unwrap()
            .unwrap();
        assert_eq!(
            outcome.solution.documents().next().unwrap().text(),
            "class B { public void M(int a) { } }"
        );
    }
}
