//! End-to-end tests for ACNU0010 (single `out` parameter to return value)
//! and ACNU0011 (several `out` parameters to a returned tuple).

mod support;

use sharpfix_analyzers::RuleId;
use support::{anchors, findings, fix_first, fix_one};

mod single {
    use super::*;

    #[test]
    fn out_parameter_becomes_the_return_value() {
        let texts = fix_first(
            &[
                ("Lib.cs", "class Lib { public void M(out int a) { a = 1; } }"),
                ("App.cs", "class App { void Run(Lib lib) { int x; lib.M(out x); } }"),
            ],
            RuleId::OutParameterToReturn,
        );
        assert_eq!(texts[0], "class Lib { public int M() { int a; a = 1; return a; } }");
        assert_eq!(texts[1], "class App { void Run(Lib lib) { int x; x = lib.M(); } }");
    }

    #[test]
    fn inline_declarations_become_declarations() {
        let fixed = fix_one(
            "class C { void M(string s, out int n) { n = s.Length; } void N() { M(\"a\", out var n); } }",
            RuleId::OutParameterToReturn,
        );
        assert_eq!(
            fixed,
            "class C { int M(string s) { int n; n = s.Length; return n; } void N() { var n = M(\"a\"); } }"
        );
    }

    #[test]
    fn multi_line_body_keeps_its_layout() {
        let source = "class C
{
    void M(int n, out int a)
    {
        // double it
        a = n * 2;
    }
}";
        let expected = "class C
{
    int M(int n)
    {
        int a;
        // double it
        a = n * 2;
        return a;
    }
}";
        assert_eq!(fix_one(source, RuleId::OutParameterToReturn), expected);
    }

    #[test]
    fn fixed_method_is_not_reported_again() {
        let fixed = fix_one("class C { void M(out int a) { a = 1; } }", RuleId::OutParameterToReturn);
        assert!(anchors(&fixed).is_empty());
    }

    #[test]
    fn attributed_or_non_void_methods_are_not_reported() {
        assert!(findings(
            &[("C.cs", "class C { void M([Out] out int a) { a = 1; } }")],
            RuleId::OutParameterToReturn
        )
        .is_empty());
        assert!(findings(
            &[("C.cs", "class C { bool M(out int a) { a = 1; return true; } }")],
            RuleId::OutParameterToReturn
        )
        .is_empty());
    }
}

mod tuple {
    use super::*;

    const SOURCE: &str = "class C
{
    void Split(string s, out string head, out int rest)
    {
        head = s;
        rest = 0;
    }

    void Use()
    {
        Split(\"ab\", out var h, out var r);
        string a;
        int b;
        Split(\"cd\", out a, out b);
    }
}";

    #[test]
    fn reported_at_the_return_type() {
        let found = findings(&[("C.cs", SOURCE)], RuleId::OutParametersToTuple);
        assert_eq!(found.len(), 1);
        assert_eq!(&SOURCE[found[0].span.start..found[0].span.end], "void");
        assert_eq!(found[0].arguments, vec!["Split".to_string()]);
    }

    #[test]
    fn out_parameters_become_a_named_tuple() {
        let expected = "class C
{
    (string head, int rest) Split(string s)
    {
        string head;
        int rest;
        head = s;
        rest = 0;
        return (head, rest);
    }

    void Use()
    {
        (var h, var r) = Split(\"ab\");
        string a;
        int b;
        (a, b) = Split(\"cd\");
    }
}";
        assert_eq!(fix_one(SOURCE, RuleId::OutParametersToTuple), expected);
    }
}
