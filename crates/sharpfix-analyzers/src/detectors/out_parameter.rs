//! ACNU0010 / ACNU0011: void methods that return results through `out`
//! parameters.

use sharpfix_cst::NodeId;

use crate::detectors::declared_method;
use crate::error::AnalyzerResult;
use crate::finding::{Finding, RuleId};
use crate::semantic::binder::Binder;
use crate::semantic::SemanticModel;
use crate::syntax::{MethodView, ParameterView};

pub fn detect(binder: &Binder, method_node: NodeId) -> AnalyzerResult<Option<Finding>> {
    let tree = binder.tree();
    let Some(method) = MethodView::new(tree, method_node) else {
        return Ok(None);
    };
    if tree.text(method.return_type) != "void" {
        return Ok(None);
    }
    if method.body.is_none()
        || method.has_modifier(tree, "virtual")
        || method.has_modifier(tree, "override")
    {
        return Ok(None);
    }
    let parameters = method.parameters(tree);
    if parameters.is_empty() {
        return Ok(None);
    }

    let out_parameters: Vec<ParameterView> = parameters
        .items
        .iter()
        .filter_map(|&p| ParameterView::new(tree, p))
        .filter(|p| p.single_modifier(tree) == Some("out"))
        .collect();
    if out_parameters.is_empty() || out_parameters.iter().any(|p| !p.attributes.is_empty()) {
        return Ok(None);
    }

    let symbol = declared_method(binder, method_node)?;
    if symbol.is_explicit_interface_implementation()
        || binder.model().implements_interface(symbol.id)
    {
        return Ok(None);
    }

    let document = binder.document().id();
    let arguments = vec![symbol.name.clone()];
    let finding = match out_parameters.as_slice() {
        [single] => Finding::new(
            RuleId::OutParameterToReturn,
            document,
            tree.token(single.modifiers[0]).span(),
            arguments,
        ),
        _ => Finding::new(
            RuleId::OutParametersToTuple,
            document,
            tree.span(method.return_type),
            arguments,
        ),
    };
    Ok(Some(finding))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::detectors::tests::findings_for;

    fn found(source: &str) -> Vec<(RuleId, String, String)> {
        findings_for(source)
            .into_iter()
            .filter(|f| matches!(f.rule, RuleId::OutParameterToReturn | RuleId::OutParametersToTuple))
            .map(|f| {
                (
                    f.rule,
                    f.arguments[0].clone(),
                    source[f.span.start..f.span.end].to_string(),
                )
            })
            .collect()
    }

    #[test]
    fn single_out_parameter_is_reported_at_out() {
        assert_eq!(
            found("class Test { void MethodA(out int a) { a = 1; } }"),
            vec![(RuleId::OutParameterToReturn, "MethodA".to_string(), "out".to_string())]
        );
        assert_eq!(
            found("class Test { void MethodA(string s, out int a) { a = 1; } }").len(),
            1
        );
    }

    #[test]
    fn several_out_parameters_are_reported_at_the_return_type() {
        let source = "class Test { void MethodA(out string s, out int a) { a = 1; s = \"\"; } }";
        assert_eq!(
            found(source),
            vec![(RuleId::OutParametersToTuple, "MethodA".to_string(), "void".to_string())]
        );
    }

    #[test]
    fn methods_without_out_parameters_are_ignored() {
        assert!(found("class Test { void MethodA(string s, int a) { a = 1; } }").is_empty());
        assert!(found("class Test { void MethodA() { } }").is_empty());
    }

    #[test]
    fn non_void_and_bodiless_methods_are_ignored() {
        assert!(found("class Test { int MethodA(out string s) { s = \"\"; return 0; } }").is_empty());
        assert!(found("abstract class Test { public abstract void MethodA(out string s); }").is_empty());
    }

    #[test]
    fn virtual_override_and_interface_methods_are_ignored() {
        let sources = [
            "class Test { public virtual void MethodA(out string s) { s = \"\"; } }",
            "abstract class A { public abstract void MethodA(out string s); }
             class B : A { public override void MethodA(out string s) { s = \"\"; } }",
            "interface I { void MethodA(out string s); }
             class B : I { public void MethodA(out string s) { s = \"\"; } }",
            "interface I { void MethodA(out string s); }
             class B : I { void I.MethodA(out string s) { s = \"\"; } }",
        ];
        for source in sources {
            assert!(found(source).is_empty(), "{}", source);
        }
    }

    #[test]
    fn generic_interface_implementations_are_ignored() {
        let sources = [
            "interface I<T> { void N(out T b); }
             class C : I<int> { public void N(out int b) { b = 1; } }",
            "interface I<T> { void N(out T b, out T c); }
             class C : I<string> { public void N(out string b, out string c) { b = c = \"\"; } }",
            "interface I { void N<U>(out U b); }
             class C : I { public void N<U>(out U b) { b = default; } }",
        ];
        for source in sources {
            assert!(found(source).is_empty(), "{}", source);
        }
    }

    #[test]
    fn attributed_out_parameters_are_ignored() {
        let source = "class Test {
            public void MethodA([System.ComponentModel.Description(\"\")] out string s) { s = \"\"; }
        }";
        assert!(found(source).is_empty());
    }
}
