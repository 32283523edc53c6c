//! ACNU0001 / ACNU0002: `ref` parameters that do not need to be `ref`.
//!
//! A `ref` parameter that the method never writes can be passed by value.
//! One that is written on every path before its incoming value is read can
//! be `out`.

use sharpfix_cst::NodeId;
use tracing::debug;

use crate::detectors::declared_method;
use crate::error::AnalyzerResult;
use crate::finding::{Finding, RuleId};
use crate::semantic::binder::Binder;
use crate::semantic::{SemanticModel, VariableId};
use crate::syntax::{MethodView, ParameterView};

pub fn detect(binder: &Binder, parameter: NodeId) -> AnalyzerResult<Option<Finding>> {
    let tree = binder.tree();
    let Some(view) = ParameterView::new(tree, parameter) else {
        return Ok(None);
    };
    if view.single_modifier(tree) != Some("ref") {
        return Ok(None);
    }
    let ref_token = view.modifiers[0];

    let Some(method_node) = tree.parent(parameter).and_then(|list| tree.parent(list)) else {
        return Ok(None);
    };
    let Some(method) = MethodView::new(tree, method_node) else {
        return Ok(None);
    };
    let Some(body) = method.body else {
        return Ok(None);
    };
    if method.has_modifier(tree, "virtual") || method.has_modifier(tree, "override") {
        return Ok(None);
    }

    let model = binder.model();
    let symbol = declared_method(binder, method_node)?;
    if symbol.is_explicit_interface_implementation() || model.implements_interface(symbol.id) {
        return Ok(None);
    }

    let document = binder.document().id();
    let flow = model.analyze_data_flow(document, body);
    if !flow.succeeded {
        debug!(
            method = %symbol.name,
            parameter = view.name_text(tree),
            "data flow analysis failed, skipping parameter"
        );
        return Ok(None);
    }

    let variable = VariableId {
        document,
        offset: tree.token(view.name).offset,
    };
    let rule = if !flow.written_inside.contains(&variable) {
        RuleId::RemoveUnnecessaryRef
    } else if flow.always_assigned.contains(&variable) && !flow.data_flows_in.contains(&variable) {
        RuleId::ConvertRefToOut
    } else {
        return Ok(None);
    };
    Ok(Some(Finding::new(
        rule,
        document,
        tree.token(ref_token).span(),
        vec![view.name_text(tree).to_string()],
    )))
}
