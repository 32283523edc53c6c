//! Definite assignment and data flow over a method body.
//!
//! A single forward pass over the statements tracks, for every reachable
//! program point, the set of variables that are definitely assigned. Loops
//! need no fixpoint: the sets only grow along a path, so the state at a
//! loop head is always the state on entry to the loop.
//!
//! Every variable declared outside the analysed block starts unassigned,
//! so a read of a `ref` parameter before any write inside the block shows
//! up in `data_flows_in`.

use std::collections::BTreeSet;

use sharpfix_core::patch::Span;
use sharpfix_cst::{NodeId, SyntaxKind, SyntaxTree, TokenId};
use tracing::debug;

use crate::semantic::binder::Binder;
use crate::semantic::interpolation::{is_interpolated, names_in_holes};
use crate::semantic::symbols::{PassMode, VariableId};
use crate::semantic::DataFlowAnalysis;
use crate::syntax::{declared_identifier, ArgumentView, IfView, InvocationView};

/// Definitely assigned variables at a program point.
#[derive(Debug, Clone, PartialEq, Eq)]
enum State {
    Reachable(BTreeSet<VariableId>),
    /// Every variable counts as assigned in unreachable code.
    Unreachable,
}

impl State {
    fn entry() -> State {
        State::Reachable(BTreeSet::new())
    }

    fn join(self, other: State) -> State {
        match (self, other) {
            (State::Unreachable, other) | (other, State::Unreachable) => other,
            (State::Reachable(a), State::Reachable(b)) => {
                State::Reachable(a.intersection(&b).copied().collect())
            }
        }
    }

    fn join_all(states: impl IntoIterator<Item = State>) -> State {
        states.into_iter().fold(State::Unreachable, State::join)
    }

    fn assign(&mut self, id: VariableId) {
        if let State::Reachable(set) = self {
            set.insert(id);
        }
    }

    fn is_assigned(&self, id: VariableId) -> bool {
        match self {
            State::Reachable(set) => set.contains(&id),
            State::Unreachable => true,
        }
    }

    fn is_reachable(&self) -> bool {
        matches!(self, State::Reachable(_))
    }
}

/// Returned when a construct the analysis does not model is found.
#[derive(Debug)]
struct Unsupported(SyntaxKind);

type Flow<T> = Result<T, Unsupported>;

/// `break` and `continue` targets of the innermost loop or switch.
#[derive(Debug, Default)]
struct JumpFrame {
    breaks: Vec<State>,
    continues: Vec<State>,
    is_loop: bool,
}

struct Analyzer<'a, 'm> {
    binder: &'a Binder<'m>,
    tree: &'m SyntaxTree,
    region: Span,
    written: BTreeSet<VariableId>,
    flows_in: BTreeSet<VariableId>,
    exits: Vec<State>,
    frames: Vec<JumpFrame>,
}

/// Analyze a method body: a block or an expression body.
pub fn analyze(binder: &Binder, body: NodeId) -> DataFlowAnalysis {
    let tree = binder.tree();
    let mut analyzer = Analyzer {
        binder,
        tree,
        region: tree.span(body),
        written: BTreeSet::new(),
        flows_in: BTreeSet::new(),
        exits: Vec::new(),
        frames: Vec::new(),
    };
    let end = match tree.kind(body) {
        SyntaxKind::Block => analyzer.statement(body, State::entry()),
        SyntaxKind::ArrowExpressionClause => match tree.child_nodes(body).next() {
            Some(expression) => analyzer.expression(expression, State::entry()),
            None => Err(Unsupported(SyntaxKind::ArrowExpressionClause)),
        },
        kind => Err(Unsupported(kind)),
    };
    match end {
        Ok(end) => analyzer.finish(end),
        Err(Unsupported(kind)) => {
            debug!(?kind, "data flow analysis does not support construct");
            DataFlowAnalysis::failed()
        }
    }
}

impl Analyzer<'_, '_> {
    fn finish(mut self, end: State) -> DataFlowAnalysis {
        self.exits.push(end);
        let mut reachable = self.exits.into_iter().filter_map(|state| match state {
            State::Reachable(set) => Some(set),
            State::Unreachable => None,
        });
        let always_assigned = match reachable.next() {
            Some(first) => reachable.fold(first, |acc, set| acc.intersection(&set).copied().collect()),
            None => BTreeSet::new(),
        };
        DataFlowAnalysis {
            succeeded: true,
            written_inside: self.written,
            always_assigned,
            data_flows_in: self.flows_in,
        }
    }

    fn is_outer(&self, id: VariableId) -> bool {
        !self.region.contains_offset(id.offset)
    }

    fn variable_at(&self, identifier: NodeId) -> Option<VariableId> {
        let name = self.tree.token(self.tree.first_token(identifier)).value_text();
        self.binder.lookup_variable(name, identifier).map(|v| v.id)
    }

    fn declared(&self, identifier: TokenId) -> VariableId {
        VariableId {
            document: self.binder.document().id(),
            offset: self.tree.token(identifier).offset,
        }
    }

    fn read(&mut self, id: VariableId, state: &State) {
        if self.is_outer(id) && state.is_reachable() && !state.is_assigned(id) {
            self.flows_in.insert(id);
        }
    }

    fn write(&mut self, id: VariableId, state: &mut State) {
        self.written.insert(id);
        state.assign(id);
    }

    // ------------------------------------------------------------------
    // Statements
    // ------------------------------------------------------------------

    fn statement(&mut self, node: NodeId, state: State) -> Flow<State> {
        let tree = self.tree;
        let kind = tree.kind(node);
        match kind {
            SyntaxKind::Block => {
                let mut state = state;
                for statement in tree.child_nodes(node) {
                    state = self.statement(statement, state)?;
                }
                Ok(state)
            }
            SyntaxKind::EmptyStatement => Ok(state),
            SyntaxKind::LocalDeclarationStatement => match tree
                .child_of_kind(node, SyntaxKind::VariableDeclaration)
            {
                Some(declaration) => self.variable_declaration(declaration, state),
                None => Err(Unsupported(kind)),
            },
            SyntaxKind::ExpressionStatement => self.first_expression(node, state),
            SyntaxKind::IfStatement => {
                let view = IfView::new(tree, node).ok_or(Unsupported(kind))?;
                let (when_true, when_false) = self.condition(view.condition, state)?;
                let after_then = self.statement(view.statement, when_true)?;
                let after_else = match view.else_statement {
                    Some(other) => self.statement(other, when_false)?,
                    None => when_false,
                };
                Ok(after_then.join(after_else))
            }
            SyntaxKind::WhileStatement => {
                let mut nodes = tree.child_nodes(node);
                let (Some(condition), Some(body)) = (nodes.next(), nodes.next()) else {
                    return Err(Unsupported(kind));
                };
                let (when_true, when_false) = self.condition(condition, state)?;
                let frame = self.in_loop(|this| this.statement(body, when_true))?;
                Ok(State::join_all(
                    std::iter::once(when_false).chain(frame.breaks),
                ))
            }
            SyntaxKind::DoStatement => {
                let mut nodes = tree.child_nodes(node);
                let (Some(body), Some(condition)) = (nodes.next(), nodes.next()) else {
                    return Err(Unsupported(kind));
                };
                let frame = self.in_loop(|this| this.statement(body, state))?;
                let before_condition = State::join_all(frame.continues);
                let (_, when_false) = self.condition(condition, before_condition)?;
                Ok(State::join_all(
                    std::iter::once(when_false).chain(frame.breaks),
                ))
            }
            SyntaxKind::ForStatement => self.for_statement(node, state),
            SyntaxKind::ForEachStatement => {
                let mut nodes = tree.child_nodes(node);
                let (Some(_), Some(collection), Some(body)) =
                    (nodes.next(), nodes.next(), nodes.next())
                else {
                    return Err(Unsupported(kind));
                };
                let after_collection = self.expression(collection, state)?;
                let mut in_body = after_collection.clone();
                if let Some(identifier) = declared_identifier(tree, node) {
                    let id = self.declared(identifier);
                    self.write(id, &mut in_body);
                }
                let frame = self.in_loop(|this| this.statement(body, in_body))?;
                Ok(State::join_all(
                    std::iter::once(after_collection).chain(frame.breaks),
                ))
            }
            SyntaxKind::ReturnStatement => {
                let state = self.first_expression(node, state)?;
                self.exits.push(state);
                Ok(State::Unreachable)
            }
            SyntaxKind::YieldBreakStatement => {
                self.exits.push(state);
                Ok(State::Unreachable)
            }
            SyntaxKind::YieldReturnStatement => self.first_expression(node, state),
            SyntaxKind::ThrowStatement => {
                self.first_expression(node, state)?;
                Ok(State::Unreachable)
            }
            SyntaxKind::BreakStatement => {
                let frame = self.frames.last_mut().ok_or(Unsupported(kind))?;
                frame.breaks.push(state);
                Ok(State::Unreachable)
            }
            SyntaxKind::ContinueStatement => {
                let frame = self
                    .frames
                    .iter_mut()
                    .rev()
                    .find(|f| f.is_loop)
                    .ok_or(Unsupported(kind))?;
                frame.continues.push(state);
                Ok(State::Unreachable)
            }
            SyntaxKind::TryStatement => self.try_statement(node, state),
            SyntaxKind::SwitchStatement => self.switch_statement(node, state),
            SyntaxKind::UsingStatement => {
                let mut state = state;
                let mut body = None;
                for child in tree.child_nodes(node) {
                    if tree.kind(child) == SyntaxKind::VariableDeclaration {
                        state = self.variable_declaration(child, state)?;
                    } else if tree.kind(child).is_statement() {
                        body = Some(child);
                    } else {
                        state = self.expression(child, state)?;
                    }
                }
                match body {
                    Some(body) => self.statement(body, state),
                    None => Err(Unsupported(kind)),
                }
            }
            SyntaxKind::LockStatement => {
                let mut nodes = tree.child_nodes(node);
                let (Some(lock), Some(body)) = (nodes.next(), nodes.next()) else {
                    return Err(Unsupported(kind));
                };
                let state = self.expression(lock, state)?;
                self.statement(body, state)
            }
            _ => Err(Unsupported(kind)),
        }
    }

    /// Run `body` inside a fresh loop frame and return the frame.
    fn in_loop(&mut self, body: impl FnOnce(&mut Self) -> Flow<State>) -> Flow<JumpFrame> {
        self.frames.push(JumpFrame {
            is_loop: true,
            ..JumpFrame::default()
        });
        let result = body(self);
        let mut frame = self.frames.pop().unwrap_or_default();
        // The end of the body flows back to the loop head like a continue.
        frame.continues.push(result?);
        Ok(frame)
    }

    fn first_expression(&mut self, statement: NodeId, state: State) -> Flow<State> {
        match self.tree.child_nodes(statement).next() {
            Some(expression) => self.expression(expression, state),
            None => Ok(state),
        }
    }

    fn variable_declaration(&mut self, declaration: NodeId, state: State) -> Flow<State> {
        let tree = self.tree;
        let mut state = state;
        for declarator in tree.children_of_kind(declaration, SyntaxKind::VariableDeclarator) {
            let Some(clause) = tree.child_of_kind(declarator, SyntaxKind::EqualsValueClause) else {
                continue;
            };
            if let Some(value) = tree.child_nodes(clause).next() {
                state = self.expression(value, state)?;
            }
            if let Some(identifier) = tree.child_tokens(declarator).next() {
                let id = self.declared(identifier);
                self.write(id, &mut state);
            }
        }
        Ok(state)
    }

    fn for_statement(&mut self, node: NodeId, state: State) -> Flow<State> {
        let tree = self.tree;
        // Sections are separated by the two `;` tokens; the body follows `)`.
        let mut sections: [Vec<NodeId>; 3] = Default::default();
        let mut section = 0;
        let mut body = None;
        for &child in tree.children(node) {
            match (child.as_token(), child.as_node()) {
                (Some(token), _) if tree.token(token).is_punct(";") => section += 1,
                (Some(token), _) if tree.token(token).is_punct(")") => section = 3,
                (_, Some(n)) if section < 3 => sections[section].push(n),
                (_, Some(n)) => body = Some(n),
                _ => {}
            }
        }
        let body = body.ok_or(Unsupported(SyntaxKind::ForStatement))?;
        let [initializers, condition, incrementors] = sections;

        let mut state = state;
        for initializer in initializers {
            state = if tree.kind(initializer) == SyntaxKind::VariableDeclaration {
                self.variable_declaration(initializer, state)?
            } else {
                self.expression(initializer, state)?
            };
        }
        let (when_true, when_false) = match condition.first() {
            Some(&condition) => self.condition(condition, state)?,
            None => (state, State::Unreachable),
        };
        let frame = self.in_loop(|this| this.statement(body, when_true))?;
        let mut back = State::join_all(frame.continues);
        for incrementor in incrementors {
            back = self.expression(incrementor, back)?;
        }
        Ok(State::join_all(
            std::iter::once(when_false).chain(frame.breaks),
        ))
    }

    fn try_statement(&mut self, node: NodeId, state: State) -> Flow<State> {
        let tree = self.tree;
        let mut after = State::Unreachable;
        let mut finally = None;
        for child in tree.child_nodes(node) {
            match tree.kind(child) {
                SyntaxKind::Block => after = after.join(self.statement(child, state.clone())?),
                SyntaxKind::CatchClause => {
                    // A catch may run before anything in the try block.
                    let mut in_catch = state.clone();
                    for part in tree.child_nodes(child) {
                        match tree.kind(part) {
                            SyntaxKind::CatchDeclaration => {
                                if let Some(identifier) = declared_identifier(tree, part) {
                                    let id = self.declared(identifier);
                                    self.write(id, &mut in_catch);
                                }
                            }
                            SyntaxKind::Block => in_catch = self.statement(part, in_catch)?,
                            _ => in_catch = self.expression(part, in_catch)?,
                        }
                    }
                    after = after.join(in_catch);
                }
                SyntaxKind::FinallyClause => finally = tree.child_nodes(child).next(),
                kind => return Err(Unsupported(kind)),
            }
        }
        let Some(finally) = finally else {
            return Ok(after);
        };
        match (self.statement(finally, state)?, after) {
            (State::Reachable(in_finally), State::Reachable(mut assigned)) => {
                assigned.extend(in_finally);
                Ok(State::Reachable(assigned))
            }
            _ => Ok(State::Unreachable),
        }
    }

    fn switch_statement(&mut self, node: NodeId, state: State) -> Flow<State> {
        let tree = self.tree;
        let mut nodes = tree.child_nodes(node);
        let governing = nodes.next().ok_or(Unsupported(SyntaxKind::SwitchStatement))?;
        let state = self.expression(governing, state)?;
        let mut has_default = false;

        self.frames.push(JumpFrame::default());
        let mut result = Ok(());
        for section in nodes {
            let mut in_section = state.clone();
            for part in tree.child_nodes(section) {
                let step = match tree.kind(part) {
                    SyntaxKind::DefaultSwitchLabel => {
                        has_default = true;
                        Ok(in_section)
                    }
                    SyntaxKind::CaseSwitchLabel => self.case_label(part, in_section),
                    _ => self.statement(part, in_section),
                };
                match step {
                    Ok(next) => in_section = next,
                    Err(e) => {
                        result = Err(e);
                        in_section = State::Unreachable;
                        break;
                    }
                }
            }
            if let Some(frame) = self.frames.last_mut() {
                frame.breaks.push(in_section);
            }
            if result.is_err() {
                break;
            }
        }
        let frame = self.frames.pop().unwrap_or_default();
        result?;
        let fallthrough = if has_default {
            State::Unreachable
        } else {
            state
        };
        Ok(State::join_all(
            std::iter::once(fallthrough).chain(frame.breaks),
        ))
    }

    fn case_label(&mut self, label: NodeId, state: State) -> Flow<State> {
        let mut state = state;
        for part in self.tree.child_nodes(label) {
            state = self.expression(part, state)?;
        }
        Ok(state)
    }

    // ------------------------------------------------------------------
    // Expressions
    // ------------------------------------------------------------------

    /// States after `node` evaluates to true and to false.
    fn condition(&mut self, node: NodeId, state: State) -> Flow<(State, State)> {
        let tree = self.tree;
        match tree.kind(node) {
            SyntaxKind::ParenthesizedExpression => match tree.child_nodes(node).next() {
                Some(inner) => self.condition(inner, state),
                None => Ok((state.clone(), state)),
            },
            SyntaxKind::PrefixUnaryExpression if tree.token(tree.first_token(node)).is_punct("!") => {
                match tree.child_nodes(node).next() {
                    Some(operand) => {
                        let (t, f) = self.condition(operand, state)?;
                        Ok((f, t))
                    }
                    None => Ok((state.clone(), state)),
                }
            }
            SyntaxKind::LiteralExpression => {
                let token = tree.token(tree.first_token(node));
                if token.is_keyword("true") {
                    Ok((state, State::Unreachable))
                } else if token.is_keyword("false") {
                    Ok((State::Unreachable, state))
                } else {
                    let state = self.expression(node, state)?;
                    Ok((state.clone(), state))
                }
            }
            SyntaxKind::BinaryExpression if binary_operator(tree, node) == "&&" => {
                let (left, right) = operands(tree, node)?;
                let (lt, lf) = self.condition(left, state)?;
                let (rt, rf) = self.condition(right, lt)?;
                Ok((rt, lf.join(rf)))
            }
            SyntaxKind::BinaryExpression if binary_operator(tree, node) == "||" => {
                let (left, right) = operands(tree, node)?;
                let (lt, lf) = self.condition(left, state)?;
                let (rt, rf) = self.condition(right, lf)?;
                Ok((lt.join(rt), rf))
            }
            _ => {
                let state = self.expression(node, state)?;
                Ok((state.clone(), state))
            }
        }
    }

    fn expression(&mut self, node: NodeId, state: State) -> Flow<State> {
        let tree = self.tree;
        let kind = tree.kind(node);
        let mut state = state;
        match kind {
            SyntaxKind::IdentifierName => {
                if let Some(id) = self.variable_at(node) {
                    self.read(id, &state);
                }
                Ok(state)
            }
            SyntaxKind::LiteralExpression => {
                self.interpolation(node, &state);
                Ok(state)
            }
            SyntaxKind::ThisExpression
            | SyntaxKind::BaseExpression
            | SyntaxKind::PredefinedType
            | SyntaxKind::GenericName
            | SyntaxKind::QualifiedName
            | SyntaxKind::MemberBindingExpression
            | SyntaxKind::TypeOfExpression
            | SyntaxKind::DefaultExpression
            | SyntaxKind::TypePattern
            | SyntaxKind::NameColon => Ok(state),
            SyntaxKind::SimpleLambdaExpression | SyntaxKind::ParenthesizedLambdaExpression => {
                Err(Unsupported(kind))
            }
            SyntaxKind::MemberAccessExpression => match tree.child_nodes(node).next() {
                Some(receiver) => self.expression(receiver, state),
                None => Ok(state),
            },
            SyntaxKind::ConditionalAccessExpression => {
                let mut nodes = tree.child_nodes(node);
                if let Some(receiver) = nodes.next() {
                    state = self.expression(receiver, state)?;
                }
                match nodes.next() {
                    Some(when_not_null) => {
                        let evaluated = self.expression(when_not_null, state.clone())?;
                        Ok(state.join(evaluated))
                    }
                    None => Ok(state),
                }
            }
            SyntaxKind::InvocationExpression => self.invocation(node, state),
            SyntaxKind::AssignmentExpression => self.assignment(node, state),
            SyntaxKind::PrefixUnaryExpression | SyntaxKind::PostfixUnaryExpression => {
                let Some(operand) = tree.child_nodes(node).next() else {
                    return Ok(state);
                };
                let increments = tree
                    .child_tokens(node)
                    .any(|t| tree.token(t).is_punct("++") || tree.token(t).is_punct("--"));
                state = self.expression(operand, state)?;
                if increments {
                    self.assign_target(operand, &mut state)?;
                }
                Ok(state)
            }
            SyntaxKind::BinaryExpression => match binary_operator(tree, node).as_str() {
                "&&" | "||" => {
                    let (t, f) = self.condition(node, state)?;
                    Ok(t.join(f))
                }
                "??" => {
                    let (left, right) = operands(tree, node)?;
                    state = self.expression(left, state)?;
                    let evaluated = self.expression(right, state.clone())?;
                    Ok(state.join(evaluated))
                }
                _ => self.children(node, state),
            },
            SyntaxKind::ConditionalExpression => {
                let mut nodes = tree.child_nodes(node);
                let (Some(test), Some(when_true), Some(when_false)) =
                    (nodes.next(), nodes.next(), nodes.next())
                else {
                    return Err(Unsupported(kind));
                };
                let (t, f) = self.condition(test, state)?;
                let t = self.expression(when_true, t)?;
                let f = self.expression(when_false, f)?;
                Ok(t.join(f))
            }
            SyntaxKind::CastExpression => match tree.child_nodes(node).nth(1) {
                Some(operand) => self.expression(operand, state),
                None => Ok(state),
            },
            SyntaxKind::AsExpression => match tree.child_nodes(node).next() {
                Some(operand) => self.expression(operand, state),
                None => Ok(state),
            },
            SyntaxKind::ObjectCreationExpression | SyntaxKind::ArrayCreationExpression => {
                for child in tree.child_nodes(node) {
                    if !tree.kind(child).is_type() {
                        state = self.expression(child, state)?;
                    }
                }
                Ok(state)
            }
            SyntaxKind::DeclarationExpression | SyntaxKind::DeclarationPattern => {
                self.declare(node, &mut state);
                Ok(state)
            }
            SyntaxKind::ThrowExpression => {
                self.children(node, state)?;
                Ok(State::Unreachable)
            }
            _ => self.children(node, state),
        }
    }

    /// Evaluate every child node in order.
    fn children(&mut self, node: NodeId, state: State) -> Flow<State> {
        let mut state = state;
        for child in self.tree.child_nodes(node) {
            state = self.expression(child, state)?;
        }
        Ok(state)
    }

    fn invocation(&mut self, node: NodeId, state: State) -> Flow<State> {
        let tree = self.tree;
        let view = InvocationView::new(tree, node).ok_or(Unsupported(SyntaxKind::InvocationExpression))?;
        let mut state = self.expression(view.callee, state)?;
        for argument in view.argument_views(tree) {
            state = self.argument(&argument, state)?;
        }
        Ok(state)
    }

    fn argument(&mut self, argument: &ArgumentView, state: State) -> Flow<State> {
        let tree = self.tree;
        let mode = argument
            .ref_kind_text(tree)
            .and_then(PassMode::from_keyword)
            .unwrap_or(PassMode::Value);
        let mut state = state;
        match mode {
            PassMode::Out => self.assign_target(argument.expression, &mut state)?,
            PassMode::Ref => {
                state = self.expression(argument.expression, state)?;
                self.assign_target(argument.expression, &mut state)?;
            }
            PassMode::Value | PassMode::In => {
                state = self.expression(argument.expression, state)?;
            }
        }
        Ok(state)
    }

    fn assignment(&mut self, node: NodeId, state: State) -> Flow<State> {
        let tree = self.tree;
        let (target, value) = operands(tree, node)?;
        let operator: String = tree
            .child_tokens(node)
            .map(|t| tree.token(t).text.as_str())
            .collect();
        let mut state = state;
        match operator.as_str() {
            "=" => {
                if !is_simple_target(tree, target) {
                    state = self.target_receivers(target, state)?;
                }
                state = self.expression(value, state)?;
            }
            "??=" => {
                state = self.expression(target, state)?;
                let evaluated = self.expression(value, state.clone())?;
                state = state.join(evaluated);
            }
            _ => {
                state = self.expression(target, state)?;
                state = self.expression(value, state)?;
            }
        }
        self.assign_target(target, &mut state)?;
        Ok(state)
    }

    /// Reads performed by an assignment target that is not a variable:
    /// `a.b = ..` reads `a`, `a[i] = ..` reads `a` and `i`.
    fn target_receivers(&mut self, target: NodeId, state: State) -> Flow<State> {
        match self.tree.kind(target) {
            SyntaxKind::TupleExpression => {
                let mut state = state;
                for argument in self.tree.children_of_kind(target, SyntaxKind::Argument) {
                    if let Some(view) = ArgumentView::new(self.tree, argument) {
                        if !is_simple_target(self.tree, view.expression) {
                            state = self.target_receivers(view.expression, state)?;
                        }
                    }
                }
                Ok(state)
            }
            _ => self.expression(target, state),
        }
    }

    /// Record a write to whatever variables `target` names.
    fn assign_target(&mut self, target: NodeId, state: &mut State) -> Flow<()> {
        let tree = self.tree;
        match tree.kind(target) {
            SyntaxKind::IdentifierName => {
                if let Some(id) = self.variable_at(target) {
                    self.write(id, state);
                }
            }
            SyntaxKind::ParenthesizedExpression => {
                if let Some(inner) = tree.child_nodes(target).next() {
                    self.assign_target(inner, state)?;
                }
            }
            SyntaxKind::DeclarationExpression => self.declare(target, state),
            SyntaxKind::TupleExpression => {
                for argument in tree.children_of_kind(target, SyntaxKind::Argument) {
                    if let Some(view) = ArgumentView::new(tree, argument) {
                        self.assign_target(view.expression, state)?;
                    }
                }
            }
            _ => {}
        }
        Ok(())
    }

    /// Declare and assign every designation under a declaration.
    fn declare(&mut self, node: NodeId, state: &mut State) {
        let tree = self.tree;
        let designations: Vec<NodeId> = std::iter::once(node)
            .chain(tree.descendants(node))
            .filter(|&n| tree.kind(n) == SyntaxKind::SingleVariableDesignation)
            .collect();
        for designation in designations {
            let id = self.declared(tree.first_token(designation));
            self.write(id, state);
        }
    }

    /// Reads of variables named inside interpolation holes.
    fn interpolation(&mut self, literal: NodeId, state: &State) {
        let tree = self.tree;
        let text = tree.text(literal);
        if !is_interpolated(text) {
            return;
        }
        for name in names_in_holes(text) {
            if name.after_dot || name.called {
                continue;
            }
            if let Some(variable) = self.binder.lookup_variable(&name.name, literal) {
                self.read(variable.id, state);
            }
        }
    }
}

fn binary_operator(tree: &SyntaxTree, node: NodeId) -> String {
    tree.child_tokens(node)
        .map(|t| tree.token(t).text.as_str())
        .collect()
}

fn operands(tree: &SyntaxTree, node: NodeId) -> Flow<(NodeId, NodeId)> {
    let mut nodes = tree.child_nodes(node);
    match (nodes.next(), nodes.next()) {
        (Some(left), Some(right)) => Ok((left, right)),
        _ => Err(Unsupported(tree.kind(node))),
    }
}

/// Targets that are written without reading anything.
fn is_simple_target(tree: &SyntaxTree, target: NodeId) -> bool {
    matches!(
        tree.kind(target),
        SyntaxKind::IdentifierName | SyntaxKind::DeclarationExpression
    )
}
