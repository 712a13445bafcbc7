//! `while` and `for` loops.

use tessera_core::{GenericRoot, ScopeKind, Span, TypeId, TypeTable};
use tessera_registry::{MethodId, MethodKind};
use tessera_syntax::{ForExpr, WhileExpr};

use crate::entities::{VarDecl, VarFlags};
use crate::typed::{ForLoop, Typed, TypedKind};

use super::super::{Analyzer, Result};

/// Host methods a `for` loop is expanded into.
struct LoopMethods {
    get_length: MethodId,
    get: MethodId,
    less: MethodId,
    add: MethodId,
}

impl Analyzer<'_> {
    /// Analyze `while cond { body }`.
    ///
    /// Condition and body share one pool region; each releases its
    /// temporaries as soon as it is done, so nothing is live across the
    /// back edge.
    pub(crate) fn while_expr(&mut self, expr: &WhileExpr<'_>) -> Result<Typed> {
        self.enter(ScopeKind::While);
        let root = self.push_region();

        let cond = self.condition(expr.cond)?;
        self.release_all(&cond.temps)?;
        let body = self.expr(expr.body)?;
        self.release_all(&body.temps)?;

        self.pop_region(root)?;
        self.leave("while")?;

        let deterministic = cond.deterministic && body.deterministic;
        let kind = TypedKind::While {
            cond: Box::new(cond),
            body: Box::new(body),
        };
        Ok(Typed::new(kind, TypeTable::VOID, expr.span).with_deterministic(deterministic))
    }

    /// Analyze `for binding in iterable { body }` over an array.
    ///
    /// The loop owns an index, a length and a condition slot for its whole
    /// duration; the iterable's temporaries also stay live until the loop
    /// ends.
    pub(crate) fn for_expr(&mut self, expr: &ForExpr<'_>) -> Result<Typed> {
        let iterable = self.expr(expr.iterable)?;
        let elem = if iterable.is_invalid() {
            None
        } else if self.session.types.instance_root(iterable.ty) == Some(GenericRoot::Array) {
            self.session.types.element_type(iterable.ty)
        } else {
            let message = format!("cannot iterate over a value of type '{}'", self.display(iterable.ty));
            self.mismatch(message, iterable.span);
            None
        };
        let methods = match elem {
            Some(_) => self.loop_methods(iterable.ty, iterable.span),
            None => None,
        };

        let qualifier = self.enter(ScopeKind::For);
        let binding = self.declare_var(VarDecl {
            qualifier,
            name: expr.binding.name.to_string(),
            ty: elem.unwrap_or(TypeTable::UNKNOWN),
            flags: VarFlags::empty(),
            sync: None,
            default: None,
            span: expr.binding.span,
        });
        let index = self.retain(TypeTable::INT);
        let length = self.retain(TypeTable::INT);
        let cond = self.retain(TypeTable::BOOL);

        let root = self.push_region();
        let body = self.expr(expr.body)?;
        self.release_all(&body.temps)?;
        self.pop_region(root)?;

        self.release_all(&[index, length, cond])?;
        self.leave("for")?;
        self.release_all(&iterable.temps)?;

        let (Some(binding), Some(methods)) = (binding, methods) else {
            return Ok(Typed::invalid(expr.span));
        };
        let deterministic = iterable.deterministic && body.deterministic;
        let zero = self.session.literals.int(0);
        let one = self.session.literals.int(1);
        let lowered = ForLoop {
            binding,
            iterable,
            body,
            index,
            length,
            cond,
            get_length: methods.get_length,
            get: methods.get,
            less: methods.less,
            add: methods.add,
            zero,
            one,
        };
        Ok(
            Typed::new(TypedKind::For(Box::new(lowered)), TypeTable::VOID, expr.span)
                .with_deterministic(deterministic),
        )
    }

    fn loop_methods(&mut self, array: TypeId, span: Span) -> Option<LoopMethods> {
        let int = TypeTable::INT;
        let get_length = self.resolve_method(array, "get_Length", MethodKind::Instance, &[array], span);
        let get = self.resolve_method(array, "Get", MethodKind::Instance, &[array, int], span);
        let less = self.resolve_method(int, "op_LessThan", MethodKind::Static, &[int, int], span);
        let add = self.resolve_method(int, "op_Addition", MethodKind::Static, &[int, int], span);
        Some(LoopMethods {
            get_length: get_length?,
            get: get?,
            less: less?,
            add: add?,
        })
    }
}
