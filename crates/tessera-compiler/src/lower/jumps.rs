//! Loop targets for `break` and `continue`.

use tessera_core::InternalError;

/// Labels of one enclosing loop.
#[derive(Debug, Clone)]
struct LoopTargets {
    /// Where `continue` jumps: the condition of a `while`, the step of a `for`.
    continue_label: String,
    /// Where `break` jumps: just past the loop.
    break_label: String,
}

/// Stack of enclosing loops, innermost last.
#[derive(Debug, Default)]
pub(super) struct LoopStack {
    loops: Vec<LoopTargets>,
}

impl LoopStack {
    pub(super) fn enter(&mut self, continue_label: String, break_label: String) {
        self.loops.push(LoopTargets {
            continue_label,
            break_label,
        });
    }

    pub(super) fn exit(&mut self) -> Result<(), InternalError> {
        self.loops
            .pop()
            .map(|_| ())
            .ok_or(InternalError::ScopeUnderflow { context: "loop" })
    }

    pub(super) fn break_label(&self) -> Result<String, InternalError> {
        self.loops
            .last()
            .map(|l| l.break_label.clone())
            .ok_or_else(|| InternalError::malformed("'break' outside of a loop"))
    }

    pub(super) fn continue_label(&self) -> Result<String, InternalError> {
        self.loops
            .last()
            .map(|l| l.continue_label.clone())
            .ok_or_else(|| InternalError::malformed("'continue' outside of a loop"))
    }

    pub(super) fn depth(&self) -> usize {
        self.loops.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn innermost_loop_wins() {
        let mut loops = LoopStack::default();
        loops.enter("outer_top".into(), "outer_end".into());
        loops.enter("inner_step".into(), "inner_end".into());
        assert_eq!(loops.break_label().unwrap(), "inner_end");
        assert_eq!(loops.continue_label().unwrap(), "inner_step");

        loops.exit().unwrap();
        assert_eq!(loops.break_label().unwrap(), "outer_end");
        assert_eq!(loops.depth(), 1);
    }

    #[test]
    fn jumps_without_a_loop_are_malformed() {
        let mut loops = LoopStack::default();
        assert!(matches!(loops.break_label(), Err(InternalError::Malformed { .. })));
        assert!(matches!(loops.continue_label(), Err(InternalError::Malformed { .. })));
        assert_eq!(
            loops.exit(),
            Err(InternalError::ScopeUnderflow { context: "loop" })
        );
    }
}
