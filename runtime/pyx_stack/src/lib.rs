//! Stack growth for the recursive parts of the embedded engine.
//!
//! Both the parser and the tree-walking interpreter recurse once per nested
//! expression or call frame. Script code handed over by the host is
//! untrusted, so a deeply nested expression must not take down the host
//! process with a native stack overflow. The interpreter bounds its frame
//! depth with a recursion limit; this crate makes sure the native stack
//! can keep up until that limit is hit.
//!
//! # Platform Support
//!
//! - **Native targets**: `stacker` allocates a fresh segment when the
//!   remaining stack drops below the red zone.
//! - **WASM targets**: passthrough.

/// Remaining stack below which a new segment is allocated (128KB).
const RED_ZONE: usize = 128 * 1024;

/// Size of each freshly allocated stack segment (2MB).
const SEGMENT_SIZE: usize = 2 * 1024 * 1024;

/// Run `f`, growing the native stack first if it is close to exhausted.
///
/// Wrap every recursive entry point (expression parsing, expression
/// evaluation, function calls) in this guard.
///
/// ```text
/// fn eval_expr(&mut self, expr: &Expr) -> EvalResult {
///     ensure_sufficient_stack(|| self.eval_expr_inner(expr))
/// }
/// ```
#[inline]
#[cfg(not(target_arch = "wasm32"))]
pub fn ensure_sufficient_stack<R>(f: impl FnOnce() -> R) -> R {
    stacker::maybe_grow(RED_ZONE, SEGMENT_SIZE, f)
}

/// WASM version: the runtime manages its own stack.
#[inline]
#[cfg(target_arch = "wasm32")]
pub fn ensure_sufficient_stack<R>(f: impl FnOnce() -> R) -> R {
    f()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn nesting_depth(n: u32) -> u32 {
        ensure_sufficient_stack(|| if n == 0 { 0 } else { nesting_depth(n - 1) + 1 })
    }

    #[test]
    fn shallow_call_returns_value() {
        assert_eq!(ensure_sufficient_stack(|| 7), 7);
    }

    #[test]
    fn deep_recursion_does_not_overflow() {
        assert_eq!(nesting_depth(200_000), 200_000);
    }

    #[test]
    fn result_passes_through() {
        let result: Result<u8, &str> = ensure_sufficient_stack(|| Err("boom"));
        assert_eq!(result, Err("boom"));
    }
}
