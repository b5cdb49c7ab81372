//! Boundary to the host's reactive runtime.
//!
//! The renderer only registers recomputations; scheduling, batching and
//! disposal belong to the runtime.

pub trait Runtime {
    /// Runs `f` once before returning, then again whenever anything it read
    /// changes.
    fn effect(&self, f: Box<dyn FnMut()>);

    /// Runs `f` without recording dependencies for the surrounding effect.
    fn untracked(&self, f: &mut dyn FnMut());
}

/// Runtime without change tracking: every effect runs exactly once.
#[derive(Clone, Copy, Debug, Default)]
pub struct StaticRuntime;

impl Runtime for StaticRuntime {
    fn effect(&self, mut f: Box<dyn FnMut()>) {
        f();
    }

    fn untracked(&self, f: &mut dyn FnMut()) {
        f();
    }
}
