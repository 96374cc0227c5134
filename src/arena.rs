//! Frame storage for the evaluator.
//!
//! All frames created during a run live in one [`Arena`] and are addressed
//! by copyable [`FrameId`] handles. Frames are never released individually:
//! the arena grows monotonically for the duration of a run and is dropped as
//! a single unit when the owning interpreter goes out of scope, on normal
//! completion and on error alike. Because a closure captures its defining
//! frame by handle rather than by pointer, the captured frame trivially
//! outlives every closure that references it, and no reference-count cycles
//! can form even when a closure is bound into the very frame it captures.

use std::collections::HashMap;

use crate::Error;
use crate::ast::Value;

/// Handle to a frame in an [`Arena`]. Only meaningful for the arena that
/// minted it.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FrameId(usize);

/// A single lexical scope: a name-to-value mapping plus a parent handle
/// (`None` for the root frame). Binding names are unique within one frame.
#[derive(Debug)]
struct Frame {
    bindings: HashMap<String, Value>,
    parent: Option<FrameId>,
}

/// Registry of every frame allocated during a run
#[derive(Debug, Default)]
pub struct Arena {
    frames: Vec<Frame>,
}

impl Arena {
    pub fn new() -> Self {
        Arena { frames: Vec::new() }
    }

    /// Allocate a fresh, empty frame chained to `parent`
    pub fn alloc_frame(&mut self, parent: Option<FrameId>) -> FrameId {
        let id = FrameId(self.frames.len());
        self.frames.push(Frame {
            bindings: HashMap::new(),
            parent,
        });
        id
    }

    /// Install a binding in `frame`. A name already bound directly in that
    /// frame is rejected; shadowing an ancestor's binding is fine.
    pub fn bind(&mut self, frame: FrameId, name: String, value: Value) -> Result<(), Error> {
        let bindings = &mut self.frames[frame.0].bindings;
        if bindings.contains_key(&name) {
            return Err(Error::EvalError(format!("Duplicate binding name: {name}")));
        }
        bindings.insert(name, value);
        Ok(())
    }

    /// Check whether `name` is bound directly in `frame` (ancestors excluded)
    pub fn has_local(&self, frame: FrameId, name: &str) -> bool {
        self.frames[frame.0].bindings.contains_key(name)
    }

    /// Resolve `name` by walking the frame chain from `frame` outward,
    /// returning the innermost binding.
    pub fn lookup(&self, frame: FrameId, name: &str) -> Option<&Value> {
        let mut current = Some(frame);
        while let Some(id) = current {
            let frame = &self.frames[id.0];
            if let Some(value) = frame.bindings.get(name) {
                return Some(value);
            }
            current = frame.parent;
        }
        None
    }

    /// Number of frames allocated so far
    pub fn frame_count(&self) -> usize {
        self.frames.len()
    }

    /// Get all bindings visible from `frame`, including inherited ones.
    /// Returns (name, value) pairs sorted by name; inner bindings shadow
    /// outer ones.
    pub fn get_all_bindings(&self, frame: FrameId) -> Vec<(String, Value)> {
        let mut bindings = HashMap::new();

        // Walk ancestors first so inner frames override on insert
        let mut chain = Vec::new();
        let mut current = Some(frame);
        while let Some(id) = current {
            chain.push(id);
            current = self.frames[id.0].parent;
        }
        for id in chain.into_iter().rev() {
            for (name, value) in &self.frames[id.0].bindings {
                bindings.insert(name.clone(), value.clone());
            }
        }

        let mut result: Vec<_> = bindings.into_iter().collect();
        result.sort_by(|a, b| a.0.cmp(&b.0));
        result
    }
}
