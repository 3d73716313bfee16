//! Code generation
//!
//! Turns a lowered [`Program`] into a graph of closures. Each branch block
//! becomes one closure with its vector, offset and threshold baked in, so a
//! call does no node lookups and no addressing arithmetic. Branches whose
//! target is a return block hold the constant instead of calling a closure.
//!
//! Generated blocks read features without error handling. Callers must
//! check [`Program::covers`] first and fall back to [`Program::run`] when it
//! does not hold.
use super::lower::{Instruction, Label, Program};
use crate::errors::FeatureSource;
use std::sync::Arc;

/// Signature shared by every generated block.
pub(crate) type BlockFn = Arc<dyn Fn(&[f32], &[f32]) -> f32 + Send + Sync>;

enum Target {
    Constant(f32),
    Block(BlockFn),
}

struct CodeGen<'a> {
    program: &'a Program,
    generated: Vec<Option<BlockFn>>,
}

/// Generate the entry closure of `program`.
pub(crate) fn generate(program: &Program) -> BlockFn {
    let mut codegen = CodeGen {
        program,
        generated: vec![None; program.n_blocks()],
    };
    codegen.block(program.entry())
}

impl<'a> CodeGen<'a> {
    /// Generate a block once; later references share the same closure.
    fn block(&mut self, label: Label) -> BlockFn {
        if let Some(f) = &self.generated[label.index()] {
            return Arc::clone(f);
        }
        let f = match self.program.block(label).instruction {
            Instruction::Return(v) => constant(v),
            Instruction::BranchIfLess {
                vector,
                index,
                threshold,
                if_less,
                otherwise,
            } => {
                let if_less = self.target(if_less);
                let otherwise = self.target(otherwise);
                match vector {
                    FeatureSource::Subject => branch(move |s: &[f32], _: &[f32]| s[index], threshold, if_less, otherwise),
                    FeatureSource::Context => branch(move |_: &[f32], c: &[f32]| c[index], threshold, if_less, otherwise),
                }
            }
        };
        self.generated[label.index()] = Some(Arc::clone(&f));
        f
    }

    fn target(&mut self, label: Label) -> Target {
        match self.program.block(label).instruction {
            Instruction::Return(v) => Target::Constant(v),
            Instruction::BranchIfLess { .. } => Target::Block(self.block(label)),
        }
    }
}

fn constant(v: f32) -> BlockFn {
    Arc::new(move |_: &[f32], _: &[f32]| v)
}

/// Build a branch block. `v < threshold` is false for NaN and for ties,
/// which then take `otherwise`, same as the interpreter.
fn branch<L>(load: L, threshold: f32, if_less: Target, otherwise: Target) -> BlockFn
where
    L: Fn(&[f32], &[f32]) -> f32 + Send + Sync + 'static,
{
    match (if_less, otherwise) {
        (Target::Constant(a), Target::Constant(b)) => {
            Arc::new(move |s: &[f32], c: &[f32]| if load(s, c) < threshold { a } else { b })
        }
        (Target::Constant(a), Target::Block(g)) => {
            Arc::new(move |s: &[f32], c: &[f32]| if load(s, c) < threshold { a } else { g(s, c) })
        }
        (Target::Block(g), Target::Constant(b)) => {
            Arc::new(move |s: &[f32], c: &[f32]| if load(s, c) < threshold { g(s, c) } else { b })
        }
        (Target::Block(g), Target::Block(h)) => {
            Arc::new(move |s: &[f32], c: &[f32]| if load(s, c) < threshold { g(s, c) } else { h(s, c) })
        }
    }
}
