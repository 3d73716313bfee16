//! Lowering
//!
//! Turns the node array into a flat program of labeled blocks. Every block
//! ends in either a constant return or a two way branch on
//! `feature < threshold`. Labels are keyed by node index, so a child shared
//! by several parents is emitted once and every branch to it targets the
//! same block.
use crate::constants::BLOCK_LABEL_PREFIX;
use crate::errors::{FeatureSource, TreeError};
use crate::predict::read_feature;
use crate::tree::Tree;
use hashbrown::HashMap;
use std::fmt;

/// A block label, numbered in the order labels were defined.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct Label(u16);

impl Label {
    pub fn index(self) -> usize {
        self.0 as usize
    }
}

impl fmt::Display for Label {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "L{}", self.0)
    }
}

#[derive(Clone, Copy, Debug, PartialEq)]
pub enum Instruction {
    /// Return a constant.
    Return(f32),
    /// Load `vector[index]`, jump to `if_less` when it is strictly below
    /// `threshold`, otherwise to `otherwise`. NaN and ties take `otherwise`.
    BranchIfLess {
        vector: FeatureSource,
        index: usize,
        threshold: f32,
        if_less: Label,
        otherwise: Label,
    },
}

#[derive(Clone, Debug, PartialEq)]
pub struct Block {
    pub label: Label,
    /// Index of the tree node this block was lowered from.
    pub node: usize,
    pub instruction: Instruction,
}

/// The lowered form of a tree.
#[derive(Clone, Debug, PartialEq)]
pub struct Program {
    /// Subject length the feature addressing was resolved against.
    pub subject_feature_count: usize,
    /// Blocks in emission order. The first block is the entry point.
    pub blocks: Vec<Block>,
    /// Position in `blocks` of each label.
    offsets: Vec<usize>,
    /// Branch targets that reused an existing label.
    pub shared_targets: usize,
    /// Shortest subject vector that covers every subject read.
    pub min_subject_len: usize,
    /// Shortest context vector that covers every context read.
    pub min_context_len: usize,
}

impl Program {
    pub fn entry(&self) -> Label {
        Label(0)
    }

    pub fn block(&self, label: Label) -> &Block {
        &self.blocks[self.offsets[label.index()]]
    }

    pub fn n_blocks(&self) -> usize {
        self.blocks.len()
    }

    pub fn n_branches(&self) -> usize {
        self.blocks
            .iter()
            .filter(|b| matches!(b.instruction, Instruction::BranchIfLess { .. }))
            .count()
    }

    /// Whether the vectors are long enough for every read in the program.
    pub fn covers(&self, subject: &[f32], context: &[f32]) -> bool {
        subject.len() >= self.min_subject_len && context.len() >= self.min_context_len
    }

    /// Execute the program block by block, bounds checking each read.
    ///
    /// Fails on the first read past the end of its vector, exactly where the
    /// interpreter would.
    pub fn run(&self, subject: &[f32], context: &[f32]) -> Result<f32, TreeError> {
        let mut label = self.entry();
        loop {
            match self.block(label).instruction {
                Instruction::Return(v) => return Ok(v),
                Instruction::BranchIfLess {
                    vector,
                    index,
                    threshold,
                    if_less,
                    otherwise,
                } => {
                    label = if read_feature(subject, context, vector, index)? < threshold {
                        if_less
                    } else {
                        otherwise
                    };
                }
            }
        }
    }

    fn label_name(&self, label: Label) -> String {
        format!("{}{}", BLOCK_LABEL_PREFIX, self.block(label).node)
    }
}

impl fmt::Display for Program {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        for block in &self.blocks {
            write!(f, "{}: ", self.label_name(block.label))?;
            match block.instruction {
                Instruction::Return(v) => writeln!(f, "return {}", v)?,
                Instruction::BranchIfLess {
                    vector,
                    index,
                    threshold,
                    if_less,
                    otherwise,
                } => writeln!(
                    f,
                    "if {}[{}] < {} goto {} else goto {}",
                    vector,
                    index,
                    threshold,
                    self.label_name(if_less),
                    self.label_name(otherwise)
                )?,
            }
        }
        Ok(())
    }
}

struct Lowering {
    labels: HashMap<usize, Label>,
    work: Vec<(Label, usize)>,
    shared_targets: usize,
}

impl Lowering {
    /// Label of a node, defining it on first reference.
    fn label_for(&mut self, node: usize) -> (Label, bool) {
        if let Some(label) = self.labels.get(&node) {
            self.shared_targets += 1;
            return (*label, false);
        }
        // At most 256 nodes, so the label always fits.
        let label = Label(self.labels.len() as u16);
        self.labels.insert(node, label);
        (label, true)
    }
}

/// Lower `tree` into a block program, resolving each decision node's
/// feature index against `subject_feature_count`.
///
/// Blocks are emitted depth first from the root. A decision node's true child
/// is pushed last, so it is emitted directly after its parent.
pub fn lower(tree: &Tree, subject_feature_count: usize) -> Program {
    let nodes = tree.nodes();
    let mut state = Lowering {
        labels: HashMap::with_capacity(nodes.len()),
        work: Vec::new(),
        shared_targets: 0,
    };
    let mut blocks = Vec::new();

    let (entry, _) = state.label_for(0);
    state.work.push((entry, 0));
    while let Some((label, idx)) = state.work.pop() {
        let node = &nodes[idx];
        let instruction = match node.operand(subject_feature_count) {
            None => Instruction::Return(node.value),
            Some((vector, index)) => {
                let (if_less, new_true) = state.label_for(node.true_branch as usize);
                let (otherwise, new_false) = state.label_for(node.false_branch as usize);
                if new_false {
                    state.work.push((otherwise, node.false_branch as usize));
                }
                if new_true {
                    state.work.push((if_less, node.true_branch as usize));
                }
                Instruction::BranchIfLess {
                    vector,
                    index,
                    threshold: node.value,
                    if_less,
                    otherwise,
                }
            }
        };
        blocks.push(Block {
            label,
            node: idx,
            instruction,
        });
    }

    let mut offsets = vec![0; blocks.len()];
    let (mut min_subject_len, mut min_context_len) = (0, 0);
    for (pos, block) in blocks.iter().enumerate() {
        offsets[block.label.index()] = pos;
        if let Instruction::BranchIfLess { vector, index, .. } = block.instruction {
            let len = match vector {
                FeatureSource::Subject => &mut min_subject_len,
                FeatureSource::Context => &mut min_context_len,
            };
            *len = (*len).max(index + 1);
        }
    }
    Program {
        subject_feature_count,
        blocks,
        offsets,
        shared_targets: state.shared_targets,
        min_subject_len,
        min_context_len,
    }
}
