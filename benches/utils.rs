#![allow(dead_code)]
use rand::prelude::*;
use rand::rngs::StdRng;
use rand::SeedableRng;
use treescore::{Node, Tree};

// complete_tree
//
// Generates a complete binary tree of the given depth, laid out breadth
// first, splitting on features drawn from 0..n_features.
pub(crate) fn complete_tree(depth: u32, n_features: usize) -> Tree {
    // reproducible seed
    let mut rng = StdRng::seed_from_u64(1903);

    let n_internal = (1usize << depth) - 1;
    let n_nodes = (1usize << (depth + 1)) - 1;
    let nodes: Vec<Node> = (0..n_nodes)
        .map(|i| {
            if i < n_internal {
                Node::decision(
                    rng.gen_range(0..n_features) as i16,
                    rng.gen_range(0.0..1.0),
                    (2 * i + 1) as u8,
                    (2 * i + 2) as u8,
                )
            } else {
                Node::leaf(rng.gen_range(-1.0..1.0))
            }
        })
        .collect();
    Tree::new(nodes).unwrap()
}

// feature_rows
//
// Generates `n_rows` feature vectors of length `n_features`, row major.
pub(crate) fn feature_rows(n_rows: usize, n_features: usize) -> Vec<f32> {
    let mut rng = StdRng::seed_from_u64(1903);
    (0..n_rows * n_features).map(|_| rng.gen_range(0.0..1.0)).collect()
}
