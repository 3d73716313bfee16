//! Random trees and feature vectors for tests.
use crate::node::Node;
use crate::tree::Tree;
use rand::rngs::StdRng;
use rand::Rng;

/// Thresholds and feature values are drawn partly from this grid so that
/// exact ties between a feature and a threshold are common.
const GRID: [f32; 5] = [-1.0, 0.0, 0.25, 0.5, 1.0];

fn grid_or_uniform(rng: &mut StdRng) -> f32 {
    if rng.gen_bool(0.5) {
        GRID[rng.gen_range(0..GRID.len())]
    } else {
        rng.gen_range(-1.0..1.0)
    }
}

/// A random tree of `n_nodes` nodes splitting on features `0..n_features`.
///
/// Node `i` only branches to nodes after it, so the result is acyclic, and
/// children are picked independently, so shared children are frequent.
pub(crate) fn random_tree(rng: &mut StdRng, n_nodes: usize, n_features: usize) -> Tree {
    let nodes: Vec<Node> = (0..n_nodes)
        .map(|i| {
            let remaining = n_nodes - i - 1;
            if remaining == 0 || n_features == 0 || rng.gen_bool(0.2) {
                Node::leaf(rng.gen_range(-10.0..10.0))
            } else {
                Node::decision(
                    rng.gen_range(0..n_features) as i16,
                    grid_or_uniform(rng),
                    (i + 1 + rng.gen_range(0..remaining)) as u8,
                    (i + 1 + rng.gen_range(0..remaining)) as u8,
                )
            }
        })
        .collect();
    // Generated trees satisfy every structural check.
    Tree::new(nodes).unwrap()
}

pub(crate) fn random_features(rng: &mut StdRng, len: usize) -> Vec<f32> {
    (0..len).map(|_| grid_or_uniform(rng)).collect()
}
