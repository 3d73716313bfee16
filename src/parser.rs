//! Parser
//!
//! Reads the line oriented text dump of a single boosted tree, one node per line:
//!
//! ```text
//! 0:[f0<0.99992311] yes=1,no=2,missing=1,gain=97812.25,cover=218986
//! 1:leaf=-0.199992761,cover=27584.75
//! 2:leaf=0.5,cover=191401.25
//! ```
//!
//! Lines may come in any order and may be indented. Only the feature index,
//! threshold, branch targets and leaf values are kept; `missing`, `gain` and
//! `cover` are checked for well-formedness and then dropped. The shorter form
//! written by the tree's `Display` impl is accepted as well.
use crate::errors::TreeError;
use crate::node::Node;
use crate::tree::Tree;
use log::debug;
use std::str::FromStr;

/// Why a single line was rejected.
enum LineError {
    Malformed(String),
    Unsupported(String),
}

type LineResult<T> = Result<T, LineError>;

fn malformed<T>(reason: impl Into<String>) -> LineResult<T> {
    Err(LineError::Malformed(reason.into()))
}

/// Parse a full tree definition.
///
/// Node indices must form the sequence `0..n` once sorted; a duplicate or a
/// gap is an error rather than a silently shifted array.
pub fn parse_definition(definition: &str) -> Result<Tree, TreeError> {
    let mut entries: Vec<(usize, Node)> = Vec::new();
    for (i, raw) in definition.split('\n').enumerate() {
        let line = raw.trim();
        if line.is_empty() {
            continue;
        }
        let entry = parse_line(line).map_err(|e| match e {
            LineError::Malformed(reason) => TreeError::MalformedDefinition {
                line: i + 1,
                content: line.to_string(),
                reason,
            },
            LineError::Unsupported(reason) => TreeError::UnsupportedSize(format!("line {}: {}", i + 1, reason)),
        })?;
        entries.push(entry);
    }

    entries.sort_by_key(|(idx, _)| *idx);
    for (pos, (idx, _)) in entries.iter().enumerate() {
        if *idx < pos {
            return Err(TreeError::DuplicateNodeIndex(*idx));
        }
        if *idx > pos {
            return Err(TreeError::MissingNodeIndex(pos));
        }
    }

    let nodes: Vec<Node> = entries.into_iter().map(|(_, node)| node).collect();
    debug!("Parsed {} nodes from tree definition.", nodes.len());
    Tree::new(nodes)
}

fn parse_line(line: &str) -> LineResult<(usize, Node)> {
    let Some((index, body)) = line.split_once(':') else {
        return malformed("expected `<index>:<node>`");
    };
    let index = parse_uint("node index", index)?;
    let node = match body.strip_prefix("leaf=") {
        Some(leaf) => parse_leaf(leaf)?,
        None => parse_decision(body)?,
    };
    Ok((index, node))
}

// leaf example: "leaf=-0.199992761,cover=27584.75", the part after `leaf=`.
fn parse_leaf(leaf: &str) -> LineResult<Node> {
    let mut parts = leaf.split(',');
    let value = parse_float("leaf", parts.next().unwrap_or_default())?;
    let mut has_cover = false;
    for pair in parts {
        match pair.split_once('=') {
            Some(("cover", _)) if has_cover => return malformed("repeated leaf attribute `cover`"),
            Some(("cover", v)) => {
                parse_float("cover", v)?;
                has_cover = true;
            }
            Some((key, _)) => return malformed(format!("unexpected leaf attribute `{}`", key)),
            None => return malformed(format!("expected `key=value`, found `{}`", pair)),
        }
    }
    Ok(Node::leaf(value))
}

// decision example: "[f0<0.99992311] yes=1,no=2,missing=1,gain=97812.25,cover=218986"
fn parse_decision(body: &str) -> LineResult<Node> {
    let Some(rest) = body.strip_prefix("[f") else {
        return malformed("expected `leaf=` or `[f<feature><<threshold>]`");
    };
    let Some((split, attributes)) = rest.split_once(']') else {
        return malformed("unterminated split condition, expected `]`");
    };
    let Some((feature, threshold)) = split.split_once('<') else {
        return malformed("expected `<` between feature and threshold");
    };
    let feature_index = parse_uint("feature index", feature)?;
    let feature_index = i16::try_from(feature_index).map_err(|_| {
        LineError::Unsupported(format!(
            "feature index {} is above the maximum of {}",
            feature_index,
            i16::MAX
        ))
    })?;
    let threshold = parse_float("threshold", threshold)?;

    let mut yes = None;
    let mut no = None;
    let mut seen: Vec<&str> = Vec::with_capacity(5);
    for pair in attributes.trim_start().split(',') {
        let Some((key, value)) = pair.split_once('=') else {
            return malformed(format!("expected `key=value`, found `{}`", pair));
        };
        if seen.contains(&key) {
            return malformed(format!("repeated decision attribute `{}`", key));
        }
        seen.push(key);
        match key {
            "yes" => yes = Some(parse_branch("yes", value)?),
            "no" => no = Some(parse_branch("no", value)?),
            "missing" => {
                parse_uint("missing", value)?;
            }
            "gain" | "cover" => {
                parse_float(key, value)?;
            }
            _ => return malformed(format!("unexpected decision attribute `{}`", key)),
        }
    }
    match (yes, no) {
        (Some(yes), Some(no)) => Ok(Node::decision(feature_index, threshold, yes, no)),
        (None, _) => malformed("decision node without a `yes` branch"),
        (_, None) => malformed("decision node without a `no` branch"),
    }
}

fn parse_uint(field: &str, value: &str) -> LineResult<usize> {
    // `usize::from_str` accepts a leading `+`, the dump format does not.
    if value.is_empty() || !value.bytes().all(|b| b.is_ascii_digit()) {
        return malformed(format!("invalid {} `{}`", field, value));
    }
    usize::from_str(value).or_else(|_| malformed(format!("invalid {} `{}`", field, value)))
}

fn parse_branch(field: &str, value: &str) -> LineResult<u8> {
    let target = parse_uint(field, value)?;
    u8::try_from(target).map_err(|_| {
        LineError::Unsupported(format!(
            "{} branch targets node {}, branch targets must be at most {}",
            field,
            target,
            u8::MAX
        ))
    })
}

// Infinities and NaN are rejected, they have no JSON encoding.
fn parse_float(field: &str, value: &str) -> LineResult<f32> {
    match f32::from_str(value) {
        Ok(v) if v.is_finite() => Ok(v),
        Ok(_) => malformed(format!("{} value `{}` is not finite", field, value)),
        Err(_) => malformed(format!("invalid {} value `{}`", field, value)),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::constants::MAX_NODES;

    const STUMP: &str = "0:[f0<0.5] yes=1,no=2,missing=1,gain=1,cover=1\n1:leaf=-1,cover=1\n2:leaf=1,cover=1";

    #[test]
    fn test_parse_stump() {
        let tree = parse_definition(STUMP).unwrap();
        assert_eq!(
            tree.nodes(),
            &[Node::decision(0, 0.5, 1, 2), Node::leaf(-1.0), Node::leaf(1.0)]
        );
    }

    #[test]
    fn test_parse_xgboost_dump() {
        // Tab indented and CRLF terminated, as written by xgboost's `dump_model`.
        let definition = "0:[f12<0.99992311] yes=1,no=2,missing=1,gain=97812.25,cover=218986\r\n\
                          \t1:leaf=-0.199992761,cover=27584.75\r\n\
                          \t2:[f3<-1.5e-05] yes=3,no=4,missing=4,gain=12.5,cover=191401.25\r\n\
                          \t\t3:leaf=0.25,cover=100\r\n\
                          \t\t4:leaf=0.0500000007,cover=191301.25\r\n";
        let tree = parse_definition(definition).unwrap();
        assert_eq!(tree.n_nodes(), 5);
        assert_eq!(tree.nodes()[0].feature_index, 12);
        assert_eq!(tree.nodes()[0].value, 0.99992311_f32);
        assert_eq!(tree.nodes()[1].value, -0.199992761_f32);
        assert_eq!(tree.nodes()[2], Node::decision(3, -1.5e-05, 3, 4));
    }

    #[test]
    fn test_parse_out_of_order_with_blank_lines() {
        let definition = "\n2:leaf=1,cover=1\n\n1:leaf=-1,cover=1\n0:[f0<0.5] yes=1,no=2,missing=1,gain=1,cover=1\n\n";
        let tree = parse_definition(definition).unwrap();
        assert_eq!(tree, parse_definition(STUMP).unwrap());
    }

    #[test]
    fn test_parse_rendered_form() {
        let tree = parse_definition(STUMP).unwrap();
        let rendered = tree.to_string();
        assert_eq!(rendered, "0:[f0<0.5] yes=1,no=2\n1:leaf=-1\n2:leaf=1");
        assert_eq!(parse_definition(&rendered).unwrap(), tree);
    }

    #[test]
    fn test_parse_from_str() {
        let tree: Tree = STUMP.parse().unwrap();
        assert_eq!(tree.n_nodes(), 3);
    }

    #[test]
    fn test_malformed_lines_report_line_number() {
        let cases = [
            ("0:leaf=abc,cover=1", "leaf"),
            ("0:[f0<0.5 yes=1,no=2", "`]`"),
            ("0:[x0<0.5] yes=1,no=2", "leaf="),
            ("0:[f0=0.5] yes=1,no=2", "`<`"),
            ("0:[f0<0.5] yes=1", "`no`"),
            ("0:[f0<0.5] no=2", "`yes`"),
            ("0:[f0<0.5] yes=1,no=2,depth=3", "depth"),
            ("0:[f0<0.5] yes=1,no=two", "no"),
            ("0:[f0<0.5] yes=+1,no=2", "yes"),
            ("0:leaf=1,weight=2", "weight"),
            ("0:[f0<0.5] yes=1,no=2,yes=2", "repeated decision attribute `yes`"),
            ("0:[f0<0.5] yes=1,no=2,gain=1,gain=2", "repeated decision attribute `gain`"),
            ("0:leaf=1,cover=1,cover=2", "repeated leaf attribute"),
            ("0:[f0<inf] yes=1,no=2", "threshold value `inf` is not finite"),
            ("0:[f0<NaN] yes=1,no=2", "not finite"),
            ("0:leaf=-inf", "leaf value `-inf` is not finite"),
            ("0:leaf=1e39", "not finite"),
            ("zero:leaf=1", "node index"),
            ("leaf=1", "<index>"),
        ];
        for (line, needle) in cases {
            let definition = format!("\n{}", line);
            match parse_definition(&definition) {
                Err(TreeError::MalformedDefinition { line: n, content, reason }) => {
                    assert_eq!(n, 2, "{}", line);
                    assert_eq!(content, line);
                    assert!(reason.contains(needle), "{}: {}", line, reason);
                }
                other => panic!("{} parsed as {:?}", line, other),
            }
        }
    }

    #[test]
    fn test_duplicate_and_missing_indices() {
        let duplicate = "0:[f0<0.5] yes=1,no=1\n1:leaf=1\n1:leaf=2";
        assert_eq!(parse_definition(duplicate), Err(TreeError::DuplicateNodeIndex(1)));

        let gap = "0:[f0<0.5] yes=1,no=2\n1:leaf=1\n3:leaf=2";
        assert_eq!(parse_definition(gap), Err(TreeError::MissingNodeIndex(2)));

        let no_root = "1:leaf=1\n2:leaf=2";
        assert_eq!(parse_definition(no_root), Err(TreeError::MissingNodeIndex(0)));

        assert_eq!(parse_definition("\n \n"), Err(TreeError::EmptyTree));
    }

    #[test]
    fn test_unsupported_sizes() {
        let wide_branch = "0:[f0<0.5] yes=1,no=256\n1:leaf=1";
        assert!(matches!(
            parse_definition(wide_branch),
            Err(TreeError::UnsupportedSize(_))
        ));

        let wide_feature = "0:[f40000<0.5] yes=1,no=1\n1:leaf=1";
        assert!(matches!(
            parse_definition(wide_feature),
            Err(TreeError::UnsupportedSize(_))
        ));

        let too_many: String = (0..=MAX_NODES).map(|i| format!("{}:leaf=0\n", i)).collect();
        assert!(matches!(
            parse_definition(&too_many),
            Err(TreeError::UnsupportedSize(_))
        ));
    }

    #[test]
    fn test_branch_out_of_range() {
        let definition = "0:[f0<0.5] yes=1,no=9\n1:leaf=1";
        assert_eq!(
            parse_definition(definition),
            Err(TreeError::BranchOutOfRange {
                node: 0,
                target: 9,
                n_nodes: 2
            })
        );
    }
}
