//! OpenCV cascade XML reader.
//!
//! Two layouts exist in the wild. The current one (written by
//! `opencv_traincascade`) keeps features in a shared table and encodes each
//! weak tree as flat `internalNodes` / `leafValues` lists. The legacy one
//! (`opencv-haar-classifier`, used by the `haarcascade_mcs_*` files) nests the
//! feature inside every tree node.

use super::{Branch, HaarCascade, HaarFeature, Stage, TreeNode, WeakTree, WeightedRect};
use crate::error::CascadeError;
use roxmltree::{Document, Node};
use std::str::FromStr;

const LEGACY_TYPE_ID: &str = "opencv-haar-classifier";

/// Parse either cascade layout
pub fn parse_cascade(xml: &str) -> Result<HaarCascade, CascadeError> {
    let doc = Document::parse(xml)?;
    let root = doc.root_element();

    let cascade = root
        .children()
        .filter(Node::is_element)
        .find(|n| n.has_tag_name("cascade") || n.attribute("type_id") == Some(LEGACY_TYPE_ID))
        .ok_or_else(|| CascadeError::Invalid("no cascade element found".to_string()))?;

    if cascade.attribute("type_id") == Some(LEGACY_TYPE_ID) {
        parse_legacy(cascade)
    } else {
        parse_current(cascade)
    }
}

fn child<'a, 'input>(node: Node<'a, 'input>, name: &str) -> Option<Node<'a, 'input>> {
    node.children().find(|n| n.is_element() && n.has_tag_name(name))
}

fn required<'a, 'input>(node: Node<'a, 'input>, name: &str) -> Result<Node<'a, 'input>, CascadeError> {
    child(node, name).ok_or_else(|| {
        CascadeError::Invalid(format!("<{}> is missing <{}>", node.tag_name().name(), name))
    })
}

/// Anonymous `<_>` list entries
fn items<'a, 'input>(node: Node<'a, 'input>) -> impl Iterator<Item = Node<'a, 'input>> {
    node.children().filter(|n| n.is_element() && n.has_tag_name("_"))
}

fn text<'a>(node: Node<'a, '_>) -> &'a str {
    node.text().unwrap_or("").trim()
}

fn parse_value<T: FromStr>(raw: &str, what: &str) -> Result<T, CascadeError> {
    raw.parse()
        .map_err(|_| CascadeError::Invalid(format!("bad {what} value {raw:?}")))
}

fn parse_list<T: FromStr>(node: Node, what: &str) -> Result<Vec<T>, CascadeError> {
    text(node)
        .split_whitespace()
        .map(|v| parse_value(v, what))
        .collect()
}

fn child_value<T: FromStr>(node: Node, name: &str) -> Result<T, CascadeError> {
    parse_value(text(required(node, name)?), name)
}

/// "x y w h weight", e.g. `3 7 14 4 -1.`
fn parse_rect(node: Node) -> Result<WeightedRect, CascadeError> {
    let values: Vec<f32> = parse_list(node, "rect")?;
    if values.len() != 5 {
        return Err(CascadeError::Invalid(format!(
            "rect needs 5 values, found {}",
            values.len()
        )));
    }
    if values[..4].iter().any(|v| *v < 0.0) {
        return Err(CascadeError::Invalid(format!("negative rect geometry {values:?}")));
    }
    Ok(WeightedRect {
        x: values[0] as u32,
        y: values[1] as u32,
        width: values[2] as u32,
        height: values[3] as u32,
        weight: values[4],
    })
}

fn parse_feature(node: Node) -> Result<HaarFeature, CascadeError> {
    if let Some(tilted) = child(node, "tilted") {
        if text(tilted) != "0" {
            return Err(CascadeError::Unsupported("tilted Haar features".to_string()));
        }
    }
    let rects = items(required(node, "rects")?)
        .map(parse_rect)
        .collect::<Result<Vec<_>, _>>()?;
    Ok(HaarFeature { rects })
}

fn parse_current(cascade: Node) -> Result<HaarCascade, CascadeError> {
    let stage_type = text(required(cascade, "stageType")?);
    if stage_type != "BOOST" {
        return Err(CascadeError::Unsupported(format!("stage type {stage_type}")));
    }
    let feature_type = text(required(cascade, "featureType")?);
    if feature_type != "HAAR" {
        return Err(CascadeError::Unsupported(format!("feature type {feature_type}")));
    }

    let width: u32 = child_value(cascade, "width")?;
    let height: u32 = child_value(cascade, "height")?;

    let mut stages = Vec::new();
    for stage_node in items(required(cascade, "stages")?) {
        let threshold: f32 = child_value(stage_node, "stageThreshold")?;
        let mut trees = Vec::new();
        for weak in items(required(stage_node, "weakClassifiers")?) {
            trees.push(parse_current_tree(weak)?);
        }
        stages.push(Stage { threshold, trees });
    }

    let features = items(required(cascade, "features")?)
        .map(parse_feature)
        .collect::<Result<Vec<_>, _>>()?;

    HaarCascade::new((width, height), stages, features)
}

/// Nodes are quadruples `left right feature threshold`; a child `<= 0` is leaf `-child`
fn parse_current_tree(weak: Node) -> Result<WeakTree, CascadeError> {
    let raw: Vec<f32> = parse_list(required(weak, "internalNodes")?, "internalNodes")?;
    let leaves: Vec<f32> = parse_list(required(weak, "leafValues")?, "leafValues")?;
    if raw.is_empty() || raw.len() % 4 != 0 {
        return Err(CascadeError::Invalid(format!(
            "internalNodes length {} is not a multiple of 4",
            raw.len()
        )));
    }

    let branch = |value: f32| -> Result<Branch, CascadeError> {
        let idx = value as i64;
        if idx > 0 {
            Ok(Branch::Node(idx as usize))
        } else {
            leaves
                .get((-idx) as usize)
                .copied()
                .map(Branch::Leaf)
                .ok_or_else(|| CascadeError::Invalid(format!("leaf index {} out of range", -idx)))
        }
    };

    let nodes = raw
        .chunks_exact(4)
        .map(|q| {
            if q[2] < 0.0 {
                return Err(CascadeError::Invalid(format!("negative feature index {}", q[2])));
            }
            Ok(TreeNode {
                left: branch(q[0])?,
                right: branch(q[1])?,
                feature: q[2] as usize,
                threshold: q[3],
            })
        })
        .collect::<Result<Vec<_>, _>>()?;

    Ok(WeakTree { nodes })
}

fn parse_legacy(cascade: Node) -> Result<HaarCascade, CascadeError> {
    let size: Vec<u32> = parse_list(required(cascade, "size")?, "size")?;
    if size.len() != 2 {
        return Err(CascadeError::Invalid(format!("size needs 2 values, found {}", size.len())));
    }

    let mut features = Vec::new();
    let mut stages = Vec::new();
    for stage_node in items(required(cascade, "stages")?) {
        let threshold: f32 = child_value(stage_node, "stage_threshold")?;
        let mut trees = Vec::new();
        for tree_node in items(required(stage_node, "trees")?) {
            let mut nodes = Vec::new();
            for node in items(tree_node) {
                features.push(parse_feature(required(node, "feature")?)?);
                nodes.push(TreeNode {
                    feature: features.len() - 1,
                    threshold: child_value(node, "threshold")?,
                    left: legacy_branch(node, "left_val", "left_node")?,
                    right: legacy_branch(node, "right_val", "right_node")?,
                });
            }
            trees.push(WeakTree { nodes });
        }
        stages.push(Stage { threshold, trees });
    }

    HaarCascade::new((size[0], size[1]), stages, features)
}

fn legacy_branch(node: Node, value_tag: &str, node_tag: &str) -> Result<Branch, CascadeError> {
    if child(node, value_tag).is_some() {
        return Ok(Branch::Leaf(child_value(node, value_tag)?));
    }
    if child(node, node_tag).is_some() {
        return Ok(Branch::Node(child_value(node, node_tag)?));
    }
    Err(CascadeError::Invalid(format!(
        "tree node has neither <{value_tag}> nor <{node_tag}>"
    )))
}
