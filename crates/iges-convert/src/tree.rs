// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Boolean trees (180)
//!
//! The post-order list is rebuilt into a binary tree stored in an arena.
//! Operands are then emitted in strict left-node-right order, each with the
//! operator seen most recently (union before the first one). Both walks use
//! an explicit stack or index order, so tree depth is bounded only by
//! memory.

use crate::attributes::find_attributes;
use crate::{ConversionContext, ConvertError, Result};
use iges_model::{BoolOp, Combination, DeNumber, Entity, GeometryWriter, Member};
use log::debug;

/// Node operation
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum TreeOp {
    /// Leaf referencing an entity
    Operand(DeNumber),
    Union,
    Intersect,
    Subtract,
}

impl TreeOp {
    /// Operator for a post-order code (1, 2 or 3)
    pub fn from_code(code: i64) -> Option<Self> {
        match code {
            1 => Some(TreeOp::Union),
            2 => Some(TreeOp::Intersect),
            3 => Some(TreeOp::Subtract),
            _ => None,
        }
    }

    /// Combination operator, `None` for operands
    pub fn bool_op(self) -> Option<BoolOp> {
        match self {
            TreeOp::Operand(_) => None,
            TreeOp::Union => Some(BoolOp::Union),
            TreeOp::Intersect => Some(BoolOp::Intersect),
            TreeOp::Subtract => Some(BoolOp::Subtract),
        }
    }
}

/// Tree node; links are arena indices
#[derive(Clone, Debug, PartialEq)]
pub struct Node {
    pub op: TreeOp,
    pub left: Option<usize>,
    pub right: Option<usize>,
    pub parent: Option<usize>,
}

/// Boolean tree in an arena
///
/// Children always sit at lower indices than their parent.
#[derive(Clone, Debug, PartialEq)]
pub struct BoolTree {
    nodes: Vec<Node>,
    root: usize,
}

impl BoolTree {
    /// Build from a post-order list
    ///
    /// Negative entries are `-DE` operand pointers, positive entries
    /// operator codes.
    pub fn from_postfix(postfix: &[i64]) -> std::result::Result<Self, String> {
        let mut nodes: Vec<Node> = Vec::with_capacity(postfix.len());
        let mut stack: Vec<usize> = Vec::new();

        for (pos, &code) in postfix.iter().enumerate() {
            let op = if code < 0 {
                DeNumber::from_pointer(-code)
                    .map(TreeOp::Operand)
                    .ok_or_else(|| format!("operand {} at position {} is not a DE", code, pos + 1))?
            } else {
                TreeOp::from_code(code)
                    .ok_or_else(|| format!("unknown operator {} at position {}", code, pos + 1))?
            };
            let id = nodes.len();
            let (left, right) = match op {
                TreeOp::Operand(_) => (None, None),
                _ => {
                    let (Some(right), Some(left)) = (stack.pop(), stack.pop()) else {
                        return Err(format!(
                            "operator at position {} lacks two operands",
                            pos + 1
                        ));
                    };
                    nodes[left].parent = Some(id);
                    nodes[right].parent = Some(id);
                    (Some(left), Some(right))
                }
            };
            nodes.push(Node {
                op,
                left,
                right,
                parent: None,
            });
            stack.push(id);
        }

        match stack.as_slice() {
            [root] => Ok(Self { nodes, root: *root }),
            [] => Err("empty tree".to_string()),
            rest => Err(format!("{} subtrees left without an operator", rest.len())),
        }
    }

    /// Root node index
    pub fn root(&self) -> usize {
        self.root
    }

    /// All nodes
    pub fn nodes(&self) -> &[Node] {
        &self.nodes
    }

    /// Operand DEs in arena order
    pub fn operands(&self) -> impl Iterator<Item = DeNumber> + '_ {
        self.nodes.iter().filter_map(|n| match n.op {
            TreeOp::Operand(de) => Some(de),
            _ => None,
        })
    }

    /// Operands in left-node-right order, each with its pending operator
    pub fn members(&self) -> Vec<(DeNumber, BoolOp)> {
        let mut out = Vec::new();
        let mut stack = Vec::new();
        let mut pending = BoolOp::Union;
        let mut node = Some(self.root);
        loop {
            while let Some(n) = node {
                stack.push(n);
                node = self.nodes[n].left;
            }
            let Some(n) = stack.pop() else {
                break;
            };
            match self.nodes[n].op {
                TreeOp::Operand(de) => out.push((de, pending)),
                op => {
                    if let Some(op) = op.bool_op() {
                        pending = op;
                    }
                }
            }
            node = self.nodes[n].right;
        }
        out
    }

    /// Fully parenthesized infix rendering
    pub fn show_tree(&self, name: impl Fn(DeNumber) -> String) -> String {
        let mut text: Vec<String> = Vec::with_capacity(self.nodes.len());
        for node in &self.nodes {
            let s = match (node.op, node.left, node.right) {
                (TreeOp::Operand(de), _, _) => name(de),
                (op, Some(l), Some(r)) => {
                    let symbol = op.bool_op().map(BoolOp::symbol).unwrap_or('?');
                    format!("({} {} {})", text[l], symbol, text[r])
                }
                _ => String::new(),
            };
            text.push(s);
        }
        text.swap_remove(self.root)
    }
}

/// Members of a tree's combination
///
/// Every operand must resolve before any reference count changes; each
/// operand then gains one reference and contributes a member carrying its
/// placement.
pub fn make_members(tree: &BoolTree, ctx: &mut ConversionContext) -> Result<Vec<Member>> {
    let ordered = tree.members();
    let indices = ordered
        .iter()
        .map(|(de, _)| ctx.lookup(*de))
        .collect::<Result<Vec<_>>>()?;

    let mut members = Vec::with_capacity(ordered.len());
    for ((_, op), index) in ordered.into_iter().zip(indices) {
        ctx.add_reference(index);
        members.push(Member::new(ctx.name(index), op).with_matrix(ctx.rot(index).to_row_major()));
    }
    Ok(members)
}

/// Convert the boolean tree at `index` into a combination
pub fn convert_tree(
    ctx: &mut ConversionContext,
    index: usize,
    db: &mut dyn GeometryWriter,
) -> Result<()> {
    let de = DeNumber::from_index(index);
    let decoded = ctx.decode(index)?;
    let postfix = match &decoded.entity {
        Entity::BooleanTree(tree) => &tree.postfix,
        _ => return Err(ConvertError::invalid(de, "not a boolean tree")),
    };
    let tree = BoolTree::from_postfix(postfix).map_err(|msg| ConvertError::invalid(de, msg))?;
    let members = make_members(&tree, ctx)?;
    debug!(
        "{}: {}",
        de,
        tree.show_tree(|d| ctx.lookup(d).map(|i| ctx.name(i)).unwrap_or_else(|_| d.to_string()))
    );

    let attributes = find_attributes(ctx, &decoded.properties);
    let entry = ctx.entry(index)?;
    let comb = Combination {
        region: attributes.as_ref().is_some_and(|a| a.region_flag),
        members,
        attributes,
        rgb: entry.rgb,
    };
    db.write_combination(&ctx.name(index), comb)?;
    Ok(())
}
