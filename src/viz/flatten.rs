//! Token tree flattening.
//!
//! Tokenizers return either one token stream or one stream per track, and
//! compound tokenizers nest further. The visualizer addresses tokens by their
//! position in a single flat list, so every payload is flattened depth-first
//! before display.

use crate::midi::Token;
use serde::{Deserialize, Serialize};

/// One element of a nested token collection.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum TokenNode {
    /// A nested sequence, expanded in place when flattening.
    Group(Vec<TokenNode>),
    Leaf(Token),
}

/// Flattens a nested token collection into a single ordered list.
///
/// Groups are expanded in place, depth-first and left to right. The walk uses
/// an explicit stack, so arbitrarily deep nesting cannot overflow the call
/// stack. Already-flat input comes back unchanged.
///
/// # Examples
///
/// ```
/// use miditok_viz::midi::{Token, TokenType};
/// use miditok_viz::viz::flatten::{flatten, TokenNode};
///
/// let t = |v: &str| TokenNode::Leaf(Token::new(TokenType::Pitch, v, 0.0, None));
/// let nested = vec![TokenNode::Group(vec![t("60"), t("62")]), t("64")];
/// let values: Vec<String> = flatten(&nested).into_iter().map(|t| t.value).collect();
/// assert_eq!(values, ["60", "62", "64"]);
/// ```
pub fn flatten(nodes: &[TokenNode]) -> Vec<Token> {
    let mut out = Vec::new();
    // Iterators of the groups currently being walked, innermost last.
    let mut stack = vec![nodes.iter()];

    while let Some(iter) = stack.last_mut() {
        match iter.next() {
            Some(TokenNode::Leaf(token)) => out.push(token.clone()),
            Some(TokenNode::Group(children)) => stack.push(children.iter()),
            None => {
                stack.pop();
            }
        }
    }

    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::midi::TokenType;

    fn leaf(value: &str) -> TokenNode {
        TokenNode::Leaf(Token::new(TokenType::Pitch, value, 0.0, None))
    }

    fn values(tokens: &[Token]) -> Vec<&str> {
        tokens.iter().map(|t| t.value.as_str()).collect()
    }

    #[test]
    fn test_flatten_preserves_depth_first_order() {
        // [[t1, t2], [t3, [t4]]]
        let nested = vec![
            TokenNode::Group(vec![leaf("t1"), leaf("t2")]),
            TokenNode::Group(vec![leaf("t3"), TokenNode::Group(vec![leaf("t4")])]),
        ];
        assert_eq!(values(&flatten(&nested)), vec!["t1", "t2", "t3", "t4"]);
    }

    #[test]
    fn test_flatten_is_idempotent() {
        let nested = vec![
            leaf("a"),
            TokenNode::Group(vec![TokenNode::Group(vec![leaf("b")]), leaf("c")]),
            TokenNode::Group(vec![]),
            leaf("d"),
        ];
        let once = flatten(&nested);
        let relifted: Vec<TokenNode> = once.iter().cloned().map(TokenNode::Leaf).collect();
        let twice = flatten(&relifted);
        assert_eq!(once, twice);
        assert_eq!(values(&once), vec!["a", "b", "c", "d"]);
    }

    #[test]
    fn test_flatten_deep_nesting() {
        let mut node = leaf("deep");
        for _ in 0..100_000 {
            node = TokenNode::Group(vec![node]);
        }
        let flat = flatten(std::slice::from_ref(&node));
        assert_eq!(values(&flat), vec!["deep"]);

        // Tear down iteratively; the derived Drop would recurse 100k levels.
        let mut current = Some(node);
        while let Some(TokenNode::Group(mut children)) = current.take() {
            current = children.pop();
        }
    }

    #[test]
    fn test_flatten_empty() {
        assert!(flatten(&[]).is_empty());
        assert!(flatten(&[TokenNode::Group(vec![TokenNode::Group(vec![])])]).is_empty());
    }

    #[test]
    fn test_deserialize_nested_payload() {
        let json = r#"[[{"type": "Bar", "value": "None", "time": 0}],
                       [{"type": "Pitch", "value": 60, "time": 0, "note_id": 1}]]"#;
        let nodes: Vec<TokenNode> = serde_json::from_str(json).unwrap();
        let flat = flatten(&nodes);
        assert_eq!(flat.len(), 2);
        assert_eq!(flat[1].kind, TokenType::Pitch);
    }
}
