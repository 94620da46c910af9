//! Comment forests.
//!
//! Comments are stored nested (`replies` inside each comment) but held in
//! memory as a flat arena with index links. Comment ids are only unique by
//! convention, so nodes are addressed by arena position, never by id.

use cb_types::new_comment_id;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::error::{ModelError, ModelResult};

/// Deepest level a reply may be attached under. Top-level comments are at
/// depth 0.
pub const MAX_DEPTH: usize = 10;

/// A comment in its stored, nested form.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Comment {
    pub id: String,
    pub content: String,
    pub author: String,
    #[serde(default)]
    pub parent_id: Option<String>,
    pub created_at: DateTime<Utc>,
    #[serde(default)]
    pub upvotes: u64,
    #[serde(default)]
    pub downvotes: u64,
    #[serde(default)]
    pub score: i64,
    #[serde(default)]
    pub replies: Vec<Comment>,
}

impl Comment {
    /// A fresh comment, self-upvoted by its author.
    pub fn new(content: &str, author: &str, parent_id: Option<&str>, now: DateTime<Utc>) -> Self {
        Self {
            id: new_comment_id(),
            content: content.to_string(),
            author: author.to_string(),
            parent_id: parent_id.map(str::to_string),
            created_at: now,
            upvotes: 1,
            downvotes: 0,
            score: 1,
            replies: Vec::new(),
        }
    }
}

#[derive(Clone, Debug)]
struct Node {
    /// The comment with `replies` left empty; children live in `children`.
    comment: Comment,
    children: Vec<usize>,
    depth: usize,
}

/// All comment trees of one post.
#[derive(Clone, Debug, Default)]
pub struct CommentForest {
    nodes: Vec<Node>,
    roots: Vec<usize>,
}

impl CommentForest {
    pub fn new() -> Self {
        Self::default()
    }

    /// Build the arena from the stored nested form.
    pub fn from_nested(comments: Vec<Comment>) -> Self {
        let mut forest = Self::default();
        for comment in comments {
            let idx = forest.push_nested(comment, 0);
            forest.roots.push(idx);
        }
        forest
    }

    fn push_nested(&mut self, mut comment: Comment, depth: usize) -> usize {
        let replies = std::mem::take(&mut comment.replies);
        let idx = self.nodes.len();
        self.nodes.push(Node {
            comment,
            children: Vec::with_capacity(replies.len()),
            depth,
        });
        for reply in replies {
            let child = self.push_nested(reply, depth + 1);
            self.nodes[idx].children.push(child);
        }
        idx
    }

    /// Rebuild the stored nested form.
    pub fn to_nested(&self) -> Vec<Comment> {
        self.roots.iter().map(|&idx| self.build(idx)).collect()
    }

    fn build(&self, idx: usize) -> Comment {
        let node = &self.nodes[idx];
        let mut comment = node.comment.clone();
        comment.replies = node.children.iter().map(|&child| self.build(child)).collect();
        comment
    }

    /// Total number of comments at every level.
    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    /// Pre-order search for `id`, never looking below [`MAX_DEPTH`].
    fn find_attachable(&self, id: &str) -> Option<usize> {
        let mut stack: Vec<usize> = self.roots.iter().rev().copied().collect();
        while let Some(idx) = stack.pop() {
            let node = &self.nodes[idx];
            if node.comment.id == id {
                return Some(idx);
            }
            if node.depth < MAX_DEPTH {
                stack.extend(node.children.iter().rev().copied());
            }
        }
        None
    }

    /// Depth of the first comment with `id` in pre-order, if any.
    pub fn depth_of(&self, id: &str) -> Option<usize> {
        self.iter()
            .find(|(_, comment)| comment.id == id)
            .map(|(depth, _)| depth)
    }

    /// Pre-order walk yielding `(depth, comment)`. Yielded comments have
    /// empty `replies`.
    pub fn iter(&self) -> impl Iterator<Item = (usize, &Comment)> + '_ {
        let mut stack: Vec<usize> = self.roots.iter().rev().copied().collect();
        std::iter::from_fn(move || {
            let idx = stack.pop()?;
            let node = &self.nodes[idx];
            stack.extend(node.children.iter().rev().copied());
            Some((node.depth, &node.comment))
        })
    }

    /// Attach `comment` at the top level or under the first comment whose id
    /// is `parent_id`.
    ///
    /// `comment.parent_id` is overwritten to match where it was placed.
    pub fn insert(&mut self, mut comment: Comment, parent_id: Option<&str>) -> ModelResult<&Comment> {
        comment.replies.clear();
        let (parent, depth) = match parent_id {
            None => (None, 0),
            Some(pid) => {
                let parent = self.find_attachable(pid).ok_or_else(|| ModelError::ParentNotFoundOrTooDeep {
                    parent_id: pid.to_string(),
                    max_depth: MAX_DEPTH,
                })?;
                (Some(parent), self.nodes[parent].depth + 1)
            }
        };
        comment.parent_id = parent_id.map(str::to_string);

        let idx = self.nodes.len();
        self.nodes.push(Node {
            comment,
            children: Vec::new(),
            depth,
        });
        match parent {
            Some(parent) => self.nodes[parent].children.push(idx),
            None => self.roots.push(idx),
        }
        Ok(&self.nodes[idx].comment)
    }
}

impl PartialEq for CommentForest {
    fn eq(&self, other: &Self) -> bool {
        self.to_nested() == other.to_nested()
    }
}

impl Eq for CommentForest {}

impl From<Vec<Comment>> for CommentForest {
    fn from(comments: Vec<Comment>) -> Self {
        Self::from_nested(comments)
    }
}

impl From<CommentForest> for Vec<Comment> {
    fn from(forest: CommentForest) -> Self {
        forest.to_nested()
    }
}

impl Serialize for CommentForest {
    fn serialize<S: serde::Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        self.to_nested().serialize(serializer)
    }
}

impl<'de> Deserialize<'de> for CommentForest {
    fn deserialize<D: serde::Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        Vec::<Comment>::deserialize(deserializer).map(Self::from_nested)
    }
}
