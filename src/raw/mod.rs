mod arena;
mod avl;
mod handle;
mod node;
mod search_tree;

pub(crate) use avl::RawAvlTree;
pub(crate) use handle::Handle;
pub(crate) use search_tree::RawSearchTree;
