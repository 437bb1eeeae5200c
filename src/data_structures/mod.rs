pub use matrix::Matrix;
pub(crate) use name_tree::NameTree;
pub use rectangle::Rectangle;

mod matrix;
mod name_tree;
mod rectangle;
