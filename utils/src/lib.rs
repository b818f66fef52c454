mod bitvector;
mod display;
mod worklist;

pub use crate::bitvector::{BitVector, BitVectorIterator};
pub use crate::display::{DisplayResolved, DisplayResolvedWrapper};
pub use crate::worklist::Worklist;
