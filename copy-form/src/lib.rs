//! Library part of the `copy-form` utility.
//!
//! Forms live in the JSON data of a web map, attached to each operational layer or table as
//! `formInfo`.  Copying them is a pure transformation of the destination document (see
//! `merge_forms()` and `copy_forms()`), the portal is only used to fetch both documents and
//! write the destination back when something changed.
//!

pub use cli::*;
pub use copy::*;
pub use merge::*;
pub use webmap::*;

mod cli;
mod copy;
mod merge;
mod webmap;
