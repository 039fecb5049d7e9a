mod locator;
mod merge;
mod value;

pub use locator::{Children, Locator, Span};
pub use merge::{merge, merge_with_locators};
pub use value::{Map, Value};
