pub mod history;
pub mod image;
pub mod insight;
pub mod signal;

pub use history::*;
pub use image::*;
pub use insight::*;
pub use signal::*;
