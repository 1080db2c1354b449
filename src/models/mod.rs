pub mod analysis;
pub mod document;
pub mod framework;
pub mod template;

pub use analysis::*;
pub use document::*;
pub use framework::*;
pub use template::*;
