pub mod stage0_generate;
pub mod stage1_normalize;
pub mod stage2_summarize;
pub mod stage3_render;

pub use stage0_generate::*;
pub use stage1_normalize::*;
pub use stage2_summarize::*;
pub use stage3_render::*;
