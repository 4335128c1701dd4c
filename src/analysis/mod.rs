//! 文本分析模块
//!
//! - `text` - URL、标题、段落、章节、句子与年份的底层识别
//! - `similarity` - 二元组相似度与段落/行去重
//! - `structure` - 结构信号（FAQ、列表、表格、证据句、导语钩子等）

pub mod similarity;
pub mod structure;
pub mod text;

pub use similarity::{dedup_body, is_near_duplicate};
pub use structure::StructureSignals;
