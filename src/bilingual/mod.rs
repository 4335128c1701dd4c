//! 双语一致性引擎
//!
//! - `consistency` - 一致性校验（纯函数 + 定稿阶段的校验器）
//! - `patch` - 不调用补全服务的标题与结尾修补
//! - `fallback` - 词表驱动的结构兜底与模板检测
//! - `ladder` - 逐级升级的修复阶梯

pub mod consistency;
pub mod fallback;
pub mod ladder;
pub mod patch;

pub use consistency::{check_consistency, BilingualConsistency, ConsistencyReport};
pub use fallback::{looks_templated, structural_fallback};
pub use ladder::{BilingualLadder, LadderStep, SYNTHETIC_META_KEY};
pub use patch::{patch_headings, patch_tail};
