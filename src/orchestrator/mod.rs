//! 生成编排器
//!
//! - `engine` - 状态机与单次/并发运行入口
//! - `assessment` - 校验、闸门与距离的汇总评估
//! - `objective` - 候选选择的目标函数
//! - `prompts` - 生成与修订提示词

pub mod assessment;
pub mod engine;
pub mod objective;
pub mod prompts;

use std::fmt;

pub use assessment::{assess, Assessment, PipelineContext};
pub use engine::Orchestrator;
pub use objective::{select_best, Objective, WeightedDistance};

/// 流水线状态
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PipelineState {
    Drafting,
    Validating,
    Revising,
    Finalizing,
    Done,
    Failed,
}

impl PipelineState {
    pub fn as_str(&self) -> &'static str {
        match self {
            PipelineState::Drafting => "drafting",
            PipelineState::Validating => "validating",
            PipelineState::Revising => "revising",
            PipelineState::Finalizing => "finalizing",
            PipelineState::Done => "done",
            PipelineState::Failed => "failed",
        }
    }
}

impl fmt::Display for PipelineState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}
