//! 错误处理集成测试
//!
//! 测试补全服务失败、校验失败时流水线的结果与存储状态

use std::sync::Arc;

use content_gate::storage::StoreKey;
use content_gate::{ContentStore, GateConfig, GateError, MemoryStore, Platform, ProviderError, ProviderFailure};

#[allow(dead_code)]
mod common {
    include!("common/mod.rs");
}

use common::*;

/// 传输错误在每个模型上重试，全部失败后返回传输错误
#[tokio::test]
async fn test_transport_failure_exhausts_every_model() {
    let provider = ScriptedProvider::always(Err(ProviderError::new(ProviderFailure::Transport, "connection reset")));
    let store = Arc::new(MemoryStore::new());
    let orchestrator = orchestrator(provider.clone(), store.clone());

    let result = orchestrator.run(&request(Platform::Blog)).await;

    assert!(matches!(result, Err(GateError::Transport(_))), "{:?}", result);
    let primary = test_config().primary_model;
    let models: Vec<String> = provider.calls().into_iter().map(|c| c.model).collect();
    assert_eq!(
        models,
        vec![primary.clone(), primary, "backup-model".to_string(), "backup-model".to_string()]
    );
    assert!(store.is_empty());
}

/// 认证失败不重试也不换模型
#[tokio::test]
async fn test_authentication_failure_is_immediate() {
    let provider = ScriptedProvider::always(Err(ProviderError::from_status(401, "invalid api key")));
    let store = Arc::new(MemoryStore::new());
    let orchestrator = orchestrator(provider.clone(), store.clone());

    let result = orchestrator.run(&request(Platform::Medium)).await;

    match result {
        Err(GateError::ProviderRejection { kind, .. }) => assert_eq!(kind, ProviderFailure::Authentication),
        other => panic!("unexpected result: {:?}", other),
    }
    assert_eq!(provider.call_count(), 1);
    assert!(store.is_empty());
}

/// 修订无法消除硬性问题时返回校验错误，且不写入存储
#[tokio::test]
async fn test_unfixable_draft_is_rejected_and_not_stored() {
    let provider = ScriptedProvider::always(Ok(simplified_completion()));
    let store = Arc::new(MemoryStore::new());
    let config = GateConfig {
        bilingual_enabled: false,
        ..test_config()
    };
    let orchestrator = orchestrator_with(config.clone(), provider.clone(), store.clone());
    let req = request(Platform::Blog);

    let result = orchestrator.run(&req).await;

    match result {
        Err(GateError::Validation { issues }) => assert!(!issues.is_empty()),
        other => panic!("unexpected result: {:?}", other),
    }
    // 首稿 + 每轮修订各一次
    assert_eq!(provider.call_count(), 1 + config.max_revision_rounds);
    assert!(store.read(&StoreKey::for_request(&req)).await.unwrap().is_none());
}

/// 修订调用失败时保留已有候选继续定稿
#[tokio::test]
async fn test_failed_revision_keeps_best_candidate() {
    let provider = ScriptedProvider::new(vec![
        Ok(flawed_completion()),
        Err(ProviderError::from_status(401, "key revoked")),
    ]);
    let store = Arc::new(MemoryStore::new());
    let config = GateConfig {
        bilingual_enabled: false,
        ..test_config()
    };
    let orchestrator = orchestrator_with(config, provider.clone(), store.clone());

    let result = orchestrator.run(&request(Platform::Blog)).await;

    // 修订失败不作为服务错误返回；修复后的候选仍差 GEO 分数
    assert_eq!(provider.call_count(), 2);
    match result {
        Err(GateError::Validation { issues }) => {
            assert_eq!(issues, vec!["[score_gate] GEO 分数 80 低于门槛 85".to_string()]);
        }
        other => panic!("unexpected result: {:?}", other),
    }
    assert!(store.is_empty());
}

/// 修订调用失败时，保留的候选经确定性修复后通过闸门并写入存储
#[tokio::test]
async fn test_failed_revision_persists_repaired_candidate() {
    let provider = ScriptedProvider::new(vec![
        Ok(repairable_completion()),
        Err(ProviderError::from_status(401, "key revoked")),
    ]);
    let store = Arc::new(MemoryStore::new());
    let config = GateConfig {
        bilingual_enabled: false,
        ..test_config()
    };
    let orchestrator = orchestrator_with(config, provider.clone(), store.clone());
    let request = request(Platform::Blog);

    let result = orchestrator.run(&request).await.unwrap();

    assert_eq!(provider.call_count(), 2);
    assert!(!result.body.contains(SHORTENED_URL));
    assert!(result.body.contains("## 常見問題"));
    assert_eq!(store.len(), 1);
    let key = StoreKey::for_request(&request);
    let stored = store.read(&key).await.unwrap().unwrap();
    assert_eq!(stored.body, result.body);
}
