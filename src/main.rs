//! Wasp - Rust 个人智能体内核
//!
//! 入口：初始化日志与配置，装配 LLM / 记忆 / 工具 / AgentManager，运行交互式 Shell。

use std::sync::Arc;

use anyhow::Context;
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

use wasp::agent::AgentManager;
use wasp::config::{load_config, AppConfig};
use wasp::core::Kernel;
use wasp::llm::{create_embedder_from_config, LlmProvider, MockProvider, OpenAiProvider};
use wasp::memory::Memory;
use wasp::scheduler::EventStore;
use wasp::shell::run_shell;
use wasp::tools::{
    AddEventTool, CalculatorTool, DeleteFileTool, EchoTool, ListDirTool, ListEventsTool,
    ReadFileTool, RemoveEventTool, WebSearchTool, WriteFileTool,
};

/// 根据配置与环境变量选择 LLM 后端（OpenAI 兼容 / Mock）
fn create_provider_from_config(cfg: &AppConfig) -> Arc<dyn LlmProvider> {
    let provider = cfg.llm.provider.to_lowercase();
    let has_key = std::env::var("OPENAI_API_KEY").is_ok();

    if provider == "openai" && has_key {
        tracing::info!("Using OpenAI-compatible LLM ({})", cfg.llm.model);
        Arc::new(OpenAiProvider::new(
            cfg.llm.base_url.as_deref(),
            &cfg.llm.model,
            std::env::var("OPENAI_API_KEY").ok().as_deref(),
        ))
    } else {
        if provider != "mock" {
            tracing::warn!("No API key set or provider unknown, using Mock LLM");
        }
        Arc::new(MockProvider::new())
    }
}

/// 装配 AgentManager：Kernel（+ 可选记忆）、事件库与全部内置工具
fn build_agent(cfg: &AppConfig) -> anyhow::Result<AgentManager> {
    let provider = create_provider_from_config(cfg);

    let memory = if cfg.memory.enabled {
        let memory = Memory::new(cfg.memory.dim);
        if let Some(embedder) = create_embedder_from_config(
            cfg.llm.base_url.as_deref(),
            &cfg.memory.embedding_model,
            None,
        ) {
            memory.set_embeddings_provider(embedder);
        }
        Some(Arc::new(memory))
    } else {
        None
    };

    let mut kernel = Kernel::new(provider).with_memory_top_k(cfg.memory.top_k);
    if let Some(ref memory) = memory {
        kernel = kernel.with_memory(Arc::clone(memory));
    }
    let kernel = Arc::new(kernel);

    let db_path = cfg
        .scheduler
        .db_path
        .clone()
        .unwrap_or_else(|| cfg.app.data_dir().join("events.db"));
    let events = Arc::new(EventStore::open(&db_path).context("Failed to open event store")?);

    let workspace = cfg
        .tools
        .filesystem_root
        .clone()
        .unwrap_or_else(|| std::path::PathBuf::from("workspace"));
    std::fs::create_dir_all(&workspace).ok();

    let mut manager = AgentManager::new(kernel);
    manager.register_tool(EchoTool);
    manager.register_tool(CalculatorTool);
    manager.register_tool(ReadFileTool::new(&workspace));
    manager.register_tool(ListDirTool::new(&workspace));
    manager.register_tool(WriteFileTool::new(&workspace));
    manager.register_tool(DeleteFileTool::new(&workspace));
    manager.register_tool(WebSearchTool::new(
        cfg.tools.search.timeout_secs,
        cfg.tools.search.max_results,
    ));
    let mut add_event = AddEventTool::new(Arc::clone(&events));
    if let Some(ref memory) = memory {
        add_event = add_event.with_memory(Arc::clone(memory));
    }
    manager.register_tool(add_event);
    manager.register_tool(ListEventsTool::new(Arc::clone(&events)));
    manager.register_tool(RemoveEventTool::new(Arc::clone(&events)));

    Ok(manager)
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // 日志：默认 info，可通过 RUST_LOG 覆盖
    tracing_subscriber::registry()
        .with(EnvFilter::from_default_env().add_directive("info".parse().unwrap()))
        .with(fmt::layer())
        .init();

    let cfg = load_config(None).unwrap_or_else(|e| {
        tracing::warn!("Config load failed ({}), using defaults", e);
        AppConfig::default()
    });

    let manager = build_agent(&cfg).context("Failed to build agent")?;

    run_shell(&manager).await.context("Shell run failed")?;

    Ok(())
}
