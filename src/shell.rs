//! 交互式 Shell
//!
//! 行式 REPL：exit/quit 退出，version/status 查看状态，其余输入交给 AgentManager 单轮执行。

use std::io::Write;

use tokio::io::{AsyncBufReadExt, BufReader};

use crate::agent::AgentManager;

const PROMPT: &str = "wasp> ";

fn print_help() {
    println!("Commands: help, version, status, exit, quit");
    println!("Anything else is sent to the agent.");
}

fn print_status(manager: &AgentManager) {
    let memory = match manager.kernel().memory() {
        Some(m) if m.has_embedder() => format!("enabled ({} records)", m.len()),
        Some(_) => "configured, no embedder".to_string(),
        None => "disabled".to_string(),
    };
    let mut tools = manager.tool_names();
    tools.sort();
    println!("Wasp status:");
    println!("- Memory: {memory}");
    println!("- Tools: {}", tools.join(", "));
}

/// 运行 REPL，直到 exit/quit 或 EOF
pub async fn run_shell(manager: &AgentManager) -> anyhow::Result<()> {
    println!("Welcome to Wasp. Type help or ? to list commands.");
    let mut lines = BufReader::new(tokio::io::stdin()).lines();

    loop {
        print!("{PROMPT}");
        std::io::stdout().flush()?;

        let Some(line) = lines.next_line().await? else {
            // EOF (Ctrl+D)
            println!();
            break;
        };
        let input = line.trim();

        match input {
            "" => continue,
            "exit" | "quit" => break,
            "help" | "?" => print_help(),
            "version" => println!("Wasp v{}", env!("CARGO_PKG_VERSION")),
            "status" => print_status(manager),
            _ => match manager.execute(input).await {
                Ok(output) => println!("{output}"),
                Err(e) => eprintln!("Error: {e}"),
            },
        }
    }

    println!("Exiting Wasp. Goodbye!");
    Ok(())
}
