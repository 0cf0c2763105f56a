//! 工具箱：注册表与内置工具（echo、calculator、文件系统、web 搜索、日程）

pub mod calculator;
pub mod echo;
pub mod filesystem;
pub mod registry;
pub mod schedule;
pub mod web_search;

pub use calculator::CalculatorTool;
pub use echo::EchoTool;
pub use filesystem::{DeleteFileTool, ListDirTool, ReadFileTool, SafeFs, WriteFileTool};
pub use registry::{bind_args, Tool, ToolError, ToolRegistry};
pub use schedule::{AddEventTool, ListEventsTool, RemoveEventTool};
pub use web_search::WebSearchTool;
