//! Tool command handler.

use anyhow::{Context, Result};
use serde_json::Value;

use crate::cli::ToolArgs;
use crate::service::NoteService;
use crate::tools::ToolRegistry;

pub fn handle_tool(args: &ToolArgs, service: &NoteService) -> Result<()> {
    let registry = ToolRegistry::new();

    let Some(name) = &args.name else {
        for tool in registry.tools() {
            println!("{:<22}  {}", tool.name, tool.description);
        }
        return Ok(());
    };

    let json = match &args.args {
        Some(raw) => serde_json::from_str(raw)
            .with_context(|| format!("tool arguments are not valid JSON: {}", raw))?,
        None => Value::Null,
    };

    let answer = registry.call(name, service, json)?;
    println!("{}", answer);
    Ok(())
}
