// SPDX-License-Identifier: MIT

//! Rendering for query results (`get_fws`/`get_wflows`) and simple
//! command summaries, in the three output formats: `text` (default),
//! `json`, `yaml`.

use clap::ValueEnum;
use serde::Serialize;
use serde_json::Value;

#[derive(Clone, Copy, Debug, Default, PartialEq, ValueEnum)]
pub enum OutputFormat {
    #[default]
    Text,
    Json,
    Yaml,
}

impl OutputFormat {
    pub fn is_text(&self) -> bool {
        matches!(self, OutputFormat::Text)
    }

    /// Serialize and print `value`; a no-op in `Text` mode, where the
    /// caller is expected to have already printed something more
    /// tailored than a generic dump.
    pub fn print_value<T: Serialize>(&self, value: &T) -> anyhow::Result<()> {
        match self {
            OutputFormat::Json => println!("{}", serde_json::to_string_pretty(value)?),
            OutputFormat::Yaml => println!("{}", serde_yaml::to_string(value)?),
            OutputFormat::Text => {}
        }
        Ok(())
    }
}

/// `get_fws`/`get_wflows` display modes, ported from `lpad_run.py`'s
/// `display_format` argument.
#[derive(Clone, Copy, Debug, PartialEq, Eq, ValueEnum)]
pub enum DisplayFormat {
    Ids,
    Count,
    Less,
    More,
    All,
}

impl Default for DisplayFormat {
    fn default() -> Self {
        DisplayFormat::Less
    }
}

/// One query hit, already reduced to the fields `less`/`more`/`all`
/// need — built by the caller from a [`fwrs_core::Task`] (plus,
/// for `more`/`all`, its workflow and tail launch).
#[derive(Debug, Clone, Serialize)]
pub struct FwSummary {
    pub fw_id: u64,
    pub name: String,
    pub state: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub launch_dir: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub spec: Option<Value>,
    /// `get_wflows`'s descendant tree, populated for `more`/`all` only.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub members: Option<Vec<u64>>,
}

/// Render a list of matched task/workflow ids in the requested
/// `display` mode and `format`. Returns the would-be text output so
/// callers (and tests) can assert on it without capturing stdout.
pub fn render_fws(items: &[FwSummary], display: DisplayFormat, format: OutputFormat) -> anyhow::Result<String> {
    if !format.is_text() {
        let out = match display {
            DisplayFormat::Ids => serde_json::json!(items.iter().map(|i| i.fw_id).collect::<Vec<_>>()),
            DisplayFormat::Count => serde_json::json!(items.len()),
            _ => serde_json::json!(items),
        };
        format.print_value(&out)?;
        return Ok(String::new());
    }

    let mut out = String::new();
    match display {
        DisplayFormat::Ids => {
            for i in items {
                out.push_str(&i.fw_id.to_string());
                out.push('\n');
            }
        }
        DisplayFormat::Count => {
            out.push_str(&items.len().to_string());
            out.push('\n');
        }
        DisplayFormat::Less => {
            for i in items {
                out.push_str(&format!("{:>6}  {:<12}  {}\n", i.fw_id, i.state, i.name));
            }
        }
        DisplayFormat::More | DisplayFormat::All => {
            for i in items {
                out.push_str(&format!("fw_id: {}\nname: {}\nstate: {}\n", i.fw_id, i.name, i.state));
                if let Some(dir) = &i.launch_dir {
                    out.push_str(&format!("launch_dir: {dir}\n"));
                }
                if let Some(members) = &i.members {
                    out.push_str(&format!("members: {members:?}\n"));
                }
                if let Some(spec) = &i.spec {
                    out.push_str(&format!("spec: {}\n", serde_json::to_string(spec)?));
                }
                out.push('\n');
            }
        }
    }
    print!("{out}");
    Ok(out)
}

/// Print a plain count-style summary line for mutating admin commands
/// (`rerun_fws`, `defuse_fws`, ...) — how many records matched and were
/// changed.
pub fn print_mutation_summary(verb: &str, ids: &[u64], format: OutputFormat) -> anyhow::Result<()> {
    if !format.is_text() {
        format.print_value(&serde_json::json!({ "verb": verb, "ids": ids }))?;
        return Ok(());
    }
    if ids.is_empty() {
        println!("no matching fireworks");
    } else {
        println!("{} {} firework(s): {:?}", verb, ids.len(), ids);
    }
    Ok(())
}
