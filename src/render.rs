//! HTML rendering with Tera templates embedded in the binary.

use anyhow::{anyhow, Context as _, Result};
use rust_embed::RustEmbed;
use std::collections::HashMap;
use std::path::{Path, PathBuf};
use tera::{Context, Tera, Value};

#[derive(RustEmbed)]
#[folder = "templates/"]
struct Templates;

/// Template sources next to the crate manifest, used for hot reloading.
pub const SOURCE_TEMPLATE_DIR: &str = concat!(env!("CARGO_MANIFEST_DIR"), "/templates");

pub struct Renderer {
    tera: Tera,
    /// When set, templates are re-read from this directory on every render.
    reload_from: Option<PathBuf>,
}

impl Renderer {
    /// Renderer over the embedded templates, or over `template_dir` with
    /// hot reloading.
    pub fn new(template_dir: Option<&Path>) -> Result<Self> {
        let tera = match template_dir {
            Some(dir) => load_template_dir(dir)?,
            None => load_templates()?,
        };
        Ok(Self {
            tera,
            reload_from: template_dir.map(Path::to_path_buf),
        })
    }

    pub fn render(&self, name: &str, context: &Context) -> Result<String> {
        if let Some(dir) = &self.reload_from {
            let tera = load_template_dir(dir)?;
            return tera
                .render(name, context)
                .with_context(|| format!("Failed to render {}", name));
        }
        self.tera
            .render(name, context)
            .with_context(|| format!("Failed to render {}", name))
    }

    pub fn template_names(&self) -> Vec<&str> {
        let mut names: Vec<_> = self.tera.get_template_names().collect();
        names.sort_unstable();
        names
    }
}

fn load_templates() -> Result<Tera> {
    let mut sources = Vec::new();
    for name in Templates::iter() {
        let file = Templates::get(&name).ok_or_else(|| anyhow!("Missing template {}", name))?;
        let content = String::from_utf8(file.data.into_owned())
            .with_context(|| format!("Template {} is not UTF-8", name))?;
        sources.push((name.to_string(), content));
    }

    let mut tera = Tera::default();
    tera.add_raw_templates(sources)
        .context("Failed to parse templates")?;
    tera.register_filter("convert_to_json", convert_to_json);
    Ok(tera)
}

fn load_template_dir(dir: &Path) -> Result<Tera> {
    let pattern = format!("{}/**/*.html", dir.display());
    let mut tera = Tera::new(&pattern)
        .with_context(|| format!("Failed to load templates from {}", dir.display()))?;
    tera.register_filter("convert_to_json", convert_to_json);
    Ok(tera)
}

fn convert_to_json(value: &Value, _args: &HashMap<String, Value>) -> tera::Result<Value> {
    serde_json::to_string(value)
        .map(Value::String)
        .map_err(|e| tera::Error::msg(e.to_string()))
}
