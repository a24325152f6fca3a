use crate::types::{CrecError, Result};
use anyhow::anyhow;
use interfaces::{Transform, TransformContext};
use scraper::Selector;
use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;

type TransformFactory = fn() -> Box<dyn Transform>;

fn external_link_remover() -> Box<dyn Transform> {
    Box::new(ExternalLinkRemover)
}

fn bold_element_remover() -> Box<dyn Transform> {
    Box::new(BoldElementRemover)
}

fn image_extractor() -> Box<dyn Transform> {
    Box::new(ImageExtractor)
}

const REGISTRY: &[(&str, TransformFactory)] = &[
    ("ExternalLinkRemover", external_link_remover),
    ("BoldElementRemover", bold_element_remover),
    ("ImageExtractor", image_extractor),
];

/// Instantiates the transform registered under `name`.
pub fn create_transform(name: &str) -> Result<Box<dyn Transform>> {
    REGISTRY
        .iter()
        .find(|(registered, _)| *registered == name)
        .map(|(_, factory)| factory())
        .ok_or_else(|| CrecError::UnknownTransform {
            name: name.to_string(),
        })
}

pub fn transform_names() -> Vec<&'static str> {
    REGISTRY.iter().map(|(name, _)| *name).collect()
}

/// Output of a pipeline run. Unlike the parsed document it can cross await
/// points.
#[derive(Debug, Clone, Default)]
pub struct Transformed {
    pub html: String,
    pub result: HashMap<String, String>,
}

/// Ordered chain of transforms declared by one provider.
#[derive(Clone, Default)]
pub struct Pipeline {
    transforms: Vec<Arc<dyn Transform>>,
}

impl fmt::Debug for Pipeline {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let names: Vec<&str> = self.transforms.iter().map(|t| t.name()).collect();
        f.debug_tuple("Pipeline").field(&names).finish()
    }
}

impl Pipeline {
    pub fn from_names<S: AsRef<str>>(names: &[S]) -> Result<Self> {
        let transforms = names
            .iter()
            .map(|name| create_transform(name.as_ref()).map(Arc::from))
            .collect::<Result<Vec<_>>>()?;
        Ok(Self { transforms })
    }

    pub fn len(&self) -> usize {
        self.transforms.len()
    }

    pub fn is_empty(&self) -> bool {
        self.transforms.is_empty()
    }

    /// Runs every stage in order. The first failing stage aborts the run.
    pub fn run(&self, html: &str) -> Result<Transformed> {
        let mut context = TransformContext::from_fragment(html);
        for transform in &self.transforms {
            context = transform.process(context).map_err(|e| {
                CrecError::Transform(format!("{} failed: {}", transform.name(), e))
            })?;
        }
        Ok(Transformed {
            html: context.html(),
            result: context.result,
        })
    }
}

fn selector(css: &str) -> anyhow::Result<Selector> {
    Selector::parse(css).map_err(|e| anyhow!("Invalid selector {}: {}", css, e))
}

fn remove_elements(mut context: TransformContext, css: &str) -> anyhow::Result<TransformContext> {
    let selector = selector(css)?;
    let ids: Vec<_> = context
        .document
        .select(&selector)
        .map(|element| element.id())
        .collect();
    for id in ids {
        if let Some(mut node) = context.document.tree.get_mut(id) {
            node.detach();
        }
    }
    Ok(context)
}

/// Drops every `<a>` element together with its text.
pub struct ExternalLinkRemover;

impl Transform for ExternalLinkRemover {
    fn name(&self) -> &str {
        "ExternalLinkRemover"
    }

    fn process(&self, context: TransformContext) -> anyhow::Result<TransformContext> {
        remove_elements(context, "a")
    }
}

/// Drops every `<b>` element.
pub struct BoldElementRemover;

impl Transform for BoldElementRemover {
    fn name(&self) -> &str {
        "BoldElementRemover"
    }

    fn process(&self, context: TransformContext) -> anyhow::Result<TransformContext> {
        remove_elements(context, "b")
    }
}

/// Records the first image source under the `"image"` result key.
pub struct ImageExtractor;

impl Transform for ImageExtractor {
    fn name(&self) -> &str {
        "ImageExtractor"
    }

    fn process(&self, mut context: TransformContext) -> anyhow::Result<TransformContext> {
        let selector = selector("img")?;
        let src = context
            .document
            .select(&selector)
            .find_map(|img| img.value().attr("src"))
            .map(|src| {
                if src.starts_with("//") {
                    format!("http:{}", src)
                } else {
                    src.to_string()
                }
            });
        if let Some(src) = src {
            context.result.insert("image".to_string(), src);
        }
        Ok(context)
    }
}
