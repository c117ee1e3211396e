//! # Decoration Producers
//!
//! Synthesize decorators from document text.
//!
//! - A [`PatternProducer`] finds matches in each text-bearing node (regex or
//!   closure), extracts data from every match and turns it into zero or more
//!   decorators.
//! - A [`GeneratorProducer`] gets the node, its text and the whole document
//!   and returns whatever decorators it likes.
//!
//! Producers run in ascending priority. Every enabled producer runs; priority
//! only orders the output. A failing callback (an `Err` or a panic) loses its
//! own contribution for that invocation and nothing else.

use crate::config::PatternConfig;
use crate::error::{RenderError, RenderResult};
use quire_common::text_nodes;
use quire_model::{char_len, char_slice, Decorator, DecoratorKind, ModelNode};
use regex::Regex;
use serde_json::{json, Value};
use std::any::Any;
use std::fmt;
use std::panic::{self, AssertUnwindSafe};
use std::sync::Arc;
use tracing::{debug, instrument, warn};

pub type ProducerError = Box<dyn std::error::Error + Send + Sync>;

pub type MatchFn = dyn Fn(&str) -> Vec<(usize, usize)> + Send + Sync;
pub type ExtractFn = dyn Fn(&PatternMatch) -> Value + Send + Sync;
pub type CreateFn =
    dyn Fn(&PatternMatch, Value) -> Result<Vec<Decorator>, ProducerError> + Send + Sync;
pub type GenerateFn = dyn Fn(&ModelNode, &str, &GeneratorContext<'_>) -> Result<Vec<Decorator>, ProducerError>
    + Send
    + Sync;

/// How a pattern producer finds matches. Closure matchers return char
/// ranges; regex byte offsets are converted to chars.
#[derive(Clone)]
pub enum Matcher {
    Regex(Regex),
    Function(Arc<MatchFn>),
}

impl Matcher {
    pub fn function(f: impl Fn(&str) -> Vec<(usize, usize)> + Send + Sync + 'static) -> Self {
        Matcher::Function(Arc::new(f))
    }

    pub fn find_all(&self, text: &str) -> Vec<(usize, usize)> {
        match self {
            Matcher::Regex(regex) => regex
                .find_iter(text)
                .filter(|m| !m.as_str().is_empty())
                .map(|m| {
                    let start = char_len(&text[..m.start()]);
                    (start, start + char_len(m.as_str()))
                })
                .collect(),
            Matcher::Function(f) => {
                let len = char_len(text);
                f(text)
                    .into_iter()
                    .map(|(start, end)| (start.min(len), end.min(len)))
                    .filter(|(start, end)| start < end)
                    .collect()
            }
        }
    }
}

impl fmt::Debug for Matcher {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Matcher::Regex(regex) => f.debug_tuple("Regex").field(&regex.as_str()).finish(),
            Matcher::Function(_) => f.write_str("Function(..)"),
        }
    }
}

/// One match of a pattern producer inside a text-bearing node.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PatternMatch {
    pub producer: String,
    pub node_id: String,
    pub start: usize,
    pub end: usize,
    pub text: String,
}

impl PatternMatch {
    /// `<producer>-<nodeId>-<start>-<end>`
    pub fn default_id(&self) -> String {
        format!("{}-{}-{}-{}", self.producer, self.node_id, self.start, self.end)
    }
}

pub struct PatternProducer {
    pub name: String,
    pub matcher: Matcher,
    pub priority: i32,
    pub enabled: bool,
    extract: Arc<ExtractFn>,
    create: Arc<CreateFn>,
}

impl PatternProducer {
    pub fn new(
        name: impl Into<String>,
        matcher: Matcher,
        create: impl Fn(&PatternMatch, Value) -> Result<Vec<Decorator>, ProducerError>
            + Send
            + Sync
            + 'static,
    ) -> Self {
        Self {
            name: name.into(),
            matcher,
            priority: 0,
            enabled: true,
            extract: Arc::new(|m: &PatternMatch| json!({ "text": m.text })),
            create: Arc::new(create),
        }
    }

    pub fn regex(
        name: impl Into<String>,
        pattern: &str,
        create: impl Fn(&PatternMatch, Value) -> Result<Vec<Decorator>, ProducerError>
            + Send
            + Sync
            + 'static,
    ) -> RenderResult<Self> {
        let name = name.into();
        let regex = Regex::new(pattern).map_err(|source| RenderError::InvalidPattern {
            name: name.clone(),
            source,
        })?;
        Ok(Self::new(name, Matcher::Regex(regex), create))
    }

    /// Producer described by configuration: one decorator per match, ranged
    /// over the match, carrying `{ "text": <match> }`.
    pub fn from_config(config: &PatternConfig) -> RenderResult<Self> {
        let decoration_type = config.decoration_type.clone();
        let category = config.category;
        let layer_target = config.layer_target;

        let producer = Self::regex(config.name.clone(), &config.pattern, move |m, data| {
            let mut decorator = Decorator::new(m.default_id(), decoration_type.clone(), category)
                .with_range(m.node_id.clone(), m.start, m.end)
                .with_kind(DecoratorKind::Pattern)
                .with_data(data);
            if let Some(layer_target) = layer_target {
                decorator = decorator.with_layer_target(layer_target);
            }
            Ok(vec![decorator])
        })?;

        Ok(producer
            .with_priority(config.priority)
            .with_enabled(config.enabled))
    }

    pub fn with_extract(
        mut self,
        extract: impl Fn(&PatternMatch) -> Value + Send + Sync + 'static,
    ) -> Self {
        self.extract = Arc::new(extract);
        self
    }

    pub fn with_priority(mut self, priority: i32) -> Self {
        self.priority = priority;
        self
    }

    pub fn with_enabled(mut self, enabled: bool) -> Self {
        self.enabled = enabled;
        self
    }

    /// Decorators for one node's text, in match order.
    pub fn produce(&self, node: &ModelNode, text: &str) -> Vec<Decorator> {
        let Some(ranges) = isolated(&self.name, "match", || Ok(self.matcher.find_all(text))) else {
            return vec![];
        };

        let mut decorators = Vec::new();
        for (start, end) in ranges {
            let found = PatternMatch {
                producer: self.name.clone(),
                node_id: node.id.clone(),
                start,
                end,
                text: char_slice(text, start, end),
            };
            let produced = isolated(&self.name, "create", || {
                let data = (self.extract)(&found);
                (self.create)(&found, data)
            });
            if let Some(produced) = produced {
                decorators.extend(
                    produced
                        .into_iter()
                        .map(|d| with_default_kind(d, DecoratorKind::Pattern)),
                );
            }
        }
        decorators
    }
}

impl fmt::Debug for PatternProducer {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("PatternProducer")
            .field("name", &self.name)
            .field("matcher", &self.matcher)
            .field("priority", &self.priority)
            .field("enabled", &self.enabled)
            .finish()
    }
}

/// Read-only view of the document handed to generators.
#[derive(Debug, Clone, Copy)]
pub struct GeneratorContext<'a> {
    pub document: &'a ModelNode,
}

pub struct GeneratorProducer {
    pub name: String,
    pub priority: i32,
    pub enabled: bool,
    generate: Arc<GenerateFn>,
}

impl GeneratorProducer {
    pub fn new(
        name: impl Into<String>,
        generate: impl Fn(&ModelNode, &str, &GeneratorContext<'_>) -> Result<Vec<Decorator>, ProducerError>
            + Send
            + Sync
            + 'static,
    ) -> Self {
        Self {
            name: name.into(),
            priority: 0,
            enabled: true,
            generate: Arc::new(generate),
        }
    }

    pub fn with_priority(mut self, priority: i32) -> Self {
        self.priority = priority;
        self
    }

    pub fn with_enabled(mut self, enabled: bool) -> Self {
        self.enabled = enabled;
        self
    }

    pub fn produce(&self, node: &ModelNode, text: &str, context: &GeneratorContext<'_>) -> Vec<Decorator> {
        isolated(&self.name, "generate", || (self.generate)(node, text, context))
            .map(|produced| {
                produced
                    .into_iter()
                    .map(|d| with_default_kind(d, DecoratorKind::Custom))
                    .collect()
            })
            .unwrap_or_default()
    }
}

impl fmt::Debug for GeneratorProducer {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("GeneratorProducer")
            .field("name", &self.name)
            .field("priority", &self.priority)
            .field("enabled", &self.enabled)
            .finish()
    }
}

/// Every producer registered on one engine.
#[derive(Debug, Default)]
pub struct DecoratorProducers {
    patterns: Vec<PatternProducer>,
    generators: Vec<GeneratorProducer>,
}

impl DecoratorProducers {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn from_configs(configs: &[PatternConfig]) -> RenderResult<Self> {
        let mut producers = Self::new();
        for config in configs {
            producers.register_pattern(PatternProducer::from_config(config)?);
        }
        Ok(producers)
    }

    /// Registers a pattern producer, replacing one with the same name.
    pub fn register_pattern(&mut self, producer: PatternProducer) {
        if let Some(index) = self.patterns.iter().position(|p| p.name == producer.name) {
            debug!(producer = %producer.name, "Replacing pattern producer");
            self.patterns[index] = producer;
        } else {
            self.patterns.push(producer);
        }
    }

    /// Registers a generator, replacing one with the same name.
    pub fn register_generator(&mut self, producer: GeneratorProducer) {
        if let Some(index) = self.generators.iter().position(|g| g.name == producer.name) {
            debug!(producer = %producer.name, "Replacing generator");
            self.generators[index] = producer;
        } else {
            self.generators.push(producer);
        }
    }

    /// Returns false when no producer has that name.
    pub fn set_enabled(&mut self, name: &str, enabled: bool) -> bool {
        let mut found = false;
        for pattern in self.patterns.iter_mut().filter(|p| p.name == name) {
            pattern.enabled = enabled;
            found = true;
        }
        for generator in self.generators.iter_mut().filter(|g| g.name == name) {
            generator.enabled = enabled;
            found = true;
        }
        found
    }

    /// Enabled pattern producers in ascending priority (stable for ties).
    pub fn enabled_patterns(&self) -> Vec<&PatternProducer> {
        let mut enabled: Vec<_> = self.patterns.iter().filter(|p| p.enabled).collect();
        enabled.sort_by_key(|p| p.priority);
        enabled
    }

    pub fn enabled_generators(&self) -> Vec<&GeneratorProducer> {
        let mut enabled: Vec<_> = self.generators.iter().filter(|g| g.enabled).collect();
        enabled.sort_by_key(|g| g.priority);
        enabled
    }

    pub fn is_empty(&self) -> bool {
        self.patterns.is_empty() && self.generators.is_empty()
    }

    /// Runs every enabled producer over every text-bearing node.
    ///
    /// Pattern producers come first, then generators, each group in
    /// ascending priority; within a producer nodes are visited depth-first.
    #[instrument(skip_all, fields(root = %model.id))]
    pub fn generate(&self, model: &ModelNode) -> Vec<Decorator> {
        let nodes = text_nodes(model);
        let context = GeneratorContext { document: model };
        let mut decorators = Vec::new();

        for producer in self.enabled_patterns() {
            for node in &nodes {
                if let Some(text) = node.text.as_deref() {
                    decorators.extend(producer.produce(node, text));
                }
            }
        }
        for producer in self.enabled_generators() {
            for node in &nodes {
                if let Some(text) = node.text.as_deref() {
                    decorators.extend(producer.produce(node, text, &context));
                }
            }
        }

        debug!(count = decorators.len(), "Producers generated decorators");
        decorators
    }
}

fn with_default_kind(mut decorator: Decorator, kind: DecoratorKind) -> Decorator {
    if decorator.kind.is_none() {
        decorator.kind = Some(kind);
    }
    decorator
}

/// Runs a producer callback, turning errors and panics into a logged skip.
fn isolated<T>(
    producer: &str,
    stage: &str,
    f: impl FnOnce() -> Result<T, ProducerError>,
) -> Option<T> {
    match panic::catch_unwind(AssertUnwindSafe(f)) {
        Ok(Ok(value)) => Some(value),
        Ok(Err(err)) => {
            warn!(producer = producer, stage = stage, error = %err, "Producer failed, skipping its output");
            None
        }
        Err(payload) => {
            warn!(
                producer = producer,
                stage = stage,
                panic = %panic_message(payload.as_ref()),
                "Producer panicked, skipping its output"
            );
            None
        }
    }
}

fn panic_message(payload: &(dyn Any + Send)) -> String {
    if let Some(message) = payload.downcast_ref::<&str>() {
        message.to_string()
    } else if let Some(message) = payload.downcast_ref::<String>() {
        message.clone()
    } else {
        "unknown panic".to_string()
    }
}
