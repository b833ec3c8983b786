//! Component type registry.
//!
//! Maps a type name to its [`ComponentDefinition`] together with the
//! compiled matchers and template used by the tokenizer and serializer.
//! Iteration order is registration order; it decides tie-breaks between
//! matches starting at the same offset.

use crate::ast::{PlaceholderNode, RawValue};
use crate::error::{RegistryError, RegistryResult};
use crate::template::{Template, TemplateVars, DEFAULT_TEMPLATE, PAYLOAD_PATTERN};
use indexmap::IndexMap;
use regex::{Regex, RegexBuilder};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tracing::{debug, warn};

fn default_true() -> bool {
    true
}

fn default_value_key() -> String {
    "code".to_string()
}

fn default_label_key() -> String {
    "name".to_string()
}

fn default_template() -> String {
    DEFAULT_TEMPLATE.to_string()
}

/// Declarative description of one placeholder type
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ComponentDefinition {
    #[serde(rename = "type")]
    pub component_type: String,

    #[serde(default)]
    pub prefix: String,

    #[serde(default)]
    pub suffix: String,

    #[serde(default = "default_true")]
    pub needs_payload: bool,

    /// Regex patterns; empty means "derive from the template"
    #[serde(default)]
    pub matchers: Vec<String>,

    #[serde(default = "default_value_key")]
    pub value_key: String,

    #[serde(default = "default_label_key")]
    pub label_key: String,

    #[serde(default = "default_template")]
    pub template: String,

    /// Label shown for a fresh node before anything else is known
    #[serde(default)]
    pub default_text: String,
}

impl ComponentDefinition {
    pub fn new(component_type: impl Into<String>, prefix: impl Into<String>) -> Self {
        Self {
            component_type: component_type.into(),
            prefix: prefix.into(),
            suffix: String::new(),
            needs_payload: true,
            matchers: Vec::new(),
            value_key: default_value_key(),
            label_key: default_label_key(),
            template: default_template(),
            default_text: String::new(),
        }
    }

    pub fn with_suffix(mut self, suffix: impl Into<String>) -> Self {
        self.suffix = suffix.into();
        self
    }

    pub fn with_template(mut self, template: impl Into<String>) -> Self {
        self.template = template.into();
        self
    }

    pub fn with_matcher(mut self, pattern: impl Into<String>) -> Self {
        self.matchers.push(pattern.into());
        self
    }

    pub fn without_payload(mut self) -> Self {
        self.needs_payload = false;
        self
    }

    pub fn with_default_text(mut self, text: impl Into<String>) -> Self {
        self.default_text = text.into();
        self
    }

    pub fn with_keys(mut self, value_key: impl Into<String>, label_key: impl Into<String>) -> Self {
        self.value_key = value_key.into();
        self.label_key = label_key.into();
        self
    }

    /// Value stored for payload-less types: the prefix, else the type name
    pub fn type_token(&self) -> &str {
        if self.prefix.is_empty() {
            &self.component_type
        } else {
            &self.prefix
        }
    }
}

/// A compiled regex plus the capture group holding the payload
#[derive(Debug, Clone)]
pub struct Matcher {
    regex: Regex,
    payload_group: Option<usize>,
}

impl Matcher {
    fn new(regex: Regex) -> Self {
        let payload_group = regex
            .capture_names()
            .position(|name| name == Some("payload"))
            .or(if regex.captures_len() > 1 { Some(1) } else { None });
        Self {
            regex,
            payload_group,
        }
    }

    pub fn regex(&self) -> &Regex {
        &self.regex
    }

    pub fn payload_group(&self) -> Option<usize> {
        self.payload_group
    }
}

/// A registered definition with its matchers and template compiled
#[derive(Debug)]
pub struct CompiledComponent {
    definition: ComponentDefinition,
    template: Template,
    matchers: Vec<Matcher>,
    prefix_strip: Option<Regex>,
    payload_check: Regex,
}

impl CompiledComponent {
    pub fn compile(definition: ComponentDefinition) -> RegistryResult<Self> {
        if definition.component_type.trim().is_empty() {
            return Err(RegistryError::EmptyType);
        }

        let template = Template::parse(&definition.template);
        let mut matchers = Vec::new();

        if definition.needs_payload && definition.matchers.is_empty() && !template.uses_value() {
            warn!(
                component_type = %definition.component_type,
                "template has no value variable, markers of this type will never be recognized"
            );
        }

        if definition.matchers.is_empty() {
            let pattern = template.matcher_pattern(&definition.prefix, &definition.suffix);
            if pattern.is_empty() {
                return Err(RegistryError::invalid_template(
                    &definition.component_type,
                    "template is empty and no matchers were given",
                ));
            }
            let regex = Regex::new(&pattern)
                .map_err(|e| RegistryError::invalid_matcher(&definition.component_type, 0, e))?;
            matchers.push(Matcher::new(regex));
        } else {
            for (index, pattern) in definition.matchers.iter().enumerate() {
                let regex = Regex::new(pattern).map_err(|e| {
                    RegistryError::invalid_matcher(&definition.component_type, index, e)
                })?;
                matchers.push(Matcher::new(regex));
            }
        }

        // Strips a prefix the user already typed, plus the separators after it
        let prefix_strip = if definition.prefix.is_empty() {
            None
        } else {
            let pattern = format!(r"^{}[-_\s]*", regex::escape(&definition.prefix));
            Some(
                RegexBuilder::new(&pattern)
                    .case_insensitive(true)
                    .build()
                    .map_err(|e| RegistryError::invalid_matcher(&definition.component_type, 0, e))?,
            )
        };

        let payload_check = Regex::new(&format!("^{}$", PAYLOAD_PATTERN))
            .map_err(|e| RegistryError::invalid_matcher(&definition.component_type, 0, e))?;

        Ok(Self {
            definition,
            template,
            matchers,
            prefix_strip,
            payload_check,
        })
    }

    pub fn definition(&self) -> &ComponentDefinition {
        &self.definition
    }

    pub fn component_type(&self) -> &str {
        &self.definition.component_type
    }

    pub fn template(&self) -> &Template {
        &self.template
    }

    pub fn matchers(&self) -> &[Matcher] {
        &self.matchers
    }

    /// Canonical marker text for a node of this type
    pub fn render(&self, node: &PlaceholderNode) -> String {
        self.template.render(&TemplateVars {
            prefix: &self.definition.prefix,
            suffix: &self.definition.suffix,
            value: node.raw_value.as_template_str(),
            id: &node.id,
        })
    }

    /// Remove an already-present prefix from a user-supplied value
    pub fn strip_prefix<'v>(&self, value: &'v str) -> &'v str {
        match &self.prefix_strip {
            Some(re) => match re.find(value) {
                Some(m) => &value[m.end()..],
                None => value,
            },
            None => value,
        }
    }

    /// Value stored for a user-supplied payload. A typed prefix is dropped;
    /// anything that would not re-tokenize as this marker is left unset.
    pub fn payload_value(&self, value: &str) -> RawValue {
        let raw = RawValue::from_option(Some(self.strip_prefix(value).to_string()));
        let malformed = raw
            .as_option()
            .map_or(false, |payload| !self.payload_check.is_match(payload));
        if malformed {
            warn!(
                component_type = %self.definition.component_type,
                payload = value,
                "payload is not a valid marker payload, left unset"
            );
            return RawValue::Unset;
        }
        raw
    }

    /// Label for a freshly created node
    pub fn default_label(&self) -> &str {
        if self.definition.default_text.is_empty() {
            &self.definition.component_type
        } else {
            &self.definition.default_text
        }
    }
}

/// Ordered set of component types
#[derive(Debug, Clone, Default)]
pub struct ComponentRegistry {
    components: IndexMap<String, Arc<CompiledComponent>>,
}

impl ComponentRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Registry preloaded with the built-in types
    pub fn with_builtins() -> Self {
        let mut registry = Self::new();
        for definition in builtin_definitions() {
            // Built-in patterns are static and known to compile
            if let Err(err) = registry.register(definition) {
                tracing::error!(error = %err, "built-in component failed to compile");
            }
        }
        registry
    }

    /// Register or replace a type. On error the registry is unchanged.
    pub fn register(&mut self, definition: ComponentDefinition) -> RegistryResult<()> {
        let compiled = CompiledComponent::compile(definition)?;
        let key = compiled.component_type().to_string();
        let replaced = self.components.insert(key.clone(), Arc::new(compiled)).is_some();
        debug!(component_type = %key, replaced, "registered component type");
        Ok(())
    }

    pub fn lookup(&self, component_type: &str) -> Option<Arc<CompiledComponent>> {
        self.components.get(component_type).cloned()
    }

    pub fn contains(&self, component_type: &str) -> bool {
        self.components.contains_key(component_type)
    }

    pub fn definitions(&self) -> impl Iterator<Item = &ComponentDefinition> {
        self.components.values().map(|c| c.definition())
    }

    /// Snapshot of the compiled components in registration order
    pub fn snapshot(&self) -> Vec<Arc<CompiledComponent>> {
        self.components.values().cloned().collect()
    }

    pub fn len(&self) -> usize {
        self.components.len()
    }

    pub fn is_empty(&self) -> bool {
        self.components.is_empty()
    }
}

/// Built-in component types, in tie-break order
pub fn builtin_definitions() -> Vec<ComponentDefinition> {
    vec![
        ComponentDefinition::new("taobao-coupon", "TLJ-PLLJ")
            .with_template("{${prefix}-${value}}")
            .with_matcher(r"\{TLJ-PLLJ-(?P<payload>[^\s{}\[\]<>]+)\}")
            .with_matcher(r"\[TLJ-PLLJ[-_]?(?P<payload>[^\s{}\[\]<>]+)\]")
            .with_matcher(r"\{TLJ-PLLJ_(?P<payload>[^\s{}\[\]<>]+)\}")
            .with_default_text("淘礼金"),
        ComponentDefinition::new("jd-coupon", "TLJ-PLJDLJ")
            .with_template("{${prefix}-${value}}")
            .with_default_text("京东礼金"),
        ComponentDefinition::new("nickname", "@NAME")
            .with_template("{${prefix}}")
            .without_payload()
            .with_default_text("昵称"),
        ComponentDefinition::new("emoji", "[")
            .with_suffix("]")
            .with_template("${prefix}${value}${suffix}"),
    ]
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_builtins_in_order() {
        let registry = ComponentRegistry::with_builtins();
        let types: Vec<&str> = registry.definitions().map(|d| d.component_type.as_str()).collect();
        assert_eq!(types, vec!["taobao-coupon", "jd-coupon", "nickname", "emoji"]);
    }

    #[test]
    fn test_register_replaces_in_place() {
        let mut registry = ComponentRegistry::with_builtins();
        registry
            .register(ComponentDefinition::new("jd-coupon", "JD").with_template("<${prefix}:${value}>"))
            .unwrap();

        assert_eq!(registry.len(), 4);
        let types: Vec<&str> = registry.definitions().map(|d| d.component_type.as_str()).collect();
        assert_eq!(types[1], "jd-coupon");
        assert_eq!(registry.lookup("jd-coupon").unwrap().definition().prefix, "JD");
    }

    #[test]
    fn test_invalid_matcher_leaves_registry_unchanged() {
        let mut registry = ComponentRegistry::new();
        let err = registry
            .register(ComponentDefinition::new("bad", "B").with_matcher("(unclosed"))
            .unwrap_err();
        assert!(matches!(err, RegistryError::InvalidMatcher { index: 0, .. }));
        assert!(registry.is_empty());

        assert!(matches!(
            registry.register(ComponentDefinition::new(" ", "B")),
            Err(RegistryError::EmptyType)
        ));
    }

    #[test]
    fn test_empty_template_without_matchers_rejected() {
        let mut registry = ComponentRegistry::new();
        let err = registry
            .register(ComponentDefinition::new("blank", "").with_template("   "))
            .unwrap_err();
        assert!(matches!(err, RegistryError::InvalidTemplate { .. }));
    }

    #[test]
    fn test_payload_group_resolution() {
        let named = Matcher::new(Regex::new(r"(x)(?P<payload>\d+)").unwrap());
        assert_eq!(named.payload_group(), Some(2));
        let positional = Matcher::new(Regex::new(r"<(\d+)>").unwrap());
        assert_eq!(positional.payload_group(), Some(1));
        let none = Matcher::new(Regex::new(r"<x>").unwrap());
        assert_eq!(none.payload_group(), None);
    }

    #[test]
    fn test_strip_prefix_case_insensitive() {
        let registry = ComponentRegistry::with_builtins();
        let taobao = registry.lookup("taobao-coupon").unwrap();
        assert_eq!(taobao.strip_prefix("tlj-pllj-abc"), "abc");
        assert_eq!(taobao.strip_prefix("TLJ-PLLJ__x1"), "x1");
        assert_eq!(taobao.strip_prefix("abc"), "abc");
    }

    #[test]
    fn test_strip_prefix_keeps_non_ascii_payload() {
        let registry = ComponentRegistry::with_builtins();
        let taobao = registry.lookup("taobao-coupon").unwrap();
        assert_eq!(taobao.strip_prefix("TLJ-PLLJ-优惠A"), "优惠A");
        assert_eq!(taobao.strip_prefix("tlj-pllj 优惠"), "优惠");
        assert_eq!(taobao.payload_value("TLJ-PLLJ-优惠"), RawValue::Set("优惠".into()));
    }

    #[test]
    fn test_payload_value_rejects_marker_breaking_text() {
        let registry = ComponentRegistry::with_builtins();
        let taobao = registry.lookup("taobao-coupon").unwrap();
        assert_eq!(taobao.payload_value("a}b c"), RawValue::Unset);
        assert_eq!(taobao.payload_value("two words"), RawValue::Unset);
        assert_eq!(taobao.payload_value("[x]"), RawValue::Unset);
        assert_eq!(taobao.payload_value("TLJ-PLLJ-"), RawValue::Unset);
        assert_eq!(taobao.payload_value(crate::ast::NULL_SENTINEL), RawValue::Unset);
        assert_eq!(taobao.payload_value("X-1.5"), RawValue::Set("X-1.5".into()));
    }

    #[test]
    fn test_render_uses_sentinel_for_unset() {
        let registry = ComponentRegistry::with_builtins();
        let taobao = registry.lookup("taobao-coupon").unwrap();
        let node = PlaceholderNode::new("id", "taobao-coupon", RawValue::Unset);
        assert_eq!(taobao.render(&node), "{TLJ-PLLJ-<<NULL>>}");
    }

    #[test]
    fn test_definition_from_json_defaults() {
        let def: ComponentDefinition =
            serde_json::from_str(r#"{"type": "vip", "prefix": "VIP"}"#).unwrap();
        assert!(def.needs_payload);
        assert_eq!(def.value_key, "code");
        assert_eq!(def.label_key, "name");
        assert_eq!(def.template, DEFAULT_TEMPLATE);
    }
}
