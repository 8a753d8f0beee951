//! Priority-ordered decoder lookup by media type.

use crate::core::mime;
use crate::plugins::DocumentDecoder;
use crate::{DocsiftError, Result};
use once_cell::sync::Lazy;
use std::collections::{BTreeMap, HashMap};
use std::sync::{Arc, RwLock};

fn validate_plugin_name(name: &str) -> Result<()> {
    if name.is_empty() {
        return Err(DocsiftError::validation("Plugin name cannot be empty"));
    }

    if name.contains(char::is_whitespace) {
        return Err(DocsiftError::validation(format!(
            "Plugin name '{}' cannot contain whitespace",
            name
        )));
    }

    Ok(())
}

/// Decoders keyed by media type, each type holding a priority map.
///
/// Registering a second decoder at the same priority for the same type
/// replaces the first.
pub struct DecoderRegistry {
    decoders: HashMap<String, BTreeMap<i32, Arc<dyn DocumentDecoder>>>,
    name_index: HashMap<String, Vec<(String, i32)>>,
}

impl DecoderRegistry {
    pub fn new() -> Self {
        Self {
            decoders: HashMap::new(),
            name_index: HashMap::new(),
        }
    }

    pub fn register(&mut self, decoder: Arc<dyn DocumentDecoder>) -> Result<()> {
        let name = decoder.name().to_string();
        let priority = decoder.priority();

        validate_plugin_name(&name)?;

        decoder.initialize()?;

        let mut index_entries = Vec::new();
        for mime_type in decoder.supported_mime_types() {
            let mime_type = mime_type.to_ascii_lowercase();
            self.decoders
                .entry(mime_type.clone())
                .or_default()
                .insert(priority, Arc::clone(&decoder));
            index_entries.push((mime_type, priority));
        }

        tracing::debug!(decoder = %name, priority, types = index_entries.len(), "Registered decoder");
        self.name_index.insert(name, index_entries);

        Ok(())
    }

    /// Highest-priority decoder for `mime_type`.
    ///
    /// Parameters are ignored. An exact registration wins over a `type/*`
    /// wildcard.
    pub fn get(&self, mime_type: &str) -> Result<Arc<dyn DocumentDecoder>> {
        let base = mime::base_type(mime_type);

        if let Some(priority_map) = self.decoders.get(&base)
            && let Some((_priority, decoder)) = priority_map.iter().next_back()
        {
            return Ok(Arc::clone(decoder));
        }

        let mut best_match: Option<(i32, Arc<dyn DocumentDecoder>)> = None;

        for (registered, priority_map) in &self.decoders {
            let Some(prefix) = registered.strip_suffix('*') else {
                continue;
            };
            if !prefix.ends_with('/') || !base.starts_with(prefix) {
                continue;
            }
            if let Some((&priority, decoder)) = priority_map.iter().next_back()
                && best_match.as_ref().is_none_or(|(current, _)| priority > *current)
            {
                best_match = Some((priority, Arc::clone(decoder)));
            }
        }

        best_match
            .map(|(_, decoder)| decoder)
            .ok_or_else(|| DocsiftError::unsupported(base))
    }

    pub fn list(&self) -> Vec<String> {
        let mut names: Vec<String> = self.name_index.keys().cloned().collect();
        names.sort();
        names
    }

    pub fn remove(&mut self, name: &str) -> Result<()> {
        let Some(index_entries) = self.name_index.remove(name) else {
            return Ok(());
        };

        let mut to_shutdown: Option<Arc<dyn DocumentDecoder>> = None;

        for (mime_type, priority) in index_entries {
            if let Some(priority_map) = self.decoders.get_mut(&mime_type) {
                if let Some(decoder) = priority_map.remove(&priority)
                    && to_shutdown.is_none()
                {
                    to_shutdown = Some(decoder);
                }

                if priority_map.is_empty() {
                    self.decoders.remove(&mime_type);
                }
            }
        }

        if let Some(decoder) = to_shutdown {
            decoder.shutdown()?;
        }

        Ok(())
    }

    pub fn shutdown_all(&mut self) -> Result<()> {
        for name in self.list() {
            self.remove(&name)?;
        }
        Ok(())
    }
}

impl Default for DecoderRegistry {
    fn default() -> Self {
        Self::new()
    }
}

/// Global decoder registry.
pub static DECODER_REGISTRY: Lazy<Arc<RwLock<DecoderRegistry>>> =
    Lazy::new(|| Arc::new(RwLock::new(DecoderRegistry::new())));

pub fn get_decoder_registry() -> Arc<RwLock<DecoderRegistry>> {
    DECODER_REGISTRY.clone()
}
