use crate::Result;

/// Lifecycle and identity shared by every plugin.
///
/// Plugins are shared across threads behind `Arc`, so `initialize` and
/// `shutdown` take `&self`; use interior mutability for any state.
pub trait Plugin: Send + Sync {
    /// Unique name. Must be non-empty and contain no whitespace.
    fn name(&self) -> &str;

    fn version(&self) -> String;

    /// Called once when the plugin is registered.
    fn initialize(&self) -> Result<()>;

    /// Called when the plugin is removed or the registry shuts down.
    fn shutdown(&self) -> Result<()>;

    fn description(&self) -> &str {
        ""
    }

    fn author(&self) -> &str {
        ""
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};

    struct CountingPlugin {
        live: AtomicUsize,
    }

    impl Plugin for CountingPlugin {
        fn name(&self) -> &str {
            "counting-plugin"
        }

        fn version(&self) -> String {
            "0.1.0".to_string()
        }

        fn initialize(&self) -> Result<()> {
            self.live.fetch_add(1, Ordering::AcqRel);
            Ok(())
        }

        fn shutdown(&self) -> Result<()> {
            self.live.fetch_sub(1, Ordering::AcqRel);
            Ok(())
        }
    }

    #[test]
    fn test_default_descriptive_fields_are_empty() {
        let plugin = CountingPlugin {
            live: AtomicUsize::new(0),
        };
        assert_eq!(plugin.name(), "counting-plugin");
        assert_eq!(plugin.description(), "");
        assert_eq!(plugin.author(), "");
    }

    #[test]
    fn test_lifecycle_through_trait_object() {
        let plugin = CountingPlugin {
            live: AtomicUsize::new(0),
        };
        let dynamic: &dyn Plugin = &plugin;

        dynamic.initialize().unwrap();
        assert_eq!(plugin.live.load(Ordering::Acquire), 1);

        dynamic.shutdown().unwrap();
        assert_eq!(plugin.live.load(Ordering::Acquire), 0);
    }
}
