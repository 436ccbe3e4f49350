//! Builder for configuring [`MokaStorage`].

use smol_str::SmolStr;

use crate::storage::MokaStorage;

/// Builder for creating and configuring a [`MokaStorage`].
///
/// Use [`MokaStorage::builder`] to create a new builder instance.
///
/// # Examples
///
/// ```
/// use tether_moka::MokaStorage;
///
/// let storage = MokaStorage::builder()
///     .label("inbox")
///     .initial_capacity(256)
///     .build();
/// ```
#[derive(Debug, Clone)]
pub struct MokaStorageBuilder {
    initial_capacity: Option<usize>,
    label: SmolStr,
}

impl MokaStorageBuilder {
    /// Creates a new builder with defaults.
    pub fn new() -> Self {
        Self {
            initial_capacity: None,
            label: SmolStr::new_static("moka"),
        }
    }

    /// Sets a custom label for this storage.
    ///
    /// # Default
    ///
    /// `"moka"`
    pub fn label(mut self, label: impl Into<SmolStr>) -> Self {
        self.label = label.into();
        self
    }

    /// Pre-allocates room for `capacity` entries in each new generation.
    ///
    /// This is an allocation hint only; it does not bound the generation.
    pub fn initial_capacity(mut self, capacity: usize) -> Self {
        self.initial_capacity = Some(capacity);
        self
    }

    /// Builds the [`MokaStorage`].
    pub fn build(self) -> MokaStorage {
        MokaStorage::from_builder(self.initial_capacity, self.label)
    }
}

impl Default for MokaStorageBuilder {
    fn default() -> Self {
        Self::new()
    }
}
