use std::collections::HashMap;
use std::sync::Arc;
use tracing::{debug, warn};

use super::{
    CrlValidator, HttpCrlFetcher, OcspResponder, OcspValidator, RevocationValidator,
    ValidatorSettings,
};
use crate::config::RevocationValidatorEntry;

/// Builds a validator for one strategy from the shared settings
pub type ValidatorFactory =
    Arc<dyn Fn(&ValidatorSettings) -> Arc<dyn RevocationValidator> + Send + Sync>;

/// Strategy name to constructor lookup; names are matched case-insensitively
#[derive(Clone, Default)]
pub struct ValidatorRegistry {
    factories: HashMap<String, ValidatorFactory>,
}

impl ValidatorRegistry {
    /// Registry with no strategies at all
    pub fn empty() -> Self {
        Self::default()
    }

    /// Registry with the HTTP-backed CRL strategy
    pub fn with_defaults() -> Self {
        Self::empty().register(CrlValidator::NAME, |settings: &ValidatorSettings| {
            let fetcher = Arc::new(HttpCrlFetcher::new(settings));
            Arc::new(CrlValidator::new(settings.clone(), fetcher)) as Arc<dyn RevocationValidator>
        })
    }

    pub fn register<F>(mut self, name: &str, factory: F) -> Self
    where
        F: Fn(&ValidatorSettings) -> Arc<dyn RevocationValidator> + Send + Sync + 'static,
    {
        self.factories
            .insert(name.trim().to_ascii_uppercase(), Arc::new(factory));
        self
    }

    /// Register the OCSP strategy backed by `responder`
    pub fn with_ocsp(self, responder: Arc<dyn OcspResponder>) -> Self {
        self.register(OcspValidator::NAME, move |settings: &ValidatorSettings| {
            Arc::new(OcspValidator::new(settings.clone(), responder.clone()))
                as Arc<dyn RevocationValidator>
        })
    }

    pub fn build(&self, name: &str, settings: &ValidatorSettings) -> Option<Arc<dyn RevocationValidator>> {
        self.factories
            .get(&name.trim().to_ascii_uppercase())
            .map(|factory| factory(settings))
    }

    pub fn contains(&self, name: &str) -> bool {
        self.factories
            .contains_key(&name.trim().to_ascii_uppercase())
    }
}

/// Turns the priority-keyed validator configuration into an ordered chain
pub struct RevocationValidatorSelector {
    registry: ValidatorRegistry,
}

impl RevocationValidatorSelector {
    pub fn new(registry: ValidatorRegistry) -> Self {
        Self { registry }
    }

    /// Validators in ascending priority; equal priorities keep configuration
    /// order and unrecognized strategy names are dropped.
    pub fn select(
        &self,
        entries: &[RevocationValidatorEntry],
        settings: &ValidatorSettings,
    ) -> Vec<Arc<dyn RevocationValidator>> {
        let mut ordered: Vec<&RevocationValidatorEntry> = entries.iter().collect();
        ordered.sort_by_key(|entry| entry.priority);

        let validators: Vec<_> = ordered
            .into_iter()
            .filter_map(|entry| {
                let validator = self.registry.build(&entry.strategy, settings);
                if validator.is_none() {
                    warn!(
                        strategy = %entry.strategy,
                        priority = entry.priority,
                        "Dropping unrecognized revocation validator"
                    );
                }
                validator
            })
            .collect();

        debug!(
            chain = ?validators.iter().map(|v| v.name()).collect::<Vec<_>>(),
            "Selected revocation validators"
        );
        validators
    }
}
