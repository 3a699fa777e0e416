//! Merchant payment method settings.

use dashmap::DashMap;
use std::collections::HashMap;
use std::sync::Arc;

use crate::config::PaymentMethodConfig;

/// A configured payment method with its string parameters
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PaymentMethod {
    pub system_name: String,
    pub language: String,
    parameters: HashMap<String, String>,
}

impl PaymentMethod {
    pub fn new(
        system_name: impl Into<String>,
        language: impl Into<String>,
        parameters: HashMap<String, String>,
    ) -> Self {
        let parameters = parameters
            .into_iter()
            .map(|(key, value)| (key.to_ascii_lowercase(), value))
            .collect();
        Self {
            system_name: system_name.into(),
            language: language.into(),
            parameters,
        }
    }

    /// Parameter value by name (case-insensitive), or `default` when unset
    pub fn get_parameter(&self, name: &str, default: &str) -> String {
        self.parameters
            .get(&name.to_ascii_lowercase())
            .cloned()
            .unwrap_or_else(|| default.to_string())
    }

    pub fn with_parameter(mut self, name: &str, value: impl Into<String>) -> Self {
        self.parameters
            .insert(name.to_ascii_lowercase(), value.into());
        self
    }
}

impl From<&PaymentMethodConfig> for PaymentMethod {
    fn from(config: &PaymentMethodConfig) -> Self {
        Self::new(
            config.system_name.clone(),
            config.language.clone(),
            config.parameters.clone(),
        )
    }
}

pub trait PaymentMethodRepository: Send + Sync {
    fn get_by_system_name(&self, system_name: &str, language: &str) -> Option<PaymentMethod>;
}

/// Payment methods keyed by (system name, language)
#[derive(Clone, Default)]
pub struct InMemoryPaymentMethodRepository {
    methods: Arc<DashMap<(String, String), PaymentMethod>>,
}

impl InMemoryPaymentMethodRepository {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn from_config(configs: &[PaymentMethodConfig]) -> Self {
        let repository = Self::new();
        for config in configs {
            repository.upsert(PaymentMethod::from(config));
        }
        repository
    }

    pub fn upsert(&self, method: PaymentMethod) {
        let key = (
            method.system_name.clone(),
            method.language.to_ascii_lowercase(),
        );
        self.methods.insert(key, method);
    }

    pub fn remove(&self, system_name: &str, language: &str) {
        self.methods
            .remove(&(system_name.to_string(), language.to_ascii_lowercase()));
    }
}

impl PaymentMethodRepository for InMemoryPaymentMethodRepository {
    fn get_by_system_name(&self, system_name: &str, language: &str) -> Option<PaymentMethod> {
        self.methods
            .get(&(system_name.to_string(), language.to_ascii_lowercase()))
            .map(|method| method.value().clone())
    }
}
