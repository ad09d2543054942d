use super::TaxSource;
use crate::pricing::domain::{TaxConfig, TaxTreatment};

/// Admin-maintained tax configs with a configured default rate behind them.
#[derive(Debug, Clone)]
pub struct StaticTaxTable {
    configs: Vec<TaxConfig>,
    default_rate_percent: f64,
}

impl StaticTaxTable {
    pub fn new(configs: Vec<TaxConfig>, default_rate_percent: f64) -> Self {
        Self {
            configs,
            default_rate_percent,
        }
    }

    pub fn configs(&self) -> &[TaxConfig] {
        &self.configs
    }

    pub fn default_rate_percent(&self) -> f64 {
        self.default_rate_percent
    }

    /// Longest matching ZIP prefix wins.
    pub fn config_for_zip(&self, zip: &str) -> Option<&TaxConfig> {
        self.configs
            .iter()
            .filter_map(|config| {
                config
                    .zip_prefixes
                    .iter()
                    .filter(|prefix| !prefix.is_empty() && zip.starts_with(prefix.as_str()))
                    .map(|prefix| prefix.len())
                    .max()
                    .map(|len| (len, config))
            })
            .max_by_key(|(len, _)| *len)
            .map(|(_, config)| config)
    }

    /// Statewide entries (no ZIP prefixes) are preferred over local ones.
    pub fn config_for_state(&self, state: &str) -> Option<&TaxConfig> {
        let state = state.trim();
        let mut candidates = self
            .configs
            .iter()
            .filter(|config| config.state.eq_ignore_ascii_case(state));
        let first = candidates.next()?;
        if first.zip_prefixes.is_empty() {
            return Some(first);
        }
        Some(
            candidates
                .find(|config| config.zip_prefixes.is_empty())
                .unwrap_or(first),
        )
    }

    /// Starting treatment for a quote before any remote lookup.
    pub fn treatment_for(&self, zip: Option<&str>, state: Option<&str>) -> (TaxTreatment, TaxSource) {
        let config = zip
            .and_then(|zip| self.config_for_zip(zip))
            .or_else(|| state.and_then(|state| self.config_for_state(state)));

        match config {
            Some(config) => (config.treatment(), TaxSource::Table),
            None => (
                TaxTreatment::at_rate(self.default_rate_percent),
                TaxSource::Default,
            ),
        }
    }
}
