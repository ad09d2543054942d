use std::sync::{Mutex, PoisonError};

use serde::Serialize;

use super::lookup::TaxRateLookup;
use super::resolver::TaxRateResolver;
use super::{normalize_zip, TaxLookupError, TaxResolution, TaxSource};

/// Rate a session currently prices with.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SessionRate {
    pub rate_percent: f64,
    pub zip: Option<String>,
    pub source: TaxSource,
}

/// Proof that a lookup was started for the latest ZIP input.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LookupTicket {
    pub zip: String,
    generation: u64,
}

#[derive(Debug)]
struct SessionState {
    rate: SessionRate,
    generation: u64,
}

/// Per-shopper tax state. Only the newest ZIP input may change the rate and a
/// failed lookup keeps whatever rate was known before.
#[derive(Debug)]
pub struct TaxRateSession {
    state: Mutex<SessionState>,
}

impl TaxRateSession {
    pub fn new(initial_rate_percent: f64, source: TaxSource) -> Self {
        Self {
            state: Mutex::new(SessionState {
                rate: SessionRate {
                    rate_percent: initial_rate_percent,
                    zip: None,
                    source,
                },
                generation: 0,
            }),
        }
    }

    pub fn current(&self) -> SessionRate {
        self.lock().rate.clone()
    }

    /// Register new ZIP input. Invalid input is ignored and yields no ticket;
    /// a valid one invalidates every earlier ticket.
    pub fn begin(&self, raw_zip: &str) -> Option<LookupTicket> {
        let Some(zip) = normalize_zip(raw_zip) else {
            tracing::debug!(input = raw_zip, "ignoring malformed ZIP input");
            return None;
        };

        let mut state = self.lock();
        state.generation += 1;
        Some(LookupTicket {
            zip,
            generation: state.generation,
        })
    }

    /// Apply a lookup result. Stale tickets and failures leave the rate as is.
    pub fn complete(
        &self,
        ticket: LookupTicket,
        result: Result<TaxResolution, TaxLookupError>,
    ) -> SessionRate {
        let mut state = self.lock();
        if ticket.generation != state.generation {
            tracing::debug!(zip = %ticket.zip, "discarding stale tax lookup result");
            return state.rate.clone();
        }

        match result {
            Ok(resolution) => {
                state.rate = SessionRate {
                    rate_percent: resolution.rate_percent,
                    zip: Some(resolution.zip),
                    source: resolution.source,
                };
            }
            Err(err) => {
                tracing::debug!(
                    zip = %ticket.zip,
                    error = %err,
                    retained_rate = state.rate.rate_percent,
                    "keeping last known tax rate"
                );
            }
        }
        state.rate.clone()
    }

    pub async fn update_zip<L>(&self, resolver: &TaxRateResolver<L>, raw_zip: &str) -> SessionRate
    where
        L: TaxRateLookup,
    {
        let Some(ticket) = self.begin(raw_zip) else {
            return self.current();
        };
        let result = resolver.resolve(&ticket.zip).await;
        self.complete(ticket, result)
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, SessionState> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }
}
