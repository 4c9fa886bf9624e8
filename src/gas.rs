//! Gas option-sets and the ordered strategies the executor walks through.
//!
//! A `GasStrategy` is a fixed, non-empty list of `GasOptions`. The executor
//! tries each entry in order until one attempt confirms or a terminal error
//! stops the sequence. The first entry is normally the empty option-set,
//! which leaves gas entirely to the wallet/provider fillers.

use std::fmt;

use alloy::{
    contract::{CallBuilder, CallDecoder},
    network::Network,
    providers::Provider,
};

/// Gas limit used by the second entry of the standard strategy.
pub const STANDARD_FALLBACK_GAS_LIMIT: u64 = 500_000;

/// Gas limits used by the funding strategy after the default entry.
pub const FUNDING_FALLBACK_GAS_LIMITS: [u64; 2] = [200_000, 300_000];

/// One set of gas overrides for a single submission attempt.
///
/// Every field is optional; `GasOptions::default()` means "no override".
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct GasOptions {
    pub gas_limit: Option<u64>,
    pub gas_price: Option<u128>,
    pub max_fee_per_gas: Option<u128>,
    pub max_priority_fee_per_gas: Option<u128>,
}

impl GasOptions {
    /// Option-set with only a gas limit override.
    pub fn with_gas_limit(gas_limit: u64) -> Self {
        Self {
            gas_limit: Some(gas_limit),
            ..Default::default()
        }
    }

    /// Set a legacy gas price.
    pub fn gas_price(mut self, gas_price: u128) -> Self {
        self.gas_price = Some(gas_price);
        self
    }

    /// Set EIP-1559 fees.
    pub fn eip1559(mut self, max_fee_per_gas: u128, max_priority_fee_per_gas: u128) -> Self {
        self.max_fee_per_gas = Some(max_fee_per_gas);
        self.max_priority_fee_per_gas = Some(max_priority_fee_per_gas);
        self
    }

    /// True when no field is overridden.
    pub fn is_empty(&self) -> bool {
        *self == Self::default()
    }

    /// Apply the overrides to an alloy call builder.
    ///
    /// Fields left as `None` are untouched, so the provider's fillers keep
    /// estimating them.
    pub fn apply<P, D, N>(&self, mut call: CallBuilder<P, D, N>) -> CallBuilder<P, D, N>
    where
        P: Provider<N>,
        D: CallDecoder,
        N: Network,
    {
        if let Some(gas_limit) = self.gas_limit {
            call = call.gas(gas_limit);
        }
        if let Some(gas_price) = self.gas_price {
            call = call.gas_price(gas_price);
        }
        if let Some(max_fee) = self.max_fee_per_gas {
            call = call.max_fee_per_gas(max_fee);
        }
        if let Some(priority_fee) = self.max_priority_fee_per_gas {
            call = call.max_priority_fee_per_gas(priority_fee);
        }
        call
    }
}

impl fmt::Display for GasOptions {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.is_empty() {
            return f.write_str("{}");
        }
        let mut parts = Vec::new();
        if let Some(v) = self.gas_limit {
            parts.push(format!("gas_limit: {v}"));
        }
        if let Some(v) = self.gas_price {
            parts.push(format!("gas_price: {v}"));
        }
        if let Some(v) = self.max_fee_per_gas {
            parts.push(format!("max_fee_per_gas: {v}"));
        }
        if let Some(v) = self.max_priority_fee_per_gas {
            parts.push(format!("max_priority_fee_per_gas: {v}"));
        }
        write!(f, "{{{}}}", parts.join(", "))
    }
}

/// Ordered, non-empty list of option-sets tried one after another.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GasStrategy {
    entries: Vec<GasOptions>,
}

impl GasStrategy {
    /// Build a strategy from explicit entries.
    ///
    /// An empty list collapses to the single default entry.
    pub fn new(entries: Vec<GasOptions>) -> Self {
        if entries.is_empty() {
            return Self {
                entries: vec![GasOptions::default()],
            };
        }
        Self { entries }
    }

    /// `[{}, {gas_limit: 500_000}]`, used by general contract writes.
    pub fn standard() -> Self {
        Self::new(vec![
            GasOptions::default(),
            GasOptions::with_gas_limit(STANDARD_FALLBACK_GAS_LIMIT),
        ])
    }

    /// `[{}, {gas_limit: 200_000}, {gas_limit: 300_000}]`, used by fund/withdraw.
    pub fn funding() -> Self {
        let mut entries = vec![GasOptions::default()];
        entries.extend(
            FUNDING_FALLBACK_GAS_LIMITS
                .iter()
                .map(|&limit| GasOptions::with_gas_limit(limit)),
        );
        Self::new(entries)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// True when the strategy holds no entries; `new` never produces one.
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn iter(&self) -> std::slice::Iter<'_, GasOptions> {
        self.entries.iter()
    }

    pub fn entries(&self) -> &[GasOptions] {
        &self.entries
    }
}

impl Default for GasStrategy {
    fn default() -> Self {
        Self::standard()
    }
}

impl From<Vec<GasOptions>> for GasStrategy {
    fn from(entries: Vec<GasOptions>) -> Self {
        Self::new(entries)
    }
}

impl<'a> IntoIterator for &'a GasStrategy {
    type Item = &'a GasOptions;
    type IntoIter = std::slice::Iter<'a, GasOptions>;

    fn into_iter(self) -> Self::IntoIter {
        self.entries.iter()
    }
}
