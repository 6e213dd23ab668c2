// SPDX-License-Identifier: GPL-3.0-or-later
// Copyright (C) 2026 Erik van der Tier

//! Encoder registry keyed by CPU name.
//!
//! The registry has no knowledge of concrete CPUs; family and CPU modules
//! register a factory under one canonical name plus any aliases.

use std::collections::HashMap;

use crate::core::encoder::BranchEncoder;

pub type EncoderFactory = fn() -> Box<dyn BranchEncoder>;

#[derive(Default)]
pub struct EncoderRegistry {
    factories: HashMap<String, EncoderFactory>,
    canonical: Vec<String>,
}

impl EncoderRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register `factory` under `name` and each of `aliases`.
    pub fn register(&mut self, name: &str, aliases: &[&str], factory: EncoderFactory) {
        self.canonical.push(normalize_cpu_name(name));
        for key in std::iter::once(name).chain(aliases.iter().copied()) {
            self.factories.insert(normalize_cpu_name(key), factory);
        }
    }

    pub fn resolve(&self, name: &str) -> Option<Box<dyn BranchEncoder>> {
        self.factories
            .get(&normalize_cpu_name(name))
            .map(|factory| factory())
    }

    pub fn contains(&self, name: &str) -> bool {
        self.factories.contains_key(&normalize_cpu_name(name))
    }

    /// Canonical CPU names in registration order.
    pub fn cpu_name_list(&self) -> &[String] {
        &self.canonical
    }
}

fn normalize_cpu_name(name: &str) -> String {
    name.trim().to_ascii_lowercase()
}
