#![allow(dead_code)]

use std::collections::HashMap;

use species_lures::{Observation, ObservationPool, Taxon};

pub fn init_tracing() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .with_test_writer()
        .try_init();
}

pub fn observation(id: &str, taxon_id: &str, ancestors: &[String], iconic: &str) -> Observation {
    Observation {
        id: id.to_string(),
        taxon: Taxon {
            id: taxon_id.to_string(),
            ancestor_ids: ancestors.to_vec(),
            iconic_taxon_id: Some(iconic.to_string()),
        },
    }
}

/// Ancestor chain of `len` ids, the first `shared` taken from the target's
/// lineage and the rest unique to `branch`
pub fn chain(len: usize, shared: usize, branch: &str) -> Vec<String> {
    (0..len)
        .map(|i| {
            if i < shared {
                format!("anc-{i}")
            } else {
                format!("{branch}-{i}")
            }
        })
        .collect()
}

pub struct PoolBuilder {
    pool: ObservationPool,
}

impl PoolBuilder {
    pub fn new() -> Self {
        Self {
            pool: ObservationPool {
                by_taxon: HashMap::new(),
                taxon_list: Vec::new(),
                confusion_map: None,
            },
        }
    }

    pub fn taxon(mut self, taxon_id: &str, ancestors: Vec<String>, iconic: &str, observations: usize) -> Self {
        let list = (0..observations.max(1))
            .map(|i| observation(&format!("{taxon_id}-obs-{i}"), taxon_id, &ancestors, iconic))
            .collect();
        self.pool.taxon_list.push(taxon_id.to_string());
        self.pool.by_taxon.insert(taxon_id.to_string(), list);
        self
    }

    pub fn build(self) -> ObservationPool {
        self.pool
    }
}

/// Target T1 with a five-deep chain plus six relatives sharing 5..0
/// ancestors, so `S{n}` sits at closeness n/5
pub fn graded_pool() -> (ObservationPool, Observation) {
    graded_pool_without(&[])
}

/// `graded_pool` minus the listed relatives
pub fn graded_pool_without(skip: &[&str]) -> (ObservationPool, Observation) {
    let target_chain = chain(5, 5, "t1");
    let target = observation("T1-obs-0", "T1", &target_chain, "aves");
    let mut builder = PoolBuilder::new().taxon("T1", target_chain, "aves", 1);
    for shared in (0..=5).rev() {
        let id = format!("S{shared}");
        if skip.contains(&id.as_str()) {
            continue;
        }
        builder = builder.taxon(&id, chain(5, shared, &id), "aves", 2);
    }
    (builder.build(), target)
}
