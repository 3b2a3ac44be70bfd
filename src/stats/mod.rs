//! Cache activity accounting
//!
//! Counters are updated under the stream lock and read back as a
//! snapshot, so tests can observe work done (or not done) by a query.

/// Snapshot of cache activity
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct CacheStats {
    /// Calls into the refinement engine (one per dyadic interval queried)
    pub queries: usize,

    /// Queries answered by an exact key already accurate enough
    pub hits: usize,

    /// Calls to the context's fresh computation
    pub fresh_computations: usize,

    /// Leaves split into two children
    pub splits: usize,

    /// Root growth steps
    pub root_expansions: usize,

    /// Neighbour nodes created during root growth
    pub neighbour_nodes: usize,

    /// Parent values recombined from improved children
    pub propagations: usize,
}

impl CacheStats {
    /// Counters that imply tree mutation
    pub fn mutations(&self) -> usize {
        self.splits + self.root_expansions + self.propagations
    }

    /// Activity between an earlier snapshot and this one
    pub fn since(&self, earlier: &CacheStats) -> CacheStats {
        CacheStats {
            queries: self.queries - earlier.queries,
            hits: self.hits - earlier.hits,
            fresh_computations: self.fresh_computations - earlier.fresh_computations,
            splits: self.splits - earlier.splits,
            root_expansions: self.root_expansions - earlier.root_expansions,
            neighbour_nodes: self.neighbour_nodes - earlier.neighbour_nodes,
            propagations: self.propagations - earlier.propagations,
        }
    }

    /// Human-readable summary
    pub fn report(&self) -> String {
        format!(
            "queries: {}\n  hits: {}\n  fresh computations: {}\n  splits: {}\n  root expansions: {} ({} neighbours)\n  propagations: {}",
            self.queries,
            self.hits,
            self.fresh_computations,
            self.splits,
            self.root_expansions,
            self.neighbour_nodes,
            self.propagations
        )
    }
}
