//! Conformance scenarios for the keel runtime core.
//!
//! Each scenario exercises one subsystem end to end and reports a
//! pass/fail verdict with details, so regressions show up in CI artifacts
//! rather than only in unit-test output.

use serde::Serialize;

use keel_core::{Allocator, HashSet, Map, PoolAlloc, PoolConfig, Set, Str};

/// Outcome of one scenario.
#[derive(Debug, Clone, Serialize)]
pub struct ScenarioResult {
    pub name: &'static str,
    pub passed: bool,
    pub detail: String,
}

impl ScenarioResult {
    fn pass(name: &'static str, detail: impl Into<String>) -> Self {
        Self {
            name,
            passed: true,
            detail: detail.into(),
        }
    }

    fn fail(name: &'static str, detail: impl Into<String>) -> Self {
        Self {
            name,
            passed: false,
            detail: detail.into(),
        }
    }
}

/// Full conformance report.
#[derive(Debug, Clone, Serialize)]
pub struct Report {
    pub scenarios: Vec<ScenarioResult>,
    pub passed: usize,
    pub failed: usize,
}

/// Errors produced by the harness around the scenarios themselves.
#[derive(Debug, thiserror::Error)]
pub enum HarnessError {
    #[error("failed to write report: {0}")]
    Io(#[from] std::io::Error),
    #[error("failed to serialize report: {0}")]
    Serialize(#[from] serde_json::Error),
}

/// Pooled-allocator churn: 64 allocations over 8-block pools, freed in
/// reverse order.
pub fn pooled_alloc_churn() -> ScenarioResult {
    const NAME: &str = "pooled-alloc-churn";
    let alloc = PoolAlloc::new(PoolConfig {
        num_blocks: 8,
        block_size: 32,
        block_align: 16,
    });

    let mut blocks = Vec::new();
    for _ in 0..64 {
        match alloc.alloc(32, 16) {
            Some(ptr) => blocks.push(ptr),
            None => return ScenarioResult::fail(NAME, "allocation returned null"),
        }
    }
    if alloc.num_pools() != 8 {
        return ScenarioResult::fail(NAME, format!("expected 8 pools, got {}", alloc.num_pools()));
    }
    for ptr in blocks.into_iter().rev() {
        // SAFETY: every pointer came from `alloc` and is freed once.
        unsafe { alloc.dealloc(ptr) };
    }
    if alloc.num_pools() != 0 || alloc.used_memory() != 0 {
        return ScenarioResult::fail(
            NAME,
            format!(
                "leak: {} pools, {} bytes in use",
                alloc.num_pools(),
                alloc.used_memory()
            ),
        );
    }
    ScenarioResult::pass(NAME, "64 blocks across 8 pools, fully released")
}

/// Tree deletion stress: remove every other key of 0..1024, validating
/// structure and order throughout.
pub fn tree_deletion_stress() -> ScenarioResult {
    const NAME: &str = "tree-deletion-stress";
    let mut set: Set<u32> = Set::new();
    for i in 0..1024u32 {
        set.insert(i);
    }

    let mut victims: Vec<u32> = (0..1024).step_by(2).collect();
    victims.sort_by_key(|&v| v.wrapping_mul(2_654_435_761) % 1024);

    for v in victims {
        if set.remove(&v).is_none() {
            return ScenarioResult::fail(NAME, format!("key {v} missing before removal"));
        }
        set.validate();
    }

    let survivors: Vec<u32> = set.iter().copied().collect();
    let expected: Vec<u32> = (1..1024).step_by(2).collect();
    if survivors != expected {
        return ScenarioResult::fail(NAME, "survivor set diverged");
    }
    ScenarioResult::pass(NAME, "512 removals, invariants held at every step")
}

/// Hash rehash: 100 string keys from 16 buckets, load factor bounded.
pub fn hash_rehash() -> ScenarioResult {
    const NAME: &str = "hash-rehash";
    let mut set: HashSet<Str> = HashSet::new();
    for i in 0..100 {
        set.insert(Str::from(format!("key-{i}").as_str()));
    }
    let buckets = set.num_buckets();
    if !(buckets == 128 || buckets == 256) {
        return ScenarioResult::fail(NAME, format!("unexpected bucket count {buckets}"));
    }
    if set.len() as f32 / buckets as f32 > 0.75 {
        return ScenarioResult::fail(NAME, "load factor breached");
    }
    for i in 0..100 {
        if !set.contains(&Str::from(format!("key-{i}").as_str())) {
            return ScenarioResult::fail(NAME, format!("key-{i} lost in rehash"));
        }
    }
    ScenarioResult::pass(NAME, format!("100 keys, {buckets} buckets"))
}

/// Set symmetric difference over the seed sets.
pub fn set_symmetric_difference() -> ScenarioResult {
    const NAME: &str = "set-symmetric-difference";
    let mut a: Set<i32> = Set::new();
    a.extend([1, 3, 10]);
    let mut b: Set<i32> = Set::new();
    b.extend([0, 2, 3, 9]);

    let cases: [(&str, Vec<i32>, Vec<i32>); 4] = [
        ("union", (&a | &b).iter().copied().collect(), vec![0, 1, 2, 3, 9, 10]),
        ("intersection", (&a & &b).iter().copied().collect(), vec![3]),
        ("symmetric difference", (&a ^ &b).iter().copied().collect(), vec![0, 1, 2, 9, 10]),
        ("difference", (&a - &b).iter().copied().collect(), vec![1, 10]),
    ];
    for (op, got, expected) in cases {
        if got != expected {
            return ScenarioResult::fail(NAME, format!("{op} produced {got:?}"));
        }
    }
    ScenarioResult::pass(NAME, "all four algebraic operations agree")
}

/// Map overwrite: the second insert for a key replaces the value.
pub fn map_value_overwrite() -> ScenarioResult {
    const NAME: &str = "map-value-overwrite";
    let mut map: Map<Str, i32> = Map::new();
    map.insert(Str::from("sneppy"), 1);
    map.insert(Str::from("sneppy"), 2);
    if map.len() != 1 {
        return ScenarioResult::fail(NAME, format!("expected 1 entry, got {}", map.len()));
    }
    match map.get(&Str::from("sneppy")) {
        Some(&2) => ScenarioResult::pass(NAME, "second insert won"),
        other => ScenarioResult::fail(NAME, format!("lookup produced {other:?}")),
    }
}

/// printf-style formatting through the string layer.
pub fn string_format() -> ScenarioResult {
    const NAME: &str = "string-format";
    let out = Str::from("Hello, %s! You are %d.") % ("world", 7);
    let expected = "Hello, world! You are 7.";
    if out == expected && out.len() == expected.len() {
        ScenarioResult::pass(NAME, format!("rendered {} bytes", out.len()))
    } else {
        ScenarioResult::fail(NAME, format!("rendered {out:?}"))
    }
}

/// Run every scenario.
#[must_use]
pub fn run_all() -> Report {
    let scenarios = vec![
        pooled_alloc_churn(),
        tree_deletion_stress(),
        hash_rehash(),
        set_symmetric_difference(),
        map_value_overwrite(),
        string_format(),
    ];
    let passed = scenarios.iter().filter(|s| s.passed).count();
    let failed = scenarios.len() - passed;
    Report {
        scenarios,
        passed,
        failed,
    }
}

/// Render a report as markdown.
#[must_use]
pub fn render_markdown(report: &Report) -> String {
    let mut out = String::from("# keel conformance report\n\n");
    out.push_str(&format!(
        "{} passed, {} failed\n\n| scenario | result | detail |\n|---|---|---|\n",
        report.passed, report.failed
    ));
    for s in &report.scenarios {
        let verdict = if s.passed { "pass" } else { "FAIL" };
        out.push_str(&format!("| {} | {} | {} |\n", s.name, verdict, s.detail));
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn all_scenarios_pass() {
        let report = run_all();
        assert_eq!(report.failed, 0, "{:#?}", report.scenarios);
        assert_eq!(report.passed, 6);
    }

    #[test]
    fn markdown_mentions_every_scenario() {
        let report = run_all();
        let md = render_markdown(&report);
        for s in &report.scenarios {
            assert!(md.contains(s.name));
        }
    }
}
