use serde::Serialize;
use std::fmt;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum FailureKind {
    Render,
    Mutation,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ItemFailure {
    pub id: String,
    pub kind: FailureKind,
    pub reason: String,
}

/// 单次轮询的汇总结果
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct RunSummary {
    pub no_op: usize,
    pub obfuscated: usize,
    pub deleted: usize,
    pub failed: usize,
    pub failures: Vec<ItemFailure>,
}

impl RunSummary {
    pub fn record_failure(&mut self, id: impl Into<String>, kind: FailureKind, reason: impl fmt::Display) {
        self.failed += 1;
        self.failures.push(ItemFailure {
            id: id.into(),
            kind,
            reason: reason.to_string(),
        });
    }

    pub fn total(&self) -> usize {
        self.no_op + self.obfuscated + self.deleted + self.failed
    }
}

impl fmt::Display for RunSummary {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} comment(s): {} untouched, {} obfuscated, {} deleted, {} failed",
            self.total(),
            self.no_op,
            self.obfuscated,
            self.deleted,
            self.failed
        )
    }
}
