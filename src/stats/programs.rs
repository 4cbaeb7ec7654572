use std::collections::BTreeMap;

use clap::ValueEnum;

use crate::models::Transaction;

pub const DEFAULT_CAMPUS: &str = "astanahub";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, ValueEnum)]
pub enum Program {
    CoreEducation,
    PiscineJs,
    PiscineGo,
}

impl Program {
    pub const ALL: [Program; 3] = [Program::CoreEducation, Program::PiscineJs, Program::PiscineGo];

    pub fn slug(self) -> &'static str {
        match self {
            Program::CoreEducation => "core-education",
            Program::PiscineJs => "piscine-js",
            Program::PiscineGo => "piscine-go",
        }
    }

    pub fn title(self) -> &'static str {
        match self {
            Program::CoreEducation => "Core Education",
            Program::PiscineJs => "Piscine JS",
            Program::PiscineGo => "Piscine Go",
        }
    }
}

/// A path prefix owned by one program, minus any sub-prefixes owned by another.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProgramRule {
    pub program: Program,
    pub prefix: String,
    pub exclusions: Vec<String>,
}

impl ProgramRule {
    pub fn matches(&self, path: &str) -> bool {
        path.starts_with(&self.prefix)
            && !self
                .exclusions
                .iter()
                .any(|exclusion| path.starts_with(exclusion))
    }
}

/// Ordered classification rules; the first matching rule decides the program.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProgramRules {
    rules: Vec<ProgramRule>,
}

impl ProgramRules {
    pub fn for_campus(campus: &str) -> Self {
        let root = format!("/{}/", campus.trim_matches('/'));
        let module = format!("{root}module/");
        let piscine_js = format!("{module}piscine-js/");

        Self {
            rules: vec![
                ProgramRule {
                    program: Program::PiscineJs,
                    prefix: piscine_js.clone(),
                    exclusions: Vec::new(),
                },
                ProgramRule {
                    program: Program::CoreEducation,
                    prefix: module,
                    exclusions: vec![piscine_js],
                },
                ProgramRule {
                    program: Program::PiscineGo,
                    prefix: format!("{root}piscinego/"),
                    exclusions: Vec::new(),
                },
            ],
        }
    }

    pub fn rules(&self) -> &[ProgramRule] {
        &self.rules
    }

    pub fn classify(&self, path: &str) -> Option<Program> {
        self.rules
            .iter()
            .find(|rule| rule.matches(path))
            .map(|rule| rule.program)
    }

    /// XP transactions belonging to `program`, in input order.
    pub fn select<'a>(&self, program: Program, transactions: &'a [Transaction]) -> Vec<&'a Transaction> {
        transactions
            .iter()
            .filter(|tx| tx.is_xp())
            .filter(|tx| {
                tx.path
                    .as_deref()
                    .and_then(|path| self.classify(path))
                    == Some(program)
            })
            .collect()
    }

    pub fn partition(&self, transactions: &[Transaction]) -> ProgramPartition {
        let mut partition = ProgramPartition::default();
        for tx in transactions.iter().filter(|tx| tx.is_xp()) {
            match tx.path.as_deref().and_then(|path| self.classify(path)) {
                Some(program) => partition
                    .programs
                    .entry(program)
                    .or_default()
                    .push(tx.clone()),
                None => partition.unclassified.push(tx.clone()),
            }
        }
        partition
    }
}

impl Default for ProgramRules {
    fn default() -> Self {
        Self::for_campus(DEFAULT_CAMPUS)
    }
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct ProgramPartition {
    pub programs: BTreeMap<Program, Vec<Transaction>>,
    pub unclassified: Vec<Transaction>,
}

impl ProgramPartition {
    pub fn get(&self, program: Program) -> &[Transaction] {
        self.programs
            .get(&program)
            .map(Vec::as_slice)
            .unwrap_or(&[])
    }

    pub fn xp(&self, program: Program) -> f64 {
        self.get(program).iter().map(Transaction::xp).sum()
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct ProgramStats {
    pub program: Program,
    pub xp: f64,
    pub level: f64,
    pub transactions: usize,
}

/// Highest `level` amount among the given rows, zero when there are none.
pub fn level_from(levels: &[Transaction]) -> f64 {
    levels
        .iter()
        .filter(|tx| tx.is_level())
        .map(Transaction::xp)
        .fold(0.0, f64::max)
}

pub fn program_stats(
    rules: &ProgramRules,
    program: Program,
    transactions: &[Transaction],
    levels: &[Transaction],
) -> ProgramStats {
    let selected = rules.select(program, transactions);
    ProgramStats {
        program,
        xp: selected.iter().map(|tx| tx.xp()).sum(),
        level: level_from(levels),
        transactions: selected.len(),
    }
}
