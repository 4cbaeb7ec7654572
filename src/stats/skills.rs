use std::collections::HashMap;

use crate::models::Transaction;

#[derive(Debug, Clone, PartialEq)]
pub struct Skill {
    pub kind: String,
    pub amount: f64,
}

impl Skill {
    pub fn label(&self) -> &str {
        self.kind.strip_prefix("skill_").unwrap_or(&self.kind)
    }
}

/// Best score per skill type, highest first.
pub fn top_skills(transactions: &[Transaction]) -> Vec<Skill> {
    let mut best: HashMap<&str, f64> = HashMap::new();
    for tx in transactions.iter().filter(|tx| tx.is_skill()) {
        let entry = best.entry(tx.kind.as_str()).or_insert(0.0);
        *entry = entry.max(tx.xp());
    }

    let mut skills: Vec<Skill> = best
        .into_iter()
        .map(|(kind, amount)| Skill {
            kind: kind.to_string(),
            amount,
        })
        .collect();
    skills.sort_by(|a, b| {
        b.amount
            .partial_cmp(&a.amount)
            .unwrap_or(std::cmp::Ordering::Equal)
            .then_with(|| a.kind.cmp(&b.kind))
    });
    skills
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{DateTime, Utc};

    fn tx(kind: &str, amount: f64) -> Transaction {
        Transaction {
            id: None,
            kind: kind.to_string(),
            amount: Some(amount),
            created_at: "2024-02-01T10:00:00Z".parse::<DateTime<Utc>>().unwrap(),
            path: None,
            object: None,
        }
    }

    #[test]
    fn keeps_the_best_score_per_skill() {
        let transactions = vec![
            tx("skill_go", 30.0),
            tx("skill_go", 55.0),
            tx("skill_js", 40.0),
            tx("skill_algo", 40.0),
            tx("xp", 9000.0),
            tx("up", 10.0),
            tx("level", 12.0),
        ];

        let skills = top_skills(&transactions);
        assert_eq!(skills.len(), 3);
        assert_eq!(skills[0].label(), "go");
        assert_eq!(skills[0].amount, 55.0);
        assert_eq!(skills[1].kind, "skill_algo");
        assert_eq!(skills[2].kind, "skill_js");
    }
}
