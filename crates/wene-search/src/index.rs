//! Per-key document model and the in-process inverted index (spec §4.H).
//!
//! The spec allows an optional SQL-backed index, falling back to an
//! in-process cache keyed identically when no SQL storage capability is
//! present; only the in-process path is implemented here (see DESIGN.md).

use std::collections::{HashMap, HashSet};

use serde::Serialize;

use crate::disclosure::AdminDisclosure;
use crate::tokenize::{prefixes, tokenize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum DocKind {
    Admin,
    Event,
    User,
    Claim,
}

#[derive(Debug, Clone, Serialize)]
pub struct SearchDoc {
    pub id: String,
    pub kind: DocKind,
    pub title: String,
    pub subtitle: String,
    pub detail: String,
    pub search_text: String,
}

/// Flattens a disclosure graph into the four document kinds the search
/// index ranks over.
pub fn build_documents(disclosures: &[AdminDisclosure]) -> Vec<SearchDoc> {
    let mut docs = Vec::new();
    for admin in disclosures {
        docs.push(SearchDoc {
            id: format!("admin:{}", admin.admin_id),
            kind: DocKind::Admin,
            title: admin.name.clone(),
            subtitle: admin.source.clone(),
            detail: format!("{} owned events", admin.owned_events.len()),
            search_text: format!("{} {}", admin.name, admin.source),
        });
        for event in &admin.owned_events {
            docs.push(SearchDoc {
                id: format!("event:{}", event.id),
                kind: DocKind::Event,
                title: event.title.clone(),
                subtitle: event.host.clone(),
                detail: event.datetime.clone(),
                search_text: format!("{} {} {}", event.title, event.host, event.datetime),
            });
        }
        for related in &admin.related_users {
            docs.push(SearchDoc {
                id: format!("user:{}", related.key),
                kind: DocKind::User,
                title: related.key.clone(),
                subtitle: admin.name.clone(),
                detail: format!("{} transfers", related.transfers.len()),
                search_text: related.key.clone(),
            });
            for (i, transfer) in related.transfers.iter().enumerate() {
                docs.push(SearchDoc {
                    id: format!("claim:{}:{i}", related.key),
                    kind: DocKind::Claim,
                    title: transfer.grant.clone(),
                    subtitle: related.key.clone(),
                    detail: transfer.tx_signature.clone().unwrap_or_default(),
                    search_text: format!(
                        "{} {} {}",
                        transfer.grant,
                        related.key,
                        transfer.tx_signature.as_deref().unwrap_or("")
                    ),
                });
            }
        }
    }
    docs
}

pub struct SearchIndex {
    docs: HashMap<String, SearchDoc>,
    postings: HashMap<String, HashSet<String>>,
}

impl SearchIndex {
    pub fn build(docs: Vec<SearchDoc>) -> Self {
        let mut postings: HashMap<String, HashSet<String>> = HashMap::new();
        let mut by_id = HashMap::new();
        for doc in docs {
            for field in [&doc.title, &doc.subtitle, &doc.detail, &doc.search_text] {
                for term in tokenize(field) {
                    for prefix in prefixes(&term) {
                        postings.entry(prefix).or_default().insert(doc.id.clone());
                    }
                }
            }
            by_id.insert(doc.id.clone(), doc);
        }
        Self { docs: by_id, postings }
    }

    pub fn len(&self) -> usize {
        self.docs.len()
    }

    pub fn is_empty(&self) -> bool {
        self.docs.is_empty()
    }

    /// Ranks documents containing every query token, weighted by exact
    /// full-query substring matches and per-term field hits (spec §4.H).
    pub fn search(&self, query: &str, limit: usize) -> Vec<(SearchDoc, i64)> {
        let query_terms = tokenize(query);
        if query_terms.is_empty() {
            return Vec::new();
        }

        let mut candidates: Option<HashSet<String>> = None;
        for term in &query_terms {
            let hits = self.postings.get(term).cloned().unwrap_or_default();
            candidates = Some(match candidates {
                None => hits,
                Some(existing) => existing.intersection(&hits).cloned().collect(),
            });
        }
        let Some(candidates) = candidates else { return Vec::new() };

        let query_lower = query.to_lowercase();
        let mut ranked: Vec<(SearchDoc, i64)> = candidates
            .into_iter()
            .filter_map(|id| self.docs.get(&id).cloned())
            .map(|doc| {
                let mut score = 0i64;
                if doc.search_text.to_lowercase().contains(&query_lower) {
                    score += 12;
                }
                if doc.title.to_lowercase().contains(&query_lower) {
                    score += 8;
                }
                if doc.subtitle.to_lowercase().contains(&query_lower) {
                    score += 4;
                }
                if doc.detail.to_lowercase().contains(&query_lower) {
                    score += 2;
                }
                for term in &query_terms {
                    if field_tokens_contain(&doc.title, term) {
                        score += 3;
                    }
                    if field_tokens_contain(&doc.subtitle, term) {
                        score += 2;
                    }
                    if field_tokens_contain(&doc.search_text, term) {
                        score += 1;
                    }
                }
                (doc, score)
            })
            .collect();

        ranked.sort_by(|a, b| b.1.cmp(&a.1).then_with(|| a.0.id.cmp(&b.0.id)));
        ranked.truncate(limit);
        ranked
    }
}

fn field_tokens_contain(field: &str, term: &str) -> bool {
    tokenize(field).iter().any(|t| prefixes(t).contains(&term.to_string()))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn doc(id: &str, title: &str, subtitle: &str, detail: &str) -> SearchDoc {
        SearchDoc {
            id: id.to_string(),
            kind: DocKind::Event,
            title: title.to_string(),
            subtitle: subtitle.to_string(),
            detail: detail.to_string(),
            search_text: format!("{title} {subtitle} {detail}"),
        }
    }

    #[test]
    fn exact_title_substring_outranks_partial_term_match() {
        let index = SearchIndex::build(vec![
            doc("a", "Welcome Mixer", "WeNe Community", "2026-01-15"),
            doc("b", "Mixer Afterparty", "Other Host", "2026-02-01"),
        ]);
        let results = index.search("welcome mixer", 10);
        assert_eq!(results[0].0.id, "a");
        assert!(results[0].1 > results.get(1).map(|r| r.1).unwrap_or(0));
    }

    #[test]
    fn query_must_match_every_term() {
        let index = SearchIndex::build(vec![doc("a", "Welcome Mixer", "Host", "2026-01-15")]);
        let results = index.search("welcome nonexistentterm", 10);
        assert!(results.is_empty());
    }

    #[test]
    fn prefix_query_matches_longer_indexed_terms() {
        let index = SearchIndex::build(vec![doc("a", "Welcome Mixer", "Host", "2026-01-15")]);
        let results = index.search("mix", 10);
        assert_eq!(results.len(), 1);
        assert_eq!(results[0].0.id, "a");
    }
}
