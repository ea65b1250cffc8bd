//! Master-only disclosure graph (spec §4.H): per-admin rollup of owned
//! events and the users who transacted on them.

use std::collections::{BTreeMap, HashMap};

use serde::Serialize;
use wene_audit::AuditChain;
use wene_store::{AdminCodeRepo, EventRepo};
use wene_types::Event;

use crate::error::SearchResult;
use crate::transfer::{project_transfer, TransferAuditPayload};

#[derive(Debug, Clone, Serialize)]
pub struct RelatedUser {
    /// `userId | walletAddress | joinToken | recipient`, whichever the
    /// underlying transfer carried.
    pub key: String,
    pub transfers: Vec<TransferAuditPayload>,
}

#[derive(Debug, Clone, Serialize)]
pub struct AdminDisclosure {
    pub admin_id: String,
    pub name: String,
    pub source: String,
    pub revoked: bool,
    pub owned_events: Vec<Event>,
    pub related_users: Vec<RelatedUser>,
}

fn normalize(name: &str) -> String {
    name.trim().to_lowercase()
}

/// Builds one [`AdminDisclosure`] per invite record (plus the implicit
/// `master`/`demo` operators are not invites and carry no record, so this
/// only covers invited admins, per spec §4.G's three-way auth split).
pub async fn build_disclosure(
    admins: &AdminCodeRepo,
    events: &EventRepo,
    audit: &AuditChain,
    include_revoked: bool,
    transfer_window: usize,
) -> SearchResult<Vec<AdminDisclosure>> {
    let all_events = events.list().await?;
    let all_admins = admins.list().await?;

    // Explicit ownership first.
    let mut owner_of_event: HashMap<String, String> = HashMap::new();
    for event in &all_events {
        if let Some(link) = events.owner(&event.id).await? {
            owner_of_event.insert(event.id.clone(), link.admin_id);
        }
    }

    // Host-name inference only where no explicit link exists and the
    // normalized host name is globally unique among admin names.
    let name_counts: HashMap<String, usize> =
        all_admins.iter().fold(HashMap::new(), |mut acc, (_, record)| {
            *acc.entry(normalize(&record.name)).or_insert(0) += 1;
            acc
        });
    for event in &all_events {
        if owner_of_event.contains_key(&event.id) {
            continue;
        }
        let host_norm = normalize(&event.host);
        if name_counts.get(&host_norm).copied() != Some(1) {
            continue;
        }
        if let Some((_, record)) = all_admins.iter().find(|(_, r)| normalize(&r.name) == host_norm) {
            owner_of_event.insert(event.id.clone(), record.admin_id.clone());
        }
    }

    let events_by_admin: HashMap<&str, Vec<Event>> =
        all_events.iter().fold(HashMap::new(), |mut acc, event| {
            if let Some(admin_id) = owner_of_event.get(&event.id) {
                acc.entry(admin_id.as_str()).or_default().push(event.clone());
            }
            acc
        });

    let recent = audit.history_page(transfer_window).await?;
    let mut transfers_by_admin: HashMap<&str, BTreeMap<String, Vec<TransferAuditPayload>>> = HashMap::new();
    for entry in &recent {
        let Some(admin_id) = owner_of_event.get(&entry.event_id) else { continue };
        let Some(payload) = project_transfer(entry) else { continue };
        let Some(group_key) = payload.grouping_key().map(str::to_string) else { continue };
        transfers_by_admin
            .entry(admin_id.as_str())
            .or_default()
            .entry(group_key)
            .or_default()
            .push(payload);
    }

    let mut disclosures = Vec::new();
    for (token, record) in &all_admins {
        if record.is_revoked() && !include_revoked {
            continue;
        }
        let related_users = transfers_by_admin
            .get(record.admin_id.as_str())
            .map(|groups| {
                groups
                    .iter()
                    .map(|(key, transfers)| RelatedUser { key: key.clone(), transfers: transfers.clone() })
                    .collect()
            })
            .unwrap_or_default();
        disclosures.push(AdminDisclosure {
            admin_id: record.admin_id.clone(),
            name: record.name.clone(),
            source: record.source.clone(),
            revoked: record.is_revoked(),
            owned_events: events_by_admin.get(token.as_str()).cloned().unwrap_or_default(),
            related_users,
        });
    }
    Ok(disclosures)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;
    use wene_audit::ImmutableSinkSet;
    use wene_store::MemoryKvStore;
    use wene_types::{Actor, ActorType, AdminCodeRecord, CanonicalValue, EventOwnerLink, EventState, ImmutableMode, OwnerSource};

    fn event(id: &str, host: &str) -> Event {
        Event {
            id: id.to_string(),
            title: "Test".to_string(),
            datetime: "2026-01-01T00:00:00Z".to_string(),
            host: host.to_string(),
            state: EventState::Published,
            solana_mint: None,
            solana_authority: None,
            solana_grant_id: None,
            ticket_token_amount: 1,
            claim_interval_days: 7,
            max_claims_per_interval: None,
            risk_profile: None,
        }
    }

    #[tokio::test]
    async fn explicit_ownership_and_related_transfers_roll_up() {
        let store = Arc::new(MemoryKvStore::new());
        let admins = AdminCodeRepo::new(store.clone());
        let events = EventRepo::new(store.clone());
        let audit = AuditChain::new(store.clone(), ImmutableSinkSet::none(), ImmutableMode::Off, "wene");

        admins
            .put(
                "tok1",
                &AdminCodeRecord {
                    admin_id: "admin-1".to_string(),
                    name: "Alice".to_string(),
                    source: "invite".to_string(),
                    created_at: 0,
                    revoked_at: None,
                    revoked_by: None,
                },
            )
            .await
            .unwrap();
        events
            .create(
                event("evt-1", "Some Venue"),
                EventOwnerLink {
                    event_id: "evt-1".to_string(),
                    admin_id: "admin-1".to_string(),
                    name: "Alice".to_string(),
                    source: OwnerSource::Invite,
                    linked_at: 0,
                },
            )
            .await
            .unwrap();
        audit
            .append(
                "USER_CLAIM",
                "evt-1",
                Actor { actor_type: ActorType::User, id: "u1".to_string() },
                CanonicalValue::object([("recipient", CanonicalValue::string("wallet-abc"))]),
            )
            .await
            .unwrap();

        let disclosures = build_disclosure(&admins, &events, &audit, false, 50).await.unwrap();
        assert_eq!(disclosures.len(), 1);
        assert_eq!(disclosures[0].owned_events.len(), 1);
        assert_eq!(disclosures[0].related_users.len(), 1);
        assert_eq!(disclosures[0].related_users[0].key, "wallet-abc");
    }

    #[tokio::test]
    async fn revoked_admins_excluded_unless_requested() {
        let store = Arc::new(MemoryKvStore::new());
        let admins = AdminCodeRepo::new(store.clone());
        let events = EventRepo::new(store.clone());
        let audit = AuditChain::new(store.clone(), ImmutableSinkSet::none(), ImmutableMode::Off, "wene");
        admins
            .put(
                "tok1",
                &AdminCodeRecord {
                    admin_id: "admin-1".to_string(),
                    name: "Alice".to_string(),
                    source: "invite".to_string(),
                    created_at: 0,
                    revoked_at: Some(10),
                    revoked_by: Some("master".to_string()),
                },
            )
            .await
            .unwrap();
        let excluded = build_disclosure(&admins, &events, &audit, false, 50).await.unwrap();
        assert!(excluded.is_empty());
        let included = build_disclosure(&admins, &events, &audit, true, 50).await.unwrap();
        assert_eq!(included.len(), 1);
        assert!(included[0].revoked);
    }
}
