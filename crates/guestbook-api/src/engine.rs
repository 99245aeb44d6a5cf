use std::sync::Arc;

use tracing::{debug, info, warn};

use guestbook_db::Database;
use guestbook_db::queries::InsertOutcome;
use guestbook_types::api::SubmitEntryRequest;
use guestbook_types::models::{Entry, EntryStatus, NewEntry};

use crate::error::EngineError;
use crate::token::{Identity, TokenAuthority};

/// Result of a submission.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Submission {
    Stored { id: i64, status: EntryStatus },
    /// Spam trap tripped; nothing was stored.
    Discarded,
}

/// Ingestion, moderation and listing of guestbook entries.
///
/// Every call is an independent unit of work against the store. Calls
/// block on SQLite and belong on `spawn_blocking` inside async handlers.
#[derive(Clone)]
pub struct EntryEngine {
    db: Arc<Database>,
    tokens: TokenAuthority,
}

impl EntryEngine {
    pub fn new(db: Arc<Database>, tokens: TokenAuthority) -> Self {
        Self { db, tokens }
    }

    /// Public listing when `owner` is given, otherwise the dashboard
    /// listing of the owner behind `credential`.
    pub fn list_entries(
        &self,
        owner: Option<&str>,
        credential: Option<&str>,
    ) -> Result<Vec<Entry>, EngineError> {
        if let Some(owner) = owner.map(str::trim).filter(|o| !o.is_empty()) {
            return Ok(self.db.list_public_entries(owner)?);
        }

        if credential.is_none() {
            return Err(EngineError::InvalidInput(
                "owner username or credential required".into(),
            ));
        }

        let identity = self.authenticate(credential)?;
        Ok(self.db.list_all_entries(&identity.username)?)
    }

    pub fn submit_entry(
        &self,
        req: &SubmitEntryRequest,
        credential: Option<&str>,
    ) -> Result<Submission, EngineError> {
        if req.bot_field.as_deref().is_some_and(|v| !v.is_empty()) {
            warn!("Discarding trapped submission for '{}'", req.owner_username);
            return Ok(Submission::Discarded);
        }

        let owner = required(&req.owner_username, "owner_username")?;
        let sender_name = required(&req.sender_name, "sender_name")?;
        if req.message.trim().is_empty() {
            return Err(EngineError::InvalidInput("message is required".into()));
        }

        let is_owner = match credential {
            Some(token) => match self.tokens.verify(token) {
                Ok(identity) => identity.username == owner,
                Err(e) => {
                    debug!("Treating submission with bad credential as guest: {}", e);
                    false
                }
            },
            None => false,
        };

        let status = if is_owner {
            EntryStatus::Approved
        } else if self.db.get_require_approval(owner)? {
            EntryStatus::Pending
        } else {
            EntryStatus::Approved
        };

        let entry = NewEntry {
            owner_username: owner.to_string(),
            sender_name: sender_name.to_string(),
            sender_website: req
                .sender_website
                .as_deref()
                .map(str::trim)
                .filter(|w| !w.is_empty())
                .map(str::to_string),
            message: req.message.clone(),
            parent_id: req.parent_id,
            is_private: req.is_private,
            is_owner,
            status,
        };

        match self.db.insert_entry(&entry)? {
            InsertOutcome::Inserted(id) => {
                info!("Entry {} stored for '{}' as {}", id, owner, status);
                Ok(Submission::Stored { id, status })
            }
            InsertOutcome::ParentNotFound => {
                Err(EngineError::InvalidInput("parent entry not found".into()))
            }
        }
    }

    /// Public and unauthenticated. Unknown ids are ignored.
    pub fn like_entry(&self, id: i64) -> Result<(), EngineError> {
        if !self.db.increment_likes(id)? {
            debug!("Like for unknown entry {}", id);
        }
        Ok(())
    }

    /// Approving an entry the caller does not own, or one that is already
    /// approved, succeeds without effect.
    pub fn approve_entry(&self, id: i64, credential: Option<&str>) -> Result<(), EngineError> {
        let identity = self.authenticate(credential)?;
        if self.db.approve_entry(id, &identity.username)? {
            info!("Entry {} approved by '{}'", id, identity.username);
        }
        Ok(())
    }

    pub fn delete_entry(&self, id: i64, credential: Option<&str>) -> Result<(), EngineError> {
        let identity = self.authenticate(credential)?;
        if !self.db.delete_entry(id, &identity.username)? {
            return Err(EngineError::NotFound);
        }
        info!("Entry {} deleted by '{}'", id, identity.username);
        Ok(())
    }

    fn authenticate(&self, credential: Option<&str>) -> Result<Identity, EngineError> {
        let token = credential.ok_or(EngineError::Unauthorized)?;
        self.tokens.verify(token).map_err(|e| {
            warn!("Rejected credential: {}", e);
            EngineError::Unauthorized
        })
    }
}

fn required<'a>(value: &'a str, field: &str) -> Result<&'a str, EngineError> {
    let value = value.trim();
    if value.is_empty() {
        return Err(EngineError::InvalidInput(format!("{field} is required")));
    }
    Ok(value)
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Duration;
    use uuid::Uuid;

    struct Harness {
        db: Arc<Database>,
        tokens: TokenAuthority,
        engine: EntryEngine,
    }

    impl Harness {
        fn new() -> Self {
            let db = Arc::new(Database::open_in_memory().unwrap());
            let tokens = TokenAuthority::new(b"test-secret", "guestbook-test", Duration::days(1));
            let engine = EntryEngine::new(db.clone(), tokens.clone());
            Self { db, tokens, engine }
        }

        fn owner(&self, username: &str, require_approval: bool) -> String {
            let id = Uuid::new_v4();
            assert!(self.db.create_user(&id.to_string(), username, "hash").unwrap());
            self.db
                .update_profile(username, None, None, Some(require_approval))
                .unwrap();
            self.tokens.issue(id, username).unwrap()
        }

        fn submit(&self, req: SubmitEntryRequest, credential: Option<&str>) -> (i64, EntryStatus) {
            match self.engine.submit_entry(&req, credential).unwrap() {
                Submission::Stored { id, status } => (id, status),
                Submission::Discarded => panic!("submission discarded"),
            }
        }
    }

    fn visitor_post(owner: &str) -> SubmitEntryRequest {
        SubmitEntryRequest {
            owner_username: owner.into(),
            sender_name: "Bob".into(),
            message: "hi".into(),
            ..Default::default()
        }
    }

    #[test]
    fn trapped_submission_is_discarded_silently() {
        let h = Harness::new();
        let mut req = visitor_post("alice");
        req.bot_field = Some("http://spam.example".into());

        assert_eq!(h.engine.submit_entry(&req, None).unwrap(), Submission::Discarded);
        assert!(h.db.list_all_entries("alice").unwrap().is_empty());
    }

    #[test]
    fn trap_is_checked_before_validation() {
        let h = Harness::new();
        let req = SubmitEntryRequest {
            bot_field: Some("x".into()),
            ..Default::default()
        };
        assert_eq!(h.engine.submit_entry(&req, None).unwrap(), Submission::Discarded);
    }

    #[test]
    fn missing_required_fields_are_rejected() {
        let h = Harness::new();
        for req in [
            SubmitEntryRequest { sender_name: "  ".into(), ..visitor_post("alice") },
            SubmitEntryRequest { message: String::new(), ..visitor_post("alice") },
            SubmitEntryRequest { owner_username: String::new(), ..visitor_post("alice") },
        ] {
            assert!(matches!(
                h.engine.submit_entry(&req, None),
                Err(EngineError::InvalidInput(_))
            ));
        }
        assert!(h.db.list_all_entries("alice").unwrap().is_empty());
    }

    #[test]
    fn owner_submission_bypasses_moderation() {
        let h = Harness::new();
        let alice = h.owner("alice", true);

        let (id, status) = h.submit(visitor_post("alice"), Some(&alice));
        assert_eq!(status, EntryStatus::Approved);

        let stored = h.db.get_entry(id).unwrap().unwrap();
        assert!(stored.is_owner);
        assert_eq!(stored.status, EntryStatus::Approved);
    }

    #[test]
    fn credential_for_another_owner_is_a_guest() {
        let h = Harness::new();
        h.owner("alice", true);
        let carol = h.owner("carol", false);

        let (id, status) = h.submit(visitor_post("alice"), Some(&carol));
        assert_eq!(status, EntryStatus::Pending);
        assert!(!h.db.get_entry(id).unwrap().unwrap().is_owner);
    }

    #[test]
    fn invalid_credential_on_submission_is_a_guest() {
        let h = Harness::new();
        let (id, status) = h.submit(visitor_post("alice"), Some("garbage"));
        assert_eq!(status, EntryStatus::Approved);
        assert!(!h.db.get_entry(id).unwrap().unwrap().is_owner);
    }

    #[test]
    fn moderation_follows_owner_setting() {
        let h = Harness::new();
        h.owner("strict", true);
        h.owner("relaxed", false);

        assert_eq!(h.submit(visitor_post("strict"), None).1, EntryStatus::Pending);
        assert_eq!(h.submit(visitor_post("relaxed"), None).1, EntryStatus::Approved);
        assert_eq!(h.submit(visitor_post("unregistered"), None).1, EntryStatus::Approved);
    }

    #[test]
    fn empty_website_is_stored_as_absent() {
        let h = Harness::new();
        let mut req = visitor_post("alice");
        req.sender_website = Some("   ".into());
        let (id, _) = h.submit(req, None);
        assert_eq!(h.db.get_entry(id).unwrap().unwrap().sender_website, None);
    }

    #[test]
    fn reply_to_foreign_or_missing_parent_is_rejected() {
        let h = Harness::new();
        let (carol_root, _) = h.submit(visitor_post("carol"), None);

        for parent_id in [carol_root, carol_root + 1000] {
            let mut reply = visitor_post("alice");
            reply.parent_id = Some(parent_id);
            match h.engine.submit_entry(&reply, None) {
                Err(EngineError::InvalidInput(msg)) => assert_eq!(msg, "parent entry not found"),
                other => panic!("unexpected {:?}", other),
            }
        }
        assert!(h.db.list_all_entries("alice").unwrap().is_empty());
    }

    #[test]
    fn listing_requires_owner_or_credential() {
        let h = Harness::new();
        assert!(matches!(
            h.engine.list_entries(None, None),
            Err(EngineError::InvalidInput(_))
        ));
        assert!(matches!(
            h.engine.list_entries(None, Some("garbage")),
            Err(EngineError::Unauthorized)
        ));
    }

    #[test]
    fn owner_listing_is_superset_of_public_listing() {
        let h = Harness::new();
        let alice = h.owner("alice", false);
        h.submit(visitor_post("alice"), None);
        let mut private = visitor_post("alice");
        private.is_private = true;
        h.submit(private, None);
        h.db.update_profile("alice", None, None, Some(true)).unwrap();
        h.submit(visitor_post("alice"), None);
        h.submit(visitor_post("carol"), None);

        let public = h.engine.list_entries(Some("alice"), None).unwrap();
        assert_eq!(public.len(), 1);
        assert!(public.iter().all(|e| e.is_public() && e.owner_username == "alice"));

        let all = h.engine.list_entries(None, Some(&alice)).unwrap();
        assert_eq!(all.len(), 3);
        assert!(public.iter().all(|p| all.iter().any(|e| e.id == p.id)));
    }

    #[test]
    fn concurrent_likes_are_not_lost() {
        let h = Harness::new();
        let (id, _) = h.submit(visitor_post("alice"), None);

        std::thread::scope(|s| {
            for _ in 0..8 {
                s.spawn(|| {
                    for _ in 0..25 {
                        h.engine.like_entry(id).unwrap();
                    }
                });
            }
        });

        assert_eq!(h.db.get_entry(id).unwrap().unwrap().likes, 200);
    }

    #[test]
    fn like_on_unknown_entry_succeeds_quietly() {
        let h = Harness::new();
        assert!(h.engine.like_entry(42).is_ok());
    }

    #[test]
    fn approve_is_idempotent_and_owner_scoped() {
        let h = Harness::new();
        let alice = h.owner("alice", true);
        let carol = h.owner("carol", false);
        let (id, _) = h.submit(visitor_post("alice"), None);

        h.engine.approve_entry(id, Some(&carol)).unwrap();
        assert_eq!(h.db.get_entry(id).unwrap().unwrap().status, EntryStatus::Pending);

        h.engine.approve_entry(id, Some(&alice)).unwrap();
        h.engine.approve_entry(id, Some(&alice)).unwrap();
        h.engine.approve_entry(id, Some(&carol)).unwrap();
        assert_eq!(h.db.get_entry(id).unwrap().unwrap().status, EntryStatus::Approved);

        assert!(matches!(
            h.engine.approve_entry(id, None),
            Err(EngineError::Unauthorized)
        ));
    }

    #[test]
    fn delete_hides_ownership_from_other_owners() {
        let h = Harness::new();
        let alice = h.owner("alice", false);
        let carol = h.owner("carol", false);
        let (id, _) = h.submit(visitor_post("alice"), None);

        assert!(matches!(
            h.engine.delete_entry(id, Some(&carol)),
            Err(EngineError::NotFound)
        ));
        assert!(matches!(
            h.engine.delete_entry(id + 999, Some(&carol)),
            Err(EngineError::NotFound)
        ));
        assert!(h.db.get_entry(id).unwrap().is_some());

        assert!(matches!(
            h.engine.delete_entry(id, Some("garbage")),
            Err(EngineError::Unauthorized)
        ));

        h.engine.delete_entry(id, Some(&alice)).unwrap();
        assert!(h.db.get_entry(id).unwrap().is_none());
    }

    #[test]
    fn moderated_visitor_post_becomes_public_after_approval() {
        let h = Harness::new();
        let alice = h.owner("alice", true);

        let (id, status) = h.submit(visitor_post("alice"), None);
        assert_eq!(status, EntryStatus::Pending);
        let stored = h.db.get_entry(id).unwrap().unwrap();
        assert!(!stored.is_owner);
        assert_eq!(stored.likes, 0);

        assert!(h.engine.list_entries(Some("alice"), None).unwrap().is_empty());
        let dashboard = h.engine.list_entries(None, Some(&alice)).unwrap();
        assert_eq!(dashboard[0].status, EntryStatus::Pending);

        h.engine.approve_entry(id, Some(&alice)).unwrap();
        let public = h.engine.list_entries(Some("alice"), None).unwrap();
        assert_eq!(public.len(), 1);
        assert_eq!(public[0].id, id);
        assert_eq!(public[0].status, EntryStatus::Approved);
    }

    #[test]
    fn replies_thread_under_their_root() {
        let h = Harness::new();
        let (root, _) = h.submit(visitor_post("alice"), None);
        let mut first = visitor_post("alice");
        first.parent_id = Some(root);
        let (first, _) = h.submit(first, None);
        let mut second = visitor_post("alice");
        second.parent_id = Some(root);
        let (second, _) = h.submit(second, None);

        let listing = h.engine.list_entries(Some("alice"), None).unwrap();
        let threads = guestbook_types::thread::assemble_threads(listing);

        assert_eq!(threads.len(), 1);
        assert_eq!(threads[0].root.id, root);
        assert_eq!(
            threads[0].replies.iter().map(|e| e.id).collect::<Vec<_>>(),
            vec![second, first]
        );
    }

    #[test]
    fn deleting_a_root_keeps_its_replies_out_of_threads() {
        let h = Harness::new();
        let alice = h.owner("alice", false);
        let (root, _) = h.submit(visitor_post("alice"), None);
        let mut reply = visitor_post("alice");
        reply.parent_id = Some(root);
        let (reply, _) = h.submit(reply, None);

        h.engine.delete_entry(root, Some(&alice)).unwrap();

        let listing = h.engine.list_entries(None, Some(&alice)).unwrap();
        assert_eq!(listing.iter().map(|e| e.id).collect::<Vec<_>>(), vec![reply]);
        assert!(guestbook_types::thread::assemble_threads(listing).is_empty());
    }
}
