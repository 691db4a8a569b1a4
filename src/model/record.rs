//! Post records — the typed view of one stored post document.
//!
//! Stored documents are loosely shaped. Decoding never fails because a
//! *target* slot is odd: a quote that is not an object, or a repost whose
//! nested author is missing, decodes as a present slot with no target.
//! Only the author is load-bearing, and even that is checked by the
//! accumulator rather than here.

use std::fmt;

use serde::{Deserialize, Deserializer, Serialize};
use serde_json::Value as Json;
use smallvec::SmallVec;

use crate::{Error, Result};

/// Which part of a post produced an interaction.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum InteractionKind {
    Reply,
    Quote,
    Repost,
}

impl fmt::Display for InteractionKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            InteractionKind::Reply => "reply",
            InteractionKind::Quote => "quote",
            InteractionKind::Repost => "repost",
        })
    }
}

/// Nested user object, `{"screen_name": "..."}`.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct UserRef {
    #[serde(default, deserialize_with = "lenient_string")]
    pub screen_name: Option<String>,
}

/// The post a quote or repost points at. Only its author matters.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct TargetRef {
    #[serde(default, deserialize_with = "lenient_string", skip_serializing_if = "Option::is_none")]
    pub author_id: Option<String>,

    /// Short spelling, `author`. `author_id` wins when both are usable.
    #[serde(
        default,
        rename = "author",
        deserialize_with = "lenient_string",
        skip_serializing_if = "Option::is_none"
    )]
    pub author_alias: Option<String>,

    #[serde(default, deserialize_with = "lenient_user", skip_serializing_if = "Option::is_none")]
    pub user: Option<UserRef>,
}

impl TargetRef {
    pub fn by(author: impl Into<String>) -> Self {
        Self { author_id: Some(author.into()), ..Self::default() }
    }

    /// The target's author: `author_id`, `author`, then `user.screen_name`.
    /// Empty is absent.
    pub fn author(&self) -> Option<&str> {
        resolve_author(&self.author_id, &self.author_alias, &self.user)
    }
}

/// One stored post.
///
/// The stored documents' own spellings are decoded into separate fields
/// (`author`, `in_reply_to_screen_name`, `quoted_status`,
/// `retweeted_status`) so a document carrying both spellings still decodes.
/// The canonical field wins whenever it yields a value. Unrecognized fields
/// are ignored.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct PostRecord {
    #[serde(default, deserialize_with = "lenient_string", skip_serializing_if = "Option::is_none")]
    pub author_id: Option<String>,

    #[serde(
        default,
        rename = "author",
        deserialize_with = "lenient_string",
        skip_serializing_if = "Option::is_none"
    )]
    pub author_alias: Option<String>,

    #[serde(default, deserialize_with = "lenient_user", skip_serializing_if = "Option::is_none")]
    pub user: Option<UserRef>,

    #[serde(default, deserialize_with = "lenient_string", skip_serializing_if = "Option::is_none")]
    pub reply_target_id: Option<String>,

    #[serde(default, deserialize_with = "lenient_string", skip_serializing_if = "Option::is_none")]
    pub in_reply_to_screen_name: Option<String>,

    #[serde(default, deserialize_with = "lenient_target", skip_serializing_if = "Option::is_none")]
    pub quote_target: Option<TargetRef>,

    #[serde(default, deserialize_with = "lenient_target", skip_serializing_if = "Option::is_none")]
    pub quoted_status: Option<TargetRef>,

    #[serde(default, deserialize_with = "lenient_target", skip_serializing_if = "Option::is_none")]
    pub repost_target: Option<TargetRef>,

    #[serde(default, deserialize_with = "lenient_target", skip_serializing_if = "Option::is_none")]
    pub retweeted_status: Option<TargetRef>,
}

/// A present interaction slot and the target it resolved to, if any.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Slot<'a> {
    pub kind: InteractionKind,
    pub target: Option<&'a str>,
}

impl PostRecord {
    pub fn new(author: impl Into<String>) -> Self {
        Self { author_id: Some(author.into()), ..Self::default() }
    }

    pub fn replying_to(mut self, target: impl Into<String>) -> Self {
        self.reply_target_id = Some(target.into());
        self
    }

    pub fn quoting(mut self, target: impl Into<String>) -> Self {
        self.quote_target = Some(TargetRef::by(target));
        self
    }

    pub fn reposting(mut self, target: impl Into<String>) -> Self {
        self.repost_target = Some(TargetRef::by(target));
        self
    }

    /// Decode a stored document. Only a non-object document fails here.
    pub fn from_document(doc: &Json) -> Result<Self> {
        PostRecord::deserialize(doc).map_err(|e| Error::MalformedRecord(e.to_string()))
    }

    /// The author: `author_id`, `author`, then `user.screen_name`. Empty is absent.
    pub fn author(&self) -> Option<&str> {
        resolve_author(&self.author_id, &self.author_alias, &self.user)
    }

    /// Every slot present on the record, in reply, quote, repost order.
    /// A slot is present if either of its spellings is.
    pub fn slots(&self) -> SmallVec<[Slot<'_>; 3]> {
        let mut slots = SmallVec::new();
        if self.reply_target_id.is_some() || self.in_reply_to_screen_name.is_some() {
            let target = self
                .reply_target_id
                .as_deref()
                .and_then(non_empty)
                .or_else(|| self.in_reply_to_screen_name.as_deref().and_then(non_empty));
            slots.push(Slot { kind: InteractionKind::Reply, target });
        }
        if let Some(target) = target_slot(&self.quote_target, &self.quoted_status) {
            slots.push(Slot { kind: InteractionKind::Quote, target });
        }
        if let Some(target) = target_slot(&self.repost_target, &self.retweeted_status) {
            slots.push(Slot { kind: InteractionKind::Repost, target });
        }
        slots
    }
}

/// `None` when neither spelling is present, otherwise the resolved author.
fn target_slot<'a>(
    canonical: &'a Option<TargetRef>,
    alias: &'a Option<TargetRef>,
) -> Option<Option<&'a str>> {
    if canonical.is_none() && alias.is_none() {
        return None;
    }
    Some(
        canonical
            .as_ref()
            .and_then(TargetRef::author)
            .or_else(|| alias.as_ref().and_then(TargetRef::author)),
    )
}

fn non_empty(s: &str) -> Option<&str> {
    if s.is_empty() { None } else { Some(s) }
}

fn resolve_author<'a>(
    id: &'a Option<String>,
    alias: &'a Option<String>,
    user: &'a Option<UserRef>,
) -> Option<&'a str> {
    id.as_deref()
        .and_then(non_empty)
        .or_else(|| alias.as_deref().and_then(non_empty))
        .or_else(|| user.as_ref()?.screen_name.as_deref().and_then(non_empty))
}

// ============================================================================
// Lenient field decoders
// ============================================================================

/// Strings decode as themselves; anything else (null, numbers, objects) as `None`.
fn lenient_string<'de, D>(d: D) -> std::result::Result<Option<String>, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(match Option::<Json>::deserialize(d)? {
        Some(Json::String(s)) => Some(s),
        _ => None,
    })
}

fn lenient_user<'de, D>(d: D) -> std::result::Result<Option<UserRef>, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(match Option::<Json>::deserialize(d)? {
        Some(v @ Json::Object(_)) => serde_json::from_value(v).ok(),
        _ => None,
    })
}

/// `null` means no slot; any other value means the slot is present,
/// with whatever author could be recovered from it.
fn lenient_target<'de, D>(d: D) -> std::result::Result<Option<TargetRef>, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(match Option::<Json>::deserialize(d)? {
        None | Some(Json::Null) => None,
        Some(v @ Json::Object(_)) => Some(serde_json::from_value(v).unwrap_or_default()),
        Some(_) => Some(TargetRef::default()),
    })
}
