//! # Resource Protocol
//!
//! The GET / PUT / DELETE state machine over a [`ResourceStore`].
//!
//! ## PUT
//!
//! ```text
//! ValidateSyntax → ValidateBody → { Create | Update(PreconditionCheck) } → Persist → Verify → Respond
//! ```
//!
//! 1. Identifier, `Accept`, `Content-Type`.
//! 2. Body: UTF-8, store content ceiling, schema predicate. This runs before
//!    the existence check so a bad body is rejected the same way on both
//!    branches.
//! 3. Read the current resource. If it exists the request must carry
//!    `If-Match` equal to the tag computed from the current record. If it
//!    does not exist there is no precondition.
//! 4. Upsert, then re-read. A write that cannot be read back is an internal
//!    error; the response always reflects what the store actually holds.
//!
//! Any failure short-circuits the remaining stages. The store is not touched
//! for writing before stage 4.
//!
//! ## Concurrency
//!
//! There is no locking here. The precondition is evaluated against the tag
//! visible at step 3; a second writer that commits between that read and the
//! upsert is overwritten (last write wins). A client that loses the race on
//! its next attempt receives `PreconditionFailed` and must re-read. Nothing
//! is retried internally.

use std::sync::Arc;

use crate::error::ProtocolError;
use crate::etag::ETag;
use crate::media::MediaType;
use crate::resource::{PathPrefix, Resource, ResourceId};
use crate::store::ResourceStore;
use crate::validate::{BodyValidator, BodyVerdict};

/// The request headers the protocol inspects.
///
/// Header values are passed through as received. The transport layer maps a
/// missing header to `None`.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RequestHeaders {
    /// `Accept`.
    pub accept: Option<String>,
    /// `Content-Type`.
    pub content_type: Option<String>,
    /// `If-Match`.
    pub if_match: Option<String>,
}

/// Resource state returned to the client: content plus its fresh tag.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResourceView {
    /// Persisted content.
    pub content: String,
    /// Tag computed from the persisted record.
    pub etag: ETag,
}

impl From<Resource> for ResourceView {
    fn from(resource: Resource) -> Self {
        let etag = resource.etag();
        Self {
            content: resource.into_content(),
            etag,
        }
    }
}

/// Which branch a successful PUT took.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum WriteKind {
    /// The identifier was not in use.
    Created,
    /// An existing resource was overwritten.
    Updated,
}

impl WriteKind {
    /// Returns the branch identifier string.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Created => "created",
            Self::Updated => "updated",
        }
    }
}

/// Result of a successful PUT.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WriteOutcome {
    /// Create or update.
    pub kind: WriteKind,
    /// The resource as read back from the store after the write.
    pub resource: ResourceView,
}

/// The resource lifecycle protocol.
///
/// Cheap to share behind an `Arc`; it holds no per-request state.
pub struct ResourceProtocol {
    prefix: PathPrefix,
    media_type: MediaType,
    store: Arc<dyn ResourceStore>,
    validator: Arc<dyn BodyValidator>,
}

impl std::fmt::Debug for ResourceProtocol {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ResourceProtocol")
            .field("prefix", &self.prefix)
            .field("media_type", &self.media_type)
            .finish_non_exhaustive()
    }
}

impl ResourceProtocol {
    /// Assemble the protocol from its collaborators.
    pub fn new(
        prefix: PathPrefix,
        media_type: MediaType,
        store: Arc<dyn ResourceStore>,
        validator: Arc<dyn BodyValidator>,
    ) -> Self {
        Self {
            prefix,
            media_type,
            store,
            validator,
        }
    }

    /// The configured path prefix.
    pub fn prefix(&self) -> &PathPrefix {
        &self.prefix
    }

    /// The configured media type.
    pub fn media_type(&self) -> &MediaType {
        &self.media_type
    }

    /// The backing store.
    pub fn store(&self) -> &Arc<dyn ResourceStore> {
        &self.store
    }

    /// Extract the raw identifier from a request path.
    ///
    /// `None` means the path is not under the resource prefix at all.
    pub fn identifier_from_path<'a>(&self, path: &'a str) -> Option<&'a str> {
        self.prefix.strip(path)
    }

    /// GET: read a resource and its current tag.
    pub async fn read(
        &self,
        raw_id: &str,
        headers: &RequestHeaders,
    ) -> Result<ResourceView, ProtocolError> {
        let id = ResourceId::parse(raw_id)?;
        self.check_accept(headers)?;

        match self.store.get(&id).await? {
            Some(resource) => Ok(resource.into()),
            None => {
                tracing::debug!(identifier = %id, "resource not found");
                Err(ProtocolError::NotFound)
            }
        }
    }

    /// PUT: validated create-or-update.
    pub async fn write(
        &self,
        raw_id: &str,
        headers: &RequestHeaders,
        body: &[u8],
    ) -> Result<WriteOutcome, ProtocolError> {
        let id = self.check_write_syntax(raw_id, headers)?;

        // ValidateBody
        let content = self.check_body(body)?;

        // Create | Update(PreconditionCheck)
        let kind = match self.store.get(&id).await? {
            Some(current) => {
                let if_match = headers
                    .if_match
                    .as_deref()
                    .ok_or(ProtocolError::PreconditionHeaderMissing)?;
                let current_tag = current.etag();
                if !current_tag.matches(if_match) {
                    tracing::debug!(
                        identifier = %id,
                        current = %current_tag,
                        if_match,
                        "precondition failed"
                    );
                    return Err(ProtocolError::PreconditionFailed);
                }
                WriteKind::Updated
            }
            None => WriteKind::Created,
        };

        // Persist
        self.store.put(Resource::new(id.clone(), content)).await?;

        // Verify
        let saved = self.store.get(&id).await?.ok_or_else(|| {
            ProtocolError::Internal(format!(
                "Database fatal error: resource '{id}' not readable after write"
            ))
        })?;

        let resource = ResourceView::from(saved);
        tracing::info!(
            identifier = %id,
            kind = kind.as_str(),
            etag = %resource.etag,
            "resource written"
        );
        Ok(WriteOutcome { kind, resource })
    }

    /// First PUT stage: identifier, `Accept`, and `Content-Type`.
    ///
    /// Needs no body, so a transport can run it before buffering one.
    pub fn check_write_syntax(
        &self,
        raw_id: &str,
        headers: &RequestHeaders,
    ) -> Result<ResourceId, ProtocolError> {
        let id = ResourceId::parse(raw_id)?;
        self.check_accept(headers)?;
        if !self
            .media_type
            .admits_content_type(headers.content_type.as_deref())
        {
            return Err(ProtocolError::InvalidContentType {
                expected: self.media_type.to_string(),
            });
        }
        Ok(id)
    }

    /// DELETE: existence-checked removal.
    ///
    /// The explicit read keeps "never existed" (`NotFound`) distinguishable
    /// from "existed but could not be removed" (`Internal`).
    pub async fn delete(&self, raw_id: &str) -> Result<(), ProtocolError> {
        let id = ResourceId::parse(raw_id)?;

        if self.store.get(&id).await?.is_none() {
            tracing::debug!(identifier = %id, "resource not found");
            return Err(ProtocolError::NotFound);
        }

        if self.store.delete(&id).await? {
            tracing::info!(identifier = %id, "resource deleted");
            Ok(())
        } else {
            Err(ProtocolError::Internal(format!(
                "Database fatal error: resource '{id}' vanished before delete"
            )))
        }
    }

    fn check_accept(&self, headers: &RequestHeaders) -> Result<(), ProtocolError> {
        if self.media_type.accepts(headers.accept.as_deref()) {
            Ok(())
        } else {
            Err(ProtocolError::InvalidAccept {
                expected: self.media_type.to_string(),
            })
        }
    }

    fn check_body<'b>(&self, body: &'b [u8]) -> Result<&'b str, ProtocolError> {
        let content = std::str::from_utf8(body).map_err(|e| ProtocolError::InvalidBody {
            reason: format!("body is not valid UTF-8: {e}"),
        })?;

        if let Some(limit) = self.store.content_limit() {
            if content.len() > limit {
                return Err(ProtocolError::ContentTooLarge {
                    limit,
                    actual: content.len(),
                });
            }
        }

        self.store
            .check_content(content)
            .map_err(|reason| ProtocolError::InvalidBody { reason })?;

        match self.validator.validate(content)? {
            BodyVerdict::Valid => Ok(content),
            BodyVerdict::Invalid(reasons) => Err(ProtocolError::InvalidBody {
                reason: reasons.join("; "),
            }),
        }
    }
}
