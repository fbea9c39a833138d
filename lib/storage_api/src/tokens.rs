use crate::{RepositoryResult, TokenRelationship};
use mirror_replay_types::{EntityId, Timestamp};

/// Point-in-time reads over account/token associations.
pub trait ReadTokenRelationships: Send + Sync {
    /// Most recent relationship row for `(account, token)` with effective
    /// time <= `as_of`; pass [`Timestamp::MAX`] for the current row.
    fn token_relationship_at(
        &self,
        account: EntityId,
        token: EntityId,
        as_of: Timestamp,
    ) -> RepositoryResult<Option<TokenRelationship>>;
}

impl<T: ReadTokenRelationships + ?Sized> ReadTokenRelationships for std::sync::Arc<T> {
    fn token_relationship_at(
        &self,
        account: EntityId,
        token: EntityId,
        as_of: Timestamp,
    ) -> RepositoryResult<Option<TokenRelationship>> {
        (**self).token_relationship_at(account, token, as_of)
    }
}
